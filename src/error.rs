//! Error types for boot order inspection and repair.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for boot order operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while reading firmware or partition listings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("No BootCurrent")]
    MissingCurrentBoot,

    #[error("BootOrder not found.")]
    MissingBootOrder,

    #[error("Boot entry {0} not found")]
    BootEntryNotFound(String),

    #[error("Boot entry {0} is listed more than once in BootOrder")]
    DuplicateBootEntry(String),

    #[error("Malformed partition line {line}: {text:?} (expected UUID and mount point)")]
    MalformedPartitionLine { line: usize, text: String },
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Missing --bootloader")]
    MissingBootloader,

    #[error("Invalid bootloader: {0} (expected systemd-boot or grub)")]
    InvalidBootloader(String),
}

/// A reordering rule could not be satisfied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleViolation {
    #[error("No boot partitions found; cannot pin a bootloader entry")]
    NoBootPartitions,

    #[error(
        "No active entry with matching partition UUID ({uuid}, mounted at {mount_point}) and bootloader ({bootloader}) found"
    )]
    NoMatchingBootloaderEntry {
        uuid: String,
        mount_point: String,
        bootloader: String,
    },

    #[error("No active entry with matching substr (\"{0}\") found")]
    NoMatchingSubstringEntry(String),
}

/// Top-level error for driver operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Rule(#[from] RuleViolation),

    #[error("{command} exit code: {status}{}", format_stderr(.stderr))]
    ExternalCommand {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("Failed to run {command}: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("Required utility not found in search path: {0}")]
    MissingDependency(String),

    #[error("Failed to write report: {0}")]
    Output(#[from] std::io::Error),
}

fn format_stderr(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!("\n{}", stderr)
    }
}
