//! Configuration loading
//!
//! Settings come from TOML files layered from system-wide to local, then
//! from command-line flags:
//!
//! ```text
//! /etc/fix-efi-bootorder.toml
//! $XDG_CONFIG_HOME/fix-efi-bootorder/config.toml
//! ./.fix-efi-bootorder.toml
//! --config <file>
//! --bootloader / --first / --first-is-optional
//! ```
//!
//! Example file:
//!
//! ```toml
//! bootloader = "systemd-boot"
//! first = ["Windows Boot Manager"]
//! first-is-optional = true
//! boot-mounts = ["/boot", "/boot/efi", "/efi"]
//! esp-only = true
//! ```

use crate::entry::Bootloader;
use crate::error::ConfigError;
use crate::reorder::{MissingMatch, ReorderPlan};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Name used for configuration files and directories.
pub const APP_NAME: &str = "fix-efi-bootorder";

/// Mount points treated as boot partitions unless configured otherwise.
pub const DEFAULT_BOOT_MOUNTS: &[&str] = &["/boot", "/boot/efi", "/efi"];

/// Resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Bootloader that must be tried first (`systemd-boot` or `grub`)
    pub bootloader: Option<String>,
    /// Substrings of entries to force to the front, last one wins
    pub first: Vec<String>,
    /// Warn instead of failing when a `first` substring matches nothing
    pub first_is_optional: bool,
    /// Mount points whose partitions the bootloader must be loaded from
    pub boot_mounts: Vec<String>,
    /// Only EFI system partitions count as boot partitions
    pub esp_only: bool,
    /// PATH-style list used to locate efibootmgr and lsblk
    pub search_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bootloader: None,
            first: Vec::new(),
            first_is_optional: false,
            boot_mounts: DEFAULT_BOOT_MOUNTS.iter().map(|m| m.to_string()).collect(),
            esp_only: true,
            search_path: None,
        }
    }
}

impl Config {
    /// Validated target bootloader.
    pub fn bootloader(&self) -> Result<Bootloader, ConfigError> {
        self.bootloader
            .as_deref()
            .ok_or(ConfigError::MissingBootloader)?
            .parse()
    }

    /// Reorder plan for dry-run and fix.
    pub fn reorder_plan(&self) -> Result<ReorderPlan, ConfigError> {
        let missing = if self.first_is_optional {
            MissingMatch::Skip
        } else {
            MissingMatch::Fail
        };
        Ok(ReorderPlan::new(self.bootloader()?)
            .first(self.first.iter().cloned())
            .missing_first(missing))
    }

    /// Apply one file layer; keys present in the file win.
    pub fn merge(&mut self, file: ConfigFile) {
        if let Some(bootloader) = file.bootloader {
            self.bootloader = Some(bootloader);
        }
        if let Some(first) = file.first {
            self.first = first.into_vec();
        }
        if let Some(optional) = file.first_is_optional {
            self.first_is_optional = optional;
        }
        if let Some(mounts) = file.boot_mounts {
            self.boot_mounts = mounts;
        }
        if let Some(esp_only) = file.esp_only {
            self.esp_only = esp_only;
        }
        if let Some(path) = file.search_path {
            self.search_path = Some(path);
        }
    }
}

/// `first` accepts a single string or a list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

/// One configuration file as written on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigFile {
    pub bootloader: Option<String>,
    pub first: Option<OneOrMany>,
    pub first_is_optional: Option<bool>,
    pub boot_mounts: Option<Vec<String>>,
    pub esp_only: Option<bool>,
    pub search_path: Option<String>,
}

impl ConfigFile {
    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::TomlParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }
}

/// Configuration loader walking the file layers in precedence order.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    /// Optional layers, skipped when absent
    search: Vec<PathBuf>,
    /// Explicit file that must exist
    explicit: Option<PathBuf>,
}

impl ConfigLoader {
    /// Loader with no file layers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader for the standard locations.
    pub fn system() -> Self {
        let mut search = vec![PathBuf::from(format!("/etc/{}.toml", APP_NAME))];
        if let Some(dir) = dirs::config_dir() {
            search.push(dir.join(APP_NAME).join("config.toml"));
        }
        search.push(PathBuf::from(format!(".{}.toml", APP_NAME)));
        Self {
            search,
            explicit: None,
        }
    }

    /// Add an optional layer above the existing ones.
    pub fn search(mut self, path: impl Into<PathBuf>) -> Self {
        self.search.push(path.into());
        self
    }

    /// Add a required top file layer.
    pub fn explicit(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit = Some(path.into());
        self
    }

    /// Paths that will be consulted, lowest precedence first.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.search.iter().chain(self.explicit.iter()).map(PathBuf::as_path)
    }

    /// Merge all layers over the defaults.
    pub fn load(&self) -> Result<Config, ConfigError> {
        let mut config = Config::default();

        for path in &self.search {
            if !path.is_file() {
                continue;
            }
            tracing::debug!("Loading configuration from {}", path.display());
            config.merge(ConfigFile::load_from(path)?);
        }

        if let Some(path) = &self.explicit {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.clone()));
            }
            tracing::debug!("Loading configuration from {}", path.display());
            config.merge(ConfigFile::load_from(path)?);
        }

        Ok(config)
    }
}
