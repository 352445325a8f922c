//! External utilities
//!
//! The firmware boot manager and the partition listing are both read through
//! command-line tools. [`BootTools`] is the seam the driver talks to;
//! [`SystemTools`] runs the real binaries.

use crate::config::Config;
use crate::{Error, Result};
use regex::Regex;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// GPT partition type GUID of the EFI system partition.
pub const ESP_PARTITION_TYPE: &str = "c12a7328-f81f-11d2-ba4b-00a0c93ec93b";

/// Access to the firmware boot manager and partition listing.
pub trait BootTools {
    /// Two-column `UUID MOUNTPOINT` text, one boot partition per line.
    fn boot_partitions(&self) -> Result<String>;

    /// Run efibootmgr with `args` and return its stdout.
    fn efibootmgr(&self, args: &[&str]) -> Result<String>;

    /// Commit a new BootOrder.
    fn set_boot_order(&self, ids: &[String]) -> Result<()> {
        let order = ids.join(",");
        self.efibootmgr(&["--bootorder", &order])?;
        Ok(())
    }
}

/// [`BootTools`] backed by the installed `efibootmgr` and `lsblk`.
#[derive(Debug, Clone)]
pub struct SystemTools {
    efibootmgr: PathBuf,
    lsblk: PathBuf,
    filter: BootMountFilter,
}

impl SystemTools {
    /// Resolve the required utilities on the configured search path.
    pub fn new(config: &Config) -> Result<Self> {
        let search_path: Option<OsString> = config
            .search_path
            .as_ref()
            .map(OsString::from)
            .or_else(|| std::env::var_os("PATH"));
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));

        let resolve = |name: &str| -> Result<PathBuf> {
            which::which_in(name, search_path.as_ref(), &cwd)
                .map_err(|_| Error::MissingDependency(name.to_string()))
        };

        let tools = Self {
            efibootmgr: resolve("efibootmgr")?,
            lsblk: resolve("lsblk")?,
            filter: BootMountFilter::new(&config.boot_mounts, config.esp_only),
        };
        debug!(?tools, "resolved external utilities");
        Ok(tools)
    }
}

impl BootTools for SystemTools {
    fn boot_partitions(&self) -> Result<String> {
        let listing = run(
            &self.lsblk,
            &[
                "--noheadings",
                "--pairs",
                "--output",
                "PARTUUID,PARTTYPE,MOUNTPOINT",
            ],
        )?;
        Ok(self.filter.apply(&listing))
    }

    fn efibootmgr(&self, args: &[&str]) -> Result<String> {
        run(&self.efibootmgr, args)
    }
}

/// Selects boot partitions out of `lsblk --pairs` output.
///
/// A row is kept when it is mounted at one of the boot mounts and, unless
/// disabled, its partition type is the EFI system partition. Kept rows are
/// rendered as `UUID MOUNTPOINT`; a kept row without a UUID is rendered as the
/// bare mount point so the partition parser reports it.
#[derive(Debug, Clone)]
pub struct BootMountFilter {
    boot_mounts: Vec<String>,
    esp_only: bool,
    pair_re: Regex,
}

impl BootMountFilter {
    pub fn new(boot_mounts: &[String], esp_only: bool) -> Self {
        Self {
            boot_mounts: boot_mounts.to_vec(),
            esp_only,
            pair_re: Regex::new(r#"([A-Z:_-]+)="([^"]*)""#).expect("Invalid lsblk pair regex"),
        }
    }

    pub fn apply(&self, listing: &str) -> String {
        let mut selected = String::new();
        for line in listing.lines() {
            let mut uuid = "";
            let mut part_type = "";
            let mut mount = "";
            for caps in self.pair_re.captures_iter(line) {
                let value = caps.get(2).map_or("", |m| m.as_str()).trim();
                match &caps[1] {
                    "PARTUUID" => uuid = value,
                    "PARTTYPE" => part_type = value,
                    "MOUNTPOINT" => mount = value,
                    _ => {}
                }
            }

            if mount.is_empty() || !self.boot_mounts.iter().any(|m| m == mount) {
                continue;
            }
            if self.esp_only && !part_type.eq_ignore_ascii_case(ESP_PARTITION_TYPE) {
                debug!(mount, part_type, "skipping non-ESP boot mount");
                continue;
            }

            if uuid.is_empty() {
                selected.push_str(&format!("{}\n", mount));
            } else {
                selected.push_str(&format!("{} {}\n", uuid, mount));
            }
        }
        selected
    }
}

/// Run `program` with `args`, returning stdout on success.
fn run(program: &Path, args: &[&str]) -> Result<String> {
    let command = format!("{} {}", program.display(), args.join(" "));
    debug!("Running: {}", command.trim_end());

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|source| Error::Spawn {
            command: program.display().to_string(),
            source,
        })?;

    if !output.status.success() {
        let status = output
            .status
            .code()
            .map_or_else(|| output.status.to_string(), |code| code.to_string());
        return Err(Error::ExternalCommand {
            command: program.display().to_string(),
            status,
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}
