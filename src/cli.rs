//! CLI command definitions and argument parsing.

use crate::config::{Config, ConfigLoader};
use crate::error::ConfigError;
use clap::builder::FalseyValueParser;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Make sure firmware boots the right bootloader from the right partition.
///
/// Reads the EFI boot entries with efibootmgr, tags each one, and moves the
/// entry loading the configured bootloader from the boot partition to the
/// front of BootOrder.
#[derive(Parser, Debug)]
#[command(name = "fix-efi-bootorder")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (can be repeated for more verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(flatten)]
    pub settings: SettingsArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// List boot entries with their flags
    Inspect,

    /// Show the boot order that `fix` would write
    DryRun,

    /// Compute and commit the new boot order
    Fix,
}

/// Configuration overrides.
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// Additional configuration file (must exist)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Ignore configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Bootloader to boot first: systemd-boot or grub
    #[arg(short, long, global = true, env = "FIX_EFI_BOOTORDER_BOOTLOADER")]
    pub bootloader: Option<String>,

    /// Force an entry containing this text to the front (repeatable, last wins)
    ///
    /// Each value is used verbatim; entry paths such as `HD(1,GPT,...)`
    /// contain commas.
    #[arg(short, long, global = true, env = "FIX_EFI_BOOTORDER_FIRST")]
    pub first: Vec<String>,

    /// Warn instead of failing when a --first text matches no active entry
    #[arg(
        long,
        global = true,
        env = "FIX_EFI_BOOTORDER_FIRST_IS_OPTIONAL",
        value_parser = FalseyValueParser::new()
    )]
    pub first_is_optional: bool,
}

impl SettingsArgs {
    /// File layers selected by these arguments.
    pub fn loader(&self) -> ConfigLoader {
        let loader = if self.no_config {
            ConfigLoader::new()
        } else {
            ConfigLoader::system()
        };
        match &self.config {
            Some(path) => loader.explicit(path),
            None => loader,
        }
    }

    /// Load the file layers and apply the command-line overrides.
    pub fn resolve(&self) -> Result<Config, ConfigError> {
        let mut config = self.loader().load()?;
        self.apply(&mut config);
        Ok(config)
    }

    /// Flags given on the command line win over every file layer.
    pub fn apply(&self, config: &mut Config) {
        if let Some(bootloader) = &self.bootloader {
            config.bootloader = Some(bootloader.clone());
        }
        if !self.first.is_empty() {
            config.first = self.first.clone();
        }
        if self.first_is_optional {
            config.first_is_optional = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_subcommand_names() {
        let cli = Cli::try_parse_from(["fix-efi-bootorder", "dry-run"]).unwrap();
        assert_eq!(cli.command, Commands::DryRun);
        let cli = Cli::try_parse_from(["fix-efi-bootorder", "inspect"]).unwrap();
        assert_eq!(cli.command, Commands::Inspect);
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["fix-efi-bootorder"]).is_err());
        assert!(Cli::try_parse_from(["fix-efi-bootorder", "fix", "inspect"]).is_err());
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::try_parse_from([
            "fix-efi-bootorder",
            "fix",
            "--bootloader",
            "grub",
            "--first",
            "Windows",
            "--first",
            "UEFI OS",
            "--first-is-optional",
        ])
        .unwrap();

        let mut config = Config {
            bootloader: Some("systemd-boot".into()),
            first: vec!["Fedora".into()],
            ..Config::default()
        };
        cli.settings.apply(&mut config);

        assert_eq!(config.bootloader.as_deref(), Some("grub"));
        assert_eq!(config.first, vec!["Windows", "UEFI OS"]);
        assert!(config.first_is_optional);
    }

    #[test]
    fn test_first_keeps_commas() {
        let cli = Cli::try_parse_from(["fix-efi-bootorder", "fix", "--first", "a,b"]).unwrap();
        assert_eq!(cli.settings.first, vec!["a,b"]);

        let cli =
            Cli::try_parse_from(["fix-efi-bootorder", "fix", "-f", "HD(1,GPT", "-f", "PXE"]).unwrap();
        let mut config = Config::default();
        cli.settings.apply(&mut config);
        assert_eq!(config.first, vec!["HD(1,GPT", "PXE"]);
    }

    #[test]
    fn test_absent_flags_keep_file_values() {
        let cli = Cli::try_parse_from(["fix-efi-bootorder", "inspect"]).unwrap();
        let mut config = Config {
            bootloader: Some("systemd-boot".into()),
            first: vec!["Fedora".into()],
            first_is_optional: true,
            ..Config::default()
        };
        let expected = config.clone();
        cli.settings.apply(&mut config);
        assert_eq!(config, expected);
    }
}
