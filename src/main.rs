//! fix-efi-bootorder command-line tool.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use fix_efi_bootorder::{
    cli::{Cli, Commands},
    Config, Driver, SystemTools,
};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{:#}", err);
            tracing::debug!("{:?}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli
        .settings
        .resolve()
        .context("Failed to load configuration")?;
    tracing::debug!(?config, "configuration");

    // dry-run and fix need a bootloader; fail before probing the system
    if cli.command != Commands::Inspect {
        config.bootloader()?;
    }

    let tools = SystemTools::new(&config)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut err = std::io::stderr();

    execute(cli.command, &tools, &config, &mut out, &mut err)?;
    out.flush()?;
    Ok(())
}

fn execute(
    command: Commands,
    tools: &SystemTools,
    config: &Config,
    out: &mut impl Write,
    err: &mut impl Write,
) -> fix_efi_bootorder::Result<()> {
    let driver = Driver::new(tools, config);
    match command {
        Commands::Inspect => {
            driver.inspect(out)?;
        }
        Commands::DryRun => {
            driver.dry_run(out, err)?;
        }
        Commands::Fix => {
            driver.fix(out, err)?;
        }
    }
    Ok(())
}
