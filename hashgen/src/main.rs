// hashgen binary entry point
// Generates a bcrypt hash for an admin password and prints the UPDATE statement to apply it.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command, GenerateArgs, PasswordArgs};
use common::config::Settings;
use common::credential::{Credential, CredentialSource};
use common::hasher::PasswordHasher;
use common::report::generate;
use common::telemetry::init_logging;
use secrecy::ExposeSecret;
use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;
use tracing::{error, info, warn};

/// Exit status when `verify` runs cleanly but the password does not match
const EXIT_MISMATCH: u8 = 1;

/// Exit status for every other failure
const EXIT_ERROR: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "hashgen failed");
            eprintln!("Error: {:#}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut settings = Settings::load_from_path(&cli.config_dir).with_context(|| {
        format!(
            "Failed to load configuration from {}",
            cli.config_dir.display()
        )
    })?;
    cli.apply_overrides(&mut settings);
    settings.validate().context("Invalid configuration")?;

    init_logging(
        &settings.observability.log_level,
        settings.observability.json,
    )?;

    info!(
        cost = settings.hasher.cost,
        version = %settings.hasher.version,
        "Configuration loaded"
    );

    match cli.into_command().map_err(|e| anyhow::anyhow!(e))? {
        Command::Generate(args) => run_generate(&settings, args),
        Command::Verify(args) => run_verify(&settings, &args.hash, args.password),
    }
}

fn read_credential(args: PasswordArgs, confirm: bool) -> Result<Credential> {
    let source = CredentialSource::select(
        args.password,
        args.password_env,
        args.password_stdin,
        io::stdin().is_terminal(),
        confirm,
    )?;
    let credential = source.read().context("Failed to read password")?;
    Ok(credential)
}

fn run_generate(settings: &Settings, args: GenerateArgs) -> Result<ExitCode> {
    let hasher = PasswordHasher::from_config(&settings.hasher)?;
    let credential = read_credential(args.password, true)?;

    let sql = if args.no_sql {
        None
    } else {
        Some(&settings.sql)
    };

    let report = generate(&hasher, &credential, sql)?;
    let rendered = report.render(args.format.into())?;

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(rendered.as_bytes())
        .context("Failed to write report")?;
    stdout.flush().context("Failed to write report")?;

    Ok(ExitCode::SUCCESS)
}

fn run_verify(settings: &Settings, hash: &str, password: PasswordArgs) -> Result<ExitCode> {
    let hasher = PasswordHasher::from_config(&settings.hasher)?;
    let credential = read_credential(password, false)?;

    let matches = hasher.verify(credential.expose_secret(), hash)?;

    if matches {
        if hasher.needs_rehash(hash)? {
            warn!(
                configured_cost = hasher.cost(),
                "Hash uses a different cost or version than configured"
            );
        }
        println!("Password matches hash");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("Password does not match hash");
        Ok(ExitCode::from(EXIT_MISMATCH))
    }
}
