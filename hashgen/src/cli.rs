// Command-line interface definition

use clap::{Args, Parser, Subcommand, ValueEnum};
use common::config::Settings;
use common::hasher::{HashVersion, TruncationPolicy};
use common::report::ReportFormat;
use std::path::PathBuf;

/// Generate and verify bcrypt password hashes
#[derive(Parser, Debug)]
#[command(name = "hashgen", version, about, long_about = None)]
pub struct Cli {
    /// Directory holding default.toml and local.toml
    #[arg(long, global = true, value_name = "DIR", default_value = "config")]
    pub config_dir: PathBuf,

    /// Log level or filter directive (RUST_LOG takes precedence)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Emit logs as JSON on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Options for the default generate flow when no subcommand is given
    #[command(flatten)]
    pub generate: GenerateArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Hash a password, verify the result and print an UPDATE statement (default)
    Generate(GenerateArgs),
    /// Check a password against an existing hash
    Verify(VerifyArgs),
}

/// Where to read the password from; with none given, prompt on a terminal
#[derive(Args, Debug, Default, Clone, PartialEq, Eq)]
#[group(multiple = false)]
pub struct PasswordArgs {
    /// Password value (visible in the process list; avoid outside scripts)
    #[arg(long, value_name = "PASSWORD")]
    pub password: Option<String>,

    /// Read the password from this environment variable
    #[arg(long, value_name = "VAR")]
    pub password_env: Option<String>,

    /// Read the password from the first line of stdin
    #[arg(long)]
    pub password_stdin: bool,
}

#[derive(Args, Debug, Default, Clone, PartialEq, Eq)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub password: PasswordArgs,

    /// Work factor (4-31)
    #[arg(long, value_name = "N")]
    pub cost: Option<u32>,

    /// Version tag written into the hash (2a, 2b or 2y)
    #[arg(long, value_name = "TAG")]
    pub hash_version: Option<HashVersion>,

    /// What to do with passwords over 72 bytes (reject or truncate)
    #[arg(long, value_name = "POLICY")]
    pub truncation: Option<TruncationPolicy>,

    /// User named in the UPDATE statement
    #[arg(long)]
    pub username: Option<String>,

    /// Table named in the UPDATE statement
    #[arg(long)]
    pub table: Option<String>,

    /// Skip the UPDATE statement
    #[arg(long)]
    pub no_sql: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Encoded bcrypt hash to check against
    pub hash: String,

    #[command(flatten)]
    pub password: PasswordArgs,

    /// What to do with passwords over 72 bytes (reject or truncate)
    #[arg(long, value_name = "POLICY")]
    pub truncation: Option<TruncationPolicy>,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => ReportFormat::Text,
            OutputFormat::Json => ReportFormat::Json,
        }
    }
}

impl GenerateArgs {
    fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(cost) = self.cost {
            settings.hasher.cost = cost;
        }
        if let Some(version) = self.hash_version {
            settings.hasher.version = version;
        }
        if let Some(truncation) = self.truncation {
            settings.hasher.truncation = truncation;
        }
        if let Some(username) = &self.username {
            settings.sql.username = username.clone();
        }
        if let Some(table) = &self.table {
            settings.sql.table = table.clone();
        }
    }
}

impl Cli {
    /// Resolve the command to run; no subcommand means generate with the top-level options
    ///
    /// Generate options given before a subcommand would be silently ignored, so they
    /// are rejected instead.
    pub fn into_command(self) -> Result<Command, String> {
        match self.command {
            Some(command) if self.generate != GenerateArgs::default() => Err(format!(
                "generate options must follow the subcommand: hashgen {} [OPTIONS]",
                command.name()
            )),
            Some(command) => Ok(command),
            None => Ok(Command::Generate(self.generate)),
        }
    }

    /// Layer command-line flags over the loaded settings
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(level) = &self.log_level {
            settings.observability.log_level = level.clone();
        }
        if self.log_json {
            settings.observability.json = true;
        }

        match &self.command {
            Some(Command::Generate(args)) => args.apply_overrides(settings),
            Some(Command::Verify(args)) => {
                if let Some(truncation) = args.truncation {
                    settings.hasher.truncation = truncation;
                }
            }
            None => self.generate.apply_overrides(settings),
        }
    }
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Generate(_) => "generate",
            Command::Verify(_) => "verify",
        }
    }
}
