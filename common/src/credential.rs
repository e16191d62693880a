// Plaintext credential input: environment variable, stdin or a non-echoing prompt

use crate::errors::CredentialError;
use dialoguer::{theme::ColorfulTheme, Password};
use secrecy::{ExposeSecret, SecretString};
use std::env::VarError;
use std::io::{self, BufRead};
use tracing::{debug, warn};
use zeroize::Zeroizing;

/// A plaintext password held only in memory
///
/// Zeroized on drop; `Debug` prints a redacted placeholder.
#[derive(Debug)]
pub struct Credential(SecretString);

impl Credential {
    pub fn new(value: impl Into<String>) -> Result<Self, CredentialError> {
        Self::from_secret(SecretString::new(value.into()))
    }

    pub fn from_secret(secret: SecretString) -> Result<Self, CredentialError> {
        if secret.expose_secret().is_empty() {
            return Err(CredentialError::Empty);
        }
        Ok(Self(secret))
    }
}

impl ExposeSecret<String> for Credential {
    fn expose_secret(&self) -> &String {
        self.0.expose_secret()
    }
}

/// Where the plaintext comes from
#[derive(Debug)]
pub enum CredentialSource {
    /// Given on the command line; visible in the process list
    Literal(SecretString),
    /// Read once from the named environment variable
    Env(String),
    /// First line of standard input
    Stdin,
    /// Interactive prompt without echo
    Prompt { confirm: bool },
}

impl CredentialSource {
    /// Pick a source from the CLI options
    ///
    /// Explicit options win in the order literal, env, stdin. With none of them the
    /// prompt is used, but only when attached to a terminal.
    pub fn select(
        literal: Option<String>,
        env_var: Option<String>,
        stdin: bool,
        interactive: bool,
        confirm: bool,
    ) -> Result<Self, CredentialError> {
        if let Some(value) = literal {
            return Ok(CredentialSource::Literal(SecretString::new(value)));
        }
        if let Some(name) = env_var {
            return Ok(CredentialSource::Env(name));
        }
        if stdin {
            return Ok(CredentialSource::Stdin);
        }
        if interactive {
            return Ok(CredentialSource::Prompt { confirm });
        }
        Err(CredentialError::NoSource)
    }

    /// Read the credential from the process environment, stdin or terminal
    pub fn read(self) -> Result<Credential, CredentialError> {
        let stdin = io::stdin();
        let mut lock = stdin.lock();
        self.read_with(&mut lock, |name| std::env::var(name))
    }

    /// Read the credential using the given stdin and environment lookup
    pub fn read_with<R, F>(self, stdin: &mut R, lookup: F) -> Result<Credential, CredentialError>
    where
        R: BufRead,
        F: Fn(&str) -> Result<String, VarError>,
    {
        match self {
            CredentialSource::Literal(secret) => {
                warn!("Password passed on the command line; prefer --password-env or --password-stdin");
                Credential::from_secret(secret)
            }
            CredentialSource::Env(name) => {
                debug!(var = %name, "Reading password from environment");
                match lookup(&name) {
                    Ok(value) => Credential::new(value),
                    Err(VarError::NotPresent) => Err(CredentialError::EnvVarMissing(name)),
                    Err(VarError::NotUnicode(_)) => Err(CredentialError::EnvVarNotUnicode(name)),
                }
            }
            CredentialSource::Stdin => {
                debug!("Reading password from stdin");
                // Sized up front so read_line does not leave reallocated copies behind
                let mut line = Zeroizing::new(String::with_capacity(256));
                stdin
                    .read_line(&mut line)
                    .map_err(|e| CredentialError::ReadFailed(e.to_string()))?;
                let len = line.trim_end_matches(['\n', '\r']).len();
                line.truncate(len);
                Credential::new(std::mem::take(&mut *line))
            }
            CredentialSource::Prompt { confirm } => {
                let theme = ColorfulTheme::default();
                let mut prompt = Password::with_theme(&theme).with_prompt("Password");
                if confirm {
                    prompt = prompt.with_confirmation("Confirm password", "Passwords do not match");
                }
                let value = prompt
                    .interact()
                    .map_err(|e| CredentialError::ReadFailed(e.to_string()))?;
                Credential::new(value)
            }
        }
    }
}
