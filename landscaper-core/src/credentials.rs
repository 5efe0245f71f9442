//! Resolution of system credentials named by the manifest.
//!
//! The manifest stores the *names* of environment variables, never secrets.
//! A [`CredentialResolver`] turns those names into values; the CLI layers an
//! interactive prompt on top of [`EnvCredentials`].

use std::fmt;

use tracing::{debug, warn};

use crate::error::LandscapeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    Login,
    Password,
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialKind::Login => f.write_str("login"),
            CredentialKind::Password => f.write_str("password"),
        }
    }
}

/// Login and password for one system.
#[derive(Clone)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

pub trait CredentialResolver {
    /// Resolves one credential of `system_name` from the variable named `variable`.
    fn resolve(
        &self,
        system_name: &str,
        kind: CredentialKind,
        variable: &str,
    ) -> Result<String, LandscapeError>;
}

/// Reads credentials from the process environment only. Unset or blank is an error.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvCredentials;

impl EnvCredentials {
    /// Returns the trimmed value of `variable`, or `None` when it is unset or blank.
    pub fn lookup(variable: &str) -> Option<String> {
        let value = std::env::var(variable).ok()?;
        let value = value.trim();
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }
}

impl CredentialResolver for EnvCredentials {
    fn resolve(
        &self,
        system_name: &str,
        kind: CredentialKind,
        variable: &str,
    ) -> Result<String, LandscapeError> {
        match Self::lookup(variable) {
            Some(value) => {
                debug!(system = system_name, %kind, variable, "Credential resolved from environment");
                Ok(value)
            }
            None => {
                warn!(system = system_name, %kind, variable, "Credential variable not set");
                Err(LandscapeError::Credential {
                    system: system_name.to_string(),
                    what: kind.to_string(),
                    message: format!("environment variable {variable} is not set"),
                })
            }
        }
    }
}
