//! Credential resolution for the CLI: environment first, then an interactive prompt.

use std::io::IsTerminal;

use dialoguer::{Input, Password};
use landscaper_core::credentials::{CredentialKind, CredentialResolver, EnvCredentials};
use landscaper_core::error::LandscapeError;
use tracing::{debug, info};

/// Reads credentials from the environment and prompts for any that are unset.
///
/// Prompting only happens when stdin is a terminal; otherwise an unset variable
/// fails the same way [`EnvCredentials`] does. Passwords are read without echo.
#[derive(Debug, Clone, Copy)]
pub struct PromptingCredentials {
    interactive: bool,
}

impl Default for PromptingCredentials {
    fn default() -> Self {
        Self {
            interactive: std::io::stdin().is_terminal(),
        }
    }
}

impl PromptingCredentials {
    pub fn non_interactive() -> Self {
        Self { interactive: false }
    }
}

impl CredentialResolver for PromptingCredentials {
    fn resolve(
        &self,
        system_name: &str,
        kind: CredentialKind,
        variable: &str,
    ) -> Result<String, LandscapeError> {
        if let Some(value) = EnvCredentials::lookup(variable) {
            debug!(system = system_name, %kind, variable, "Credential resolved from environment");
            return Ok(value);
        }
        if !self.interactive {
            return EnvCredentials.resolve(system_name, kind, variable);
        }

        info!(system = system_name, %kind, variable, "Prompting for credential");
        let prompt = format!("Enter {kind} for {system_name}");
        let answer = match kind {
            CredentialKind::Login => Input::<String>::new().with_prompt(prompt).interact_text(),
            CredentialKind::Password => Password::new().with_prompt(prompt).interact(),
        };
        match answer {
            Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
            Ok(_) => Err(LandscapeError::Credential {
                system: system_name.to_string(),
                what: kind.to_string(),
                message: "empty input".to_string(),
            }),
            Err(e) => Err(LandscapeError::Credential {
                system: system_name.to_string(),
                what: kind.to_string(),
                message: e.to_string(),
            }),
        }
    }
}
