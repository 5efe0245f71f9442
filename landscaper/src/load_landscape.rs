//! `load_landscape` module: reads the landscape file and connects its systems for the CLI.
//!
//! Credentials named in the file are taken from the environment (after `.env` was
//! loaded by `main`) and prompted for when missing. Any failure here happens before
//! a single remote call is made.

use std::path::Path;

use anyhow::{Context, Result};
use landscaper_core::cpi_client::CpiClient;
use landscaper_core::credentials::CredentialResolver;
use landscaper_core::Landscape;
use tracing::{error, info};

use crate::credentials::PromptingCredentials;

/// Loads the landscape at `path`, prompting for missing credentials when attached to a terminal.
pub fn load_landscape<P: AsRef<Path>>(path: P) -> Result<Landscape<CpiClient>> {
    load_landscape_with(path, &PromptingCredentials::default())
}

pub fn load_landscape_with<P: AsRef<Path>>(
    path: P,
    resolver: &dyn CredentialResolver,
) -> Result<Landscape<CpiClient>> {
    let path_ref = path.as_ref();
    info!(landscape_path = ?path_ref, "Loading landscape");

    match Landscape::load(path_ref, resolver) {
        Ok(landscape) => {
            info!(
                landscape_path = ?path_ref,
                name = landscape.name(),
                original_environment = %landscape.original_environment().id,
                "Landscape ready"
            );
            Ok(landscape)
        }
        Err(e) => {
            error!(error = %e, landscape_path = ?path_ref, "Unable to read landscape configuration");
            Err(e).with_context(|| {
                format!("unable to read landscape configuration {}", path_ref.display())
            })
        }
    }
}
