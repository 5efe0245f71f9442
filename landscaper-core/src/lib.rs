#![doc = "landscaper-core: promotion and upgrade engine for integration tenants."]

//! This crate holds the remote API client, the landscape model and the engines
//! that move integration artifacts between environments. It does no terminal I/O;
//! the `landscaper` binary crate is the CLI on top of it.
//!
//! # Usage
//! Build a [`landscape::Landscape`] from a manifest, then hand it to
//! [`promotion::PackageMover`], [`upgrade::ArtifactUpgrader`] or
//! [`operations::Operations`].

pub mod contract;
pub mod cpi_client;
pub mod credentials;
pub mod error;
pub mod landscape;
pub mod manifest;
pub mod model;
mod odata;
pub mod operations;
pub mod outcome;
pub mod promotion;
pub mod upgrade;

pub use contract::IntegrationClient;
#[cfg(any(test, feature = "test-export-mocks"))]
pub use contract::MockIntegrationClient;
pub use error::{ClientError, EngineError, LandscapeError};
pub use landscape::Landscape;
pub use outcome::{ArtifactOutcome, RunReport, TransportStep};
