//! # landscaper CLI interface
//!
//! Command parsing and dispatch for the `landscaper` binary. All promotion, upgrade
//! and tenant logic lives in `landscaper-core`; this module only resolves the global
//! selection (`--env`, `--pkg`, `--artifact`), calls the core and renders results.
//!
//! `--pkg` and `--artifact` take base ids. The selected environment's suffix is
//! applied here before the core is called, so `--env qa --artifact Flow1` addresses
//! `Flow1-qa` when `qa` has the suffix `-qa`.
//!
//! For programmatic use and tests, [`execute`] runs a parsed [`Cli`] against any
//! landscape and writes the report to the given writer.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use landscaper_core::landscape::{Environment, Landscape};
use landscaper_core::manifest::DEFAULT_LANDSCAPE_FILE;
use landscaper_core::model::ACTIVE_VERSION;
use landscaper_core::operations::Operations;
use landscaper_core::promotion::{MoveRequest, PackageMover};
use landscaper_core::upgrade::{ArtifactUpgrader, UpgradeRequest};
use landscaper_core::{EngineError, IntegrationClient, RunReport};
use tracing::{error, info};

use crate::load_landscape::load_landscape;
use crate::render;

/// Promote integration packages and artifacts across a landscape of environments.
#[derive(Debug, Parser)]
#[clap(
    name = "landscaper",
    version,
    about = "Promote and upgrade integration artifacts across a landscape of environments"
)]
pub struct Cli {
    /// Environment to work in. Defaults to the original environment of the landscape
    #[clap(long, global = true)]
    pub env: Option<String>,

    /// Package id, without environment suffix
    #[clap(long, global = true)]
    pub pkg: Option<String>,

    /// Artifact id, without environment suffix. `artifact get` accepts ID:VERSION
    #[clap(long, global = true)]
    pub artifact: Option<String>,

    /// Path to the landscape YAML file
    #[clap(long = "landscape-file", global = true, default_value = DEFAULT_LANDSCAPE_FILE)]
    pub landscape_file: PathBuf,

    /// Log debug output of landscaper to stderr
    #[clap(short, long, global = true)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Work with integration packages
    Package {
        #[clap(subcommand)]
        command: PackageCommands,
    },
    /// Work with design-time artifacts of a package
    Artifact {
        #[clap(subcommand)]
        command: ArtifactCommands,
    },
    /// Change artifact configuration
    Config {
        #[clap(subcommand)]
        command: ConfigCommands,
    },
    /// Check that every system of the landscape accepts its credentials
    Check,
}

#[derive(Debug, Subcommand)]
pub enum PackageCommands {
    /// List packages in the environment
    List,
    /// Move the package from the original environment into another one
    Move {
        /// Target environment
        #[clap(long = "target-env")]
        target_env: String,
        /// Only move these artifacts (comma separated base ids)
        #[clap(short = 'f', long, value_delimiter = ',')]
        iflow: Vec<String>,
        /// Deploy transported artifacts in the target environment
        #[clap(short, long)]
        deploy: bool,
    },
    /// Copy the package from the discover catalogue
    Copy,
}

#[derive(Debug, Subcommand)]
pub enum ArtifactCommands {
    /// List artifacts in the package with their deploy status
    List,
    /// Show one artifact
    Get,
    /// Deploy the current version of the artifact
    Deploy,
    /// Undeploy the artifact
    Undeploy,
    /// Replace artifacts built from a template with the template's current version
    Upgrade {
        /// Template artifact in the original environment
        #[clap(long)]
        template: String,
        /// Artifacts to upgrade (comma separated base ids). Defaults to the landscape's template instances
        #[clap(short = 'f', long, value_delimiter = ',')]
        iflow: Vec<String>,
        /// Deploy upgraded artifacts
        #[clap(short, long)]
        deploy: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Update configuration parameters of the artifact
    Update {
        /// KEY:VALUE pairs, comma separated
        #[clap(long, value_delimiter = ',', required = true)]
        config: Vec<String>,
    },
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Package { command } => match command {
                PackageCommands::List => "package list",
                PackageCommands::Move { .. } => "package move",
                PackageCommands::Copy => "package copy",
            },
            Commands::Artifact { command } => match command {
                ArtifactCommands::List => "artifact list",
                ArtifactCommands::Get => "artifact get",
                ArtifactCommands::Deploy => "artifact deploy",
                ArtifactCommands::Undeploy => "artifact undeploy",
                ArtifactCommands::Upgrade { .. } => "artifact upgrade",
            },
            Commands::Config { .. } => "config update",
            Commands::Check => "check",
        }
    }
}

/// Global selection resolved against the landscape.
struct Selection<'a> {
    origin: &'a Environment,
    env: &'a Environment,
    pkg: Option<&'a str>,
    artifact: Option<&'a str>,
}

impl<'a> Selection<'a> {
    fn resolve<C>(landscape: &'a Landscape<C>, cli: &'a Cli) -> Result<Self> {
        Ok(Selection {
            origin: landscape.original_environment(),
            env: landscape.environment_or_original(cli.env.as_deref())?,
            pkg: cli.pkg.as_deref(),
            artifact: cli.artifact.as_deref(),
        })
    }

    fn base_package(&self) -> Result<&'a str> {
        self.pkg.ok_or_else(|| anyhow!("--pkg is required for this command"))
    }

    fn base_artifact(&self) -> Result<&'a str> {
        self.artifact
            .ok_or_else(|| anyhow!("--artifact is required for this command"))
    }

    /// Package id scoped to the selected environment.
    fn package(&self) -> Result<String> {
        Ok(self.env.scope(self.base_package()?))
    }

    /// Artifact id scoped to the selected environment.
    fn artifact(&self) -> Result<String> {
        Ok(self.env.scope(self.base_artifact()?))
    }
}

/// Prints the lines completed before an aborted run, then hands the error back.
fn report_partial(out: &mut dyn Write, err: EngineError, changed_header: &str) -> Result<()> {
    if !err.completed().is_empty() {
        let partial = RunReport {
            lines: err.completed().to_vec(),
        };
        writeln!(out, "{}", render::report_table(&partial, changed_header))?;
    }
    Err(err.into())
}

/// Runs one parsed command against `landscape`, writing the report to `out`.
pub async fn execute<C>(landscape: &Landscape<C>, cli: &Cli, out: &mut dyn Write) -> Result<()>
where
    C: IntegrationClient,
{
    let selection = Selection::resolve(landscape, cli)?;
    let env_id = selection.env.id.as_str();
    let operations = Operations::new(landscape);

    match &cli.command {
        Commands::Package { command } => match command {
            PackageCommands::List => {
                let packages = operations.list_packages(env_id).await?;
                writeln!(out, "{}", render::packages_table(&packages))?;
            }
            PackageCommands::Move {
                target_env,
                iflow,
                deploy,
            } => {
                let request = MoveRequest {
                    package_id: selection.origin.scope(selection.base_package()?),
                    target_env: target_env.clone(),
                    artifacts: iflow.iter().map(|id| selection.origin.scope(id)).collect(),
                    deploy: *deploy,
                };
                writeln!(out, "Transporting {} to {}...", request.package_id, target_env)?;
                let header = format!("Transferred to {target_env}");
                match PackageMover::new(landscape).run(&request).await {
                    Ok(report) => writeln!(out, "{}", render::report_table(&report, &header))?,
                    Err(e) => return report_partial(out, e, &header),
                }
            }
            PackageCommands::Copy => {
                let discover_id = selection.base_package()?;
                let copied = operations.copy_package(env_id, discover_id).await?;
                writeln!(out, "{}", render::package_details(&copied.package))?;
                writeln!(out, "{}", render::artifact_list_table(&copied.artifacts))?;
            }
        },
        Commands::Artifact { command } => match command {
            ArtifactCommands::List => {
                let package_id = selection.package()?;
                let statuses = operations.list_artifacts(env_id, &package_id).await?;
                writeln!(out, "{}", render::artifacts_table(&statuses))?;
            }
            ArtifactCommands::Get => {
                let raw = selection.base_artifact()?;
                let (base, version) = match raw.split_once(':') {
                    Some((base, version)) => (base, version),
                    None => (raw, ACTIVE_VERSION),
                };
                let id = selection.env.scope(base);
                let artifact = operations.get_artifact(env_id, &id, Some(version)).await?;
                writeln!(out, "{}", render::artifact_details(&artifact))?;
                writeln!(out, "{}", render::configuration_table(&artifact.configurations))?;
            }
            ArtifactCommands::Deploy => {
                let id = selection.artifact()?;
                let version = operations.deploy_artifact(env_id, &id).await?;
                writeln!(out, "Deploy of {id} ({version}) started in {env_id}")?;
            }
            ArtifactCommands::Undeploy => {
                let id = selection.artifact()?;
                operations.undeploy_artifact(env_id, &id).await?;
                writeln!(out, "Undeploy of {id} started in {env_id}")?;
            }
            ArtifactCommands::Upgrade {
                template,
                iflow,
                deploy,
            } => {
                let request = UpgradeRequest {
                    template_id: selection.origin.scope(template),
                    env: Some(env_id.to_string()),
                    artifacts: iflow.clone(),
                    deploy: *deploy,
                };
                match ArtifactUpgrader::new(landscape).run(&request).await {
                    Ok(report) => writeln!(out, "{}", render::report_table(&report, "Upgraded"))?,
                    Err(e) => return report_partial(out, e, "Upgraded"),
                }
            }
        },
        Commands::Config { command } => match command {
            ConfigCommands::Update { config } => {
                let id = selection.artifact()?;
                let change = operations.update_configuration(env_id, &id, config).await?;
                writeln!(out, "Old configuration of {id}")?;
                writeln!(out, "{}", render::configuration_table(&change.before))?;
                writeln!(out, "New configuration of {id}")?;
                writeln!(out, "{}", render::configuration_table(&change.after))?;
            }
        },
        Commands::Check => {
            for system in operations.check_connections().await? {
                writeln!(out, "{system}: connected")?;
            }
        }
    }
    Ok(())
}

/// Async CLI entrypoint used by `main` and integration tests.
pub async fn run(cli: Cli) -> Result<()> {
    info!(command = cli.command.name(), landscape_file = ?cli.landscape_file, "Command started");

    let landscape = load_landscape(&cli.landscape_file)?;
    let mut stdout = std::io::stdout();
    match execute(&landscape, &cli, &mut stdout).await {
        Ok(()) => {
            info!(command = cli.command.name(), "Command finished");
            Ok(())
        }
        Err(e) => {
            error!(command = cli.command.name(), error = %e, "Command failed");
            Err(e.context(format!("{} failed", cli.command.name())))
        }
    }
}
