//! kubeseed CLI tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "kubeseed")]
#[command(about = "Generate GitOps repositories for Kubernetes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bootstrap a new GitOps repository with a CI/CD environment
    Init {
        /// GitOps repository URL
        #[arg(long, env = "KUBESEED_GITOPS_REPO_URL")]
        gitops_repo_url: String,
        /// Secret used to validate GitOps repository webhooks
        #[arg(long, env = "KUBESEED_GITOPS_WEBHOOK_SECRET")]
        gitops_webhook_secret: String,
        /// Docker config.json with registry credentials
        #[arg(long = "dockerconfigjson", env = "KUBESEED_DOCKER_CONFIG_JSON")]
        docker_config_json: Option<String>,
        /// Prefix for the generated namespaces
        #[arg(long, default_value = "")]
        prefix: String,
        /// Directory to write the repository to
        #[arg(long, default_value = ".")]
        output: PathBuf,
    },
    /// Generate Argo CD applications for a manifest
    Build {
        /// Path to the manifest
        #[arg(long, env = "KUBESEED_MANIFEST", default_value = "pipelines.yaml")]
        manifest: PathBuf,
        /// Directory to write the resources to
        #[arg(long, default_value = ".")]
        output: PathBuf,
    },
    /// Manage services
    Service {
        #[command(subcommand)]
        command: ServiceCommands,
    },
    /// Validate a manifest
    Validate {
        /// Path to the manifest
        #[arg(long, env = "KUBESEED_MANIFEST", default_value = "pipelines.yaml")]
        manifest: PathBuf,
    },
}

#[derive(Subcommand)]
enum ServiceCommands {
    /// Add a service to an environment and application
    Add {
        /// Path to the manifest
        #[arg(long, env = "KUBESEED_MANIFEST", default_value = "pipelines.yaml")]
        manifest: PathBuf,
        /// Target environment
        #[arg(long)]
        env: String,
        /// Application referencing the service
        #[arg(long)]
        app: String,
        /// Service name
        #[arg(long)]
        name: String,
        /// Source repository of the service
        #[arg(long)]
        source_url: Option<String>,
        /// Name of the secret validating the service's webhooks
        #[arg(long)]
        webhook_secret: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            gitops_repo_url,
            gitops_webhook_secret,
            docker_config_json,
            prefix,
            output,
        } => {
            let mut opts =
                kubeseed_config::BootstrapOptions::new(gitops_repo_url, gitops_webhook_secret)
                    .with_prefix(prefix)
                    .with_output_path(output);
            opts.docker_config_json = docker_config_json;
            commands::init::run(&opts)?;
        }
        Commands::Build { manifest, output } => {
            commands::build::run(&manifest, &output)?;
        }
        Commands::Service { command } => match command {
            ServiceCommands::Add {
                manifest,
                env,
                app,
                name,
                source_url,
                webhook_secret,
            } => {
                let request = commands::service::AddService {
                    environment: env,
                    application: app,
                    name,
                    source_url,
                    webhook_secret,
                };
                commands::service::add(&manifest, request)?;
            }
        },
        Commands::Validate { manifest } => {
            commands::validate(&manifest)?;
        }
    }

    Ok(())
}
