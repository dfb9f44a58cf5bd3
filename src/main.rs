use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod audit;
mod commands;
mod config;
mod utils;
mod vault_api;

use config::{GlobalConfig, VaultConfig};
use vault_api::VaultClient;

#[derive(Parser)]
#[command(name = "vault-tools")]
#[command(about = "Vault namespace audit and activity export tools", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit namespaces, auth methods and secrets engines
    NamespaceAudit {
        /// Namespace path to audit (default: root)
        #[arg(short = 'n', long, default_value = "")]
        namespace: String,

        /// Number of worker tasks
        #[arg(short = 'w', long)]
        workers: Option<usize>,

        /// Disable rate limiting
        #[arg(long)]
        fast: bool,
    },

    /// Export client activity counts by namespace and mount
    ActivityExport {
        /// Start date (YYYY-MM-DD)
        #[arg(short = 's', long)]
        start_date: String,

        /// End date (YYYY-MM-DD)
        #[arg(short = 'e', long)]
        end_date: String,
    },

    /// Export per-client entity activity records
    EntityExport {
        /// Start date (YYYY-MM-DD)
        #[arg(short = 's', long)]
        start_date: String,

        /// End date (YYYY-MM-DD)
        #[arg(short = 'e', long)]
        end_date: String,
    },

    /// Run namespace audit, activity export and entity export in sequence
    All {
        /// Start date (YYYY-MM-DD) for the exports
        #[arg(short = 's', long)]
        start_date: String,

        /// End date (YYYY-MM-DD) for the exports
        #[arg(short = 'e', long)]
        end_date: String,

        /// Namespace path to audit (default: root)
        #[arg(short = 'n', long, default_value = "")]
        namespace: String,

        /// Number of worker tasks for the audit
        #[arg(short = 'w', long)]
        workers: Option<usize>,
    },

    /// Generate shell completion scripts
    GenerateCompletion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let global = GlobalConfig::from_env();
    init_logging(cli.debug || global.debug);

    match cli.command {
        Commands::NamespaceAudit {
            namespace,
            workers,
            fast,
        } => commands::namespace_audit::run(&global, &namespace, workers, fast).await,
        Commands::ActivityExport {
            start_date,
            end_date,
        } => commands::activity_export::run(&global, &start_date, &end_date).await,
        Commands::EntityExport {
            start_date,
            end_date,
        } => commands::entity_export::run(&global, &start_date, &end_date).await,
        Commands::All {
            start_date,
            end_date,
            namespace,
            workers,
        } => {
            let vault_config = VaultConfig::from_env()?;
            let client = VaultClient::new(&vault_config)?;
            let cluster_name = client.validate_connection().await?;

            commands::namespace_audit::audit_with_client(
                &client,
                &cluster_name,
                &global,
                &namespace,
                workers,
                false,
            )
            .await?;
            commands::activity_export::export_with_client(
                &client,
                &cluster_name,
                &global,
                &start_date,
                &end_date,
            )
            .await?;
            commands::entity_export::export_with_client(
                &client,
                &cluster_name,
                &global,
                &start_date,
                &end_date,
            )
            .await
        }
        Commands::GenerateCompletion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "vault-tools", &mut std::io::stdout());
            Ok(())
        }
    }
}
