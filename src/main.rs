use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use lumi_reporter::report::SendOutcome;
use lumi_reporter::runner::{self, DeliveryMode, EventKind, ReplayOutcome};
use lumi_reporter::utils::config::{ConfigOverrides, ReporterConfig};

#[derive(Parser)]
#[command(name = "lumi-reporter")]
#[command(author = "NL Team")]
#[command(version = "0.1.0")]
#[command(about = "Aggregates test-run events and posts one summary report", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a run's event stream and report it
    Run {
        /// Newline-delimited JSON events (omit or "-" for stdin)
        events: Option<PathBuf>,

        /// YAML config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Report destination URL (overrides config and LUMI_REPORTER_URL)
        #[arg(short, long)]
        url: Option<String>,

        /// Name of the project/product
        #[arg(long)]
        product: Option<String>,

        /// Name of the repository/component
        #[arg(long)]
        component: Option<String>,

        /// Environment under test (QA, PROD, DEV)
        #[arg(short, long)]
        environment: Option<String>,

        /// Name of the collection being run
        #[arg(long)]
        collection: Option<String>,

        /// Print the report instead of sending it
        #[arg(long, default_value = "false")]
        dry_run: bool,

        /// Disable console progress output
        #[arg(short, long, default_value = "false")]
        quiet: bool,
    },

    /// List the lifecycle events the reporter understands
    Events,

    /// Print the escaped form of an item name
    Sanitize {
        /// Raw name
        text: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            events,
            config,
            url,
            product,
            component,
            environment,
            collection,
            dry_run,
            quiet,
        } => {
            let overrides = ConfigOverrides {
                url,
                product,
                component,
                environment,
                collection,
            };
            let config = ReporterConfig::resolve(config.as_deref(), overrides)?;
            let mode = if dry_run {
                DeliveryMode::DryRun
            } else {
                DeliveryMode::Send
            };

            let outcome = runner::run_reporter(events.as_deref(), config, mode, quiet).await?;
            print_outcome(&outcome)?;
        }

        Commands::Events => {
            for kind in EventKind::ALL {
                println!("{}", kind);
            }
        }

        Commands::Sanitize { text } => {
            println!("{}", lumi_reporter::sanitize(&text));
        }
    }

    Ok(())
}

/// Reporting failures are printed, never turned into a failing exit status
fn print_outcome(outcome: &ReplayOutcome) -> anyhow::Result<()> {
    match outcome {
        ReplayOutcome::Completed(completion) => match &completion.outcome {
            None => {
                println!("{}", serde_json::to_string_pretty(&[completion.report.to_wire()])?);
            }
            Some(SendOutcome::Delivered(delivery)) => {
                println!(
                    "{} Report delivered ({})",
                    "✓".green().bold(),
                    delivery.status
                );
            }
            Some(SendOutcome::Failed(err)) => {
                println!("{} Report not delivered: {}", "⚠".yellow(), err);
            }
        },
        ReplayOutcome::Incomplete(summary) => {
            println!(
                "{} Run did not finish ({} items seen); no report sent",
                "⚠".yellow(),
                summary.items
            );
        }
    }
    Ok(())
}
