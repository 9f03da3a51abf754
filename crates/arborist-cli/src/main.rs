//! Arborist CLI
//!
//! Command-line interface for classifying and pruning a document tree held in
//! a seed file.
//!
//! Exit codes: 0 on success, 1 when an executed run left targets behind,
//! 2 on fatal errors.

use arborist_core::logging_facility::{self, Profile};
use arborist_engine::CancelSignal;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "arborist")]
#[command(about = "Arborist - rule-driven subtree deletion for document stores", long_about = None)]
struct Cli {
    /// Logging profile (development or production)
    #[arg(long, global = true, default_value = "development")]
    log_profile: Profile,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Classify, discover, delete and verify (dry run unless --execute)
    Run(commands::run::RunArgs),
    /// Print the disposition of each top-level entity
    Classify(commands::classify::ClassifyArgs),
    /// Print the children-before-parent order under one entity
    Tree(commands::tree::TreeArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging_facility::init(cli.log_profile);

    let cancel = CancelSignal::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling at next stage boundary");
            on_interrupt.cancel();
        }
    });

    let result = match cli.command {
        Commands::Run(args) => commands::run::execute(args, &cancel).await,
        Commands::Classify(args) => commands::classify::execute(args).await.map(|_| true),
        Commands::Tree(args) => commands::tree::execute(args).await.map(|_| true),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}
