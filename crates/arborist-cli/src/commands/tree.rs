//! Tree command
//!
//! Usage: arborist tree --seed <FILE> --config <FILE> <PATH>

use arborist_core::model::EntityReference;
use arborist_core::policy::NoopExecuteGuard;
use arborist_engine::{apply_engine_command, CancelSignal, EngineCommand, EngineCommandResult};
use clap::Args;

use super::SourceArgs;

#[derive(Debug, Args)]
pub struct TreeArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Entity path, e.g. organizations/acme-corp
    pub path: String,
}

pub async fn execute(args: TreeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let path: EntityReference = args.path.parse()?;
    let (store, config) = args.source.load()?;

    let cmd = EngineCommand::Discover { config, path };
    let discovery =
        match apply_engine_command(cmd, &store, &NoopExecuteGuard, &CancelSignal::new()).await? {
            EngineCommandResult::Discover(discovery) => discovery,
            _ => return Err("unexpected engine result for tree".into()),
        };

    for reference in &discovery.order {
        println!("{}", reference);
    }

    if !discovery.is_complete() {
        for failure in &discovery.failures {
            eprintln!("! {}: {}", failure.path, failure.error);
        }
        return Err(format!(
            "discovery under {} is incomplete ({} failures)",
            discovery.root,
            discovery.failures.len()
        )
        .into());
    }

    Ok(())
}
