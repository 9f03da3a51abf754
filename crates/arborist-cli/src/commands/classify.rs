//! Classify command
//!
//! Usage: arborist classify --seed <FILE> --config <FILE>

use arborist_core::policy::NoopExecuteGuard;
use arborist_engine::{apply_engine_command, CancelSignal, EngineCommand, EngineCommandResult};
use clap::Args;

use super::SourceArgs;

#[derive(Debug, Args)]
pub struct ClassifyArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

pub async fn execute(args: ClassifyArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (store, config) = args.source.load()?;

    let cmd = EngineCommand::Classify { config };
    let outcomes =
        match apply_engine_command(cmd, &store, &NoopExecuteGuard, &CancelSignal::new()).await? {
            EngineCommandResult::Classify(outcomes) => outcomes,
            _ => return Err("unexpected engine result for classify".into()),
        };

    let width = outcomes
        .iter()
        .map(|o| o.reference.to_string().len())
        .max()
        .unwrap_or(0);
    for outcome in &outcomes {
        println!(
            "{:<width$}  {}",
            outcome.reference.to_string(),
            outcome.disposition,
            width = width
        );
    }

    Ok(())
}
