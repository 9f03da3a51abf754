//! Engine-level commands over an injected document store.

use arborist_core::config::RunConfig;
use arborist_core::errors::ExError;
use arborist_core::model::{EntityReference, RunReport, TargetOutcome};
use arborist_core::policy::ExecuteGuard;
use arborist_core::store_client::DocumentStore;
use arborist_core::traversal::{discover, Discovery};
use std::time::Duration;

use crate::commands::classify::classify_top_level;
use crate::commands::run::{run, CancelSignal, RunOptions};
use crate::commands::verify::reverify_stragglers;
use crate::retry::{RetryPolicy, RetryingStore};
use crate::Result;

/// Commands supported by the engine.
#[derive(Debug, Clone)]
pub enum EngineCommand {
    /// Full lifecycle run (dry-run or execute).
    Run {
        config: RunConfig,
        options: RunOptions,
    },
    /// Classify the root collection without discovering or deleting.
    Classify { config: RunConfig },
    /// Walk the subtree under one entity path.
    Discover {
        config: RunConfig,
        path: EntityReference,
    },
    /// Second verification pass over the stragglers of an earlier report.
    Reverify {
        config: RunConfig,
        report: RunReport,
        /// Overrides the configured settle delay
        settle_delay: Option<Duration>,
    },
}

/// Result of applying an engine command.
#[derive(Debug, Clone)]
pub enum EngineCommandResult {
    Run(RunReport),
    Classify(Vec<TargetOutcome>),
    Discover(Discovery),
    Reverify {
        report: RunReport,
        /// Number of stragglers read again
        reverified: usize,
    },
}

/// Apply an engine command.
///
/// Only `Run` can mutate the store, and only in execute mode after `guard`
/// allows it.
///
/// # Errors
///
/// Returns `ConfigInvalid` for an invalid configuration, otherwise whatever
/// the command's stage returns (see `run::run`).
pub async fn apply_engine_command<S>(
    cmd: EngineCommand,
    store: &S,
    guard: &dyn ExecuteGuard,
    cancel: &CancelSignal,
) -> Result<EngineCommandResult>
where
    S: DocumentStore + ?Sized,
{
    match cmd {
        EngineCommand::Run { config, options } => {
            let report = run(store, &config, guard, &options, cancel).await?;
            Ok(EngineCommandResult::Run(report))
        }
        EngineCommand::Classify { config } => {
            config.validate().map_err(ExError::from)?;
            let classifier = config.compile().map_err(ExError::from)?;
            let store = RetryingStore::new(store, RetryPolicy::from(&config.retry));
            let outcomes =
                classify_top_level(&store, &config.root_collection, &classifier).await?;
            Ok(EngineCommandResult::Classify(outcomes))
        }
        EngineCommand::Discover { config, path } => {
            config.validate().map_err(ExError::from)?;
            let store = RetryingStore::new(store, RetryPolicy::from(&config.retry));
            let discovery = discover(&store, &path, config.max_depth).await;
            Ok(EngineCommandResult::Discover(discovery))
        }
        EngineCommand::Reverify {
            config,
            mut report,
            settle_delay,
        } => {
            config.validate().map_err(ExError::from)?;
            let store = RetryingStore::new(store, RetryPolicy::from(&config.retry));
            let settle_delay =
                settle_delay.unwrap_or_else(|| Duration::from_millis(config.settle_delay_ms));
            let reverified = reverify_stragglers(&store, &mut report, settle_delay).await;
            Ok(EngineCommandResult::Reverify { report, reverified })
        }
    }
}
