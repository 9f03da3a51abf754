//! Run command
//!
//! Usage: arborist run --seed <FILE> --config <FILE> [--dry-run | --execute]

use arborist_core::arborist_core_types::TraceId;
use arborist_core::policy::MaxTargetsGuard;
use arborist_core::render::{render_json, render_markdown, render_table};
use arborist_core::RunReport;
use arborist_engine::{
    apply_engine_command, CancelSignal, EngineCommand, EngineCommandResult, RunOptions,
};
use arborist_store::seed::{export_seed, write_seed_file};
use clap::{Args, ValueEnum};

use super::SourceArgs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Table,
    Markdown,
    Json,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Report what would be deleted without mutating (default)
    #[arg(long, conflicts_with = "execute")]
    pub dry_run: bool,

    /// Delete the targets and verify they are gone
    #[arg(long)]
    pub execute: bool,

    #[arg(long, value_enum, default_value_t = ReportFormat::Table)]
    pub format: ReportFormat,

    /// Re-read stragglers once more after another settle delay
    #[arg(long)]
    pub second_pass: bool,

    /// Leave the seed file untouched after an executed run
    #[arg(long)]
    pub no_write_back: bool,

    #[arg(long)]
    pub settle_delay_ms: Option<u64>,

    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Correlation id recorded in the report
    #[arg(long)]
    pub trace_id: Option<String>,
}

/// Execute a run; returns whether the report counts as a success
pub async fn execute(
    args: RunArgs,
    cancel: &CancelSignal,
) -> Result<bool, Box<dyn std::error::Error>> {
    let (store, mut config) = args.source.load()?;
    if let Some(settle_delay_ms) = args.settle_delay_ms {
        config.settle_delay_ms = settle_delay_ms;
    }
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    config.validate()?;

    let mut options = if args.execute {
        RunOptions::execute()
    } else {
        RunOptions::dry_run()
    };
    if args.second_pass {
        options = options.with_second_pass();
    }
    if let Some(trace_id) = args.trace_id {
        options = options.with_trace_id(TraceId::from_string(trace_id));
    }

    let guard = MaxTargetsGuard::new(config.max_targets);
    let cmd = EngineCommand::Run { config, options };
    let report = match apply_engine_command(cmd, &store, &guard, cancel).await? {
        EngineCommandResult::Run(report) => report,
        _ => return Err("unexpected engine result for run".into()),
    };

    println!("{}", render(&report, args.format)?);

    if args.execute && !args.no_write_back {
        write_seed_file(&args.source.seed, &export_seed(&store))?;
        tracing::info!(seed = %args.source.seed.display(), "wrote remaining tree back to seed");
    }

    Ok(report.is_success())
}

fn render(report: &RunReport, format: ReportFormat) -> Result<String, Box<dyn std::error::Error>> {
    Ok(match format {
        ReportFormat::Table => render_table(report),
        ReportFormat::Markdown => render_markdown(report),
        ReportFormat::Json => render_json(report)?,
    })
}
