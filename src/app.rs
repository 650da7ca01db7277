//! Command dispatch
//!
//! Turns parsed [`CliArgs`] into calls on the library and writes the result
//! to the supplied writer. Kept separate from `main` so end-to-end tests can
//! drive every command without spawning a process.

use std::io::Write;

use chrono::Local;
use serde_json::{Map, Value as Json};
use tracing::{info, warn};

use crate::cli::{
    CliArgs, Command, KpiArgs, LoadArgs, OutputFormat, ProjectArgs, QueryArgs, SimulateArgs,
    StrategyType, SummarizeArgs,
};
use crate::core::parsers::{parse_currency, parse_percent};
use crate::core::r#async::DEFAULT_SEED_BATCH_SIZE;
use crate::core::{
    project, standard_catalog, summarize, DashboardLoader, EntityKind, LoaderConfig,
    MemorySource, ProgressTracker, QueryEngine, SimulationSession, Transition,
};
use crate::io::{
    write_kpis_csv, write_list_envelope, write_projection_csv, write_records_csv, write_rows_csv,
    write_summary_csv,
};
use crate::strategy::{create_strategy, BatchConfig};
use crate::types::{Collection, DashboardError, Value};

/// Run one command, writing its output to `output`
///
/// # Errors
///
/// Any error that should end the process: unreadable input, an invalid
/// filter or sort, a failed fetch. Blocked simulation steps are reported in
/// the output instead.
pub fn run(args: CliArgs, output: &mut dyn Write) -> Result<(), DashboardError> {
    match args.command {
        Command::Query(query) => run_query(query, output),
        Command::Summarize(summarize) => run_summarize(summarize, output),
        Command::Kpi(kpi) => run_kpi(kpi, output),
        Command::Project(project) => run_project(project, output),
        Command::Simulate(simulate) => run_simulate(simulate, output),
    }
}

fn load(args: &LoadArgs) -> Result<Collection, DashboardError> {
    let config = matches!(args.strategy, StrategyType::Async).then(|| args.to_batch_config());
    let strategy = create_strategy(args.strategy, config);
    strategy.load(&args.input_file, args.entity)
}

fn write_json<T: serde::Serialize + ?Sized>(
    value: &T,
    output: &mut dyn Write,
) -> Result<(), DashboardError> {
    serde_json::to_writer_pretty(&mut *output, value)?;
    writeln!(output)?;
    Ok(())
}

fn run_query(args: QueryArgs, output: &mut dyn Write) -> Result<(), DashboardError> {
    let kind = args.load.entity;
    let engine = QueryEngine::for_entity(kind);
    let filters = engine
        .schema()
        .build_filters(args.filter.search.as_deref(), &args.filter.filters)?;
    engine.schema().validate(&filters, args.sort.as_ref())?;

    let collection = load(&args.load)?;
    let rows = engine.query(&collection.records, &filters, args.sort.as_ref());
    info!(entity = %kind, matched = rows.len(), total = collection.len(), "query complete");

    match args.format {
        OutputFormat::Csv => write_records_csv(&collection.columns, &rows, output),
        OutputFormat::Json => write_list_envelope(kind, &rows, output),
    }
}

fn run_summarize(args: SummarizeArgs, output: &mut dyn Write) -> Result<(), DashboardError> {
    let kind = args.load.entity;
    let engine = QueryEngine::for_entity(kind);
    if engine.schema().field_kind(&args.group_by).is_none() {
        return Err(DashboardError::unknown_field(kind.envelope_key(), &args.group_by));
    }
    let filters = engine
        .schema()
        .build_filters(args.filter.search.as_deref(), &args.filter.filters)?;
    engine.schema().validate(&filters, None)?;

    let collection = load(&args.load)?;
    let rows = engine.with_derived(&engine.query(&collection.records, &filters, None));
    let summary = summarize(&rows, &args.group_by);
    if summary.unassigned > 0 {
        warn!(
            entity = %kind,
            field = %args.group_by,
            unassigned = summary.unassigned,
            "records without a group value"
        );
    }

    match args.format {
        OutputFormat::Csv => write_summary_csv(&summary, output),
        OutputFormat::Json => write_json(&summary, output),
    }
}

fn run_kpi(args: KpiArgs, output: &mut dyn Write) -> Result<(), DashboardError> {
    let as_of = args.as_of.unwrap_or_else(|| Local::now().date_naive());
    let loader_config = args.max_concurrent.map(LoaderConfig::new).unwrap_or_default();
    let runtime = BatchConfig::default().runtime()?;

    let values = runtime.block_on(async {
        let source = MemorySource::from_dir(&args.dir, DEFAULT_SEED_BATCH_SIZE).await?;
        let loader = DashboardLoader::new(source, loader_config);
        for (_, result) in loader.load_all(&EntityKind::ALL).await {
            result?;
        }

        let values: Vec<(&str, Option<rust_decimal::Decimal>)> = standard_catalog(as_of)
            .iter()
            .map(|kpi| (kpi.name, kpi.evaluate(&loader.records(kpi.entity))))
            .collect();
        Ok::<_, DashboardError>(values)
    })?;
    info!(as_of = %as_of, kpis = values.len(), "kpis computed");

    match args.format {
        OutputFormat::Csv => write_kpis_csv(&values, output),
        OutputFormat::Json => {
            let object: Map<String, Json> = values
                .iter()
                .map(|(name, value)| {
                    let value = value.map(Value::Number).unwrap_or(Value::Null);
                    (name.to_string(), Json::from(&value))
                })
                .collect();
            write_json(&object, output)
        }
    }
}

fn run_project(args: ProjectArgs, output: &mut dyn Write) -> Result<(), DashboardError> {
    let principal = parse_currency(&args.principal).ok_or_else(|| DashboardError::ParseError {
        line: None,
        message: format!("invalid principal '{}'", args.principal),
    })?;
    let rate = parse_percent(&args.rate).ok_or_else(|| DashboardError::ParseError {
        line: None,
        message: format!("invalid rate '{}'", args.rate),
    })?;

    let points = project(principal, rate, args.months);
    match args.format {
        OutputFormat::Csv => write_projection_csv(&points, output),
        OutputFormat::Json => write_json(&points, output),
    }
}

fn stage_label(tracker: Option<&ProgressTracker>) -> String {
    tracker
        .and_then(ProgressTracker::stage)
        .map(|stage| stage.to_string())
        .unwrap_or_default()
}

fn run_simulate(args: SimulateArgs, output: &mut dyn Write) -> Result<(), DashboardError> {
    let mut session = SimulationSession::new(args.method);
    for precondition in &args.grants {
        session.gate_mut().set(*precondition, true);
    }
    // The status query has the last word on kyc
    if let Some(status) = &args.kyc_status {
        session.gate_mut().apply_kyc_status(status);
    }

    let mut rows = Vec::with_capacity(args.triggers.len());
    for (step, trigger) in args.triggers.iter().enumerate() {
        let outcome = match session.fire(*trigger) {
            Ok(Transition::Advanced { to, .. }) => format!("advanced to {}", to),
            Ok(Transition::Ignored { .. }) => "ignored".to_string(),
            Err(e) => {
                warn!(trigger = %trigger, error = %e, "simulation step blocked");
                e.to_string()
            }
        };
        rows.push(vec![
            (step + 1).to_string(),
            trigger.to_string(),
            outcome,
            stage_label(Some(session.deposit())),
            stage_label(session.withdrawal()),
            session.has_active_deposit().to_string(),
        ]);
    }

    write_rows_csv(
        &[
            "step",
            "trigger",
            "outcome",
            "deposit_stage",
            "withdrawal_stage",
            "active_deposit",
        ],
        rows,
        output,
    )
}
