//! hazard-runner: headless hazard rate run calculator.
//!
//! Usage:
//!   hazard-runner --db hazard.db --run-id 6f1c...
//!   hazard-runner --db hazard.db --message '{"batchId":"6f1c...","targetId":"tenant-a"}'
//!   hazard-runner --import run.json --json
//!
//! With `--import`, the run definition is loaded into the store first and
//! its run id is calculated unless another one is given. `--json` prints
//! the summary as a single JSON object instead of the text report.

use anyhow::{bail, Result};
use hazard_core::{
    calculation::BaselineEngine, config::RunDefinition, orchestrator::HazardRateRunner,
    orchestrator::RunSummary, store::HazardStore, trigger::RunTrigger,
};
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let db = parse_arg(&args, "--db").unwrap_or("file:hazard_runner?mode=memory&cache=shared");
    let import = parse_arg(&args, "--import");

    println!("Hazard Rate Runner");
    println!("  db:        {db}");

    // Holding the store keeps a shared in-memory database alive for the run.
    let imported = match import {
        Some(path) => {
            let definition = RunDefinition::load(path)?;
            let store = HazardStore::open(db)?;
            store.import_run_definition(&definition)?;
            log::info!("Imported run definition {path} as run {}", definition.run.id);
            println!("  imported:  {path} ({} transactions)", definition.transactions.len());
            Some((store, definition.run.id))
        }
        None => None,
    };

    let run_id = match (parse_arg(&args, "--run-id"), parse_arg(&args, "--message")) {
        (Some(run_id), _) => run_id.to_string(),
        (None, Some(message)) => RunTrigger::parse(message)?.batch_id,
        (None, None) => match &imported {
            Some((_, run_id)) => run_id.clone(),
            None => bail!("one of --run-id, --message or --import is required"),
        },
    };
    println!("  run:       {run_id}");
    println!();

    let runner = HazardRateRunner::new(db, Box::new(BaselineEngine));
    let summary = runner.calculate_run(&run_id)?;
    if args.iter().any(|a| a == "--json") {
        println!("{}", summary_json(&summary));
    } else {
        print_summary(&summary);
    }

    Ok(())
}

fn parse_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn print_summary(summary: &RunSummary) {
    println!("=== Run Summary ===");
    println!("  run:                 {}", summary.run_id);
    println!("  status:              {}", summary.status);
    println!("  scenarios processed: {}", summary.scenarios.processed);
    println!("  with errors:         {}", summary.scenarios.with_errors);
    if summary.scenarios.without_id > 0 {
        println!("  not saved:           {}", summary.scenarios.without_id);
    }
}

fn summary_json(summary: &RunSummary) -> serde_json::Value {
    serde_json::json!({
        "runId": summary.run_id,
        "status": summary.status.as_str(),
        "processed": summary.scenarios.processed,
        "withErrors": summary.scenarios.with_errors,
        "withoutId": summary.scenarios.without_id,
    })
}
