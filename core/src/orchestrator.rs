//! The hazard rate run orchestrator.
//!
//! EXECUTION ORDER (fixed):
//!   1. Open the data store connection (schema is migrated on open)
//!   2. Status -> CALCULATING
//!   3. Load run data (parameters, score bands, categories, absorbing
//!      states, age analysis). Failure here -> AGED
//!   4. Delete results from any previous execution of this run
//!   5. Generate scenarios
//!   6. Process every scenario in order
//!   7. Status -> CALCULATED
//!
//! Any other failure -> QUEUE_ERROR. The connection is dropped on every
//! exit path once calculate_run returns.

use crate::{
    calculation::CalculationEngine,
    category::CategoryHierarchy,
    error::{HazardError, HazardResult},
    model::Run,
    processor::{ProcessSummary, RunInputs, ScenarioProcessor},
    scenario::{generate_scenarios, SCENARIO_APPROACHES},
    score_band::ScoreBands,
    status::RunStatus,
    store::HazardStore,
    types::RunId,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub run_id: RunId,
    pub status: RunStatus,
    pub scenarios: ProcessSummary,
}

/// Everything read from the store before scenarios are generated.
struct LoadedRun {
    run: Run,
    bands: ScoreBands,
    categories: CategoryHierarchy,
    inputs: RunInputs,
}

pub struct HazardRateRunner {
    db_path: String,
    engine: Box<dyn CalculationEngine>,
}

impl HazardRateRunner {
    pub fn new(db_path: impl Into<String>, engine: Box<dyn CalculationEngine>) -> Self {
        Self { db_path: db_path.into(), engine }
    }

    pub fn calculate_run(&self, run_id: &str) -> HazardResult<RunSummary> {
        log::info!("Starting Hazard Rate Run: {run_id}");

        let store = HazardStore::open(&self.db_path).map_err(|e| {
            log::error!("Could not open data store for run {run_id}: {e}");
            e
        })?;

        match self.execute(&store, run_id) {
            Ok(summary) => {
                log::info!("Hazard Rate Run Complete.");
                Ok(summary)
            }
            Err(err) => {
                log::error!("Hazard Rate Run {run_id} failed: {err}");
                // A loading failure has already left the run AGED.
                if !err.is_data_load() {
                    if let Err(status_err) = store.update_run_status(run_id, RunStatus::QueueError) {
                        log::error!("Could not mark run {run_id} as {}: {status_err}", RunStatus::QueueError);
                    }
                }
                Err(err)
            }
        }
    }

    fn execute(&self, store: &HazardStore, run_id: &str) -> HazardResult<RunSummary> {
        store.update_run_status(run_id, RunStatus::Calculating)?;

        log::info!("Loading Hazard Rate Run Data");
        let loaded = match load_run(store, run_id) {
            Ok(loaded) => loaded,
            Err(err) => {
                store.update_run_status(run_id, RunStatus::Aged)?;
                return Err(HazardError::DataLoad(Box::new(err)));
            }
        };
        log::info!(
            "Done Loading Hazard Rate Run Data ({}) - Age Analysis Size: {}",
            loaded.run.title,
            loaded.inputs.age_analysis.len()
        );

        log::info!("Deleting Old Hazard Rate Run Results");
        store.delete_old_results(run_id)?;

        log::info!("Generating Hazard Rate Run Scenarios.");
        let scenarios = generate_scenarios(&loaded.bands, &loaded.categories, &SCENARIO_APPROACHES);

        log::info!("Processing {} Hazard Rate Run Scenarios.", scenarios.len());
        let processor = ScenarioProcessor::new(store, self.engine.as_ref(), run_id);
        let processed = processor.process_all(scenarios, &loaded.inputs)?;
        log::info!(
            "Successfully Processed All Scenarios ({} with errors)",
            processed.with_errors
        );

        store.update_run_status(run_id, RunStatus::Calculated)?;
        Ok(RunSummary {
            run_id: run_id.to_string(),
            status: RunStatus::Calculated,
            scenarios: processed,
        })
    }
}

fn load_run(store: &HazardStore, run_id: &str) -> HazardResult<LoadedRun> {
    let missing = |what| HazardError::MissingRunData { run_id: run_id.to_string(), what };

    log::info!("...Fetching Hazard Rate Run");
    let run = store
        .fetch_run(run_id)?
        .ok_or_else(|| HazardError::RunNotFound { run_id: run_id.to_string() })?;

    log::info!("...Fetching Score Bands");
    let bands = ScoreBands::classify(store.fetch_score_band_items(run_id)?)?;

    log::info!("...Fetching Run Parameters");
    let parameters = store
        .fetch_run_parameters(run_id)?
        .ok_or_else(|| missing("run parameters"))?;

    log::info!("...Fetching Run Category Data");
    let categories = store.fetch_category_hierarchy(run_id)?;

    log::info!("...Fetching Run Absorbing States");
    let absorbing_states = store
        .fetch_absorbing_states(run_id)?
        .ok_or_else(|| missing("absorbing states"))?;

    log::info!("...Fetching Run Age Analysis");
    let age_analysis = store.fetch_aged_transactions(run_id, &parameters)?;

    Ok(LoadedRun {
        run,
        bands,
        categories,
        inputs: RunInputs { parameters, absorbing_states, age_analysis },
    })
}
