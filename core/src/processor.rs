//! Scenario processing.
//!
//! RULES:
//!   - Scenarios are processed one at a time, in generation order.
//!   - A calculation engine failure is recorded on the scenario and
//!     processing continues. The scenario is still saved.
//!   - A store failure is fatal and propagates to the orchestrator.
//!   - So is an absorbing state with no default bucket in the table.
//!   - Every engine call gets its own copy of the transaction population.

use crate::{
    calculation::{CalculationEngine, LgdInput, LgdOutput, MatrixOutput, PdInput},
    error::{HazardError, HazardResult},
    matrix::{reshape_matrix, MatrixKind},
    model::{AbsorbingStates, AgedTransaction, RunParameters, ScoringTableItem, ScoringType},
    scenario::Scenario,
    store::HazardStore,
    types::{Rating, ScenarioId},
};
use chrono::NaiveDate;

pub const LGD_ERROR: &str = "Error Calculating LGD Term Structure";
pub const PD_ERROR: &str = "Error calculating PD Matrices";

/// Read-only inputs shared by every scenario of a run.
#[derive(Debug, Clone)]
pub struct RunInputs {
    pub parameters: RunParameters,
    pub absorbing_states: AbsorbingStates,
    pub age_analysis: Vec<AgedTransaction>,
}

/// Rating bounds a scenario is calculated with.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingPlan {
    pub absorbing_state: u32,
    pub default_bucket: ScoringTableItem,
    pub max_rating: Rating,
}

impl RatingPlan {
    /// Fails when the absorbing state points outside the scoring table.
    pub fn for_scenario(scenario: &Scenario, absorbing_states: &AbsorbingStates) -> HazardResult<Self> {
        let absorbing_state = absorbing_states.for_scoring_type(scenario.scoring_type);
        let table = &scenario.scoring_table;
        let mut max_rating = scenario.last_rating();

        let default_bucket = match scenario.scoring_type {
            ScoringType::Ageing => {
                // Two absorbing states: an implicit terminal bucket beyond the table.
                if absorbing_state == 2 {
                    max_rating += 1;
                }
                table.last().cloned()
            }
            ScoringType::Status | ScoringType::InternalScore => table
                .len()
                .checked_sub(absorbing_state as usize)
                .and_then(|i| table.get(i))
                .cloned(),
        };

        let default_bucket = default_bucket.ok_or(HazardError::NoDefaultBucket {
            scoring_type: scenario.scoring_type,
            absorbing_state,
            buckets: table.len(),
        })?;
        Ok(Self { absorbing_state, default_bucket, max_rating })
    }
}

/// Totals for one pass over a run's scenarios.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessSummary {
    pub processed: usize,
    pub with_errors: usize,
    pub without_id: usize,
}

pub struct ScenarioProcessor<'a> {
    store: &'a HazardStore,
    engine: &'a dyn CalculationEngine,
    run_id: &'a str,
}

impl<'a> ScenarioProcessor<'a> {
    pub fn new(store: &'a HazardStore, engine: &'a dyn CalculationEngine, run_id: &'a str) -> Self {
        Self { store, engine, run_id }
    }

    pub fn process_all(&self, scenarios: Vec<Scenario>, inputs: &RunInputs) -> HazardResult<ProcessSummary> {
        let mut summary = ProcessSummary::default();
        for (i, scenario) in scenarios.into_iter().enumerate() {
            let counter = i + 1;
            let (scenario, id) = self.process(scenario, inputs, counter)?;
            summary.processed += 1;
            if scenario.error.is_some() {
                summary.with_errors += 1;
            }
            if id.is_none() {
                summary.without_id += 1;
            }
        }
        Ok(summary)
    }

    /// Calculate and persist one scenario. Returns the scenario with its
    /// results attached, and the id it was saved under.
    pub fn process(
        &self,
        mut scenario: Scenario,
        inputs: &RunInputs,
        counter: usize,
    ) -> HazardResult<(Scenario, Option<ScenarioId>)> {
        let plan = RatingPlan::for_scenario(&scenario, &inputs.absorbing_states)?;
        let population = scenario_population(&inputs.age_analysis, scenario.category1.as_deref());
        log::debug!(
            "Scenario {counter}: {:?} / {:?} / {:?}, {} transactions, max rating {}",
            scenario.scoring_type,
            scenario.category1,
            scenario.lgd_approach,
            population.len(),
            plan.max_rating
        );

        let mut errors = Vec::new();
        let params = &inputs.parameters;

        let lgd = self
            .calculate_lgd(&scenario, &plan, params, &population)
            .unwrap_or_else(|| {
                errors.push(LGD_ERROR);
                LgdOutput::default()
            });

        let matrices = self
            .calculate_matrices(&scenario, &plan, params, &population)
            .unwrap_or_else(|| {
                errors.push(PD_ERROR);
                MatrixOutput::default()
            });

        scenario.run_id = Some(self.run_id.to_string());
        scenario.term_structure = lgd.term_structure;
        scenario.weighted_term_structure = lgd.weighted_term_structure;
        scenario.cohort_migration_matrix = reshape_matrix(&matrices.cohort_matrix);
        scenario.hazard_rate_migration_matrix = reshape_matrix(&matrices.migration_matrix);
        scenario.error = compile_error(&errors);

        log::info!("Saving Scenario {counter} to the Database");
        let id = self.persist(&scenario)?;
        scenario.id = id.clone();
        log::info!("Saving Scenario {counter} Completed");

        Ok((scenario, id))
    }

    fn calculate_lgd(
        &self,
        scenario: &Scenario,
        plan: &RatingPlan,
        params: &RunParameters,
        population: &[AgedTransaction],
    ) -> Option<LgdOutput> {
        let input = LgdInput {
            interest_rate: params.lgd_interest_rate,
            age_analysis: within_window(population, params.lgd_min_date, params.lgd_max_date),
            defaults_rating: plan.default_bucket.rating(),
            scoring_table: scenario.scoring_table.clone(),
            scoring_type: scenario.scoring_type,
            track_default_events: scenario.lgd_approach,
            absorbing_states: plan.absorbing_state,
            ead_calculation_approach: params.ead_calculation_approach,
        };

        self.engine
            .calculate_lgd_term_structure(input)
            .map_err(|e| log::warn!("LGD calculation failed: {e}"))
            .ok()
    }

    fn calculate_matrices(
        &self,
        scenario: &Scenario,
        plan: &RatingPlan,
        params: &RunParameters,
        population: &[AgedTransaction],
    ) -> Option<MatrixOutput> {
        let input = PdInput {
            age_analysis: within_window(population, params.cohort_pd_min_date, params.cohort_pd_max_date),
            absorbing_states: plan.absorbing_state,
            data_frequency_scalar: params.cohort_pd_outcome_period,
            max_rating: plan.max_rating,
            scoring_table: scenario.scoring_table.clone(),
            scoring_type: scenario.scoring_type,
        };

        self.engine
            .calculate_all_matrices(input)
            .map_err(|e| log::warn!("PD matrix calculation failed: {e}"))
            .ok()
    }

    fn persist(&self, scenario: &Scenario) -> HazardResult<Option<ScenarioId>> {
        let Some(id) = self.store.insert_scenario(self.run_id, scenario)? else {
            log::warn!("Scenario was not assigned an id; skipping term structures and matrices");
            return Ok(None);
        };

        self.store.bulk_insert_term_structures(&scenario.term_structure, &id)?;
        self.store
            .bulk_insert_weighted_term_structures(&scenario.weighted_term_structure, &id)?;
        for row in &scenario.cohort_migration_matrix {
            self.store.insert_migration_row(MatrixKind::Cohort, &id, row)?;
        }
        for row in &scenario.hazard_rate_migration_matrix {
            self.store.insert_migration_row(MatrixKind::Hazard, &id, row)?;
        }
        Ok(Some(id))
    }
}

/// Transactions for the scenario's category filter, owned by the scenario.
fn scenario_population(age_analysis: &[AgedTransaction], category1: Option<&str>) -> Vec<AgedTransaction> {
    age_analysis
        .iter()
        .filter(|t| category1.map_or(true, |c| t.category1 == c))
        .cloned()
        .collect()
}

fn within_window(population: &[AgedTransaction], from: NaiveDate, to: NaiveDate) -> Vec<AgedTransaction> {
    population.iter().filter(|t| t.within(from, to)).cloned().collect()
}

/// Join error messages into one sentence: "a", "a and b", "a, b and c".
pub fn compile_error<S: AsRef<str>>(errors: &[S]) -> Option<String> {
    match errors {
        [] => None,
        [only] => Some(only.as_ref().to_string()),
        [init @ .., last] => {
            let head: Vec<&str> = init.iter().map(AsRef::as_ref).collect();
            Some(format!("{} and {}", head.join(", "), last.as_ref()))
        }
    }
}
