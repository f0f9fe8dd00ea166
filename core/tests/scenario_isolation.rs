//! Scenario processing tests with a scripted calculation engine.
//!
//! The engine records every input it receives and can be told to fail on
//! a given call. Failures must stay on the scenario that triggered them.

use hazard_core::{
    calculation::{CalculationEngine, CalculationError, LgdInput, LgdOutput, MatrixOutput, PdInput},
    config::{AgedTransactionRecord, RunDefinition},
    matrix::{rebuild_matrix, MatrixKind},
    model::{BandType, ScoreBandItem, ScoringTableItem, ScoringType, TermStructureItem},
    orchestrator::HazardRateRunner,
    processor::{LGD_ERROR, PD_ERROR},
    status::RunStatus,
    store::HazardStore,
};
use std::{cell::RefCell, rc::Rc};

#[derive(Default)]
struct Recorded {
    lgd: Vec<LgdInput>,
    pd: Vec<PdInput>,
}

struct ScriptedEngine {
    recorded: Rc<RefCell<Recorded>>,
    fail_lgd_on: Vec<usize>,
    fail_pd_on: Vec<usize>,
}

impl ScriptedEngine {
    fn new(recorded: Rc<RefCell<Recorded>>) -> Self {
        Self { recorded, fail_lgd_on: Vec::new(), fail_pd_on: Vec::new() }
    }
}

impl CalculationEngine for ScriptedEngine {
    fn calculate_lgd_term_structure(&self, input: LgdInput) -> Result<LgdOutput, CalculationError> {
        let mut recorded = self.recorded.borrow_mut();
        recorded.lgd.push(input);
        if self.fail_lgd_on.contains(&recorded.lgd.len()) {
            return Err(CalculationError::InsufficientData("scripted".into()));
        }
        let terms = vec![
            TermStructureItem { term: 0, value: 1.0 },
            TermStructureItem { term: 1, value: 0.75 },
        ];
        Ok(LgdOutput { term_structure: terms.clone(), weighted_term_structure: terms })
    }

    fn calculate_all_matrices(&self, input: PdInput) -> Result<MatrixOutput, CalculationError> {
        let n = input.max_rating as usize;
        let mut recorded = self.recorded.borrow_mut();
        recorded.pd.push(input);
        if self.fail_pd_on.contains(&recorded.pd.len()) {
            return Err(CalculationError::InvalidInput("scripted".into()));
        }
        let identity: Vec<Vec<f64>> = (0..n)
            .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
            .collect();
        Ok(MatrixOutput { cohort_matrix: identity.clone(), migration_matrix: identity })
    }
}

fn db_uri(name: &str) -> String {
    format!("file:isolation_{name}?mode=memory&cache=shared")
}

fn seeded_store(uri: &str, definition: &RunDefinition) -> HazardStore {
    let _ = env_logger::builder().is_test(true).try_init();
    let store = HazardStore::open(uri).expect("open store");
    store.import_run_definition(definition).expect("import run");
    store
}

fn status_band(run_id: &str, position: i64, value: &str) -> ScoreBandItem {
    ScoreBandItem {
        id: format!("{run_id}-status-{position}"),
        band_type: BandType::Status,
        position,
        value: value.to_string(),
    }
}

fn with_category(mut record: AgedTransactionRecord, category: &str, suffix: &str) -> AgedTransactionRecord {
    record.transaction.category1 = category.to_string();
    record.transaction.id = format!("{}-{suffix}", record.transaction.id);
    record
}

/// One DAY band [30, 60], zero categories, days absorbing state 1:
/// exactly three scenarios, each rated on (−,30] (30,60] (60,−) with
/// rating 3 as the default bucket.
#[test]
fn day_band_without_categories_gives_three_scenarios() {
    let run_id = "no-categories";
    let uri = db_uri(run_id);
    let mut definition = RunDefinition::default_test(run_id);
    definition.transactions.clear();
    let store = seeded_store(&uri, &definition);

    let recorded = Rc::new(RefCell::new(Recorded::default()));
    let runner = HazardRateRunner::new(uri.as_str(), Box::new(ScriptedEngine::new(recorded.clone())));
    let summary = runner.calculate_run(run_id).expect("run succeeds");

    assert_eq!(summary.scenarios.processed, 3);
    assert_eq!(store.scenario_count(run_id).unwrap(), 3);

    let expected_table = vec![
        ScoringTableItem::Ageing { min_days: None, max_days: Some(30.0), rating: 1 },
        ScoringTableItem::Ageing { min_days: Some(30.0), max_days: Some(60.0), rating: 2 },
        ScoringTableItem::Ageing { min_days: Some(60.0), max_days: None, rating: 3 },
    ];
    let recorded = recorded.borrow();
    assert_eq!(recorded.lgd.len(), 3);
    for input in &recorded.lgd {
        assert_eq!(input.scoring_table, expected_table);
        assert_eq!(input.defaults_rating, 3);
        assert_eq!(input.absorbing_states, 1);
        assert!((input.interest_rate - 0.12).abs() < f64::EPSILON);
    }
    for input in &recorded.pd {
        assert_eq!(input.max_rating, 3);
        assert!((input.data_frequency_scalar - 12.0).abs() < f64::EPSILON);
    }
}

#[test]
fn one_failing_scenario_does_not_affect_the_others() {
    let run_id = "isolated-failure";
    let uri = db_uri(run_id);
    let store = seeded_store(&uri, &RunDefinition::default_test(run_id));

    let recorded = Rc::new(RefCell::new(Recorded::default()));
    let mut engine = ScriptedEngine::new(recorded.clone());
    engine.fail_lgd_on = vec![2];
    let summary = HazardRateRunner::new(uri.as_str(), Box::new(engine))
        .calculate_run(run_id)
        .expect("contained failures do not fail the run");

    assert_eq!(summary.status, RunStatus::Calculated);
    assert_eq!(summary.scenarios.with_errors, 1);
    assert_eq!(store.run_status(run_id).unwrap(), Some(RunStatus::Calculated));

    let scenarios = store.scenarios_for_run(run_id).unwrap();
    assert_eq!(scenarios.len(), 6);
    for (i, scenario) in scenarios.iter().enumerate() {
        if i == 1 {
            assert_eq!(scenario.error.as_deref(), Some(LGD_ERROR));
            assert!(store.term_structure_for_scenario(&scenario.id).unwrap().is_empty());
            // The PD half still ran and was stored.
            let cohort = store.matrix_for_scenario(MatrixKind::Cohort, &scenario.id).unwrap();
            assert_eq!(rebuild_matrix(&cohort).len(), 3);
        } else {
            assert_eq!(scenario.error, None, "scenario {i} should be clean");
            assert_eq!(store.term_structure_for_scenario(&scenario.id).unwrap().len(), 2);
        }
    }
}

#[test]
fn both_failures_are_compiled_into_one_message() {
    let run_id = "double-failure";
    let uri = db_uri(run_id);
    let store = seeded_store(&uri, &RunDefinition::default_test(run_id));

    let recorded = Rc::new(RefCell::new(Recorded::default()));
    let mut engine = ScriptedEngine::new(recorded.clone());
    engine.fail_lgd_on = vec![3];
    engine.fail_pd_on = vec![3];
    HazardRateRunner::new(uri.as_str(), Box::new(engine))
        .calculate_run(run_id)
        .expect("run succeeds");

    let scenarios = store.scenarios_for_run(run_id).unwrap();
    assert_eq!(
        scenarios[2].error.as_deref(),
        Some(format!("{LGD_ERROR} and {PD_ERROR}").as_str())
    );
    assert!(store.matrix_for_scenario(MatrixKind::Cohort, &scenarios[2].id).unwrap().is_empty());
    assert!(store.matrix_for_scenario(MatrixKind::Hazard, &scenarios[2].id).unwrap().is_empty());
    assert_eq!(scenarios.iter().filter(|s| s.error.is_some()).count(), 1);
}

#[test]
fn category_scenarios_only_see_their_category() {
    let run_id = "category-slices";
    let uri = db_uri(run_id);
    let mut definition = RunDefinition::default_test(run_id);
    let corporate: Vec<_> = definition
        .transactions
        .iter()
        .take(3)
        .cloned()
        .map(|r| with_category(r, "Corporate", "corp"))
        .collect();
    definition.transactions.extend(corporate);
    let store = seeded_store(&uri, &definition);

    let recorded = Rc::new(RefCell::new(Recorded::default()));
    HazardRateRunner::new(uri.as_str(), Box::new(ScriptedEngine::new(recorded.clone())))
        .calculate_run(run_id)
        .expect("run succeeds");

    let scenarios = store.scenarios_for_run(run_id).unwrap();
    // 1 scheme × (1 + Retail + Corporate) × 3 approaches
    assert_eq!(scenarios.len(), 9);

    let recorded = recorded.borrow();
    for (scenario, input) in scenarios.iter().zip(recorded.pd.iter()) {
        match scenario.category1.as_deref() {
            None => assert_eq!(input.age_analysis.len(), 11),
            Some(category) => {
                assert!(input.age_analysis.iter().all(|t| t.category1 == category));
                let expected = if category == "Corporate" { 3 } else { 8 };
                assert_eq!(input.age_analysis.len(), expected);
            }
        }
    }
}

#[test]
fn engine_windows_follow_run_parameters() {
    let run_id = "date-windows";
    let uri = db_uri(run_id);
    let mut definition = RunDefinition::default_test(run_id);
    // LGD sees Jan..Mar, cohort PD sees Mar..May.
    definition.parameters.lgd_min_date = chrono::NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    definition.parameters.lgd_max_date = chrono::NaiveDate::from_ymd_opt(2023, 3, 31).unwrap();
    definition.parameters.cohort_pd_min_date = chrono::NaiveDate::from_ymd_opt(2023, 3, 1).unwrap();
    definition.parameters.cohort_pd_max_date = chrono::NaiveDate::from_ymd_opt(2023, 5, 31).unwrap();
    let store = seeded_store(&uri, &definition);

    let recorded = Rc::new(RefCell::new(Recorded::default()));
    HazardRateRunner::new(uri.as_str(), Box::new(ScriptedEngine::new(recorded.clone())))
        .calculate_run(run_id)
        .expect("run succeeds");
    assert_eq!(store.run_status(run_id).unwrap(), Some(RunStatus::Calculated));

    let recorded = recorded.borrow();
    let lgd = &recorded.lgd[0].age_analysis;
    let pd = &recorded.pd[0].age_analysis;
    assert!(lgd.iter().all(|t| t.date <= definition.parameters.lgd_max_date));
    assert!(pd.iter().all(|t| t.date >= definition.parameters.cohort_pd_min_date));
    // Jan..Mar: INV-1 × 3 + INV-2 × 3. Mar..May: INV-1 × 3 + INV-2 × 1.
    assert_eq!(lgd.len(), 6);
    assert_eq!(pd.len(), 4);
}

#[test]
fn status_scheme_uses_its_own_absorbing_state() {
    let run_id = "status-scheme";
    let uri = db_uri(run_id);
    let mut definition = RunDefinition::default_test(run_id);
    definition.score_bands = vec![
        status_band(run_id, 3, "Legal(_)Written Off"),
        status_band(run_id, 1, "Current"),
        status_band(run_id, 2, "Arrears(_)Payment Plan"),
    ];
    definition.absorbing_states.days_absorbing_state = 1;
    definition.absorbing_states.status_absorbing_state = 2;
    let store = seeded_store(&uri, &definition);

    let recorded = Rc::new(RefCell::new(Recorded::default()));
    HazardRateRunner::new(uri.as_str(), Box::new(ScriptedEngine::new(recorded.clone())))
        .calculate_run(run_id)
        .expect("run succeeds");

    let scenarios = store.scenarios_for_run(run_id).unwrap();
    assert!(scenarios.iter().all(|s| s.scoring_type == ScoringType::Status));

    let recorded = recorded.borrow();
    let input = &recorded.lgd[0];
    assert_eq!(input.absorbing_states, 2);
    // table[len - 2] of three buckets is rating 2.
    assert_eq!(input.defaults_rating, 2);
    assert_eq!(
        input.scoring_table[1],
        ScoringTableItem::Categorical { rating: 2, contains: vec!["Arrears".into(), "Payment Plan".into()] }
    );
    assert_eq!(recorded.pd[0].max_rating, 3);
}
