//! Baseline calculation engine.
//!
//! A small deterministic engine used by the runner and in tests. It is
//! not a validated credit model.
//!
//! PD: cohort matrix from observed rating transitions between consecutive
//! snapshots of the same transaction number, row-normalized. The hazard
//! matrix is the first-order generator (P - I) scaled by the data
//! frequency scalar.
//!
//! LGD: each default event starts a workout. Per term, recoveries are the
//! fall in outstanding exposure, discounted monthly at interest_rate / 12.
//! LGD at term t is 1 - discounted recoveries to t / EAD.

use super::{
    rate_transaction, CalculationEngine, CalculationError, LgdInput, LgdOutput, MatrixOutput, PdInput,
};
use crate::{
    model::{AgedTransaction, DefaultTrackingApproach, EadCalculationApproach, ScoringTableItem, ScoringType, TermStructureItem},
    types::{Matrix, Rating},
};
use std::collections::BTreeMap;

const TWELVE_MONTH_TERMS: usize = 12;

#[derive(Debug, Clone, Copy, Default)]
pub struct BaselineEngine;

type History = Vec<(AgedTransaction, Rating)>;

struct Workout {
    ead: f64,
    recoveries: Vec<f64>,
}

impl CalculationEngine for BaselineEngine {
    fn calculate_lgd_term_structure(&self, input: LgdInput) -> Result<LgdOutput, CalculationError> {
        if input.defaults_rating == 0 {
            return Err(CalculationError::InvalidInput("defaults rating must be at least 1".into()));
        }
        if input.age_analysis.is_empty() {
            return Err(CalculationError::InsufficientData("no transactions in the LGD window".into()));
        }

        let cap = (input.track_default_events == DefaultTrackingApproach::TwelveMonthSingle)
            .then_some(TWELVE_MONTH_TERMS);
        let histories = rated_histories(input.age_analysis, &input.scoring_table, input.scoring_type);

        let mut workouts = Vec::new();
        for history in histories.values() {
            for start in default_starts(history, input.defaults_rating, input.track_default_events) {
                let (defaulted, _) = &history[start];
                let ead = exposure_at_default(defaulted, input.ead_calculation_approach);
                if ead <= 0.0 {
                    continue;
                }
                let mut previous = outstanding(defaulted);
                let mut recoveries = Vec::new();
                for (txn, _) in &history[start + 1..] {
                    if cap.is_some_and(|cap| recoveries.len() >= cap) {
                        break;
                    }
                    let current = outstanding(txn);
                    recoveries.push((previous - current).max(0.0));
                    previous = current;
                }
                workouts.push(Workout { ead, recoveries });
            }
        }

        if workouts.is_empty() {
            return Err(CalculationError::InsufficientData("no default events observed".into()));
        }

        let terms = workouts.iter().map(|w| w.recoveries.len()).max().unwrap_or(0);
        let discount = 1.0 + input.interest_rate / 12.0;
        let total_ead: f64 = workouts.iter().map(|w| w.ead).sum();

        let mut term_structure = Vec::with_capacity(terms + 1);
        let mut weighted_term_structure = Vec::with_capacity(terms + 1);
        for term in 0..=terms {
            let lgds: Vec<(f64, f64)> = workouts
                .iter()
                .map(|w| {
                    let recovered: f64 = w.recoveries[..term.min(w.recoveries.len())]
                        .iter()
                        .enumerate()
                        .map(|(k, r)| r / discount.powi(k as i32 + 1))
                        .sum();
                    (w.ead, (1.0 - recovered / w.ead).clamp(0.0, 1.0))
                })
                .collect();

            let mean = lgds.iter().map(|(_, lgd)| lgd).sum::<f64>() / lgds.len() as f64;
            let weighted = lgds.iter().map(|(ead, lgd)| ead * lgd).sum::<f64>() / total_ead;
            term_structure.push(TermStructureItem { term: term as u32, value: mean });
            weighted_term_structure.push(TermStructureItem { term: term as u32, value: weighted });
        }

        Ok(LgdOutput { term_structure, weighted_term_structure })
    }

    fn calculate_all_matrices(&self, input: PdInput) -> Result<MatrixOutput, CalculationError> {
        if input.max_rating == 0 {
            return Err(CalculationError::InvalidInput("max rating must be at least 1".into()));
        }
        if input.age_analysis.is_empty() {
            return Err(CalculationError::InsufficientData("no transactions in the PD window".into()));
        }

        let n = input.max_rating as usize;
        let histories = rated_histories(input.age_analysis, &input.scoring_table, input.scoring_type);

        let mut counts = vec![vec![0.0; n]; n];
        let mut transitions = 0usize;
        for history in histories.values() {
            for pair in history.windows(2) {
                let (from, to) = (pair[0].1 as usize, pair[1].1 as usize);
                if (1..=n).contains(&from) && (1..=n).contains(&to) {
                    counts[from - 1][to - 1] += 1.0;
                    transitions += 1;
                }
            }
        }
        if transitions == 0 {
            return Err(CalculationError::InsufficientData("no rating transitions observed".into()));
        }

        let absorbing_from = n.saturating_sub(input.absorbing_states as usize);
        let cohort_matrix: Matrix = counts
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                let total: f64 = row.iter().sum();
                if i >= absorbing_from || total == 0.0 {
                    identity_row(n, i)
                } else {
                    row.into_iter().map(|count| count / total).collect()
                }
            })
            .collect();

        let migration_matrix = cohort_matrix
            .iter()
            .enumerate()
            .map(|(i, row)| {
                row.iter()
                    .enumerate()
                    .map(|(j, p)| (p - if i == j { 1.0 } else { 0.0 }) * input.data_frequency_scalar)
                    .collect()
            })
            .collect();

        Ok(MatrixOutput { cohort_matrix, migration_matrix })
    }
}

/// Rated snapshots per transaction number, oldest first.
/// Snapshots the table cannot rate are dropped.
fn rated_histories(
    mut txns: Vec<AgedTransaction>,
    table: &[ScoringTableItem],
    scoring_type: ScoringType,
) -> BTreeMap<String, History> {
    txns.sort_by(|a, b| a.date.cmp(&b.date));
    let mut histories: BTreeMap<String, History> = BTreeMap::new();
    for txn in txns {
        if let Some(rating) = rate_transaction(&txn, table, scoring_type) {
            histories
                .entry(txn.transaction_number.clone())
                .or_default()
                .push((txn, rating));
        }
    }
    histories
}

/// Indexes in a history where a default event starts.
///
/// Lifetime: first entry into default.
/// LifetimeSingle / TwelveMonthSingle: first entry, only for accounts that
/// default exactly once.
/// LifetimeMultiple: every entry into default.
fn default_starts(history: &History, defaults_rating: Rating, approach: DefaultTrackingApproach) -> Vec<usize> {
    let in_default = |i: usize| history[i].1 >= defaults_rating;
    let entries: Vec<usize> = (0..history.len())
        .filter(|&i| in_default(i) && (i == 0 || !in_default(i - 1)))
        .collect();

    match approach {
        DefaultTrackingApproach::Lifetime => entries.into_iter().take(1).collect(),
        DefaultTrackingApproach::LifetimeSingle | DefaultTrackingApproach::TwelveMonthSingle => {
            if entries.len() == 1 { entries } else { Vec::new() }
        }
        DefaultTrackingApproach::LifetimeMultiple => entries,
    }
}

fn outstanding(txn: &AgedTransaction) -> f64 {
    txn.balance.unwrap_or(txn.amount)
}

fn exposure_at_default(txn: &AgedTransaction, approach: EadCalculationApproach) -> f64 {
    match approach {
        EadCalculationApproach::OutstandingBalance => outstanding(txn),
        EadCalculationApproach::TransactionAmount  => txn.amount,
        EadCalculationApproach::CreditLimit        => txn.limit.unwrap_or_else(|| outstanding(txn)),
    }
}

fn identity_row(n: usize, i: usize) -> Vec<f64> {
    (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::ageing_scoring_table;
    use chrono::NaiveDate;

    fn snapshot(number: &str, month: u32, ageing: i64, balance: f64) -> AgedTransaction {
        AgedTransaction {
            id: format!("{number}-{month}"),
            transaction_number: number.into(),
            txn_type: None,
            date: NaiveDate::from_ymd_opt(2024, month, 1).unwrap(),
            amount: 100.0,
            balance: Some(balance),
            ageing: Some(ageing),
            status: None,
            score: None,
            limit: None,
            category1: "Retail".into(),
        }
    }

    fn pd_input(age_analysis: Vec<AgedTransaction>) -> PdInput {
        PdInput {
            age_analysis,
            absorbing_states: 1,
            data_frequency_scalar: 1.0,
            max_rating: 3,
            scoring_table: ageing_scoring_table(&[30.0, 60.0]),
            scoring_type: ScoringType::Ageing,
        }
    }

    fn lgd_input(age_analysis: Vec<AgedTransaction>, approach: DefaultTrackingApproach) -> LgdInput {
        LgdInput {
            interest_rate: 0.0,
            age_analysis,
            defaults_rating: 3,
            scoring_table: ageing_scoring_table(&[30.0, 60.0]),
            scoring_type: ScoringType::Ageing,
            track_default_events: approach,
            absorbing_states: 1,
            ead_calculation_approach: EadCalculationApproach::OutstandingBalance,
        }
    }

    #[test]
    fn cohort_matrix_from_transitions() {
        let txns = vec![
            snapshot("A", 3, 75, 100.0),
            snapshot("A", 1, 10, 100.0),
            snapshot("A", 2, 45, 100.0),
            snapshot("B", 1, 5, 50.0),
            snapshot("B", 2, 20, 50.0),
        ];
        let out = BaselineEngine.calculate_all_matrices(pd_input(txns)).unwrap();

        assert_eq!(out.cohort_matrix[0], vec![0.5, 0.5, 0.0]);
        assert_eq!(out.cohort_matrix[1], vec![0.0, 0.0, 1.0]);
        assert_eq!(out.cohort_matrix[2], vec![0.0, 0.0, 1.0]);
        assert_eq!(out.migration_matrix[0], vec![-0.5, 0.5, 0.0]);
        assert_eq!(out.migration_matrix[2], vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn matrices_need_transitions() {
        let err = BaselineEngine
            .calculate_all_matrices(pd_input(vec![snapshot("A", 1, 10, 100.0)]))
            .unwrap_err();
        assert!(matches!(err, CalculationError::InsufficientData(_)));

        let err = BaselineEngine.calculate_all_matrices(pd_input(Vec::new())).unwrap_err();
        assert!(matches!(err, CalculationError::InsufficientData(_)));
    }

    #[test]
    fn lgd_tracks_recoveries_after_default() {
        let txns = vec![
            snapshot("D", 1, 90, 100.0),
            snapshot("D", 2, 120, 60.0),
            snapshot("D", 3, 150, 60.0),
        ];
        let out = BaselineEngine
            .calculate_lgd_term_structure(lgd_input(txns, DefaultTrackingApproach::Lifetime))
            .unwrap();

        let expected = [1.0, 0.6, 0.6];
        assert_eq!(out.term_structure.len(), expected.len());
        for (i, want) in expected.iter().enumerate() {
            assert_eq!(out.term_structure[i].term, i as u32);
            assert!((out.term_structure[i].value - want).abs() < 1e-12);
            assert!((out.weighted_term_structure[i].value - want).abs() < 1e-12);
        }
    }

    #[test]
    fn single_approaches_skip_redefaulted_accounts() {
        let txns = vec![
            snapshot("R", 1, 90, 100.0),
            snapshot("R", 2, 10, 100.0),
            snapshot("R", 3, 90, 80.0),
        ];
        let single = BaselineEngine
            .calculate_lgd_term_structure(lgd_input(txns.clone(), DefaultTrackingApproach::LifetimeSingle));
        assert!(matches!(single, Err(CalculationError::InsufficientData(_))));

        let multiple = BaselineEngine
            .calculate_lgd_term_structure(lgd_input(txns, DefaultTrackingApproach::LifetimeMultiple))
            .unwrap();
        assert_eq!(multiple.term_structure.len(), 3);
    }

    #[test]
    fn twelve_month_caps_terms() {
        let txns: Vec<_> = (1..=12)
            .map(|m| snapshot("L", m, 90 + m as i64 * 30, 100.0 - m as f64))
            .chain((1..=6).map(|m| {
                let mut t = snapshot("L", m, 0, 0.0);
                t.date = NaiveDate::from_ymd_opt(2025, m, 1).unwrap();
                t.ageing = Some(500);
                t.balance = Some(80.0);
                t
            }))
            .collect();
        let out = BaselineEngine
            .calculate_lgd_term_structure(lgd_input(txns, DefaultTrackingApproach::TwelveMonthSingle))
            .unwrap();
        assert_eq!(out.term_structure.len(), TWELVE_MONTH_TERMS + 1);
    }
}
