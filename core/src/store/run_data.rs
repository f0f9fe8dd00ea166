use super::{invalid_column, HazardStore};
use crate::{
    category::CategoryHierarchy,
    error::HazardResult,
    model::{AbsorbingStates, AgedTransaction, BandType, CategoryData, EadCalculationApproach, RunParameters, ScoreBandItem},
};
use rusqlite::{params, types::Type, OptionalExtension};

impl HazardStore {
    // ── Run inputs ─────────────────────────────────────────────

    pub fn fetch_run_parameters(&self, run_id: &str) -> HazardResult<Option<RunParameters>> {
        let params = self
            .conn
            .query_row(
                "SELECT category1, category2, category3,
                        lgd_run_date, lgd_min_date, lgd_max_date, lgd_interest_rate,
                        hazard_pd_run_date, hazard_pd_min_date, hazard_pd_max_date,
                        cohort_pd_run_date, cohort_pd_min_date, cohort_pd_max_date,
                        cohort_pd_outcome_period, ead_calculation_approach
                 FROM hazard_rate_run_parameters WHERE hazard_rate_run_id = ?1",
                params![run_id],
                |row| {
                    let ead_code: i64 = row.get(14)?;
                    Ok(RunParameters {
                        category1: row.get(0)?,
                        category2: row.get(1)?,
                        category3: row.get(2)?,
                        lgd_run_date: row.get(3)?,
                        lgd_min_date: row.get(4)?,
                        lgd_max_date: row.get(5)?,
                        lgd_interest_rate: row.get(6)?,
                        hazard_pd_run_date: row.get(7)?,
                        hazard_pd_min_date: row.get(8)?,
                        hazard_pd_max_date: row.get(9)?,
                        cohort_pd_run_date: row.get(10)?,
                        cohort_pd_min_date: row.get(11)?,
                        cohort_pd_max_date: row.get(12)?,
                        cohort_pd_outcome_period: row.get(13)?,
                        ead_calculation_approach: EadCalculationApproach::from_code(ead_code).ok_or_else(|| {
                            invalid_column(14, Type::Integer, format!("unknown EAD approach {ead_code}"))
                        })?,
                    })
                },
            )
            .optional()?;
        Ok(params)
    }

    pub fn fetch_score_band_items(&self, run_id: &str) -> HazardResult<Vec<ScoreBandItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, type, position, value
             FROM hazard_rate_score_band_item WHERE hazard_rate_run_id = ?1
             ORDER BY rowid ASC",
        )?;
        let rows = stmt.query_map(params![run_id], |row| {
            let band_type: String = row.get(1)?;
            Ok(ScoreBandItem {
                id: row.get(0)?,
                band_type: BandType::parse(&band_type)
                    .ok_or_else(|| invalid_column(1, Type::Text, format!("unknown band type {band_type}")))?,
                position: row.get(2)?,
                value: row.get(3)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Distinct category triples, in the order they first appear.
    pub fn fetch_category_data(&self, run_id: &str) -> HazardResult<Vec<CategoryData>> {
        let mut stmt = self.conn.prepare(
            "SELECT category1, category2, category3
             FROM hazard_rate_aged_transaction WHERE hazard_rate_run_id = ?1
             GROUP BY category1, category2, category3
             ORDER BY MIN(rowid) ASC",
        )?;
        let rows = stmt.query_map(params![run_id], |row| {
            Ok(CategoryData {
                category1: row.get(0)?,
                category2: row.get(1)?,
                category3: row.get(2)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn fetch_category_hierarchy(&self, run_id: &str) -> HazardResult<CategoryHierarchy> {
        let rows = self.fetch_category_data(run_id)?;
        CategoryHierarchy::build(&rows)
    }

    pub fn fetch_absorbing_states(&self, run_id: &str) -> HazardResult<Option<AbsorbingStates>> {
        let states = self
            .conn
            .query_row(
                "SELECT days_absorbing_state, status_absorbing_state, internal_score_absorbing_state
                 FROM hazard_rate_run_absorbing_states WHERE hazard_rate_run_id = ?1",
                params![run_id],
                |row| {
                    Ok(AbsorbingStates {
                        days_absorbing_state: row.get(0)?,
                        status_absorbing_state: row.get(1)?,
                        internal_score_absorbing_state: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(states)
    }

    /// Age analysis over the widest window the run needs (see
    /// `RunParameters::fetch_window`). Both ends are inclusive.
    pub fn fetch_aged_transactions(
        &self,
        run_id: &str,
        run_params: &RunParameters,
    ) -> HazardResult<Vec<AgedTransaction>> {
        let (min_date, max_date) = run_params.fetch_window();
        let mut stmt = self.conn.prepare(
            "SELECT id, transaction_number, type, date, amount, balance, ageing,
                    status, score, credit_limit, category1
             FROM hazard_rate_aged_transaction
             WHERE hazard_rate_run_id = ?1 AND date BETWEEN ?2 AND ?3
             ORDER BY date ASC, rowid ASC",
        )?;
        let rows = stmt.query_map(params![run_id, min_date, max_date], |row| {
            Ok(AgedTransaction {
                id: row.get(0)?,
                transaction_number: row.get(1)?,
                txn_type: row.get(2)?,
                date: row.get(3)?,
                amount: row.get(4)?,
                balance: row.get(5)?,
                ageing: row.get(6)?,
                status: row.get(7)?,
                score: row.get(8)?,
                limit: row.get(9)?,
                category1: row.get(10)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
