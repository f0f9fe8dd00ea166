use super::HazardStore;
use crate::{
    config::{AgedTransactionRecord, RunDefinition},
    error::HazardResult,
    model::{AbsorbingStates, Run, RunParameters, ScoreBandItem},
};
use rusqlite::{params, Connection};

impl HazardStore {
    // ── Run definition import ──────────────────────────────────

    /// Write a full run definition in one transaction. Any existing inputs
    /// for the same run id are replaced; results are left untouched.
    pub fn import_run_definition(&self, definition: &RunDefinition) -> HazardResult<()> {
        let run_id = definition.run.id.as_str();
        let tx = self.conn.unchecked_transaction()?;

        for table in [
            "hazard_rate_run_parameters",
            "hazard_rate_score_band_item",
            "hazard_rate_run_absorbing_states",
            "hazard_rate_aged_transaction",
        ] {
            tx.execute(&format!("DELETE FROM {table} WHERE hazard_rate_run_id = ?1"), params![run_id])?;
        }

        upsert_run(&tx, &definition.run)?;
        insert_run_parameters(&tx, run_id, &definition.parameters)?;
        for band in &definition.score_bands {
            insert_score_band_item(&tx, run_id, band)?;
        }
        insert_absorbing_states(&tx, run_id, &definition.absorbing_states)?;
        for record in &definition.transactions {
            insert_aged_transaction(&tx, run_id, record)?;
        }

        tx.commit()?;
        log::info!(
            "Imported run {run_id}: {} score bands, {} aged transactions",
            definition.score_bands.len(),
            definition.transactions.len()
        );
        Ok(())
    }
}

fn upsert_run(conn: &Connection, run: &Run) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO hazard_rate_run (
            id, title, run_date, contact_email, description, user_id, organisation_id, status
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(id) DO UPDATE SET
            title = excluded.title,
            run_date = excluded.run_date,
            contact_email = excluded.contact_email,
            description = excluded.description,
            user_id = excluded.user_id,
            organisation_id = excluded.organisation_id,
            status = excluded.status",
        params![
            run.id,
            run.title,
            run.run_date,
            run.contact_email,
            run.description,
            run.user_id,
            run.organisation_id,
            run.status.as_str(),
        ],
    )
}

fn insert_run_parameters(conn: &Connection, run_id: &str, p: &RunParameters) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO hazard_rate_run_parameters (
            hazard_rate_run_id, category1, category2, category3,
            lgd_run_date, lgd_min_date, lgd_max_date, lgd_interest_rate,
            hazard_pd_run_date, hazard_pd_min_date, hazard_pd_max_date,
            cohort_pd_run_date, cohort_pd_min_date, cohort_pd_max_date,
            cohort_pd_outcome_period, ead_calculation_approach
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            run_id,
            p.category1,
            p.category2,
            p.category3,
            p.lgd_run_date,
            p.lgd_min_date,
            p.lgd_max_date,
            p.lgd_interest_rate,
            p.hazard_pd_run_date,
            p.hazard_pd_min_date,
            p.hazard_pd_max_date,
            p.cohort_pd_run_date,
            p.cohort_pd_min_date,
            p.cohort_pd_max_date,
            p.cohort_pd_outcome_period,
            p.ead_calculation_approach.code(),
        ],
    )
}

fn insert_score_band_item(conn: &Connection, run_id: &str, band: &ScoreBandItem) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO hazard_rate_score_band_item (id, hazard_rate_run_id, type, position, value)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![band.id, run_id, band.band_type.as_str(), band.position, band.value],
    )
}

fn insert_absorbing_states(conn: &Connection, run_id: &str, states: &AbsorbingStates) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO hazard_rate_run_absorbing_states (
            hazard_rate_run_id, days_absorbing_state, status_absorbing_state, internal_score_absorbing_state
         ) VALUES (?1, ?2, ?3, ?4)",
        params![
            run_id,
            states.days_absorbing_state,
            states.status_absorbing_state,
            states.internal_score_absorbing_state,
        ],
    )
}

fn insert_aged_transaction(conn: &Connection, run_id: &str, record: &AgedTransactionRecord) -> rusqlite::Result<usize> {
    let t = &record.transaction;
    conn.execute(
        "INSERT INTO hazard_rate_aged_transaction (
            id, hazard_rate_run_id, transaction_number, type, date, amount, balance,
            ageing, status, score, credit_limit, category1, category2, category3
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            t.id,
            run_id,
            t.transaction_number,
            t.txn_type,
            t.date,
            t.amount,
            t.balance,
            t.ageing,
            t.status,
            t.score,
            t.limit,
            t.category1,
            record.category2,
            record.category3,
        ],
    )
}
