use super::{invalid_column, HazardStore};
use crate::{
    error::HazardResult,
    matrix::{MatrixCell, MatrixKind, MigrationRow},
    model::{DefaultTrackingApproach, ScoringType, TermStructureItem},
    scenario::Scenario,
    types::ScenarioId,
};
use rusqlite::{params, types::Type, OptionalExtension};

/// A persisted scenario as read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioRow {
    pub id: ScenarioId,
    pub scoring_type: ScoringType,
    pub category1: Option<String>,
    pub lgd_approach: DefaultTrackingApproach,
    pub error: Option<String>,
}

fn matrix_tables(kind: MatrixKind) -> (&'static str, &'static str) {
    match kind {
        MatrixKind::Cohort => (
            "hazard_rate_scenario_cohort_migration_list",
            "hazard_rate_scenario_cohort_migration_list_item",
        ),
        MatrixKind::Hazard => (
            "hazard_rate_scenario_hazard_migration_list",
            "hazard_rate_scenario_hazard_migration_list_item",
        ),
    }
}

impl HazardStore {
    // ── Scenario results ───────────────────────────────────────

    /// Remove every scenario (and its children) previously written for the run.
    pub fn delete_old_results(&self, run_id: &str) -> HazardResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        for kind in [MatrixKind::Cohort, MatrixKind::Hazard] {
            let (list, item) = matrix_tables(kind);
            tx.execute(
                &format!(
                    "DELETE FROM {item} WHERE list_id IN (
                        SELECT l.id FROM {list} l
                        JOIN hazard_rate_scenario s ON l.hazard_rate_scenario_id = s.id
                        WHERE s.hazard_rate_run_id = ?1)"
                ),
                params![run_id],
            )?;
            tx.execute(
                &format!(
                    "DELETE FROM {list} WHERE hazard_rate_scenario_id IN (
                        SELECT id FROM hazard_rate_scenario WHERE hazard_rate_run_id = ?1)"
                ),
                params![run_id],
            )?;
        }
        for table in [
            "hazard_rate_scenario_term_structure",
            "hazard_rate_scenario_weighted_term_structure",
        ] {
            tx.execute(
                &format!(
                    "DELETE FROM {table} WHERE hazard_rate_scenario_id IN (
                        SELECT id FROM hazard_rate_scenario WHERE hazard_rate_run_id = ?1)"
                ),
                params![run_id],
            )?;
        }
        let removed = tx.execute(
            "DELETE FROM hazard_rate_scenario WHERE hazard_rate_run_id = ?1",
            params![run_id],
        )?;
        tx.commit()?;
        log::debug!("Deleted {removed} old scenarios for run {run_id}");
        Ok(())
    }

    /// Insert the scenario row and return its generated id.
    /// Returns None when the row was rejected without an error.
    pub fn insert_scenario(&self, run_id: &str, scenario: &Scenario) -> HazardResult<Option<ScenarioId>> {
        let id = uuid::Uuid::new_v4().to_string();
        let inserted = self
            .conn
            .query_row(
                "INSERT OR IGNORE INTO hazard_rate_scenario (
                    id, hazard_rate_run_id, scoring_type, category1, lgd_approach, error
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 RETURNING id",
                params![
                    id,
                    run_id,
                    scenario.scoring_type.as_str(),
                    scenario.category1,
                    scenario.lgd_approach.code(),
                    scenario.error,
                ],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(inserted)
    }

    pub fn bulk_insert_term_structures(
        &self,
        items: &[TermStructureItem],
        scenario_id: &str,
    ) -> HazardResult<()> {
        self.bulk_insert_terms("hazard_rate_scenario_term_structure", items, scenario_id)
    }

    pub fn bulk_insert_weighted_term_structures(
        &self,
        items: &[TermStructureItem],
        scenario_id: &str,
    ) -> HazardResult<()> {
        self.bulk_insert_terms("hazard_rate_scenario_weighted_term_structure", items, scenario_id)
    }

    fn bulk_insert_terms(&self, table: &str, items: &[TermStructureItem], scenario_id: &str) -> HazardResult<()> {
        if items.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {table} (hazard_rate_scenario_id, term, value) VALUES (?1, ?2, ?3)"
            ))?;
            for item in items {
                stmt.execute(params![scenario_id, item.term, item.value])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Insert one matrix row and its cells.
    pub fn insert_migration_row(
        &self,
        kind: MatrixKind,
        scenario_id: &str,
        row: &MigrationRow,
    ) -> HazardResult<()> {
        let (list, item) = matrix_tables(kind);
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            &format!("INSERT INTO {list} (hazard_rate_scenario_id, row_index) VALUES (?1, ?2)"),
            params![scenario_id, row.index as i64],
        )?;
        let list_id = tx.last_insert_rowid();
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {item} (list_id, cell_index, value) VALUES (?1, ?2, ?3)"
            ))?;
            for cell in &row.cells {
                stmt.execute(params![list_id, cell.index as i64, cell.value])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    // ── Read-back ──────────────────────────────────────────────

    /// Scenarios for a run in the order they were saved.
    pub fn scenarios_for_run(&self, run_id: &str) -> HazardResult<Vec<ScenarioRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, scoring_type, category1, lgd_approach, error
             FROM hazard_rate_scenario WHERE hazard_rate_run_id = ?1
             ORDER BY rowid ASC",
        )?;
        let rows = stmt.query_map(params![run_id], |row| {
            let scoring_type: String = row.get(1)?;
            let approach: i64 = row.get(3)?;
            Ok(ScenarioRow {
                id: row.get(0)?,
                scoring_type: ScoringType::parse(&scoring_type)
                    .ok_or_else(|| invalid_column(1, Type::Text, format!("unknown scoring type {scoring_type}")))?,
                category1: row.get(2)?,
                lgd_approach: DefaultTrackingApproach::from_code(approach)
                    .ok_or_else(|| invalid_column(3, Type::Integer, format!("unknown lgd approach {approach}")))?,
                error: row.get(4)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn term_structure_for_scenario(&self, scenario_id: &str) -> HazardResult<Vec<TermStructureItem>> {
        self.terms_for_scenario("hazard_rate_scenario_term_structure", scenario_id)
    }

    pub fn weighted_term_structure_for_scenario(&self, scenario_id: &str) -> HazardResult<Vec<TermStructureItem>> {
        self.terms_for_scenario("hazard_rate_scenario_weighted_term_structure", scenario_id)
    }

    fn terms_for_scenario(&self, table: &str, scenario_id: &str) -> HazardResult<Vec<TermStructureItem>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT term, value FROM {table} WHERE hazard_rate_scenario_id = ?1 ORDER BY term ASC"
        ))?;
        let rows = stmt.query_map(params![scenario_id], |row| {
            Ok(TermStructureItem { term: row.get(0)?, value: row.get(1)? })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn matrix_for_scenario(&self, kind: MatrixKind, scenario_id: &str) -> HazardResult<Vec<MigrationRow>> {
        let (list, item) = matrix_tables(kind);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT l.row_index, i.cell_index, i.value
             FROM {list} l JOIN {item} i ON i.list_id = l.id
             WHERE l.hazard_rate_scenario_id = ?1
             ORDER BY l.row_index ASC, i.cell_index ASC"
        ))?;
        let cells = stmt
            .query_map(params![scenario_id], |row| {
                Ok((row.get::<_, i64>(0)? as usize, row.get::<_, i64>(1)? as usize, row.get::<_, f64>(2)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut rows: Vec<MigrationRow> = Vec::new();
        for (row_index, cell_index, value) in cells {
            match rows.last_mut() {
                Some(last) if last.index == row_index => {
                    last.cells.push(MatrixCell { index: cell_index, value });
                }
                _ => rows.push(MigrationRow {
                    index: row_index,
                    cells: vec![MatrixCell { index: cell_index, value }],
                }),
            }
        }
        Ok(rows)
    }

    pub fn scenario_count(&self, run_id: &str) -> HazardResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM hazard_rate_scenario WHERE hazard_rate_run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
