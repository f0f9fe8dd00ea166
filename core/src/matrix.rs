//! Row/cell layout for persisting migration matrices.
//!
//! A matrix is stored as one list row per matrix row, each holding its
//! cells with their column index. Indexes are positional, starting at 0.

use crate::types::Matrix;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MatrixCell {
    pub index: usize,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MigrationRow {
    pub index: usize,
    pub cells: Vec<MatrixCell>,
}

/// Which of a scenario's two matrices a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixKind {
    Cohort,
    Hazard,
}

pub fn reshape_matrix(matrix: &Matrix) -> Vec<MigrationRow> {
    matrix
        .iter()
        .enumerate()
        .map(|(i, row)| MigrationRow {
            index: i,
            cells: row
                .iter()
                .enumerate()
                .map(|(j, &value)| MatrixCell { index: j, value })
                .collect(),
        })
        .collect()
}

/// Inverse of `reshape_matrix`. Rows and cells are placed by their index,
/// so input order does not matter. Gaps are filled with 0.0.
pub fn rebuild_matrix(rows: &[MigrationRow]) -> Matrix {
    let height = rows.iter().map(|r| r.index + 1).max().unwrap_or(0);
    let mut matrix = vec![Vec::new(); height];
    for row in rows {
        let width = row.cells.iter().map(|c| c.index + 1).max().unwrap_or(0);
        let mut values = vec![0.0; width];
        for cell in &row.cells {
            values[cell.index] = cell.value;
        }
        matrix[row.index] = values;
    }
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reshape_indexes_rows_and_columns() {
        let rows = reshape_matrix(&vec![vec![0.9, 0.1], vec![0.0, 1.0]]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].index, 1);
        assert_eq!(rows[0].cells[1], MatrixCell { index: 1, value: 0.1 });
    }

    #[test]
    fn rebuild_ignores_row_order() {
        let mut rows = reshape_matrix(&vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        rows.reverse();
        assert_eq!(rebuild_matrix(&rows), vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
    }

    #[test]
    fn empty_matrix_has_no_rows() {
        assert!(reshape_matrix(&Vec::new()).is_empty());
        assert!(rebuild_matrix(&[]).is_empty());
    }
}
