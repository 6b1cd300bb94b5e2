//! Dense feature matrix with named columns.

use crate::preprocessing::error::PreprocessingError;
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

/// A dense `(n_rows, n_cols)` matrix of engineered features.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureFrame {
    columns: Vec<String>,
    data: Array2<f64>,
}

impl FeatureFrame {
    /// Build a frame from row vectors; every row must have one value per column.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self, PreprocessingError> {
        let n_cols = columns.len();
        let n_rows = rows.len();
        let mut flat = Vec::with_capacity(n_rows * n_cols);
        for row in rows {
            if row.len() != n_cols {
                return Err(PreprocessingError::FeatureMismatch {
                    expected_features: n_cols,
                    got_features: row.len(),
                });
            }
            flat.extend(row);
        }
        let data = Array2::from_shape_vec((n_rows, n_cols), flat).map_err(|e| {
            PreprocessingError::MalformedRecord(format!("cannot shape feature matrix: {e}"))
        })?;
        Ok(Self { columns, data })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn n_rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_cols(&self) -> usize {
        self.data.ncols()
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    pub fn row(&self, idx: usize) -> ArrayView1<'_, f64> {
        self.data.row(idx)
    }

    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.data.column(idx))
    }

    /// Value at `row` for column `name`.
    pub fn value(&self, row: usize, name: &str) -> Option<f64> {
        self.column(name).and_then(|col| col.get(row).copied())
    }

    /// A new frame holding the given rows, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            data: self.data.select(Axis(0), indices),
        }
    }
}
