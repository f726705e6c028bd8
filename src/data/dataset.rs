// ============================================================
// Layer 4 - Tabular Dataset
// ============================================================
// An in-memory table: ordered column names plus rows of cells.
// Every row has exactly one cell per column.
//
// Cells are deliberately loosely typed. The same column can be
// read as numbers (the target, numeric features) or as labels
// (categorical features such as MSSubClass, which is stored as
// an integer but means a category).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::error::{ModelError, ModelResult};

/// A single cell of the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Number(f64),
    Category(String),
    Missing,
}

impl Value {
    /// Parse one raw CSV cell. Empty cells and the literal `NA`
    /// are missing, anything parseable as f64 is a number.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw == "NA" {
            return Value::Missing;
        }
        match raw.parse::<f64>() {
            Ok(n) if n.is_finite() => Value::Number(n),
            _ => Value::Category(raw.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The value as a categorical label. Numbers render without a
    /// trailing `.0` so `20` and `20.0` name the same category.
    pub fn label(&self) -> Option<String> {
        match self {
            Value::Number(n) => Some(n.to_string()),
            Value::Category(s) => Some(s.clone()),
            Value::Missing => None,
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Category(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows:    Vec<Vec<Value>>,
}

impl Dataset {
    /// Build a table, rejecting rows whose width differs from the header.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> ModelResult<Self> {
        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != columns.len())
        {
            return Err(ModelError::data_unavailable(
                "<table>",
                format!("row {} has {} cells, expected {}", i, row.len(), columns.len()),
            ));
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Fail with `SchemaMismatch` listing every absent column.
    pub fn require_columns<S: AsRef<str>>(&self, names: &[S]) -> ModelResult<()> {
        let missing: Vec<String> = names
            .iter()
            .map(|n| n.as_ref())
            .filter(|n| self.column_index(n).is_none())
            .map(str::to_string)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ModelError::SchemaMismatch { missing })
        }
    }

    /// Project onto `names`, in that order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> ModelResult<Dataset> {
        self.require_columns(names)?;

        let indices: Vec<usize> = names
            .iter()
            .filter_map(|n| self.column_index(n.as_ref()))
            .collect();

        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();

        Ok(Dataset {
            columns: names.iter().map(|n| n.as_ref().to_string()).collect(),
            rows,
        })
    }

    /// Copy the rows at `indices`, in that order.
    /// Indices must be in bounds.
    pub fn take_rows(&self, indices: &[usize]) -> Dataset {
        Dataset {
            columns: self.columns.clone(),
            rows:    indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// All cells of one column, top to bottom.
    pub fn column(&self, name: &str) -> ModelResult<Vec<&Value>> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| ModelError::SchemaMismatch { missing: vec![name.to_string()] })?;
        Ok(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Read a column as numbers. Missing or non-numeric cells are
    /// reported as `InvalidTargetValue` with no value, since this is
    /// only used for the prediction target.
    pub fn target_values(&self, name: &str) -> ModelResult<Vec<f64>> {
        self.column(name)?
            .into_iter()
            .enumerate()
            .map(|(row, v)| {
                v.as_number()
                    .ok_or(ModelError::InvalidTargetValue { row, value: None })
            })
            .collect()
    }

    /// Rename columns in place. Unknown source names are ignored.
    pub fn rename_columns(&mut self, renames: &BTreeMap<String, String>) {
        for col in self.columns.iter_mut() {
            if let Some(new_name) = renames.get(col) {
                *col = new_name.clone();
            }
        }
    }
}
