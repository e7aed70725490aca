//! Columnar table model for trial and average tables.
//!
//! This module contains the in-memory representation of a CSV metric
//! table plus the explicit reductions (element-wise mean, column mean,
//! row concatenation) the aggregation levels are built from.

use crate::error::{AggregateError, Result};
use serde::Serialize;
use std::io::Read;
use std::path::Path;

/// Values of a single column.
///
/// A column is Numeric only if every cell parses as `f64`; anything else
/// (e.g. the `run_id` tag) is Text. Text columns are carried through
/// concatenation but excluded from every numeric reduction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ColumnData {
    /// All-numeric values.
    Numeric(Vec<f64>),
    /// Free-form string values.
    Text(Vec<String>),
}

impl ColumnData {
    /// Number of cells in the column.
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Text(v) => v.len(),
        }
    }

    /// Returns true if the column has no cells.
    #[allow(dead_code)] // Companion to len()
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    /// Column name from the CSV header.
    pub name: String,
    /// Cell values.
    pub data: ColumnData,
}

impl Column {
    /// Returns the numeric values, or None for a Text column.
    pub fn numeric(&self) -> Option<&[f64]> {
        match &self.data {
            ColumnData::Numeric(v) => Some(v),
            ColumnData::Text(_) => None,
        }
    }

    /// Returns true for a Numeric column.
    pub fn is_numeric(&self) -> bool {
        matches!(self.data, ColumnData::Numeric(_))
    }
}

/// An ordered collection of named columns with equal row counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows (0 for a table with no columns).
    pub fn n_rows(&self) -> usize {
        self.columns.first().map(|c| c.data.len()).unwrap_or(0)
    }

    /// All columns in insertion order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in insertion order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Append a numeric column. The length must match the existing row count.
    pub fn push_numeric(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        self.push_column(Column {
            name: name.into(),
            data: ColumnData::Numeric(values),
        })
    }

    /// Append a text column. The length must match the existing row count.
    pub fn push_text(&mut self, name: impl Into<String>, values: Vec<String>) -> Result<()> {
        self.push_column(Column {
            name: name.into(),
            data: ColumnData::Text(values),
        })
    }

    fn push_column(&mut self, column: Column) -> Result<()> {
        if !self.columns.is_empty() && column.data.len() != self.n_rows() {
            return Err(AggregateError::SchemaMismatch(format!(
                "column '{}' has {} rows, table has {}",
                column.name,
                column.data.len(),
                self.n_rows()
            )));
        }
        self.columns.push(column);
        Ok(())
    }

    /// Parse a CSV table (header row required) from any reader.
    ///
    /// A column is typed Numeric iff every cell parses as `f64`.
    pub fn from_reader<R: Read>(reader: R) -> std::result::Result<Table, csv::Error> {
        let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers: Vec<String> = rdr.headers()?.iter().map(String::from).collect();

        let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for record in rdr.records() {
            let record = record?;
            for (i, cell) in record.iter().enumerate() {
                cells[i].push(cell.to_string());
            }
        }

        let columns = headers
            .into_iter()
            .zip(cells)
            .map(|(name, raw)| {
                let parsed: Option<Vec<f64>> =
                    raw.iter().map(|c| c.trim().parse::<f64>().ok()).collect();
                let data = match parsed {
                    Some(values) => ColumnData::Numeric(values),
                    None => ColumnData::Text(raw),
                };
                Column { name, data }
            })
            .collect();

        Ok(Table { columns })
    }

    /// Load a CSV table from a file.
    pub fn read_csv(path: &Path) -> Result<Table> {
        let file = std::fs::File::open(path).map_err(|e| AggregateError::Read {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        Self::from_reader(file).map_err(|e| AggregateError::Read {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Write the table to a CSV file, overwriting any existing content.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path).map_err(|e| AggregateError::Write {
            path: path.to_path_buf(),
            source: e,
        })?;

        let write_err = |e: csv::Error| AggregateError::Write {
            path: path.to_path_buf(),
            source: e,
        };

        wtr.write_record(self.column_names()).map_err(write_err)?;
        for row in 0..self.n_rows() {
            let record: Vec<String> = self
                .columns
                .iter()
                .map(|c| match &c.data {
                    ColumnData::Numeric(v) => v[row].to_string(),
                    ColumnData::Text(v) => v[row].clone(),
                })
                .collect();
            wtr.write_record(&record).map_err(write_err)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Element-wise mean across a non-empty set of tables.
    ///
    /// All inputs must have identical column-name sequences, identical row
    /// counts, and only Numeric columns. Any divergence is a
    /// `SchemaMismatch`; inputs are never truncated or padded.
    pub fn mean_of(tables: &[Table]) -> Result<Table> {
        let first = tables.first().ok_or_else(|| {
            AggregateError::SchemaMismatch("cannot average an empty set of tables".to_string())
        })?;

        for (idx, table) in tables.iter().enumerate() {
            if table.column_names() != first.column_names() {
                return Err(AggregateError::SchemaMismatch(format!(
                    "table {} has columns {:?}, expected {:?}",
                    idx,
                    table.column_names(),
                    first.column_names()
                )));
            }
            if table.n_rows() != first.n_rows() {
                return Err(AggregateError::SchemaMismatch(format!(
                    "table {} has {} rows, expected {}",
                    idx,
                    table.n_rows(),
                    first.n_rows()
                )));
            }
            if let Some(col) = table.columns.iter().find(|c| !c.is_numeric()) {
                return Err(AggregateError::SchemaMismatch(format!(
                    "table {} column '{}' is not numeric",
                    idx, col.name
                )));
            }
        }

        let count = tables.len() as f64;
        let columns = first
            .columns
            .iter()
            .enumerate()
            .map(|(ci, col)| {
                let mut sums = vec![0.0; first.n_rows()];
                for table in tables {
                    // Alignment verified above.
                    let values = table.columns[ci].numeric().unwrap_or(&[]);
                    for (sum, v) in sums.iter_mut().zip(values) {
                        *sum += v;
                    }
                }
                for sum in &mut sums {
                    *sum /= count;
                }
                Column {
                    name: col.name.clone(),
                    data: ColumnData::Numeric(sums),
                }
            })
            .collect();

        Ok(Table { columns })
    }

    /// Column-wise mean over all rows, restricted to the named columns.
    ///
    /// Produces a single-row table with the columns in the requested order.
    /// A missing or non-numeric name is a `SchemaMismatch`.
    pub fn column_means(&self, names: &[String]) -> Result<Table> {
        if self.n_rows() == 0 {
            return Err(AggregateError::SchemaMismatch(
                "cannot compute column means of an empty table".to_string(),
            ));
        }

        let mut out = Table::new();
        for name in names {
            let column = self.column(name).ok_or_else(|| {
                AggregateError::SchemaMismatch(format!("column '{}' not found", name))
            })?;
            let values = column.numeric().ok_or_else(|| {
                AggregateError::SchemaMismatch(format!("column '{}' is not numeric", name))
            })?;
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            out.push_numeric(name.clone(), vec![mean])?;
        }
        Ok(out)
    }

    /// Row-wise concatenation of a non-empty set of tables, preserving
    /// input order. All tables must share an identical schema.
    pub fn concat(tables: &[Table]) -> Result<Table> {
        let first = tables.first().ok_or_else(|| {
            AggregateError::SchemaMismatch("cannot concatenate an empty set of tables".to_string())
        })?;

        let mut columns: Vec<Column> = first
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                data: match &c.data {
                    ColumnData::Numeric(_) => ColumnData::Numeric(Vec::new()),
                    ColumnData::Text(_) => ColumnData::Text(Vec::new()),
                },
            })
            .collect();

        for (idx, table) in tables.iter().enumerate() {
            if table.column_names() != first.column_names() {
                return Err(AggregateError::SchemaMismatch(format!(
                    "table {} has columns {:?}, expected {:?}",
                    idx,
                    table.column_names(),
                    first.column_names()
                )));
            }
            for (out, col) in columns.iter_mut().zip(&table.columns) {
                match (&mut out.data, &col.data) {
                    (ColumnData::Numeric(acc), ColumnData::Numeric(v)) => {
                        acc.extend_from_slice(v);
                    }
                    (ColumnData::Text(acc), ColumnData::Text(v)) => {
                        acc.extend_from_slice(v);
                    }
                    _ => {
                        return Err(AggregateError::SchemaMismatch(format!(
                            "table {} column '{}' has a different type",
                            idx, col.name
                        )));
                    }
                }
            }
        }

        Ok(Table { columns })
    }
}
