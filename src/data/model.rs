use std::collections::BTreeSet;
use std::fmt;

use crate::error::{ProteoError, Result};

// ---------------------------------------------------------------------------
// CellValue – a single cell of a protein table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring what spreadsheet exports contain.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Numeric view of the cell. Text is accepted when it parses as a number,
    /// since CSV exports and some workbooks store numbers as strings.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Accession-style key of the cell (numbers are rendered as written).
    pub fn key(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// Guess the type of a textual cell (CSV fields, workbook strings).
pub fn guess_cell_type(s: &str) -> CellValue {
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::Text(s.to_string())
}

// ---------------------------------------------------------------------------
// ProteinTable – ordered rows × named columns
// ---------------------------------------------------------------------------

/// A protein-identification table as exported by the search engine.
///
/// Rows keep their input order. Every row holds exactly one cell per column;
/// `push_row` pads or truncates to keep that true.
#[derive(Debug, Clone, PartialEq)]
pub struct ProteinTable {
    /// Name used in notes, errors and as default sheet name.
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl ProteinTable {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        ProteinTable {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.columns.len(), CellValue::Null);
        self.rows.push(row);
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Like [`column_index`](Self::column_index) but a missing column is a
    /// data-format error naming it.
    pub fn require_column(&self, column: &str) -> Result<usize> {
        self.column_index(column)
            .ok_or_else(|| ProteoError::MissingColumn {
                table: self.name.clone(),
                column: column.to_string(),
            })
    }

    /// Numeric value of `row[col]`, failing on empty, non-numeric and NaN
    /// cells.
    pub fn numeric(&self, row: usize, col: usize) -> Result<f64> {
        let cell = &self.rows[row][col];
        cell.as_f64().filter(|v| !v.is_nan()).ok_or_else(|| ProteoError::NotNumeric {
            table: self.name.clone(),
            row,
            column: self.columns[col].clone(),
            value: cell.to_string(),
        })
    }

    /// Distinct accession values.
    pub fn accession_set(&self, column: &str) -> Result<BTreeSet<String>> {
        let idx = self.require_column(column)?;
        Ok(self.rows.iter().map(|r| r[idx].key()).collect())
    }

    /// New table with the same columns and the rows for which `keep` holds.
    pub fn filtered<F>(&self, name: impl Into<String>, mut keep: F) -> ProteinTable
    where
        F: FnMut(&[CellValue]) -> bool,
    {
        ProteinTable {
            name: name.into(),
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| keep(r.as_slice())).cloned().collect(),
        }
    }

    /// Same rows, new name.
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<()> {
        let idx = self.require_column(from)?;
        self.columns[idx] = to.to_string();
        Ok(())
    }

    /// Append a column, one value per row.
    pub fn push_column(&mut self, column: impl Into<String>, values: Vec<CellValue>) {
        debug_assert_eq!(values.len(), self.rows.len());
        self.columns.push(column.into());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
    }

    /// Stack tables. Columns are the union in first-seen order; cells a source
    /// table does not have are `Null`.
    pub fn concat(name: impl Into<String>, tables: &[&ProteinTable]) -> ProteinTable {
        let mut columns: Vec<String> = Vec::new();
        for t in tables {
            for c in &t.columns {
                if !columns.contains(c) {
                    columns.push(c.clone());
                }
            }
        }
        let mut out = ProteinTable::new(name, columns);
        for t in tables {
            let mapping: Vec<Option<usize>> =
                out.columns.iter().map(|c| t.column_index(c)).collect();
            for row in &t.rows {
                let cells = mapping
                    .iter()
                    .map(|m| m.map(|i| row[i].clone()).unwrap_or(CellValue::Null))
                    .collect();
                out.rows.push(cells);
            }
        }
        out
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Build a table from string literals; cells go through type guessing.
    pub fn table(name: &str, columns: &[&str], rows: &[&[&str]]) -> ProteinTable {
        let mut t = ProteinTable::new(name, columns.iter().map(|c| c.to_string()).collect());
        for r in rows {
            t.push_row(r.iter().map(|c| guess_cell_type(c)).collect());
        }
        t
    }

    /// Band-style table of `(accession, MW)` pairs.
    pub fn band(name: &str, rows: &[(&str, f64)]) -> ProteinTable {
        let mut t = ProteinTable::new(name, vec!["accession".into(), "MW".into()]);
        for (acc, mw) in rows {
            t.push_row(vec![CellValue::Text(acc.to_string()), CellValue::Float(*mw)]);
        }
        t
    }
}
