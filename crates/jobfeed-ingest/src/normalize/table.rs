// Normalized tabular record set

use chrono::NaiveDateTime;
use serde_json::Value;
use std::collections::HashMap;

use super::raw::FlatRecord;

/// Timestamp rendering used for text output (CSV, text columns)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single typed table value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Timestamp(NaiveDateTime),
}

impl Cell {
    /// Convert a record field into a cell.
    ///
    /// Nested objects and arrays become their compact JSON text.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Cell::Null,
            Value::Bool(b) => Cell::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Cell::Integer(i),
                None => n.as_f64().map(Cell::Float).unwrap_or(Cell::Null),
            },
            Value::String(s) => Cell::Text(s),
            nested @ (Value::Array(_) | Value::Object(_)) => Cell::Text(nested.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Column type this cell would need; `None` for null
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            Cell::Null => None,
            Cell::Bool(_) => Some(ColumnType::Boolean),
            Cell::Integer(_) => Some(ColumnType::Integer),
            Cell::Float(_) => Some(ColumnType::Float),
            Cell::Text(_) => Some(ColumnType::Text),
            Cell::Timestamp(_) => Some(ColumnType::Timestamp),
        }
    }

    /// Text rendering; `None` for null
    pub fn to_text(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::Bool(b) => Some(b.to_string()),
            Cell::Integer(i) => Some(i.to_string()),
            Cell::Float(f) => Some(f.to_string()),
            Cell::Text(s) => Some(s.clone()),
            Cell::Timestamp(ts) => Some(ts.format(TIMESTAMP_FORMAT).to_string()),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Cell::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Integer(i) => Some(*i as f64),
            Cell::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Cell::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Cell::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }
}

/// Storage type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Boolean,
    Integer,
    Float,
    Text,
    Timestamp,
}

impl ColumnType {
    /// Postgres column type used when creating the destination table
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Integer => "BIGINT",
            ColumnType::Float => "DOUBLE PRECISION",
            ColumnType::Text => "TEXT",
            ColumnType::Timestamp => "TIMESTAMP",
        }
    }

    /// Widen two observed types into one that holds both
    fn unify(self, other: ColumnType) -> ColumnType {
        use ColumnType::*;
        match (self, other) {
            (a, b) if a == b => a,
            (Integer, Float) | (Float, Integer) => Float,
            _ => Text,
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnType::Boolean => write!(f, "bool"),
            ColumnType::Integer => write!(f, "int64"),
            ColumnType::Float => write!(f, "float64"),
            ColumnType::Text => write!(f, "text"),
            ColumnType::Timestamp => write!(f, "timestamp"),
        }
    }
}

/// Column name and storage type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
}

/// Ordered rows sharing one column set.
///
/// Every row holds exactly one cell per column. A column may carry a
/// declared type, which wins over the type inferred from its cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedTable {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
    declared: HashMap<String, ColumnType>,
}

impl NormalizedTable {
    /// Build a table from flattened records.
    ///
    /// Columns appear in first-seen order; fields a record lacks are null.
    pub fn from_records(records: Vec<FlatRecord>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for record in &records {
            for name in record.field_names() {
                if !positions.contains_key(name) {
                    positions.insert(name.to_string(), columns.len());
                    columns.push(name.to_string());
                }
            }
        }

        let rows = records
            .into_iter()
            .map(|record| {
                let mut row = vec![Cell::Null; columns.len()];
                for (name, value) in record.into_fields() {
                    if let Some(&idx) = positions.get(&name) {
                        row[idx] = Cell::from_json(value);
                    }
                }
                row
            })
            .collect();

        Self {
            columns,
            rows,
            declared: HashMap::new(),
        }
    }

    /// Build a table from explicit columns and rows.
    ///
    /// Each row is resized to the column count, padding with nulls.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Null);
                row
            })
            .collect();
        Self {
            columns,
            rows,
            declared: HashMap::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cells of one column, top to bottom
    pub fn column(&self, name: &str) -> Option<Vec<&Cell>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Rename `from` to `to`.
    ///
    /// Returns false when `from` is absent or `to` is already taken.
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        if from == to || self.has_column(to) {
            return false;
        }
        match self.column_index(from) {
            Some(idx) => {
                self.columns[idx] = to.to_string();
                if let Some(declared) = self.declared.remove(from) {
                    self.declared.insert(to.to_string(), declared);
                }
                true
            },
            None => false,
        }
    }

    /// Remove a column; returns false when it was absent
    pub fn drop_column(&mut self, name: &str) -> bool {
        let Some(idx) = self.column_index(name) else {
            return false;
        };
        self.columns.remove(idx);
        self.declared.remove(name);
        for row in &mut self.rows {
            row.remove(idx);
        }
        true
    }

    /// Replace every cell of a column with `convert(cell)`.
    ///
    /// Returns `None` when the column is absent, otherwise the number of
    /// non-null cells that became null.
    pub fn convert_column<F>(&mut self, name: &str, convert: F) -> Option<usize>
    where
        F: Fn(&Cell) -> Cell,
    {
        let idx = self.column_index(name)?;
        let mut nulled = 0;
        for row in &mut self.rows {
            let converted = convert(&row[idx]);
            if converted.is_null() && !row[idx].is_null() {
                nulled += 1;
            }
            row[idx] = converted;
        }
        Some(nulled)
    }

    /// Fix the storage type of a column regardless of its cells.
    ///
    /// Returns false when the column is absent.
    pub fn declare_column_type(&mut self, name: &str, column_type: ColumnType) -> bool {
        if !self.has_column(name) {
            return false;
        }
        self.declared.insert(name.to_string(), column_type);
        true
    }

    pub fn declared_type(&self, name: &str) -> Option<ColumnType> {
        self.declared.get(name).copied()
    }

    /// Type implied by the non-null cells of the column at `idx`
    pub fn inferred_type(&self, idx: usize) -> Option<ColumnType> {
        self.rows
            .iter()
            .filter_map(|row| row.get(idx).and_then(Cell::column_type))
            .reduce(ColumnType::unify)
    }

    /// Storage type of the column at `idx`: declared, else inferred, else text
    pub fn column_type(&self, idx: usize) -> ColumnType {
        self.columns
            .get(idx)
            .and_then(|name| self.declared_type(name))
            .or_else(|| self.inferred_type(idx))
            .unwrap_or(ColumnType::Text)
    }

    /// Column names with their storage types
    pub fn schema(&self) -> Vec<ColumnDef> {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, name)| ColumnDef {
                name: name.clone(),
                column_type: self.column_type(idx),
            })
            .collect()
    }
}
