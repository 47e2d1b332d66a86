use std::collections::BTreeSet;
use std::fmt;

use super::error::{CleanError, Result};

// ---------------------------------------------------------------------------
// Value – a single cell of the table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common dataframe dtypes.
/// Records are hashed during deduplication, so `Value` must be `Eq + Hash`.
#[derive(Debug, Clone)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so values can live in BTreeSet / HashSet --

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use Value::*;
        fn discriminant(v: &Value) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::String(s) => s.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Null => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "'{s}'"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Null => write!(f, "<null>"),
        }
    }
}

impl Value {
    /// Numeric view of the value; `None` for non-numeric cells.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Render the cell for a delimited output file.
    ///
    /// Integral floats keep their `.0` so a float column stays a float column
    /// when the file is read back.
    pub fn to_field(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(v) if v.is_finite() && v.fract() == 0.0 => format!("{v:.1}"),
            Value::Float(v) => v.to_string(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Null => String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the table
// ---------------------------------------------------------------------------

/// A single row; `fields[i]` belongs to `Dataset::columns[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    pub fields: Vec<Value>,
}

impl Record {
    pub fn new(fields: Vec<Value>) -> Self {
        Record { fields }
    }

    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.fields.get(idx)
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete table
// ---------------------------------------------------------------------------

/// An in-memory table. Columns keep the order of the source header.
///
/// Stages consume a `Dataset` and hand back a new one; nothing mutates a
/// dataset that another stage can still observe.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl Dataset {
    /// Build a dataset, checking that every record matches the header width.
    pub fn new(columns: Vec<String>, records: Vec<Record>) -> Result<Self> {
        if let Some((row, rec)) = records
            .iter()
            .enumerate()
            .find(|(_, r)| r.fields.len() != columns.len())
        {
            return Err(CleanError::Parse(format!(
                "row {row} has {} fields but the header has {} columns",
                rec.fields.len(),
                columns.len()
            )));
        }
        Ok(Dataset { columns, records })
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Like [`Dataset::column_index`] but a missing column is an error.
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| CleanError::MissingColumn(name.to_string()))
    }

    /// Indices of numeric columns: every non-null value is an integer or a
    /// float.  A column holding only nulls counts as numeric, the way a
    /// dataframe reader types an all-missing column as float.
    pub fn numeric_columns(&self) -> Vec<usize> {
        (0..self.columns.len())
            .filter(|&idx| {
                self.records.iter().all(|rec| {
                    matches!(
                        rec.fields[idx],
                        Value::Integer(_) | Value::Float(_) | Value::Null
                    )
                })
            })
            .collect()
    }

    /// Turn integers into floats in every column that mixes the two, so
    /// `1` and `1.0` read from the same column compare and print alike.
    pub fn unify_numeric_columns(self) -> Dataset {
        let mixed: Vec<usize> = (0..self.columns.len())
            .filter(|&idx| {
                let has = |want: fn(&Value) -> bool| {
                    self.records.iter().any(|r| want(&r.fields[idx]))
                };
                has(|v| matches!(v, Value::Integer(_)))
                    && has(|v| matches!(v, Value::Float(_)))
                    && !has(|v| matches!(v, Value::String(_) | Value::Bool(_)))
            })
            .collect();
        if mixed.is_empty() {
            return self;
        }

        let records = self
            .records
            .into_iter()
            .map(|mut rec| {
                for &idx in &mixed {
                    if let Value::Integer(i) = rec.fields[idx] {
                        rec.fields[idx] = Value::Float(i as f64);
                    }
                }
                rec
            })
            .collect();
        Dataset {
            columns: self.columns,
            records,
        }
    }

    /// Sorted set of distinct values in a column.
    pub fn unique_values(&self, idx: usize) -> BTreeSet<Value> {
        self.records
            .iter()
            .filter_map(|r| r.get(idx).cloned())
            .collect()
    }

    /// Keep the records matching `keep`, preserving order.
    pub fn retain<F>(self, mut keep: F) -> Dataset
    where
        F: FnMut(&Record) -> bool,
    {
        let records = self.records.into_iter().filter(|r| keep(r)).collect();
        Dataset {
            columns: self.columns,
            records,
        }
    }

    /// Replace every cell of one column through a fallible conversion.
    /// The closure receives the row number and the current value.
    pub fn map_column<F>(self, idx: usize, mut convert: F) -> Result<Dataset>
    where
        F: FnMut(usize, Value) -> Result<Value>,
    {
        let records = self
            .records
            .into_iter()
            .enumerate()
            .map(|(row, mut rec)| -> Result<Record> {
                let old = std::mem::replace(&mut rec.fields[idx], Value::Null);
                rec.fields[idx] = convert(row, old)?;
                Ok(rec)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Dataset {
            columns: self.columns,
            records,
        })
    }
}
