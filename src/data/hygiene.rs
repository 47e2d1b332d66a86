//! Row-level hygiene stages that run before outlier removal.
//!
//! Every stage takes the dataset by value and returns the cleaned one.

use std::collections::HashSet;

use log::{debug, info};

use super::error::{CleanError, Result};
use super::model::{Dataset, Value};

pub const YEAR_COLUMN: &str = "year";
pub const POPULATION_COLUMN: &str = "population";
pub const INCOME_COLUMN: &str = "income_groups";
pub const GENDER_COLUMN: &str = "gender";

/// Gender code that does not correspond to a valid category.
pub const INVALID_GENDER: f64 = 3.0;

/// Latest year a record may carry.
pub const MAX_YEAR: i64 = 2024;

/// Misspelled income labels and their canonical form.
pub const INCOME_FIXES: [(&str, &str); 4] = [
    ("lower_middle_income_typo", "lower_middle_income"),
    ("low_income_typo", "low_income"),
    ("high_income_typo", "high_income"),
    ("upper_middle_income_typo", "upper_middle_income"),
];

/// Drop every record with a missing value in any column.
pub fn remove_missing(dataset: Dataset) -> Dataset {
    let before = dataset.len();
    let cleaned = dataset.retain(|r| !r.fields.iter().any(Value::is_null));
    info!("remove missing: {before} → {} records", cleaned.len());
    cleaned
}

/// Convert the year and population columns to integers.
pub fn coerce_types(dataset: Dataset) -> Result<Dataset> {
    let mut dataset = dataset;
    for column in [YEAR_COLUMN, POPULATION_COLUMN] {
        let idx = dataset.require_column(column)?;
        dataset = dataset.map_column(idx, |row, value| to_integer(column, row, value))?;
        debug!("coerced column '{column}' to integer");
    }
    info!("coerce types: {} records", dataset.len());
    Ok(dataset)
}

/// Explicit integer conversion. Floats must be integral; nothing is truncated.
fn to_integer(column: &str, row: usize, value: Value) -> Result<Value> {
    let converted = match &value {
        Value::Integer(i) => Some(*i),
        Value::Float(f) if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 => {
            Some(*f as i64)
        }
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    converted.map(Value::Integer).ok_or_else(|| CleanError::Type {
        column: column.to_string(),
        row,
        value: value.to_string(),
    })
}

/// Drop records identical to an earlier record, keeping the first occurrence.
pub fn deduplicate(dataset: Dataset) -> Dataset {
    let before = dataset.len();
    let mut seen = HashSet::with_capacity(before);
    let cleaned = dataset.retain(|r| seen.insert(r.clone()));
    info!("deduplicate: {before} → {} records", cleaned.len());
    cleaned
}

/// Map known income-label typos to their canonical label and drop records
/// carrying the invalid gender code.
pub fn normalize_categories(dataset: Dataset) -> Result<Dataset> {
    let income = dataset.require_column(INCOME_COLUMN)?;
    let gender = dataset.require_column(GENDER_COLUMN)?;

    let mut fixed = 0usize;
    let dataset = dataset.map_column(income, |_, value| {
        Ok(match value {
            Value::String(s) => match canonical_income(&s) {
                Some(canonical) => {
                    fixed += 1;
                    Value::String(canonical.to_string())
                }
                None => Value::String(s),
            },
            other => other,
        })
    })?;
    debug!(
        "income groups after normalization: {:?}",
        dataset.unique_values(income)
    );

    let before = dataset.len();
    let cleaned = dataset.retain(|r| r.fields[gender].as_f64() != Some(INVALID_GENDER));
    info!(
        "normalize categories: fixed {fixed} labels, {before} → {} records",
        cleaned.len()
    );
    Ok(cleaned)
}

fn canonical_income(label: &str) -> Option<&'static str> {
    INCOME_FIXES
        .iter()
        .find(|(typo, _)| *typo == label)
        .map(|(_, canonical)| *canonical)
}

/// Drop records dated after [`MAX_YEAR`].  Expects an integer year column.
pub fn filter_future_dates(dataset: Dataset) -> Result<Dataset> {
    let year = dataset.require_column(YEAR_COLUMN)?;
    if let Some((row, rec)) = dataset
        .records
        .iter()
        .enumerate()
        .find(|(_, r)| !matches!(r.fields[year], Value::Integer(_)))
    {
        return Err(CleanError::Type {
            column: YEAR_COLUMN.to_string(),
            row,
            value: rec.fields[year].to_string(),
        });
    }

    let before = dataset.len();
    let cleaned = dataset.retain(|r| matches!(r.fields[year], Value::Integer(y) if y <= MAX_YEAR));
    info!("filter future dates: {before} → {} records", cleaned.len());
    Ok(cleaned)
}
