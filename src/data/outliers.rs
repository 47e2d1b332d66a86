//! IQR-based outlier removal.
//!
//! Bounds for every numeric column are computed once from the incoming
//! dataset; a record survives only if each of its numeric values lies inside
//! its column's bounds.

use log::{debug, info};

use super::error::{CleanError, Result};
use super::model::{Dataset, Value};

/// Fence width in units of the interquartile range.
pub const IQR_MULTIPLIER: f64 = 1.5;

/// Inclusive acceptance range for one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

impl Bounds {
    /// Tukey fences from the 25th and 75th percentiles of `sorted`.
    pub fn from_sorted(sorted: &[f64]) -> Option<Bounds> {
        let q1 = percentile(sorted, 0.25)?;
        let q3 = percentile(sorted, 0.75)?;
        let iqr = q3 - q1;
        Some(Bounds {
            lower: q1 - IQR_MULTIPLIER * iqr,
            upper: q3 + IQR_MULTIPLIER * iqr,
        })
    }

    pub fn contains(&self, v: f64) -> bool {
        self.lower <= v && v <= self.upper
    }
}

/// Bounds together with the column they apply to.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnBounds {
    pub index: usize,
    pub column: String,
    pub bounds: Bounds,
}

/// Percentile of already sorted data with linear interpolation between the
/// two order statistics around rank `p * (n - 1)`.  `None` for empty input.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    let rank = p.clamp(0.0, 1.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Compute bounds for every numeric column of `dataset`.
pub fn compute_bounds(dataset: &Dataset) -> Result<Vec<ColumnBounds>> {
    if dataset.is_empty() {
        return Err(CleanError::EmptyInput(
            "no records to compute quantiles on".to_string(),
        ));
    }
    let numeric = dataset.numeric_columns();
    if numeric.is_empty() {
        return Err(CleanError::EmptyInput(
            "dataset has no numeric columns".to_string(),
        ));
    }

    numeric
        .into_iter()
        .map(|idx| -> Result<ColumnBounds> {
            let column = dataset.columns[idx].clone();
            let mut values: Vec<f64> = dataset
                .records
                .iter()
                .filter_map(|r| r.fields[idx].as_f64())
                .filter(|v| !v.is_nan())
                .collect();
            values.sort_by(f64::total_cmp);

            let bounds = Bounds::from_sorted(&values).ok_or_else(|| {
                CleanError::EmptyInput(format!("column '{column}' has no numeric values"))
            })?;
            if !bounds.lower.is_finite() || !bounds.upper.is_finite() {
                return Err(CleanError::Parse(format!(
                    "column '{column}' holds infinite values; IQR bounds are undefined"
                )));
            }
            debug!(
                "bounds for '{column}': [{}, {}] over {} values",
                bounds.lower,
                bounds.upper,
                values.len()
            );
            Ok(ColumnBounds {
                index: idx,
                column,
                bounds,
            })
        })
        .collect()
}

/// Whether every numeric value of `fields` lies inside its column's bounds.
/// Null and NaN cells never fail the check.
fn within_bounds(fields: &[Value], bounds: &[ColumnBounds]) -> bool {
    bounds.iter().all(|cb| match fields[cb.index].as_f64() {
        Some(v) if !v.is_nan() => cb.bounds.contains(v),
        _ => true,
    })
}

/// Drop every record that is out of bounds on any numeric column.
pub fn remove_outliers(dataset: Dataset) -> Result<Dataset> {
    let bounds = compute_bounds(&dataset)?;
    for cb in &bounds {
        let outside = dataset
            .records
            .iter()
            .filter_map(|r| r.fields[cb.index].as_f64())
            .filter(|v| !v.is_nan() && !cb.bounds.contains(*v))
            .count();
        debug!("'{}': {outside} values outside bounds", cb.column);
    }

    let before = dataset.len();
    let cleaned = dataset.retain(|r| within_bounds(&r.fields, &bounds));
    info!(
        "remove outliers: {before} → {} records across {} numeric columns",
        cleaned.len(),
        bounds.len()
    );
    Ok(cleaned)
}
