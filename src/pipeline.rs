use std::fmt;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Serialize;

use crate::config::CleanConfig;
use crate::data::hygiene;
use crate::data::loader::load_file;
use crate::data::model::Dataset;
use crate::data::outliers::remove_outliers;
use crate::data::writer::save_file;

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// The pipeline steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Load,
    RemoveMissing,
    CoerceTypes,
    Deduplicate,
    NormalizeCategories,
    FilterFutureDates,
    RemoveOutliers,
    Save,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Load => "load",
            Stage::RemoveMissing => "remove_missing",
            Stage::CoerceTypes => "coerce_types",
            Stage::Deduplicate => "deduplicate",
            Stage::NormalizeCategories => "normalize_categories",
            Stage::FilterFutureDates => "filter_future_dates",
            Stage::RemoveOutliers => "remove_outliers",
            Stage::Save => "save",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An in-memory cleaning step.
type CleanStep = fn(Dataset) -> crate::data::error::Result<Dataset>;

/// The steps between load and save, in execution order.
fn cleaning_steps() -> [(Stage, CleanStep); 6] {
    [
        (Stage::RemoveMissing, |ds| Ok(hygiene::remove_missing(ds))),
        (Stage::CoerceTypes, hygiene::coerce_types),
        (Stage::Deduplicate, |ds| Ok(hygiene::deduplicate(ds))),
        (Stage::NormalizeCategories, hygiene::normalize_categories),
        (Stage::FilterFutureDates, hygiene::filter_future_dates),
        (Stage::RemoveOutliers, remove_outliers),
    ]
}

// ---------------------------------------------------------------------------
// Run report
// ---------------------------------------------------------------------------

/// Row counts before and after one stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    pub rows_in: usize,
    pub rows_out: usize,
}

/// Summary of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct CleanReport {
    pub config: CleanConfig,
    pub columns: Vec<String>,
    pub stages: Vec<StageReport>,
}

impl CleanReport {
    pub fn rows_loaded(&self) -> usize {
        self.stages.first().map_or(0, |s| s.rows_out)
    }

    pub fn rows_written(&self) -> usize {
        self.stages.last().map_or(0, |s| s.rows_out)
    }

    pub fn rows_removed(&self) -> usize {
        self.rows_loaded() - self.rows_written()
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Load, clean and save according to `config`.
///
/// Fails on the first error, naming the stage that raised it.  The output
/// file is only written once every cleaning step has succeeded.
pub fn run(config: &CleanConfig) -> Result<CleanReport> {
    let steps = cleaning_steps();
    let mut stages = Vec::with_capacity(steps.len() + 2);

    let mut dataset = load_file(&config.input_path).with_context(|| {
        format!(
            "stage '{}' failed for {}",
            Stage::Load,
            config.input_path.display()
        )
    })?;
    let columns = dataset.columns.clone();
    stages.push(StageReport {
        stage: Stage::Load,
        rows_in: 0,
        rows_out: dataset.len(),
    });

    for (stage, step) in steps {
        let rows_in = dataset.len();
        dataset = step(dataset).with_context(|| format!("stage '{stage}' failed"))?;
        stages.push(StageReport {
            stage,
            rows_in,
            rows_out: dataset.len(),
        });
    }

    if dataset.is_empty() {
        warn!("no records survived cleaning");
    }
    save_file(&dataset, &config.output_path).with_context(|| {
        format!(
            "stage '{}' failed for {}",
            Stage::Save,
            config.output_path.display()
        )
    })?;
    stages.push(StageReport {
        stage: Stage::Save,
        rows_in: dataset.len(),
        rows_out: dataset.len(),
    });

    let report = CleanReport {
        config: config.clone(),
        columns,
        stages,
    };
    info!(
        "cleaned {} → {} records ({} removed)",
        report.rows_loaded(),
        report.rows_written(),
        report.rows_removed()
    );

    if let Some(path) = &config.report_path {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::error::CleanError;
    use std::path::Path;

    const HEADER: &str = "country,year,population,income_groups,gender\n";

    fn config_in(dir: &Path) -> CleanConfig {
        CleanConfig {
            input_path: dir.join("messy.csv"),
            output_path: dir.join("clean.csv"),
            report_path: None,
        }
    }

    #[test]
    fn test_cleaning_steps_exclude_file_stages() {
        let order: Vec<Stage> = cleaning_steps().iter().map(|(stage, _)| *stage).collect();
        assert_eq!(
            order,
            vec![
                Stage::RemoveMissing,
                Stage::CoerceTypes,
                Stage::Deduplicate,
                Stage::NormalizeCategories,
                Stage::FilterFutureDates,
                Stage::RemoveOutliers,
            ]
        );
    }

    #[test]
    fn test_population_outlier_removed_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config_in(dir.path());

        let populations = [100, 1200, 2500, 3100, 4000, 5200, 6100, 7000, 10_000, 1_000_000];
        let mut csv = String::from(HEADER);
        for (i, p) in populations.iter().enumerate() {
            csv.push_str(&format!("C{i},{},{p},low_income,{}.0\n", 2010 + i, 1 + i % 2));
        }
        std::fs::write(&cfg.input_path, csv).unwrap();

        let report = run(&cfg).unwrap();
        assert_eq!(report.rows_loaded(), 10);
        assert_eq!(report.rows_written(), 9);

        let cleaned = load_file(&cfg.output_path).unwrap();
        assert_eq!(cleaned.len(), 9);
        assert_eq!(cleaned.columns, report.columns);
        let pop = cleaned.column_index("population").unwrap();
        assert!(cleaned
            .records
            .iter()
            .all(|r| r.fields[pop].as_f64().unwrap() <= 10_000.0));
    }

    #[test]
    fn test_full_cleaning_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config_in(dir.path());
        cfg.report_path = Some(dir.path().join("report.json"));

        let csv = format!(
            "{HEADER}\
             A,2010,1000,low_income_typo,1.0\n\
             B,2011,1100,high_income,2.0\n\
             B,2011,1100,high_income,2.0\n\
             C,2012.0,1200,upper_middle_income,3.0\n\
             D,2013,,low_income,1.0\n\
             E,2025,1300,low_income,2.0\n\
             F,2024,1250,lower_middle_income_typo,1.0\n\
             G,2014,1150,high_income,2.0\n"
        );
        std::fs::write(&cfg.input_path, csv).unwrap();

        let report = run(&cfg).unwrap();
        let counts: Vec<_> = report
            .stages
            .iter()
            .map(|s| (s.stage, s.rows_out))
            .collect();
        assert_eq!(
            counts,
            vec![
                (Stage::Load, 8),
                (Stage::RemoveMissing, 7),
                (Stage::CoerceTypes, 7),
                (Stage::Deduplicate, 6),
                (Stage::NormalizeCategories, 5),
                (Stage::FilterFutureDates, 4),
                (Stage::RemoveOutliers, 4),
                (Stage::Save, 4),
            ]
        );

        let text = std::fs::read_to_string(&cfg.output_path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], HEADER.trim_end());
        assert_eq!(lines[1], "A,2010,1000,low_income,1.0");
        assert_eq!(lines[3], "F,2024,1250,lower_middle_income,1.0");

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("report.json")).unwrap())
                .unwrap();
        assert_eq!(json["stages"][6]["stage"], "remove_outliers");
    }

    #[test]
    fn test_type_error_names_stage_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config_in(dir.path());
        std::fs::write(
            &cfg.input_path,
            format!("{HEADER}A,2010,12.5,low_income,1.0\n"),
        )
        .unwrap();

        let err = run(&cfg).unwrap_err();
        assert!(format!("{err:#}").contains("coerce_types"));
        assert!(matches!(
            err.downcast_ref::<CleanError>(),
            Some(CleanError::Type { .. })
        ));
        assert!(!cfg.output_path.exists());
    }

    #[test]
    fn test_missing_input_fails_at_load() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config_in(dir.path());
        let err = run(&cfg).unwrap_err();
        assert!(format!("{err:#}").contains("stage 'load' failed"));
        assert!(matches!(
            err.downcast_ref::<CleanError>(),
            Some(CleanError::Io(_))
        ));
    }

    #[test]
    fn test_everything_filtered_reports_empty_input() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config_in(dir.path());
        std::fs::write(
            &cfg.input_path,
            format!("{HEADER}A,2030,100,low_income,1.0\n"),
        )
        .unwrap();

        let err = run(&cfg).unwrap_err();
        assert!(format!("{err:#}").contains("remove_outliers"));
        assert!(matches!(
            err.downcast_ref::<CleanError>(),
            Some(CleanError::EmptyInput(_))
        ));
        assert!(!cfg.output_path.exists());
    }
}
