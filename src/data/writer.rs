use std::path::{Path, PathBuf};

use log::info;
use serde_json::{Map, Value as JsonValue};

use super::error::{CleanError, Result};
use super::model::{Dataset, Value};

/// Write a dataset to `path`.  Dispatch by extension like the loader:
/// `.json` writes a records-oriented array, `.tsv` tab-separated text,
/// anything else comma-separated text.  A header row is always written and
/// no index column is added.
///
/// Output goes to a sibling temporary file first and is renamed into place,
/// so a failure never leaves a half-written file behind.
pub fn save_file(dataset: &Dataset, path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let tmp = staging_path(path);
    let written = match ext.as_str() {
        "json" => write_json(dataset, &tmp),
        "tsv" => write_delimited(dataset, &tmp, b'\t'),
        _ => write_delimited(dataset, &tmp, b','),
    };
    let placed = written.and_then(|()| std::fs::rename(&tmp, path).map_err(CleanError::from));
    if let Err(err) = placed {
        let _ = std::fs::remove_file(&tmp);
        return Err(err);
    }

    info!("wrote {} records to {}", dataset.len(), path.display());
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}

fn write_delimited(dataset: &Dataset, path: &Path, delimiter: u8) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)?;
    writer.write_record(&dataset.columns)?;
    for rec in &dataset.records {
        writer.write_record(rec.fields.iter().map(Value::to_field))?;
    }
    writer.flush()?;
    Ok(())
}

fn write_json(dataset: &Dataset, path: &Path) -> Result<()> {
    let rows: Vec<JsonValue> = dataset
        .records
        .iter()
        .map(|rec| {
            let obj: Map<String, JsonValue> = dataset
                .columns
                .iter()
                .cloned()
                .zip(rec.fields.iter().map(value_to_json))
                .collect();
            JsonValue::Object(obj)
        })
        .collect();

    let file = std::fs::File::create(path)?;
    serde_json::to_writer(std::io::BufWriter::new(file), &rows)
        .map_err(|e| CleanError::Io(e.into()))?;
    Ok(())
}

fn value_to_json(val: &Value) -> JsonValue {
    match val {
        Value::String(s) => JsonValue::String(s.clone()),
        Value::Integer(i) => JsonValue::from(*i),
        // Non-finite floats have no JSON form
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Null => JsonValue::Null,
    }
}
