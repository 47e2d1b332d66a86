use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    StringArray,
};
use arrow::datatypes::DataType;
use log::{debug, info};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::error::{CleanError, Result};
use super::model::{Dataset, Record, Value};

/// Tokens a dataframe reader treats as a missing value.
const NA_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "#N/A",
    "<NA>",
];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` (or no extension) – comma-separated with a header row
/// * `.tsv`     – tab-separated with a header row
/// * `.json`    – `[{ "year": 2020, "population": 1200, ... }, ...]`
/// * `.parquet` – flat scalar columns
///
/// Cells are typed one by one; a column mixing integers and floats is then
/// promoted to floats.
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path)?,
        "json" => load_json(path)?,
        "tsv" => load_delimited(path, b'\t')?,
        _ => load_delimited(path, b',')?,
    }
    .unify_numeric_columns();
    info!(
        "loaded {} records × {} columns from {}",
        dataset.len(),
        dataset.columns.len(),
        path.display()
    );
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Delimited text loader
// ---------------------------------------------------------------------------

/// Header row with column names, one record per line.  Every record must have
/// as many fields as the header.
fn load_delimited(path: &Path, delimiter: u8) -> Result<Dataset> {
    let file = std::fs::File::open(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(file);

    let columns: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    if columns.is_empty() || (columns.len() == 1 && columns[0].is_empty()) {
        return Err(CleanError::Parse(format!(
            "{}: missing header row",
            path.display()
        )));
    }

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let raw = result?;
        if raw.len() != columns.len() {
            return Err(CleanError::Parse(format!(
                "row {row_no}: expected {} fields, found {}",
                columns.len(),
                raw.len()
            )));
        }
        records.push(Record::new(raw.iter().map(guess_value_type).collect()));
    }

    Dataset::new(columns, records)
}

fn guess_value_type(s: &str) -> Value {
    let t = s.trim();
    if NA_TOKENS.contains(&t) {
        return Value::Null;
    }
    if let Ok(i) = t.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(f) = t.parse::<f64>() {
        return Value::Float(f);
    }
    match t {
        "true" | "True" | "TRUE" => Value::Bool(true),
        "false" | "False" | "FALSE" => Value::Bool(false),
        _ => Value::String(s.to_string()),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "country": "A", "year": 2020, "population": 1200, "gender": 1.0 },
///   ...
/// ]
/// ```
///
/// Column order follows the keys of the first object; every later object must
/// carry the same keys.
fn load_json(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path)?;
    let root: JsonValue = serde_json::from_str(&text)
        .map_err(|e| CleanError::Parse(format!("{}: {e}", path.display())))?;

    let rows = root
        .as_array()
        .ok_or_else(|| CleanError::Parse("expected top-level JSON array".to_string()))?;

    let mut columns: Vec<String> = Vec::new();
    let mut records = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .ok_or_else(|| CleanError::Parse(format!("row {i} is not a JSON object")))?;

        if i == 0 {
            columns = obj.keys().cloned().collect();
        } else if obj.len() != columns.len() {
            return Err(CleanError::Parse(format!(
                "row {i}: expected {} fields, found {}",
                columns.len(),
                obj.len()
            )));
        }

        let fields = columns
            .iter()
            .map(|col| {
                obj.get(col)
                    .map(json_to_value)
                    .ok_or_else(|| CleanError::Parse(format!("row {i}: missing key '{col}'")))
            })
            .collect::<Result<Vec<_>>>()?;
        records.push(Record::new(fields));
    }

    Dataset::new(columns, records)
}

fn json_to_value(val: &JsonValue) -> Value {
    match val {
        JsonValue::String(s) => Value::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Null => Value::Null,
        other => Value::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with flat scalar columns (strings, ints, floats, bools).
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| CleanError::Parse(format!("reading parquet metadata: {e}")))?;

    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder
        .build()
        .map_err(|e| CleanError::Parse(format!("building parquet reader: {e}")))?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result
            .map_err(|e| CleanError::Parse(format!("reading parquet record batch: {e}")))?;
        debug!("parquet batch with {} rows", batch.num_rows());

        for row in 0..batch.num_rows() {
            let fields = batch
                .columns()
                .iter()
                .map(|col| extract_value(col, row))
                .collect::<Result<Vec<_>>>()?;
            records.push(Record::new(fields));
        }
    }

    Dataset::new(columns, records)
}

// -- Parquet / Arrow helpers --

/// Extract a single cell from an Arrow column at a given row.
fn extract_value(col: &Arc<dyn Array>, row: usize) -> Result<Value> {
    if col.is_null(row) {
        return Ok(Value::Null);
    }
    let downcast_err = || CleanError::Parse(format!("unexpected array for {:?}", col.data_type()));
    let value = match col.data_type() {
        DataType::Utf8 => {
            let s = col.as_any().downcast_ref::<StringArray>().ok_or_else(downcast_err)?;
            Value::String(s.value(row).to_string())
        }
        DataType::LargeUtf8 => Value::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => {
            let arr = col.as_any().downcast_ref::<Int32Array>().ok_or_else(downcast_err)?;
            Value::Integer(arr.value(row) as i64)
        }
        DataType::Int64 => {
            let arr = col.as_any().downcast_ref::<Int64Array>().ok_or_else(downcast_err)?;
            Value::Integer(arr.value(row))
        }
        DataType::Float32 => {
            let arr = col.as_any().downcast_ref::<Float32Array>().ok_or_else(downcast_err)?;
            float_or_null(arr.value(row) as f64)
        }
        DataType::Float64 => {
            let arr = col.as_any().downcast_ref::<Float64Array>().ok_or_else(downcast_err)?;
            float_or_null(arr.value(row))
        }
        DataType::Boolean => {
            let arr = col.as_any().downcast_ref::<BooleanArray>().ok_or_else(downcast_err)?;
            Value::Bool(arr.value(row))
        }
        other => {
            return Err(CleanError::Parse(format!(
                "unsupported parquet column type {other:?}"
            )))
        }
    };
    Ok(value)
}

/// Pandas stores missing floats as NaN rather than a null slot.
fn float_or_null(v: f64) -> Value {
    if v.is_nan() {
        Value::Null
    } else {
        Value::Float(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_csv_types_cells() {
        let file = write_temp(
            ".csv",
            "country,year,population,income_groups,gender\n\
             A,2020,1500,low_income,1.0\n\
             B,2021.0,,high_income_typo,NaN\n",
        );
        let ds = load_file(file.path()).unwrap();
        assert_eq!(
            ds.columns,
            vec!["country", "year", "population", "income_groups", "gender"]
        );
        assert_eq!(ds.len(), 2);
        // `2021.0` makes the whole year column float
        assert_eq!(ds.records[0].fields[1], Value::Float(2020.0));
        assert_eq!(ds.records[0].fields[4], Value::Float(1.0));
        assert_eq!(ds.records[1].fields[1], Value::Float(2021.0));
        assert_eq!(ds.records[0].fields[2], Value::Integer(1500));
        assert_eq!(ds.records[1].fields[2], Value::Null);
        assert_eq!(ds.records[1].fields[4], Value::Null);
        assert_eq!(
            ds.records[1].fields[3],
            Value::String("high_income_typo".into())
        );
    }

    #[test]
    fn test_load_csv_mixed_int_float_column_becomes_float() {
        let file = write_temp(".csv", "year,gender\n2010,1\n2010,1.0\n2011,2\n");
        let ds = load_file(file.path()).unwrap();
        let gender: Vec<_> = ds.records.iter().map(|r| r.fields[1].clone()).collect();
        assert_eq!(
            gender,
            vec![Value::Float(1.0), Value::Float(1.0), Value::Float(2.0)]
        );
        assert_eq!(ds.records[0].fields[0], Value::Integer(2010));
    }

    #[test]
    fn test_load_csv_ragged_row_is_parse_error() {
        let file = write_temp(".csv", "a,b\n1,2\n3\n");
        let err = load_file(file.path()).unwrap_err();
        assert!(matches!(err, CleanError::Parse(msg) if msg.contains("row 1")));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_file(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, CleanError::Io(_)));
    }

    #[test]
    fn test_load_empty_file_is_parse_error() {
        let file = write_temp(".csv", "");
        assert!(matches!(
            load_file(file.path()),
            Err(CleanError::Parse(_))
        ));
    }

    #[test]
    fn test_load_tsv() {
        let file = write_temp(".tsv", "year\tgender\n2020\t2\n");
        let ds = load_file(file.path()).unwrap();
        assert_eq!(ds.columns, vec!["year", "gender"]);
        assert_eq!(ds.records[0].fields[1], Value::Integer(2));
    }

    #[test]
    fn test_load_json_records() {
        let file = write_temp(
            ".json",
            r#"[{"year": 2020, "population": 10.5, "income_groups": null},
                {"year": 2021, "population": 12.0, "income_groups": "low_income"}]"#,
        );
        let ds = load_file(file.path()).unwrap();
        assert_eq!(ds.len(), 2);
        let year = ds.column_index("year").unwrap();
        let income = ds.column_index("income_groups").unwrap();
        assert_eq!(ds.records[1].fields[year], Value::Integer(2021));
        assert_eq!(ds.records[0].fields[income], Value::Null);
    }

    #[test]
    fn test_load_json_missing_key_is_parse_error() {
        let file = write_temp(".json", r#"[{"a": 1, "b": 2}, {"a": 1, "c": 2}]"#);
        assert!(matches!(
            load_file(file.path()),
            Err(CleanError::Parse(_))
        ));
    }
}
