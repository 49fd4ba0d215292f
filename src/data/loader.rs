use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, LargeStringArray,
    StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Dataset, Field, Record};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a dashboard dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.json`    – `[{ "topic": ..., "intensity": ..., ... }, ...]`
/// * `.csv`     – header row with column names
/// * `.parquet` – one column per field
///
/// Columns that are not [`Field`]s are ignored.
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let records = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!("Loaded {} records from {}", records.len(), path.display());
    Ok(Dataset::from_records(records))
}

// ---------------------------------------------------------------------------
// RawValue – one untyped cell before cleaning
// ---------------------------------------------------------------------------

/// A cell as the file format delivered it.
#[derive(Debug, Clone, PartialEq)]
enum RawValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl RawValue {
    /// Text fields: null and empty strings are absent.
    fn into_text(self) -> Option<String> {
        match self {
            RawValue::Text(s) if s.is_empty() => None,
            RawValue::Text(s) => Some(s),
            RawValue::Integer(i) => Some(i.to_string()),
            RawValue::Float(f) => Some(f.to_string()),
            RawValue::Bool(b) => Some(b.to_string()),
            RawValue::Null => None,
        }
    }

    /// Year fields: zero, empty and unparseable values are absent.
    fn into_year(self) -> Option<i32> {
        let year = match self {
            RawValue::Integer(i) => i32::try_from(i).ok(),
            RawValue::Float(f) if f.fract() == 0.0 => i32::try_from(f as i64).ok(),
            RawValue::Text(s) => s.trim().parse::<i32>().ok(),
            _ => None,
        };
        year.filter(|&y| y != 0)
    }

    /// Score fields: anything that is not a number counts as zero.
    fn into_score(self) -> f64 {
        let score = match self {
            RawValue::Integer(i) => i as f64,
            RawValue::Float(f) => f,
            RawValue::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
            _ => 0.0,
        };
        if score.is_finite() { score } else { 0.0 }
    }
}

/// Store one cell in the matching record field.
fn assign(record: &mut Record, field: Field, value: RawValue) {
    match field {
        Field::EndYear => record.end_year = value.into_year(),
        Field::StartYear => record.start_year = value.into_year(),
        Field::Intensity => record.intensity = value.into_score(),
        Field::Relevance => record.relevance = value.into_score(),
        Field::Likelihood => record.likelihood = value.into_score(),
        Field::Topic => record.topic = value.into_text(),
        Field::Sector => record.sector = value.into_text(),
        Field::Region => record.region = value.into_text(),
        Field::Pestle => record.pestle = value.into_text(),
        Field::Source => record.source = value.into_text(),
        Field::Country => record.country = value.into_text(),
        Field::Insight => record.insight = value.into_text(),
        Field::Url => record.url = value.into_text(),
        Field::Impact => record.impact = value.into_text(),
        Field::Added => record.added = value.into_text(),
        Field::Published => record.published = value.into_text(),
        Field::Title => record.title = value.into_text(),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

fn load_json(path: &Path) -> Result<Vec<Record>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;
    records_from_json(&root)
}

/// Expected JSON schema (records-oriented, as exported by the source table):
///
/// ```json
/// [
///   { "end_year": "", "intensity": 6, "sector": "Energy", "topic": "gas", ... },
///   ...
/// ]
/// ```
///
/// Rows that are not objects are skipped.
pub fn records_from_json(root: &JsonValue) -> Result<Vec<Record>> {
    let rows = root.as_array().context("Expected top-level JSON array")?;

    let mut records = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let Some(obj) = row.as_object() else {
            log::warn!("Skipping row {i}: not a JSON object");
            continue;
        };

        let mut record = Record::default();
        for (key, val) in obj {
            if let Ok(field) = key.parse::<Field>() {
                assign(&mut record, field, json_to_raw(val));
            }
        }
        records.push(record);
    }
    Ok(records)
}

fn json_to_raw(val: &JsonValue) -> RawValue {
    match val {
        JsonValue::String(s) => RawValue::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                RawValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                RawValue::Float(f)
            } else {
                RawValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => RawValue::Bool(*b),
        JsonValue::Null => RawValue::Null,
        other => RawValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one record per line.
fn load_csv(path: &Path) -> Result<Vec<Record>> {
    let reader = csv::Reader::from_path(path).context("opening CSV")?;
    records_from_csv(reader)
}

fn records_from_csv<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Vec<Record>> {
    let columns: Vec<Option<Field>> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().parse::<Field>().ok())
        .collect();

    if columns.iter().all(Option::is_none) {
        bail!("CSV header names no known column");
    }

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("CSV row {row_no}"))?;

        let mut record = Record::default();
        for (value, field) in row.iter().zip(&columns) {
            if let Some(field) = field {
                assign(&mut record, *field, guess_raw_type(value));
            }
        }
        records.push(record);
    }
    Ok(records)
}

fn guess_raw_type(s: &str) -> RawValue {
    if s.is_empty() {
        return RawValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return RawValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return RawValue::Float(f);
    }
    RawValue::Text(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one column per [`Field`].
///
/// Year columns may be integer or string typed; scores may be integer or
/// float typed. Nulls follow the same cleaning rules as JSON.
fn load_parquet(path: &Path) -> Result<Vec<Record>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let columns: Vec<(usize, Field)> = schema
            .fields()
            .iter()
            .enumerate()
            .filter_map(|(i, f)| f.name().parse::<Field>().ok().map(|field| (i, field)))
            .collect();

        for row in 0..batch.num_rows() {
            let mut record = Record::default();
            for (col_idx, field) in &columns {
                let value = extract_raw_value(batch.column(*col_idx), row);
                assign(&mut record, *field, value);
            }
            records.push(record);
        }
    }

    Ok(records)
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_raw_value(col: &Arc<dyn Array>, row: usize) -> RawValue {
    if col.is_null(row) {
        return RawValue::Null;
    }
    let any = col.as_any();
    let value = match col.data_type() {
        DataType::Utf8 => any
            .downcast_ref::<StringArray>()
            .map(|a| RawValue::Text(a.value(row).to_string())),
        DataType::LargeUtf8 => any
            .downcast_ref::<LargeStringArray>()
            .map(|a| RawValue::Text(a.value(row).to_string())),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|a| RawValue::Integer(a.value(row) as i64)),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| RawValue::Integer(a.value(row))),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| RawValue::Float(a.value(row) as f64)),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map(|a| RawValue::Float(a.value(row))),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map(|a| RawValue::Bool(a.value(row))),
        other => {
            log::debug!("Ignoring parquet cell of type {other:?}");
            None
        }
    };
    value.unwrap_or(RawValue::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::Schema;
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn json_rows_are_cleaned_like_the_import_script() {
        let records = records_from_json(&json!([
            {
                "end_year": "",
                "start_year": 2017,
                "intensity": 6,
                "relevance": "",
                "likelihood": 3.5,
                "sector": "Energy",
                "topic": "gas",
                "region": "",
                "country": null,
                "added": "January, 20 2017 03:51:25",
                "id": 42
            },
            "not a row",
            { "end_year": "2027", "start_year": 0, "intensity": "7" }
        ]))
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0],
            Record {
                start_year: Some(2017),
                intensity: 6.0,
                likelihood: 3.5,
                sector: Some("Energy".into()),
                topic: Some("gas".into()),
                added: Some("January, 20 2017 03:51:25".into()),
                ..Record::default()
            }
        );
        assert_eq!(records[1].end_year, Some(2027));
        assert_eq!(records[1].start_year, None);
        assert_eq!(records[1].intensity, 7.0);
    }

    #[test]
    fn out_of_range_years_are_absent() {
        let records = records_from_json(&json!([
            { "end_year": 3e9, "start_year": 2020.0 },
            { "end_year": 3000000000_i64, "start_year": -1e30 }
        ]))
        .unwrap();
        assert_eq!(records[0].end_year, None);
        assert_eq!(records[0].start_year, Some(2020));
        assert_eq!(records[1].end_year, None);
        assert_eq!(records[1].start_year, None);
    }

    #[test]
    fn json_root_must_be_an_array() {
        assert!(records_from_json(&json!({ "data": [] })).is_err());
    }

    #[test]
    fn csv_columns_map_by_header_name() {
        let text = "topic,end_year,intensity,unused\noil,2030,4,x\n,,,\n";
        let reader = csv::Reader::from_reader(text.as_bytes());
        let records = records_from_csv(reader).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].topic.as_deref(), Some("oil"));
        assert_eq!(records[0].end_year, Some(2030));
        assert_eq!(records[0].intensity, 4.0);
        assert_eq!(records[1], Record::default());
    }

    #[test]
    fn csv_without_known_columns_is_rejected() {
        let reader = csv::Reader::from_reader("x,y\n1,2\n".as_bytes());
        assert!(records_from_csv(reader).is_err());
    }

    #[test]
    fn load_file_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("data.json");
        let mut file = std::fs::File::create(&json_path).unwrap();
        write!(file, r#"[{{"sector": "IT", "end_year": 2025}}]"#).unwrap();
        let dataset = load_file(&json_path).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.records[0].sector.as_deref(), Some("IT"));

        let txt_path = dir.path().join("data.txt");
        std::fs::write(&txt_path, "").unwrap();
        let err = load_file(&txt_path).unwrap_err();
        assert!(format!("{err:#}").contains("Unsupported file extension"));
    }

    #[test]
    fn parquet_columns_are_read_with_nulls() {
        let schema = Arc::new(Schema::new(vec![
            arrow::datatypes::Field::new("end_year", DataType::Int32, true),
            arrow::datatypes::Field::new("intensity", DataType::Float64, false),
            arrow::datatypes::Field::new("region", DataType::Utf8, true),
        ]));
        let columns: Vec<arrow::array::ArrayRef> = vec![
            Arc::new(Int32Array::from(vec![Some(2024), None])),
            Arc::new(Float64Array::from(vec![2.5, 9.0])),
            Arc::new(StringArray::from(vec![None, Some("Asia")])),
        ];
        let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.parquet");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let dataset = load_file(&path).unwrap();
        assert_eq!(
            dataset.records,
            vec![
                Record {
                    end_year: Some(2024),
                    intensity: 2.5,
                    ..Record::default()
                },
                Record {
                    intensity: 9.0,
                    region: Some("Asia".into()),
                    ..Record::default()
                },
            ]
        );
    }
}
