use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, AsArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::frame::Frame;
use super::model::{Column, TimeseriesKey, TimeseriesRecord};
use super::timeseries::{SeriesKey, WideRow, WideTable};
use crate::error::Error;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a frame from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – long format: `model, scenario, region, variable, unit, year, value`
/// * `.json`    – `[{ "model": ..., "year": 2010, "value": 1.0 }, ...]`
/// * `.csv`     – long format as above, or wide format with one column per year
pub fn load_file(path: &Path) -> Result<Frame> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let frame = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!(
        "Loaded {} records for {} scenarios from {}",
        frame.len(),
        frame.meta().len(),
        path.display()
    );
    Ok(frame)
}

fn parse_year(s: &str) -> Result<i64, Error> {
    s.trim()
        .parse()
        .map_err(|_| Error::InvalidYear(s.to_string()))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented long format):
///
/// ```json
/// [
///   {
///     "model": "MSG-GLB", "scenario": "a_scen", "region": "World",
///     "variable": "Primary Energy", "unit": "EJ/yr",
///     "year": 2010, "value": 6.0
///   },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<Frame> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let rows = root.as_array().context("Expected top-level JSON array")?;

    let mut records = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let text = |col: Column| -> Result<String> {
            match obj.get(col.name()) {
                Some(JsonValue::String(s)) => Ok(s.clone()),
                Some(other) => bail!("Row {i}: '{col}' is not a string: {other}"),
                None => bail!("Row {i}: missing '{col}'"),
            }
        };
        let year = match obj.get("year") {
            Some(JsonValue::Number(n)) => n
                .as_i64()
                .with_context(|| format!("Row {i}: 'year' is not an integer"))?,
            Some(JsonValue::String(s)) => parse_year(s)?,
            _ => bail!("Row {i}: missing or invalid 'year'"),
        };
        let value = match obj.get("value") {
            Some(JsonValue::Number(n)) => n
                .as_f64()
                .with_context(|| format!("Row {i}: 'value' is not a number"))?,
            // Missing observations are dropped, not stored as NaN.
            Some(JsonValue::Null) => continue,
            _ => bail!("Row {i}: missing or invalid 'value'"),
        };

        let key = TimeseriesKey::new(
            text(Column::Model)?,
            text(Column::Scenario)?,
            text(Column::Region)?,
            text(Column::Variable)?,
            text(Column::Unit)?,
            year,
        );
        records.push(TimeseriesRecord::new(key, value));
    }

    Ok(Frame::new(records)?)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, matched case-insensitively.
///
/// * long: the six key columns plus `value`
/// * wide: the five non-year key columns plus one integer-named column per
///   year; empty cells are skipped
fn load_csv(path: &Path) -> Result<Frame> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_ascii_lowercase())
        .collect();

    let position = |name: &str| headers.iter().position(|h| h == name);
    let index: Vec<usize> = Column::INDEX
        .iter()
        .map(|c| position(c.name()).with_context(|| format!("CSV missing '{c}' column")))
        .collect::<Result<_>>()?;

    if let (Some(year_idx), Some(value_idx)) = (position("year"), position("value")) {
        if let Some(extra) = headers
            .iter()
            .enumerate()
            .find(|(i, _)| !index.contains(i) && *i != year_idx && *i != value_idx)
        {
            return Err(Error::InvalidColumn(extra.1.clone()).into());
        }
        let mut records = Vec::new();
        for (row_no, result) in reader.records().enumerate() {
            let record = result.with_context(|| format!("CSV row {row_no}"))?;
            let cell = |i: usize| record.get(i).unwrap_or("");

            let value = cell(value_idx).trim();
            if value.is_empty() {
                continue;
            }
            let value: f64 = value
                .parse()
                .with_context(|| format!("CSV row {row_no}: '{value}' is not a number"))?;
            let key = TimeseriesKey::new(
                cell(index[0]),
                cell(index[1]),
                cell(index[2]),
                cell(index[3]),
                cell(index[4]),
                parse_year(cell(year_idx))?,
            );
            records.push(TimeseriesRecord::new(key, value));
        }
        return Ok(Frame::new(records)?);
    }

    // Wide layout: every column that is not part of the index must be a year.
    let mut year_columns = Vec::new();
    for (i, h) in headers.iter().enumerate() {
        if index.contains(&i) {
            continue;
        }
        let year = h
            .parse::<i64>()
            .map_err(|_| Error::InvalidColumn(h.clone()))?;
        year_columns.push((i, year));
    }

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let cell = |i: usize| record.get(i).unwrap_or("");

        let mut values = BTreeMap::new();
        for &(i, year) in &year_columns {
            let raw = cell(i).trim();
            if raw.is_empty() {
                continue;
            }
            let value: f64 = raw
                .parse()
                .with_context(|| format!("CSV row {row_no}, {year}: '{raw}' is not a number"))?;
            values.insert(year, value);
        }
        let key = SeriesKey::new(
            cell(index[0]),
            cell(index[1]),
            cell(index[2]),
            cell(index[3]),
            cell(index[4]),
        );
        rows.push(WideRow { key, values });
    }

    Ok(Frame::from_wide(&WideTable::from_rows(rows))?)
}

/// Write the wide-by-time view as CSV; cells without a value stay empty.
pub fn write_csv<W: Write>(frame: &Frame, writer: W) -> Result<()> {
    let table = frame.timeseries();
    let mut out = csv::Writer::from_writer(writer);

    let header: Vec<String> = Column::INDEX
        .iter()
        .map(|c| c.name().to_string())
        .chain(table.years.iter().map(|y| y.to_string()))
        .collect();
    out.write_record(&header).context("writing CSV header")?;

    for row in &table.rows {
        let k = &row.key;
        let mut fields = vec![
            k.model.clone(),
            k.scenario.clone(),
            k.region.clone(),
            k.variable.clone(),
            k.unit.clone(),
        ];
        fields.extend(
            table
                .years
                .iter()
                .map(|y| row.get(*y).map(|v| v.to_string()).unwrap_or_default()),
        );
        out.write_record(&fields).context("writing CSV row")?;
    }
    out.flush().context("flushing CSV output")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a long-format Parquet file.
///
/// Expected schema:
/// - `model`, `scenario`, `region`, `variable`, `unit`: Utf8 or LargeUtf8
/// - `year`: Int32 or Int64
/// - `value`: Float64 or Float32; null values are skipped
fn load_parquet(path: &Path) -> Result<Frame> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;

        let labels: Vec<&Arc<dyn Array>> = Column::INDEX
            .iter()
            .map(|c| column(&batch, c.name()))
            .collect::<Result<_>>()?;
        let year_col = column(&batch, "year")?;
        let value_col = column(&batch, "value")?;

        for row in 0..batch.num_rows() {
            let Some(value) = extract_f64(value_col, row)
                .with_context(|| format!("Row {row}: failed to read 'value'"))?
            else {
                continue;
            };
            let text = |i: usize| {
                extract_text(labels[i], row)
                    .with_context(|| format!("Row {row}: failed to read '{}'", Column::INDEX[i]))
            };
            let key = TimeseriesKey::new(
                text(0)?,
                text(1)?,
                text(2)?,
                text(3)?,
                text(4)?,
                extract_i64(year_col, row)
                    .with_context(|| format!("Row {row}: failed to read 'year'"))?,
            );
            records.push(TimeseriesRecord::new(key, value));
        }
    }

    Ok(Frame::new(records)?)
}

// -- Parquet / Arrow helpers --

fn column<'b>(batch: &'b RecordBatch, name: &str) -> Result<&'b Arc<dyn Array>> {
    let idx = batch
        .schema()
        .index_of(name)
        .map_err(|_| anyhow::anyhow!("Parquet file missing '{name}' column"))?;
    Ok(batch.column(idx))
}

fn extract_text(col: &Arc<dyn Array>, row: usize) -> Result<String> {
    if col.is_null(row) {
        bail!("null value in key column");
    }
    match col.data_type() {
        DataType::Utf8 => {
            let arr = col
                .as_any()
                .downcast_ref::<StringArray>()
                .context("expected StringArray")?;
            Ok(arr.value(row).to_string())
        }
        DataType::LargeUtf8 => Ok(col.as_string::<i64>().value(row).to_string()),
        other => bail!("Expected Utf8 or LargeUtf8 column, got {other:?}"),
    }
}

fn extract_i64(col: &Arc<dyn Array>, row: usize) -> Result<i64> {
    if col.is_null(row) {
        bail!("null value in key column");
    }
    if let Some(arr) = col.as_any().downcast_ref::<Int64Array>() {
        Ok(arr.value(row))
    } else if let Some(arr) = col.as_any().downcast_ref::<Int32Array>() {
        Ok(arr.value(row) as i64)
    } else {
        bail!("Expected Int32 or Int64 column, got {:?}", col.data_type())
    }
}

fn extract_f64(col: &Arc<dyn Array>, row: usize) -> Result<Option<f64>> {
    if col.is_null(row) {
        return Ok(None);
    }
    if let Some(arr) = col.as_any().downcast_ref::<Float64Array>() {
        Ok(Some(arr.value(row)))
    } else if let Some(arr) = col.as_any().downcast_ref::<Float32Array>() {
        Ok(Some(arr.value(row) as f64))
    } else {
        bail!("Expected Float32 or Float64 column, got {:?}", col.data_type())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::{Field, Schema};
    use parquet::arrow::ArrowWriter;
    use rstest::rstest;
    use std::io::Write as _;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn long_and_wide_csv_agree() {
        let dir = tempfile::tempdir().unwrap();
        let long = write_file(
            &dir,
            "long.csv",
            "Model,Scenario,Region,Variable,Unit,Year,Value\n\
             model_a,scen_a,World,Primary Energy,EJ/yr,2005,1\n\
             model_a,scen_a,World,Primary Energy,EJ/yr,2010,6\n\
             model_a,scen_a,World,Primary Energy|Coal,EJ/yr,2010,3\n",
        );
        let wide = write_file(
            &dir,
            "wide.csv",
            "model,scenario,region,variable,unit,2005,2010\n\
             model_a,scen_a,World,Primary Energy,EJ/yr,1,6\n\
             model_a,scen_a,World,Primary Energy|Coal,EJ/yr,,3\n",
        );

        let from_long = load_file(&long).unwrap();
        let from_wide = load_file(&wide).unwrap();
        assert_eq!(from_long.len(), 3);
        assert_eq!(from_long, from_wide);
    }

    #[rstest]
    #[case::wide(
        "model,scenario,region,variable,unit,subannual,2005\n\
         model_a,scen_a,World,Primary Energy,EJ/yr,Summer,1\n"
    )]
    #[case::long(
        "model,scenario,region,variable,unit,subannual,year,value\n\
         model_a,scen_a,World,Primary Energy,EJ/yr,Summer,2005,1\n"
    )]
    fn csv_rejects_unknown_columns(#[case] contents: &str) {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "extra.csv", contents);
        let err = load_file(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::InvalidColumn(c)) if c == "subannual"
        ));
    }

    #[test]
    fn json_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "data.json",
            r#"[
              {"model": "m", "scenario": "s", "region": "World",
               "variable": "Primary Energy", "unit": "EJ/yr", "year": 2005, "value": 1.5},
              {"model": "m", "scenario": "s", "region": "World",
               "variable": "Primary Energy", "unit": "EJ/yr", "year": "2010", "value": null}
            ]"#,
        );
        let frame = load_file(&path).unwrap();
        assert_eq!(frame.len(), 1);
        assert_eq!(frame.years(), vec![2005]);
    }

    #[test]
    fn parquet_long_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.parquet");

        let text = |v: &str| -> Arc<dyn Array> { Arc::new(StringArray::from(vec![v, v])) };
        let mut fields: Vec<Field> = Column::INDEX
            .iter()
            .map(|c| Field::new(c.name(), DataType::Utf8, false))
            .collect();
        fields.push(Field::new("year", DataType::Int32, false));
        fields.push(Field::new("value", DataType::Float64, true));
        let schema = Arc::new(Schema::new(fields));

        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                text("m"),
                text("s"),
                text("World"),
                text("Primary Energy"),
                text("EJ/yr"),
                Arc::new(Int32Array::from(vec![2005, 2010])),
                Arc::new(Float64Array::from(vec![Some(1.0), None])),
            ],
        )
        .unwrap();
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let frame = load_file(&path).unwrap();
        assert_eq!(frame.len(), 1);
        assert_eq!(frame.variables(), vec!["Primary Energy"]);
    }

    #[test]
    fn csv_export_is_wide() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "long.csv",
            "model,scenario,region,variable,unit,year,value\n\
             m,s,World,Primary Energy,EJ/yr,2005,1\n\
             m,s,World,Primary Energy|Coal,EJ/yr,2010,3\n",
        );
        let frame = load_file(&path).unwrap();
        let mut buf = Vec::new();
        write_csv(&frame, &mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "model,scenario,region,variable,unit,2005,2010\n\
             m,s,World,Primary Energy,EJ/yr,1,\n\
             m,s,World,Primary Energy|Coal,EJ/yr,,3\n"
        );
    }

    #[test]
    fn unsupported_extension() {
        assert!(load_file(Path::new("data.xlsx")).is_err());
    }
}
