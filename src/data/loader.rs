use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{Day, Sex, Smoker, Time, TipRecord, TipsDataset};
use crate::error::{DashboardError, Result};

/// Columns every source must provide, in the order of [`RawRow::cells`].
pub const REQUIRED_COLUMNS: [&str; 7] =
    ["total_bill", "tip", "sex", "smoker", "day", "time", "size"];

const TOTAL_BILL: usize = 0;
const TIP: usize = 1;
const SEX: usize = 2;
const SMOKER: usize = 3;
const DAY: usize = 4;
const TIME: usize = 5;
const SIZE: usize = 6;

/// Published copy of the seaborn tips dataset, fetched when no file is given.
pub const TIPS_URL: &str =
    "https://raw.githubusercontent.com/mwaskom/seaborn-data/master/tips.csv";

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Cell texts read as missing, following the pandas `read_csv` defaults.
const NA_TOKENS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL", "None", "<NA>"];

// ---------------------------------------------------------------------------
// Load report
// ---------------------------------------------------------------------------

/// What the cleaning pass did to the source rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub rows_read: usize,
    pub rows_kept: usize,
}

impl LoadReport {
    pub fn rows_dropped(&self) -> usize {
        self.rows_read - self.rows_kept
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load and clean a tips dataset. Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with at least the seven tips columns (seaborn's `tips.csv`)
/// * `.json`    – `[{ "total_bill": 16.99, "tip": 1.01, "sex": "Female", ... }, ...]`
/// * `.parquet` – one column per field; categorical columns may be dictionary encoded
pub fn load_file(path: &Path) -> Result<TipsDataset> {
    load_file_with_report(path).map(|(dataset, _)| dataset)
}

/// Like [`load_file`], also returning the cleaning report.
pub fn load_file_with_report(path: &Path) -> Result<(TipsDataset, LoadReport)> {
    let origin = path.display().to_string();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let rows = match ext.as_str() {
        "csv" => {
            let file = File::open(path).map_err(|e| DashboardError::unavailable(&origin, e))?;
            read_csv(file, &origin)?
        }
        "json" => read_json(path)?,
        "parquet" | "pq" => read_parquet(path)?,
        other => {
            return Err(DashboardError::unavailable(
                origin,
                format!("unsupported file extension: .{other}"),
            ))
        }
    };

    finish(rows, &origin)
}

/// Fetch a tips CSV over HTTP(S) and clean it like a local `.csv` file.
///
/// Connection failures, timeouts and non-success statuses all surface as
/// [`DashboardError::DataUnavailable`]; nothing is retried.
pub fn fetch_url_with_report(url: &str) -> Result<(TipsDataset, LoadReport)> {
    let unavailable = |e: reqwest::Error| DashboardError::unavailable(url, e);

    log::info!("Fetching tips data from {url}");
    let client = reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(unavailable)?;
    let body = client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.bytes())
        .map_err(unavailable)?;

    let rows = read_csv(body.as_ref(), url)?;
    finish(rows, url)
}

fn finish(rows: Vec<RawRow>, origin: &str) -> Result<(TipsDataset, LoadReport)> {
    let (dataset, report) = clean(rows)?;
    log::info!(
        "Loaded {} tips records from {origin} ({} of {} rows dropped during cleaning)",
        report.rows_kept,
        report.rows_dropped(),
        report.rows_read
    );
    Ok((dataset, report))
}

// ---------------------------------------------------------------------------
// Raw rows, before cleaning
// ---------------------------------------------------------------------------

/// A single source cell before coercion.
#[derive(Debug, Clone, PartialEq)]
enum RawCell {
    Missing,
    Text(String),
    Number(f64),
}

impl RawCell {
    fn from_text(s: &str) -> Self {
        let trimmed = s.trim();
        if NA_TOKENS.contains(&trimmed) {
            RawCell::Missing
        } else {
            RawCell::Text(trimmed.to_string())
        }
    }
}

/// One source row, cells in [`REQUIRED_COLUMNS`] order.
#[derive(Debug, Clone, PartialEq)]
struct RawRow {
    cells: [RawCell; 7],
}

impl RawRow {
    fn missing() -> Self {
        RawRow {
            cells: std::array::from_fn(|_| RawCell::Missing),
        }
    }
}

fn missing_columns_error(missing: &[&str]) -> DashboardError {
    DashboardError::integrity(format!(
        "required column(s) absent: {}",
        missing.join(", ")
    ))
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

/// CSV layout: header row, then one row per bill. Extra columns (such as a
/// pandas index column) are ignored; short rows read as missing cells.
fn read_csv(source: impl Read, origin: &str) -> Result<Vec<RawRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| DashboardError::unavailable(origin, e))?
        .clone();

    let mut indices = [0usize; 7];
    let mut missing = Vec::new();
    for (slot, column) in REQUIRED_COLUMNS.iter().enumerate() {
        match headers.iter().position(|h| h == *column) {
            Some(idx) => indices[slot] = idx,
            None => missing.push(*column),
        }
    }
    if !missing.is_empty() {
        return Err(missing_columns_error(&missing));
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| DashboardError::unavailable(origin, e))?;
        let cells = std::array::from_fn(|slot| {
            record
                .get(indices[slot])
                .map(RawCell::from_text)
                .unwrap_or(RawCell::Missing)
        });
        rows.push(RawRow { cells });
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// JSON reader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "total_bill": 16.99, "tip": 1.01, "sex": "Female", "smoker": "No",
///     "day": "Sun", "time": "Dinner", "size": 2 },
///   ...
/// ]
/// ```
fn read_json(path: &Path) -> Result<Vec<RawRow>> {
    let origin = path.display().to_string();
    let text =
        std::fs::read_to_string(path).map_err(|e| DashboardError::unavailable(&origin, e))?;
    let root: JsonValue =
        serde_json::from_str(&text).map_err(|e| DashboardError::unavailable(&origin, e))?;

    let records = root
        .as_array()
        .ok_or_else(|| DashboardError::unavailable(&origin, "expected a top-level JSON array"))?;

    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut rows = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let Some(obj) = rec.as_object() else {
            log::debug!("JSON row {i} is not an object; treating it as empty");
            rows.push(RawRow::missing());
            continue;
        };

        let cells = std::array::from_fn(|slot| {
            obj.get(REQUIRED_COLUMNS[slot])
                .map(json_to_cell)
                .unwrap_or(RawCell::Missing)
        });
        for column in REQUIRED_COLUMNS {
            if obj.contains_key(column) {
                seen.insert(column);
            }
        }
        rows.push(RawRow { cells });
    }

    if !records.is_empty() {
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|c| !seen.contains(c))
            .collect();
        if !missing.is_empty() {
            return Err(missing_columns_error(&missing));
        }
    }
    Ok(rows)
}

fn json_to_cell(val: &JsonValue) -> RawCell {
    match val {
        JsonValue::Null => RawCell::Missing,
        JsonValue::Number(n) => n.as_f64().map(RawCell::Number).unwrap_or(RawCell::Missing),
        JsonValue::String(s) => RawCell::from_text(s),
        other => RawCell::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one column per field.
///
/// Numeric columns are cast to `Float64` (unparseable strings become null);
/// categorical columns are cast to `Utf8`, which also unpacks the dictionary
/// encoding pandas uses for `category` dtypes.
fn read_parquet(path: &Path) -> Result<Vec<RawRow>> {
    let origin = path.display().to_string();
    let file = File::open(path).map_err(|e| DashboardError::unavailable(&origin, e))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| DashboardError::unavailable(&origin, e))?;

    let schema = builder.schema().clone();
    let mut indices = [0usize; 7];
    let mut missing = Vec::new();
    for (slot, column) in REQUIRED_COLUMNS.iter().enumerate() {
        match schema.index_of(column) {
            Ok(idx) => indices[slot] = idx,
            Err(_) => missing.push(*column),
        }
    }
    if !missing.is_empty() {
        return Err(missing_columns_error(&missing));
    }

    let reader = builder
        .build()
        .map_err(|e| DashboardError::unavailable(&origin, e))?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.map_err(|e| DashboardError::unavailable(&origin, e))?;
        let mut batch_rows = vec![RawRow::missing(); batch.num_rows()];

        for (slot, &col_idx) in indices.iter().enumerate() {
            let column = batch.column(col_idx);
            match slot {
                TOTAL_BILL | TIP | SIZE => fill_numeric(&mut batch_rows, slot, column)?,
                _ => fill_text(&mut batch_rows, slot, column)?,
            }
        }
        rows.extend(batch_rows);
    }
    Ok(rows)
}

fn cast_column(column: &ArrayRef, slot: usize, to: &DataType) -> Result<ArrayRef> {
    cast(column.as_ref(), to).map_err(|e| {
        DashboardError::integrity(format!(
            "column '{}' of type {:?} cannot be read as {to:?}: {e}",
            REQUIRED_COLUMNS[slot],
            column.data_type()
        ))
    })
}

fn fill_numeric(rows: &mut [RawRow], slot: usize, column: &ArrayRef) -> Result<()> {
    let values = cast_column(column, slot, &DataType::Float64)?;
    for (row, value) in rows.iter_mut().zip(values.as_primitive::<Float64Type>().iter()) {
        row.cells[slot] = value.map(RawCell::Number).unwrap_or(RawCell::Missing);
    }
    Ok(())
}

fn fill_text(rows: &mut [RawRow], slot: usize, column: &ArrayRef) -> Result<()> {
    let values = cast_column(column, slot, &DataType::Utf8)?;
    for (row, value) in rows.iter_mut().zip(values.as_string::<i32>().iter()) {
        row.cells[slot] = value.map(RawCell::from_text).unwrap_or(RawCell::Missing);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Cleaning
// ---------------------------------------------------------------------------

/// Why a source row was dropped.
#[derive(Debug, Error, PartialEq)]
enum DropReason {
    #[error("missing value in '{0}'")]
    Missing(&'static str),
    #[error("non-numeric value '{1}' in '{0}'")]
    NotNumeric(&'static str, String),
    #[error("value {1} in '{0}' is out of range")]
    OutOfRange(&'static str, f64),
    #[error(transparent)]
    UnknownLabel(#[from] super::model::UnknownLabel),
    #[error("text value in categorical column '{0}' expected, got number {1}")]
    NotText(&'static str, f64),
}

/// Apply the cleaning policy to every row. Fails when nothing survives.
fn clean(rows: Vec<RawRow>) -> Result<(TipsDataset, LoadReport)> {
    let rows_read = rows.len();
    let mut records = Vec::with_capacity(rows_read);

    for (i, row) in rows.iter().enumerate() {
        match clean_row(row) {
            Ok(record) => records.push(record),
            Err(reason) => log::debug!("Dropping row {i}: {reason}"),
        }
    }

    if records.is_empty() {
        return Err(DashboardError::integrity(format!(
            "no usable rows after cleaning ({rows_read} read)"
        )));
    }

    let report = LoadReport {
        rows_read,
        rows_kept: records.len(),
    };
    Ok((TipsDataset::from_records(records), report))
}

fn clean_row(row: &RawRow) -> std::result::Result<TipRecord, DropReason> {
    // Missing values are checked across the whole row first, so the reported
    // reason matches the pandas `dropna` step.
    if let Some(slot) = row.cells.iter().position(|c| *c == RawCell::Missing) {
        return Err(DropReason::Missing(REQUIRED_COLUMNS[slot]));
    }

    let total_bill = amount(row, TOTAL_BILL)?;
    let tip = amount(row, TIP)?;
    let size = party_size(row)?;

    Ok(TipRecord {
        total_bill,
        tip,
        sex: label::<Sex>(row, SEX)?,
        smoker: label::<Smoker>(row, SMOKER)?,
        day: label::<Day>(row, DAY)?,
        time: label::<Time>(row, TIME)?,
        size,
    })
}

fn number(row: &RawRow, slot: usize) -> std::result::Result<f64, DropReason> {
    let column = REQUIRED_COLUMNS[slot];
    match &row.cells[slot] {
        RawCell::Missing => Err(DropReason::Missing(column)),
        RawCell::Number(v) => Ok(*v),
        RawCell::Text(s) => s
            .parse::<f64>()
            .map_err(|_| DropReason::NotNumeric(column, s.clone())),
    }
}

/// A finite, non-negative money amount.
fn amount(row: &RawRow, slot: usize) -> std::result::Result<f64, DropReason> {
    let v = number(row, slot)?;
    if v.is_finite() && v >= 0.0 {
        Ok(v)
    } else {
        Err(DropReason::OutOfRange(REQUIRED_COLUMNS[slot], v))
    }
}

/// Party size, truncated toward zero; must be at least 1.
fn party_size(row: &RawRow) -> std::result::Result<u32, DropReason> {
    let v = number(row, SIZE)?;
    let truncated = v.trunc();
    if v.is_finite() && truncated >= 1.0 && truncated <= f64::from(u32::MAX) {
        Ok(truncated as u32)
    } else {
        Err(DropReason::OutOfRange(REQUIRED_COLUMNS[SIZE], v))
    }
}

fn label<T>(row: &RawRow, slot: usize) -> std::result::Result<T, DropReason>
where
    T: std::str::FromStr<Err = super::model::UnknownLabel>,
{
    let column = REQUIRED_COLUMNS[slot];
    match &row.cells[slot] {
        RawCell::Missing => Err(DropReason::Missing(column)),
        RawCell::Number(v) => Err(DropReason::NotText(column, *v)),
        RawCell::Text(s) => Ok(s.parse::<T>()?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_row(cells: [&str; 7]) -> RawRow {
        RawRow {
            cells: cells.map(RawCell::from_text),
        }
    }

    fn good_row() -> [&'static str; 7] {
        ["16.99", "1.01", "Female", "No", "Sun", "Dinner", "2"]
    }

    #[test]
    fn clean_row_parses_a_tips_row() {
        let record = clean_row(&text_row(good_row())).unwrap();
        assert_eq!(
            record,
            TipRecord {
                total_bill: 16.99,
                tip: 1.01,
                sex: Sex::Female,
                smoker: Smoker::No,
                day: Day::Sun,
                time: Time::Dinner,
                size: 2,
            }
        );
    }

    #[test]
    fn na_tokens_read_as_missing() {
        for token in ["", "NA", "NaN", "null", "  "] {
            assert_eq!(RawCell::from_text(token), RawCell::Missing, "token {token:?}");
        }
        assert_eq!(RawCell::from_text(" Sat "), RawCell::Text("Sat".into()));
    }

    #[test]
    fn missing_cell_drops_row() {
        let mut cells = good_row();
        cells[DAY] = "";
        assert_eq!(
            clean_row(&text_row(cells)),
            Err(DropReason::Missing("day"))
        );
    }

    #[test]
    fn non_numeric_amount_drops_row() {
        let mut cells = good_row();
        cells[TIP] = "two dollars";
        assert!(matches!(
            clean_row(&text_row(cells)),
            Err(DropReason::NotNumeric("tip", _))
        ));
    }

    #[test]
    fn negative_amount_drops_row() {
        let mut cells = good_row();
        cells[TOTAL_BILL] = "-3.5";
        assert!(matches!(
            clean_row(&text_row(cells)),
            Err(DropReason::OutOfRange("total_bill", _))
        ));
    }

    #[test]
    fn size_is_truncated() {
        let mut cells = good_row();
        cells[SIZE] = "3.9";
        assert_eq!(clean_row(&text_row(cells)).unwrap().size, 3);

        cells[SIZE] = "0.5";
        assert!(clean_row(&text_row(cells)).is_err());
    }

    #[test]
    fn unknown_label_drops_row() {
        let mut cells = good_row();
        cells[DAY] = "Wed";
        assert!(matches!(
            clean_row(&text_row(cells)),
            Err(DropReason::UnknownLabel(_))
        ));
    }

    #[test]
    fn numeric_cell_in_categorical_column_drops_row() {
        let mut row = text_row(good_row());
        row.cells[SEX] = RawCell::Number(1.0);
        assert_eq!(clean_row(&row), Err(DropReason::NotText("sex", 1.0)));
    }

    #[test]
    fn clean_reports_dropped_rows() {
        let mut bad = good_row();
        bad[SMOKER] = "";
        let (dataset, report) =
            clean(vec![text_row(good_row()), text_row(bad), text_row(good_row())]).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(report.rows_read, 3);
        assert_eq!(report.rows_dropped(), 1);
    }

    #[test]
    fn clean_without_usable_rows_is_an_integrity_error() {
        let err = clean(vec![RawRow::missing()]).unwrap_err();
        assert!(matches!(err, DashboardError::DataIntegrity { .. }));

        let err = clean(Vec::new()).unwrap_err();
        assert!(matches!(err, DashboardError::DataIntegrity { .. }));
    }
}
