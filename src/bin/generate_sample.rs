use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use parquet::arrow::ArrowWriter;
use serde::Serialize;
use tips_dashboard::data::model::{Day, Sex, Smoker, Time};

#[derive(Parser, Debug)]
#[command(name = "generate_sample")]
#[command(about = "Write a synthetic tips dataset (.csv, .json or .parquet)", long_about = None)]
struct Args {
    /// Output file; the extension picks the format
    #[arg(default_value = "tips.csv")]
    output: PathBuf,

    /// Number of rows to generate
    #[arg(long, default_value_t = 244)]
    rows: usize,

    /// PRNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Blank out or corrupt a few cells so the dashboard's cleaning has work to do
    #[arg(long)]
    dirty: bool,
}

/// Share of rows corrupted when `--dirty` is set.
const DIRTY_RATE: f64 = 0.04;

/// One output row. `None` is written as an empty CSV cell, JSON `null` or a
/// Parquet null.
#[derive(Debug, Clone, Serialize)]
struct SampleRow {
    total_bill: Option<f64>,
    tip: Option<f64>,
    sex: Option<String>,
    smoker: Option<String>,
    day: Option<String>,
    time: Option<String>,
    size: Option<i64>,
}

// ---------------------------------------------------------------------------
// Random source
// ---------------------------------------------------------------------------

/// SplitMix64: small, seedable, good enough for fake restaurant bills.
struct Rng(u64);

impl Rng {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in `[0, 1)`.
    fn unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Normal sample (Box-Muller, sine branch).
    fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        let radius = (-2.0 * (1.0 - self.unit()).ln()).sqrt();
        let angle = std::f64::consts::TAU * self.unit();
        mean + std_dev * radius * angle.sin()
    }

    fn chance(&mut self, p: f64) -> bool {
        self.unit() < p
    }

    /// Pick an item with probability proportional to its weight.
    fn weighted<T: Copy>(&mut self, items: &[(T, f64)]) -> T {
        let total: f64 = items.iter().map(|(_, w)| w).sum();
        let mut target = self.unit() * total;
        for &(item, w) in items {
            if target < w {
                return item;
            }
            target -= w;
        }
        items[items.len() - 1].0
    }
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

fn round_cents(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn generate_row(rng: &mut Rng) -> SampleRow {
    // Day and service weights roughly follow the seaborn tips data.
    let day = rng.weighted(&[
        (Day::Thur, 62.0),
        (Day::Fri, 19.0),
        (Day::Sat, 87.0),
        (Day::Sun, 76.0),
    ]);
    let time = match day {
        Day::Thur => rng.weighted(&[(Time::Lunch, 0.97), (Time::Dinner, 0.03)]),
        Day::Fri => rng.weighted(&[(Time::Lunch, 0.37), (Time::Dinner, 0.63)]),
        Day::Sat | Day::Sun => Time::Dinner,
    };
    let sex = rng.weighted(&[(Sex::Male, 0.64), (Sex::Female, 0.36)]);
    let smoker = rng.weighted(&[(Smoker::Yes, 0.38), (Smoker::No, 0.62)]);
    let size: i64 = rng.weighted(&[
        (1, 4.0),
        (2, 156.0),
        (3, 38.0),
        (4, 37.0),
        (5, 5.0),
        (6, 4.0),
    ]);

    let base = if time == Time::Dinner { 9.0 } else { 6.0 };
    let total_bill = round_cents(rng.normal(base + 5.5 * size as f64, 4.5).max(3.07));
    let rate = rng.normal(0.16, 0.05).clamp(0.05, 0.45);
    let tip = round_cents((total_bill * rate).max(1.0));

    SampleRow {
        total_bill: Some(total_bill),
        tip: Some(tip),
        sex: Some(sex.to_string()),
        smoker: Some(smoker.to_string()),
        day: Some(day.to_string()),
        time: Some(time.to_string()),
        size: Some(size),
    }
}

/// Blank one cell, or replace a label with one the dashboard does not know.
/// Either way the dashboard drops the row.
fn make_dirty(row: &mut SampleRow, rng: &mut Rng) {
    match rng.next_u64() % 8 {
        0 => row.total_bill = None,
        1 => row.tip = None,
        2 => row.sex = None,
        3 => row.smoker = None,
        4 => row.day = Some("Wed".to_string()),
        5 => row.time = None,
        6 => row.size = None,
        _ => row.day = None,
    }
}

/// `count` rows from `seed`; with `dirty`, about one row in 25 is corrupted.
fn generate(count: usize, seed: u64, dirty: bool) -> Vec<SampleRow> {
    let mut rng = Rng(seed);
    (0..count)
        .map(|_| {
            let mut row = generate_row(&mut rng);
            if dirty && rng.chance(DIRTY_RATE) {
                make_dirty(&mut row, &mut rng);
            }
            row
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

/// Write `rows` in the format picked by the extension of `path`.
fn write_rows(path: &Path, rows: &[SampleRow]) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => write_csv(path, rows),
        "json" => write_json(path, rows),
        "parquet" | "pq" => write_parquet(path, rows),
        other => bail!("Unsupported output extension: .{other}"),
    }
}

fn write_csv(path: &Path, rows: &[SampleRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    for row in rows {
        writer.serialize(row).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV file")?;
    Ok(())
}

fn write_json(path: &Path, rows: &[SampleRow]) -> Result<()> {
    let file = File::create(path).context("creating JSON file")?;
    serde_json::to_writer_pretty(file, rows).context("writing JSON")?;
    Ok(())
}

fn write_parquet(path: &Path, rows: &[SampleRow]) -> Result<()> {
    fn text(rows: &[SampleRow], f: impl Fn(&SampleRow) -> Option<&str>) -> StringArray {
        StringArray::from(rows.iter().map(f).collect::<Vec<_>>())
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("total_bill", DataType::Float64, true),
        Field::new("tip", DataType::Float64, true),
        Field::new("sex", DataType::Utf8, true),
        Field::new("smoker", DataType::Utf8, true),
        Field::new("day", DataType::Utf8, true),
        Field::new("time", DataType::Utf8, true),
        Field::new("size", DataType::Int64, true),
    ]));

    let total_bill: Vec<Option<f64>> = rows.iter().map(|r| r.total_bill).collect();
    let tip: Vec<Option<f64>> = rows.iter().map(|r| r.tip).collect();
    let size: Vec<Option<i64>> = rows.iter().map(|r| r.size).collect();

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Float64Array::from(total_bill)),
            Arc::new(Float64Array::from(tip)),
            Arc::new(text(rows, |r| r.sex.as_deref())),
            Arc::new(text(rows, |r| r.smoker.as_deref())),
            Arc::new(text(rows, |r| r.day.as_deref())),
            Arc::new(text(rows, |r| r.time.as_deref())),
            Arc::new(Int64Array::from(size)),
        ],
    )
    .context("building record batch")?;

    let file = File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing record batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let rows = generate(args.rows, args.seed, args.dirty);
    write_rows(&args.output, &rows)?;

    println!("Wrote {} tips rows to {}", rows.len(), args.output.display());
    Ok(())
}
