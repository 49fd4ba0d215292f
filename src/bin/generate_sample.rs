use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int32Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use insights_dashboard::Record;

const TOPICS: [(&str, &str); 6] = [
    ("Energy", "Power"),
    ("Technology", "IT"),
    ("Climate", "Environment"),
    ("Finance", "Banking"),
    ("Healthcare", "Medical"),
    ("Manufacturing", "Automotive"),
];
const REGIONS: [(&str, &[&str]); 5] = [
    ("North America", &["United States", "Canada"]),
    ("Asia", &["China", "Japan", "India"]),
    ("Europe", &["Germany"]),
    ("South America", &["Brazil"]),
    ("Africa", &["Nigeria"]),
];
const PESTLES: [&str; 6] = [
    "Political",
    "Economic",
    "Social",
    "Technological",
    "Legal",
    "Environmental",
];
const SOURCES: [&str; 5] = ["News", "Reports", "Research", "Government", "Academia"];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.below(items.len())]
    }

    /// Roughly one in `n` draws is true.
    fn one_in(&mut self, n: usize) -> bool {
        self.below(n) == 0
    }
}

fn generate_record(rng: &mut SimpleRng) -> Record {
    let (topic, sector) = *rng.pick(&TOPICS);
    let (region, countries) = *rng.pick(&REGIONS);
    let start_year = 2016 + rng.below(9) as i32;
    let end_year = start_year + rng.below(12) as i32;

    // Gaps mirror the real export: missing years and categories are common.
    Record {
        end_year: (!rng.one_in(4)).then_some(end_year),
        start_year: (!rng.one_in(3)).then_some(start_year),
        intensity: (1 + rng.below(12)) as f64,
        relevance: (1 + rng.below(7)) as f64,
        likelihood: (1 + rng.below(4)) as f64,
        topic: (!rng.one_in(10)).then(|| topic.to_string()),
        sector: (!rng.one_in(6)).then(|| sector.to_string()),
        region: (!rng.one_in(8)).then(|| region.to_string()),
        pestle: Some(rng.pick(&PESTLES).to_string()),
        source: Some(rng.pick(&SOURCES).to_string()),
        country: (!rng.one_in(5)).then(|| rng.pick(countries).to_string()),
        title: Some(format!("{topic} outlook for {region}")),
        ..Record::default()
    }
}

fn text_column(records: &[Record], get: impl Fn(&Record) -> Option<&str>) -> ArrayRef {
    Arc::new(StringArray::from(records.iter().map(get).collect::<Vec<_>>()))
}

fn write_parquet(records: &[Record], path: &str) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("end_year", DataType::Int32, true),
        Field::new("start_year", DataType::Int32, true),
        Field::new("intensity", DataType::Float64, false),
        Field::new("relevance", DataType::Float64, false),
        Field::new("likelihood", DataType::Float64, false),
        Field::new("topic", DataType::Utf8, true),
        Field::new("sector", DataType::Utf8, true),
        Field::new("region", DataType::Utf8, true),
        Field::new("pestle", DataType::Utf8, true),
        Field::new("source", DataType::Utf8, true),
        Field::new("country", DataType::Utf8, true),
        Field::new("title", DataType::Utf8, true),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int32Array::from(
            records.iter().map(|r| r.end_year).collect::<Vec<_>>(),
        )),
        Arc::new(Int32Array::from(
            records.iter().map(|r| r.start_year).collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            records.iter().map(|r| r.intensity).collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            records.iter().map(|r| r.relevance).collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            records.iter().map(|r| r.likelihood).collect::<Vec<_>>(),
        )),
        text_column(records, |r| r.topic.as_deref()),
        text_column(records, |r| r.sector.as_deref()),
        text_column(records, |r| r.region.as_deref()),
        text_column(records, |r| r.pestle.as_deref()),
        text_column(records, |r| r.source.as_deref()),
        text_column(records, |r| r.country.as_deref()),
        text_column(records, |r| r.title.as_deref()),
    ];

    let batch =
        RecordBatch::try_new(schema.clone(), columns).context("Failed to create RecordBatch")?;

    let file = std::fs::File::create(path).context("Failed to create output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("Failed to create writer")?;
    writer.write(&batch).context("Failed to write batch")?;
    writer.close().context("Failed to close writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let count: usize = match std::env::args().nth(1) {
        Some(arg) => arg.parse().context("record count must be a number")?,
        None => 1000,
    };

    let mut rng = SimpleRng::new(42);
    let records: Vec<Record> = (0..count).map(|_| generate_record(&mut rng)).collect();

    let parquet_path = "sample_data.parquet";
    write_parquet(&records, parquet_path)?;

    let json_path = "sample_data.json";
    let file = std::fs::File::create(json_path).context("Failed to create output file")?;
    serde_json::to_writer_pretty(file, &records).context("Failed to write JSON")?;

    println!("Wrote {count} records to {parquet_path} and {json_path}");
    Ok(())
}
