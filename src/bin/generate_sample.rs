use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

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

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Growth path: `base * (1 + rate)^(year - 2005)` with a little noise.
fn trajectory(base: f64, rate: f64, year: i64, rng: &mut SimpleRng) -> f64 {
    let t = (year - 2005) as f64;
    base * (1.0 + rate).powf(t) * (0.98 + 0.04 * rng.next_f64())
}

fn main() -> Result<()> {
    env_logger::init();
    let mut rng = SimpleRng::new(42);

    let models = [("MSG-GLB", 1.0), ("IMG", 1.1)];
    let scenarios = [("a_scen", 0.02), ("a_scen_2", -0.01)];
    let regions = [("World", 1.0), ("R5ASIA", 0.45), ("R5REF", 0.1)];
    // (variable, unit, 2005 world level)
    let variables = [
        ("Primary Energy", "EJ/yr", 500.0),
        ("Primary Energy|Coal", "EJ/yr", 150.0),
        ("Primary Energy|Gas", "EJ/yr", 120.0),
        ("Emissions|CO2", "Mt CO2/yr", 35_000.0),
        ("Emissions|CO2|Cars", "Mt CO2/yr", 6_000.0),
        ("Emissions|CO2|Tar", "Mt CO2/yr", 1_500.0),
    ];
    let years: Vec<i64> = (2005..=2050).step_by(5).collect();

    let mut cols: [Vec<String>; 5] = Default::default();
    let mut all_year = Vec::new();
    let mut all_value = Vec::new();

    for &(model, model_scale) in &models {
        for &(scenario, rate) in &scenarios {
            for &(region, share) in &regions {
                for &(variable, unit, base) in &variables {
                    for &year in &years {
                        let value =
                            trajectory(base * model_scale * share, rate, year, &mut rng);
                        for (col, v) in cols.iter_mut().zip([model, scenario, region, variable, unit]) {
                            col.push(v.to_string());
                        }
                        all_year.push(year);
                        all_value.push(value);
                    }
                }
            }
        }
    }

    let names = ["model", "scenario", "region", "variable", "unit"];
    let mut fields: Vec<Field> = names
        .iter()
        .map(|n| Field::new(*n, DataType::Utf8, false))
        .collect();
    fields.push(Field::new("year", DataType::Int64, false));
    fields.push(Field::new("value", DataType::Float64, false));
    let schema = Arc::new(Schema::new(fields));

    let n_rows = all_value.len();
    let mut arrays: Vec<Arc<dyn arrow::array::Array>> = cols
        .iter()
        .map(|c| {
            Arc::new(StringArray::from(
                c.iter().map(String::as_str).collect::<Vec<_>>(),
            )) as Arc<dyn arrow::array::Array>
        })
        .collect();
    arrays.push(Arc::new(Int64Array::from(all_year)));
    arrays.push(Arc::new(Float64Array::from(all_value)));

    let batch =
        RecordBatch::try_new(schema.clone(), arrays).context("Failed to create RecordBatch")?;

    let output_path = "sample_scenarios.parquet";
    let file = std::fs::File::create(output_path).context("Failed to create output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("Failed to create writer")?;
    writer.write(&batch).context("Failed to write batch")?;
    writer.close().context("Failed to close writer")?;

    log::info!("Wrote {n_rows} records to {output_path}");
    println!(
        "Wrote {n_rows} records ({} scenarios x {} years) to {output_path}",
        models.len() * scenarios.len(),
        years.len()
    );
    Ok(())
}
