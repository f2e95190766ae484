//! Writes synthetic cycler exports for trying out the plotter.
//!
//! Each cell becomes a folder holding two channel sheets (CSV, the time
//! series split in half the way cyclers roll over long runs) and one
//! statistics sheet (Parquet).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use parquet::arrow::ArrowWriter;

const CHANNEL_HEADERS: [&str; 8] = [
    "Data_Point",
    "Test_Time(s)",
    "Step_Index",
    "Cycle_Index",
    "Current(A)",
    "Voltage(V)",
    "Charge_Capacity(Ah)",
    "Discharge_Capacity(Ah)",
];

#[derive(Parser)]
#[command(name = "generate-sample")]
#[command(about = "Write synthetic battery cycler exports", version)]
struct Args {
    /// Output directory
    #[arg(short, long, default_value = "sample_exports")]
    output: PathBuf,

    /// Number of cells
    #[arg(long, default_value_t = 3)]
    cells: usize,

    /// Cycles per cell
    #[arg(long, default_value_t = 20)]
    cycles: usize,

    /// Random seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Deterministic SplitMix64 generator; reruns give identical files.
struct SplitMix {
    state: u64,
}

impl SplitMix {
    fn new(seed: u64) -> Self {
        SplitMix { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in `[-1, 1)`.
    fn jitter(&mut self) -> f64 {
        ((self.next_u64() >> 11) as f64 / (1u64 << 53) as f64) * 2.0 - 1.0
    }
}

/// One row of channel data.
struct Sample {
    point: i64,
    time_s: f64,
    step: i64,
    cycle: i64,
    current_a: f64,
    voltage_v: f64,
    charge_ah: f64,
    discharge_ah: f64,
}

/// Per-cycle summary.
struct CycleSummary {
    cycle: i64,
    end_time_s: f64,
    charge_ah: f64,
    discharge_ah: f64,
}

/// Constant-current cycling of a small coin cell with slow capacity fade.
fn simulate_cell(cycles: usize, current_a: f64, rng: &mut SplitMix) -> (Vec<Sample>, Vec<CycleSummary>) {
    const POINTS_PER_HALF: usize = 60;
    const V_MIN: f64 = 3.0;
    const V_MAX: f64 = 4.2;

    let mut samples = Vec::new();
    let mut summaries = Vec::new();
    let mut time_s = 0.0;
    let mut point = 1;

    for c in 0..cycles {
        let cycle = c as i64 + 1;
        let fade = 1.0 - 0.004 * c as f64;
        let capacity_ah = current_a * 10.0 * fade;
        let dt = capacity_ah / current_a * 3600.0 / POINTS_PER_HALF as f64;

        let mut charge_ah = 0.0;
        let mut discharge_ah = 0.0;

        for (step, sign) in [(1, 1.0), (2, -1.0)] {
            for i in 0..POINTS_PER_HALF {
                let progress = (i + 1) as f64 / POINTS_PER_HALF as f64;
                let shape = progress.powf(0.6);
                let voltage = if sign > 0.0 {
                    V_MIN + (V_MAX - V_MIN) * shape
                } else {
                    V_MAX - (V_MAX - V_MIN) * shape
                };
                time_s += dt;
                let delivered = capacity_ah * progress;
                if sign > 0.0 {
                    charge_ah = delivered;
                } else {
                    discharge_ah = delivered * (0.985 + 0.005 * rng.jitter());
                }

                samples.push(Sample {
                    point,
                    time_s,
                    step,
                    cycle,
                    current_a: sign * current_a * (1.0 + 0.01 * rng.jitter()),
                    voltage_v: voltage + 0.002 * rng.jitter(),
                    charge_ah,
                    discharge_ah,
                });
                point += 1;
            }
        }

        summaries.push(CycleSummary {
            cycle,
            end_time_s: time_s,
            charge_ah,
            discharge_ah,
        });
    }

    (samples, summaries)
}

fn write_channel_csv(path: &Path, samples: &[Sample]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(CHANNEL_HEADERS)?;
    for s in samples {
        writer.write_record([
            s.point.to_string(),
            format!("{:.3}", s.time_s),
            s.step.to_string(),
            s.cycle.to_string(),
            format!("{:.9}", s.current_a),
            format!("{:.5}", s.voltage_v),
            format!("{:.12}", s.charge_ah),
            format!("{:.12}", s.discharge_ah),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_statistics_parquet(path: &Path, summaries: &[CycleSummary]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("Cycle_Index", DataType::Int64, false),
        Field::new("Test_Time(s)", DataType::Float64, false),
        Field::new("Charge_Capacity(Ah)", DataType::Float64, false),
        Field::new("Discharge_Capacity(Ah)", DataType::Float64, false),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(summaries.iter().map(|s| s.cycle))),
        Arc::new(Float64Array::from_iter_values(summaries.iter().map(|s| s.end_time_s))),
        Arc::new(Float64Array::from_iter_values(summaries.iter().map(|s| s.charge_ah))),
        Arc::new(Float64Array::from_iter_values(summaries.iter().map(|s| s.discharge_ah))),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let mut rng = SplitMix::new(args.seed);

    for cell in 0..args.cells {
        let name = format!("Cell_{:02}", cell + 1);
        let dir = args.output.join(&name);
        std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

        // Micro-amp currents, so the plotter's unit rescaling kicks in.
        let current_a = 5.0e-6 * (1.0 + 0.2 * cell as f64);
        let (samples, summaries) = simulate_cell(args.cycles, current_a, &mut rng);

        let (first, second) = samples.split_at(samples.len() / 2);
        let channel_id = 6 + cell;
        write_channel_csv(&dir.join(format!("Channel_1-{channel_id:03}_1.csv")), first)?;
        write_channel_csv(&dir.join(format!("Channel_1-{channel_id:03}_2.csv")), second)?;
        write_statistics_parquet(
            &dir.join(format!("Statistics_1-{channel_id:03}.parquet")),
            &summaries,
        )?;

        log::info!("Wrote {} ({} points, {} cycles)", dir.display(), samples.len(), summaries.len());
    }

    println!(
        "Wrote {} cell export(s) to {}",
        args.cells,
        args.output.display()
    );
    Ok(())
}
