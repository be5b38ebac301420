use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use streams_vs_hwq::engine::{DEFAULT_CSV, DEFAULT_LEGEND, DEFAULT_OUT};
use streams_vs_hwq::{PlotConfig, PlotEngine, PlotError};

/// Plot time vs num_streams for different GPU_MAX_HW_QUEUES values.
#[derive(Parser, Debug)]
#[command(name = "streams_vs_hwq", version)]
struct Cli {
    /// Path to input CSV
    #[arg(long, default_value = DEFAULT_CSV)]
    csv: PathBuf,

    /// Output image filename (PNG, or SVG by extension)
    #[arg(long, default_value = DEFAULT_OUT)]
    out: PathBuf,

    /// Name of the GPU used to run this test (e.g. AMD W7900)
    #[arg(long, default_value = DEFAULT_LEGEND)]
    legend: String,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = PlotConfig {
        csv: cli.csv,
        out: cli.out,
        legend: cli.legend,
        ..PlotConfig::default()
    };

    let engine = PlotEngine::new(config);
    let table = match engine.load_and_aggregate() {
        Ok(table) => table,
        Err(err @ PlotError::InputNotFound { .. }) => return Err(err.into()),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read {}", engine.config().csv.display()))
        }
    };

    println!("Aggregated data:");
    print!("{table}");

    engine
        .render(&table)
        .with_context(|| format!("failed to write {}", engine.config().out.display()))?;
    println!("Saved plot to {}", engine.config().out.display());
    Ok(())
}
