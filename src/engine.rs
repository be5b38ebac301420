use crate::core::aggregate::{aggregate, AggregatedTable};
use crate::core::chart::{render_chart, ChartStyle};
use crate::core::record::load_csv;
use crate::error::Result;
use log::info;
use std::path::PathBuf;

pub const DEFAULT_CSV: &str = "results_hwq_streams.csv";
pub const DEFAULT_OUT: &str = "streams_vs_hwq.png";
pub const DEFAULT_LEGEND: &str = "N/A";

/// Inputs of one plotting run
#[derive(Debug, Clone, PartialEq)]
pub struct PlotConfig {
    pub csv: PathBuf,
    pub out: PathBuf,
    /// Legend title, usually the GPU the benchmark ran on
    pub legend: String,
    pub style: ChartStyle,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            csv: PathBuf::from(DEFAULT_CSV),
            out: PathBuf::from(DEFAULT_OUT),
            legend: DEFAULT_LEGEND.to_string(),
            style: ChartStyle::default(),
        }
    }
}

/// What a finished run produced
#[derive(Debug, Clone)]
pub struct PlotReport {
    pub table: AggregatedTable,
    pub out: PathBuf,
}

/// Load -> aggregate -> render, in that order, once.
pub struct PlotEngine {
    config: PlotConfig,
}

impl PlotEngine {
    pub fn new(config: PlotConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlotConfig {
        &self.config
    }

    /// Read the input CSV and group it. The raw runs are dropped here.
    pub fn load_and_aggregate(&self) -> Result<AggregatedTable> {
        let runs = load_csv(&self.config.csv)?;
        let table = aggregate(&runs);
        info!(
            "aggregated {} runs into {} groups across {} hwq values",
            runs.len(),
            table.len(),
            table.hwq_values().len()
        );
        Ok(table)
    }

    pub fn render(&self, table: &AggregatedTable) -> Result<()> {
        render_chart(table, &self.config.out, &self.config.legend, &self.config.style)?;
        info!("wrote {}", self.config.out.display());
        Ok(())
    }

    pub fn run(&self) -> Result<PlotReport> {
        let table = self.load_and_aggregate()?;
        self.render(&table)?;
        Ok(PlotReport {
            table,
            out: self.config.out.clone(),
        })
    }
}
