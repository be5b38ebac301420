//! Aggregate GPU hardware-queue / stream-count benchmark runs and plot
//! mean execution time against stream count, one error-barred line per
//! `GPU_MAX_HW_QUEUES` setting.

pub mod core;
pub mod engine;
pub mod error;

pub use crate::core::aggregate::{aggregate, AggregatedRecord, AggregatedTable, GroupKey, HwqSeries};
pub use crate::core::chart::{legend_labels, render_chart, ChartStyle};
pub use crate::core::record::{load_csv, parse_reader, RunRecord};
pub use crate::engine::{PlotConfig, PlotEngine, PlotReport};
pub use crate::error::{PlotError, Result};
