use crate::core::record::RunRecord;
use log::debug;
use std::collections::BTreeMap;
use std::fmt;

/// Grouping key: hardware-queue count first, then stream count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    pub gpu_max_hw_queues: i64,
    pub num_streams: i64,
}

/// Per-group timing summary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregatedRecord {
    pub key: GroupKey,
    /// Number of non-missing samples
    pub count: usize,
    /// `NaN` when every sample in the group is missing
    pub mean_time_ms: f64,
    /// Sample standard deviation (N-1); `None` for single-sample groups
    pub std_time_ms: Option<f64>,
}

impl AggregatedRecord {
    /// Half-height of the error bar, zero when there is nothing to draw.
    pub fn error_half_width(&self) -> f64 {
        self.std_time_ms.unwrap_or(0.0)
    }
}

/// Running mean/variance (Welford). Identical samples keep `mean` exact and
/// `m2` at zero.
#[derive(Debug, Default, Clone, Copy)]
struct Accumulator {
    count: usize,
    mean: f64,
    m2: f64,
}

impl Accumulator {
    fn push(&mut self, x: f64) {
        if x.is_nan() {
            return;
        }
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            return f64::NAN;
        }
        self.mean
    }

    fn std(&self) -> Option<f64> {
        if self.count < 2 {
            return None;
        }
        Some((self.m2 / (self.count - 1) as f64).sqrt())
    }
}

/// All points drawn for one hardware-queue setting, sorted by stream count.
#[derive(Debug, Clone, PartialEq)]
pub struct HwqSeries {
    pub gpu_max_hw_queues: i64,
    pub points: Vec<AggregatedRecord>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedTable {
    rows: Vec<AggregatedRecord>,
}

/// Group runs by (hwq, streams) and summarise `time_ms` per group.
pub fn aggregate(runs: &[RunRecord]) -> AggregatedTable {
    let mut groups: BTreeMap<GroupKey, Accumulator> = BTreeMap::new();
    for run in runs {
        let key = GroupKey {
            gpu_max_hw_queues: run.gpu_max_hw_queues,
            num_streams: run.num_streams,
        };
        groups.entry(key).or_default().push(run.time_ms);
    }

    let rows: Vec<AggregatedRecord> = groups
        .into_iter()
        .map(|(key, acc)| AggregatedRecord {
            key,
            count: acc.count,
            mean_time_ms: acc.mean(),
            std_time_ms: acc.std(),
        })
        .collect();

    for row in &rows {
        debug!(
            "hwq={} streams={} n={} mean={:.4} std={:?}",
            row.key.gpu_max_hw_queues, row.key.num_streams, row.count, row.mean_time_ms, row.std_time_ms
        );
    }
    AggregatedTable { rows }
}

impl AggregatedTable {
    pub fn rows(&self) -> &[AggregatedRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, gpu_max_hw_queues: i64, num_streams: i64) -> Option<&AggregatedRecord> {
        let key = GroupKey {
            gpu_max_hw_queues,
            num_streams,
        };
        self.rows.iter().find(|r| r.key == key)
    }

    /// Distinct hwq values in the order the table emits them.
    pub fn hwq_values(&self) -> Vec<i64> {
        let mut seen = Vec::new();
        for row in &self.rows {
            if !seen.contains(&row.key.gpu_max_hw_queues) {
                seen.push(row.key.gpu_max_hw_queues);
            }
        }
        seen
    }

    /// One series per hwq value; each series is re-sorted by stream count so
    /// it does not depend on the row order of the table.
    pub fn series(&self) -> Vec<HwqSeries> {
        self.hwq_values()
            .into_iter()
            .map(|hwq| {
                let mut points: Vec<AggregatedRecord> = self
                    .rows
                    .iter()
                    .filter(|r| r.key.gpu_max_hw_queues == hwq)
                    .copied()
                    .collect();
                points.sort_by_key(|r| r.key.num_streams);
                HwqSeries {
                    gpu_max_hw_queues: hwq,
                    points,
                }
            })
            .collect()
    }
}

impl fmt::Display for AggregatedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let idx_w = self.rows.len().saturating_sub(1).to_string().len();
        writeln!(
            f,
            "{:>idx_w$}  gpu_max_hw_queues  num_streams  mean_time_ms  std_time_ms  count",
            ""
        )?;
        for (i, row) in self.rows.iter().enumerate() {
            let std = row
                .std_time_ms
                .map_or_else(|| "NaN".to_string(), |s| format!("{s:.6}"));
            writeln!(
                f,
                "{:>idx_w$}  {:>17}  {:>11}  {:>12.6}  {:>11}  {:>5}",
                i, row.key.gpu_max_hw_queues, row.key.num_streams, row.mean_time_ms, std, row.count
            )?;
        }
        Ok(())
    }
}
