use crate::error::{PlotError, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, info};
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub const COL_HWQ: &str = "gpu_max_hw_queues";
pub const COL_STREAMS: &str = "num_streams";
pub const COL_TIME: &str = "time_ms";
pub const COL_RUN_ID: &str = "run_id";

/// One benchmark run: a single timed execution at a given
/// (hardware-queue, stream) configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub gpu_max_hw_queues: i64,
    pub num_streams: i64,
    /// `NaN` for an empty or `NaN` cell; such runs are skipped when grouping
    pub time_ms: f64,
    /// Repetition label as written in the CSV, kept verbatim
    pub run_id: Option<String>,
}

impl RunRecord {
    pub fn new(gpu_max_hw_queues: i64, num_streams: i64, time_ms: f64) -> Self {
        Self {
            gpu_max_hw_queues,
            num_streams,
            time_ms,
            run_id: None,
        }
    }
}

/// Column positions resolved from the header row
struct Columns {
    hwq: usize,
    streams: usize,
    time: usize,
    run_id: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self> {
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| PlotError::MissingColumn {
                    column: name,
                    available: headers.iter().map(str::to_string).collect(),
                })
        };
        Ok(Self {
            hwq: find(COL_HWQ)?,
            streams: find(COL_STREAMS)?,
            time: find(COL_TIME)?,
            run_id: headers.iter().position(|h| h == COL_RUN_ID),
        })
    }
}

/// Load every run from the CSV at `path`.
///
/// A path that does not exist is reported as [`PlotError::InputNotFound`];
/// everything else (unreadable file, ragged rows, bad cells) surfaces as the
/// matching error variant.
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Vec<RunRecord>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(PlotError::InputNotFound {
            path: path.to_path_buf(),
        });
    }
    let file = File::open(path).map_err(|source| PlotError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let records = parse_reader(file)?;
    info!("loaded {} runs from {}", records.len(), path.display());
    Ok(records)
}

/// Parse runs from any CSV byte source with a header row.
pub fn parse_reader<R: Read>(reader: R) -> Result<Vec<RunRecord>> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);

    let headers = reader.headers().map_err(csv_error)?.clone();
    let cols = Columns::resolve(&headers)?;
    debug!(
        "columns: hwq={} streams={} time={} run_id={:?}",
        cols.hwq, cols.streams, cols.time, cols.run_id
    );

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(csv_error)?;
        let line = row.position().map_or(0, csv::Position::line);
        let cell = |idx: usize| row.get(idx).unwrap_or("");

        let run_id = cols
            .run_id
            .map(cell)
            .filter(|raw| !raw.is_empty())
            .map(str::to_string);
        records.push(RunRecord {
            gpu_max_hw_queues: coerce_int(cell(cols.hwq), line, COL_HWQ)?,
            num_streams: coerce_int(cell(cols.streams), line, COL_STREAMS)?,
            time_ms: coerce_float(cell(cols.time), line, COL_TIME)?,
            run_id,
        });
    }
    Ok(records)
}

fn csv_error(err: csv::Error) -> PlotError {
    PlotError::Csv {
        line: err.position().map_or(0, csv::Position::line),
        message: err.to_string(),
    }
}

/// Integer cells accept plain integers, and floats truncated toward zero.
fn coerce_int(raw: &str, line: u64, column: &'static str) -> Result<i64> {
    if let Ok(v) = raw.parse::<i64>() {
        return Ok(v);
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v.abs() < i64::MAX as f64 => Ok(v.trunc() as i64),
        _ => Err(PlotError::Coerce {
            line,
            column,
            value: raw.to_string(),
            expected: "integer",
        }),
    }
}

/// Empty and `NaN` cells become `NaN` (a missing sample); infinities and
/// non-numeric text are errors.
fn coerce_float(raw: &str, line: u64, column: &'static str) -> Result<f64> {
    if raw.is_empty() {
        return Ok(f64::NAN);
    }
    match raw.parse::<f64>() {
        Ok(v) if !v.is_infinite() => Ok(v),
        _ => Err(PlotError::Coerce {
            line,
            column,
            value: raw.to_string(),
            expected: "float",
        }),
    }
}
