use std::io::Write;
use std::path::Path;

use anyhow::Result;
use flowcorr_core::pipeline::{ChannelAnalysis, FlowConfig};
use serde::Serialize;

/// One CSV line: a single channel of a single input.
///
/// Flow columns are empty when the channel had no usable data.
#[derive(Debug, Serialize)]
pub struct CsvRow {
    pub path: String,
    pub channel: usize,
    pub verdict: String,
    pub fraction: Option<f64>,
    pub direction_deg: Option<f64>,
    pub speed_um_per_pair: Option<f64>,
    pub divergence: Option<f64>,
    /// Per-pair correlation lengths in micrometres, space separated.
    pub lengths_um: String,
}

pub fn csv_rows(path: &Path, results: &[ChannelAnalysis], flow: &FlowConfig) -> Vec<CsvRow> {
    results
        .iter()
        .map(|result| {
            let summary = result.summary.as_ref();
            CsvRow {
                path: path.display().to_string(),
                channel: result.channel,
                verdict: result.verdict.to_string(),
                fraction: summary.map(|s| s.fraction_above),
                direction_deg: summary.map(|s| s.mean_direction.to_degrees()),
                speed_um_per_pair: summary.map(|s| s.mean_speed * flow.pixel_size),
                divergence: summary.map(|s| s.mean_divergence),
                lengths_um: result
                    .correlation_lengths
                    .iter()
                    .map(|l| format!("{l:.3}"))
                    .collect::<Vec<_>>()
                    .join(" "),
            }
        })
        .collect()
}

/// Write a header line followed by `rows`.
pub fn write_csv<W: Write>(out: W, rows: &[CsvRow]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    if rows.is_empty() {
        writer.write_record([
            "path",
            "channel",
            "verdict",
            "fraction",
            "direction_deg",
            "speed_um_per_pair",
            "divergence",
            "lengths_um",
        ])?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
