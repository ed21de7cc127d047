//! Presentation of aggregated usage: JSON dump, aligned tables and text
//! stacked-bar charts.

use std::io::{self, Write};

use flow_core::{AccumulatorKind, UsageAccumulator, format_bytes};
use ingest::{DeviceUsage, UsageStore};
use serde::Serialize;

pub const DEFAULT_CHART_WIDTH: usize = 100;

const TABLE_HEADERS: [&str; 5] = ["ID", "Display Name", "TX", "RX", "usage_minutes"];
const RX_GLYPH: char = '█';
const TX_GLYPH: char = '▒';

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// JSON dump followed by per-device tables and charts.
    #[default]
    Table,
    /// JSON dump only.
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    pub format: OutputFormat,
    pub charts: bool,
    pub chart_width: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Table,
            charts: true,
            chart_width: DEFAULT_CHART_WIDTH,
        }
    }
}

pub fn render_json<C>(store: &UsageStore<C>) -> serde_json::Result<String> {
    serde_json::to_string_pretty(store)
}

fn pad(cell: &str, width: usize) -> String {
    let len = cell.chars().count();
    let mut padded = String::with_capacity(width.max(len));
    padded.push_str(cell);
    padded.extend(std::iter::repeat_n(' ', width.saturating_sub(len)));
    padded
}

/// Left-aligned boxed table.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (col, cell) in row.iter().enumerate() {
            if col < widths.len() {
                widths[col] = widths[col].max(cell.chars().count());
            }
        }
    }

    let border = widths.iter().fold(String::from("+"), |mut line, width| {
        line.push_str(&"-".repeat(width + 2));
        line.push('+');
        line
    });
    let mut out = Vec::with_capacity(rows.len() + 4);
    out.push(border.clone());
    out.push(render_row(headers.iter().copied(), &widths));
    out.push(border.clone());
    for row in rows {
        out.push(render_row(row.iter().map(String::as_str), &widths));
    }
    out.push(border);
    out.join("\n")
}

fn render_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let mut line = String::from("|");
    for (cell, width) in cells.zip(widths) {
        line.push(' ');
        line.push_str(&pad(cell, *width));
        line.push_str(" |");
    }
    line
}

fn sorted_by_index(accumulators: &[UsageAccumulator]) -> Vec<&UsageAccumulator> {
    let mut sorted: Vec<&UsageAccumulator> = accumulators.iter().collect();
    sorted.sort_by_key(|acc| acc.index());
    sorted
}

pub fn render_usage_table(device: &DeviceUsage, kind: AccumulatorKind) -> String {
    let rows: Vec<Vec<String>> = sorted_by_index(device.accumulators(kind))
        .into_iter()
        .map(|acc| {
            vec![
                acc.index().to_string(),
                acc.display_name().to_string(),
                format_bytes(acc.tx()),
                format_bytes(acc.rx()),
                acc.usage_minutes().to_string(),
            ]
        })
        .collect();
    render_table(&TABLE_HEADERS, &rows)
}

fn scaled(value: u64, max: u64, width: usize) -> usize {
    if max == 0 {
        return 0;
    }
    ((value as u128 * width as u128) / max as u128) as usize
}

/// Horizontal stacked bars of rx then tx per accumulator, scaled so the
/// largest total spans `width` cells.
pub fn render_usage_chart(device: &DeviceUsage, kind: AccumulatorKind, width: usize) -> String {
    let accumulators = device.accumulators(kind);
    let labels: Vec<String> = accumulators
        .iter()
        .map(|acc| acc.display_name().to_string())
        .collect();
    let label_width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let max_total = accumulators
        .iter()
        .map(|acc| acc.rx().saturating_add(acc.tx()))
        .max()
        .unwrap_or(0);

    let mut lines = Vec::with_capacity(accumulators.len() + 2);
    lines.push(format!("{} - {}", kind.label(), device.ip));
    for (acc, label) in accumulators.iter().zip(&labels) {
        let total = acc.rx().saturating_add(acc.tx());
        let total_cells = scaled(total, max_total, width);
        let rx_cells = scaled(acc.rx(), max_total, width).min(total_cells);
        let mut bar = String::with_capacity(total_cells * RX_GLYPH.len_utf8());
        bar.extend(std::iter::repeat_n(RX_GLYPH, rx_cells));
        bar.extend(std::iter::repeat_n(TX_GLYPH, total_cells - rx_cells));
        lines.push(format!("{} {} {}", pad(label, label_width), bar, format_bytes(total)));
    }
    lines.push(format!("{RX_GLYPH} rx  {TX_GLYPH} tx"));
    lines.join("\n")
}

/// Writes the full report for a run.
pub fn write_report<W: Write, C>(
    writer: &mut W,
    store: &UsageStore<C>,
    options: &ReportOptions,
) -> io::Result<()> {
    let json = render_json(store).map_err(io::Error::other)?;
    writeln!(writer, "{}", json)?;
    if options.format == OutputFormat::Json {
        return Ok(());
    }

    for device in store.devices() {
        writeln!(writer, "Device: {}", device.ip)?;
        for kind in [AccumulatorKind::Service, AccumulatorKind::Category] {
            if device.accumulators(kind).is_empty() {
                continue;
            }
            writeln!(writer, "{}", render_usage_table(device, kind))?;
            if options.charts {
                writeln!(
                    writer,
                    "{}",
                    render_usage_chart(device, kind, options.chart_width)
                )?;
            }
        }
    }
    Ok(())
}
