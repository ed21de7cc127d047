use std::fs;
use std::io::Read;
use std::path::Path;
use std::time::Instant;

use chrono::{DateTime, SecondsFormat, Utc};
use flow_core::ServiceCatalog;
use tracing::{debug, info};

use crate::parser::TelemetryBuckets;
use crate::totals::UsageStore;
use crate::types::{IngestOptions, IngestStats, Result};

/// Outcome of aggregating one flow log.
pub struct Aggregation<C> {
    pub store: UsageStore<C>,
    pub stats: IngestStats,
}

fn format_ref_ts(ref_ts: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(ref_ts, 0)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Folds every telemetry line into `store`, one bucket at a time, in line
/// order. The first malformed payload aborts the run.
pub fn aggregate_lines<I, S, C>(
    store: &mut UsageStore<C>,
    lines: I,
    marker: &str,
) -> Result<IngestStats>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    C: ServiceCatalog,
{
    let started = Instant::now();
    let mut stats = IngestStats::default();
    let mut buckets = TelemetryBuckets::new(lines.into_iter(), marker);
    for bucket in buckets.by_ref() {
        let bucket = bucket?;
        let outcome = store.apply(&bucket)?;
        stats.buckets_applied += 1;
        stats.slots_ignored += outcome.slots_ignored;
        if let Some(ref_ts) = bucket.ref_ts {
            if stats.first_ref_ts.is_none() {
                stats.first_ref_ts = format_ref_ts(ref_ts);
            }
            stats.last_ref_ts = format_ref_ts(ref_ts);
        }
        debug!(
            ref_ts = ?bucket.ref_ts,
            bucket_size = ?bucket.bucket_size,
            slots = outcome.slots_applied,
            "bucket applied"
        );
    }
    stats.lines_read = buckets.lines_read();
    stats.telemetry_lines = buckets.telemetry_lines();

    info!(
        lines = stats.lines_read,
        buckets = stats.buckets_applied,
        devices = store.devices().len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "flow log aggregated"
    );
    Ok(stats)
}

pub fn aggregate_reader<R, C>(
    mut reader: R,
    options: &IngestOptions,
    catalog: C,
) -> Result<Aggregation<C>>
where
    R: Read,
    C: ServiceCatalog,
{
    let mut content = String::new();
    reader.read_to_string(&mut content)?;
    aggregate_content(&content, options, catalog)
}

pub fn aggregate_file<C: ServiceCatalog>(
    path: &Path,
    options: &IngestOptions,
    catalog: C,
) -> Result<Aggregation<C>> {
    let content = fs::read_to_string(path)?;
    debug!(path = %path.display(), bytes = content.len(), "flow log loaded");
    aggregate_content(&content, options, catalog)
}

fn aggregate_content<C: ServiceCatalog>(
    content: &str,
    options: &IngestOptions,
    catalog: C,
) -> Result<Aggregation<C>> {
    let mut store = UsageStore::with_slot_policy(catalog, options.slot_policy);
    let stats = aggregate_lines(&mut store, content.lines(), &options.marker)?;
    Ok(Aggregation { store, stats })
}
