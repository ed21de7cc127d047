mod parser;
mod pipeline;
mod totals;
mod types;

pub use parser::{
    TelemetryBuckets, buckets_from_lines, decode_bucket, is_telemetry_line, payload_token,
};
pub use pipeline::{Aggregation, aggregate_file, aggregate_lines, aggregate_reader};
pub use totals::{ApplyOutcome, DeviceUsage, NameCache, UsageStore};
pub use types::{
    IngestError, IngestOptions, IngestStats, PRIMARY_SLOT, Result, SlotPolicy, TELEMETRY_MARKER,
};
