use serde::{Deserialize, Serialize};
use std::io;

use flow_core::CategoryError;

/// Substring identifying the agent's bucket send log lines.
pub const TELEMETRY_MARKER: &str = "combine_and_send";

/// Slot consumed by default from each bucket payload.
pub const PRIMARY_SLOT: &str = "0";

/// Which slots of a bucket payload are folded into the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotPolicy {
    /// Only slot `"0"`; other slots are counted as ignored.
    #[default]
    Primary,
    /// Every slot, in ascending numeric order.
    All,
}

/// Knobs for one aggregation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOptions {
    pub marker: String,
    pub slot_policy: SlotPolicy,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            marker: TELEMETRY_MARKER.to_string(),
            slot_policy: SlotPolicy::default(),
        }
    }
}

/// Summary returned after aggregating a flow log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    pub lines_read: usize,
    pub telemetry_lines: usize,
    pub buckets_applied: usize,
    pub slots_ignored: usize,
    pub first_ref_ts: Option<String>,
    pub last_ref_ts: Option<String>,
}

/// Errors emitted by the ingest pipeline. All of them abort the run.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("line {line}: malformed bucket payload: {source}")]
    Decode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid {kind} index {raw:?} for device {ip}")]
    InvalidIndex {
        ip: String,
        kind: &'static str,
        raw: String,
    },
    #[error("invalid bucket slot {0:?}")]
    InvalidSlot(String),
    #[error("category error: {0}")]
    Category(#[from] CategoryError),
}

pub type Result<T> = std::result::Result<T, IngestError>;
