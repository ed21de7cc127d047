use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

mod category;

pub use category::{
    AGENT_CATEGORIES, CategoryError, bitmask_to_categories, categories_to_bitmask,
    category_to_bitmask,
};

/// One decoded `combine_and_send` payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketPayload {
    #[serde(default)]
    pub ref_ts: Option<i64>,
    #[serde(default)]
    pub bucket_size: Option<u64>,
    #[serde(default)]
    pub buckets: Option<BTreeMap<String, BucketSlot>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketSlot {
    #[serde(default)]
    pub devices: Option<BTreeMap<String, DeviceDelta>>,
}

/// Usage deltas reported for one device within one slot, keyed by the
/// stringified service id or category bitmask.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDelta {
    #[serde(default)]
    pub services: Option<BTreeMap<String, UsageDelta>>,
    #[serde(default)]
    pub categories: Option<BTreeMap<String, UsageDelta>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageDelta {
    pub rx: u64,
    pub tx: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccumulatorKind {
    Service,
    Category,
}

impl AccumulatorKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Service => "Services",
            Self::Category => "Categories",
        }
    }
}

/// Resolved label of an accumulator: a catalog name for services, the decoded
/// category list for category bitmasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DisplayName {
    Service(String),
    Categories(Vec<String>),
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Service(name) => f.write_str(name),
            Self::Categories(names) => f.write_str(&names.join(", ")),
        }
    }
}

/// Running totals for one service or category index of one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageAccumulator {
    #[serde(skip)]
    kind: AccumulatorKind,
    index: u32,
    display_name: DisplayName,
    tx: u64,
    rx: u64,
    usage_minutes: u64,
}

impl UsageAccumulator {
    pub fn new(kind: AccumulatorKind, index: u32, display_name: DisplayName) -> Self {
        Self {
            kind,
            index,
            display_name,
            tx: 0,
            rx: 0,
            usage_minutes: 0,
        }
    }

    pub fn kind(&self) -> AccumulatorKind {
        self.kind
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn display_name(&self) -> &DisplayName {
        &self.display_name
    }

    pub fn tx(&self) -> u64 {
        self.tx
    }

    pub fn rx(&self) -> u64 {
        self.rx
    }

    pub fn usage_minutes(&self) -> u64 {
        self.usage_minutes
    }

    /// Folds one bucket's deltas into the totals and counts one usage minute.
    pub fn accumulate(&mut self, tx_delta: u64, rx_delta: u64) {
        self.tx = merge_counter(self.tx, tx_delta);
        self.rx = merge_counter(self.rx, rx_delta);
        self.usage_minutes += 1;
    }
}

/// A zero counter takes the delta as-is, a non-zero counter adds it. For
/// unsigned counters both branches produce `current + delta`.
fn merge_counter(current: u64, delta: u64) -> u64 {
    if current == 0 {
        delta
    } else {
        current.saturating_add(delta)
    }
}

/// Lookup of service display names by service id.
pub trait ServiceCatalog {
    fn display_name(&self, service_id: u32) -> Option<String>;
}

impl ServiceCatalog for HashMap<u32, String> {
    fn display_name(&self, service_id: u32) -> Option<String> {
        self.get(&service_id).cloned()
    }
}

/// Catalog with no entries; every service resolves to its placeholder name.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyCatalog;

impl ServiceCatalog for EmptyCatalog {
    fn display_name(&self, _service_id: u32) -> Option<String> {
        None
    }
}

pub fn unknown_service_name(service_id: u32) -> String {
    format!("Unknown service {}", service_id)
}

pub fn format_bytes(size_in_bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    if size_in_bytes >= GB {
        return format!("{:.2} GB", size_in_bytes as f64 / GB as f64);
    }
    if size_in_bytes >= MB {
        return format!("{:.2} MB", size_in_bytes as f64 / MB as f64);
    }
    if size_in_bytes >= KB {
        return format!("{:.2} KB", size_in_bytes as f64 / KB as f64);
    }
    format!("{} bytes", size_in_bytes)
}
