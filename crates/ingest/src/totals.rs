use std::collections::{BTreeMap, HashMap};

use flow_core::{
    AccumulatorKind, BucketPayload, BucketSlot, DisplayName, ServiceCatalog, UsageAccumulator,
    UsageDelta, bitmask_to_categories, unknown_service_name,
};
use serde::{Serialize, Serializer};
use tracing::{debug, warn};

use crate::types::{IngestError, PRIMARY_SLOT, Result, SlotPolicy};

/// Display names resolved during one run, keyed by index.
///
/// Each index is resolved at most once per kind; the catalog is only consulted
/// on the first miss.
pub struct NameCache<C> {
    catalog: C,
    services: HashMap<u32, String>,
    categories: HashMap<u32, Vec<String>>,
}

impl<C: ServiceCatalog> NameCache<C> {
    pub fn new(catalog: C) -> Self {
        Self {
            catalog,
            services: HashMap::new(),
            categories: HashMap::new(),
        }
    }

    pub fn resolve(&mut self, kind: AccumulatorKind, index: u32) -> Result<DisplayName> {
        match kind {
            AccumulatorKind::Service => {
                let catalog = &self.catalog;
                let name = self.services.entry(index).or_insert_with(|| {
                    catalog.display_name(index).unwrap_or_else(|| {
                        warn!(service_id = index, "service missing from classification catalog");
                        unknown_service_name(index)
                    })
                });
                Ok(DisplayName::Service(name.clone()))
            }
            AccumulatorKind::Category => {
                if let Some(names) = self.categories.get(&index) {
                    return Ok(DisplayName::Categories(names.clone()));
                }
                let names: Vec<String> = bitmask_to_categories(index)?
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                self.categories.insert(index, names.clone());
                Ok(DisplayName::Categories(names))
            }
        }
    }
}

/// Accumulated usage of one device, split by service and by category bitmask.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceUsage {
    pub ip: String,
    services: Vec<UsageAccumulator>,
    categories: Vec<UsageAccumulator>,
}

impl DeviceUsage {
    pub fn new(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            services: Vec::new(),
            categories: Vec::new(),
        }
    }

    pub fn services(&self) -> &[UsageAccumulator] {
        &self.services
    }

    pub fn categories(&self) -> &[UsageAccumulator] {
        &self.categories
    }

    pub fn accumulators(&self, kind: AccumulatorKind) -> &[UsageAccumulator] {
        match kind {
            AccumulatorKind::Service => &self.services,
            AccumulatorKind::Category => &self.categories,
        }
    }

    pub fn get_service(&self, index: u32) -> Option<&UsageAccumulator> {
        self.services.iter().find(|acc| acc.index() == index)
    }

    pub fn get_category(&self, index: u32) -> Option<&UsageAccumulator> {
        self.categories.iter().find(|acc| acc.index() == index)
    }

    fn accumulator_mut<C: ServiceCatalog>(
        &mut self,
        kind: AccumulatorKind,
        index: u32,
        names: &mut NameCache<C>,
    ) -> Result<&mut UsageAccumulator> {
        let collection = match kind {
            AccumulatorKind::Service => &mut self.services,
            AccumulatorKind::Category => &mut self.categories,
        };
        let position = match collection.iter().position(|acc| acc.index() == index) {
            Some(position) => position,
            None => {
                let display_name = names.resolve(kind, index)?;
                collection.push(UsageAccumulator::new(kind, index, display_name));
                collection.len() - 1
            }
        };
        Ok(&mut collection[position])
    }

    fn process<C: ServiceCatalog>(
        &mut self,
        kind: AccumulatorKind,
        deltas: &BTreeMap<String, UsageDelta>,
        names: &mut NameCache<C>,
    ) -> Result<()> {
        for (raw_index, usage) in deltas {
            let index = raw_index
                .parse::<u32>()
                .map_err(|_| IngestError::InvalidIndex {
                    ip: self.ip.clone(),
                    kind: index_kind(kind),
                    raw: raw_index.clone(),
                })?;
            self.accumulator_mut(kind, index, names)?
                .accumulate(usage.tx, usage.rx);
        }
        Ok(())
    }
}

fn index_kind(kind: AccumulatorKind) -> &'static str {
    match kind {
        AccumulatorKind::Service => "service",
        AccumulatorKind::Category => "category",
    }
}

/// Slots consumed and skipped while applying one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub slots_applied: usize,
    pub slots_ignored: usize,
}

/// Per-device usage totals for one run, in order of first appearance.
pub struct UsageStore<C> {
    devices: Vec<DeviceUsage>,
    by_ip: HashMap<String, usize>,
    names: NameCache<C>,
    slot_policy: SlotPolicy,
}

impl<C> UsageStore<C> {
    pub fn slot_policy(&self) -> SlotPolicy {
        self.slot_policy
    }

    pub fn devices(&self) -> &[DeviceUsage] {
        &self.devices
    }

    pub fn get_device(&self, ip: &str) -> Option<&DeviceUsage> {
        self.by_ip.get(ip).map(|position| &self.devices[*position])
    }
}

impl<C: ServiceCatalog> UsageStore<C> {
    pub fn new(catalog: C) -> Self {
        Self::with_slot_policy(catalog, SlotPolicy::default())
    }

    pub fn with_slot_policy(catalog: C, slot_policy: SlotPolicy) -> Self {
        Self {
            devices: Vec::new(),
            by_ip: HashMap::new(),
            names: NameCache::new(catalog),
            slot_policy,
        }
    }

    fn device_position(&mut self, ip: &str) -> usize {
        if let Some(position) = self.by_ip.get(ip) {
            return *position;
        }
        let position = self.devices.len();
        self.devices.push(DeviceUsage::new(ip));
        self.by_ip.insert(ip.to_string(), position);
        position
    }

    /// Folds one bucket into the store according to the slot policy.
    pub fn apply(&mut self, bucket: &BucketPayload) -> Result<ApplyOutcome> {
        let mut outcome = ApplyOutcome::default();
        let Some(slots) = bucket.buckets.as_ref() else {
            return Ok(outcome);
        };
        match self.slot_policy {
            SlotPolicy::Primary => {
                if let Some(slot) = slots.get(PRIMARY_SLOT) {
                    self.apply_slot(slot)?;
                    outcome.slots_applied = 1;
                }
                outcome.slots_ignored = slots.keys().filter(|key| *key != PRIMARY_SLOT).count();
                if outcome.slots_ignored > 0 {
                    warn!(
                        ref_ts = ?bucket.ref_ts,
                        ignored = outcome.slots_ignored,
                        "bucket carries slots beyond \"0\"; ignoring them"
                    );
                }
            }
            SlotPolicy::All => {
                let mut ordered = slots
                    .iter()
                    .map(|(key, slot)| {
                        key.parse::<u32>()
                            .map(|number| (number, slot))
                            .map_err(|_| IngestError::InvalidSlot(key.clone()))
                    })
                    .collect::<Result<Vec<_>>>()?;
                ordered.sort_by_key(|(number, _)| *number);
                for (_, slot) in ordered {
                    self.apply_slot(slot)?;
                    outcome.slots_applied += 1;
                }
            }
        }
        Ok(outcome)
    }

    fn apply_slot(&mut self, slot: &BucketSlot) -> Result<()> {
        let Some(devices) = slot.devices.as_ref() else {
            return Ok(());
        };
        for (ip, delta) in devices {
            debug!(
                ip = %ip,
                services = delta.services.as_ref().map_or(0, BTreeMap::len),
                categories = delta.categories.as_ref().map_or(0, BTreeMap::len),
                "applying device delta"
            );
            let position = self.device_position(ip);
            let device = &mut self.devices[position];
            if let Some(services) = delta.services.as_ref() {
                device.process(AccumulatorKind::Service, services, &mut self.names)?;
            }
            if let Some(categories) = delta.categories.as_ref() {
                device.process(AccumulatorKind::Category, categories, &mut self.names)?;
            }
        }
        Ok(())
    }
}

impl<C> Serialize for UsageStore<C> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.devices.iter().map(|device| (&device.ip, device)))
    }
}
