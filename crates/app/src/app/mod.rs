use std::io::Write;
use std::path::PathBuf;

use ingest::{Aggregation, IngestOptions, IngestStats};
use tracing::info;

use crate::catalog::{CatalogSource, ClassificationCatalog};
use crate::error::Result;
use crate::report::{self, ReportOptions};

/// Everything one run needs, resolved from arguments and the config file.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub log_file_path: PathBuf,
    pub catalog: CatalogSource,
    pub ingest: IngestOptions,
    pub report: ReportOptions,
}

/// A single aggregation run over one flow log.
#[derive(Clone, Debug)]
pub struct AppState {
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn load_catalog(&self) -> Result<ClassificationCatalog> {
        ClassificationCatalog::load(&self.config.catalog)
    }

    pub fn aggregate(&self) -> Result<Aggregation<ClassificationCatalog>> {
        let catalog = self.load_catalog()?;
        Ok(ingest::aggregate_file(
            &self.config.log_file_path,
            &self.config.ingest,
            catalog,
        )?)
    }

    pub fn run<W: Write>(&self, writer: &mut W) -> Result<IngestStats> {
        let aggregation = self.aggregate()?;
        report::write_report(writer, &aggregation.store, &self.config.report)?;
        info!(
            devices = aggregation.store.devices().len(),
            buckets = aggregation.stats.buckets_applied,
            first_ref_ts = aggregation.stats.first_ref_ts.as_deref().unwrap_or("-"),
            last_ref_ts = aggregation.stats.last_ref_ts.as_deref().unwrap_or("-"),
            "report written"
        );
        Ok(aggregation.stats)
    }
}
