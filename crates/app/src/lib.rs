pub mod app;
pub mod catalog;
pub mod error;
pub mod report;

pub use app::{AppConfig, AppState};
pub use catalog::{CatalogSource, ClassificationCatalog, ClassificationDefs, ServiceDefinition};
pub use error::{AppError, Result};
pub use report::{OutputFormat, ReportOptions};
