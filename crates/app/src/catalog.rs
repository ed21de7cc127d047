use std::collections::HashMap;
use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use flow_core::ServiceCatalog;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    pub id: u32,
    pub display_name: String,
}

/// The `classification_defs` document. Only the service list is read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationDefs {
    #[serde(default)]
    pub services: Vec<ServiceDefinition>,
}

/// Where the classification catalog comes from for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    Local(PathBuf),
    Remote {
        registration_domain: String,
        registration_token: String,
    },
}

pub fn classification_url(registration_domain: &str) -> String {
    format!("https://{registration_domain}/download/json_files/classification_defs/0")
}

/// Service names from one catalog load, keyed by service id.
#[derive(Debug, Clone, Default)]
pub struct ClassificationCatalog {
    services: HashMap<u32, String>,
}

impl ClassificationCatalog {
    /// Builds the lookup table. When an id is listed twice the first entry wins.
    pub fn from_defs(defs: ClassificationDefs) -> Self {
        let mut services = HashMap::with_capacity(defs.services.len());
        for service in defs.services {
            services.entry(service.id).or_insert(service.display_name);
        }
        Self { services }
    }

    pub fn load(source: &CatalogSource) -> Result<Self> {
        match source {
            CatalogSource::Local(path) => Self::load_local(path),
            CatalogSource::Remote {
                registration_domain,
                registration_token,
            } => Self::fetch_remote(registration_domain, registration_token),
        }
    }

    pub fn load_local(path: &Path) -> Result<Self> {
        let file = fs::File::open(path)?;
        let defs: ClassificationDefs = serde_json::from_reader(BufReader::new(file))?;
        info!(
            path = %path.display(),
            services = defs.services.len(),
            "classification catalog loaded"
        );
        Ok(Self::from_defs(defs))
    }

    pub fn fetch_remote(registration_domain: &str, registration_token: &str) -> Result<Self> {
        if registration_domain.is_empty() || registration_token.is_empty() {
            return Err(AppError::InvalidInput(
                "remote classification catalog needs a registration domain and token".to_string(),
            ));
        }
        let url = classification_url(registration_domain);
        let response = ureq::get(&url)
            .set("Authorization", &format!("Token {}", registration_token))
            .set("Cookie", "Path=/")
            .call()
            .map_err(|err| AppError::CatalogRequest(err.to_string()))?;
        let body = response.into_string()?;
        let defs: ClassificationDefs = serde_json::from_str(&body)?;
        info!(url = %url, services = defs.services.len(), "classification catalog fetched");
        Ok(Self::from_defs(defs))
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl ServiceCatalog for ClassificationCatalog {
    fn display_name(&self, service_id: u32) -> Option<String> {
        self.services.get(&service_id).cloned()
    }
}
