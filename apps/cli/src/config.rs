use std::fs;
use std::path::{Path, PathBuf};

use flow_app::report::DEFAULT_CHART_WIDTH;
use ingest::{SlotPolicy, TELEMETRY_MARKER};
use serde::{Deserialize, Serialize};

const CONFIG_DIR_NAME: &str = "flow-tracker";
const CONFIG_FILE_NAME: &str = "config.toml";
pub const TOKEN_ENV: &str = "FLOW_TRACKER_REGISTRATION_TOKEN";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub marker: String,
    pub slot_policy: SlotPolicy,
    pub chart_width: usize,
    pub catalog: CatalogConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            marker: TELEMETRY_MARKER.to_string(),
            slot_policy: SlotPolicy::Primary,
            chart_width: DEFAULT_CHART_WIDTH,
            catalog: CatalogConfig::default(),
        }
    }
}

/// Registration server used when no local classification file is given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub registration_domain: String,
    pub registration_token: String,
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: CliConfig,
    pub file: PathBuf,
    pub created: bool,
}

/// Reads `path` when given, otherwise the default config file, creating it
/// with defaults on first use.
pub fn load(path: Option<&Path>) -> Result<ConfigLoad, String> {
    match path {
        Some(path) => Ok(ConfigLoad {
            config: read_config(path)?,
            file: path.to_path_buf(),
            created: false,
        }),
        None => load_or_create_in(&config_dir()?),
    }
}

pub fn load_or_create_in(dir: &Path) -> Result<ConfigLoad, String> {
    fs::create_dir_all(dir)
        .map_err(|err| format!("create config dir {}: {}", dir.display(), err))?;
    let file = dir.join(CONFIG_FILE_NAME);

    if file.exists() {
        let config = read_config(&file)?;
        return Ok(ConfigLoad {
            config,
            file,
            created: false,
        });
    }

    let config = CliConfig::default();
    let contents =
        toml::to_string_pretty(&config).map_err(|err| format!("serialize config: {}", err))?;
    fs::write(&file, contents)
        .map_err(|err| format!("write config {}: {}", file.display(), err))?;

    Ok(ConfigLoad {
        config,
        file,
        created: true,
    })
}

fn read_config(path: &Path) -> Result<CliConfig, String> {
    let contents = fs::read_to_string(path)
        .map_err(|err| format!("read config {}: {}", path.display(), err))?;
    toml::from_str(&contents).map_err(|err| format!("parse config {}: {}", path.display(), err))
}

fn config_dir() -> Result<PathBuf, String> {
    if let Ok(dir) = std::env::var("XDG_CONFIG_HOME")
        && !dir.is_empty()
    {
        return Ok(PathBuf::from(dir).join(CONFIG_DIR_NAME));
    }
    let home = std::env::var("HOME").map_err(|err| format!("resolve HOME: {}", err))?;
    Ok(PathBuf::from(home).join(".config").join(CONFIG_DIR_NAME))
}
