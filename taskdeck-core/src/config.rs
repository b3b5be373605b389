use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ClientConfig {
    pub api: Option<ApiConfig>,
    pub dashboard: Option<DashboardConfig>,
    pub session: Option<SessionConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DashboardConfig {
    pub page_size: u32,
    /// Cached listings older than this are refetched
    pub stale_after_secs: i64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            stale_after_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SessionConfig {
    pub backend: SessionBackend,
    pub path: Option<PathBuf>,
}

const DEFAULT_CONFIG: &str = r#"
[api]
base_url = "http://localhost:8000"
timeout_secs = 30

[dashboard]
page_size = 10
stale_after_secs = 30

[session]
# "file" keeps the session next to this config, "keyring" uses the OS keychain
backend = "file"
# path = "/custom/location/session.json"
"#;

impl ClientConfig {
    /// Load from `path` (or the default location), writing a default file
    /// first if none exists. `TASKDECK__SECTION__KEY` environment variables
    /// override file values.
    pub fn load(path: Option<&Path>) -> Result<(Self, PathBuf), ConfigError> {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(get_config_path);

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Message(format!("Failed to create config directory: {e}"))
            })?;
        }

        if !config_path.exists() {
            std::fs::write(&config_path, DEFAULT_CONFIG).map_err(|e| {
                ConfigError::Message(format!("Failed to write default config: {e}"))
            })?;
        }

        let config = Self::build(&config_path, Self::environment())?;

        Ok((config, config_path))
    }

    /// `TASKDECK__DASHBOARD__PAGE_SIZE=25` sets `dashboard.page_size`.
    fn environment() -> Environment {
        Environment::with_prefix("TASKDECK")
            .separator("__")
            .try_parsing(true)
    }

    fn build(config_path: &Path, environment: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(config_path.to_path_buf()))
            .add_source(environment)
            .build()?
            .try_deserialize()
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Message(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, contents)
            .map_err(|e| ConfigError::Message(format!("Failed to write config: {e}")))
    }

    pub fn api(&self) -> ApiConfig {
        self.api.clone().unwrap_or_default()
    }

    pub fn dashboard(&self) -> DashboardConfig {
        self.dashboard.clone().unwrap_or_default()
    }

    pub fn session(&self) -> SessionConfig {
        self.session.clone().unwrap_or_default()
    }
}

pub fn config_dir() -> PathBuf {
    match dirs::config_dir() {
        Some(dir) => dir.join("taskdeck"),
        None => PathBuf::from("."),
    }
}

pub fn get_config_path() -> PathBuf {
    config_dir().join("client.toml")
}

pub fn default_session_path() -> PathBuf {
    config_dir().join("session.json")
}
