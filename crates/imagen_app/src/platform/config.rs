use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use imagen_core::{AspectRatio, Settings, VariationCount, WorkerCount, DEFAULT_RESULTS_DIR};
use imagen_engine::VertexSettings;
use imagen_logging::{imagen_info, imagen_warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_FILENAME: &str = "imagen_batch.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
}

/// Startup configuration read from `./imagen_batch.ron`. Every field is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub project_id: String,
    pub location: String,
    pub model_id: String,
    pub api_base: Option<String>,
    pub access_token_env: String,
    pub results_dir: PathBuf,
    pub request_timeout_secs: u64,
    pub defaults: DefaultSettings,
    pub load_sample_prompts: bool,
}

/// Initial values for the settings selectors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultSettings {
    pub variations: u8,
    pub aspect_ratio: String,
    pub workers: u8,
}

impl Default for AppConfig {
    fn default() -> Self {
        let vertex = VertexSettings::default();
        Self {
            project_id: vertex.project_id,
            location: vertex.location,
            model_id: vertex.model_id,
            api_base: None,
            access_token_env: vertex.access_token_env,
            results_dir: PathBuf::from(DEFAULT_RESULTS_DIR),
            request_timeout_secs: vertex.request_timeout.as_secs(),
            defaults: DefaultSettings::default(),
            load_sample_prompts: true,
        }
    }
}

impl Default for DefaultSettings {
    fn default() -> Self {
        let settings = Settings::default();
        Self {
            variations: settings.variations.get(),
            aspect_ratio: settings.aspect_ratio.as_str().to_string(),
            workers: settings.workers.get(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Missing file means defaults; a broken file is reported and ignored.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => {
                imagen_info!("Loaded configuration from {:?}", path);
                config
            }
            Err(ConfigError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                Self::default()
            }
            Err(err) => {
                imagen_warn!("Using default configuration: {}", err);
                eprintln!("Warning: {err}; using defaults");
                Self::default()
            }
        }
    }

    pub fn vertex_settings(&self) -> VertexSettings {
        VertexSettings {
            project_id: self.project_id.clone(),
            location: self.location.clone(),
            model_id: self.model_id.clone(),
            api_base: self.api_base.clone(),
            access_token_env: self.access_token_env.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
            ..VertexSettings::default()
        }
    }

    /// New timestamped results folders are created next to the configured one.
    pub fn folders_base(&self) -> PathBuf {
        self.results_dir
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
    }

    /// Settings for the selectors; out-of-range values fall back to their defaults.
    pub fn initial_settings(&self) -> Settings {
        let fallback = Settings::default();
        let defaults = &self.defaults;
        Settings {
            variations: VariationCount::new(defaults.variations).unwrap_or_else(|| {
                imagen_warn!("Ignoring configured variations {}", defaults.variations);
                fallback.variations
            }),
            aspect_ratio: AspectRatio::parse(&defaults.aspect_ratio).unwrap_or_else(|| {
                imagen_warn!("Ignoring configured aspect ratio {:?}", defaults.aspect_ratio);
                fallback.aspect_ratio
            }),
            workers: WorkerCount::new(defaults.workers).unwrap_or_else(|| {
                imagen_warn!("Ignoring configured workers {}", defaults.workers);
                fallback.workers
            }),
        }
    }
}
