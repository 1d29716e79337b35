//! Configuration loading and root folder resolution
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`CMC_ROOT_FOLDER`, then `CMC_ROOT`)
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable TOML file never aborts startup; the resolver
//! logs and falls back to compiled defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Primary root folder environment variable
pub const ROOT_FOLDER_ENV: &str = "CMC_ROOT_FOLDER";

/// Alternative root folder environment variable
pub const ROOT_ENV: &str = "CMC_ROOT";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "cmc.db";

/// Directory name used under the platform config/data directories
const APP_DIR: &str = "cmc-hr";

/// Compiled-in defaults for the current platform
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub host: String,
    pub port: u16,
    pub session_ttl_minutes: i64,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: get_default_root_folder(),
            log_level: "info".to_string(),
            log_file: None,
            host: "127.0.0.1".to_string(),
            port: 5780,
            session_ttl_minutes: 480,
        }
    }
}

/// `[logging]` section of the TOML file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// `[server]` section of the TOML file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

/// Bootstrap TOML configuration
///
/// Every field is optional so that partial files (or none at all) work.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_folder: Option<PathBuf>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_ttl_minutes: Option<i64>,
    /// Password for the bootstrap `admin` account (generated when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bootstrap_admin_password: Option<String>,
}

impl TomlConfig {
    /// Read and parse a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }
}

/// Where the TOML configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Parsed from this file
    Loaded(PathBuf),
    /// No file at this path; defaults used
    Missing(PathBuf),
    /// Platform has no config directory; defaults used
    NoConfigDir,
    /// File exists but could not be read or parsed; defaults used
    Invalid { path: PathBuf, reason: String },
}

impl ConfigSource {
    /// True when compiled defaults replaced a file that exists
    pub fn is_fallback(&self) -> bool {
        matches!(self, ConfigSource::Invalid { .. })
    }

    pub fn log(&self) {
        match self {
            ConfigSource::Loaded(path) => info!("Loaded configuration from {}", path.display()),
            ConfigSource::Missing(path) => {
                info!("No config file at {}, using defaults", path.display())
            }
            ConfigSource::NoConfigDir => {
                warn!("Could not determine config directory, using defaults")
            }
            ConfigSource::Invalid { path, reason } => {
                warn!("Ignoring config file {}: {}", path.display(), reason)
            }
        }
    }
}

/// Resolves the root folder and TOML configuration for one module
#[derive(Debug, Clone)]
pub struct RootFolderResolver {
    module_name: String,
    cli_override: Option<PathBuf>,
    config_file_override: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_override: None,
            config_file_override: None,
        }
    }

    /// Root folder given on the command line
    pub fn with_cli_override(mut self, root_folder: Option<PathBuf>) -> Self {
        self.cli_override = root_folder;
        self
    }

    /// Use an explicit config file instead of the platform location
    pub fn with_config_file(mut self, path: Option<PathBuf>) -> Self {
        self.config_file_override = path;
        self
    }

    /// Config file location: explicit override, else
    /// `<config_dir>/cmc-hr/<module>.toml`
    pub fn config_file_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config_file_override {
            return Some(path.clone());
        }
        dirs::config_dir().map(|d| d.join(APP_DIR).join(format!("{}.toml", self.module_name)))
    }

    /// Load the TOML config, falling back to defaults on any problem
    pub fn load_toml(&self) -> TomlConfig {
        let (config, source) = self.load_toml_with_source();
        source.log();
        config
    }

    /// Load the TOML config without logging
    ///
    /// For callers that resolve configuration before tracing is up; log the
    /// returned [`ConfigSource`] once a subscriber exists.
    pub fn load_toml_with_source(&self) -> (TomlConfig, ConfigSource) {
        let Some(path) = self.config_file_path() else {
            return (TomlConfig::default(), ConfigSource::NoConfigDir);
        };

        if !path.exists() {
            return (TomlConfig::default(), ConfigSource::Missing(path));
        }

        match TomlConfig::load(&path) {
            Ok(config) => (config, ConfigSource::Loaded(path)),
            Err(e) => (
                TomlConfig::default(),
                ConfigSource::Invalid {
                    path,
                    reason: e.to_string(),
                },
            ),
        }
    }

    /// Resolve the root folder using the priority order above
    pub fn resolve(&self) -> PathBuf {
        self.resolve_with(&self.load_toml())
    }

    /// Resolve against an already-loaded TOML config
    pub fn resolve_with(&self, toml_config: &TomlConfig) -> PathBuf {
        if let Some(path) = &self.cli_override {
            return path.clone();
        }

        for var in [ROOT_FOLDER_ENV, ROOT_ENV] {
            if let Ok(path) = std::env::var(var) {
                if !path.trim().is_empty() {
                    return PathBuf::from(path);
                }
            }
        }

        if let Some(path) = &toml_config.root_folder {
            return path.clone();
        }

        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Prepares the resolved root folder for use
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    /// Create the root folder (and parents) if missing; idempotent
    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }

    pub fn database_exists(&self) -> bool {
        self.database_path().exists()
    }
}

/// Get OS-dependent default root folder path
pub fn get_default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/cmc-hr (or /var/lib/cmc-hr for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from("/var/lib/cmc-hr"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/cmc-hr"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\cmc-hr"))
    } else {
        PathBuf::from("./cmc_data")
    }
}
