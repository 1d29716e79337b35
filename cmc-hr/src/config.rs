//! Service configuration
//!
//! Command-line flags (clap) layered over the TOML file and compiled
//! defaults resolved by `cmc_common::config`.

use clap::Parser;
use cmc_common::config::{
    CompiledDefaults, ConfigSource, RootFolderInitializer, RootFolderResolver, TomlConfig,
};
use std::path::PathBuf;

/// Module name used for the TOML file (`<config_dir>/cmc-hr/cmc-hr.toml`)
pub const MODULE_NAME: &str = "cmc-hr";

/// Command-line arguments
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "cmc-hr", version, about = "Cathay Metal Corporation HR administration service")]
pub struct Args {
    /// Root folder holding cmc.db (overrides CMC_ROOT_FOLDER / CMC_ROOT)
    #[arg(long)]
    pub root_folder: Option<PathBuf>,

    /// Explicit TOML config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Listen address
    #[arg(long)]
    pub host: Option<String>,

    /// Listen port
    #[arg(long, env = "CMC_HR_PORT")]
    pub port: Option<u16>,

    /// Log filter (e.g. `info`, `cmc_hr=debug`)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// Fully resolved configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub root_folder: PathBuf,
    pub database_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub session_ttl_minutes: i64,
    pub bootstrap_admin_password: Option<String>,
    /// Where the TOML layer came from; logged once tracing is initialized
    pub config_source: ConfigSource,
}

impl ServiceConfig {
    /// Resolve CLI > environment > TOML > compiled defaults
    pub fn resolve(args: &Args) -> Self {
        let resolver = RootFolderResolver::new(MODULE_NAME)
            .with_cli_override(args.root_folder.clone())
            .with_config_file(args.config.clone());
        let (toml_config, config_source) = resolver.load_toml_with_source();

        Self::from_parts(args, &resolver, &toml_config, config_source)
    }

    fn from_parts(
        args: &Args,
        resolver: &RootFolderResolver,
        toml_config: &TomlConfig,
        config_source: ConfigSource,
    ) -> Self {
        let defaults = CompiledDefaults::for_current_platform();
        let root_folder = resolver.resolve_with(toml_config);
        let database_path = RootFolderInitializer::new(root_folder.clone()).database_path();

        let session_ttl_minutes = toml_config
            .session_ttl_minutes
            .filter(|minutes| *minutes > 0)
            .unwrap_or(defaults.session_ttl_minutes);

        Self {
            root_folder,
            database_path,
            host: args
                .host
                .clone()
                .or_else(|| toml_config.server.host.clone())
                .unwrap_or(defaults.host),
            port: args.port.or(toml_config.server.port).unwrap_or(defaults.port),
            log_level: args
                .log_level
                .clone()
                .unwrap_or_else(|| toml_config.logging.level.clone()),
            log_file: toml_config.logging.file.clone().or(defaults.log_file),
            session_ttl_minutes,
            bootstrap_admin_password: toml_config.bootstrap_admin_password.clone(),
            config_source,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
