//! Unit tests for configuration and graceful degradation
//!
//! Tests cover:
//! - Missing TOML files SHALL NOT cause termination
//! - Priority order for root folder resolution (CLI > env > TOML > default)
//! - Automatic root folder creation
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate CMC_ROOT_FOLDER or CMC_ROOT are marked with #[serial].

use cmc_common::config::{
    CompiledDefaults, ConfigSource, LoggingConfig, RootFolderInitializer, RootFolderResolver,
    ServerConfig, TomlConfig, DATABASE_FILE,
};
use serial_test::serial;
use std::env;
use std::path::PathBuf;

fn clear_env() {
    env::remove_var("CMC_ROOT_FOLDER");
    env::remove_var("CMC_ROOT");
}

#[test]
fn test_compiled_defaults_for_current_platform() {
    let defaults = CompiledDefaults::for_current_platform();

    assert!(!defaults.root_folder.as_os_str().is_empty());
    assert_eq!(defaults.log_level, "info");
    assert!(defaults.log_file.is_none());
    assert_eq!(defaults.host, "127.0.0.1");
    assert_eq!(defaults.port, 5780);
    assert_eq!(defaults.session_ttl_minutes, 480);

    #[cfg(target_os = "linux")]
    {
        let path_str = defaults.root_folder.to_string_lossy();
        assert!(path_str.ends_with("cmc-hr"), "Linux default should end in cmc-hr: {}", path_str);
    }
}

#[test]
#[serial]
fn test_resolver_with_no_overrides_uses_default() {
    clear_env();

    let resolver = RootFolderResolver::new("test-module");
    let root_folder = resolver.resolve_with(&TomlConfig::default());

    let defaults = CompiledDefaults::for_current_platform();
    assert_eq!(root_folder, defaults.root_folder);
}

#[test]
#[serial]
fn test_resolver_env_var_root_folder() {
    clear_env();
    env::set_var("CMC_ROOT_FOLDER", "/tmp/cmc-test-env-folder");

    let resolver = RootFolderResolver::new("test-module");
    let root_folder = resolver.resolve_with(&TomlConfig::default());

    assert_eq!(root_folder, PathBuf::from("/tmp/cmc-test-env-folder"));

    clear_env();
}

#[test]
#[serial]
fn test_resolver_env_var_root() {
    clear_env();
    env::set_var("CMC_ROOT", "/tmp/cmc-test-env-root");

    let resolver = RootFolderResolver::new("test-module");
    let root_folder = resolver.resolve_with(&TomlConfig::default());

    assert_eq!(root_folder, PathBuf::from("/tmp/cmc-test-env-root"));

    clear_env();
}

#[test]
#[serial]
fn test_resolver_root_folder_var_takes_precedence() {
    clear_env();
    env::set_var("CMC_ROOT_FOLDER", "/tmp/cmc-priority-1");
    env::set_var("CMC_ROOT", "/tmp/cmc-priority-2");

    let resolver = RootFolderResolver::new("test-module");
    let root_folder = resolver.resolve_with(&TomlConfig::default());

    assert_eq!(root_folder, PathBuf::from("/tmp/cmc-priority-1"));

    clear_env();
}

#[test]
#[serial]
fn test_cli_override_beats_environment() {
    clear_env();
    env::set_var("CMC_ROOT_FOLDER", "/tmp/cmc-from-env");

    let resolver = RootFolderResolver::new("test-module")
        .with_cli_override(Some(PathBuf::from("/tmp/cmc-from-cli")));
    let root_folder = resolver.resolve_with(&TomlConfig::default());

    assert_eq!(root_folder, PathBuf::from("/tmp/cmc-from-cli"));

    clear_env();
}

#[test]
#[serial]
fn test_toml_root_folder_used_without_env() {
    clear_env();

    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/srv/cmc")),
        ..TomlConfig::default()
    };
    let resolver = RootFolderResolver::new("test-module");

    assert_eq!(resolver.resolve_with(&config), PathBuf::from("/srv/cmc"));
}

#[test]
#[serial]
fn test_resolver_missing_config_file_does_not_error() {
    clear_env();

    let resolver = RootFolderResolver::new("nonexistent-test-module-12345")
        .with_config_file(Some(PathBuf::from("/tmp/cmc-definitely-missing/config.toml")));

    assert_eq!(resolver.load_toml(), TomlConfig::default());

    let root_folder = resolver.resolve();
    assert_eq!(root_folder, CompiledDefaults::for_current_platform().root_folder);
}

#[test]
fn test_malformed_config_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cmc-hr.toml");
    std::fs::write(&path, "root_folder = [not toml").unwrap();

    let resolver = RootFolderResolver::new("cmc-hr").with_config_file(Some(path.clone()));
    assert_eq!(resolver.load_toml(), TomlConfig::default());

    let (config, source) = resolver.load_toml_with_source();
    assert_eq!(config, TomlConfig::default());
    assert!(source.is_fallback());
    match source {
        ConfigSource::Invalid { path: reported, reason } => {
            assert_eq!(reported, path);
            assert!(!reason.is_empty());
        }
        other => panic!("expected Invalid, got {:?}", other),
    }
}

#[test]
fn test_missing_config_file_source() {
    let path = PathBuf::from("/tmp/cmc-definitely-missing/config.toml");
    let resolver = RootFolderResolver::new("cmc-hr").with_config_file(Some(path.clone()));

    let (_, source) = resolver.load_toml_with_source();
    assert_eq!(source, ConfigSource::Missing(path));
    assert!(!source.is_fallback());
}

#[test]
fn test_config_file_loaded_from_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cmc-hr.toml");
    std::fs::write(
        &path,
        r#"
            root_folder = "/srv/cmc"
            session_ttl_minutes = 60

            [logging]
            level = "debug"

            [server]
            port = 8080
        "#,
    )
    .unwrap();

    let resolver = RootFolderResolver::new("cmc-hr").with_config_file(Some(path));
    let config = resolver.load_toml();

    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/cmc")));
    assert_eq!(config.session_ttl_minutes, Some(60));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.server.port, Some(8080));
    assert_eq!(config.server.host, None);
}

#[test]
fn test_config_file_path_uses_module_name() {
    let resolver = RootFolderResolver::new("test-module");
    if let Some(path) = resolver.config_file_path() {
        assert!(path.ends_with("cmc-hr/test-module.toml"), "got {}", path.display());
    }
}

#[test]
fn test_initializer_database_path() {
    let root = PathBuf::from("/tmp/cmc-test-root");
    let initializer = RootFolderInitializer::new(root.clone());

    assert_eq!(initializer.database_path(), root.join(DATABASE_FILE));
    assert_eq!(DATABASE_FILE, "cmc.db");
}

#[test]
fn test_initializer_database_exists() {
    let initializer = RootFolderInitializer::new(PathBuf::from("/tmp/cmc-test-nonexistent"));
    assert!(!initializer.database_exists());
}

#[test]
fn test_initializer_creates_nested_directories_idempotently() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("level1").join("level2");

    let initializer = RootFolderInitializer::new(root.clone());

    assert!(initializer.ensure_directory_exists().is_ok());
    assert!(initializer.ensure_directory_exists().is_ok());
    assert!(root.is_dir(), "Nested directory was not created");
}

#[test]
fn test_toml_roundtrip() {
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/srv/cmc")),
        logging: LoggingConfig::default(),
        server: ServerConfig {
            host: Some("0.0.0.0".to_string()),
            port: Some(9000),
        },
        session_ttl_minutes: Some(120),
        bootstrap_admin_password: Some("change-me-now".to_string()),
    };

    let toml_str = toml::to_string(&config).unwrap();
    let parsed: TomlConfig = toml::from_str(&toml_str).unwrap();

    assert_eq!(parsed, config);
}

#[test]
fn test_missing_sections_use_defaults() {
    let config: TomlConfig = toml::from_str(r#"root_folder = "/srv/cmc""#).unwrap();

    assert_eq!(config.logging.level, "info");
    assert_eq!(config.server, ServerConfig::default());
    assert_eq!(config.bootstrap_admin_password, None);
}
