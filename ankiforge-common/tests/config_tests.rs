//! Integration tests for configuration loading and resolution
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate ANKIFORGE_* or ANTHROPIC_API_KEY are marked with
//! #[serial] so they never run in parallel.

use ankiforge_common::config::{
    resolve_anthropic_api_key, resolve_config_path, CompiledDefaults, DataLayout,
    RootFolderResolver, TomlConfig, API_KEY_ENV, CONFIG_PATH_ENV, ROOT_FOLDER_ENV,
};
use ankiforge_common::Error;
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_missing_config_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let config = TomlConfig::load(&dir.path().join("absent.toml")).unwrap();

    assert!(config.root_folder.is_none());
    assert!(config.anthropic_api_key.is_none());
    assert_eq!(config.anki.deck_name, "English Vocabulary");
}

#[test]
fn test_load_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
root_folder = "/tmp/ankiforge-root"

[logging]
level = "debug"

[anki]
url = "http://127.0.0.1:9999"
default_tags = ["gre"]
"#,
    )
    .unwrap();

    let config = TomlConfig::load(&path).unwrap();
    assert_eq!(config.root_folder, Some(PathBuf::from("/tmp/ankiforge-root")));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.anki.url, "http://127.0.0.1:9999");
    assert_eq!(config.anki.default_tags, vec!["gre".to_string()]);
}

#[test]
fn test_malformed_config_file_is_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[anki\nurl = ").unwrap();

    let result = TomlConfig::load(&path);
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_root_folder_cli_has_priority() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/from-env");

    let resolver = RootFolderResolver::new(
        Some(PathBuf::from("/tmp/from-cli")),
        Some(PathBuf::from("/tmp/from-toml")),
    );
    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/from-cli"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_root_folder_env_beats_toml() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/from-env");

    let resolver = RootFolderResolver::new(None, Some(PathBuf::from("/tmp/from-toml")));
    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/from-env"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_root_folder_toml_then_default() {
    env::remove_var(ROOT_FOLDER_ENV);

    let resolver = RootFolderResolver::new(None, Some(PathBuf::from("/tmp/from-toml")));
    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/from-toml"));

    let resolver = RootFolderResolver::new(None, None);
    assert_eq!(
        resolver.resolve(),
        CompiledDefaults::for_current_platform().root_folder
    );
}

#[test]
#[serial]
fn test_config_path_resolution() {
    env::remove_var(CONFIG_PATH_ENV);
    assert_eq!(
        resolve_config_path(None),
        CompiledDefaults::for_current_platform().config_file
    );

    env::set_var(CONFIG_PATH_ENV, "/tmp/env-config.toml");
    assert_eq!(resolve_config_path(None), PathBuf::from("/tmp/env-config.toml"));
    assert_eq!(
        resolve_config_path(Some(&PathBuf::from("/tmp/cli.toml"))),
        PathBuf::from("/tmp/cli.toml")
    );

    env::remove_var(CONFIG_PATH_ENV);
}

#[test]
#[serial]
fn test_api_key_env_overrides_toml() {
    env::set_var(API_KEY_ENV, "env-key");
    let config = TomlConfig {
        anthropic_api_key: Some("toml-key".to_string()),
        ..Default::default()
    };

    assert_eq!(resolve_anthropic_api_key(&config).unwrap(), "env-key");

    env::remove_var(API_KEY_ENV);
}

#[test]
#[serial]
fn test_api_key_blank_env_falls_back_to_toml() {
    env::set_var(API_KEY_ENV, "   ");
    let config = TomlConfig {
        anthropic_api_key: Some("toml-key".to_string()),
        ..Default::default()
    };

    assert_eq!(resolve_anthropic_api_key(&config).unwrap(), "toml-key");

    env::remove_var(API_KEY_ENV);
}

#[test]
#[serial]
fn test_api_key_missing_is_config_error() {
    env::remove_var(API_KEY_ENV);
    let config = TomlConfig {
        anthropic_api_key: Some(String::new()),
        ..Default::default()
    };

    let err = resolve_anthropic_api_key(&config).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert!(err.to_string().contains(API_KEY_ENV));
}

#[test]
fn test_ensure_directories_creates_layout() {
    let dir = TempDir::new().unwrap();
    let layout = DataLayout::new(dir.path().join("root"));

    layout.ensure_directories().unwrap();
    assert!(layout.config_dir().is_dir());
    assert!(layout.data_dir().is_dir());
    assert!(layout.images_dir().is_dir());

    // Idempotent
    layout.ensure_directories().unwrap();
}
