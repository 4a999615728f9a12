use std::env;

use ocstatus::config::{Config, OutputFormat, CONFIG_ENV_VAR};
use ocstatus::core::discovery::RedirectMode;
use serial_test::serial;

use crate::common::create_temp_dir;

#[test]
fn test_default_config_is_valid() {
    let config = Config::default();
    assert_eq!(config.redirect_mode, RedirectMode::Transport);
    assert_eq!(config.max_redirect_hops, 10);
    assert_eq!(config.output, OutputFormat::Text);
    assert!(config.user_agent.starts_with("ocstatus/"));
    assert!(config.check().is_ok());
}

#[test]
fn test_missing_file_yields_defaults() {
    let dir = create_temp_dir();
    let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_partial_file_fills_defaults() {
    let dir = create_temp_dir();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "redirect_mode = \"manual\"\nmax_redirect_hops = 3\n").unwrap();

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.redirect_mode, RedirectMode::Manual);
    assert_eq!(config.max_redirect_hops, 3);
    assert_eq!(config.output, OutputFormat::Text);

    let options = config.discovery_options();
    assert_eq!(options.redirect_mode, RedirectMode::Manual);
    assert_eq!(options.max_redirect_hops, 3);
}

#[test]
fn test_invalid_file_is_parse_error() {
    let dir = create_temp_dir();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "redirect_mode = \"sideways\"\n").unwrap();

    assert!(Config::load_from(&path).is_err());
}

#[test]
fn test_check_rejects_bad_values() {
    let mut config = Config::default();
    config.max_redirect_hops = 0;
    assert!(config.check().is_err());

    config.max_redirect_hops = 51;
    assert!(config.check().is_err());

    let config = Config {
        user_agent: "  ".to_string(),
        ..Config::default()
    };
    assert!(config.check().is_err());
}

#[test]
#[serial]
fn test_init_writes_once_via_env_path() {
    let dir = create_temp_dir();
    let path = dir.path().join("nested").join("config.toml");
    env::set_var(CONFIG_ENV_VAR, &path);

    let written = Config::init().unwrap();
    assert_eq!(written, path);
    assert!(path.exists());

    // A second init leaves an edited file alone
    std::fs::write(&path, "output = \"json\"\n").unwrap();
    Config::init().unwrap();
    assert_eq!(Config::load().unwrap().output, OutputFormat::Json);

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
fn test_config_roundtrip_through_file() {
    let dir = create_temp_dir();
    let path = dir.path().join("config.toml");
    let config = Config {
        redirect_mode: RedirectMode::Manual,
        max_redirect_hops: 7,
        user_agent: "custom-agent/1.0".to_string(),
        output: OutputFormat::Json,
    };

    config.save_to(&path).unwrap();
    assert_eq!(Config::load_from(&path).unwrap(), config);
}
