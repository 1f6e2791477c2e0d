//! Configuration loading against the real process environment

use serial_test::serial;
use std::env;
use std::fs;
use tempfile::TempDir;

use canvass::cli::client::{server_url, DEFAULT_SERVER, SERVER_ENV_VAR};
use canvass::config::{
  CanvassConfig, CONFIG_ENV_VAR, DATA_DIR_ENV_VAR, GEMINI_KEY_ENV_VAR, PINECONE_KEY_ENV_VAR,
};

const VARS: [&str; 5] =
  [CONFIG_ENV_VAR, DATA_DIR_ENV_VAR, GEMINI_KEY_ENV_VAR, PINECONE_KEY_ENV_VAR, SERVER_ENV_VAR];

fn clear_env() {
  for var in VARS {
    env::remove_var(var);
  }
}

fn write_config(dir: &TempDir, yaml: &str) -> std::path::PathBuf {
  let path = dir.path().join("config.yaml");
  fs::write(&path, yaml).unwrap();
  path
}

#[test]
#[serial]
fn test_load_merges_file_and_environment() {
  clear_env();
  let dir = TempDir::new().unwrap();
  let path = write_config(&dir, "index:\n  name: spring\nserver:\n  bind: 0.0.0.0:8080\n");
  env::set_var(GEMINI_KEY_ENV_VAR, "gemini-key");
  env::set_var(DATA_DIR_ENV_VAR, dir.path());

  let config = CanvassConfig::load(Some(&path)).unwrap();
  clear_env();

  assert_eq!(config.index.name, "spring");
  assert_eq!(config.server.bind.port(), 8080);
  assert_eq!(config.embedding.api_key.as_deref(), Some("gemini-key"));
  assert_eq!(config.index.api_key, None);
  assert_eq!(config.feedback_dir(), dir.path().join("feedback"));
}

#[test]
#[serial]
fn test_config_path_from_environment() {
  clear_env();
  let dir = TempDir::new().unwrap();
  let path = write_config(&dir, "retrieval:\n  top_k: 2\n");
  env::set_var(CONFIG_ENV_VAR, &path);

  let config = CanvassConfig::load(None).unwrap();
  clear_env();

  assert_eq!(config.retrieval.top_k, 2);
}

#[test]
#[serial]
fn test_invalid_file_is_reported() {
  clear_env();
  let dir = TempDir::new().unwrap();
  let path = write_config(&dir, "retrieval:\n  top_k: 0\n");

  let error = CanvassConfig::load(Some(&path)).unwrap_err();
  assert!(error.to_string().contains("top_k"));

  let missing = dir.path().join("missing.yaml");
  assert!(CanvassConfig::load(Some(&missing)).is_err());
}

#[test]
#[serial]
fn test_server_url_resolution_order() {
  clear_env();
  assert_eq!(server_url(None), DEFAULT_SERVER);

  env::set_var(SERVER_ENV_VAR, "http://feedback.internal:9000");
  assert_eq!(server_url(None), "http://feedback.internal:9000");
  assert_eq!(server_url(Some("http://localhost:4000")), "http://localhost:4000");
  clear_env();
}
