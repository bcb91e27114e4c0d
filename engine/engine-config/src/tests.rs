//! Tests for the configuration module.

use super::*;
use std::io::Write;

#[test]
fn test_default_config() {
    let config = CentralConfig::default();
    assert_eq!(config.common.log_level, "info");
    assert_eq!(config.common.seed, 0);
    assert!(config.model.path().is_none());
    assert_eq!(config.model.intra_threads, 1);
    assert!(!config.model.policy_logits);
}

#[test]
fn test_search_defaults() {
    let config = CentralConfig::default();
    let s = &config.search;
    assert_eq!(s.iterations, 200);
    assert!((s.exploration - 0.3).abs() < f64::EPSILON);
    assert!((s.temperature - 0.1).abs() < f64::EPSILON);
    assert_eq!(s.ramp, 10);
    assert!((s.priority_uniform - 1.0).abs() < f64::EPSILON);
    assert!((s.priority_exponent - 2.0).abs() < f64::EPSILON);
    assert_eq!(s.value_in_log_odds, 0.0);
    assert_eq!(s.parent_prior_odds_mult, 0.0);
    assert_eq!(s.parent_prior_value_diff, 0.0);
    assert!(!s.backprop_win_loss);
    assert!(!s.policy_add_value_and_prior);
    assert!(!s.take_or_avoid_knowns);
    assert_eq!(s.value_quantile, 0.0);
    assert_eq!(s.claim_draw_halfmove, 8);
    assert!((s.claim_draw_prior - 0.1).abs() < f64::EPSILON);
    assert_eq!(s.unvisited_noise, 0.0);
    assert!(!s.draw_choice_correction);
}

#[test]
fn test_parse_config_toml() {
    let toml_content = r#"
[common]
log_level = "debug"
seed = 42

[search]
iterations = 800
exploration = 0.5
backprop_win_loss = true
value_quantile = 0.25

[model]
path = "/models/latest.onnx"
intra_threads = 4
policy_logits = true
"#;
    let config: CentralConfig = toml::from_str(toml_content).unwrap();
    assert_eq!(config.common.log_level, "debug");
    assert_eq!(config.common.seed, 42);
    assert_eq!(config.search.iterations, 800);
    assert!((config.search.exploration - 0.5).abs() < f64::EPSILON);
    assert!(config.search.backprop_win_loss);
    assert!((config.search.value_quantile - 0.25).abs() < f64::EPSILON);
    assert_eq!(config.model.path(), Some("/models/latest.onnx"));
    assert_eq!(config.model.intra_threads, 4);
    assert!(config.model.policy_logits);
}

#[test]
fn test_partial_config() {
    let toml_content = r#"
[search]
temperature = 0.0
"#;
    let config: CentralConfig = toml::from_str(toml_content).unwrap();
    assert_eq!(config.search.temperature, 0.0);
    assert_eq!(config.search.iterations, 200); // Default
    assert_eq!(config.common.log_level, "info"); // Default
    assert_eq!(config.model.intra_threads, 1); // Default
}

#[test]
fn test_blank_model_path_is_none() {
    let config: CentralConfig = toml::from_str("[model]\npath = \"   \"\n").unwrap();
    assert!(config.model.path().is_none());
}

#[test]
fn test_load_from_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[search]\niterations = 64\nramp = 0").unwrap();

    let config = load_from_path(file.path());
    assert_eq!(config.search.iterations, 64);
    assert_eq!(config.search.ramp, 0);
}

#[test]
fn test_load_from_malformed_path_falls_back() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[search\niterations = ").unwrap();

    let config = load_from_path(file.path());
    assert_eq!(config.search.iterations, 200);
}

#[test]
fn test_load_from_missing_path_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_from_path(&dir.path().join("absent.toml"));
    assert_eq!(config.search.claim_draw_halfmove, 8);
}

// Each env test touches its own variables so parallel tests don't interfere.

#[test]
fn test_env_overrides_search() {
    std::env::set_var("ROOKERY_SEARCH_PRIORITY_EXPONENT", "1.5");
    std::env::set_var("ROOKERY_SEARCH_TAKE_OR_AVOID_KNOWNS", "true");

    let config = apply_env_overrides(CentralConfig::default());
    assert!((config.search.priority_exponent - 1.5).abs() < f64::EPSILON);
    assert!(config.search.take_or_avoid_knowns);

    std::env::remove_var("ROOKERY_SEARCH_PRIORITY_EXPONENT");
    std::env::remove_var("ROOKERY_SEARCH_TAKE_OR_AVOID_KNOWNS");
}

#[test]
fn test_env_overrides_model() {
    std::env::set_var("ROOKERY_MODEL_PATH", "/tmp/net.onnx");
    std::env::set_var("ROOKERY_MODEL_INTRA_THREADS", "3");
    std::env::set_var("ROOKERY_MODEL_POLICY_LOGITS", "true");

    let config = apply_env_overrides(CentralConfig::default());
    assert_eq!(config.model.path(), Some("/tmp/net.onnx"));
    assert_eq!(config.model.intra_threads, 3);
    assert!(config.model.policy_logits);

    std::env::remove_var("ROOKERY_MODEL_PATH");
    std::env::remove_var("ROOKERY_MODEL_INTRA_THREADS");
    std::env::remove_var("ROOKERY_MODEL_POLICY_LOGITS");
}

#[test]
fn test_unparseable_env_override_is_ignored() {
    std::env::set_var("ROOKERY_SEARCH_CLAIM_DRAW_PRIOR", "lots");

    let config = apply_env_overrides(CentralConfig::default());
    assert!((config.search.claim_draw_prior - 0.1).abs() < f64::EPSILON);

    std::env::remove_var("ROOKERY_SEARCH_CLAIM_DRAW_PRIOR");
}

#[test]
fn test_config_clone() {
    let config = CentralConfig::default();
    let cloned = config.clone();
    assert_eq!(config.common.log_level, cloned.common.log_level);
    assert_eq!(config.search.iterations, cloned.search.iterations);
}
