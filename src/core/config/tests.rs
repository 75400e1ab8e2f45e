use super::*;
use crate::core::errors::MetricsError;

#[test]
fn default_configs_validate_successfully() {
    MetricsConfig::default().validate().expect("metrics default");
    CodeRankConfig::default().validate().expect("coderank default");
    CacheConfig::default().validate().expect("cache default");
}

#[test]
fn coderank_defaults_match_standard_pagerank() {
    let config = CodeRankConfig::default();
    assert_eq!(config.damping_factor, 0.85);
    assert_eq!(config.strategies, vec!["inheritance".to_string()]);
    assert!(config.max_iterations > 0);
}

#[test]
fn unknown_strategy_is_a_configuration_error() {
    let mut config = CodeRankConfig::default();
    config.strategies = vec!["inheritance".into(), "telepathy".into()];

    let err = config.validate().expect_err("unknown strategy must fail");
    assert!(err.is_configuration());
    if let MetricsError::Config { message, field } = err {
        assert!(message.contains("telepathy"));
        assert_eq!(field.as_deref(), Some("coderank.strategies"));
    } else {
        panic!("Expected Config error");
    }
}

#[test]
fn duplicate_strategies_resolve_once() {
    let mut config = CodeRankConfig::default();
    config.strategies = vec!["method".into(), "method".into(), "property".into()];
    let kinds = config.strategy_kinds().unwrap();
    assert_eq!(kinds, vec![StrategyKind::Method, StrategyKind::Property]);
}

#[test]
fn damping_factor_must_be_inside_unit_interval() {
    let mut config = CodeRankConfig::default();
    config.damping_factor = 1.0;
    let err = config.validate().unwrap_err();
    assert!(matches!(err, MetricsError::Validation { .. }));
}

#[test]
fn zero_ttl_is_rejected() {
    let config = CacheConfig {
        ttl_seconds: Some(0),
        ..CacheConfig::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn explicit_cache_location_wins() {
    let config = CacheConfig {
        driver: CacheDriverKind::File,
        location: Some(PathBuf::from("/tmp/metrics-cache")),
        ttl_seconds: None,
    };
    assert_eq!(
        config.resolved_location().unwrap(),
        PathBuf::from("/tmp/metrics-cache")
    );
}

#[test]
fn partial_yaml_fills_defaults() {
    let yaml = "coderank:\n  strategies: [method]\ncache:\n  driver: file\n";
    let config: MetricsConfig = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.coderank.strategies, vec!["method".to_string()]);
    assert_eq!(config.coderank.damping_factor, 0.85);
    assert_eq!(config.cache.driver, CacheDriverKind::File);
    assert!(config.dependency.detect_cycles);
}

#[test]
fn yaml_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("archmetrics.yml");

    let mut config = MetricsConfig::default();
    config.coderank.max_iterations = 42;
    config.to_yaml_file(&path).unwrap();

    let loaded = MetricsConfig::from_yaml_file(&path).unwrap();
    assert_eq!(loaded.coderank.max_iterations, 42);
}
