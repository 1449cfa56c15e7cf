use piecore::config::EngineConfig;
use piecore::error::ConfigError;
use piecore::search::Tunables;
use pretty_assertions::assert_eq;

#[test]
fn defaults_round_trip_through_json() {
    let cfg = EngineConfig::default();
    let text = cfg.to_json().unwrap();
    assert_eq!(EngineConfig::from_json_str(&text).unwrap(), cfg);
}

#[test]
fn partial_json_fills_defaults() {
    let cfg = EngineConfig::from_json_str(r#"{"threads": 4, "tunables": {"lmr_base": 90}}"#).unwrap();
    assert_eq!(cfg.threads, 4);
    assert_eq!(cfg.hash_mb, EngineConfig::default().hash_mb);
    assert_eq!(cfg.tunables.lmr_base, 90);
    assert_eq!(cfg.tunables.rfp_margin, Tunables::default().rfp_margin);
}

#[test]
fn invalid_values_are_rejected() {
    assert!(matches!(EngineConfig::from_json_str(r#"{"threads": 0}"#), Err(ConfigError::NotPositive("threads"))));
    assert!(matches!(EngineConfig::from_json_str(r#"{"hash_mb": 0}"#), Err(ConfigError::NotPositive("hash_mb"))));
    assert!(matches!(
        EngineConfig::from_json_str(r#"{"tunables": {"asp_window": 1}}"#),
        Err(ConfigError::OutOfRange { .. })
    ));
    assert!(matches!(EngineConfig::from_json_str("{not json"), Err(ConfigError::Json(_))));
    assert!(matches!(EngineConfig::from_json_file("/nonexistent/piecore.json"), Err(ConfigError::Io(_))));
}

#[test]
fn tunables_get_set_by_name() {
    let mut t = Tunables::default();
    assert_eq!(t.get("nmp_base"), Some(3));
    t.set("nmp_base", 4).unwrap();
    assert_eq!(t.get("nmp_base"), Some(4));
    assert!(matches!(t.set("nmp_base", 99), Err(ConfigError::OutOfRange { min: 1, max: 6, .. })));
    assert!(matches!(t.set("bogus", 1), Err(ConfigError::UnknownParameter(_))));
    assert_eq!(t.get("bogus"), None);
    assert_eq!(t.get("nmp_base"), Some(4));
}

#[test]
fn every_spec_default_is_in_range_and_matches() {
    let t = Tunables::default();
    for spec in Tunables::specs() {
        assert!(spec.min <= spec.default && spec.default <= spec.max, "{}", spec.name);
        assert!(spec.step > 0, "{}", spec.name);
        assert_eq!(t.get(spec.name), Some(spec.default));
    }
    t.validate().unwrap();
}
