use bitcoin::Network;
use std::fs;
use tempfile::tempdir;
use utxoplan_common::config::{Config, PlannerConfig, DEFAULT_SEARCH_BUDGET};
use utxoplan_common::logging::LogLevel;
use utxoplan_common::types::{DustPolicy, InputScriptKind, DUST_THRESHOLD};

#[test]
fn defaults_are_valid() {
    let config = Config::default();
    assert!(config.validate().is_ok());

    let planner = &config.planner;
    assert_eq!(planner.network().unwrap(), Network::Bitcoin);
    assert_eq!(planner.dust_threshold, DUST_THRESHOLD);
    assert_eq!(planner.script_kind().unwrap(), InputScriptKind::P2wpkh);
    assert_eq!(planner.dust_policy().unwrap(), DustPolicy::Absorb);
    assert_eq!(planner.search_budget, DEFAULT_SEARCH_BUDGET);
}

#[test]
fn partial_toml_falls_back_to_defaults() {
    let config = Config::from_toml_str(
        r#"
        [planner]
        network = "testnet"
        input_script_kind = "p2pkh"

        [logging]
        level = "Debug"
        json_format = true
        "#,
    )
    .unwrap();

    assert_eq!(config.planner.network().unwrap(), Network::Testnet);
    assert_eq!(config.planner.script_kind().unwrap(), InputScriptKind::P2pkh);
    assert_eq!(config.planner.dust_threshold, DUST_THRESHOLD);
    assert_eq!(config.logging.level, LogLevel::Debug);
    assert!(config.logging.json_format);
    assert!(config.logging.include_timestamps);
}

#[test]
fn empty_toml_is_default() {
    assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
}

#[test]
fn invalid_values_are_rejected() {
    for toml in [
        "[planner]\nnetwork = \"moonnet\"",
        "[planner]\ninput_script_kind = \"p2tr\"",
        "[planner]\ndust_policy = \"keep\"",
        "[planner]\nsearch_budget = 0",
        "[planner\n",
    ] {
        assert!(Config::from_toml_str(toml).is_err(), "accepted: {}", toml);
    }
}

#[test]
fn save_and_load_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("utxoplan.toml");

    let config = Config {
        planner: PlannerConfig {
            network: "regtest".to_string(),
            dust_threshold: 294,
            dust_policy: "reject".to_string(),
            ..PlannerConfig::default()
        },
        ..Config::default()
    };

    config.save(&path).unwrap();
    assert!(fs::read_to_string(&path).unwrap().contains("regtest"));

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.planner.network().unwrap(), Network::Regtest);
}

#[test]
fn missing_file_reports_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let err = Config::load(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("absent.toml"));
}
