//! Tests for argument parsing and run setup

use super::*;
use crate::config::TapConfig;
use clap::Parser;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::PathBuf;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("tap-solarvista").chain(args.iter().copied())).unwrap()
}

#[test]
fn test_parse_discover() {
    let cli = parse(&["-c", "config.json", "--discover"]);
    assert!(cli.discover);
    assert_eq!(cli.config, PathBuf::from("config.json"));
    assert_eq!(cli.catalog_path(), None);
}

#[test]
fn test_parse_sync() {
    let cli = parse(&[
        "--config",
        "config.json",
        "--state",
        "state.json",
        "--catalog",
        "catalog.json",
        "--state-output",
        "out.json",
    ]);
    assert!(!cli.discover);
    assert_eq!(cli.state, Some(PathBuf::from("state.json")));
    assert_eq!(cli.catalog_path(), Some(&PathBuf::from("catalog.json")));
    assert_eq!(cli.state_output, Some(PathBuf::from("out.json")));
}

#[test]
fn test_properties_is_catalog_alias() {
    let cli = parse(&["-c", "config.json", "-p", "properties.json"]);
    assert_eq!(cli.catalog_path(), Some(&PathBuf::from("properties.json")));
}

#[test]
fn test_config_is_required() {
    assert!(Cli::try_parse_from(["tap-solarvista", "--discover"]).is_err());
    assert!(Cli::try_parse_from([
        "tap-solarvista",
        "-c",
        "c.json",
        "--catalog",
        "a.json",
        "--properties",
        "b.json"
    ])
    .is_err());
}

#[test]
fn test_load_catalog_discovers_without_file() {
    let runner = Runner::new(parse(&["-c", "config.json"]));
    let mut config = TapConfig::new("acme");
    config.datasources = vec!["site".to_string()];

    let catalog = runner.load_catalog(&config).unwrap();
    let selected: Vec<_> = catalog
        .selected_streams()
        .map(|s| s.tap_stream_id.as_str())
        .collect();
    assert_eq!(selected, vec!["site_stream"]);
}

#[test]
fn test_load_catalog_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.json");
    let catalog = crate::catalog::discover(&["customer".to_string()]).unwrap();
    std::fs::write(&path, catalog.to_json_pretty().unwrap()).unwrap();

    let runner = Runner::new(parse(&["-c", "config.json", "--catalog", path.to_str().unwrap()]));
    let loaded = runner.load_catalog(&TapConfig::new("acme")).unwrap();
    assert_eq!(
        loaded.selected_streams().count(),
        catalog.selected_streams().count()
    );
    assert!(loaded.get_stream("customer_stream").unwrap().is_selected());
}

#[test]
fn test_load_state_with_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("state.json");
    let output = dir.path().join("out.json");
    std::fs::write(&input, json!({"workitem_stream": "2021-01-01"}).to_string()).unwrap();

    let runner = Runner::new(parse(&[
        "-c",
        "config.json",
        "-s",
        input.to_str().unwrap(),
        "--state-output",
        output.to_str().unwrap(),
    ]));
    let state = runner.load_state().unwrap();
    assert_eq!(
        state.bookmark("workitem_stream"),
        Some(&json!("2021-01-01"))
    );
    assert_eq!(state.output_path(), Some(output.as_path()));
}

#[test]
fn test_load_state_defaults_to_empty() {
    let runner = Runner::new(parse(&["-c", "config.json"]));
    let state = runner.load_state().unwrap();
    assert!(state.state().is_empty());
    assert!(state.is_in_memory());
}
