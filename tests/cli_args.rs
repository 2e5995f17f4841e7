// tests/cli_args.rs

use std::path::PathBuf;

use clap::Parser;
use dagrun::cli::CliArgs;
use dagrun::config::default_config_path;

#[test]
fn config_defaults_to_the_standard_pipeline_path() {
    let args = CliArgs::try_parse_from(["dagrun"]).unwrap();
    assert_eq!(args.config, default_config_path());
    assert_eq!(args.concurrency, None);
    assert!(args.fail.is_empty());
    assert!(!args.json);
    assert!(!args.dry_run);
}

#[test]
fn parses_run_flags() {
    let args = CliArgs::try_parse_from([
        "dagrun",
        "--config",
        "demos/order_pipeline.toml",
        "--concurrency",
        "2",
        "--fail",
        "stock",
        "--fail",
        "invoice",
        "--seed",
        "7",
        "--json",
    ])
    .unwrap();

    assert_eq!(args.config, PathBuf::from("demos/order_pipeline.toml"));
    assert_eq!(args.concurrency, Some(2));
    assert_eq!(args.fail, vec!["stock", "invoice"]);
    assert_eq!(args.seed, Some(7));
    assert!(args.json);
}

#[test]
fn zero_concurrency_is_rejected() {
    assert!(CliArgs::try_parse_from(["dagrun", "--concurrency", "0"]).is_err());
}
