use super::*;

#[test]
fn parses_collect_with_files_and_keywords() {
    let cli = Cli::try_parse_from([
        "trendlab",
        "collect",
        "--file",
        "exports/search.json",
        "--file",
        "exports/social.json",
        "--keyword",
        "coffee",
    ])
    .expect("expected valid cli args");

    match cli.command {
        Commands::Collect {
            file,
            keyword,
            limit,
        } => {
            assert_eq!(file.len(), 2);
            assert_eq!(keyword, vec!["coffee".to_string()]);
            assert_eq!(limit, 50);
        }
        other => panic!("expected collect, got {other:?}"),
    }
}

#[test]
fn parses_collect_limit_override() {
    let cli = Cli::try_parse_from([
        "trendlab",
        "collect",
        "--file",
        "exports/search.json",
        "--limit",
        "10",
    ])
    .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Commands::Collect { limit: 10, .. }
    ));
}

#[test]
fn parses_predict_all_when_no_trend_given() {
    let cli = Cli::try_parse_from(["trendlab", "predict"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Commands::Predict {
            trend: None,
            json: false
        }
    ));
}

#[test]
fn parses_predict_one_with_json_output() {
    let id = Uuid::new_v4();
    let cli = Cli::try_parse_from(["trendlab", "predict", "--trend", &id.to_string(), "--json"])
        .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Commands::Predict {
            trend: Some(parsed),
            json: true
        } if parsed == id
    ));
}

#[test]
fn rejects_a_malformed_trend_id() {
    let result = Cli::try_parse_from(["trendlab", "predict", "--trend", "not-a-uuid"]);
    assert!(result.is_err());
}

#[test]
fn parses_opportunities_and_early_signals() {
    let cli = Cli::try_parse_from(["trendlab", "opportunities"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::Opportunities));

    let cli = Cli::try_parse_from(["trendlab", "early-signals"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::EarlySignals));
}

#[test]
fn parses_experiment_run() {
    let id = Uuid::new_v4();
    let cli = Cli::try_parse_from(["trendlab", "experiment", "run", "--trend", &id.to_string()])
        .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Commands::Experiment {
            command: ExperimentCommands::Run { trend }
        } if trend == id
    ));
}

#[test]
fn parses_experiment_complete_with_peak_date() {
    let id = Uuid::new_v4();
    let cli = Cli::try_parse_from([
        "trendlab",
        "experiment",
        "complete",
        "--experiment",
        &id.to_string(),
        "--peak-date",
        "2026-08-20",
    ])
    .expect("expected valid cli args");

    match cli.command {
        Commands::Experiment {
            command:
                ExperimentCommands::Complete {
                    experiment,
                    peak_date,
                },
        } => {
            assert_eq!(experiment, id);
            assert_eq!(peak_date.to_string(), "2026-08-20");
        }
        other => panic!("expected experiment complete, got {other:?}"),
    }
}

#[test]
fn rejects_a_malformed_peak_date() {
    let id = Uuid::new_v4().to_string();
    let result = Cli::try_parse_from([
        "trendlab",
        "experiment",
        "complete",
        "--experiment",
        &id,
        "--peak-date",
        "late august",
    ]);
    assert!(result.is_err());
}

#[test]
fn parses_experiment_best_and_purge_expired() {
    let cli =
        Cli::try_parse_from(["trendlab", "experiment", "best"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Experiment {
            command: ExperimentCommands::Best
        }
    ));

    let cli = Cli::try_parse_from(["trendlab", "purge-expired"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::PurgeExpired));
}

#[test]
fn a_bare_invocation_asks_for_a_subcommand() {
    let result = Cli::try_parse_from(["trendlab"]);
    assert!(result.is_err());
}
