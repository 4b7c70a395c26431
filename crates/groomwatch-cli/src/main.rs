use anyhow::Result;
use clap::{Arg, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

use groomwatch_classifiers::config::EvaluationConfig;
use groomwatch_classifiers::evaluation::run_evaluation;
use groomwatch_classifiers::keyword::KeywordDetector;
use groomwatch_cli::evaluate::input::{parse_ngram_range, resolve_config, EvaluateOverrides};
use groomwatch_cli::evaluate::output::{render_report, write_json_report};

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("GROOMWATCH_LOG", "error,groomwatch=info"))
        .init();

    let matches = Command::new("groomwatch")
        .version(clap::crate_version!())
        .about("Benchmark grooming-detection classifiers against keyword filtering")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("evaluate")
                .about("Train the classifiers and print the comparison report")
                .arg(
                    Arg::new("config")
                        .help("Path to evaluation JSON configuration file")
                        .required(false)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("data")
                        .short('d')
                        .long("data")
                        .help(
                            "Path to the labeled corpus (*.csv or *.tsv). \
                             Overrides the data path specified in the configuration file.",
                        )
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("max_features")
                        .long("max-features")
                        .help("Maximum vocabulary size.")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("ngram_range")
                        .long("ngram-range")
                        .help("Inclusive n-gram orders as MIN,MAX, e.g. 1,2.")
                        .value_parser(parse_ngram_range),
                )
                .arg(
                    Arg::new("test_fraction")
                        .long("test-fraction")
                        .help("Share of each class held out for testing.")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .help("Seed for the split and stochastic training.")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("keyword_scope")
                        .long("keyword-scope")
                        .help("Where to score the keyword filter.")
                        .value_parser(["test", "full", "both"])
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("primary_model")
                        .long("primary-model")
                        .help("Override the primary model type from the JSON config.")
                        .value_parser(["logistic", "svm", "mlp"])
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("json")
                        .short('o')
                        .long("json")
                        .help("Also write the full report as JSON to this path.")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .subcommand(
            Command::new("keyword")
                .about("Run the keyword filter on a single message")
                .arg(
                    Arg::new("text")
                        .help("Message text to check")
                        .required(true)
                        .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("evaluate", sub_m)) => handle_evaluate(sub_m),
        Some(("keyword", sub_m)) => handle_keyword(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn handle_evaluate(matches: &ArgMatches) -> Result<()> {
    let config_path: Option<&PathBuf> = matches.get_one("config");
    match config_path {
        Some(path) => log::info!("[groomwatch] Evaluating with config: {:?}", path),
        None => eprintln!("[groomwatch] No config file provided; using defaults."),
    }

    let overrides = EvaluateOverrides::from_matches(matches)?;
    let config: EvaluationConfig = match resolve_config(config_path, &overrides) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {:#}", e);
            std::process::exit(1)
        }
    };

    if config_path.is_none() {
        let effective_json = serde_json::to_string_pretty(&config).unwrap_or_default();
        eprintln!("[groomwatch] Effective config:\n{}", effective_json);
    }

    let report = match run_evaluation(config) {
        Ok(report) => report,
        Err(e) => {
            log::error!("Evaluation failed: {}", e);
            std::process::exit(1)
        }
    };

    print!("{}", render_report(&report));

    if let Some(json_path) = matches.get_one::<PathBuf>("json") {
        write_json_report(&report, json_path)?;
    }
    Ok(())
}

fn handle_keyword(matches: &ArgMatches) -> Result<()> {
    let text: &String = matches
        .get_one("text")
        .ok_or_else(|| anyhow::anyhow!("Missing message text"))?;
    let detector = KeywordDetector::default();
    match detector.matched_phrase(text) {
        Some(phrase) => println!("flagged (matched \"{}\")", phrase),
        None => println!("not flagged"),
    }
    Ok(())
}
