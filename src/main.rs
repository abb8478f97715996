//! riskgen: risk-based anonymization from the command line.
//!
//! # Usage
//!
//! ```bash
//! riskgen --data <file> --config <file.json> [--hierarchy <attr>=<file>]...
//!         [--redact <attr>]... [--subset <file>] [--delimiter <c>]
//!         [--workers <n>] [--output <file>]
//! ```
//!
//! The result is printed to stdout as JSON. With `--output` the released
//! records are written as delimited text.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use riskgen::adapters::delimited::{DelimitedFile, HierarchyFiles, DEFAULT_DELIMITER};
use riskgen::adapters::json::{load_configuration_spec, write_report};
use riskgen::application::{load_dataset, redact_attribute};
use riskgen::ports::DatasetSource;
use riskgen::{Anonymizer, DataSubset, SearchSettings};

const USAGE: &str = "Usage: riskgen --data <file> --config <file.json> [--hierarchy <attr>=<file>]... \
[--redact <attr>]... [--subset <file>] [--delimiter <c>] [--workers <n>] [--output <file>]";

#[derive(Debug, Default)]
struct Args {
    data: Option<PathBuf>,
    config: Option<PathBuf>,
    hierarchies: Vec<(String, PathBuf)>,
    redacted: Vec<String>,
    subset: Option<PathBuf>,
    output: Option<PathBuf>,
    delimiter: Option<char>,
    workers: Option<usize>,
}

fn parse_args() -> Result<Args> {
    let mut args = std::env::args().skip(1);
    let mut parsed = Args::default();

    while let Some(arg) = args.next() {
        let mut value = || args.next().with_context(|| format!("Missing value for {arg}\n{USAGE}"));
        match arg.as_str() {
            "--data" => parsed.data = Some(PathBuf::from(value()?)),
            "--config" => parsed.config = Some(PathBuf::from(value()?)),
            "--subset" => parsed.subset = Some(PathBuf::from(value()?)),
            "--output" => parsed.output = Some(PathBuf::from(value()?)),
            "--hierarchy" => {
                let pair = value()?;
                let (attribute, path) = pair
                    .split_once('=')
                    .with_context(|| format!("Expected <attr>=<file>, got {pair}"))?;
                parsed.hierarchies.push((attribute.to_string(), PathBuf::from(path)));
            }
            "--redact" => parsed.redacted.push(value()?),
            "--delimiter" => {
                let raw = value()?;
                let mut chars = raw.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => parsed.delimiter = Some(c),
                    _ => bail!("Delimiter must be a single character, got {raw:?}"),
                }
            }
            "--workers" => {
                let raw = value()?;
                parsed.workers = Some(raw.parse().with_context(|| format!("Invalid worker count {raw}"))?);
            }
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            other => bail!("Unknown argument {other}\n{USAGE}"),
        }
    }

    Ok(parsed)
}

fn main() -> Result<()> {
    // Logs go to stderr, or to RISKGEN_LOG_FILE; stdout carries the JSON result.
    let (writer, _guard) = match std::env::var("RISKGEN_LOG_FILE") {
        Ok(log_file) => {
            if let Some(parent) = std::path::Path::new(&log_file).parent() {
                // Best-effort: a missing directory surfaces when opening the file.
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_file)?;
            tracing_appender::non_blocking(file)
        }
        Err(_) => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(writer))
        .init();

    let args = parse_args()?;
    let data_path = args.data.clone().context(USAGE)?;
    let config_path = args.config.clone().context(USAGE)?;
    let delimiter = args.delimiter.unwrap_or(DEFAULT_DELIMITER);

    let source = DelimitedFile::new(&data_path).with_delimiter(delimiter);
    let hierarchies = args
        .hierarchies
        .iter()
        .fold(HierarchyFiles::new().with_delimiter(delimiter), |files, (attribute, path)| {
            files.with_file(attribute.clone(), path.clone())
        });
    let mut dataset = load_dataset(&source, &hierarchies)?;
    for attribute in &args.redacted {
        dataset = redact_attribute(dataset, attribute)?;
    }

    let subset = match &args.subset {
        Some(path) => {
            let rows = DelimitedFile::new(path).with_delimiter(delimiter).load_dataset()?;
            Some(DataSubset::from_matching_rows(&dataset, &rows)?)
        }
        None => None,
    };

    let configuration = load_configuration_spec(&config_path)?.into_configuration(subset)?;

    let mut settings = SearchSettings::from_env_or_default();
    if let Some(workers) = args.workers {
        settings = settings.with_workers(workers);
    }
    let anonymizer = Anonymizer::with_settings(settings)?;
    tracing::info!("Starting riskgen with {} workers...", anonymizer.workers());

    let result = anonymizer.anonymize(&dataset, &configuration)?;
    write_report(&mut std::io::stdout().lock(), &result)?;

    if let Some(output) = &args.output {
        let released = anonymizer.apply(&dataset, &configuration, &result.transformation)?;
        DelimitedFile::new(output)
            .with_delimiter(delimiter)
            .write_dataset(&released)?;
        tracing::info!("Wrote released records to {}", output.display());
    }

    tracing::info!("riskgen finished.");
    Ok(())
}
