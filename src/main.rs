//! `ruslinkers` command line: import both datasets and write a snapshot.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use ruslinkers::{export, ImportConfig, KnowledgeBase, Table};

#[derive(Debug, Parser)]
#[command(name = "ruslinkers", version, about = "Build the connectives knowledge base from the syntax and data tables")]
struct Args {
    /// JSON config file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Primary (syntactic) dataset
    #[arg(long)]
    syntax: Option<PathBuf>,

    /// Secondary (dictionary) dataset
    #[arg(long)]
    data: Option<PathBuf>,

    /// Snapshot output
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the full report as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("ruslinkers: {err}");
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.as_str().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&config, args.json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: &Args) -> ruslinkers::Result<ImportConfig> {
    let mut config = match &args.config {
        Some(path) => ImportConfig::from_file(path)?,
        None => ImportConfig::default(),
    };
    if let Some(path) = &args.syntax {
        config.syntax_path = path.clone();
    }
    if let Some(path) = &args.data {
        config.data_path = path.clone();
    }
    if let Some(path) = &args.output {
        config.output_path = Some(path.clone());
    }
    config.validate()?;
    Ok(config)
}

fn run(config: &ImportConfig, json: bool) -> ruslinkers::Result<()> {
    let delimiter = config.delimiter_byte()?;
    let syntax = Table::from_path(&config.syntax_path, delimiter)?;
    let data = Table::from_path(&config.data_path, delimiter)?;

    let kb = KnowledgeBase::open_memory();
    let report = kb.import(&syntax, &data, config)?;

    if let Some(path) = &config.output_path {
        export::save(&kb.read(), path)?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let stats = kb.read().stats();
        println!(
            "{} units, {} forms, {} meanings, {} links",
            stats.units, stats.forms, stats.meanings, stats.links
        );
        println!(
            "secondary rows: {} merged, {} skipped, {} filtered; {} diagnostics",
            report.rows_merged,
            report.rows_skipped,
            report.rows_filtered,
            report.diagnostics.len()
        );
    }
    Ok(())
}
