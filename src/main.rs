use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use immich_datefix::config::{API_KEY_ENV, API_URL_ENV, DEFAULT_TIMEOUT_SECS};
use immich_datefix::date::{self, Timestamp};
use immich_datefix::{sync_day, CatalogConfig, ImmichClient, SyncOptions};

#[derive(Parser)]
#[command(name = "immich-datefix", version, about = "Infer capture dates from media filenames and fix them in Immich")]
struct Cli {
    /// Log debug details
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the date encoded in each filename
    Extract {
        /// Filenames or paths; directory components are stripped
        #[arg(required = true)]
        files: Vec<String>,

        /// One JSON object per line
        #[arg(long)]
        json: bool,
    },

    /// List the filename patterns in priority order
    Rules,

    /// Correct creation dates of one day's assets in Immich
    Sync {
        /// Immich API base address, e.g. https://photos.example.com/api
        #[arg(long, env = API_URL_ENV)]
        api_url: String,

        /// Immich API key
        #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
        api_key: String,

        /// Day to search (YYYY-MM-DD, UTC)
        #[arg(long)]
        date: NaiveDate,

        /// Only process this asset
        #[arg(long)]
        asset_id: Option<String>,

        /// Show what would change without updating
        #[arg(long)]
        dry_run: bool,

        /// HTTP timeout in seconds
        #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
        timeout_secs: u64,
    },
}

#[derive(Serialize)]
struct ExtractLine<'a> {
    filename: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pattern: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("immich_datefix=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "immich_datefix=info".into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Extract { files, json } => {
            let failed = run_extract(&files, json)?;
            if failed > 0 {
                eprintln!("{} of {} filenames had no usable date", failed, files.len());
                std::process::exit(1);
            }
        }
        Command::Rules => {
            for (i, pat) in date::patterns().iter().enumerate() {
                let result = date::extract_date(pat.example)
                    .map(|ts| ts.to_string())
                    .unwrap_or_else(|e| e.to_string());
                println!("{:>2}  {:<24} {:<46} {}", i + 1, pat.name, pat.example, result);
            }
        }
        Command::Sync {
            api_url,
            api_key,
            date: day,
            asset_id,
            dry_run,
            timeout_secs,
        } => {
            let config = CatalogConfig::new(&api_url, &api_key, Duration::from_secs(timeout_secs))?;
            let client = ImmichClient::new(&config);
            let options = SyncOptions {
                day,
                asset_id,
                dry_run,
            };

            let t = std::time::Instant::now();
            let report = sync_day(&client, &options)?;
            println!(
                "{} assets: {} updated, {} unchanged, {} without a date, {} failed{} ({:.2}s)",
                report.total,
                report.updated,
                report.unchanged,
                report.unrecognized,
                report.failed,
                if dry_run {
                    format!(", {} pending", report.pending)
                } else {
                    String::new()
                },
                t.elapsed().as_secs_f64()
            );
        }
    }

    Ok(())
}

/// Print one line per input, returning how many failed.
fn run_extract(files: &[String], json: bool) -> anyhow::Result<usize> {
    let mut failed = 0;
    for file in files {
        let name = Path::new(file)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(file.as_str());

        let result = date::extract_date(name);
        let pattern = date::matching_pattern(name).map(|p| p.name);

        if json {
            let line = match &result {
                Ok(ts) => ExtractLine {
                    filename: name,
                    timestamp: Some(*ts),
                    pattern,
                    error: None,
                },
                Err(e) => ExtractLine {
                    filename: name,
                    timestamp: None,
                    pattern,
                    error: Some(e.to_string()),
                },
            };
            println!("{}", serde_json::to_string(&line)?);
        } else {
            match &result {
                Ok(ts) => println!("{}\t{}\t{}", name, ts, pattern.unwrap_or("-")),
                Err(e) => eprintln!("{}", e),
            }
        }

        if result.is_err() {
            failed += 1;
        }
    }
    Ok(failed)
}
