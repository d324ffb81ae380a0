use anyhow::{bail, Context};
use call_analytics::analytics::{AnalyticsEngine, ExportFormat, ReportExporter, ReportWindow};
use call_analytics::config::Config;
use call_analytics::models::CallEvent;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "call-analytics-cli")]
#[command(about = "Call analytics CLI", long_about = None)]
struct Cli {
    #[arg(short, long, env = "CALL_ANALYTICS_ENDPOINT", default_value = "http://localhost:8080")]
    endpoint: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a report locally from an events file
    Compute {
        /// JSON file holding an array of events or an `{"events": [...]}` object
        #[arg(value_name = "EVENTS_FILE")]
        input: PathBuf,

        /// Window: `7d` or `YYYY-MM-DD,YYYY-MM-DD`
        #[arg(short, long, default_value = "7d")]
        window: String,

        /// Reference instant (RFC 3339); defaults to now
        #[arg(short, long)]
        now: Option<String>,

        /// Output format: json or csv
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Reporting time zone, overriding configuration
        #[arg(short = 'z', long)]
        timezone: Option<String>,
    },

    /// Compute a report on a running server
    Remote {
        #[arg(value_name = "EVENTS_FILE")]
        input: PathBuf,

        #[arg(short, long, default_value = "7d")]
        window: String,

        #[arg(short, long)]
        now: Option<String>,
    },

    /// Show the current and previous periods for a window
    Periods {
        #[arg(short, long, default_value = "7d")]
        window: String,

        #[arg(short, long)]
        now: Option<String>,
    },

    /// Check server health
    Health,
}

/// Events file layouts accepted by `compute` and `remote`
#[derive(Deserialize)]
#[serde(untagged)]
enum EventsFile {
    List(Vec<CallEvent>),
    Envelope { events: Vec<CallEvent> },
}

impl EventsFile {
    fn into_events(self) -> Vec<CallEvent> {
        match self {
            EventsFile::List(events) | EventsFile::Envelope { events } => events,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = Client::new();

    match cli.command {
        Commands::Compute {
            input,
            window,
            now,
            format,
            output,
            timezone,
        } => {
            let window: ReportWindow = window.parse()?;
            let now = parse_now(now.as_deref())?;
            let format: ExportFormat = format
                .parse()
                .with_context(|| format!("unknown format '{}' (use json or csv)", format))?;

            let mut config = Config::load().unwrap_or_default();
            if let Some(tz) = timezone {
                config.analytics.timezone = tz;
            }
            let engine = AnalyticsEngine::new(config.analytics)?;

            let events = read_events(&input).await?;
            let report = engine.compute(&events, &window, now);

            match output {
                Some(path) => {
                    ReportExporter::export(&report, format, &path).await?;
                    eprintln!("Report written to {}", path.display());
                }
                None => {
                    let bytes = ReportExporter::export_to_bytes(&report, format)?;
                    println!("{}", String::from_utf8_lossy(&bytes));
                }
            }
        }

        Commands::Remote { input, window, now } => {
            let window: ReportWindow = window.parse()?;
            let now = now.as_deref().map(|s| parse_now(Some(s))).transpose()?;
            let events = read_events(&input).await?;

            let response = client
                .post(format!("{}/v1/analytics", cli.endpoint))
                .json(&json!({
                    "events": events,
                    "window": window,
                    "now": now,
                }))
                .send()
                .await?;

            let status = response.status();
            let body: serde_json::Value = response.json().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);

            if !status.is_success() {
                bail!("server returned {}", status);
            }
        }

        Commands::Periods { window, now } => {
            let mut query = vec![("window", window)];
            if let Some(now) = now {
                query.push(("now", now));
            }

            let response = client
                .get(format!("{}/v1/analytics/periods", cli.endpoint))
                .query(&query)
                .send()
                .await?;

            let body: serde_json::Value = response.json().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }

        Commands::Health => {
            let response = client
                .get(format!("{}/health", cli.endpoint))
                .send()
                .await?;

            let body: serde_json::Value = response.json().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
    }

    Ok(())
}

async fn read_events(path: &Path) -> anyhow::Result<Vec<CallEvent>> {
    let raw = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let file: EventsFile = serde_json::from_slice(&raw)
        .with_context(|| format!("{} is not a valid events file", path.display()))?;
    Ok(file.into_events())
}

fn parse_now(now: Option<&str>) -> anyhow::Result<DateTime<Utc>> {
    match now {
        Some(s) => Ok(DateTime::parse_from_rfc3339(s)
            .with_context(|| format!("invalid --now '{}' (use RFC 3339)", s))?
            .with_timezone(&Utc)),
        None => Ok(Utc::now()),
    }
}
