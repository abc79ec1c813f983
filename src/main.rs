//! CLI entry point for the GreenFeed harvester.
//!
//! Provides subcommands for downloading summarized visit data and raw
//! feed/RFID event streams from the vendor portal, one CSV artifact per day.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use greenfeed_harvester::fetch::BasicClient;
use greenfeed_harvester::portal::{Credentials, PortalClient, RawKind};
use greenfeed_harvester::run::{run_raw, run_summary};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "greenfeed_harvester")]
#[command(about = "Downloads GreenFeed feeding-station telemetry", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download summarized visit data, one CSV per day
    Summary {
        /// Number of days to harvest, counting back from today
        #[arg(short, long, default_value_t = 2)]
        interval: u32,

        /// Directory to write day artifacts into
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// Download a raw event stream, one CSV per day
    Raw {
        /// Which stream to download
        #[arg(value_enum)]
        kind: KindArg,

        /// Number of days to harvest, counting back from today
        #[arg(short, long, default_value_t = 5)]
        interval: u32,

        /// Directory to write day artifacts into
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Feed,
    Rfid,
}

impl From<KindArg> for RawKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Feed => RawKind::Feed,
            KindArg::Rfid => RawKind::Rfid,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/greenfeed_harvester.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("greenfeed_harvester.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let credentials = Credentials {
        user: std::env::var("GREENFEED_USER").expect("GREENFEED_USER must be set"),
        password: std::env::var("GREENFEED_PASSWORD").expect("GREENFEED_PASSWORD must be set"),
    };

    let mut portal = PortalClient::new(BasicClient::new());
    if let Ok(base_url) = std::env::var("GREENFEED_BASE_URL") {
        portal = portal.with_base_url(base_url);
    }

    let report = match cli.command {
        Commands::Summary {
            interval,
            output_dir,
        } => run_summary(&portal, &credentials, interval, &output_dir).await?,
        Commands::Raw {
            kind,
            interval,
            output_dir,
        } => run_raw(&portal, &credentials, interval, kind.into(), &output_dir).await?,
    };

    report.log()?;
    Ok(())
}
