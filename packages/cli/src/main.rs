#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for incident lens.
//!
//! `analyze` runs the whole pipeline once and writes an HTML report;
//! `serve` starts the API server.
//!
//! Uses `indicatif-log-bridge` (via [`incident_lens_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

mod pipeline;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use incident_lens_server::config::AppConfig;

use crate::pipeline::AnalyzeOptions;

#[derive(Parser)]
#[command(
    name = "incident_lens",
    about = "Cluster and chart police incident summaries"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect incidents from URLs and PDFs, cluster them and write a report
    Analyze(AnalyzeArgs),
    /// Start the API server
    Serve {
        /// Listen address (overrides `BIND_ADDR`)
        #[arg(long)]
        bind: Option<String>,
        /// Listen port (overrides `PORT`)
        #[arg(long)]
        port: Option<u16>,
    },
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Page or PDF URL; may be repeated
    #[arg(long)]
    url: Vec<String>,
    /// Whitespace-separated list of URLs
    #[arg(long)]
    urls: Option<String>,
    /// Local incident summary PDF; may be repeated
    #[arg(long)]
    file: Vec<PathBuf>,
    /// Where to write the HTML report
    #[arg(long, short, default_value = "report.html")]
    output: PathBuf,
    /// Also write the chart specs as JSON
    #[arg(long)]
    json: Option<PathBuf>,
}

impl From<AnalyzeArgs> for AnalyzeOptions {
    fn from(args: AnalyzeArgs) -> Self {
        Self {
            url: args.url,
            urls: args.urls,
            files: args.file,
            output: args.output,
            json: args.json,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let multi = incident_lens_cli_utils::init_logger();
    let mut config = AppConfig::load()?;

    match cli.command {
        Commands::Analyze(args) => {
            let options = AnalyzeOptions::from(args);
            pipeline::run(&multi, &config.fetch, config.analysis, &options).await?;
        }
        Commands::Serve { bind, port } => {
            if let Some(bind) = bind {
                config.bind_addr = bind;
            }
            if let Some(port) = port {
                config.port = port;
            }

            // The server uses actix-web's runtime, so we need to run it
            // in a blocking task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(move || {
                actix_web::rt::System::new().block_on(incident_lens_server::run_server(config))
            })
            .await??;
        }
    }

    Ok(())
}
