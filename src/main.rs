//! taxgate (v1)
//!
//! Looks up tax brackets from the bracket-rate service through a circuit
//! breaker and computes progressive tax over them.
//!
//! # Architecture Overview
//!
//! ```text
//!   salary, year?
//!        │
//!        ▼
//!  ┌─────────────┐   ┌─────────────────┐   ┌────────────────┐        bracket-rate
//!  │ TaxService  │──▶│ CircuitBreaker  │──▶│ BracketFetcher │──────▶  service
//!  └─────┬───────┘   └────────┬────────┘   └────────────────┘
//!        │                    │ transitions
//!        ▼                    ▼
//!  ┌─────────────┐   ┌─────────────────┐
//!  │  brackets   │   │ LogSink /       │
//!  │  compute    │   │ MetricsSink     │
//!  └─────────────┘   └─────────────────┘
//! ```

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};

use taxgate::bench::{self, BenchOptions};
use taxgate::config::{load_config, DEFAULT_ENVIRONMENT};
use taxgate::observability::{init_logging, init_metrics};
use taxgate::service::{Sinks, TaxService};

#[derive(Parser)]
#[command(name = "taxgate")]
#[command(about = "Tax bracket lookup behind a circuit breaker", long_about = None)]
struct Cli {
    /// Directory holding config.toml and config.<env>.toml.
    #[arg(short, long, default_value = "configs")]
    config_dir: PathBuf,

    /// Environment overlay to apply.
    #[arg(short, long, env = "APP_ENV", default_value = DEFAULT_ENVIRONMENT)]
    env: String,

    /// Print Prometheus metrics after the command finishes.
    #[arg(long)]
    print_metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute tax for a salary
    Compute {
        #[arg(short, long)]
        salary: f64,
        #[arg(short, long)]
        year: Option<i32>,
    },
    /// Fetch and print the bracket set
    Brackets {
        #[arg(short, long)]
        year: Option<i32>,
    },
    /// Drive concurrent lookups and report breaker behaviour
    Bench {
        #[arg(short = 'n', long, default_value_t = 100)]
        requests: usize,
        #[arg(short, long, default_value_t = 10)]
        concurrency: usize,
        #[arg(long, default_value_t = 10_000)]
        min_salary: u32,
        #[arg(long, default_value_t = 1_000_000)]
        max_salary: u32,
        #[arg(long, default_value_t = 2020)]
        min_year: i32,
        #[arg(long, default_value_t = 2025)]
        max_year: i32,
        /// Report format
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let loaded = load_config(&cli.config_dir, &cli.env)?;
    init_logging(&loaded.config.logging)?;
    loaded.log_summary();
    let config = loaded.config;

    tracing::info!(environment = %config.environment, "taxgate v0.1.0 starting");

    let metrics = if config.observability.metrics_enabled {
        Some(init_metrics()?)
    } else {
        None
    };

    let service = Arc::new(TaxService::new(&config, Sinks::default())?);

    match cli.command {
        Commands::Compute { salary, year } => {
            let response = service.respond(salary, year).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Brackets { year } => {
            let brackets = service.fetch_brackets(year).await?;
            println!("{}", serde_json::to_string_pretty(&brackets)?);
        }
        Commands::Bench {
            requests,
            concurrency,
            min_salary,
            max_salary,
            min_year,
            max_year,
            format,
        } => {
            let options = BenchOptions {
                requests,
                concurrency,
                min_salary,
                max_salary,
                min_year,
                max_year,
            };
            let report = bench::run(service.clone(), &options).await;
            match format {
                ReportFormat::Text => {
                    println!("{report}");
                    println!("Breaker state:  {}", service.breaker().state());
                }
                ReportFormat::Json => println!("{}", report.to_json()?),
            }
        }
    }

    if cli.print_metrics {
        match metrics {
            Some(handle) => println!("{}", handle.render()),
            None => tracing::warn!("Metrics disabled in configuration; nothing to print"),
        }
    }

    Ok(())
}
