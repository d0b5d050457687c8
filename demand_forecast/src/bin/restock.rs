//! # restock
//!
//! Command-line entry point: run the forecasting pipeline over a sales history,
//! or generate a synthetic history to try it on.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use demand_forecast::report::render_markdown;
use demand_forecast::utils::{synthetic_history, SyntheticProfile};
use demand_forecast::{
    run_pipeline, CsvDirectorySink, DataLoader, ForecastError, OnHandInventory, OracleKind,
    ReferenceOracle, RunConfig, RunId,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "restock")]
#[command(about = "Demand forecasting and replenishment", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forecast every eligible product and write recommendations
    Run {
        /// Sales history CSV
        #[arg(short = 'i', long)]
        history: PathBuf,

        /// On-hand inventory CSV with `product,on_hand` columns
        #[arg(long)]
        on_hand: Option<PathBuf>,

        /// JSON run configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Explicit run id (defaults to the current UTC timestamp)
        #[arg(long)]
        run_id: Option<String>,

        /// Oracle (decomposition, holt_linear, seasonal_naive)
        #[arg(long, value_parser = parse_oracle)]
        oracle: Option<OracleKind>,

        /// Worker threads (defaults to all cores)
        #[arg(short = 'j', long)]
        parallelism: Option<usize>,
    },

    /// Write a synthetic sales history and on-hand file
    Sample {
        /// Output directory
        #[arg(short, long, default_value = "sample")]
        output: PathBuf,

        /// Number of products
        #[arg(long, default_value = "8")]
        products: usize,

        /// Days of history per product
        #[arg(long, default_value = "900")]
        days: usize,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,
    },
}

fn parse_oracle(value: &str) -> Result<OracleKind, String> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map_err(|_| format!("unknown oracle '{}'", value))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("restock=info,demand_forecast=info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            history,
            on_hand,
            config,
            output,
            run_id,
            oracle,
            parallelism,
        } => run(
            &history,
            on_hand.as_deref(),
            config.as_deref(),
            &output,
            run_id,
            oracle,
            parallelism,
        ),
        Commands::Sample {
            output,
            products,
            days,
            seed,
        } => sample(&output, products, days, seed),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e @ ForecastError::NoSuccessfulSeries { .. }) => {
            error!(error = %e, "run produced no forecasts");
            ExitCode::from(2)
        }
        Err(e) => {
            error!(error = %e, "run failed");
            ExitCode::FAILURE
        }
    }
}

fn run(
    history_path: &Path,
    on_hand_path: Option<&Path>,
    config_path: Option<&Path>,
    output: &Path,
    run_id: Option<String>,
    oracle: Option<OracleKind>,
    parallelism: Option<usize>,
) -> Result<(), ForecastError> {
    let mut config = match config_path {
        Some(path) => RunConfig::from_json_file(path)?,
        None => RunConfig::default(),
    };
    if let Some(kind) = oracle {
        config.oracle = kind;
    }
    if parallelism.is_some() {
        config.parallelism = parallelism;
    }

    let run_id = match run_id {
        Some(id) => RunId::new(id)?,
        None => RunId::now(),
    };

    let history = DataLoader::from_csv(history_path, &config.columns)?;
    let inventory = match on_hand_path {
        Some(path) => OnHandInventory::from_csv(path)?,
        None => OnHandInventory::new(),
    };
    info!(
        products = history.len(),
        rows = history.row_count(),
        on_hand = inventory.len(),
        "inputs loaded"
    );

    let oracle = ReferenceOracle::from_kind(config.oracle);
    let mut sink = CsvDirectorySink::new(output)?;
    let report = run_pipeline(&history, &inventory, &oracle, &config, &mut sink, run_id)?;

    let report_path = output.join("forecast_eval.md");
    fs::write(&report_path, render_markdown(&report))?;

    println!("{}", report.summary);
    println!("Report written to {}", report_path.display());
    Ok(())
}

fn sample(output: &Path, products: usize, days: usize, seed: u64) -> Result<(), ForecastError> {
    fs::create_dir_all(output)?;

    let profiles: Vec<SyntheticProfile> = (0..products).map(|i| sample_profile(i, days)).collect();

    let start = NaiveDate::from_ymd_opt(2022, 1, 1)
        .ok_or_else(|| ForecastError::InvalidParameter("invalid start date".to_string()))?;
    let history = synthetic_history(&profiles, start, days, seed)?;

    let history_path = output.join("sales_history.csv");
    let mut writer = csv::Writer::from_path(&history_path)?;
    writer.write_record(["date", "product", "units_sold", "promo_flag"])?;
    for series in history.iter() {
        for row in &series.rows {
            let (Some(date), Some(value)) = (row.date, row.value) else {
                continue;
            };
            writer.write_record([
                date.to_string(),
                series.key.clone(),
                value.to_string(),
                row.covariate.unwrap_or(0.0).to_string(),
            ])?;
        }
    }
    writer.flush()?;

    let on_hand_path = output.join("on_hand.csv");
    let mut writer = csv::Writer::from_path(&on_hand_path)?;
    writer.write_record(["product", "on_hand"])?;
    for (i, key) in history.keys().enumerate() {
        writer.write_record([key.to_string(), (50 * (i % 4)).to_string()])?;
    }
    writer.flush()?;

    info!(
        products,
        days,
        history = %history_path.display(),
        on_hand = %on_hand_path.display(),
        "sample data written"
    );
    Ok(())
}

/// Cycle through steady growth, seasonal, promo-driven, late launch and sparse products
fn sample_profile(i: usize, days: usize) -> SyntheticProfile {
    let base = SyntheticProfile {
        noise_std: 3.0,
        ..SyntheticProfile::new(format!("SKU-{:03}", i + 1), 20.0 + 10.0 * i as f64)
    };

    match i % 5 {
        0 => SyntheticProfile {
            daily_growth: 0.02,
            ..base
        },
        1 => SyntheticProfile {
            weekly_amplitude: 8.0,
            ..base
        },
        2 => SyntheticProfile {
            weekly_amplitude: 4.0,
            promo_rate: 0.12,
            promo_lift: 1.6,
            ..base
        },
        3 => SyntheticProfile {
            launch_day: days / 2,
            ..base
        },
        _ => SyntheticProfile {
            base_level: 2.0,
            intermittency: 0.6,
            ..base
        },
    }
}
