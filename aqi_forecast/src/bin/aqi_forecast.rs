//! Command-line front end for the division AQI forecaster.

use anyhow::Context;
use aqi_forecast::config::LogFormat;
use aqi_forecast::{logging, AppConfig, ErrorCategory, ForecastError, ForecastService};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

#[derive(Parser)]
#[command(name = "aqi-forecast", version = aqi_forecast::VERSION)]
#[command(about = "7-day AQI forecasts for Bangladesh divisions", long_about = None)]
struct Cli {
    /// CSV export of the AQI sheet (overrides AQI_DATA_PATH)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Directory of per-division model files (overrides AQI_MODELS_DIR)
    #[arg(long, global = true)]
    models: Option<PathBuf>,

    /// Log output format: text or json (overrides AQI_LOG_FORMAT)
    #[arg(long, global = true)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List divisions with a loaded model
    Health,

    /// Forecast one division
    Predict {
        /// Division name, e.g. Dhaka
        #[arg(short, long)]
        division: String,
    },

    /// Forecast every division with a model
    PredictAll,
}

#[derive(Serialize)]
struct ErrorBody {
    status: u16,
    detail: String,
}

#[derive(Serialize)]
#[serde(untagged)]
enum DivisionOutcome {
    Ok(aqi_forecast::ForecastResponse),
    Err { division: aqi_forecast::Division, error: ErrorBody },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let category = err
                .downcast_ref::<ForecastError>()
                .map(ForecastError::category);
            let body = ErrorBody {
                status: category.map_or(500, |c| c.status_code()),
                detail: format!("{:#}", err),
            };
            if let Ok(json) = serde_json::to_string_pretty(&body) {
                println!("{}", json);
            }
            match category {
                Some(ErrorCategory::Validation) => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = AppConfig::from_env()?;
    if let Some(data) = cli.data {
        config.data_path = data;
    }
    if let Some(models) = cli.models {
        config.models_dir = models;
    }
    if let Some(format) = cli.log_format {
        config.log_format = format.parse::<LogFormat>()?;
    }
    logging::init(config.log_format);
    info!(
        crate_name = aqi_forecast::NAME,
        version = aqi_forecast::VERSION,
        data = %config.data_path.display(),
        "starting"
    );

    let service = ForecastService::from_config(&config)
        .with_context(|| format!("loading models from {}", config.models_dir.display()))?;

    match cli.command {
        Commands::Health => print_json(&service.health()),
        Commands::Predict { division } => {
            let response = service.predict(&division)?;
            print_json(&response)
        }
        Commands::PredictAll => {
            let outcomes: Vec<DivisionOutcome> = service
                .predict_all()?
                .into_iter()
                .map(|(division, result)| match result {
                    Ok(response) => DivisionOutcome::Ok(response),
                    Err(e) => DivisionOutcome::Err {
                        division,
                        error: ErrorBody {
                            status: e.category().status_code(),
                            detail: e.to_string(),
                        },
                    },
                })
                .collect();
            print_json(&outcomes)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
