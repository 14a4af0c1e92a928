use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use insights_core::Series;
use insights_data::{load_bars_from_csv, write_series_csv};
use insights_indicators::{compute_all, ExecutionPlan, IndicatorConfig};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "insights")]
#[command(about = "Compute RSI, ATR, MACD, moving averages and Bollinger Bands from daily OHLCV data")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute every indicator over a CSV of daily bars
    Compute {
        /// Path to CSV data file
        #[arg(short, long)]
        data: PathBuf,

        /// Indicator config (TOML); defaults are used when omitted
        #[arg(short, long, env = "INSIGHTS_CONFIG")]
        config: Option<PathBuf>,

        /// Instrument symbol to tag the output with (defaults to the file name)
        #[arg(short, long)]
        symbol: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the columns a config produces, in execution order
    Columns {
        /// Indicator config (TOML)
        #[arg(short, long, env = "INSIGHTS_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Print the default indicator config as TOML
    Defaults,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing on stderr so stdout stays clean for data
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Compute {
            data,
            config,
            symbol,
            format,
            output,
        } => run_compute(data, config, symbol, format, output)?,
        Commands::Columns { config } => {
            let config = load_config(config.as_deref())?;
            let plan = ExecutionPlan::from_config(&config)?;
            for node in plan.nodes() {
                println!("{:<10} {}", node.id(), node.output_columns().join(", "));
            }
        }
        Commands::Defaults => {
            print!("{}", IndicatorConfig::default().to_toml_string()?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<IndicatorConfig> {
    match path {
        Some(path) => IndicatorConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(IndicatorConfig::default()),
    }
}

fn run_compute(
    data_path: PathBuf,
    config_path: Option<PathBuf>,
    symbol: Option<String>,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config_path.as_deref())?;

    let symbol = symbol.unwrap_or_else(|| {
        data_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    });

    tracing::info!(
        symbol = %symbol,
        data = %data_path.display(),
        "Computing indicators"
    );

    let bars = load_bars_from_csv(&data_path)?;
    tracing::info!(bars = bars.len(), "Loaded historical data");

    let series = Series::from_bars(bars)
        .with_context(|| format!("Invalid bar data in {}", data_path.display()))?
        .with_symbol(symbol);
    let enriched = compute_all(&series, &config)?;

    let mut writer: Box<dyn Write> = match &output {
        Some(path) => Box::new(std::io::BufWriter::new(
            std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(std::io::stdout().lock()),
    };

    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, &enriched)?;
            writeln!(writer)?;
        }
        OutputFormat::Csv => write_series_csv(&enriched, &mut writer)?,
    }
    writer.flush()?;

    if let Some(path) = output {
        tracing::info!(path = %path.display(), "Wrote enriched series");
    }

    Ok(())
}
