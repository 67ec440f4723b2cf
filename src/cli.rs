//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use crate::adapters::csv_adapter::{self, CsvAdapter};
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{parse_optional_date, validate_config, validate_data_source};
use crate::domain::error::ShinneError;
use crate::domain::new_price::{
    generate_new_price_chart, NewPriceChart, NewPriceConfig, DEFAULT_LENGTH,
};
use crate::domain::summary::ChartSummary;
use crate::domain::trend::Trend;
use crate::domain::universe::parse_symbols;
use crate::domain::validation::validate_daily_bars;
use crate::logger::warn_if_slow;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

const SLOW_SYMBOL: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(name = "shinneashi", about = "New price bar (Shin-ne-ashi) chart generator")]
pub struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate new price bars and reversals for the configured symbols
    Generate {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        length: Option<usize>,
        #[arg(long)]
        initial_trend: Option<Trend>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Compute and summarize without writing files
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols available in the configured data source
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show data range for symbol(s)
    Info {
        #[arg(long)]
        symbol: Option<String>,
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Load a CSV file of daily bars into the SQLite store
    Import {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        file: PathBuf,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    Csv { dir: PathBuf },
    Sqlite,
}

/// Fully resolved run parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub source: DataSource,
    pub symbols: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub chart: NewPriceConfig,
    pub output_dir: PathBuf,
    pub dated_subdir: bool,
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub symbol: Option<String>,
    pub length: Option<usize>,
    pub initial_trend: Option<Trend>,
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct SymbolReport {
    pub symbol: String,
    pub summary: ChartSummary,
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub reports: Vec<SymbolReport>,
    pub skipped: Vec<SkippedSymbol>,
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Generate {
            config,
            symbol,
            length,
            initial_trend,
            output,
            dry_run,
        } => run_generate(
            &config,
            Overrides {
                symbol,
                length,
                initial_trend,
                output,
            },
            dry_run,
        ),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { config } => run_list_symbols(&config),
        Command::Info { symbol, config } => run_info(symbol.as_deref(), &config),
        Command::Import {
            config,
            symbol,
            file,
        } => run_import(&config, &symbol, &file),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ShinneError> {
    tracing::info!("Loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

pub fn resolve_data_source(config: &dyn ConfigPort) -> Result<DataSource, ShinneError> {
    validate_data_source(config)?;
    let source = config.get_string_or("data", "source", "csv").to_lowercase();
    if source == "sqlite" {
        Ok(DataSource::Sqlite)
    } else {
        Ok(DataSource::Csv {
            dir: PathBuf::from(config.get_string_or("data", "csv_dir", "data")),
        })
    }
}

pub fn build_settings(config: &dyn ConfigPort) -> Result<Settings, ShinneError> {
    validate_config(config)?;

    let symbols_str = config.get_string_or("data", "symbols", "");
    let symbols = parse_symbols(&symbols_str).map_err(|e| ShinneError::ConfigInvalid {
        section: "data".into(),
        key: "symbols".into(),
        reason: e.to_string(),
    })?;

    let initial_trend = match config.get_string("chart", "initial_trend") {
        Some(raw) => raw
            .parse::<Trend>()
            .map_err(|e| ShinneError::ConfigInvalid {
                section: "chart".into(),
                key: "initial_trend".into(),
                reason: e.to_string(),
            })?,
        None => Trend::default(),
    };
    let length = config.get_int("chart", "length", DEFAULT_LENGTH as i64) as usize;

    Ok(Settings {
        source: resolve_data_source(config)?,
        symbols,
        start_date: parse_optional_date(config, "start_date")?,
        end_date: parse_optional_date(config, "end_date")?,
        chart: chart_config(length, initial_trend)?,
        output_dir: PathBuf::from(config.get_string_or("report", "output_dir", ".")),
        dated_subdir: config.get_bool("report", "dated_subdir", true),
    })
}

fn chart_config(length: usize, initial_trend: Trend) -> Result<NewPriceConfig, ShinneError> {
    NewPriceConfig::new(length, initial_trend).map_err(|e| ShinneError::ConfigInvalid {
        section: "chart".into(),
        key: "length".into(),
        reason: e.to_string(),
    })
}

pub fn apply_overrides(
    mut settings: Settings,
    overrides: &Overrides,
) -> Result<Settings, ShinneError> {
    if let Some(symbol) = &overrides.symbol {
        settings.symbols = vec![symbol.trim().to_uppercase()];
    }
    if overrides.length.is_some() || overrides.initial_trend.is_some() {
        settings.chart = chart_config(
            overrides.length.unwrap_or(settings.chart.length),
            overrides.initial_trend.unwrap_or(settings.chart.initial_trend),
        )?;
    }
    if let Some(output) = &overrides.output {
        settings.output_dir = output.clone();
    }
    Ok(settings)
}

/// `<output_dir>/<YYYYMMDD>` when dated subdirectories are enabled.
pub fn resolve_output_dir(settings: &Settings, today: NaiveDate) -> PathBuf {
    if settings.dated_subdir {
        settings.output_dir.join(today.format("%Y%m%d").to_string())
    } else {
        settings.output_dir.clone()
    }
}

pub fn open_data_port(
    source: &DataSource,
    config: &dyn ConfigPort,
) -> Result<Box<dyn DataPort + Send + Sync>, ShinneError> {
    match source {
        DataSource::Csv { dir } => Ok(Box::new(CsvAdapter::new(dir.clone()))),
        DataSource::Sqlite => {
            let adapter = open_sqlite(config)?;
            Ok(Box::new(adapter))
        }
    }
}

#[cfg(feature = "sqlite")]
fn open_sqlite(
    config: &dyn ConfigPort,
) -> Result<crate::adapters::sqlite_adapter::SqliteAdapter, ShinneError> {
    let adapter = crate::adapters::sqlite_adapter::SqliteAdapter::from_config(config)?;
    adapter.initialize_schema()?;
    Ok(adapter)
}

#[cfg(not(feature = "sqlite"))]
fn open_sqlite(_config: &dyn ConfigPort) -> Result<CsvAdapter, ShinneError> {
    Err(ShinneError::ConfigInvalid {
        section: "data".into(),
        key: "source".into(),
        reason: "sqlite feature is required".into(),
    })
}

/// Fetch, validate and generate the chart for one symbol.
pub fn build_chart(
    data_port: &(dyn DataPort + Sync),
    symbol: &str,
    settings: &Settings,
) -> Result<NewPriceChart, ShinneError> {
    let bars = data_port.fetch_daily_bars(symbol, settings.start_date, settings.end_date)?;
    if bars.is_empty() {
        return Err(ShinneError::NoData {
            symbol: symbol.to_string(),
        });
    }
    let chart = generate_new_price_chart(&bars, &settings.chart)
        .map_err(|e| ShinneError::invalid_input(symbol, e))?;
    tracing::debug!(
        symbol,
        daily_bars = bars.len(),
        new_price_bars = chart.bars.len(),
        reversals = chart.reversals.len(),
        "chart generated"
    );
    Ok(chart)
}

/// Builds every symbol's chart in parallel; results keep the symbol order.
pub fn build_charts(
    data_port: &(dyn DataPort + Sync),
    settings: &Settings,
) -> Vec<(String, Result<NewPriceChart, ShinneError>)> {
    settings
        .symbols
        .par_iter()
        .map(|symbol| {
            let chart = warn_if_slow(symbol, SLOW_SYMBOL, || {
                build_chart(data_port, symbol, settings)
            });
            (symbol.clone(), chart)
        })
        .collect()
}

/// Runs the generation pipeline. Symbols whose data cannot be fetched or
/// validated are skipped with a warning; failing every symbol is an error.
/// With no report port nothing is written.
pub fn run_generate_pipeline(
    data_port: &(dyn DataPort + Sync),
    report_port: Option<&dyn ReportPort>,
    settings: &Settings,
    output_dir: &Path,
) -> Result<PipelineOutcome, ShinneError> {
    tracing::info!(
        "Generating new price charts: {} symbols, length {}, initial trend {}",
        settings.symbols.len(),
        settings.chart.length,
        settings.chart.initial_trend
    );

    let mut reports = Vec::new();
    let mut skipped = Vec::new();

    for (symbol, result) in build_charts(data_port, settings) {
        let chart = match result {
            Ok(chart) => chart,
            Err(e) => {
                tracing::warn!("skipping {} ({})", symbol, e);
                skipped.push(SkippedSymbol {
                    symbol,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let Some(summary) = ChartSummary::from_chart(&chart) else {
            skipped.push(SkippedSymbol {
                reason: "empty chart".into(),
                symbol,
            });
            continue;
        };

        let files = match report_port {
            Some(port) => port.write(&symbol, &chart, output_dir)?,
            None => Vec::new(),
        };
        for file in &files {
            tracing::info!("{}: wrote {}", symbol, file.display());
        }

        reports.push(SymbolReport {
            symbol,
            summary,
            files,
        });
    }

    if reports.is_empty() {
        return Err(ShinneError::NoData {
            symbol: "all symbols".into(),
        });
    }
    if !skipped.is_empty() {
        tracing::warn!(
            "Generated {} of {} symbols",
            reports.len(),
            reports.len() + skipped.len()
        );
    }

    Ok(PipelineOutcome { reports, skipped })
}

fn run_generate(
    config_path: &Path,
    overrides: Overrides,
    dry_run: bool,
) -> Result<(), ShinneError> {
    let config = load_config(config_path)?;
    let settings = apply_overrides(build_settings(&config)?, &overrides)?;
    let data_port = open_data_port(&settings.source, &config)?;

    let output_dir = resolve_output_dir(&settings, chrono::Local::now().date_naive());
    let report_port = CsvReportAdapter;
    let report_port: Option<&dyn ReportPort> = if dry_run {
        tracing::info!("Dry run: no files will be written");
        None
    } else {
        Some(&report_port)
    };

    let outcome = run_generate_pipeline(data_port.as_ref(), report_port, &settings, &output_dir)?;

    for report in &outcome.reports {
        println!("{}: {}", report.symbol, report.summary);
    }
    if !dry_run {
        tracing::info!("Reports written to: {}", output_dir.display());
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), ShinneError> {
    let config = load_config(config_path)?;
    let settings = build_settings(&config)?;

    println!("Configuration is valid.");
    match &settings.source {
        DataSource::Csv { dir } => println!("  source:        csv ({})", dir.display()),
        DataSource::Sqlite => println!(
            "  source:        sqlite ({})",
            config.get_string_or("sqlite", "path", "")
        ),
    }
    println!("  symbols:       {}", settings.symbols.join(", "));
    println!(
        "  date range:    {} to {}",
        settings
            .start_date
            .map_or_else(|| "start".to_string(), |d| d.to_string()),
        settings
            .end_date
            .map_or_else(|| "end".to_string(), |d| d.to_string())
    );
    println!("  length:        {}", settings.chart.length);
    println!("  initial trend: {}", settings.chart.initial_trend);
    println!(
        "  output:        {}{}",
        settings.output_dir.display(),
        if settings.dated_subdir { "/<YYYYMMDD>" } else { "" }
    );
    Ok(())
}

fn run_list_symbols(config_path: &Path) -> Result<(), ShinneError> {
    let config = load_config(config_path)?;
    let source = resolve_data_source(&config)?;
    let data_port = open_data_port(&source, &config)?;

    let symbols = data_port.list_symbols()?;
    if symbols.is_empty() {
        tracing::warn!("No symbols found");
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        tracing::info!("{} symbols found", symbols.len());
    }
    Ok(())
}

/// Symbols for `info`: the override, else the configured list, else everything
/// the data source holds.
pub fn resolve_info_symbols(
    symbol_override: Option<&str>,
    config: &dyn ConfigPort,
    data_port: &dyn DataPort,
) -> Result<Vec<String>, ShinneError> {
    if let Some(s) = symbol_override {
        return Ok(vec![s.trim().to_uppercase()]);
    }
    let configured = config.get_string_or("data", "symbols", "");
    if !configured.is_empty() {
        return parse_symbols(&configured).map_err(|e| ShinneError::ConfigInvalid {
            section: "data".into(),
            key: "symbols".into(),
            reason: e.to_string(),
        });
    }
    data_port.list_symbols()
}

fn run_info(symbol: Option<&str>, config_path: &Path) -> Result<(), ShinneError> {
    let config = load_config(config_path)?;
    let source = resolve_data_source(&config)?;
    let data_port = open_data_port(&source, &config)?;

    for s in resolve_info_symbols(symbol, &config, data_port.as_ref())? {
        match data_port.get_data_range(&s) {
            Ok(Some((min_date, max_date, count))) => {
                println!("{}: {} bars, {} to {}", s, count, min_date, max_date);
            }
            Ok(None) => tracing::warn!("{}: no data found", s),
            Err(e) => tracing::error!("error querying {}: {}", s, e),
        }
    }
    Ok(())
}

fn run_import(config_path: &Path, symbol: &str, file: &Path) -> Result<(), ShinneError> {
    let config = load_config(config_path)?;
    if resolve_data_source(&config)? != DataSource::Sqlite {
        return Err(ShinneError::ConfigInvalid {
            section: "data".into(),
            key: "source".into(),
            reason: "import requires source = sqlite".into(),
        });
    }

    let symbol = symbol.trim().to_uppercase();
    let bars = csv_adapter::read_bars(file, None, None)?;
    validate_daily_bars(&bars).map_err(|e| ShinneError::invalid_input(&symbol, e))?;

    import_bars(&config, &symbol, &bars)
}

#[cfg(feature = "sqlite")]
fn import_bars(
    config: &dyn ConfigPort,
    symbol: &str,
    bars: &[crate::domain::ohlcv::DailyBar],
) -> Result<(), ShinneError> {
    let adapter = open_sqlite(config)?;
    let count = adapter.insert_bars(symbol, bars)?;
    println!("{}: imported {} bars", symbol, count);
    Ok(())
}

#[cfg(not(feature = "sqlite"))]
fn import_bars(
    config: &dyn ConfigPort,
    _symbol: &str,
    _bars: &[crate::domain::ohlcv::DailyBar],
) -> Result<(), ShinneError> {
    open_sqlite(config).map(|_| ())
}
