//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use crate::adapters::csv_adapter::CsvPriceAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::retrying_adapter::RetryingPriceSource;
use crate::adapters::universe_csv_adapter::CsvUniverseAdapter;
use crate::domain::batch::{SymbolFailure, backtest_universe, scan_universe};
use crate::domain::config_validation::{validate_run_config, validate_scan_config};
use crate::domain::error::ProfitHighError;
use crate::domain::indicator::{PROFIT_HIGH_MULTIPLIER, compute_indicator};
use crate::domain::metrics::TradeSummary;
use crate::domain::ranking::SortBucket;
use crate::domain::run_config::{
    Backoff, DEFAULT_BACKOFF_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_WORKERS, RetryPolicy, RunConfig,
    SourceKind,
};
use crate::domain::signal::DEFAULT_APPROACH_THRESHOLD;
use crate::domain::universe::{
    DEFAULT_SYMBOL_SUFFIX, Instrument, SkipReason, UniverseResolution, default_start_date,
    format_symbol, resolve_universe,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::price_history_port::PriceHistoryPort;
use crate::ports::report_port::ReportPort;
use crate::ports::universe_port::UniversePort;

/// Price source selected at runtime, wrapped in the configured retry policy.
pub type PriceSource = RetryingPriceSource<Box<dyn PriceHistoryPort + Send + Sync>>;

#[derive(Parser, Debug)]
#[command(name = "profithigh", about = "PROFITHIGH1 breakout scanner")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan the symbol list for PROFITHIGH1 breakouts
    Scan {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Override [signals] approach_threshold
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Buy-and-hold backtest from the first PROFITHIGH1 breakout
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write one symbol's weekly bars with PROFITHIGH1
    Indicator {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        start: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Load a consolidated price CSV into the SQLite store
    #[cfg(feature = "sqlite")]
    Import {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Scan {
            config,
            output,
            threshold,
        } => run_scan(&config, output.as_deref(), threshold),
        Command::Backtest { config, output } => run_backtest(&config, output.as_deref()),
        Command::Indicator {
            config,
            symbol,
            start,
            output,
        } => run_indicator(&config, &symbol, start.as_deref(), output.as_deref()),
        #[cfg(feature = "sqlite")]
        Command::Import { config, input } => run_import(&config, &input),
        Command::Validate { config } => run_validate(&config),
    }
}

fn fail(e: ProfitHighError) -> ExitCode {
    eprintln!("error: {e}");
    (&e).into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(fail)
}

fn invalid(section: &str, key: &str, reason: &str) -> ProfitHighError {
    ProfitHighError::ConfigInvalid {
        section: section.into(),
        key: key.into(),
        reason: reason.into(),
    }
}

pub fn build_run_config(config: &dyn ConfigPort) -> Result<RunConfig, ProfitHighError> {
    let source_str = config
        .get_non_empty("data", "source")
        .unwrap_or_else(|| "csv".to_string());
    let source = SourceKind::parse(&source_str)
        .ok_or_else(|| invalid("data", "source", "source must be csv or sqlite"))?;

    let default_start = match config.get_non_empty("universe", "default_start_date") {
        Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|_| {
            invalid(
                "universe",
                "default_start_date",
                "invalid date format (expected YYYY-MM-DD)",
            )
        })?,
        None => default_start_date(),
    };

    let backoff = match config.get_non_empty("fetch", "backoff") {
        Some(s) => Backoff::parse(&s)
            .ok_or_else(|| invalid("fetch", "backoff", "backoff must be fixed or exponential"))?,
        None => Backoff::Fixed,
    };

    let workers = config.get_int("signals", "workers", DEFAULT_WORKERS as i64);
    let max_attempts = config.get_int("fetch", "max_attempts", DEFAULT_MAX_ATTEMPTS as i64);
    let backoff_ms = config.get_int("fetch", "backoff_ms", DEFAULT_BACKOFF_MS as i64);

    Ok(RunConfig {
        source,
        multiplier: config.get_double("signals", "multiplier", PROFIT_HIGH_MULTIPLIER),
        approach_threshold: config.get_double(
            "signals",
            "approach_threshold",
            DEFAULT_APPROACH_THRESHOLD,
        ),
        symbol_suffix: config
            .get_string("universe", "symbol_suffix")
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| DEFAULT_SYMBOL_SUFFIX.to_string()),
        default_start_date: default_start,
        workers: workers.max(1) as usize,
        retry: RetryPolicy {
            max_attempts: max_attempts.clamp(1, u32::MAX as i64) as u32,
            backoff,
            base_delay: Duration::from_millis(backoff_ms.max(0) as u64),
        },
    })
}

pub fn build_price_source(
    config: &dyn ConfigPort,
    run_config: &RunConfig,
) -> Result<PriceSource, ProfitHighError> {
    let inner: Box<dyn PriceHistoryPort + Send + Sync> = match run_config.source {
        SourceKind::Csv => {
            if let Some(file) = config.get_non_empty("data", "prices_file") {
                Box::new(CsvPriceAdapter::consolidated(PathBuf::from(file)))
            } else {
                let dir = config.get_non_empty("data", "price_dir").ok_or_else(|| {
                    ProfitHighError::ConfigMissing {
                        section: "data".into(),
                        key: "price_dir".into(),
                    }
                })?;
                Box::new(CsvPriceAdapter::per_symbol(PathBuf::from(dir)))
            }
        }
        #[cfg(feature = "sqlite")]
        SourceKind::Sqlite => {
            use crate::adapters::sqlite_adapter::SqlitePriceAdapter;
            Box::new(SqlitePriceAdapter::from_config(config)?)
        }
        #[cfg(not(feature = "sqlite"))]
        SourceKind::Sqlite => {
            return Err(invalid(
                "data",
                "source",
                "sqlite feature is required for source = sqlite",
            ));
        }
    };
    Ok(RetryingPriceSource::new(inner, run_config.retry))
}

pub fn load_universe(
    config: &dyn ConfigPort,
    run_config: &RunConfig,
) -> Result<UniverseResolution, ProfitHighError> {
    let file = config
        .get_non_empty("universe", "file")
        .ok_or_else(|| ProfitHighError::ConfigMissing {
            section: "universe".into(),
            key: "file".into(),
        })?;
    let entries = CsvUniverseAdapter::new(PathBuf::from(file)).load_entries()?;
    Ok(resolve_universe(
        &entries,
        &run_config.symbol_suffix,
        run_config.default_start_date,
    ))
}

fn output_path(cli: Option<&Path>, config: &dyn ConfigPort, key: &str, fallback: &str) -> PathBuf {
    cli.map(Path::to_path_buf)
        .or_else(|| config.get_non_empty("output", key).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(fallback))
}

fn print_universe_skips(resolution: &UniverseResolution) {
    for skip in &resolution.skipped {
        match &skip.reason {
            SkipReason::BlankSymbol => eprintln!("  row {}: no symbol", skip.row + 1),
            SkipReason::Duplicate(symbol) => {
                eprintln!("  row {}: duplicate {}", skip.row + 1, symbol)
            }
        }
    }
    for cell in &resolution.malformed_dates {
        eprintln!("  {}: unreadable date {:?}", cell.symbol, cell.value);
    }
}

fn print_failures(failures: &[SymbolFailure]) {
    if failures.is_empty() {
        return;
    }
    eprintln!("\nSkipped symbols ({}):", failures.len());
    for failure in failures {
        eprintln!("  {}: {}", failure.symbol, failure.error);
    }
}

fn run_scan(config_path: &Path, output: Option<&Path>, threshold: Option<f64>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_scan_config(&adapter) {
        return fail(e);
    }

    let mut run_config = match build_run_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    if let Some(t) = threshold {
        if !(0.0..1.0).contains(&t) {
            return fail(invalid(
                "signals",
                "approach_threshold",
                "threshold must be between 0 and 1",
            ));
        }
        run_config.approach_threshold = t;
    }

    let resolution = match load_universe(&adapter, &run_config) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };
    eprintln!(
        "Universe: {} symbols ({} rows skipped)",
        resolution.universe.count(),
        resolution.skipped.len()
    );
    print_universe_skips(&resolution);

    let source = match build_price_source(&adapter, &run_config) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    eprintln!(
        "Scanning with multiplier {} and approach threshold {:.1}%...",
        run_config.multiplier,
        run_config.approach_threshold * 100.0
    );
    let report = scan_universe(&source, &resolution.universe.instruments, &run_config);
    let ranked = &report.ranked;

    eprintln!("\n=== Scan Results ===");
    eprintln!(
        "Approaching:       {}",
        ranked.count_in(SortBucket::Approaching)
    );
    eprintln!("Formed:            {}", ranked.count_in(SortBucket::Formed));
    eprintln!(
        "Not yet formed:    {}",
        ranked.count_in(SortBucket::NotYetFormed)
    );
    eprintln!("Crossed:           {}", ranked.count_in(SortBucket::Crossed));
    print_failures(&report.failures);

    let path = output_path(output, &adapter, "signals_path", "signals.csv");
    if let Err(e) = CsvReportAdapter::new().write_signals(&ranked.rows, &path) {
        return fail(e);
    }
    eprintln!("\nSignals written to: {}", path.display());
    ExitCode::SUCCESS
}

/// Universe instruments when a symbol list is configured, otherwise every
/// symbol the source holds with its full history.
fn backtest_instruments(
    config: &dyn ConfigPort,
    run_config: &RunConfig,
    source: &PriceSource,
) -> Result<Vec<Instrument>, ProfitHighError> {
    if config.get_non_empty("universe", "file").is_some() {
        let resolution = load_universe(config, run_config)?;
        print_universe_skips(&resolution);
        return Ok(resolution.universe.instruments);
    }

    Ok(source
        .list_symbols()?
        .into_iter()
        .map(|symbol| Instrument {
            symbol,
            valid_start_date: NaiveDate::MIN,
        })
        .collect())
}

fn run_backtest(config_path: &Path, output: Option<&Path>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_run_config(&adapter) {
        return fail(e);
    }
    let run_config = match build_run_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let source = match build_price_source(&adapter, &run_config) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let instruments = match backtest_instruments(&adapter, &run_config, &source) {
        Ok(i) => i,
        Err(e) => return fail(e),
    };
    if instruments.is_empty() {
        eprintln!("error: no symbols to backtest");
        return ExitCode::from(5);
    }

    eprintln!("Running backtest over {} symbols...", instruments.len());
    let report = backtest_universe(&source, &instruments, &run_config);
    let summary = TradeSummary::compute(&report.trades);

    eprintln!("\n=== Backtest Results ===");
    eprintln!("Total Trades:     {}", summary.total_trades);
    eprintln!("Winners:          {}", summary.winners);
    eprintln!("Losers:           {}", summary.losers);
    eprintln!("Win Rate:         {:.1}%", summary.win_rate * 100.0);
    eprintln!("Average Profit:   {:.2}%", summary.avg_profit_pct);
    eprintln!("Total Profit:     {:.2}%", summary.total_profit_pct);
    if let Some((symbol, pct)) = &summary.best {
        eprintln!("Best Trade:       {symbol} ({pct:.2}%)");
    }
    if let Some((symbol, pct)) = &summary.worst {
        eprintln!("Worst Trade:      {symbol} ({pct:.2}%)");
    }
    eprintln!("No Signal:        {}", report.no_signal.len());
    print_failures(&report.failures);

    let path = output_path(output, &adapter, "trades_path", "trades.csv");
    if let Err(e) = CsvReportAdapter::new().write_trades(&report.trades, &path) {
        return fail(e);
    }
    eprintln!("\nTrades written to: {}", path.display());
    ExitCode::SUCCESS
}

fn run_indicator(
    config_path: &Path,
    symbol: &str,
    start: Option<&str>,
    output: Option<&Path>,
) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_run_config(&adapter) {
        return fail(e);
    }
    let run_config = match build_run_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    let start_date = match start {
        Some(s) => match NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d") {
            Ok(d) => d,
            Err(_) => {
                return fail(ProfitHighError::MalformedDate {
                    value: s.to_string(),
                });
            }
        },
        None => NaiveDate::MIN,
    };

    let source = match build_price_source(&adapter, &run_config) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    let symbol = format_symbol(symbol, &run_config.symbol_suffix);
    let bars = match source.fetch_weekly(&symbol, start_date) {
        Ok(b) if b.is_empty() => {
            return fail(ProfitHighError::DataUnavailable { symbol });
        }
        Ok(b) => b,
        Err(e) => return fail(e),
    };

    let series = compute_indicator(&bars, run_config.multiplier);
    let formed = series.iter().filter(|p| p.profit_high1.is_some()).count();
    eprintln!(
        "{}: {} weeks, PROFITHIGH1 formed on {}",
        symbol,
        series.len(),
        formed
    );

    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(format!("{symbol}_profithigh.csv")));
    if let Err(e) = CsvReportAdapter::new().write_indicator(&series, &path) {
        return fail(e);
    }
    eprintln!("Series written to: {}", path.display());
    ExitCode::SUCCESS
}

#[cfg(feature = "sqlite")]
fn run_import(config_path: &Path, input: &Path) -> ExitCode {
    use crate::adapters::sqlite_adapter::SqlitePriceAdapter;

    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let store = match SqlitePriceAdapter::from_config(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    if let Err(e) = store.initialize_schema() {
        return fail(e);
    }

    let csv = CsvPriceAdapter::consolidated(input.to_path_buf());
    let by_symbol = match csv.fetch_all(NaiveDate::MIN) {
        Ok(b) => b,
        Err(e) => return fail(e),
    };

    let mut total = 0usize;
    for (symbol, bars) in &by_symbol {
        match store.insert_bars(bars) {
            Ok(n) => total += n,
            Err(e) => return fail(e),
        }
        match store.data_range(symbol) {
            Ok(Some((first, last, count))) => {
                eprintln!("  {symbol}: {count} bars stored, {first} to {last}")
            }
            Ok(None) => eprintln!("  {symbol}: no bars stored"),
            Err(e) => return fail(e),
        }
    }

    eprintln!(
        "Imported {} bars for {} symbols from {}",
        total,
        by_symbol.len(),
        input.display()
    );
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_run_config(&adapter) {
        return fail(e);
    }
    let run_config = match build_run_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    eprintln!("\nRun configuration:");
    eprintln!("  source:             {}", run_config.source);
    eprintln!("  multiplier:         {}", run_config.multiplier);
    eprintln!("  approach threshold: {}", run_config.approach_threshold);
    eprintln!("  symbol suffix:      {:?}", run_config.symbol_suffix);
    eprintln!("  default start date: {}", run_config.default_start_date);
    eprintln!("  workers:            {}", run_config.workers);
    eprintln!(
        "  fetch attempts:     {} ({:?}, {} ms)",
        run_config.retry.max_attempts,
        run_config.retry.backoff,
        run_config.retry.base_delay.as_millis()
    );

    if adapter.get_non_empty("universe", "file").is_some() {
        match load_universe(&adapter, &run_config) {
            Ok(resolution) => {
                eprintln!(
                    "\nUniverse: {} symbols ({} rows skipped, {} unreadable dates)",
                    resolution.universe.count(),
                    resolution.skipped.len(),
                    resolution.malformed_dates.len()
                );
                print_universe_skips(&resolution);
            }
            Err(e) => return fail(e),
        }
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}
