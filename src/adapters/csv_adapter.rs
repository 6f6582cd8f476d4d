//! CSV file price history adapter.
//!
//! Two layouts are supported: a directory holding one `<SYMBOL>.csv` per
//! symbol, or one consolidated file with a `symbol` column. Columns are found
//! by header name, case-insensitively, so exports from different tools load
//! without renaming.

use crate::domain::error::ProfitHighError;
use crate::domain::price_bar::PriceBar;
use crate::ports::price_history_port::PriceHistoryPort;
use chrono::NaiveDate;
use csv::StringRecord;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const DATE_HEADERS: [&str; 3] = ["date", "datetime", "timestamp"];
const SYMBOL_HEADERS: [&str; 2] = ["symbol", "ticker"];

#[derive(Debug, Clone)]
enum CsvLayout {
    PerSymbol(PathBuf),
    Consolidated(PathBuf),
}

pub struct CsvPriceAdapter {
    layout: CsvLayout,
}

impl CsvPriceAdapter {
    pub fn per_symbol(dir: PathBuf) -> Self {
        Self {
            layout: CsvLayout::PerSymbol(dir),
        }
    }

    pub fn consolidated(file: PathBuf) -> Self {
        Self {
            layout: CsvLayout::Consolidated(file),
        }
    }

    /// Every symbol's bars from `start_date` on, grouped by symbol. A
    /// consolidated file is read once rather than once per symbol.
    pub fn fetch_all(
        &self,
        start_date: NaiveDate,
    ) -> Result<BTreeMap<String, Vec<PriceBar>>, ProfitHighError> {
        let file = match &self.layout {
            CsvLayout::PerSymbol(_) => {
                let mut all = BTreeMap::new();
                for symbol in self.list_symbols()? {
                    let bars = self.fetch_weekly(&symbol, start_date)?;
                    all.insert(symbol, bars);
                }
                return Ok(all);
            }
            CsvLayout::Consolidated(file) => file,
        };

        let (mut rdr, columns) = self.reader(file, &file.display().to_string())?;
        let idx = columns
            .symbol
            .ok_or_else(|| missing_column("symbol", file))?;

        let mut grouped: BTreeMap<String, (Vec<PriceBar>, usize)> = BTreeMap::new();
        for result in rdr.records() {
            let record = result.map_err(|e| csv_error(file, e))?;
            let Some(symbol) = record.get(idx).map(str::trim).filter(|s| !s.is_empty()) else {
                continue;
            };
            let (bars, dropped) = grouped.entry(symbol.to_string()).or_default();
            if let Some(bar) = read_row(&record, &columns, symbol, start_date, dropped) {
                bars.push(bar);
            }
        }

        Ok(grouped
            .into_iter()
            .map(|(symbol, (bars, dropped))| {
                let bars = finish(&symbol, bars, dropped, file);
                (symbol, bars)
            })
            .collect())
    }

    fn path_for(&self, symbol: &str) -> PathBuf {
        match &self.layout {
            CsvLayout::PerSymbol(dir) => dir.join(format!("{symbol}.csv")),
            CsvLayout::Consolidated(file) => file.clone(),
        }
    }

    /// Opens `path` and locates its columns. A missing file means `symbol`
    /// has no data.
    fn reader(
        &self,
        path: &Path,
        symbol: &str,
    ) -> Result<(csv::Reader<fs::File>, Columns), ProfitHighError> {
        let file = fs::File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ProfitHighError::DataUnavailable {
                symbol: symbol.to_string(),
            },
            _ => ProfitHighError::Io(e),
        })?;
        let mut rdr = csv::Reader::from_reader(file);
        let headers = rdr.headers().map_err(|e| csv_error(path, e))?.clone();
        let columns = Columns::locate(&headers, path)?;
        Ok((rdr, columns))
    }
}

fn csv_error(path: &Path, e: csv::Error) -> ProfitHighError {
    if e.is_io_error() {
        return ProfitHighError::Io(io::Error::from(e));
    }
    ProfitHighError::MalformedFile {
        reason: format!("{} in {}", e, path.display()),
    }
}

fn missing_column(column: &str, path: &Path) -> ProfitHighError {
    ProfitHighError::MalformedFile {
        reason: format!("missing {column} column in {}", path.display()),
    }
}

/// Header positions of the columns a bar is built from.
#[derive(Debug)]
struct Columns {
    date: usize,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    close: usize,
    symbol: Option<usize>,
}

impl Columns {
    fn locate(headers: &StringRecord, path: &Path) -> Result<Self, ProfitHighError> {
        Ok(Columns {
            date: find_column(headers, &DATE_HEADERS)
                .ok_or_else(|| missing_column("date", path))?,
            open: find_column(headers, &["open"]),
            high: find_column(headers, &["high"]),
            low: find_column(headers, &["low"]),
            close: find_column(headers, &["close"])
                .ok_or_else(|| missing_column("close", path))?,
            symbol: find_column(headers, &SYMBOL_HEADERS),
        })
    }
}

fn find_column(headers: &StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
}

/// Calendar date of a cell, ignoring any time-of-day or UTC offset suffix.
pub fn parse_bar_date(cell: &str) -> Option<NaiveDate> {
    let trimmed = cell.trim();
    let day = trimmed
        .split(|c: char| c == ' ' || c == 'T')
        .next()
        .unwrap_or(trimmed);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn parse_price(cell: Option<&str>) -> Option<f64> {
    cell.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Bar for one record, or `None` when it falls before `start_date` or lacks
/// a usable date or close (counted in `dropped`).
fn read_row(
    record: &StringRecord,
    columns: &Columns,
    symbol: &str,
    start_date: NaiveDate,
    dropped: &mut usize,
) -> Option<PriceBar> {
    let Some(date) = record.get(columns.date).and_then(parse_bar_date) else {
        *dropped += 1;
        return None;
    };
    if date < start_date {
        return None;
    }
    let Some(close) = parse_price(record.get(columns.close)) else {
        *dropped += 1;
        return None;
    };

    Some(PriceBar {
        symbol: symbol.to_string(),
        date,
        open: columns.open.and_then(|i| parse_price(record.get(i))),
        high: columns.high.and_then(|i| parse_price(record.get(i))),
        low: columns.low.and_then(|i| parse_price(record.get(i))),
        close,
    })
}

fn finish(symbol: &str, mut bars: Vec<PriceBar>, dropped: usize, path: &Path) -> Vec<PriceBar> {
    if dropped > 0 {
        warn!(symbol, dropped, "dropped rows without a usable date or close");
    }
    bars.sort_by_key(|b| b.date);
    bars.dedup_by_key(|b| b.date);
    debug!(symbol, bars = bars.len(), path = %path.display(), "read csv prices");
    bars
}

impl PriceHistoryPort for CsvPriceAdapter {
    fn fetch_weekly(
        &self,
        symbol: &str,
        start_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, ProfitHighError> {
        let path = self.path_for(symbol);
        let (mut rdr, columns) = self.reader(&path, symbol)?;

        let symbol_filter = match (&self.layout, columns.symbol) {
            (CsvLayout::Consolidated(_), Some(idx)) => Some(idx),
            (CsvLayout::Consolidated(_), None) => return Err(missing_column("symbol", &path)),
            (CsvLayout::PerSymbol(_), _) => None,
        };

        let mut bars = Vec::new();
        let mut dropped = 0usize;

        for result in rdr.records() {
            let record = result.map_err(|e| csv_error(&path, e))?;

            if let Some(idx) = symbol_filter {
                if record.get(idx).map(str::trim) != Some(symbol) {
                    continue;
                }
            }

            if let Some(bar) = read_row(&record, &columns, symbol, start_date, &mut dropped) {
                bars.push(bar);
            }
        }

        Ok(finish(symbol, bars, dropped, &path))
    }

    fn list_symbols(&self) -> Result<Vec<String>, ProfitHighError> {
        match &self.layout {
            CsvLayout::PerSymbol(dir) => {
                let mut symbols = Vec::new();
                for entry in fs::read_dir(dir)? {
                    let path = entry?.path();
                    let is_csv = path
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
                    if let (true, Some(stem)) = (is_csv, path.file_stem()) {
                        symbols.push(stem.to_string_lossy().into_owned());
                    }
                }
                symbols.sort();
                Ok(symbols)
            }
            CsvLayout::Consolidated(file) => {
                let (mut rdr, columns) = self.reader(file, &file.display().to_string())?;
                let idx = columns
                    .symbol
                    .ok_or_else(|| missing_column("symbol", file))?;

                let mut symbols = BTreeSet::new();
                for result in rdr.records() {
                    let record = result.map_err(|e| csv_error(file, e))?;
                    if let Some(s) = record.get(idx).map(str::trim).filter(|s| !s.is_empty()) {
                        symbols.insert(s.to_string());
                    }
                }
                Ok(symbols.into_iter().collect())
            }
        }
    }
}
