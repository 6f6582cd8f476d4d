//! Symbol universe resolution.
//!
//! Turns raw list rows into fetchable instruments: the market suffix is
//! appended to bare symbols and each row gets a start date from its open
//! date, its listing date, or the configured default, in that order.

use crate::domain::error::ProfitHighError;
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::warn;

pub const DEFAULT_SYMBOL_SUFFIX: &str = ".NS";

/// Accepted date spellings, e.g. "Nov 16, 2022" and "2022-11-16".
const DATE_FORMATS: [&str; 2] = ["%b %d, %Y", "%Y-%m-%d"];

pub fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// One row of the symbol list as read from disk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniverseEntry {
    pub raw_symbol: String,
    pub listing_date: Option<String>,
    pub open_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instrument {
    pub symbol: String,
    pub valid_start_date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct Universe {
    pub instruments: Vec<Instrument>,
}

impl Universe {
    pub fn count(&self) -> usize {
        self.instruments.len()
    }
}

#[derive(Debug, Clone)]
pub struct SkippedEntry {
    pub row: usize,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    BlankSymbol,
    Duplicate(String),
}

/// A date cell that could not be parsed and was ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct MalformedDateCell {
    pub symbol: String,
    pub value: String,
}

pub struct UniverseResolution {
    pub universe: Universe,
    pub skipped: Vec<SkippedEntry>,
    pub malformed_dates: Vec<MalformedDateCell>,
}

/// Exchange symbol for a list cell: surrounding whitespace is trimmed and
/// `suffix` appended unless already present. Case is left as written, since
/// price files are looked up by exact symbol.
pub fn format_symbol(raw: &str, suffix: &str) -> String {
    let trimmed = raw.trim();
    if suffix.is_empty() || trimmed.ends_with(suffix) {
        trimmed.to_string()
    } else {
        format!("{trimmed}{suffix}")
    }
}

/// Parses a list date in any accepted spelling.
pub fn parse_list_date(value: &str) -> Result<NaiveDate, ProfitHighError> {
    let trimmed = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| ProfitHighError::MalformedDate {
            value: value.to_string(),
        })
}

/// open date, else listing date, else `default`. Unparseable cells count as
/// absent and are reported through `malformed`.
pub fn resolve_start_date(
    entry: &UniverseEntry,
    symbol: &str,
    default: NaiveDate,
    malformed: &mut Vec<MalformedDateCell>,
) -> NaiveDate {
    let mut parse = |cell: &Option<String>| -> Option<NaiveDate> {
        let value = cell.as_deref().map(str::trim).filter(|v| !v.is_empty())?;
        match parse_list_date(value) {
            Ok(date) => Some(date),
            Err(e) => {
                warn!(symbol, error = %e, "ignoring start date");
                malformed.push(MalformedDateCell {
                    symbol: symbol.to_string(),
                    value: value.to_string(),
                });
                None
            }
        }
    };

    let open = parse(&entry.open_date);
    let listing = parse(&entry.listing_date);
    open.or(listing).unwrap_or(default)
}

pub fn resolve_universe(
    entries: &[UniverseEntry],
    suffix: &str,
    default_start: NaiveDate,
) -> UniverseResolution {
    let mut instruments = Vec::with_capacity(entries.len());
    let mut skipped = Vec::new();
    let mut malformed_dates = Vec::new();
    let mut seen = HashSet::new();

    for (row, entry) in entries.iter().enumerate() {
        if entry.raw_symbol.trim().is_empty() {
            warn!(row, "skipping row without a symbol");
            skipped.push(SkippedEntry {
                row,
                reason: SkipReason::BlankSymbol,
            });
            continue;
        }

        let symbol = format_symbol(&entry.raw_symbol, suffix);
        if !seen.insert(symbol.clone()) {
            warn!(row, %symbol, "skipping duplicate symbol");
            skipped.push(SkippedEntry {
                row,
                reason: SkipReason::Duplicate(symbol),
            });
            continue;
        }

        let valid_start_date =
            resolve_start_date(entry, &symbol, default_start, &mut malformed_dates);
        instruments.push(Instrument {
            symbol,
            valid_start_date,
        });
    }

    UniverseResolution {
        universe: Universe { instruments },
        skipped,
        malformed_dates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(symbol: &str, listing: Option<&str>, open: Option<&str>) -> UniverseEntry {
        UniverseEntry {
            raw_symbol: symbol.into(),
            listing_date: listing.map(String::from),
            open_date: open.map(String::from),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn format_symbol_appends_suffix() {
        assert_eq!(format_symbol("BIKAJI", ".NS"), "BIKAJI.NS");
        assert_eq!(format_symbol(" TCS ", ".NS"), "TCS.NS");
    }

    #[test]
    fn format_symbol_keeps_existing_suffix() {
        assert_eq!(format_symbol("BIKAJI.NS", ".NS"), "BIKAJI.NS");
    }

    #[test]
    fn format_symbol_preserves_case() {
        assert_eq!(format_symbol("m&m", ".NS"), "m&m.NS");
        assert_eq!(format_symbol("BIKAJI.ns", ".NS"), "BIKAJI.ns.NS");
    }

    #[test]
    fn format_symbol_without_suffix() {
        assert_eq!(format_symbol("AAPL", ""), "AAPL");
    }

    #[test]
    fn parse_list_date_formats() {
        assert_eq!(parse_list_date("Nov 16, 2022").unwrap(), date(2022, 11, 16));
        assert_eq!(parse_list_date("2022-11-16").unwrap(), date(2022, 11, 16));
        assert_eq!(parse_list_date(" 2022-11-16 ").unwrap(), date(2022, 11, 16));
    }

    #[test]
    fn parse_list_date_rejects_garbage() {
        let err = parse_list_date("16/11/2022").unwrap_err();
        assert!(matches!(err, ProfitHighError::MalformedDate { value } if value == "16/11/2022"));
    }

    #[test]
    fn start_date_precedence() {
        let default = default_start_date();
        let mut malformed = Vec::new();

        let both = entry("A", Some("Jan 05, 2021"), Some("2023-03-01"));
        assert_eq!(
            resolve_start_date(&both, "A.NS", default, &mut malformed),
            date(2023, 3, 1)
        );

        let listing_only = entry("B", Some("Jan 05, 2021"), None);
        assert_eq!(
            resolve_start_date(&listing_only, "B.NS", default, &mut malformed),
            date(2021, 1, 5)
        );

        let neither = entry("C", None, Some("   "));
        assert_eq!(
            resolve_start_date(&neither, "C.NS", default, &mut malformed),
            date(2022, 1, 1)
        );
        assert!(malformed.is_empty());
    }

    #[test]
    fn malformed_open_date_falls_back() {
        let mut malformed = Vec::new();
        let e = entry("D", Some("2020-07-01"), Some("soon"));
        assert_eq!(
            resolve_start_date(&e, "D.NS", default_start_date(), &mut malformed),
            date(2020, 7, 1)
        );
        assert_eq!(
            malformed,
            vec![MalformedDateCell {
                symbol: "D.NS".into(),
                value: "soon".into()
            }]
        );
    }

    #[test]
    fn resolve_universe_skips_blank_and_duplicate() {
        let entries = vec![
            entry("TCS", None, None),
            entry("  ", None, None),
            entry("TCS.NS", None, None),
            entry("INFY", Some("bad"), None),
        ];
        let res = resolve_universe(&entries, DEFAULT_SYMBOL_SUFFIX, default_start_date());

        assert_eq!(res.universe.count(), 2);
        let symbols: Vec<_> = res.universe.instruments.iter().map(|i| &i.symbol).collect();
        assert_eq!(symbols, vec!["TCS.NS", "INFY.NS"]);
        assert_eq!(res.skipped.len(), 2);
        assert_eq!(res.skipped[0].row, 1);
        assert_eq!(res.skipped[0].reason, SkipReason::BlankSymbol);
        assert_eq!(
            res.skipped[1].reason,
            SkipReason::Duplicate("TCS.NS".into())
        );
        assert_eq!(res.malformed_dates.len(), 1);
        assert_eq!(
            res.universe.instruments[1].valid_start_date,
            default_start_date()
        );
    }
}
