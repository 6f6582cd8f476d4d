//! CSV symbol list adapter.
//!
//! Reads the `Updated Symbol` (or `Symbol`) column plus optional
//! `Listing Date` and `Open Date` columns. Date cells are passed through as
//! text; parsing them is the universe resolver's job.

use crate::domain::error::ProfitHighError;
use crate::domain::universe::UniverseEntry;
use crate::ports::universe_port::UniversePort;
use csv::StringRecord;
use std::path::PathBuf;

const SYMBOL_HEADERS: [&str; 2] = ["updated symbol", "symbol"];

pub struct CsvUniverseAdapter {
    path: PathBuf,
}

impl CsvUniverseAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

/// First header matching any of `names`, in preference order.
fn column(headers: &StringRecord, names: &[&str]) -> Option<usize> {
    names.iter().find_map(|name| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    })
}

fn cell(record: &StringRecord, idx: Option<usize>) -> Option<String> {
    idx.and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

impl UniversePort for CsvUniverseAdapter {
    fn load_entries(&self) -> Result<Vec<UniverseEntry>, ProfitHighError> {
        let parse_err = |e: csv::Error| ProfitHighError::MalformedFile {
            reason: format!("CSV error in {}: {}", self.path.display(), e),
        };

        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)
            .map_err(parse_err)?;
        let headers = rdr.headers().map_err(parse_err)?.clone();

        let symbol_idx =
            column(&headers, &SYMBOL_HEADERS).ok_or_else(|| ProfitHighError::MalformedFile {
                reason: format!("missing symbol column in {}", self.path.display()),
            })?;
        let listing_idx = column(&headers, &["listing date"]);
        let open_idx = column(&headers, &["open date"]);

        let mut entries = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(parse_err)?;
            entries.push(UniverseEntry {
                raw_symbol: cell(&record, Some(symbol_idx)).unwrap_or_default(),
                listing_date: cell(&record, listing_idx),
                open_date: cell(&record, open_idx),
            });
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn reads_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("YTR_lists.csv");
        fs::write(
            &path,
            "Symbol,Updated Symbol,Listing Date,Open Date\n\
             OLD,BIKAJI,\"Nov 16, 2022\",\n\
             X,TCS.NS,,2023-04-03\n\
             Y,,,\n",
        )
        .unwrap();

        let entries = CsvUniverseAdapter::new(path).load_entries().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(
            entries[0],
            UniverseEntry {
                raw_symbol: "BIKAJI".into(),
                listing_date: Some("Nov 16, 2022".into()),
                open_date: None,
            }
        );
        assert_eq!(entries[1].raw_symbol, "TCS.NS");
        assert_eq!(entries[1].open_date.as_deref(), Some("2023-04-03"));
        assert_eq!(entries[2].raw_symbol, "");
    }

    #[test]
    fn falls_back_to_symbol_column() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("list.csv");
        fs::write(&path, "symbol\nINFY\n").unwrap();

        let entries = CsvUniverseAdapter::new(path).load_entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].raw_symbol, "INFY");
        assert_eq!(entries[0].listing_date, None);
    }

    #[test]
    fn missing_symbol_column() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("list.csv");
        fs::write(&path, "name\nInfosys\n").unwrap();
        assert!(matches!(
            CsvUniverseAdapter::new(path).load_entries(),
            Err(ProfitHighError::MalformedFile { .. })
        ));
    }
}
