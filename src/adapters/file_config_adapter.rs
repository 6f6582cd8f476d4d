//! INI file configuration adapter.

use crate::domain::error::ProfitHighError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ProfitHighError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| ProfitHighError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, ProfitHighError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| ProfitHighError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[data]
source = csv
price_dir = /srv/prices/weekly

[universe]
file = /srv/lists/YTR_lists.csv
symbol_suffix = .NS

[signals]
multiplier = 0.792
approach_threshold = 0.05
workers = 8
"#;

    #[test]
    fn reads_strings() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(
            adapter.get_string("data", "price_dir"),
            Some("/srv/prices/weekly".to_string())
        );
        assert_eq!(
            adapter.get_string("universe", "symbol_suffix"),
            Some(".NS".to_string())
        );
        assert_eq!(adapter.get_string("data", "missing"), None);
        assert_eq!(adapter.get_string("nowhere", "file"), None);
    }

    #[test]
    fn reads_numbers_with_defaults() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_int("signals", "workers", 1), 8);
        assert_eq!(adapter.get_int("signals", "missing", 42), 42);
        assert_eq!(adapter.get_double("signals", "multiplier", 0.0), 0.792);
        assert_eq!(adapter.get_double("signals", "missing", 9.5), 9.5);
    }

    #[test]
    fn non_numeric_falls_back_to_default() {
        let adapter =
            FileConfigAdapter::from_string("[signals]\nworkers = many\nmultiplier = big\n")
                .unwrap();
        assert_eq!(adapter.get_int("signals", "workers", 4), 4);
        assert_eq!(adapter.get_double("signals", "multiplier", 0.792), 0.792);
    }

    #[test]
    fn get_non_empty_ignores_blank_values() {
        let adapter =
            FileConfigAdapter::from_string("[data]\nprices_file =\nprice_dir =  weekly \n")
                .unwrap();
        assert_eq!(adapter.get_non_empty("data", "prices_file"), None);
        assert_eq!(
            adapter.get_non_empty("data", "price_dir"),
            Some("weekly".to_string())
        );
    }

    #[test]
    fn from_file_reads_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[output]\nsignals_path = out/signals.csv\n").unwrap();
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("output", "signals_path"),
            Some("out/signals.csv".to_string())
        );
    }

    #[test]
    fn from_file_missing_is_config_parse_error() {
        let err = FileConfigAdapter::from_file("/nonexistent/profithigh.ini").unwrap_err();
        assert!(
            matches!(err, ProfitHighError::ConfigParse { file, .. } if file == "/nonexistent/profithigh.ini")
        );
    }
}
