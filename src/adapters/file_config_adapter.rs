//! INI file configuration adapter.
//!
//! Section and key lookups are case-insensitive, so `[ADA_RSI]` and
//! `ada_rsi` name the same strategy section.

use crate::domain::error::TraderError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }

    /// Load a config file, reporting failures as [`TraderError::ConfigParse`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TraderError> {
        let path = path.as_ref();
        Self::from_file(path).map_err(|e| TraderError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Some(true),
            "false" | "no" | "0" | "off" => Some(false),
            _ => None,
        }
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

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[trader]
initial_capital = 10000
strategies = ADA_RSI

[ADA_RSI]
signal = rsi_reversal
symbol = ADA/USDT
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("trader", "strategies"),
            Some("ADA_RSI".to_string())
        );
        assert_eq!(
            adapter.get_string("ADA_RSI", "symbol"),
            Some("ADA/USDT".to_string())
        );
    }

    #[test]
    fn section_lookup_ignores_case() {
        let adapter = FileConfigAdapter::from_string("[SOL_STOCH]\nLeverage = 3\n").unwrap();
        assert_eq!(adapter.get_double("sol_stoch", "leverage", 0.0), 3.0);
        assert_eq!(adapter.get_double("SOL_STOCH", "LEVERAGE", 0.0), 3.0);
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[trader]\ninitial_capital = 100\n").unwrap();
        assert_eq!(adapter.get_string("trader", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_value_or_default() {
        let adapter =
            FileConfigAdapter::from_string("[trader]\nupdate_interval = 30\ncandle_limit = abc\n")
                .unwrap();
        assert_eq!(adapter.get_int("trader", "update_interval", 60), 30);
        assert_eq!(adapter.get_int("trader", "candle_limit", 300), 300);
        assert_eq!(adapter.get_int("trader", "missing", 42), 42);
    }

    #[test]
    fn get_double_returns_value_or_default() {
        let adapter =
            FileConfigAdapter::from_string("[trader]\nslippage = 0.002\nfees = lots\n").unwrap();
        assert_eq!(adapter.get_double("trader", "slippage", 0.001), 0.002);
        assert_eq!(adapter.get_double("trader", "fees", 0.001), 0.001);
        assert_eq!(adapter.get_double("trader", "missing", 99.9), 99.9);
    }

    #[test]
    fn get_bool_true_and_false_values() {
        let adapter = FileConfigAdapter::from_string(
            "[trader]\na = true\nb = yes\nc = 1\nd = false\ne = no\nf = 0\n",
        )
        .unwrap();
        assert!(adapter.get_bool("trader", "a", false));
        assert!(adapter.get_bool("trader", "b", false));
        assert!(adapter.get_bool("trader", "c", false));
        assert!(!adapter.get_bool("trader", "d", true));
        assert!(!adapter.get_bool("trader", "e", true));
        assert!(!adapter.get_bool("trader", "f", true));
    }

    #[test]
    fn get_bool_returns_default_for_missing_or_garbage() {
        let adapter = FileConfigAdapter::from_string("[trader]\nsimulation = maybe\n").unwrap();
        assert!(adapter.get_bool("trader", "simulation", true));
        assert!(!adapter.get_bool("trader", "missing", false));
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[feed]\nbase_url = http://localhost:9000\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("feed", "base_url"),
            Some("http://localhost:9000".to_string())
        );
    }

    #[test]
    fn load_reports_config_parse_error() {
        let err = FileConfigAdapter::load("/nonexistent/path/config.ini")
            .err()
            .unwrap();
        assert!(
            matches!(err, TraderError::ConfigParse { ref file, .. } if file.contains("config.ini"))
        );
    }
}
