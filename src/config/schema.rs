use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::scoring::ScoringConfig;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Report store location; `~/` is expanded (default: ~/.config/drill-grade/reports.json)
    #[serde(default)]
    pub reports_path: Option<String>,

    /// Log filter used when RUST_LOG is unset, e.g. "info" or "drill_grade=debug"
    #[serde(default)]
    pub log_level: Option<String>,

    #[serde(default)]
    pub scoring: Option<ScoringConfig>,
}

impl Config {
    pub fn reports_path(&self) -> PathBuf {
        match self.reports_path.as_deref() {
            Some(path) => expand_home(path),
            None => crate::report::get_reports_path(),
        }
    }

    pub fn effective_scoring(&self) -> ScoringConfig {
        self.scoring.clone().unwrap_or_default()
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parse() {
        let yaml = r#"
reports_path: /tmp/reports.json
log_level: debug
scoring:
  part_weight: 33.33
  duatz_penalty: 5
"#;
        let config: Config = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.reports_path(), PathBuf::from("/tmp/reports.json"));
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.effective_scoring().duatz_penalty(), 5.0);
    }

    #[test]
    fn test_empty_config_defaults() {
        let config: Config = serde_saphyr::from_str("{}").unwrap();
        assert!(config.scoring.is_none());
        assert_eq!(config.effective_scoring(), ScoringConfig::default());
        assert!(config.reports_path().ends_with("reports.json"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(serde_saphyr::from_str::<Config>("queries: []\n").is_err());
    }

    #[test]
    fn test_home_expansion() {
        let expanded = expand_home("~/grades/reports.json");
        if dirs::home_dir().is_some() {
            assert!(!expanded.starts_with("~"));
        }
        assert!(expanded.ends_with("grades/reports.json"));
        assert_eq!(expand_home("rel/path.json"), PathBuf::from("rel/path.json"));
    }
}
