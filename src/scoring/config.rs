use serde::{Deserialize, Serialize};

/// Points each part contributes when every counted item scores full marks.
pub const PART_WEIGHT: f64 = 33.33;

/// Points deducted per duatz occurrence.
pub const DUATZ_PENALTY: f64 = 5.0;

/// Highest duatz count a user may enter.
pub const MAX_DUATZ: u32 = 10;

/// How an active item with `extra` but no recorded sub-answers is scored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyExtraPolicy {
    /// Counts as a zero in the part average.
    #[default]
    Zero,
    /// Left out of the part average, like an inactive item.
    Exclude,
}

/// Scoring configuration.
///
/// All grading goes through one engine parameterized by these values. Each
/// field is optional in YAML and falls back to the built-in constant.
///
/// Example YAML:
/// ```yaml
/// scoring:
///   part_weight: 33.33
///   duatz_penalty: 5
///   max_duatz: 10
///   empty_extra: zero
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    /// Weight of one part (default: 33.33)
    #[serde(default)]
    pub part_weight: Option<f64>,

    /// Points deducted per duatz (default: 5)
    #[serde(default)]
    pub duatz_penalty: Option<f64>,

    /// Upper bound accepted for the duatz counter (default: 10)
    #[serde(default)]
    pub max_duatz: Option<u32>,

    /// Treatment of extras without sub-answers (default: zero)
    #[serde(default)]
    pub empty_extra: Option<EmptyExtraPolicy>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            part_weight: Some(PART_WEIGHT),
            duatz_penalty: Some(DUATZ_PENALTY),
            max_duatz: Some(MAX_DUATZ),
            empty_extra: Some(EmptyExtraPolicy::Zero),
        }
    }
}

impl ScoringConfig {
    pub fn part_weight(&self) -> f64 {
        self.part_weight.unwrap_or(PART_WEIGHT)
    }

    pub fn duatz_penalty(&self) -> f64 {
        self.duatz_penalty.unwrap_or(DUATZ_PENALTY)
    }

    pub fn max_duatz(&self) -> u32 {
        self.max_duatz.unwrap_or(MAX_DUATZ)
    }

    pub fn empty_extra(&self) -> EmptyExtraPolicy {
        self.empty_extra.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scoring_config() {
        let config = ScoringConfig::default();

        assert_eq!(config.part_weight, Some(33.33));
        assert_eq!(config.duatz_penalty, Some(5.0));
        assert_eq!(config.max_duatz, Some(10));
        assert_eq!(config.empty_extra, Some(EmptyExtraPolicy::Zero));
    }

    #[test]
    fn test_scoring_config_serde_roundtrip() {
        let config = ScoringConfig::default();
        let yaml = serde_saphyr::to_string(&config).unwrap();
        let parsed: ScoringConfig = serde_saphyr::from_str(&yaml).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_scoring_config_parse() {
        let yaml = r#"
part_weight: 25
empty_extra: exclude
"#;
        let config: ScoringConfig = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.part_weight(), 25.0);
        assert_eq!(config.empty_extra(), EmptyExtraPolicy::Exclude);
        assert!(config.duatz_penalty.is_none());
        assert_eq!(config.duatz_penalty(), DUATZ_PENALTY);
    }

    #[test]
    fn test_empty_scoring_config_uses_constants() {
        let config: ScoringConfig = serde_saphyr::from_str("{}").unwrap();
        assert_eq!(config.part_weight(), PART_WEIGHT);
        assert_eq!(config.duatz_penalty(), DUATZ_PENALTY);
        assert_eq!(config.max_duatz(), MAX_DUATZ);
        assert_eq!(config.empty_extra(), EmptyExtraPolicy::Zero);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = "part_wieght: 30\n";
        assert!(serde_saphyr::from_str::<ScoringConfig>(yaml).is_err());
    }
}
