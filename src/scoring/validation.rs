use super::config::ScoringConfig;

/// Validate scoring configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_scoring(config: &ScoringConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if let Some(weight) = config.part_weight {
        if !weight.is_finite() || weight <= 0.0 {
            errors.push(format!(
                "scoring.part_weight: must be a positive number, got {}",
                weight
            ));
        }
    }

    if let Some(penalty) = config.duatz_penalty {
        if !penalty.is_finite() || penalty < 0.0 {
            errors.push(format!(
                "scoring.duatz_penalty: must be non-negative, got {}",
                penalty
            ));
        }
    }

    if let Some(max) = config.max_duatz {
        if max == 0 {
            errors.push("scoring.max_duatz: must be at least 1".to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
