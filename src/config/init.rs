use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::config::{get_config_path, save_config, Config};
use crate::scoring::{EmptyExtraPolicy, ScoringConfig, DUATZ_PENALTY, MAX_DUATZ, PART_WEIGHT};

/// Prompt user with a message and return their trimmed input.
fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    std::io::stdout()
        .flush()
        .context("Failed to flush stdout")?;
    let mut input = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read input")?;
    Ok(input.trim().to_string())
}

/// Prompt user with a message and a default value. Returns default if input is empty.
fn prompt_with_default(message: &str, default: &str) -> Result<String> {
    let input = prompt(&format!("{} [{}]: ", message, default))?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}

/// Prompt user with a yes/no question. Returns bool based on input and default.
fn prompt_yes_no(message: &str, default_yes: bool) -> Result<bool> {
    let hint = if default_yes { "Y/n" } else { "y/N" };
    let input = prompt(&format!("{} [{}]: ", message, hint))?;
    let input = input.to_lowercase();
    if input.is_empty() {
        Ok(default_yes)
    } else {
        Ok(input == "y" || input == "yes")
    }
}

/// Parse an empty-extra policy answer.
fn parse_policy(s: &str) -> Option<EmptyExtraPolicy> {
    match s.trim().to_lowercase().as_str() {
        "zero" => Some(EmptyExtraPolicy::Zero),
        "exclude" => Some(EmptyExtraPolicy::Exclude),
        _ => None,
    }
}

/// Run the interactive init wizard to create a config file.
///
/// If `default_path` is Some, uses that as the config file path.
/// Otherwise, prompts the user with the default config path.
pub fn run_init_wizard(default_path: Option<PathBuf>) -> Result<()> {
    println!();
    println!("drill-grade configuration");
    println!("=========================");
    println!();

    // 1. Scoring
    let configure_scoring = prompt_yes_no("Configure scoring? (n accepts defaults)", false)?;

    let scoring = if configure_scoring {
        println!();
        println!("Each of the three parts is worth this many points when fully answered.");
        let part_weight: f64 = loop {
            let input = prompt_with_default("Part weight", &PART_WEIGHT.to_string())?;
            match input.parse::<f64>() {
                Ok(v) if v.is_finite() && v > 0.0 => break v,
                _ => println!("  Invalid: must be a positive number. Try again."),
            }
        };

        println!();
        println!("Every duatz deducts a flat number of points from the final grade.");
        let duatz_penalty: f64 = loop {
            let input = prompt_with_default("Points per duatz", &DUATZ_PENALTY.to_string())?;
            match input.parse::<f64>() {
                Ok(v) if v.is_finite() && v >= 0.0 => break v,
                _ => println!("  Invalid: must be a non-negative number. Try again."),
            }
        };

        let max_duatz: u32 = loop {
            let input = prompt_with_default("Highest duatz count accepted", &MAX_DUATZ.to_string())?;
            match input.parse::<u32>() {
                Ok(v) if v >= 1 => break v,
                _ => println!("  Invalid: must be a whole number of at least 1. Try again."),
            }
        };

        println!();
        println!("A checked question whose sub-checks are all still blank can count as zero");
        println!("('zero') or be left out of its part average ('exclude').");
        let empty_extra = loop {
            let input = prompt_with_default("Blank sub-checks", "zero")?;
            match parse_policy(&input) {
                Some(policy) => break policy,
                None => println!("  Invalid: answer 'zero' or 'exclude'. Try again."),
            }
        };

        Some(ScoringConfig {
            part_weight: Some(part_weight),
            duatz_penalty: Some(duatz_penalty),
            max_duatz: Some(max_duatz),
            empty_extra: Some(empty_extra),
        })
    } else {
        None
    };

    // 2. Report store
    println!();
    let reports_default = crate::report::get_reports_path();
    let reports_path = prompt_with_default(
        "Where should reports be stored?",
        &reports_default.display().to_string(),
    )?;
    let reports_path = if PathBuf::from(&reports_path) == reports_default {
        None
    } else {
        Some(reports_path)
    };

    // 3. Config path
    let default_config_path = default_path.unwrap_or_else(get_config_path);
    println!();
    let path_str = prompt_with_default(
        "Where should the config be saved?",
        &default_config_path.display().to_string(),
    )?;
    let config_path = PathBuf::from(&path_str);

    if config_path.exists() {
        let overwrite = prompt_yes_no(
            &format!(
                "Config already exists at {}. Overwrite?",
                config_path.display()
            ),
            false,
        )?;
        if !overwrite {
            println!("Aborted.");
            return Ok(());
        }
    }

    // 4. Write config
    let config = Config {
        reports_path,
        log_level: None,
        scoring,
    };
    save_config(&config_path, &config)?;

    println!();
    println!("Config written to {}", config_path.display());
    println!("Run `drill-grade new <name>` to create your first report.");

    Ok(())
}
