//! Log setup for the command line.
//!
//! Filter precedence: `RUST_LOG`, then `--verbose` (debug for this crate),
//! then the `log_level` config key, then `warn`. Output goes to stderr so it
//! never mixes with report tables or exported JSON on stdout.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn";
const VERBOSE_FILTER: &str = "warn,drill_grade=debug";

/// Pick the filter directive used when `RUST_LOG` is not set.
pub fn fallback_filter(verbose: bool, log_level: Option<&str>) -> String {
    if verbose {
        VERBOSE_FILTER.to_string()
    } else {
        log_level.unwrap_or(DEFAULT_FILTER).to_string()
    }
}

pub fn init(verbose: bool, log_level: Option<&str>) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let directive = fallback_filter(verbose, log_level);
            EnvFilter::try_new(&directive)
                .map_err(|e| anyhow!("invalid log level/filter '{}': {}", directive, e))?
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(|e| anyhow!("failed to initialize logging: {}", e))
}
