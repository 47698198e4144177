//! Configuration errors and value expansion.

use thiserror::Error;

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse YAML configuration.
    #[error("failed to parse YAML config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation failed.
    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `${VAR:-default}`. An unset variable without a
/// default expands to the empty string.
///
/// # Examples
///
/// ```
/// use tally::config::expand_env_vars;
///
/// assert_eq!(
///     expand_env_vars("${TALLY_DOC_UNSET_VAR:-data}/tally.db"),
///     "data/tally.db"
/// );
/// ```
pub fn expand_env_vars(input: &str) -> String {
    static ENV_VAR_REGEX: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();

    let regex = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("failed to compile env var regex")
    });

    regex
        .replace_all(input, |caps: &regex::Captures| {
            let default_value = caps.get(2).map_or("", |m| m.as_str());
            std::env::var(&caps[1]).unwrap_or_else(|_| default_value.to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_env_vars_no_vars() {
        assert_eq!(expand_env_vars("data/tally.db"), "data/tally.db");
    }

    #[test]
    fn test_expand_env_vars_with_default() {
        let result = expand_env_vars("${TALLY_NONEXISTENT_DIR_12345:-/srv}/tally.db");
        assert_eq!(result, "/srv/tally.db");
    }

    #[test]
    fn test_expand_env_vars_unset_without_default() {
        assert_eq!(expand_env_vars("x${TALLY_NONEXISTENT_VAR_12345}y"), "xy");
    }

    #[test]
    fn test_expand_env_vars_from_env() {
        // SAFETY: This test runs in isolation and only modifies a test-specific variable.
        unsafe {
            std::env::set_var("TALLY_TEST_DATA_DIR", "/tmp/tally");
        }
        let result = expand_env_vars("sqlite:${TALLY_TEST_DATA_DIR:-data}/tally.db");
        assert_eq!(result, "sqlite:/tmp/tally/tally.db");
        // SAFETY: Cleanup test variable.
        unsafe {
            std::env::remove_var("TALLY_TEST_DATA_DIR");
        }
    }
}
