//! Typed environment parsing helpers.
//!
//! Every knob resolves as: explicit env var if set and non-empty, otherwise
//! the supplied default. Malformed values fail resolution instead of being
//! silently ignored.

use crate::error::ConfigError;

/// Read an env var, trimming whitespace. Unset or empty yields `None`.
pub fn optional_env(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else {
                Ok(Some(trimmed.to_string()))
            }
        }
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "value is not valid unicode".to_string(),
        }),
    }
}

pub fn parse_string_env(key: &str, default: String) -> Result<String, ConfigError> {
    Ok(optional_env(key)?.unwrap_or(default))
}

pub fn parse_bool_env(key: &str, default: bool) -> Result<bool, ConfigError> {
    match optional_env(key)? {
        None => Ok(default),
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("expected a boolean, got '{other}'"),
            }),
        },
    }
}

pub fn parse_usize_env(key: &str, default: usize) -> Result<usize, ConfigError> {
    match optional_env(key)? {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected an integer, got '{raw}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_bool_env, parse_usize_env};

    #[test]
    fn bool_env_rejects_garbage() {
        // SAFETY: test-only env mutation, key is unique to this test.
        unsafe { std::env::set_var("COMUNIPAZ_TEST_BOOL", "maybe") };
        let err = parse_bool_env("COMUNIPAZ_TEST_BOOL", false).expect_err("must reject");
        assert!(err.to_string().contains("expected a boolean"));
        unsafe { std::env::remove_var("COMUNIPAZ_TEST_BOOL") };
    }

    #[test]
    fn usize_env_falls_back_to_default_when_unset() {
        assert_eq!(
            parse_usize_env("COMUNIPAZ_TEST_UNSET_USIZE", 16).expect("default"),
            16
        );
    }
}
