//! Error types shared across the crate.
//!
//! Each layer gets its own enum so callers can match on what they can
//! actually handle; everything converges in the web gateway where errors
//! map onto HTTP statuses.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Field-level validation failures, keyed by form field name.
///
/// Accumulates all problems before reporting so submitters see every
/// broken field at once rather than one at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors.insert(field.to_string(), message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Ok when nothing was recorded, Err(self) otherwise.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.errors {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Configuration resolution errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
    #[error("missing required environment variable {0}")]
    Missing(String),
}

/// Persistence-layer errors.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("connection pool error: {0}")]
    Pool(String),
    #[error(transparent)]
    Query(#[from] tokio_postgres::Error),
    #[error("migration failed: {0}")]
    Migration(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<deadpool_postgres::PoolError> for DatabaseError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

/// Case registry errors.
#[derive(Debug, Error)]
pub enum CaseError {
    #[error("case validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("access denied")]
    AccessDenied,
    #[error("case not found")]
    NotFound,
    #[error("status '{requested}' is not a valid transition for this role")]
    TransitionNotAllowed { requested: String },
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Profile directory errors.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("access denied")]
    AccessDenied,
    #[error("profile not found")]
    NotFound,
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// CSV export errors.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error("export io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Channel (gateway) errors.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("failed to start channel '{name}': {reason}")]
    StartupFailed { name: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::ValidationErrors;

    #[test]
    fn validation_errors_accumulate_and_render_per_field() {
        let mut errors = ValidationErrors::new();
        assert!(errors.clone().into_result().is_ok());

        errors.add("id_number", "must contain only digits");
        errors.add("email", "already registered");

        let err = errors.into_result().expect_err("errors were recorded");
        assert_eq!(err.get("id_number"), Some("must contain only digits"));
        let rendered = err.to_string();
        assert!(rendered.contains("email: already registered"));
        assert!(rendered.contains("; "));
    }
}
