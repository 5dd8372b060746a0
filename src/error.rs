//! Error taxonomy for the public journal operations.
//!
//! Caller mistakes ([`JournalError::InvalidInput`]) are kept apart from
//! runtime failures so the MCP layer can answer with `invalid params` instead
//! of an internal error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum JournalError {
    /// Malformed caller input, rejected before any provider or store call.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("embedding provider failed: {0:#}")]
    Embedding(#[source] anyhow::Error),

    #[error("index store failed: {0:#}")]
    Store(#[source] anyhow::Error),

    #[error("journal could not be read: {0:#}")]
    Journal(#[source] anyhow::Error),
}

impl JournalError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// `true` when the error is the caller's fault rather than a runtime failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

/// Errors raised while splitting a markdown file into frontmatter and body.
#[derive(Debug, Error)]
pub enum FrontmatterError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("frontmatter block is not closed")]
    Unterminated,

    #[error("invalid YAML frontmatter: {0}")]
    Yaml(String),

    #[error("frontmatter must be a mapping of keys to values")]
    NotAMapping,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_invalid_input_is_a_client_error() {
        assert!(JournalError::invalid("query must not be empty").is_client_error());
        assert!(!JournalError::Store(anyhow::anyhow!("locked")).is_client_error());
        assert!(!JournalError::Embedding(anyhow::anyhow!("no model")).is_client_error());
    }

    #[test]
    fn messages_carry_the_cause() {
        let err = JournalError::Store(anyhow::anyhow!("database is locked"));
        assert_eq!(err.to_string(), "index store failed: database is locked");
    }
}
