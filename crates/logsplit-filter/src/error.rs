//! Filter and routing error types

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for filtering and routing operations
pub type Result<T> = std::result::Result<T, FilterError>;

/// Errors raised while building filters or routing lines
#[derive(Debug, Error)]
pub enum FilterError {
    /// A regex rule failed to compile
    #[error(
        "invalid pattern '{keyword}' in rule {index}{}: {source}",
        .channel.as_deref().map(|c| format!(" of '{c}'")).unwrap_or_default()
    )]
    InvalidPattern {
        /// Channel the rule belongs to, once known
        channel: Option<String>,
        /// Zero-based position of the rule within its filter
        index: usize,
        keyword: String,
        #[source]
        source: fancy_regex::Error,
    },

    /// Two filter sets share a name
    #[error("duplicate filter set name '{name}'")]
    DuplicateName { name: String },

    /// Buffer capacity below one
    #[error("buffer capacity must be at least 1, got {capacity}")]
    InvalidCapacity { capacity: usize },

    /// Input file could not be opened
    #[error("failed to open input '{}': {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading the next input line failed
    #[error("failed to read input: {0}")]
    Read(#[source] io::Error),

    /// Opening, writing or flushing a channel sink failed
    #[error("channel '{channel}': {source}")]
    Sink {
        channel: String,
        #[source]
        source: io::Error,
    },
}

impl FilterError {
    /// Create an InvalidPattern error for a rule not yet tied to a channel
    pub fn invalid_pattern(
        index: usize,
        keyword: impl Into<String>,
        source: fancy_regex::Error,
    ) -> Self {
        Self::InvalidPattern {
            channel: None,
            index,
            keyword: keyword.into(),
            source,
        }
    }

    /// Create a DuplicateName error
    #[inline]
    pub fn duplicate_name(name: impl Into<String>) -> Self {
        Self::DuplicateName { name: name.into() }
    }

    /// Create a Sink error
    #[inline]
    pub fn sink(channel: impl Into<String>, source: io::Error) -> Self {
        Self::Sink {
            channel: channel.into(),
            source,
        }
    }

    /// Attach the channel name to a pattern error; other variants pass through
    pub fn in_channel(self, name: &str) -> Self {
        match self {
            Self::InvalidPattern {
                channel: None,
                index,
                keyword,
                source,
            } => Self::InvalidPattern {
                channel: Some(name.to_string()),
                index,
                keyword,
                source,
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bad_pattern() -> fancy_regex::Error {
        fancy_regex::Regex::new("(unclosed").unwrap_err()
    }

    #[test]
    fn test_invalid_pattern_error() {
        let err = FilterError::invalid_pattern(2, "(unclosed", bad_pattern());
        let msg = err.to_string();
        assert!(msg.contains("(unclosed"));
        assert!(msg.contains("rule 2"));

        let err = err.in_channel("errors");
        assert!(err.to_string().contains("of 'errors'"));
    }

    #[test]
    fn test_duplicate_name_error() {
        let err = FilterError::duplicate_name("errors");
        assert!(err.to_string().contains("errors"));
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_invalid_capacity_error() {
        let err = FilterError::InvalidCapacity { capacity: 0 };
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn test_in_channel_leaves_other_errors() {
        let err = FilterError::duplicate_name("a").in_channel("b");
        assert!(matches!(err, FilterError::DuplicateName { name } if name == "a"));
    }
}
