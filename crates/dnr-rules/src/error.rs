//! Error types for dnr-rules

use crate::schema::RuleId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid rule {id}: {reason}")]
    InvalidRule { id: RuleId, reason: String },

    #[error("Ruleset generation failed: {message}")]
    Generation { message: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn invalid_rule(id: RuleId, reason: impl Into<String>) -> Self {
        Self::InvalidRule {
            id,
            reason: reason.into(),
        }
    }

    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_rule_display() {
        let err = Error::invalid_rule(42, "priority must be at least 1");
        assert!(err.to_string().contains("42"));
        assert!(err.to_string().contains("priority"));
    }

    #[test]
    fn test_generation_display() {
        let err = Error::generation("dataset has no trackers");
        assert_eq!(
            err.to_string(),
            "Ruleset generation failed: dataset has no trackers"
        );
    }
}
