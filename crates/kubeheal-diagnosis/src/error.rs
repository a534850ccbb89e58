//! Error types for the pattern library

use kubeheal_core::FailureType;

/// Errors while compiling pattern tables
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    /// A signature or indicator is not a valid regular expression
    #[error("invalid pattern for {failure_type} ({rule}): '{pattern}': {message}")]
    InvalidRegex {
        /// Failure type the rule belongs to
        failure_type: FailureType,
        /// Signature position or indicator name
        rule: String,
        /// Offending pattern text
        pattern: String,
        /// Regex compiler message
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_regex_display() {
        let err = PatternError::InvalidRegex {
            failure_type: FailureType::Pending,
            rule: "signature 2".to_string(),
            pattern: "(".to_string(),
            message: "unclosed group".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid pattern for Pending (signature 2): '(': unclosed group"
        );
    }
}
