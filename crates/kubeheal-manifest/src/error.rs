//! Error types for manifest handling
//!
//! Provides error handling for:
//! - Parse operations (text → Descriptor)
//! - Serialize operations (Descriptor → text)
//! - Heal operations (structural edits)

/// Errors while parsing descriptor text
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Text is not valid YAML
    #[error("syntax error: {message}")]
    Syntax {
        /// Parser message
        message: String,
    },

    /// Text holds no document
    #[error("empty descriptor")]
    Empty,

    /// Text holds more than one document
    #[error("expected a single document, found {0}")]
    MultipleDocuments(usize),
}

impl ParseError {
    /// Create syntax error
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax {
            message: message.into(),
        }
    }
}

/// Errors while serializing a descriptor
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    /// YAML emitter failed
    #[error("serialization failed: {0}")]
    SerializationFailed(String),
}

/// Errors raised inside a heal strategy
#[derive(Debug, thiserror::Error)]
pub enum HealError {
    /// A field the strategy needs is absent
    #[error("missing field: {0}")]
    MissingField(String),

    /// A field the strategy needs to descend into is not a mapping
    #[error("not a mapping: {0}")]
    NotAMapping(String),

    /// A field the strategy needs to iterate is not a sequence
    #[error("not a sequence: {0}")]
    NotASequence(String),
}

/// Combined manifest error
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// Parse failure
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Serialize failure
    #[error("serialize error: {0}")]
    Serialize(#[from] SerializeError),

    /// Strategy failure
    #[error("heal error: {0}")]
    Heal(#[from] HealError),
}

/// Result type alias for manifest operations
pub type ManifestResult<T> = Result<T, ManifestError>;
