//! Error types for the IDOR crate.

use thiserror::Error;

/// Errors raised while turning SQL into a statement model or resolving its values.
///
/// None of these cross the analyzer boundary: the analyzer folds every one of
/// them into a blocking decision.
#[derive(Debug, Error)]
pub enum IdorError {
    /// SQL tokenizing or parsing failed.
    #[error("failed to parse SQL: {0}")]
    ParseError(String),

    /// A placeholder has no bound value at evaluation time.
    #[error("no value bound for placeholder {placeholder}")]
    UnresolvedBinding { placeholder: String },

    /// The statement touches data in a way the model cannot express.
    #[error("unsupported statement: {0}")]
    UnsupportedStatement(String),
}
