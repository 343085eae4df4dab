//! Error types shared across the backend.
//!
//! Lines that yield no vocabulary pair are not errors and have no variant here:
//! extraction simply skips them.

use thiserror::Error;

/// Failures reported by a `VocabStore` implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
}

/// Failures surfaced by the quiz generator and the study session.
#[derive(Debug, Error)]
pub enum StudyError {
    #[error("no eligible words to build a quiz from")]
    EmptyPool,

    #[error("cannot {op} while session is {state}")]
    InvalidTransition { op: &'static str, state: &'static str },

    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),
}

/// Failures of the OCR collaborator.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR is not configured (set OPENAI_API_KEY)")]
    Disabled,

    #[error("invalid image payload: {0}")]
    InvalidImage(String),

    #[error("OCR upstream error: {0}")]
    Upstream(String),
}
