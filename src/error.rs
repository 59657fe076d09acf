//! Error taxonomy for the extraction engine.
//!
//! Normalization-level corrections (missing fields, negative numbers) are
//! never errors — they are recorded as diagnostics notes. Only a total
//! failure to produce structured data surfaces as an [`ExtractError`].

use std::time::Duration;

use thiserror::Error;

/// User-facing failures of the extraction engine.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The image yielded zero text and zero OCR confidence.
    #[error("no text could be recognized in the image")]
    NoTextFound,

    /// Assisted extraction was requested but no language model is wired in.
    /// Never downgraded silently to pattern extraction.
    #[error("assisted extraction is not available on this deployment")]
    StrategyUnavailable,

    /// The language-model adapter could not be reached.
    #[error("language model is unavailable: {0}")]
    AssistedUnavailable(String),

    /// The language-model adapter did not answer within the configured budget.
    #[error("language model did not answer within {}s", .0.as_secs())]
    AssistedTimeout(Duration),

    /// The language model answered, but not with the expected structure.
    #[error("language model response was not the expected structure: {0}")]
    MalformedAssistedResponse(String),

    /// OCR adapter failure the caller chose to route through the engine.
    #[error(transparent)]
    Ocr(#[from] OcrFailure),
}

/// Failures of an OCR adapter.
#[derive(Error, Debug)]
pub enum OcrFailure {
    #[error("image could not be read: {0}")]
    UnreadableImage(String),

    #[error("OCR engine failed: {0}")]
    Engine(String),
}
