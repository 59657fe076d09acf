//! Modular OCR provider abstraction.
//!
//! Defines the [`OcrProvider`] trait and the unified [`OcrText`] result so
//! different OCR backends can be swapped by the orchestrator. The engine only
//! relies on the contract "given image bytes, return recognized text and a
//! confidence score"; recognition internals stay outside this crate.

pub mod tesseract;

pub use tesseract::TesseractCli;

use crate::error::OcrFailure;

/// Unified OCR result returned by every provider.
#[derive(Debug, Clone)]
pub struct OcrText {
    pub text: String,
    /// 0.0..=1.0; 0.0 together with empty text means the image was unreadable.
    pub confidence: f64,
    pub provider: String,
}

/// Async trait implemented by each OCR backend.
#[async_trait::async_trait]
pub trait OcrProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn recognize(&self, image: &[u8]) -> Result<OcrText, OcrFailure>;
}
