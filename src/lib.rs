//! OCR-to-invoice extraction engine.
//!
//! Turns noisy OCR text (chat screenshots, handwritten notes, receipts) into
//! a structured [`Invoice`] via one of two interchangeable strategies: a
//! deterministic pattern-based scan, or a language-model-assisted extraction
//! with a strict response contract. The HTTP orchestrator, PDF layout and
//! front-end live outside this crate; they talk to the engine through
//! [`ExtractionEngine`] and the adapter traits in [`ocr`], [`llm`] and
//! [`render`].

pub mod assisted;
pub mod config;
pub mod engine;
pub mod error;
pub mod invoice;
pub mod llm;
pub mod normalize;
pub mod ocr;
pub mod pattern;
pub mod render;

pub use config::EngineConfig;
pub use engine::{Diagnostics, ExtractionEngine, ExtractionOutcome, Strategy};
pub use error::{ExtractError, OcrFailure};
pub use invoice::{Invoice, LineItem};
pub use normalize::Note;
