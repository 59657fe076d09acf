//! Extraction engine: strategy selection and the public `extract` contract.

use std::fmt;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::info;

use crate::assisted;
use crate::config::EngineConfig;
use crate::error::ExtractError;
use crate::invoice::{source_fingerprint, Invoice};
use crate::llm::ChatModel;
use crate::normalize::{self, Note};
use crate::ocr::OcrText;
use crate::pattern;

/// The extraction algorithm the caller asks for. An explicit, caller-visible
/// choice — never inferred, never silently substituted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Pattern,
    Assisted,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Pattern => write!(f, "pattern"),
            Strategy::Assisted => write!(f, "assisted"),
        }
    }
}

/// What actually happened during extraction, reported back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    /// The strategy that actually ran.
    pub strategy_used: Strategy,
    pub notes: Vec<Note>,
    /// SHA-256 of the raw source text.
    pub source_fingerprint: String,
}

/// A structured invoice plus its diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionOutcome {
    pub invoice: Invoice,
    pub diagnostics: Diagnostics,
}

/// Stateless per-request extraction over raw OCR text.
///
/// Assisted availability is resolved once at construction (a model adapter is
/// either wired in or not) and read-only thereafter; an orchestrator that
/// re-checks adapter health simply rebuilds the engine.
pub struct ExtractionEngine {
    config: EngineConfig,
    model: Option<Arc<dyn ChatModel>>,
}

impl ExtractionEngine {
    /// Engine with only the pattern strategy available.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            model: None,
        }
    }

    /// Engine with both strategies available (subject to
    /// `config.assisted_enabled`).
    pub fn with_model(config: EngineConfig, model: Arc<dyn ChatModel>) -> Self {
        Self {
            config,
            model: Some(model),
        }
    }

    pub fn assisted_available(&self) -> bool {
        self.config.assisted_enabled && self.model.is_some()
    }

    /// Extract a structured invoice from raw text using the requested
    /// strategy, stamping defaults with today's date.
    pub async fn extract(
        &self,
        raw_text: &str,
        strategy: Strategy,
    ) -> Result<ExtractionOutcome, ExtractError> {
        self.extract_at(raw_text, strategy, Local::now().date_naive())
            .await
    }

    /// Like [`extract`](Self::extract) with an explicit processing date, so
    /// the whole pipeline is a pure function of its arguments.
    pub async fn extract_at(
        &self,
        raw_text: &str,
        strategy: Strategy,
        today: NaiveDate,
    ) -> Result<ExtractionOutcome, ExtractError> {
        let fingerprint = source_fingerprint(raw_text);
        let mut notes = Vec::new();

        if raw_text.trim().is_empty() {
            notes.push(Note::EmptySource);
        }

        let draft = match strategy {
            Strategy::Pattern => pattern::extract(raw_text),
            Strategy::Assisted => {
                if !self.assisted_available() {
                    return Err(ExtractError::StrategyUnavailable);
                }
                let model = self.model.as_ref().ok_or(ExtractError::StrategyUnavailable)?;
                assisted::extract(model.as_ref(), raw_text, &self.config).await?
            }
        };

        let (invoice, norm_notes) = normalize::finalize(draft, &fingerprint, today);
        notes.extend(norm_notes);

        info!(
            %strategy,
            items = invoice.items.len(),
            total = invoice.total,
            notes = notes.len(),
            "extraction complete"
        );

        Ok(ExtractionOutcome {
            invoice,
            diagnostics: Diagnostics {
                strategy_used: strategy,
                notes,
                source_fingerprint: fingerprint,
            },
        })
    }

    /// Entry point for callers holding an OCR result rather than plain text.
    ///
    /// An image that yielded zero text at zero confidence is a hard
    /// [`ExtractError::NoTextFound`]; empty text with some confidence still
    /// produces a default-valued, low-confidence invoice.
    pub async fn extract_from_ocr(
        &self,
        ocr: &OcrText,
        strategy: Strategy,
    ) -> Result<ExtractionOutcome, ExtractError> {
        if ocr.text.trim().is_empty() && ocr.confidence <= 0.0 {
            return Err(ExtractError::NoTextFound);
        }
        self.extract(&ocr.text, strategy).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 24).unwrap()
    }

    #[tokio::test]
    async fn pattern_extraction_is_bit_identical_across_calls() {
        let engine = ExtractionEngine::new(EngineConfig::default());
        let text = "Bonjour Jean Dupont\n2 x Widget 3,50€\nTotal: 7,00€";

        let a = engine
            .extract_at(text, Strategy::Pattern, fixed_date())
            .await
            .unwrap();
        let b = engine
            .extract_at(text, Strategy::Pattern, fixed_date())
            .await
            .unwrap();

        assert_eq!(a.invoice, b.invoice);
        assert_eq!(
            serde_json::to_string(&a.invoice).unwrap(),
            serde_json::to_string(&b.invoice).unwrap()
        );
    }

    #[tokio::test]
    async fn empty_text_yields_default_invoice_not_an_error() {
        let engine = ExtractionEngine::new(EngineConfig::default());
        let outcome = engine
            .extract_at("", Strategy::Pattern, fixed_date())
            .await
            .unwrap();

        assert_eq!(outcome.invoice.client_name, "Unknown Client");
        assert!(outcome.invoice.items.is_empty());
        assert!(outcome.diagnostics.notes.contains(&Note::EmptySource));
        assert!(outcome.diagnostics.notes.contains(&Note::NoItemsFound));
    }

    #[tokio::test]
    async fn assisted_without_model_is_strategy_unavailable() {
        let engine = ExtractionEngine::new(EngineConfig::default());
        let err = engine
            .extract("anything", Strategy::Assisted)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::StrategyUnavailable));
    }

    #[tokio::test]
    async fn zero_text_zero_confidence_is_no_text_found() {
        let engine = ExtractionEngine::new(EngineConfig::default());
        let ocr = OcrText {
            text: String::new(),
            confidence: 0.0,
            provider: "test".into(),
        };
        let err = engine
            .extract_from_ocr(&ocr, Strategy::Pattern)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::NoTextFound));
    }

    #[tokio::test]
    async fn empty_text_with_confidence_still_extracts() {
        let engine = ExtractionEngine::new(EngineConfig::default());
        let ocr = OcrText {
            text: "  ".into(),
            confidence: 0.4,
            provider: "test".into(),
        };
        let outcome = engine
            .extract_from_ocr(&ocr, Strategy::Pattern)
            .await
            .unwrap();
        assert!(outcome.invoice.items.is_empty());
    }
}
