//! Invoice data model.
//!
//! The sole domain entity. An invoice is built fresh per request by the
//! extraction engine, is immutable once handed to a renderer, and is never
//! persisted beyond the rendered artifact.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Placeholder used when no client name can be recovered from the text.
pub const UNKNOWN_CLIENT: &str = "Unknown Client";

/// Fallback description for a line item whose description is undeterminable.
pub const DEFAULT_ITEM_DESCRIPTION: &str = "Item";

/// Display format for invoice dates.
pub const DATE_DISPLAY_FORMAT: &str = "%d/%m/%Y";

/// A structured invoice recovered from raw OCR text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    /// Never empty; derived from the source fingerprint when the text
    /// carries no invoice-number cue.
    pub invoice_number: String,
    /// Display date in `DD/MM/YYYY`; defaults to the processing date.
    pub date: String,
    pub client_name: String,
    /// `None` means "not found", which is distinct from an empty address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_address: Option<String>,
    /// Line items in order of appearance in the source text.
    pub items: Vec<LineItem>,
    /// Currency units, 2-decimal precision.
    pub total: f64,
}

/// One purchasable entry on an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub quantity: u32,
    pub unit_price: f64,
    /// Always `quantity * unit_price`, recomputed during normalization.
    pub subtotal: f64,
}

/// SHA-256 fingerprint of the raw source text (hex).
///
/// Carried in diagnostics and reused for invoice-number generation, so the
/// same text always yields the same invoice.
pub fn source_fingerprint(raw_text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Derive a display invoice number from a source fingerprint.
pub fn derive_invoice_number(fingerprint: &str) -> String {
    let short: String = fingerprint.chars().take(10).collect();
    format!("INV-{}", short.to_uppercase())
}

/// Format a date for invoice display.
pub fn format_display_date(date: NaiveDate) -> String {
    date.format(DATE_DISPLAY_FORMAT).to_string()
}
