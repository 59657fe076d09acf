//! Shared normalization: extractor drafts into well-formed invoices.
//!
//! Both extraction strategies produce an [`InvoiceDraft`] with whatever
//! fields they could recover; [`finalize`] turns any draft into an
//! [`Invoice`] satisfying every data-model invariant, recording each
//! correction as a [`Note`] instead of failing.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::invoice::{
    derive_invoice_number, format_display_date, Invoice, LineItem, DEFAULT_ITEM_DESCRIPTION,
    UNKNOWN_CLIENT,
};

/// Numeric tolerance when comparing a stated total with the computed sum.
pub const TOTAL_TOLERANCE: f64 = 0.01;

/// Partially recovered invoice fields, before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvoiceDraft {
    pub invoice_number: Option<String>,
    pub date: Option<String>,
    pub client_name: Option<String>,
    pub client_address: Option<String>,
    pub items: Vec<ItemDraft>,
    /// A total stated explicitly in the source text, if any.
    pub stated_total: Option<f64>,
}

/// Partially recovered line-item fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemDraft {
    pub description: Option<String>,
    pub quantity: Option<i64>,
    pub unit_price: Option<f64>,
    /// An item total stated in the source; only used to back-derive a
    /// missing unit price, never trusted as a subtotal.
    pub stated_total: Option<f64>,
}

/// Best-effort confidence signals collected while extracting and normalizing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Note {
    /// The source text was empty or whitespace-only.
    EmptySource,
    /// The invoice carries zero line items (valid, but low confidence).
    NoItemsFound,
    /// No total was stated in the text; the total is the item sum.
    TotalRecomputed,
    /// The text stated a total that disagrees with the computed item sum;
    /// the stated total wins for display.
    StatedTotalKept { stated: f64, computed: f64 },
    /// A non-positive or unparseable quantity was replaced by the default.
    QuantityClamped,
    /// A negative or unparseable price was replaced by 0.0.
    PriceClamped,
    /// A line item had no usable description.
    DescriptionDefaulted,
    /// No client name was found; the placeholder was used.
    ClientNameDefaulted,
    /// A missing unit price was derived from a stated item total.
    UnitPriceFromStatedTotal,
}

/// Round to 2-decimal currency precision.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Turn a draft into a well-formed invoice.
///
/// `today` is the processing date, passed in explicitly so the engine stays
/// pure over its inputs; `fingerprint` is the source-text fingerprint used
/// for invoice-number generation.
pub fn finalize(draft: InvoiceDraft, fingerprint: &str, today: NaiveDate) -> (Invoice, Vec<Note>) {
    let mut notes = Vec::new();

    let items: Vec<LineItem> = draft
        .items
        .into_iter()
        .map(|raw| normalize_item(raw, &mut notes))
        .collect();

    if items.is_empty() {
        notes.push(Note::NoItemsFound);
    }

    let computed = round2(items.iter().map(|i| i.subtotal).sum());
    let total = match draft.stated_total.filter(|t| t.is_finite() && *t >= 0.0) {
        Some(stated) => {
            let stated = round2(stated);
            if !items.is_empty() && (stated - computed).abs() > TOTAL_TOLERANCE {
                debug!(stated, computed, "stated total disagrees with item sum");
                notes.push(Note::StatedTotalKept { stated, computed });
            }
            stated
        }
        None => {
            if !items.is_empty() {
                notes.push(Note::TotalRecomputed);
            }
            computed
        }
    };

    let client_name = match non_empty(draft.client_name) {
        Some(name) => name,
        None => {
            notes.push(Note::ClientNameDefaulted);
            UNKNOWN_CLIENT.to_string()
        }
    };

    let invoice = Invoice {
        invoice_number: non_empty(draft.invoice_number)
            .unwrap_or_else(|| derive_invoice_number(fingerprint)),
        date: non_empty(draft.date).unwrap_or_else(|| format_display_date(today)),
        client_name,
        client_address: non_empty(draft.client_address),
        items,
        total,
    };

    (invoice, notes)
}

fn normalize_item(raw: ItemDraft, notes: &mut Vec<Note>) -> LineItem {
    let description = match non_empty(raw.description) {
        Some(d) => d,
        None => {
            notes.push(Note::DescriptionDefaulted);
            DEFAULT_ITEM_DESCRIPTION.to_string()
        }
    };

    let quantity = match raw.quantity {
        Some(q) if q > 0 => q.min(i64::from(u32::MAX)) as u32,
        Some(_) => {
            notes.push(Note::QuantityClamped);
            1
        }
        None => 1,
    };

    let unit_price = match raw.unit_price {
        Some(p) if p.is_finite() && p >= 0.0 => p,
        Some(_) => {
            notes.push(Note::PriceClamped);
            0.0
        }
        None => match raw.stated_total.filter(|t| t.is_finite() && *t > 0.0) {
            Some(item_total) => {
                notes.push(Note::UnitPriceFromStatedTotal);
                round2(item_total / f64::from(quantity))
            }
            None => 0.0,
        },
    };

    LineItem {
        description,
        quantity,
        unit_price,
        subtotal: round2(f64::from(quantity) * unit_price),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 24).unwrap()
    }

    fn item(description: &str, quantity: i64, unit_price: f64) -> ItemDraft {
        ItemDraft {
            description: Some(description.to_string()),
            quantity: Some(quantity),
            unit_price: Some(unit_price),
            stated_total: None,
        }
    }

    #[test]
    fn empty_draft_yields_valid_default_invoice() {
        let (invoice, notes) = finalize(InvoiceDraft::default(), "abcdef0123456789", today());

        assert_eq!(invoice.client_name, UNKNOWN_CLIENT);
        assert_eq!(invoice.client_address, None);
        assert_eq!(invoice.invoice_number, "INV-ABCDEF0123");
        assert_eq!(invoice.date, "24/08/2026");
        assert!(invoice.items.is_empty());
        assert_eq!(invoice.total, 0.0);
        assert!(notes.contains(&Note::NoItemsFound));
        assert!(notes.contains(&Note::ClientNameDefaulted));
    }

    #[test]
    fn subtotals_and_total_are_recomputed() {
        let draft = InvoiceDraft {
            items: vec![item("Widget", 2, 3.5), item("Gadget", 1, 10.0)],
            ..Default::default()
        };
        let (invoice, notes) = finalize(draft, "00", today());

        assert_eq!(invoice.items[0].subtotal, 7.0);
        assert_eq!(invoice.items[1].subtotal, 10.0);
        assert_eq!(invoice.total, 17.0);
        assert!(notes.contains(&Note::TotalRecomputed));
    }

    #[test]
    fn stated_total_wins_over_computed_sum() {
        let draft = InvoiceDraft {
            items: vec![item("Widget", 2, 3.5)],
            stated_total: Some(25.0),
            ..Default::default()
        };
        let (invoice, notes) = finalize(draft, "00", today());

        assert_eq!(invoice.total, 25.0);
        assert!(notes.contains(&Note::StatedTotalKept {
            stated: 25.0,
            computed: 7.0
        }));
    }

    #[test]
    fn agreeing_stated_total_raises_no_mismatch() {
        let draft = InvoiceDraft {
            items: vec![item("Widget", 2, 3.5)],
            stated_total: Some(7.0),
            ..Default::default()
        };
        let (invoice, notes) = finalize(draft, "00", today());

        assert_eq!(invoice.total, 7.0);
        assert!(!notes
            .iter()
            .any(|n| matches!(n, Note::StatedTotalKept { .. })));
    }

    #[test]
    fn negative_quantity_clamps_to_default() {
        let draft = InvoiceDraft {
            items: vec![item("Widget", -3, 5.0)],
            ..Default::default()
        };
        let (invoice, notes) = finalize(draft, "00", today());

        assert_eq!(invoice.items[0].quantity, 1);
        assert_eq!(invoice.items[0].subtotal, 5.0);
        assert!(notes.contains(&Note::QuantityClamped));
    }

    #[test]
    fn negative_price_clamps_to_zero() {
        let draft = InvoiceDraft {
            items: vec![item("Widget", 1, -4.0)],
            ..Default::default()
        };
        let (invoice, notes) = finalize(draft, "00", today());

        assert_eq!(invoice.items[0].unit_price, 0.0);
        assert_eq!(invoice.items[0].subtotal, 0.0);
        assert!(notes.contains(&Note::PriceClamped));
    }

    #[test]
    fn missing_unit_price_derived_from_stated_item_total() {
        let draft = InvoiceDraft {
            items: vec![ItemDraft {
                description: Some("iPhone 14".into()),
                quantity: Some(2),
                unit_price: None,
                stated_total: Some(500.0),
            }],
            ..Default::default()
        };
        let (invoice, notes) = finalize(draft, "00", today());

        assert_eq!(invoice.items[0].unit_price, 250.0);
        assert_eq!(invoice.items[0].subtotal, 500.0);
        assert!(notes.contains(&Note::UnitPriceFromStatedTotal));
    }

    #[test]
    fn blank_description_and_address_fall_back() {
        let draft = InvoiceDraft {
            client_address: Some("   ".into()),
            items: vec![ItemDraft {
                description: Some("  ".into()),
                quantity: None,
                unit_price: Some(1.0),
                stated_total: None,
            }],
            ..Default::default()
        };
        let (invoice, notes) = finalize(draft, "00", today());

        assert_eq!(invoice.client_address, None);
        assert_eq!(invoice.items[0].description, DEFAULT_ITEM_DESCRIPTION);
        assert_eq!(invoice.items[0].quantity, 1);
        assert!(notes.contains(&Note::DescriptionDefaulted));
    }
}
