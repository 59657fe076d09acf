//! Engine-facing rendering contract.
//!
//! The engine hands a finished, immutable [`Invoice`] to a renderer and gets
//! document bytes back. PDF layout lives with the orchestrator; this crate
//! only fixes the seam.

use crate::invoice::Invoice;

/// Turns a structured invoice into a rendered document (typically PDF bytes).
pub trait InvoiceRenderer: Send + Sync {
    fn render(&self, invoice: &Invoice) -> anyhow::Result<Vec<u8>>;
}
