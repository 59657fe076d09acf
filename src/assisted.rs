//! Language-model-assisted extraction.
//!
//! Builds a strict-contract prompt, calls the [`ChatModel`] adapter under a
//! bounded timeout, and parses the response against the fixed invoice field
//! set. Parsing is strict on structure (the response must contain a JSON
//! object) but lenient on content: unknown fields are ignored and missing or
//! oddly-typed fields fall back per-field to the same defaults the pattern
//! extractor uses.

use serde_json::Value;
use tokio::time::timeout;
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::ExtractError;
use crate::llm::ChatModel;
use crate::normalize::{InvoiceDraft, ItemDraft};
use crate::pattern::parse_amount;

/// Run assisted extraction against the given model.
pub async fn extract(
    model: &dyn ChatModel,
    raw_text: &str,
    config: &EngineConfig,
) -> Result<InvoiceDraft, ExtractError> {
    let prompt = build_prompt(raw_text, config.max_prompt_chars);
    debug!(
        model = model.name(),
        prompt_chars = prompt.len(),
        "calling language model"
    );

    let response = match timeout(config.assisted_timeout, model.complete(&prompt)).await {
        Err(_) => return Err(ExtractError::AssistedTimeout(config.assisted_timeout)),
        Ok(Err(e)) => return Err(ExtractError::AssistedUnavailable(e.to_string())),
        Ok(Ok(text)) => text,
    };

    debug!(response_chars = response.len(), "language model answered");
    parse_response(&response)
}

/// Fixed instruction block carrying the exact response field set.
fn build_prompt(raw_text: &str, max_chars: usize) -> String {
    format!(
        r#"Analyze the text below and extract invoice data as JSON ONLY.
Write no text outside the JSON. Never invent data: use only information
explicitly present in the text.

TEXT:
{}

RULES:
1. "client_name" = the customer's name found in the text.
2. "client_address" = street + postal code + city if found.
3. Each entry in "items" is one product found in the text. Never invent
   products, quantities or prices. Leave a price null if not stated.
4. If the text states an overall total, put it in "invoice_total".

EXACT JSON FORMAT:
{{
    "client_name": "",
    "client_address": "",
    "items": [
        {{
            "description": "product name",
            "quantity": total_count,
            "unit_price": price_or_null,
            "total_price": price_or_null
        }}
    ],
    "invoice_total": price_or_null
}}

JSON only."#,
        truncate_for_context(raw_text, max_chars)
    )
}

/// Parse a model response into a draft, or fail with
/// [`ExtractError::MalformedAssistedResponse`].
pub(crate) fn parse_response(response: &str) -> Result<InvoiceDraft, ExtractError> {
    let json_str = isolate_json(response).ok_or_else(|| {
        ExtractError::MalformedAssistedResponse("no JSON object in response".to_string())
    })?;

    let value: Value = serde_json::from_str(json_str)
        .map_err(|e| ExtractError::MalformedAssistedResponse(format!("invalid JSON: {e}")))?;

    let obj = value.as_object().ok_or_else(|| {
        ExtractError::MalformedAssistedResponse("response JSON is not an object".to_string())
    })?;

    let mut draft = InvoiceDraft {
        client_name: coerce_string(obj.get("client_name")),
        client_address: coerce_string(obj.get("client_address")),
        stated_total: coerce_number(obj.get("invoice_total")),
        ..Default::default()
    };

    if let Some(items) = obj.get("items").and_then(Value::as_array) {
        for item in items {
            let Some(fields) = item.as_object() else {
                continue;
            };
            draft.items.push(ItemDraft {
                description: coerce_string(fields.get("description")),
                quantity: coerce_integer(fields.get("quantity")),
                unit_price: coerce_number(fields.get("unit_price")),
                stated_total: coerce_number(fields.get("total_price")),
            });
        }
    }

    Ok(draft)
}

/// Locate the JSON payload inside a model response: fenced code block first,
/// then the outermost `{ ... }` span.
fn isolate_json(response: &str) -> Option<&str> {
    let body = if let Some(after) = response.split("```json").nth(1) {
        after.split("```").next().unwrap_or(after)
    } else if response.contains("```") {
        response.split("```").nth(1).unwrap_or(response)
    } else {
        response
    };

    let start = body.find('{')?;
    let end = body.rfind('}')?;
    if end < start {
        return None;
    }
    Some(body[start..=end].trim())
}

fn coerce_string(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Accept a number, a numeric string ("3,50 €"), or nothing.
fn coerce_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_amount(s),
        _ => None,
    }
}

/// Accept an integer, a float-shaped integer (3.0), or a numeric string.
fn coerce_integer(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => parse_amount(s).map(|f| f.round() as i64),
        _ => None,
    }
}

fn truncate_for_context(text: &str, max_chars: usize) -> &str {
    if text.len() <= max_chars {
        return text;
    }
    let mut end = max_chars;
    while !text.is_char_boundary(end) && end > 0 {
        end -= 1;
    }
    &text[..end]
}
