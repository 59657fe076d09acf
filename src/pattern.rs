//! Deterministic pattern-based extraction.
//!
//! Scans raw OCR text line by line for recognizable field shapes. Purely
//! deterministic (same text, same draft) and total-defaulting: garbled or
//! empty input never fails, it simply leaves fields unset for normalization
//! to fill in.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::normalize::{InvoiceDraft, ItemDraft};

lazy_static! {
    // "Facture n° 2024-001", "Invoice #A-17"
    static ref INVOICE_NUMBER: Regex = Regex::new(
        r"(?i)\b(?:facture|invoice)\s*(?:n[°o]\.?|#|num(?:ber)?\.?)?\s*[:=]?\s*([A-Za-z0-9][A-Za-z0-9/-]{1,30})"
    ).unwrap();

    // dd/mm/yyyy with ., / or - separators
    static ref DATE_DMY: Regex = Regex::new(
        r"\b(\d{1,2})[./-](\d{1,2})[./-](\d{4})\b"
    ).unwrap();

    // "Total: 25", "prix total 3,50 €", "amount due: 10.00$"
    static ref TOTAL: Regex = Regex::new(
        r"(?i)\b(?:prix\s+total|montant\s+total|grand\s+total|total|montant|amount(?:\s+due)?)\s*[:=]?\s*(?:[€$]\s*)?(\d+(?:[.,]\d{1,2})?)"
    ).unwrap();

    // Digit-prefixed street line, optionally followed by ", 75001 Paris"
    static ref ADDRESS: Regex = Regex::new(
        r"(?i)\b(\d+[\s,]+(?:rue|avenue|boulevard|place|chemin|all[ée]e|impasse|street|st\.?|ave(?:nue)?\.?|road|rd\.?|lane|drive)\b[^\n]*)"
    ).unwrap();

    // Postal-code-shaped substring
    static ref POSTAL_CODE: Regex = Regex::new(r"\b\d{5}\b").unwrap();

    // "<qty>? [x] <description> <price><currency>?"
    static ref ITEM: Regex = Regex::new(
        r"(?i)^(?:(\d{1,4})\s*[x×]?\s+)?(.+?)\s+(?:[€$]\s*)?(\d+(?:[.,]\d{1,2})?)\s*(?:€|eur(?:os?)?|\$|usd)?\s*$"
    ).unwrap();

    // "Nom: Jean Dupont", "Client: ..."
    static ref LABELED_NAME: Regex = Regex::new(
        r"(?i)^(?:nom|client|pour|name|for)\s*[:\-]\s*(.+)$"
    ).unwrap();

    // "Bonjour Jean Dupont, ..."
    static ref SALUTATION_NAME: Regex = Regex::new(
        r"(?i)^(?:bonjour|salut|hello|hi|dear|cher|ch[èe]re)[, ]+(\p{Lu}[\p{L}'’-]+(?:\s+\p{Lu}[\p{L}'’-]+)*)"
    ).unwrap();

    // A standalone capitalized multi-word line
    static ref CAPITALIZED_NAME: Regex = Regex::new(
        r"^(\p{Lu}[\p{L}'’.-]*(?:\s+\p{Lu}[\p{L}'’.-]*)+)$"
    ).unwrap();
}

/// Words that start lines which look name-shaped but never are.
const NAME_STOP_WORDS: &[&str] = &[
    "bonjour", "salut", "hello", "merci", "thanks", "total", "facture", "invoice", "adresse",
    "address", "prix", "price", "madame", "monsieur", "commande", "order",
];

/// Extract an invoice draft from raw text. Never fails.
pub fn extract(raw_text: &str) -> InvoiceDraft {
    let mut draft = InvoiceDraft::default();
    let mut salutation_name: Option<String> = None;
    let mut plain_name: Option<String> = None;

    for line in raw_text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if draft.invoice_number.is_none() {
            if let Some(caps) = INVOICE_NUMBER.captures(line) {
                // Real invoice numbers carry at least one digit; bare words
                // after "facture"/"invoice" are chatter.
                if caps[1].chars().any(|c| c.is_ascii_digit()) {
                    draft.invoice_number = Some(caps[1].to_string());
                }
            }
        }

        if draft.date.is_none() {
            if let Some(date) = find_date(line) {
                draft.date = Some(date);
            }
        }

        // Later total mentions supersede earlier ones, consistent with chat
        // transcripts where the final price lands at the end.
        if let Some(caps) = TOTAL.captures_iter(line).last() {
            if let Some(amount) = parse_amount(&caps[1]) {
                draft.stated_total = Some(amount);
            }
            continue;
        }

        if looks_like_address(line) {
            if draft.client_address.is_none() {
                draft.client_address = Some(capture_address(line));
            }
            continue;
        }

        if let Some(caps) = LABELED_NAME.captures(line) {
            if draft.client_name.is_none() {
                draft.client_name = Some(caps[1].trim().to_string());
            }
            continue;
        }

        if let Some(item) = parse_item_line(line) {
            draft.items.push(item);
            continue;
        }

        if salutation_name.is_none() {
            if let Some(caps) = SALUTATION_NAME.captures(line) {
                salutation_name = Some(caps[1].to_string());
                continue;
            }
        }

        if plain_name.is_none() {
            if let Some(caps) = CAPITALIZED_NAME.captures(line) {
                let candidate = caps[1].to_string();
                if !starts_with_stop_word(&candidate) {
                    plain_name = Some(candidate);
                }
            }
        }
    }

    if draft.client_name.is_none() {
        draft.client_name = salutation_name.or(plain_name);
    }

    debug!(
        items = draft.items.len(),
        has_name = draft.client_name.is_some(),
        has_total = draft.stated_total.is_some(),
        "pattern extraction finished"
    );

    draft
}

/// Parse an amount string, tolerating `,` or `.` as decimal separator and
/// grouping spaces. Ambiguous "1.234,56" shapes resolve by treating the last
/// separator as the decimal marker.
pub(crate) fn parse_amount(s: &str) -> Option<f64> {
    let negative = s.trim_start().starts_with('-');
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(_), None) => cleaned.replace(',', "."),
        (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        _ => cleaned,
    };

    normalized
        .parse::<f64>()
        .ok()
        .map(|v| if negative { -v } else { v })
}

fn find_date(line: &str) -> Option<String> {
    let caps = DATE_DMY.captures(line)?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let year: u32 = caps[3].parse().ok()?;
    if !(1..=31).contains(&day) || !(1..=12).contains(&month) {
        return None;
    }
    Some(format!("{:02}/{:02}/{:04}", day, month, year))
}

fn looks_like_address(line: &str) -> bool {
    if ADDRESS.is_match(line) {
        return true;
    }
    // Postal-code-shaped substring on a digit-prefixed line
    POSTAL_CODE.is_match(line)
        && line.starts_with(|c: char| c.is_ascii_digit())
        && line.chars().any(|c| c.is_alphabetic())
}

fn capture_address(line: &str) -> String {
    ADDRESS
        .captures(line)
        .map(|caps| caps[1].trim().to_string())
        .unwrap_or_else(|| line.to_string())
}

fn parse_item_line(line: &str) -> Option<ItemDraft> {
    let caps = ITEM.captures(line)?;

    let description = caps[2]
        .trim()
        .trim_end_matches([':', '-', ',', '.'])
        .trim()
        .to_string();
    // A bare number pair ("12 34") is OCR noise, not an item.
    if !description.chars().any(|c| c.is_alphabetic()) {
        return None;
    }

    let quantity = caps.get(1).and_then(|m| m.as_str().parse::<i64>().ok());
    let unit_price = parse_amount(&caps[3]);

    Some(ItemDraft {
        description: Some(description),
        quantity,
        unit_price,
        stated_total: None,
    })
}

fn starts_with_stop_word(candidate: &str) -> bool {
    candidate
        .split_whitespace()
        .next()
        .map(|first| NAME_STOP_WORDS.contains(&first.to_lowercase().as_str()))
        .unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_text_yields_empty_draft() {
        assert_eq!(extract(""), InvoiceDraft::default());
        assert_eq!(extract("   \n \n"), InvoiceDraft::default());
    }

    #[test]
    fn extraction_is_deterministic() {
        let text = "Bonjour Jean Dupont\n2 x Widget 3,50€\nTotal: 7,00€\n";
        assert_eq!(extract(text), extract(text));
    }

    #[test]
    fn decimal_comma_item_line() {
        let draft = extract("2 x Widget 3,50€");
        assert_eq!(draft.items.len(), 1);
        let item = &draft.items[0];
        assert_eq!(item.description.as_deref(), Some("Widget"));
        assert_eq!(item.quantity, Some(2));
        assert_eq!(item.unit_price, Some(3.5));
    }

    #[test]
    fn item_without_quantity_or_marker() {
        let draft = extract("iPhone 14 250€\nClavier sans fil 45.00");
        assert_eq!(draft.items.len(), 2);
        assert_eq!(draft.items[0].description.as_deref(), Some("iPhone 14"));
        assert_eq!(draft.items[0].quantity, None);
        assert_eq!(draft.items[0].unit_price, Some(250.0));
        assert_eq!(draft.items[1].unit_price, Some(45.0));
    }

    #[test]
    fn last_total_wins() {
        let text = "Total: 10\nsome chatter\nTotal: 25";
        assert_eq!(extract(text).stated_total, Some(25.0));
    }

    #[test]
    fn total_lines_are_not_items() {
        let draft = extract("2 x Widget 3,50€\nTotal: 7,00€");
        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.stated_total, Some(7.0));
    }

    #[test]
    fn labeled_and_salutation_names() {
        assert_eq!(
            extract("Nom: Jean Dupont").client_name.as_deref(),
            Some("Jean Dupont")
        );
        assert_eq!(
            extract("Bonjour Marie Curie, voici ma commande")
                .client_name
                .as_deref(),
            Some("Marie Curie")
        );
    }

    #[test]
    fn capitalized_line_used_as_name_fallback() {
        let text = "Jean Dupont\n2 x Widget 3,50€";
        assert_eq!(extract(text).client_name.as_deref(), Some("Jean Dupont"));
        // Salutation words never become names
        assert_eq!(extract("Merci Beaucoup").client_name, None);
    }

    #[test]
    fn street_address_is_recognized_and_not_an_item() {
        let draft = extract("12 rue des Lilas, 75001 Paris");
        assert_eq!(
            draft.client_address.as_deref(),
            Some("12 rue des Lilas, 75001 Paris")
        );
        assert!(draft.items.is_empty());
    }

    #[test]
    fn invoice_number_and_date_cues() {
        let draft = extract("Facture n° 2024-001 du 12/05/2024");
        assert_eq!(draft.invoice_number.as_deref(), Some("2024-001"));
        assert_eq!(draft.date.as_deref(), Some("12/05/2024"));
    }

    #[test]
    fn implausible_dates_are_ignored() {
        assert_eq!(extract("le 45/19/2024").date, None);
    }

    #[test]
    fn parse_amount_shapes() {
        assert_eq!(parse_amount("3,50"), Some(3.5));
        assert_eq!(parse_amount("3.50"), Some(3.5));
        assert_eq!(parse_amount("1.234,56"), Some(1234.56));
        assert_eq!(parse_amount("1,234.56"), Some(1234.56));
        assert_eq!(parse_amount("-4"), Some(-4.0));
        assert_eq!(parse_amount("abc"), None);
    }

    #[test]
    fn garbled_text_never_panics() {
        for text in ["€€€", "x x x 9999999999999999999999", "\u{0}\u{1}", "Total:"] {
            let _ = extract(text);
        }
    }
}
