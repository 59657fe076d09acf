//! Tesseract OCR provider (spawns the `tesseract` CLI).
//!
//! Runs `tesseract stdin stdout ... tsv` and rebuilds line text plus a mean
//! word confidence from the TSV output. The binary itself is the external
//! capability; this adapter only shuttles bytes in and text out.

use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use super::{OcrProvider, OcrText};
use crate::error::OcrFailure;

const DEFAULT_LANGUAGES: &str = "fra+eng";

pub struct TesseractCli {
    binary: String,
    languages: String,
}

impl TesseractCli {
    pub fn new() -> Self {
        Self {
            binary: "tesseract".to_string(),
            languages: DEFAULT_LANGUAGES.to_string(),
        }
    }

    /// Override the recognition languages (tesseract `-l` syntax, e.g.
    /// `"deu+eng"`).
    pub fn with_languages(mut self, languages: impl Into<String>) -> Self {
        self.languages = languages.into();
        self
    }
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl OcrProvider for TesseractCli {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn recognize(&self, image: &[u8]) -> Result<OcrText, OcrFailure> {
        if image.is_empty() {
            return Err(OcrFailure::UnreadableImage("empty image".to_string()));
        }

        info!(bytes = image.len(), languages = %self.languages, "running tesseract");

        let mut child = Command::new(&self.binary)
            .args(["stdin", "stdout", "-l", &self.languages, "tsv"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| OcrFailure::Engine(format!("failed to spawn {}: {}", self.binary, e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| OcrFailure::Engine("tesseract stdin not captured".to_string()))?;
        stdin
            .write_all(image)
            .await
            .map_err(|e| OcrFailure::Engine(format!("failed to write image: {e}")))?;
        drop(stdin);

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| OcrFailure::Engine(format!("tesseract did not finish: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrFailure::UnreadableImage(stderr.trim().to_string()));
        }

        let tsv = String::from_utf8_lossy(&output.stdout);
        let (text, confidence) = parse_tsv(&tsv);
        debug!(chars = text.len(), confidence, "tesseract finished");

        Ok(OcrText {
            text,
            confidence,
            provider: self.name().to_string(),
        })
    }
}

/// Rebuild recognized text and a mean word confidence from tesseract TSV.
///
/// TSV rows are `level page block par line word left top width height conf
/// text`; level 5 rows are words. Confidence comes back as 0-100, -1 for
/// non-word rows.
fn parse_tsv(tsv: &str) -> (String, f64) {
    let mut text = String::new();
    let mut current_line: Option<(String, String, String, String)> = None;
    let mut conf_sum = 0.0;
    let mut conf_count = 0u32;

    for row in tsv.lines().skip(1) {
        let fields: Vec<&str> = row.split('\t').collect();
        if fields.len() < 12 || fields[0] != "5" {
            continue;
        }

        let word = fields[11].trim();
        if word.is_empty() {
            continue;
        }

        let line_key = (
            fields[1].to_string(),
            fields[2].to_string(),
            fields[3].to_string(),
            fields[4].to_string(),
        );
        match &current_line {
            Some(key) if *key == line_key => text.push(' '),
            Some(_) => text.push('\n'),
            None => {}
        }
        current_line = Some(line_key);
        text.push_str(word);

        if let Ok(conf) = fields[10].parse::<f64>() {
            if conf >= 0.0 {
                conf_sum += conf / 100.0;
                conf_count += 1;
            }
        }
    }

    let confidence = if conf_count > 0 {
        conf_sum / f64::from(conf_count)
    } else {
        0.0
    };
    (text, confidence)
}
