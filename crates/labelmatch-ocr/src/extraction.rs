//! Recognizer output parsing and mock capture generation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Extraction errors.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid response format: {0}")]
    InvalidFormat(String),
}

pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// Raw structured output from the on-device recognizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrOutput {
    pub lines: Vec<OcrLine>,
}

/// One recognized text line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrLine {
    pub text: String,
    pub confidence: f64,
}

/// Flattened capture handed to the matching engine: one string plus an
/// overall confidence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractedText {
    pub text: String,
    pub confidence: f64,
}

/// Parse recognizer output JSON into structured lines.
pub fn parse_ocr_output(json: &str) -> ExtractionResult<OcrOutput> {
    // Tolerate wrapper text around the payload (some bridges log
    // around the JSON body)
    let json_start = json
        .find('{')
        .ok_or_else(|| ExtractionError::InvalidFormat("No JSON object found in response".into()))?;
    // The closing brace must come after the opening one; a stray `}`
    // in the wrapper text before the payload must not invert the slice.
    let json_end = json[json_start..]
        .rfind('}')
        .map(|offset| json_start + offset)
        .ok_or_else(|| ExtractionError::InvalidFormat("No closing brace found in response".into()))?;

    let json_slice = &json[json_start..=json_end];
    let output: OcrOutput = serde_json::from_str(json_slice)?;

    Ok(output)
}

/// Flatten recognizer lines into one capture string.
///
/// Lines join with newlines in reading order; confidence is the mean
/// over lines (0.0 for an empty capture).
pub fn to_extracted_text(output: &OcrOutput) -> ExtractedText {
    if output.lines.is_empty() {
        return ExtractedText {
            text: String::new(),
            confidence: 0.0,
        };
    }

    let text = output
        .lines
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    let confidence =
        output.lines.iter().map(|l| l.confidence).sum::<f64>() / output.lines.len() as f64;

    ExtractedText { text, confidence }
}

/// Mock scanner producing deterministic label captures for testing
/// without a camera or recognizer.
pub struct MockScanner;

/// Character confusions a recognizer commonly makes on label print.
const OCR_CONFUSIONS: &[(char, char)] = &[('O', '0'), ('I', '1'), ('S', '5'), ('B', '8')];

impl MockScanner {
    /// Render a clean synthetic label capture.
    pub fn scan_label(identifier: &str, expiry: Option<&str>) -> ExtractedText {
        let mut lines = vec![
            "AMOXICILLIN 500 MG TABLETS".to_string(),
            format!("BATCH {identifier}"),
        ];
        if let Some(expiry) = expiry {
            lines.push(format!("EXP {expiry}"));
        }
        lines.push("STORE BELOW 25 C".to_string());

        ExtractedText {
            text: lines.join("\n"),
            confidence: 0.97,
        }
    }

    /// Render a capture with the identifier degraded by common OCR
    /// confusions, for exercising the fuzzy tiers.
    pub fn scan_label_with_noise(identifier: &str, expiry: Option<&str>) -> ExtractedText {
        let noisy: String = identifier
            .chars()
            .map(|c| {
                OCR_CONFUSIONS
                    .iter()
                    .find(|(from, _)| *from == c)
                    .map(|(_, to)| *to)
                    .unwrap_or(c)
            })
            .collect();

        let mut capture = Self::scan_label(&noisy, expiry);
        capture.confidence = 0.74;
        capture
    }
}
