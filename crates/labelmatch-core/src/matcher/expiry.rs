//! Expiry-date parsing, format generation, and presence checks.
//!
//! A batch declares its expiry as a free-form string. Parsing tries an
//! ordered table of known label conventions; the parsed date is then
//! re-rendered into every convention (plus labeled contexts such as
//! "EXP 31/03/2026") and the raw capture is searched for any rendering
//! as an exact, case-insensitive substring.
//!
//! Dates are never matched fuzzily. A misread identifier costs a
//! retake; a misread expiry date clears an expired batch.

use std::collections::HashSet;

use chrono::NaiveDate;

/// How a pattern supplies the day of month.
#[derive(Debug, Clone, Copy)]
enum DayHint {
    /// Pattern carries its own day field.
    InPattern,
    /// Month-year pattern; the date resolves to day 1.
    FirstOfMonth,
}

/// Recognized input conventions, tried in order. Numeric ambiguity
/// (`05/03/2026`) resolves month-first because US forms precede EU
/// forms, matching the order conventions are listed on pack inserts.
const INPUT_PATTERNS: &[(&str, DayHint)] = &[
    // ISO and year-first
    ("%Y-%m-%d", DayHint::InPattern),
    ("%Y/%m/%d", DayHint::InPattern),
    ("%Y.%m.%d", DayHint::InPattern),
    // US month-first
    ("%m/%d/%Y", DayHint::InPattern),
    ("%m-%d-%Y", DayHint::InPattern),
    ("%m.%d.%Y", DayHint::InPattern),
    // EU day-first
    ("%d/%m/%Y", DayHint::InPattern),
    ("%d-%m-%Y", DayHint::InPattern),
    ("%d.%m.%Y", DayHint::InPattern),
    // Compact numeric
    ("%Y%m%d", DayHint::InPattern),
    ("%d%m%Y", DayHint::InPattern),
    // Named month
    ("%d %b %Y", DayHint::InPattern),
    ("%d %B %Y", DayHint::InPattern),
    ("%d-%b-%Y", DayHint::InPattern),
    ("%d%b%Y", DayHint::InPattern),
    ("%b %d, %Y", DayHint::InPattern),
    ("%B %d, %Y", DayHint::InPattern),
    // Two-digit year
    ("%m/%d/%y", DayHint::InPattern),
    ("%d/%m/%y", DayHint::InPattern),
    ("%d-%m-%y", DayHint::InPattern),
    ("%d.%m.%y", DayHint::InPattern),
    ("%y%m%d", DayHint::InPattern),
    // Month-year only (day omitted on many labels). Two-digit-year
    // forms go first so "03/26" is not read as year 26.
    ("%m/%y", DayHint::FirstOfMonth),
    ("%m-%y", DayHint::FirstOfMonth),
    ("%m.%y", DayHint::FirstOfMonth),
    ("%b %y", DayHint::FirstOfMonth),
    ("%m/%Y", DayHint::FirstOfMonth),
    ("%m-%Y", DayHint::FirstOfMonth),
    ("%m.%Y", DayHint::FirstOfMonth),
    ("%b %Y", DayHint::FirstOfMonth),
    ("%B %Y", DayHint::FirstOfMonth),
];

/// Output renderings generated from a parsed date.
const OUTPUT_PATTERNS: &[&str] = &[
    // ISO and year-first
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%Y%m%d",
    "%Y-%m",
    // EU day-first
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d %m %Y",
    "%d%m%Y",
    "%-d/%-m/%Y",
    // US month-first
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%m.%d.%Y",
    "%-m/%-d/%Y",
    // Two-digit year
    "%d/%m/%y",
    "%d-%m-%y",
    "%d.%m.%y",
    "%m/%d/%y",
    "%y%m%d",
    // Named month
    "%d %b %Y",
    "%d %B %Y",
    "%d-%b-%Y",
    "%d%b%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%d %b %y",
    "%-d %b %Y",
    // Month-year only
    "%m/%Y",
    "%m-%Y",
    "%m.%Y",
    "%m/%y",
    "%b %Y",
    "%B %Y",
    "%b %y",
];

/// Short renderings that also get labeled-context variants.
const LABELED_PATTERNS: &[&str] = &["%d/%m/%Y", "%m/%y"];

/// Domain phrases that precede expiry dates on labels.
const LABEL_PREFIXES: &[&str] = &[
    "EXP",
    "EXP.",
    "EXPIRY",
    "EXPIRES",
    "USE BY",
    "BEST BY",
    "BEST BEFORE",
    "MFG",
    "LOT",
    "BATCH",
    "VALID UNTIL",
    "DO NOT USE AFTER",
];

/// Parse a declared expiry string. First matching pattern wins.
pub fn parse_expiry(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    for (pattern, hint) in INPUT_PATTERNS {
        let parsed = match hint {
            DayHint::InPattern => NaiveDate::parse_from_str(raw, pattern),
            DayHint::FirstOfMonth => {
                NaiveDate::parse_from_str(&format!("1 {raw}"), &format!("%d {pattern}"))
            }
        };
        if let Ok(date) = parsed {
            return Some(date);
        }
    }

    None
}

/// Uppercased candidate strings to search for in the raw capture.
///
/// The original string is always first, so a verbatim occurrence
/// matches even when parsing fails. Deduplicated, order-preserving.
pub fn expiry_candidates(expiry: &str) -> Vec<String> {
    let original = expiry.trim().to_uppercase();
    if original.is_empty() {
        return Vec::new();
    }

    let mut candidates = vec![original];

    if let Some(date) = parse_expiry(expiry) {
        for pattern in OUTPUT_PATTERNS {
            candidates.push(date.format(pattern).to_string().to_uppercase());
        }
        for pattern in LABELED_PATTERNS {
            let rendered = date.format(pattern).to_string().to_uppercase();
            for prefix in LABEL_PREFIXES {
                candidates.push(format!("{prefix} {rendered}"));
            }
        }
    }

    let mut seen = HashSet::new();
    candidates.retain(|c| !c.is_empty() && seen.insert(c.clone()));
    candidates
}

/// Whether any candidate occurs verbatim in the capture.
///
/// `raw_text_upper` is an uppercased copy of the *un-normalized* OCR
/// text; punctuation and line breaks must be intact for the separator
/// variants to land.
pub fn is_present(candidates: &[String], raw_text_upper: &str) -> bool {
    candidates.iter().any(|c| raw_text_upper.contains(c))
}
