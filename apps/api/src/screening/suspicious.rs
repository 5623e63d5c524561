//! Suspicious-content detector.
//!
//! Flags documents that try to game automated screening: invisible characters,
//! hidden or white text, microscopic fonts, watermarks, keyword stuffing and
//! instructions aimed at the model. Detection never fails a document; raw-format
//! parse errors are logged and the remaining checks still run.

use std::collections::HashMap;
use std::sync::OnceLock;

use lopdf::content::Operation;
use lopdf::Object;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::extraction::{docx, pdf, DocumentKind, ExtractedDocument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuspiciousKind {
    InvisibleCharacters,
    PromptInjection,
    KeywordStuffing,
    Watermark,
    HiddenText,
    WhiteText,
    MicroscopicText,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuspiciousFlag {
    pub kind: SuspiciousKind,
    pub message: String,
}

const WHITE_THRESHOLD: f64 = 0.95;
const BLACK_THRESHOLD: f64 = 0.05;
const MIN_READABLE_FONT_PT: f64 = 1.0;
/// DOCX sizes are in half-points.
const MIN_READABLE_DOCX_SIZE: f64 = 2.0;

const STUFFING_MIN_WORDS: usize = 100;
const STUFFING_MIN_OCCURRENCES: usize = 15;
const STUFFING_MIN_SHARE: f64 = 0.08;

const WATERMARK_WORDS: &[&str] = &["CONFIDENTIAL", "SAMPLE", "DRAFT", "WATERMARK"];

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "that", "this", "from", "are", "was", "were", "have", "has",
    "you", "your", "our", "their", "into", "over", "using", "used",
];

fn injection_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)(ignore\s+(all\s+)?(previous|prior|above)\s+instructions|disregard\s+(all\s+)?(previous|prior|above)|you\s+are\s+(an?\s+)?(ai|language\s+model|chatgpt|assistant)|(rate|score|mark)\s+this\s+(candidate|resume|applicant)|this\s+candidate\s+is\s+(a\s+)?(perfect|strong|excellent)\s+(fit|match)|(set|give|assign)\s+(the\s+|my\s+)?match_score\s+(to|of|as)|(reveal|print|output|override|ignore)\s+(the\s+|your\s+)?system\s*prompt)",
        )
        .expect("injection pattern is a valid regex")
    })
}

fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[A-Za-z][A-Za-z+#.\-]{2,}").expect("word pattern is a valid regex"))
}

/// Runs every check that applies to the document's kind.
pub fn detect(doc: &ExtractedDocument) -> Vec<SuspiciousFlag> {
    let mut flags = Flags::default();

    scan_text(&doc.text, &mut flags);

    match doc.kind {
        DocumentKind::Pdf => scan_pdf(&doc.bytes, &mut flags),
        DocumentKind::Docx => scan_docx(&doc.bytes, &mut flags),
        DocumentKind::Txt => {}
    }

    if !flags.0.is_empty() {
        debug!("Suspicious content detected: {:?}", flags.kinds());
    }
    flags.0
}

/// Collects flags, keeping at most one per kind.
#[derive(Default)]
struct Flags(Vec<SuspiciousFlag>);

impl Flags {
    fn raise(&mut self, kind: SuspiciousKind, message: impl Into<String>) {
        if !self.0.iter().any(|f| f.kind == kind) {
            self.0.push(SuspiciousFlag {
                kind,
                message: message.into(),
            });
        }
    }

    fn kinds(&self) -> Vec<SuspiciousKind> {
        self.0.iter().map(|f| f.kind).collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Extracted-text checks
// ────────────────────────────────────────────────────────────────────────────

fn is_invisible_char(c: char) -> bool {
    matches!(
        c,
        '\u{200B}'..='\u{200F}' | '\u{2060}'..='\u{2064}' | '\u{FEFF}' | '\u{00AD}'
    )
}

fn scan_text(text: &str, flags: &mut Flags) {
    let invisible = text.chars().filter(|c| is_invisible_char(*c)).count();
    if invisible > 0 {
        flags.raise(
            SuspiciousKind::InvisibleCharacters,
            format!("Contains {invisible} invisible or zero-width characters"),
        );
    }

    if let Some(m) = injection_pattern().find(text) {
        flags.raise(
            SuspiciousKind::PromptInjection,
            format!(
                "Contains text addressed to an automated screener: \"{}\"",
                m.as_str().trim()
            ),
        );
    }

    if let Some((word, count)) = stuffed_keyword(text) {
        flags.raise(
            SuspiciousKind::KeywordStuffing,
            format!("Possible keyword stuffing: \"{word}\" appears {count} times"),
        );
    }

    if let Some(word) = repeated_watermark_line(text) {
        flags.raise(
            SuspiciousKind::Watermark,
            format!("Watermark text \"{word}\" repeated across the document"),
        );
    }
}

/// Returns the dominant word if a single word makes up an implausible share of the text.
fn stuffed_keyword(text: &str) -> Option<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut total = 0usize;

    for m in word_pattern().find_iter(text) {
        let word = m.as_str().trim_end_matches(['.', '-']).to_lowercase();
        total += 1;
        if word.len() < 3 || STOPWORDS.contains(&word.as_str()) {
            continue;
        }
        *counts.entry(word).or_default() += 1;
    }

    if total < STUFFING_MIN_WORDS {
        return None;
    }

    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
        .filter(|(_, count)| {
            *count >= STUFFING_MIN_OCCURRENCES && *count as f64 / total as f64 > STUFFING_MIN_SHARE
        })
}

fn repeated_watermark_line(text: &str) -> Option<&'static str> {
    WATERMARK_WORDS.iter().copied().find(|word| {
        text.lines()
            .filter(|line| line.trim().eq_ignore_ascii_case(word))
            .count()
            >= 2
    })
}

// ────────────────────────────────────────────────────────────────────────────
// PDF content-stream checks
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct TextState {
    render_mode: i64,
    fill_white: bool,
    font_size: f64,
    matrix_scale: f64,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            render_mode: 0,
            fill_white: false,
            font_size: 12.0,
            matrix_scale: 1.0,
        }
    }
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

fn numbers(operands: &[Object]) -> Vec<f64> {
    operands.iter().filter_map(number).collect()
}

fn scan_pdf(bytes: &[u8], flags: &mut Flags) {
    if contains_subslice(bytes, b"/Watermark") {
        flags.raise(SuspiciousKind::Watermark, "PDF contains a watermark annotation or artifact");
    }

    match pdf::page_operations(bytes) {
        Ok(pages) => {
            for operations in &pages {
                scan_pdf_operations(operations, flags);
            }
        }
        Err(e) => warn!("Skipping PDF formatting checks: {e}"),
    }
}

fn scan_pdf_operations(operations: &[Operation], flags: &mut Flags) {
    let mut state = TextState::default();
    let mut saved: Vec<TextState> = Vec::new();

    for op in operations {
        let values = numbers(&op.operands);
        match op.operator.as_str() {
            "q" => saved.push(state),
            "Q" => state = saved.pop().unwrap_or_default(),
            "BT" => state.matrix_scale = 1.0,
            "Tr" => {
                if let Some(mode) = values.first() {
                    state.render_mode = *mode as i64;
                }
            }
            "Tf" => {
                if let Some(size) = values.first() {
                    state.font_size = *size;
                }
            }
            "Tm" if values.len() == 6 => {
                state.matrix_scale = values[0].abs().max(values[3].abs());
            }
            "g" if values.len() == 1 => state.fill_white = values[0] >= WHITE_THRESHOLD,
            "rg" if values.len() == 3 => {
                state.fill_white = values.iter().all(|v| *v >= WHITE_THRESHOLD);
            }
            "k" if values.len() == 4 => {
                state.fill_white = values.iter().all(|v| *v <= BLACK_THRESHOLD);
            }
            "Tj" | "TJ" | "'" | "\"" => inspect_text_draw(&state, flags),
            _ => {}
        }
    }
}

fn inspect_text_draw(state: &TextState, flags: &mut Flags) {
    if state.render_mode == 3 {
        flags.raise(SuspiciousKind::HiddenText, "PDF draws text in invisible render mode");
    }
    if state.fill_white {
        flags.raise(
            SuspiciousKind::WhiteText,
            "PDF draws white text that may be invisible on a white page",
        );
    }
    let effective = state.font_size.abs() * state.matrix_scale;
    if effective > 0.0 && effective < MIN_READABLE_FONT_PT {
        flags.raise(
            SuspiciousKind::MicroscopicText,
            format!("PDF contains microscopic text ({effective:.2}pt)"),
        );
    }
}

fn contains_subslice(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

// ────────────────────────────────────────────────────────────────────────────
// DOCX run-property checks
// ────────────────────────────────────────────────────────────────────────────

fn scan_docx(bytes: &[u8], flags: &mut Flags) {
    match docx::document_tree(bytes) {
        Ok(tree) => scan_docx_tree(&tree, flags),
        Err(e) => warn!("Skipping DOCX formatting checks: {e}"),
    }
}

/// Walks the serialized document looking for run properties that hide text.
fn scan_docx_tree(value: &Value, flags: &mut Flags) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                match key.as_str() {
                    "vanish" | "specVanish" if is_set(child) => flags.raise(
                        SuspiciousKind::HiddenText,
                        "DOCX contains runs formatted as hidden text",
                    ),
                    "color" if is_white(child) => flags.raise(
                        SuspiciousKind::WhiteText,
                        "DOCX contains white text that may be invisible on a white page",
                    ),
                    "sz" | "szCs" => {
                        if let Some(size) = child.as_f64() {
                            if size > 0.0 && size <= MIN_READABLE_DOCX_SIZE {
                                flags.raise(
                                    SuspiciousKind::MicroscopicText,
                                    format!("DOCX contains microscopic text ({:.1}pt)", size / 2.0),
                                );
                            }
                        }
                    }
                    _ => {}
                }
                scan_docx_tree(child, flags);
            }
        }
        Value::Array(items) => items.iter().for_each(|item| scan_docx_tree(item, flags)),
        _ => {}
    }
}

fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        _ => true,
    }
}

fn is_white(value: &Value) -> bool {
    value
        .as_str()
        .map(|s| {
            let s = s.trim_start_matches('#');
            s.eq_ignore_ascii_case("ffffff") || s.eq_ignore_ascii_case("white")
        })
        .unwrap_or(false)
}
