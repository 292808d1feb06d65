use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::html::to_html;
use super::{link_target, required, RefText, FRAME_REF_RE, LABELED_LINK_RE, NAMESPACED_LINK_RE};
use crate::error::ExtractError;

static NOTES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)==== Translation Notes.*").unwrap());
static TERMS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)==== Important Terms: ====(.*?)====").unwrap());
static NOTE_TERM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" \*\*(.*?)\*\* ").unwrap());
static NOTE_TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*  ?[–-]  ?(.*)").unwrap());

/// One entry of the `tN` catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frame {
    pub id: String,
    pub tn: Vec<RefText>,
}

/// Links listed under a frame's "Important Terms" heading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportantTerms {
    /// `(term id, label)` for every labeled link.
    pub aliases: Vec<(String, String)>,
    /// Key-term ids referenced through namespaced links, in page order.
    pub used: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePage {
    pub frame: Frame,
    pub terms: ImportantTerms,
}

impl Frame {
    /// Split `CC-FF` into chapter and frame numbers.
    pub fn chapter_and_frame(&self) -> (&str, &str) {
        self.id.split_once('-').unwrap_or((self.id.as_str(), ""))
    }
}

/// Parse a frame page. The id comes from the `NN-NN` reference in the file name.
pub fn extract_frame(file_name: &str, page: &str) -> Result<FramePage, ExtractError> {
    let id = FRAME_REF_RE
        .find(file_name)
        .ok_or_else(|| ExtractError::MissingFrameId(file_name.to_string()))?
        .as_str()
        .to_string();
    let terms = parse_important_terms(page)?;
    let tn = parse_notes(page)?;
    Ok(FramePage {
        frame: Frame { id, tn },
        terms,
    })
}

pub fn parse_important_terms(page: &str) -> Result<ImportantTerms, ExtractError> {
    let caps = required(&TERMS_RE, page, "Important Terms")?;
    let text = caps[1].trim();

    let aliases = LABELED_LINK_RE
        .captures_iter(text)
        .filter_map(|c| {
            let (term, label) = c[1].split_once('|')?;
            Some((term.to_string(), label.to_string()))
        })
        .collect();
    let used = NAMESPACED_LINK_RE
        .captures_iter(text)
        .map(|c| link_target(&c[1]).to_string())
        .collect();
    Ok(ImportantTerms { aliases, used })
}

/// Bolded-term lines of the "Translation Notes" section, in page order.
pub fn parse_notes(page: &str) -> Result<Vec<RefText>, ExtractError> {
    let section = NOTES_RE
        .find(page)
        .ok_or(ExtractError::missing("Translation Notes"))?;

    let mut notes = Vec::new();
    for line in section.as_str().split('\n') {
        let Some(term) = NOTE_TERM_RE.captures(line) else {
            continue;
        };
        let Some(text) = NOTE_TEXT_RE.captures(line) else {
            tracing::warn!(line, "note term without dash-separated text");
            continue;
        };
        notes.push(RefText {
            reference: term[1].to_string(),
            text: to_html(text[1].trim()),
        });
    }
    Ok(notes)
}

// ── Tests ──
