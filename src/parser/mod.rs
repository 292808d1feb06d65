pub mod frame;
pub mod html;
pub mod keyterm;
pub mod questions;

use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Serialize;

use crate::error::ExtractError;

// Wiki link syntaxes: `[[...:target|label]]`, `[[lang:obe:ns:target]]`, `[[target]]`.
pub(crate) static LABELED_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":([^:]*\|.*?)\]\]").unwrap());
pub(crate) static NAMESPACED_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w[\w-]*:obe:[ktoher]*:(.*?)\]\]").unwrap());
pub(crate) static BARE_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[(\w+)\]\]").unwrap());

/// Chapter-frame reference such as `01-02`.
pub(crate) static FRAME_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-5][0-9]-[0-9][0-9]").unwrap());

/// A `{ref, text}` pair, shared by key-term examples and translation notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefText {
    #[serde(rename = "ref")]
    pub reference: String,
    pub text: String,
}

/// Page ID is the file name without its `.txt` extension.
pub fn page_id(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.strip_suffix(".txt") {
        Some(stem) => stem.to_string(),
        None => name,
    }
}

/// Link target with any `|label` suffix dropped.
pub(crate) fn link_target(link: &str) -> &str {
    link.split('|').next().unwrap_or(link)
}

/// Captures for a section the page cannot be exported without.
fn required<'t>(
    re: &Regex,
    text: &'t str,
    section: &'static str,
) -> Result<Captures<'t>, ExtractError> {
    re.captures(text).ok_or(ExtractError::missing(section))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn page_id_strips_extension() {
        assert_eq!(page_id(&PathBuf::from("/pages/en/obe/kt/god.txt")), "god");
        assert_eq!(page_id(&PathBuf::from("notes/01.txt")), "01");
        assert_eq!(page_id(&PathBuf::from("README")), "README");
    }
}
