use std::sync::LazyLock;

use itertools::Itertools;
use regex::Regex;
use serde::Serialize;

use super::html::to_html;
use super::{
    link_target, required, RefText, BARE_LINK_RE, FRAME_REF_RE, LABELED_LINK_RE,
    NAMESPACED_LINK_RE,
};
use crate::error::ExtractError;

/// Only pages carrying this tag are OBS key terms.
pub const KEY_TERM_TAG: &str = "ktobs";

static TERM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"====== (.*?) ======").unwrap());
static SUB_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n==== (.*) ====\n").unwrap());
static DEF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)===== Definition: =====(.*?)[=(]").unwrap());
static FACTS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)===== Facts: =====(.*?)[=(]").unwrap());
static SUGGEST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)===== Translation Suggestions: =====(.*?)\([TS]").unwrap());
static SEE_ALSO_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"See also.*").unwrap());
static EXAMPLES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)===== Examples from the Bible stories.*").unwrap());
static EXAMPLE_TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r".*?\]\]\]\*\*(.*)").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DefTitle {
    Definition,
    Facts,
}

/// One key-term entry of the `kt` catalog. Fields are declared in key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyTerm {
    pub aliases: Vec<String>,
    pub cf: Vec<String>,
    pub def: String,
    pub def_title: DefTitle,
    pub ex: Vec<RefText>,
    pub id: String,
    pub sub: String,
    pub term: String,
}

impl KeyTerm {
    /// Fold in aliases observed elsewhere. Keeps first-seen order, drops
    /// duplicates, blanks and the term itself.
    pub fn merge_aliases<'a, I>(&mut self, observed: I)
    where
        I: IntoIterator<Item = &'a String>,
    {
        let current = std::mem::take(&mut self.aliases);
        self.aliases = current
            .into_iter()
            .chain(observed.into_iter().cloned())
            .filter(|a| !a.is_empty() && *a != self.term)
            .unique()
            .collect();
    }
}

/// Parse a key-term page. `Ok(None)` means the page is not tagged as an OBS
/// key term and should be left out.
pub fn extract_key_term(id: &str, page: &str) -> Result<Option<KeyTerm>, ExtractError> {
    if !page.contains(KEY_TERM_TAG) {
        return Ok(None);
    }
    let (term, aliases) = parse_term(page)?;
    let (def_title, mut def) = parse_definition(page)?;
    def.push_str(&parse_suggestions(page));

    let mut kt = KeyTerm {
        aliases: Vec::new(),
        cf: parse_cross_refs(page),
        def,
        def_title,
        ex: parse_examples(page),
        id: id.to_string(),
        sub: parse_subtitle(page),
        term,
    };
    kt.merge_aliases(&aliases);
    Ok(Some(kt))
}

/// `====== Term, Alias, Alias ======`
pub fn parse_term(page: &str) -> Result<(String, Vec<String>), ExtractError> {
    let caps = required(&TERM_RE, page, "term heading")?;
    let mut parts = caps[1].trim().split(',').map(str::trim);
    let term = parts.next().unwrap_or_default().to_string();
    let aliases = parts.map(str::to_string).collect();
    Ok((term, aliases))
}

pub fn parse_subtitle(page: &str) -> String {
    SUB_RE
        .captures(page)
        .map(|c| c[1].trim().to_string())
        .unwrap_or_default()
}

/// Definition body, falling back to the Facts section.
pub fn parse_definition(page: &str) -> Result<(DefTitle, String), ExtractError> {
    let (title, caps) = match DEF_RE.captures(page) {
        Some(caps) => (DefTitle::Definition, caps),
        None => (
            DefTitle::Facts,
            required(&FACTS_RE, page, "Definition or Facts")?,
        ),
    };
    Ok((title, to_html(caps[1].trim_end())))
}

/// Rendered "Translation Suggestions" block, or empty when the page has none.
pub fn parse_suggestions(page: &str) -> String {
    match SUGGEST_RE.captures(page) {
        Some(caps) => to_html(&format!(
            "<h2>Translation Suggestions</h2>{}",
            caps[1].trim_end()
        )),
        None => String::new(),
    }
}

/// Link targets on the "See also" line: labeled, namespaced, then bare links.
pub fn parse_cross_refs(page: &str) -> Vec<String> {
    let Some(m) = SEE_ALSO_RE.find(page) else {
        return Vec::new();
    };
    let text = m.as_str();
    let labeled = LABELED_LINK_RE
        .captures_iter(text)
        .map(|c| link_target(&c[1]).to_string());
    let namespaced = NAMESPACED_LINK_RE
        .captures_iter(text)
        .map(|c| link_target(&c[1]).to_string());
    let bare = BARE_LINK_RE.captures_iter(text).map(|c| c[1].to_string());
    labeled.chain(namespaced).chain(bare).collect()
}

pub fn parse_examples(page: &str) -> Vec<RefText> {
    let Some(section) = EXAMPLES_RE.find(page) else {
        return Vec::new();
    };
    section
        .as_str()
        .split('\n')
        .filter_map(|line| {
            let reference = FRAME_REF_RE.find(line)?.as_str().to_string();
            let Some(caps) = EXAMPLE_TEXT_RE.captures(line) else {
                tracing::warn!(line, "example line without story text");
                return None;
            };
            Some(RefText {
                reference,
                text: to_html(caps[1].trim()),
            })
        })
        .collect()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}.txt", name)).unwrap()
    }

    #[test]
    fn god_page() {
        let kt = extract_key_term("god", &fixture("kt_god")).unwrap().unwrap();
        assert_eq!(kt.id, "god");
        assert_eq!(kt.term, "God");
        assert!(kt.aliases.is_empty());
        assert_eq!(kt.sub, "");
        assert_eq!(kt.def_title, DefTitle::Definition);
        assert!(kt.def.starts_with("In the Bible, the term"));
        assert!(kt.def.contains("<ul><li>God always was"));
        assert!(kt.def.contains("<h2>Translation Suggestions</h2><ul><li>Ways to translate"));
        assert!(kt.def.ends_with("national language.</li></ul>"));
    }

    #[test]
    fn god_cross_refs_in_syntax_order() {
        let kt = extract_key_term("god", &fixture("kt_god")).unwrap().unwrap();
        assert_eq!(
            kt.cf,
            vec!["falsegod", "creation", "falsegod", "holy", "creation", "worship"]
        );
    }

    #[test]
    fn god_examples() {
        let kt = extract_key_term("god", &fixture("kt_god")).unwrap().unwrap();
        assert_eq!(kt.ex.len(), 2);
        assert_eq!(kt.ex[0].reference, "01-01");
        assert_eq!(
            kt.ex[0].text,
            "<b>God</b> created the universe and everything in it in six days."
        );
        assert_eq!(kt.ex[1].reference, "01-16");
    }

    #[test]
    fn jesus_page_uses_facts_and_subtitle() {
        let kt = extract_key_term("jesus", &fixture("kt_jesus")).unwrap().unwrap();
        assert_eq!(kt.term, "Jesus");
        assert_eq!(kt.aliases, vec!["Christ Jesus"]);
        assert_eq!(kt.sub, "Son of God");
        assert_eq!(kt.def_title, DefTitle::Facts);
        assert_eq!(
            kt.def,
            "Jesus is <b>God's</b> Son. He is also called the <b>Messiah</b>.\
             <ul><li>Jesus was born in Bethlehem.</li></ul>"
        );
        assert_eq!(kt.cf, vec!["sonofgod", "sonofgod"]);
        assert_eq!(
            kt.ex,
            vec![RefText {
                reference: "22-04".into(),
                text: "An angel told Mary that her son would be called <b>Jesus</b>.".into(),
            }]
        );
    }

    #[test]
    fn optional_sections_default_to_empty() {
        let page = "====== Holy ======\n\n===== Definition: =====\n\nSet apart for God.\n\n\
                    ===== Notes: =====\n\nNone yet.\n\n{{tag>ktobs}}\n";
        let kt = extract_key_term("holy", page).unwrap().unwrap();
        assert_eq!(kt.def_title, DefTitle::Definition);
        assert_eq!(kt.def, "Set apart for God.");
        assert_eq!(kt.sub, "");
        assert!(kt.cf.is_empty());
        assert!(kt.ex.is_empty());
    }

    #[test]
    fn untagged_page_is_skipped() {
        assert_eq!(extract_key_term("grace", &fixture("kt_untagged")).unwrap(), None);
    }

    #[test]
    fn missing_definition_is_an_error() {
        let page = "====== Lost ======\n\nNo sections here.\n{{tag>ktobs}}\n";
        assert_eq!(
            extract_key_term("lost", page),
            Err(ExtractError::missing("Definition or Facts"))
        );
    }

    #[test]
    fn missing_heading_is_an_error() {
        let page = "===== Definition: =====\nbody\n{{tag>ktobs}}\n";
        assert_eq!(
            extract_key_term("x", page),
            Err(ExtractError::missing("term heading"))
        );
    }

    #[test]
    fn merge_drops_self_and_duplicates() {
        let mut kt = extract_key_term("jesus", &fixture("kt_jesus")).unwrap().unwrap();
        let seen = vec![
            "Jesus".to_string(),
            "Christ".to_string(),
            "Christ Jesus".to_string(),
            "Christ".to_string(),
        ];
        kt.merge_aliases(&seen);
        assert_eq!(kt.aliases, vec!["Christ Jesus", "Christ"]);
    }
}
