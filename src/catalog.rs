use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use serde_json::{json, Value};

use crate::parser::frame::{Frame, ImportantTerms};
use crate::parser::keyterm::KeyTerm;
use crate::parser::questions::Story;

/// Published catalog kinds and their file-name tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    KeyTerms,
    Notes,
    Questions,
    TermUsage,
}

impl ContentType {
    pub fn tag(self) -> &'static str {
        match self {
            ContentType::KeyTerms => "kt",
            ContentType::Notes => "tN",
            ContentType::Questions => "CQ",
            ContentType::TermUsage => "tw_cat",
        }
    }

    /// `<dir>/<tag>-<lang>.json`
    pub fn path_in(self, dir: &Path, lang: &str) -> PathBuf {
        dir.join(format!("{}-{}.json", self.tag(), lang))
    }
}

/// Today's date as `YYYYMMDD`.
pub fn today_stamp() -> String {
    Local::now().format("%Y%m%d").to_string()
}

/// Records of one kind followed by a `{"date_modified": ...}` sentinel.
#[derive(Debug, Clone)]
pub struct Catalog<T> {
    pub records: Vec<T>,
    pub date_modified: String,
}

impl<T: Serialize> Catalog<T> {
    pub fn new(records: Vec<T>, date_modified: impl Into<String>) -> Self {
        Catalog {
            records,
            date_modified: date_modified.into(),
        }
    }

    /// Serialize with object keys in sorted order and the stamp last.
    pub fn to_json(&self) -> Result<String> {
        let mut items = self
            .records
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<Value>, _>>()?;
        items.push(json!({ "date_modified": self.date_modified }));
        Ok(serde_json::to_string(&Value::Array(items))?)
    }
}

/// Longest term first; equal lengths keep their order.
pub fn sort_key_terms(terms: &mut [KeyTerm]) {
    terms.sort_by(|a, b| b.term.chars().count().cmp(&a.term.chars().count()));
}

pub fn sort_frames(frames: &mut [Frame]) {
    frames.sort_by(|a, b| a.id.cmp(&b.id));
}

pub fn sort_stories(stories: &mut [Story]) {
    stories.sort_by(|a, b| a.id.cmp(&b.id));
}

// ── Alias side table ──

/// Collects `term|label` pairs while frames are being read.
#[derive(Debug, Default)]
pub struct AliasCollector {
    seen: HashMap<String, Vec<String>>,
}

impl AliasCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, terms: &ImportantTerms) {
        for (term, label) in &terms.aliases {
            self.seen
                .entry(term.clone())
                .or_default()
                .push(label.clone());
        }
    }

    /// End of the frame pass. The returned table is read-only.
    pub fn finish(self) -> AliasTable {
        AliasTable { seen: self.seen }
    }
}

#[derive(Debug, Default)]
pub struct AliasTable {
    seen: HashMap<String, Vec<String>>,
}

impl AliasTable {
    pub fn get(&self, term_id: &str) -> &[String] {
        self.seen.get(term_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn apply(&self, terms: &mut [KeyTerm]) {
        for kt in terms {
            let observed = self.get(&kt.id);
            if !observed.is_empty() {
                kt.merge_aliases(observed);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

// ── Term usage (tw_cat) ──

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermRef {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameTerms {
    pub id: String,
    pub items: Vec<TermRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChapterTerms {
    pub frames: Vec<FrameTerms>,
    pub id: String,
}

/// The `tw_cat` document. Unlike the other catalogs the stamp is a key of
/// the top-level object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermCatalog {
    pub chapters: Vec<ChapterTerms>,
    pub date_modified: String,
}

impl TermCatalog {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&serde_json::to_value(self)?)?)
    }
}

/// Chapter-keyed list of the key terms each frame links to.
#[derive(Debug, Default)]
pub struct TermUsageCollector {
    chapters: BTreeMap<String, Vec<FrameTerms>>,
}

impl TermUsageCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, frame: &Frame, terms: &ImportantTerms) {
        let (chapter, frame_no) = frame.chapter_and_frame();
        let items = terms
            .used
            .iter()
            .map(|id| TermRef { id: id.clone() })
            .collect();
        self.chapters
            .entry(chapter.to_string())
            .or_default()
            .push(FrameTerms {
                id: frame_no.to_string(),
                items,
            });
    }

    /// End of the frame pass: chapters and frames come out sorted by id.
    pub fn finish(self, date_modified: impl Into<String>) -> TermCatalog {
        let chapters = self
            .chapters
            .into_iter()
            .map(|(id, mut frames)| {
                frames.sort_by(|a, b| a.id.cmp(&b.id));
                ChapterTerms { frames, id }
            })
            .collect();
        TermCatalog {
            chapters,
            date_modified: date_modified.into(),
        }
    }
}

/// Write a serialized catalog, creating the directory if needed.
pub fn write_json(path: &Path, json: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {:?}", parent))?;
    }
    fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::keyterm::DefTitle;
    use crate::parser::RefText;

    fn kt(id: &str, term: &str) -> KeyTerm {
        KeyTerm {
            aliases: Vec::new(),
            cf: Vec::new(),
            def: String::new(),
            def_title: DefTitle::Definition,
            ex: Vec::new(),
            id: id.to_string(),
            sub: String::new(),
            term: term.to_string(),
        }
    }

    fn frame(id: &str) -> Frame {
        Frame {
            id: id.to_string(),
            tn: vec![RefText {
                reference: "word".into(),
                text: "note".into(),
            }],
        }
    }

    fn terms(aliases: &[(&str, &str)], used: &[&str]) -> ImportantTerms {
        ImportantTerms {
            aliases: aliases
                .iter()
                .map(|(t, a)| (t.to_string(), a.to_string()))
                .collect(),
            used: used.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn content_type_file_names() {
        let dir = Path::new("/api/en");
        assert_eq!(ContentType::KeyTerms.path_in(dir, "en"), dir.join("kt-en.json"));
        assert_eq!(ContentType::Notes.path_in(dir, "en"), dir.join("tN-en.json"));
        assert_eq!(ContentType::Questions.path_in(dir, "en"), dir.join("CQ-en.json"));
        assert_eq!(ContentType::TermUsage.path_in(dir, "en"), dir.join("tw_cat-en.json"));
    }

    #[test]
    fn stamp_is_eight_digits() {
        let stamp = today_stamp();
        assert_eq!(stamp.len(), 8);
        assert!(stamp.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn catalog_ends_with_stamp_and_sorts_keys() {
        let json = Catalog::new(vec![frame("01-01")], "20240102").to_json().unwrap();
        assert_eq!(
            json,
            r#"[{"id":"01-01","tn":[{"ref":"word","text":"note"}]},{"date_modified":"20240102"}]"#
        );
    }

    #[test]
    fn key_term_keys_are_sorted() {
        let json = Catalog::new(vec![kt("god", "God")], "20240102").to_json().unwrap();
        assert_eq!(
            json,
            r#"[{"aliases":[],"cf":[],"def":"","def_title":"Definition","ex":[],"id":"god","sub":"","term":"God"},{"date_modified":"20240102"}]"#
        );
    }

    #[test]
    fn empty_catalog_is_only_the_stamp() {
        let json = Catalog::<Frame>::new(Vec::new(), "20240102").to_json().unwrap();
        assert_eq!(json, r#"[{"date_modified":"20240102"}]"#);
    }

    #[test]
    fn key_terms_sort_longest_first_and_stable() {
        let mut terms = vec![
            kt("a", "ab"),
            kt("b", "abcd"),
            kt("c", "cd"),
            kt("d", "Ábcd"),
            kt("e", "x"),
        ];
        sort_key_terms(&mut terms);
        let ids: Vec<&str> = terms.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "d", "a", "c", "e"]);
    }

    #[test]
    fn frames_sort_by_id() {
        let mut frames = vec![frame("02-01"), frame("01-10"), frame("01-02")];
        sort_frames(&mut frames);
        let ids: Vec<&str> = frames.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["01-02", "01-10", "02-01"]);
    }

    #[test]
    fn alias_table_merges_into_key_terms() {
        let mut collector = AliasCollector::new();
        collector.record(&terms(&[("god", "God"), ("god", "Yahweh")], &[]));
        collector.record(&terms(&[("god", "Yahweh"), ("sin", "sins")], &[]));
        let table = collector.finish();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("god"), ["God", "Yahweh", "Yahweh"]);
        assert!(table.get("holy").is_empty());

        let mut kts = vec![kt("god", "God"), kt("holy", "holy")];
        table.apply(&mut kts);
        assert_eq!(kts[0].aliases, vec!["Yahweh"]);
        assert!(kts[1].aliases.is_empty());
    }

    #[test]
    fn term_usage_groups_by_chapter() {
        let mut usage = TermUsageCollector::new();
        usage.record(&frame("02-01"), &terms(&[], &["faith"]));
        usage.record(&frame("01-03"), &terms(&[], &["god", "light"]));
        usage.record(&frame("01-01"), &terms(&[], &["god"]));
        let cat = usage.finish("20240102");

        assert_eq!(cat.chapters.len(), 2);
        assert_eq!(cat.chapters[0].id, "01");
        let frame_ids: Vec<&str> = cat.chapters[0].frames.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(frame_ids, vec!["01", "03"]);
        assert_eq!(
            cat.to_json().unwrap(),
            r#"{"chapters":[{"frames":[{"id":"01","items":[{"id":"god"}]},{"id":"03","items":[{"id":"god"},{"id":"light"}]}],"id":"01"},{"frames":[{"id":"01","items":[{"id":"faith"}]}],"id":"02"}],"date_modified":"20240102"}"#
        );
    }
}
