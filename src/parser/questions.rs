use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static QUESTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[–-] \*\*(.*)\*\*").unwrap());
static ANSWER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\* ?//(.*)//").unwrap());
static CITATION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[(.*?)]").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    pub a: String,
    pub q: String,
    #[serde(rename = "ref")]
    pub refs: Vec<String>,
}

/// One entry of the `CQ` catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Story {
    pub cq: Vec<Question>,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionPage {
    pub story: Story,
    /// Indented lines that were neither a question nor an answer.
    pub unrecognized: Vec<String>,
}

pub fn extract_story(id: &str, page: &str) -> QuestionPage {
    let (cq, unrecognized) = parse_questions(page);
    QuestionPage {
        story: Story {
            cq,
            id: id.to_string(),
        },
        unrecognized,
    }
}

/// Pair `- **question**` lines with the `* //answer [ref]//` line that follows.
/// Only indented lines are considered; anything else indented is reported back.
pub fn parse_questions(page: &str) -> (Vec<Question>, Vec<String>) {
    let mut cq = Vec::new();
    let mut unrecognized = Vec::new();
    let mut pending: Option<String> = None;

    for line in page.lines() {
        if !line.starts_with("  ") {
            continue;
        }
        if let Some(caps) = QUESTION_RE.captures(line) {
            pending = Some(caps[1].trim().to_string());
        } else if let Some(caps) = ANSWER_RE.captures(line) {
            let Some(q) = pending.take() else {
                tracing::warn!(line, "answer without a preceding question");
                unrecognized.push(line.to_string());
                continue;
            };
            let raw = caps[1].trim();
            let refs = CITATION_RE
                .captures_iter(raw)
                .map(|c| c[1].to_string())
                .collect();
            let a = raw.split('[').next().unwrap_or_default().trim().to_string();
            cq.push(Question { a, q, refs });
        } else {
            tracing::warn!(line, "unrecognized question line");
            unrecognized.push(line.to_string());
        }
    }

    (cq, unrecognized)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creation_questions() {
        let page = std::fs::read_to_string("tests/fixtures/questions_01.txt").unwrap();
        let parsed = extract_story("01", &page);
        assert_eq!(parsed.story.id, "01");
        assert!(parsed.unrecognized.is_empty());
        assert_eq!(parsed.story.cq.len(), 2);

        let first = &parsed.story.cq[0];
        assert_eq!(first.q, "Where did everything come from?");
        assert_eq!(first.a, "God created everything.");
        assert_eq!(first.refs, vec!["01-01"]);

        let second = &parsed.story.cq[1];
        assert_eq!(second.q, "How did God create light?");
        assert_eq!(second.a, "God said, \"Let there be light!\"");
        assert_eq!(second.refs, vec!["01-03", "01-04"]);
    }

    #[test]
    fn stray_indented_lines_are_reported() {
        let page = "  some note\n  * //orphan answer [02-01]//\nunindented text\n";
        let (cq, unrecognized) = parse_questions(page);
        assert!(cq.is_empty());
        assert_eq!(
            unrecognized,
            vec!["  some note", "  * //orphan answer [02-01]//"]
        );
    }

    #[test]
    fn unindented_lines_are_ignored() {
        let (cq, unrecognized) = parse_questions("- **Not indented?**\n* //nope//\n");
        assert!(cq.is_empty());
        assert!(unrecognized.is_empty());
    }
}
