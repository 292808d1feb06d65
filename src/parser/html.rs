use std::sync::LazyLock;

use regex::Regex;

// Bold opens after a space or punctuation and closes before one. Whatever is
// left over afterwards is treated as an opening marker.
static BOLD_START_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([ ,.])(\*\*)").unwrap());
static BOLD_STOP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\*\*)([ ,.'!])").unwrap());
static BOLD_ANY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*").unwrap());
static H3_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n=== (.*?) ===\n").unwrap());
static LI_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^ +\* ").unwrap());

/// Render a DokuWiki fragment to the HTML subset the API consumers expect.
pub fn to_html(text: &str) -> String {
    let text = BOLD_START_RE.replace_all(text, "${1}<b>");
    let text = BOLD_STOP_RE.replace_all(&text, "</b>${2}");
    let text = BOLD_ANY_RE.replace_all(&text, "<b>");
    let text = H3_RE.replace_all(&text, "<h3>${1}</h3>");
    render_lists(&text).trim().to_string()
}

/// Single forward pass: runs of bullet lines become one `<ul>`. Lines are
/// concatenated without separators, as the published catalogs always were.
fn render_lists(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut in_list = false;
    for line in text.split('\n') {
        if LI_RE.is_match(line) {
            if !in_list {
                in_list = true;
                out.push_str("<ul>");
            }
            out.push_str(&LI_RE.replacen(line, 1, "<li>"));
            out.push_str("</li>");
        } else {
            if in_list {
                in_list = false;
                out.push_str("</ul>");
            }
            out.push_str(line);
        }
    }
    if in_list {
        out.push_str("</ul>");
    }
    out
}

// ── Tests ──
