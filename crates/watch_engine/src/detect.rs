use ego_tree::iter::Edge;
use scraper::{Html, Node};

/// Elements whose text never reaches the reader.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style"];

/// Normalized set of required keywords: trimmed, lowercased, de-duplicated,
/// in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Keywords(Vec<String>);

impl Keywords {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for keyword in keywords {
            let keyword = keyword.as_ref().trim().to_lowercase();
            if !keyword.is_empty() && !normalized.contains(&keyword) {
                normalized.push(keyword);
            }
        }
        Self(normalized)
    }

    /// Parses a comma separated list such as `placement, test,B2`.
    pub fn parse_list(raw: &str) -> Self {
        Self::new(raw.split(','))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    fn all_in(&self, text: &str) -> bool {
        self.iter().all(|keyword| text.contains(keyword))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatchResult {
    pub found: bool,
    pub matched_line: Option<String>,
}

impl MatchResult {
    pub fn not_found() -> Self {
        Self::default()
    }

    fn matched(line: &str) -> Self {
        Self {
            found: true,
            matched_line: Some(line.to_string()),
        }
    }
}

/// Detection result plus the document-wide keyword gate that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub presence: Vec<(String, bool)>,
    pub result: MatchResult,
}

/// Searches `html` for the first line holding every keyword.
pub fn detect(html: &str, keywords: &Keywords) -> MatchResult {
    analyze(html, keywords).result
}

/// Like [`detect`], also reporting which keywords appear anywhere in the page.
///
/// The line scan only runs once every keyword passed the document-wide gate.
/// Keywords that are all present but never share a line yield "not found".
pub fn analyze(html: &str, keywords: &Keywords) -> Analysis {
    let text = flatten_text(html);
    let presence: Vec<(String, bool)> = keywords
        .iter()
        .map(|keyword| (keyword.to_string(), text.contains(keyword)))
        .collect();

    let gate_open = !keywords.is_empty() && presence.iter().all(|(_, present)| *present);
    let result = if gate_open {
        text.split('\n')
            .map(str::trim)
            .find(|line| keywords.all_in(line))
            .map(MatchResult::matched)
            .unwrap_or_default()
    } else {
        MatchResult::not_found()
    };

    Analysis { presence, result }
}

/// Concatenates every text node outside `<script>`/`<style>`, lowercased.
/// Line breaks come from the markup's own whitespace.
pub fn flatten_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let mut text = String::with_capacity(html.len() / 2);
    let mut skip_depth = 0usize;

    for edge in doc.tree.root().traverse() {
        match edge {
            Edge::Open(node) => match node.value() {
                Node::Element(element) if is_skipped(element.name()) => skip_depth += 1,
                Node::Text(chunk) if skip_depth == 0 => text.push_str(chunk),
                _ => {}
            },
            Edge::Close(node) => {
                if let Node::Element(element) = node.value() {
                    if is_skipped(element.name()) {
                        skip_depth = skip_depth.saturating_sub(1);
                    }
                }
            }
        }
    }

    text.to_lowercase()
}

fn is_skipped(name: &str) -> bool {
    SKIPPED_ELEMENTS
        .iter()
        .any(|skipped| skipped.eq_ignore_ascii_case(name))
}
