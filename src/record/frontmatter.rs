use std::collections::BTreeMap;

/// A task record split into its structured header and free-form body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub header: BTreeMap<String, String>,
    pub body: String,
}

impl Document {
    pub fn new(header: BTreeMap<String, String>, body: impl Into<String>) -> Self {
        Self {
            header,
            body: body.into(),
        }
    }

    /// Header value, trimmed, with empty values treated as absent.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.header
            .get(key)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }
}

/// Parses a record document. Total: any text that does not open with a `---`
/// delimiter line followed by a closing one is returned as body with an empty
/// header, never an error. Callers rely on that to treat unreadable metadata
/// as "no directive".
pub fn parse_document(text: &str) -> Document {
    let Some((header_block, body)) = split_frontmatter(text) else {
        return Document {
            header: BTreeMap::new(),
            body: text.to_string(),
        };
    };

    let mut header = BTreeMap::new();
    for line in header_block.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some((key, value)) = trimmed.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        header.insert(key.to_string(), strip_matching_quotes(value.trim()).to_string());
    }

    Document {
        header,
        body: body.to_string(),
    }
}

/// Renders a document back to text: delimiter, `key: value` lines in map
/// order, delimiter, body. Inverse of `parse_document` for inputs free of
/// delimiter collisions.
pub fn serialize_document(doc: &Document) -> String {
    let mut out = String::from("---\n");
    for (key, value) in &doc.header {
        out.push_str(key);
        out.push_str(": ");
        out.push_str(value);
        out.push('\n');
    }
    out.push_str("---\n");
    out.push_str(&doc.body);
    out
}

/// Returns `(header_block, body)` when the text opens with a delimiter line
/// and a matching closing delimiter exists, `None` otherwise.
fn split_frontmatter(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix("---")?;
    let opening_end = rest.find('\n')?;
    if !rest[..opening_end].trim().is_empty() {
        return None;
    }
    let after_open = &rest[opening_end + 1..];

    let mut scan = 0usize;
    loop {
        let line_end = after_open[scan..].find('\n').map(|idx| scan + idx);
        let line = match line_end {
            Some(end) => &after_open[scan..end],
            None => &after_open[scan..],
        };
        if line.trim() == "---" {
            let header_block = &after_open[..scan];
            let body = match line_end {
                Some(end) => &after_open[end + 1..],
                None => "",
            };
            return Some((header_block, body));
        }
        match line_end {
            Some(end) => scan = end + 1,
            None => return None,
        }
    }
}

/// Strips one matching pair of surrounding quotes (either style). No other
/// unescaping is performed.
fn strip_matching_quotes(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        let last = bytes[bytes.len() - 1];
        if first == last && (first == b'"' || first == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_header_and_body() {
        let doc = parse_document("---\ntype: task\npriority: high\n---\nDo the thing.\n");
        assert_eq!(doc.header.get("type").map(String::as_str), Some("task"));
        assert_eq!(doc.header.get("priority").map(String::as_str), Some("high"));
        assert_eq!(doc.body, "Do the thing.\n");
    }

    #[test]
    fn text_without_frontmatter_is_all_body() {
        let doc = parse_document("just notes\nno header here\n");
        assert!(doc.header.is_empty());
        assert_eq!(doc.body, "just notes\nno header here\n");
    }

    #[test]
    fn unterminated_frontmatter_is_all_body() {
        let text = "---\ntype: task\nno closing delimiter";
        let doc = parse_document(text);
        assert!(doc.header.is_empty());
        assert_eq!(doc.body, text);
    }

    #[test]
    fn delimiter_must_open_the_document() {
        let text = "\n---\ntype: task\n---\nbody";
        let doc = parse_document(text);
        assert!(doc.header.is_empty());
        assert_eq!(doc.body, text);
    }

    #[test]
    fn strips_one_matching_pair_of_quotes() {
        let doc = parse_document("---\nsubject: \"Quarterly report\"\nfrom: 'ops@firm.test'\nnested: \"'keep'\"\n---\n");
        assert_eq!(doc.field("subject"), Some("Quarterly report"));
        assert_eq!(doc.field("from"), Some("ops@firm.test"));
        assert_eq!(doc.field("nested"), Some("'keep'"));
    }

    #[test]
    fn mismatched_quotes_are_kept() {
        let doc = parse_document("---\nsubject: \"half open\n---\n");
        assert_eq!(doc.field("subject"), Some("\"half open"));
    }

    #[test]
    fn skips_blanks_comments_and_malformed_lines() {
        let doc = parse_document("---\n\n# a comment\nnot a pair\ntype: task\n---\nbody");
        assert_eq!(doc.header.len(), 1);
        assert_eq!(doc.field("type"), Some("task"));
    }

    #[test]
    fn value_may_contain_separators() {
        let doc = parse_document("---\nsubject: hello: world\n---\n");
        assert_eq!(doc.field("subject"), Some("hello: world"));
    }

    #[test]
    fn empty_document_parses_to_empty_parts() {
        let doc = parse_document("");
        assert!(doc.header.is_empty());
        assert!(doc.body.is_empty());
    }

    #[test]
    fn field_treats_blank_values_as_absent() {
        let doc = parse_document("---\naction_type:\nto: a@b.test\n---\n");
        assert_eq!(doc.field("action_type"), None);
        assert_eq!(doc.field("to"), Some("a@b.test"));
    }

    #[test]
    fn round_trips_header_and_body() {
        let mut header = BTreeMap::new();
        header.insert("type".to_string(), "task".to_string());
        header.insert("subject".to_string(), "weekly sync".to_string());
        let doc = Document::new(header, "line one\n\nline two\n");

        let parsed = parse_document(&serialize_document(&doc));
        assert_eq!(parsed, doc);
    }

    #[test]
    fn round_trips_empty_body() {
        let mut header = BTreeMap::new();
        header.insert("status".to_string(), "pending".to_string());
        let doc = Document::new(header, "");

        let parsed = parse_document(&serialize_document(&doc));
        assert_eq!(parsed, doc);
    }
}
