//! Delimited frontmatter parsing for entity files.
//!
//! Entity files open with a `---` fenced key/value block followed by free-text
//! body. Keys are parsed into an ordered list so unrecognized keys survive in
//! file order; the body is kept verbatim.

use thiserror::Error;

/// Ways a frontmatter block can be malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrontmatterError {
    #[error("missing opening '---' delimiter")]
    MissingOpening,
    #[error("missing closing '---' delimiter")]
    MissingClosing,
    #[error("invalid frontmatter line '{0}' (expected 'key: value')")]
    InvalidLine(String),
}

/// Parsed frontmatter: `key: value` pairs in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frontmatter {
    pairs: Vec<(String, String)>,
}

impl Frontmatter {
    /// First value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Pairs whose keys are not in `recognized`, in file order.
    pub fn extra(&self, recognized: &[&str]) -> Vec<(String, String)> {
        self.pairs
            .iter()
            .filter(|(k, _)| !recognized.contains(&k.as_str()))
            .cloned()
            .collect()
    }
}

/// An entity file split into frontmatter and verbatim body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub frontmatter: Frontmatter,
    pub body: String,
}

/// Parse a document that must carry a frontmatter block.
pub fn parse_document(contents: &str) -> Result<Document, FrontmatterError> {
    let Some(after_open) = contents.strip_prefix("---\n") else {
        return Err(FrontmatterError::MissingOpening);
    };
    let Some((block, body)) = split_at_close(after_open) else {
        return Err(FrontmatterError::MissingClosing);
    };
    let body = body.to_string();

    let mut pairs = Vec::new();
    for line in block.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some((key, value)) = trimmed.split_once(':') else {
            return Err(FrontmatterError::InvalidLine(trimmed.to_string()));
        };
        pairs.push((key.trim().to_string(), unquote(value.trim())));
    }
    Ok(Document {
        frontmatter: Frontmatter { pairs },
        body,
    })
}

/// Split the post-open slice at the first `---` delimiter line, consuming
/// exactly that line. Returns `(block, body)`.
fn split_at_close(after_open: &str) -> Option<(&str, &str)> {
    if let Some(body) = after_open.strip_prefix("---\n") {
        return Some(("", body));
    }
    if after_open == "---" {
        return Some(("", ""));
    }
    if let Some(pos) = after_open.find("\n---\n") {
        return Some((&after_open[..pos + 1], &after_open[pos + 5..]));
    }
    after_open
        .strip_suffix("\n---")
        .map(|block| (&after_open[..block.len() + 1], ""))
}

fn unquote(value: &str) -> String {
    let stripped = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')));
    stripped.unwrap_or(value).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_keys_and_body() {
        let doc = parse_document("---\ntitle: Add invoice\nstatus: pending\n---\n\n# Notes\n")
            .expect("parse");
        assert_eq!(doc.frontmatter.get("title"), Some("Add invoice"));
        assert_eq!(doc.frontmatter.get("status"), Some("pending"));
        assert_eq!(doc.body, "\n# Notes\n");
    }

    #[test]
    fn strips_quotes_from_values() {
        let doc = parse_document("---\ntitle: \"Add: invoice\"\n---\nbody\n").expect("parse");
        assert_eq!(doc.frontmatter.get("title"), Some("Add: invoice"));
    }

    #[test]
    fn preserves_unrecognized_keys_in_file_order() {
        let doc = parse_document("---\nzeta: 1\ntitle: T\nalpha: 2\n---\n").expect("parse");
        assert_eq!(
            doc.frontmatter.extra(&["title"]),
            vec![
                ("zeta".to_string(), "1".to_string()),
                ("alpha".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn missing_opening_delimiter_is_an_error() {
        assert_eq!(
            parse_document("title: T\n"),
            Err(FrontmatterError::MissingOpening)
        );
    }

    #[test]
    fn missing_closing_delimiter_is_an_error() {
        assert_eq!(
            parse_document("---\ntitle: T\n"),
            Err(FrontmatterError::MissingClosing)
        );
    }

    #[test]
    fn line_without_separator_is_an_error() {
        assert_eq!(
            parse_document("---\nnot a pair\n---\n"),
            Err(FrontmatterError::InvalidLine("not a pair".to_string()))
        );
    }

    #[test]
    fn comment_and_blank_lines_are_skipped() {
        let doc = parse_document("---\n# generated\n\ntitle: T\n---\nbody").expect("parse");
        assert_eq!(doc.frontmatter.get("title"), Some("T"));
        assert_eq!(doc.body, "body");
    }

    #[test]
    fn closing_delimiter_at_end_of_file_is_accepted() {
        let doc = parse_document("---\ntitle: T\n---").expect("parse");
        assert_eq!(doc.frontmatter.get("title"), Some("T"));
        assert_eq!(doc.body, "");
    }
}
