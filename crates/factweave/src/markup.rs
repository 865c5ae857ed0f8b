//! Inline lookup markup: scanning `[__DC__("QUERY") --> "CLAIM"]` spans.
//!
//! The grammar excludes the quote character from both fields, so no escaping
//! exists and a bounded hand-written scanner suffices. The trailing `]` is
//! optional: truncated model output must still match.

/// Opening marker of a lookup span.
const OPEN: &str = "[__DC__(\"";
/// Separator between the query and the claimed value.
const SEP: &str = "\") --> \"";

/// One well-formed markup span found in text. `start..end` are byte offsets
/// covering the whole span (including the trailing `]` when present).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupSpan {
    pub start: usize,
    pub end: usize,
    pub query: String,
    pub claim: String,
}

/// Ordered multimap from query to the claimed values found for it, grouped
/// by query in first-seen order with duplicates preserved.
#[derive(Debug, Clone, Default)]
pub struct ClaimMap {
    entries: Vec<(String, Vec<String>)>,
}

impl ClaimMap {
    pub fn push(&mut self, query: &str, claim: &str) {
        match self.entries.iter_mut().find(|(q, _)| q == query) {
            Some((_, claims)) => claims.push(claim.to_string()),
            None => self
                .entries
                .push((query.to_string(), vec![claim.to_string()])),
        }
    }

    pub fn get(&self, query: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(q, _)| q == query)
            .map(|(_, claims)| claims.as_slice())
    }

    /// Unique queries in first-seen order.
    pub fn queries(&self) -> Vec<String> {
        self.entries.iter().map(|(q, _)| q.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Scan `text` for markup spans, left to right, non-overlapping.
///
/// A candidate that opens with `[__DC__("` but does not complete the grammar
/// (empty query, missing separator, unterminated claim) is skipped and left
/// untouched; scanning resumes one byte past its `[`.
pub fn scan_spans(text: &str) -> Vec<MarkupSpan> {
    let mut spans = Vec::new();
    let mut cursor = 0;

    while let Some(rel) = text[cursor..].find(OPEN) {
        let open_at = cursor + rel;
        match parse_span(text, open_at) {
            Some(span) => {
                cursor = span.end;
                spans.push(span);
            }
            None => cursor = open_at + 1,
        }
    }

    spans
}

/// Try to parse one span starting at `open_at` (which points at `[`).
fn parse_span(text: &str, open_at: usize) -> Option<MarkupSpan> {
    let query_start = open_at + OPEN.len();
    let query_len = text[query_start..].find('"')?;
    if query_len == 0 {
        return None;
    }
    let query = &text[query_start..query_start + query_len];

    if !text[query_start + query_len..].starts_with(SEP) {
        return None;
    }
    let claim_start = query_start + query_len + SEP.len();
    let claim_len = text[claim_start..].find('"')?;
    let claim = &text[claim_start..claim_start + claim_len];

    let mut end = claim_start + claim_len + 1;
    if text[end..].starts_with(']') {
        end += 1;
    }

    Some(MarkupSpan {
        start: open_at,
        end,
        query: query.to_string(),
        claim: claim.to_string(),
    })
}

/// Extract every span plus the ordered claim multimap. Text with no markup
/// yields empty results; this is not an error.
pub fn extract_claims(text: &str) -> (Vec<MarkupSpan>, ClaimMap) {
    let spans = scan_spans(text);
    let mut claims = ClaimMap::default();
    for span in &spans {
        claims.push(&span.query, &span.claim);
    }
    (spans, claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_basic_span() {
        let text = r#"Pop is [__DC__("population of X") --> "10 million"]."#;
        let (spans, claims) = extract_claims(text);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].query, "population of X");
        assert_eq!(spans[0].claim, "10 million");
        assert_eq!(&text[spans[0].start..spans[0].end],
                   r#"[__DC__("population of X") --> "10 million"]"#);
        assert_eq!(claims.get("population of X").unwrap(), ["10 million"]);
    }

    #[test]
    fn empty_claim_is_valid() {
        let (spans, _) = extract_claims(r#"[__DC__("q") --> ""]"#);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].claim, "");
    }

    #[test]
    fn trailing_bracket_is_optional() {
        // Truncated model output: the span is cut off after the claim quote.
        let text = r#"value [__DC__("q") --> "5""#;
        let (spans, _) = extract_claims(text);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].end, text.len());
    }

    #[test]
    fn empty_query_is_rejected() {
        let (spans, claims) = extract_claims(r#"[__DC__("") --> "5"]"#);
        assert!(spans.is_empty());
        assert!(claims.is_empty());
    }

    #[test]
    fn malformed_separator_is_skipped() {
        let (spans, _) = extract_claims(r#"[__DC__("q") -> "5"]"#);
        assert!(spans.is_empty());
    }

    #[test]
    fn no_markup_yields_empty_map() {
        let (spans, claims) = extract_claims("plain prose with [brackets] and \"quotes\"");
        assert!(spans.is_empty());
        assert!(claims.is_empty());
    }

    #[test]
    fn duplicate_queries_group_in_order() {
        let text = concat!(
            r#"[__DC__("a") --> "1"] then [__DC__("b") --> "2"] "#,
            r#"then [__DC__("a") --> "3"]"#
        );
        let (spans, claims) = extract_claims(text);
        assert_eq!(spans.len(), 3);
        assert_eq!(claims.queries(), ["a", "b"]);
        assert_eq!(claims.get("a").unwrap(), ["1", "3"]);
        assert_eq!(claims.get("b").unwrap(), ["2"]);
    }

    #[test]
    fn malformed_candidate_does_not_mask_later_span() {
        let text = r#"[__DC__("broken [__DC__("q") --> "5"]"#;
        // The first candidate swallows up to the next quote as its query and
        // then fails on the separator; rescanning from inside it finds the
        // inner well-formed span.
        let (spans, _) = extract_claims(text);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].query, "q");
    }
}
