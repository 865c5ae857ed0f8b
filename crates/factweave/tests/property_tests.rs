//! Property-based tests for the markup scanner and reconciliation.

use factweave::{extract_claims, reconcile, FetchResults};
use proptest::prelude::*;

/// Prose that cannot contain the opening marker.
fn prose_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .,;:%-]{0,80}"
}

/// Queries exclude the quote character (the grammar has no escaping).
fn query_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ?%.-]{1,40}"
}

fn claim_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 %.-]{0,20}"
}

proptest! {
    #[test]
    fn prose_never_extracts(text in prose_strategy()) {
        let (spans, claims) = extract_claims(&text);
        prop_assert!(spans.is_empty());
        prop_assert!(claims.is_empty());
    }

    #[test]
    fn embedded_span_is_found_verbatim(
        prefix in prose_strategy(),
        query in query_strategy(),
        claim in claim_strategy(),
        suffix in prose_strategy(),
    ) {
        let text = format!("{prefix}[__DC__(\"{query}\") --> \"{claim}\"]{suffix}");
        let (spans, claims) = extract_claims(&text);
        prop_assert_eq!(spans.len(), 1);
        prop_assert_eq!(&spans[0].query, &query);
        prop_assert_eq!(&spans[0].claim, &claim);
        prop_assert_eq!(claims.get(&query).unwrap(), [claim]);
    }

    #[test]
    fn span_offsets_cover_the_span(
        prefix in prose_strategy(),
        query in query_strategy(),
        claim in claim_strategy(),
    ) {
        let span_text = format!("[__DC__(\"{query}\") --> \"{claim}\"]");
        let text = format!("{prefix}{span_text}");
        let (spans, _) = extract_claims(&text);
        prop_assert_eq!(spans.len(), 1);
        prop_assert_eq!(&text[spans[0].start..spans[0].end], span_text.as_str());
    }

    #[test]
    fn reconcile_without_results_is_identity(
        prefix in prose_strategy(),
        query in query_strategy(),
        claim in claim_strategy(),
    ) {
        // Even when spans exist, an empty fetched mapping (the worst-case
        // batch-failure degradation) must leave the text untouched.
        let text = format!("{prefix}[__DC__(\"{query}\") --> \"{claim}\"]");
        let (_, claims) = extract_claims(&text);
        let recon = reconcile(&text, &claims, &FetchResults::default());
        prop_assert_eq!(recon.text, text);
        prop_assert!(recon.footnotes.is_empty());
        prop_assert!(recon.stat_calls.is_empty());
    }
}
