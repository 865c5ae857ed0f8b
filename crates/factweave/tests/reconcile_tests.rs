//! Tests for the reconciliation engine: rewriting, footnotes, flags.

use factweave::{reconcile, ClaimMap, FetchResults, StatCall};

fn record(query: &str, value: &str, unit: &str) -> StatCall {
    StatCall {
        value: value.to_string(),
        unit: unit.to_string(),
        title: format!("Title for {query}"),
        date: "2022".to_string(),
        source: "census.gov".to_string(),
        source_url: format!("https://datacommons.org/{query}"),
        ..StatCall::not_found(query)
    }
}

fn setup(text: &str, fetched: &[StatCall]) -> (ClaimMap, FetchResults) {
    let (_, claims) = factweave::extract_claims(text);
    let mut results = FetchResults::default();
    for (i, r) in fetched.iter().enumerate() {
        let mut r = r.clone();
        r.id = i as u32 + 1;
        let query = r.query.clone();
        results.insert(&query, r);
    }
    (claims, results)
}

#[test]
fn text_without_markup_is_unchanged() {
    let text = "No statistics here, just prose.";
    let (claims, results) = setup(text, &[]);
    let recon = reconcile(text, &claims, &results);
    assert_eq!(recon.text, text);
    assert!(recon.footnotes.is_empty());
    assert!(recon.stat_calls.is_empty());
}

#[test]
fn disagreement_uses_starred_template() {
    // Claimed 10 million vs fetched 12000000 is a ~20% difference and must
    // be flagged.
    let text = r#"Pop is [__DC__("population of X") --> "10 million"]."#;
    let (claims, results) = setup(text, &[record("population of X", "12000000", "")]);
    let recon = reconcile(text, &claims, &results);

    assert_eq!(
        recon.text,
        "Pop is [DC#1(12000000 [1]* || 10 million)]."
    );
    assert_eq!(recon.footnotes.len(), 1);
    assert!(recon.footnotes[0].starts_with("[1] - Title for population of X"));
    assert_eq!(recon.stat_calls.len(), 1);
    assert_eq!(recon.stat_calls[0].claimed_value, "10 million");
}

#[test]
fn agreement_has_no_star() {
    let text = r#"Pop is [__DC__("population of X") --> "10 million"]."#;
    let (claims, results) = setup(text, &[record("population of X", "10200000", "")]);
    let recon = reconcile(text, &claims, &results);
    assert_eq!(recon.text, "Pop is [DC#1(10200000 [1] || 10 million)].");
}

#[test]
fn unit_is_part_of_display_value() {
    let text = r#"Rate: [__DC__("diabetes in X") --> "9"]"#;
    let (claims, results) = setup(text, &[record("diabetes in X", "9", "per 10k")]);
    let recon = reconcile(text, &claims, &results);
    assert!(recon.text.contains("[DC#1(9 per 10k [1] || 9)]"));
}

#[test]
fn empty_fetch_with_claim_keeps_claim_only() {
    let text = r#"Pop is [__DC__("population of X") --> "10 million"]."#;
    let (claims, results) = setup(text, &[StatCall::not_found("population of X")]);
    let recon = reconcile(text, &claims, &results);
    assert_eq!(recon.text, "Pop is [DC#1(|| 10 million)].");
    assert!(recon.footnotes.is_empty());
}

#[test]
fn empty_claim_with_fetch_shows_value() {
    let text = r#"Pop is [__DC__("population of X") --> ""]."#;
    let (claims, results) = setup(text, &[record("population of X", "12000000", "")]);
    let recon = reconcile(text, &claims, &results);
    assert_eq!(recon.text, "Pop is [DC#1(12000000 [1] ||)].");
}

#[test]
fn both_empty_renders_placeholder() {
    let text = r#"Pop is [__DC__("population of X") --> ""]."#;
    let (claims, results) = setup(text, &[StatCall::not_found("population of X")]);
    let recon = reconcile(text, &claims, &results);
    assert_eq!(recon.text, "Pop is [DC#1(--- || ---)].");
}

#[test]
fn footnote_reused_across_claims_of_same_query() {
    let text = concat!(
        r#"A [__DC__("population of X") --> "10 million"] and "#,
        r#"B [__DC__("population of X") --> "12 million"]."#
    );
    let (claims, results) = setup(text, &[record("population of X", "12000000", "")]);
    let recon = reconcile(text, &claims, &results);

    // Exactly one footnote, index reused; ids reflect emission order.
    assert_eq!(recon.footnotes.len(), 1);
    assert!(recon.text.contains("[DC#1(12000000 [1]* || 10 million)]"));
    assert!(recon.text.contains("[DC#2(12000000 [1] || 12 million)]"));
    assert_eq!(recon.stat_calls.len(), 2);
    assert_eq!(recon.stat_calls[0].id, 1);
    assert_eq!(recon.stat_calls[1].id, 2);
}

#[test]
fn footnote_indexes_follow_first_need_order() {
    let text = concat!(
        r#"[__DC__("a") --> "1"] [__DC__("b") --> "2"] [__DC__("a") --> "1"]"#
    );
    let (claims, results) = setup(text, &[record("a", "1", ""), record("b", "2", "")]);
    let recon = reconcile(text, &claims, &results);
    assert_eq!(recon.footnotes.len(), 2);
    assert!(recon.footnotes[0].starts_with("[1] - Title for a"));
    assert!(recon.footnotes[1].starts_with("[2] - Title for b"));
}

#[test]
fn identical_spans_consumed_left_to_right() {
    let text = r#"x [__DC__("q") --> "5"] y [__DC__("q") --> "5"] z"#;
    let (claims, results) = setup(text, &[record("q", "5", "")]);
    let recon = reconcile(text, &claims, &results);
    assert_eq!(
        recon.text,
        "x [DC#1(5 [1] || 5)] y [DC#2(5 [1] || 5)] z"
    );
}

#[test]
fn span_with_unfetched_query_is_left_untouched() {
    let text = r#"a [__DC__("kept") --> "1"] b [__DC__("dropped") --> "2"]"#;
    let (claims, mut results) = setup(text, &[record("kept", "1", ""), record("dropped", "2", "")]);
    results.retain(|q| q == "kept");
    let recon = reconcile(text, &claims, &results);
    assert!(recon.text.contains("[DC#1(1 [1] || 1)]"));
    assert!(recon.text.contains(r#"[__DC__("dropped") --> "2"]"#));
    assert_eq!(recon.stat_calls.len(), 1);
}

#[test]
fn truncated_span_is_still_rewritten() {
    let text = r#"Pop is [__DC__("q") --> "5""#;
    let (claims, results) = setup(text, &[record("q", "5", "")]);
    let recon = reconcile(text, &claims, &results);
    assert_eq!(recon.text, "Pop is [DC#1(5 [1] || 5)]");
}

#[test]
fn reconciling_reconciled_text_is_noop() {
    let text = r#"Pop is [__DC__("population of X") --> "10 million"]."#;
    let (claims, results) = setup(text, &[record("population of X", "12000000", "")]);
    let first = reconcile(text, &claims, &results);

    // The rewritten text contains no markup spans; running the pipeline
    // again must not change it.
    let (_, claims2) = factweave::extract_claims(&first.text);
    assert!(claims2.is_empty());
    let second = reconcile(&first.text, &claims2, &FetchResults::default());
    assert_eq!(second.text, first.text);
    assert!(second.footnotes.is_empty());
}
