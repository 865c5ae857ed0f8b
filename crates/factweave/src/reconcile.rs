//! Reconciliation: merge fetched records with model claims, flag
//! discrepancies, and rewrite the annotated text.
//!
//! Records are planned query-major (fetched-mapping order, then claim order
//! within each query) so sequence ids and footnote indexes are deterministic;
//! the text itself is then rebuilt in a single left-to-right pass, consuming
//! one planned replacement per span occurrence.

use crate::dispatch::FetchResults;
use crate::markup::{scan_spans, ClaimMap};
use crate::StatCall;
use std::collections::{HashMap, VecDeque};

/// Relative disagreement beyond which a claim is flagged (strict).
const DIFF_THRESHOLD: f64 = 0.05;

/// Suffix multipliers resolved before numeric normalization of a claim.
const SCALES: &[(&str, f64)] = &[
    (" million", 1e6),
    (" billion", 1e9),
    (" trillion", 1e12),
];

#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    /// Rewritten text; untouched wherever no record was available.
    pub text: String,
    /// Footnote lines ordered by footnote index.
    pub footnotes: Vec<String>,
    /// Per-claim records in emission order.
    pub stat_calls: Vec<StatCall>,
}

/// Reconcile `text` against the fetched records.
///
/// For each fetched query (mapping order), each claimed value (extraction
/// order) yields one cloned record with a fresh emission-order id. Spans
/// whose query has no fetched entry are left untouched.
pub fn reconcile(text: &str, claims: &ClaimMap, results: &FetchResults) -> Reconciliation {
    let mut stat_calls: Vec<StatCall> = Vec::new();
    // query -> (footnote index, line); allocation order is index order.
    let mut footnotes: Vec<(String, usize, String)> = Vec::new();
    // (query, claim) -> rendered replacements, consumed left to right.
    let mut replacements: HashMap<(String, String), VecDeque<String>> = HashMap::new();

    for (query, fetched) in results.iter() {
        let claim_list = match claims.get(query) {
            Some(list) => list,
            None => continue,
        };
        for claim in claim_list {
            let mut record = fetched.clone();
            record.id = stat_calls.len() as u32 + 1;
            record.claimed_value = claim.clone();
            let dcval = record.val_and_unit();

            let mut idx = 0;
            if !dcval.is_empty() {
                idx = match footnotes.iter().find(|(q, _, _)| q == query) {
                    Some((_, existing, _)) => *existing,
                    None => {
                        let next = footnotes.len() + 1;
                        let line = format!("[{next}] - {}", record.footnote());
                        footnotes.push((query.clone(), next, line));
                        next
                    }
                };
            }

            let rendered = render_form(&record, claim, &dcval, idx);
            let tagged = format!("[DC#{}({})]", record.id, rendered);
            replacements
                .entry((query.clone(), claim.clone()))
                .or_default()
                .push_back(tagged);
            stat_calls.push(record);
        }
    }

    Reconciliation {
        text: rewrite(text, &mut replacements),
        footnotes: footnotes.into_iter().map(|(_, _, line)| line).collect(),
        stat_calls,
    }
}

/// One of the four textual forms (plus the double-empty placeholder).
fn render_form(record: &StatCall, claim: &str, dcval: &str, idx: usize) -> String {
    if claim.is_empty() {
        if !dcval.is_empty() {
            format!("{dcval} [{idx}] ||")
        } else {
            "--- || ---".to_string()
        }
    } else if !dcval.is_empty() {
        if flag_value(&record.value, claim) {
            format!("{dcval} [{idx}]* || {claim}")
        } else {
            format!("{dcval} [{idx}] || {claim}")
        }
    } else {
        format!("|| {claim}")
    }
}

/// Rebuild the text, substituting each span for which a planned replacement
/// remains. Preserves left-to-right correspondence when identical spans
/// repeat: each span consumes exactly one queued replacement.
fn rewrite(text: &str, replacements: &mut HashMap<(String, String), VecDeque<String>>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;

    for span in scan_spans(text) {
        let key = (span.query.clone(), span.claim.clone());
        let Some(tagged) = replacements.get_mut(&key).and_then(VecDeque::pop_front) else {
            continue;
        };
        out.push_str(&text[cursor..span.start]);
        out.push_str(&tagged);
        cursor = span.end;
    }
    out.push_str(&text[cursor..]);
    out
}

// ============================================================================
// Discrepancy flagging
// ============================================================================

/// Strip everything except digits and `.`, then parse.
fn clean_float(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned.parse().ok()
}

/// Normalize a claimed value: resolve a magnitude suffix first (first match
/// wins), otherwise strip and parse directly.
fn normalize_claim(claim: &str) -> Option<f64> {
    for (suffix, scale) in SCALES {
        if claim.contains(suffix) {
            return clean_float(claim).map(|v| v * scale);
        }
    }
    clean_float(claim)
}

/// True when fetched and claimed values diverge by strictly more than the
/// threshold. A claimed value of zero counts as maximal disagreement unless
/// the fetched value is also zero. Any parse failure yields no flag.
fn flag_value(fetched: &str, claim: &str) -> bool {
    let claimed = match normalize_claim(claim) {
        Some(v) => v,
        None => return false,
    };
    let fetched: f64 = match fetched.parse() {
        Ok(v) => v,
        Err(_) => return false,
    };
    let pct_diff = if claimed != 0.0 {
        (fetched - claimed) / claimed
    } else if fetched != 0.0 {
        1.0
    } else {
        0.0
    };
    pct_diff > DIFF_THRESHOLD || pct_diff < -DIFF_THRESHOLD
}
