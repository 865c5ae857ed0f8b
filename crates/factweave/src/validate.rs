//! Optional LLM validation gate: keep only the fetched records an LLM
//! judges relevant to their query.
//!
//! The gate filters; it never adds queries. Records that resolved to no data
//! pass through untouched (there is nothing to judge), and a failed judge
//! call keeps its whole batch rather than silently discarding lookups.

use crate::dispatch::FetchResults;
use crate::llm::LlmClient;
use crate::prompts::{fill, DC_QA_VALIDATION_PROMPT};
use crate::{LlmCall, Options};
use std::collections::HashSet;
use tracing::warn;

/// The prompt promises the judge at most 20 pairs per call.
const BATCH_SIZE: usize = 20;

/// Filter `results` down to entries the judge accepts. Every judge
/// invocation is appended to `llm_calls` for the flow's call log.
pub async fn run_validation(
    results: FetchResults,
    llm: &dyn LlmClient,
    options: &Options,
    llm_calls: &mut Vec<LlmCall>,
) -> FetchResults {
    let candidates: Vec<(String, String)> = results
        .iter()
        .filter(|(_, r)| r.has_value())
        .map(|(q, r)| (q.clone(), r.title.clone()))
        .collect();
    if candidates.is_empty() {
        return results;
    }

    let mut keep: HashSet<String> = results
        .iter()
        .filter(|(_, r)| !r.has_value())
        .map(|(q, _)| q.clone())
        .collect();

    for chunk in candidates.chunks(BATCH_SIZE) {
        let mut input = String::new();
        for (i, (query, title)) in chunk.iter().enumerate() {
            input.push_str(&format!(
                "[[QA{n}]]\n  Question: \"{query}\"\n  Answer: \"{title}\"\n",
                n = i + 1
            ));
        }

        options.vlog("... validating fetched responses");
        let call = llm
            .query(&fill(DC_QA_VALIDATION_PROMPT, "input", &input))
            .await;
        if call.response.is_empty() {
            warn!("validation call failed, keeping batch unfiltered");
            keep.extend(chunk.iter().map(|(q, _)| q.clone()));
        } else {
            for (i, (query, _)) in chunk.iter().enumerate() {
                let id = format!("[[QA{}]]", i + 1);
                if call.response.lines().any(|line| line.contains(&id)) {
                    keep.insert(query.clone());
                }
            }
        }
        llm_calls.push(call);
    }

    let mut filtered = results;
    filtered.retain(|q| keep.contains(q));
    filtered
}
