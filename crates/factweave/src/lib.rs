//! Factweave: Retrieval-Interleaved Generation over a statistics service
//!
//! A language model annotates the statistics in its own output with inline
//! `__DC__` lookup markup. This crate parses that markup, resolves every
//! lookup against the Data Commons natural-language API, compares the model's
//! claimed values against retrieved ground truth, and rewrites the text with
//! resolved values, discrepancy flags, and deduplicated footnotes.
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────┐   annotated    ┌───────────┐  queries   ┌─────────────┐
//! │  Model  │───────────────►│ Extractor │───────────►│ Dispatcher  │
//! │ client  │     text       │ (markup)  │            │ (bounded    │
//! └─────────┘                └───────────┘            │  workers)   │
//!      ▲                           │ claims           └──────┬──────┘
//!      │                           │                         │ records
//!      │ optional                  ▼                         ▼
//!      │ validation          ┌───────────────────────────────────┐
//!      └─────────────────────│        Reconciliation             │
//!                            │  value merge · 5% discrepancy     │
//!                            │  flag · footnote dedup · rewrite  │
//!                            └───────────────┬───────────────────┘
//!                                            ▼
//!                                      FlowResponse
//! ```
//!
//! The fetch step is the sole concurrent region; extraction and
//! reconciliation are synchronous and deterministic. Sequence ids depend
//! only on input order, never on completion order.

pub mod datacommons;
pub mod dispatch;
pub mod flow;
pub mod llm;
pub mod markup;
pub mod prompts;
pub mod reconcile;
pub mod util;
pub mod validate;

use serde::{Deserialize, Serialize};

pub use datacommons::{DataCommons, FetchError, TableFetcher};
pub use dispatch::{dispatch, FetchResults, StatFetcher};
pub use flow::{BaselineFlow, FlowConfig, RagFlow, RigFlow};
pub use llm::{LlmClient, LocalClient, OpenAiClient};
pub use markup::{extract_claims, ClaimMap, MarkupSpan};
pub use reconcile::{reconcile, Reconciliation};

// ============================================================================
// Core Types
// ============================================================================

/// One external fact lookup and its outcome.
///
/// Created by the fetch step with `value` populated (or empty for "no data
/// found"), then cloned once per claim occurrence during reconciliation; the
/// clone inherits every fetched field and differs only in `id` and
/// `claimed_value`. Optional string fields use `""` for absence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatCall {
    /// Natural-language lookup string (non-empty, used verbatim).
    pub query: String,
    /// Sequence id, 1-based. Assigned by input order at dispatch time, then
    /// reassigned by emission order during reconciliation. Display only.
    pub id: u32,
    /// Resolved value; empty means "no data found".
    pub value: String,
    pub unit: String,
    pub title: String,
    pub date: String,
    pub source: String,
    pub source_url: String,
    /// Statistical variable the service matched the query to.
    pub matched_variable: String,
    /// Cosine score of the variable match; -1 when absent.
    pub match_score: f64,
    /// Rendered table for table-mode lookups; empty for point lookups.
    pub table: String,
    /// Value the model asserted for this query; set only during
    /// reconciliation.
    pub claimed_value: String,
}

impl StatCall {
    /// A lookup that resolved to no data. Invariant: empty `value` carries
    /// no unit/title/date/source.
    pub fn not_found(query: &str) -> Self {
        Self {
            query: query.to_string(),
            id: 0,
            value: String::new(),
            unit: String::new(),
            title: String::new(),
            date: String::new(),
            source: String::new(),
            source_url: String::new(),
            matched_variable: String::new(),
            match_score: -1.0,
            table: String::new(),
            claimed_value: String::new(),
        }
    }

    pub fn has_value(&self) -> bool {
        !self.value.is_empty()
    }

    /// Display form of the resolved value: value and unit joined with a
    /// space, or empty when no data was found.
    pub fn val_and_unit(&self) -> String {
        if self.unit.is_empty() {
            self.value.clone()
        } else {
            format!("{} {}", self.value, self.unit)
        }
    }

    /// Citation line body: title, source and date joined, URL appended when
    /// present.
    pub fn footnote(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        for p in [&self.title, &self.source, &self.date] {
            if !p.is_empty() {
                parts.push(p);
            }
        }
        let mut out = parts.join(", ");
        if !self.source_url.is_empty() {
            out.push_str(&format!(" ({})", self.source_url));
        }
        out
    }
}

/// One invocation of the language model. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmCall {
    pub prompt: String,
    /// Response text; empty signals a hard failure.
    pub response: String,
    pub duration_secs: f64,
    /// Empty on success.
    pub error: String,
}

impl LlmCall {
    pub fn succeeded(&self) -> bool {
        !self.response.is_empty()
    }
}

/// Output of a flow: possibly rewritten text, footnotes, and the call log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowResponse {
    pub main_text: String,
    /// Footnote lines joined by newlines, ordered by footnote index.
    pub footnotes: String,
    pub llm_calls: Vec<LlmCall>,
    pub fetch_duration_secs: f64,
    /// Per-claim records actually emitted, in emission order.
    pub stat_calls: Vec<StatCall>,
}

/// Shared verbosity knob, kept for parity with flow construction sites.
/// Verbose messages go to `info`, otherwise to `debug`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    pub verbose: bool,
}

impl Options {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn vlog(&self, msg: &str) {
        if self.verbose {
            tracing::info!("{msg}");
        } else {
            tracing::debug!("{msg}");
        }
    }
}
