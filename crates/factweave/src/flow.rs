//! Flow controllers: compose model calls, fetch dispatch, validation and
//! reconciliation into end-to-end operations.
//!
//! `RigFlow` is the retrieval-interleaved pipeline (the core of this crate).
//! `BaselineFlow` answers without augmentation, and `RagFlow` answers from
//! retrieved tables; both reuse the same data types and dispatcher but not
//! the reconciliation algorithm.

use crate::dispatch::{dispatch, StatFetcher};
use crate::llm::LlmClient;
use crate::markup::extract_claims;
use crate::prompts::{
    fill, RAG_FINAL_ANSWER_PROMPT, RAG_FINE_TUNED_PROMPT, RAG_IN_CONTEXT_PROMPT,
    RIG_IN_CONTEXT_PROMPT,
};
use crate::reconcile::reconcile;
use crate::validate::run_validation;
use crate::{FlowResponse, Options};
use std::sync::Arc;
use std::time::Instant;
use tracing::error;

/// Cap on generated statistical questions, mirrored in the RAG prompts.
const MAX_QUESTIONS: usize = 25;

/// Configuration surface recognized by the flows.
#[derive(Debug, Clone, Copy)]
pub struct FlowConfig {
    pub verbose: bool,
    /// Wrap the query in the one-shot instructional template instead of
    /// assuming a model tuned to emit the markup natively.
    pub use_in_context_prompt: bool,
    /// Run the LLM validation gate over fetched records.
    pub enable_validation: bool,
    /// Fetch worker pool size; 1 collapses to sequential dispatch.
    pub worker_count: usize,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            verbose: true,
            use_in_context_prompt: false,
            enable_validation: false,
            worker_count: 10,
        }
    }
}

// ============================================================================
// RIG: Retrieval-Interleaved Generation
// ============================================================================

pub struct RigFlow {
    llm: Arc<dyn LlmClient>,
    fetcher: Arc<dyn StatFetcher>,
    config: FlowConfig,
    options: Options,
}

impl RigFlow {
    pub fn new(llm: Arc<dyn LlmClient>, fetcher: Arc<dyn StatFetcher>, config: FlowConfig) -> Self {
        let options = Options::new(config.verbose);
        Self {
            llm,
            fetcher,
            config,
            options,
        }
    }

    /// Run the pipeline: model → extract → fetch → (validate) → reconcile.
    ///
    /// An empty model response terminates the flow immediately with a
    /// response carrying only the failed call; every later failure degrades
    /// (empty fetch results, untouched spans) instead of aborting.
    pub async fn query(&self, query: &str) -> FlowResponse {
        let prompt = if self.config.use_in_context_prompt {
            self.options.vlog("... [RIG] calling untuned model");
            fill(RIG_IN_CONTEXT_PROMPT, "text", query)
        } else {
            self.options.vlog("... [RIG] calling fine-tuned model");
            query.to_string()
        };

        let llm_call = self.llm.query(&prompt).await;
        if !llm_call.succeeded() {
            error!("model call failed for \"{query}\"");
            return FlowResponse {
                llm_calls: vec![llm_call],
                ..Default::default()
            };
        }
        let text = llm_call.response.clone();
        let mut llm_calls = vec![llm_call];

        let (_, claims) = extract_claims(&text);
        let start = Instant::now();
        let mut results = dispatch(
            &claims.queries(),
            Arc::clone(&self.fetcher),
            self.config.worker_count.max(1),
        )
        .await;
        let fetch_duration_secs = start.elapsed().as_secs_f64();

        if self.config.enable_validation {
            results = run_validation(results, self.llm.as_ref(), &self.options, &mut llm_calls).await;
        }

        self.options.vlog("... [RIG] reconciling fetched values");
        let recon = reconcile(&text, &claims, &results);

        FlowResponse {
            main_text: recon.text,
            footnotes: recon.footnotes.join("\n"),
            llm_calls,
            fetch_duration_secs,
            stat_calls: recon.stat_calls,
        }
    }
}

// ============================================================================
// Baseline: no augmentation
// ============================================================================

pub struct BaselineFlow {
    llm: Arc<dyn LlmClient>,
    options: Options,
}

impl BaselineFlow {
    pub fn new(llm: Arc<dyn LlmClient>, verbose: bool) -> Self {
        Self {
            llm,
            options: Options::new(verbose),
        }
    }

    pub async fn query(&self, query: &str) -> FlowResponse {
        self.options.vlog("... [BASELINE] calling base model");
        let call = self.llm.query(query).await;
        FlowResponse {
            main_text: call.response.clone(),
            llm_calls: vec![call],
            ..Default::default()
        }
    }
}

// ============================================================================
// RAG: question generation + table synthesis
// ============================================================================

pub struct RagFlow {
    llm: Arc<dyn LlmClient>,
    tables: Arc<dyn StatFetcher>,
    config: FlowConfig,
    options: Options,
}

impl RagFlow {
    pub fn new(llm: Arc<dyn LlmClient>, tables: Arc<dyn StatFetcher>, config: FlowConfig) -> Self {
        let options = Options::new(config.verbose);
        Self {
            llm,
            tables,
            config,
            options,
        }
    }

    /// Generate statistical questions, fetch a table per question, then
    /// answer the original query grounded in those tables.
    pub async fn query(&self, query: &str) -> FlowResponse {
        let prompt = if self.config.use_in_context_prompt {
            self.options.vlog("... [RAG] generating questions (untuned model)");
            fill(RAG_IN_CONTEXT_PROMPT, "sentence", query)
        } else {
            self.options.vlog("... [RAG] generating questions (fine-tuned model)");
            fill(RAG_FINE_TUNED_PROMPT, "sentence", query)
        };

        let question_call = self.llm.query(&prompt).await;
        if !question_call.succeeded() {
            error!("question generation failed for \"{query}\"");
            return FlowResponse {
                llm_calls: vec![question_call],
                ..Default::default()
            };
        }
        let questions = parse_questions(&question_call.response);
        let mut llm_calls = vec![question_call];

        let start = Instant::now();
        let results = dispatch(
            &questions,
            Arc::clone(&self.tables),
            self.config.worker_count.max(1),
        )
        .await;
        let fetch_duration_secs = start.elapsed().as_secs_f64();

        let mut table_parts: Vec<String> = Vec::new();
        let mut stat_calls = Vec::new();
        for (_, record) in results.iter() {
            if !record.table.is_empty() {
                table_parts.push(format!(
                    "Table {}: {}\n{}",
                    table_parts.len() + 1,
                    record.title,
                    record.table
                ));
            }
            stat_calls.push(record.clone());
        }

        self.options.vlog("... [RAG] calling model for final answer");
        let final_prompt = fill(
            &fill(RAG_FINAL_ANSWER_PROMPT, "sentence", query),
            "table_str",
            &table_parts.join("\n"),
        );
        let answer_call = self.llm.query(&final_prompt).await;
        let main_text = answer_call.response.clone();
        llm_calls.push(answer_call);

        FlowResponse {
            main_text,
            footnotes: String::new(),
            llm_calls,
            fetch_duration_secs,
            stat_calls,
        }
    }
}

/// One question per line, deduplicated in first-seen order, capped.
fn parse_questions(text: &str) -> Vec<String> {
    let mut questions: Vec<String> = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || questions.iter().any(|q| q == line) {
            continue;
        }
        questions.push(line.to_string());
        if questions.len() == MAX_QUESTIONS {
            break;
        }
    }
    questions
}
