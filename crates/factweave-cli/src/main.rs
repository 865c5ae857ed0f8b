//! Factweave CLI
//!
//! Runs a query through one of the three flows:
//! - `rig`: annotate model output with verified statistics and footnotes
//! - `baseline`: plain model answer, no augmentation
//! - `rag`: answer grounded in retrieved statistics tables
//!
//! Model and statistics-service configuration comes from the environment
//! (recommended path): `OPENAI_API_KEY`/`OPENAI_MODEL` or
//! `LOCAL_LLM_URL`/`LOCAL_LLM_MODEL`, plus `DC_API_KEY` and `DC_ENV`.

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::env;
use std::sync::Arc;

use factweave::{
    BaselineFlow, DataCommons, FlowConfig, FlowResponse, LlmClient, LocalClient, OpenAiClient,
    Options, RagFlow, RigFlow, TableFetcher,
};

const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
const OPENAI_MODEL_ENV: &str = "OPENAI_MODEL";
const LOCAL_LLM_URL_ENV: &str = "LOCAL_LLM_URL";
const LOCAL_LLM_MODEL_ENV: &str = "LOCAL_LLM_MODEL";
const DC_API_KEY_ENV: &str = "DC_API_KEY";
const DC_ENV_ENV: &str = "DC_ENV";

const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_LOCAL_MODEL: &str = "default";
const DEFAULT_DC_ENV: &str = "dev";

#[derive(Parser)]
#[command(name = "factweave")]
#[command(
    author,
    version,
    about = "Weave verified statistics into model output"
)]
struct Cli {
    /// Quiet mode: suppress per-step progress logging.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Retrieval-interleaved generation: annotate, fetch, reconcile.
    Rig {
        /// The question to answer.
        query: String,
        #[command(flatten)]
        opts: FlowArgs,
        /// Filter fetched values through an LLM relevance judge.
        #[arg(long)]
        validate: bool,
    },
    /// Plain model answer with no augmentation.
    Baseline {
        /// The question to answer.
        query: String,
    },
    /// Table retrieval: generate statistical questions, answer from tables.
    Rag {
        /// The question to answer.
        query: String,
        #[command(flatten)]
        opts: FlowArgs,
    },
}

#[derive(Args)]
struct FlowArgs {
    /// Use the one-shot instructional prompt (for untuned models).
    #[arg(long)]
    in_context: bool,
    /// Fetch worker pool size (1 = sequential).
    #[arg(long, default_value_t = 10)]
    workers: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let verbose = !cli.quiet;
    let llm = llm_from_env(verbose)?;

    let response = match cli.command {
        Commands::Rig {
            query,
            opts,
            validate,
        } => {
            let config = FlowConfig {
                verbose,
                use_in_context_prompt: opts.in_context,
                enable_validation: validate,
                worker_count: opts.workers,
            };
            let dc = Arc::new(datacommons_from_env(verbose)?);
            RigFlow::new(llm, dc, config).query(&query).await
        }
        Commands::Baseline { query } => BaselineFlow::new(llm, verbose).query(&query).await,
        Commands::Rag { query, opts } => {
            let config = FlowConfig {
                verbose,
                use_in_context_prompt: opts.in_context,
                enable_validation: false,
                worker_count: opts.workers,
            };
            let dc = Arc::new(datacommons_from_env(verbose)?);
            RagFlow::new(llm, Arc::new(TableFetcher(dc)), config)
                .query(&query)
                .await
        }
    };

    print_response(&response);
    Ok(())
}

/// Pick a model provider from the environment: OpenAI first, then a local
/// OpenAI-compatible server.
fn llm_from_env(verbose: bool) -> Result<Arc<dyn LlmClient>> {
    let options = Options::new(verbose);
    if let Ok(key) = env::var(OPENAI_API_KEY_ENV) {
        let model =
            env::var(OPENAI_MODEL_ENV).unwrap_or_else(|_| DEFAULT_OPENAI_MODEL.to_string());
        return Ok(Arc::new(OpenAiClient::new(&key, &model, options)?));
    }
    if let Ok(url) = env::var(LOCAL_LLM_URL_ENV) {
        let model = env::var(LOCAL_LLM_MODEL_ENV).unwrap_or_else(|_| DEFAULT_LOCAL_MODEL.to_string());
        return Ok(Arc::new(LocalClient::new(&url, &model, options)?));
    }
    Err(anyhow!(
        "no model provider configured: set {OPENAI_API_KEY_ENV} or {LOCAL_LLM_URL_ENV}"
    ))
}

fn datacommons_from_env(verbose: bool) -> Result<DataCommons> {
    let api_key = env::var(DC_API_KEY_ENV).unwrap_or_default();
    let dc_env = env::var(DC_ENV_ENV).unwrap_or_else(|_| DEFAULT_DC_ENV.to_string());
    Ok(DataCommons::new(&api_key, &dc_env, Options::new(verbose))?)
}

fn print_response(response: &FlowResponse) {
    if response.llm_calls.iter().all(|c| !c.succeeded()) {
        eprintln!("{}", "model call failed:".red().bold());
        for call in &response.llm_calls {
            eprintln!("  {}", call.error.red());
        }
        return;
    }

    println!("{}", response.main_text);
    if !response.footnotes.is_empty() {
        println!();
        println!("{}", "Footnotes:".bold());
        println!("{}", response.footnotes.dimmed());
    }

    let model_secs: f64 = response.llm_calls.iter().map(|c| c.duration_secs).sum();
    println!();
    println!(
        "{}",
        format!(
            "{} lookup(s), {:.2}s fetching, {:.2}s in model calls",
            response.stat_calls.len(),
            response.fetch_duration_secs,
            model_secs
        )
        .dimmed()
    );
}
