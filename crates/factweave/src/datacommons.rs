//! Data Commons natural-language API client.
//!
//! One endpoint, two modes: `point` resolves a query to a single highlighted
//! value (used by the RIG flow) and `table` resolves it to a small table
//! (used by the RAG flow). "No matching data" is a normal outcome and comes
//! back as a record with an empty value.

use crate::dispatch::StatFetcher;
use crate::util::{parse_csv_row, round_value};
use crate::{Options, StatCall};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Do not allow topics, higher match threshold.
const POINT_PARAMS: &[(&str, &str)] = &[
    ("allCharts", "1"),
    ("mode", "toolformer_rig"),
    ("idx", "base_uae_mem"),
];

/// Allow topics, lower match threshold.
const TABLE_PARAMS: &[(&str, &str)] = &[
    ("mode", "toolformer_rag"),
    ("client", "table"),
    ("idx", "base_uae_mem"),
];

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected payload: {0}")]
    Payload(String),
}

/// Client for the Data Commons NL query endpoint. Cheap to share: the inner
/// `reqwest::Client` is safe for concurrent use and all configuration is
/// read-only.
pub struct DataCommons {
    client: reqwest::Client,
    api_key: String,
    env: String,
    options: Options,
}

impl DataCommons {
    pub fn new(api_key: &str, env: &str, options: Options) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            env: env.to_string(),
            options,
        })
    }

    fn endpoint(&self) -> String {
        format!("https://{}.datacommons.org/nodejs/query", self.env)
    }

    async fn call_api(&self, query: &str, params: &[(&str, &str)]) -> Result<Value, FetchError> {
        let mut request = self
            .client
            .get(self.endpoint())
            .query(&[("q", query.trim())])
            .query(params);
        if !self.api_key.is_empty() {
            request = request.query(&[("apikey", self.api_key.as_str())]);
        }
        Ok(request.send().await?.json().await?)
    }

    /// Point lookup: first LINE or HIGHLIGHT chart's highlighted value.
    pub async fn point(&self, query: &str) -> Result<StatCall, FetchError> {
        self.options.vlog(&format!("... calling DC with \"{query}\""));
        let response = self.call_api(query, POINT_PARAMS).await?;

        let charts = response["charts"].as_array();
        let chart = charts.and_then(|cs| {
            cs.iter()
                .find(|c| matches!(c["type"].as_str(), Some("LINE") | Some("HIGHLIGHT")))
        });
        let chart = match chart {
            Some(c) => c,
            None => return Ok(StatCall::not_found(query)),
        };

        let raw = match &chart["highlight"]["value"] {
            Value::Null => String::new(),
            v => v.to_string().trim_matches('"').to_string(),
        };
        let value = round_value(&raw);
        if value.is_empty() {
            return Ok(StatCall::not_found(query));
        }

        let (matched_variable, match_score) = sv_matching(&response);
        Ok(StatCall {
            value,
            unit: str_field(chart, "unit"),
            title: str_field(chart, "title"),
            date: chart["highlight"]["date"].as_str().unwrap_or("").to_string(),
            source: source_name(chart),
            source_url: str_field(chart, "dcUrl"),
            matched_variable,
            match_score,
            ..StatCall::not_found(query)
        })
    }

    /// Table lookup: first chart's `data_csv` re-rendered as a text table
    /// with rounded cells.
    pub async fn table(&self, query: &str) -> Result<StatCall, FetchError> {
        self.options
            .vlog(&format!("... calling DC for table with \"{query}\""));
        let response = self.call_api(query, TABLE_PARAMS).await?;

        let chart = match response["charts"].as_array().and_then(|cs| cs.first()) {
            Some(c) => c,
            None => return Ok(StatCall::not_found(query)),
        };
        let data_csv = str_field(chart, "data_csv");
        let rows: Vec<Vec<String>> = data_csv.lines().map(parse_csv_row).collect();
        if rows.is_empty() {
            return Ok(StatCall::not_found(query));
        }

        let header = rows[0].join(" | ");
        let mut parts = vec![header.clone(), "-".repeat(header.len())];
        for row in &rows[1..] {
            let cells: Vec<String> = row
                .iter()
                .map(|cell| {
                    let rounded = round_value(cell);
                    if rounded.is_empty() {
                        cell.clone()
                    } else {
                        rounded
                    }
                })
                .collect();
            parts.push(cells.join(" | "));
        }
        parts.push("\n".to_string());

        let (matched_variable, match_score) = sv_matching(&response);
        Ok(StatCall {
            unit: str_field(chart, "unit"),
            title: str_field(chart, "title"),
            source: source_name(chart),
            source_url: str_field(chart, "dcUrl"),
            matched_variable,
            match_score,
            table: parts.join("\n"),
            ..StatCall::not_found(query)
        })
    }
}

#[async_trait]
impl StatFetcher for DataCommons {
    async fn fetch(&self, query: &str) -> Result<StatCall, FetchError> {
        self.point(query).await
    }
}

/// Adapter exposing the table endpoint through the dispatch seam.
pub struct TableFetcher(pub Arc<DataCommons>);

#[async_trait]
impl StatFetcher for TableFetcher {
    async fn fetch(&self, query: &str) -> Result<StatCall, FetchError> {
        self.0.table(query).await
    }
}

fn str_field(chart: &Value, key: &str) -> String {
    chart[key].as_str().unwrap_or("").to_string()
}

fn source_name(chart: &Value) -> String {
    chart["srcs"][0]["name"].as_str().unwrap_or("").to_string()
}

fn sv_matching(response: &Value) -> (String, f64) {
    let svm = &response["debug"]["debug"]["sv_matching"];
    let variable = svm["SV"][0].as_str().unwrap_or("").to_string();
    let score = svm["CosineScore"][0].as_f64().unwrap_or(-1.0);
    (variable, score)
}
