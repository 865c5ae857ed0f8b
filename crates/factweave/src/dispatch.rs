//! Concurrent fetch dispatch: one statistics lookup per unique query,
//! executed across a bounded worker pool.
//!
//! Sequence ids are assigned by input order after all results are collected,
//! so identifiers are reproducible regardless of scheduling. The pool is
//! scoped to a single batch; nothing persists across calls.

use crate::datacommons::FetchError;
use crate::StatCall;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

/// The fetch seam: resolve one query into a record. "No matching data" is a
/// record with an empty value, not an error; errors are reserved for
/// transport/payload failures.
#[async_trait]
pub trait StatFetcher: Send + Sync {
    async fn fetch(&self, query: &str) -> Result<StatCall, FetchError>;
}

/// Insertion-ordered mapping from query to fetched record. Iteration order
/// is the input query order, which keeps reconciliation deterministic.
#[derive(Debug, Clone, Default)]
pub struct FetchResults {
    entries: Vec<(String, StatCall)>,
}

impl FetchResults {
    pub fn insert(&mut self, query: &str, record: StatCall) {
        self.entries.push((query.to_string(), record));
    }

    pub fn get(&self, query: &str) -> Option<&StatCall> {
        self.entries
            .iter()
            .find(|(q, _)| q == query)
            .map(|(_, r)| r)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, StatCall)> {
        self.entries.iter()
    }

    /// Keep only the entries whose query passes the predicate.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.entries.retain(|(q, _)| keep(q));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Execute `fetcher` once per query and collect the results.
///
/// `worker_count == 1` runs sequentially in input order; larger counts run
/// across that many workers with unconstrained completion order. Either way
/// each record's `id` is its 1-based input position. An individual failure
/// degrades to a "no data found" record rather than poisoning the batch.
pub async fn dispatch(
    queries: &[String],
    fetcher: Arc<dyn StatFetcher>,
    worker_count: usize,
) -> FetchResults {
    let records = if worker_count <= 1 {
        let mut records = Vec::with_capacity(queries.len());
        for query in queries {
            records.push(fetch_one(fetcher.as_ref(), query).await);
        }
        records
    } else {
        let semaphore = Arc::new(Semaphore::new(worker_count));
        let mut set = JoinSet::new();
        for (idx, query) in queries.iter().enumerate() {
            let fetcher = Arc::clone(&fetcher);
            let semaphore = Arc::clone(&semaphore);
            let query = query.clone();
            set.spawn(async move {
                // Closing the semaphore is not part of this flow, so acquire
                // cannot fail while the pool is alive.
                let _permit = semaphore.acquire_owned().await;
                (idx, fetch_one(fetcher.as_ref(), &query).await)
            });
        }

        let mut slots: Vec<Option<StatCall>> = vec![None; queries.len()];
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, record)) => slots[idx] = Some(record),
                Err(e) => warn!("fetch worker failed: {e}"),
            }
        }
        slots
            .into_iter()
            .enumerate()
            .map(|(idx, slot)| slot.unwrap_or_else(|| StatCall::not_found(&queries[idx])))
            .collect()
    };

    let mut results = FetchResults::default();
    for (idx, (query, mut record)) in queries.iter().zip(records).enumerate() {
        record.id = idx as u32 + 1;
        results.insert(query, record);
    }
    results
}

async fn fetch_one(fetcher: &dyn StatFetcher, query: &str) -> StatCall {
    match fetcher.fetch(query).await {
        Ok(record) => record,
        Err(e) => {
            warn!("fetch failed for \"{query}\": {e}");
            StatCall::not_found(query)
        }
    }
}
