//! Tests for the fetch dispatcher: deterministic ids, failure isolation.

use async_trait::async_trait;
use factweave::{dispatch, FetchError, StatCall, StatFetcher};
use std::sync::Arc;
use std::time::Duration;

/// Resolves each query to its uppercased text; later queries finish first
/// so completion order differs from input order under concurrency.
struct SkewedFetcher {
    delay_step_ms: u64,
    total: usize,
}

#[async_trait]
impl StatFetcher for SkewedFetcher {
    async fn fetch(&self, query: &str) -> Result<StatCall, FetchError> {
        let position: usize = query
            .rsplit(' ')
            .next()
            .and_then(|n| n.parse().ok())
            .unwrap_or(0);
        let delay = self.delay_step_ms * (self.total - position) as u64;
        tokio::time::sleep(Duration::from_millis(delay)).await;
        Ok(StatCall {
            value: query.to_uppercase(),
            ..StatCall::not_found(query)
        })
    }
}

/// Fails on one specific query.
struct FlakyFetcher {
    poison: String,
}

#[async_trait]
impl StatFetcher for FlakyFetcher {
    async fn fetch(&self, query: &str) -> Result<StatCall, FetchError> {
        if query == self.poison {
            return Err(FetchError::Payload("boom".to_string()));
        }
        Ok(StatCall {
            value: "1".to_string(),
            ..StatCall::not_found(query)
        })
    }
}

fn queries(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("query {i}")).collect()
}

#[tokio::test(flavor = "multi_thread")]
async fn ids_depend_only_on_input_order() {
    let queries = queries(8);
    let sequential = dispatch(
        &queries,
        Arc::new(SkewedFetcher {
            delay_step_ms: 0,
            total: 8,
        }),
        1,
    )
    .await;
    let pooled = dispatch(
        &queries,
        Arc::new(SkewedFetcher {
            delay_step_ms: 10,
            total: 8,
        }),
        4,
    )
    .await;

    assert_eq!(sequential.len(), pooled.len());
    for (query, record) in sequential.iter() {
        let pooled_record = pooled.get(query).expect("query present in both");
        assert_eq!(record.id, pooled_record.id);
        assert_eq!(record.value, pooled_record.value);
    }
    // Ids are the 1-based input positions.
    for (i, (_, record)) in pooled.iter().enumerate() {
        assert_eq!(record.id, i as u32 + 1);
    }
}

#[tokio::test]
async fn mapping_preserves_input_order() {
    let queries = queries(5);
    let results = dispatch(
        &queries,
        Arc::new(SkewedFetcher {
            delay_step_ms: 5,
            total: 5,
        }),
        3,
    )
    .await;
    let order: Vec<&String> = results.iter().map(|(q, _)| q).collect();
    assert_eq!(order, queries.iter().collect::<Vec<_>>());
}

#[tokio::test]
async fn single_failure_does_not_poison_batch() {
    let queries: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
    let results = dispatch(
        &queries,
        Arc::new(FlakyFetcher {
            poison: "b".to_string(),
        }),
        2,
    )
    .await;

    assert_eq!(results.len(), 3);
    assert!(results.get("a").unwrap().has_value());
    assert!(!results.get("b").unwrap().has_value());
    assert!(results.get("c").unwrap().has_value());
    // The degraded record still gets its input-order id.
    assert_eq!(results.get("b").unwrap().id, 2);
}

#[tokio::test]
async fn empty_batch_yields_empty_results() {
    let results = dispatch(
        &[],
        Arc::new(FlakyFetcher {
            poison: String::new(),
        }),
        4,
    )
    .await;
    assert!(results.is_empty());
}
