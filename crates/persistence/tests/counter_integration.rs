//! Integration tests for the sequential invoice number issuer.
//!
//! These tests require a running PostgreSQL instance; they skip themselves
//! when TEST_DATABASE_URL is not set.
//!
//! All phases share the single counter row, so they run as one sequential
//! test instead of racing each other in parallel test threads.

mod common;

use std::collections::HashSet;

use persistence::repositories::counter::{CounterRepository, INVOICE_COUNTER_KEY};

#[tokio::test]
async fn test_issue_next_sequences_and_survives_concurrency() {
    let Some(pool) = common::test_pool().await else {
        return;
    };

    sqlx::query("DELETE FROM config_entries WHERE key = $1")
        .bind(INVOICE_COUNTER_KEY)
        .execute(&pool)
        .await
        .unwrap();

    let repo = CounterRepository::new(pool.clone(), 260001);

    // Preview on a fresh database falls back to the series start without
    // creating the row.
    assert_eq!(repo.preview_next().await.unwrap(), "260001");
    let row_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM config_entries WHERE key = $1")
            .bind(INVOICE_COUNTER_KEY)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(row_count, 0);

    // First issuance seeds the row and returns the series start.
    assert_eq!(repo.issue_next().await.unwrap(), "260001");

    // A counter sitting at 260007 issues exactly 260007 and advances to
    // 260008.
    sqlx::query("UPDATE config_entries SET value = '260007' WHERE key = $1")
        .bind(INVOICE_COUNTER_KEY)
        .execute(&pool)
        .await
        .unwrap();

    assert_eq!(repo.issue_next().await.unwrap(), "260007");

    let stored: String = sqlx::query_scalar("SELECT value FROM config_entries WHERE key = $1")
        .bind(INVOICE_COUNTER_KEY)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(stored, "260008");
    assert_eq!(repo.preview_next().await.unwrap(), "260008");

    // N concurrent issuances yield N distinct values and advance the
    // counter by exactly N.
    let mut handles = Vec::new();
    for _ in 0..16 {
        let repo = repo.clone();
        handles.push(tokio::spawn(async move { repo.issue_next().await.unwrap() }));
    }

    let mut issued = HashSet::new();
    for handle in handles {
        let number = handle.await.unwrap();
        assert!(issued.insert(number.clone()), "duplicate number {number}");
    }
    assert_eq!(issued.len(), 16);

    let stored: String = sqlx::query_scalar("SELECT value FROM config_entries WHERE key = $1")
        .bind(INVOICE_COUNTER_KEY)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(stored, "260024");

    sqlx::query("DELETE FROM config_entries WHERE key = $1")
        .bind(INVOICE_COUNTER_KEY)
        .execute(&pool)
        .await
        .unwrap();
}
