//! Integration tests for the invoice aggregate repository.
//!
//! These tests require a running PostgreSQL instance; they skip themselves
//! when TEST_DATABASE_URL is not set. Explicit invoice numbers keep them off
//! the shared counter row.

mod common;

use chrono::NaiveDate;
use uuid::Uuid;

use domain::models::invoice::{
    CreateInvoiceRequest, InvoiceStatus, NewInvoiceLine, UpdateInvoiceRequest,
};
use persistence::repositories::{CounterRepository, InvoiceRepository};

fn unique_number() -> String {
    Uuid::new_v4().simple().to_string()
}

fn create_request(client_id: Uuid) -> CreateInvoiceRequest {
    CreateInvoiceRequest {
        client_id,
        project_id: None,
        number: Some(unique_number()),
        issue_date: NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
        due_date: Some(NaiveDate::from_ymd_opt(2026, 4, 14).unwrap()),
        vat_rate: 21.0,
        withholding_rate: 15.0,
        lines: vec![
            NewInvoiceLine {
                concept: "Consulting".to_string(),
                quantity: 2.0,
                unit_price: 50.0,
            },
            NewInvoiceLine {
                concept: "Hosting".to_string(),
                quantity: 1.0,
                unit_price: 12.34,
            },
        ],
        notes: None,
        status: None,
        scheduled_send_date: None,
    }
}

#[tokio::test]
async fn test_metadata_patch_leaves_totals_and_lines_untouched() {
    let Some(pool) = common::test_pool().await else {
        return;
    };
    let client_id = common::seed_client(&pool, "Acme S.L.", Some("billing@acme.example")).await;
    let repo = InvoiceRepository::new(pool.clone(), CounterRepository::new(pool.clone(), 1));

    let (created, created_lines) = repo.create(&create_request(client_id)).await.unwrap();
    assert_eq!(created.subtotal, 112.34);
    assert_eq!(created.total, 119.08);
    assert_eq!(created_lines.len(), 2);

    let patch = UpdateInvoiceRequest {
        status: Some(InvoiceStatus::Paid),
        notes: Some("Paid by wire".to_string()),
        ..Default::default()
    };
    let updated = repo.update(created.id, &patch).await.unwrap().unwrap();

    assert_eq!(updated.status, "paid");
    assert_eq!(updated.notes.as_deref(), Some("Paid by wire"));

    // Financials are bit-for-bit what the creation stored.
    assert_eq!(updated.subtotal.to_bits(), created.subtotal.to_bits());
    assert_eq!(updated.total.to_bits(), created.total.to_bits());
    assert_eq!(updated.vat_rate.to_bits(), created.vat_rate.to_bits());
    assert_eq!(
        updated.withholding_rate.to_bits(),
        created.withholding_rate.to_bits()
    );

    // The line rows themselves are untouched, ids included.
    let mut created_lines = created_lines;
    created_lines.sort_by_key(|line| line.id);
    let lines_after = repo.lines(created.id).await.unwrap();
    assert_eq!(lines_after.len(), created_lines.len());
    for (before, after) in created_lines.iter().zip(&lines_after) {
        assert_eq!(after.id, before.id);
        assert_eq!(after.concept, before.concept);
        assert_eq!(after.line_total.to_bits(), before.line_total.to_bits());
    }

    common::cleanup_client(&pool, client_id).await;
}

#[tokio::test]
async fn test_line_replacement_recomputes_totals() {
    let Some(pool) = common::test_pool().await else {
        return;
    };
    let client_id = common::seed_client(&pool, "Acme S.L.", None).await;
    let repo = InvoiceRepository::new(pool.clone(), CounterRepository::new(pool.clone(), 1));

    let (created, _) = repo.create(&create_request(client_id)).await.unwrap();

    // Replace the line set without touching the rates; they fall back to
    // the stored ones.
    let patch = UpdateInvoiceRequest {
        lines: Some(vec![NewInvoiceLine {
            concept: "Retainer".to_string(),
            quantity: 1.0,
            unit_price: 200.0,
        }]),
        ..Default::default()
    };
    let updated = repo.update(created.id, &patch).await.unwrap().unwrap();

    assert_eq!(updated.subtotal, 200.0);
    assert_eq!(updated.vat_rate, 21.0);
    assert_eq!(updated.withholding_rate, 15.0);
    assert_eq!(updated.total, 212.0);

    let lines = repo.lines(created.id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].concept, "Retainer");
    assert_eq!(lines[0].line_total, 200.0);

    common::cleanup_client(&pool, client_id).await;
}
