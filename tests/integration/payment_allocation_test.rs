// Service-level tests for payment allocation over in-memory ledgers

#[path = "../helpers/mod.rs"]
mod helpers;

use futures_util::future::join_all;
use helpers::*;
use order_engine::core::AppError;
use order_engine::modules::receivables::{LedgerStatus, PaymentMethod, PaymentRequest};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const CLIENT: &str = "client-1";

async fn seed_three_entries(engine: &TestEngine) {
    engine
        .ledger
        .seed(ledger_entry("le-a", CLIENT, date(2025, 1, 1), dec!(5000)))
        .await;
    engine
        .ledger
        .seed(ledger_entry("le-b", CLIENT, date(2025, 1, 2), dec!(3000)))
        .await;
    engine
        .ledger
        .seed(ledger_entry("le-c", CLIENT, date(2025, 1, 3), dec!(7000)))
        .await;
}

fn payment(amount: Decimal) -> PaymentRequest {
    PaymentRequest {
        client_id: CLIENT.to_string(),
        amount,
        eligible_ledger_ids: None,
        method: PaymentMethod::BankTransfer,
        date: Some(date(2025, 2, 1)),
    }
}

async fn total_outstanding(engine: &TestEngine) -> Decimal {
    let mut total = Decimal::ZERO;
    for id in ["le-a", "le-b", "le-c"] {
        total += engine.ledger.entry(CLIENT, id).await.unwrap().outstanding_amount;
    }
    total
}

#[tokio::test]
async fn test_payment_applied_oldest_first() {
    let engine = TestEngine::new();
    seed_three_entries(&engine).await;

    let result = engine
        .receivables
        .allocate_payment(&payment(dec!(6000)))
        .await
        .unwrap();

    assert_eq!(result.plan.lines.len(), 2);
    assert_eq!(result.receipts.len(), 2);

    let a = engine.ledger.entry(CLIENT, "le-a").await.unwrap();
    let b = engine.ledger.entry(CLIENT, "le-b").await.unwrap();
    let c = engine.ledger.entry(CLIENT, "le-c").await.unwrap();

    assert_eq!((a.outstanding_amount, a.status), (dec!(0), LedgerStatus::Paid));
    assert_eq!((b.outstanding_amount, b.status), (dec!(2000), LedgerStatus::Partial));
    assert_eq!((c.outstanding_amount, c.status), (dec!(7000), LedgerStatus::Open));

    let receipts = engine.ledger.receipts_of(CLIENT).await;
    let receipt_total: Decimal = receipts.iter().map(|r| r.amount).sum();
    assert_eq!(receipt_total, dec!(6000));
    assert!(receipts.iter().all(|r| r.date == date(2025, 2, 1)));
    assert_eq!(engine.ledger.commit_count(), 1);
}

#[tokio::test]
async fn test_over_allocation_writes_nothing() {
    let engine = TestEngine::new();
    seed_three_entries(&engine).await;

    let result = engine.receivables.allocate_payment(&payment(dec!(20000))).await;

    assert!(matches!(
        result,
        Err(AppError::OverAllocation { available, .. }) if available == dec!(15000)
    ));
    assert_eq!(engine.ledger.commit_count(), 0);
    assert_eq!(total_outstanding(&engine).await, dec!(15000));
    assert!(engine.ledger.receipts_of(CLIENT).await.is_empty());
}

#[tokio::test]
async fn test_payment_beyond_stored_precision_writes_nothing() {
    let engine = TestEngine::new();
    seed_three_entries(&engine).await;

    let result = engine.receivables.allocate_payment(&payment(dec!(0.00005))).await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(engine.ledger.commit_count(), 0);
    assert_eq!(total_outstanding(&engine).await, dec!(15000));
    assert!(engine.ledger.receipts_of(CLIENT).await.is_empty());
}

#[tokio::test]
async fn test_manual_selection_keeps_date_order() {
    let engine = TestEngine::new();
    seed_three_entries(&engine).await;

    let mut request = payment(dec!(8000));
    request.eligible_ledger_ids = Some(vec!["le-c".to_string(), "le-a".to_string()]);

    let result = engine.receivables.allocate_payment(&request).await.unwrap();

    let order: Vec<&str> = result
        .plan
        .lines
        .iter()
        .map(|l| l.ledger_entry_id.as_str())
        .collect();
    assert_eq!(order, vec!["le-a", "le-c"]);
    assert_eq!(
        engine.ledger.entry(CLIENT, "le-b").await.unwrap().outstanding_amount,
        dec!(3000)
    );
    assert_eq!(
        engine.ledger.entry(CLIENT, "le-c").await.unwrap().outstanding_amount,
        dec!(4000)
    );
}

#[tokio::test]
async fn test_concurrent_payments_never_double_spend() {
    let engine = TestEngine::new();
    seed_three_entries(&engine).await;

    // Four payments of 5,000 against 15,000 outstanding: exactly one must fail
    let requests: Vec<PaymentRequest> = (0..4).map(|_| payment(dec!(5000))).collect();
    let results = join_all(
        requests
            .iter()
            .map(|request| engine.receivables.allocate_payment(request)),
    )
    .await;

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    let over_allocated = results
        .iter()
        .filter(|r| matches!(r, Err(AppError::OverAllocation { .. })))
        .count();

    assert_eq!(succeeded, 3);
    assert_eq!(over_allocated, 1);
    assert_eq!(total_outstanding(&engine).await, dec!(0));

    let receipt_total: Decimal = engine
        .ledger
        .receipts_of(CLIENT)
        .await
        .iter()
        .map(|r| r.amount)
        .sum();
    assert_eq!(receipt_total, dec!(15000));
}

#[tokio::test]
async fn test_conflict_is_retried_from_scratch() {
    let engine = TestEngine::new();
    seed_three_entries(&engine).await;
    engine.ledger.inject_conflicts(2);

    let result = engine
        .receivables
        .allocate_payment(&payment(dec!(6000)))
        .await
        .unwrap();

    assert_eq!(result.plan.allocated_total(), dec!(6000));
    assert_eq!(engine.ledger.commit_count(), 1);
    assert_eq!(total_outstanding(&engine).await, dec!(9000));
    assert_eq!(engine.ledger.receipts_of(CLIENT).await.len(), 2);
}

#[tokio::test]
async fn test_retry_budget_exhausted() {
    let engine = TestEngine::new();
    seed_three_entries(&engine).await;
    engine.ledger.inject_conflicts(10);

    let result = engine.receivables.allocate_payment(&payment(dec!(6000))).await;

    assert!(matches!(result, Err(AppError::ConcurrencyConflict(_))));
    assert_eq!(total_outstanding(&engine).await, dec!(15000));
    assert!(engine.ledger.receipts_of(CLIENT).await.is_empty());
}

#[tokio::test]
async fn test_cancelled_entry_leaves_the_pool() {
    let engine = TestEngine::new();
    seed_three_entries(&engine).await;

    let cancelled = engine
        .receivables
        .cancel_ledger_entry(CLIENT, "le-a")
        .await
        .unwrap();
    assert_eq!(cancelled.status, LedgerStatus::Cancelled);

    let result = engine
        .receivables
        .allocate_payment(&payment(dec!(4000)))
        .await
        .unwrap();

    assert_eq!(result.plan.lines[0].ledger_entry_id, "le-b");
    assert_eq!(result.plan.lines[1].ledger_entry_id, "le-c");
    assert_eq!(
        engine.ledger.entry(CLIENT, "le-a").await.unwrap().outstanding_amount,
        dec!(5000)
    );
}

#[tokio::test]
async fn test_partially_paid_entry_cannot_be_cancelled() {
    let engine = TestEngine::new();
    seed_three_entries(&engine).await;
    engine
        .receivables
        .allocate_payment(&payment(dec!(1000)))
        .await
        .unwrap();

    let result = engine.receivables.cancel_ledger_entry(CLIENT, "le-a").await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_cancel_unknown_entry_is_not_found() {
    let engine = TestEngine::new();
    let result = engine.receivables.cancel_ledger_entry(CLIENT, "missing").await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_preview_does_not_mutate() {
    let engine = TestEngine::new();
    seed_three_entries(&engine).await;

    let plan = engine
        .receivables
        .preview_allocation(CLIENT, dec!(6000), None)
        .await
        .unwrap();

    assert_eq!(plan.allocated_total(), dec!(6000));
    assert_eq!(engine.ledger.commit_count(), 0);
    assert_eq!(total_outstanding(&engine).await, dec!(15000));
}

#[tokio::test]
async fn test_posted_entry_is_allocatable_and_has_receipts() {
    let engine = TestEngine::new();
    let entry = engine
        .receivables
        .post_ledger_entry(CLIENT.to_string(), date(2025, 1, 5), dec!(2500))
        .await
        .unwrap();

    engine
        .receivables
        .allocate_payment(&payment(dec!(2500)))
        .await
        .unwrap();

    let receipts = engine.receivables.list_receipts(&entry.id).await.unwrap();
    assert_eq!(receipts.len(), 1);
    assert_eq!(receipts[0].amount, dec!(2500));
}

#[tokio::test]
async fn test_non_positive_payment_rejected() {
    let engine = TestEngine::new();
    seed_three_entries(&engine).await;

    let result = engine.receivables.allocate_payment(&payment(dec!(0))).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}
