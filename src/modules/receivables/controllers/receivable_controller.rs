// HTTP handlers for payment collection
//
// Endpoints:
// - POST /clients/{client_id}/payments - Allocate a payment oldest-debt-first
// - POST /clients/{client_id}/payments/preview - Show the allocation without applying it
// - POST /clients/{client_id}/ledger-entries - Post a ledger entry
// - POST /clients/{client_id}/ledger-entries/{entry_id}/cancel - Cancel an unpaid entry
// - GET /clients/{client_id}/ledger-entries/{entry_id}/receipts - Receipts applied to an entry

use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::Result;
use crate::modules::receivables::{
    models::{AllocationPlan, AllocationResult, LedgerEntry, PaymentMethod, Receipt},
    services::{PaymentRequest, ReceivableService},
};

/// Request for POST /clients/{client_id}/payments
#[derive(Debug, Deserialize)]
pub struct AllocatePaymentRequest {
    pub amount: Decimal,
    pub eligible_ledger_ids: Option<Vec<String>>,
    pub method: PaymentMethod,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AllocationLineResponse {
    pub ledger_entry_id: String,
    pub applied_amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_outstanding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_id: Option<String>,
}

/// Response for payment allocation and preview
#[derive(Debug, Serialize, Deserialize)]
pub struct AllocationResponse {
    pub client_id: String,
    pub payment_amount: String,
    pub applied: bool,
    pub allocations: Vec<AllocationLineResponse>,
}

impl From<AllocationResult> for AllocationResponse {
    fn from(result: AllocationResult) -> Self {
        let allocations = result
            .plan
            .lines
            .iter()
            .zip(result.updated_entries.iter().zip(result.receipts.iter()))
            .map(|(line, (entry, receipt))| AllocationLineResponse {
                ledger_entry_id: line.ledger_entry_id.clone(),
                applied_amount: line.applied_amount.to_string(),
                remaining_outstanding: Some(entry.outstanding_amount.to_string()),
                status: Some(entry.status.to_string()),
                receipt_id: Some(receipt.id.clone()),
            })
            .collect();

        Self {
            client_id: result.plan.client_id,
            payment_amount: result.plan.payment_amount.to_string(),
            applied: true,
            allocations,
        }
    }
}

impl From<AllocationPlan> for AllocationResponse {
    fn from(plan: AllocationPlan) -> Self {
        Self {
            client_id: plan.client_id,
            payment_amount: plan.payment_amount.to_string(),
            applied: false,
            allocations: plan
                .lines
                .into_iter()
                .map(|line| AllocationLineResponse {
                    ledger_entry_id: line.ledger_entry_id,
                    applied_amount: line.applied_amount.to_string(),
                    remaining_outstanding: None,
                    status: None,
                    receipt_id: None,
                })
                .collect(),
        }
    }
}

/// Request for POST /clients/{client_id}/ledger-entries
#[derive(Debug, Deserialize)]
pub struct PostLedgerEntryRequest {
    pub ledger_date: NaiveDate,
    pub total_amount: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LedgerEntryResponse {
    pub id: String,
    pub client_id: String,
    pub ledger_date: String,
    pub total_amount: String,
    pub outstanding_amount: String,
    pub status: String,
}

impl From<LedgerEntry> for LedgerEntryResponse {
    fn from(entry: LedgerEntry) -> Self {
        Self {
            id: entry.id,
            client_id: entry.client_id,
            ledger_date: entry.ledger_date.to_string(),
            total_amount: entry.total_amount.to_string(),
            outstanding_amount: entry.outstanding_amount.to_string(),
            status: entry.status.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReceiptResponse {
    pub id: String,
    pub ledger_entry_id: String,
    pub amount: String,
    pub date: String,
    pub method: String,
}

impl From<Receipt> for ReceiptResponse {
    fn from(receipt: Receipt) -> Self {
        Self {
            id: receipt.id,
            ledger_entry_id: receipt.ledger_entry_id,
            amount: receipt.amount.to_string(),
            date: receipt.date.to_string(),
            method: receipt.method.to_string(),
        }
    }
}

/// POST /clients/{client_id}/payments
///
/// # Returns
/// - 200: Payment allocated, receipts recorded
/// - 422: Payment exceeds the selected outstanding balance (nothing applied)
/// - 409: Could not serialize against concurrent payments
pub async fn allocate_payment(
    client_id: web::Path<String>,
    request: web::Json<AllocatePaymentRequest>,
    service: web::Data<ReceivableService>,
) -> Result<HttpResponse> {
    let request = request.into_inner();
    let payment = PaymentRequest {
        client_id: client_id.into_inner(),
        amount: request.amount,
        eligible_ledger_ids: request.eligible_ledger_ids,
        method: request.method,
        date: request.date,
    };

    let result = service.allocate_payment(&payment).await?;
    Ok(HttpResponse::Ok().json(AllocationResponse::from(result)))
}

/// POST /clients/{client_id}/payments/preview
pub async fn preview_allocation(
    client_id: web::Path<String>,
    request: web::Json<AllocatePaymentRequest>,
    service: web::Data<ReceivableService>,
) -> Result<HttpResponse> {
    let plan = service
        .preview_allocation(
            &client_id,
            request.amount,
            request.eligible_ledger_ids.as_deref(),
        )
        .await?;

    Ok(HttpResponse::Ok().json(AllocationResponse::from(plan)))
}

/// POST /clients/{client_id}/ledger-entries
pub async fn post_ledger_entry(
    client_id: web::Path<String>,
    request: web::Json<PostLedgerEntryRequest>,
    service: web::Data<ReceivableService>,
) -> Result<HttpResponse> {
    let entry = service
        .post_ledger_entry(client_id.into_inner(), request.ledger_date, request.total_amount)
        .await?;

    Ok(HttpResponse::Created().json(LedgerEntryResponse::from(entry)))
}

/// POST /clients/{client_id}/ledger-entries/{entry_id}/cancel
pub async fn cancel_ledger_entry(
    path: web::Path<(String, String)>,
    service: web::Data<ReceivableService>,
) -> Result<HttpResponse> {
    let (client_id, entry_id) = path.into_inner();
    let entry = service.cancel_ledger_entry(&client_id, &entry_id).await?;

    Ok(HttpResponse::Ok().json(LedgerEntryResponse::from(entry)))
}

/// GET /clients/{client_id}/ledger-entries/{entry_id}/receipts
pub async fn list_receipts(
    path: web::Path<(String, String)>,
    service: web::Data<ReceivableService>,
) -> Result<HttpResponse> {
    let (client_id, entry_id) = path.into_inner();
    let receipts: Vec<ReceiptResponse> = service
        .list_receipts(&entry_id)
        .await?
        .into_iter()
        .filter(|r| r.client_id == client_id)
        .map(ReceiptResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(receipts))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/clients/{client_id}/payments",
        web::post().to(allocate_payment),
    )
    .route(
        "/clients/{client_id}/payments/preview",
        web::post().to(preview_allocation),
    )
    .route(
        "/clients/{client_id}/ledger-entries",
        web::post().to(post_ledger_entry),
    )
    .route(
        "/clients/{client_id}/ledger-entries/{entry_id}/cancel",
        web::post().to(cancel_ledger_entry),
    )
    .route(
        "/clients/{client_id}/ledger-entries/{entry_id}/receipts",
        web::get().to(list_receipts),
    );
}
