// HTTP contract tests for the engine's endpoints
//
// Routes are served from in-memory repositories; no database required.

#[path = "../helpers/mod.rs"]
mod helpers;

use std::str::FromStr;
use std::sync::Arc;

use actix_web::{http::StatusCode, test, web, App};
use helpers::*;
use order_engine::modules::{self, pricing::CatalogRepository};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

macro_rules! test_app {
    ($engine:expr) => {{
        let catalog: Arc<dyn CatalogRepository> = $engine.catalog.clone();
        test::init_service(
            App::new()
                .app_data(web::Data::from(catalog))
                .app_data(web::Data::from($engine.orders.clone()))
                .app_data(web::Data::from($engine.shipping.clone()))
                .app_data(web::Data::from($engine.receivables.clone()))
                .configure(modules::configure),
        )
        .await
    }};
}

fn decimal(value: &Value) -> Decimal {
    Decimal::from_str(value.as_str().expect("amount is a string")).unwrap()
}

#[actix_web::test]
async fn test_health_endpoint() {
    let engine = TestEngine::new();
    let app = test_app!(engine);

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_line_price_endpoint() {
    let engine = TestEngine::new();
    engine.catalog.insert(brochure_profile());
    let app = test_app!(engine);

    let req = test::TestRequest::post()
        .uri("/pricing/line")
        .set_json(json!({
            "sellable_id": "brochure",
            "quantity": 5,
            "specification_id": "A4"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(decimal(&body["unit_price"]), dec!(10800));
    assert_eq!(decimal(&body["total_price"]), dec!(54000));
}

#[actix_web::test]
async fn test_invalid_quantity_is_400() {
    let engine = TestEngine::new();
    engine.catalog.insert(brochure_profile());
    let app = test_app!(engine);

    let req = test::TestRequest::post()
        .uri("/pricing/line")
        .set_json(json!({ "sellable_id": "brochure", "quantity": 0 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["kind"], "invalid_quantity");
}

#[actix_web::test]
async fn test_unknown_sellable_is_404() {
    let engine = TestEngine::new();
    let app = test_app!(engine);

    let req = test::TestRequest::post()
        .uri("/pricing/line")
        .set_json(json!({ "sellable_id": "nope", "quantity": 1 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_overlapping_tiers_rejected_on_save() {
    let engine = TestEngine::new();
    let app = test_app!(engine);

    let req = test::TestRequest::put()
        .uri("/catalog/poster/price-profile")
        .set_json(json!({
            "base_price": "1000",
            "discount_tiers": [
                { "min_quantity": 1, "max_quantity": 10, "discount_rate": "0.9" },
                { "min_quantity": 5, "max_quantity": null, "discount_rate": "0.8" }
            ]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["kind"], "invalid_price_profile");
}

#[actix_web::test]
async fn test_price_beyond_stored_precision_rejected_on_save() {
    let engine = TestEngine::new();
    let app = test_app!(engine);

    let req = test::TestRequest::put()
        .uri("/catalog/poster/price-profile")
        .set_json(json!({ "base_price": "1000.00005" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["kind"], "invalid_price_profile");
}

#[actix_web::test]
async fn test_saved_profile_is_priced() {
    let engine = TestEngine::new();
    let app = test_app!(engine);

    let req = test::TestRequest::put()
        .uri("/catalog/poster/price-profile")
        .set_json(json!({
            "base_price": "1000",
            "discount_tiers": [
                { "min_quantity": 10, "max_quantity": null, "discount_rate": "0.5" }
            ]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::post()
        .uri("/pricing/line")
        .set_json(json!({ "sellable_id": "poster", "quantity": 10 }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(decimal(&body["total_price"]), dec!(5000));
}

#[actix_web::test]
async fn test_order_price_endpoint() {
    let engine = TestEngine::new();
    engine.catalog.insert(brochure_profile());
    let app = test_app!(engine);

    let req = test::TestRequest::put()
        .uri("/clients/client-1/shipping-profile")
        .set_json(json!({ "shipping_type": "conditional", "free_shipping_threshold": "90000" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let line = json!({
        "sellable_id": "brochure",
        "quantity": 1,
        "shipping_fact": { "direct_to_customer": false, "fee": "2500" }
    });
    let req = test::TestRequest::post()
        .uri("/clients/client-1/orders/price")
        .set_json(json!({ "lines": [line.clone(), line.clone(), line] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["shipping_rule"], "batch_single_shipment");
    assert_eq!(decimal(&body["subtotal"]), dec!(30000));
    assert_eq!(decimal(&body["net_shipping_fee"]), dec!(2500));
    assert_eq!(decimal(&body["amount_due"]), dec!(32500));

    let fees: Vec<Decimal> = body["lines"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| decimal(&l["shipping_fee"]))
        .collect();
    assert_eq!(fees, vec![dec!(2500), dec!(0), dec!(0)]);
}

#[actix_web::test]
async fn test_payment_flow_endpoints() {
    let engine = TestEngine::new();
    let app = test_app!(engine);

    for (ledger_date, amount) in [("2025-01-01", "5000"), ("2025-01-02", "3000")] {
        let req = test::TestRequest::post()
            .uri("/clients/client-1/ledger-entries")
            .set_json(json!({ "ledger_date": ledger_date, "total_amount": amount }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let req = test::TestRequest::post()
        .uri("/clients/client-1/payments/preview")
        .set_json(json!({ "amount": "6000", "method": "cash" }))
        .to_request();
    let preview: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(preview["applied"], false);
    assert_eq!(preview["allocations"].as_array().unwrap().len(), 2);

    let req = test::TestRequest::post()
        .uri("/clients/client-1/payments")
        .set_json(json!({ "amount": "6000", "method": "bank_transfer" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["applied"], true);
    let allocations = body["allocations"].as_array().unwrap();
    assert_eq!(decimal(&allocations[0]["applied_amount"]), dec!(5000));
    assert_eq!(allocations[0]["status"], "paid");
    assert_eq!(decimal(&allocations[1]["remaining_outstanding"]), dec!(2000));

    let second_id = allocations[1]["ledger_entry_id"].as_str().unwrap().to_string();
    let req = test::TestRequest::get()
        .uri(&format!("/clients/client-1/ledger-entries/{}/receipts", second_id))
        .to_request();
    let receipts: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(receipts.as_array().unwrap().len(), 1);

    let req = test::TestRequest::post()
        .uri("/clients/client-1/payments")
        .set_json(json!({ "amount": "5000", "method": "cash" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["kind"], "over_allocation");
}

#[actix_web::test]
async fn test_cancel_endpoint() {
    let engine = TestEngine::new();
    engine
        .ledger
        .seed(ledger_entry("le-1", "client-1", date(2025, 1, 1), dec!(1000)))
        .await;
    let app = test_app!(engine);

    let req = test::TestRequest::post()
        .uri("/clients/client-1/ledger-entries/le-1/cancel")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "cancelled");

    let req = test::TestRequest::post()
        .uri("/clients/client-1/ledger-entries/le-1/cancel")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_shipping_adjustment_endpoints() {
    let engine = TestEngine::new();
    let app = test_app!(engine);

    let req = test::TestRequest::post()
        .uri("/clients/client-1/shipping-adjustments")
        .set_json(json!({ "amount": "1200" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/clients/client-1/shipping/today")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(decimal(&body["pending_adjustment_amount"]), dec!(1200));
    assert_eq!(body["free_shipping_refunded"], false);
}

#[actix_web::test]
async fn test_negative_threshold_is_400() {
    let engine = TestEngine::new();
    let app = test_app!(engine);

    let req = test::TestRequest::put()
        .uri("/clients/client-1/shipping-profile")
        .set_json(json!({ "shipping_type": "per_item", "free_shipping_threshold": "-1" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
