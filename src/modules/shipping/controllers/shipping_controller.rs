// HTTP handlers for shipping
//
// Endpoints:
// - POST /clients/{client_id}/shipping-adjustments - Record a carry-over for the next order today
// - GET /clients/{client_id}/shipping/today - Today's combined-shipping totals
// - PUT /clients/{client_id}/shipping-profile - Create or replace the client's shipping terms

use actix_web::{web, HttpResponse};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::Result;
use crate::modules::shipping::{
    models::{DailyShippingAccumulator, ShippingProfile, ShippingType},
    services::ShippingService,
};

/// Request for POST /clients/{client_id}/shipping-adjustments
#[derive(Debug, Deserialize)]
pub struct ShippingAdjustmentRequest {
    /// Positive credits the client, negative charges them
    pub amount: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccumulatorResponse {
    pub client_id: String,
    pub business_date: String,
    pub cumulative_subtotal: String,
    pub cumulative_shipping_charged: String,
    pub pending_adjustment_amount: String,
    pub free_shipping_refunded: bool,
}

impl From<DailyShippingAccumulator> for AccumulatorResponse {
    fn from(acc: DailyShippingAccumulator) -> Self {
        Self {
            client_id: acc.client_id,
            business_date: acc.date.to_string(),
            cumulative_subtotal: acc.cumulative_subtotal.to_string(),
            cumulative_shipping_charged: acc.cumulative_shipping_charged.to_string(),
            pending_adjustment_amount: acc.pending_adjustment_amount.to_string(),
            free_shipping_refunded: acc.free_shipping_refunded,
        }
    }
}

/// Request for PUT /clients/{client_id}/shipping-profile
#[derive(Debug, Deserialize)]
pub struct ShippingProfileRequest {
    pub shipping_type: ShippingType,
    pub free_shipping_threshold: Decimal,
}

/// POST /clients/{client_id}/shipping-adjustments
pub async fn record_adjustment(
    client_id: web::Path<String>,
    request: web::Json<ShippingAdjustmentRequest>,
    service: web::Data<ShippingService>,
) -> Result<HttpResponse> {
    let accumulator = service
        .record_pending_adjustment(&client_id, request.amount)
        .await?;

    Ok(HttpResponse::Ok().json(AccumulatorResponse::from(accumulator)))
}

/// GET /clients/{client_id}/shipping/today
pub async fn get_today(
    client_id: web::Path<String>,
    service: web::Data<ShippingService>,
) -> Result<HttpResponse> {
    let accumulator = service.today_accumulator(&client_id).await?;
    Ok(HttpResponse::Ok().json(AccumulatorResponse::from(accumulator)))
}

/// PUT /clients/{client_id}/shipping-profile
///
/// # Returns
/// - 204: Saved
/// - 400: Negative threshold
pub async fn put_shipping_profile(
    client_id: web::Path<String>,
    request: web::Json<ShippingProfileRequest>,
    service: web::Data<ShippingService>,
) -> Result<HttpResponse> {
    let profile = ShippingProfile::new(
        client_id.into_inner(),
        request.shipping_type,
        request.free_shipping_threshold,
    );
    service.save_shipping_profile(&profile).await?;

    Ok(HttpResponse::NoContent().finish())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/clients/{client_id}/shipping-adjustments",
        web::post().to(record_adjustment),
    )
    .route("/clients/{client_id}/shipping/today", web::get().to(get_today))
    .route(
        "/clients/{client_id}/shipping-profile",
        web::put().to(put_shipping_profile),
    );
}
