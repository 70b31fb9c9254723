// HTTP handler for line price previews
//
// Endpoints:
// - POST /pricing/line - Price a single line item against the stored catalog profile
// - PUT /catalog/{sellable_id}/price-profile - Create or replace a sellable's price profile

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::core::Result;
use crate::modules::pricing::{
    models::{OptionSelection, PriceProfile},
    repositories::CatalogRepository,
    services::{LinePrice, PriceCalculator},
};

/// Request for POST /pricing/line
#[derive(Debug, Deserialize)]
pub struct LinePriceRequest {
    pub sellable_id: String,
    pub quantity: i64,
    pub specification_id: Option<String>,
    #[serde(default)]
    pub option_selections: Vec<OptionSelection>,
}

/// Response for POST /pricing/line
#[derive(Debug, Serialize, Deserialize)]
pub struct LinePriceResponse {
    pub sellable_id: String,
    pub quantity: i64,
    pub base_price: String,
    pub list_price: String,
    pub discount_rate: String,
    pub unit_price: String,
    pub total_price: String,
}

impl LinePriceResponse {
    pub fn new(sellable_id: String, quantity: i64, price: &LinePrice) -> Self {
        Self {
            sellable_id,
            quantity,
            base_price: price.base_price.to_string(),
            list_price: price.list_price.to_string(),
            discount_rate: price.discount_rate.to_string(),
            unit_price: price.unit_price.to_string(),
            total_price: price.total_price.to_string(),
        }
    }
}

/// POST /pricing/line
///
/// # Returns
/// - 200: Priced line
/// - 400: Invalid quantity or broken price profile
/// - 404: Unknown sellable id
pub async fn preview_line_price(
    request: web::Json<LinePriceRequest>,
    catalog: web::Data<dyn CatalogRepository>,
) -> Result<HttpResponse> {
    let request = request.into_inner();
    let profile = catalog.get_price_profile(&request.sellable_id).await?;

    let price = PriceCalculator::compute_line_price(
        &profile,
        request.quantity,
        request.specification_id.as_deref(),
        &request.option_selections,
    )?;

    Ok(HttpResponse::Ok().json(LinePriceResponse::new(
        request.sellable_id,
        request.quantity,
        &price,
    )))
}

/// PUT /catalog/{sellable_id}/price-profile
///
/// The path id wins over any `sellable_id` in the body.
///
/// # Returns
/// - 204: Saved
/// - 400: Profile failed validation (negative prices, overlapping tiers, ...)
pub async fn put_price_profile(
    sellable_id: web::Path<String>,
    profile: web::Json<PriceProfile>,
    catalog: web::Data<dyn CatalogRepository>,
) -> Result<HttpResponse> {
    let mut profile = profile.into_inner();
    profile.sellable_id = sellable_id.into_inner();

    catalog.save_price_profile(&profile).await?;

    tracing::info!(
        sellable_id = profile.sellable_id.as_str(),
        tiers = profile.discount_tiers.len(),
        "Price profile saved"
    );

    Ok(HttpResponse::NoContent().finish())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/pricing/line", web::post().to(preview_line_price))
        .route(
            "/catalog/{sellable_id}/price-profile",
            web::put().to(put_price_profile),
        );
}
