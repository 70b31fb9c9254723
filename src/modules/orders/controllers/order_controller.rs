// HTTP handler for order pricing
//
// Endpoints:
// - POST /clients/{client_id}/orders/price - Price an order and fold it into today's shipping totals

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::core::Result;
use crate::modules::orders::{
    models::{OrderDraft, OrderLineItem, OrderQuote},
    services::OrderPricingService,
};

/// Request for POST /clients/{client_id}/orders/price
#[derive(Debug, Deserialize)]
pub struct PriceOrderRequest {
    pub lines: Vec<OrderLineItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuotedLineResponse {
    pub sellable_id: String,
    pub quantity: i64,
    pub unit_price: String,
    pub discount_rate: String,
    pub total_price: String,
    pub shipping_fee: String,
    pub direct_to_customer: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderQuoteResponse {
    pub client_id: String,
    pub business_date: String,
    pub lines: Vec<QuotedLineResponse>,
    pub subtotal: String,
    pub net_shipping_fee: String,
    pub adjustment_amount: String,
    pub amount_due: String,
    pub shipping_rule: String,
}

impl From<OrderQuote> for OrderQuoteResponse {
    fn from(quote: OrderQuote) -> Self {
        Self {
            client_id: quote.client_id,
            business_date: quote.business_date.to_string(),
            lines: quote
                .lines
                .into_iter()
                .map(|line| QuotedLineResponse {
                    sellable_id: line.sellable_id,
                    quantity: line.quantity,
                    unit_price: line.price.unit_price.to_string(),
                    discount_rate: line.price.discount_rate.to_string(),
                    total_price: line.price.total_price.to_string(),
                    shipping_fee: line.shipping_fee.to_string(),
                    direct_to_customer: line.direct_to_customer,
                })
                .collect(),
            subtotal: quote.subtotal.to_string(),
            net_shipping_fee: quote.net_shipping_fee.to_string(),
            adjustment_amount: quote.adjustment_amount.to_string(),
            amount_due: quote.amount_due.to_string(),
            shipping_rule: quote.shipping_rule.as_str().to_string(),
        }
    }
}

/// POST /clients/{client_id}/orders/price
///
/// # Returns
/// - 200: Priced order
/// - 400: Invalid quantity, price profile or shipping profile
/// - 404: Unknown sellable id
/// - 409: Could not serialize against concurrent orders of the client
pub async fn price_order(
    client_id: web::Path<String>,
    request: web::Json<PriceOrderRequest>,
    service: web::Data<OrderPricingService>,
) -> Result<HttpResponse> {
    let draft = OrderDraft {
        client_id: client_id.into_inner(),
        lines: request.into_inner().lines,
    };

    let quote = service.price_order(&draft).await?;
    Ok(HttpResponse::Ok().json(OrderQuoteResponse::from(quote)))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/clients/{client_id}/orders/price", web::post().to(price_order));
}
