use serde::Deserialize;
use utoipa::ToSchema;

use crate::models::{OrderStatus, PaymentMethod};

#[derive(Debug, Deserialize, ToSchema)]
pub struct StartCheckoutRequest {
    /// Cart entry keys to purchase.
    pub keys: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectPaymentRequest {
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReviewOrderRequest {
    pub status: OrderStatus,
}
