use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{error::AppError, models::Category};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    #[schema(value_type = String, example = "149000")]
    pub price: Decimal,
    #[serde(default)]
    pub description: String,
    pub category: Category,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    pub description: Option<String>,
    /// Moving to another category changes where the product is stored.
    pub category: Option<Category>,
}

pub fn validate_price(price: Decimal) -> Result<(), AppError> {
    if price.is_sign_negative() {
        return Err(AppError::BadRequest("price must not be negative".into()));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::BadRequest("name is required".into()));
    }
    Ok(())
}
