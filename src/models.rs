use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use utoipa::ToSchema;

use crate::store::{FromSnapshot, StoreResult, decode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub enum Category {
    #[serde(rename = "T-Shirt")]
    TShirt,
    Celana,
    Dress,
    Jaket,
    Hoodie,
    Sepatu,
    Aksesoris,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::TShirt,
        Category::Celana,
        Category::Dress,
        Category::Jaket,
        Category::Hoodie,
        Category::Sepatu,
        Category::Aksesoris,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::TShirt => "T-Shirt",
            Category::Celana => "Celana",
            Category::Dress => "Dress",
            Category::Jaket => "Jaket",
            Category::Hoodie => "Hoodie",
            Category::Sepatu => "Sepatu",
            Category::Aksesoris => "Aksesoris",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown category `{s}`"))
    }
}

/// Catalog filter; `ALL` is never a stored category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn matches(&self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(c) => *c == category,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("ALL") {
            Ok(CategoryFilter::All)
        } else {
            s.parse().map(CategoryFilter::Only)
        }
    }
}

/// Documents stored under a generated key carry that key as their id.
pub trait Keyed {
    fn set_key(&mut self, key: String);
}

/// Decode every child of a keyed collection, key taken from the map.
pub fn keyed_children<T: DeserializeOwned + Keyed>(path: &str, value: Option<Value>) -> StoreResult<Vec<T>> {
    let Some(Value::Object(map)) = value else {
        return Ok(Vec::new());
    };
    let mut items = Vec::with_capacity(map.len());
    for (key, child) in map {
        let mut item: T = decode(&format!("{path}/{key}"), child)?;
        item.set_key(key);
        items.push(item);
    }
    Ok(items)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[schema(value_type = String, example = "149000")]
    pub price: Decimal,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub description: String,
    pub category: Category,
}

impl Keyed for Product {
    fn set_key(&mut self, key: String) {
        self.id = key;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct Catalog {
    pub products: Vec<Product>,
}

impl FromSnapshot for Catalog {
    fn from_snapshot(path: &str, value: Option<Value>) -> StoreResult<Self> {
        let Some(Value::Object(categories)) = value else {
            return Ok(Catalog::default());
        };
        let mut products = Vec::new();
        for (category, children) in categories {
            let child_path = format!("{path}/{category}");
            products.extend(keyed_children::<Product>(&child_path, Some(children))?);
        }
        products.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(Catalog { products })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    #[serde(default)]
    pub key: String,
    pub product_id: String,
    pub category: Category,
    pub name: String,
    /// Price at the time the product was added.
    #[schema(value_type = String, example = "149000")]
    pub price: Decimal,
    #[serde(default)]
    pub image: String,
    pub quantity: u32,
}

impl CartEntry {
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            key: String::new(),
            product_id: product.id.clone(),
            category: product.category,
            name: product.name.clone(),
            price: product.price,
            image: product.image.clone(),
            quantity,
        }
    }

    /// `None` when price times quantity does not fit in a [`Decimal`].
    pub fn line_total(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity))
    }
}

impl Keyed for CartEntry {
    fn set_key(&mut self, key: String) {
        self.key = key;
    }
}

impl FromSnapshot for Vec<CartEntry> {
    fn from_snapshot(path: &str, value: Option<Value>) -> StoreResult<Self> {
        let mut entries: Vec<CartEntry> = keyed_children(path, value)?;
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub provinsi: String,
    #[serde(default)]
    pub kabupaten: String,
    #[serde(default)]
    pub kecamatan: String,
    #[serde(default)]
    pub kelurahan: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub kodepos: String,
    #[serde(default)]
    pub is_default: bool,
}

impl Keyed for Address {
    fn set_key(&mut self, key: String) {
        self.id = key;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub number_phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub image: String,
}

impl Profile {
    /// Name and phone are what the courier needs.
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && !self.number_phone.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum PaymentMethod {
    #[default]
    Transfer,
    #[serde(rename = "COD")]
    Cod,
    #[serde(rename = "E-Wallet")]
    EWallet,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum OrderStatus {
    #[default]
    Pending,
    #[serde(rename = "Diterima")]
    Accepted,
    #[serde(rename = "Ditolak")]
    Rejected,
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(OrderStatus::Pending),
            "Diterima" => Ok(OrderStatus::Accepted),
            "Ditolak" => Ok(OrderStatus::Rejected),
            other => Err(format!("unknown order status `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub key: String,
    pub product_id: String,
    pub category: Category,
    pub name: String,
    #[schema(value_type = String, example = "149000")]
    pub price: Decimal,
    #[serde(default)]
    pub image: String,
    pub quantity: u32,
}

impl OrderItem {
    pub fn line_total(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity))
    }
}

impl From<&CartEntry> for OrderItem {
    fn from(entry: &CartEntry) -> Self {
        Self {
            key: entry.key.clone(),
            product_id: entry.product_id.clone(),
            category: entry.category,
            name: entry.name.clone(),
            price: entry.price,
            image: entry.image.clone(),
            quantity: entry.quantity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[schema(value_type = String, example = "298000")]
    pub total: Decimal,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub address: Address,
    /// Absent until an admin reviews the order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn status(&self) -> OrderStatus {
        self.status.unwrap_or_default()
    }

    pub fn is_pending(&self) -> bool {
        self.status() == OrderStatus::Pending
    }
}

impl Keyed for Order {
    fn set_key(&mut self, key: String) {
        self.id = key;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Customer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Admin => "admin",
        }
    }

    /// Anything other than `admin` in `users/{uid}/role` is a customer.
    pub fn from_stored(value: Option<&str>) -> Self {
        match value {
            Some("admin") => Role::Admin,
            _ => Role::Customer,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    pub uid: String,
    pub username: String,
    pub email: String,
    pub order_count: usize,
    pub has_pending_orders: bool,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn category_round_trips_through_wire_names() {
        assert_eq!("T-Shirt".parse::<Category>().unwrap(), Category::TShirt);
        assert_eq!(serde_json::to_value(Category::TShirt).unwrap(), json!("T-Shirt"));
        assert!("Topi".parse::<Category>().is_err());
        assert_eq!("all".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert!(!CategoryFilter::Only(Category::Dress).matches(Category::Jaket));
    }

    #[test]
    fn unreviewed_order_serializes_without_status() {
        let order = Order {
            id: "o1".into(),
            items: vec![],
            total: Decimal::ZERO,
            payment_method: PaymentMethod::EWallet,
            address: Address::default(),
            status: None,
            submission_id: None,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&order).unwrap();
        assert!(value.get("status").is_none());
        assert_eq!(value["paymentMethod"], json!("E-Wallet"));
        assert!(order.is_pending());
    }

    #[test]
    fn catalog_flattens_categories_and_takes_keys() {
        let snapshot = json!({
            "Dress": { "p2": { "name": "Batik", "price": "200", "category": "Dress" } },
            "Hoodie": { "p1": { "name": "Abu", "price": 150.5, "category": "Hoodie" } }
        });
        let catalog = Catalog::from_snapshot("products", Some(snapshot)).unwrap();
        let ids: Vec<_> = catalog.products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2"]);
        assert_eq!(catalog.products[0].price, Decimal::new(1505, 1));
    }

    #[test]
    fn profile_requires_name_and_phone() {
        let mut profile = Profile {
            name: "Sari".into(),
            ..Profile::default()
        };
        assert!(!profile.is_complete());
        profile.number_phone = " 0812 ".into();
        assert!(profile.is_complete());
    }
}
