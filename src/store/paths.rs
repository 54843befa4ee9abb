use crate::models::Category;

pub const USERS: &str = "users";
pub const PRODUCTS: &str = "products";

pub fn user(uid: &str) -> String {
    format!("users/{uid}")
}

pub fn role(uid: &str) -> String {
    format!("users/{uid}/role")
}

pub fn profile(uid: &str) -> String {
    format!("users/{uid}/profile")
}

pub fn cart(uid: &str) -> String {
    format!("users/{uid}/cart")
}

pub fn cart_entry(uid: &str, key: &str) -> String {
    format!("users/{uid}/cart/{key}")
}

pub fn addresses(uid: &str) -> String {
    format!("users/{uid}/addresses")
}

pub fn address(uid: &str, id: &str) -> String {
    format!("users/{uid}/addresses/{id}")
}

pub fn orders(uid: &str) -> String {
    format!("users/{uid}/orders")
}

pub fn order(uid: &str, id: &str) -> String {
    format!("users/{uid}/orders/{id}")
}

/// Submission id → order id marker written alongside each order.
pub fn checkout_marker(uid: &str, submission_id: &str) -> String {
    format!("users/{uid}/checkouts/{submission_id}")
}

pub fn category(category: Category) -> String {
    format!("products/{}", category.as_str())
}

pub fn product(category: Category, id: &str) -> String {
    format!("products/{}/{id}", category.as_str())
}

pub fn product_image(id: &str) -> String {
    format!("product_images/{id}")
}

pub fn profile_image(uid: &str) -> String {
    format!("profile_images/{uid}")
}
