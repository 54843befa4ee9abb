//! Admin views over every customer's orders.

use serde_json::{Value, json};

use crate::{
    dto::orders::ReviewOrderRequest,
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{CustomerSummary, Order, OrderStatus, Profile, Role, keyed_children},
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    services::order_service::{load_order, load_orders, select_orders},
    state::AppState,
    store::{DocumentStore, StoreResult, decode, paths},
};

/// Every non-admin user with their order count, pending customers first.
pub async fn load_customers(store: &dyn DocumentStore) -> AppResult<Vec<CustomerSummary>> {
    let Some(Value::Object(users)) = store.read(paths::USERS).await? else {
        return Ok(Vec::new());
    };

    let mut customers = Vec::new();
    for (uid, user) in users {
        let role = Role::from_stored(user.get("role").and_then(Value::as_str));
        if role == Role::Admin {
            continue;
        }
        let (profile, orders) = match decode_customer(&uid, &user) {
            Ok(decoded) => decoded,
            Err(err) => {
                tracing::warn!(uid = %uid, error = %err, "skipping customer with malformed data");
                continue;
            }
        };
        customers.push(CustomerSummary {
            username: profile.username,
            email: profile.email,
            order_count: orders.len(),
            has_pending_orders: orders.iter().any(Order::is_pending),
            uid,
        });
    }
    customers.sort_by(|a, b| {
        b.has_pending_orders
            .cmp(&a.has_pending_orders)
            .then_with(|| a.username.cmp(&b.username))
            .then_with(|| a.uid.cmp(&b.uid))
    });
    Ok(customers)
}

fn decode_customer(uid: &str, user: &Value) -> StoreResult<(Profile, Vec<Order>)> {
    let profile = match user.get("profile") {
        Some(p) => decode(&paths::profile(uid), p.clone())?,
        None => Profile::default(),
    };
    let orders = keyed_children(&paths::orders(uid), user.get("orders").cloned())?;
    Ok((profile, orders))
}

pub async fn list_customers(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<Vec<CustomerSummary>>> {
    ensure_admin(user)?;
    let customers = load_customers(state.store.as_ref()).await?;
    let total = customers.len() as i64;
    Ok(ApiResponse::success(
        "Customers",
        customers,
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn list_customer_orders(
    state: &AppState,
    user: &AuthUser,
    uid: &str,
    query: OrderListQuery,
) -> AppResult<ApiResponse<Vec<Order>>> {
    ensure_admin(user)?;
    let orders = load_orders(state.store.as_ref(), uid).await?;
    select_orders(orders, &query)
}

pub async fn get_customer_order(
    state: &AppState,
    user: &AuthUser,
    uid: &str,
    id: &str,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let order = load_order(state.store.as_ref(), uid, id).await?;
    Ok(ApiResponse::success("Ok", order, Some(Meta::empty())))
}

/// Accept or reject a pending order. Only the `status` field is written.
pub async fn review_order(
    state: &AppState,
    user: &AuthUser,
    uid: &str,
    id: &str,
    payload: ReviewOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    if payload.status == OrderStatus::Pending {
        return Err(AppError::BadRequest(
            "status must be Diterima or Ditolak".into(),
        ));
    }

    let mut order = load_order(state.store.as_ref(), uid, id).await?;
    if !order.is_pending() {
        return Err(AppError::BadRequest("order has already been reviewed".into()));
    }

    state
        .store
        .write(&format!("{}/status", paths::order(uid, id)), json!(payload.status))
        .await?;
    order.status = Some(payload.status);

    tracing::info!(admin = %user.uid, customer = %uid, order_id = %id, status = ?payload.status, "order reviewed");
    Ok(ApiResponse::success("Order updated", order, Some(Meta::empty())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn customers_skip_admins_and_flag_pending() {
        let store = MemoryStore::with_root(json!({
            "users": {
                "admin1": { "role": "admin", "profile": { "username": "root" } },
                "u1": {
                    "profile": { "username": "sari", "email": "sari@clothy.id" },
                    "orders": {
                        "o1": {
                            "items": [], "total": "10", "paymentMethod": "COD",
                            "address": {}, "createdAt": "2024-05-01T10:00:00Z"
                        }
                    }
                },
                "u2": {
                    "profile": { "username": "budi" },
                    "orders": {
                        "o2": {
                            "items": [], "total": "10", "paymentMethod": "Transfer",
                            "address": {}, "status": "Diterima", "createdAt": "2024-05-01T10:00:00Z"
                        }
                    }
                },
                "u3": { "role": "customer", "profile": { "username": "ani" } }
            }
        }));

        let customers = load_customers(&store).await.unwrap();
        let uids: Vec<_> = customers.iter().map(|c| c.uid.as_str()).collect();
        assert_eq!(uids, vec!["u1", "u3", "u2"]);
        assert!(customers[0].has_pending_orders);
        assert_eq!(customers[0].order_count, 1);
        assert!(!customers[2].has_pending_orders);
    }

    #[tokio::test]
    async fn malformed_customer_is_skipped() {
        let store = MemoryStore::with_root(json!({
            "users": {
                "u1": { "profile": { "username": "sari" } },
                "u2": { "profile": { "username": "rusak" }, "orders": { "o1": { "total": "bukan angka" } } }
            }
        }));

        let customers = load_customers(&store).await.unwrap();
        assert_eq!(customers.len(), 1);
        assert_eq!(customers[0].uid, "u1");
    }
}
