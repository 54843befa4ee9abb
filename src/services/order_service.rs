use crate::{
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderStatus, keyed_children},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
    store::{self, DocumentStore, paths},
};

/// Every order of `uid`, newest first.
pub async fn load_orders(store: &dyn DocumentStore, uid: &str) -> AppResult<Vec<Order>> {
    let path = paths::orders(uid);
    let snapshot = store.read(&path).await?;
    let mut orders: Vec<Order> = keyed_children(&path, snapshot)?;
    sort_newest_first(&mut orders);
    Ok(orders)
}

pub fn sort_newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
}

pub async fn load_order(store: &dyn DocumentStore, uid: &str, id: &str) -> AppResult<Order> {
    let mut order: Order = store::get(store, &paths::order(uid, id))
        .await?
        .ok_or(AppError::NotFound)?;
    order.id = id.to_string();
    Ok(order)
}

/// Filter and page a newest-first order list.
pub fn select_orders(
    mut orders: Vec<Order>,
    query: &OrderListQuery,
) -> AppResult<ApiResponse<Vec<Order>>> {
    let (page, per_page, _) = query.pagination().normalize();
    if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
        let status: OrderStatus = status.parse().map_err(AppError::BadRequest)?;
        orders.retain(|o| o.status() == status);
    }
    if let Some(SortOrder::Asc) = query.sort_order {
        orders.reverse();
    }
    Ok(ApiResponse::paged("Ok", orders, page, per_page))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<Vec<Order>>> {
    let orders = load_orders(state.store.as_ref(), &user.uid).await?;
    select_orders(orders, &query)
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: &str,
) -> AppResult<ApiResponse<Order>> {
    let order = load_order(state.store.as_ref(), &user.uid, id).await?;
    Ok(ApiResponse::success("Ok", order, Some(Meta::empty())))
}
