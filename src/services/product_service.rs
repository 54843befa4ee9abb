use crate::{
    dto::products::{CreateProductRequest, UpdateProductRequest, validate_name, validate_price},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Catalog, Category, CategoryFilter, Product},
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    state::AppState,
    store::{self, DocumentStore, FromSnapshot, Patch, Watch, paths},
};

pub async fn load_catalog(store: &dyn DocumentStore) -> AppResult<Catalog> {
    let snapshot = store.read(paths::PRODUCTS).await?;
    Ok(Catalog::from_snapshot(paths::PRODUCTS, snapshot)?)
}

/// Live catalog: the current products first, then every change.
pub async fn watch_catalog(store: &dyn DocumentStore) -> AppResult<Watch<Catalog>> {
    Ok(store.subscribe(paths::PRODUCTS).await?.typed())
}

pub async fn find_product(store: &dyn DocumentStore, category: Category, id: &str) -> AppResult<Product> {
    let mut product: Product = store::get(store, &paths::product(category, id))
        .await?
        .ok_or(AppError::NotFound)?;
    product.id = id.to_string();
    product.category = category;
    Ok(product)
}

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<Vec<Product>>> {
    let (page, per_page, _) = query.pagination().normalize();
    let filter = query
        .category
        .as_deref()
        .filter(|c| !c.is_empty())
        .map(str::parse::<CategoryFilter>)
        .transpose()
        .map_err(AppError::BadRequest)?
        .unwrap_or_default();
    let needle = query
        .q
        .as_deref()
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty());

    let mut items: Vec<Product> = load_catalog(state.store.as_ref())
        .await?
        .products
        .into_iter()
        .filter(|p| filter.matches(p.category))
        .filter(|p| needle.as_ref().is_none_or(|n| p.name.to_lowercase().contains(n)))
        .collect();

    // the catalog arrives sorted by name
    if let Some(ProductSortBy::Price) = query.sort_by {
        items.sort_by(|a, b| a.price.cmp(&b.price).then_with(|| a.name.cmp(&b.name)));
    }
    if let Some(SortOrder::Desc) = query.sort_order {
        items.reverse();
    }

    Ok(ApiResponse::paged("Products", items, page, per_page))
}

pub async fn get_product(
    state: &AppState,
    category: Category,
    id: &str,
) -> AppResult<ApiResponse<Product>> {
    let product = find_product(state.store.as_ref(), category, id).await?;
    Ok(ApiResponse::success("Product", product, None))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    validate_name(&payload.name)?;
    validate_price(payload.price)?;

    let product = Product {
        id: state.store.push_key(),
        name: payload.name.trim().to_string(),
        price: payload.price,
        image: String::new(),
        description: payload.description,
        category: payload.category,
    };
    store::put(
        state.store.as_ref(),
        &paths::product(product.category, &product.id),
        &product,
    )
    .await?;

    tracing::info!(admin = %user.uid, product_id = %product.id, category = %product.category, "product created");
    Ok(ApiResponse::success(
        "Product created",
        product,
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    category: Category,
    id: &str,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let mut product = find_product(state.store.as_ref(), category, id).await?;

    if let Some(name) = payload.name {
        validate_name(&name)?;
        product.name = name.trim().to_string();
    }
    if let Some(price) = payload.price {
        validate_price(price)?;
        product.price = price;
    }
    if let Some(description) = payload.description {
        product.description = description;
    }
    if let Some(next) = payload.category {
        product.category = next;
    }

    let new_path = paths::product(product.category, id);
    let mut patch = Patch::new().set_json(&new_path, &product)?;
    if product.category != category {
        patch = patch.delete(paths::product(category, id));
        tracing::info!(product_id = %id, from = %category, to = %product.category, "product moved");
    }
    state.store.update(patch).await?;

    Ok(ApiResponse::success(
        "Updated",
        product,
        Some(Meta::empty()),
    ))
}

/// Removes the document and its image; a missing image is ignored.
pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    category: Category,
    id: &str,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    find_product(state.store.as_ref(), category, id).await?;
    state.store.remove(&paths::product(category, id)).await?;

    if let Err(err) = state.blobs.delete(&paths::product_image(id)).await {
        tracing::warn!(product_id = %id, error = %err, "product image delete failed");
    }

    tracing::info!(admin = %user.uid, product_id = %id, "product deleted");
    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({ "id": id }),
        Some(Meta::empty()),
    ))
}

pub async fn set_product_image(
    state: &AppState,
    user: &AuthUser,
    category: Category,
    id: &str,
    bytes: Vec<u8>,
    content_type: &str,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    validate_image(&bytes, content_type)?;
    let mut product = find_product(state.store.as_ref(), category, id).await?;

    let blob_path = paths::product_image(id);
    state.blobs.upload(&blob_path, bytes, content_type).await?;
    let url = state.blobs.url(&blob_path).await?;

    state
        .store
        .write(
            &format!("{}/image", paths::product(category, id)),
            serde_json::Value::String(url.clone()),
        )
        .await?;
    product.image = url;

    Ok(ApiResponse::success("Image updated", product, Some(Meta::empty())))
}

pub fn validate_image(bytes: &[u8], content_type: &str) -> AppResult<()> {
    if bytes.is_empty() {
        return Err(AppError::BadRequest("image body is empty".into()));
    }
    if !content_type.starts_with("image/") {
        return Err(AppError::BadRequest(format!(
            "expected an image content type, got `{content_type}`"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;
    use crate::store::MemoryStore;

    fn seeded() -> MemoryStore {
        MemoryStore::with_root(json!({
            "products": {
                "Dress": { "d1": { "name": "Batik Dress", "price": "250000", "category": "Dress" } },
                "Jaket": {
                    "j1": { "name": "Jaket Denim", "price": "300000", "category": "Jaket" },
                    "j2": { "name": "Bomber", "price": "275000", "category": "Jaket" }
                }
            }
        }))
    }

    #[tokio::test]
    async fn find_product_reads_category_path() {
        let store = seeded();
        let product = find_product(&store, Category::Jaket, "j2").await.unwrap();
        assert_eq!(product.name, "Bomber");
        assert_eq!(product.price, Decimal::new(275000, 0));
        assert!(matches!(
            find_product(&store, Category::Dress, "j2").await,
            Err(AppError::NotFound)
        ));
    }

    #[tokio::test]
    async fn catalog_watch_sees_new_products() {
        let store = seeded();
        let mut watch = watch_catalog(&store).await.unwrap();
        assert_eq!(watch.next().await.unwrap().unwrap().products.len(), 3);

        store
            .write("products/Sepatu/s1", json!({ "name": "Sneakers", "price": "1", "category": "Sepatu" }))
            .await
            .unwrap();
        assert_eq!(watch.next().await.unwrap().unwrap().products.len(), 4);
    }

    #[test]
    fn image_uploads_must_be_images() {
        assert!(validate_image(b"x", "image/png").is_ok());
        assert!(validate_image(b"", "image/png").is_err());
        assert!(validate_image(b"x", "text/plain").is_err());
    }
}
