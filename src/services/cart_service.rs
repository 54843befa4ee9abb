//! Local mirror of `users/{uid}/cart`.
//!
//! Every mutation is written to the store first and applied locally only
//! once the store confirms it, so a failed write leaves local state as it
//! was and no rollback is ever needed.

use std::collections::HashSet;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::json;

use crate::{
    error::{AppError, AppResult},
    models::{CartEntry, Order, Product},
    store::{DocumentStore, FromSnapshot, Patch, StoreError, paths},
};

pub struct CartManager {
    store: Arc<dyn DocumentStore>,
    uid: String,
    entries: Vec<CartEntry>,
    completed: Vec<Order>,
}

impl CartManager {
    pub fn new(store: Arc<dyn DocumentStore>, uid: impl Into<String>) -> Self {
        Self {
            store,
            uid: uid.into(),
            entries: Vec::new(),
            completed: Vec::new(),
        }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    pub fn entry(&self, key: &str) -> Option<&CartEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// Orders completed from this cart during the session.
    pub fn completed_orders(&self) -> &[Order] {
        &self.completed
    }

    /// Replace local state with the remote cart.
    pub async fn load(&mut self) -> AppResult<&[CartEntry]> {
        let entries = self.fetch().await.map_err(AppError::CartSync)?;
        self.entries = entries;
        Ok(&self.entries)
    }

    /// Replace local state with a snapshot delivered by a subscription.
    pub fn replace_entries(&mut self, entries: Vec<CartEntry>) {
        self.entries = entries;
    }

    async fn fetch(&self) -> Result<Vec<CartEntry>, StoreError> {
        let path = paths::cart(&self.uid);
        let snapshot = self.store.read(&path).await?;
        Vec::<CartEntry>::from_snapshot(&path, snapshot)
    }

    pub async fn add_or_increment(&mut self, product: &Product, quantity: i64) -> AppResult<CartEntry> {
        let quantity = validate_quantity(quantity)?;

        // the remote cart is authoritative for "does this product already have an entry"
        self.entries = self.fetch().await.map_err(AppError::CartSync)?;

        if let Some(existing) = self.entries.iter().find(|e| e.product_id == product.id) {
            let key = existing.key.clone();
            let new_quantity = existing
                .quantity
                .checked_add(quantity)
                .ok_or_else(quantity_too_large)?;
            ensure_line_fits(existing.price, new_quantity)?;
            self.write_quantity(&key, new_quantity).await?;
            tracing::debug!(uid = %self.uid, key = %key, quantity = new_quantity, "cart entry incremented");
            return self
                .entry(&key)
                .cloned()
                .ok_or(AppError::NotFound);
        }

        ensure_line_fits(product.price, quantity)?;
        let mut entry = CartEntry::from_product(product, quantity);
        entry.key = self.store.push_key();
        let path = paths::cart_entry(&self.uid, &entry.key);
        crate::store::put(self.store.as_ref(), &path, &entry)
            .await
            .map_err(AppError::CartSync)?;

        tracing::debug!(uid = %self.uid, key = %entry.key, product_id = %product.id, "cart entry created");
        self.entries.push(entry.clone());
        Ok(entry)
    }

    pub async fn set_quantity(&mut self, key: &str, quantity: i64) -> AppResult<CartEntry> {
        let quantity = validate_quantity(quantity)?;
        let price = self.entry(key).ok_or(AppError::NotFound)?.price;
        ensure_line_fits(price, quantity)?;
        self.write_quantity(key, quantity).await?;
        self.entry(key).cloned().ok_or(AppError::NotFound)
    }

    pub async fn increment(&mut self, key: &str) -> AppResult<CartEntry> {
        let current = self.entry(key).ok_or(AppError::NotFound)?.quantity;
        self.set_quantity(key, i64::from(current) + 1).await
    }

    /// Decrementing at quantity 1 leaves the entry untouched.
    pub async fn decrement(&mut self, key: &str) -> AppResult<CartEntry> {
        let entry = self.entry(key).ok_or(AppError::NotFound)?;
        if entry.quantity <= 1 {
            return Ok(entry.clone());
        }
        let next = i64::from(entry.quantity) - 1;
        self.set_quantity(key, next).await
    }

    async fn write_quantity(&mut self, key: &str, quantity: u32) -> AppResult<()> {
        let path = format!("{}/quantity", paths::cart_entry(&self.uid, key));
        self.store
            .update(Patch::new().set(path, json!(quantity)))
            .await
            .map_err(|err| {
                tracing::warn!(uid = %self.uid, key = %key, error = %err, "cart quantity write failed");
                AppError::CartSync(err)
            })?;
        if let Some(entry) = self.entries.iter_mut().find(|e| e.key == key) {
            entry.quantity = quantity;
        }
        Ok(())
    }

    /// Removing a key that is not in the cart succeeds and changes nothing.
    pub async fn remove(&mut self, key: &str) -> AppResult<()> {
        self.store
            .remove(&paths::cart_entry(&self.uid, key))
            .await
            .map_err(AppError::CartSync)?;
        self.entries.retain(|e| e.key != key);
        Ok(())
    }

    /// Sum of price × quantity over the entries whose key is in `keys`.
    pub fn total_for<S: AsRef<str>>(&self, keys: &[S]) -> AppResult<Decimal> {
        let wanted: HashSet<&str> = keys.iter().map(AsRef::as_ref).collect();
        self.entries
            .iter()
            .filter(|e| wanted.contains(e.key.as_str()))
            .try_fold(Decimal::ZERO, |total, entry| {
                entry.line_total().and_then(|line| total.checked_add(line))
            })
            .ok_or_else(|| AppError::BadRequest("cart total is too large".into()))
    }

    /// Selected entries in selection order; unknown keys are skipped.
    pub fn selected<S: AsRef<str>>(&self, keys: &[S]) -> Vec<CartEntry> {
        let mut seen = HashSet::new();
        keys.iter()
            .map(AsRef::as_ref)
            .filter(|k| seen.insert(*k))
            .filter_map(|k| self.entry(k).cloned())
            .collect()
    }

    /// Drop purchased entries after the store has deleted them.
    pub(crate) fn settle_checkout(&mut self, purchased: &[String], order: Order) {
        self.entries.retain(|e| !purchased.contains(&e.key));
        self.completed.push(order);
    }
}

fn validate_quantity(quantity: i64) -> AppResult<u32> {
    if quantity < 1 {
        return Err(AppError::BadRequest("quantity must be at least 1".into()));
    }
    u32::try_from(quantity).map_err(|_| quantity_too_large())
}

fn quantity_too_large() -> AppError {
    AppError::BadRequest("quantity is too large".into())
}

fn ensure_line_fits(price: Decimal, quantity: u32) -> AppResult<()> {
    price
        .checked_mul(Decimal::from(quantity))
        .map(|_| ())
        .ok_or_else(|| AppError::BadRequest("price times quantity is too large".into()))
}
