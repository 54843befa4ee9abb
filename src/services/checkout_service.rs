//! Checkout state machine: selected cart entries + profile + default
//! address + payment method → a persisted [`Order`].
//!
//! ```text
//! Idle → ValidatingProfile → ValidatingAddress → AwaitingPaymentSelection
//!      → Submitting → Completed
//! any validation or submit failure → Blocked(reason)
//! ```
//!
//! Each flow owns a submission id that is written next to the order in the
//! same request. A retry after an ambiguous failure finds the marker and
//! reuses the existing order instead of creating a second one.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Address, CartEntry, Order, OrderItem, PaymentMethod, Profile},
    services::{address_service, cart_service::CartManager, profile_service},
    store::{self, DocumentStore, Patch, StoreError, paths},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case", tag = "reason")]
pub enum BlockReason {
    NoItemsSelected,
    IncompleteProfile,
    MissingAddress,
    SubmitFailed { detail: String },
    /// The order exists but its cart entries could not be cleared.
    CartClearPending { order_id: String },
}

impl BlockReason {
    pub fn code(&self) -> &'static str {
        match self {
            BlockReason::NoItemsSelected => "no-items-selected",
            BlockReason::IncompleteProfile => "incomplete-profile",
            BlockReason::MissingAddress => "missing-address",
            BlockReason::SubmitFailed { .. } => "submit-failed",
            BlockReason::CartClearPending { .. } => "cart-clear-pending",
        }
    }

    pub fn message(&self) -> String {
        match self {
            BlockReason::NoItemsSelected => "No items selected.".to_string(),
            BlockReason::IncompleteProfile => "Please fill in your name and phone number in your profile before proceeding with the purchase.".to_string(),
            BlockReason::MissingAddress => "Please add an address in your address page before proceeding with the purchase.".to_string(),
            BlockReason::SubmitFailed { detail } => format!("Failed to complete purchase: {detail}"),
            BlockReason::CartClearPending { order_id } => format!(
                "Order {order_id} was placed but the cart could not be updated. Retry to finish."
            ),
        }
    }

    /// Where the user should go to fix it; `None` means retry in place.
    pub fn action(&self) -> Option<&'static str> {
        match self {
            BlockReason::NoItemsSelected => Some("cart"),
            BlockReason::IncompleteProfile => Some("profile"),
            BlockReason::MissingAddress => Some("address"),
            BlockReason::SubmitFailed { .. } | BlockReason::CartClearPending { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case", tag = "state")]
pub enum CheckoutState {
    Idle,
    ValidatingProfile,
    ValidatingAddress,
    AwaitingPaymentSelection,
    Submitting,
    Completed { order_id: String },
    Blocked { blocked: BlockReason },
}

/// After a successful checkout the history is reset to the order list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Navigation {
    ResetToOrders,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutDraft {
    pub state: CheckoutState,
    pub submission_id: String,
    pub items: Vec<CartEntry>,
    #[schema(value_type = String)]
    pub total: Decimal,
    pub payment_method: PaymentMethod,
    pub profile: Option<Profile>,
    pub address: Option<Address>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    pub order: Order,
    pub navigation: Navigation,
}

pub struct CheckoutFlow {
    uid: String,
    submission_id: String,
    selected: Vec<String>,
    payment_method: PaymentMethod,
    state: CheckoutState,
    profile: Option<Profile>,
    address: Option<Address>,
    placed: Option<Order>,
}

impl CheckoutFlow {
    pub fn new(uid: impl Into<String>, selected: Vec<String>) -> Self {
        Self {
            uid: uid.into(),
            submission_id: Uuid::new_v4().simple().to_string(),
            selected,
            payment_method: PaymentMethod::default(),
            state: CheckoutState::Idle,
            profile: None,
            address: None,
            placed: None,
        }
    }

    pub fn state(&self) -> &CheckoutState {
        &self.state
    }

    pub fn submission_id(&self) -> &str {
        &self.submission_id
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn selected_keys(&self) -> &[String] {
        &self.selected
    }

    fn block(&mut self, reason: BlockReason) -> AppError {
        tracing::info!(uid = %self.uid, reason = reason.code(), "checkout blocked");
        self.state = CheckoutState::Blocked {
            blocked: reason.clone(),
        };
        AppError::Blocked(reason)
    }

    /// Run the profile and address checks, landing in
    /// `AwaitingPaymentSelection` or `Blocked`. Safe to call again after
    /// the user fixed whatever blocked it. A store failure while reading
    /// ends in `Blocked(SubmitFailed)`, never in an intermediate state.
    pub async fn validate(&mut self, store: &dyn DocumentStore, cart: &CartManager) -> AppResult<()> {
        match self.run_checks(store, cart).await {
            Err(err @ AppError::Blocked(_)) => Err(err),
            Err(err) => {
                tracing::warn!(uid = %self.uid, error = %err, "checkout validation failed");
                Err(self.block(BlockReason::SubmitFailed { detail: err.to_string() }))
            }
            Ok(()) => Ok(()),
        }
    }

    async fn run_checks(&mut self, store: &dyn DocumentStore, cart: &CartManager) -> AppResult<()> {
        if cart.selected(&self.selected).is_empty() {
            return Err(self.block(BlockReason::NoItemsSelected));
        }

        self.state = CheckoutState::ValidatingProfile;
        let profile = profile_service::load_profile(store, &self.uid).await?;
        if !profile.is_complete() {
            self.profile = Some(profile);
            return Err(self.block(BlockReason::IncompleteProfile));
        }
        self.profile = Some(profile);

        self.state = CheckoutState::ValidatingAddress;
        // always re-read: the default may have changed in another screen
        match address_service::default_address(store, &self.uid).await? {
            Some(address) => self.address = Some(address),
            None => {
                self.address = None;
                return Err(self.block(BlockReason::MissingAddress));
            }
        }

        self.state = CheckoutState::AwaitingPaymentSelection;
        Ok(())
    }

    pub fn select_payment(&mut self, method: PaymentMethod) -> AppResult<()> {
        if self.state != CheckoutState::AwaitingPaymentSelection {
            return Err(AppError::BadRequest(
                "payment can only be chosen once checkout is validated".into(),
            ));
        }
        self.payment_method = method;
        Ok(())
    }

    pub fn draft(&self, cart: &CartManager) -> AppResult<CheckoutDraft> {
        Ok(CheckoutDraft {
            state: self.state.clone(),
            submission_id: self.submission_id.clone(),
            items: cart.selected(&self.selected),
            total: cart.total_for(&self.selected)?,
            payment_method: self.payment_method,
            profile: self.profile.clone(),
            address: self.address.clone(),
        })
    }

    pub async fn submit(&mut self, store: &dyn DocumentStore, cart: &mut CartManager) -> AppResult<CheckoutReceipt> {
        match &self.state {
            CheckoutState::AwaitingPaymentSelection => {}
            CheckoutState::Blocked {
                blocked: BlockReason::SubmitFailed { .. },
            } => {}
            CheckoutState::Blocked {
                blocked: BlockReason::CartClearPending { .. },
            } => return self.finish_cart_clear(store, cart).await,
            CheckoutState::Completed { .. } => {
                return Err(AppError::BadRequest("checkout already completed".into()));
            }
            _ => {
                return Err(AppError::BadRequest("checkout is not ready to submit".into()));
            }
        }

        // a lost ack may have placed the order and emptied the cart already,
        // so the marker is consulted before the cart is validated again
        let existing = match self.find_placed(store).await {
            Ok(existing) => existing,
            Err(err) => return Err(self.block(BlockReason::SubmitFailed { detail: err.to_string() })),
        };
        if let Some(order) = existing {
            tracing::info!(uid = %self.uid, order_id = %order.id, "checkout retry found placed order");
            self.placed = Some(order);
            return self.finish_cart_clear(store, cart).await;
        }

        // preconditions are checked again against fresh store state
        let payment_method = self.payment_method;
        self.validate(store, cart).await?;
        self.payment_method = payment_method;

        self.state = CheckoutState::Submitting;

        let order = match self.build_order(store, cart) {
            Ok(order) => order,
            Err(err) => return Err(self.block(BlockReason::SubmitFailed { detail: err.to_string() })),
        };
        let order_path = paths::order(&self.uid, &order.id);
        let marker_path = paths::checkout_marker(&self.uid, &self.submission_id);
        let clear = self.cart_clear_patch(&order);

        if store.atomic_updates() {
            let patch = clear
                .set_json(&order_path, &order)
                .map(|p| p.set(marker_path, json!(order.id)));
            let result = match patch {
                Ok(patch) => store.update(patch).await,
                Err(err) => Err(err),
            };
            if let Err(err) = result {
                tracing::warn!(uid = %self.uid, error = %err, "checkout write failed");
                return Err(self.block(BlockReason::SubmitFailed { detail: err.to_string() }));
            }
            return Ok(self.complete(order, cart));
        }

        let placed = Patch::new()
            .set_json(&order_path, &order)
            .map(|p| p.set(marker_path, json!(order.id)));
        let result = match placed {
            Ok(patch) => store.update(patch).await,
            Err(err) => Err(err),
        };
        if let Err(err) = result {
            tracing::warn!(uid = %self.uid, error = %err, "order write failed");
            return Err(self.block(BlockReason::SubmitFailed { detail: err.to_string() }));
        }
        self.placed = Some(order);
        self.finish_cart_clear(store, cart).await
    }

    async fn find_placed(&self, store: &dyn DocumentStore) -> Result<Option<Order>, StoreError> {
        let marker = paths::checkout_marker(&self.uid, &self.submission_id);
        let Some(order_id) = store::get::<String>(store, &marker).await? else {
            return Ok(None);
        };
        let order_path = paths::order(&self.uid, &order_id);
        Ok(store::get::<Order>(store, &order_path).await?.map(|mut o| {
            o.id = order_id;
            o
        }))
    }

    fn build_order(&self, store: &dyn DocumentStore, cart: &CartManager) -> AppResult<Order> {
        let address = self
            .address
            .clone()
            .ok_or(AppError::Blocked(BlockReason::MissingAddress))?;
        let items: Vec<OrderItem> = cart.selected(&self.selected).iter().map(OrderItem::from).collect();
        let total = cart.total_for(&self.selected)?;

        Ok(Order {
            id: store.push_key(),
            items,
            total,
            payment_method: self.payment_method,
            address,
            status: None,
            submission_id: Some(self.submission_id.clone()),
            created_at: Utc::now(),
        })
    }

    fn cart_clear_patch(&self, order: &Order) -> Patch {
        order.items.iter().fold(Patch::new(), |patch, item| {
            patch.delete(paths::cart_entry(&self.uid, &item.key))
        })
    }

    async fn finish_cart_clear(&mut self, store: &dyn DocumentStore, cart: &mut CartManager) -> AppResult<CheckoutReceipt> {
        let Some(order) = self.placed.clone() else {
            return Err(AppError::BadRequest("no placed order to finish".into()));
        };
        let clear = self.cart_clear_patch(&order);
        if !clear.is_empty() {
            if let Err(err) = store.update(clear).await {
                tracing::warn!(
                    uid = %self.uid,
                    order_id = %order.id,
                    error = %err,
                    "order placed but cart clear failed"
                );
                return Err(self.block(BlockReason::CartClearPending {
                    order_id: order.id.clone(),
                }));
            }
        }
        Ok(self.complete(order, cart))
    }

    fn complete(&mut self, order: Order, cart: &mut CartManager) -> CheckoutReceipt {
        let purchased: Vec<String> = order.items.iter().map(|i| i.key.clone()).collect();
        cart.settle_checkout(&purchased, order.clone());
        self.placed = None;
        self.state = CheckoutState::Completed {
            order_id: order.id.clone(),
        };
        tracing::info!(
            uid = %self.uid,
            order_id = %order.id,
            total = %order.total,
            items = order.items.len(),
            "checkout completed"
        );
        CheckoutReceipt {
            order,
            navigation: Navigation::ResetToOrders,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::models::{Category, Product};
    use crate::store::MemoryStore;

    async fn seeded() -> (Arc<MemoryStore>, CartManager, Vec<String>) {
        let store = Arc::new(MemoryStore::new());
        store
            .write(
                "users/u1/profile",
                json!({ "name": "Sari", "numberPhone": "0812", "email": "s@x.id" }),
            )
            .await
            .unwrap();
        store
            .write(
                "users/u1/addresses/a1",
                json!({ "provinsi": "Jawa Barat", "kodepos": "40111", "isDefault": true }),
            )
            .await
            .unwrap();
        let mut cart = CartManager::new(store.clone(), "u1");
        let mut keys = Vec::new();
        for (id, cents, qty) in [("a", 1000, 2), ("b", 500, 1)] {
            let product = Product {
                id: id.into(),
                name: id.into(),
                price: Decimal::new(cents, 2),
                image: String::new(),
                description: String::new(),
                category: Category::Dress,
            };
            keys.push(cart.add_or_increment(&product, qty).await.unwrap().key);
        }
        (store, cart, keys)
    }

    #[tokio::test]
    async fn payment_can_change_until_submission() {
        let (store, cart, keys) = seeded().await;
        let mut flow = CheckoutFlow::new("u1", keys);
        assert!(flow.select_payment(PaymentMethod::Cod).is_err());

        flow.validate(store.as_ref(), &cart).await.unwrap();
        assert_eq!(flow.payment_method(), PaymentMethod::Transfer);
        flow.select_payment(PaymentMethod::EWallet).unwrap();
        flow.select_payment(PaymentMethod::Cod).unwrap();
        let draft = flow.draft(&cart).unwrap();
        assert_eq!(draft.payment_method, PaymentMethod::Cod);
        assert_eq!(draft.total, Decimal::new(25, 0));
    }

    #[tokio::test]
    async fn incomplete_profile_blocks_and_recovers() {
        let (store, cart, keys) = seeded().await;
        store.write("users/u1/profile/numberPhone", json!("")).await.unwrap();

        let mut flow = CheckoutFlow::new("u1", keys);
        let err = flow.validate(store.as_ref(), &cart).await.unwrap_err();
        assert!(matches!(err, AppError::Blocked(BlockReason::IncompleteProfile)));
        assert_eq!(
            flow.state(),
            &CheckoutState::Blocked {
                blocked: BlockReason::IncompleteProfile
            }
        );

        store.write("users/u1/profile/numberPhone", json!("0812")).await.unwrap();
        flow.validate(store.as_ref(), &cart).await.unwrap();
        assert_eq!(flow.state(), &CheckoutState::AwaitingPaymentSelection);
    }

    #[tokio::test]
    async fn unknown_selection_is_blocked() {
        let (store, cart, _) = seeded().await;
        let mut flow = CheckoutFlow::new("u1", vec!["ghost".into()]);
        let err = flow.validate(store.as_ref(), &cart).await.unwrap_err();
        assert!(matches!(err, AppError::Blocked(BlockReason::NoItemsSelected)));
    }

    #[tokio::test]
    async fn submit_writes_order_and_clears_only_selected_entries() {
        let (store, mut cart, keys) = seeded().await;
        let mut flow = CheckoutFlow::new("u1", vec![keys[0].clone()]);
        flow.validate(store.as_ref(), &cart).await.unwrap();

        let receipt = flow.submit(store.as_ref(), &mut cart).await.unwrap();

        assert_eq!(receipt.order.total, Decimal::new(20, 0));
        assert_eq!(receipt.navigation, Navigation::ResetToOrders);
        assert_eq!(cart.entries().len(), 1);
        assert_eq!(cart.entries()[0].key, keys[1]);
        assert_eq!(cart.completed_orders().len(), 1);

        let marker = store
            .read(&format!("users/u1/checkouts/{}", flow.submission_id()))
            .await
            .unwrap();
        assert_eq!(marker, Some(json!(receipt.order.id)));

        let again = flow.submit(store.as_ref(), &mut cart).await;
        assert!(matches!(again, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn block_reasons_carry_codes_and_actions() {
        assert_eq!(BlockReason::MissingAddress.code(), "missing-address");
        assert_eq!(BlockReason::MissingAddress.action(), Some("address"));
        assert_eq!(BlockReason::IncompleteProfile.action(), Some("profile"));
        let failed = BlockReason::SubmitFailed { detail: "x".into() };
        assert_eq!(failed.code(), "submit-failed");
        assert_eq!(failed.action(), None);
    }
}
