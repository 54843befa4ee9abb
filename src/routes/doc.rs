use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    auth::Identity,
    dto::{
        addresses::AddressInput,
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        cart::{AddToCartRequest, CartView, SelectionRequest, TotalResponse, UpdateQuantityRequest},
        orders::{ReviewOrderRequest, SelectPaymentRequest, StartCheckoutRequest},
        products::{CreateProductRequest, UpdateProductRequest},
        profile::{ChangePasswordRequest, UpdateProfileRequest},
    },
    models::{
        Address, CartEntry, Category, CustomerSummary, Order, OrderItem, OrderStatus, PaymentMethod,
        Product, Profile, Role,
    },
    response::{ApiResponse, Meta},
    routes::{
        addresses, admin, auth, blobs, cart, checkout, health, orders, params, products, profile,
    },
    services::checkout_service::{BlockReason, CheckoutDraft, CheckoutReceipt, CheckoutState, Navigation},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::logout,
        products::list_products,
        products::get_product,
        cart::cart_list,
        cart::add_to_cart,
        cart::cart_total,
        cart::update_quantity,
        cart::increment,
        cart::decrement,
        cart::remove_from_cart,
        checkout::start_checkout,
        checkout::current_checkout,
        checkout::cancel_checkout,
        checkout::select_payment,
        checkout::submit_checkout,
        orders::list_orders,
        orders::get_order,
        addresses::list_addresses,
        addresses::add_address,
        addresses::update_address,
        addresses::delete_address,
        addresses::set_default,
        addresses::clear_default,
        profile::get_profile,
        profile::update_profile,
        profile::upload_image,
        profile::change_password,
        admin::create_product,
        admin::update_product,
        admin::delete_product,
        admin::set_product_image,
        admin::list_customers,
        admin::list_customer_orders,
        admin::get_customer_order,
        admin::review_order,
        blobs::get_blob
    ),
    components(
        schemas(
            Identity,
            Product,
            Category,
            CartEntry,
            Address,
            Profile,
            PaymentMethod,
            OrderStatus,
            Order,
            OrderItem,
            Role,
            CustomerSummary,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            AddToCartRequest,
            UpdateQuantityRequest,
            SelectionRequest,
            CartView,
            TotalResponse,
            StartCheckoutRequest,
            SelectPaymentRequest,
            ReviewOrderRequest,
            CreateProductRequest,
            UpdateProductRequest,
            AddressInput,
            UpdateProfileRequest,
            ChangePasswordRequest,
            CheckoutDraft,
            CheckoutReceipt,
            CheckoutState,
            BlockReason,
            Navigation,
            params::Pagination,
            params::SortOrder,
            params::ProductSortBy,
            Meta,
            ApiResponse<Product>,
            ApiResponse<Order>,
            ApiResponse<CartView>,
            ApiResponse<CheckoutDraft>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication and sessions"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Checkout", description = "Checkout flow"),
        (name = "Orders", description = "Order history"),
        (name = "Addresses", description = "Shipping addresses"),
        (name = "Profile", description = "Profile endpoints"),
        (name = "Admin", description = "Admin endpoints"),
        (name = "Blobs", description = "Uploaded images"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
