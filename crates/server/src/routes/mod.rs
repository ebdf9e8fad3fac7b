//! HTTP route handlers for the shop API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                  - Health check
//!
//! # Products
//! GET    /api/products          - Product listing
//! POST   /api/products          - Create product
//! GET    /api/products/:id      - Product detail
//! PUT    /api/products/:id      - Replace product
//! PATCH  /api/products/:id      - Partial update
//! DELETE /api/products/:id      - Remove product
//!
//! # Orders
//! POST /api/orders/checkout     - Run the checkout pipeline
//!
//! # Static
//! GET /invoices/<file>          - Rendered invoice PDFs (ServeDir)
//! ```

pub mod orders;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::replace)
                .patch(products::patch)
                .delete(products::remove),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new().route("/checkout", post(orders::checkout))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/products", product_routes())
        .nest("/api/orders", order_routes())
}
