//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Redirect to the menu
//! GET  /menu                   - Menu catalog (optional ?categoria= filter)
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add a customized dish (redirects to /cart)
//! POST /cart/update            - Update line quantity (cart_items fragment)
//! POST /cart/remove            - Remove a line (cart_items fragment)
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Checkout
//! GET  /checkout               - Order summary + customer form
//! POST /checkout               - Submit order (validate, upload receipt, compose)
//! GET  /checkout/handoff       - WhatsApp hand-off page (manual fallback included)
//! POST /checkout/confirm       - Confirm hand-off: clears the cart
//! GET  /order-success          - Post-hand-off confirmation page
//! ```

pub mod cart;
pub mod checkout;
pub mod menu;

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};

use crate::state::AppState;

/// Redirect the home page to the menu.
async fn home() -> Redirect {
    Redirect::to("/menu")
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show).post(checkout::submit))
        .route("/handoff", get(checkout::handoff))
        .route("/confirm", post(checkout::confirm))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/menu", get(menu::index))
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .route("/order-success", get(checkout::success))
}
