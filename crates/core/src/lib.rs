//! Burger Smoke Core - Domain library for the storefront.
//!
//! This crate holds the order-in-progress logic that does not depend on any
//! I/O: the menu item schema, the cart store, the dish customization flow,
//! the conversion-rate overlay and the WhatsApp order composer.
//!
//! # Architecture
//!
//! The core crate contains only types and logic - no HTTP clients, no
//! sessions, no templates. The storefront binary owns all I/O and drives
//! these types from its route handlers.
//!
//! # Modules
//!
//! - [`menu`] - Menu item schema and sheet-row normalization
//! - [`cart`] - The cart store: line items, quantity math, derived total
//! - [`customize`] - Per-dish customization draft (quantity, exclusions, notes)
//! - [`rate`] - Daily USD/Bs conversion rate overlay
//! - [`order`] - Order report composition and WhatsApp hand-off

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod customize;
pub mod menu;
pub mod order;
pub mod rate;

pub use cart::{Cart, CartLine, LineId};
pub use customize::Customization;
pub use menu::{MenuItem, MenuRow};
pub use order::{CustomerInfo, Handoff, OrderError, Submission};
pub use rate::ConversionRate;
