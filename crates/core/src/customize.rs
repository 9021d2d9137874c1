//! Per-dish customization draft, filled in before a dish becomes a cart line.
//!
//! The draft is transient: it exists for one dish dialog, and either produces
//! a [`CartLine`] snapshot via [`Customization::confirm`] or is dropped,
//! discarding all local state without touching the cart.

use rust_decimal::Decimal;

use crate::cart::CartLine;
use crate::menu::MenuItem;

/// Draft state for one menu item: quantity, exclusions and free-text notes.
#[derive(Debug, Clone)]
pub struct Customization {
    item: MenuItem,
    quantity: u32,
    excluded: Vec<String>,
    instructions: String,
}

impl Customization {
    /// Open a fresh draft: quantity 1, nothing excluded, no instructions.
    #[must_use]
    pub const fn new(item: MenuItem) -> Self {
        Self {
            item,
            quantity: 1,
            excluded: Vec::new(),
            instructions: String::new(),
        }
    }

    #[must_use]
    pub const fn item(&self) -> &MenuItem {
        &self.item
    }

    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Increment the quantity. No upper bound is enforced.
    pub const fn increment(&mut self) {
        self.quantity += 1;
    }

    /// Decrement the quantity, clamped at 1.
    pub const fn decrement(&mut self) {
        if self.quantity > 1 {
            self.quantity -= 1;
        }
    }

    /// Set the quantity directly, clamped at 1. Used when the quantity
    /// arrives as a single value instead of through stepping.
    pub const fn set_quantity(&mut self, quantity: u32) {
        self.quantity = if quantity < 1 { 1 } else { quantity };
    }

    /// Toggle an ingredient between included and excluded.
    ///
    /// Operates on the ingredient name: two ingredients with identical names
    /// are indistinguishable, a known constraint of the sheet-driven catalog.
    /// Names not on the item's ingredient list are ignored, which keeps the
    /// exclusion set a subset of the original list. Toggling twice restores
    /// the original state.
    pub fn toggle_ingredient(&mut self, name: &str) {
        if !self.item.ingredients.iter().any(|i| i == name) {
            return;
        }
        if let Some(pos) = self.excluded.iter().position(|i| i == name) {
            self.excluded.remove(pos);
        } else {
            self.excluded.push(name.to_string());
        }
    }

    #[must_use]
    pub fn excluded_ingredients(&self) -> &[String] {
        &self.excluded
    }

    pub fn set_instructions(&mut self, text: impl Into<String>) {
        self.instructions = text.into();
    }

    /// Price of the draft as configured: `item price x quantity`.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.item.price * Decimal::from(self.quantity)
    }

    /// Confirm the draft, producing the cart line snapshot.
    ///
    /// Consumes the draft; the caller adds the returned line to the cart and
    /// opens a fresh draft for the next dish.
    #[must_use]
    pub fn confirm(self) -> CartLine {
        CartLine::new(self.item, self.quantity, self.excluded, self.instructions)
    }
}
