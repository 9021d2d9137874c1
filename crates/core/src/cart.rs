//! The cart store: the session-lifetime holder of the order in progress.
//!
//! Addressing uses a synthetic per-line [`LineId`] generated at add-time.
//! The originating menu item id is deliberately not the addressing key: two
//! lines may share it (same dish added twice with different customizations)
//! and must stay independently mutable.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::menu::MenuItem;

/// Identifier of one cart line, unique within the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(Uuid);

impl LineId {
    /// Generate a fresh line id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a line id from its string form (as round-tripped through forms).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl std::fmt::Display for LineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One customer-configured instance of a menu item within the cart.
///
/// All catalog fields are copied by value at creation, so a menu refresh
/// never changes an order already in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub line_id: LineId,
    pub item_id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: Decimal,
    pub image: String,
    pub ingredients: Vec<String>,
    /// Quantity, always >= 1.
    pub quantity: u32,
    /// Ingredients the customer asked to omit; always a subset of
    /// `ingredients` as captured at add-time.
    pub excluded_ingredients: Vec<String>,
    /// Free-text note for the kitchen, may be empty.
    pub special_instructions: String,
}

impl CartLine {
    /// Snapshot a menu item into a cart line.
    ///
    /// `quantity` is clamped to at least 1 and `excluded` entries that are
    /// not in the item's own ingredient list are discarded, so both line
    /// invariants hold by construction.
    #[must_use]
    pub fn new(
        item: MenuItem,
        quantity: u32,
        excluded: Vec<String>,
        special_instructions: String,
    ) -> Self {
        let excluded_ingredients = excluded
            .into_iter()
            .filter(|name| item.ingredients.contains(name))
            .collect();

        Self {
            line_id: LineId::generate(),
            item_id: item.id,
            name: item.name,
            description: item.description,
            category: item.category,
            price: item.price,
            image: item.image,
            ingredients: item.ingredients,
            quantity: quantity.max(1),
            excluded_ingredients,
            special_instructions,
        }
    }

    /// Line subtotal: `price x quantity`.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// The order-in-progress.
///
/// Mutated exclusively through [`add`](Self::add),
/// [`update_quantity`](Self::update_quantity), [`remove`](Self::remove) and
/// [`clear`](Self::clear); read freely by any number of consumers. The
/// derived total is recomputed on every read, never cached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Append a line to the cart.
    ///
    /// Never merges with an existing line, even for an identical item with
    /// identical customization: customization variance must not be collapsed
    /// into quantity changes of an unrelated line.
    pub fn add(&mut self, line: CartLine) {
        self.items.push(line);
    }

    /// Set the quantity of the line with the given id.
    ///
    /// A requested quantity below 1 is rejected as a no-op rather than
    /// removing the line or going negative. Silently does nothing when no
    /// line matches.
    pub fn update_quantity(&mut self, line_id: LineId, quantity: u32) {
        if quantity < 1 {
            return;
        }
        if let Some(line) = self.items.iter_mut().find(|l| l.line_id == line_id) {
            line.quantity = quantity;
        }
    }

    /// Remove the line with the given id. Silently does nothing when no
    /// line matches.
    pub fn remove(&mut self, line_id: LineId) {
        self.items.retain(|l| l.line_id != line_id);
    }

    /// Empty the cart. Invoked after a confirmed order hand-off.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Current line items, in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartLine] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines (for the cart badge).
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|l| l.quantity).sum()
    }

    /// Order total: `sum(price x quantity)` over all current lines.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items.iter().map(CartLine::subtotal).sum()
    }
}
