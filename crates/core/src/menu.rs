//! Menu item schema and normalization of externally sourced sheet rows.
//!
//! The catalog is published as a spreadsheet exported to CSV. Columns beyond
//! the known set are treated as additional exclusion-eligible ingredients, so
//! the kitchen can extend a dish's customization options without a deploy.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Image shown for rows whose `image` cell is empty.
pub const PLACEHOLDER_IMAGE: &str = "/static/placeholder.svg";

/// Category assigned to rows whose `category` cell is empty.
pub const DEFAULT_CATEGORY: &str = "Other";

/// One dish as displayed in the catalog.
///
/// Read-only within the core: cart lines copy these fields by value at
/// add-time, so later catalog refreshes never affect an order in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    /// Stable identifier, unique among currently loaded items.
    pub id: String,
    pub name: String,
    pub description: String,
    /// Partitions the catalog for filtering.
    pub category: String,
    /// Unit price in USD, non-negative.
    pub price: Decimal,
    pub image: String,
    /// Full customizable ingredient list, in display order.
    /// Duplicate names are kept as-is.
    pub ingredients: Vec<String>,
}

/// One raw row of the menu sheet: the known columns plus, in sheet order,
/// every leftover cell value from columns we do not recognize.
///
/// The leftover cells are modeled explicitly rather than as a dynamic map so
/// that the fold into [`MenuItem::ingredients`] is visible in the type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: String,
    pub image: String,
    pub ingredients: String,
    /// Non-empty cells from unrecognized columns, in column order.
    pub extras: Vec<String>,
}

impl MenuRow {
    /// Normalize this row into a [`MenuItem`].
    ///
    /// The `ingredients` cell and every leftover cell are folded into one
    /// ingredient list; blank cells are dropped rather than kept as empty
    /// strings. An unparseable price becomes zero, an empty category becomes
    /// [`DEFAULT_CATEGORY`] and an empty image the placeholder.
    #[must_use]
    pub fn into_item(self) -> MenuItem {
        let ingredients = std::iter::once(self.ingredients)
            .chain(self.extras)
            .map(|cell| cell.trim().to_string())
            .filter(|cell| !cell.is_empty())
            .collect();

        let price = self
            .price
            .trim()
            .parse::<Decimal>()
            .unwrap_or(Decimal::ZERO);

        MenuItem {
            id: self.id,
            name: self.name,
            description: self.description,
            category: if self.category.trim().is_empty() {
                DEFAULT_CATEGORY.to_string()
            } else {
                self.category
            },
            price,
            image: if self.image.trim().is_empty() {
                PLACEHOLDER_IMAGE.to_string()
            } else {
                self.image
            },
            ingredients,
        }
    }
}
