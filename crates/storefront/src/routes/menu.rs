//! Menu catalog page.
//!
//! Renders the sheet-backed catalog grouped by category, with a per-dish
//! customization form (quantity, ingredient exclusions, free-text notes)
//! that posts into the cart. A failed catalog fetch renders an explicit
//! empty state instead of a broken grid.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use burger_smoke_core::menu::MenuItem;
use burger_smoke_core::rate::ConversionRate;
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::state::AppState;

use super::cart::{current_rate, format_bs, format_usd};

/// Dish display data for templates.
#[derive(Clone)]
pub struct DishView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub price_bs: Option<String>,
    pub image: String,
    pub ingredients: Vec<String>,
}

/// One category section of the menu.
#[derive(Clone)]
pub struct CategoryView {
    pub name: String,
    pub dishes: Vec<DishView>,
}

/// Menu page query parameters.
#[derive(Debug, Deserialize)]
pub struct MenuQuery {
    /// Optional category filter.
    pub categoria: Option<String>,
}

/// Menu page template.
#[derive(Template, WebTemplate)]
#[template(path = "menu/index.html")]
pub struct MenuTemplate {
    pub categories: Vec<CategoryView>,
    pub category_names: Vec<String>,
    pub selected: Option<String>,
    /// The catalog could not be loaded; show the explicit empty state.
    pub unavailable: bool,
    pub rate_note: Option<String>,
}

/// Display the menu, optionally filtered to one category.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<MenuQuery>,
) -> Result<impl IntoResponse> {
    let rate = current_rate(&state).await;

    let (items, unavailable) = match state.menu().catalog().await {
        Ok(items) => (items, false),
        Err(e) => {
            tracing::warn!("Menu catalog unavailable: {e}");
            (Vec::new(), true)
        }
    };

    let category_names = category_names(&items);
    let categories = group_by_category(items, query.categoria.as_deref(), rate.as_ref());

    let rate_note = rate
        .as_ref()
        .and_then(ConversionRate::bcv_price)
        .map(|r| format!("Precios calculados al BCV del día: Bs. {r:.2} por USD"));

    Ok(MenuTemplate {
        categories,
        category_names,
        selected: query.categoria,
        unavailable,
        rate_note,
    })
}

/// Distinct category names in first-appearance order.
fn category_names(items: &[MenuItem]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for item in items {
        if !names.contains(&item.category) {
            names.push(item.category.clone());
        }
    }
    names
}

/// Group items into category sections, keeping sheet order within each
/// category and first-appearance order across categories.
fn group_by_category(
    items: Vec<MenuItem>,
    selected: Option<&str>,
    rate: Option<&ConversionRate>,
) -> Vec<CategoryView> {
    let bcv = rate.and_then(ConversionRate::bcv_price);
    let mut categories: Vec<CategoryView> = Vec::new();

    for item in items {
        if let Some(filter) = selected
            && item.category != filter
        {
            continue;
        }

        let dish = DishView {
            id: item.id,
            name: item.name,
            description: item.description,
            price: format_usd(item.price),
            price_bs: bcv.map(|r| format_bs((item.price * r).round_dp(2))),
            image: item.image,
            ingredients: item.ingredients,
        };

        match categories.iter_mut().find(|c| c.name == item.category) {
            Some(category) => category.dishes.push(dish),
            None => categories.push(CategoryView {
                name: item.category.clone(),
                dishes: vec![dish],
            }),
        }
    }

    categories
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(id: &str, category: &str) -> MenuItem {
        MenuItem {
            id: id.to_string(),
            name: format!("Dish {id}"),
            description: String::new(),
            category: category.to_string(),
            price: "8.00".parse().unwrap(),
            image: String::new(),
            ingredients: Vec::new(),
        }
    }

    #[test]
    fn test_groups_preserve_first_appearance_order() {
        let items = vec![
            item("a", "Burgers"),
            item("b", "Bebidas"),
            item("c", "Burgers"),
        ];
        let groups = group_by_category(items, None, None);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "Burgers");
        assert_eq!(groups[0].dishes.len(), 2);
        assert_eq!(groups[1].name, "Bebidas");
    }

    #[test]
    fn test_category_filter_limits_groups() {
        let items = vec![item("a", "Burgers"), item("b", "Bebidas")];
        let groups = group_by_category(items, Some("Bebidas"), None);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "Bebidas");
    }

    #[test]
    fn test_category_names_are_distinct() {
        let items = vec![
            item("a", "Burgers"),
            item("b", "Burgers"),
            item("c", "Bebidas"),
        ];
        assert_eq!(category_names(&items), vec!["Burgers", "Bebidas"]);
    }
}
