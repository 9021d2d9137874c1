//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! The cart itself is stored in the session, addressed by synthetic line ids
//! so two differently customized instances of the same dish stay independent.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{RawForm, State},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use burger_smoke_core::{Cart, Customization, LineId, rate::ConversionRate};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::models::session_keys;
use crate::state::AppState;

// =============================================================================
// View Models
// =============================================================================

/// Cart line display data for templates. All money is pre-formatted.
#[derive(Clone)]
pub struct CartItemView {
    pub line_id: String,
    pub name: String,
    pub description: String,
    pub quantity: u32,
    /// Comma-joined excluded ingredients, when any.
    pub excluded: Option<String>,
    pub instructions: Option<String>,
    pub price: String,
    pub line_price: String,
    pub line_price_bs: Option<String>,
    pub image: String,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub subtotal_bs: Option<String>,
    pub item_count: u32,
    /// "Precios calculados al BCV del día" note, when a rate is usable.
    pub rate_note: Option<String>,
}

impl CartView {
    /// Build the view from the cart and an optional conversion rate.
    ///
    /// With no usable rate every secondary-currency field stays `None`; the
    /// templates then render no "Bs." figures at all.
    #[must_use]
    pub fn build(cart: &Cart, rate: Option<&ConversionRate>) -> Self {
        let bcv = rate.and_then(ConversionRate::bcv_price);

        let items = cart
            .items()
            .iter()
            .map(|line| CartItemView {
                line_id: line.line_id.to_string(),
                name: line.name.clone(),
                description: line.description.clone(),
                quantity: line.quantity,
                excluded: if line.excluded_ingredients.is_empty() {
                    None
                } else {
                    Some(line.excluded_ingredients.join(", "))
                },
                instructions: if line.special_instructions.trim().is_empty() {
                    None
                } else {
                    Some(line.special_instructions.clone())
                },
                price: format_usd(line.price),
                line_price: format_usd(line.subtotal()),
                line_price_bs: bcv.map(|r| format_bs((line.subtotal() * r).round_dp(2))),
                image: line.image.clone(),
            })
            .collect();

        let total = cart.total();
        Self {
            items,
            subtotal: format_usd(total),
            subtotal_bs: bcv.map(|r| format_bs((total * r).round_dp(2))),
            item_count: cart.item_count(),
            rate_note: bcv
                .map(|r| format!("Precios calculados al BCV del día: Bs. {r:.2} por USD")),
        }
    }
}

/// Format a USD amount for display.
pub(crate) fn format_usd(amount: Decimal) -> String {
    format!("${amount:.2}")
}

/// Format a Bolívar amount for display.
pub(crate) fn format_bs(amount: Decimal) -> String {
    format!("Bs. {amount:.2}")
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Load the cart from the session, defaulting to an empty one.
pub(crate) async fn load_cart(session: &Session) -> Result<Cart> {
    Ok(session
        .get::<Cart>(session_keys::CART)
        .await?
        .unwrap_or_default())
}

/// Persist the cart to the session. Every mutation saves immediately so the
/// new state is visible to the very next request.
pub(crate) async fn save_cart(session: &Session, cart: &Cart) -> Result<()> {
    session.insert(session_keys::CART, cart).await?;
    Ok(())
}

/// Fetch the conversion rate, degrading to `None` on any failure.
pub(crate) async fn current_rate(state: &AppState) -> Option<ConversionRate> {
    match state.rates().current().await {
        Ok(rate) => Some(rate),
        Err(e) => {
            tracing::warn!("Conversion rate unavailable: {e}");
            None
        }
    }
}

// =============================================================================
// Forms
// =============================================================================

/// Add-to-cart form data, parsed from the raw body because the ingredient
/// exclusion checkboxes repeat the `excluded` key.
#[derive(Debug, Default)]
struct AddToCartForm {
    item_id: String,
    quantity: u32,
    excluded: Vec<String>,
    instructions: String,
}

impl AddToCartForm {
    fn parse(body: &[u8]) -> Self {
        let mut form = Self {
            quantity: 1,
            ..Self::default()
        };
        for (key, value) in url::form_urlencoded::parse(body) {
            match key.as_ref() {
                "item_id" => form.item_id = value.into_owned(),
                "quantity" => form.quantity = value.parse().unwrap_or(1),
                "excluded" => form.excluded.push(value.into_owned()),
                "instructions" => form.instructions = value.into_owned(),
                _ => {}
            }
        }
        form
    }
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub line_id: String,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub line_id: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the cart page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Response> {
    let cart = load_cart(&session).await?;
    let rate = current_rate(&state).await;

    Ok(CartShowTemplate {
        cart: CartView::build(&cart, rate.as_ref()),
    }
    .into_response())
}

/// Add a customized dish to the cart.
///
/// Snapshots the menu item server-side (never trusting prices from the
/// form), runs the customization flow over the submitted quantity,
/// exclusions and instructions, and appends the resulting line. Every add
/// creates a new line, even for an identical configuration.
#[instrument(skip(state, session, body))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    RawForm(body): RawForm,
) -> Result<Response> {
    let form = AddToCartForm::parse(&body);

    let item = state
        .menu()
        .find(&form.item_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("plato {}", form.item_id)))?;

    let mut draft = Customization::new(item);
    draft.set_quantity(form.quantity);
    for ingredient in &form.excluded {
        // Names not on the dish's own ingredient list are ignored.
        draft.toggle_ingredient(ingredient);
    }
    draft.set_instructions(form.instructions);

    let mut cart = load_cart(&session).await?;
    cart.add(draft.confirm());
    save_cart(&session, &cart).await?;

    Ok(Redirect::to("/cart").into_response())
}

/// Update a cart line's quantity (HTMX).
///
/// A requested quantity below 1 is a no-op in the store; the fragment simply
/// re-renders the unchanged cart.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let mut cart = load_cart(&session).await?;
    if let Some(line_id) = LineId::parse(&form.line_id) {
        cart.update_quantity(line_id, form.quantity);
        save_cart(&session, &cart).await?;
    }

    let rate = current_rate(&state).await;
    Ok((
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate {
            cart: CartView::build(&cart, rate.as_ref()),
        },
    )
        .into_response())
}

/// Remove a cart line (HTMX).
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let mut cart = load_cart(&session).await?;
    if let Some(line_id) = LineId::parse(&form.line_id) {
        cart.remove(line_id);
        save_cart(&session, &cart).await?;
    }

    let rate = current_rate(&state).await;
    Ok((
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate {
            cart: CartView::build(&cart, rate.as_ref()),
        },
    )
        .into_response())
}

/// Cart count badge (HTMX).
#[instrument(skip(session))]
pub async fn count(session: Session) -> Result<CartCountTemplate> {
    let cart = load_cart(&session).await?;
    Ok(CartCountTemplate {
        count: cart.item_count(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use burger_smoke_core::cart::CartLine;
    use burger_smoke_core::menu::MenuItem;
    use burger_smoke_core::rate::{BcvMonitor, Monitors};

    fn cart_with_one_line() -> Cart {
        let item = MenuItem {
            id: "b1".to_string(),
            name: "Smoke Classic".to_string(),
            description: "Ahumada".to_string(),
            category: "Burgers".to_string(),
            price: "8.00".parse().unwrap(),
            image: String::new(),
            ingredients: vec!["carne".to_string(), "queso".to_string()],
        };
        let mut cart = Cart::new();
        cart.add(CartLine::new(
            item,
            2,
            vec!["queso".to_string()],
            String::new(),
        ));
        cart
    }

    fn bcv_rate(price: &str) -> ConversionRate {
        ConversionRate {
            datetime: None,
            monitors: Some(Monitors {
                bcv: Some(BcvMonitor {
                    price: Some(price.parse().unwrap()),
                    last_update: None,
                }),
            }),
        }
    }

    #[test]
    fn test_view_formats_money_to_two_decimals() {
        let view = CartView::build(&cart_with_one_line(), None);
        assert_eq!(view.subtotal, "$16.00");
        assert_eq!(view.items[0].line_price, "$16.00");
        assert_eq!(view.items[0].excluded.as_deref(), Some("queso"));
        assert!(view.subtotal_bs.is_none());
        assert!(view.rate_note.is_none());
    }

    #[test]
    fn test_view_includes_secondary_currency_with_rate() {
        let rate = bcv_rate("40.0");
        let view = CartView::build(&cart_with_one_line(), Some(&rate));
        assert_eq!(view.subtotal_bs.as_deref(), Some("Bs. 640.00"));
        assert_eq!(view.items[0].line_price_bs.as_deref(), Some("Bs. 640.00"));
        assert!(view.rate_note.unwrap().contains("40.00"));
    }

    #[test]
    fn test_add_form_parses_repeated_excluded_keys() {
        let body = b"item_id=b1&quantity=2&excluded=queso&excluded=cebolla&instructions=sin%20sal";
        let form = AddToCartForm::parse(body);
        assert_eq!(form.item_id, "b1");
        assert_eq!(form.quantity, 2);
        assert_eq!(form.excluded, vec!["queso", "cebolla"]);
        assert_eq!(form.instructions, "sin sal");
    }

    #[test]
    fn test_add_form_defaults_quantity_to_one() {
        let form = AddToCartForm::parse(b"item_id=b1");
        assert_eq!(form.quantity, 1);
        let form = AddToCartForm::parse(b"item_id=b1&quantity=abc");
        assert_eq!(form.quantity, 1);
    }
}
