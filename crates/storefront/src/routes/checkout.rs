//! Checkout and order submission.
//!
//! The submission drives the state machine strictly sequentially within one
//! request: validate, upload the receipt, compose the report, then move to
//! the hand-off page. The hand-off page is the `Opening` step: it tries to
//! open WhatsApp and always offers the manual copyable link. The cart is
//! cleared only on explicit confirmation, never on the fallback path, so an
//! order the user may not actually have sent is never discarded.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, State},
    response::{IntoResponse, Redirect, Response},
};
use burger_smoke_core::order::{self, CustomerInfo, Handoff, Submission};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::models::session_keys;
use crate::services::receipts::ReceiptUpload;
use crate::state::AppState;

use super::cart::{CartView, current_rate, load_cart, save_cart};

// =============================================================================
// Templates
// =============================================================================

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub cart: CartView,
    pub error: Option<String>,
}

/// Hand-off page template: the WhatsApp link plus the manual fallback.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/handoff.html")]
pub struct HandoffTemplate {
    pub whatsapp_url: String,
}

/// Order success page template.
#[derive(Template, WebTemplate)]
#[template(path = "order/success.html")]
pub struct SuccessTemplate;

// =============================================================================
// Handlers
// =============================================================================

/// Display the checkout page: order summary, payment methods, customer form.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Response> {
    let cart = load_cart(&session).await?;
    if cart.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    let rate = current_rate(&state).await;
    Ok(CheckoutTemplate {
        cart: CartView::build(&cart, rate.as_ref()),
        error: None,
    }
    .into_response())
}

/// Submit the order.
///
/// Any validation or composition failure re-renders the checkout page with
/// the error and leaves the cart intact; a successful composition stores the
/// hand-off in the session and redirects to the hand-off page.
///
/// A session-scoped in-flight marker backs the state machine's re-entrancy
/// guard across requests: a double-submit that arrives while the first is
/// still uploading is rejected without uploading a second receipt.
#[instrument(skip(state, session, multipart))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> Result<Response> {
    if submission_in_flight(&session).await? {
        return render_rejected(
            &state,
            &session,
            "Ya hay un envío en curso. Espera a que termine.".to_string(),
        )
        .await;
    }
    mark_submission_in_flight(&session).await?;

    let outcome = run_submit(&state, &session, multipart).await;
    finish_submission(&session).await?;
    outcome
}

async fn run_submit(
    state: &AppState,
    session: &Session,
    multipart: Multipart,
) -> Result<Response> {
    let mut submission = Submission::new();
    submission.begin().map_err(internal)?;

    let cart = load_cart(session).await?;
    if cart.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    let (customer, receipt) = read_form(multipart).await?;

    if let Err(e) = customer.validate() {
        submission.reject().map_err(internal)?;
        return render_rejected(state, session, e.to_string()).await;
    }
    let Some(receipt) = receipt else {
        submission.reject().map_err(internal)?;
        return render_rejected(
            state,
            session,
            "Por favor sube una captura de pantalla de tu pago.".to_string(),
        )
        .await;
    };

    submission.upload_receipt().map_err(internal)?;
    let receipt_url = match state.receipts().upload(receipt).await {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!("Receipt upload failed: {e}");
            submission.reject().map_err(internal)?;
            return render_rejected(
                state,
                session,
                "No se pudo subir el comprobante. Verifica tu conexión e intenta de nuevo."
                    .to_string(),
            )
            .await;
        }
    };

    submission.composing().map_err(internal)?;
    let rate = current_rate(state).await;
    let handoff = match order::compose(
        &cart,
        &customer,
        rate.as_ref(),
        Some(&receipt_url),
        &state.config().whatsapp_number,
    ) {
        Ok(handoff) => handoff,
        Err(e) => {
            submission.reject().map_err(internal)?;
            return render_rejected(state, session, e.to_string()).await;
        }
    };

    submission.opening().map_err(internal)?;
    session.insert(session_keys::HANDOFF, &handoff).await?;

    Ok(Redirect::to("/checkout/handoff").into_response())
}

/// The hand-off page.
///
/// Terminal step of the submission: a script attempts to open the link and
/// confirms on success; the copyable link and the manual confirmation button
/// cover the blocked-popup path. The cart survives until confirmation.
#[instrument(skip(session))]
pub async fn handoff(session: Session) -> Result<Response> {
    let Some(handoff) = session.get::<Handoff>(session_keys::HANDOFF).await? else {
        return Ok(Redirect::to("/checkout").into_response());
    };

    Ok(HandoffTemplate {
        whatsapp_url: handoff.url,
    }
    .into_response())
}

/// Confirm the hand-off: the success signal.
///
/// Clears the cart exactly once; a repeated confirmation finds no pending
/// hand-off and just redirects to the cart.
#[instrument(skip(session))]
pub async fn confirm(session: Session) -> Result<Response> {
    let pending: Option<Handoff> = session.remove(session_keys::HANDOFF).await?;
    if pending.is_none() {
        return Ok(Redirect::to("/cart").into_response());
    }

    let mut cart = load_cart(&session).await?;
    cart.clear();
    save_cart(&session, &cart).await?;

    Ok(Redirect::to("/order-success").into_response())
}

/// Display the order success page.
#[instrument]
pub async fn success() -> SuccessTemplate {
    SuccessTemplate
}

// =============================================================================
// Helpers
// =============================================================================

fn internal(e: impl std::fmt::Display) -> AppError {
    AppError::Internal(e.to_string())
}

/// Whether this session already has a submission in flight.
async fn submission_in_flight(session: &Session) -> Result<bool> {
    Ok(session
        .get::<bool>(session_keys::SUBMITTING)
        .await?
        .unwrap_or(false))
}

/// Mark a submission as in flight for this session.
async fn mark_submission_in_flight(session: &Session) -> Result<()> {
    session.insert(session_keys::SUBMITTING, &true).await?;
    Ok(())
}

/// Remove the in-flight marker. Runs on every submission outcome, rejected
/// paths included, so the session never stays locked.
async fn finish_submission(session: &Session) -> Result<()> {
    session.remove::<bool>(session_keys::SUBMITTING).await?;
    Ok(())
}

/// Re-render the checkout page with a rejection message. The cart is
/// untouched on every rejected path.
async fn render_rejected(state: &AppState, session: &Session, error: String) -> Result<Response> {
    let cart = load_cart(session).await?;
    let rate = current_rate(state).await;
    Ok(CheckoutTemplate {
        cart: CartView::build(&cart, rate.as_ref()),
        error: Some(error),
    }
    .into_response())
}

/// Read the multipart checkout form into customer info and the optional
/// receipt image.
async fn read_form(mut multipart: Multipart) -> Result<(CustomerInfo, Option<ReceiptUpload>)> {
    let mut customer = CustomerInfo::default();
    let mut receipt = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "name" => customer.name = read_text(field).await?,
            "phone" => customer.phone = read_text(field).await?,
            "address" => customer.address = read_text(field).await?,
            "notes" => customer.notes = read_text(field).await?,
            "receipt" => {
                let file_name = field.file_name().unwrap_or("comprobante").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                if !bytes.is_empty() {
                    receipt = Some(ReceiptUpload {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }

    Ok((customer, receipt))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use burger_smoke_core::Cart;
    use burger_smoke_core::cart::CartLine;
    use burger_smoke_core::menu::MenuItem;
    use tower_sessions::MemoryStore;

    use super::*;

    fn test_session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn cart_with_one_line() -> Cart {
        let item = MenuItem {
            id: "b1".to_string(),
            name: "Smoke Classic".to_string(),
            description: String::new(),
            category: "Burgers".to_string(),
            price: "8.00".parse().unwrap(),
            image: String::new(),
            ingredients: Vec::new(),
        };
        let mut cart = Cart::new();
        cart.add(CartLine::new(item, 1, Vec::new(), String::new()));
        cart
    }

    fn location(response: &axum::response::Response) -> &str {
        response
            .headers()
            .get("location")
            .unwrap()
            .to_str()
            .unwrap()
    }

    #[tokio::test]
    async fn test_in_flight_marker_blocks_a_second_submission() {
        // Two handlers sharing one session: the second observes the marker
        // the first set before its upload started.
        let session = test_session();
        assert!(!submission_in_flight(&session).await.unwrap());

        mark_submission_in_flight(&session).await.unwrap();
        assert!(submission_in_flight(&session).await.unwrap());

        finish_submission(&session).await.unwrap();
        assert!(!submission_in_flight(&session).await.unwrap());
    }

    #[tokio::test]
    async fn test_finish_without_mark_is_harmless() {
        let session = test_session();
        finish_submission(&session).await.unwrap();
        assert!(!submission_in_flight(&session).await.unwrap());
    }

    #[tokio::test]
    async fn test_first_confirm_clears_cart_and_redirects_to_success() {
        let session = test_session();
        save_cart(&session, &cart_with_one_line()).await.unwrap();
        session
            .insert(
                session_keys::HANDOFF,
                &Handoff {
                    message: "*NUEVO PEDIDO*".to_string(),
                    url: "https://wa.me/584146373862?text=x".to_string(),
                },
            )
            .await
            .unwrap();

        let response = confirm(session.clone()).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/order-success");
        assert!(load_cart(&session).await.unwrap().is_empty());
        assert!(
            session
                .get::<Handoff>(session_keys::HANDOFF)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_repeated_confirm_is_a_noop_redirect() {
        let session = test_session();
        save_cart(&session, &cart_with_one_line()).await.unwrap();
        session
            .insert(
                session_keys::HANDOFF,
                &Handoff {
                    message: "*NUEVO PEDIDO*".to_string(),
                    url: "https://wa.me/584146373862?text=x".to_string(),
                },
            )
            .await
            .unwrap();

        confirm(session.clone()).await.unwrap();

        // No pending hand-off remains: the second confirm clears nothing
        // and just sends the visitor back to the cart.
        let response = confirm(session.clone()).await.unwrap();
        assert_eq!(location(&response), "/cart");
        assert!(load_cart(&session).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_confirm_without_handoff_leaves_cart_intact() {
        let session = test_session();
        save_cart(&session, &cart_with_one_line()).await.unwrap();

        let response = confirm(session.clone()).await.unwrap();
        assert_eq!(location(&response), "/cart");
        assert_eq!(load_cart(&session).await.unwrap().items().len(), 1);
    }
}
