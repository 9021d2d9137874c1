//! Order composition: turns the cart plus delivery details into the WhatsApp
//! order report and deep link.
//!
//! Composition is deterministic and side-effect free. The storefront drives
//! the surrounding [`Submission`] state machine: validation and composition
//! happen here, the receipt upload and the actual hand-off are I/O owned by
//! the caller.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::{Cart, CartLine};
use crate::rate::ConversionRate;

/// Practical ceiling for the percent-encoded report. WhatsApp URLs break
/// around ~2000 characters; reserve headroom below that.
pub const MAX_ENCODED_LEN: usize = 1800;

/// Minimum digit count for a usable destination phone number.
pub const MIN_DESTINATION_DIGITS: usize = 10;

/// Base URL of the messaging hand-off.
pub const WHATSAPP_BASE: &str = "https://wa.me";

/// Errors raised while validating and composing an order.
///
/// All of these halt the submission before any link is produced and leave
/// the cart untouched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    /// A required customer field is empty.
    #[error("campo requerido vacío: {0}")]
    MissingField(&'static str),

    /// No payment screenshot was provided.
    #[error("falta el comprobante de pago")]
    MissingReceipt,

    /// The percent-encoded report exceeds the messaging channel's ceiling.
    #[error("el pedido es demasiado extenso ({encoded_len} > {MAX_ENCODED_LEN} caracteres codificados)")]
    MessageTooLong { encoded_len: usize },

    /// The configured destination number has fewer than
    /// [`MIN_DESTINATION_DIGITS`] digits. A deployment defect, not user input.
    #[error("el número de WhatsApp configurado no es válido")]
    InvalidDestination,
}

/// Customer contact and delivery details gathered at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerInfo {
    pub name: String,
    pub phone: String,
    pub address: String,
    /// Optional free-text notes for the whole order.
    pub notes: String,
}

impl CustomerInfo {
    /// Require non-empty name, phone and address.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::MissingField`] naming the first empty field.
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.name.trim().is_empty() {
            return Err(OrderError::MissingField("nombre"));
        }
        if self.phone.trim().is_empty() {
            return Err(OrderError::MissingField("teléfono"));
        }
        if self.address.trim().is_empty() {
            return Err(OrderError::MissingField("dirección"));
        }
        Ok(())
    }
}

/// The composed hand-off: the human-readable report and the deep link that
/// carries it to the messaging channel.
///
/// Serializable so the storefront can hold it in the session between the
/// submission request and the hand-off confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handoff {
    pub message: String,
    pub url: String,
}

/// Compose the order report and WhatsApp link.
///
/// Validation order mirrors the submission flow: customer fields, receipt
/// presence, encoded message length, then the configured destination. The
/// secondary-currency figures and the rate reference line are emitted only
/// when a usable BCV rate is available.
///
/// # Errors
///
/// Any [`OrderError`]; in every case no link is produced.
pub fn compose(
    cart: &Cart,
    customer: &CustomerInfo,
    rate: Option<&ConversionRate>,
    receipt_url: Option<&str>,
    destination: &str,
) -> Result<Handoff, OrderError> {
    customer.validate()?;
    let receipt_url = receipt_url
        .filter(|u| !u.trim().is_empty())
        .ok_or(OrderError::MissingReceipt)?;

    let message = render_report(cart, customer, rate, receipt_url);

    let encoded = urlencoding::encode(&message);
    if encoded.len() > MAX_ENCODED_LEN {
        return Err(OrderError::MessageTooLong {
            encoded_len: encoded.len(),
        });
    }

    let digits = destination_digits(destination)?;
    let url = format!("{WHATSAPP_BASE}/{digits}?text={encoded}");

    Ok(Handoff { message, url })
}

/// Extract the digits of the configured destination number.
///
/// # Errors
///
/// Returns [`OrderError::InvalidDestination`] when fewer than
/// [`MIN_DESTINATION_DIGITS`] digits remain after stripping punctuation.
pub fn destination_digits(raw: &str) -> Result<String, OrderError> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() < MIN_DESTINATION_DIGITS {
        return Err(OrderError::InvalidDestination);
    }
    Ok(digits)
}

/// Render one report line for a cart line.
fn render_line(line: &CartLine) -> String {
    let excluded = if line.excluded_ingredients.is_empty() {
        String::new()
    } else {
        format!(" (Sin: {})", line.excluded_ingredients.join(", "))
    };
    let instructions = if line.special_instructions.trim().is_empty() {
        String::new()
    } else {
        format!(" - Instrucciones: {}", line.special_instructions)
    };
    let subtotal = line.subtotal();
    format!(
        "• {}x {}{}{} - ${subtotal:.2}",
        line.quantity, line.name, excluded, instructions
    )
}

/// Render the full order report in the format the restaurant reads on
/// WhatsApp.
fn render_report(
    cart: &Cart,
    customer: &CustomerInfo,
    rate: Option<&ConversionRate>,
    receipt_url: &str,
) -> String {
    let order_details = cart
        .items()
        .iter()
        .map(render_line)
        .collect::<Vec<_>>()
        .join("\n");

    let total = cart.total();
    let bcv = rate.and_then(ConversionRate::bcv_price);
    let total_line = bcv.map_or_else(
        || format!("${total:.2}"),
        |price| {
            let bs = (total * price).round_dp(2);
            format!("${total:.2} / Bs. {bs:.2}")
        },
    );

    let mut report = format!(
        "*NUEVO PEDIDO*\n\n\
         *Cliente:* {}\n\
         *Teléfono:* {}\n\
         *Dirección:* {}\n\n\
         *PEDIDO:*\n{order_details}\n\n\
         *RESUMEN:*\n\
         Subtotal: {total_line}\n\
         *Total: {total_line}*",
        customer.name, customer.phone, customer.address
    );

    if let Some(price) = bcv {
        report.push_str(&format!("\n\n*Tasa BCV:* Bs. {price:.2} por USD"));
    }
    if !customer.notes.trim().is_empty() {
        report.push_str(&format!("\n\n*Notas adicionales:* {}", customer.notes));
    }
    report.push_str(&format!("\n\nComprobante de pago: {receipt_url}"));

    report
}

// =============================================================================
// Submission state machine
// =============================================================================

/// States of one order submission attempt.
///
/// `ManualFallback` is a first-class terminal state, not an error: the
/// environment refused to open the link, the user keeps a copyable link and
/// the cart stays intact until they confirm the hand-off themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Validating,
    UploadingReceipt,
    Composing,
    Opening,
    Success,
    ManualFallback,
    /// Validation short-circuited; nothing external was called.
    RejectedInput,
}

/// Invalid use of the submission state machine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmissionError {
    /// A second submission was started while one is in flight.
    #[error("ya hay un envío en curso")]
    AlreadyInProgress,

    /// A step was driven out of order.
    #[error("transición inválida desde {0:?}")]
    InvalidTransition(SubmissionState),
}

/// One submission attempt, driven strictly sequentially: the receipt upload
/// completes before composition starts, which completes before the link is
/// opened. There is no cancellation; a slow upload simply delays the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submission {
    state: SubmissionState,
}

impl Default for Submission {
    fn default() -> Self {
        Self::new()
    }
}

impl Submission {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: SubmissionState::Idle,
        }
    }

    #[must_use]
    pub const fn state(&self) -> SubmissionState {
        self.state
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self.state,
            SubmissionState::Success | SubmissionState::ManualFallback | SubmissionState::RejectedInput
        )
    }

    /// Start validating. Rejected unless the machine is idle, which guards
    /// against re-entrant submissions racing a duplicate upload or a
    /// duplicate cart clear.
    ///
    /// # Errors
    ///
    /// [`SubmissionError::AlreadyInProgress`] when not idle.
    pub fn begin(&mut self) -> Result<(), SubmissionError> {
        match self.state {
            SubmissionState::Idle => {
                self.state = SubmissionState::Validating;
                Ok(())
            }
            _ => Err(SubmissionError::AlreadyInProgress),
        }
    }

    /// Validation passed; the receipt upload starts.
    ///
    /// # Errors
    ///
    /// [`SubmissionError::InvalidTransition`] when driven out of order.
    pub fn upload_receipt(&mut self) -> Result<(), SubmissionError> {
        self.step(SubmissionState::Validating, SubmissionState::UploadingReceipt)
    }

    /// Upload finished; composition starts.
    ///
    /// # Errors
    ///
    /// [`SubmissionError::InvalidTransition`] when driven out of order.
    pub fn composing(&mut self) -> Result<(), SubmissionError> {
        self.step(SubmissionState::UploadingReceipt, SubmissionState::Composing)
    }

    /// Composition produced a link; the hand-off is being opened.
    ///
    /// # Errors
    ///
    /// [`SubmissionError::InvalidTransition`] when driven out of order.
    pub fn opening(&mut self) -> Result<(), SubmissionError> {
        self.step(SubmissionState::Composing, SubmissionState::Opening)
    }

    /// The link was opened programmatically; the cart may now be cleared.
    ///
    /// # Errors
    ///
    /// [`SubmissionError::InvalidTransition`] when driven out of order.
    pub fn succeed(&mut self) -> Result<(), SubmissionError> {
        self.step(SubmissionState::Opening, SubmissionState::Success)
    }

    /// The environment blocked the hand-off; degrade to the manual link.
    /// The cart must not be cleared on this path.
    ///
    /// # Errors
    ///
    /// [`SubmissionError::InvalidTransition`] when driven out of order.
    pub fn fall_back(&mut self) -> Result<(), SubmissionError> {
        self.step(SubmissionState::Opening, SubmissionState::ManualFallback)
    }

    /// Validation or composition rejected the input. Legal from any
    /// non-terminal in-flight state, since the length and destination checks
    /// run after the upload.
    ///
    /// # Errors
    ///
    /// [`SubmissionError::InvalidTransition`] when already terminal or idle.
    pub fn reject(&mut self) -> Result<(), SubmissionError> {
        match self.state {
            SubmissionState::Validating
            | SubmissionState::UploadingReceipt
            | SubmissionState::Composing => {
                self.state = SubmissionState::RejectedInput;
                Ok(())
            }
            _ => Err(SubmissionError::InvalidTransition(self.state)),
        }
    }

    fn step(
        &mut self,
        from: SubmissionState,
        to: SubmissionState,
    ) -> Result<(), SubmissionError> {
        if self.state == from {
            self.state = to;
            Ok(())
        } else {
            Err(SubmissionError::InvalidTransition(self.state))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::CartLine;
    use crate::menu::MenuItem;
    use crate::rate::{BcvMonitor, Monitors};

    const DESTINATION: &str = "+58 414-637-3862";

    fn dish(name: &str, price: &str, ingredients: &[&str]) -> MenuItem {
        MenuItem {
            id: name.to_lowercase(),
            name: name.to_string(),
            description: String::new(),
            category: "Burgers".to_string(),
            price: price.parse().unwrap(),
            image: String::new(),
            ingredients: ingredients.iter().map(ToString::to_string).collect(),
        }
    }

    fn scenario_a_cart() -> Cart {
        let mut cart = Cart::new();
        cart.add(CartLine::new(
            dish("Smoke Classic", "8.00", &["carne", "queso"]),
            2,
            vec!["queso".to_string()],
            String::new(),
        ));
        cart.add(CartLine::new(
            dish("Papas", "5.50", &[]),
            1,
            Vec::new(),
            "extra crujientes".to_string(),
        ));
        cart
    }

    fn customer() -> CustomerInfo {
        CustomerInfo {
            name: "Ana".to_string(),
            phone: "0414 5551234".to_string(),
            address: "Av. 5 de Julio".to_string(),
            notes: String::new(),
        }
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
    fn test_report_contains_lines_totals_and_receipt() {
        let cart = scenario_a_cart();
        let handoff = compose(
            &cart,
            &customer(),
            Some(&bcv_rate("40.0")),
            Some("https://img.example/recibo.png"),
            DESTINATION,
        )
        .unwrap();

        assert!(handoff.message.starts_with("*NUEVO PEDIDO*"));
        assert!(handoff.message.contains("*Cliente:* Ana"));
        assert!(
            handoff
                .message
                .contains("• 2x Smoke Classic (Sin: queso) - $16.00")
        );
        assert!(
            handoff
                .message
                .contains("• 1x Papas - Instrucciones: extra crujientes - $5.50")
        );
        assert!(handoff.message.contains("Subtotal: $21.50 / Bs. 860.00"));
        assert!(handoff.message.contains("*Total: $21.50 / Bs. 860.00*"));
        assert!(handoff.message.contains("*Tasa BCV:* Bs. 40.00 por USD"));
        assert!(
            handoff
                .message
                .contains("Comprobante de pago: https://img.example/recibo.png")
        );
    }

    #[test]
    fn test_no_rate_means_no_secondary_currency_anywhere() {
        let cart = scenario_a_cart();
        let handoff = compose(&cart, &customer(), None, Some("https://r"), DESTINATION).unwrap();
        assert!(!handoff.message.contains("Bs."));
        assert!(!handoff.message.contains("Tasa BCV"));
        assert!(handoff.message.contains("Subtotal: $21.50"));
    }

    #[test]
    fn test_link_targets_destination_digits_only() {
        let cart = scenario_a_cart();
        let handoff = compose(&cart, &customer(), None, Some("https://r"), DESTINATION).unwrap();
        assert!(handoff.url.starts_with("https://wa.me/584146373862?text="));
        // The report went through percent-encoding.
        assert!(!handoff.url.contains(' '));
    }

    #[test]
    fn test_empty_phone_rejects_before_anything_else() {
        // Scenario C: no upload is attempted; compose never sees a receipt.
        let cart = scenario_a_cart();
        let mut c = customer();
        c.phone = String::new();
        let err = compose(&cart, &c, None, None, DESTINATION).unwrap_err();
        assert_eq!(err, OrderError::MissingField("teléfono"));
    }

    #[test]
    fn test_missing_receipt_halts_composition() {
        let cart = scenario_a_cart();
        let err = compose(&cart, &customer(), None, None, DESTINATION).unwrap_err();
        assert_eq!(err, OrderError::MissingReceipt);
    }

    #[test]
    fn test_oversized_order_yields_message_too_long() {
        // Scenario D: enough long customized lines to push the encoded
        // report past the ceiling.
        let mut cart = Cart::new();
        for i in 0..30 {
            cart.add(CartLine::new(
                dish(
                    &format!("Hamburguesa Ahumada Especial de la Casa {i}"),
                    "9.99",
                    &[],
                ),
                3,
                Vec::new(),
                "sin salsa, pan tostado, cortada a la mitad".to_string(),
            ));
        }
        let err = compose(&cart, &customer(), None, Some("https://r"), DESTINATION).unwrap_err();
        assert!(matches!(
            err,
            OrderError::MessageTooLong { encoded_len } if encoded_len > MAX_ENCODED_LEN
        ));
    }

    #[test]
    fn test_destination_digits_extraction() {
        assert_eq!(
            destination_digits("+58 (414) 637-38.62").unwrap(),
            "584146373862"
        );
        assert_eq!(
            destination_digits("123456789").unwrap_err(),
            OrderError::InvalidDestination
        );
        assert_eq!(
            destination_digits("").unwrap_err(),
            OrderError::InvalidDestination
        );
    }

    #[test]
    fn test_submission_happy_path() {
        let mut s = Submission::new();
        s.begin().unwrap();
        s.upload_receipt().unwrap();
        s.composing().unwrap();
        s.opening().unwrap();
        s.succeed().unwrap();
        assert_eq!(s.state(), SubmissionState::Success);
        assert!(s.is_terminal());
    }

    #[test]
    fn test_submission_fallback_path_is_terminal() {
        let mut s = Submission::new();
        s.begin().unwrap();
        s.upload_receipt().unwrap();
        s.composing().unwrap();
        s.opening().unwrap();
        s.fall_back().unwrap();
        assert_eq!(s.state(), SubmissionState::ManualFallback);
        assert!(s.is_terminal());
    }

    #[test]
    fn test_submission_rejects_reentry() {
        let mut s = Submission::new();
        s.begin().unwrap();
        assert_eq!(s.begin().unwrap_err(), SubmissionError::AlreadyInProgress);
    }

    #[test]
    fn test_validation_can_short_circuit() {
        let mut s = Submission::new();
        s.begin().unwrap();
        s.reject().unwrap();
        assert_eq!(s.state(), SubmissionState::RejectedInput);
        assert!(s.is_terminal());
        // Terminal states cannot be rejected again.
        assert!(s.reject().is_err());
    }

    #[test]
    fn test_out_of_order_steps_are_invalid() {
        let mut s = Submission::new();
        assert!(s.succeed().is_err());
        s.begin().unwrap();
        assert_eq!(
            s.opening().unwrap_err(),
            SubmissionError::InvalidTransition(SubmissionState::Validating)
        );
    }
}
