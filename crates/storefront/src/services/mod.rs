//! Clients for the external collaborators: the menu sheet, the conversion
//! rate API and the receipt image host.
//!
//! Transport-level failures never escape these modules raw: every client
//! translates them into a [`ServiceError`] at its boundary.

pub mod menu;
pub mod rates;
pub mod receipts;

use thiserror::Error;

/// Errors from any external collaborator.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// HTTP request failed (network error, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The collaborator returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The response body could not be interpreted.
    #[error("Parse error: {0}")]
    Parse(String),
}

pub use menu::MenuClient;
pub use rates::RateClient;
pub use receipts::ReceiptClient;
