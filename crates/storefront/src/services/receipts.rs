//! Receipt image upload sink.
//!
//! Payment screenshots go to Cloudinary via an unsigned multipart upload;
//! the order report only ever references the returned secure URL.

use serde::Deserialize;
use tracing::instrument;

use crate::config::CloudinaryConfig;

use super::ServiceError;

/// An uploaded payment screenshot, as received from the checkout form.
#[derive(Debug, Clone)]
pub struct ReceiptUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Upload response; only the secure URL is consumed.
#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

/// Client for the receipt image host.
#[derive(Clone)]
pub struct ReceiptClient {
    client: reqwest::Client,
    upload_url: String,
    upload_preset: String,
}

impl ReceiptClient {
    /// Create a new receipt upload client.
    #[must_use]
    pub fn new(config: &CloudinaryConfig) -> Self {
        let upload_url = format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            config.cloud_name
        );

        Self {
            client: reqwest::Client::new(),
            upload_url,
            upload_preset: config.upload_preset.clone(),
        }
    }

    /// Upload one receipt image, returning its hosted URL.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError` on transport failure, a non-success status or
    /// a response without a secure URL. The caller surfaces this with a
    /// retry invitation; the cart is untouched.
    #[instrument(skip(self, receipt), fields(file_name = %receipt.file_name))]
    pub async fn upload(&self, receipt: ReceiptUpload) -> Result<String, ServiceError> {
        let part = reqwest::multipart::Part::bytes(receipt.bytes)
            .file_name(receipt.file_name)
            .mime_str(&receipt.content_type)
            .map_err(|e| ServiceError::Parse(format!("invalid receipt content type: {e}")))?;

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("upload_preset", self.upload_preset.clone());

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ServiceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let upload: UploadResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Parse(e.to_string()))?;

        Ok(upload.secure_url)
    }
}
