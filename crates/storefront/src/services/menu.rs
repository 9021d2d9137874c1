//! Menu catalog loader.
//!
//! Fetches the menu spreadsheet's CSV export and normalizes each row into a
//! [`MenuItem`]. Parsed catalogs are cached with `moka` (5-minute TTL) so a
//! page view does not hit the sheet on every request.

use std::time::Duration;

use burger_smoke_core::menu::{MenuItem, MenuRow};
use moka::future::Cache;
use tracing::instrument;

use super::ServiceError;

const CACHE_KEY: &str = "menu";
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Client for the spreadsheet-backed menu catalog.
#[derive(Clone)]
pub struct MenuClient {
    client: reqwest::Client,
    csv_url: String,
    cache: Cache<&'static str, Vec<MenuItem>>,
}

impl MenuClient {
    /// Create a new menu client for the given CSV export URL.
    #[must_use]
    pub fn new(csv_url: &str) -> Self {
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(CACHE_TTL)
            .build();

        Self {
            client: reqwest::Client::new(),
            csv_url: csv_url.to_string(),
            cache,
        }
    }

    /// The current catalog, from cache or freshly fetched.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError` when the sheet cannot be fetched or parsed;
    /// the menu page renders its explicit empty state in that case.
    #[instrument(skip(self))]
    pub async fn catalog(&self) -> Result<Vec<MenuItem>, ServiceError> {
        if let Some(items) = self.cache.get(CACHE_KEY).await {
            return Ok(items);
        }

        let items = self.fetch().await?;
        self.cache.insert(CACHE_KEY, items.clone()).await;
        Ok(items)
    }

    /// Look up one item by its sheet id.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError` when the catalog cannot be loaded.
    pub async fn find(&self, item_id: &str) -> Result<Option<MenuItem>, ServiceError> {
        let items = self.catalog().await?;
        Ok(items.into_iter().find(|i| i.id == item_id))
    }

    async fn fetch(&self) -> Result<Vec<MenuItem>, ServiceError> {
        let response = self.client.get(&self.csv_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ServiceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let csv_text = response.text().await?;
        let items = parse_catalog(&csv_text)?;
        tracing::debug!(count = items.len(), "menu catalog fetched");
        Ok(items)
    }
}

/// Parse the CSV export into menu items.
///
/// The first row is the header. Known columns map to their fields; each
/// leftover non-empty cell becomes an extra ingredient, in column order.
/// Rows with neither an id nor a name are skipped.
///
/// # Errors
///
/// Returns `ServiceError::Parse` on malformed CSV.
pub fn parse_catalog(csv_text: &str) -> Result<Vec<MenuItem>, ServiceError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(csv_text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| ServiceError::Parse(e.to_string()))?
        .clone();

    let mut items = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ServiceError::Parse(e.to_string()))?;

        let mut row = MenuRow::default();
        for (header, cell) in headers.iter().zip(record.iter()) {
            match header {
                "id" => row.id = cell.to_string(),
                "name" => row.name = cell.to_string(),
                "description" => row.description = cell.to_string(),
                "category" => row.category = cell.to_string(),
                "price" => row.price = cell.to_string(),
                "image" => row.image = cell.to_string(),
                "ingredients" => row.ingredients = cell.to_string(),
                _ => {
                    if !cell.trim().is_empty() {
                        row.extras.push(cell.to_string());
                    }
                }
            }
        }

        if row.id.is_empty() && row.name.is_empty() {
            continue;
        }
        items.push(row.into_item());
    }

    Ok(items)
}
