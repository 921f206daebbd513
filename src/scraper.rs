use async_trait::async_trait;
use std::sync::Arc;

use crate::config::ScraperConfig;
use crate::error::Result;
use crate::models::ScrapedSupplier;
use crate::script::ScriptRunner;
use crate::validation::sanitize_query;

#[cfg(test)]
use mockall::automock;

/// Source of supplier listings for a (product, location) pair
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SupplierSource: Send + Sync + 'static {
    async fn fetch(&self, product: &str, location: &str) -> Result<Vec<ScrapedSupplier>>;
}

/// Supplier source backed by the external scraper subprocess
pub struct ScriptScraper {
    runner: Arc<ScriptRunner>,
    script_name: String,
}

impl ScriptScraper {
    pub fn new(runner: Arc<ScriptRunner>, cfg: &ScraperConfig) -> Self {
        Self {
            runner,
            script_name: cfg.script_name.clone(),
        }
    }
}

#[async_trait]
impl SupplierSource for ScriptScraper {
    async fn fetch(&self, product: &str, location: &str) -> Result<Vec<ScrapedSupplier>> {
        let sanitized_product = sanitize_query(product);
        let sanitized_location = sanitize_query(location);

        tracing::info!(
            "Requesting supplier data for '{}' in '{}'",
            sanitized_product,
            sanitized_location
        );

        let value = self
            .runner
            .run(&self.script_name, &[sanitized_product, sanitized_location])
            .await?;

        Ok(suppliers_from_value(value))
    }
}

/// Interpret script output: a JSON array of supplier objects. Anything else
/// (or any element that does not decode) counts as no results, not an error.
pub fn suppliers_from_value(value: serde_json::Value) -> Vec<ScrapedSupplier> {
    let Some(entries) = value.as_array() else {
        tracing::warn!("Scraper returned a non-array payload; treating as no results");
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| match serde_json::from_value(entry.clone()) {
            Ok(supplier) => Some(supplier),
            Err(e) => {
                tracing::warn!("Dropping undecodable supplier entry: {e}");
                None
            }
        })
        .collect()
}
