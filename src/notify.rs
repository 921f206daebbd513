use async_trait::async_trait;
use reqwest::Client;

use crate::config::SourcingConfig;
use crate::error::{Result, SourcingError};
use crate::models::{NotifySuppliersRequest, NotifySuppliersResponse};

#[cfg(test)]
use mockall::automock;

/// Client for the third-party quotation-request service
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NotificationClient: Send + Sync + 'static {
    /// Notify the selected suppliers; returns the tracking identifier
    async fn notify_suppliers(&self, request: &NotifySuppliersRequest) -> Result<String>;
}

pub struct PiceNotificationClient {
    client: Client,
    cfg: SourcingConfig,
}

impl PiceNotificationClient {
    pub fn new(cfg: SourcingConfig) -> Self {
        Self {
            client: Client::new(),
            cfg,
        }
    }

    fn apply_headers(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("Content-Type", "application/json")
            .header("X-Pice-Platform", &self.cfg.platform)
            .header("X-Pice-Api-Version", &self.cfg.api_version)
            .header("X-Pice-Device-Id", &self.cfg.device_id)
            .header("X-Pice-Location", &self.cfg.location)
            .header("X-Pice-App-Version", &self.cfg.app_version)
            .header("X-Pice-Language", &self.cfg.language)
    }
}

#[async_trait]
impl NotificationClient for PiceNotificationClient {
    async fn notify_suppliers(&self, request: &NotifySuppliersRequest) -> Result<String> {
        tracing::info!(
            "Notifying {} supplier(s) about '{}'",
            request.suppliers.len(),
            request.item_name
        );

        let response = self
            .apply_headers(self.client.post(&self.cfg.notify_url))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SourcingError::Api(format!(
                "notify-suppliers returned {status}: {body}"
            )));
        }

        let parsed: NotifySuppliersResponse = response.json().await.map_err(|e| {
            SourcingError::Api(format!("Failed to parse notify-suppliers response: {e}"))
        })?;

        if !parsed.meta.success {
            return Err(SourcingError::Api(
                parsed
                    .meta
                    .message
                    .unwrap_or_else(|| "notify-suppliers reported failure".to_string()),
            ));
        }

        tracing::info!("Notification accepted, requirement {}", parsed.data.requirement_id);
        Ok(parsed.data.requirement_id)
    }
}
