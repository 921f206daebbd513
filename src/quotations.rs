use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use rand::Rng;
use regex::Regex;
use reqwest::Client;

use crate::config::SourcingConfig;
use crate::error::{Result, SourcingError};
use crate::models::{
    ApiQuotation, FetchQuotationsResponse, Quotation, QuotationItem, Supplier, UserIdentity,
};

#[cfg(test)]
use mockall::automock;

/// Client for the third-party quotation-fetch service
#[cfg_attr(test, automock)]
#[async_trait]
pub trait QuotationClient: Send + Sync + 'static {
    async fn fetch_quotations(&self, requirement_id: &str) -> Result<Vec<ApiQuotation>>;
}

pub struct PiceQuotationClient {
    client: Client,
    cfg: SourcingConfig,
}

impl PiceQuotationClient {
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
impl QuotationClient for PiceQuotationClient {
    async fn fetch_quotations(&self, requirement_id: &str) -> Result<Vec<ApiQuotation>> {
        tracing::info!("Fetching quotations for requirement {}", requirement_id);

        let response = self
            .apply_headers(self.client.post(&self.cfg.quotations_url))
            .json(&serde_json::json!({ "requirement_id": requirement_id }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SourcingError::Api(format!(
                "quotations endpoint returned {status}: {body}"
            )));
        }

        let parsed: FetchQuotationsResponse = response
            .json()
            .await
            .map_err(|e| SourcingError::Api(format!("Failed to parse quotations response: {e}")))?;

        if !parsed.meta.success {
            return Err(SourcingError::Api(
                parsed
                    .meta
                    .message
                    .unwrap_or_else(|| "quotation fetch reported failure".to_string()),
            ));
        }

        Ok(parsed.data)
    }
}

/// Leading numeric prefix of a free-text value ("500 kg" -> 500.0)
fn leading_number(text: &str) -> Option<f64> {
    let re = Regex::new(r"^\s*(\d+(?:\.\d+)?)").expect("number pattern is valid");
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

fn format_inr(amount: f64) -> String {
    format!("\u{20b9}{amount:.2}")
}

/// Map service records into the application Quotation shape: one line item
/// each, with amount recomputed as price x quantity at two decimals.
pub fn map_quotations(api_quotations: &[ApiQuotation]) -> Vec<Quotation> {
    api_quotations
        .iter()
        .map(|quote| {
            let price = leading_number(&quote.supp_item_price).unwrap_or(0.0);
            let quantity = leading_number(&quote.seeker_quantity_required)
                .map(|n| n as u32)
                .filter(|n| *n > 0)
                .unwrap_or(1);
            let amount = price * f64::from(quantity);

            let date = quote
                .quotation_received_at
                .split_whitespace()
                .next()
                .unwrap_or("")
                .to_string();
            let valid_till = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .map(|d| (d + Duration::days(30)).format("%d/%m/%Y").to_string())
                .unwrap_or_else(|_| date.clone());

            Quotation {
                id: quote.quotation_id.clone(),
                supplier_name: quote.supplier_name.clone(),
                supplier_gstin: quote.supplier_gst.clone(),
                supplier_reg_date: quote.supplier_registration_date.clone(),
                supplier_phone: quote.supplier_mobile.clone(),
                supplier_email: quote.supplier_email.clone(),
                supplier_address: quote.supplier_address.clone(),
                seeker_name: quote.seeker_name.clone(),
                seeker_gstin: quote.seeker_gst.clone(),
                seeker_phone: quote.seeker_mobile.clone(),
                seeker_email: quote.seeker_email.clone(),
                seeker_address: quote.seeker_address.clone(),
                items: vec![QuotationItem {
                    description: quote.seeker_item_name.clone(),
                    moq: quote.seeker_quantity_required.clone(),
                    price_per_unit: format!("\u{20b9}{}", quote.supp_item_price),
                    quantity,
                    amount: format_inr(amount),
                }],
                total_amount: format_inr(amount),
                date,
                valid_till,
                synthetic: false,
            }
        })
        .collect()
}

fn email_from_name(name: &str, domain: &str) -> String {
    let local: String = name
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(".");
    format!("{local}@{domain}")
}

/// Synthesize one placeholder quotation per supplier when the quotation
/// service is unavailable. Prices and quantities are random demo values;
/// every record is tagged `synthetic` so callers can never mistake it for
/// real supplier data.
pub fn generate_mock_quotations(suppliers: &[Supplier], user: &UserIdentity) -> Vec<Quotation> {
    let mut rng = rand::thread_rng();
    let now = Utc::now();
    let today = now.date_naive();

    suppliers
        .iter()
        .enumerate()
        .map(|(index, supplier)| {
            let price = f64::from(rng.gen_range(1000..6000));
            let quantity: u32 = rng.gen_range(1..=10);
            let amount = price * f64::from(quantity);

            Quotation {
                id: format!("QT-{}-{}", now.timestamp_millis(), index),
                supplier_name: supplier.name.clone(),
                supplier_gstin: supplier
                    .details
                    .get("GST Number")
                    .cloned()
                    .unwrap_or_else(|| format!("29AAHCN{}165F1Z2", supplier.id)),
                supplier_reg_date: "01/01/2020".to_string(),
                supplier_phone: supplier
                    .details
                    .get("Phone")
                    .cloned()
                    .unwrap_or_else(|| "9876543210".to_string()),
                supplier_email: email_from_name(&supplier.name, "example.com"),
                supplier_address: supplier
                    .details
                    .get("Address")
                    .cloned()
                    .unwrap_or_else(|| "123 Business Street, Industrial Area, India".to_string()),
                seeker_name: user.name.clone(),
                seeker_gstin: "29AADCB2230M1ZX".to_string(),
                seeker_phone: user.mobile.clone(),
                seeker_email: email_from_name(&user.name, "gmail.com"),
                seeker_address: "Customer Address, City, State, India".to_string(),
                items: vec![QuotationItem {
                    description: format!(
                        "{} - Premium Quality",
                        supplier
                            .details
                            .get("Products")
                            .map(String::as_str)
                            .unwrap_or("Product")
                    ),
                    moq: format!("{} units", rng.gen_range(10..60)),
                    price_per_unit: format_inr(price),
                    quantity,
                    amount: format_inr(amount),
                }],
                total_amount: format_inr(amount),
                date: today.format("%d/%m/%Y").to_string(),
                valid_till: (today + Duration::days(30)).format("%d/%m/%Y").to_string(),
                synthetic: true,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn api_quotation() -> ApiQuotation {
        ApiQuotation {
            quotation_id: "Q-1".to_string(),
            supplier_name: "Acme Textiles".to_string(),
            supplier_gst: "07AABCU9603R1ZM".to_string(),
            supplier_address: "Karol Bagh, Delhi".to_string(),
            supplier_email: "sales@acme.example".to_string(),
            supplier_registration_date: "2020-01-01".to_string(),
            supplier_mobile: "9876543210".to_string(),
            supp_item_price: "250".to_string(),
            seeker_name: "Asha".to_string(),
            seeker_gst: "29AADCB2230M1ZX".to_string(),
            seeker_mobile: "9123456789".to_string(),
            seeker_email: "asha@gmail.example".to_string(),
            seeker_address: "Delhi".to_string(),
            seeker_item_name: "cotton".to_string(),
            seeker_quantity_required: "500 kg".to_string(),
            quotation_received_at: "2025-05-10 14:02:11".to_string(),
        }
    }

    #[test]
    fn test_map_recomputes_amount_to_two_decimals() {
        let mapped = map_quotations(&[api_quotation()]);
        assert_eq!(mapped.len(), 1);
        let quotation = &mapped[0];
        assert_eq!(quotation.items[0].quantity, 500);
        assert_eq!(quotation.items[0].amount, "\u{20b9}125000.00");
        assert_eq!(quotation.total_amount, "\u{20b9}125000.00");
        assert!(!quotation.synthetic);
    }

    #[test]
    fn test_map_takes_date_from_first_token() {
        let mapped = map_quotations(&[api_quotation()]);
        assert_eq!(mapped[0].date, "2025-05-10");
        assert_eq!(mapped[0].valid_till, "09/06/2025");
    }

    #[test]
    fn test_map_defaults_unparseable_quantity_to_one() {
        let mut quote = api_quotation();
        quote.seeker_quantity_required = "as discussed".to_string();
        quote.supp_item_price = "99.5".to_string();
        let mapped = map_quotations(&[quote]);
        assert_eq!(mapped[0].items[0].quantity, 1);
        assert_eq!(mapped[0].total_amount, "\u{20b9}99.50");
    }

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number("500 kg"), Some(500.0));
        assert_eq!(leading_number("99.5"), Some(99.5));
        assert_eq!(leading_number("approx 10"), None);
    }

    fn supplier(id: u32) -> Supplier {
        let mut details = HashMap::new();
        details.insert("GST Number".to_string(), "07AABCU9603R1ZM".to_string());
        details.insert("Products".to_string(), "Cotton".to_string());
        Supplier {
            id,
            name: "Acme Textiles".to_string(),
            details,
            image: None,
            url: None,
        }
    }

    #[test]
    fn test_mock_quotations_are_tagged_synthetic() {
        let user = UserIdentity {
            name: "Asha Rao".to_string(),
            mobile: "9123456789".to_string(),
        };
        let quotations = generate_mock_quotations(&[supplier(1), supplier(2)], &user);
        assert_eq!(quotations.len(), 2);
        assert!(quotations.iter().all(|q| q.synthetic));
        assert_eq!(quotations[0].seeker_email, "asha.rao@gmail.com");
        assert_eq!(quotations[0].supplier_gstin, "07AABCU9603R1ZM");
    }

    #[test]
    fn test_mock_amount_is_price_times_quantity() {
        let user = UserIdentity {
            name: "Asha".to_string(),
            mobile: "9123456789".to_string(),
        };
        for quotation in generate_mock_quotations(&[supplier(1)], &user) {
            let item = &quotation.items[0];
            let price = leading_number(item.price_per_unit.trim_start_matches('\u{20b9}')).unwrap();
            assert!((1000.0..6000.0).contains(&price));
            assert!((1..=10).contains(&item.quantity));
            let expected = format_inr(price * f64::from(item.quantity));
            assert_eq!(item.amount, expected);
            assert_eq!(quotation.total_amount, expected);
        }
    }
}
