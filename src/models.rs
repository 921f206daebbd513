use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Flexible optional-string deserializer. The extraction model is asked for
/// string fields but will occasionally emit bare numbers (a pincode, a day
/// count); accept those rather than failing the whole record.
fn deserialize_flexible_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum FlexibleString {
        String(String),
        Int(i64),
        Float(f64),
        None,
    }

    let value = Option::<FlexibleString>::deserialize(deserializer)?;
    Ok(match value {
        Some(FlexibleString::String(s)) => Some(s),
        Some(FlexibleString::Int(i)) => Some(i.to_string()),
        Some(FlexibleString::Float(f)) => Some(f.to_string()),
        Some(FlexibleString::None) | None => None,
    })
}

/// One turn of the conversation; also the wire shape for the model call
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

// Groq API request format
#[derive(Debug, Serialize, Clone)]
pub struct GroqRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<serde_json::Value>,
}

// Groq API response format
#[derive(Debug, Deserialize)]
pub struct GroqResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChatMessage,
}

/// The five requirement fields extracted from the conversation.
/// Each is nullable; a field stays null until some turn establishes it.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ExtractedRequirement {
    #[serde(default, deserialize_with = "deserialize_flexible_string")]
    pub product: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flexible_string")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flexible_string")]
    pub quantity: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flexible_string")]
    pub pincode: Option<String>,
    #[serde(
        default,
        rename = "deliveryDays",
        deserialize_with = "deserialize_flexible_string"
    )]
    pub delivery_days: Option<String>,
}

impl ExtractedRequirement {
    /// Merge a fresh extraction over this record: new non-null values
    /// overwrite, nulls never erase a previously known value.
    pub fn merge_from(&mut self, newer: &ExtractedRequirement) {
        fn pick(current: &mut Option<String>, newer: &Option<String>) {
            if let Some(value) = newer {
                if !value.trim().is_empty() {
                    *current = Some(value.clone());
                }
            }
        }
        pick(&mut self.product, &newer.product);
        pick(&mut self.location, &newer.location);
        pick(&mut self.quantity, &newer.quantity);
        pick(&mut self.pincode, &newer.pincode);
        pick(&mut self.delivery_days, &newer.delivery_days);
    }
}

/// Raw supplier record as emitted by the scraper script on stdout
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedSupplier {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub gst_number: Option<String>,
    #[serde(default)]
    pub products: Vec<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub contact_details: ContactDetails,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ContactDetails {
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub whatsapp: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub business_type: Option<String>,
    #[serde(default)]
    pub rating: Option<String>,
}

/// Structured supplier record parsed back out of a formatted message block.
/// Ids are sequential within one parsed batch and carry no meaning beyond it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Supplier {
    pub id: u32,
    pub name: String,
    pub details: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Who is asking for quotations
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UserIdentity {
    pub name: String,
    pub mobile: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct QuotationItem {
    pub description: String,
    pub moq: String,
    pub price_per_unit: String,
    pub quantity: u32,
    pub amount: String,
}

/// A priced offer from one supplier for one requirement. `synthetic` is true
/// exactly when the record was generated locally as a placeholder.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Quotation {
    pub id: String,
    pub supplier_name: String,
    pub supplier_gstin: String,
    pub supplier_reg_date: String,
    pub supplier_phone: String,
    pub supplier_email: String,
    pub supplier_address: String,
    pub seeker_name: String,
    pub seeker_gstin: String,
    pub seeker_phone: String,
    pub seeker_email: String,
    pub seeker_address: String,
    pub items: Vec<QuotationItem>,
    pub total_amount: String,
    pub date: String,
    pub valid_till: String,
    #[serde(default)]
    pub synthetic: bool,
}

/// Request body for the third-party notify-suppliers endpoint
#[derive(Debug, Serialize, Clone)]
pub struct NotifySuppliersRequest {
    pub seek_mobile: String,
    pub item_name: String,
    pub suppliers: Vec<NotifySupplierEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seek_gst: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seek_gst_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seek_item_qty_req: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seek_item_del_day_req: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seek_delivery_pin: Option<String>,
}

#[derive(Debug, Serialize, Clone)]
pub struct NotifySupplierEntry {
    pub supp_gst: String,
    pub supp_gst_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supp_email: Option<String>,
}

/// Response envelope shared by the sourcing service endpoints
#[derive(Debug, Deserialize)]
pub struct ApiMeta {
    pub success: bool,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NotifySuppliersResponse {
    pub meta: ApiMeta,
    pub data: NotifyData,
}

#[derive(Debug, Deserialize)]
pub struct NotifyData {
    pub requirement_id: String,
}

/// Quotation record as returned by the quotation-fetch service
#[derive(Debug, Deserialize, Clone)]
pub struct ApiQuotation {
    pub quotation_id: String,
    pub supplier_name: String,
    pub supplier_gst: String,
    #[serde(default)]
    pub supplier_address: String,
    #[serde(default)]
    pub supplier_email: String,
    #[serde(default)]
    pub supplier_registration_date: String,
    #[serde(default)]
    pub supplier_mobile: String,
    pub supp_item_price: String,
    pub seeker_name: String,
    #[serde(default)]
    pub seeker_gst: String,
    #[serde(default)]
    pub seeker_mobile: String,
    #[serde(default)]
    pub seeker_email: String,
    #[serde(default)]
    pub seeker_address: String,
    pub seeker_item_name: String,
    pub seeker_quantity_required: String,
    pub quotation_received_at: String,
}

#[derive(Debug, Deserialize)]
pub struct FetchQuotationsResponse {
    pub meta: ApiMeta,
    pub data: Vec<ApiQuotation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_decode_accepts_numeric_fields() {
        let raw = r#"{"product":"cotton","location":"Delhi","quantity":"500 kg","pincode":110001,"deliveryDays":7}"#;
        let req: ExtractedRequirement = serde_json::from_str(raw).unwrap();
        assert_eq!(req.pincode.as_deref(), Some("110001"));
        assert_eq!(req.delivery_days.as_deref(), Some("7"));
    }

    #[test]
    fn test_extraction_decode_missing_fields_are_null() {
        let raw = r#"{"product":"cotton"}"#;
        let req: ExtractedRequirement = serde_json::from_str(raw).unwrap();
        assert_eq!(req.product.as_deref(), Some("cotton"));
        assert!(req.location.is_none());
        assert!(req.delivery_days.is_none());
    }

    #[test]
    fn test_merge_null_never_erases() {
        let mut known = ExtractedRequirement {
            product: Some("cotton".to_string()),
            location: Some("Delhi".to_string()),
            ..Default::default()
        };
        let newer = ExtractedRequirement {
            quantity: Some("500 kg".to_string()),
            ..Default::default()
        };
        known.merge_from(&newer);
        assert_eq!(known.product.as_deref(), Some("cotton"));
        assert_eq!(known.location.as_deref(), Some("Delhi"));
        assert_eq!(known.quantity.as_deref(), Some("500 kg"));
    }

    #[test]
    fn test_merge_new_value_overwrites() {
        let mut known = ExtractedRequirement {
            location: Some("Delhi".to_string()),
            ..Default::default()
        };
        let newer = ExtractedRequirement {
            location: Some("Mumbai".to_string()),
            ..Default::default()
        };
        known.merge_from(&newer);
        assert_eq!(known.location.as_deref(), Some("Mumbai"));
    }

    #[test]
    fn test_merge_blank_string_does_not_overwrite() {
        let mut known = ExtractedRequirement {
            pincode: Some("110001".to_string()),
            ..Default::default()
        };
        let newer = ExtractedRequirement {
            pincode: Some("  ".to_string()),
            ..Default::default()
        };
        known.merge_from(&newer);
        assert_eq!(known.pincode.as_deref(), Some("110001"));
    }

    #[test]
    fn test_scraped_supplier_decode_camel_case() {
        let raw = r#"{
            "name": "Acme Textiles",
            "gstNumber": "07AABCU9603R1ZM",
            "products": ["Cotton", "Yarn"],
            "price": "250",
            "unit": "kg",
            "contactDetails": {"contactPerson": "R. Sharma", "phone": "9876543210"}
        }"#;
        let supplier: ScrapedSupplier = serde_json::from_str(raw).unwrap();
        assert_eq!(supplier.gst_number.as_deref(), Some("07AABCU9603R1ZM"));
        assert_eq!(supplier.products.len(), 2);
        assert_eq!(
            supplier.contact_details.contact_person.as_deref(),
            Some("R. Sharma")
        );
    }

    #[test]
    fn test_notify_request_skips_absent_optionals() {
        let request = NotifySuppliersRequest {
            seek_mobile: "9876543210".to_string(),
            item_name: "cotton".to_string(),
            suppliers: vec![NotifySupplierEntry {
                supp_gst: "07AABCU9603R1ZM".to_string(),
                supp_gst_name: "Acme Textiles".to_string(),
                supp_email: None,
            }],
            seek_gst: None,
            seek_gst_name: None,
            seek_item_qty_req: None,
            seek_item_del_day_req: None,
            seek_delivery_pin: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("seek_item_qty_req"));
        assert!(!json.contains("supp_email"));
    }
}
