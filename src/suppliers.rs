use regex::Regex;

use crate::models::{ScrapedSupplier, Supplier};

/// Section marker opening each supplier block in a chat message
pub const SUPPLIER_MARKER: &str = "### Supplier";

/// Format scraped suppliers into the delimited Markdown block streamed to the
/// chat. Each block opens with `### Supplier {n}: {name}` followed by
/// `**Label**: value` lines; IMAGE and URL are reserved labels.
pub fn format_supplier_info(suppliers: &[ScrapedSupplier]) -> String {
    if suppliers.is_empty() {
        return "No supplier information available.".to_string();
    }

    suppliers
        .iter()
        .enumerate()
        .map(|(index, supplier)| format_one(index + 1, supplier))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn format_one(ordinal: usize, supplier: &ScrapedSupplier) -> String {
    let name = supplier.name.as_deref().unwrap_or("Unknown");
    let gst = supplier.gst_number.as_deref().unwrap_or("Not available");
    let products = if supplier.products.is_empty() {
        "Not specified".to_string()
    } else {
        supplier.products.join(", ")
    };
    let price = match (&supplier.price, &supplier.unit) {
        (Some(price), Some(unit)) => format!("{price}/{unit}"),
        (Some(price), None) => price.clone(),
        (None, _) => "Not available".to_string(),
    };
    let image = supplier.image.as_deref().unwrap_or("Not available");
    let url = supplier.url.as_deref().unwrap_or("Not available");

    let mut block = format!(
        "{SUPPLIER_MARKER} {ordinal}: {name}\n\n\
         **GST Number**: {gst}\n\
         **Products**: {products}\n\
         **Price**: {price}\n\
         **IMAGE**: {image}\n\
         **URL**: {url}"
    );

    let contact = &supplier.contact_details;
    let contact_lines: [(&str, &Option<String>); 6] = [
        ("Contact Person", &contact.contact_person),
        ("Phone", &contact.phone),
        ("WhatsApp", &contact.whatsapp),
        ("Email", &contact.email),
        ("Address", &contact.address),
        ("Business Type", &contact.business_type),
    ];
    for (label, value) in contact_lines {
        if let Some(value) = value {
            block.push_str(&format!("\n**{label}**: {value}"));
        }
    }
    if let Some(rating) = &contact.rating {
        block.push_str(&format!("\n**Rating**: {rating}/5"));
    }

    block
}

/// Parse supplier records back out of a formatted message. Blocks whose first
/// line does not match the `{ordinal}: {name}` shape are silently dropped;
/// ids are assigned sequentially from 1 within this batch only.
pub fn parse_supplier_info(content: &str) -> Vec<Supplier> {
    let name_re = Regex::new(r"(\d+): (.+)").expect("name pattern is valid");
    let mut suppliers = Vec::new();

    for block in content.split(SUPPLIER_MARKER).skip(1) {
        let trimmed = block.trim();
        let Some(first_line) = trimmed.lines().next() else {
            continue;
        };
        let Some(caps) = name_re.captures(first_line) else {
            continue;
        };

        let mut supplier = Supplier {
            id: suppliers.len() as u32 + 1,
            name: caps[2].trim().to_string(),
            details: std::collections::HashMap::new(),
            image: None,
            url: None,
        };

        for line in trimmed.lines() {
            if !line.starts_with("**") {
                continue;
            }
            let stripped = line.replace("**", "");
            let Some((label, value)) = stripped.split_once(':') else {
                continue;
            };
            let label = label.trim();
            let value = value.trim().to_string();

            match label {
                "IMAGE" => supplier.image = Some(value),
                "URL" => supplier.url = Some(value),
                _ => {
                    supplier.details.insert(label.to_string(), value);
                }
            }
        }

        suppliers.push(supplier);
    }

    suppliers
}

/// A chat message carrying supplier blocks, split into the prose around them
#[derive(Debug, Clone, PartialEq)]
pub struct SupplierMessage {
    pub text_before: String,
    pub suppliers: Vec<Supplier>,
    pub text_after: String,
}

/// Split a message into lead-in prose, the parsed supplier batch, and
/// trail-out prose (everything after the last `**URL**:` line). Returns None
/// when the message carries no supplier marker.
pub fn split_supplier_message(content: &str) -> Option<SupplierMessage> {
    let marker_index = content.find(SUPPLIER_MARKER)?;
    let text_before = content[..marker_index].trim().to_string();

    let lines: Vec<&str> = content.lines().collect();
    let last_url_line = lines.iter().rposition(|line| line.contains("**URL**:"));

    let text_after = match last_url_line {
        Some(index) if index + 1 < lines.len() => lines[index + 1..].join("\n").trim().to_string(),
        _ => String::new(),
    };

    Some(SupplierMessage {
        text_before,
        suppliers: parse_supplier_info(content),
        text_after,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContactDetails;

    fn scraped(name: &str) -> ScrapedSupplier {
        ScrapedSupplier {
            name: Some(name.to_string()),
            gst_number: Some("07AABCU9603R1ZM".to_string()),
            products: vec!["Cotton".to_string(), "Yarn".to_string()],
            price: Some("250".to_string()),
            unit: Some("kg".to_string()),
            image: Some("https://example.com/a.jpg".to_string()),
            url: Some("https://example.com/acme".to_string()),
            contact_details: ContactDetails {
                phone: Some("9876543210".to_string()),
                address: Some("Karol Bagh, Delhi".to_string()),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_format_empty_batch() {
        assert_eq!(format_supplier_info(&[]), "No supplier information available.");
    }

    #[test]
    fn test_round_trip_preserves_count_ids_and_routing() {
        let batch = vec![scraped("Acme Textiles"), scraped("Delhi Cotton Co"), scraped("Weave Works")];
        let formatted = format_supplier_info(&batch);

        let parsed = parse_supplier_info(&formatted);
        assert_eq!(parsed.len(), 3);
        for (index, supplier) in parsed.iter().enumerate() {
            assert_eq!(supplier.id, index as u32 + 1);
            assert_eq!(supplier.image.as_deref(), Some("https://example.com/a.jpg"));
            assert_eq!(supplier.url.as_deref(), Some("https://example.com/acme"));
            // Reserved labels never leak into the details mapping
            assert!(!supplier.details.contains_key("IMAGE"));
            assert!(!supplier.details.contains_key("URL"));
            assert_eq!(
                supplier.details.get("GST Number").map(String::as_str),
                Some("07AABCU9603R1ZM")
            );
            assert_eq!(
                supplier.details.get("Products").map(String::as_str),
                Some("Cotton, Yarn")
            );
            assert_eq!(
                supplier.details.get("Address").map(String::as_str),
                Some("Karol Bagh, Delhi")
            );
        }
        assert_eq!(parsed[1].name, "Delhi Cotton Co");
    }

    #[test]
    fn test_value_with_colons_splits_at_first() {
        let content = "### Supplier 1: Acme\n**URL**: https://example.com/x?a=1\n";
        let parsed = parse_supplier_info(content);
        assert_eq!(parsed[0].url.as_deref(), Some("https://example.com/x?a=1"));
    }

    #[test]
    fn test_malformed_first_line_drops_block() {
        let content = "### Supplier garbage header\n**GST Number**: X\n\n### Supplier 2: Real One\n**URL**: u\n";
        let parsed = parse_supplier_info(content);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].name, "Real One");
        // Ids restart from 1 for the surviving records
        assert_eq!(parsed[0].id, 1);
    }

    #[test]
    fn test_parse_without_markers_is_empty() {
        assert!(parse_supplier_info("just a plain reply").is_empty());
    }

    #[test]
    fn test_split_captures_surrounding_prose() {
        let content = "Here are the suppliers I found:\n\n\
            ### Supplier 1: Acme\n**GST Number**: X\n**URL**: https://a\n\
            \nWould you like me to help you generate quotations?";
        let message = split_supplier_message(content).unwrap();
        assert_eq!(message.text_before, "Here are the suppliers I found:");
        assert_eq!(message.suppliers.len(), 1);
        assert_eq!(
            message.text_after,
            "Would you like me to help you generate quotations?"
        );
    }

    #[test]
    fn test_split_without_trailing_prose() {
        let content = "Intro\n### Supplier 1: Acme\n**URL**: https://a";
        let message = split_supplier_message(content).unwrap();
        assert_eq!(message.text_after, "");
    }

    #[test]
    fn test_split_plain_message_is_none() {
        assert!(split_supplier_message("no suppliers here").is_none());
    }
}
