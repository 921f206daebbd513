use async_trait::async_trait;
use regex::Regex;
use std::sync::Arc;

use crate::config::GroqConfig;
use crate::error::Result;
use crate::models::{ChatMessage, ExtractedRequirement, GroqRequest};
use crate::transport::Transport;

const EXTRACTION_TEMPLATE: &str = r#"You are a helpful assistant that extracts information from user queries.
Extract the following information from the user's latest message AND consider any information from the previous conversation.

Previous conversation:
{chat_history}

Latest user message: {query}

Please provide the product, location, quantity, pincode, and delivery days in JSON format.
If any field is not specified in the current message but was mentioned in previous messages, include it.
If a field is not specified anywhere in the conversation, use null.

Example format:
{
  "product": "cotton",
  "location": "Delhi",
  "quantity": "500 kg",
  "pincode": "110001",
  "deliveryDays": "7"
}
Respond with the JSON object only."#;

/// Extracts the five requirement fields from the conversation
#[async_trait]
pub trait RequirementExtractor: Send + Sync {
    async fn extract(&self, query: &str, history: &[ChatMessage]) -> Result<ExtractedRequirement>;
}

pub struct GroqExtractor {
    tx: Arc<dyn Transport>,
    model: String,
    temperature: f32,
    max_tokens: i32,
}

impl GroqExtractor {
    pub fn new(tx: Arc<dyn Transport>, cfg: &GroqConfig) -> Self {
        Self {
            tx,
            model: cfg.model.clone(),
            temperature: cfg.temperature,
            max_tokens: cfg.max_tokens,
        }
    }
}

/// Render prior turns as "User: ..." / "Assistant: ..." lines for the prompt
pub fn render_history(history: &[ChatMessage]) -> String {
    history
        .iter()
        .map(|m| {
            let role = if m.role == "user" { "User" } else { "Assistant" };
            format!("{}: {}", role, m.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl RequirementExtractor for GroqExtractor {
    async fn extract(&self, query: &str, history: &[ChatMessage]) -> Result<ExtractedRequirement> {
        tracing::info!("Extracting requirement fields for query: {}", query);

        let prompt = EXTRACTION_TEMPLATE
            .replace("{chat_history}", &render_history(history))
            .replace("{query}", query);

        let request = GroqRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            response_format: None,
        };

        let response = self.tx.chat(&request).await?;

        let Some(choice) = response.choices.first() else {
            tracing::warn!("Model returned no choices; treating requirement as empty");
            return Ok(ExtractedRequirement::default());
        };

        // Parse failure degrades to the all-null record. No retry: a garbled
        // reply means this turn learned nothing new.
        match serde_json::from_str::<ExtractedRequirement>(choice.message.content.trim()) {
            Ok(extracted) => Ok(extracted),
            Err(e) => {
                tracing::warn!(
                    "Failed to parse extraction result as JSON: {e}. Raw: {}",
                    choice.message.content
                );
                Ok(ExtractedRequirement::default())
            }
        }
    }
}

/// Hidden machine-readable marker embedded in the chat stream so the display
/// layer can persist the resolved requirement.
pub fn store_info_marker(requirement: &ExtractedRequirement) -> String {
    // Serialization of the five optional fields cannot fail
    let json = serde_json::to_string(requirement).unwrap_or_else(|_| "{}".to_string());
    format!("<!--STORE_INFO:{json}-->")
}

/// Strip the STORE_INFO marker from display text, returning the cleaned text
/// and the embedded requirement if one was present and well-formed.
pub fn strip_store_info(content: &str) -> (String, Option<ExtractedRequirement>) {
    let re = Regex::new(r"<!--STORE_INFO:(.*?)-->").expect("marker pattern is valid");

    let Some(caps) = re.captures(content) else {
        return (content.to_string(), None);
    };

    let parsed = serde_json::from_str::<ExtractedRequirement>(&caps[1]).ok();
    if parsed.is_none() {
        tracing::warn!("STORE_INFO marker present but not parseable: {}", &caps[1]);
    }
    let cleaned = re.replace(content, "").into_owned();
    (cleaned, parsed)
}
