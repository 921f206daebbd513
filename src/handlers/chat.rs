use futures::channel::mpsc::UnboundedSender;
use serde::Deserialize;

use crate::error::{Result, SourcingError};
use crate::extract::store_info_marker;
use crate::gate;
use crate::models::ChatMessage;
use crate::store::SessionRepository;
use crate::suppliers::{format_supplier_info, parse_supplier_info};

use super::ApiHandlers;

/// Request body for POST /api/chat
#[derive(Debug, Deserialize)]
pub struct ChatParams {
    pub session_id: String,
    pub messages: Vec<ChatMessage>,
}

/// Chunks are streamed to the client as they are produced
pub type ChunkSender = UnboundedSender<String>;

fn send(out: &ChunkSender, chunk: impl Into<String>) {
    // A dropped receiver just means the client went away mid-stream
    let _ = out.unbounded_send(chunk.into());
}

impl<R: SessionRepository> ApiHandlers<R> {
    /// Drive one chat turn, streaming chunks as they become available. Any
    /// internal failure is reported on the stream itself; the turn always
    /// returns control to the user.
    pub async fn handle_chat(&self, params: ChatParams, out: ChunkSender) {
        if let Err(e) = self.chat_turn(&params, &out).await {
            tracing::error!("Error in chat processing: {e}");
            send(
                &out,
                "I'm sorry, but I encountered an error while processing your request. Please try again.\n\n",
            );
        }
    }

    async fn chat_turn(&self, params: &ChatParams, out: &ChunkSender) -> Result<()> {
        let Some(current) = params.messages.last().filter(|m| m.role == "user") else {
            return Err(SourcingError::Validation(
                "Chat request must end with a user message".to_string(),
            ));
        };
        let history = &params.messages[..params.messages.len() - 1];

        let extracted = self.extractor.extract(&current.content, history).await?;

        let mut session = self.load_or_create_session(&params.session_id).await?;
        session.merge_requirement(&extracted);

        // Incomplete requirement: ask for what is missing and stop the turn
        if let Some(question) = gate::follow_up_message(&session.requirement) {
            send(out, question);
            self.sessions.save(&session).await?;
            return Ok(());
        }

        send(out, gate::confirmation_message(&session.requirement));

        // The gate passed, so both fields are present
        let product = session.requirement.product.clone().unwrap_or_default();
        let location = session.requirement.location.clone().unwrap_or_default();

        let suppliers = match self.scraper.fetch(&product, &location).await {
            Ok(suppliers) => suppliers,
            Err(e) => {
                tracing::error!("Error during scraping: {e}");
                send(
                    out,
                    "I encountered an error while searching for suppliers. Let's try again. Could you please verify the information you provided?\n\n",
                );
                self.sessions.save(&session).await?;
                return Ok(());
            }
        };

        if suppliers.is_empty() {
            send(
                out,
                "I couldn't find any suppliers matching your criteria. Would you like to try a different product or location?\n\n",
            );
            self.sessions.save(&session).await?;
            return Ok(());
        }

        send(
            out,
            format!("Found {} suppliers with their details.\n\n", suppliers.len()),
        );

        let supplier_info = format_supplier_info(&suppliers);

        send(
            out,
            format!("Here are the suppliers I found for {product} in {location}:\n\n"),
        );
        send(out, format!("{}\n", store_info_marker(&session.requirement)));
        send(out, format!("{supplier_info}\n\n"));
        send(
            out,
            "Would you like me to help you generate quotations from these suppliers?\n\n",
        );

        session.show_suppliers(parse_supplier_info(&supplier_info));
        self.sessions.save(&session).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::Fixture;
    use crate::models::{ContactDetails, ScrapedSupplier};
    use crate::session::SessionPhase;
    use futures::StreamExt;
    use futures::channel::mpsc;

    fn user_message(content: &str) -> ChatMessage {
        ChatMessage {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }

    async fn collect(
        handlers: &ApiHandlers<crate::store::testing::MemorySessionRepository>,
        params: ChatParams,
    ) -> String {
        let (tx, rx) = mpsc::unbounded();
        handlers.handle_chat(params, tx).await;
        rx.collect::<Vec<_>>().await.join("")
    }

    fn scraped(name: &str) -> ScrapedSupplier {
        ScrapedSupplier {
            name: Some(name.to_string()),
            gst_number: Some("07AABCU9603R1ZM".to_string()),
            products: vec!["Cotton".to_string()],
            price: Some("250".to_string()),
            unit: Some("kg".to_string()),
            image: Some("https://example.com/a.jpg".to_string()),
            url: Some("https://example.com/acme".to_string()),
            contact_details: ContactDetails::default(),
        }
    }

    #[tokio::test]
    async fn test_complete_requirement_reaches_scraper_with_resolved_pair() {
        let mut fixture = Fixture::new();
        fixture.transport_reply = Some(
            r#"{"product":"cotton","location":"Delhi","quantity":"500 kg","pincode":"110001","deliveryDays":"7"}"#
                .to_string(),
        );
        fixture
            .scraper
            .expect_fetch()
            .withf(|product, location| product == "cotton" && location == "Delhi")
            .times(1)
            .returning(|_, _| Ok(vec![scraped("Acme Textiles"), scraped("Delhi Cotton Co")]));
        let handlers = fixture.build();

        let output = collect(
            &handlers,
            ChatParams {
                session_id: "s1".to_string(),
                messages: vec![user_message(
                    "Cotton in Delhi, 500kg, pincode 110001, within 7 days",
                )],
            },
        )
        .await;

        assert!(output.contains("I have all the information I need"));
        assert!(output.contains("Found 2 suppliers"));
        assert!(output.contains("### Supplier 1: Acme Textiles"));
        assert!(output.contains("<!--STORE_INFO:"));
        assert!(output.contains("generate quotations"));

        let session = handlers.load_session("s1").await.unwrap();
        assert_eq!(session.phase, SessionPhase::SuppliersShown);
        assert_eq!(session.suppliers.len(), 2);
    }

    #[tokio::test]
    async fn test_partial_requirement_asks_follow_up_and_never_fetches() {
        let mut fixture = Fixture::new();
        fixture.transport_reply = Some(
            r#"{"product":"cotton","location":null,"quantity":null,"pincode":null,"deliveryDays":null}"#
                .to_string(),
        );
        // No expectation on the scraper: any fetch call panics the test
        fixture.scraper.expect_fetch().times(0);
        let handlers = fixture.build();

        let output = collect(
            &handlers,
            ChatParams {
                session_id: "s1".to_string(),
                messages: vec![user_message("Cotton")],
            },
        )
        .await;

        assert!(output.contains(
            "could you please provide the location, quantity required, delivery pincode and delivery timeframe (in days)?"
        ));
        assert!(output.contains("- Product: cotton"));

        let session = handlers.load_session("s1").await.unwrap();
        assert_eq!(session.requirement.product.as_deref(), Some("cotton"));
        assert_eq!(session.phase, SessionPhase::Idle);
    }

    #[tokio::test]
    async fn test_prior_turn_fields_survive_null_extraction() {
        let mut fixture = Fixture::new();
        // This turn's extraction only knows the quantity
        fixture.transport_reply = Some(
            r#"{"product":null,"location":null,"quantity":"500 kg","pincode":null,"deliveryDays":null}"#
                .to_string(),
        );
        let mut session = crate::session::SessionContext::new("s1".to_string());
        session.requirement.product = Some("cotton".to_string());
        session.requirement.location = Some("Delhi".to_string());
        fixture.sessions = crate::store::testing::MemorySessionRepository::with_session(session);
        let handlers = fixture.build();

        let output = collect(
            &handlers,
            ChatParams {
                session_id: "s1".to_string(),
                messages: vec![user_message("500 kg")],
            },
        )
        .await;

        // Still missing pincode and delivery days; earlier fields intact
        assert!(output.contains("- Product: cotton"));
        assert!(output.contains("- Location: Delhi"));
        assert!(output.contains("- Quantity: 500 kg"));
        let session = handlers.load_session("s1").await.unwrap();
        assert_eq!(session.requirement.location.as_deref(), Some("Delhi"));
    }

    #[tokio::test]
    async fn test_empty_scrape_reports_no_suppliers() {
        let mut fixture = Fixture::new();
        fixture.transport_reply = Some(
            r#"{"product":"cotton","location":"Delhi","quantity":"500 kg","pincode":"110001","deliveryDays":"7"}"#
                .to_string(),
        );
        fixture.scraper.expect_fetch().returning(|_, _| Ok(Vec::new()));
        let handlers = fixture.build();

        let output = collect(
            &handlers,
            ChatParams {
                session_id: "s1".to_string(),
                messages: vec![user_message("Cotton in Delhi, 500kg, 110001, 7 days")],
            },
        )
        .await;

        assert!(output.contains("couldn't find any suppliers"));
        let session = handlers.load_session("s1").await.unwrap();
        assert_eq!(session.phase, SessionPhase::Idle);
    }

    #[tokio::test]
    async fn test_scrape_failure_surfaces_inline_error() {
        let mut fixture = Fixture::new();
        fixture.transport_reply = Some(
            r#"{"product":"cotton","location":"Delhi","quantity":"500 kg","pincode":"110001","deliveryDays":"7"}"#
                .to_string(),
        );
        fixture.scraper.expect_fetch().returning(|_, _| {
            Err(crate::error::SourcingError::Script("exit status 1".to_string()))
        });
        let handlers = fixture.build();

        let output = collect(
            &handlers,
            ChatParams {
                session_id: "s1".to_string(),
                messages: vec![user_message("Cotton in Delhi, 500kg, 110001, 7 days")],
            },
        )
        .await;

        assert!(output.contains("error while searching for suppliers"));
    }

    #[tokio::test]
    async fn test_turn_not_ending_with_user_message_errors_gracefully() {
        let fixture = Fixture::new();
        let handlers = fixture.build();

        let output = collect(
            &handlers,
            ChatParams {
                session_id: "s1".to_string(),
                messages: Vec::new(),
            },
        )
        .await;

        assert!(output.contains("I'm sorry, but I encountered an error"));
    }
}
