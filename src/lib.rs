pub mod config;
pub mod error;
pub mod extract;
pub mod gate;
pub mod handlers;
pub mod models;
pub mod notify;
pub mod quotations;
pub mod render;
pub mod routes;
pub mod scraper;
pub mod script;
pub mod session;
pub mod store;
pub mod suppliers;
pub mod transport;
pub mod validation;

use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::extract::GroqExtractor;
use crate::handlers::ApiHandlers;
use crate::notify::PiceNotificationClient;
use crate::quotations::PiceQuotationClient;
use crate::scraper::ScriptScraper;
use crate::script::ScriptRunner;
use crate::store::{RedisManager, RedisSessionRepository};
use crate::transport::{GroqTransport, Transport};
use crate::validation::InputValidator;

/// Wire the production component graph: Groq-backed extraction, the
/// subprocess scraper, the third-party sourcing clients and Redis sessions.
pub fn build_handlers(
    config: Arc<Config>,
    redis: Arc<RedisManager>,
) -> Result<Arc<ApiHandlers<RedisSessionRepository>>> {
    let transport: Arc<dyn Transport> =
        Arc::new(GroqTransport::new(config.groq.api_key.clone())?);
    let extractor = Arc::new(GroqExtractor::new(Arc::clone(&transport), &config.groq));

    let script_runner = Arc::new(ScriptRunner::new(&config.scraper));
    let scraper = Arc::new(ScriptScraper::new(
        Arc::clone(&script_runner),
        &config.scraper,
    ));

    let notifier = Arc::new(PiceNotificationClient::new(config.sourcing.clone()));
    let quotation_client = Arc::new(PiceQuotationClient::new(config.sourcing.clone()));

    let sessions = Arc::new(RedisSessionRepository::new(redis));

    Ok(Arc::new(ApiHandlers::new(
        sessions,
        extractor,
        scraper,
        notifier,
        quotation_client,
        script_runner,
        Arc::new(InputValidator::new()),
        config,
    )))
}
