pub mod chat;
pub mod execute;
pub mod quotations;
pub mod session;

use std::sync::Arc;

use crate::config::Config;
use crate::extract::RequirementExtractor;
use crate::notify::NotificationClient;
use crate::quotations::QuotationClient;
use crate::scraper::SupplierSource;
use crate::script::ScriptRunner;
use crate::store::SessionRepository;
use crate::validation::InputValidator;

/// Handlers for the HTTP API operations
pub struct ApiHandlers<R: SessionRepository> {
    pub(crate) sessions: Arc<R>,
    pub(crate) extractor: Arc<dyn RequirementExtractor>,
    pub(crate) scraper: Arc<dyn SupplierSource>,
    pub(crate) notifier: Arc<dyn NotificationClient>,
    pub(crate) quotation_client: Arc<dyn QuotationClient>,
    pub(crate) script_runner: Arc<ScriptRunner>,
    pub(crate) validator: Arc<InputValidator>,
    #[allow(dead_code)]
    pub(crate) config: Arc<Config>,
}

impl<R: SessionRepository> ApiHandlers<R> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sessions: Arc<R>,
        extractor: Arc<dyn RequirementExtractor>,
        scraper: Arc<dyn SupplierSource>,
        notifier: Arc<dyn NotificationClient>,
        quotation_client: Arc<dyn QuotationClient>,
        script_runner: Arc<ScriptRunner>,
        validator: Arc<InputValidator>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            sessions,
            extractor,
            scraper,
            notifier,
            quotation_client,
            script_runner,
            validator,
            config,
        }
    }

    /// Load a session or start a fresh one under the given id
    pub(crate) async fn load_or_create_session(
        &self,
        session_id: &str,
    ) -> crate::error::Result<crate::session::SessionContext> {
        Ok(self
            .sessions
            .load(session_id)
            .await?
            .unwrap_or_else(|| crate::session::SessionContext::new(session_id.to_string())))
    }

    /// Load a session that must already exist
    pub(crate) async fn load_session(
        &self,
        session_id: &str,
    ) -> crate::error::Result<crate::session::SessionContext> {
        self.sessions.load(session_id).await?.ok_or_else(|| {
            crate::error::SourcingError::NotFound(format!("Unknown session {session_id}"))
        })
    }
}
