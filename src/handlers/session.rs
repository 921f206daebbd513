use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::UserIdentity;
use crate::store::SessionRepository;

use super::ApiHandlers;

/// Request body for POST /api/session/login
#[derive(Debug, Deserialize)]
pub struct LoginParams {
    /// Reuse an existing session when the client already holds an id
    pub session_id: Option<String>,
    pub name: String,
    pub mobile: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub session_id: String,
}

/// Request body for POST /api/suppliers/select
#[derive(Debug, Deserialize)]
pub struct SelectParams {
    pub session_id: String,
    pub supplier_id: u32,
    pub selected: bool,
}

#[derive(Debug, Serialize)]
pub struct SelectResponse {
    pub selected_count: usize,
}

impl<R: SessionRepository> ApiHandlers<R> {
    /// Validate and persist the user identity, minting a session id if the
    /// client does not have one yet
    pub async fn handle_login(&self, params: LoginParams) -> Result<LoginResponse> {
        self.validator.validate_user_name(&params.name)?;
        self.validator.validate_mobile(&params.mobile)?;

        let session_id = params
            .session_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let mut session = self.load_or_create_session(&session_id).await?;
        session.user = Some(UserIdentity {
            name: params.name.trim().to_string(),
            mobile: params.mobile,
        });
        self.sessions.save(&session).await?;

        tracing::info!("Session {} logged in", session_id);
        Ok(LoginResponse { session_id })
    }

    /// Toggle one supplier in the current batch and persist immediately
    pub async fn handle_select(&self, params: SelectParams) -> Result<SelectResponse> {
        let mut session = self.load_session(&params.session_id).await?;
        session.toggle_selection(params.supplier_id, params.selected)?;
        self.sessions.save(&session).await?;

        Ok(SelectResponse {
            selected_count: session.selected_suppliers().len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourcingError;
    use crate::handlers::testing::Fixture;
    use crate::models::Supplier;
    use crate::session::{SessionContext, SessionPhase};
    use crate::store::testing::MemorySessionRepository;
    use std::collections::HashMap;

    fn supplier(id: u32, name: &str) -> Supplier {
        Supplier {
            id,
            name: name.to_string(),
            details: HashMap::new(),
            image: None,
            url: None,
        }
    }

    #[tokio::test]
    async fn test_login_creates_session_with_identity() {
        let handlers = Fixture::new().build();

        let response = handlers
            .handle_login(LoginParams {
                session_id: None,
                name: "Asha Rao".to_string(),
                mobile: "9876543210".to_string(),
            })
            .await
            .unwrap();

        let session = handlers.load_session(&response.session_id).await.unwrap();
        assert_eq!(session.user.as_ref().unwrap().name, "Asha Rao");
    }

    #[tokio::test]
    async fn test_login_rejects_bad_mobile() {
        let handlers = Fixture::new().build();

        let result = handlers
            .handle_login(LoginParams {
                session_id: None,
                name: "Asha".to_string(),
                mobile: "12345".to_string(),
            })
            .await;
        assert!(matches!(result, Err(SourcingError::Validation(_))));
    }

    #[tokio::test]
    async fn test_select_toggles_and_persists() {
        let mut fixture = Fixture::new();
        let mut session = SessionContext::new("s1".to_string());
        session.show_suppliers(vec![supplier(1, "Acme"), supplier(2, "Delhi Cotton")]);
        fixture.sessions = MemorySessionRepository::with_session(session);
        let handlers = fixture.build();

        let response = handlers
            .handle_select(SelectParams {
                session_id: "s1".to_string(),
                supplier_id: 2,
                selected: true,
            })
            .await
            .unwrap();
        assert_eq!(response.selected_count, 1);

        let session = handlers.load_session("s1").await.unwrap();
        assert_eq!(session.phase, SessionPhase::SelectionChanged);

        let response = handlers
            .handle_select(SelectParams {
                session_id: "s1".to_string(),
                supplier_id: 2,
                selected: false,
            })
            .await
            .unwrap();
        assert_eq!(response.selected_count, 0);
    }

    #[tokio::test]
    async fn test_select_unknown_session_is_not_found() {
        let handlers = Fixture::new().build();
        let result = handlers
            .handle_select(SelectParams {
                session_id: "missing".to_string(),
                supplier_id: 1,
                selected: true,
            })
            .await;
        assert!(matches!(result, Err(SourcingError::NotFound(_))));
    }
}
