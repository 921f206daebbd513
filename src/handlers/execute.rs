use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::SessionRepository;

use super::ApiHandlers;

/// Request body for POST /api/execute
#[derive(Debug, Deserialize)]
pub struct ExecuteParams {
    pub script_name: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ExecuteResponse {
    pub result: serde_json::Value,
}

impl<R: SessionRepository> ApiHandlers<R> {
    /// Run a whitelisted script and return its parsed JSON stdout
    pub async fn handle_execute(&self, params: ExecuteParams) -> Result<ExecuteResponse> {
        self.validator.validate_script_name(&params.script_name)?;

        let result = self
            .script_runner
            .run(&params.script_name, &params.args)
            .await?;

        Ok(ExecuteResponse { result })
    }
}
