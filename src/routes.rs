use std::convert::Infallible;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::StreamExt;
use futures::channel::mpsc;

use crate::error::SourcingError;
use crate::handlers::ApiHandlers;
use crate::handlers::chat::ChatParams;
use crate::handlers::execute::ExecuteParams;
use crate::handlers::quotations::QuotationParams;
use crate::handlers::session::{LoginParams, SelectParams};
use crate::render;
use crate::store::SessionRepository;

impl IntoResponse for SourcingError {
    fn into_response(self) -> Response {
        let status = match &self {
            SourcingError::Validation(_) => StatusCode::BAD_REQUEST,
            SourcingError::NotFound(_) => StatusCode::NOT_FOUND,
            SourcingError::Api(_) | SourcingError::Http(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Request failed: {self}");
        }
        // Only human-readable strings cross the HTTP boundary
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Assemble the HTTP API around a set of handlers
pub fn router<R: SessionRepository>(handlers: Arc<ApiHandlers<R>>) -> Router {
    Router::new()
        .route("/api/chat", post(chat::<R>))
        .route("/api/execute", post(execute::<R>))
        .route("/api/session/login", post(login::<R>))
        .route("/api/suppliers/select", post(select::<R>))
        .route("/api/quotations/request", post(request_quotations::<R>))
        .route("/api/quotations/fetch", post(fetch_quotations::<R>))
        .route(
            "/api/quotations/:session_id/:quotation_id/html",
            get(quotation_html::<R>),
        )
        .route(
            "/api/quotations/:session_id/:quotation_id/pdf",
            get(quotation_pdf::<R>),
        )
        .route("/health", get(|| async { "ok" }))
        .with_state(handlers)
}

/// Streamed plain-text chat turn. The handler task writes chunks into the
/// channel while the response body drains it.
async fn chat<R: SessionRepository>(
    State(handlers): State<Arc<ApiHandlers<R>>>,
    Json(params): Json<ChatParams>,
) -> Response {
    let (tx, rx) = mpsc::unbounded();
    tokio::spawn(async move {
        handlers.handle_chat(params, tx).await;
    });

    let stream = rx.map(|chunk: String| Ok::<_, Infallible>(Bytes::from(chunk)));
    Response::builder()
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Body::from_stream(stream))
        .expect("static response headers are valid")
}

async fn execute<R: SessionRepository>(
    State(handlers): State<Arc<ApiHandlers<R>>>,
    Json(params): Json<ExecuteParams>,
) -> Result<impl IntoResponse, SourcingError> {
    Ok(Json(handlers.handle_execute(params).await?))
}

async fn login<R: SessionRepository>(
    State(handlers): State<Arc<ApiHandlers<R>>>,
    Json(params): Json<LoginParams>,
) -> Result<impl IntoResponse, SourcingError> {
    Ok(Json(handlers.handle_login(params).await?))
}

async fn select<R: SessionRepository>(
    State(handlers): State<Arc<ApiHandlers<R>>>,
    Json(params): Json<SelectParams>,
) -> Result<impl IntoResponse, SourcingError> {
    Ok(Json(handlers.handle_select(params).await?))
}

async fn request_quotations<R: SessionRepository>(
    State(handlers): State<Arc<ApiHandlers<R>>>,
    Json(params): Json<QuotationParams>,
) -> Result<impl IntoResponse, SourcingError> {
    Ok(Json(handlers.handle_request_quotations(params).await?))
}

async fn fetch_quotations<R: SessionRepository>(
    State(handlers): State<Arc<ApiHandlers<R>>>,
    Json(params): Json<QuotationParams>,
) -> Result<impl IntoResponse, SourcingError> {
    Ok(Json(handlers.handle_fetch_quotations(params).await?))
}

async fn quotation_html<R: SessionRepository>(
    State(handlers): State<Arc<ApiHandlers<R>>>,
    Path((session_id, quotation_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, SourcingError> {
    let quotation = handlers.get_quotation(&session_id, &quotation_id).await?;
    Ok(Html(render::render_html(&quotation)))
}

async fn quotation_pdf<R: SessionRepository>(
    State(handlers): State<Arc<ApiHandlers<R>>>,
    Path((session_id, quotation_id)): Path<(String, String)>,
) -> Result<Response, SourcingError> {
    let quotation = handlers.get_quotation(&session_id, &quotation_id).await?;
    let bytes = render::render_pdf(&quotation)?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        render::pdf_filename(&quotation)
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
