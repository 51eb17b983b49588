use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use ledgerline_agent::QueryRuntime;
use ledgerline_core::domain::response::QueryResponse;
use ledgerline_core::errors::{ApplicationError, InterfaceError};
use serde::{Deserialize, Serialize};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

#[derive(Clone)]
pub struct QueryState {
    runtime: Arc<QueryRuntime>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct QueryRequest {
    pub message: String,
}

/// Body returned with a non-200 status.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QueryError {
    pub error: String,
    pub correlation_id: String,
}

pub fn router(runtime: Arc<QueryRuntime>) -> Router {
    Router::new().route("/query", post(query)).with_state(QueryState { runtime })
}

pub async fn query(
    State(state): State<QueryState>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, (StatusCode, Json<QueryError>)> {
    let correlation_id = Uuid::new_v4().to_string();

    let message = match body {
        Ok(Json(request)) => request.message,
        Err(rejection) => {
            return Err(reject(
                ApplicationError::InvalidRequest(rejection.body_text()),
                &correlation_id,
            ))
        }
    };
    if message.trim().is_empty() {
        return Err(reject(
            ApplicationError::InvalidRequest("message is empty".to_string()),
            &correlation_id,
        ));
    }

    let span = info_span!("query", correlation_id = %correlation_id);
    match state.runtime.handle(&message).instrument(span).await {
        Ok(response) => {
            info!(
                event_name = "http.query.answered",
                correlation_id = %correlation_id,
                response_kind = response.kind(),
                "query answered"
            );
            Ok(Json(response))
        }
        Err(failure) => Err(reject(failure, &correlation_id)),
    }
}

fn reject(failure: ApplicationError, correlation_id: &str) -> (StatusCode, Json<QueryError>) {
    let mapped = failure.into_interface(correlation_id);
    let status = match &mapped {
        InterfaceError::BadRequest { message, .. } => {
            warn!(
                event_name = "http.query.rejected",
                correlation_id = %correlation_id,
                detail = %message,
                "query rejected"
            );
            StatusCode::BAD_REQUEST
        }
        InterfaceError::ServiceUnavailable { message, .. } => {
            error!(
                event_name = "http.query.unavailable",
                correlation_id = %correlation_id,
                detail = %message,
                "collaborator failure while answering query"
            );
            StatusCode::SERVICE_UNAVAILABLE
        }
        InterfaceError::Internal { message, .. } => {
            error!(
                event_name = "http.query.internal_error",
                correlation_id = %correlation_id,
                detail = %message,
                "internal failure while answering query"
            );
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (
        status,
        Json(QueryError {
            error: mapped.user_message().to_string(),
            correlation_id: mapped.correlation_id().to_string(),
        }),
    )
}
