use crate::error::{AppError, Result};
use crate::handlers::within_deadline;
use crate::model::{LinkRequest, LinkResponse};
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::Json;

/// Parses the body by hand so that every malformed or oversized body is a 400,
/// whatever the `Content-Type` header says.
fn parse_body(body: std::result::Result<Bytes, BytesRejection>) -> Result<LinkRequest> {
    let bytes = body.map_err(|e| AppError::MalformedBody(e.body_text()))?;
    serde_json::from_slice(&bytes).map_err(|e| AppError::MalformedBody(e.to_string()))
}

pub async fn shorten_handler(
    State(state): State<AppState>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<Json<LinkResponse>> {
    let request = parse_body(body)?;
    let short = within_deadline(&state, state.resolver().shorten(&request.url)).await?;
    Ok(Json(LinkResponse::new(short.into_string())))
}

pub async fn resolve_handler(
    State(state): State<AppState>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<Json<LinkResponse>> {
    let request = parse_body(body)?;
    let long = within_deadline(&state, state.resolver().resolve(&request.url)).await?;
    Ok(Json(LinkResponse::new(long.into_string())))
}
