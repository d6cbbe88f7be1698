use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap},
    Json,
};
use mgnrega_ingest::IngestionRequest;
use std::sync::Arc;

use crate::dto::{EtlRequest, EtlResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/etl
///
/// Runs a manual ingestion and answers when it finishes. A configured
/// `ETL_API_KEY` must be presented as a bearer token.
pub async fn trigger_etl(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<EtlResponse>, ApiError> {
    if let Some(expected) = &state.etl_api_key {
        let presented = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        if presented != Some(expected.as_str()) {
            tracing::warn!("Rejected ETL trigger with missing or wrong token");
            return Err(ApiError::unauthorized());
        }
    }

    let request: EtlRequest = if body.iter().all(u8::is_ascii_whitespace) {
        EtlRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::bad_request("Invalid request body").with_details(e.to_string()))?
    };

    if let Some(month) = request.month {
        if !(1..=12).contains(&month) {
            return Err(ApiError::bad_request("month must be between 1 and 12"));
        }
    }

    let Some(pipeline) = &state.ingestion else {
        return Err(ApiError::service_unavailable("Ingestion is not configured")
            .with_details("Set DATA_GOV_API_KEY to enable ETL runs."));
    };

    tracing::info!(
        state_code = request.state_code.as_deref().unwrap_or("(default)"),
        financial_year = request.financial_year.as_deref().unwrap_or("(all)"),
        month = ?request.month,
        "Manual ETL trigger"
    );

    let summary = pipeline
        .run(&IngestionRequest {
            state_code: request.state_code,
            financial_year: request.financial_year,
            month: request.month,
        })
        .await?;

    tracing::info!(
        processed = summary.processed,
        districts = summary.districts,
        errors = summary.errors,
        "Manual ETL finished"
    );

    Ok(Json(EtlResponse::completed(summary)))
}
