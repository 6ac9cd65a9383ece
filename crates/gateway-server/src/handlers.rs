//! HTTP Handlers

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use gateway_payments::{IntentRequest, PaymentError, PaymentIntent, PaymentService};

use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub provider: Option<String>,
    pub payments_configured: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct CreateIntentResponse {
    pub success: bool,
    pub payment_intent_id: String,
    pub payment: Value,
}

#[derive(Debug, Serialize)]
pub struct ConfirmIntentResponse {
    pub success: bool,
    pub payment_intent_id: String,
    pub status: String,
    pub client_secret: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CaptureIntentResponse {
    pub success: bool,
    pub payment_intent_id: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct RefundResponse {
    pub success: bool,
    pub refund_id: String,
    pub status: Option<String>,
    pub amount_refunded: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentSummary {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    pub created: i64,
    pub client_secret: Option<String>,
}

impl From<PaymentIntent> for IntentSummary {
    fn from(intent: PaymentIntent) -> Self {
        Self {
            id: intent.id,
            amount: intent.amount,
            currency: intent.currency,
            status: intent.status,
            created: intent.created,
            client_secret: intent.client_secret,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListIntentsResponse {
    pub success: bool,
    pub payment_intents: Vec<IntentSummary>,
}

// ============================================================================
// Errors
// ============================================================================

/// Error returned by every payment handler, always rendered as JSON
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn payments_disabled() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "PAYMENTS_NOT_CONFIGURED",
            message: "Payments not configured".into(),
        }
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        let status = if err.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            tracing::error!("Payment provider error: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            code: err.code(),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "INVALID_REQUEST",
            message: format!("Failed to parse request body: {err}"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            success: false,
            error: self.message,
            code: self.code.into(),
        };
        (self.status, Json(body)).into_response()
    }
}

fn payments(state: &AppState) -> Result<&Arc<PaymentService>, ApiError> {
    state.payments.as_ref().ok_or_else(|| {
        tracing::warn!("Payment request rejected: STRIPE_API_KEY is not set");
        ApiError::payments_disabled()
    })
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        provider: state.payments.as_ref().map(|p| p.provider_name().to_string()),
        payments_configured: state.payments.is_some(),
    })
}

/// Create a payment intent.
///
/// The body is decoded as JSON whatever the `Content-Type` header says.
pub async fn create_intent(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<CreateIntentResponse>, ApiError> {
    let body: Value = serde_json::from_slice(&body)?;
    let request = IntentRequest::from_json(&body)?;
    let intent = payments(&state)?.create_intent(&request).await?;

    Ok(Json(CreateIntentResponse {
        success: true,
        payment: intent.to_json(),
        payment_intent_id: intent.id,
    }))
}

/// Confirm an intent sitting in `requires_confirmation`
pub async fn confirm_intent(
    State(state): State<AppState>,
    Path(intent_id): Path<String>,
) -> Result<Json<ConfirmIntentResponse>, ApiError> {
    let intent = payments(&state)?.confirm_intent(&intent_id).await?;

    Ok(Json(ConfirmIntentResponse {
        success: true,
        payment_intent_id: intent.id,
        status: intent.status,
        client_secret: intent.client_secret,
    }))
}

/// Capture an intent sitting in `requires_capture`
pub async fn capture_intent(
    State(state): State<AppState>,
    Path(intent_id): Path<String>,
) -> Result<Json<CaptureIntentResponse>, ApiError> {
    let intent = payments(&state)?.capture_intent(&intent_id).await?;

    Ok(Json(CaptureIntentResponse {
        success: true,
        payment_intent_id: intent.id,
        status: intent.status,
    }))
}

/// Refund a `succeeded` intent
pub async fn create_refund(
    State(state): State<AppState>,
    Path(intent_id): Path<String>,
) -> Result<Json<RefundResponse>, ApiError> {
    let refund = payments(&state)?.refund_intent(&intent_id).await?;

    Ok(Json(RefundResponse {
        success: true,
        refund_id: refund.id,
        status: refund.status,
        amount_refunded: refund.amount,
    }))
}

/// List every intent on the account
pub async fn get_intents(
    State(state): State<AppState>,
) -> Result<Json<ListIntentsResponse>, ApiError> {
    let intents = payments(&state)?.list_intents().await?;

    Ok(Json(ListIntentsResponse {
        success: true,
        payment_intents: intents.into_iter().map(IntentSummary::from).collect(),
    }))
}
