//! Router

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{
    capture_intent, confirm_intent, create_intent, create_refund, get_intents, health_check,
};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/create_intent", post(create_intent))
        .route("/api/v1/confirm_payment_intent/{id}", post(confirm_intent))
        .route("/api/v1/capture_intent/{id}", post(capture_intent))
        .route("/api/v1/create_refund/{id}", post(create_refund))
        .route("/api/v1/get_intents", get(get_intents))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
