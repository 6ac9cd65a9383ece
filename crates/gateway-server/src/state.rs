//! Application State

use std::sync::Arc;

use gateway_payments::PaymentService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Payment service (optional - None if no provider credential is configured)
    pub payments: Option<Arc<PaymentService>>,
}

impl AppState {
    pub fn new(payments: Option<PaymentService>) -> Self {
        Self {
            payments: payments.map(Arc::new),
        }
    }
}
