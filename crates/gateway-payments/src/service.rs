//! Intent Lifecycle Service
//!
//! Confirm, capture and refund all follow the same shape: fetch the intent,
//! check its status against the stage the transition needs, then ask the
//! provider to move it. The check only gives callers a clearer error. The
//! provider can still change state between the fetch and the transition, and
//! no lock on this side could prevent that since the provider owns the state.

use std::sync::Arc;

use crate::error::{PaymentError, Result};
use crate::intent::{IntentRequest, LifecycleStage, PaymentIntent, Refund};
use crate::provider::PaymentProvider;

/// Lifecycle transitions that carry a precondition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Confirm,
    Capture,
    Refund,
}

impl Transition {
    /// Stage the intent must be in before the transition
    pub fn required_stage(self) -> LifecycleStage {
        match self {
            Transition::Confirm => LifecycleStage::RequiresConfirmation,
            Transition::Capture => LifecycleStage::RequiresCapture,
            Transition::Refund => LifecycleStage::Succeeded,
        }
    }

    fn past_tense(self) -> &'static str {
        match self {
            Transition::Confirm => "confirmed",
            Transition::Capture => "captured",
            Transition::Refund => "refunded",
        }
    }
}

/// Payment operations exposed to the HTTP layer
#[derive(Clone)]
pub struct PaymentService {
    provider: Arc<dyn PaymentProvider>,
}

impl PaymentService {
    pub fn new(provider: Arc<dyn PaymentProvider>) -> Self {
        Self { provider }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub async fn create_intent(&self, request: &IntentRequest) -> Result<PaymentIntent> {
        let intent = self.provider.create_intent(request).await?;
        tracing::info!(
            intent_id = %intent.id,
            amount = intent.amount,
            currency = %intent.currency,
            "Created payment intent"
        );
        Ok(intent)
    }

    pub async fn confirm_intent(&self, intent_id: &str) -> Result<PaymentIntent> {
        let intent = self.ensure_stage(intent_id, Transition::Confirm).await?;
        let confirmed = self.provider.confirm_intent(&intent.id).await?;
        tracing::info!(intent_id = %confirmed.id, status = %confirmed.status, "Confirmed payment intent");
        Ok(confirmed)
    }

    pub async fn capture_intent(&self, intent_id: &str) -> Result<PaymentIntent> {
        let intent = self.ensure_stage(intent_id, Transition::Capture).await?;
        let captured = self.provider.capture_intent(&intent.id).await?;
        tracing::info!(intent_id = %captured.id, status = %captured.status, "Captured payment intent");
        Ok(captured)
    }

    pub async fn refund_intent(&self, intent_id: &str) -> Result<Refund> {
        let intent = self.ensure_stage(intent_id, Transition::Refund).await?;
        let refund = self.provider.create_refund(&intent.id).await?;
        tracing::info!(
            intent_id = %intent.id,
            refund_id = %refund.id,
            amount = refund.amount,
            "Refunded payment intent"
        );
        Ok(refund)
    }

    pub async fn list_intents(&self) -> Result<Vec<PaymentIntent>> {
        self.provider.list_intents().await
    }

    /// Fetch an intent and reject it unless it sits in the transition's stage
    async fn ensure_stage(&self, intent_id: &str, transition: Transition) -> Result<PaymentIntent> {
        let intent_id = intent_id.trim();
        if intent_id.is_empty() {
            return Err(PaymentError::Validation("Missing payment intent id".into()));
        }

        let intent = self.provider.retrieve_intent(intent_id).await?;
        let required = transition.required_stage();

        if !intent.is_in(required) {
            tracing::warn!(
                intent_id = %intent.id,
                status = %intent.status,
                required = %required,
                "Payment intent in wrong stage"
            );
            return Err(PaymentError::InvalidState {
                action: transition.past_tense(),
                expected: required.as_str(),
                actual: intent.status,
            });
        }

        Ok(intent)
    }
}
