//! Mock Payment Provider
//!
//! In-memory stand-in for Stripe, used by tests and the `mock` provider mode.
//! Follows Stripe's intent lifecycle for a card that never needs 3DS:
//!
//! ```text
//! create ──▶ requires_confirmation ──confirm──▶ succeeded            (automatic)
//!                                   └─confirm──▶ requires_capture ──capture──▶ succeeded (manual)
//! ```

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use crate::error::{PaymentError, Result};
use crate::intent::{CaptureMode, IntentRequest, LifecycleStage, PaymentIntent, Refund};
use crate::provider::PaymentProvider;

/// Mock provider holding intents in memory.
///
/// For tests and local development only: nothing is persisted and the store
/// is unbounded, so every created intent and refund lives until the process
/// exits.
pub struct MockProvider {
    capture_mode: CaptureMode,
    intents: RwLock<HashMap<String, PaymentIntent>>,
    /// Issued refunds keyed by intent id
    refunds: RwLock<Vec<(String, Refund)>>,
    /// When set, every call fails with this provider message
    failure: RwLock<Option<String>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    pub fn new() -> Self {
        Self::with_capture_mode(CaptureMode::Automatic)
    }

    /// Create with a capture mode applied to new intents
    pub fn with_capture_mode(capture_mode: CaptureMode) -> Self {
        Self {
            capture_mode,
            intents: RwLock::new(HashMap::new()),
            refunds: RwLock::new(Vec::new()),
            failure: RwLock::new(None),
        }
    }

    /// Make every subsequent call fail as if the provider rejected it
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.write().unwrap() = Some(message.into());
    }

    pub fn clear_failure(&self) {
        *self.failure.write().unwrap() = None;
    }

    /// Change an intent's status out-of-band, as a dashboard action would
    pub fn set_status(&self, intent_id: &str, status: &str) -> Result<()> {
        let mut intents = self.intents.write().unwrap();
        let intent = intents
            .get_mut(intent_id)
            .ok_or_else(|| no_such_intent("update PaymentIntent", intent_id))?;
        intent.status = status.to_string();
        intent.provider_object = Some(provider_object(intent));
        Ok(())
    }

    /// Refunds issued so far
    pub fn refunds(&self) -> Vec<Refund> {
        self.refunds
            .read()
            .unwrap()
            .iter()
            .map(|(_, refund)| refund.clone())
            .collect()
    }

    fn check_failure(&self, action: &'static str) -> Result<()> {
        match self.failure.read().unwrap().as_ref() {
            Some(message) => Err(PaymentError::provider(action, message)),
            None => Ok(()),
        }
    }

    /// Move an intent from `from` to `to`, mirroring the provider's own check
    fn transition(
        &self,
        action: &'static str,
        intent_id: &str,
        from: LifecycleStage,
        to: &str,
    ) -> Result<PaymentIntent> {
        self.check_failure(action)?;

        let mut intents = self.intents.write().unwrap();
        let intent = intents
            .get_mut(intent_id)
            .ok_or_else(|| no_such_intent(action, intent_id))?;

        if !intent.is_in(from) {
            return Err(PaymentError::provider(
                action,
                format!(
                    "This PaymentIntent's status is {}, expected {}",
                    intent.status, from
                ),
            ));
        }

        intent.status = to.to_string();
        intent.provider_object = Some(provider_object(intent));
        Ok(intent.clone())
    }
}

fn no_such_intent(action: &'static str, intent_id: &str) -> PaymentError {
    PaymentError::provider(action, format!("No such payment_intent: '{intent_id}'"))
}

/// Stripe-shaped JSON for an intent
fn provider_object(intent: &PaymentIntent) -> serde_json::Value {
    json!({
        "id": intent.id,
        "object": "payment_intent",
        "amount": intent.amount,
        "currency": intent.currency,
        "status": intent.status,
        "created": intent.created,
        "client_secret": intent.client_secret,
        "livemode": false,
    })
}

#[async_trait]
impl PaymentProvider for MockProvider {
    async fn create_intent(&self, request: &IntentRequest) -> Result<PaymentIntent> {
        self.check_failure("create PaymentIntent")?;

        let id = format!("pi_{}", uuid::Uuid::new_v4().simple());
        let mut intent = PaymentIntent {
            client_secret: Some(format!("{id}_secret_{}", uuid::Uuid::new_v4().simple())),
            id,
            amount: request.amount,
            currency: request.currency.clone(),
            status: LifecycleStage::RequiresConfirmation.as_str().to_string(),
            created: Utc::now().timestamp(),
            provider_object: None,
        };
        intent.provider_object = Some(provider_object(&intent));

        self.intents
            .write()
            .unwrap()
            .insert(intent.id.clone(), intent.clone());

        Ok(intent)
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent> {
        const ACTION: &str = "retrieve PaymentIntent";
        self.check_failure(ACTION)?;

        self.intents
            .read()
            .unwrap()
            .get(intent_id)
            .cloned()
            .ok_or_else(|| no_such_intent(ACTION, intent_id))
    }

    async fn confirm_intent(&self, intent_id: &str) -> Result<PaymentIntent> {
        let next = match self.capture_mode {
            CaptureMode::Automatic => LifecycleStage::Succeeded,
            CaptureMode::Manual => LifecycleStage::RequiresCapture,
        };
        self.transition(
            "confirm PaymentIntent",
            intent_id,
            LifecycleStage::RequiresConfirmation,
            next.as_str(),
        )
    }

    async fn capture_intent(&self, intent_id: &str) -> Result<PaymentIntent> {
        self.transition(
            "capture PaymentIntent",
            intent_id,
            LifecycleStage::RequiresCapture,
            LifecycleStage::Succeeded.as_str(),
        )
    }

    async fn create_refund(&self, intent_id: &str) -> Result<Refund> {
        const ACTION: &str = "create refund";
        self.check_failure(ACTION)?;

        let amount = {
            let intents = self.intents.read().unwrap();
            let intent = intents
                .get(intent_id)
                .ok_or_else(|| no_such_intent(ACTION, intent_id))?;
            if !intent.is_in(LifecycleStage::Succeeded) {
                return Err(PaymentError::provider(
                    ACTION,
                    format!("PaymentIntent {intent_id} has not been captured"),
                ));
            }
            intent.amount
        };

        let mut refunds = self.refunds.write().unwrap();
        let already_refunded: i64 = refunds
            .iter()
            .filter(|(refunded_intent, _)| refunded_intent == intent_id)
            .map(|(_, refund)| refund.amount)
            .sum();
        if already_refunded >= amount {
            return Err(PaymentError::provider(
                ACTION,
                format!("Charge for {intent_id} has already been refunded."),
            ));
        }

        let refund = Refund {
            id: format!("re_{}", uuid::Uuid::new_v4().simple()),
            amount: amount - already_refunded,
            status: Some("succeeded".into()),
        };
        refunds.push((intent_id.to_string(), refund.clone()));

        Ok(refund)
    }

    async fn list_intents(&self) -> Result<Vec<PaymentIntent>> {
        self.check_failure("list PaymentIntents")?;

        let mut intents: Vec<PaymentIntent> =
            self.intents.read().unwrap().values().cloned().collect();
        // Newest first, like the real listing
        intents.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| a.id.cmp(&b.id)));
        Ok(intents)
    }

    fn name(&self) -> &str {
        "mock"
    }
}
