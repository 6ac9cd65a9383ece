//! Payment Provider Strategy Pattern
//!
//! Every call the gateway makes to the payment provider goes through
//! [`PaymentProvider`], so handler logic can run against [`crate::MockProvider`]
//! without network access.

use async_trait::async_trait;

use crate::error::Result;
use crate::intent::{IntentRequest, PaymentIntent, Refund};

/// Payment provider client (Strategy pattern)
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a new intent with the configured payment method attached
    async fn create_intent(&self, request: &IntentRequest) -> Result<PaymentIntent>;

    /// Fetch the current state of an intent
    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent>;

    async fn confirm_intent(&self, intent_id: &str) -> Result<PaymentIntent>;

    async fn capture_intent(&self, intent_id: &str) -> Result<PaymentIntent>;

    /// Refund the full captured amount of an intent
    async fn create_refund(&self, intent_id: &str) -> Result<Refund>;

    /// Every intent visible to the account, all pages drained
    async fn list_intents(&self) -> Result<Vec<PaymentIntent>>;

    /// Provider name
    fn name(&self) -> &str;
}
