//! Stripe Payment Intents Integration
//!
//! Implements [`PaymentProvider`] on top of the `async-stripe` client.

use std::str::FromStr;

use async_trait::async_trait;
use serde::Serialize;
use stripe::{
    CapturePaymentIntent, Client, CreatePaymentIntent, CreateRefund, Currency,
    ListPaymentIntents, PaymentIntent as StripePaymentIntent, PaymentIntentCaptureMethod,
    PaymentIntentConfirmParams, PaymentIntentId, PaymentMethodId, Refund as StripeRefund,
};

use crate::error::{PaymentError, Result};
use crate::intent::{CaptureMode, IntentRequest, PaymentIntent, Refund};
use crate::provider::PaymentProvider;

/// Default payment-method placeholder (Stripe's test Visa card)
pub const DEFAULT_PAYMENT_METHOD: &str = "pm_card_visa";

const PAGE_SIZE: u64 = 100;

/// Stripe connection settings
#[derive(Clone, Debug)]
pub struct StripeSettings {
    pub api_key: String,
    pub payment_method: String,
    pub capture_mode: CaptureMode,
    /// Alternate API root (stripe-mock, a local stub); defaults to api.stripe.com
    pub api_base: Option<String>,
}

impl StripeSettings {
    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup("STRIPE_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or(PaymentError::MissingCredential("STRIPE_API_KEY"))?;

        let payment_method = lookup("STRIPE_PAYMENT_METHOD")
            .filter(|pm| !pm.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.into());

        let capture_mode = match lookup("STRIPE_CAPTURE_METHOD") {
            Some(raw) => CaptureMode::parse(&raw)?,
            None => CaptureMode::default(),
        };

        let api_base = match lookup("STRIPE_API_BASE").filter(|b| !b.trim().is_empty()) {
            Some(base) if is_http_url(&base) => Some(base),
            Some(base) => {
                return Err(PaymentError::Config(format!(
                    "invalid STRIPE_API_BASE '{base}' (expected an http(s) URL)"
                )));
            }
            None => None,
        };

        Ok(Self {
            api_key,
            payment_method,
            capture_mode,
            api_base,
        })
    }
}

fn is_http_url(base: &str) -> bool {
    let host = base
        .strip_prefix("http://")
        .or_else(|| base.strip_prefix("https://"))
        .unwrap_or_default();
    !host.is_empty() && !host.starts_with('/') && !host.contains(char::is_whitespace)
}

/// Stripe client wrapper
pub struct StripeProvider {
    client: Client,
    payment_method: PaymentMethodId,
    capture_mode: CaptureMode,
}

impl StripeProvider {
    /// Create a new Stripe provider
    pub fn new(settings: &StripeSettings) -> Result<Self> {
        let payment_method = PaymentMethodId::from_str(&settings.payment_method)
            .map_err(|e| PaymentError::Config(format!("invalid STRIPE_PAYMENT_METHOD: {e}")))?;

        let client = match &settings.api_base {
            Some(base) => Client::from_url(base.as_str(), settings.api_key.clone()),
            None => Client::new(settings.api_key.clone()),
        };

        Ok(Self {
            client,
            payment_method,
            capture_mode: settings.capture_mode,
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(&StripeSettings::from_env()?)
    }

    fn parse_intent_id(intent_id: &str, action: &'static str) -> Result<PaymentIntentId> {
        PaymentIntentId::from_str(intent_id).map_err(|e| PaymentError::provider(action, e))
    }
}

/// Map any Stripe object onto our own view of it via its JSON form
fn to_intent(intent: &StripePaymentIntent) -> Result<PaymentIntent> {
    PaymentIntent::from_provider_json(serde_json::to_value(intent)?)
}

fn to_domain<T: Serialize, D: serde::de::DeserializeOwned>(object: &T) -> Result<D> {
    Ok(serde_json::from_value(serde_json::to_value(object)?)?)
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    async fn create_intent(&self, request: &IntentRequest) -> Result<PaymentIntent> {
        const ACTION: &str = "create PaymentIntent";

        let currency = Currency::from_str(&request.currency).map_err(|_| {
            PaymentError::Validation(format!("Unsupported currency '{}'", request.currency))
        })?;

        let mut params = CreatePaymentIntent::new(request.amount, currency);
        params.payment_method = Some(self.payment_method.clone());
        if self.capture_mode == CaptureMode::Manual {
            params.capture_method = Some(PaymentIntentCaptureMethod::Manual);
        }

        let intent = StripePaymentIntent::create(&self.client, params)
            .await
            .map_err(|e| PaymentError::provider(ACTION, e))?;

        to_intent(&intent)
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent> {
        const ACTION: &str = "retrieve PaymentIntent";

        let id = Self::parse_intent_id(intent_id, ACTION)?;
        let intent = StripePaymentIntent::retrieve(&self.client, &id, &[])
            .await
            .map_err(|e| PaymentError::provider(ACTION, e))?;

        to_intent(&intent)
    }

    async fn confirm_intent(&self, intent_id: &str) -> Result<PaymentIntent> {
        let intent = StripePaymentIntent::confirm(
            &self.client,
            intent_id,
            PaymentIntentConfirmParams::default(),
        )
        .await
        .map_err(|e| PaymentError::provider("confirm PaymentIntent", e))?;

        to_intent(&intent)
    }

    async fn capture_intent(&self, intent_id: &str) -> Result<PaymentIntent> {
        let intent = StripePaymentIntent::capture(
            &self.client,
            intent_id,
            CapturePaymentIntent::default(),
        )
        .await
        .map_err(|e| PaymentError::provider("capture PaymentIntent", e))?;

        to_intent(&intent)
    }

    async fn create_refund(&self, intent_id: &str) -> Result<Refund> {
        const ACTION: &str = "create refund";

        let mut params = CreateRefund::new();
        params.payment_intent = Some(Self::parse_intent_id(intent_id, ACTION)?);

        let refund = StripeRefund::create(&self.client, params)
            .await
            .map_err(|e| PaymentError::provider(ACTION, e))?;

        to_domain(&refund)
    }

    async fn list_intents(&self) -> Result<Vec<PaymentIntent>> {
        const ACTION: &str = "list PaymentIntents";

        let mut intents = Vec::new();
        let mut starting_after: Option<PaymentIntentId> = None;

        loop {
            let mut params = ListPaymentIntents::new();
            params.limit = Some(PAGE_SIZE);
            params.starting_after = starting_after.take();

            let page = StripePaymentIntent::list(&self.client, &params)
                .await
                .map_err(|e| PaymentError::provider(ACTION, e))?;

            starting_after = page.data.last().map(|intent| intent.id.clone());
            for intent in &page.data {
                intents.push(to_intent(intent)?);
            }

            if !page.has_more || starting_after.is_none() {
                break;
            }
        }

        tracing::debug!(count = intents.len(), "Listed Stripe payment intents");
        Ok(intents)
    }

    fn name(&self) -> &str {
        "stripe"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_settings_require_api_key() {
        let err = StripeSettings::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, PaymentError::MissingCredential("STRIPE_API_KEY")));

        let err = StripeSettings::from_lookup(lookup(&[("STRIPE_API_KEY", "")])).unwrap_err();
        assert_eq!(err.to_string(), "STRIPE_API_KEY not set");
    }

    #[test]
    fn test_settings_defaults() {
        let settings = StripeSettings::from_lookup(lookup(&[("STRIPE_API_KEY", "sk_test_xxx")])).unwrap();
        assert_eq!(settings.api_key, "sk_test_xxx");
        assert_eq!(settings.payment_method, DEFAULT_PAYMENT_METHOD);
        assert_eq!(settings.capture_mode, CaptureMode::Automatic);
    }

    #[test]
    fn test_settings_overrides() {
        let settings = StripeSettings::from_lookup(lookup(&[
            ("STRIPE_API_KEY", "sk_test_xxx"),
            ("STRIPE_PAYMENT_METHOD", "pm_card_mastercard"),
            ("STRIPE_CAPTURE_METHOD", "manual"),
        ]))
        .unwrap();
        assert_eq!(settings.payment_method, "pm_card_mastercard");
        assert_eq!(settings.capture_mode, CaptureMode::Manual);

        let err = StripeSettings::from_lookup(lookup(&[
            ("STRIPE_API_KEY", "sk_test_xxx"),
            ("STRIPE_CAPTURE_METHOD", "eventually"),
        ]))
        .unwrap_err();
        assert!(matches!(err, PaymentError::Config(_)));
    }

    #[test]
    fn test_settings_api_base() {
        let settings = StripeSettings::from_lookup(lookup(&[
            ("STRIPE_API_KEY", "sk_test_xxx"),
            ("STRIPE_API_BASE", "http://localhost:12111/"),
        ]))
        .unwrap();
        assert_eq!(settings.api_base.as_deref(), Some("http://localhost:12111/"));

        for bad in ["localhost:12111", "http://", "https:///v1"] {
            let err = StripeSettings::from_lookup(lookup(&[
                ("STRIPE_API_KEY", "sk_test_xxx"),
                ("STRIPE_API_BASE", bad),
            ]))
            .unwrap_err();
            assert!(matches!(err, PaymentError::Config(_)), "{bad}");
        }
    }

    #[tokio::test]
    async fn test_provider_construction() {
        let settings = StripeSettings::from_lookup(lookup(&[("STRIPE_API_KEY", "sk_test_xxx")])).unwrap();
        let provider = StripeProvider::new(&settings).unwrap();
        assert_eq!(provider.name(), "stripe");
    }

    mod stub {
        //! Minimal Stripe API stand-in served over loopback

        use std::collections::HashMap;
        use std::sync::{Arc, Mutex};

        use axum::{
            extract::{Query, State},
            routing::{get, post},
            Json, Router,
        };
        use serde_json::{json, Value};

        #[derive(Clone, Default)]
        pub struct Recorded {
            pub list_queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
            pub form_bodies: Arc<Mutex<Vec<String>>>,
        }

        pub fn payment_intent(id: &str, status: &str) -> Value {
            json!({
                "id": id,
                "object": "payment_intent",
                "amount": 1000,
                "amount_capturable": 0,
                "amount_received": 0,
                "capture_method": "manual",
                "client_secret": format!("{id}_secret_test"),
                "confirmation_method": "automatic",
                "created": 1_700_000_000,
                "currency": "usd",
                "livemode": false,
                "metadata": {},
                "payment_method_types": ["card"],
                "status": status,
            })
        }

        /// Two pages: `pi_1, pi_2` (more to come), then `pi_3`
        async fn list_intents(
            State(recorded): State<Recorded>,
            Query(query): Query<HashMap<String, String>>,
        ) -> Json<Value> {
            let (ids, has_more) = match query.get("starting_after") {
                None => (vec!["pi_1", "pi_2"], true),
                Some(_) => (vec!["pi_3"], false),
            };
            recorded.list_queries.lock().unwrap().push(query);

            let data: Vec<Value> = ids.iter().map(|id| payment_intent(id, "succeeded")).collect();
            Json(json!({
                "object": "list",
                "url": "/v1/payment_intents",
                "has_more": has_more,
                "data": data,
            }))
        }

        async fn create_intent(State(recorded): State<Recorded>, body: String) -> Json<Value> {
            recorded.form_bodies.lock().unwrap().push(body);
            Json(payment_intent("pi_new", "requires_confirmation"))
        }

        async fn create_refund(State(recorded): State<Recorded>, body: String) -> Json<Value> {
            recorded.form_bodies.lock().unwrap().push(body);
            Json(json!({
                "id": "re_1",
                "object": "refund",
                "amount": 1000,
                "created": 1_700_000_100,
                "currency": "usd",
                "payment_intent": "pi_1",
                "status": "succeeded",
            }))
        }

        /// Serve the stub and return its base URL
        pub async fn spawn(recorded: Recorded) -> String {
            let app = Router::new()
                .route("/v1/payment_intents", get(list_intents).post(create_intent))
                .route("/v1/refunds", post(create_refund))
                .with_state(recorded);

            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });
            format!("http://{addr}/")
        }
    }

    async fn stub_provider(capture: &str) -> (stub::Recorded, StripeProvider) {
        let recorded = stub::Recorded::default();
        let base = stub::spawn(recorded.clone()).await;
        let settings = StripeSettings::from_lookup(lookup(&[
            ("STRIPE_API_KEY", "sk_test_xxx"),
            ("STRIPE_API_BASE", &base),
            ("STRIPE_CAPTURE_METHOD", capture),
        ]))
        .unwrap();
        (recorded, StripeProvider::new(&settings).unwrap())
    }

    #[tokio::test]
    async fn test_list_drains_every_page() {
        let (recorded, provider) = stub_provider("automatic").await;

        let intents = provider.list_intents().await.unwrap();
        let ids: Vec<&str> = intents.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["pi_1", "pi_2", "pi_3"]);
        assert_eq!(intents[2].status, "succeeded");
        assert_eq!(intents[2].client_secret.as_deref(), Some("pi_3_secret_test"));

        let queries = recorded.list_queries.lock().unwrap();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].get("limit").map(String::as_str), Some("100"));
        assert_eq!(queries[0].get("starting_after"), None);
        assert_eq!(queries[1].get("starting_after").map(String::as_str), Some("pi_2"));
    }

    #[tokio::test]
    async fn test_create_sends_payment_method_and_capture_mode() {
        let (recorded, provider) = stub_provider("manual").await;

        let intent = provider
            .create_intent(&IntentRequest::new(1000, "usd"))
            .await
            .unwrap();
        assert_eq!(intent.id, "pi_new");
        assert_eq!(intent.status, "requires_confirmation");
        assert_eq!(intent.amount, 1000);
        assert_eq!(intent.to_json()["id"], "pi_new");
        assert_eq!(intent.to_json()["capture_method"], "manual");

        let bodies = recorded.form_bodies.lock().unwrap();
        let form = &bodies[0];
        for field in ["amount=1000", "currency=usd", "payment_method=pm_card_visa", "capture_method=manual"] {
            assert!(form.contains(field), "{field} missing from {form}");
        }
    }

    #[tokio::test]
    async fn test_automatic_capture_omits_capture_method() {
        let (recorded, provider) = stub_provider("automatic").await;
        provider.create_intent(&IntentRequest::new(1000, "usd")).await.unwrap();

        let bodies = recorded.form_bodies.lock().unwrap();
        assert!(!bodies[0].contains("capture_method"));
    }

    #[tokio::test]
    async fn test_refund_maps_provider_object() {
        let (recorded, provider) = stub_provider("automatic").await;

        let refund = provider.create_refund("pi_1").await.unwrap();
        assert_eq!(refund.id, "re_1");
        assert_eq!(refund.amount, 1000);
        assert_eq!(refund.status.as_deref(), Some("succeeded"));

        let bodies = recorded.form_bodies.lock().unwrap();
        assert!(bodies[0].contains("payment_intent=pi_1"));
    }
}
