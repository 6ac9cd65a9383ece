//! Payment Intent Types
//!
//! Request-scoped views of provider objects. Nothing here is persisted.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PaymentError, Result};

/// Validated body of a create-intent request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntentRequest {
    /// Amount in minor currency units (cents for USD)
    pub amount: i64,

    /// Lowercase ISO 4217 code
    pub currency: String,
}

impl IntentRequest {
    pub fn new(amount: i64, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into().to_lowercase(),
        }
    }

    /// Validate an inbound JSON body.
    ///
    /// `amount` must be a positive whole number; `1000.0` is accepted the same
    /// as `1000`. `currency` must be a non-empty string.
    pub fn from_json(body: &Value) -> Result<Self> {
        let amount = body
            .get("amount")
            .and_then(whole_number)
            .ok_or_else(|| PaymentError::Validation("Missing or invalid 'amount' parameter".into()))?;

        if amount <= 0 {
            return Err(PaymentError::Validation(
                "Missing or invalid 'amount' parameter".into(),
            ));
        }

        let currency = body
            .get("currency")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| PaymentError::Validation("Missing or invalid 'currency' parameter".into()))?;

        Ok(Self::new(amount, currency))
    }
}

#[allow(clippy::cast_possible_truncation)]
fn whole_number(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    (f.fract() == 0.0 && f.abs() < 9.0e15).then_some(f as i64)
}

/// Lifecycle stages that gate the next transition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleStage {
    RequiresConfirmation,
    RequiresCapture,
    Succeeded,
}

impl LifecycleStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleStage::RequiresConfirmation => "requires_confirmation",
            LifecycleStage::RequiresCapture => "requires_capture",
            LifecycleStage::Succeeded => "succeeded",
        }
    }
}

impl std::fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment intent as reported by the provider
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    /// Unix seconds
    pub created: i64,
    #[serde(default)]
    pub client_secret: Option<String>,

    /// Full provider object, relayed verbatim on create
    #[serde(skip)]
    pub provider_object: Option<Value>,
}

impl PaymentIntent {
    /// Build from a provider object, keeping the original JSON around
    pub fn from_provider_json(object: Value) -> Result<Self> {
        let mut intent: PaymentIntent = serde_json::from_value(object.clone())?;
        intent.provider_object = Some(object);
        Ok(intent)
    }

    pub fn is_in(&self, stage: LifecycleStage) -> bool {
        self.status == stage.as_str()
    }

    /// JSON for the `payment` field of a create response
    pub fn to_json(&self) -> Value {
        match &self.provider_object {
            Some(object) => object.clone(),
            None => serde_json::to_value(self).unwrap_or(Value::Null),
        }
    }
}

/// Refund as reported by the provider
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Refund {
    pub id: String,
    pub amount: i64,
    #[serde(default)]
    pub status: Option<String>,
}

/// Capture behaviour requested for newly created intents
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    #[default]
    Automatic,
    Manual,
}

impl CaptureMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureMode::Automatic => "automatic",
            CaptureMode::Manual => "manual",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "automatic" => Ok(CaptureMode::Automatic),
            "manual" => Ok(CaptureMode::Manual),
            other => Err(PaymentError::Config(format!(
                "unknown capture method '{other}' (expected 'automatic' or 'manual')"
            ))),
        }
    }
}
