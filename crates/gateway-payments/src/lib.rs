//! # gateway-payments
//!
//! Payment intent lifecycle for intent-gateway.
//!
//! The provider owns every intent and its state. This crate only forwards
//! calls and checks the reported status before each lifecycle step:
//!
//! ```text
//! ┌────────┐   ┌───────────────────────┐   ┌──────────────────┐   ┌───────────┐   ┌────────┐
//! │ create │──▶│ requires_confirmation │──▶│ requires_capture │──▶│ succeeded │──▶│ refund │
//! └────────┘   └───────────────────────┘   └──────────────────┘   └───────────┘   └────────┘
//!                       confirm                   capture
//! ```
//!
//! With automatic capture (Stripe's default) confirm goes straight to
//! `succeeded`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use gateway_payments::{IntentRequest, PaymentService, StripeProvider};
//!
//! let service = PaymentService::new(Arc::new(StripeProvider::from_env()?));
//!
//! let intent = service.create_intent(&IntentRequest::new(1000, "usd")).await?;
//! let confirmed = service.confirm_intent(&intent.id).await?;
//! ```

mod error;
mod intent;
mod mock;
mod provider;
mod service;
mod stripe_provider;

pub use error::{PaymentError, Result};
pub use intent::{CaptureMode, IntentRequest, LifecycleStage, PaymentIntent, Refund};
pub use mock::MockProvider;
pub use provider::PaymentProvider;
pub use service::{PaymentService, Transition};
pub use stripe_provider::{StripeProvider, StripeSettings, DEFAULT_PAYMENT_METHOD};
