//! Server Configuration

use std::sync::Arc;

use thiserror::Error;

use gateway_payments::{
    CaptureMode, MockProvider, PaymentError, PaymentProvider, StripeProvider, StripeSettings,
};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unknown PAYMENT_PROVIDER '{0}' (expected 'stripe' or 'mock')")]
    UnknownProvider(String),

    #[error(transparent)]
    Payments(#[from] PaymentError),
}

/// Which payment provider backs the API
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProviderKind {
    #[default]
    Stripe,
    Mock,
}

impl ProviderKind {
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.trim().to_lowercase().as_str() {
            "stripe" => Ok(ProviderKind::Stripe),
            "mock" => Ok(ProviderKind::Mock),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

/// Process-level settings
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub provider: ProviderKind,
    pub log_filter: String,
}

impl ServerConfig {
    /// Load from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let provider = match lookup("PAYMENT_PROVIDER") {
            Some(raw) => ProviderKind::parse(&raw)?,
            None => ProviderKind::default(),
        };

        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
            provider,
            log_filter: lookup("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.into()),
        })
    }

    /// Build the configured provider.
    ///
    /// A missing Stripe key is not fatal: it yields `Ok(None)` and the server
    /// runs with payments disabled. An invalid setting is still an error.
    pub fn build_provider(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Option<Arc<dyn PaymentProvider>>, ConfigError> {
        match self.provider {
            ProviderKind::Mock => {
                let capture_mode = match lookup("STRIPE_CAPTURE_METHOD") {
                    Some(raw) => CaptureMode::parse(&raw)?,
                    None => CaptureMode::default(),
                };
                let provider: Arc<dyn PaymentProvider> =
                    Arc::new(MockProvider::with_capture_mode(capture_mode));
                Ok(Some(provider))
            }
            ProviderKind::Stripe => match StripeSettings::from_lookup(lookup) {
                Ok(settings) => {
                    let provider: Arc<dyn PaymentProvider> = Arc::new(StripeProvider::new(&settings)?);
                    Ok(Some(provider))
                }
                Err(PaymentError::MissingCredential(_)) => Ok(None),
                Err(e) => Err(e.into()),
            },
        }
    }
}
