use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum RateSourceError {
    #[error("FX request failed: {0}")]
    Network(String),
    #[error("FX response was unusable: {0}")]
    Payload(String),
}

/// An external source of USD exchange rates. Implementations must return a strictly positive quote; a missing
/// or non-positive rate is a [`RateSourceError::Payload`] failure, never `Ok(0.0)`.
#[allow(async_fn_in_trait)]
pub trait RateSource: Clone {
    /// The current USD → `currency` rate.
    async fn usd_rate(&self, currency: &str) -> Result<f64, RateSourceError>;
}
