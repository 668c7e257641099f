use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::load::LoadId;
use crate::negotiation::session::SessionStatus;

/// Failure surface of the negotiation workflow.
///
/// Everything except `RepositoryUnavailable` is terminal for the current
/// request and must not be retried by the caller; `RepositoryUnavailable` is
/// transient and safe to retry because no partial state has been committed.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum NegotiationError {
    #[error("listed rate {listed_rate} and carrier offer {carrier_offer} must both be positive")]
    InvalidInput { listed_rate: Decimal, carrier_offer: Decimal },
    #[error("load {0} was not found")]
    LoadNotFound(LoadId),
    #[error("load {0} is already booked")]
    LoadAlreadyBooked(LoadId),
    #[error("negotiation for load {load_id} is closed with status {status}")]
    NegotiationClosed { load_id: LoadId, status: SessionStatus },
    #[error("load repository unavailable: {0}")]
    RepositoryUnavailable(String),
}

impl NegotiationError {
    /// Whether the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RepositoryUnavailable(_))
    }
}

/// Error surface of the persistence ports consumed by the engine. Concrete
/// repositories map their driver errors into these variants.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for NegotiationError {
    fn from(value: RepositoryError) -> Self {
        Self::RepositoryUnavailable(value.to_string())
    }
}
