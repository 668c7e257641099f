pub mod config;
pub mod domain;
pub mod errors;
pub mod metrics;
pub mod negotiation;

pub use domain::call_log::{CallLogEntry, CallLogId, NewCallLog};
pub use domain::load::{Load, LoadId};
pub use errors::{NegotiationError, RepositoryError};
pub use metrics::{summarize, CallMetricsSummary};
pub use negotiation::engine::{
    BookingResult, CallLogSink, CallOutcome, CallOutcomeNotice, LoadRepository, NegotiationEngine,
    NegotiationOutcome,
};
pub use negotiation::policy::{decide, Action, PolicyConfig};
pub use negotiation::session::{NegotiationSession, SessionStatus};
pub use negotiation::store::{InMemorySessionStore, SessionStore};
