use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::domain::load::{Load, LoadId};
use crate::errors::{NegotiationError, RepositoryError};
use crate::negotiation::policy::{decide, Action, PolicyConfig};
use crate::negotiation::session::SessionStatus;
use crate::negotiation::store::SessionStore;

/// Persistence port for load rows. The conditional booking update is the sole
/// mechanism preventing double-booking; sessions only optimize away the race.
#[async_trait]
pub trait LoadRepository: Send + Sync {
    async fn get(&self, load_id: &LoadId) -> Result<Option<Load>, RepositoryError>;

    /// Compare-and-set booking: set `booked = true` and the agreed rate only
    /// where the stored row still has `booked = false`.
    async fn conditional_book(
        &self,
        load_id: &LoadId,
        agreed_rate: Decimal,
    ) -> Result<BookingResult, RepositoryError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BookingResult {
    Committed,
    AlreadyBooked,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallOutcome {
    Accepted,
    Rejected,
}

impl CallOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

/// What the call-log sink hears once a negotiation reaches a terminal state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallOutcomeNotice {
    pub load_id: LoadId,
    pub outcome: CallOutcome,
    pub round_count: u32,
}

/// Fire-and-forget notification target; failures are logged, never propagated,
/// and never roll back a booking decision.
#[async_trait]
pub trait CallLogSink: Send + Sync {
    async fn record(&self, notice: CallOutcomeNotice) -> Result<(), RepositoryError>;
}

/// Caller-visible conclusion of one negotiation step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NegotiationOutcome {
    Accepted { agreed_rate: Decimal, round: u32 },
    Countered { counter_offer: Decimal, round: u32, remaining_rounds: u32 },
    Rejected { round: u32 },
    /// Acceptance lost the commit race to another booking; informational and
    /// terminal, the negotiation is concluded either way.
    AlreadyBooked,
}

/// Drives one load's negotiation: session checkout, policy decision, and the
/// booking commit, with bounded retries around every repository call.
pub struct NegotiationEngine {
    repository: Arc<dyn LoadRepository>,
    sink: Arc<dyn CallLogSink>,
    store: Arc<dyn SessionStore>,
    policy: PolicyConfig,
    repository_attempts: u32,
}

impl NegotiationEngine {
    pub fn new(
        repository: Arc<dyn LoadRepository>,
        sink: Arc<dyn CallLogSink>,
        store: Arc<dyn SessionStore>,
        policy: PolicyConfig,
        repository_attempts: u32,
    ) -> Self {
        Self { repository, sink, store, policy, repository_attempts: repository_attempts.max(1) }
    }

    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    /// Handle one carrier offer for `load_id`.
    ///
    /// Atomic per load: the session cell's lock serializes concurrent calls,
    /// and no session state moves unless the whole step succeeds, so a
    /// `RepositoryUnavailable` failure is safe to retry unchanged.
    pub async fn negotiate(
        &self,
        load_id: &LoadId,
        carrier_offer: Decimal,
    ) -> Result<NegotiationOutcome, NegotiationError> {
        let load = self.fetch_open_load(load_id).await?;

        let cell = self.store.checkout(load_id).await;
        let mut session = cell.lock().await;
        session.ensure_open()?;

        let round = session.round + 1;
        let action = decide(
            &self.policy,
            load.listed_rate,
            carrier_offer,
            round,
            session.last_counter_offer,
        )?;

        match action {
            Action::Counter { counter_offer } => {
                session.record_counter(round, counter_offer);
                info!(
                    event_name = "negotiation.countered",
                    load_id = %load_id,
                    round,
                    carrier_offer = %carrier_offer,
                    counter_offer = %counter_offer,
                    "countered carrier offer"
                );
                Ok(NegotiationOutcome::Countered {
                    counter_offer,
                    round,
                    remaining_rounds: self.policy.max_rounds.saturating_sub(round),
                })
            }
            Action::Reject => {
                session.close(round, SessionStatus::Rejected, None);
                info!(
                    event_name = "negotiation.rejected",
                    load_id = %load_id,
                    round,
                    carrier_offer = %carrier_offer,
                    "round cap reached, negotiation broken off"
                );
                self.notify(load_id, CallOutcome::Rejected, round).await;
                Ok(NegotiationOutcome::Rejected { round })
            }
            Action::Accept { agreed_rate } => {
                // Commit before touching session state so a repository fault
                // leaves the session open and the step retryable.
                match self.commit_acceptance(load_id, agreed_rate).await? {
                    BookingResult::Committed => {
                        session.close(round, SessionStatus::Accepted, Some(carrier_offer));
                        info!(
                            event_name = "negotiation.accepted",
                            load_id = %load_id,
                            round,
                            agreed_rate = %agreed_rate,
                            "offer accepted and load booked"
                        );
                        self.notify(load_id, CallOutcome::Accepted, round).await;
                        Ok(NegotiationOutcome::Accepted { agreed_rate, round })
                    }
                    BookingResult::AlreadyBooked => {
                        session.close(round, SessionStatus::Accepted, Some(carrier_offer));
                        warn!(
                            event_name = "negotiation.lost_booking_race",
                            load_id = %load_id,
                            round,
                            "acceptance lost the booking race"
                        );
                        self.notify(load_id, CallOutcome::Rejected, round).await;
                        Ok(NegotiationOutcome::AlreadyBooked)
                    }
                }
            }
        }
    }

    /// Conditionally book the load, retrying transient repository faults.
    pub async fn commit_acceptance(
        &self,
        load_id: &LoadId,
        agreed_rate: Decimal,
    ) -> Result<BookingResult, NegotiationError> {
        let mut last_error = None;
        for attempt in 1..=self.repository_attempts {
            match self.repository.conditional_book(load_id, agreed_rate).await {
                Ok(result) => return Ok(result),
                Err(error) => {
                    warn!(
                        event_name = "negotiation.commit_retry",
                        load_id = %load_id,
                        attempt,
                        error = %error,
                        "conditional booking attempt failed"
                    );
                    last_error = Some(error);
                }
            }
        }
        Err(last_error.expect("at least one attempt ran").into())
    }

    async fn fetch_open_load(&self, load_id: &LoadId) -> Result<Load, NegotiationError> {
        let mut last_error = None;
        for attempt in 1..=self.repository_attempts {
            match self.repository.get(load_id).await {
                Ok(Some(load)) => {
                    if load.booked {
                        return Err(NegotiationError::LoadAlreadyBooked(load_id.clone()));
                    }
                    return Ok(load);
                }
                Ok(None) => return Err(NegotiationError::LoadNotFound(load_id.clone())),
                Err(error) => {
                    warn!(
                        event_name = "negotiation.lookup_retry",
                        load_id = %load_id,
                        attempt,
                        error = %error,
                        "load lookup attempt failed"
                    );
                    last_error = Some(error);
                }
            }
        }
        Err(last_error.expect("at least one attempt ran").into())
    }

    async fn notify(&self, load_id: &LoadId, outcome: CallOutcome, round_count: u32) {
        let notice =
            CallOutcomeNotice { load_id: load_id.clone(), outcome, round_count };
        if let Err(error) = self.sink.record(notice).await {
            warn!(
                event_name = "negotiation.call_log_failed",
                load_id = %load_id,
                outcome = outcome.as_str(),
                error = %error,
                "call log notification failed, booking decision stands"
            );
        }
    }
}
