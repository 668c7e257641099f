use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::load::LoadId;
use crate::errors::NegotiationError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Open,
    Accepted,
    Rejected,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Open => "open",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        })
    }
}

/// In-progress negotiation state for one load.
///
/// `round` counts carrier offers handled so far and only moves on a
/// successful advance; `open -> accepted` and `open -> rejected` are the only
/// transitions, and terminal sessions never transition again.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NegotiationSession {
    pub load_id: LoadId,
    pub round: u32,
    pub last_counter_offer: Option<Decimal>,
    pub status: SessionStatus,
}

impl NegotiationSession {
    pub fn new(load_id: LoadId) -> Self {
        Self { load_id, round: 0, last_counter_offer: None, status: SessionStatus::Open }
    }

    pub fn is_terminal(&self) -> bool {
        self.status != SessionStatus::Open
    }

    /// Guard used at the top of every advance.
    pub fn ensure_open(&self) -> Result<(), NegotiationError> {
        if self.is_terminal() {
            return Err(NegotiationError::NegotiationClosed {
                load_id: self.load_id.clone(),
                status: self.status,
            });
        }
        Ok(())
    }

    /// Record a completed round that ended in a counter.
    pub fn record_counter(&mut self, round: u32, counter_offer: Decimal) {
        self.round = round;
        self.last_counter_offer = Some(counter_offer);
    }

    /// Record a completed round that ended the negotiation.
    pub fn close(&mut self, round: u32, status: SessionStatus, final_offer: Option<Decimal>) {
        debug_assert!(status != SessionStatus::Open);
        self.round = round;
        if let Some(offer) = final_offer {
            self.last_counter_offer = Some(offer);
        }
        self.status = status;
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::domain::load::LoadId;
    use crate::errors::NegotiationError;

    use super::{NegotiationSession, SessionStatus};

    fn session() -> NegotiationSession {
        NegotiationSession::new(LoadId("LD-1001".to_string()))
    }

    #[test]
    fn new_sessions_start_open_at_round_zero() {
        let session = session();
        assert_eq!(session.round, 0);
        assert_eq!(session.status, SessionStatus::Open);
        assert!(session.last_counter_offer.is_none());
        assert!(session.ensure_open().is_ok());
    }

    #[test]
    fn counters_advance_the_round_and_stay_open() {
        let mut session = session();
        session.record_counter(1, Decimal::new(85_000, 2));
        assert_eq!(session.round, 1);
        assert_eq!(session.last_counter_offer, Some(Decimal::new(85_000, 2)));
        assert_eq!(session.status, SessionStatus::Open);
    }

    #[test]
    fn closed_sessions_refuse_further_advances() {
        let mut session = session();
        session.close(2, SessionStatus::Accepted, Some(Decimal::new(96_000, 2)));
        assert!(session.is_terminal());

        let error = session.ensure_open().expect_err("terminal session must refuse");
        assert_eq!(
            error,
            NegotiationError::NegotiationClosed {
                load_id: LoadId("LD-1001".to_string()),
                status: SessionStatus::Accepted,
            }
        );
    }

    #[test]
    fn rejection_keeps_the_last_counter() {
        let mut session = session();
        session.record_counter(1, Decimal::new(85_000, 2));
        session.close(3, SessionStatus::Rejected, None);
        assert_eq!(session.status, SessionStatus::Rejected);
        assert_eq!(session.last_counter_offer, Some(Decimal::new(85_000, 2)));
        assert_eq!(session.round, 3);
    }
}
