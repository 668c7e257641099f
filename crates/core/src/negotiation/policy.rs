use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::NegotiationError;

/// Knobs for the counter-offer strategy. Both values are deployment
/// configuration, not business constants (see `config::NegotiationConfig`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Fraction of the listed rate at which an offer is accepted outright.
    pub acceptance_threshold: Decimal,
    /// Carrier offers handled before the negotiation is broken off.
    pub max_rounds: u32,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self { acceptance_threshold: Decimal::new(95, 2), max_rounds: 3 }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Accept { agreed_rate: Decimal },
    Counter { counter_offer: Decimal },
    Reject,
}

/// Decide how to answer one carrier offer. Pure; no side effects.
///
/// `round` is the round being decided (1 for the first offer). `last_counter`
/// is the counter proposed in the previous round, if any; counters never
/// decrease round-over-round and never exceed the listed rate.
pub fn decide(
    config: &PolicyConfig,
    listed_rate: Decimal,
    carrier_offer: Decimal,
    round: u32,
    last_counter: Option<Decimal>,
) -> Result<Action, NegotiationError> {
    if listed_rate <= Decimal::ZERO || carrier_offer <= Decimal::ZERO {
        return Err(NegotiationError::InvalidInput { listed_rate, carrier_offer });
    }

    // Over-offer: take the listed rate, never more.
    if carrier_offer > listed_rate {
        return Ok(Action::Accept { agreed_rate: listed_rate });
    }

    if carrier_offer >= listed_rate * config.acceptance_threshold {
        return Ok(Action::Accept { agreed_rate: carrier_offer });
    }

    if round >= config.max_rounds {
        return Ok(Action::Reject);
    }

    let midpoint = ((listed_rate + carrier_offer) / Decimal::TWO).round_dp(2);
    let floor = last_counter.unwrap_or(midpoint);
    let counter_offer = midpoint.max(floor).min(listed_rate);
    Ok(Action::Counter { counter_offer })
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::errors::NegotiationError;

    use super::{decide, Action, PolicyConfig};

    fn dec(value: i64) -> Decimal {
        Decimal::new(value, 0)
    }

    #[test]
    fn offer_at_threshold_is_accepted_at_the_offer() {
        let action = decide(&PolicyConfig::default(), dec(1000), dec(950), 1, None)
            .expect("valid inputs");
        assert_eq!(action, Action::Accept { agreed_rate: dec(950) });
    }

    #[test]
    fn over_offer_is_accepted_at_the_listed_rate() {
        let action = decide(&PolicyConfig::default(), dec(1000), dec(1200), 1, None)
            .expect("valid inputs");
        assert_eq!(action, Action::Accept { agreed_rate: dec(1000) });
    }

    #[test]
    fn low_offer_draws_a_midpoint_counter() {
        let action = decide(&PolicyConfig::default(), dec(1000), dec(700), 1, None)
            .expect("valid inputs");
        assert_eq!(action, Action::Counter { counter_offer: dec(850) });
    }

    #[test]
    fn counters_never_decrease_across_rounds() {
        // Round two: a lower carrier offer would pull the midpoint below the
        // previous counter; the prior counter holds as the floor.
        let action = decide(&PolicyConfig::default(), dec(1000), dec(600), 2, Some(dec(850)))
            .expect("valid inputs");
        assert_eq!(action, Action::Counter { counter_offer: dec(850) });
    }

    #[test]
    fn counters_never_exceed_the_listed_rate() {
        let action = decide(&PolicyConfig::default(), dec(1000), dec(900), 1, Some(dec(1000)))
            .expect("valid inputs");
        match action {
            Action::Counter { counter_offer } => assert!(counter_offer <= dec(1000)),
            other => panic!("expected counter, got {other:?}"),
        }
    }

    #[test]
    fn round_cap_turns_low_offers_into_reject() {
        let config = PolicyConfig::default();
        for round in 1..config.max_rounds {
            let action =
                decide(&config, dec(1000), dec(500), round, None).expect("valid inputs");
            assert!(matches!(action, Action::Counter { .. }), "round {round} should counter");
        }
        let action =
            decide(&config, dec(1000), dec(500), config.max_rounds, None).expect("valid inputs");
        assert_eq!(action, Action::Reject);
    }

    #[test]
    fn threshold_acceptance_wins_even_at_the_round_cap() {
        let action = decide(&PolicyConfig::default(), dec(1000), dec(960), 3, Some(dec(850)))
            .expect("valid inputs");
        assert_eq!(action, Action::Accept { agreed_rate: dec(960) });
    }

    #[test]
    fn non_positive_inputs_are_invalid() {
        let error = decide(&PolicyConfig::default(), Decimal::ZERO, dec(500), 1, None)
            .expect_err("zero listed rate");
        assert!(matches!(error, NegotiationError::InvalidInput { .. }));

        let error = decide(&PolicyConfig::default(), dec(1000), dec(-50), 1, None)
            .expect_err("negative offer");
        assert!(matches!(error, NegotiationError::InvalidInput { .. }));
    }

    #[test]
    fn midpoint_keeps_cents_precision() {
        let action = decide(
            &PolicyConfig::default(),
            Decimal::new(100_050, 2),
            Decimal::new(70_000, 2),
            1,
            None,
        )
        .expect("valid inputs");
        assert_eq!(action, Action::Counter { counter_offer: Decimal::new(85_025, 2) });
    }
}
