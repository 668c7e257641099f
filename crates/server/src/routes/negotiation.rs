use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::error;

use loadline_core::{LoadId, NegotiationError, NegotiationOutcome};

use super::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct NegotiateRequest {
    pub load_id: String,
    pub carrier_offer: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NegotiateResponse {
    Accepted { agreed_rate: Decimal, round: u32, message: String },
    Countered { counter_offer: Decimal, round: u32, remaining_rounds: u32, message: String },
    Rejected { round: u32, message: String },
    AlreadyBooked { message: String },
}

pub async fn negotiate(
    State(state): State<AppState>,
    Json(request): Json<NegotiateRequest>,
) -> Result<Json<NegotiateResponse>, (StatusCode, Json<ApiError>)> {
    let load_id = LoadId(request.load_id);

    let outcome = state
        .engine
        .negotiate(&load_id, request.carrier_offer)
        .await
        .map_err(|negotiation_error| error_response(&load_id, negotiation_error))?;

    Ok(Json(match outcome {
        NegotiationOutcome::Accepted { agreed_rate, round } => NegotiateResponse::Accepted {
            agreed_rate,
            round,
            message: format!(
                "Accepted the carrier's offer of ${agreed_rate}; load {load_id} is booked."
            ),
        },
        NegotiationOutcome::Countered { counter_offer, round, remaining_rounds } => {
            NegotiateResponse::Countered {
                counter_offer,
                round,
                remaining_rounds,
                message: format!(
                    "Countering at ${counter_offer}; {remaining_rounds} round(s) remaining."
                ),
            }
        }
        NegotiationOutcome::Rejected { round } => NegotiateResponse::Rejected {
            round,
            message: "Negotiation attempt limit reached; no further counter offers are available."
                .to_string(),
        },
        NegotiationOutcome::AlreadyBooked => NegotiateResponse::AlreadyBooked {
            message: format!(
                "Load {load_id} was booked by another negotiation; no further offers are needed."
            ),
        },
    }))
}

fn error_response(
    load_id: &LoadId,
    negotiation_error: NegotiationError,
) -> (StatusCode, Json<ApiError>) {
    let status = match &negotiation_error {
        NegotiationError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
        NegotiationError::LoadNotFound(_) => StatusCode::NOT_FOUND,
        NegotiationError::LoadAlreadyBooked(_) | NegotiationError::NegotiationClosed { .. } => {
            StatusCode::CONFLICT
        }
        NegotiationError::RepositoryUnavailable(_) => StatusCode::BAD_GATEWAY,
    };

    if status == StatusCode::BAD_GATEWAY {
        error!(
            event_name = "negotiation.repository_unavailable",
            load_id = %load_id,
            error = %negotiation_error,
            "negotiation step failed against the data store"
        );
    }

    (status, Json(ApiError { error: negotiation_error.to_string() }))
}

#[cfg(test)]
mod tests {
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::Json;
    use rust_decimal::Decimal;

    use crate::routes::test_support;

    use super::{negotiate, NegotiateRequest, NegotiateResponse};

    fn dec(value: i64) -> Decimal {
        Decimal::new(value, 0)
    }

    fn request(load_id: &str, carrier_offer: Decimal) -> Json<NegotiateRequest> {
        Json(NegotiateRequest { load_id: load_id.to_string(), carrier_offer })
    }

    #[tokio::test]
    async fn counter_then_accept_round_trip() {
        let state = test_support::state().await;
        test_support::insert_load(&state, &test_support::load("LD-1001", 1000)).await;

        let Json(first) = negotiate(State(state.clone()), request("LD-1001", dec(700)))
            .await
            .expect("first offer");
        match first {
            NegotiateResponse::Countered { counter_offer, round, remaining_rounds, .. } => {
                assert_eq!(counter_offer, dec(850));
                assert_eq!(round, 1);
                assert_eq!(remaining_rounds, 2);
            }
            other => panic!("expected counter, got {other:?}"),
        }

        let Json(second) = negotiate(State(state), request("LD-1001", dec(960)))
            .await
            .expect("second offer");
        match second {
            NegotiateResponse::Accepted { agreed_rate, round, .. } => {
                assert_eq!(agreed_rate, dec(960));
                assert_eq!(round, 2);
            }
            other => panic!("expected accept, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn offers_after_booking_conflict() {
        let state = test_support::state().await;
        test_support::insert_load(&state, &test_support::load("LD-1001", 1000)).await;

        negotiate(State(state.clone()), request("LD-1001", dec(980))).await.expect("accept");

        let (status, Json(body)) = negotiate(State(state), request("LD-1001", dec(990)))
            .await
            .expect_err("booked load conflicts");
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body.error.contains("already booked"));
    }

    #[tokio::test]
    async fn lowball_offers_reject_after_the_cap() {
        let state = test_support::state().await;
        test_support::insert_load(&state, &test_support::load("LD-1001", 1000)).await;

        for _ in 0..2 {
            let Json(response) =
                negotiate(State(state.clone()), request("LD-1001", dec(500)))
                    .await
                    .expect("counter");
            assert!(matches!(response, NegotiateResponse::Countered { .. }));
        }

        let Json(third) = negotiate(State(state.clone()), request("LD-1001", dec(500)))
            .await
            .expect("third offer");
        match third {
            NegotiateResponse::Rejected { round, .. } => assert_eq!(round, 3),
            other => panic!("expected reject, got {other:?}"),
        }

        // The session is closed; further offers conflict.
        let (status, _) = negotiate(State(state), request("LD-1001", dec(999)))
            .await
            .expect_err("closed session");
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn unknown_loads_are_not_found() {
        let state = test_support::state().await;

        let (status, Json(body)) = negotiate(State(state), request("LD-404", dec(700)))
            .await
            .expect_err("missing load");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.error.contains("not found"));
    }

    #[tokio::test]
    async fn non_positive_offers_are_bad_requests() {
        let state = test_support::state().await;
        test_support::insert_load(&state, &test_support::load("LD-1001", 1000)).await;

        let (status, _) = negotiate(State(state), request("LD-1001", dec(0)))
            .await
            .expect_err("zero offer");
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
