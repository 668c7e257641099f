//! HTTP surface for the negotiation service.
//!
//! Authenticated JSON endpoints:
//! - `POST /negotiate`            — one carrier offer for a load
//! - `GET  /loads`                — unbooked loads by origin/destination/equipment
//! - `POST /call_logs`            — record a carrier call
//! - `GET  /call_logs`            — paginated call history
//! - `GET  /call_logs/{call_id}`  — single call record
//! - `GET  /metrics/summary`      — sentiment/outcome aggregates
//!
//! `GET /health` stays outside the bearer-token gate.

pub mod call_logs;
pub mod loads;
pub mod metrics;
pub mod negotiation;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::{middleware, Router};
use loadline_core::NegotiationEngine;
use loadline_db::repositories::{CallLogRepository, LoadSearch};
use loadline_db::DbPool;
use secrecy::SecretString;
use serde::Serialize;

use crate::auth;
use crate::health;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<NegotiationEngine>,
    pub loads: Arc<dyn LoadSearch>,
    pub call_logs: Arc<dyn CallLogRepository>,
    pub db_pool: DbPool,
    pub api_key: SecretString,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/negotiate", post(negotiation::negotiate))
        .route("/loads", get(loads::search))
        .route("/call_logs", post(call_logs::create).get(call_logs::list))
        .route("/call_logs/{call_id}", get(call_logs::get_by_id))
        .route("/metrics/summary", get(metrics::summary))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_bearer))
        .with_state(state.clone());

    protected.merge(health::router(state.db_pool))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use loadline_core::{InMemorySessionStore, Load, LoadId, NegotiationEngine, PolicyConfig};
    use loadline_db::repositories::{SqlCallLogRepository, SqlLoadRepository};
    use loadline_db::{connect_with_settings, migrations};
    use rust_decimal::Decimal;

    use super::AppState;

    pub async fn state() -> AppState {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");

        let loads = Arc::new(SqlLoadRepository::new(pool.clone()));
        let call_logs = Arc::new(SqlCallLogRepository::new(pool.clone()));
        let engine = Arc::new(NegotiationEngine::new(
            loads.clone(),
            call_logs.clone(),
            Arc::new(InMemorySessionStore::new()),
            PolicyConfig::default(),
            3,
        ));

        AppState {
            engine,
            loads,
            call_logs,
            db_pool: pool,
            api_key: "test-key".to_string().into(),
        }
    }

    pub fn load(load_id: &str, listed_rate: i64) -> Load {
        Load {
            load_id: LoadId(load_id.to_string()),
            origin: "Chicago, IL".to_string(),
            destination: "Dallas, TX".to_string(),
            equipment_type: "Dry Van".to_string(),
            listed_rate: Decimal::new(listed_rate, 0),
            booked: false,
            agreed_rate: None,
            pickup_at: None,
            delivery_at: None,
            weight_lbs: Some(42_000),
            commodity: None,
            num_pieces: None,
            miles: Some(968),
            dimensions: None,
            notes: None,
        }
    }

    pub async fn insert_load(state: &AppState, load: &loadline_core::Load) {
        SqlLoadRepository::new(state.db_pool.clone()).insert(load).await.expect("insert load");
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::util::ServiceExt;

    use super::{router, test_support};

    #[tokio::test]
    async fn protected_routes_require_a_bearer_token() {
        let app = router(test_support::state().await);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/loads?origin=&destination=&equipment_type=")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_api_key_is_forbidden() {
        let app = router(test_support::state().await);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/loads?origin=&destination=&equipment_type=")
                    .header("Authorization", "Bearer wrong-key")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn valid_api_key_reaches_the_handler() {
        let app = router(test_support::state().await);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/loads?origin=&destination=&equipment_type=")
                    .header("Authorization", "Bearer test-key")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn health_is_reachable_without_credentials() {
        let app = router(test_support::state().await);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
    }
}
