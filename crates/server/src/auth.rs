use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use secrecy::ExposeSecret;
use tracing::warn;

use crate::routes::{ApiError, AppState};

/// Bearer-token gate for every route except `/health`. Missing or malformed
/// credentials are a 401; a well-formed but wrong key is a 403.
pub async fn require_bearer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let header_value =
        request.headers().get(header::AUTHORIZATION).and_then(|value| value.to_str().ok());

    match validate_header(header_value, state.api_key.expose_secret()) {
        Ok(()) => next.run(request).await,
        Err((status, message)) => {
            warn!(
                event_name = "auth.request_denied",
                status = status.as_u16(),
                path = %request.uri().path(),
                "rejected unauthenticated request"
            );
            (status, Json(ApiError { error: message.to_string() })).into_response()
        }
    }
}

fn validate_header(
    header_value: Option<&str>,
    expected_key: &str,
) -> Result<(), (StatusCode, &'static str)> {
    let header_value =
        header_value.ok_or((StatusCode::UNAUTHORIZED, "Missing Authorization header"))?;

    let (scheme, token) = header_value
        .split_once(' ')
        .ok_or((StatusCode::UNAUTHORIZED, "Invalid authorization scheme"))?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err((StatusCode::UNAUTHORIZED, "Invalid authorization scheme"));
    }

    if token != expected_key {
        return Err((StatusCode::FORBIDDEN, "Invalid API key"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::validate_header;

    #[test]
    fn missing_header_is_unauthorized() {
        let error = validate_header(None, "test-key").expect_err("missing header");
        assert_eq!(error.0, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn non_bearer_scheme_is_unauthorized() {
        let error = validate_header(Some("Basic dXNlcg=="), "test-key").expect_err("bad scheme");
        assert_eq!(error.0, StatusCode::UNAUTHORIZED);

        let error = validate_header(Some("Bearer "), "test-key").expect_err("empty token");
        assert_eq!(error.0, StatusCode::UNAUTHORIZED);

        let error = validate_header(Some("test-key"), "test-key").expect_err("no scheme at all");
        assert_eq!(error.0, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn wrong_key_is_forbidden() {
        let error = validate_header(Some("Bearer wrong-key"), "test-key").expect_err("wrong key");
        assert_eq!(error.0, StatusCode::FORBIDDEN);
    }

    #[test]
    fn valid_bearer_token_passes() {
        assert!(validate_header(Some("Bearer test-key"), "test-key").is_ok());
        assert!(validate_header(Some("bearer test-key"), "test-key").is_ok());
    }
}
