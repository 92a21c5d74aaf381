use actix_web::{HttpResponse, ResponseError};
use std::fmt;

/// Required fields of a /purchase request, echoed back on validation failure.
pub const REQUIRED_PURCHASE_FIELDS: &[&str] = &[
    "paymentTokenId",
    "amount",
    "currencyCode",
    "clientAccnum",
    "clientSubacc",
];

#[derive(Debug)]
pub enum DemoError {
    /// /purchase body is missing or failed to coerce a required field
    MissingFields,
    /// Frontend OAuth client pair not configured
    MissingFeCredentials,
    /// Backend OAuth client pair not configured
    MissingBeCredentials,
    /// Loopback-only route called from a non-loopback peer
    Forbidden,
    /// OAuth endpoint answered non-2xx while obtaining the backend token
    TokenFetchFailed { detail: serde_json::Value },
    /// OAuth endpoint answered 2xx but the body carried no access_token
    TokenMissing { detail: serde_json::Value },
    /// Transport-level failure talking to an upstream endpoint
    Upstream(reqwest::Error),
}

impl fmt::Display for DemoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DemoError::MissingFields => write!(f, "missing required purchase fields"),
            DemoError::MissingFeCredentials => {
                write!(f, "frontend OAuth credentials not configured")
            }
            DemoError::MissingBeCredentials => {
                write!(f, "backend OAuth credentials not configured")
            }
            DemoError::Forbidden => write!(f, "forbidden"),
            DemoError::TokenFetchFailed { .. } => write!(f, "backend token fetch failed"),
            DemoError::TokenMissing { .. } => {
                write!(f, "token endpoint answered without an access_token")
            }
            DemoError::Upstream(e) => write!(f, "upstream request failed: {}", e),
        }
    }
}

impl std::error::Error for DemoError {}

impl From<reqwest::Error> for DemoError {
    fn from(e: reqwest::Error) -> Self {
        DemoError::Upstream(e)
    }
}

impl ResponseError for DemoError {
    fn error_response(&self) -> HttpResponse {
        match self {
            DemoError::MissingFields => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "missing_fields",
                "need": REQUIRED_PURCHASE_FIELDS,
            })),
            DemoError::MissingFeCredentials => {
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "server_config_missing_fe_credentials"
                }))
            }
            DemoError::MissingBeCredentials => {
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "server_config_missing_be_credentials"
                }))
            }
            DemoError::Forbidden => HttpResponse::Forbidden().json(serde_json::json!({
                "error": "forbidden"
            })),
            DemoError::TokenFetchFailed { detail } => {
                tracing::error!(detail = %detail, "backend token fetch failed");
                HttpResponse::BadGateway().json(serde_json::json!({
                    "error": "token_fetch_failed",
                    "detail": detail,
                }))
            }
            DemoError::TokenMissing { detail } => {
                tracing::error!(detail = %detail, "token response carried no access_token");
                HttpResponse::BadGateway().json(serde_json::json!({
                    "error": "token_missing",
                    "detail": detail,
                }))
            }
            DemoError::Upstream(e) => {
                tracing::error!(error = %e, "upstream request failed");
                HttpResponse::BadGateway().json(serde_json::json!({
                    "error": "upstream_unreachable"
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn test_missing_fields_is_400_with_need_list() {
        let resp = DemoError::MissingFields.error_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_missing_credentials_are_500() {
        assert_eq!(
            DemoError::MissingFeCredentials.error_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            DemoError::MissingBeCredentials.error_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_token_failures_are_502() {
        let err = DemoError::TokenFetchFailed {
            detail: serde_json::json!({"raw": "gateway timeout"}),
        };
        assert_eq!(err.error_response().status(), StatusCode::BAD_GATEWAY);

        let err = DemoError::TokenMissing {
            detail: serde_json::json!({}),
        };
        assert_eq!(err.error_response().status(), StatusCode::BAD_GATEWAY);
    }
}
