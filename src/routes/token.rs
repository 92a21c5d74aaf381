use actix_web::{http::StatusCode, web, HttpRequest, HttpResponse};

use crate::error::DemoError;
use crate::metrics::TOKEN_FETCHES;
use crate::oauth;
use crate::state::AppState;

fn relay_response(relay: oauth::TokenRelay, audience: &str) -> HttpResponse {
    let outcome = if relay.status == 200 { "success" } else { "error" };
    TOKEN_FETCHES.with_label_values(&[audience, outcome]).inc();
    if relay.status != 200 {
        tracing::warn!(audience, status = relay.status, "token fetch relayed upstream error");
    }

    HttpResponse::build(StatusCode::from_u16(relay.status).unwrap_or(StatusCode::OK))
        .json(relay.body)
}

/// POST /fe-token - exchange the frontend client pair for a bearer token
pub async fn fe_token(state: web::Data<AppState>) -> Result<HttpResponse, DemoError> {
    let creds = state
        .config
        .fe_credentials
        .as_ref()
        .ok_or(DemoError::MissingFeCredentials)?;

    let relay = oauth::fetch_token(&state.http_client, creds, &state.config.oauth_url).await?;
    Ok(relay_response(relay, "fe"))
}

fn is_loopback_peer(req: &HttpRequest) -> bool {
    req.peer_addr()
        .map(|addr| addr.ip().is_loopback())
        .unwrap_or(false)
}

/// POST /be-token - exchange the backend client pair for a bearer token
///
/// Restricted to loopback peers; anything else is rejected before the
/// upstream is touched.
pub async fn be_token(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, DemoError> {
    if !is_loopback_peer(&req) {
        return Err(DemoError::Forbidden);
    }

    let creds = state
        .config
        .be_credentials
        .as_ref()
        .ok_or(DemoError::MissingBeCredentials)?;

    let relay = oauth::fetch_token(&state.http_client, creds, &state.config.oauth_url).await?;
    Ok(relay_response(relay, "be"))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/fe-token", web::post().to(fe_token))
        .route("/be-token", web::post().to(be_token));
}
