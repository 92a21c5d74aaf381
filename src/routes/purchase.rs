use actix_web::{http::StatusCode, web, HttpRequest, HttpResponse};
use serde_json::Value;

use crate::error::DemoError;
use crate::metrics::{PURCHASES, PURCHASE_LATENCY};
use crate::oauth;
use crate::purchase::{build_payload, extract_fields};
use crate::state::AppState;

const TRANSACTION_ACCEPT: &str = "application/vnd.mcn.transaction-service.api.v.2+json";
const TRANSACTION_USER_AGENT: &str = "mcnapi-3ds-demo/1.0";

/// Best-effort client IP: first X-Forwarded-For entry, else the peer address.
fn client_ip(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| req.peer_addr().map(|addr| addr.ip().to_string()))
}

/// POST /purchase - forward a payment-token charge to the transaction API
///
/// Obtains a backend bearer token, maps the body into the plain or
/// 3DS-augmented payment-token request, and relays the gateway's status and
/// JSON body verbatim.
pub async fn purchase(
    req: HttpRequest,
    body: web::Json<Value>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, DemoError> {
    let fields = extract_fields(&body)?;

    let be_token = oauth::backend_access_token(&state.http_client, &state.config).await?;

    let prepared = build_payload(&fields);
    let mode = if prepared.threeds_endpoint {
        "threeds"
    } else {
        "plain"
    };

    let token_path = urlencoding::encode(&fields.payment_token_id);
    let endpoint = if prepared.threeds_endpoint {
        format!(
            "{}/payment-tokens/threeds/{}",
            state.config.transaction_url, token_path
        )
    } else {
        format!(
            "{}/payment-tokens/{}",
            state.config.transaction_url, token_path
        )
    };

    let mut request = state
        .http_client
        .post(&endpoint)
        .header("Accept", TRANSACTION_ACCEPT)
        .header("Authorization", format!("Bearer {}", be_token))
        .header("Cache-Control", "no-cache")
        .header("User-Agent", TRANSACTION_USER_AGENT);
    if let Some(ip) = client_ip(&req) {
        request = request.header("X-Origin-IP", ip);
    }

    let start = std::time::Instant::now();
    let resp = request.json(&prepared.payload).send().await.map_err(|e| {
        PURCHASES.with_label_values(&[mode, "error"]).inc();
        DemoError::Upstream(e)
    })?;
    PURCHASE_LATENCY.observe(start.elapsed().as_secs_f64());

    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();

    let outcome = if status.is_success() {
        "success"
    } else {
        "error"
    };
    PURCHASES.with_label_values(&[mode, outcome]).inc();
    if !status.is_success() {
        tracing::warn!(mode, status = status.as_u16(), "gateway rejected purchase");
    } else {
        tracing::info!(mode, "purchase forwarded");
    }

    // Relay the gateway response verbatim; non-JSON bodies are wrapped.
    let parsed: Option<Value> = if text.is_empty() {
        None
    } else {
        serde_json::from_str(&text).ok()
    };
    let relayed = parsed.unwrap_or_else(|| {
        serde_json::json!({
            "raw": text,
            "status": status.as_u16(),
        })
    });

    Ok(
        HttpResponse::build(StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::OK))
            .json(relayed),
    )
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/purchase", web::post().to(purchase));
}
