//! Client-credentials exchange against the CCBill OAuth endpoint.

use base64::Engine;

use crate::config::{AppConfig, OAuthCredentials};
use crate::error::DemoError;

/// Upstream token response, relayed to the caller as-is.
pub struct TokenRelay {
    pub status: u16,
    pub body: serde_json::Value,
}

/// `Authorization: Basic base64(client_id:client_secret)`
pub fn basic_authorization(creds: &OAuthCredentials) -> String {
    let pair = format!("{}:{}", creds.client_id, creds.client_secret);
    format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD.encode(pair)
    )
}

/// Parse an upstream body as JSON, wrapping non-JSON text as `{"raw": text}`.
pub fn parse_json_or_raw(text: &str) -> serde_json::Value {
    serde_json::from_str(text).unwrap_or_else(|_| serde_json::json!({ "raw": text }))
}

async fn post_client_credentials(
    client: &reqwest::Client,
    creds: &OAuthCredentials,
    url: &str,
) -> Result<reqwest::Response, DemoError> {
    let resp = client
        .post(url)
        .header("Authorization", basic_authorization(creds))
        .form(&[("grant_type", "client_credentials")])
        .send()
        .await?;
    Ok(resp)
}

/// Exchange a client pair for a token, preserving the upstream status.
///
/// Non-2xx answers are wrapped as `{"error":"token_fetch_failed","detail":..}`
/// but keep the upstream status so the browser sees what the gateway said.
pub async fn fetch_token(
    client: &reqwest::Client,
    creds: &OAuthCredentials,
    url: &str,
) -> Result<TokenRelay, DemoError> {
    let resp = post_client_credentials(client, creds, url).await?;
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    let parsed = parse_json_or_raw(&text);

    if !status.is_success() {
        return Ok(TokenRelay {
            status: status.as_u16(),
            body: serde_json::json!({
                "error": "token_fetch_failed",
                "detail": parsed,
            }),
        });
    }

    Ok(TokenRelay {
        status: 200,
        body: parsed,
    })
}

/// Obtain a backend bearer token for server-side transaction calls.
pub async fn backend_access_token(
    client: &reqwest::Client,
    config: &AppConfig,
) -> Result<String, DemoError> {
    let creds = config
        .be_credentials
        .as_ref()
        .ok_or(DemoError::MissingBeCredentials)?;

    let resp = post_client_credentials(client, creds, &config.oauth_url).await?;
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();

    if !status.is_success() {
        return Err(DemoError::TokenFetchFailed {
            detail: parse_json_or_raw(&text),
        });
    }

    let body = parse_json_or_raw(&text);
    match body.get("access_token").and_then(|v| v.as_str()) {
        Some(token) if !token.is_empty() => Ok(token.to_string()),
        _ => Err(DemoError::TokenMissing { detail: body }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_authorization() {
        let creds = OAuthCredentials {
            client_id: "Aladdin".to_string(),
            client_secret: "open sesame".to_string(),
        };
        assert_eq!(
            basic_authorization(&creds),
            "Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ=="
        );
    }

    #[test]
    fn test_parse_json_or_raw() {
        let parsed = parse_json_or_raw(r#"{"access_token":"abc"}"#);
        assert_eq!(parsed["access_token"], "abc");

        let raw = parse_json_or_raw("<html>502 Bad Gateway</html>");
        assert_eq!(raw["raw"], "<html>502 Bad Gateway</html>");
    }
}
