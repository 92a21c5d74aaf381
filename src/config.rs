use std::env;

use url::Url;

const DEFAULT_OAUTH_URL: &str = "https://api.ccbill.com/ccbill-auth/oauth/token";
const DEFAULT_TRANSACTION_URL: &str = "https://api.ccbill.com/transactions";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_RATE_LIMIT_RPM: u32 = 60;
const DEFAULT_STATIC_DIR: &str = "./public";

/// One OAuth client-credentials pair for the CCBill auth endpoint.
#[derive(Clone)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Public (browser-visible) merchant configuration served via /config.js.
/// Serialized field names match what the demo page script reads.
#[derive(Clone, Debug, Default, serde::Serialize)]
pub struct PublicConfig {
    /// Widget application id
    #[serde(rename = "appid")]
    pub app_id: String,
    /// Merchant account number
    pub accnum: String,
    /// Sub-account used for non-3DS payment tokens
    pub subacc: String,
    /// Sub-account used when strong customer authentication ran
    #[serde(rename = "subacc3ds")]
    pub subacc_3ds: String,
}

#[derive(Clone)]
pub struct AppConfig {
    /// Frontend OAuth client (browser token via /fe-token)
    pub fe_credentials: Option<OAuthCredentials>,
    /// Backend OAuth client (/be-token and server-side purchase calls)
    pub be_credentials: Option<OAuthCredentials>,
    /// CCBill OAuth token endpoint
    pub oauth_url: String,
    /// CCBill transaction API base (payment-token endpoints live under it)
    pub transaction_url: String,
    /// Browser-visible merchant config
    pub public: PublicConfig,
    /// Server port
    pub port: u16,
    /// CORS allowed origins
    pub allowed_origins: Vec<String>,
    /// Rate limit requests per minute
    pub rate_limit_rpm: u32,
    /// Directory to serve the demo page from (None = don't serve)
    pub static_dir: Option<String>,
    /// Bearer token required for /metrics endpoint (None = public)
    pub metrics_token: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("fe_credentials", &self.fe_credentials)
            .field("be_credentials", &self.be_credentials)
            .field("oauth_url", &self.oauth_url)
            .field("transaction_url", &self.transaction_url)
            .field("public", &self.public)
            .field("port", &self.port)
            .field("allowed_origins", &self.allowed_origins)
            .field("rate_limit_rpm", &self.rate_limit_rpm)
            .field("static_dir", &self.static_dir)
            .field(
                "metrics_token",
                &self.metrics_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Parse the comma-separated origin list. Empty entries are dropped; an
/// unset or effectively-empty variable falls back to the localhost dev
/// origins rather than allowing nothing (or, worse, the empty origin).
fn parse_allowed_origins(raw: Option<String>) -> Vec<String> {
    let parsed: Vec<String> = raw
        .map(|s| {
            s.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();

    if parsed.is_empty() {
        vec![
            "http://localhost:3000".to_string(),
            "http://127.0.0.1:3000".to_string(),
        ]
    } else {
        parsed
    }
}

fn credentials_from_env(id_var: &str, secret_var: &str) -> Option<OAuthCredentials> {
    let client_id = env::var(id_var).ok().filter(|s| !s.is_empty())?;
    let client_secret = env::var(secret_var).ok().filter(|s| !s.is_empty())?;
    Some(OAuthCredentials {
        client_id,
        client_secret,
    })
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Optional: OAuth client pairs. The token routes answer 500 when the
        // pair they need is missing, so startup does not require them.
        let fe_credentials =
            credentials_from_env("CCBILL_FE_CLIENT_ID", "CCBILL_FE_CLIENT_SECRET");
        let be_credentials =
            credentials_from_env("CCBILL_BE_CLIENT_ID", "CCBILL_BE_CLIENT_SECRET");

        // Optional: OAuth token endpoint
        let oauth_url =
            env::var("CCBILL_OAUTH_URL").unwrap_or_else(|_| DEFAULT_OAUTH_URL.to_string());
        Url::parse(&oauth_url).map_err(|_| ConfigError::InvalidUrl(oauth_url.clone()))?;

        // Optional: transaction API base
        let transaction_url = env::var("CCBILL_TRANSACTION_URL")
            .unwrap_or_else(|_| DEFAULT_TRANSACTION_URL.to_string());
        Url::parse(&transaction_url)
            .map_err(|_| ConfigError::InvalidUrl(transaction_url.clone()))?;
        let transaction_url = transaction_url.trim_end_matches('/').to_string();

        // Optional: browser-visible merchant config
        let subacc = env::var("CCBILL_CLIENT_SUBACC").unwrap_or_default();
        let public = PublicConfig {
            app_id: env::var("CCBILL_CLIENT_APP_ID").unwrap_or_default(),
            accnum: env::var("CCBILL_CLIENT_ACCNUM").unwrap_or_default(),
            subacc_3ds: env::var("CCBILL_CLIENT_SUBACC_3DS")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| subacc.clone()),
            subacc,
        };

        // Optional: port
        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        // Optional: allowed origins
        let allowed_origins = parse_allowed_origins(env::var("ALLOWED_ORIGINS").ok());

        // Optional: rate limit
        let rate_limit_rpm = env::var("RATE_LIMIT_RPM")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_RATE_LIMIT_RPM);

        // Optional: static demo page directory
        let static_dir = match env::var("STATIC_DIR") {
            Ok(s) if s.is_empty() => None,
            Ok(s) => Some(s),
            Err(_) => Some(DEFAULT_STATIC_DIR.to_string()),
        };

        // Optional: metrics token
        let metrics_token = env::var("METRICS_TOKEN").ok().filter(|s| !s.is_empty());

        if fe_credentials.is_none() {
            tracing::warn!(
                "CCBILL_FE_CLIENT_ID / CCBILL_FE_CLIENT_SECRET not set — /fe-token will answer 500"
            );
        }
        if be_credentials.is_none() {
            tracing::warn!(
                "CCBILL_BE_CLIENT_ID / CCBILL_BE_CLIENT_SECRET not set — \
                 /be-token and /purchase will answer 500"
            );
        }
        if metrics_token.is_none() {
            tracing::warn!("METRICS_TOKEN not set — /metrics endpoint is publicly accessible");
        }

        Ok(Self {
            fe_credentials,
            be_credentials,
            oauth_url,
            transaction_url,
            public,
            port,
            allowed_origins,
            rate_limit_rpm,
            static_dir,
            metrics_token,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let creds = OAuthCredentials {
            client_id: "merchant-app".to_string(),
            client_secret: "hunter2".to_string(),
        };
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("merchant-app"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn test_parse_allowed_origins() {
        let origins =
            parse_allowed_origins(Some("https://shop.example.com, https://pay.example.com".into()));
        assert_eq!(
            origins,
            vec![
                "https://shop.example.com".to_string(),
                "https://pay.example.com".to_string()
            ]
        );

        // empty entries are dropped, not matched against the Origin header
        let origins = parse_allowed_origins(Some("https://shop.example.com,,".into()));
        assert_eq!(origins, vec!["https://shop.example.com".to_string()]);

        // empty or unset falls back to the dev defaults
        let defaults = parse_allowed_origins(None);
        assert_eq!(parse_allowed_origins(Some("".into())), defaults);
        assert!(defaults.contains(&"http://localhost:3000".to_string()));
        assert!(!defaults.iter().any(|o| o.is_empty()));
    }

    #[test]
    fn test_config_debug_redacts_metrics_token() {
        let config = AppConfig {
            fe_credentials: None,
            be_credentials: None,
            oauth_url: DEFAULT_OAUTH_URL.to_string(),
            transaction_url: DEFAULT_TRANSACTION_URL.to_string(),
            public: PublicConfig::default(),
            port: DEFAULT_PORT,
            allowed_origins: vec![],
            rate_limit_rpm: DEFAULT_RATE_LIMIT_RPM,
            static_dir: None,
            metrics_token: Some("super-secret".to_string()),
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
    }
}
