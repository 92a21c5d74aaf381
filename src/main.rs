use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::{middleware::Logger, web, App, HttpServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use threeds_demo::{config::AppConfig, metrics::register_metrics, routes, state::AppState};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::from_env().expect("Failed to load configuration");
    let port = config.port;
    let allowed_origins = config.allowed_origins.clone();
    let rate_limit_rpm = config.rate_limit_rpm;
    let static_dir = config.static_dir.clone();

    tracing::info!("Starting ccbill-threeds-demo on port {}", port);
    tracing::info!("OAuth endpoint: {}", config.oauth_url);
    tracing::info!("Transaction endpoint: {}", config.transaction_url);

    // Register Prometheus metrics
    register_metrics();

    // Create shared state
    let state_data = web::Data::new(AppState::new(config));

    // Configure rate limiter
    let governor_conf = GovernorConfigBuilder::default()
        .requests_per_minute(rate_limit_rpm as u64)
        .finish()
        .expect("Failed to create rate limiter config");

    if let Some(ref dir) = static_dir {
        tracing::info!("Serving demo page from: {}", dir);
    }

    // Start HTTP server
    HttpServer::new(move || {
        let cors = threeds_demo::cors::build_cors(&allowed_origins);

        let mut app = App::new()
            .app_data(state_data.clone())
            .wrap(Logger::default())
            .wrap(cors)
            .wrap(Governor::new(&governor_conf))
            .configure(routes::health::configure)
            .configure(routes::config_js::configure)
            .configure(routes::token::configure)
            .configure(routes::purchase::configure);

        // Serve the demo page last (catch-all) if configured
        if let Some(ref dir) = static_dir {
            app = app.service(actix_files::Files::new("/", dir).index_file("index.html"));
        }

        app
    })
    .bind(("127.0.0.1", port))?
    .run()
    .await
}
