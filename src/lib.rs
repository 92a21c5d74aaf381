pub mod config;
pub mod cors;
pub mod error;
pub mod metrics;
pub mod oauth;
pub mod purchase;
pub mod routes;
pub mod state;

pub use config::AppConfig;
pub use error::DemoError;
pub use state::AppState;
