pub mod config_js;
pub mod health;
pub mod purchase;
pub mod token;
