use actix_web::{web, HttpResponse};

use crate::state::AppState;

/// GET /config.js - public merchant config as a frozen script global
///
/// Served as a script rather than JSON so the demo page can load it with a
/// plain `<script src>` before the widget bootstraps.
pub async fn config_js(state: web::Data<AppState>) -> HttpResponse {
    let cfg = serde_json::to_string(&state.config.public).unwrap_or_else(|_| "{}".to_string());

    HttpResponse::Ok()
        .insert_header(("Cache-Control", "no-store"))
        .content_type("application/javascript")
        .body(format!("window.CCBILL_DEMO_CONFIG=Object.freeze({});", cfg))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/config.js", web::get().to(config_js));
}
