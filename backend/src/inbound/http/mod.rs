//! HTTP inbound adapter exposing REST endpoints.

pub mod enhancement;
pub mod error;
pub mod health;
pub mod snapshots;
pub mod state;
#[cfg(test)]
pub mod test_utils;
mod validation;

pub use error::ApiResult;

use actix_web::web;

/// Register the versioned API routes under `/api/v1`.
///
/// Body extraction failures are rendered as `invalid_request` payloads.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
            .service(enhancement::enhance_extraction)
            .service(snapshots::schedule_reference_snapshot),
    );
}
