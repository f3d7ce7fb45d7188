mod start;
mod status;

use actix_web::web;

const API_PATH: &str = "/api/merge";

/// Routes for starting merge runs and polling their status.
pub fn configure_routes() -> actix_web::Scope {
    web::scope(API_PATH)
        .route("/start", web::post().to(start::process))
        .route("/status/{job_id}", web::get().to(status::process))
}
