//! Templates: `POST /api/templates/save`, `GET /api/templates/{template_id}`
//! and `GET /api/templates/pdf/{template_id}`.
//!
//! Template text is a slide deck: slides separated by `---` lines, with
//! `<<column>>` tokens filled in per data row when a merge runs.

mod get;
mod pdf;
mod save;

use actix_web::web::{get, post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/templates";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/save", post().to(save::process))
        .route("/pdf/{template_id}", get().to(pdf::process))
        .route("/{template_id}", get().to(get::process))
}
