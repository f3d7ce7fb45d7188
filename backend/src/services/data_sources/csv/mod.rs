//! CSV data sources: `POST /api/data_sources/csv/upload`.

use actix_web::web::{post, scope};
use actix_web::Scope;

mod upload;

const API_PATH: &str = "/api/data_sources/csv";

pub fn configure_routes() -> Scope {
    scope(API_PATH).route("/upload", post().to(upload::process))
}
