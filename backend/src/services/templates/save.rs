//! Insert or update a template. The response carries the stored id, which
//! is what a merge setup's `template_id` must reference.

use crate::config::Settings;
use crate::services::error_response;
use crate::store::open_database;
use crate::store::templates::save_template;
use actix_web::{web, HttpResponse, Responder};
use common::model::template::Template;
use log::info;

/// `POST /api/templates/save`
pub async fn process(
    settings: web::Data<Settings>,
    payload: web::Json<Template>,
) -> impl Responder {
    let saved = open_database(&settings.database_path)
        .and_then(|conn| save_template(&conn, &payload));
    match saved {
        Ok(id) => {
            info!("Saved template {}", id);
            HttpResponse::Ok().json(serde_json::json!({ "id": id }))
        }
        Err(e) => error_response(&e),
    }
}
