//! Fetch a template with its images.

use crate::config::Settings;
use crate::services::error_response;
use crate::store::open_database;
use crate::store::templates::get_template;
use actix_web::{web, HttpResponse, Responder};

/// `GET /api/templates/{template_id}`: 404 when the id is unknown.
pub async fn process(
    settings: web::Data<Settings>,
    template_id: web::Path<String>,
) -> impl Responder {
    let found = open_database(&settings.database_path)
        .and_then(|conn| get_template(&conn, &template_id));
    match found {
        Ok(Some(template)) => HttpResponse::Ok().json(template),
        Ok(None) => HttpResponse::NotFound().body(format!("Template not found: {}", template_id)),
        Err(e) => error_response(&e),
    }
}
