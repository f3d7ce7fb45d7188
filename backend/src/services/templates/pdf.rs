//! Preview a template as PDF, tokens left in place.

use crate::config::Settings;
use crate::engine::ports::{DocumentRef, PDF_MIME};
use crate::services::error_response;
use crate::store::{open_database, SqliteDocumentStore};
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpResponse, Responder};

/// `GET /api/templates/pdf/{template_id}`: served inline as `<id>.pdf`.
pub async fn process(
    settings: web::Data<Settings>,
    template_id: web::Path<String>,
) -> impl Responder {
    let template_id = template_id.into_inner();
    let rendered = open_database(&settings.database_path).and_then(|conn| {
        SqliteDocumentStore::new(conn, &settings.fonts_dir).render_pdf(
            &DocumentRef {
                id: template_id.clone(),
            },
            &template_id,
        )
    });

    match rendered {
        Ok(bytes) => HttpResponse::Ok()
            .content_type(PDF_MIME)
            .insert_header(ContentDisposition {
                disposition: DispositionType::Inline,
                parameters: vec![DispositionParam::Filename(format!("{}.pdf", template_id))],
            })
            .body(bytes),
        Err(e) => error_response(&e),
    }
}
