//! `GET /api/outbox`: messages spooled by merge runs, newest first.

use crate::config::Settings;
use crate::services::error_response;
use crate::store::{open_database, SqliteOutbox};
use actix_web::{web, HttpResponse, Responder, Scope};
use serde::Deserialize;

const DEFAULT_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
struct ListQuery {
    limit: Option<usize>,
}

pub fn configure_routes() -> Scope {
    web::scope("/api/outbox").route("", web::get().to(list))
}

/// `GET /api/outbox?limit=N`, newest first.
async fn list(settings: web::Data<Settings>, query: web::Query<ListQuery>) -> impl Responder {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    let entries = open_database(&settings.database_path)
        .and_then(|conn| SqliteOutbox::new(conn).list(limit));
    match entries {
        Ok(entries) => HttpResponse::Ok().json(entries),
        Err(e) => error_response(&e),
    }
}
