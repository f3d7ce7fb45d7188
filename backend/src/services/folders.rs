//! `POST /api/folders`: create an output folder for merge artifacts.

use crate::config::Settings;
use crate::services::error_response;
use crate::store::LocalFolderStorage;
use actix_web::{web, HttpResponse, Responder, Scope};
use common::requests::FolderCreated;

pub fn configure_routes() -> Scope {
    web::scope("/api/folders").route("", web::post().to(create))
}

/// New empty output folder; the response carries its id.
async fn create(settings: web::Data<Settings>) -> impl Responder {
    let storage = LocalFolderStorage::new(&settings.output_dir, settings.public_url.as_str());
    match storage.create_container() {
        Ok(folder) => HttpResponse::Ok().json(FolderCreated {
            url: storage.container_url(&folder),
            id: folder.id,
        }),
        Err(e) => error_response(&e),
    }
}
