//! `GET /files/{folder}/{name}`: serve link-shared artifacts.
//!
//! Files that were never shared answer 404, same as missing ones.

use crate::config::Settings;
use crate::services::error_response;
use crate::store::LocalFolderStorage;
use actix_files::NamedFile;
use actix_web::{web, HttpRequest, HttpResponse, Responder, Scope};

pub fn configure_routes() -> Scope {
    web::scope("/files").route("/{folder}/{name}", web::get().to(serve))
}

/// Stream a generated artifact back by its folder and file name.
async fn serve(
    req: HttpRequest,
    settings: web::Data<Settings>,
    path: web::Path<(String, String)>,
) -> impl Responder {
    let (folder, name) = path.into_inner();
    let storage = LocalFolderStorage::new(&settings.output_dir, settings.public_url.as_str());
    match storage.shared_file(&folder, &name) {
        Ok(Some(file)) => match NamedFile::open(file) {
            Ok(named) => named.into_response(&req),
            Err(e) => HttpResponse::InternalServerError().body(e.to_string()),
        },
        Ok(None) => HttpResponse::NotFound().body("Not Found"),
        Err(e) => error_response(&e),
    }
}
