//! Merge setups: `GET /api/configs`, `GET /api/configs/{name}` and
//! `POST /api/configs/save`.

use crate::config::Settings;
use crate::engine::config_store::ConfigRepository;
use crate::error::Result;
use crate::services::error_response;
use crate::store::{open_database, SqliteConfigRepository};
use actix_web::web::{get, post, scope};
use actix_web::{web, HttpResponse, Responder, Scope};
use common::model::job_config::JobConfig;
use log::info;

const API_PATH: &str = "/api/configs";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(list))
        .route("/save", post().to(save))
        .route("/{name}", get().to(get_one))
}

fn repository(settings: &Settings) -> Result<SqliteConfigRepository> {
    Ok(SqliteConfigRepository::new(open_database(
        &settings.database_path,
    )?))
}

/// Runnable setups in listing order; `index` in a start request refers to
/// this order.
async fn list(settings: web::Data<Settings>) -> impl Responder {
    match repository(&settings).and_then(|repo| repo.job_configs()) {
        Ok(configs) => HttpResponse::Ok().json(configs),
        Err(e) => error_response(&e),
    }
}

/// 404 when no setup has that name.
async fn get_one(settings: web::Data<Settings>, name: web::Path<String>) -> impl Responder {
    match repository(&settings).and_then(|repo| repo.get_config(&name)) {
        Ok(config) => HttpResponse::Ok().json(config),
        Err(e) => error_response(&e),
    }
}

async fn save(settings: web::Data<Settings>, payload: web::Json<JobConfig>) -> impl Responder {
    let config = payload.into_inner();
    if config.name.trim().is_empty() {
        return HttpResponse::BadRequest().body("setup name must not be empty");
    }
    match repository(&settings).and_then(|repo| repo.save_config(&config)) {
        Ok(()) => {
            info!("Saved merge setup {:?}", config.name);
            HttpResponse::Ok().json(config)
        }
        Err(e) => error_response(&e),
    }
}
