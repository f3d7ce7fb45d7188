use crate::job_controller::state::JobsState;
use actix_web::{web, HttpResponse, Responder};

/// `GET /api/merge/status/{job_id}`: latest status of a run.
pub async fn process(state: web::Data<JobsState>, job_id: web::Path<String>) -> impl Responder {
    match state.status(&job_id).await {
        Some(status) => HttpResponse::Ok().json(status),
        None => HttpResponse::NotFound().body(format!("Unknown job: {}", job_id)),
    }
}
