use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::{info, warn};
use slidemerge::config::Settings;
use slidemerge::job_controller::state::{start_job_updater, JobsState};
use slidemerge::services;
use slidemerge::store::open_database;
use std::fs;
use std::io;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let settings = Settings::from_env().map_err(io::Error::other)?;
    for dir in [&settings.data_dir, &settings.output_dir] {
        fs::create_dir_all(dir)?;
    }
    // Applies the schema once before any handler opens the database.
    open_database(&settings.database_path).map_err(io::Error::other)?;

    let (jobs_state, rx) = JobsState::new();
    let updater_state = jobs_state.clone();
    tokio::spawn(async move {
        start_job_updater(updater_state, rx).await;
    });

    let url = settings.bind_url();
    info!("Server running at {}", url);
    info!("Artifact links use {}", settings.public_url);
    warn!(
        "Mail is only spooled to the outbox table in {}; no relay is configured to deliver it",
        settings.database_path.display()
    );

    let bind = (settings.host.clone(), settings.port);
    let settings = web::Data::new(settings);
    let jobs_state = web::Data::new(jobs_state);

    HttpServer::new(move || {
        App::new()
            .app_data(web::JsonConfig::default().limit(10 * 1024 * 1024)) // 10 MB
            .app_data(settings.clone())
            .app_data(jobs_state.clone())
            .service(services::configs::configure_routes())
            .service(services::templates::configure_routes())
            .service(services::data_sources::csv::configure_routes())
            .service(services::folders::configure_routes())
            .service(services::merge::configure_routes())
            .service(services::outbox::configure_routes())
            .service(services::files::configure_routes())
    })
    .bind(bind)?
    .run()
    .await
}
