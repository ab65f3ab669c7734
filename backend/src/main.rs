use actix_web::{web, App, HttpServer};
use clap::Parser;
use env_logger::Env;
use log::{error, info};
use vin_backend::config::Config;
use vin_backend::job_controller::state::{start_job_updater, JobsState};
use vin_backend::services;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    let config = Config::parse();

    let pipeline = match vin_backend::initialize(&config).await {
        Ok(pipeline) => pipeline,
        Err(e) => {
            error!("Startup failed: {}", e);
            std::process::exit(1);
        }
    };
    let repository = pipeline.repository.clone();

    let (jobs_state, rx) = JobsState::new(100);
    let updater_state = jobs_state.clone();
    tokio::spawn(async move {
        start_job_updater(updater_state, rx).await;
    });

    let (host, port) = config.bind_address();
    info!("Server running at http://{}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(jobs_state.clone()))
            .app_data(web::Data::new(pipeline.clone()))
            .app_data(web::Data::new(repository.clone()))
            .configure(services::configure)
    })
    .bind((host, port))?
    .run()
    .await
}
