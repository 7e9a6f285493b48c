use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use smm_panel_engine::{
    jobs::{run_side_job_worker, side_job_channel, SideJobSender, SIDE_JOB_BUFFER, SIDE_JOB_WORKERS},
    CatalogApi,
    CatalogSettings,
    FxRateApi,
    OrderFlowApi,
    PostgresDatabase,
};
use tokio::sync::watch;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    fx_worker::start_fx_worker,
    integrations::{PanelClient, RateClient},
    routes::{self, CatalogHandle},
    sync_worker::start_sync_worker,
};

/// Builds the full production stack and runs the server until it is signalled to stop. The background
/// workers are told to stop once the listener has wound down.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = PostgresDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let panel = PanelClient::new(config.panel.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let rates = RateClient::new(&config.fx.base_url).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let fx = FxRateApi::new(rates, &config.fx.currency, config.fx.fallback_rate);
    let settings = CatalogSettings::new(&config.panel.source, &config.panel.currency);
    let catalog = CatalogApi::new(db.clone(), panel.clone(), fx.clone(), settings);

    let (jobs, queue) = side_job_channel(SIDE_JOB_BUFFER);
    for _ in 0..SIDE_JOB_WORKERS {
        tokio::spawn(run_side_job_worker(queue.clone(), db.clone(), panel.clone()));
    }
    let (shutdown_tx, shutdown_rx) = watch::channel(());
    start_sync_worker(db.clone(), panel.clone(), shutdown_rx.clone());
    start_fx_worker(fx.clone(), shutdown_rx);

    let srv = create_server_instance(config, db, catalog, fx, panel, jobs)?;
    let result = srv.await;
    // Dropping the sender closes the watch channel; workers exit between ticks.
    drop(shutdown_tx);
    result.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: PostgresDatabase,
    catalog: CatalogHandle,
    fx: FxRateApi<RateClient>,
    panel: PanelClient,
    jobs: SideJobSender,
) -> Result<Server, ServerError> {
    info!("🌐️ Listening on {}:{}", config.host, config.port);
    let srv = HttpServer::new(move || {
        let order_flow = OrderFlowApi::new(db.clone(), catalog.clone(), fx.clone(), panel.clone(), jobs.clone());
        let api_scope = web::scope("/api")
            .configure(routes::register_api_routes::<PostgresDatabase, PostgresDatabase, PanelClient, RateClient>);
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("spg::access_log"))
            .app_data(web::Data::new(catalog.clone()))
            .app_data(web::Data::new(order_flow))
            .service(routes::health)
            .service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
