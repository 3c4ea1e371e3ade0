extern crate network;

use actix_web::{middleware::Logger, web, App, HttpServer};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use network::config::Config;
use network::state::AppState;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::load()?;
    let address = config.bind_address();

    info!("Initializing state...");
    let state = web::Data::new(AppState::new(config).await?);

    info!("Server listening on http://{address}");
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(network::routes)
    })
    .bind(&address)?
    .run()
    .await?;

    info!("Server shutting down...");
    Ok(())
}
