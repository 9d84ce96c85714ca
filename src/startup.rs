use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::Config;
use crate::registry::actor::RegistryActor;
use crate::routes;

pub async fn create_web_server(config: Config, listener: TcpListener) -> Result<(), std::io::Error> {
    let registry = Arc::new(RegistryActor::spawn(config.game.clone()));

    let router = routes::create_router(&config).with_state(registry);

    log::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, router).await
}
