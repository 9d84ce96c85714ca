use tokio::net::TcpListener;
use wordclash::config::Config;
use wordclash::metrics::register_metrics;
use wordclash::startup::create_web_server;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    std_logger::Config::logfmt().init();
    register_metrics();

    let config = Config::get().expect("Failed to read the configuration.");
    let address = format!(
        "{}:{}",
        config.application.host, config.application.port
    );
    let listener = TcpListener::bind(&address).await?;

    create_web_server(config, listener).await
}
