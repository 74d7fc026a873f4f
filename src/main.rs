use log::*;
use service::{config::Config, logging::Logger};

#[tokio::main]
async fn main() {
    let config = Config::new();

    if let Err(e) = Logger::init_logger(&config) {
        eprintln!("Failed to initialize logger: {e}");
    }

    info!(
        "Starting route_stream_rs in {} mode",
        config.runtime_env()
    );

    if let Err(e) = web::init_server(config).await {
        error!("Server stopped: {e}");
        std::process::exit(1);
    }
}
