use log::*;
use service::{config::Config, logging::Logger};
use web::AppState;

#[tokio::main]
async fn main() {
    let config = get_config();

    Logger::init_logger(&config as &Config);

    info!("Starting up Live Alert server...");
    info!("Runtime environment: {}", config.runtime_env());

    let app_state = match AppState::new(config).await {
        Ok(app_state) => app_state,
        Err(e) => {
            error!("Invalid alert configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = web::init_server(app_state).await {
        error!("Server stopped: {e}");
        std::process::exit(1);
    }
}

fn get_config() -> Config {
    Config::new()
}
