use bcm_backend::app::App;
use bcm_backend::util::logger::Logger;
use dotenv::dotenv;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Load environment variables before the logger reads LOG_DIR and RUST_LOG
    let dotenv_result = dotenv();

    let _logger = match Logger::new() {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            std::process::exit(1);
        }
    };

    match dotenv_result {
        Ok(_) => info!("Loaded .env file"),
        Err(e) => warn!("Failed to load .env file: {} (using system env vars)", e),
    }

    // Panics are fatal: log them and let the supervisor restart the process.
    std::panic::set_hook(Box::new(|panic_info| {
        error!("Panic: {}", panic_info);
        std::process::exit(1);
    }));

    info!("Starting BCM Group backend");
    let app = match App::new().await {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to start application: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = app.start().await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
