use max6675_hub::{init_tracing, run_hub};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    init_tracing();

    // Get config path (board default or override)
    let config_path = max6675_hub_raspberry_pi::get_config_path();

    tracing::info!(
        "[{}] Configuration path: {}",
        max6675_hub_raspberry_pi::BOARD_NAME,
        config_path
    );

    // Run the hub
    run_hub(&config_path).await
}
