use meeting_scheduler::startup;
use tracing::info;

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    info!("Starting meeting scheduler");

    // Load configuration
    let config = startup::load_config()?;

    // Start the web interface
    startup::serve(config).await
}
