use crate::components::{GoogleCalendarClient, OAuthFlow};
use crate::config::Config;
use crate::error::Error;
use crate::shutdown;
use crate::web::{self, AppState};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load and initialize the application config
pub fn load_config() -> miette::Result<Arc<Config>> {
    match Config::load() {
        Ok(config) => {
            rust_i18n::set_locale(&config.locale);
            info!("Setting locale to {}", config.locale);
            Ok(Arc::new(config))
        }
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Wire the Google implementations into the web state
pub fn build_state(config: Arc<Config>) -> miette::Result<AppState> {
    let calendar = GoogleCalendarClient::from_config(&config)?;
    let authorizer = OAuthFlow::new(
        config.credential_source(),
        Duration::from_secs(config.callback_timeout_secs),
    );

    Ok(AppState::new(config, Arc::new(calendar), Arc::new(authorizer)))
}

/// Serve the web interface until a shutdown signal arrives
pub async fn serve(config: Arc<Config>) -> miette::Result<()> {
    let addr = config.bind_address;
    let state = build_state(config)?;
    let app = web::router(state);

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(Error::from)?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::wait_for_signal())
        .await
        .map_err(Error::from)?;

    info!("Web server stopped");
    Ok(())
}
