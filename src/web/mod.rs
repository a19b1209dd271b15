pub mod handlers;
pub mod session;
pub mod templates;

use crate::components::google_calendar::{Authorizer, CalendarService};
use crate::config::Config;
use crate::error::Error;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::error;

use self::handlers::{
    connect_handler, disconnect_handler, health_handler, index_handler, schedule_handler,
};
use self::session::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Event reader and writer
    pub calendar: Arc<dyn CalendarService>,
    /// Runs the consent flow on "Connect Calendar"
    pub authorizer: Arc<dyn Authorizer>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        calendar: Arc<dyn CalendarService>,
        authorizer: Arc<dyn Authorizer>,
    ) -> Self {
        Self {
            config,
            calendar,
            authorizer,
            sessions: SessionStore::new(),
        }
    }
}

/// Failure that prevents a page from being rendered at all
#[derive(Debug)]
pub struct WebError(Error);

impl<E> From<E> for WebError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        WebError(err.into())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        error!("Failed to render page: {}", self.0);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/connect", post(connect_handler))
        .route("/schedule", post(schedule_handler))
        .route("/disconnect", post(disconnect_handler))
        .route("/health", get(health_handler))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
