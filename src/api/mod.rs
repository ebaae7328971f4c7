//! HTTP API handlers and the router

pub mod pages;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    middleware,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::{Stream, StreamExt};
use menu_types::MenuTree;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::backend::Connection;
use crate::loader::{Containers, StaticLoader};
use crate::menu::{MenuError, MenuService, MenuSource, SourceError};
use crate::routes::require_auth;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub menu: MenuService,
    pub connection: Arc<Connection>,
    pub source: Arc<dyn MenuSource>,
    pub loader: Arc<StaticLoader>,
    /// Rendered static carta, filled on first load
    pub carta: Arc<RwLock<Containers>>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(connection: Arc<Connection>, source: Arc<dyn MenuSource>) -> Self {
        Self {
            menu: MenuService::new(connection.clone(), source.clone()),
            loader: Arc::new(StaticLoader::new(source.clone())),
            connection,
            source,
            carta: Arc::new(RwLock::new(Containers::default())),
            started_at: Instant::now(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Menu(#[from] MenuError),
    #[error(transparent)]
    Source(#[from] SourceError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Menu(MenuError::NotConfigured) => StatusCode::CONFLICT,
            ApiError::Menu(MenuError::Encode(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Menu(_) => StatusCode::BAD_GATEWAY,
            ApiError::Source(SourceError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Source(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::warn!("{}", self);
        }
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/admin", get(pages::admin_page))
        .route("/admin/items/{category}/{index}", post(pages::update_item))
        .route("/admin/menu", post(pages::save_menu))
        .route("/admin/config", post(pages::save_config))
        .route_layer(middleware::from_fn_with_state(
            state.connection.clone(),
            require_auth,
        ));

    Router::new()
        .route("/", get(pages::menu_page))
        .route("/carta", get(pages::carta_page))
        .route("/login", get(pages::login_page).post(pages::login))
        .route("/login/config", post(pages::configure_backend))
        .route("/logout", post(pages::logout))
        .route("/data_menu/{file}", get(data_file_handler))
        .route("/api/menu", get(menu_handler))
        .route("/api/menu/events", get(menu_events_handler))
        .route("/status", get(status_handler))
        .merge(admin)
        .with_state(state)
}

/// General status response
#[derive(Serialize)]
pub struct StatusResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub configured: bool,
}

/// GET /status - Service health check
pub async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        service: "menu-stand",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.started_at.elapsed().as_secs(),
        configured: state.connection.is_configured(),
    })
}

/// GET /api/menu - Normalized menu tree
pub async fn menu_handler(State(state): State<AppState>) -> Result<Json<MenuTree>, ApiError> {
    Ok(Json(state.menu.fetch_menu().await?))
}

/// GET /api/menu/events - One `menu` event per snapshot
pub async fn menu_events_handler(
    State(state): State<AppState>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let subscription = state.menu.subscribe_to_menu().await?;
    let events = subscription.map(|tree| Event::default().event("menu").json_data(&tree));
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// GET /data_menu/{file} - Bundled menu file
pub async fn data_file_handler(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Result<Response, ApiError> {
    let bytes = state.source.read(&file).await?;
    let mime = mime_guess::from_path(&file).first_or_octet_stream();
    Ok(([(header::CONTENT_TYPE, mime.to_string())], bytes).into_response())
}
