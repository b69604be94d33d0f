use std::path::PathBuf;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers::{health_handler, redirect_handler, resolve_handler, shorten_handler};
use crate::state::AppState;

/// Largest accepted API request body, in bytes.
pub const MAX_BODY_BYTES: usize = 2048;

pub struct App {
    state: AppState,
    static_dir: Option<PathBuf>,
}

impl App {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            static_dir: None,
        }
    }

    /// Serves files from `dir` under `/static/` and for any unmatched path.
    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(dir.into());
        self
    }

    pub fn router(self) -> Router {
        let api = Router::new()
            .route("/shorten", post(shorten_handler))
            .route("/resolve", post(resolve_handler));

        let mut router = Router::new()
            .route("/health", get(health_handler))
            .route("/x/{short_id}", get(redirect_handler))
            .nest("/api", api)
            .with_state(self.state);

        if let Some(dir) = self.static_dir {
            router = router
                .nest_service("/static", ServeDir::new(&dir))
                .fallback_service(ServeDir::new(dir));
        }

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::HEAD])
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

        router
            .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }
}
