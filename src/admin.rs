//! # HTTP routes for manual display control.
//!
//! | Route                          | Effect                               |
//! |--------------------------------|--------------------------------------|
//! | `POST /displayswitcher/next`   | [`DisplaySwitcher::next`]            |
//! | `POST /displayswitcher/prev`   | [`DisplaySwitcher::prev`]            |
//! | `POST /displayswitcher/pause`  | [`DisplaySwitcher::pause`] for `pause` |
//!
//! Each route discards the request body and answers `302 Found` with
//! `Location: /`, so a plain HTML form on the device's status page can drive it.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use panelvisor::{admin, Config, DisplaySwitcher, Registry};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> std::io::Result<()> {
//! let registry = Registry::new(Config::default());
//! let switcher = Arc::new(DisplaySwitcher::new(&registry, &registry.config().switcher, registry.bus()));
//! let app = admin::router(switcher, registry.config().switcher.pause);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::post,
};

use crate::switcher::DisplaySwitcher;

/// Upper bound on how much of a request body is read before it is dropped.
const BODY_LIMIT: usize = 64 * 1024;

#[derive(Clone)]
struct AdminState {
    switcher: Arc<DisplaySwitcher>,
    pause: Duration,
}

/// Builds the display-control router.
pub fn router(switcher: Arc<DisplaySwitcher>, pause: Duration) -> Router {
    Router::new()
        .route("/displayswitcher/next", post(next))
        .route("/displayswitcher/prev", post(prev))
        .route("/displayswitcher/pause", post(pause_display))
        .with_state(AdminState { switcher, pause })
}

async fn next(State(state): State<AdminState>, body: Body) -> impl IntoResponse {
    drain(body).await;
    state.switcher.next();
    home()
}

async fn prev(State(state): State<AdminState>, body: Body) -> impl IntoResponse {
    drain(body).await;
    state.switcher.prev();
    home()
}

async fn pause_display(State(state): State<AdminState>, body: Body) -> impl IntoResponse {
    drain(body).await;
    state.switcher.pause(state.pause);
    home()
}

async fn drain(body: Body) {
    // Oversized or broken bodies are irrelevant; the action runs regardless.
    let _ = axum::body::to_bytes(body, BODY_LIMIT).await;
}

fn home() -> impl IntoResponse {
    (StatusCode::FOUND, [(header::LOCATION, "/")])
}
