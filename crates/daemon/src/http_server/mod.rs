use std::future::Future;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use http::header::{HeaderName, AUTHORIZATION, COOKIE, SET_COOKIE};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::sensitive_headers::{
    SetSensitiveRequestHeadersLayer, SetSensitiveResponseHeadersLayer,
};
use tower_http::trace::TraceLayer;

use crate::ServiceState;

pub mod api;
pub mod health;

/// Build the full application router.
pub fn router(state: ServiceState) -> Router {
    let sensitive: Arc<[HeaderName]> = Arc::new([
        AUTHORIZATION,
        COOKIE,
        SET_COOKIE,
        HeaderName::from_static(api::session::X_SESSION),
    ]);

    let auth = Router::new()
        .route("/register", post(api::auth::register::handler))
        .route("/login", post(api::auth::login::handler))
        .layer(DefaultBodyLimit::max(state.max_credential_body()));

    Router::new()
        .route("/_status/livez", get(health::liveness::handler))
        .route("/_status/readyz", get(health::readiness::handler))
        .merge(auth)
        .merge(api::files::router())
        .layer(
            ServiceBuilder::new()
                .layer(SetSensitiveRequestHeadersLayer::from_shared(sensitive.clone()))
                .layer(TraceLayer::new_for_http())
                .layer(SetSensitiveResponseHeadersLayer::from_shared(sensitive)),
        )
        .with_state(state)
}

/// Serve the router on `listener` until `shutdown` resolves.
pub async fn run<F>(listener: TcpListener, state: ServiceState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
