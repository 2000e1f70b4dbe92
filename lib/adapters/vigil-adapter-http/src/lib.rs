//! JSON HTTP API over the application services.

mod error;
mod extract;
mod routes;

use std::future::Future;

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use vigil_application::Services;

pub use error::{ApiError, ApiResult};

#[derive(Clone)]
pub struct AppState {
    pub services: Services,
}

impl AppState {
    pub fn new(services: Services) -> Self {
        Self { services }
    }
}

pub fn router(state: AppState) -> Router {
    use routes::{admin, cron, public, subscribe};

    Router::new()
        .route("/healthz", get(routes::healthz))
        .route("/api/status", get(public::status))
        .route("/api/components", get(public::components))
        .route("/api/history", get(public::history))
        .route("/api/incidents", get(public::incidents))
        .route("/api/incidents/{id}", get(public::incident))
        .route("/api/maintenance", get(public::maintenance))
        .route("/api/subscribe", axum::routing::post(subscribe::subscribe))
        .route(
            "/api/subscribe/verify",
            get(subscribe::verify_link).post(subscribe::verify),
        )
        .route(
            "/api/subscribe/unsubscribe",
            get(subscribe::unsubscribe_link).post(subscribe::unsubscribe),
        )
        .route("/api/cron/check", get(cron::check).post(cron::check))
        .route(
            "/api/admin/incidents",
            get(admin::list_incidents).post(admin::create_incident),
        )
        .route(
            "/api/admin/incidents/{id}",
            get(admin::get_incident)
                .patch(admin::update_incident)
                .delete(admin::delete_incident),
        )
        .route(
            "/api/admin/maintenance",
            get(admin::list_maintenance)
                .post(admin::create_maintenance)
                .patch(admin::update_maintenance)
                .delete(admin::delete_maintenance),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr().context("listener has no local address")?;
    info!("status API listening on http://{addr}");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("http server failed")?;
    info!("status API stopped");
    Ok(())
}
