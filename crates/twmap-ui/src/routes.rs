//! HTTP surface of the dashboard.
//!
//! - `GET /`             dashboard page
//! - `POST /refresh`     fetch, save, then show the dashboard with a notice
//! - `GET /map`          standalone map document (embedded by the dashboard)
//! - `GET /api/forecast` table rows as JSON

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Reply};

use crate::dashboard::{Dashboard, DashboardView, RefreshOutcome};
use crate::pages::{dashboard_page, error_page, Notice};

/// All dashboard routes.
pub fn routes(
    dashboard: Arc<Dashboard>,
) -> impl Filter<Extract = (Response,), Error = warp::Rejection> + Clone {
    let with_dashboard = warp::any().map(move || dashboard.clone());

    let index = warp::path::end()
        .and(warp::get())
        .and(with_dashboard.clone())
        .then(|dashboard: Arc<Dashboard>| {
            on_blocking_pool(dashboard, |dashboard| render_dashboard(dashboard, None))
        });

    let refresh = warp::path("refresh")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_dashboard.clone())
        .then(|dashboard: Arc<Dashboard>| async move {
            let notice = match dashboard.refresh().await {
                RefreshOutcome::Updated { .. } => Notice::Updated,
                RefreshOutcome::Failed(e) => Notice::Error(e.user_message().to_string()),
                RefreshOutcome::Busy => Notice::Busy,
            };
            on_blocking_pool(dashboard, move |dashboard| {
                render_dashboard(dashboard, Some(&notice))
            })
            .await
        });

    let map = warp::path("map")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_dashboard.clone())
        .then(|dashboard: Arc<Dashboard>| on_blocking_pool(dashboard, render_map));

    let api = warp::path!("api" / "forecast")
        .and(warp::get())
        .and(with_dashboard)
        .then(|dashboard: Arc<Dashboard>| on_blocking_pool(dashboard, forecast_json));

    index.or(refresh).unify().or(map).unify().or(api).unify()
}

/// Run a handler that reads the SQLite store off the async thread.
async fn on_blocking_pool<F>(dashboard: Arc<Dashboard>, handler: F) -> Response
where
    F: FnOnce(&Dashboard) -> Response + Send + 'static,
{
    tokio::task::spawn_blocking(move || handler(&dashboard))
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Dashboard handler failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })
}

fn render_dashboard(dashboard: &Dashboard, notice: Option<&Notice>) -> Response {
    let label = dashboard.store_path().display().to_string();
    match dashboard.load() {
        Ok(view) => warp::reply::html(dashboard_page(&view, notice, &label)).into_response(),
        Err(e) => {
            tracing::error!("Failed to load dashboard: {}", e);
            warp::reply::with_status(
                warp::reply::html(error_page(e.user_message())),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
            .into_response()
        }
    }
}

fn render_map(dashboard: &Dashboard) -> Response {
    let map = match dashboard.load() {
        Ok(DashboardView::Populated { map, .. }) => map,
        Ok(DashboardView::Empty) => twmap_forecast::render(std::iter::empty()),
        Err(e) => {
            tracing::error!("Failed to load map: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match map.to_html() {
        Ok(html) => warp::reply::html(html).into_response(),
        Err(e) => {
            tracing::error!("Failed to serialize map: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn forecast_json(dashboard: &Dashboard) -> Response {
    match dashboard.load() {
        Ok(DashboardView::Populated { table, .. }) => warp::reply::json(&table).into_response(),
        Ok(DashboardView::Empty) => {
            warp::reply::json(&Vec::<twmap_forecast::TableRow>::new()).into_response()
        }
        Err(e) => {
            tracing::error!("Failed to load forecast rows: {}", e);
            warp::reply::with_status(
                warp::reply::json(&serde_json::json!({ "error": e.user_message() })),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
            .into_response()
        }
    }
}

/// Serve the dashboard on `addr` until Ctrl-C.
pub async fn serve(dashboard: Arc<Dashboard>, addr: SocketAddr) -> anyhow::Result<()> {
    let (bound, server) = warp::serve(routes(dashboard))
        .try_bind_with_graceful_shutdown(addr, async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .with_context(|| format!("Failed to bind dashboard to {}", addr))?;

    tracing::info!("Dashboard listening on http://{}", bound);
    server.await;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use std::path::PathBuf;
    use twmap_core::ForecastConfig;
    use twmap_forecast::{ForecastProvider, ForecastStore};

    fn dashboard() -> Arc<Dashboard> {
        let provider = ForecastProvider::new(&ForecastConfig {
            api_key: "KEY".into(),
            base_url: "http://127.0.0.1:9".into(),
            accept_invalid_certs: false,
            timeout_secs: 1,
        })
        .unwrap();
        Arc::new(Dashboard::new(
            provider,
            ForecastStore::in_memory().unwrap(),
            PathBuf::from("data.db"),
        ))
    }

    #[tokio::test]
    async fn test_api_forecast_empty_store() {
        let res = warp::test::request()
            .method("GET")
            .path("/api/forecast")
            .reply(&routes(dashboard()))
            .await;

        assert_eq!(res.status(), 200);
        assert_eq!(&res.body()[..], b"[]");
    }

    #[tokio::test]
    async fn test_map_renders_without_data() {
        let res = warp::test::request()
            .method("GET")
            .path("/map")
            .reply(&routes(dashboard()))
            .await;

        assert_eq!(res.status(), 200);
        let body = String::from_utf8_lossy(res.body());
        assert!(body.contains("L.map('map')"));
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let res = warp::test::request()
            .method("GET")
            .path("/nope")
            .reply(&routes(dashboard()))
            .await;

        assert_eq!(res.status(), 404);
    }

    #[tokio::test]
    async fn test_refresh_requires_post() {
        let res = warp::test::request()
            .method("GET")
            .path("/refresh")
            .reply(&routes(dashboard()))
            .await;

        assert_eq!(res.status(), 405);
    }
}
