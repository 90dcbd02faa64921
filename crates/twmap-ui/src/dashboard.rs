//! Dashboard orchestration: refresh (fetch + save) and load (read + render).
//!
//! A refresh and a render never overlap; see `twmap_core::SessionState`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use twmap_core::{AppError, Config, SessionState};
use twmap_forecast::{render, tabulate, ForecastProvider, ForecastStore, MapArtifact, TableRow};

/// What the dashboard shows after reading the store.
#[derive(Debug)]
pub enum DashboardView {
    /// Nothing has been fetched yet
    Empty,
    Populated {
        map: MapArtifact,
        table: Vec<TableRow>,
        updated_at: Option<DateTime<Utc>>,
    },
}

impl DashboardView {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Result of a user-triggered refresh.
#[derive(Debug)]
pub enum RefreshOutcome {
    Updated { regions: usize },
    Failed(AppError),
    /// Another refresh is already running
    Busy,
}

/// Returns the session to Idle on every exit path of a refresh,
/// including the request future being dropped mid-fetch.
struct FetchGuard<'a> {
    state: &'a Mutex<SessionState>,
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        *state = state.on_fetch_done();
        tracing::debug!("Session state -> {:?}", *state);
    }
}

pub struct Dashboard {
    provider: ForecastProvider,
    store: Arc<Mutex<ForecastStore>>,
    state: Mutex<SessionState>,
    store_path: PathBuf,
}

impl Dashboard {
    pub fn new(provider: ForecastProvider, store: ForecastStore, store_path: PathBuf) -> Self {
        Self {
            provider,
            store: Arc::new(Mutex::new(store)),
            state: Mutex::new(SessionState::Idle),
            store_path,
        }
    }

    /// Build the provider and open (creating if needed) the store.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let store_path = config.store_path();
        if let Some(parent) = store_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create store directory")?;
        }

        let provider =
            ForecastProvider::new(&config.forecast).context("Failed to create forecast client")?;
        let store = ForecastStore::open(&store_path)
            .with_context(|| format!("Failed to open forecast store {}", store_path.display()))?;

        tracing::info!("Forecast store at {}", store_path.display());
        Ok(Self::new(provider, store, store_path))
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    /// Fetch the feed and save it. Stored data is untouched on failure.
    pub async fn refresh(&self) -> RefreshOutcome {
        {
            let mut state = self.state.lock();
            if !state.can_start_refresh() {
                tracing::info!("Refresh requested while {:?}, ignoring", *state);
                return RefreshOutcome::Busy;
            }
            *state = state.on_refresh_requested();
        }

        let _guard = FetchGuard { state: &self.state };

        match self.fetch_and_save().await {
            Ok(regions) => {
                tracing::info!("Refresh complete: {} regions", regions);
                RefreshOutcome::Updated { regions }
            }
            Err(e) => {
                if e.preserves_snapshot() {
                    tracing::warn!("Refresh failed, keeping previous snapshot: {}", e);
                } else {
                    tracing::error!("Refresh failed: {}", e);
                }
                RefreshOutcome::Failed(e)
            }
        }
    }

    async fn fetch_and_save(&self) -> Result<usize, AppError> {
        let records = self.provider.fetch().await?;

        let store = Arc::clone(&self.store);
        let written = tokio::task::spawn_blocking(move || store.lock().upsert(&records))
            .await
            .map_err(|e| AppError::Other(e.into()))??;
        Ok(written)
    }

    /// Read the store and build the map and table.
    ///
    /// Blocks on SQLite; async callers run it on the blocking pool.
    ///
    /// While a refresh is running the last saved snapshot is still shown;
    /// the session state is only advanced when it is Idle.
    pub fn load(&self) -> Result<DashboardView, AppError> {
        let rendering = {
            let mut state = self.state.lock();
            if state.can_start_render() {
                *state = state.on_render_requested();
                true
            } else {
                false
            }
        };

        let view = self.read_view();

        if rendering {
            let mut state = self.state.lock();
            *state = state.on_render_done();
        }

        view
    }

    fn read_view(&self) -> Result<DashboardView, AppError> {
        let (stored, updated_at) = {
            let store = self.store.lock();
            (store.read_all()?, store.last_updated()?)
        };

        if stored.is_empty() {
            tracing::debug!("Forecast store is empty");
            return Ok(DashboardView::Empty);
        }

        let map = render(stored.iter().map(|s| &s.record));
        let table = tabulate(stored.iter().map(|s| &s.record));
        tracing::debug!(
            "Rendered {} markers ({} skipped), {} table rows",
            map.markers.len(),
            map.skipped.len(),
            table.len()
        );

        Ok(DashboardView::Populated {
            map,
            table,
            updated_at,
        })
    }
}
