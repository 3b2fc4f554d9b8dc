use crate::client::{HttpTransport, RemoteClient};
use crate::core::error::MaintenanceError;
use crate::core::models::{MaintenanceState, ToggleRequest};
use crate::core::settings::Settings;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

pub const FRESHNESS_WINDOW: Duration = Duration::from_secs(30);
pub const STALE_MULTIPLIER: u32 = 5;

#[derive(Debug, Clone)]
struct CachedEntry {
    data: MaintenanceState,
    fetched_at: Instant,
}

impl CachedEntry {
    fn new(data: MaintenanceState) -> Self {
        Self {
            data,
            fetched_at: Instant::now(),
        }
    }

    fn younger_than(&self, limit: Duration) -> bool {
        self.fetched_at.elapsed() < limit
    }
}

/// Single-slot cache in front of the status endpoint. Clones share the slot.
#[derive(Clone)]
pub struct StatusCache {
    slot: Arc<RwLock<Option<CachedEntry>>>,
    client: Arc<RemoteClient>,
    freshness: Duration,
    stale_ceiling: Duration,
}

impl StatusCache {
    #[allow(dead_code)]
    pub fn new(client: RemoteClient) -> Self {
        Self::with_windows(client, FRESHNESS_WINDOW, STALE_MULTIPLIER)
    }

    pub fn with_windows(client: RemoteClient, freshness: Duration, stale_multiplier: u32) -> Self {
        Self {
            slot: Arc::new(RwLock::new(None)),
            client: Arc::new(client),
            freshness,
            stale_ceiling: freshness.saturating_mul(stale_multiplier.max(1)),
        }
    }

    /// Wires the HTTP transport and retry policies described by `settings`.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let transport = HttpTransport::new(&settings.api)?;
        let client = RemoteClient::with_policies(
            Arc::new(transport),
            settings.retry.fetch_policy(),
            settings.retry.toggle_policy(),
        );

        Ok(Self::with_windows(
            client,
            settings.cache.freshness(),
            settings.cache.stale_multiplier,
        ))
    }

    /// Never fails: a fetch error falls back to stale data while it is
    /// younger than the stale ceiling, and to [`MaintenanceState::inactive`]
    /// after that.
    pub async fn get(&self, force_refresh: bool) -> MaintenanceState {
        if !force_refresh {
            if let Some(entry) = self.slot.read().await.as_ref() {
                if entry.younger_than(self.freshness) {
                    return entry.data.clone();
                }
            }
        }

        match self.client.fetch_status().await {
            Ok(state) => {
                self.store(state.clone()).await;
                state
            }
            Err(e) => self.fallback(&e).await,
        }
    }

    /// Forced fetch that reports failure instead of falling back.
    pub async fn refresh(&self) -> Result<MaintenanceState, MaintenanceError> {
        let state = self.client.fetch_status().await?;
        self.store(state.clone()).await;
        Ok(state)
    }

    /// Flips the flag on the server. On success the slot is cleared so the
    /// next read goes to the network.
    pub async fn toggle(
        &self,
        request: &ToggleRequest,
    ) -> Result<MaintenanceState, MaintenanceError> {
        let state = self.client.toggle_status(request).await?;
        self.invalidate().await;
        tracing::info!(is_active = state.is_active, "Maintenance mode toggled");
        Ok(state)
    }

    pub async fn invalidate(&self) {
        *self.slot.write().await = None;
    }

    #[allow(dead_code)]
    pub async fn is_valid(&self) -> bool {
        self.slot
            .read()
            .await
            .as_ref()
            .is_some_and(|entry| entry.younger_than(self.freshness))
    }

    /// Last cached state regardless of age.
    #[allow(dead_code)]
    pub async fn peek(&self) -> Option<MaintenanceState> {
        self.slot.read().await.as_ref().map(|entry| entry.data.clone())
    }

    async fn store(&self, state: MaintenanceState) {
        *self.slot.write().await = Some(CachedEntry::new(state));
    }

    async fn fallback(&self, error: &MaintenanceError) -> MaintenanceState {
        let mut slot = self.slot.write().await;

        if let Some(entry) = slot.as_ref() {
            if entry.younger_than(self.stale_ceiling) {
                tracing::warn!(
                    error = %error,
                    age_secs = entry.fetched_at.elapsed().as_secs(),
                    "Failed to fetch maintenance status, serving stale data"
                );
                return entry.data.clone();
            }
        }

        tracing::warn!(
            error = %error,
            "Failed to fetch maintenance status, assuming no maintenance"
        );
        let state = MaintenanceState::inactive();
        *slot = Some(CachedEntry::new(state.clone()));
        state
    }
}
