use crate::core::error::MaintenanceError;
use crate::core::models::{MaintenanceState, ToggleRequest};
use crate::core::store::StatusCache;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

pub const POLL_INTERVAL: Duration = Duration::from_secs(30);
const EVENT_CAPACITY: usize = 16;

pub type TickFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
pub type Tick = Arc<dyn Fn() -> TickFuture + Send + Sync>;

/// Runs a tick repeatedly until its token is cancelled.
pub trait Scheduler: Send + Sync {
    fn every(&self, period: Duration, token: CancellationToken, tick: Tick);
}

/// Spawns an interval loop on the current tokio runtime. The first tick fires
/// one period after scheduling.
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn every(&self, period: Duration, token: CancellationToken, tick: Tick) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = interval.tick() => tick().await,
                }
            }

            tracing::debug!("Polling schedule cancelled");
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Stopped,
    Polling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    Updated(MaintenanceState),
    Toggled(MaintenanceState),
    ToggleFailed(String),
}

#[derive(Clone)]
struct Published {
    current: Arc<RwLock<Option<MaintenanceState>>>,
    events: broadcast::Sender<StatusEvent>,
}

impl Published {
    async fn apply(&self, state: MaintenanceState, event: fn(MaintenanceState) -> StatusEvent) {
        *self.current.write().await = Some(state.clone());
        // No subscribers is fine; the state is still readable via current().
        let _ = self.events.send(event(state));
    }
}

pub struct PollingController {
    cache: StatusCache,
    scheduler: Arc<dyn Scheduler>,
    interval: Duration,
    published: Published,
    polling: Mutex<Option<CancellationToken>>,
}

impl PollingController {
    pub fn new(cache: StatusCache) -> Self {
        Self::with_scheduler(cache, Arc::new(TokioScheduler), POLL_INTERVAL)
    }

    pub fn with_scheduler(
        cache: StatusCache,
        scheduler: Arc<dyn Scheduler>,
        interval: Duration,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            cache,
            scheduler,
            interval,
            published: Published {
                current: Arc::new(RwLock::new(None)),
                events,
            },
            polling: Mutex::new(None),
        }
    }

    pub fn state(&self) -> ControllerState {
        match *self.polling_slot() {
            Some(_) => ControllerState::Polling,
            None => ControllerState::Stopped,
        }
    }

    pub fn start(&self) {
        let mut polling = self.polling_slot();
        if polling.is_some() {
            tracing::debug!("Polling already running");
            return;
        }

        let token = CancellationToken::new();
        let cache = self.cache.clone();
        let published = self.published.clone();
        let tick_token = token.clone();

        let tick: Tick = Arc::new(move || -> TickFuture {
            let cache = cache.clone();
            let published = published.clone();
            let token = tick_token.clone();

            Box::pin(async move {
                let state = cache.get(false).await;
                if token.is_cancelled() {
                    tracing::debug!("Discarding poll result after stop");
                    return;
                }
                published.apply(state, StatusEvent::Updated).await;
            })
        });

        self.scheduler.every(self.interval, token.clone(), tick);
        *polling = Some(token);

        tracing::info!(interval_secs = self.interval.as_secs(), "Polling started");
    }

    /// Cancels future ticks. A tick already in flight finishes but its result
    /// is dropped.
    pub fn stop(&self) {
        if let Some(token) = self.polling_slot().take() {
            token.cancel();
            tracing::info!("Polling stopped");
        }
    }

    pub async fn toggle(
        &self,
        request: &ToggleRequest,
    ) -> Result<MaintenanceState, MaintenanceError> {
        match self.cache.toggle(request).await {
            Ok(state) => {
                self.published
                    .apply(state.clone(), StatusEvent::Toggled)
                    .await;
                Ok(state)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Maintenance toggle failed");
                let _ = self
                    .published
                    .events
                    .send(StatusEvent::ToggleFailed(e.user_message()));
                Err(e)
            }
        }
    }

    pub async fn refresh(&self) -> Result<MaintenanceState, MaintenanceError> {
        let state = self.cache.refresh().await?;
        self.published
            .apply(state.clone(), StatusEvent::Updated)
            .await;
        Ok(state)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.published.events.subscribe()
    }

    pub async fn current(&self) -> Option<MaintenanceState> {
        self.published.current.read().await.clone()
    }

    fn polling_slot(&self) -> std::sync::MutexGuard<'_, Option<CancellationToken>> {
        self.polling.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for PollingController {
    fn drop(&mut self) {
        self.stop();
    }
}
