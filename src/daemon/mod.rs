pub mod polling;

use crate::core::models::MaintenanceState;
use crate::core::settings::Settings;
use crate::core::store::StatusCache;
use anyhow::{Context, Result};
use polling::{PollingController, StatusEvent, TokioScheduler};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

pub async fn run(settings: &Settings) -> Result<()> {
    tracing::info!(base_url = %settings.api.base_url, "Starting maintenance watch");

    let cache = StatusCache::from_settings(settings)?;
    let controller = PollingController::with_scheduler(
        cache,
        Arc::new(TokioScheduler),
        settings.cache.poll_interval(),
    );
    let mut events = controller.subscribe();

    let initial = controller
        .refresh()
        .await
        .context("Failed to load initial maintenance status")?;
    // The initial load is reported directly; drop its event.
    let _ = events.try_recv();
    report(&initial);

    controller.start();
    let mut last = initial;

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                tracing::info!("Shutdown requested");
                break;
            }
            event = events.recv() => match event {
                Ok(StatusEvent::Updated(state)) | Ok(StatusEvent::Toggled(state)) => {
                    if state != last {
                        report(&state);
                        last = state;
                    } else {
                        tracing::debug!(is_active = state.is_active, "Maintenance status unchanged");
                    }
                }
                Ok(StatusEvent::ToggleFailed(message)) => {
                    tracing::warn!(%message, "Toggle failed");
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Status events dropped");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    controller.stop();
    tracing::debug!(
        state = ?controller.state(),
        last = ?controller.current().await,
        "Maintenance watch stopped"
    );
    Ok(())
}

fn report(state: &MaintenanceState) {
    if !state.is_active {
        tracing::info!(is_active = false, "Maintenance mode is off");
        return;
    }

    tracing::info!(
        is_active = true,
        message = state.message.as_deref().unwrap_or(""),
        duration = %state.duration_label(),
        remaining_minutes = state.remaining_minutes(),
        overdue = state.is_overdue(),
        activated_by = state.activated_by.as_deref().unwrap_or(""),
        "Maintenance mode is on"
    );
}
