use crate::core::models::ToggleRequest;
use crate::core::settings::Settings;
use crate::core::store::StatusCache;
use crate::daemon::polling::PollingController;
use anyhow::Result;

pub async fn run(settings: &Settings, request: ToggleRequest) -> Result<()> {
    let controller = PollingController::new(StatusCache::from_settings(settings)?);

    match controller.toggle(&request).await {
        Ok(state) if state.is_active => {
            println!(
                "Maintenance mode enabled (estimated duration: {})",
                state.duration_label()
            );
            if let Some(message) = &state.message {
                println!("  Message: {message}");
            }
            Ok(())
        }
        Ok(_) => {
            println!("Maintenance mode disabled");
            Ok(())
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Toggle failed");
            eprintln!("{}", e.user_message());
            Err(e.into())
        }
    }
}
