use crate::core::models::MaintenanceState;
use crate::core::settings::Settings;
use crate::core::store::StatusCache;
use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use serde::Serialize;

#[derive(Serialize)]
struct StatusOutput {
    #[serde(flatten)]
    state: MaintenanceState,
    duration_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    ends_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    remaining_minutes: Option<i64>,
    overdue: bool,
    #[serde(with = "chrono::serde::ts_seconds")]
    fetched_at: DateTime<Utc>,
}

impl StatusOutput {
    fn new(state: MaintenanceState) -> Self {
        Self {
            duration_label: state.duration_label(),
            ends_at: state.end_time(),
            remaining_minutes: state.remaining_minutes(),
            overdue: state.is_overdue(),
            fetched_at: Utc::now(),
            state,
        }
    }
}

pub async fn run(settings: &Settings, json: bool, force: bool) -> Result<()> {
    let cache = StatusCache::from_settings(settings)?;

    let state = if force {
        cache.refresh().await?
    } else {
        cache.get(false).await
    };

    let output = StatusOutput::new(state);

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for line in describe(&output) {
            println!("{line}");
        }
    }

    Ok(())
}

fn describe(output: &StatusOutput) -> Vec<String> {
    let state = &output.state;

    if !state.is_active {
        return vec!["Maintenance: off".to_string()];
    }

    let mut lines = vec!["Maintenance: ON".to_string()];

    if let Some(message) = &state.message {
        lines.push(format!("  Message:  {message}"));
    }

    lines.push(format!("  Duration: {}", output.duration_label));

    if let Some(activated_at) = state.activated_at {
        let by = state
            .activated_by
            .as_deref()
            .map(|who| format!(" by {who}"))
            .unwrap_or_default();
        lines.push(format!(
            "  Started:  {}{by}",
            activated_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        ));
    }

    if output.overdue {
        lines.push("  Status:   overdue".to_string());
    } else if let Some(minutes) = output.remaining_minutes {
        lines.push(format!(
            "  Status:   about {} left",
            crate::core::duration::format_duration(Some(minutes))
        ));
    }

    lines
}
