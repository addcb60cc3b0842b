//! Headless Monitor Demo
//!
//! Runs a monitor view and prints its render model whenever something changes.
//!
//! ```text
//! cargo run --example monitor_demo                     # poll the configured backend
//! cargo run --example monitor_demo -- monitor.toml     # load settings from a file
//! cargo run --example monitor_demo -- --scripted       # replay canned statuses
//! ```
//!
//! `CRIMECATCHER_ENDPOINT`, `CRIMECATCHER_POLL_INTERVAL_MS`,
//! `CRIMECATCHER_REQUEST_TIMEOUT_MS` and `CRIMECATCHER_LOG` override the loaded settings.

use anyhow::Context;
use crimecatcher::{
    init_logging, MockCaptureBackend, MonitorConfig, MonitorEvent, MonitorView,
    ScriptedStatusSource,
};
use std::sync::Arc;

const SCRIPT: [&str; 4] = [
    r#"{"status":"SECURE","lastAlert":null}"#,
    r#"{"status":"SUSPICIOUS","lastAlert":{"event_type":"Loitering","description":"Person lingering near entrance","timestamp":"2026-01-30T23:28:00Z","confidence_score":71}}"#,
    r#"{"status":"WEAPON_DETECTED","lastAlert":{"event_type":"Weapon","description":"Knife detected","timestamp":"2026-01-30T23:30:00Z","confidence_score":92}}"#,
    r#"{"status":"SECURE"}"#,
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut scripted = false;
    let mut config_path = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--scripted" => scripted = true,
            path => config_path = Some(path.to_string()),
        }
    }

    let mut config = match &config_path {
        Some(path) => MonitorConfig::load(path)
            .with_context(|| format!("failed to load configuration from {path}"))?,
        None => MonitorConfig::default(),
    };
    config.apply_env_overrides()?;
    init_logging(&config.logging)?;

    println!("🚀 CrimeCatcher Monitor Demo");
    println!("============================");

    let mut view = if scripted {
        println!("📼 Replaying {} scripted statuses", SCRIPT.len());
        MonitorView::builder(config)
            .source(Arc::new(ScriptedStatusSource::from_json(&SCRIPT)))
            .capture_backend(Arc::new(MockCaptureBackend::new().with_frames(30)))
            .build()?
    } else {
        println!(
            "📡 Polling {}{}",
            config.endpoint.base_url, config.endpoint.status_path
        );
        MonitorView::builder(config).build()?
    };

    let mut events = view.subscribe();
    view.mount().await?;
    println!("✅ Monitor mounted (Ctrl+C to stop)");

    loop {
        tokio::select! {
            event = events.next() => {
                let Some(event) = event else { break };
                report(&view, &event)?;
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    let report = view.unmount();
    println!(
        "\n🛑 Monitor unmounted (poller cancelled: {}, camera released: {})",
        report.poller_cancelled, report.capture_released
    );
    if let Some(error) = report.capture_error {
        println!("⚠️ Camera release failed: {error}");
    }

    let stats = view.poll_stats();
    println!(
        "📊 {} polls, {} succeeded, {} failed, {} ticks skipped",
        stats.polls_issued, stats.polls_succeeded, stats.polls_failed, stats.ticks_skipped
    );
    Ok(())
}

fn report(view: &MonitorView, event: &MonitorEvent) -> anyhow::Result<()> {
    match event {
        MonitorEvent::PollFailed { error, .. } => println!("⚠️ Poll failed: {error}"),
        MonitorEvent::CaptureUnavailable { reason } => {
            println!("📷 Camera unavailable: {reason}")
        }
        MonitorEvent::CaptureStarted { settings, .. } => println!(
            "📷 Camera live at {}x{}",
            settings.resolution.width, settings.resolution.height
        ),
        _ => {}
    }

    if event.is_status_event() {
        if let Some(model) = view.render() {
            println!("{}", serde_json::to_string_pretty(&model)?);
        }
    }
    Ok(())
}
