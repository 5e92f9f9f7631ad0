//! notify-hub - demo composition root for the dispatch hub
//!
//! # Overview
//!
//! This binary shows how an application wires the hub. It initializes:
//! - Logging infrastructure (file rotation + console output)
//! - Tokio async runtime (worker tasks that talk to the hub)
//! - Configuration loading ([`ConfigManager`])
//! - The hub itself ([`NotifyHub`]) owned by the main thread
//! - A headless surface ([`LogSurface`]) standing in for real windows
//!
//! The threading model mirrors a desktop player:
//! - **Main thread**: owns the hub and runs its event loop, the only place
//!   handler code executes
//! - **Tokio workers / std threads**: broadcast messages and ask modal
//!   questions, blocking only where the call requires it
//!
//! # Execution Flow
//!
//! 1. Load `NotifyHub Data/Notify Hub.yaml`
//! 2. Initialize logging from its settings
//! 3. Create the hub on the main thread and register surfaces
//! 4. Start workers that publish traffic, the last one calls `quit()`
//! 5. Run the event loop until quit
//! 6. Log metrics and shut the runtime down

use anyhow::Result;
use notify_hub::ui::LogSurface;
use notify_hub::{
    APP_NAME, Category, ConfigManager, DispatchError, MessageFlags, NotifyHub, Payload, VERSION,
};
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<()> {
    let config_manager = ConfigManager::new("NotifyHub Data")?;
    let config = config_manager.load_config()?;
    let settings = &config.settings;

    // Guard must outlive every log call
    let _log_guard = notify_hub::logging::setup_logging(settings)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("notify-worker")
        .build()?;

    // The main thread becomes the owning thread
    let (hub, event_loop) = NotifyHub::with_settings(settings);

    let main_window = Arc::new(LogSurface::new("main window"));
    let pool_editor = Arc::new(LogSurface::new("pool editor"));
    hub.register(Category::GLOBAL, &main_window);
    hub.register(Category::ERROR, &main_window);
    hub.register(Category::DANMU_POOL, &pool_editor);
    hub.register(Category::SCRIPT, &pool_editor);

    pool_editor.push_answer("share-code-0451");

    // Cancel listener owned by a "download" subsystem
    let mut cancel_rx = hub.subscribe_cancel();
    runtime.spawn(async move {
        while let Ok(request) = cancel_rx.recv().await {
            if request.affects(Category::DANMU_POOL) {
                tracing::info!("Abandoning pool refresh after cancel request");
            }
        }
    });

    // Plain thread: fire-and-forget then a final blocking error
    let thread_hub = hub.clone();
    let scanner = std::thread::Builder::new()
        .name("library-scan".into())
        .spawn(move || -> Result<(), DispatchError> {
            for day in ["Mon", "Tue", "Wed"] {
                thread_hub.broadcast(
                    Category::GLOBAL,
                    &format!("Calendar refreshed for {}", day),
                    MessageFlags::AUTO_HIDE,
                    Payload::Empty,
                )?;
            }
            thread_hub.broadcast(
                Category::ERROR,
                "Library scan aborted: source unreachable",
                MessageFlags::ERROR | MessageFlags::BLOCKING,
                Payload::from("bgmlist"),
            )
        })?;

    // Async worker: modal query, then ask the loop to quit
    let task_hub = hub.clone();
    let cancel_source = Arc::clone(&pool_editor);
    runtime.spawn(async move {
        match task_hub
            .modal_query_async(Category::SCRIPT, Payload::from("Input share code"))
            .await
        {
            Ok(Some(code)) => tracing::info!(?code, "Share code entered"),
            Ok(None) => tracing::warn!("No surface can ask for a share code"),
            Err(e) => tracing::warn!("Share code dialog failed: {}", e),
        }

        let _ = task_hub
            .broadcast_async(
                Category::DANMU_POOL,
                "Refreshing danmu sources",
                MessageFlags::PROCESS | MessageFlags::SHOW_CANCEL | MessageFlags::BLOCKING,
                Payload::Empty,
            )
            .await;
        cancel_source.request_cancel();

        tokio::time::sleep(Duration::from_millis(100)).await;
        task_hub.quit();
    });

    let executed = event_loop.run();
    tracing::info!("Event loop executed {} tasks", executed);

    match scanner.join() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!("Scanner could not report: {}", e),
        Err(_) => tracing::error!("Scanner thread panicked"),
    }

    if settings.log_metrics_on_exit {
        hub.metrics().log_summary();
    }

    runtime.shutdown_timeout(Duration::from_secs(5));

    tracing::info!("Application shutdown complete");
    Ok(())
}
