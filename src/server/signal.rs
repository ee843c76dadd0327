// Signal handling module
// SIGTERM and SIGINT trigger graceful shutdown of the accept loop

use std::sync::Arc;
use tokio::sync::Notify;

use crate::logger;

/// Spawn the signal listener task and return the notifier it fires.
pub fn shutdown_notifier() -> Arc<Notify> {
    let notify = Arc::new(Notify::new());
    spawn_signal_task(Arc::clone(&notify));
    notify
}

#[cfg(unix)]
fn spawn_signal_task(notify: Arc<Notify>) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let Ok(mut sigterm) = signal(SignalKind::terminate()) else {
            logger::log_error("Failed to register SIGTERM handler");
            return;
        };
        let Ok(mut sigint) = signal(SignalKind::interrupt()) else {
            logger::log_error("Failed to register SIGINT handler");
            return;
        };

        tokio::select! {
            _ = sigterm.recv() => logger::log_warning("SIGTERM received, shutting down"),
            _ = sigint.recv() => logger::log_warning("SIGINT received, shutting down"),
        }

        notify.notify_waiters();
    });
}

/// Windows fallback - only handles Ctrl+C
#[cfg(not(unix))]
fn spawn_signal_task(notify: Arc<Notify>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            logger::log_warning("Ctrl+C received, shutting down");
            notify.notify_waiters();
        }
    });
}
