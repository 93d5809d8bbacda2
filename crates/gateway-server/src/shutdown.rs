//! Listens for the process termination signals `axum::serve`'s
//! `with_graceful_shutdown` needs: the server stops accepting new
//! connections and lets in-flight requests finish, which `axum`/`hyper`
//! already implement — this module only supplies the trigger future.

use tokio::signal;
use tracing::info;

/// Resolves on the first of `Ctrl+C`, `SIGTERM`, `SIGINT`, or `SIGQUIT`
/// (the latter three on Unix only), logging which one fired.
///
/// # Panics
/// Panics if a signal handler cannot be installed, which only happens if
/// the process has exhausted its signal-handling slots.
#[allow(clippy::expect_used)]
pub async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
        "ctrl+c"
    };

    #[cfg(unix)]
    let sigterm = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
        "sigterm"
    };

    #[cfg(unix)]
    let sigint = async {
        signal::unix::signal(signal::unix::SignalKind::interrupt())
            .expect("failed to install SIGINT handler")
            .recv()
            .await;
        "sigint"
    };

    #[cfg(unix)]
    let sigquit = async {
        signal::unix::signal(signal::unix::SignalKind::quit())
            .expect("failed to install SIGQUIT handler")
            .recv()
            .await;
        "sigquit"
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<&str>();
    #[cfg(not(unix))]
    let sigint = std::future::pending::<&str>();
    #[cfg(not(unix))]
    let sigquit = std::future::pending::<&str>();

    let signal_name = tokio::select! {
        name = ctrl_c => name,
        name = sigterm => name,
        name = sigint => name,
        name = sigquit => name,
    };

    info!(signal = signal_name, "received shutdown signal");
}
