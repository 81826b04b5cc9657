// Server loop module
// Accepts connections until shutdown, then drains in-flight connections

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::time::Instant;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Accept connections on `listener` until `shutdown` resolves.
///
/// Must run inside a `LocalSet`: every connection is a `spawn_local` task.
/// After shutdown the listener is closed, open connections are told to
/// finish, and the loop waits up to `shutdown_grace_period` for them.
pub async fn run<S>(listener: TcpListener, state: Arc<AppState>, shutdown: S)
where
    S: Future<Output = ()>,
{
    let active_connections = Arc::new(AtomicUsize::new(0));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(
                            stream,
                            peer_addr,
                            &state,
                            &active_connections,
                            shutdown_rx.clone(),
                        );
                    }
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            () = &mut shutdown => break,
        }
    }

    drop(listener);
    let _ = shutdown_tx.send(true);

    let grace = Duration::from_secs(state.config.performance.shutdown_grace_period);
    let remaining = drain(&active_connections, grace).await;
    if remaining == 0 {
        logger::log_info("All connections closed, server stopped");
    } else {
        logger::log_warning(&format!(
            "Grace period elapsed with {remaining} connection(s) still open, server stopped"
        ));
    }
}

/// Wait for the active connection count to reach zero, at most `grace`
async fn drain(active_connections: &AtomicUsize, grace: Duration) -> usize {
    let deadline = Instant::now() + grace;
    loop {
        let active = active_connections.load(Ordering::SeqCst);
        if active == 0 || Instant::now() >= deadline {
            return active;
        }
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
}
