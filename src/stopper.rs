use std::future::pending;

use tokio::{
    select,
    signal::{
        ctrl_c,
        unix::{Signal, SignalKind, signal},
    },
    task::{self, JoinHandle},
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Cancels `cancel_token` on Ctrl+C or SIGTERM. Finishes quietly once the
/// token is cancelled by the deployment itself.
pub fn run(cancel_token: CancellationToken) -> JoinHandle<()> {
    let sigterm = signal(SignalKind::terminate())
        .inspect_err(|e| warn!("Failed to listen for SIGTERM, Ctrl+C only: {}", e))
        .ok();
    watch(cancel_token, sigterm)
}

fn watch(cancel_token: CancellationToken, mut sigterm: Option<Signal>) -> JoinHandle<()> {
    task::spawn(async move {
        let terminated = async {
            match sigterm.as_mut() {
                Some(sigterm) => sigterm.recv().await,
                None => pending().await,
            }
        };
        select! {
            _ = cancel_token.cancelled() => return,
            _ = ctrl_c() => warn!("Ctrl+C received"),
            _ = terminated => warn!("SIGTERM received"),
        };
        info!("Aborting deployment");
        cancel_token.cancel();
    })
}
