use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::domain::session::ports::Clock;
use crate::domain::session::ports::RevocationStore;

/// Periodically drop revocation entries whose tokens have expired.
///
/// Purely an optimization: an expired token is rejected whether or not
/// its entry is still present. The task runs until the handle is aborted.
///
/// # Arguments
/// * `store` - Revocation store to prune
/// * `clock` - Time source used to decide expiry
/// * `interval` - Time between sweeps
///
/// # Returns
/// Handle of the spawned sweep task
pub fn spawn_revocation_sweep(
    store: Arc<dyn RevocationStore>,
    clock: Arc<dyn Clock>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            match store.prune(clock.now()).await {
                Ok(0) => {}
                Ok(removed) => tracing::debug!(removed, "Pruned expired revocation entries"),
                Err(e) => tracing::warn!(error = %e, "Revocation sweep failed"),
            }
        }
    })
}
