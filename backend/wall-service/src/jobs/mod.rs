//! Background jobs.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::services::AccountLifecycle;

/// Periodically retries account cleanups that failed mid-cascade, so a
/// storage hiccup during deletion cannot strand a user's data forever.
pub struct CleanupSweeper {
    accounts: AccountLifecycle,
    period: Duration,
}

impl CleanupSweeper {
    pub fn new(accounts: AccountLifecycle, period: Duration) -> Self {
        Self { accounts, period }
    }

    /// Start the background job.
    /// Returns a JoinHandle that can be awaited or aborted.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = interval(self.period);

            info!("Starting cleanup sweeper (interval: {:?})", self.period);

            loop {
                interval.tick().await;
                self.sweep_cycle().await;
            }
        })
    }

    async fn sweep_cycle(&self) {
        let queued = self.accounts.pending_count();
        if queued == 0 {
            debug!("No pending account cleanups");
            return;
        }

        let remaining = self.accounts.run_pending().await;
        if remaining > 0 {
            warn!(remaining, "Account cleanups still pending after sweep");
        } else {
            info!(recovered = queued, "All pending account cleanups recovered");
        }
    }
}
