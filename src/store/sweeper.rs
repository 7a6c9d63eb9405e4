use super::ImageStore;
use crate::{Error, Result};
use std::{sync::Arc, time::Duration};
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Owned background task that periodically sweeps an [`ImageStore`].
///
/// The first sweep runs immediately on start. Dropping the handle cancels
/// the task; [`Sweeper::shutdown`] also waits for it to finish.
pub struct Sweeper {
    handle: Option<JoinHandle<()>>,
    cancel_token: CancellationToken,
}

impl Sweeper {
    pub fn start(store: Arc<ImageStore>, period: Duration) -> Self {
        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(sweep_loop(store, period, cancel_token.clone()));

        Self {
            handle: Some(handle),
            cancel_token,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub async fn shutdown(mut self) -> Result<()> {
        self.cancel_token.cancel();

        match self.handle.take() {
            Some(handle) => handle
                .await
                .map_err(|e| Error::internal(format!("sweeper task failed to join: {e}"))),
            None => Ok(()),
        }
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

async fn sweep_loop(store: Arc<ImageStore>, period: Duration, cancel_token: CancellationToken) {
    info!(
        "Starting image sweeper for {} every {:?} (max age {:?})",
        store.dir().display(),
        period,
        store.max_age()
    );

    // interval panics on a zero period
    let mut ticker = tokio::time::interval(period.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let report = store.sweep().await;
                debug!("Sweep finished: {:?}", report);
            }
            _ = cancel_token.cancelled() => {
                info!("Image sweeper shutting down");
                break;
            }
        }
    }
}
