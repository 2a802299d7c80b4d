use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{client::GameClient, transport::GameTransport, view::Notifier};

pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Repeating snapshot refresh bound to this handle's lifetime.
///
/// Dropping the handle (or calling [`Poller::stop`]) cancels the loop, so a
/// poller can never outlive the view that started it.
pub struct Poller {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
    period: Duration,
}

impl Poller {
    pub fn spawn<T: GameTransport>(
        client: GameClient<T>,
        period: Duration,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        // interval() 은 0 주기를 허용하지 않음
        let period = if period < MIN_PERIOD {
            warn!(
                period_ms = period.as_millis() as u64,
                "poll period too small, using {:?}", MIN_PERIOD
            );
            MIN_PERIOD
        } else {
            period
        };

        let token = CancellationToken::new();
        let child = token.child_token();

        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // 첫 tick 은 즉시 발생. 로그인 직후 이미 refresh 했으므로 건너뜀
            ticker.tick().await;

            loop {
                tokio::select! {
                    biased;
                    _ = child.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = client.update().await {
                            // stop() 이후 세션이 정리되며 생긴 실패는 알리지 않음
                            if child.is_cancelled() {
                                debug!("poll failed after stop: {}", e);
                                break;
                            }
                            notifier.alert(&e);
                        }
                    }
                }
            }
            debug!("poll loop exited");
        });

        info!(period_ms = period.as_millis() as u64, "polling started");
        Self {
            token,
            task: Some(task),
            period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished()) && !self.token.is_cancelled()
    }

    pub fn stop(&mut self) {
        if !self.token.is_cancelled() {
            info!("polling stopped");
        }
        self.token.cancel();
    }

    /// Stops the loop and waits for an in-flight refresh to finish.
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
