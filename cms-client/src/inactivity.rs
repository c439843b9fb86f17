use std::time::Duration;

use cms_core::InactivityClock;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::info;

use crate::session::SessionStore;

/// Фоновый таймер неактивности.
///
/// Любая активность переносит срок; по истечении срока локальная сессия
/// сбрасывается, а подписчики получают уведомление. К серверу таймер не
/// обращается.
pub struct InactivityWatch {
    activity: mpsc::UnboundedSender<()>,
    expired: watch::Receiver<bool>,
    task: JoinHandle<()>,
}

impl InactivityWatch {
    /// Запускает таймер для сессии с указанным лимитом.
    pub fn spawn(session: SessionStore, limit: Duration) -> Self {
        let (activity, mut activity_rx) = mpsc::unbounded_channel();
        let (expired_tx, expired) = watch::channel(false);

        let task = tokio::spawn(async move {
            let started = Instant::now();
            let elapsed_ms = || u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            let mut clock = InactivityClock::new(limit, 0);

            loop {
                let deadline = started + Duration::from_millis(clock.deadline_ms());
                tokio::select! {
                    _ = sleep_until(deadline) => {
                        if session.clear() {
                            info!(limit_secs = limit.as_secs(), "logged out due to inactivity");
                        }
                        let _ = expired_tx.send(true);
                        break;
                    }
                    message = activity_rx.recv() => match message {
                        Some(()) => clock.record_activity(elapsed_ms()),
                        None => break,
                    },
                }
            }
        });

        Self {
            activity,
            expired,
            task,
        }
    }

    /// Сообщает об активности пользователя.
    pub fn record_activity(&self) {
        let _ = self.activity.send(());
    }

    /// Истёк ли срок.
    pub fn is_expired(&self) -> bool {
        *self.expired.borrow()
    }

    /// Ждёт истечения срока.
    pub async fn expired(&mut self) {
        let _ = self.expired.wait_for(|expired| *expired).await;
    }
}

impl Drop for InactivityWatch {
    fn drop(&mut self) {
        self.task.abort();
    }
}
