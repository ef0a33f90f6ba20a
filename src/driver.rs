use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::GameError;
use crate::session::{GameSession, TickReport};
use crate::types::SessionPhase;

pub type SharedSession = Arc<Mutex<GameSession>>;

/// Called under the session lock after every successful tick.
pub type TickListener = Arc<dyn Fn(&mut GameSession, &TickReport) + Send + Sync>;

/// Calls `GameSession::tick` at the session's period on a tokio task. Ticks
/// and public setters share one lock, so they never overlap.
pub struct TickDriver {
    session: SharedSession,
    listener: Option<TickListener>,
    period: Duration,
    task: Option<JoinHandle<()>>,
}

impl TickDriver {
    pub fn new(session: SharedSession, listener: Option<TickListener>) -> Self {
        Self {
            session,
            listener,
            period: Duration::ZERO,
            task: None,
        }
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// (Re)starts at the period currently stored on the session.
    pub async fn start(&mut self) {
        self.abort_task();
        let tick_ms = self.session.lock().await.tick_ms();
        self.spawn(Duration::from_millis(tick_ms));
    }

    /// Stops the running loop, waits out any in-flight tick, applies the new
    /// period and starts again. The first tick lands one period from now.
    pub async fn set_speed(&mut self, ms: u64) -> u64 {
        self.abort_task();
        let applied = self.session.lock().await.set_tick_period(ms);
        self.spawn(Duration::from_millis(applied));
        info!(tick_ms = applied, "tick driver restarted");
        applied
    }

    pub fn stop(&mut self) {
        self.abort_task();
    }

    fn abort_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    fn spawn(&mut self, period: Duration) {
        self.period = period;
        let session = self.session.clone();
        let listener = self.listener.clone();
        self.task = Some(tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let mut guard = session.lock().await;
                if guard.phase() != SessionPhase::Playing {
                    continue;
                }
                match guard.tick() {
                    Ok(report) => {
                        if let Some(listener) = listener.as_ref() {
                            listener(&mut *guard, &report);
                        }
                    }
                    Err(GameError::State(error)) => debug!(%error, "tick skipped"),
                    Err(error) => warn!(%error, "tick failed"),
                }
            }
        }));
    }
}

impl Drop for TickDriver {
    fn drop(&mut self) {
        self.abort_task();
    }
}
