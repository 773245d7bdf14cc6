// Session context - All per-session state behind a single lock
use crate::application::history_window::HistoryWindow;
use crate::application::log_bus::LogBus;
use crate::domain::advisory::AdvisoryResult;
use crate::domain::connection::ConnectionConfig;
use crate::domain::log_entry::LogEntry;
use crate::domain::metric::Metric;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

pub type SharedSession = Arc<Mutex<SessionContext>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionPhase {
    Idle,
    Connecting,
    Connected,
}

/// How a fresh session's history is synthesized.
#[derive(Debug, Clone, Copy)]
pub struct HistorySeed {
    pub capacity: usize,
    pub points: usize,
    pub interval_ms: i64,
}

#[derive(Debug)]
pub struct SessionContext {
    pub phase: SessionPhase,
    pub config: Option<ConnectionConfig>,
    pub current: Metric,
    pub history: HistoryWindow,
    pub logs: LogBus,
    pub advisory: Option<AdvisoryResult>,
    generation: u64,
}

impl SessionContext {
    pub fn idle(history_capacity: usize) -> Self {
        Self {
            phase: SessionPhase::Idle,
            config: None,
            current: Metric::baseline(chrono::Utc::now().timestamp_millis()),
            history: HistoryWindow::new(history_capacity),
            logs: LogBus::idle_banner(),
            advisory: None,
            generation: 0,
        }
    }

    pub fn shared(history_capacity: usize) -> SharedSession {
        Arc::new(Mutex::new(Self::idle(history_capacity)))
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a new session generation: clear the log, reseed the history and
    /// enter CONNECTING. Returns the new generation.
    pub fn begin(&mut self, seed: HistorySeed) -> u64 {
        let now = chrono::Utc::now().timestamp_millis();
        let baseline = Metric::baseline(now);

        self.generation += 1;
        self.phase = SessionPhase::Connecting;
        self.config = None;
        self.history = HistoryWindow::seeded(
            seed.capacity,
            &baseline,
            seed.points,
            seed.interval_ms,
            now,
            &mut rand::thread_rng(),
        );
        self.current = baseline;
        self.logs.reset();
        self.advisory = None;
        self.generation
    }

    /// Invalidate the running generation and return to the idle state.
    pub fn teardown(&mut self) {
        self.generation += 1;
        self.phase = SessionPhase::Idle;
        self.config = None;
        self.current = Metric::baseline(chrono::Utc::now().timestamp_millis());
        self.history.clear();
        self.logs = LogBus::idle_banner();
        self.advisory = None;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            config: self.config.clone(),
            current: self.current.clone(),
            history: self.history.snapshot(),
            logs: self.logs.entries().to_vec(),
            advisory: self.advisory.clone(),
        }
    }
}

/// Consistent copy of the session handed to renderers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub config: Option<ConnectionConfig>,
    pub current: Metric,
    pub history: Vec<Metric>,
    pub logs: Vec<LogEntry>,
    pub advisory: Option<AdvisoryResult>,
}

/// Cancellation token for one session generation. Mutations made through it
/// become no-ops as soon as the generation is torn down.
#[derive(Debug, Clone)]
pub struct SessionToken {
    session: SharedSession,
    generation: u64,
    shutdown: watch::Receiver<bool>,
}

impl SessionToken {
    pub fn new(session: SharedSession, generation: u64, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            session,
            generation,
            shutdown,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self) -> bool {
        !*self.shutdown.borrow() && self.session.lock().generation == self.generation
    }

    /// Run `f` under the session lock if this generation is still live.
    pub fn apply<T>(&self, f: impl FnOnce(&mut SessionContext) -> T) -> Option<T> {
        let mut ctx = self.session.lock();
        if ctx.generation != self.generation || *self.shutdown.borrow() {
            return None;
        }
        Some(f(&mut ctx))
    }

    /// Sleep for `duration`, waking early on shutdown. Returns `false` if the
    /// session was cancelled.
    pub async fn sleep(&mut self, duration: Duration) -> bool {
        if *self.shutdown.borrow() {
            return false;
        }
        if duration.is_zero() {
            return true;
        }

        let sleep = tokio::time::sleep(duration);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep => return !*self.shutdown.borrow(),
                changed = self.shutdown.changed() => {
                    if changed.is_err() {
                        // Sender gone, nothing can cancel us any more
                        (&mut sleep).await;
                        return !*self.shutdown.borrow();
                    }
                    if *self.shutdown.borrow() {
                        return false;
                    }
                }
            }
        }
    }
}
