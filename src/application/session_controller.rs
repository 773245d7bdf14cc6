// Session controller - Connect, disconnect and advisory use cases
use crate::application::advisory_client::AdvisoryClient;
use crate::application::boot_sequence::{BootOutcome, BootSequence};
use crate::application::session::{
    HistorySeed, SessionContext, SessionPhase, SessionSnapshot, SessionToken, SharedSession,
};
use crate::application::simulator::{Simulator, Subscription};
use crate::domain::advisory::AdvisoryResult;
use crate::domain::connection::ConnectionConfig;
use crate::domain::log_entry::{LevelFilter, LogEntry};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    Connected,
    /// A disconnect (or a newer connect) arrived before the boot finished.
    Cancelled,
}

#[derive(Default)]
struct RunningSession {
    shutdown: Option<watch::Sender<bool>>,
    boot: Option<JoinHandle<()>>,
    subscription: Option<Subscription>,
}

pub struct SessionController {
    session: SharedSession,
    simulator: Simulator,
    advisory: AdvisoryClient,
    seed: HistorySeed,
    boot_delay_scale: f64,
    running: Arc<Mutex<RunningSession>>,
}

impl SessionController {
    pub fn new(
        simulator: Simulator,
        advisory: AdvisoryClient,
        seed: HistorySeed,
        boot_delay_scale: f64,
    ) -> Self {
        Self {
            session: SessionContext::shared(seed.capacity),
            simulator,
            advisory,
            seed,
            boot_delay_scale,
            running: Arc::new(Mutex::new(RunningSession::default())),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.lock().snapshot()
    }

    #[cfg(test)]
    pub fn phase(&self) -> SessionPhase {
        self.session.lock().phase
    }

    pub fn logs(&self, filter: LevelFilter, search: &str) -> Vec<LogEntry> {
        self.session.lock().logs.query(filter, search)
    }

    /// Tear down whatever is running, then boot a new session for `config`.
    ///
    /// The boot runs on a task owned by the controller, so the session keeps
    /// booting even if the caller stops waiting. Resolves once the boot script
    /// has finished or was cancelled.
    pub async fn connect(&self, config: ConnectionConfig) -> ConnectOutcome {
        let config = config.normalized();
        self.disconnect();

        let (outcome_tx, outcome_rx) = oneshot::channel();
        {
            let mut running = self.running.lock();
            let generation = self.session.lock().begin(self.seed);
            let (tx, rx) = watch::channel(false);
            let token = SessionToken::new(self.session.clone(), generation, rx);
            tracing::info!(
                "Session {} connecting to {} ({:?})",
                generation,
                config.address,
                config.kind
            );

            let task = BootTask {
                boot: BootSequence::new(config, self.boot_delay_scale),
                token,
                session: self.session.clone(),
                simulator: self.simulator.clone(),
                running: self.running.clone(),
            };
            running.shutdown = Some(tx);
            running.boot = Some(tokio::spawn(task.run(outcome_tx)));
        }

        // The sender only goes away without a value when disconnect aborted the task
        outcome_rx.await.unwrap_or(ConnectOutcome::Cancelled)
    }

    /// End the current session, cancelling a boot in progress. Idempotent.
    pub fn disconnect(&self) {
        let (shutdown, subscription) = {
            let mut running = self.running.lock();
            let mut subscription = running.subscription.take();
            let shutdown = running.shutdown.take();
            let boot = running.boot.take();

            if let Some(boot) = boot.as_ref() {
                boot.abort();
            }

            if let Some(subscription) = subscription.as_mut() {
                subscription.stop();
            }

            let mut ctx = self.session.lock();
            if ctx.phase == SessionPhase::Idle
                && shutdown.is_none()
                && subscription.is_none()
                && boot.is_none()
            {
                return;
            }
            let ended = ctx.generation();
            ctx.teardown();
            tracing::info!("Session {} disconnected", ended);
            (shutdown, subscription)
        };

        if let Some(tx) = shutdown {
            tx.send_replace(true);
        }
        drop(subscription);
    }

    /// Run the advisory analysis for the connected session. Returns `None` if
    /// no session is connected, or if the session ended while the analysis
    /// was in flight (the stale result is dropped).
    pub async fn request_advisory(&self) -> Option<AdvisoryResult> {
        let (generation, history, current) = {
            let ctx = self.session.lock();
            if ctx.phase != SessionPhase::Connected {
                return None;
            }
            (ctx.generation(), ctx.history.snapshot(), ctx.current.clone())
        };

        let result = self.advisory.analyze(&history, &current).await;

        let mut ctx = self.session.lock();
        if ctx.generation() != generation {
            tracing::debug!("Discarding advisory result for ended session {}", generation);
            return None;
        }
        ctx.advisory = Some(result.clone());
        Some(result)
    }
}

/// Everything a boot needs once it is detached from the caller of `connect`.
struct BootTask {
    boot: BootSequence,
    token: SessionToken,
    session: SharedSession,
    simulator: Simulator,
    running: Arc<Mutex<RunningSession>>,
}

impl BootTask {
    async fn run(mut self, outcome: oneshot::Sender<ConnectOutcome>) {
        tracing::debug!("Boot script has {} steps", self.boot.steps().len());
        let booted = self.boot.run(self.token.clone()).await;
        tracing::debug!(
            "Session {} boot ended in {:?}",
            self.token.generation(),
            self.boot.state()
        );

        let result = match booted {
            BootOutcome::Cancelled => ConnectOutcome::Cancelled,
            BootOutcome::Connected => {
                let mut running = self.running.lock();
                if self.token.is_current() {
                    // Finished; detach our own handle so disconnect does not abort it
                    running.boot = None;
                    running.subscription = Some(self.simulator.start(self.session.clone()));
                    ConnectOutcome::Connected
                } else {
                    tracing::info!(
                        "Session {} ended before the simulator started",
                        self.token.generation()
                    );
                    ConnectOutcome::Cancelled
                }
            }
        };

        // Nobody may be waiting any more
        let _ = outcome.send(result);
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::advisory_service::{AdvisoryError, AdvisoryService};
    use crate::application::boot_sequence::STREAM_ACTIVE_MESSAGE;
    use crate::application::simulator::SimulatorSettings;
    use crate::domain::advisory::AdvisoryRequest;
    use crate::domain::log_entry::LogLevel;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;

    const SEED: HistorySeed = HistorySeed {
        capacity: 50,
        points: 60,
        interval_ms: 10_000,
    };

    struct SlowService;

    #[async_trait]
    impl AdvisoryService for SlowService {
        async fn analyze(&self, _request: &AdvisoryRequest) -> Result<AdvisoryResult, AdvisoryError> {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Ok(AdvisoryResult {
                status_summary: "All zones comfortable.".to_string(),
                anomalies: vec![],
                recommendations: vec!["Keep schedule.".to_string()],
            })
        }
    }

    fn controller(advisory: Option<Arc<dyn AdvisoryService>>) -> Arc<SessionController> {
        Arc::new(SessionController::new(
            Simulator::new(SimulatorSettings::default()),
            AdvisoryClient::new(advisory, Duration::from_secs(10), Duration::from_millis(1500)),
            SEED,
            1.0,
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_boots_then_simulates() {
        let controller = controller(None);
        let outcome = controller
            .connect(ConnectionConfig::lan("10.0.0.5", Some("9000".to_string())))
            .await;

        assert_eq!(outcome, ConnectOutcome::Connected);
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.phase, SessionPhase::Connected);
        assert_eq!(snapshot.history.len(), 50);
        assert_eq!(
            snapshot.logs.last().map(|e| e.message.as_str()),
            Some(STREAM_ACTIVE_MESSAGE)
        );
        let first_tick = snapshot.history.last().map(|m| m.timestamp);

        tokio::time::sleep(Duration::from_millis(2100)).await;
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.history.len(), 50);
        assert_ne!(snapshot.history.last().map(|m| m.timestamp), first_tick);
        assert_eq!(snapshot.current, snapshot.history.last().cloned().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_during_boot_cancels() {
        let controller = controller(None);
        let connecting = {
            let controller = controller.clone();
            tokio::spawn(async move {
                controller
                    .connect(ConnectionConfig::cloud("https://x.example/y"))
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(controller.phase(), SessionPhase::Connecting);
        controller.disconnect();

        assert_eq!(connecting.await.unwrap(), ConnectOutcome::Cancelled);

        tokio::time::sleep(Duration::from_secs(10)).await;
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.phase, SessionPhase::Idle);
        assert!(snapshot.history.is_empty());
        assert_eq!(snapshot.logs.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_boot_survives_dropped_caller() {
        let controller = controller(None);
        let connecting = {
            let controller = controller.clone();
            tokio::spawn(async move {
                controller
                    .connect(ConnectionConfig::lan("10.0.0.5", None))
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(controller.phase(), SessionPhase::Connecting);
        connecting.abort();
        assert!(connecting.await.unwrap_err().is_cancelled());

        tokio::time::sleep(Duration::from_secs(30)).await;
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.phase, SessionPhase::Connected);
        assert_eq!(snapshot.config.as_ref().map(|c| c.address.as_str()), Some("10.0.0.5"));
        assert_eq!(snapshot.history.len(), 50);
        assert!(snapshot
            .logs
            .iter()
            .any(|e| e.message == STREAM_ACTIVE_MESSAGE));
        assert_eq!(
            controller.request_advisory().await,
            Some(AdvisoryResult::nominal())
        );

        controller.disconnect();
        assert_eq!(controller.phase(), SessionPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_stops_simulation() {
        let controller = controller(None);
        controller.connect(ConnectionConfig::lan("10.0.0.5", None)).await;
        tokio::time::sleep(Duration::from_secs(5)).await;

        controller.disconnect();
        controller.disconnect();

        let before = controller.snapshot();
        tokio::time::sleep(Duration::from_secs(30)).await;
        let after = controller.snapshot();

        assert_eq!(after.phase, SessionPhase::Idle);
        assert!(after.history.is_empty());
        assert_eq!(after.logs, before.logs);
        assert_eq!(after.current, before.current);
    }

    #[tokio::test(start_paused = true)]
    async fn test_log_query_through_controller() {
        let controller = controller(None);
        controller.connect(ConnectionConfig::lan("10.0.0.5", None)).await;

        let warnings = controller.logs(LevelFilter::Only(LogLevel::Warn), "");
        assert!(warnings.iter().any(|e| e.message.contains("development server")));

        let hits = controller.logs(LevelFilter::All, "FLASK");
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_advisory_requires_connection() {
        let controller = controller(None);
        assert_eq!(controller.request_advisory().await, None);

        controller.connect(ConnectionConfig::lan("10.0.0.5", None)).await;
        let result = controller.request_advisory().await;
        assert_eq!(result, Some(AdvisoryResult::nominal()));
        assert_eq!(controller.snapshot().advisory, Some(AdvisoryResult::nominal()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_advisory_is_discarded() {
        let controller = controller(Some(Arc::new(SlowService)));
        controller.connect(ConnectionConfig::lan("10.0.0.5", None)).await;

        let pending = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.request_advisory().await })
        };

        tokio::time::sleep(Duration::from_secs(1)).await;
        controller.disconnect();
        controller.connect(ConnectionConfig::lan("10.0.0.6", None)).await;

        assert_eq!(pending.await.unwrap(), None);
        assert_eq!(controller.snapshot().advisory, None);
    }
}
