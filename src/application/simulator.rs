// Simulator - Periodic telemetry ticks for a connected session
use crate::application::metric_sampler::MetricSampler;
use crate::application::session::{SessionContext, SharedSession};
use crate::domain::log_entry::LogLevel;
use crate::domain::metric::Metric;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

pub const WARNING_POOL: &[&str] = &[
    "Voltage fluctuation detected on Phase B.",
    "Latency detected on Sensor Node 4.",
    "HVAC damper response slower than expected in Zone A.",
    "Air filter differential pressure approaching service limit.",
    "Packet loss above 2% on gateway uplink.",
    "CO2 sensor calibration drift detected in Meeting Room 3.",
    "UPS battery self-test overdue.",
    "Occupancy sensor in Zone B reported stale data.",
];

#[derive(Debug, Clone)]
pub struct SimulatorSettings {
    pub tick_interval: Duration,
    pub occupancy_shift_probability: f64,
    pub warning_probability: f64,
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(2000),
            occupancy_shift_probability: 0.05,
            warning_probability: 0.02,
        }
    }
}

/// One simulation step: sample, shift occupancy, record, maybe warn, publish.
pub fn tick<R: Rng>(
    ctx: &mut SessionContext,
    settings: &SimulatorSettings,
    now_ms: i64,
    rng: &mut R,
) -> Metric {
    let next = MetricSampler::next(&ctx.current, now_ms, rng);
    let next = MetricSampler::shift_occupancy(next, settings.occupancy_shift_probability, rng);

    ctx.history.push(next.clone());

    if rng.gen_bool(settings.warning_probability.clamp(0.0, 1.0)) {
        if let Some(message) = WARNING_POOL.choose(rng) {
            ctx.logs.append(LogLevel::Warn, *message);
        }
    }

    ctx.current = next.clone();
    next
}

#[derive(Debug, Clone, Default)]
pub struct Simulator {
    settings: SimulatorSettings,
}

impl Simulator {
    pub fn new(settings: SimulatorSettings) -> Self {
        Self { settings }
    }

    pub fn start(&self, session: SharedSession) -> Subscription {
        self.start_with_rng(session, StdRng::from_entropy())
    }

    /// Spawn the tick loop. The first tick fires one period after start.
    pub fn start_with_rng(&self, session: SharedSession, mut rng: StdRng) -> Subscription {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let stopped = Arc::new(AtomicBool::new(false));
        let settings = self.settings.clone();
        let period = settings.tick_interval.max(Duration::from_millis(1));

        let task_session = session.clone();
        let task_stopped = stopped.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut count: u64 = 0;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = shutdown_rx.changed() => break,
                }

                let metric = {
                    let mut ctx = task_session.lock();
                    // Checked under the session lock so a concurrent stop() wins
                    if task_stopped.load(Ordering::SeqCst) {
                        break;
                    }
                    let now_ms = chrono::Utc::now().timestamp_millis();
                    tick(&mut ctx, &settings, now_ms, &mut rng)
                };

                count += 1;
                tracing::debug!(
                    tick = count,
                    temperature = metric.temperature,
                    co2 = metric.co2_level,
                    status = metric.status.as_str(),
                    "Simulator tick"
                );
            }

            tracing::debug!("Simulator loop exited after {} ticks", count);
        });

        tracing::info!("Simulator started (period {:?})", period);
        Subscription {
            session,
            stopped,
            shutdown: shutdown_tx,
            handle: Some(handle),
        }
    }
}

/// Handle to a running simulator loop. Dropping it stops the loop.
pub struct Subscription {
    session: SharedSession,
    stopped: Arc<AtomicBool>,
    shutdown: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl Subscription {
    #[cfg(test)]
    pub fn is_active(&self) -> bool {
        !self.stopped.load(Ordering::SeqCst)
    }

    /// Stop ticking. Once this returns no further tick touches the session.
    /// Safe to call more than once.
    pub fn stop(&mut self) {
        {
            let _ctx = self.session.lock();
            if self.stopped.swap(true, Ordering::SeqCst) {
                return;
            }
        }

        self.shutdown.send_replace(true);
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        tracing::info!("Simulator stopped");
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.stop();
    }
}
