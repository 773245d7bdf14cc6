// Boot sequence - Scripted connection handshake written to the session log
use crate::application::session::{SessionPhase, SessionToken};
use crate::domain::connection::{ConnectionConfig, ConnectionType};
use crate::domain::log_entry::LogLevel;
use std::time::Duration;

pub const STREAM_ACTIVE_MESSAGE: &str = "Worker initialized. Telemetry stream active.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootState {
    Idle,
    Connecting,
    /// The stage with this index has been written to the log.
    Stage(usize),
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootOutcome {
    Connected,
    Cancelled,
}

/// One scripted log line and the pause that follows it.
#[derive(Debug, Clone, PartialEq)]
pub struct BootStep {
    pub level: LogLevel,
    pub message: String,
    pub pause_ms: u64,
}

impl BootStep {
    fn info(message: impl Into<String>, pause_ms: u64) -> Self {
        Self {
            level: LogLevel::Info,
            message: message.into(),
            pause_ms,
        }
    }

    fn warn(message: impl Into<String>, pause_ms: u64) -> Self {
        Self {
            level: LogLevel::Warn,
            message: message.into(),
            pause_ms,
        }
    }
}

/// The handshake script for a connection, in emission order.
pub fn script(config: &ConnectionConfig) -> Vec<BootStep> {
    let mut steps = match config.kind {
        ConnectionType::Lan => {
            let port = config.lan_port();
            vec![
                BootStep::info(
                    format!("pi@indoor-node:~$ flask run --host=0.0.0.0 --port={}", port),
                    400,
                ),
                BootStep::info(" * Serving Flask app \"indoor_monitor\"", 0),
                BootStep::info(" * Environment: production", 0),
                BootStep::warn(
                    "   WARNING: This is a development server. Do not use it in a production deployment.",
                    0,
                ),
                BootStep::info("   Use a production WSGI server instead.", 300),
                BootStep::info(" * Debug mode: off", 0),
                BootStep::info(
                    format!(
                        " * Running on http://{}:{}/ (Press CTRL+C to quit)",
                        config.address, port
                    ),
                    200,
                ),
            ]
        }
        ConnectionType::Cloud => vec![
            BootStep::info("admin@server:~$ python manage.py runserver", 400),
            BootStep::info("Watching for file changes with StatReloader", 300),
            BootStep::info("Performing system checks...", 200),
            BootStep::info("System check identified no issues (0 silenced).", 300),
            BootStep::info(
                "Django version 4.2.7, using settings \"core.settings.prod\"",
                0,
            ),
            BootStep::info(
                format!("Starting ASGI/Daphne server at {}", config.address),
                300,
            ),
            BootStep::info(
                "TLS 1.3 Handshake successful. Secure Tunnel Established.",
                200,
            ),
        ],
    };

    steps.push(BootStep::info(STREAM_ACTIVE_MESSAGE, 400));
    steps
}

pub struct BootSequence {
    config: ConnectionConfig,
    steps: Vec<BootStep>,
    delay_scale: f64,
    state: BootState,
}

impl BootSequence {
    pub fn new(config: ConnectionConfig, delay_scale: f64) -> Self {
        let steps = script(&config);
        Self {
            config,
            steps,
            delay_scale: delay_scale.max(0.0),
            state: BootState::Idle,
        }
    }

    pub fn state(&self) -> BootState {
        self.state
    }

    pub fn steps(&self) -> &[BootStep] {
        &self.steps
    }

    /// Drive the script to completion. Every append goes through `token`, so
    /// once the session is torn down the remaining steps do nothing.
    pub async fn run(&mut self, mut token: SessionToken) -> BootOutcome {
        self.state = BootState::Connecting;
        tracing::info!(
            "Boot sequence starting ({:?} -> {})",
            self.config.kind,
            self.config.address
        );

        for (index, step) in self.steps.iter().enumerate() {
            let appended = token.apply(|ctx| {
                ctx.logs.append(step.level, step.message.clone());
            });
            if appended.is_none() {
                self.state = BootState::Idle;
                return cancelled(index);
            }
            self.state = BootState::Stage(index);

            if !token.sleep(scaled(step.pause_ms, self.delay_scale)).await {
                self.state = BootState::Idle;
                return cancelled(index + 1);
            }
        }

        let config = self.config.clone();
        let connected = token.apply(move |ctx| {
            ctx.phase = SessionPhase::Connected;
            ctx.config = Some(config);
        });
        if connected.is_none() {
            self.state = BootState::Idle;
            return cancelled(self.steps.len());
        }

        self.state = BootState::Connected;
        tracing::info!("Boot sequence complete, session {} connected", token.generation());
        BootOutcome::Connected
    }
}

fn cancelled(at_step: usize) -> BootOutcome {
    tracing::info!("Boot sequence cancelled before step {}", at_step);
    BootOutcome::Cancelled
}

/// Scaled pause. A scale that does not fit a `Duration` means no pause.
fn scaled(pause_ms: u64, delay_scale: f64) -> Duration {
    Duration::try_from_secs_f64(pause_ms as f64 * delay_scale / 1000.0).unwrap_or(Duration::ZERO)
}
