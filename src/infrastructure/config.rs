use crate::application::session::HistorySeed;
use crate::application::simulator::SimulatorSettings;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub simulation: SimulationSettings,
    #[serde(default)]
    pub boot: BootSettings,
    #[serde(default)]
    pub advisory: AdvisorySettings,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimulationSettings {
    pub tick_interval_ms: u64,
    pub history_capacity: usize,
    pub seed_points: usize,
    pub seed_interval_ms: i64,
    pub warning_probability: f64,
    pub occupancy_shift_probability: f64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 2000,
            history_capacity: 50,
            seed_points: 60,
            seed_interval_ms: 10_000,
            warning_probability: 0.02,
            occupancy_shift_probability: 0.05,
        }
    }
}

impl SimulationSettings {
    pub fn simulator_settings(&self) -> SimulatorSettings {
        SimulatorSettings {
            tick_interval: Duration::from_millis(self.tick_interval_ms),
            occupancy_shift_probability: self.occupancy_shift_probability,
            warning_probability: self.warning_probability,
        }
    }

    pub fn history_seed(&self) -> HistorySeed {
        HistorySeed {
            capacity: self.history_capacity,
            points: self.seed_points,
            interval_ms: self.seed_interval_ms,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BootSettings {
    /// Multiplier applied to every scripted boot pause.
    pub delay_scale: f64,
}

impl Default for BootSettings {
    fn default() -> Self {
        Self { delay_scale: 1.0 }
    }
}

impl BootSettings {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.delay_scale.is_finite() && self.delay_scale >= 0.0,
            "boot.delay_scale must be a finite, non-negative number (got {})",
            self.delay_scale
        );
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AdvisorySettings {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub offline_delay_ms: u64,
}

impl Default for AdvisorySettings {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key: None,
            timeout_secs: 20,
            offline_delay_ms: 0,
        }
    }
}

impl AdvisorySettings {
    /// Configured credential, ignoring blank values.
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn offline_delay(&self) -> Duration {
        Duration::from_millis(self.offline_delay_ms)
    }
}

/// Load `config/indoor.*` (optional) overridden by `INDOOR_*` environment
/// variables, e.g. `INDOOR_ADVISORY__API_KEY`.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/indoor").required(false))
        .add_source(
            config::Environment::with_prefix("INDOOR")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let mut app_config: AppConfig = settings.try_deserialize()?;
    app_config.boot.validate()?;

    // Plain API_KEY is what the dashboard has always read
    if app_config.advisory.credential().is_none() {
        app_config.advisory.api_key = std::env::var("API_KEY").ok();
    }

    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_source() {
        let settings = config::Config::builder().build().unwrap();
        let app_config: AppConfig = settings.try_deserialize().unwrap();

        assert_eq!(app_config.server.port, 8080);
        assert_eq!(app_config.simulation.history_capacity, 50);
        assert_eq!(app_config.simulation.seed_points, 60);
        assert_eq!(
            app_config.simulation.simulator_settings().tick_interval,
            Duration::from_millis(2000)
        );
        assert_eq!(app_config.advisory.model, "gemini-2.5-flash");
        assert_eq!(app_config.advisory.credential(), None);
    }

    #[test]
    fn test_partial_toml_overrides() {
        let toml = r#"
            [simulation]
            tick_interval_ms = 500

            [boot]
            delay_scale = 0.0

            [advisory]
            api_key = "   "
        "#;
        let settings = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap();
        let app_config: AppConfig = settings.try_deserialize().unwrap();

        assert_eq!(app_config.simulation.tick_interval_ms, 500);
        assert_eq!(app_config.simulation.history_capacity, 50);
        assert_eq!(app_config.boot.delay_scale, 0.0);
        assert_eq!(app_config.advisory.credential(), None);
        assert_eq!(app_config.advisory.timeout(), Duration::from_secs(20));
    }

    #[test]
    fn test_delay_scale_must_be_finite() {
        assert!(BootSettings::default().validate().is_ok());
        assert!(BootSettings { delay_scale: 0.0 }.validate().is_ok());
        assert!(BootSettings { delay_scale: f64::INFINITY }.validate().is_err());
        assert!(BootSettings { delay_scale: f64::NAN }.validate().is_err());
        assert!(BootSettings { delay_scale: -1.0 }.validate().is_err());
    }
}
