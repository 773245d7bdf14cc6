// Indoor environment metric domain model
use serde::{Deserialize, Serialize};

pub const CRITICAL_TEMPERATURE_C: f64 = 35.0;
pub const CRITICAL_CO2_PPM: u32 = 1500;
pub const WARNING_TEMPERATURE_C: f64 = 28.0;
pub const WARNING_CO2_PPM: u32 = 1000;

pub const MIN_CO2_PPM: u32 = 400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MetricStatus {
    Optimal,
    Warning,
    Critical,
}

impl MetricStatus {
    /// Classify a reading. The critical thresholds are checked first.
    pub fn classify(temperature: f64, co2_level: u32) -> Self {
        if temperature > CRITICAL_TEMPERATURE_C || co2_level > CRITICAL_CO2_PPM {
            MetricStatus::Critical
        } else if temperature > WARNING_TEMPERATURE_C || co2_level > WARNING_CO2_PPM {
            MetricStatus::Warning
        } else {
            MetricStatus::Optimal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricStatus::Optimal => "OPTIMAL",
            MetricStatus::Warning => "WARNING",
            MetricStatus::Critical => "CRITICAL",
        }
    }
}

/// One telemetry reading. Readings are superseded, never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    pub temperature: f64,
    pub humidity: f64,
    pub co2_level: u32,
    pub power_usage: u32,
    pub occupancy: u32,
    pub timestamp: i64,
    pub status: MetricStatus,
}

impl Metric {
    pub fn new(
        temperature: f64,
        humidity: f64,
        co2_level: u32,
        power_usage: u32,
        occupancy: u32,
        timestamp: i64,
    ) -> Self {
        Self {
            temperature,
            humidity,
            co2_level,
            power_usage,
            occupancy,
            timestamp,
            status: MetricStatus::classify(temperature, co2_level),
        }
    }

    /// Reading every session starts from: a comfortable, occupied floor.
    pub fn baseline(timestamp: i64) -> Self {
        Self::new(22.5, 45.0, 420, 1250, 42, timestamp)
    }

    pub fn with_occupancy(&self, occupancy: u32) -> Self {
        Self {
            occupancy,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_thresholds() {
        assert_eq!(MetricStatus::classify(22.0, 420), MetricStatus::Optimal);
        assert_eq!(MetricStatus::classify(28.0, 1000), MetricStatus::Optimal);
        assert_eq!(MetricStatus::classify(28.01, 420), MetricStatus::Warning);
        assert_eq!(MetricStatus::classify(22.0, 1001), MetricStatus::Warning);
        assert_eq!(MetricStatus::classify(35.5, 420), MetricStatus::Critical);
        assert_eq!(MetricStatus::classify(22.0, 1501), MetricStatus::Critical);
    }

    #[test]
    fn test_critical_takes_precedence() {
        // Both warning and critical conditions hold
        assert_eq!(MetricStatus::classify(36.0, 1200), MetricStatus::Critical);
        assert_eq!(MetricStatus::classify(30.0, 1600), MetricStatus::Critical);
    }

    #[test]
    fn test_serializes_as_camel_case() {
        let metric = Metric::baseline(1_700_000_000_000);
        let json = serde_json::to_value(&metric).unwrap();

        assert_eq!(json["co2Level"], 420);
        assert_eq!(json["powerUsage"], 1250);
        assert_eq!(json["status"], "OPTIMAL");
    }
}
