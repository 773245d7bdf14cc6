// Advisory request/response domain models
use super::metric::Metric;
use serde::{Deserialize, Serialize};

/// Number of trailing history readings averaged into the request.
pub const RECENT_WINDOW: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisoryResult {
    pub status_summary: String,
    pub anomalies: Vec<String>,
    pub recommendations: Vec<String>,
}

impl AdvisoryResult {
    /// Returned when no advisory credential is configured.
    pub fn nominal() -> Self {
        Self {
            status_summary: "Stable operation. Values within nominal range.".to_string(),
            anomalies: vec!["None. System performing optimally.".to_string()],
            recommendations: vec![
                "Continue standard monitoring.".to_string(),
                "Verify occupancy sensors in Zone B.".to_string(),
            ],
        }
    }

    /// Returned when the advisory call failed or answered with garbage.
    pub fn offline() -> Self {
        Self {
            status_summary: "AI Analysis Offline (Simulation Mode).".to_string(),
            anomalies: vec![
                "Connection to AI Service failed.".to_string(),
                "Using local heuristics.".to_string(),
            ],
            recommendations: vec![
                "Check internet connectivity.".to_string(),
                "Verify API Key configuration.".to_string(),
            ],
        }
    }

    pub fn is_well_formed(&self) -> bool {
        !self.status_summary.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisoryRequest {
    pub current_metric: Metric,
    pub recent_average_temperature: f64,
}

impl AdvisoryRequest {
    /// Average temperature over the last ten readings (fewer if the history is
    /// shorter). An empty history falls back to the current temperature.
    pub fn from_history(history: &[Metric], current: &Metric) -> Self {
        let window = &history[history.len().saturating_sub(RECENT_WINDOW)..];
        let recent_average_temperature = if window.is_empty() {
            current.temperature
        } else {
            window.iter().map(|m| m.temperature).sum::<f64>() / window.len() as f64
        };

        Self {
            current_metric: current.clone(),
            recent_average_temperature,
        }
    }

    pub fn prompt(&self) -> String {
        let m = &self.current_metric;
        format!(
            "You are an expert Facility Management System AI. Analyze the following indoor environment telemetry.\n\
             \n\
             Current Live Metrics:\n\
             - Temperature: {:.1}°C\n\
             - Humidity: {:.1}%\n\
             - CO2: {} ppm\n\
             - Power Usage: {} W\n\
             - Occupancy: {} people\n\
             - System Status: {}\n\
             \n\
             Recent Average Temperature (last {} readings): {:.1}°C.\n\
             \n\
             Provide a JSON response containing:\n\
             1. A short status summary (max 15 words).\n\
             2. A list of potential anomalies (if any, otherwise state \"None\").\n\
             3. A list of operational recommendations to improve efficiency or comfort.\n",
            m.temperature,
            m.humidity,
            m.co2_level,
            m.power_usage,
            m.occupancy,
            m.status.as_str(),
            RECENT_WINDOW,
            self.recent_average_temperature,
        )
    }
}
