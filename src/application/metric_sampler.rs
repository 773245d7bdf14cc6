// Metric sampler - Bounded random walk over the previous reading
use crate::domain::metric::{Metric, MIN_CO2_PPM};
use rand::Rng;

const TEMPERATURE_STEP: f64 = 0.25;
const HUMIDITY_STEP: f64 = 0.5;
const CO2_STEP: f64 = 10.0;
const POWER_STEP: f64 = 25.0;

/// Produces the next reading from the previous one. Occupancy is carried
/// over untouched; the simulator decides when people come and go.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricSampler;

impl MetricSampler {
    pub fn next<R: Rng>(prev: &Metric, timestamp: i64, rng: &mut R) -> Metric {
        let temperature = round2(prev.temperature + rng.gen_range(-TEMPERATURE_STEP..TEMPERATURE_STEP));
        let humidity = round2(
            (prev.humidity + rng.gen_range(-HUMIDITY_STEP..HUMIDITY_STEP)).clamp(0.0, 100.0),
        );
        let co2_level = (prev.co2_level as f64 + rng.gen_range(-CO2_STEP..CO2_STEP))
            .floor()
            .max(MIN_CO2_PPM as f64) as u32;
        let power_usage = (prev.power_usage as f64 + rng.gen_range(-POWER_STEP..POWER_STEP))
            .floor()
            .max(0.0) as u32;

        Metric::new(
            temperature,
            humidity,
            co2_level,
            power_usage,
            prev.occupancy,
            timestamp,
        )
    }

    /// With probability `probability`, move occupancy by one person in either
    /// direction, never below zero.
    pub fn shift_occupancy<R: Rng>(metric: Metric, probability: f64, rng: &mut R) -> Metric {
        if !rng.gen_bool(probability.clamp(0.0, 1.0)) {
            return metric;
        }

        let occupancy = if rng.gen_bool(0.5) {
            metric.occupancy.saturating_add(1)
        } else {
            metric.occupancy.saturating_sub(1)
        };
        metric.with_occupancy(occupancy)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
