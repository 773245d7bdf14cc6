// Advisory client - Always-resolving wrapper around the advisory service
use crate::application::advisory_service::{AdvisoryError, AdvisoryService};
use crate::domain::advisory::{AdvisoryRequest, AdvisoryResult};
use crate::domain::metric::Metric;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AdvisoryClient {
    service: Option<Arc<dyn AdvisoryService>>,
    timeout: Duration,
    offline_delay: Duration,
}

impl AdvisoryClient {
    /// `service` is `None` when no advisory credential is configured.
    pub fn new(
        service: Option<Arc<dyn AdvisoryService>>,
        timeout: Duration,
        offline_delay: Duration,
    ) -> Self {
        Self {
            service,
            timeout,
            offline_delay,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.service.is_some()
    }

    /// Analyze the session telemetry. Never fails: a missing credential yields
    /// the nominal result, any failure yields the offline result.
    pub async fn analyze(&self, history: &[Metric], current: &Metric) -> AdvisoryResult {
        let Some(service) = &self.service else {
            tracing::debug!("No advisory credential configured, using nominal result");
            tokio::time::sleep(self.offline_delay).await;
            return AdvisoryResult::nominal();
        };

        let request = AdvisoryRequest::from_history(history, current);
        let outcome = match tokio::time::timeout(self.timeout, service.analyze(&request)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("Advisory call timed out after {:?}", self.timeout);
                return AdvisoryResult::offline();
            }
        };

        match outcome.and_then(validate) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("Advisory analysis failed: {}", e);
                AdvisoryResult::offline()
            }
        }
    }
}

fn validate(result: AdvisoryResult) -> Result<AdvisoryResult, AdvisoryError> {
    if result.is_well_formed() {
        Ok(result)
    } else {
        Err(AdvisoryError::MissingSummary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct StubService {
        reply: fn() -> Result<AdvisoryResult, AdvisoryError>,
        delay: Duration,
        seen: Mutex<Vec<AdvisoryRequest>>,
    }

    impl StubService {
        fn new(reply: fn() -> Result<AdvisoryResult, AdvisoryError>) -> Self {
            Self {
                reply,
                delay: Duration::ZERO,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl AdvisoryService for StubService {
        async fn analyze(&self, request: &AdvisoryRequest) -> Result<AdvisoryResult, AdvisoryError> {
            self.seen.lock().push(request.clone());
            tokio::time::sleep(self.delay).await;
            (self.reply)()
        }
    }

    fn client(service: Arc<dyn AdvisoryService>) -> AdvisoryClient {
        AdvisoryClient::new(Some(service), Duration::from_secs(5), Duration::from_millis(1500))
    }

    fn history() -> Vec<Metric> {
        (0..12)
            .map(|i| Metric::new(20.0 + i as f64, 45.0, 420, 1200, 10, i))
            .collect()
    }

    fn insight() -> Result<AdvisoryResult, AdvisoryError> {
        Ok(AdvisoryResult {
            status_summary: "Warm afternoon, ventilation adequate.".to_string(),
            anomalies: vec!["None".to_string()],
            recommendations: vec!["Lower setpoint by 1°C.".to_string()],
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_unconfigured_returns_nominal() {
        let client = AdvisoryClient::new(None, Duration::from_secs(5), Duration::from_millis(1500));
        assert!(!client.is_configured());

        let result = client.analyze(&history(), &Metric::baseline(0)).await;
        assert_eq!(result, AdvisoryResult::nominal());
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_call_passes_through() {
        let stub = Arc::new(StubService::new(insight));
        let result = client(stub.clone()).analyze(&history(), &Metric::baseline(0)).await;

        assert_eq!(result, insight().unwrap());

        // Average of the last ten readings: 22.0..=31.0
        let seen = stub.seen.lock();
        assert_eq!(seen.len(), 1);
        assert!((seen[0].recent_average_temperature - 26.5).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_returns_offline() {
        let stub = Arc::new(StubService::new(|| Err(AdvisoryError::EmptyResponse)));
        let result = client(stub).analyze(&history(), &Metric::baseline(0)).await;
        assert_eq!(result, AdvisoryResult::offline());
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_returns_offline() {
        let stub = Arc::new(StubService::new(|| {
            Err(serde_json::from_str::<AdvisoryResult>("{\"anomalies\": 3}")
                .unwrap_err()
                .into())
        }));
        let result = client(stub).analyze(&[], &Metric::baseline(0)).await;
        assert_eq!(result, AdvisoryResult::offline());
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_summary_returns_offline() {
        let stub = Arc::new(StubService::new(|| {
            Ok(AdvisoryResult {
                status_summary: "  ".to_string(),
                anomalies: vec![],
                recommendations: vec![],
            })
        }));
        let result = client(stub).analyze(&history(), &Metric::baseline(0)).await;
        assert_eq!(result, AdvisoryResult::offline());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_returns_offline() {
        let mut stub = StubService::new(insight);
        stub.delay = Duration::from_secs(60);
        let result = client(Arc::new(stub))
            .analyze(&history(), &Metric::baseline(0))
            .await;
        assert_eq!(result, AdvisoryResult::offline());
    }
}
