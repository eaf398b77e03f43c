use std::time::Duration;

use crate::adapters::block_on_current;
use crate::error::DownstreamFailure;

pub const DEFAULT_DOWNSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

/// The protected call. Any error, including a timeout, counts as a failure.
pub trait Downstream {
    fn call(&self, resource: &str) -> Result<String, DownstreamFailure>;
}

/// GET against the protected resource, bounded by `timeout`.
#[derive(Clone)]
pub struct HttpDownstream {
    client: reqwest::Client,
    url_override: Option<String>,
    timeout: Duration,
}

impl HttpDownstream {
    pub fn new(url_override: Option<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            url_override,
            timeout,
        }
    }

    fn target_url(&self, resource: &str) -> String {
        match &self.url_override {
            Some(url) => url.clone(),
            None if resource.contains("://") => resource.to_string(),
            None => format!("https://{resource}"),
        }
    }

    fn classify(&self, error: reqwest::Error) -> DownstreamFailure {
        if error.is_timeout() {
            DownstreamFailure::Timeout {
                after_seconds: self.timeout.as_secs(),
            }
        } else {
            DownstreamFailure::Failed(error.to_string())
        }
    }
}

impl Downstream for HttpDownstream {
    fn call(&self, resource: &str) -> Result<String, DownstreamFailure> {
        let url = self.target_url(resource);
        let request = self.client.get(url).timeout(self.timeout);

        block_on_current(async move {
            let response = request.send().await.map_err(|error| self.classify(error))?;
            let status = response.status();
            if !status.is_success() {
                return Err(DownstreamFailure::Failed(format!(
                    "downstream returned status {status}"
                )));
            }
            response.text().await.map_err(|error| self.classify(error))
        })
    }
}

/// Always reports a timeout without waiting for one. Stands in for a dependency
/// that is known to be down.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedOutage {
    pub timeout: Duration,
}

impl Default for SimulatedOutage {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_DOWNSTREAM_TIMEOUT,
        }
    }
}

impl Downstream for SimulatedOutage {
    fn call(&self, _resource: &str) -> Result<String, DownstreamFailure> {
        Err(DownstreamFailure::Timeout {
            after_seconds: self.timeout.as_secs(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_resources_default_to_https() {
        let downstream = HttpDownstream::new(None, DEFAULT_DOWNSTREAM_TIMEOUT);
        assert_eq!(
            downstream.target_url("www.example.com"),
            "https://www.example.com"
        );
        assert_eq!(
            downstream.target_url("http://localhost:8080/health"),
            "http://localhost:8080/health"
        );
    }

    #[test]
    fn configured_url_wins_over_resource() {
        let downstream = HttpDownstream::new(
            Some("http://backend.internal/ping".to_string()),
            DEFAULT_DOWNSTREAM_TIMEOUT,
        );
        assert_eq!(
            downstream.target_url("www.example.com"),
            "http://backend.internal/ping"
        );
    }

    #[test]
    fn simulated_outage_reports_timeout() {
        let failure = SimulatedOutage::default()
            .call("www.example.com")
            .expect_err("simulated outage should fail");
        assert_eq!(failure, DownstreamFailure::Timeout { after_seconds: 10 });
    }
}
