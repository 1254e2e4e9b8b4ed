//! HTTP client for the TED time-series API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::decomposition::Frequency;

use super::{SeriesSource, SourceError, TedRequest, TedResponse};

/// Client for the TED batch series endpoint.
#[derive(Debug, Clone)]
pub struct TedClient {
    client: Client,
    base_url: String,
}

impl TedClient {
    /// Create a client against the given base URL.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl SeriesSource for TedClient {
    async fn fetch(
        &self,
        series: &[String],
        frequency: Frequency,
        start_period: &str,
    ) -> Result<TedResponse, SourceError> {
        let url = format!("{}/ted", self.base_url);
        let request = TedRequest {
            series: series.to_vec(),
            freq: frequency.code().to_string(),
            start_period: start_period.to_string(),
        };

        debug!(%url, %frequency, count = series.len(), "fetching series batch");
        let response = self.client.post(&url).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                url,
            });
        }
        let body: TedResponse = response.json().await?;
        debug!(
            %frequency,
            periods = body.periods.len(),
            series = body.series.len(),
            "series batch received"
        );
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn test_fetch_posts_batch_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ted"))
            .and(body_json(json!({
                "series": ["gdpn", "gden"],
                "freq": "Y",
                "start_period": "1993",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "periods": ["1993", "1994"],
                "series": [
                    {"name": "gdpn", "values": [100.0, 105.0]},
                    {"name": "gden", "values": [99.0, 104.0]},
                ],
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = TedClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let response = client
            .fetch(
                &["gdpn".to_string(), "gden".to_string()],
                Frequency::Yearly,
                "1993",
            )
            .await
            .unwrap();

        assert_eq!(response.periods, vec!["1993", "1994"]);
        assert_eq!(response.series[1].name, "gden");
        assert_eq!(response.series[1].values, vec![99.0, 104.0]);
    }

    #[tokio::test]
    async fn test_fetch_surfaces_http_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ted"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let client = TedClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let err = client
            .fetch(&["gdpn".to_string()], Frequency::Quarterly, "1993Q1")
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Status { status: 502, .. }));
    }
}
