//! Prometheus HTTP API client for the activity query

use super::{MetricsProbe, ProbeError};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct MetricsOptions {
    pub url: String,
    pub activity_query: String,
    pub request_timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    status: String,
    #[serde(default)]
    data: Option<QueryData>,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    #[serde(rename = "resultType")]
    result_type: String,
    #[serde(default)]
    result: Vec<VectorSample>,
}

#[derive(Debug, Deserialize)]
struct VectorSample {
    // Instant-vector samples carry `[timestamp, "value"]`.
    value: (f64, String),
}

/// Interprets an instant-query response. An empty vector is treated as a
/// malformed response rather than "no activity": the query aggregates a
/// rate over all series and should always yield one sample when the
/// backend is scraping.
fn parse_activity(response: &QueryResponse) -> Result<bool, ProbeError> {
    if response.status != "success" {
        return Err(ProbeError::UnexpectedResponse(format!(
            "query status {}",
            response.status
        )));
    }
    let data = response
        .data
        .as_ref()
        .ok_or_else(|| ProbeError::UnexpectedResponse("missing data section".to_string()))?;
    if data.result_type != "vector" {
        return Ok(false);
    }
    let sample = data.result.first().ok_or_else(|| {
        ProbeError::UnexpectedResponse("expected vector to have values".to_string())
    })?;
    let value: f64 = sample.value.1.parse().map_err(|_| {
        ProbeError::UnexpectedResponse(format!("unparsable sample value {:?}", sample.value.1))
    })?;
    Ok(value > 0.0)
}

#[derive(Debug, Clone)]
pub struct MetricsClient {
    url: String,
    activity_query: String,
    client: reqwest::Client,
}

impl MetricsClient {
    pub fn new(options: MetricsOptions) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(options.request_timeout)
            .build()?;
        Ok(Self {
            url: options.url,
            activity_query: options.activity_query,
            client,
        })
    }
}

#[async_trait::async_trait]
impl MetricsProbe for MetricsClient {
    async fn is_activity(&self) -> Result<bool, ProbeError> {
        let response = self
            .client
            .get(format!("{}/api/v1/query", self.url))
            .query(&[("query", self.activity_query.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json::<QueryResponse>()
            .await?;
        parse_activity(&response)
    }
}
