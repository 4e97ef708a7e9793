//! Plain HTTP reachability probe

use super::{ProbeError, ReachabilityProbe};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct WebClient {
    client: reqwest::Client,
}

impl WebClient {
    pub fn new(request_timeout: Duration) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl ReachabilityProbe for WebClient {
    async fn check_reachable(&self, url: &str) -> Result<(u16, String), ProbeError> {
        let response = self.client.head(url).send().await?;
        let status = response.status();
        let status_line = format!(
            "{} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        );
        Ok((status.as_u16(), status_line))
    }
}
