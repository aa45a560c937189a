pub mod gist;
pub mod traffic;

use reqwest::{Client, RequestBuilder, Response};

use crate::config::Config;
use crate::error::StatsError;

/// Cap on how much of an error body is embedded in an error message.
const MAX_ERROR_BODY_BYTES: usize = 64 * 1024;

const USER_AGENT: &str = concat!("traffic-stats/", env!("CARGO_PKG_VERSION"));

/// Authenticated client for the traffic and gist endpoints of one repository.
pub struct GitHubClient {
    client: Client,
    api_url: String,
    token: String,
    repository: String,
}

impl GitHubClient {
    pub fn new(api_url: &str, token: &str, repository: &str) -> Result<Self, StatsError> {
        // The API refuses requests without a User-Agent.
        let client = Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            repository: repository.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, StatsError> {
        Self::new(
            &config.api_url,
            config.require_token()?,
            config.require_repository()?,
        )
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github+json")
    }

    fn get(&self, url: &str) -> RequestBuilder {
        self.authorize(self.client.get(url))
    }

    fn post(&self, url: &str) -> RequestBuilder {
        self.authorize(self.client.post(url))
    }

    fn patch(&self, url: &str) -> RequestBuilder {
        self.authorize(self.client.patch(url))
    }
}

/// Turn any non-success status into an `Upstream` error carrying a capped
/// slice of the body.
async fn ensure_success(response: Response, endpoint: &str) -> Result<Response, StatsError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_bytes = response.bytes().await.unwrap_or_default();
    let truncated = &error_bytes[..error_bytes.len().min(MAX_ERROR_BODY_BYTES)];
    let text = String::from_utf8_lossy(truncated);
    Err(StatsError::Upstream {
        endpoint: endpoint.to_string(),
        message: format!("{status}: {text}"),
        status: Some(status.as_u16()),
    })
}
