use anyhow::{Context, Result};
use reqwest::blocking::Client;
use tracing::debug;

use crate::config::Settings;
use crate::error::FetchError;

/// Anything that can turn a URL into page HTML.
pub trait Fetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.timeout())
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let request_err = |source| FetchError::Request {
            url: url.to_string(),
            source,
        };

        debug!("GET {}", url);
        let response = self.client.get(url).send().map_err(request_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response.text().map_err(request_err)
    }
}
