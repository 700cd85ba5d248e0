use std::time::Duration;

use reqwest::Url;

use crate::constants::DEFAULT_PROBE_INTERVAL;
use crate::error::{Error, Result};

/// Where flushed snapshots go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportSink {
    Stdout,
    Http(Url),
}

impl ReportSink {
    /// Parses an endpoint, the empty string selecting stdout.
    pub fn parse(endpoint: &str) -> Result<Self> {
        if endpoint.is_empty() {
            return Ok(ReportSink::Stdout);
        }
        let url = Url::parse(endpoint).map_err(|err| Error::InvalidEndpoint {
            endpoint: endpoint.into(),
            reason: err.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(ReportSink::Http(url)),
            scheme => Err(Error::InvalidEndpoint {
                endpoint: endpoint.into(),
                reason: format!("unsupported scheme {}", scheme),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub interfaces: Vec<String>,
    pub interval: Duration,
    pub sink: ReportSink,
    pub cache_dns: bool,
}

#[derive(Debug, Clone)]
pub struct DaemonConfigBuilder {
    interfaces: Vec<String>,
    interval: Option<Duration>,
    endpoint: Option<String>,
    cache_dns: bool,
}

impl DaemonConfigBuilder {
    pub fn new<I, S>(interfaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            interfaces: interfaces.into_iter().map(Into::into).collect(),
            interval: Some(DEFAULT_PROBE_INTERVAL),
            endpoint: None,
            cache_dns: false,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_cache_dns(mut self, cache_dns: bool) -> Self {
        self.cache_dns = cache_dns;
        self
    }

    pub fn build(self) -> Result<DaemonConfig> {
        if self.interfaces.is_empty() {
            return Err(Error::NoInterfaces);
        }
        let sink = ReportSink::parse(self.endpoint.as_deref().unwrap_or_default())?;
        Ok(DaemonConfig {
            interfaces: self.interfaces,
            interval: self.interval.unwrap_or(DEFAULT_PROBE_INTERVAL),
            sink,
            cache_dns: self.cache_dns,
        })
    }
}
