//! Backend feed client and poll policy.
//!
//! The feed is a plain `GET` returning a JSON or YAML document. Every way a
//! poll can go wrong (transport, HTTP status, unknown content type, bad
//! body) is a `FeedError`, and every `FeedError` means the same thing to the
//! viewer: connectivity is offline, keep showing the last snapshot, retry
//! later.

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::config::Config;
use crate::snapshot::Snapshot;

/// Path of the address descriptor endpoint relative to the feed origin.
pub const ADDRESS_ENDPOINT: &str = "/getServerIp";

/// Feed errors. All of them are recoverable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// The request could not be sent or the body could not be read.
    Request(String),
    /// The server answered with a non-success status.
    Status(u16),
    /// The response carried a content type that is neither JSON nor YAML.
    UnsupportedContentType(String),
    /// The body did not parse in the announced format.
    Decode(String),
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedError::Request(msg) => write!(f, "request failed: {msg}"),
            FeedError::Status(code) => write!(f, "server returned HTTP {code}"),
            FeedError::UnsupportedContentType(ct) => {
                write!(f, "unsupported content type '{ct}'")
            }
            FeedError::Decode(msg) => write!(f, "could not decode body: {msg}"),
        }
    }
}

impl std::error::Error for FeedError {}

/// Reachability of the feed as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connectivity {
    #[default]
    Online,
    Offline,
}

impl Connectivity {
    pub fn is_online(self) -> bool {
        matches!(self, Connectivity::Online)
    }

    pub fn label(self) -> &'static str {
        match self {
            Connectivity::Online => "online",
            Connectivity::Offline => "offline",
        }
    }
}

/// Fixed delays between polls.
///
/// A poll is only scheduled after the previous one settled, so these are
/// gaps between requests, never overlapping intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub after_success: Duration,
    pub after_failure: Duration,
}

impl PollSchedule {
    pub fn from_config(config: &Config) -> Self {
        Self {
            after_success: config.poll_interval(),
            after_failure: config.retry_interval(),
        }
    }

    pub fn next_delay(&self, succeeded: bool) -> Duration {
        if succeeded {
            self.after_success
        } else {
            self.after_failure
        }
    }
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyFormat {
    Json,
    Yaml,
}

fn classify(content_type: Option<&str>) -> Result<BodyFormat, FeedError> {
    let Some(raw) = content_type else {
        return Ok(BodyFormat::Json);
    };
    let mime = raw
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match mime.as_str() {
        "" | "application/json" | "text/json" => Ok(BodyFormat::Json),
        "application/yaml" | "application/x-yaml" | "text/yaml" | "text/x-yaml" => {
            Ok(BodyFormat::Yaml)
        }
        m if m.ends_with("+json") => Ok(BodyFormat::Json),
        m if m.ends_with("+yaml") => Ok(BodyFormat::Yaml),
        _ => Err(FeedError::UnsupportedContentType(raw.to_string())),
    }
}

/// Decodes a feed body according to its content type.
///
/// A missing content type is treated as JSON.
pub fn decode_body(content_type: Option<&str>, body: &[u8]) -> Result<Value, FeedError> {
    match classify(content_type)? {
        BodyFormat::Json => {
            serde_json::from_slice(body).map_err(|e| FeedError::Decode(e.to_string()))
        }
        BodyFormat::Yaml => {
            serde_yaml::from_slice(body).map_err(|e| FeedError::Decode(e.to_string()))
        }
    }
}

/// Default address descriptor URL for a feed URL (same origin).
pub fn default_address_url(feed_url: &Url) -> Result<Url> {
    feed_url
        .join(ADDRESS_ENDPOINT)
        .with_context(|| format!("Failed to derive address URL from {feed_url}"))
}

#[derive(Debug, Deserialize)]
struct AddressDescriptor {
    ip: String,
    port: Value,
}

impl AddressDescriptor {
    fn to_link(&self) -> String {
        let port = match &self.port {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        format!("http://{}:{}", self.ip, port)
    }
}

/// HTTP client for the snapshot feed and the address descriptor.
#[derive(Debug, Clone)]
pub struct FeedClient {
    http: reqwest::Client,
    feed_url: Url,
    address_url: Url,
}

impl FeedClient {
    pub fn new(feed_url: &str, address_url: Option<&str>, timeout: Duration) -> Result<Self> {
        let feed_url =
            Url::parse(feed_url).with_context(|| format!("Invalid feed URL '{feed_url}'"))?;
        let address_url = match address_url {
            Some(raw) => {
                Url::parse(raw).with_context(|| format!("Invalid address URL '{raw}'"))?
            }
            None => default_address_url(&feed_url)?,
        };
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            feed_url,
            address_url,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.feed_url,
            config.address_url.as_deref(),
            config.request_timeout(),
        )
    }

    pub fn feed_url(&self) -> &Url {
        &self.feed_url
    }

    pub fn address_url(&self) -> &Url {
        &self.address_url
    }

    /// Origin of the feed, shown as the address until the descriptor loads.
    pub fn origin(&self) -> String {
        self.feed_url.origin().ascii_serialization()
    }

    /// Fetches and decodes one snapshot.
    pub async fn fetch_snapshot(&self) -> Result<Snapshot, FeedError> {
        let response = self
            .http
            .get(self.feed_url.clone())
            .send()
            .await
            .map_err(|e| FeedError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| FeedError::Request(e.to_string()))?;

        decode_body(content_type.as_deref(), &body).map(Snapshot::new)
    }

    /// Fetches the host/port descriptor and returns a link address.
    pub async fn fetch_address(&self) -> Result<String, FeedError> {
        let response = self
            .http
            .get(self.address_url.clone())
            .send()
            .await
            .map_err(|e| FeedError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        let descriptor: AddressDescriptor = response
            .json()
            .await
            .map_err(|e| FeedError::Decode(e.to_string()))?;
        Ok(descriptor.to_link())
    }
}
