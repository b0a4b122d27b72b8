//! Intercepted requests and the responses handed back for them.

use bytes::Bytes;
use reqwest::{Method, StatusCode};
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use swcache_core::{Error, RequestKey, StoredResponse};
use url::Url;

use crate::fetch::canonicalize;

/// What the requesting context intends to do with the response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    #[default]
    Empty,
    Document,
    Image,
    Script,
    Style,
    Font,
    Manifest,
    Audio,
    Video,
    Worker,
}

impl FromStr for Destination {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "empty" => Ok(Self::Empty),
            "document" => Ok(Self::Document),
            "image" => Ok(Self::Image),
            "script" => Ok(Self::Script),
            "style" => Ok(Self::Style),
            "font" => Ok(Self::Font),
            "manifest" => Ok(Self::Manifest),
            "audio" => Ok(Self::Audio),
            "video" => Ok(Self::Video),
            "worker" => Ok(Self::Worker),
            other => Err(Error::InvalidInput(format!("unknown destination: {other}"))),
        }
    }
}

/// An intercepted outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub url: Url,
    pub destination: Destination,
}

impl Request {
    /// GET request with no particular destination.
    pub fn get(url: Url) -> Self {
        Self { method: "GET".to_string(), url, destination: Destination::Empty }
    }

    /// Build a request from untrusted parts, canonicalizing the URL.
    pub fn parse(method: &str, url: &str, destination: Destination) -> Result<Self, Error> {
        let method = method.trim().to_ascii_uppercase();
        Method::from_bytes(method.as_bytes()).map_err(|_| Error::InvalidInput(format!("invalid method: {method:?}")))?;
        let url = canonicalize(url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(Self { method, url, destination })
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    /// Identity of this request in the cache store.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(&self.method, self.url.as_str())
    }
}

/// A response produced by the network, the cache, or the agent itself.
#[derive(Debug, Clone)]
pub struct Response {
    pub url: Url,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Response {
    /// Content-Type header, if present and valid UTF-8.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    /// Independent copy of this response for the cache store.
    ///
    /// The caller keeps the original; the snapshot owns its own body and
    /// header list. Headers that are not valid UTF-8 are not persisted.
    pub fn snapshot(&self) -> StoredResponse {
        let headers = self
            .headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();
        StoredResponse::new(self.url.as_str(), self.status.as_u16(), headers, self.body.to_vec())
    }

    /// Rebuild a response from a stored snapshot.
    pub fn from_stored(stored: StoredResponse) -> Result<Self, Error> {
        let corrupt = |what: String| Error::CorruptEntry(format!("{}: {what}", stored.url));

        let url = Url::parse(&stored.url).map_err(|e| corrupt(e.to_string()))?;
        let status = StatusCode::from_u16(stored.status).map_err(|e| corrupt(e.to_string()))?;

        let mut headers = HeaderMap::with_capacity(stored.headers.len());
        for (name, value) in &stored.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| corrupt(e.to_string()))?;
            let value = HeaderValue::from_str(value).map_err(|e| corrupt(e.to_string()))?;
            headers.append(name, value);
        }

        Ok(Self { url, status, headers, body: Bytes::from(stored.body) })
    }
}

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    /// Live network response.
    Network,
    /// Cache entry for the exact request.
    Cache,
    /// Cache entry for the offline fallback document.
    Fallback,
    /// Synthesized by the agent.
    Placeholder,
}

/// Response returned for an intercepted request.
#[derive(Debug, Clone)]
pub struct Served {
    pub response: Response,
    pub source: ResponseSource,
}

impl Served {
    pub fn new(response: Response, source: ResponseSource) -> Self {
        Self { response, source }
    }
}
