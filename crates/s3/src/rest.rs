//! Signed REST transport
//!
//! Talks to the bucket with plain HTTP verbs over reqwest, signing each
//! request with SigV2 when credentials are configured. Objects are addressed
//! virtual-host style (`https://{bucket}.s3.{region}.amazonaws.com/{key}`)
//! unless a custom endpoint is set, in which case path style is used.

use async_trait::async_trait;
use bytes::Bytes;
use http::header::{AUTHORIZATION, DATE, HOST};
use http::{HeaderName, Method, StatusCode};
use s3dict_core::{Credentials, Error, ObjectStore, Result, StoreConfig};
use url::Url;

use crate::listing::{parse_error_body, parse_list_objects};
use crate::signer::{SigningInput, authorization, canonical_resource};

/// HTTP-date format used in the `Date` header (always UTC)
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Object store backed by signed REST calls
#[derive(Debug, Clone)]
pub struct RestStore {
    http: reqwest::Client,
    config: StoreConfig,
    credentials: Option<Credentials>,
    /// Base URL of the bucket root, without trailing slash
    bucket_url: String,
    /// Value of the `Host` header
    host: String,
}

/// A request ready to hand to the HTTP client
#[derive(Debug, Clone)]
pub(crate) struct PreparedRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(HeaderName, String)>,
}

impl RestStore {
    /// Create a store with a default HTTP client
    pub fn new(config: StoreConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;
        Self::with_client(config, http)
    }

    /// Create a store that sends requests through `http`
    pub fn with_client(config: StoreConfig, http: reqwest::Client) -> Result<Self> {
        config.validate()?;

        let (bucket_url, host) = match &config.endpoint {
            Some(endpoint) => {
                let url = Url::parse(endpoint)
                    .map_err(|e| Error::Config(format!("invalid endpoint '{endpoint}': {e}")))?;
                let host = match (url.host_str(), url.port()) {
                    (Some(h), Some(p)) => format!("{h}:{p}"),
                    (Some(h), None) => h.to_string(),
                    (None, _) => {
                        return Err(Error::Config(format!("endpoint '{endpoint}' has no host")));
                    }
                };
                let base = endpoint.trim_end_matches('/');
                (format!("{base}/{}", config.bucket), host)
            }
            None => {
                let host = format!("{}.s3.{}.amazonaws.com", config.bucket, config.region);
                (format!("https://{host}"), host)
            }
        };

        Ok(Self {
            http,
            credentials: config.credentials(),
            config,
            bucket_url,
            host,
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// URL of the object stored at `key`
    pub fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.bucket_url, encode_key(key))
    }

    /// URL of the first listing page for `prefix`
    pub fn listing_url(&self, prefix: &str) -> String {
        format!("{}/?{}", self.bucket_url, listing_query(prefix))
    }

    /// Build the URL and headers for a request, signing it when credentials exist
    ///
    /// `key` is empty for bucket-level requests such as listing.
    pub(crate) fn prepare(
        &self,
        method: Method,
        key: &str,
        query: Option<&str>,
        date: &str,
    ) -> PreparedRequest {
        let encoded_key = encode_key(key);
        let url = match query {
            Some(q) => format!("{}/{}?{}", self.bucket_url, encoded_key, q),
            None => format!("{}/{}", self.bucket_url, encoded_key),
        };

        let mut headers = vec![(HOST, self.host.clone())];

        if let Some(credentials) = &self.credentials {
            let resource = canonical_resource(&self.config.bucket, &encoded_key);
            let input = SigningInput {
                method: method.as_str(),
                date,
                resource: &resource,
                ..Default::default()
            };
            headers.push((DATE, date.to_string()));
            headers.push((AUTHORIZATION, authorization(credentials, &input)));
        }

        PreparedRequest {
            method,
            url,
            headers,
        }
    }

    async fn send(
        &self,
        method: Method,
        key: &str,
        query: Option<&str>,
        body: Option<Vec<u8>>,
    ) -> Result<reqwest::Response> {
        let date = jiff::Timestamp::now()
            .strftime(HTTP_DATE_FORMAT)
            .to_string();
        let prepared = self.prepare(method, key, query, &date);

        tracing::debug!(
            method = %prepared.method,
            bucket = %self.config.bucket,
            key,
            signed = self.credentials.is_some(),
            "Sending request"
        );

        let mut request = self.http.request(prepared.method, &prepared.url);
        for (name, value) in prepared.headers {
            request = request.header(name, value);
        }
        if let Some(data) = body {
            request = request.body(Bytes::from(data));
        }

        request
            .send()
            .await
            .map_err(|e| Error::Transport(format!("request to {} failed: {e}", prepared.url)))
    }

    /// Turn a non-success response into the matching error
    async fn fail(&self, response: reqwest::Response, key: &str) -> Error {
        let status = response.status();
        let body = response.bytes().await.unwrap_or_default();
        let err = classify_status(status, &body, &self.config.bucket, key);
        tracing::warn!(status = status.as_u16(), key, error = %err, "Request failed");
        err
    }
}

#[async_trait]
impl ObjectStore for RestStore {
    async fn get_object(&self, key: &str) -> Result<Vec<u8>> {
        check_key(key)?;
        let response = self.send(Method::GET, key, None, None).await?;
        if !response.status().is_success() {
            return Err(self.fail(response, key).await);
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;
        Ok(data.to_vec())
    }

    async fn put_object(&self, key: &str, data: Vec<u8>) -> Result<()> {
        check_key(key)?;
        self.check_writable()?;

        let response = self.send(Method::PUT, key, None, Some(data)).await?;
        if !response.status().is_success() {
            return Err(self.fail(response, key).await);
        }
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> Result<()> {
        check_key(key)?;
        self.check_writable()?;

        let response = self.send(Method::DELETE, key, None, None).await?;
        if !response.status().is_success() {
            return Err(self.fail(response, key).await);
        }
        Ok(())
    }

    async fn object_exists(&self, key: &str) -> Result<bool> {
        check_key(key)?;
        let response = self.send(Method::HEAD, key, None, None).await?;
        match response.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(self.fail(response, key).await),
        }
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let query = listing_query(prefix);
        let response = self.send(Method::GET, "", Some(&query), None).await?;
        if !response.status().is_success() {
            return Err(self.fail(response, "").await);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;
        let page = parse_list_objects(&body)?;

        if page.truncated {
            tracing::warn!(
                prefix,
                returned = page.keys.len(),
                "Listing truncated, only the first page is returned"
            );
        }
        Ok(page.keys)
    }

    fn check_writable(&self) -> Result<()> {
        self.config.require_credentials().map(|_| ())
    }
}

fn listing_query(prefix: &str) -> String {
    format!("list-type=2&prefix={}", urlencoding::encode(prefix))
}

/// Reject keys that cannot round-trip through a URL path
///
/// URL parsing drops `.` and `..` segments (percent-encoded or not), so such
/// a request would reach a different object. An empty key addresses the
/// bucket root.
pub fn check_key(key: &str) -> Result<()> {
    if key.is_empty() || key.split('/').any(|segment| segment == "." || segment == "..") {
        return Err(Error::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Percent-encode each path segment of `key`, keeping the separators
pub fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Map an unsuccessful status (and optional S3 error body) onto an error kind
pub(crate) fn classify_status(status: StatusCode, body: &[u8], bucket: &str, key: &str) -> Error {
    let detail = match parse_error_body(body) {
        Some(e) if !e.message.is_empty() => format!("{}: {}", e.code, e.message),
        Some(e) => e.code,
        None => status.to_string(),
    };

    match status {
        StatusCode::NOT_FOUND => Error::NotFound(format!("{bucket}/{key} ({detail})")),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Auth(detail),
        _ => Error::Transport(format!("HTTP {}: {detail}", status.as_u16())),
    }
}
