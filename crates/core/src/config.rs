//! Store configuration
//!
//! Bucket identity and credentials are passed explicitly to each transport
//! through [`StoreConfig`]. [`StoreConfig::from_env`] reads the conventional
//! environment variables once; nothing is kept in process-wide state.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default number of object fetches kept in flight by concurrent iteration
pub const DEFAULT_CONCURRENCY: usize = 8;

pub const ENV_BUCKET: &str = "BUCKET_NAME";
pub const ENV_REGION: &str = "REGION";
pub const ENV_AWS_REGION: &str = "AWS_REGION";
pub const ENV_ACCESS_KEY: &str = "AWS_ACCESS_KEY_ID";
pub const ENV_SECRET_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const ENV_ENDPOINT: &str = "S3DICT_ENDPOINT";
pub const ENV_CONCURRENCY: &str = "S3DICT_CONCURRENCY";

/// Access key pair used to sign requests
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Connection descriptor for a single bucket
#[derive(Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Bucket name
    pub bucket: String,

    /// Bucket region (e.g. "eu-west-1")
    pub region: String,

    /// Access key ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,

    /// Secret access key; absent means anonymous or role-based access
    #[serde(default, skip_serializing)]
    pub secret_key: Option<String>,

    /// Custom endpoint URL for S3-compatible services (path-style addressing)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Maximum fetches in flight for concurrent iteration
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

impl StoreConfig {
    /// Create a configuration without credentials
    pub fn new(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
            access_key: None,
            secret_key: None,
            endpoint: None,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.access_key = Some(access_key.into());
        self.secret_key = Some(secret_key.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let bucket = get(ENV_BUCKET)
            .ok_or_else(|| Error::Config(format!("{ENV_BUCKET} is not set")))?;
        let region = get(ENV_REGION)
            .or_else(|| get(ENV_AWS_REGION))
            .ok_or_else(|| Error::Config(format!("{ENV_REGION} is not set")))?;

        let concurrency = match get(ENV_CONCURRENCY) {
            Some(v) => v.parse().map_err(|_| {
                Error::Config(format!("{ENV_CONCURRENCY} must be a positive integer, got '{v}'"))
            })?,
            None => DEFAULT_CONCURRENCY,
        };

        let config = Self {
            bucket,
            region,
            access_key: get(ENV_ACCESS_KEY),
            secret_key: get(ENV_SECRET_KEY),
            endpoint: get(ENV_ENDPOINT),
            concurrency,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration can address a bucket
    pub fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            return Err(Error::Config("bucket name cannot be empty".into()));
        }
        if self.region.trim().is_empty() {
            return Err(Error::Config("region cannot be empty".into()));
        }
        if self.concurrency == 0 {
            return Err(Error::Config("concurrency must be at least 1".into()));
        }
        Ok(())
    }

    /// The key pair, if both halves are present and non-empty
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.access_key, &self.secret_key) {
            (Some(a), Some(s)) if !a.is_empty() && !s.is_empty() => Some(Credentials {
                access_key: a.clone(),
                secret_key: s.clone(),
            }),
            _ => None,
        }
    }

    /// The key pair, or an authentication error for calls that cannot be anonymous
    pub fn require_credentials(&self) -> Result<Credentials> {
        self.credentials().ok_or_else(|| {
            Error::Auth(format!(
                "no credentials configured for bucket '{}'",
                self.bucket
            ))
        })
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("concurrency", &self.concurrency)
            .finish()
    }
}
