//! Managed client transport
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from s3dict-core.

use async_trait::async_trait;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_smithy_runtime_api::client::orchestrator::HttpResponse;
use aws_smithy_types::error::display::DisplayErrorContext;
use s3dict_core::{Error, ObjectStore, Result, StoreConfig};

/// Object store backed by the AWS SDK
#[derive(Debug, Clone)]
pub struct SdkStore {
    inner: aws_sdk_s3::Client,
    config: StoreConfig,
}

impl SdkStore {
    /// Build an SDK client for the configured bucket
    ///
    /// Static credentials are used when both keys are set; otherwise the
    /// SDK default provider chain applies (environment, profile, role).
    pub async fn new(config: StoreConfig) -> Result<Self> {
        config.validate()?;

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()));

        if let Some(creds) = config.credentials() {
            loader = loader.credentials_provider(aws_credential_types::Credentials::new(
                creds.access_key,
                creds.secret_key,
                None, // session token
                None, // expiry
                "s3dict-static-credentials",
            ));
        }

        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;

        // Custom endpoints are addressed path-style for compatibility
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.endpoint.is_some())
            .build();

        Ok(Self::from_client(
            aws_sdk_s3::Client::from_conf(s3_config),
            config,
        ))
    }

    /// Wrap an already configured SDK client
    pub fn from_client(inner: aws_sdk_s3::Client, config: StoreConfig) -> Self {
        Self { inner, config }
    }

    /// Get the underlying aws-sdk-s3 client
    pub fn inner(&self) -> &aws_sdk_s3::Client {
        &self.inner
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn bucket(&self) -> &str {
        &self.config.bucket
    }
}

#[async_trait]
impl ObjectStore for SdkStore {
    async fn get_object(&self, key: &str) -> Result<Vec<u8>> {
        tracing::debug!(bucket = self.bucket(), key, "GetObject");
        let response = self
            .inner
            .get_object()
            .bucket(self.bucket())
            .key(key)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e, self.bucket(), key))?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?
            .into_bytes()
            .to_vec();

        Ok(data)
    }

    async fn put_object(&self, key: &str, data: Vec<u8>) -> Result<()> {
        tracing::debug!(bucket = self.bucket(), key, size = data.len(), "PutObject");
        let body = aws_sdk_s3::primitives::ByteStream::from(data);

        self.inner
            .put_object()
            .bucket(self.bucket())
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e, self.bucket(), key))?;

        Ok(())
    }

    async fn delete_object(&self, key: &str) -> Result<()> {
        tracing::debug!(bucket = self.bucket(), key, "DeleteObject");
        self.inner
            .delete_object()
            .bucket(self.bucket())
            .key(key)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e, self.bucket(), key))?;

        Ok(())
    }

    async fn object_exists(&self, key: &str) -> Result<bool> {
        tracing::debug!(bucket = self.bucket(), key, "HeadObject");
        match self
            .inner
            .head_object()
            .bucket(self.bucket())
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => match classify_sdk_error(&e, self.bucket(), key) {
                Error::NotFound(_) => Ok(false),
                other => Err(other),
            },
        }
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        tracing::debug!(bucket = self.bucket(), prefix, "ListObjectsV2");
        let response = self
            .inner
            .list_objects_v2()
            .bucket(self.bucket())
            .prefix(prefix)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e, self.bucket(), ""))?;

        let keys: Vec<String> = response
            .contents()
            .iter()
            .filter_map(|object| object.key().map(str::to_string))
            .collect();

        if response.is_truncated().unwrap_or(false) {
            tracing::warn!(
                prefix,
                returned = keys.len(),
                "Listing truncated, only the first page is returned"
            );
        }

        Ok(keys)
    }
}

/// Map an SDK failure onto an error kind
///
/// Service responses are classified by HTTP status. Failures before a
/// response exists are authentication errors when credential resolution is
/// what failed, and transport errors otherwise.
pub(crate) fn classify_sdk_error<E>(
    error: &SdkError<E, HttpResponse>,
    bucket: &str,
    key: &str,
) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let err = match error {
        SdkError::ServiceError(service_err) => {
            let status = service_err.raw().status().as_u16();
            let detail = format_sdk_error(error);
            match status {
                404 => Error::NotFound(format!("{bucket}/{key} ({detail})")),
                401 | 403 => Error::Auth(detail),
                _ => Error::Transport(detail),
            }
        }
        _ if mentions_credentials(error) => Error::Auth(format_sdk_error(error)),
        _ => Error::Transport(format_sdk_error(error)),
    };

    if !err.is_not_found() {
        tracing::warn!(bucket, key, error = %err, "S3 request failed");
    }
    err
}

/// Format AWS SDK error into a detailed error message
fn format_sdk_error<E>(error: &SdkError<E, HttpResponse>) -> String
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    match error {
        SdkError::ServiceError(service_err) => {
            let err = service_err.err();
            let mut msg = format!("Service error: {}", err.code().unwrap_or("Unknown"));
            if let Some(message) = err.message() {
                msg.push_str(&format!(" ({message})"));
            }
            msg
        }
        SdkError::TimeoutError(_) => "Request timeout".to_string(),
        SdkError::ConstructionFailure(_) => {
            format!("Request construction failed: {}", DisplayErrorContext(error))
        }
        SdkError::DispatchFailure(_) => {
            format!("Network dispatch error: {}", DisplayErrorContext(error))
        }
        _ => DisplayErrorContext(error).to_string(),
    }
}

/// Whether any error in the source chain is about missing or unusable credentials
fn mentions_credentials(error: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(e) = current {
        if e.to_string().to_lowercase().contains("credentials") {
            return true;
        }
        current = e.source();
    }
    false
}
