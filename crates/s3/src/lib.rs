//! s3dict-s3: S3 transports for s3dict
//!
//! Two interchangeable implementations of [`s3dict_core::ObjectStore`]:
//! - [`RestStore`]: plain HTTP verbs over reqwest with SigV2 signing
//! - [`SdkStore`]: the aws-sdk-s3 managed client

pub mod client;
pub mod listing;
pub mod rest;
pub mod signer;

pub use client::SdkStore;
pub use rest::RestStore;

use s3dict_core::{Result, S3Dict, StoreConfig};

/// Open a dict over the signed REST transport
pub fn rest_dict(config: StoreConfig) -> Result<S3Dict<RestStore>> {
    let concurrency = config.concurrency;
    Ok(S3Dict::new(RestStore::new(config)?).with_concurrency(concurrency))
}

/// Open a dict over the aws-sdk-s3 client
pub async fn sdk_dict(config: StoreConfig) -> Result<S3Dict<SdkStore>> {
    let concurrency = config.concurrency;
    Ok(S3Dict::new(SdkStore::new(config).await?).with_concurrency(concurrency))
}
