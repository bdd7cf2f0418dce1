//! s3dict-core: dictionary-style access to an object storage bucket
//!
//! This crate provides:
//! - [`StoreConfig`] describing the bucket, region and credentials
//! - the [`ObjectStore`] trait implemented by each transport
//! - the [`S3Dict`] facade exposing get/put/pop/remove/contains/keys/items
//!
//! It is independent of any specific S3 SDK; transports live in `s3dict-s3`.

pub mod config;
pub mod dict;
pub mod error;
pub mod traits;

pub use config::{Credentials, DEFAULT_CONCURRENCY, StoreConfig};
pub use dict::{ObjectBody, S3Dict};
pub use error::{Error, Result};
pub use traits::ObjectStore;
