//! Integration tests against a real S3-compatible bucket
//!
//! Configuration comes from the environment (`BUCKET_NAME`, `REGION`,
//! `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`, optional `S3DICT_ENDPOINT`).
//! Every test works under its own key prefix and cleans up after itself.
//! The bucket must not allow anonymous reads.
//!
//! Run with: `cargo test -p s3dict-s3 --features integration`

#![cfg(feature = "integration")]

use std::sync::Once;

use futures::TryStreamExt;
use s3dict_core::{ObjectStore, S3Dict, StoreConfig};
use s3dict_s3::{rest_dict, sdk_dict};

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

fn config() -> StoreConfig {
    init_tracing();
    StoreConfig::from_env().expect("integration tests need BUCKET_NAME and REGION")
}

/// A key prefix no other test run will use
fn unique_prefix(name: &str) -> String {
    let now = jiff::Timestamp::now();
    format!("s3dict-test/{name}-{}/", now.as_nanosecond())
}

async fn seed<S: ObjectStore>(dict: &S3Dict<S>, prefix: &str) -> anyhow::Result<()> {
    dict.put(&format!("{prefix}a"), "1").await?;
    dict.put(&format!("{prefix}ab"), "2").await?;
    dict.put(&format!("{prefix}b"), "3").await?;
    Ok(())
}

async fn cleanup<S: ObjectStore>(dict: &S3Dict<S>, prefix: &str) -> anyhow::Result<()> {
    for key in dict.keys(prefix).await? {
        dict.remove(&key).await?;
    }
    Ok(())
}

async fn exercise_dict<S: ObjectStore>(dict: S3Dict<S>, prefix: &str) -> anyhow::Result<()> {
    seed(&dict, prefix).await?;

    let a = format!("{prefix}a");
    let ab = format!("{prefix}ab");
    let b = format!("{prefix}b");

    assert_eq!(dict.get(&a).await?.into_inner(), b"1");
    assert!(dict.contains(&ab).await?);

    assert_eq!(dict.keys(&a).await?, vec![a.clone(), ab.clone()]);
    assert_eq!(dict.keys(prefix).await?, vec![a.clone(), ab.clone(), b.clone()]);

    let items: Vec<(String, Vec<u8>)> = dict
        .items(&a)
        .await?
        .map_ok(|(k, v)| (k, v.into_inner()))
        .try_collect()
        .await?;
    assert_eq!(items, vec![(a.clone(), b"1".to_vec()), (ab.clone(), b"2".to_vec())]);

    let mut concurrent: Vec<String> = dict
        .items_concurrent(prefix)
        .await?
        .into_iter()
        .map(|(k, _)| k)
        .collect();
    concurrent.sort();
    assert_eq!(concurrent, vec![a.clone(), ab.clone(), b.clone()]);

    let missing = format!("{prefix}missing");
    assert!(dict.get(&missing).await.unwrap_err().is_not_found());
    assert!(!dict.contains(&missing).await?);
    assert!(dict.pop(&missing).await.unwrap_err().is_not_found());

    assert_eq!(dict.pop(&ab).await?.into_inner(), b"2");
    assert!(!dict.contains(&ab).await?);

    dict.remove(&b).await?;
    assert!(!dict.contains(&b).await?);

    cleanup(&dict, prefix).await
}

#[tokio::test]
async fn test_rest_transport_round_trip() -> anyhow::Result<()> {
    let dict = rest_dict(config())?;
    exercise_dict(dict, &unique_prefix("rest")).await
}

#[tokio::test]
async fn test_sdk_transport_round_trip() -> anyhow::Result<()> {
    let dict = sdk_dict(config()).await?;
    exercise_dict(dict, &unique_prefix("sdk")).await
}

#[tokio::test]
async fn test_rest_transport_without_credentials() -> anyhow::Result<()> {
    let mut anonymous = config();
    anonymous.access_key = None;
    anonymous.secret_key = None;
    let dict = rest_dict(anonymous)?;
    let key = format!("{}k", unique_prefix("anon"));

    assert!(dict.put(&key, "v").await.unwrap_err().is_auth());
    assert!(dict.pop(&key).await.unwrap_err().is_auth());
    assert!(dict.remove(&key).await.unwrap_err().is_auth());
    Ok(())
}
