//! Dictionary-style facade over an object store
//!
//! [`S3Dict`] exposes the dict verbs (get, put, pop, remove, contains,
//! keys, items) as named async methods. Each call translates into one or two
//! requests against the underlying [`ObjectStore`]; nothing is cached.

use std::io::{Cursor, Read};

use futures::stream::{self, Stream, StreamExt, TryStreamExt};

use crate::config::DEFAULT_CONCURRENCY;
use crate::error::{Error, Result};
use crate::traits::ObjectStore;

/// In-memory, seekable handle over an object's full content
pub type ObjectBody = Cursor<Vec<u8>>;

/// Dictionary-like access to a single bucket
#[derive(Debug)]
pub struct S3Dict<S> {
    store: S,
    concurrency: usize,
}

impl<S: ObjectStore> S3Dict<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Cap the number of fetches in flight for [`S3Dict::items_concurrent`]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// The underlying transport
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Fetch the object stored at `key`
    pub async fn get(&self, key: &str) -> Result<ObjectBody> {
        let data = self.store.get_object(key).await?;
        Ok(Cursor::new(data))
    }

    /// Store `value` at `key`, replacing any existing object
    pub async fn put(&self, key: &str, value: impl Into<Vec<u8>>) -> Result<()> {
        self.store.put_object(key, value.into()).await
    }

    /// Store everything remaining in `reader` at `key`
    ///
    /// Reading starts at the reader's current position, so a freshly
    /// fetched [`ObjectBody`] can be written back as-is.
    pub async fn put_reader<R: Read>(&self, key: &str, mut reader: R) -> Result<()> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        self.store.put_object(key, data).await
    }

    /// Fetch the object at `key`, then delete it
    ///
    /// A failed fetch (including [`Error::NotFound`]) is returned unchanged
    /// and nothing is deleted. A store that cannot write fails before the
    /// fetch.
    pub async fn pop(&self, key: &str) -> Result<ObjectBody> {
        self.store.check_writable()?;
        let body = self.get(key).await?;
        self.store.delete_object(key).await?;
        tracing::debug!(key, size = body.get_ref().len(), "Popped object");
        Ok(body)
    }

    /// Delete the object at `key`
    ///
    /// Same contract as [`S3Dict::pop`] without transferring the content:
    /// a missing key is [`Error::NotFound`].
    pub async fn remove(&self, key: &str) -> Result<()> {
        self.store.check_writable()?;
        if !self.store.object_exists(key).await? {
            return Err(Error::NotFound(key.to_string()));
        }
        self.store.delete_object(key).await
    }

    /// Whether an object exists at `key`
    pub async fn contains(&self, key: &str) -> Result<bool> {
        self.store.object_exists(key).await
    }

    /// Keys starting with `prefix`, in listing order
    ///
    /// Each call issues a fresh listing request and only the first page
    /// of results is returned.
    pub async fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        self.store.list_keys(prefix).await
    }

    /// Lazily fetch `(key, value)` pairs for keys starting with `prefix`
    ///
    /// The listing happens up front; each value is fetched when the stream
    /// is polled, in listing order.
    pub async fn items(
        &self,
        prefix: &str,
    ) -> Result<impl Stream<Item = Result<(String, ObjectBody)>> + '_> {
        let keys = self.keys(prefix).await?;
        Ok(stream::iter(keys).then(move |key| async move {
            let body = self.get(&key).await?;
            Ok::<_, Error>((key, body))
        }))
    }

    /// Fetch all `(key, value)` pairs for keys starting with `prefix` concurrently
    ///
    /// At most [`S3Dict::concurrency`] fetches run at once. Results come back
    /// in completion order. The first failed fetch cancels those still in
    /// flight and its error is returned.
    pub async fn items_concurrent(&self, prefix: &str) -> Result<Vec<(String, ObjectBody)>> {
        let keys = self.keys(prefix).await?;
        tracing::debug!(
            prefix,
            count = keys.len(),
            concurrency = self.concurrency,
            "Fetching items concurrently"
        );

        let fetches = keys.into_iter().map(move |key| async move {
            let body = self.get(&key).await?;
            Ok::<_, Error>((key, body))
        });

        stream::iter(fetches)
            .buffer_unordered(self.concurrency)
            .try_collect()
            .await
    }
}
