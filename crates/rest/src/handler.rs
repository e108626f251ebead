//! Miss handler that queries a remote HTTP collaborator.

use std::fmt::Display;
use std::hash::Hash;
use std::marker::PhantomData;
use std::time::Duration;

use serde::de::DeserializeOwned;

use stowage_core::{MissHandler, Repository, StoreError};

/// Transport settings for the remote collaborator.
#[derive(Debug, Clone, Default)]
pub struct RestConfig {
    /// Per-request timeout. `None` keeps the transport default.
    pub timeout: Option<Duration>,
}

/// Resolves repository misses with `GET {endpoint}/{key}`.
///
/// The key is embedded as a path segment via its `Display` form; a
/// successful response body deserializes to the entity type. A `404` from
/// the collaborator is a plain miss. Other unsuccessful statuses, transport
/// failures and decode failures surface through the store's error-hook path,
/// so the caller still just sees "absent".
///
/// Remote reads are deliberately not written back into the local map: every
/// miss re-queries the collaborator.
pub struct RestMissHandler<E> {
    client: reqwest::blocking::Client,
    endpoint: String,
    _entity: PhantomData<fn() -> E>,
}

impl<E> RestMissHandler<E> {
    /// Build a handler with the transport's default timeout.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, StoreError> {
        Self::with_config(endpoint, RestConfig::default())
    }

    pub fn with_config(endpoint: impl Into<String>, config: RestConfig) -> Result<Self, StoreError> {
        let mut builder = reqwest::blocking::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| StoreError::Fallback(err.to_string()))?;

        let endpoint = endpoint.into();
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client,
            _entity: PhantomData,
        })
    }

    /// Base endpoint the handler queries.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl<E> std::fmt::Debug for RestMissHandler<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestMissHandler")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl<K, E> MissHandler<K, E> for RestMissHandler<E>
where
    K: Display + Send + Sync,
    E: DeserializeOwned + Send + Sync,
{
    fn fetch(&self, key: &K) -> Result<Option<E>, StoreError> {
        let url = format!("{}/{}", self.endpoint, key);
        tracing::debug!("fetching missing entity from {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|err| StoreError::Fallback(err.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!("remote has no entity at {url}");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(StoreError::Fallback(format!(
                "remote returned {status} for {url}"
            )));
        }

        let entity = response
            .json::<E>()
            .map_err(|err| StoreError::Fallback(err.to_string()))?;
        Ok(Some(entity))
    }
}

/// Build a repository whose misses fall back to `GET {endpoint}/{key}`.
pub fn rest_repository<E, K>(
    key_fn: impl Fn(&E) -> K + Send + Sync + 'static,
    endpoint: impl Into<String>,
) -> Result<Repository<E, K>, StoreError>
where
    E: Clone + DeserializeOwned + Send + Sync + 'static,
    K: Display + Clone + Eq + Hash + Send + Sync + 'static,
{
    let handler = RestMissHandler::<E>::new(endpoint)?;
    Ok(Repository::with_miss_handler(key_fn, handler))
}
