//! Naming collection API shared by every record kind

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::marker::PhantomData;

use super::client::Client;
use super::error::ApiError;

/// Loosely typed record, as returned by the collection listing
pub type LooseRecord = Map<String, Value>;

/// A kind of naming record and the collection that stores it
pub trait NamingKind: Send + Sync + 'static {
    /// Collection path, e.g. `/api/naming/resource/naming`
    const PATH: &'static str;

    /// Desired attributes sent on create and update
    type Request: Serialize + Send + Sync;

    /// Full record returned by the service
    type Record: DeserializeOwned + Send;
}

/// Naming API for one record kind
pub struct NamingApi<'a, K: NamingKind> {
    client: &'a Client,
    _kind: PhantomData<K>,
}

impl<'a, K: NamingKind> NamingApi<'a, K> {
    pub fn new(client: &'a Client) -> Self {
        Self {
            client,
            _kind: PhantomData,
        }
    }

    fn record_path(id: &str) -> String {
        format!("{}/{}", K::PATH, urlencoding::encode(id))
    }

    /// A 404 on the collection itself means a misrouted endpoint, not a
    /// missing record.
    fn collection_error(error: ApiError) -> ApiError {
        match error {
            ApiError::NotFound(path) => ApiError::Status {
                status: 404,
                message: format!("naming collection not found: {}", path),
            },
            other => other,
        }
    }

    /// POST {collection}
    pub async fn create(&self, request: &K::Request) -> Result<K::Record, ApiError> {
        self.client
            .post(K::PATH, request)
            .await
            .map_err(Self::collection_error)
    }

    /// GET {collection}/{id}
    pub async fn get(&self, id: &str) -> Result<K::Record, ApiError> {
        self.client.get(&Self::record_path(id)).await
    }

    /// PUT {collection}/{id}
    pub async fn update(&self, id: &str, request: &K::Request) -> Result<K::Record, ApiError> {
        self.client.put(&Self::record_path(id), request).await
    }

    /// DELETE {collection}/{id}
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client.delete(&Self::record_path(id)).await
    }

    /// GET {collection}
    pub async fn list(&self) -> Result<Vec<LooseRecord>, ApiError> {
        self.client
            .get(K::PATH)
            .await
            .map_err(Self::collection_error)
    }
}
