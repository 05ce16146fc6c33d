//! Typed facades over the client
//!
//! Facades hold only a client handle and a path. They are cheap to create
//! and any number may coexist over the same client.

use std::fmt::Display;
use std::time::Duration;

use lingua_domain::Listing;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::client::ApiClient;
use super::errors::ApiError;
use super::request::{Query, ReadOptions};

/// CRUD operations on one collection endpoint.
///
/// `base_path` is normalised to `/name/`; items live at `/name/{id}/`.
#[derive(Clone)]
pub struct ResourceFacade {
    client: ApiClient,
    base_path: String,
}

impl ResourceFacade {
    pub(crate) fn new(client: ApiClient, base_path: &str) -> Self {
        Self { client, base_path: collection_path(base_path) }
    }

    /// Normalised collection path
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    fn item_path(&self, id: impl Display) -> String {
        format!("{}{}/", self.base_path, id)
    }

    /// List the collection. Accepts paginated and bare-array responses.
    pub async fn list<T: DeserializeOwned>(
        &self,
        query: &Query,
        options: ReadOptions,
    ) -> Result<Listing<T>, ApiError> {
        decode(self.client.read(&self.base_path, query, options).await?)
    }

    /// Fetch one item from `/name/{id}/`, cached per `options`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        id: impl Display,
        options: ReadOptions,
    ) -> Result<T, ApiError> {
        decode(self.client.read(&self.item_path(id), &Query::new(), options).await?)
    }

    /// Create an item (POST to the collection).
    ///
    /// Validation failures come back as [`ApiError::Http`] with the server's
    /// field errors in the body.
    pub async fn create<B, T>(&self, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = encode(body)?;
        decode(self.client.mutate(Method::POST, &self.base_path, Some(body)).await?)
    }

    /// Full replacement (PUT).
    pub async fn update<B, T>(&self, id: impl Display, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = encode(body)?;
        decode(self.client.mutate(Method::PUT, &self.item_path(id), Some(body)).await?)
    }

    /// Partial update (PATCH).
    pub async fn patch<B, T>(&self, id: impl Display, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = encode(body)?;
        decode(self.client.mutate(Method::PATCH, &self.item_path(id), Some(body)).await?)
    }

    /// Delete an item. Any response body is discarded.
    pub async fn remove(&self, id: impl Display) -> Result<(), ApiError> {
        self.client.mutate(Method::DELETE, &self.item_path(id), None).await.map(|_| ())
    }
}

/// Free-form endpoints under a common prefix ("my current state", search).
///
/// Reads are coalesced but, unless the caller asks for a TTL, never cached.
#[derive(Clone)]
pub struct ScopeFacade {
    client: ApiClient,
    prefix: String,
}

impl ScopeFacade {
    pub(crate) fn new(client: ApiClient, prefix: &str) -> Self {
        Self { client, prefix: collection_path(prefix) }
    }

    /// Normalised prefix
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn path(&self, subpath: &str) -> String {
        format!("{}{}", self.prefix, subpath.trim_start_matches('/'))
    }

    /// GET `prefix` + `subpath`.
    ///
    /// Uncached unless `options` carries a TTL.
    pub async fn get<T: DeserializeOwned>(
        &self,
        subpath: &str,
        query: &Query,
        options: ReadOptions,
    ) -> Result<T, ApiError> {
        let options = ReadOptions { ttl: Some(options.ttl.unwrap_or(Duration::ZERO)), ..options };
        decode(self.client.read(&self.path(subpath), query, options).await?)
    }

    /// POST `body` to `prefix` + `subpath`
    pub async fn post<B, T>(&self, subpath: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.write(Method::POST, subpath, Some(encode(body)?)).await
    }

    /// PUT `body` to `prefix` + `subpath`
    pub async fn put<B, T>(&self, subpath: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.write(Method::PUT, subpath, Some(encode(body)?)).await
    }

    /// PATCH `body` to `prefix` + `subpath`
    pub async fn patch<B, T>(&self, subpath: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.write(Method::PATCH, subpath, Some(encode(body)?)).await
    }

    /// DELETE `prefix` + `subpath`
    pub async fn delete<T: DeserializeOwned>(&self, subpath: &str) -> Result<T, ApiError> {
        self.write(Method::DELETE, subpath, None).await
    }

    /// DELETE carrying a body, for endpoints that take one.
    pub async fn delete_with<B, T>(&self, subpath: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.write(Method::DELETE, subpath, Some(encode(body)?)).await
    }

    async fn write<T: DeserializeOwned>(
        &self,
        method: Method,
        subpath: &str,
        body: Option<Value>,
    ) -> Result<T, ApiError> {
        decode(self.client.mutate(method, &self.path(subpath), body).await?)
    }
}

/// `languages`, `/languages` and `languages/` all become `/languages/`.
fn collection_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}/")
    }
}

fn encode<B: Serialize + ?Sized>(body: &B) -> Result<Value, ApiError> {
    serde_json::to_value(body).map_err(|err| ApiError::Encode(err.to_string()))
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|err| ApiError::Decode(err.to_string()))
}
