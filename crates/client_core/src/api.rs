use std::marker::PhantomData;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Entity, EntityId, Post, Professor, Student},
    protocol::{ApiResponse, ListQuery, ListResponse, Pagination},
    validation::Validate,
};
use tracing::{debug, info};
use url::Url;

use crate::{
    config::{ClientSettings, CollectionPaths},
    error::ClientError,
};

/// One page of records as requested by a list view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
    /// Non-empty term selects the search endpoint.
    pub search: Option<String>,
    /// Applied to the plain listing endpoint only.
    pub filters: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct Page<E> {
    pub items: Vec<E>,
    pub pagination: Pagination,
}

/// Where a list controller gets its pages from.
#[async_trait]
pub trait ListSource<E: Entity>: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<E>, ClientError>;
}

#[derive(Clone)]
pub struct BlogClient {
    http: Client,
    base_url: Url,
    collections: CollectionPaths,
}

impl BlogClient {
    pub fn new(settings: &ClientSettings) -> Result<Self, ClientError> {
        let base_url = settings
            .api_base()
            .map_err(|err| ClientError::Config(format!("{err:#}")))?;
        let http = Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|err| ClientError::Config(err.to_string()))?;
        Ok(Self {
            http,
            base_url,
            collections: settings.collections.clone(),
        })
    }

    pub fn resource<E: Entity>(&self) -> Resource<E> {
        Resource {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            collection: self.collections.for_kind(E::KIND).to_string(),
            _entity: PhantomData,
        }
    }

    pub fn posts(&self) -> Resource<Post> {
        self.resource()
    }

    pub fn professors(&self) -> Resource<Professor> {
        self.resource()
    }

    pub fn students(&self) -> Resource<Student> {
        self.resource()
    }

    /// `GET /health`; returns the server's message when it reports healthy.
    pub async fn health_check(&self) -> Result<Option<String>, ClientError> {
        let url = endpoint(&self.base_url, &["health"])?;
        let response = self.http.get(url).send().await?;
        let (status, envelope) =
            decode::<ApiResponse<serde_json::Value>>(response, "health endpoint").await?;
        ensure_success(
            status,
            envelope.success,
            envelope.message.clone(),
            envelope.errors,
            "health endpoint",
        )?;
        Ok(envelope.message)
    }
}

/// REST handle for one collection.
pub struct Resource<E> {
    http: Client,
    base_url: Url,
    collection: String,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for Resource<E> {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            collection: self.collection.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> Resource<E> {
    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn url(&self, tail: &[&str]) -> Result<Url, ClientError> {
        let mut segments: Vec<&str> = self
            .collection
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect();
        segments.extend_from_slice(tail);
        endpoint(&self.base_url, &segments)
    }

    fn label(&self, id: &EntityId) -> String {
        format!("{} {id}", E::KIND.label())
    }

    /// `GET /{collection}?page&limit[&filters]`
    pub async fn list(&self, query: &ListQuery) -> Result<Page<E>, ClientError> {
        let response = self
            .http
            .get(self.url(&[])?)
            .query(&query.to_params())
            .send()
            .await?;
        self.read_page(response, query.page, query.limit).await
    }

    /// `GET /{collection}/search?q&page&limit`
    pub async fn search(&self, term: &str, page: u32, limit: u32) -> Result<Page<E>, ClientError> {
        let response = self
            .http
            .get(self.url(&["search"])?)
            .query(&[
                ("q", term.to_string()),
                ("page", page.to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await?;
        self.read_page(response, page, limit).await
    }

    /// `GET /{collection}/{id}`
    pub async fn get(&self, id: &EntityId) -> Result<E, ClientError> {
        let response = self.http.get(self.url(&[id.as_str()])?).send().await?;
        self.read_record(response, &self.label(id)).await
    }

    /// `POST /{collection}`; the payload is validated before it is sent.
    pub async fn create(&self, draft: &E::Draft) -> Result<E, ClientError> {
        draft.validate()?;
        let response = self.http.post(self.url(&[])?).json(draft).send().await?;
        let created = self
            .read_record(response, &format!("new {}", E::KIND.label()))
            .await?;
        info!(collection = %self.collection, id = %created.id(), "api: created record");
        Ok(created)
    }

    /// `PUT /{collection}/{id}`
    pub async fn update(&self, id: &EntityId, changes: &E::Changes) -> Result<E, ClientError> {
        changes.validate()?;
        let response = self
            .http
            .put(self.url(&[id.as_str()])?)
            .json(changes)
            .send()
            .await?;
        let updated = self.read_record(response, &self.label(id)).await?;
        info!(collection = %self.collection, id = %id, "api: updated record");
        Ok(updated)
    }

    /// `DELETE /{collection}/{id}`; returns the server's confirmation message.
    pub async fn delete(&self, id: &EntityId) -> Result<Option<String>, ClientError> {
        let label = self.label(id);
        let response = self.http.delete(self.url(&[id.as_str()])?).send().await?;
        let (status, envelope) =
            decode::<ApiResponse<serde_json::Value>>(response, &label).await?;
        ensure_success(
            status,
            envelope.success,
            envelope.message.clone(),
            envelope.errors,
            &label,
        )?;
        info!(collection = %self.collection, id = %id, "api: deleted record");
        Ok(envelope.message)
    }

    async fn read_record(&self, response: Response, label: &str) -> Result<E, ClientError> {
        let (status, envelope) = decode::<ApiResponse<E>>(response, label).await?;
        ensure_success(
            status,
            envelope.success,
            envelope.message,
            envelope.errors,
            label,
        )?;
        envelope
            .data
            .ok_or_else(|| ClientError::NotFound(label.to_string()))
    }

    async fn read_page(
        &self,
        response: Response,
        page: u32,
        limit: u32,
    ) -> Result<Page<E>, ClientError> {
        let (status, envelope) = decode::<ListResponse<E>>(response, &self.collection).await?;
        ensure_success(
            status,
            envelope.success,
            envelope.message,
            envelope.errors,
            &self.collection,
        )?;
        let pagination = envelope
            .pagination
            .unwrap_or_else(|| Pagination::for_count(page, envelope.data.len() as u64, limit))
            .normalized();
        debug!(
            collection = %self.collection,
            page,
            total_pages = pagination.total_pages,
            items = envelope.data.len(),
            "api: fetched page"
        );
        Ok(Page {
            items: envelope.data,
            pagination,
        })
    }
}

#[async_trait]
impl<E: Entity> ListSource<E> for Resource<E> {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<E>, ClientError> {
        match request.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => self.search(term, request.page, request.limit).await,
            _ => {
                let query = ListQuery::new(request.page, request.limit)
                    .with_filters(request.filters.clone());
                self.list(&query).await
            }
        }
    }
}

fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, ClientError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ClientError::Config(format!("api url '{base}' cannot be a base")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Reads the body as `T`. A body that is not an envelope is classified by
/// the HTTP status instead.
async fn decode<T: DeserializeOwned>(
    response: Response,
    label: &str,
) -> Result<(StatusCode, T), ClientError> {
    let status = response.status();
    let body = response.bytes().await?;
    match serde_json::from_slice::<T>(&body) {
        Ok(value) => Ok((status, value)),
        Err(_) if status == StatusCode::NOT_FOUND => Err(ClientError::NotFound(label.to_string())),
        Err(_) if !status.is_success() => Err(ClientError::rejected(
            Some(status.as_u16()),
            None,
            Vec::new(),
        )),
        Err(err) => Err(ClientError::Decode(err.to_string())),
    }
}

/// The envelope's `success` flag decides, whatever the HTTP status was.
fn ensure_success(
    status: StatusCode,
    success: bool,
    message: Option<String>,
    errors: Vec<String>,
    label: &str,
) -> Result<(), ClientError> {
    if success {
        return Ok(());
    }
    if status == StatusCode::NOT_FOUND && errors.is_empty() {
        return Err(ClientError::NotFound(label.to_string()));
    }
    Err(ClientError::rejected(Some(status.as_u16()), message, errors))
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
