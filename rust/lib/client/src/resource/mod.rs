//! Resource access adapter.
//!
//! One generic client per entity type. Every response goes through the
//! same path: status check → list-shape resolution (or single-record
//! unwrap) → field aliasing → typed record.

pub mod article;
pub mod experience;
pub mod lenient;
pub mod project;
pub mod skill;

use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::alias::{self, AliasRule};
use crate::envelope::{self, ListEnvelope};
use crate::error::{Operation, ResourceError};
use crate::http::{failure_message, json_body, TokenSource, Transport};

pub use article::Article;
pub use experience::Experience;
pub use project::Project;
pub use skill::Skill;

// ── Resource trait ──────────────────────────────────────────────────

/// How a record id is placed in the URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdStyle {
    /// `{path}?id={id}`
    Query,
    /// `{path}/{id}`
    Path,
}

/// Whether list calls carry the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListAuth {
    /// Never sent.
    Public,
    /// Sent when a session exists.
    Optional,
}

#[derive(Debug, Clone, Copy)]
pub struct Endpoints {
    pub list: &'static str,
    pub get: &'static str,
    pub create: &'static str,
    pub update: &'static str,
    pub delete: &'static str,
    pub id_style: IdStyle,
}

/// A backend entity type.
pub trait Resource: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Display name, used in errors and logs.
    const ENTITY: &'static str;
    const ENDPOINTS: Endpoints;
    const LIST_AUTH: ListAuth;
    /// Whether list calls forward [`ListFilter::search`].
    const SEARCHABLE: bool = false;
    /// Alias chains applied to each raw record before decoding.
    const ALIASES: &'static [AliasRule] = alias::COMMON;

    fn id(&self) -> Option<&str>;
    fn title(&self) -> &str;
    fn status(&self) -> &str;
    fn featured(&self) -> bool;
    /// Always renderable: URL, data URI or placeholder.
    fn image(&self) -> &str;
}

/// Entities whose create endpoint also accepts a multipart upload.
pub trait ImageUpload: Resource {}

/// Alias and decode one raw record.
pub fn normalize_record<T: Resource>(mut record: Map<String, Value>) -> Result<T, serde_json::Error> {
    alias::apply(&mut record, T::ALIASES);
    serde_json::from_value(Value::Object(record))
}

// ── Request options ─────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub search: Option<String>,
}

impl ListFilter {
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
        }
    }
}

/// A file sent as the `image` part of a multipart create.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub const PART_NAME: &'static str = "image";

    /// Read a file, guessing its MIME type from the extension.
    pub async fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| Self::PART_NAME.to_string());
        Ok(Self {
            mime: mime_for(path).to_string(),
            file_name,
            bytes,
        })
    }
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

// ── ResourceClient ──────────────────────────────────────────────────

/// Typed CRUD client for one entity type. Keeps no cache; every call goes
/// to the backend, and a failed call leaves nothing behind.
pub struct ResourceClient<T: Resource> {
    transport: Transport,
    token_source: Arc<dyn TokenSource>,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: Resource> Clone for ResourceClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            token_source: Arc::clone(&self.token_source),
            _phantom: PhantomData,
        }
    }
}

impl<T: Resource> ResourceClient<T> {
    pub fn new(transport: Transport, token_source: Arc<dyn TokenSource>) -> Self {
        Self {
            transport,
            token_source,
            _phantom: PhantomData,
        }
    }

    /// One page of records. `recognized == false` on the result means the
    /// backend answered 2xx without any list in the body.
    pub async fn list(
        &self,
        page: u32,
        page_size: u32,
        filter: &ListFilter,
    ) -> Result<ListEnvelope<T>, ResourceError> {
        let page = page.max(1);
        let page_size = page_size.max(1);

        let mut query = vec![("page", page.to_string()), ("limit", page_size.to_string())];
        if T::SEARCHABLE {
            if let Some(term) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
                query.push(("search", term.to_string()));
            }
        }

        let token = match T::LIST_AUTH {
            ListAuth::Public => None,
            ListAuth::Optional => self.token_source.token().await,
        };
        let req = self
            .transport
            .request(Method::GET, T::ENDPOINTS.list, token.as_deref())
            .query(&query);
        let body = self.send(Operation::List, T::ENDPOINTS.list, req).await?;

        let raw = envelope::resolve_list(&body, page, page_size);
        let listed = raw.items.len();
        let items: Vec<T> = raw
            .items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => match normalize_record::<T>(map) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        warn!("skipping undecodable {} record: {e}", T::ENTITY);
                        None
                    }
                },
                other => {
                    warn!("skipping non-object {} list entry: {other}", T::ENTITY);
                    None
                }
            })
            .collect();

        Ok(ListEnvelope {
            skipped: listed - items.len(),
            items,
            page: raw.page,
            total_pages: raw.total_pages,
            recognized: raw.recognized,
        })
    }

    pub async fn get(&self, id: &str) -> Result<T, ResourceError> {
        let token = self.token_source.token().await;
        let req = self.by_id(Method::GET, T::ENDPOINTS.get, id, token.as_deref(), Operation::Get)?;
        let body = self.send(Operation::Get, T::ENDPOINTS.get, req).await?;
        self.record(Operation::Get, body)?.ok_or_else(|| ResourceError {
            entity: T::ENTITY,
            operation: Operation::Get,
            status: None,
            message: format!("response contained no {} record", T::ENTITY),
        })
    }

    /// Create a record. Returns the stored record when the backend echoes
    /// one back.
    pub async fn create(&self, record: &T) -> Result<Option<T>, ResourceError> {
        let token = self.token_source.token().await;
        let req = self
            .transport
            .request(Method::POST, T::ENDPOINTS.create, token.as_deref())
            .json(record);
        let body = self.send(Operation::Create, T::ENDPOINTS.create, req).await?;
        self.record(Operation::Create, body)
    }

    pub async fn update(&self, id: &str, record: &T) -> Result<Option<T>, ResourceError> {
        let token = self.token_source.token().await;
        let req = self
            .by_id(Method::PUT, T::ENDPOINTS.update, id, token.as_deref(), Operation::Update)?
            .json(record);
        let body = self.send(Operation::Update, T::ENDPOINTS.update, req).await?;
        self.record(Operation::Update, body)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ResourceError> {
        let token = self.token_source.token().await;
        let req = self.by_id(Method::DELETE, T::ENDPOINTS.delete, id, token.as_deref(), Operation::Delete)?;
        self.send(Operation::Delete, T::ENDPOINTS.delete, req).await?;
        Ok(())
    }

    fn by_id(
        &self,
        method: Method,
        path: &str,
        id: &str,
        token: Option<&str>,
        operation: Operation,
    ) -> Result<RequestBuilder, ResourceError> {
        match T::ENDPOINTS.id_style {
            IdStyle::Query => Ok(self.transport.request(method, path, token).query(&[("id", id)])),
            IdStyle::Path => {
                let url = self
                    .transport
                    .segment_url(path, id)
                    .map_err(|message| self.error(operation, None, message))?;
                Ok(self.transport.request_to(method, url, token))
            }
        }
    }

    async fn send(&self, operation: Operation, path: &str, req: RequestBuilder) -> Result<Value, ResourceError> {
        debug!(entity = T::ENTITY, %operation, "request {path}");
        let resp = req
            .send()
            .await
            .map_err(|e| ResourceError::transport(T::ENTITY, operation, e))?;
        self.parse(operation, resp).await
    }

    async fn parse(&self, operation: Operation, resp: Response) -> Result<Value, ResourceError> {
        let status = resp.status();
        if !status.is_success() {
            let message = failure_message(resp).await;
            return Err(self.error(operation, Some(status.as_u16()), message));
        }
        json_body(resp)
            .await
            .map_err(|e| ResourceError::transport(T::ENTITY, operation, e))
    }

    /// Single-record body → record. `Ok(None)` when the body holds no
    /// record (empty, plain text, null or list `data`, bare status).
    fn record(&self, operation: Operation, body: Value) -> Result<Option<T>, ResourceError> {
        let Some(map) = envelope::unwrap_record(body) else {
            return Ok(None);
        };
        normalize_record(map)
            .map(Some)
            .map_err(|e| self.error(operation, None, format!("decode: {e}")))
    }

    fn error(&self, operation: Operation, status: Option<u16>, message: String) -> ResourceError {
        ResourceError {
            entity: T::ENTITY,
            operation,
            status,
            message,
        }
    }
}

impl<T: ImageUpload> ResourceClient<T> {
    /// Create with a file attached: the record's fields become text parts
    /// (lists comma-joined) and the file goes in the `image` part.
    pub async fn create_with_image(&self, record: &T, attachment: Attachment) -> Result<Option<T>, ResourceError> {
        let fields = match serde_json::to_value(record) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => Map::new(),
            Err(e) => return Err(self.error(Operation::Create, None, format!("encode: {e}"))),
        };

        let mut form = Form::new();
        for (key, value) in fields {
            if key == Attachment::PART_NAME {
                continue;
            }
            if let Some(text) = form_text(value) {
                form = form.text(key, text);
            }
        }
        let part = Part::bytes(attachment.bytes)
            .file_name(attachment.file_name)
            .mime_str(&attachment.mime)
            .map_err(|e| self.error(Operation::Create, None, format!("attachment: {e}")))?;
        form = form.part(Attachment::PART_NAME, part);

        let token = self.token_source.token().await;
        let req = self
            .transport
            .request(Method::POST, T::ENDPOINTS.create, token.as_deref())
            .multipart(form);
        let body = self.send(Operation::Create, T::ENDPOINTS.create, req).await?;
        self.record(Operation::Create, body)
    }
}

fn form_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(form_text)
                .collect::<Vec<_>>()
                .join(","),
        ),
        other => Some(other.to_string()),
    }
}
