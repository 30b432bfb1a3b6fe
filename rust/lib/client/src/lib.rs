//! Folio portfolio client.
//!
//! Session lifecycle (credential store, claims, single-flight refresh,
//! authorization guard), role-based navigation, and a resource adapter
//! that normalizes the backend's inconsistent response envelopes.
//!
//! # Usage
//!
//! ```ignore
//! use folio_client::{ClientConfig, Folio, ListFilter};
//!
//! let folio = Folio::open(&ClientConfig::load(&ClientConfig::default_path())?)?;
//! if folio.guard().evaluate().await.is_authorized() {
//!     let page = folio.articles().list(1, 10, &ListFilter::default()).await?;
//! }
//! ```

pub mod alias;
pub mod auth;
pub mod claims;
pub mod config;
pub mod envelope;
pub mod error;
pub mod guard;
pub mod http;
pub mod image;
pub mod nav;
pub mod resource;
pub mod session;
pub mod store;

use std::sync::Arc;

pub use auth::{AuthClient, LoginOutcome};
pub use claims::{decode, Claims, Role};
pub use config::ClientConfig;
pub use envelope::{ListEnvelope, ListShape};
pub use error::{AuthError, ConfigError, DecodeError, Operation, RefreshError, ResourceError, StoreError};
pub use guard::{AuthGuard, Decision, GuardMount, GuardState, ReauthPrompt, UnauthorizedReason};
pub use http::{NoAuth, StaticToken, TokenSource, Transport};
pub use image::{normalize_image, PLACEHOLDER_IMAGE};
pub use nav::{actions_for_session, visible_actions, Action};
pub use resource::{
    Article, Attachment, Experience, ListFilter, Project, Resource, ResourceClient, Skill,
};
pub use session::{Refreshed, SessionManager};
pub use store::{CredentialStore, MemoryCredentialStore, RedbCredentialStore, StoredSession, TokenPair};

// ── Folio ───────────────────────────────────────────────────────────

/// Everything a front end needs, wired once around one credential store.
#[derive(Clone)]
pub struct Folio {
    session: Arc<SessionManager>,
    page_size: u32,
}

/// Failure to assemble a [`Folio`] from configuration.
#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("http client: {0}")]
    Http(#[from] reqwest::Error),
}

impl Folio {
    /// Open the redb credential store named by `config`.
    pub fn open(config: &ClientConfig) -> Result<Self, OpenError> {
        config.validate()?;
        let store = RedbCredentialStore::open(&config.session_path)?;
        Ok(Self::with_store(config, Arc::new(store), config.transport()?))
    }

    /// Assemble around an existing store and transport.
    pub fn with_store(config: &ClientConfig, store: Arc<dyn CredentialStore>, transport: Transport) -> Self {
        let session = SessionManager::new(store, transport).with_leeway(config.refresh_leeway_secs);
        Self {
            session: Arc::new(session),
            page_size: config.page_size.max(1),
        }
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn guard(&self) -> AuthGuard {
        AuthGuard::new(Arc::clone(&self.session))
    }

    pub fn auth(&self) -> AuthClient {
        AuthClient::new(Arc::clone(&self.session))
    }

    /// Menu for whoever is logged in right now.
    pub fn menu(&self) -> &'static [Action] {
        actions_for_session(self.session.current().as_ref())
    }

    /// Adapter for any entity, authenticated through the session.
    pub fn resource<T: Resource>(&self) -> ResourceClient<T> {
        let token_source: Arc<dyn TokenSource> = self.session.clone();
        ResourceClient::new(self.session.transport().clone(), token_source)
    }

    pub fn experiences(&self) -> ResourceClient<Experience> {
        self.resource()
    }

    pub fn skills(&self) -> ResourceClient<Skill> {
        self.resource()
    }

    pub fn projects(&self) -> ResourceClient<Project> {
        self.resource()
    }

    pub fn articles(&self) -> ResourceClient<Article> {
        self.resource()
    }
}
