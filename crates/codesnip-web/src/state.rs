use std::sync::Arc;

use codesnip_auth::cognito::CognitoSessions;
use codesnip_auth::jwt::TokenVerifier;
use codesnip_auth::memory::MemoryAccounts;
use codesnip_auth::session::SessionFactory;
use codesnip_storage::memory::MemoryDocumentStore;
use codesnip_storage::s3::S3DocumentStore;
use codesnip_storage::store::DocumentStore;
use tracing::{info, warn};

use crate::config::{AuthBackend, CognitoConfig, StoreBackend, WebConfig};
use crate::render::Templates;
use crate::sessions::{BrowserSessions, SessionLimits};

/// Shared application state, injected into all route handlers via Axum state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub sessions: Arc<dyn SessionFactory>,
    pub browsers: BrowserSessions,
    pub templates: Arc<Templates>,
    /// Whether cookies carry the `Secure` attribute.
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        sessions: Arc<dyn SessionFactory>,
    ) -> Result<Self, tera::Error> {
        Ok(Self {
            store,
            sessions,
            browsers: BrowserSessions::default(),
            templates: Arc::new(Templates::new()?),
            secure_cookies: false,
        })
    }

    pub fn with_session_limits(mut self, limits: SessionLimits) -> Self {
        self.browsers = BrowserSessions::new(limits);
        self
    }

    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    /// Connect the configured backends.
    pub async fn from_config(config: &WebConfig) -> eyre::Result<Self> {
        let store: Arc<dyn DocumentStore> = match &config.store {
            StoreBackend::S3 { bucket } => {
                info!(bucket = %bucket, region = %config.region, "using S3 document store");
                Arc::new(S3DocumentStore::connect(&config.region, bucket.as_str()).await)
            }
            StoreBackend::Memory => {
                warn!("using in-memory document store; documents are lost on exit");
                Arc::new(MemoryDocumentStore::new())
            }
        };

        let sessions: Arc<dyn SessionFactory> = match &config.auth {
            AuthBackend::Cognito(cognito) => {
                let verifier = token_verifier(cognito, &config.region)?;
                if verifier.is_none() {
                    info!("no pool signing key configured; identities come from GetUser");
                }
                Arc::new(
                    CognitoSessions::connect(&config.region, cognito.client_id.as_str(), verifier)
                        .await,
                )
            }
            AuthBackend::Memory { users } => {
                let accounts = users
                    .iter()
                    .fold(MemoryAccounts::new(), |accounts, (user, password)| {
                        accounts.with_user(user, password)
                    });
                if accounts.is_empty() {
                    warn!("memory auth has no accounts; nobody can sign in");
                }
                Arc::new(accounts)
            }
        };

        Ok(Self::new(store, sessions)?
            .with_session_limits(config.sessions)
            .with_secure_cookies(config.secure_cookies))
    }
}

fn token_verifier(config: &CognitoConfig, region: &str) -> eyre::Result<Option<TokenVerifier>> {
    let (Some(pool), Some(key)) = (&config.user_pool_id, &config.signing_key) else {
        return Ok(None);
    };
    let verifier =
        TokenVerifier::from_rsa_components(&key.n, &key.e, pool, region, &config.client_id)?;
    Ok(Some(verifier))
}
