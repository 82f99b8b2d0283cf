use std::sync::{Arc, Mutex};

use aws_sdk_cognitoidentityprovider::Client;
use tracing::{info, warn};

use crate::error::AuthError;
use crate::flows::{self, AuthResult, Tokens};
use crate::jwt::TokenVerifier;
use crate::session::{
    BoxFuture, Identity, SessionCell, SessionFactory, SessionProvider, SessionStatus,
    SessionWatch, SignIn,
};

struct Shared {
    client: Client,
    app_client_id: String,
    verifier: Option<TokenVerifier>,
}

impl Shared {
    /// Resolve the owner of freshly issued tokens: locally from the ID token
    /// when a verifier is configured, otherwise by asking the user pool.
    async fn identify(&self, tokens: &Tokens) -> Result<Identity, AuthError> {
        match &self.verifier {
            Some(verifier) => Ok(verifier.validate_id_token(&tokens.id_token)?.identity()),
            None => flows::get_user(&self.client, &tokens.access_token).await,
        }
    }
}

/// Opens a [`CognitoSession`] per client session, sharing one Cognito client.
#[derive(Clone)]
pub struct CognitoSessions {
    shared: Arc<Shared>,
}

impl CognitoSessions {
    pub fn new(client: Client, app_client_id: impl Into<String>, verifier: Option<TokenVerifier>) -> Self {
        Self {
            shared: Arc::new(Shared {
                client,
                app_client_id: app_client_id.into(),
                verifier,
            }),
        }
    }

    /// Build a Cognito client for `region` from the default AWS config.
    pub async fn connect(
        region: &str,
        app_client_id: impl Into<String>,
        verifier: Option<TokenVerifier>,
    ) -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;
        Self::new(Client::new(&config), app_client_id, verifier)
    }
}

impl SessionFactory for CognitoSessions {
    fn open(&self, restore: Option<String>) -> Arc<dyn SessionProvider> {
        let initial = if restore.is_some() {
            SessionStatus::Unknown
        } else {
            SessionStatus::Anonymous
        };
        let session = Arc::new(CognitoSession {
            shared: Arc::clone(&self.shared),
            cell: SessionCell::new(initial),
            tokens: Mutex::new(None),
        });

        if let Some(refresh_token) = restore {
            let restoring = Arc::clone(&session);
            tokio::spawn(async move { restoring.restore(&refresh_token).await });
        }

        session
    }
}

/// One signed-in (or not) browser session backed by the user pool.
pub struct CognitoSession {
    shared: Arc<Shared>,
    cell: SessionCell,
    tokens: Mutex<Option<Tokens>>,
}

impl CognitoSession {
    async fn restore(&self, refresh_token: &str) {
        let result = async {
            let tokens =
                flows::refresh_auth(&self.shared.client, &self.shared.app_client_id, refresh_token)
                    .await?;
            self.establish(tokens).await
        }
        .await;

        if let Err(e) = result {
            warn!(error = %e, "could not restore remembered session");
            self.cell.set(SessionStatus::Anonymous);
        }
    }

    async fn establish(&self, tokens: Tokens) -> Result<Identity, AuthError> {
        let identity = self.shared.identify(&tokens).await?;
        self.store_tokens(Some(tokens));
        info!(user_id = %identity.user_id, "session established");
        self.cell.set(SessionStatus::Authenticated(identity.clone()));
        Ok(identity)
    }

    fn store_tokens(&self, tokens: Option<Tokens>) {
        match self.tokens.lock() {
            Ok(mut slot) => *slot = tokens,
            Err(poisoned) => *poisoned.into_inner() = tokens,
        }
    }

    fn access_token(&self) -> Option<String> {
        self.tokens
            .lock()
            .ok()?
            .as_ref()
            .map(|t| t.access_token.clone())
    }

    async fn sign_in_with_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<SignIn, AuthError> {
        let result = flows::initiate_auth(
            &self.shared.client,
            &self.shared.app_client_id,
            username,
            password,
        )
        .await?;

        match result {
            AuthResult::Success(tokens) => Ok(SignIn::Complete(self.establish(tokens).await?)),
            AuthResult::MfaChallenge { session } => Ok(SignIn::MfaRequired { session }),
        }
    }

    async fn confirm_code(
        &self,
        username: &str,
        session: &str,
        code: &str,
    ) -> Result<Identity, AuthError> {
        let tokens = flows::respond_to_mfa(
            &self.shared.client,
            &self.shared.app_client_id,
            username,
            session,
            code,
        )
        .await?;
        self.establish(tokens).await
    }

    async fn end(&self) -> Result<(), AuthError> {
        if let Some(access_token) = self.access_token() {
            flows::global_sign_out(&self.shared.client, &access_token).await?;
        }
        self.store_tokens(None);
        self.cell.set(SessionStatus::Anonymous);
        info!("signed out");
        Ok(())
    }
}

impl SessionProvider for CognitoSession {
    fn current(&self) -> SessionStatus {
        self.cell.get()
    }

    fn subscribe(&self) -> SessionWatch {
        self.cell.subscribe()
    }

    fn sign_in<'a>(
        &'a self,
        username: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<SignIn, AuthError>> {
        Box::pin(self.sign_in_with_password(username, password))
    }

    fn confirm_mfa<'a>(
        &'a self,
        username: &'a str,
        session: &'a str,
        code: &'a str,
    ) -> BoxFuture<'a, Result<Identity, AuthError>> {
        Box::pin(self.confirm_code(username, session, code))
    }

    fn sign_out(&self) -> BoxFuture<'_, Result<(), AuthError>> {
        Box::pin(self.end())
    }

    fn remember_token(&self) -> Option<String> {
        self.tokens
            .lock()
            .ok()?
            .as_ref()
            .map(|t| t.refresh_token.clone())
            .filter(|token| !token.is_empty())
    }
}
