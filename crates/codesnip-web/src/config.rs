use std::env;
use std::net::SocketAddr;

use jiff::SignedDuration;

use crate::sessions::SessionLimits;

const DEFAULT_BUCKET: &str = "codesnip";
const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_BIND: &str = "127.0.0.1:3000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    S3 { bucket: String },
    Memory,
}

/// RSA components of the user pool's signing key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningKey {
    pub n: String,
    pub e: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CognitoConfig {
    pub client_id: String,
    /// Local ID token validation needs both the pool id and its key.
    pub user_pool_id: Option<String>,
    pub signing_key: Option<SigningKey>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthBackend {
    Cognito(CognitoConfig),
    /// Local accounts as `(username, password)`.
    Memory { users: Vec<(String, String)> },
}

#[derive(Debug, Clone)]
pub struct WebConfig {
    pub store: StoreBackend,
    pub auth: AuthBackend,
    pub region: String,
    pub bind: SocketAddr,
    /// Serve through the Lambda runtime instead of a local listener.
    pub lambda: bool,
    pub sessions: SessionLimits,
    /// Mark cookies `Secure`. On by default unless serving plain HTTP on
    /// a loopback address.
    pub secure_cookies: bool,
}

impl WebConfig {
    pub fn from_env() -> eyre::Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from any variable source. Blank values
    /// count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> eyre::Result<Self> {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let store = match var("CODESNIP_STORE").as_deref() {
            None | Some("s3") => StoreBackend::S3 {
                bucket: var("CODESNIP_BUCKET").unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
            },
            Some("memory") => StoreBackend::Memory,
            Some(other) => eyre::bail!("unknown CODESNIP_STORE {other:?} (expected s3 or memory)"),
        };

        let auth = match var("CODESNIP_AUTH").as_deref() {
            None | Some("cognito") => {
                let client_id = var("COGNITO_CLIENT_ID")
                    .ok_or_else(|| eyre::eyre!("COGNITO_CLIENT_ID is required for cognito auth"))?;
                let signing_key = match (var("COGNITO_JWT_N"), var("COGNITO_JWT_E")) {
                    (Some(n), Some(e)) => Some(SigningKey { n, e }),
                    (None, None) => None,
                    _ => eyre::bail!("COGNITO_JWT_N and COGNITO_JWT_E must be set together"),
                };
                AuthBackend::Cognito(CognitoConfig {
                    client_id,
                    user_pool_id: var("COGNITO_USER_POOL_ID"),
                    signing_key,
                })
            }
            Some("memory") => AuthBackend::Memory {
                users: parse_users(&var("CODESNIP_DEV_USERS").unwrap_or_default())?,
            },
            Some(other) => eyre::bail!("unknown CODESNIP_AUTH {other:?} (expected cognito or memory)"),
        };

        let bind = var("CODESNIP_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind: SocketAddr = bind
            .parse()
            .map_err(|e| eyre::eyre!("invalid CODESNIP_BIND {bind:?}: {e}"))?;

        let lambda = var("AWS_LAMBDA_FUNCTION_NAME").is_some();

        let mut sessions = SessionLimits::default();
        if let Some(secs) = var("CODESNIP_SESSION_IDLE_SECS") {
            sessions.idle = SignedDuration::from_secs(positive("CODESNIP_SESSION_IDLE_SECS", &secs)?);
        }
        if let Some(max) = var("CODESNIP_MAX_SESSIONS") {
            let max = positive("CODESNIP_MAX_SESSIONS", &max)?;
            sessions.capacity = usize::try_from(max)
                .map_err(|e| eyre::eyre!("invalid CODESNIP_MAX_SESSIONS {max}: {e}"))?;
        }

        let secure_cookies = match var("CODESNIP_SECURE_COOKIES").as_deref() {
            None => lambda || !bind.ip().is_loopback(),
            Some("true" | "1") => true,
            Some("false" | "0") => false,
            Some(other) => eyre::bail!("invalid CODESNIP_SECURE_COOKIES {other:?} (expected true or false)"),
        };

        Ok(Self {
            store,
            auth,
            region: var("AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            bind,
            lambda,
            sessions,
            secure_cookies,
        })
    }
}

fn positive(name: &str, value: &str) -> eyre::Result<i64> {
    match value.parse::<i64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(eyre::eyre!("invalid {name} {value:?} (expected a positive integer)")),
    }
}

/// Parse `user:password` pairs separated by commas.
fn parse_users(input: &str) -> eyre::Result<Vec<(String, String)>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once(':') {
            Some((user, password)) if !user.is_empty() => {
                Ok((user.to_string(), password.to_string()))
            }
            _ => Err(eyre::eyre!("invalid CODESNIP_DEV_USERS entry {pair:?} (expected user:password)")),
        })
        .collect()
}
