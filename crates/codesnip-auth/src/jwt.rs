use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;

use crate::error::AuthError;
use crate::session::Identity;

/// Claims of a Cognito ID token.
#[derive(Debug, Deserialize)]
pub struct IdTokenClaims {
    pub sub: String,
    pub iss: String,
    pub token_use: String,
    pub exp: u64,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename = "cognito:username")]
    pub username: Option<String>,
}

impl IdTokenClaims {
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.sub.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }
}

/// Where ID tokens must come from and who they must be issued to.
#[derive(Clone)]
pub struct TokenVerifier {
    pub decoding_key: DecodingKey,
    pub user_pool_id: String,
    pub region: String,
    pub app_client_id: String,
}

impl TokenVerifier {
    /// Build from the base64url RSA modulus and exponent of the pool's
    /// signing key (the `n` and `e` members of its JWKS entry).
    pub fn from_rsa_components(
        n: &str,
        e: &str,
        user_pool_id: &str,
        region: &str,
        app_client_id: &str,
    ) -> Result<Self, AuthError> {
        Ok(Self {
            decoding_key: DecodingKey::from_rsa_components(n, e)?,
            user_pool_id: user_pool_id.to_string(),
            region: region.to_string(),
            app_client_id: app_client_id.to_string(),
        })
    }

    fn issuer(&self) -> String {
        format!(
            "https://cognito-idp.{}.amazonaws.com/{}",
            self.region, self.user_pool_id
        )
    }

    /// Validate signature, issuer, audience and expiry of an ID token.
    pub fn validate_id_token(&self, token: &str) -> Result<IdTokenClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[self.issuer()]);
        validation.set_audience(&[&self.app_client_id]);
        validation.validate_exp = true;

        let token_data = decode::<IdTokenClaims>(token, &self.decoding_key, &validation)?;

        let token_use = &token_data.claims.token_use;
        if token_use != "id" {
            return Err(AuthError::InvalidToken(format!(
                "unexpected token_use: {token_use}"
            )));
        }

        Ok(token_data.claims)
    }
}
