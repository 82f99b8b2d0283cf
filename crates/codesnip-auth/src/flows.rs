use std::collections::HashMap;

use aws_sdk_cognitoidentityprovider::Client;
use aws_sdk_cognitoidentityprovider::types::{
    AuthFlowType, AuthenticationResultType, ChallengeNameType,
};
use tracing::info;

use crate::error::AuthError;
use crate::session::Identity;

/// Tokens issued by the user pool.
#[derive(Debug, Clone)]
pub struct Tokens {
    pub access_token: String,
    pub id_token: String,
    pub refresh_token: String,
}

/// Result of an initial authentication attempt.
pub enum AuthResult {
    Success(Tokens),
    /// MFA challenge required; the caller must provide a TOTP code.
    MfaChallenge { session: String },
}

fn tokens_from(result: &AuthenticationResultType, fallback_refresh: &str) -> Tokens {
    Tokens {
        access_token: result.access_token().unwrap_or_default().to_string(),
        id_token: result.id_token().unwrap_or_default().to_string(),
        // Refresh flows don't hand back a new refresh token.
        refresh_token: result
            .refresh_token()
            .unwrap_or(fallback_refresh)
            .to_string(),
    }
}

/// Username/password authentication against the app client.
pub async fn initiate_auth(
    client: &Client,
    app_client_id: &str,
    username: &str,
    password: &str,
) -> Result<AuthResult, AuthError> {
    info!(username = username, "initiating auth");

    let mut auth_params = HashMap::new();
    auth_params.insert("USERNAME".to_string(), username.to_string());
    auth_params.insert("PASSWORD".to_string(), password.to_string());

    let resp = client
        .initiate_auth()
        .auth_flow(AuthFlowType::UserPasswordAuth)
        .client_id(app_client_id)
        .set_auth_parameters(Some(auth_params))
        .send()
        .await
        .map_err(|e| AuthError::AuthFailed(e.into_service_error().to_string()))?;

    if let Some(result) = resp.authentication_result() {
        Ok(AuthResult::Success(tokens_from(result, "")))
    } else if resp.challenge_name() == Some(&ChallengeNameType::SoftwareTokenMfa) {
        let session = resp.session().unwrap_or_default().to_string();
        Ok(AuthResult::MfaChallenge { session })
    } else {
        Err(AuthError::AuthFailed(format!(
            "unsupported challenge: {:?}",
            resp.challenge_name()
        )))
    }
}

/// Answer a TOTP challenge.
pub async fn respond_to_mfa(
    client: &Client,
    app_client_id: &str,
    username: &str,
    session: &str,
    mfa_code: &str,
) -> Result<Tokens, AuthError> {
    info!(username = username, "responding to MFA challenge");

    let mut challenge_responses = HashMap::new();
    challenge_responses.insert("USERNAME".to_string(), username.to_string());
    challenge_responses.insert("SOFTWARE_TOKEN_MFA_CODE".to_string(), mfa_code.to_string());

    let resp = client
        .respond_to_auth_challenge()
        .client_id(app_client_id)
        .challenge_name(ChallengeNameType::SoftwareTokenMfa)
        .set_challenge_responses(Some(challenge_responses))
        .session(session)
        .send()
        .await
        .map_err(|e| AuthError::MfaFailed(e.into_service_error().to_string()))?;

    resp.authentication_result()
        .map(|result| tokens_from(result, ""))
        .ok_or_else(|| AuthError::MfaFailed("MFA response did not return tokens".to_string()))
}

/// Exchange a refresh token for fresh access and id tokens.
pub async fn refresh_auth(
    client: &Client,
    app_client_id: &str,
    refresh_token: &str,
) -> Result<Tokens, AuthError> {
    let mut auth_params = HashMap::new();
    auth_params.insert("REFRESH_TOKEN".to_string(), refresh_token.to_string());

    let resp = client
        .initiate_auth()
        .auth_flow(AuthFlowType::RefreshTokenAuth)
        .client_id(app_client_id)
        .set_auth_parameters(Some(auth_params))
        .send()
        .await
        .map_err(|e| AuthError::Cognito(e.into_service_error().to_string()))?;

    resp.authentication_result()
        .map(|result| tokens_from(result, refresh_token))
        .ok_or_else(|| AuthError::AuthFailed("refresh failed".to_string()))
}

/// Invalidate every token issued to the user.
pub async fn global_sign_out(client: &Client, access_token: &str) -> Result<(), AuthError> {
    client
        .global_sign_out()
        .access_token(access_token)
        .send()
        .await
        .map_err(|e| AuthError::SignOutFailed(e.into_service_error().to_string()))?;
    Ok(())
}

/// Ask the user pool who owns an access token.
pub async fn get_user(client: &Client, access_token: &str) -> Result<Identity, AuthError> {
    let resp = client
        .get_user()
        .access_token(access_token)
        .send()
        .await
        .map_err(|e| AuthError::InvalidToken(e.into_service_error().to_string()))?;

    let attribute = |name: &str| {
        resp.user_attributes()
            .iter()
            .find(|attr| attr.name() == name)
            .and_then(|attr| attr.value())
            .map(str::to_string)
    };

    let user_id = attribute("sub")
        .ok_or_else(|| AuthError::InvalidToken("user has no sub attribute".to_string()))?;

    Ok(Identity {
        user_id,
        username: Some(resp.username().to_string()),
        email: attribute("email"),
    })
}
