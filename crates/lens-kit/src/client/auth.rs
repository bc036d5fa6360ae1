//! Token refresh and wallet login.
//!
//! A [`TokenRefresher`] turns a stored session into a fresh access token.
//! [`ApiTokenRefresher`] does that with the `refresh` mutation and keeps the
//! stored session in step with the rotated tokens.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;

use super::graphql::GraphQlClient;
use super::signer::TypedDataSigner;
use super::storage::{SessionStore, load_session, save_session};
use crate::documents;
use crate::error::{ApiError, AuthError, Error, StorageError};
use crate::types::{AccessToken, AuthTokens, SessionRecord};

/// Boxed future returned by [`TokenRefresher::refresh_auth_token`].
pub type RefreshFuture<'a> = Pin<Box<dyn Future<Output = Result<AccessToken, AuthError>> + Send + 'a>>;

// ============================================================================
// TokenRefresher Trait
// ============================================================================

/// Trait for obtaining a fresh access token.
///
/// Each call yields a token valid at the time of the call. Implementations
/// decide where refresh credentials live and whether to rotate them.
pub trait TokenRefresher: Send + Sync {
    fn refresh_auth_token(&self) -> RefreshFuture<'_>;
}

impl TokenRefresher for Arc<dyn TokenRefresher> {
    fn refresh_auth_token(&self) -> RefreshFuture<'_> {
        (**self).refresh_auth_token()
    }
}

// ============================================================================
// ApiTokenRefresher
// ============================================================================

#[derive(Deserialize)]
struct RefreshData {
    refresh: AuthTokens,
}

/// Refreshes via the API's `refresh` mutation using the stored refresh token.
pub struct ApiTokenRefresher {
    client: GraphQlClient,
    store: Arc<dyn SessionStore>,
}

impl ApiTokenRefresher {
    /// `client` should be unauthenticated; the refresh token is the credential.
    pub fn new(client: GraphQlClient, store: Arc<dyn SessionStore>) -> Self {
        Self { client, store }
    }

    /// Rotate the stored tokens and return the new pair.
    pub async fn refresh(&self) -> Result<AuthTokens, AuthError> {
        let session = match load_session(self.store.as_ref()) {
            Ok(Some(session)) => session,
            Ok(None) => return Err(AuthError::NoSession),
            Err(StorageError::Json(e)) => return Err(AuthError::InvalidSession(e.to_string())),
            Err(e) => return Err(e.into()),
        };

        // A refresh token is single-use, so the rotation is never re-sent
        let data: RefreshData = self
            .client
            .execute_once(
                documents::REFRESH,
                json!({ "refreshToken": session.refresh_token }),
            )
            .await
            .map_err(|e| match e {
                ApiError::Unauthenticated(msg) => AuthError::RefreshRejected(msg),
                other => AuthError::Api(other),
            })?;

        save_session(self.store.as_ref(), &SessionRecord::from(data.refresh.clone()))?;
        tracing::debug!(url = %self.client.url(), "Refreshed access token");

        Ok(data.refresh)
    }
}

impl TokenRefresher for ApiTokenRefresher {
    fn refresh_auth_token(&self) -> RefreshFuture<'_> {
        Box::pin(async move { Ok(self.refresh().await?.access_token) })
    }
}

impl std::fmt::Debug for ApiTokenRefresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiTokenRefresher")
            .field("url", &self.client.url())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Wallet login
// ============================================================================

#[derive(Deserialize)]
struct ChallengeData {
    challenge: Challenge,
}

#[derive(Deserialize)]
struct Challenge {
    text: String,
}

#[derive(Deserialize)]
struct AuthenticateData {
    authenticate: AuthTokens,
}

/// Sign in with `signer` and persist the resulting session.
///
/// Runs challenge, personal-message signature and `authenticate`, then stores
/// the tokens under [`STORAGE_KEY`](crate::STORAGE_KEY).
pub(crate) async fn authenticate(
    client: &GraphQlClient,
    signer: &dyn TypedDataSigner,
    store: &dyn SessionStore,
) -> Result<AuthTokens, Error> {
    let address = signer.address();

    let challenge: ChallengeData = client
        .execute(documents::GET_CHALLENGE, json!({ "address": address }))
        .await?;
    let signature = signer
        .sign_message(challenge.challenge.text.as_bytes())
        .await?;

    let data: AuthenticateData = client
        .execute_once(
            documents::AUTHENTICATE,
            json!({ "address": address, "signature": signature }),
        )
        .await?;

    save_session(store, &SessionRecord::from(data.authenticate.clone()))?;
    tracing::debug!(address = %address, "Authenticated");

    Ok(data.authenticate)
}
