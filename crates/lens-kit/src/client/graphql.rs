//! Low-level GraphQL client for the Lens API.

use std::time::Duration;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::error::ApiError;
use crate::types::AccessToken;

/// Header carrying the bearer token on authenticated requests.
pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";

/// Retry configuration for GraphQL calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of retries.
    pub max_retries: u32,
    /// Initial delay in milliseconds.
    pub initial_delay_ms: u64,
    /// Maximum delay in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 500,
            max_delay_ms: 5000,
        }
    }
}

impl RetryConfig {
    /// Never retry.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    fn delay(&self, attempt: u32) -> Duration {
        let delay = self
            .initial_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt))
            .min(self.max_delay_ms);
        Duration::from_millis(delay)
    }
}

#[derive(Serialize)]
struct GraphQlRequest<'a, V: Serialize> {
    query: &'a str,
    variables: &'a V,
}

#[derive(Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlErrorBody>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorBody {
    message: String,
    #[serde(default)]
    extensions: Option<Value>,
}

impl GraphQlErrorBody {
    fn code(&self) -> Option<&str> {
        self.extensions.as_ref()?.get("code")?.as_str()
    }
}

/// A handle to the GraphQL endpoint.
///
/// A handle is bound to one URL and at most one access token for its whole
/// life. Authenticated variants are derived with [`authenticated`] rather
/// than by mutating an existing handle, so a shared handle never changes
/// identity under its other holders.
///
/// [`authenticated`]: GraphQlClient::authenticated
pub struct GraphQlClient {
    url: String,
    client: reqwest::Client,
    access_token: Option<AccessToken>,
    retry_config: RetryConfig,
}

impl GraphQlClient {
    /// Create an unauthenticated client for `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_retry_config(url, RetryConfig::default())
    }

    /// Create an unauthenticated client with custom retry configuration.
    pub fn with_retry_config(url: impl Into<String>, retry_config: RetryConfig) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
            access_token: None,
            retry_config,
        }
    }

    /// Create a client that sends `x-access-token: Bearer <token>`.
    pub fn with_access_token(url: impl Into<String>, access_token: AccessToken) -> Self {
        Self {
            access_token: Some(access_token),
            ..Self::new(url)
        }
    }

    /// A new handle for the same endpoint carrying `access_token`.
    ///
    /// The underlying connection pool is shared with `self`.
    pub fn authenticated(&self, access_token: AccessToken) -> Self {
        Self {
            url: self.url.clone(),
            client: self.client.clone(),
            access_token: Some(access_token),
            retry_config: self.retry_config.clone(),
        }
    }

    /// Get the endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The token this handle authenticates with, if any.
    pub fn access_token(&self) -> Option<&AccessToken> {
        self.access_token.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// The `x-access-token` header value, if authenticated.
    pub fn auth_header(&self) -> Option<String> {
        self.access_token.as_ref().map(AccessToken::bearer)
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry_config
    }

    /// Execute a query with retries, decoding `data` into `R`.
    pub async fn execute<V: Serialize, R: DeserializeOwned>(
        &self,
        document: &str,
        variables: V,
    ) -> Result<R, ApiError> {
        let request = GraphQlRequest {
            query: document,
            variables: &variables,
        };
        let total_attempts = self.retry_config.max_retries + 1;

        for attempt in 0..total_attempts {
            match self.try_execute::<R, V>(&request).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < total_attempts - 1 => {
                    let delay = self.retry_config.delay(attempt);
                    tracing::warn!(
                        url = %self.url,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying GraphQL request"
                    );
                    sleep(delay).await;
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        Err(ApiError::Timeout(total_attempts))
    }

    /// Execute a mutation in a single attempt, decoding `data` into `R`.
    ///
    /// Writes are never re-sent: a failed attempt may still have been applied
    /// upstream, so its error is returned as-is.
    pub async fn execute_once<V: Serialize, R: DeserializeOwned>(
        &self,
        document: &str,
        variables: V,
    ) -> Result<R, ApiError> {
        let request = GraphQlRequest {
            query: document,
            variables: &variables,
        };
        self.try_execute::<R, V>(&request).await
    }

    /// Single attempt at a request.
    async fn try_execute<R: DeserializeOwned, V: Serialize>(
        &self,
        request: &GraphQlRequest<'_, V>,
    ) -> Result<R, ApiError> {
        let mut builder = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(request);
        if let Some(header) = self.auth_header() {
            builder = builder.header(ACCESS_TOKEN_HEADER, header);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let retryable = is_retryable_status(status.as_u16());
            return Err(ApiError::network(
                format!("HTTP {}: {}", status, body),
                Some(status.as_u16()),
                retryable,
            ));
        }

        let response: GraphQlResponse = serde_json::from_str(&body)?;

        if let Some(error) = response.errors.first() {
            return Err(classify_error(error, response.errors.len()));
        }

        let data = response
            .data
            .filter(|d| !d.is_null())
            .ok_or_else(|| ApiError::InvalidResponse("Missing data in response".to_string()))?;

        Ok(serde_json::from_value(data)?)
    }
}

impl Clone for GraphQlClient {
    fn clone(&self) -> Self {
        Self {
            url: self.url.clone(),
            client: self.client.clone(),
            access_token: self.access_token.clone(),
            retry_config: self.retry_config.clone(),
        }
    }
}

impl std::fmt::Debug for GraphQlClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphQlClient")
            .field("url", &self.url)
            .field("authenticated", &self.is_authenticated())
            .field("retry_config", &self.retry_config)
            .finish()
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Check if an HTTP status code is retryable.
fn is_retryable_status(status: u16) -> bool {
    // 408 Request Timeout, 429 Too Many Requests, 5xx
    status == 408 || status == 429 || (500..600).contains(&status)
}

fn classify_error(error: &GraphQlErrorBody, count: usize) -> ApiError {
    let message = if count > 1 {
        format!("{} (+{} more)", error.message, count - 1)
    } else {
        error.message.clone()
    };

    match error.code() {
        Some("UNAUTHENTICATED") => ApiError::Unauthenticated(message),
        code => ApiError::GraphQl {
            message,
            code: code.map(String::from),
        },
    }
}

#[cfg(not(target_arch = "wasm32"))]
async fn sleep(duration: Duration) {
    tokio::time::sleep(duration).await;
}

#[cfg(target_arch = "wasm32")]
async fn sleep(duration: Duration) {
    gloo_timers::future::sleep(duration).await;
}
