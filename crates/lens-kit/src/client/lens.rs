//! The main Lens client.

use std::sync::{Arc, OnceLock};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::documents;
use crate::error::{ApiError, Error};
use crate::types::{
    API_URL, Address, AuthTokens, CreatePostTypedDataResult, CreatePublicPostRequest,
    DoesFollowRequest, EvmSignature, FollowRequest, FollowStatus, Network, Paginated, Profile,
    Publication, PublicationSortCriteria, RelayResult, SetProfileMetadataRequest, SignedTypedData,
    TypedDataResult, UnfollowRequest,
};

use super::auth::{self, ApiTokenRefresher, TokenRefresher};
use super::graphql::{GraphQlClient, RetryConfig};
use super::query::ProfileQuery;
use super::signer::{LocalWallet, TypedDataSigner};
use super::storage::{InMemorySessionStore, SessionStore, clear_session, read_session_marker};
use super::typed_data::{TypedDataOperation, request_typed_data, sign_result};

static BASIC_CLIENT: OnceLock<Arc<GraphQlClient>> = OnceLock::new();

/// The process-wide unauthenticated handle for [`API_URL`].
///
/// Created on first use and shared by every [`Lens`] built for mainnet with
/// the default retry configuration.
pub fn basic_client() -> Arc<GraphQlClient> {
    BASIC_CLIENT
        .get_or_init(|| Arc::new(GraphQlClient::new(API_URL)))
        .clone()
}

fn take_field<R: DeserializeOwned>(mut data: Value, field: &str) -> Result<R, ApiError> {
    let value = data
        .get_mut(field)
        .map(Value::take)
        .ok_or_else(|| ApiError::InvalidResponse(format!("Missing '{}' in response", field)))?;
    Ok(serde_json::from_value(value)?)
}

/// Run a query and decode the single top-level `field` of its data.
pub(crate) async fn execute_field<R: DeserializeOwned>(
    client: &GraphQlClient,
    document: &str,
    variables: Value,
    field: &str,
) -> Result<R, ApiError> {
    take_field(client.execute(document, variables).await?, field)
}

/// Run a mutation once, without retries, and decode its top-level `field`.
pub(crate) async fn mutate_field<R: DeserializeOwned>(
    client: &GraphQlClient,
    document: &str,
    variables: Value,
    field: &str,
) -> Result<R, ApiError> {
    take_field(client.execute_once(document, variables).await?, field)
}

/// The main client for the Lens API.
///
/// `Lens` is the single entry point for reads, wallet login and signed
/// writes. Reads degrade to an anonymous handle when the stored session
/// can't be refreshed; writes require a fresh token and report every
/// failure.
///
/// # Example
///
/// ```rust,no_run
/// use lens_kit::*;
///
/// #[tokio::main]
/// async fn main() -> Result<(), lens_kit::Error> {
///     // Read-only client
///     let lens = Lens::mainnet().build();
///     let found = lens.fetch_profile("0x01").await?;
///     println!("{}", found.profile.handle);
///
///     // Client with a wallet for login and signed writes
///     let lens = Lens::mainnet()
///         .private_key("0x...")?
///         .build();
///     lens.authenticate().await?;
///
///     let request = CreatePublicPostRequest::new("0x01", "ipfs://Qm...");
///     let signed = lens.sign_create_post_typed_data(request).await?;
///     lens.broadcast(&signed.result.id, signed.signature).await?;
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Lens {
    default_client: Arc<GraphQlClient>,
    store: Arc<dyn SessionStore>,
    refresher: Arc<dyn TokenRefresher>,
    signer: Option<Arc<dyn TypedDataSigner>>,
    network: Network,
}

impl Lens {
    /// Create a builder for mainnet.
    pub fn mainnet() -> LensBuilder {
        LensBuilder::new(API_URL, Network::Mainnet)
    }

    /// Create a builder for the Mumbai testnet.
    pub fn testnet() -> LensBuilder {
        LensBuilder::new(crate::types::TESTNET_API_URL, Network::Testnet)
    }

    /// Create a builder with a custom API URL.
    pub fn custom(api_url: impl Into<String>) -> LensBuilder {
        LensBuilder::new(api_url, Network::Custom)
    }

    /// Create a configured client from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `LENS_NETWORK` (optional): `"mainnet"`, `"testnet"`, or a custom API URL.
    ///   Defaults to `"mainnet"` if not set.
    /// - `LENS_PRIVATE_KEY` (optional): hex private key of the signing wallet.
    /// - `LENS_SESSION_FILE` (optional): path of a file to persist the session in.
    ///
    /// # Example
    ///
    /// ```bash
    /// export LENS_NETWORK=testnet
    /// export LENS_PRIVATE_KEY=0x...
    /// export LENS_SESSION_FILE=~/.lens-session.json
    /// ```
    ///
    /// ```rust,no_run
    /// # use lens_kit::*;
    /// # async fn example() -> Result<(), lens_kit::Error> {
    /// let lens = Lens::from_env()?;
    /// lens.authenticate().await?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `LENS_PRIVATE_KEY` is not a valid key
    /// - `LENS_SESSION_FILE` is set but the `file-store` feature is disabled
    pub fn from_env() -> Result<Lens, Error> {
        let network = std::env::var("LENS_NETWORK").ok();
        let private_key = std::env::var("LENS_PRIVATE_KEY").ok();
        let session_file = std::env::var("LENS_SESSION_FILE").ok();

        let mut builder = match network.as_deref() {
            Some("mainnet") | None => Lens::mainnet(),
            Some("testnet") => Lens::testnet(),
            Some(url) => Lens::custom(url),
        };

        if let Some(key) = private_key {
            builder = builder.private_key(&key)?;
        }

        if let Some(path) = session_file {
            builder = with_session_file(builder, path)?;
        }

        Ok(builder.build())
    }

    /// Get the default (unauthenticated) client handle.
    pub fn basic_client(&self) -> &Arc<GraphQlClient> {
        &self.default_client
    }

    /// Get the API URL.
    pub fn api_url(&self) -> &str {
        self.default_client.url()
    }

    /// Get the network this client is connected to.
    pub fn network(&self) -> Network {
        self.network
    }

    /// Get the signing wallet's address, if a signer is configured.
    pub fn address(&self) -> Option<Address> {
        self.signer.as_ref().map(|s| s.address())
    }

    /// Get the session store.
    pub fn session_store(&self) -> &dyn SessionStore {
        self.store.as_ref()
    }

    fn signer(&self) -> Result<&dyn TypedDataSigner, Error> {
        self.signer.as_deref().ok_or(Error::NoSigner)
    }

    // ========================================================================
    // Client Handles
    // ========================================================================

    /// Get the handle to use for the next read.
    ///
    /// Without a stored session this is the shared default handle. With one,
    /// a token refresh is attempted and a new authenticated handle returned.
    /// A failed refresh is logged and falls back to the shared default handle.
    /// Nothing is written to the session store here beyond what the
    /// refresher itself persists.
    pub async fn create_client(&self) -> Arc<GraphQlClient> {
        if read_session_marker(self.store.as_ref()).is_none() {
            tracing::debug!(url = %self.api_url(), "No stored session, using basic client");
            return self.default_client.clone();
        }

        match self.refresher.refresh_auth_token().await {
            Ok(token) => {
                tracing::debug!(url = %self.api_url(), "Created authenticated client");
                Arc::new(self.default_client.authenticated(token))
            }
            Err(e) => {
                tracing::debug!(error = %e, "Token refresh failed, using basic client");
                self.default_client.clone()
            }
        }
    }

    /// A new handle carrying a freshly refreshed token.
    ///
    /// Unlike [`create_client`](Self::create_client), refresh failures are
    /// returned.
    pub async fn authenticated_client(&self) -> Result<Arc<GraphQlClient>, Error> {
        let token = self.refresher.refresh_auth_token().await?;
        Ok(Arc::new(self.default_client.authenticated(token)))
    }

    // ========================================================================
    // Read Operations
    // ========================================================================

    /// Fetch a profile and its latest publications.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use lens_kit::*;
    /// # async fn example() -> Result<(), lens_kit::Error> {
    /// let lens = Lens::mainnet().build();
    /// let found = lens.fetch_profile("0x01").await?;
    /// println!("{} ({})", found.profile.handle, found.profile.color.unwrap());
    /// # Ok(())
    /// # }
    /// ```
    pub fn fetch_profile(&self, id: impl Into<String>) -> ProfileQuery {
        ProfileQuery::new(self.clone(), id.into())
    }

    /// Run an arbitrary query on the handle from [`create_client`](Self::create_client).
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use lens_kit::*;
    /// # async fn example() -> Result<(), lens_kit::Error> {
    /// let lens = Lens::mainnet().build();
    /// let data: serde_json::Value = lens
    ///     .query(documents::GET_PROFILES, serde_json::json!({ "id": "0x01" }))
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn query<V: Serialize, R: DeserializeOwned>(
        &self,
        document: &str,
        variables: V,
    ) -> Result<R, Error> {
        let client = self.create_client().await;
        Ok(client.execute(document, variables).await?)
    }

    /// Run an arbitrary mutation on a freshly authenticated handle.
    ///
    /// The mutation is sent once; transport failures are not retried.
    pub async fn mutate<V: Serialize, R: DeserializeOwned>(
        &self,
        document: &str,
        variables: V,
    ) -> Result<R, Error> {
        let client = self.authenticated_client().await?;
        Ok(client.execute_once(document, variables).await?)
    }

    async fn read_field<R: DeserializeOwned>(
        &self,
        document: &str,
        variables: Value,
        field: &str,
    ) -> Result<R, Error> {
        let client = self.create_client().await;
        Ok(execute_field(&client, document, variables, field).await?)
    }

    /// Profiles recommended by the API.
    pub async fn recommend_profiles(&self) -> Result<Vec<Profile>, Error> {
        self.read_field(documents::RECOMMEND_PROFILES, json!({}), "recommendedProfiles")
            .await
    }

    /// Search profiles by handle or name.
    pub async fn search_profiles(&self, query: &str) -> Result<Paginated<Profile>, Error> {
        self.read_field(documents::SEARCH_PROFILES, json!({ "query": query }), "search")
            .await
    }

    /// Search publication content.
    pub async fn search_publications(&self, query: &str) -> Result<Paginated<Publication>, Error> {
        self.read_field(documents::SEARCH_PUBLICATIONS, json!({ "query": query }), "search")
            .await
    }

    /// The global feed ordered by `sort`.
    pub async fn explore_publications(
        &self,
        sort: PublicationSortCriteria,
    ) -> Result<Paginated<Publication>, Error> {
        self.read_field(
            documents::EXPLORE_PUBLICATIONS,
            json!({ "sortCriteria": sort }),
            "explorePublications",
        )
        .await
    }

    /// The default profile of `address`, if it has one.
    pub async fn default_profile(&self, address: Address) -> Result<Option<Profile>, Error> {
        self.read_field(
            documents::GET_DEFAULT_PROFILE,
            json!({ "address": address }),
            "defaultProfile",
        )
        .await
    }

    /// Whether `follower` follows `profile_id`.
    pub async fn does_follow(
        &self,
        follower: Address,
        profile_id: impl Into<String>,
    ) -> Result<bool, Error> {
        let request = DoesFollowRequest {
            follower_address: follower,
            profile_id: profile_id.into(),
        };
        let statuses: Vec<FollowStatus> = self
            .read_field(
                documents::DOES_FOLLOW,
                json!({ "followInfos": [request] }),
                "doesFollow",
            )
            .await?;
        Ok(statuses.first().is_some_and(|s| s.follows))
    }

    /// The home timeline of `profile_id`.
    pub async fn timeline(
        &self,
        profile_id: impl Into<String>,
    ) -> Result<Paginated<Publication>, Error> {
        self.read_field(
            documents::TIMELINE,
            json!({ "profileId": profile_id.into() }),
            "timeline",
        )
        .await
    }

    // ========================================================================
    // Authentication
    // ========================================================================

    /// Sign in with the configured wallet and store the session.
    ///
    /// Subsequent reads through [`create_client`](Self::create_client) are
    /// authenticated.
    pub async fn authenticate(&self) -> Result<AuthTokens, Error> {
        let signer = self.signer()?;
        auth::authenticate(&self.default_client, signer, self.store.as_ref()).await
    }

    /// Forget the stored session.
    pub fn logout(&self) -> Result<(), Error> {
        clear_session(self.store.as_ref())?;
        Ok(())
    }

    // ========================================================================
    // Typed-Data Writes
    // ========================================================================

    /// Request typed data for `operation` on a freshly authenticated handle.
    pub async fn typed_data_mutation<Req: Serialize>(
        &self,
        operation: TypedDataOperation,
        request: &Req,
    ) -> Result<TypedDataResult, Error> {
        let client = self.authenticated_client().await?;
        request_typed_data(&client, operation, request).await
    }

    /// Request typed data for `operation` and sign it with the configured wallet.
    pub async fn sign_typed_data_mutation<Req: Serialize>(
        &self,
        operation: TypedDataOperation,
        request: &Req,
    ) -> Result<SignedTypedData<TypedDataResult>, Error> {
        let signer = self.signer()?;
        let result = self.typed_data_mutation(operation, request).await?;
        sign_result(signer, result).await
    }

    /// Request the typed data for a new post.
    ///
    /// Always refreshes the token first; refresh and mutation errors are
    /// returned as-is.
    pub async fn create_post_typed_data(
        &self,
        request: CreatePublicPostRequest,
    ) -> Result<CreatePostTypedDataResult, Error> {
        self.typed_data_mutation(TypedDataOperation::CREATE_POST, &request)
            .await
    }

    /// Request the typed data for a new post and sign it.
    ///
    /// The returned signature is exactly what the wallet produced. Nothing is
    /// broadcast; pass the result to [`broadcast`](Self::broadcast) or submit
    /// it on-chain yourself.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use lens_kit::*;
    /// # async fn example() -> Result<(), lens_kit::Error> {
    /// let lens = Lens::from_env()?;
    /// let request = CreatePublicPostRequest::new("0x01", "ipfs://Qm...")
    ///     .collect_module(CollectModuleParams::free(false));
    /// let SignedTypedData { result, signature } =
    ///     lens.sign_create_post_typed_data(request).await?;
    /// println!("{} signed as {}", result.id, signature);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn sign_create_post_typed_data(
        &self,
        request: CreatePublicPostRequest,
    ) -> Result<SignedTypedData<CreatePostTypedDataResult>, Error> {
        self.sign_typed_data_mutation(TypedDataOperation::CREATE_POST, &request)
            .await
    }

    /// Request the typed data for following profiles.
    pub async fn create_follow_typed_data(
        &self,
        request: FollowRequest,
    ) -> Result<TypedDataResult, Error> {
        self.typed_data_mutation(TypedDataOperation::FOLLOW, &request)
            .await
    }

    /// Request the typed data for following profiles and sign it.
    pub async fn sign_create_follow_typed_data(
        &self,
        request: FollowRequest,
    ) -> Result<SignedTypedData<TypedDataResult>, Error> {
        self.sign_typed_data_mutation(TypedDataOperation::FOLLOW, &request)
            .await
    }

    /// Request the typed data for unfollowing a profile.
    pub async fn create_unfollow_typed_data(
        &self,
        request: UnfollowRequest,
    ) -> Result<TypedDataResult, Error> {
        self.typed_data_mutation(TypedDataOperation::UNFOLLOW, &request)
            .await
    }

    /// Request the typed data for unfollowing a profile and sign it.
    pub async fn sign_create_unfollow_typed_data(
        &self,
        request: UnfollowRequest,
    ) -> Result<SignedTypedData<TypedDataResult>, Error> {
        self.sign_typed_data_mutation(TypedDataOperation::UNFOLLOW, &request)
            .await
    }

    /// Request the typed data for pointing a profile at a new metadata URI.
    pub async fn create_set_profile_metadata_typed_data(
        &self,
        request: SetProfileMetadataRequest,
    ) -> Result<TypedDataResult, Error> {
        self.typed_data_mutation(TypedDataOperation::SET_PROFILE_METADATA, &request)
            .await
    }

    /// Request the typed data for a profile metadata update and sign it.
    pub async fn sign_create_set_profile_metadata_typed_data(
        &self,
        request: SetProfileMetadataRequest,
    ) -> Result<SignedTypedData<TypedDataResult>, Error> {
        self.sign_typed_data_mutation(TypedDataOperation::SET_PROFILE_METADATA, &request)
            .await
    }

    /// Relay a signed typed-data write through the API's relayer.
    ///
    /// Sent once. A transport error leaves the relay outcome unknown, so it is
    /// returned rather than retried.
    pub async fn broadcast(
        &self,
        id: impl Into<String>,
        signature: EvmSignature,
    ) -> Result<RelayResult, Error> {
        let client = self.authenticated_client().await?;
        let request = crate::types::BroadcastRequest {
            id: id.into(),
            signature,
        };
        let result: RelayResult = mutate_field(
            &client,
            documents::BROADCAST,
            json!({ "request": request }),
            "broadcast",
        )
        .await?;
        match &result {
            RelayResult::Relayed { tx_hash, .. } => {
                tracing::debug!(tx_hash = %tx_hash, "Broadcast relayed");
            }
            RelayResult::Failed { reason } => {
                tracing::warn!(reason = %reason, "Broadcast rejected by relayer");
            }
        }
        Ok(result)
    }
}

impl std::fmt::Debug for Lens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lens")
            .field("client", &self.default_client)
            .field("network", &self.network)
            .field("address", &self.address())
            .finish()
    }
}

#[cfg(feature = "file-store")]
fn with_session_file(builder: LensBuilder, path: String) -> Result<LensBuilder, Error> {
    Ok(builder.session_store(super::storage::FileSessionStore::new(path)))
}

#[cfg(not(feature = "file-store"))]
fn with_session_file(_builder: LensBuilder, _path: String) -> Result<LensBuilder, Error> {
    Err(Error::Config(
        "LENS_SESSION_FILE requires the file-store feature".into(),
    ))
}

/// Builder for creating a [`Lens`] client.
///
/// # Example
///
/// ```rust,ignore
/// use lens_kit::*;
///
/// // Read-only client with an in-memory session
/// let lens = Lens::mainnet().build();
///
/// // Persisted session and a wallet
/// let lens = Lens::mainnet()
///     .session_store(FileSessionStore::default_location()?)
///     .private_key("0x...")?
///     .build();
/// ```
pub struct LensBuilder {
    api_url: String,
    network: Network,
    store: Option<Arc<dyn SessionStore>>,
    refresher: Option<Arc<dyn TokenRefresher>>,
    signer: Option<Arc<dyn TypedDataSigner>>,
    retry_config: RetryConfig,
}

impl LensBuilder {
    /// Create a new builder with the given API URL.
    fn new(api_url: impl Into<String>, network: Network) -> Self {
        Self {
            api_url: api_url.into(),
            network,
            store: None,
            refresher: None,
            signer: None,
            retry_config: RetryConfig::default(),
        }
    }

    /// Set where the session is persisted. Defaults to memory.
    pub fn session_store(mut self, store: impl SessionStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Replace the default API-backed token refresher.
    pub fn token_refresher(mut self, refresher: impl TokenRefresher + 'static) -> Self {
        self.refresher = Some(Arc::new(refresher));
        self
    }

    /// Set the wallet for login and signed writes.
    pub fn signer(mut self, signer: impl TypedDataSigner + 'static) -> Self {
        self.signer = Some(Arc::new(signer));
        self
    }

    /// Set up signing from a hex private key.
    ///
    /// This is a convenience method that creates a `LocalWallet` for you.
    pub fn private_key(mut self, private_key: impl AsRef<str>) -> Result<Self, Error> {
        let wallet = LocalWallet::new(private_key)?;
        self.signer = Some(Arc::new(wallet));
        Ok(self)
    }

    /// Set the retry configuration.
    pub fn retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    /// Build the client.
    pub fn build(self) -> Lens {
        let default_client = if self.api_url == API_URL && self.retry_config == RetryConfig::default()
        {
            basic_client()
        } else {
            Arc::new(GraphQlClient::with_retry_config(
                self.api_url,
                self.retry_config,
            ))
        };

        let store: Arc<dyn SessionStore> = self
            .store
            .unwrap_or_else(|| Arc::new(InMemorySessionStore::new()));

        let refresher: Arc<dyn TokenRefresher> = match self.refresher {
            Some(refresher) => refresher,
            None => Arc::new(ApiTokenRefresher::new(
                (*default_client).clone(),
                store.clone(),
            )),
        };

        Lens {
            default_client,
            store,
            refresher,
            signer: self.signer,
            network: self.network,
        }
    }
}

impl From<LensBuilder> for Lens {
    fn from(builder: LensBuilder) -> Self {
        builder.build()
    }
}
