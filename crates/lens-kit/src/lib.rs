//! An ergonomic Rust client for the Lens social-graph API.
//!
//! **lens-kit** wraps the Lens GraphQL API with session handling, typed
//! profile reads and EIP-712 signed writes.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use lens_kit::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), lens_kit::Error> {
//!     let lens = Lens::mainnet().build();
//!
//!     let found = lens.fetch_profile("0x01").await?;
//!     println!("{} has {} posts", found.profile.handle, found.publications.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Design Principles
//!
//! 1. **Single entry point**: Everything hangs off the [`Lens`] client
//! 2. **Configure once**: Endpoint, session store and wallet set at client creation
//! 3. **Reads degrade, writes don't**: A stale session falls back to anonymous
//!    reads, while signed writes report every failure
//! 4. **Pluggable edges**: Storage, token refresh and signing are traits
//!
//! # Signed Writes
//!
//! Writes follow a two-step protocol: the API returns EIP-712 typed data for
//! the action, and the wallet signs it.
//!
//! ```rust,no_run
//! use lens_kit::*;
//!
//! # async fn example() -> Result<(), lens_kit::Error> {
//! let lens = Lens::mainnet()
//!     .private_key("0x...")?
//!     .build();
//! lens.authenticate().await?;
//!
//! let request = CreatePublicPostRequest::new("0x01", "ipfs://Qm...");
//! let signed = lens.sign_create_post_typed_data(request).await?;
//! let relayed = lens.broadcast(&signed.result.id, signed.signature).await?;
//! println!("{:?}", relayed.tx_hash());
//! # Ok(())
//! # }
//! ```
//!
//! # Core Types
//!
//! - [`Address`] - 20-byte EVM address
//! - [`EvmSignature`] - 65-byte recoverable signature
//! - [`TypedData`] - EIP-712 domain, types and value
//! - [`Profile`], [`Publication`] - API records

pub mod client;
pub mod documents;
pub mod error;
pub mod types;

/// Key under which the session record is stored.
pub const STORAGE_KEY: &str = "LH_STORAGE_KEY";

/// Number of publications fetched alongside a profile.
pub const PUBLICATIONS_PAGE_SIZE: u32 = 50;

// Re-export commonly used types at crate root
pub use error::{
    ApiError, AuthError, Error, ParseAddressError, ParseSignatureError, SignerError,
    StorageError, TypedDataError,
};
pub use types::*;

// Re-export client types
#[cfg(feature = "file-store")]
pub use client::FileSessionStore;
pub use client::{
    ACCESS_TOKEN_HEADER, ApiTokenRefresher, EnvWallet, GraphQlClient, InMemorySessionStore, Lens,
    LensBuilder, LocalWallet, OptionalProfileQuery, ProfileQuery, RefreshFuture, RetryConfig,
    SessionStore, SignFuture, TokenRefresher, TypedDataOperation, TypedDataSigner, basic_client,
    clear_session, hash_message, load_session, read_session_marker, recover_address,
    recover_message_signer, recover_typed_data_signer, save_session,
};
