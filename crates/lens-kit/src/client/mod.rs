//! Client module for the Lens API.
//!
//! This module provides the core client infrastructure:
//!
//! - [`Lens`] - The main client, the single entry point for all operations
//! - [`LensBuilder`] - Fluent builder for configuring the client
//! - [`GraphQlClient`] - Low-level GraphQL client with retry logic
//!
//! # Sessions
//!
//! A stored session makes reads authenticated. The session lives in a
//! [`SessionStore`] and is turned into access tokens by a [`TokenRefresher`]:
//!
//! | Store | Use Case |
//! |-------|----------|
//! | [`InMemorySessionStore`] | Tests, short-lived processes |
//! | [`FileSessionStore`] | CLIs and bots that keep a session across runs |
//!
//! # Signers
//!
//! Wallets sign login challenges and typed-data writes:
//!
//! | Signer | Use Case |
//! |--------|----------|
//! | [`LocalWallet`] | Scripts with a private key in memory |
//! | [`EnvWallet`] | CI/CD via the `LENS_PRIVATE_KEY` env var |
//!
//! # Query Builders
//!
//! - [`ProfileQuery`] - A profile with its latest publications

mod auth;
mod graphql;
mod lens;
mod query;
mod signer;
mod storage;
mod typed_data;

pub use auth::{ApiTokenRefresher, RefreshFuture, TokenRefresher};
pub use graphql::{ACCESS_TOKEN_HEADER, GraphQlClient, RetryConfig};
pub use lens::{Lens, LensBuilder, basic_client};
pub use query::{OptionalProfileQuery, ProfileQuery};
pub use signer::{
    EnvWallet, LocalWallet, SignFuture, TypedDataSigner, hash_message, recover_address,
    recover_message_signer, recover_typed_data_signer,
};
#[cfg(feature = "file-store")]
pub use storage::FileSessionStore;
pub use storage::{
    InMemorySessionStore, SessionStore, clear_session, load_session, read_session_marker,
    save_session,
};
pub use typed_data::TypedDataOperation;
