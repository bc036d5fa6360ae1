//! Core types for the Lens API.
//!
//! This module provides hand-rolled types for API responses, EVM addresses
//! and signatures, and EIP-712 typed data.

mod address;
mod color;
mod network;
mod profile;
mod request;
mod session;
mod signature;
pub mod typed_data;

pub use address::Address;
pub use color::{Color, generate_random_color};
pub use network::{
    API_URL, LENS_HUB_CONTRACT_ADDRESS, Network, PERIPHERY_CONTRACT_ADDRESS, TESTNET_API_URL,
};
pub use profile::{
    FollowStatus, PageInfo, Paginated, Profile, ProfileStats, ProfileWithPublications,
    Publication, PublicationMetadata, PublicationSortCriteria,
};
pub use request::{
    BroadcastRequest, CollectModuleParams, CreatePostTypedDataResult, CreatePublicPostRequest,
    DoesFollowRequest, Follow, FollowRequest, FreeCollectModuleParams, ReferenceModuleParams,
    RelayResult, SetProfileMetadataRequest, SignedTypedData, TypedDataResult, UnfollowRequest,
};
pub use session::{AccessToken, AuthTokens, SessionRecord};
pub use signature::{EvmSignature, SplitSignature};
pub use typed_data::{TypedData, TypedDataDomain, TypedDataField, Types, keccak256};
