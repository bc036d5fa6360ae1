//! Request and response shapes for signed writes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Address, EvmSignature, TypedData};

// ============================================================================
// Collect / reference modules
// ============================================================================

/// Collect module configuration for a new publication.
///
/// Serialized as the GraphQL input object, e.g.
/// `{"freeCollectModule": {"followerOnly": false}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectModuleParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_collect_module: Option<FreeCollectModuleParams>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revert_collect_module: Option<bool>,

    /// Any other collect module, passed through as-is.
    #[serde(flatten)]
    pub other: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeCollectModuleParams {
    pub follower_only: bool,
}

impl CollectModuleParams {
    /// Free collect, optionally restricted to followers.
    pub fn free(follower_only: bool) -> Self {
        Self {
            free_collect_module: Some(FreeCollectModuleParams { follower_only }),
            revert_collect_module: None,
            other: Default::default(),
        }
    }

    /// Disable collecting.
    pub fn revert() -> Self {
        Self {
            free_collect_module: None,
            revert_collect_module: Some(true),
            other: Default::default(),
        }
    }
}

impl Default for CollectModuleParams {
    fn default() -> Self {
        Self::revert()
    }
}

/// Reference module configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceModuleParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follower_only_reference_module: Option<bool>,

    #[serde(flatten)]
    pub other: serde_json::Map<String, Value>,
}

impl ReferenceModuleParams {
    pub fn follower_only() -> Self {
        Self {
            follower_only_reference_module: Some(true),
            other: Default::default(),
        }
    }
}

// ============================================================================
// Requests
// ============================================================================

/// Input for `createPostTypedData`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePublicPostRequest {
    pub profile_id: String,
    /// URI of the publication metadata, usually IPFS or Arweave.
    #[serde(rename = "contentURI")]
    pub content_uri: String,
    pub collect_module: CollectModuleParams,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_module: Option<ReferenceModuleParams>,
}

impl CreatePublicPostRequest {
    pub fn new(profile_id: impl Into<String>, content_uri: impl Into<String>) -> Self {
        Self {
            profile_id: profile_id.into(),
            content_uri: content_uri.into(),
            collect_module: CollectModuleParams::default(),
            reference_module: None,
        }
    }

    pub fn collect_module(mut self, module: CollectModuleParams) -> Self {
        self.collect_module = module;
        self
    }

    pub fn reference_module(mut self, module: ReferenceModuleParams) -> Self {
        self.reference_module = Some(module);
        self
    }
}

/// One profile to follow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Follow {
    pub profile: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_module: Option<Value>,
}

/// Input for `createFollowTypedData`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowRequest {
    pub follow: Vec<Follow>,
}

impl FollowRequest {
    /// Follow a single profile that has no follow module.
    pub fn profile(profile_id: impl Into<String>) -> Self {
        Self {
            follow: vec![Follow {
                profile: profile_id.into(),
                follow_module: None,
            }],
        }
    }
}

/// Input for `createUnfollowTypedData`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnfollowRequest {
    pub profile: String,
}

/// Input for `createSetProfileMetadataTypedData`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetProfileMetadataRequest {
    pub profile_id: String,
    pub metadata: String,
}

/// Input for `broadcast`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastRequest {
    pub id: String,
    pub signature: EvmSignature,
}

/// Filter entry for `doesFollow`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoesFollowRequest {
    pub follower_address: Address,
    pub profile_id: String,
}

// ============================================================================
// Responses
// ============================================================================

/// The result of any `create*TypedData` mutation.
///
/// `id` is the handle the relayer broadcast expects alongside the signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedDataResult {
    pub id: String,
    #[serde(default)]
    pub expires_at: Option<String>,
    pub typed_data: TypedData,
}

/// The result of `createPostTypedData`.
pub type CreatePostTypedDataResult = TypedDataResult;

/// A typed-data mutation result together with the wallet's signature over it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedTypedData<R = TypedDataResult> {
    pub result: R,
    pub signature: EvmSignature,
}

impl SignedTypedData<TypedDataResult> {
    /// The request for relaying this signed write.
    pub fn broadcast_request(&self) -> BroadcastRequest {
        BroadcastRequest {
            id: self.result.id.clone(),
            signature: self.signature,
        }
    }
}

/// The outcome of a relayed broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "__typename")]
pub enum RelayResult {
    #[serde(rename = "RelayerResult", rename_all = "camelCase")]
    Relayed { tx_hash: String, tx_id: String },
    #[serde(rename = "RelayError")]
    Failed { reason: String },
}

impl RelayResult {
    pub fn is_relayed(&self) -> bool {
        matches!(self, RelayResult::Relayed { .. })
    }

    pub fn tx_hash(&self) -> Option<&str> {
        match self {
            RelayResult::Relayed { tx_hash, .. } => Some(tx_hash),
            RelayResult::Failed { .. } => None,
        }
    }
}
