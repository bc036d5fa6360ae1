//! Profile and publication records returned by the API.
//!
//! These are hand-rolled around the fields clients actually read. Anything
//! else the server sends is kept in `extra` so callers can still get at it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Address, Color};

/// A protocol profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Profile id, a hex string such as `0x01`.
    pub id: String,

    pub handle: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub bio: Option<String>,

    #[serde(default)]
    pub owned_by: Option<Address>,

    #[serde(default)]
    pub picture: Option<Value>,

    #[serde(default)]
    pub stats: Option<ProfileStats>,

    #[serde(default)]
    pub is_default: Option<bool>,

    /// Avatar placeholder color, assigned client-side and never sent over the wire.
    #[serde(skip)]
    pub color: Option<Color>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Aggregate counters for a profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStats {
    #[serde(default)]
    pub total_followers: u64,
    #[serde(default)]
    pub total_following: u64,
    #[serde(default)]
    pub total_posts: u64,
    #[serde(default)]
    pub total_comments: u64,
    #[serde(default)]
    pub total_mirrors: u64,
    #[serde(default)]
    pub total_publications: u64,
    #[serde(default)]
    pub total_collects: u64,
}

/// A post, comment or mirror.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Publication {
    pub id: String,

    /// `Post`, `Comment` or `Mirror`.
    #[serde(rename = "__typename", default)]
    pub kind: Option<String>,

    #[serde(default)]
    pub metadata: Option<PublicationMetadata>,

    #[serde(default)]
    pub created_at: Option<String>,

    #[serde(default)]
    pub app_id: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Off-chain metadata attached to a publication.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicationMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub media: Vec<Value>,
}

/// Cursor information for a page of results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub prev: Option<String>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub total_count: Option<u64>,
}

/// A page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub page_info: Option<PageInfo>,
}

/// A profile together with its latest publications.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileWithPublications {
    pub profile: Profile,
    pub publications: Vec<Publication>,
}

/// One entry of a `doesFollow` answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowStatus {
    pub follower_address: Address,
    pub profile_id: String,
    pub follows: bool,
}

/// Ordering for `explorePublications`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PublicationSortCriteria {
    #[default]
    TopCommented,
    TopCollected,
    TopMirrored,
    Latest,
    CuratedProfiles,
}
