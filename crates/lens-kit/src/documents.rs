//! GraphQL documents for the Lens API.
//!
//! Each constant is a complete operation that can be run with
//! [`Lens::query`](crate::Lens::query), [`Lens::mutate`](crate::Lens::mutate)
//! or [`GraphQlClient::execute`](crate::GraphQlClient::execute). The variable
//! names each document expects are listed on the constant.

// ============================================================================
// Queries
// ============================================================================

/// Recommended profiles. No variables.
pub const RECOMMEND_PROFILES: &str = r#"
query RecommendedProfiles {
  recommendedProfiles {
    id
    name
    bio
    handle
    ownedBy
    isDefault
    picture {
      ... on MediaSet {
        original { url mimeType }
      }
    }
    stats {
      totalFollowers
      totalFollowing
      totalPosts
      totalComments
      totalMirrors
      totalPublications
      totalCollects
    }
  }
}
"#;

/// Profiles by id. Variables: `id`.
pub const GET_PROFILES: &str = r#"
query Profiles($id: ProfileId!) {
  profiles(request: { profileIds: [$id], limit: 25 }) {
    items {
      id
      name
      bio
      handle
      ownedBy
      isDefault
      attributes { displayType traitType key value }
      picture {
        ... on NftImage { contractAddress tokenId uri verified }
        ... on MediaSet { original { url mimeType } }
      }
      coverPicture {
        ... on MediaSet { original { url mimeType } }
      }
      stats {
        totalFollowers
        totalFollowing
        totalPosts
        totalComments
        totalMirrors
        totalPublications
        totalCollects
      }
      followModule {
        ... on FeeFollowModuleSettings {
          type
          amount { asset { symbol name decimals address } value }
          recipient
        }
      }
    }
    pageInfo { prev next totalCount }
  }
}
"#;

/// The default profile of a wallet. Variables: `address`.
pub const GET_DEFAULT_PROFILE: &str = r#"
query DefaultProfile($address: EthereumAddress!) {
  defaultProfile(request: { ethereumAddress: $address }) {
    id
    name
    bio
    handle
    ownedBy
    isDefault
    picture {
      ... on MediaSet { original { url mimeType } }
    }
    stats {
      totalFollowers
      totalFollowing
      totalPosts
      totalComments
      totalMirrors
      totalPublications
      totalCollects
    }
  }
}
"#;

/// Posts by a profile. Variables: `id`, `limit`.
pub const GET_PUBLICATIONS: &str = r#"
query Publications($id: ProfileId!, $limit: LimitScalar) {
  publications(request: { profileId: $id, publicationTypes: [POST], limit: $limit }) {
    items {
      __typename
      ... on Post {
        id
        createdAt
        appId
        metadata { name description content media { original { url mimeType } } }
        stats { totalAmountOfMirrors totalAmountOfCollects totalAmountOfComments }
      }
    }
    pageInfo { prev next totalCount }
  }
}
"#;

/// Profile search. Variables: `query`.
pub const SEARCH_PROFILES: &str = r#"
query SearchProfiles($query: Search!) {
  search(request: { query: $query, type: PROFILE, limit: 10 }) {
    ... on ProfileSearchResult {
      __typename
      items {
        ... on Profile {
          id
          name
          bio
          handle
          ownedBy
          picture {
            ... on MediaSet { original { url mimeType } }
          }
          stats {
            totalFollowers
            totalFollowing
            totalPosts
          }
        }
      }
      pageInfo { prev next totalCount }
    }
  }
}
"#;

/// Publication search. Variables: `query`.
pub const SEARCH_PUBLICATIONS: &str = r#"
query SearchPublications($query: Search!) {
  search(request: { query: $query, type: PUBLICATION, limit: 10 }) {
    ... on PublicationSearchResult {
      __typename
      items {
        __typename
        ... on Comment { id createdAt metadata { content } }
        ... on Post { id createdAt metadata { content } }
      }
      pageInfo { prev next totalCount }
    }
  }
}
"#;

/// Global feed. Variables: `sortCriteria`.
pub const EXPLORE_PUBLICATIONS: &str = r#"
query ExplorePublications($sortCriteria: PublicationSortCriteria!) {
  explorePublications(request: {
    sortCriteria: $sortCriteria,
    publicationTypes: [POST, COMMENT, MIRROR],
    limit: 10
  }) {
    items {
      __typename
      ... on Post {
        id
        createdAt
        appId
        profile { id handle name }
        metadata { name description content media { original { url mimeType } } }
      }
      ... on Comment { id createdAt metadata { content } }
      ... on Mirror { id createdAt metadata { content } }
    }
    pageInfo { prev next totalCount }
  }
}
"#;

/// Follow relationships. Variables: `followInfos` (list of
/// `{followerAddress, profileId}`).
pub const DOES_FOLLOW: &str = r#"
query DoesFollow($followInfos: [DoesFollow!]!) {
  doesFollow(request: { followInfos: $followInfos }) {
    followerAddress
    profileId
    follows
  }
}
"#;

/// Login challenge text for a wallet. Variables: `address`.
pub const GET_CHALLENGE: &str = r#"
query Challenge($address: EthereumAddress!) {
  challenge(request: { address: $address }) {
    text
  }
}
"#;

/// Home timeline of a profile. Variables: `profileId`.
pub const TIMELINE: &str = r#"
query Timeline($profileId: ProfileId!) {
  timeline(request: { profileId: $profileId, limit: 10 }) {
    items {
      __typename
      ... on Post {
        id
        createdAt
        appId
        profile { id handle name }
        metadata { name description content media { original { url mimeType } } }
      }
      ... on Comment { id createdAt metadata { content } }
      ... on Mirror { id createdAt metadata { content } }
    }
    pageInfo { prev next totalCount }
  }
}
"#;

// ============================================================================
// Mutations
// ============================================================================

/// Typed data for following profiles. Variables: `request` (`FollowRequest`).
pub const FOLLOW_USER: &str = r#"
mutation CreateFollowTypedData($request: FollowRequest!) {
  createFollowTypedData(request: $request) {
    id
    expiresAt
    typedData {
      domain { name chainId version verifyingContract }
      types {
        FollowWithSig { name type }
      }
      value { nonce deadline profileIds datas }
    }
  }
}
"#;

/// Exchange a signed challenge for tokens. Variables: `address`, `signature`.
pub const AUTHENTICATE: &str = r#"
mutation Authenticate($address: EthereumAddress!, $signature: Signature!) {
  authenticate(request: { address: $address, signature: $signature }) {
    accessToken
    refreshToken
  }
}
"#;

/// Rotate tokens. Variables: `refreshToken`.
pub const REFRESH: &str = r#"
mutation Refresh($refreshToken: Jwt!) {
  refresh(request: { refreshToken: $refreshToken }) {
    accessToken
    refreshToken
  }
}
"#;

/// Typed data for unfollowing. Variables: `request` (`UnfollowRequest`).
pub const CREATE_UNFOLLOW_TYPED_DATA: &str = r#"
mutation CreateUnfollowTypedData($request: UnfollowRequest!) {
  createUnfollowTypedData(request: $request) {
    id
    expiresAt
    typedData {
      domain { name chainId version verifyingContract }
      types {
        BurnWithSig { name type }
      }
      value { nonce deadline tokenId }
    }
  }
}
"#;

/// Relay a signed typed-data write. Variables: `request` (`{id, signature}`).
pub const BROADCAST: &str = r#"
mutation Broadcast($request: BroadcastRequest!) {
  broadcast(request: $request) {
    __typename
    ... on RelayerResult { txHash txId }
    ... on RelayError { reason }
  }
}
"#;

/// Typed data for setting profile metadata. Variables: `request`
/// (`{profileId, metadata}`).
pub const CREATE_PROFILE_METADATA_TYPED_DATA: &str = r#"
mutation CreateSetProfileMetadataTypedData($request: CreatePublicSetProfileMetadataURIRequest!) {
  createSetProfileMetadataTypedData(request: $request) {
    id
    expiresAt
    typedData {
      domain { name chainId version verifyingContract }
      types {
        SetProfileMetadataURIWithSig { name type }
      }
      value { nonce deadline profileId metadata }
    }
  }
}
"#;

/// Typed data for a new post. Variables: `request` (`CreatePublicPostRequest`).
pub const CREATE_POST_TYPED_DATA: &str = r#"
mutation CreatePostTypedData($request: CreatePublicPostRequest!) {
  createPostTypedData(request: $request) {
    id
    expiresAt
    typedData {
      types {
        PostWithSig { name type }
      }
      domain { name chainId version verifyingContract }
      value {
        nonce
        deadline
        profileId
        contentURI
        collectModule
        collectModuleInitData
        referenceModule
        referenceModuleInitData
      }
    }
  }
}
"#;
