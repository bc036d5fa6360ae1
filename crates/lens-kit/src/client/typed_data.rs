//! Two-step signed writes: request typed data, then sign it.

use serde::Serialize;
use serde_json::json;

use super::graphql::GraphQlClient;
use super::signer::TypedDataSigner;
use crate::documents;
use crate::error::Error;
use crate::types::{SignedTypedData, TypedDataResult};

/// A `create*TypedData` mutation and the response field holding its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypedDataOperation {
    pub document: &'static str,
    pub field: &'static str,
}

impl TypedDataOperation {
    pub const CREATE_POST: Self = Self {
        document: documents::CREATE_POST_TYPED_DATA,
        field: "createPostTypedData",
    };

    pub const FOLLOW: Self = Self {
        document: documents::FOLLOW_USER,
        field: "createFollowTypedData",
    };

    pub const UNFOLLOW: Self = Self {
        document: documents::CREATE_UNFOLLOW_TYPED_DATA,
        field: "createUnfollowTypedData",
    };

    pub const SET_PROFILE_METADATA: Self = Self {
        document: documents::CREATE_PROFILE_METADATA_TYPED_DATA,
        field: "createSetProfileMetadataTypedData",
    };
}

/// Run `operation` with `{ request }` on an authenticated handle.
pub(crate) async fn request_typed_data<Req: Serialize>(
    client: &GraphQlClient,
    operation: TypedDataOperation,
    request: &Req,
) -> Result<TypedDataResult, Error> {
    let result = super::lens::mutate_field(
        client,
        operation.document,
        json!({ "request": request }),
        operation.field,
    )
    .await?;
    tracing::debug!(operation = operation.field, "Received typed data");
    Ok(result)
}

/// Hand the payload to the wallet. The signer is invoked exactly once.
pub(crate) async fn sign_result(
    signer: &dyn TypedDataSigner,
    result: TypedDataResult,
) -> Result<SignedTypedData<TypedDataResult>, Error> {
    let typed_data = &result.typed_data;
    let signature = signer
        .sign_typed_data(&typed_data.domain, &typed_data.types, &typed_data.value)
        .await?;
    Ok(SignedTypedData { result, signature })
}
