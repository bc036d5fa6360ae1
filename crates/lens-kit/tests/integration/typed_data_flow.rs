//! Signed writes: refresh, request typed data, sign once, relay.

use lens_kit::*;
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::*;

const KEY: &str = "0xc85ef7d79691fe79573b1a7064c19c1a9819ebdbd1faaab1a8ec92344438aaf4";

fn post_request() -> CreatePublicPostRequest {
    CreatePublicPostRequest::new(
        "0x03",
        "ipfs://QmR5V6fwKWzoa9gevmYaQ11eMQsAahsjfWPz1rCoNJjN1K",
    )
    .collect_module(CollectModuleParams::free(false))
}

async fn mount_post_typed_data(server: &MockServer) {
    Mock::given(method("POST"))
        .and(body_string_contains("mutation CreatePostTypedData"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "createPostTypedData": post_typed_data() }
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_sign_create_post_signs_exactly_once() {
    init_tracing();
    let server = MockServer::start().await;
    mount_post_typed_data(&server).await;

    let signer = RecordingSigner::new();
    let lens = Lens::custom(server.uri())
        .token_refresher(StubRefresher::ok("fresh-token"))
        .signer(signer.clone())
        .build();

    let signed = lens.sign_create_post_typed_data(post_request()).await.unwrap();

    let expected: TypedDataResult = serde_json::from_value(post_typed_data()).unwrap();
    assert_eq!(signed.result, expected);
    assert_eq!(signed.signature, signer.signature);

    let calls = signer.calls();
    assert_eq!(calls.len(), 1);
    let (domain, types, value) = &calls[0];
    assert_eq!(domain, &expected.typed_data.domain);
    assert_eq!(types, &expected.typed_data.types);
    assert_eq!(value, &expected.typed_data.value);
    assert!(!types.contains_key("__typename"));
    assert_eq!(domain.chain_id, Some(137));
}

#[tokio::test]
async fn test_create_post_sends_request_on_authenticated_handle() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header(ACCESS_TOKEN_HEADER, "Bearer fresh-token"))
        .and(body_partial_json(json!({
            "variables": { "request": {
                "profileId": "0x03",
                "contentURI": "ipfs://QmR5V6fwKWzoa9gevmYaQ11eMQsAahsjfWPz1rCoNJjN1K",
                "collectModule": { "freeCollectModule": { "followerOnly": false } }
            } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "createPostTypedData": post_typed_data() }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let lens = Lens::custom(server.uri())
        .token_refresher(StubRefresher::ok("fresh-token"))
        .build();

    let result = lens.create_post_typed_data(post_request()).await.unwrap();
    assert_eq!(result.id, "b4d2f1c4-7a0e-4d3a-9b0a-3e5c1f2a9d10");
    assert_eq!(result.typed_data.primary_type().unwrap(), "PostWithSig");
}

#[tokio::test]
async fn test_every_write_refreshes_first() {
    let server = MockServer::start().await;
    mount_post_typed_data(&server).await;

    let refresher = StubRefresher::ok("fresh-token");
    let lens = Lens::custom(server.uri())
        .token_refresher(refresher.clone())
        .build();

    lens.create_post_typed_data(post_request()).await.unwrap();
    lens.create_post_typed_data(post_request()).await.unwrap();

    assert_eq!(refresher.calls(), 2);
}

#[tokio::test]
async fn test_refresh_failure_aborts_write() {
    let server = MockServer::start().await;
    mount_post_typed_data(&server).await;

    let signer = RecordingSigner::new();
    let lens = Lens::custom(server.uri())
        .session_store(store_with_session())
        .token_refresher(StubRefresher::failing())
        .signer(signer.clone())
        .build();

    let err = lens.sign_create_post_typed_data(post_request()).await.unwrap_err();

    assert!(err.is_auth());
    assert!(matches!(err, Error::Auth(AuthError::RefreshRejected(_))));
    assert!(signer.calls().is_empty());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_mutation_error_propagates_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [ {
                "message": "You do not own this profile",
                "extensions": { "code": "FORBIDDEN" }
            } ]
        })))
        .mount(&server)
        .await;

    let signer = RecordingSigner::new();
    let lens = Lens::custom(server.uri())
        .token_refresher(StubRefresher::ok("fresh-token"))
        .signer(signer.clone())
        .retry_config(RetryConfig::none())
        .build();

    let err = lens.sign_create_post_typed_data(post_request()).await.unwrap_err();

    match err {
        Error::Api(ApiError::GraphQl { message, code }) => {
            assert_eq!(message, "You do not own this profile");
            assert_eq!(code.as_deref(), Some("FORBIDDEN"));
        }
        other => panic!("expected GraphQL error, got {:?}", other),
    }
    assert!(signer.calls().is_empty());
}

#[tokio::test]
async fn test_signer_failure_propagates() {
    struct RefusingSigner;

    impl TypedDataSigner for RefusingSigner {
        fn address(&self) -> Address {
            Address::ZERO
        }

        fn sign_typed_data<'a>(
            &'a self,
            _domain: &'a TypedDataDomain,
            _types: &'a Types,
            _value: &'a serde_json::Value,
        ) -> SignFuture<'a> {
            Box::pin(async { Err(SignerError::SigningFailed("user rejected".into())) })
        }

        fn sign_message<'a>(&'a self, _message: &'a [u8]) -> SignFuture<'a> {
            Box::pin(async { Err(SignerError::SigningFailed("user rejected".into())) })
        }
    }

    let server = MockServer::start().await;
    mount_post_typed_data(&server).await;

    let lens = Lens::custom(server.uri())
        .token_refresher(StubRefresher::ok("fresh-token"))
        .signer(RefusingSigner)
        .build();

    let err = lens.sign_create_post_typed_data(post_request()).await.unwrap_err();
    assert!(matches!(err, Error::Signing(SignerError::SigningFailed(_))));
}

#[tokio::test]
async fn test_local_wallet_signature_recovers_to_wallet() {
    let server = MockServer::start().await;
    mount_post_typed_data(&server).await;

    let wallet = LocalWallet::new(KEY).unwrap();
    let address = wallet.address();
    let lens = Lens::custom(server.uri())
        .token_refresher(StubRefresher::ok("fresh-token"))
        .signer(wallet)
        .build();

    let SignedTypedData { result, signature } =
        lens.sign_create_post_typed_data(post_request()).await.unwrap();

    let typed_data = &result.typed_data;
    let recovered = recover_typed_data_signer(
        &typed_data.domain,
        &typed_data.types,
        &typed_data.value,
        &signature,
    )
    .unwrap();
    assert_eq!(recovered, address);
    assert!(signature.v() == 27 || signature.v() == 28);
}

#[tokio::test]
async fn test_sign_and_broadcast() {
    init_tracing();
    let server = MockServer::start().await;
    mount_post_typed_data(&server).await;

    let signer = RecordingSigner::new();
    Mock::given(method("POST"))
        .and(body_string_contains("mutation Broadcast"))
        .and(body_partial_json(json!({
            "variables": { "request": {
                "id": "b4d2f1c4-7a0e-4d3a-9b0a-3e5c1f2a9d10",
                "signature": signer.signature.to_string()
            } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "broadcast": {
                "__typename": "RelayerResult",
                "txHash": "0x2a2b5c6e1f0e9d8c7b6a59483726150a1b2c3d4e5f60718293a4b5c6d7e8f901",
                "txId": "a1b2c3"
            } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let lens = Lens::custom(server.uri())
        .token_refresher(StubRefresher::ok("fresh-token"))
        .signer(signer.clone())
        .build();

    let signed = lens.sign_create_post_typed_data(post_request()).await.unwrap();
    let request = signed.broadcast_request();
    let relayed = lens.broadcast(request.id, request.signature).await.unwrap();

    assert!(relayed.is_relayed());
    assert_eq!(
        relayed.tx_hash(),
        Some("0x2a2b5c6e1f0e9d8c7b6a59483726150a1b2c3d4e5f60718293a4b5c6d7e8f901")
    );
}

#[tokio::test]
async fn test_broadcast_relay_error() {
    let server = MockServer::start().await;
    mount_data(
        &server,
        "mutation Broadcast",
        json!({ "broadcast": { "__typename": "RelayError", "reason": "EXPIRED" } }),
    )
    .await;

    let lens = Lens::custom(server.uri())
        .token_refresher(StubRefresher::ok("fresh-token"))
        .build();

    let result = lens
        .broadcast("expired-id", RecordingSigner::new().signature)
        .await
        .unwrap();
    assert_eq!(
        result,
        RelayResult::Failed {
            reason: "EXPIRED".to_string()
        }
    );
    assert_eq!(result.tx_hash(), None);
}

#[tokio::test]
async fn test_follow_uses_follow_document() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("mutation CreateFollowTypedData"))
        .and(body_partial_json(json!({
            "variables": { "request": { "follow": [ { "profile": "0x01" } ] } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "createFollowTypedData": {
                "id": "follow-1",
                "expiresAt": "2022-07-07T12:23:18.000Z",
                "typedData": {
                    "domain": {
                        "name": "Lens Protocol Profiles",
                        "chainId": 80001,
                        "version": "1",
                        "verifyingContract": "0x60Ae865ee4C725cd04353b5AAb364553f56ceF82"
                    },
                    "types": {
                        "FollowWithSig": [
                            { "name": "profileIds", "type": "uint256[]" },
                            { "name": "datas", "type": "bytes[]" },
                            { "name": "nonce", "type": "uint256" },
                            { "name": "deadline", "type": "uint256" }
                        ]
                    },
                    "value": { "nonce": 0, "deadline": 1657196598, "profileIds": ["0x01"], "datas": ["0x"] }
                }
            } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let signer = RecordingSigner::new();
    let lens = Lens::custom(server.uri())
        .token_refresher(StubRefresher::ok("fresh-token"))
        .signer(signer.clone())
        .build();

    let signed = lens
        .sign_create_follow_typed_data(FollowRequest::profile("0x01"))
        .await
        .unwrap();
    assert_eq!(signed.result.id, "follow-1");
    assert_eq!(signer.calls().len(), 1);
    assert_eq!(signer.calls()[0].0.chain_id, Some(80001));
}

#[tokio::test]
async fn test_unfollow_typed_data_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("mutation CreateUnfollowTypedData"))
        .and(body_partial_json(json!({ "variables": { "request": { "profile": "0x01" } } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "createUnfollowTypedData": {
                "id": "unfollow-1",
                "expiresAt": "2022-07-07T12:23:18.000Z",
                "typedData": {
                    "domain": {
                        "name": "Cool Follow NFT",
                        "chainId": 137,
                        "version": "1",
                        "verifyingContract": "0x23b9467334bEb345aAa6fd1545538F3d54436e96"
                    },
                    "types": {
                        "BurnWithSig": [
                            { "name": "tokenId", "type": "uint256" },
                            { "name": "nonce", "type": "uint256" },
                            { "name": "deadline", "type": "uint256" }
                        ]
                    },
                    "value": { "nonce": 0, "deadline": 1657196598, "tokenId": "0x2a" }
                }
            } }
        })))
        .expect(2)
        .mount(&server)
        .await;

    let signer = RecordingSigner::new();
    let lens = Lens::custom(server.uri())
        .token_refresher(StubRefresher::ok("fresh-token"))
        .signer(signer.clone())
        .build();
    let request = UnfollowRequest {
        profile: "0x01".to_string(),
    };

    let result = lens.create_unfollow_typed_data(request.clone()).await.unwrap();
    assert_eq!(result.id, "unfollow-1");
    assert_eq!(result.typed_data.primary_type().unwrap(), "BurnWithSig");

    let signed = lens.sign_create_unfollow_typed_data(request).await.unwrap();
    assert_eq!(signed.signature, signer.signature);
    assert_eq!(signer.calls().len(), 1);
    assert_eq!(signer.calls()[0].2["tokenId"], "0x2a");
}

#[tokio::test]
async fn test_set_profile_metadata_typed_data_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("mutation CreateSetProfileMetadataTypedData"))
        .and(body_partial_json(json!({
            "variables": { "request": {
                "profileId": "0x03",
                "metadata": "ipfs://QmProfileMetadata"
            } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "createSetProfileMetadataTypedData": {
                "id": "metadata-1",
                "expiresAt": "2022-07-07T12:23:18.000Z",
                "typedData": {
                    "domain": {
                        "name": "Lens Periphery",
                        "chainId": 137,
                        "version": "1",
                        "verifyingContract": "0xD5037d72877808cdE7F669563e9389930AF404E8"
                    },
                    "types": {
                        "SetProfileMetadataURIWithSig": [
                            { "name": "profileId", "type": "uint256" },
                            { "name": "metadata", "type": "string" },
                            { "name": "nonce", "type": "uint256" },
                            { "name": "deadline", "type": "uint256" }
                        ]
                    },
                    "value": {
                        "nonce": 0,
                        "deadline": 1657196598,
                        "profileId": "0x03",
                        "metadata": "ipfs://QmProfileMetadata"
                    }
                }
            } }
        })))
        .expect(2)
        .mount(&server)
        .await;

    let signer = RecordingSigner::new();
    let lens = Lens::custom(server.uri())
        .token_refresher(StubRefresher::ok("fresh-token"))
        .signer(signer.clone())
        .build();
    let request = SetProfileMetadataRequest {
        profile_id: "0x03".to_string(),
        metadata: "ipfs://QmProfileMetadata".to_string(),
    };

    let result = lens
        .create_set_profile_metadata_typed_data(request.clone())
        .await
        .unwrap();
    assert_eq!(result.id, "metadata-1");
    assert_eq!(
        result.typed_data.domain.verifying_contract,
        Some(PERIPHERY_CONTRACT_ADDRESS.parse().unwrap())
    );

    let signed = lens
        .sign_create_set_profile_metadata_typed_data(request)
        .await
        .unwrap();
    assert_eq!(signed.result.id, "metadata-1");
    assert_eq!(signer.calls().len(), 1);
}

#[tokio::test]
async fn test_broadcast_is_sent_once_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("mutation Broadcast"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_data(
        &server,
        "mutation Broadcast",
        json!({ "broadcast": { "__typename": "RelayError", "reason": "ALREADY_RELAYED" } }),
    )
    .await;

    // Default retry policy, which still applies to reads
    let lens = Lens::custom(server.uri())
        .token_refresher(StubRefresher::ok("fresh-token"))
        .build();

    let err = lens
        .broadcast("relay-1", RecordingSigner::new().signature)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Api(ApiError::Network {
            status_code: Some(502),
            ..
        })
    ));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_typed_data_mutation_is_sent_once_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let signer = RecordingSigner::new();
    let lens = Lens::custom(server.uri())
        .token_refresher(StubRefresher::ok("fresh-token"))
        .signer(signer.clone())
        .build();

    let err = lens.sign_create_post_typed_data(post_request()).await.unwrap_err();
    assert!(matches!(err, Error::Api(ApiError::Network { .. })));
    assert!(signer.calls().is_empty());
}

#[tokio::test]
async fn test_mutate_runs_on_authenticated_handle() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header(ACCESS_TOKEN_HEADER, "Bearer fresh-token"))
        .and(body_string_contains("mutation CreateUnfollowTypedData"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "createUnfollowTypedData": { "id": "raw-1" } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let lens = Lens::custom(server.uri())
        .token_refresher(StubRefresher::ok("fresh-token"))
        .build();

    let data: serde_json::Value = lens
        .mutate(
            documents::CREATE_UNFOLLOW_TYPED_DATA,
            json!({ "request": { "profile": "0x01" } }),
        )
        .await
        .unwrap();
    assert_eq!(data["createUnfollowTypedData"]["id"], "raw-1");
}

#[tokio::test]
async fn test_mutate_propagates_refresh_failure() {
    let server = MockServer::start().await;

    let refresher = StubRefresher::failing();
    let lens = Lens::custom(server.uri())
        .session_store(store_with_session())
        .token_refresher(refresher.clone())
        .build();

    let err = lens
        .mutate::<_, serde_json::Value>(
            documents::CREATE_UNFOLLOW_TYPED_DATA,
            json!({ "request": { "profile": "0x01" } }),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Auth(AuthError::RefreshRejected(_))));
    assert_eq!(refresher.calls(), 1);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_mutate_is_sent_once_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let lens = Lens::custom(server.uri())
        .token_refresher(StubRefresher::ok("fresh-token"))
        .build();

    let err = lens
        .mutate::<_, serde_json::Value>(documents::BROADCAST, json!({ "request": {} }))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Api(ApiError::Network {
            status_code: Some(500),
            ..
        })
    ));
}
