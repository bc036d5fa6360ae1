//! Profile plus publications reads.

use lens_kit::*;
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::*;

#[tokio::test]
async fn test_fetch_profile_with_publications() {
    init_tracing();
    let server = MockServer::start().await;
    mount_data(
        &server,
        "query Profiles",
        json!({ "profiles": { "items": [ profile_json("0x05", "stani.lens") ] } }),
    )
    .await;
    mount_data(&server, "query Publications", publications_json("0x05", 3)).await;

    let lens = Lens::custom(server.uri()).build();
    let found = lens.fetch_profile("0x05").await.unwrap();

    assert_eq!(found.profile.id, "0x05");
    assert_eq!(found.profile.handle, "stani.lens");
    assert_eq!(
        found.profile.owned_by.unwrap().to_checksum(),
        "0xCD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826"
    );
    assert!(found.profile.color.is_some());
    assert_eq!(found.publications.len(), 3);
    assert_eq!(found.publications[0].kind.as_deref(), Some("Post"));
}

#[tokio::test]
async fn test_fetch_profile_requests_page_of_fifty() {
    let server = MockServer::start().await;
    mount_data(
        &server,
        "query Profiles",
        json!({ "profiles": { "items": [ profile_json("0x05", "stani.lens") ] } }),
    )
    .await;
    Mock::given(method("POST"))
        .and(body_string_contains("query Publications"))
        .and(body_partial_json(json!({
            "variables": { "id": "0x05", "limit": PUBLICATIONS_PAGE_SIZE }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": publications_json("0x05", 50)
        })))
        .expect(1)
        .mount(&server)
        .await;

    let lens = Lens::custom(server.uri()).build();
    let found = lens.fetch_profile("0x05").await.unwrap();

    assert_eq!(PUBLICATIONS_PAGE_SIZE, 50);
    assert_eq!(found.publications.len(), 50);
}

#[tokio::test]
async fn test_fetch_profile_colors_vary_per_fetch() {
    let server = MockServer::start().await;
    mount_data(
        &server,
        "query Profiles",
        json!({ "profiles": { "items": [ profile_json("0x05", "stani.lens") ] } }),
    )
    .await;
    mount_data(&server, "query Publications", publications_json("0x05", 0)).await;

    let lens = Lens::custom(server.uri()).build();
    let mut colors = std::collections::HashSet::new();
    for _ in 0..8 {
        let found = lens.fetch_profile("0x05").await.unwrap();
        colors.insert(found.profile.color.unwrap().to_string());
    }

    // 8 draws from 2^24 colors colliding down to one is not a realistic outcome
    assert!(colors.len() > 1);
}

#[tokio::test]
async fn test_fetch_missing_profile_is_not_found() {
    let server = MockServer::start().await;
    mount_data(&server, "query Profiles", json!({ "profiles": { "items": [] } })).await;
    mount_data(&server, "query Publications", publications_json("0xdead", 0)).await;

    let lens = Lens::custom(server.uri()).build();

    let err = lens.fetch_profile("0xdead").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("0xdead"));

    let missing = lens.fetch_profile("0xdead").optional().await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_fetch_profile_transport_failure_is_not_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let lens = Lens::custom(server.uri())
        .retry_config(RetryConfig::none())
        .build();

    let err = lens.fetch_profile("0x05").await.unwrap_err();
    assert!(!err.is_not_found());
    assert!(matches!(err, Error::Api(ApiError::Network { status_code: Some(503), .. })));

    // optional() only swallows the not-found case
    let err = lens.fetch_profile("0x05").optional().await.unwrap_err();
    assert!(matches!(err, Error::Api(_)));
}

#[tokio::test]
async fn test_fetch_profile_uses_authenticated_handle_when_session_refreshes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("query Profiles"))
        .and(header(ACCESS_TOKEN_HEADER, "Bearer fresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "profiles": { "items": [ profile_json("0x05", "stani.lens") ] } }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("query Publications"))
        .and(header(ACCESS_TOKEN_HEADER, "Bearer fresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": publications_json("0x05", 1)
        })))
        .expect(1)
        .mount(&server)
        .await;

    let refresher = StubRefresher::ok("fresh-token");
    let lens = Lens::custom(server.uri())
        .session_store(store_with_session())
        .token_refresher(refresher.clone())
        .build();

    let found = lens.fetch_profile("0x05").await.unwrap();
    assert_eq!(found.publications.len(), 1);
    // One handle serves both reads
    assert_eq!(refresher.calls(), 1);
}

#[tokio::test]
async fn test_fetch_profile_degrades_to_anonymous_on_refresh_failure() {
    let server = MockServer::start().await;
    mount_data(
        &server,
        "query Profiles",
        json!({ "profiles": { "items": [ profile_json("0x05", "stani.lens") ] } }),
    )
    .await;
    mount_data(&server, "query Publications", publications_json("0x05", 2)).await;

    let lens = Lens::custom(server.uri())
        .session_store(store_with_session())
        .token_refresher(StubRefresher::failing())
        .build();

    let found = lens.fetch_profile("0x05").await.unwrap();
    assert_eq!(found.publications.len(), 2);

    let requests = server.received_requests().await.unwrap();
    assert!(
        requests
            .iter()
            .all(|r| !r.headers.contains_key(ACCESS_TOKEN_HEADER))
    );
}

#[tokio::test]
async fn test_search_and_explore_reads() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "variables": { "sortCriteria": "TOP_COMMENTED" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "explorePublications": publications_json("0x01", 2)["publications"] }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("query SearchProfiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "search": {
                "__typename": "ProfileSearchResult",
                "items": [ profile_json("0x01", "lensprotocol") ],
                "pageInfo": { "totalCount": 1 }
            } }
        })))
        .mount(&server)
        .await;

    let lens = Lens::custom(server.uri()).build();

    let feed = lens
        .explore_publications(PublicationSortCriteria::default())
        .await
        .unwrap();
    assert_eq!(feed.items.len(), 2);

    let found = lens.search_profiles("lens").await.unwrap();
    assert_eq!(found.items[0].handle, "lensprotocol");
}

#[tokio::test]
async fn test_does_follow() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "variables": { "followInfos": [ {
                "followerAddress": "0xcd2a3d9f938e13cd947ec05abc7fe734df8dd826",
                "profileId": "0x01"
            } ] }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "doesFollow": [ {
                "followerAddress": "0xCD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826",
                "profileId": "0x01",
                "follows": true
            } ] }
        })))
        .mount(&server)
        .await;

    let lens = Lens::custom(server.uri()).build();
    let follower: Address = "0xCD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826".parse().unwrap();
    assert!(lens.does_follow(follower, "0x01").await.unwrap());
}

#[tokio::test]
async fn test_timeline() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("query Timeline"))
        .and(body_partial_json(json!({ "variables": { "profileId": "0x05" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "timeline": publications_json("0x09", 4)["publications"] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let lens = Lens::custom(server.uri()).build();
    let timeline = lens.timeline("0x05").await.unwrap();

    assert_eq!(timeline.items.len(), 4);
    assert_eq!(timeline.page_info.unwrap().total_count, Some(4));
}

#[tokio::test]
async fn test_default_profile() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("query DefaultProfile"))
        .and(body_partial_json(json!({
            "variables": { "address": "0xcd2a3d9f938e13cd947ec05abc7fe734df8dd826" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "defaultProfile": profile_json("0x05", "stani.lens") }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let lens = Lens::custom(server.uri()).build();
    let owner: Address = "0xCD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826".parse().unwrap();

    let profile = lens.default_profile(owner).await.unwrap().unwrap();
    assert_eq!(profile.handle, "stani.lens");
    // Client-side color is only assigned by fetch_profile
    assert!(profile.color.is_none());
}

#[tokio::test]
async fn test_default_profile_null_is_none() {
    let server = MockServer::start().await;
    mount_data(&server, "query DefaultProfile", json!({ "defaultProfile": null })).await;

    let lens = Lens::custom(server.uri()).build();
    let found = lens.default_profile(Address::ZERO).await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn test_search_publications() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("query SearchPublications"))
        .and(body_partial_json(json!({ "variables": { "query": "gm" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "search": {
                "__typename": "PublicationSearchResult",
                "items": [
                    { "__typename": "Post", "id": "0x01-0x01", "metadata": { "content": "gm" } },
                    { "__typename": "Comment", "id": "0x02-0x07", "metadata": { "content": "gm gm" } }
                ],
                "pageInfo": { "totalCount": 2 }
            } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let lens = Lens::custom(server.uri()).build();
    let found = lens.search_publications("gm").await.unwrap();

    assert_eq!(found.items.len(), 2);
    assert_eq!(found.items[1].kind.as_deref(), Some("Comment"));
    assert_eq!(
        found.items[0].metadata.as_ref().unwrap().content.as_deref(),
        Some("gm")
    );
}
