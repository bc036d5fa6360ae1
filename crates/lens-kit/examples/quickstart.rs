//! Quickstart - Essential Lens operations
//!
//! Covers: profile reads, wallet login, signed posts, relayed broadcast
//!
//! Run: cargo run --example quickstart
//!
//! Set environment variables for write operations:
//!   LENS_NETWORK=testnet
//!   LENS_PRIVATE_KEY=0x...
//!   LENS_PROFILE_ID=0x...
//!   LENS_CONTENT_URI=ipfs://...

use lens_kit::*;

// ============================================================================
// 1. Read social data (no credentials needed)
// ============================================================================

async fn read_example() -> Result<(), Error> {
    println!("=== Read Example ===\n");

    let lens = Lens::mainnet().build();

    // Profile plus its latest posts
    let found = lens.fetch_profile("0x01").await?;
    println!(
        "{} has {} recent posts (avatar color {})",
        found.profile.handle,
        found.publications.len(),
        found.profile.color.map(|c| c.to_string()).unwrap_or_default()
    );

    // A missing profile doesn't have to be an error
    match lens.fetch_profile("0xffffff").optional().await? {
        Some(found) => println!("Found {}", found.profile.handle),
        None => println!("0xffffff does not exist"),
    }

    // Global feed
    let feed = lens
        .explore_publications(PublicationSortCriteria::Latest)
        .await?;
    for publication in feed.items.iter().take(3) {
        let content = publication
            .metadata
            .as_ref()
            .and_then(|m| m.content.as_deref())
            .unwrap_or("");
        println!("  {}: {}", publication.id, content);
    }

    Ok(())
}

// ============================================================================
// 2. Log in with a wallet
// ============================================================================

async fn login_example(lens: &Lens) -> Result<(), Error> {
    println!("\n=== Login Example ===\n");

    lens.authenticate().await?;
    println!("Logged in as {:?}", lens.address());

    if let Some(address) = lens.address() {
        match lens.default_profile(address).await? {
            Some(profile) => println!("Default profile: {}", profile.handle),
            None => println!("No default profile set"),
        }
    }

    Ok(())
}

// ============================================================================
// 3. Sign and relay a post
// ============================================================================

async fn post_example(lens: &Lens, profile_id: &str, content_uri: &str) -> Result<(), Error> {
    println!("\n=== Post Example ===\n");

    let request = CreatePublicPostRequest::new(profile_id, content_uri)
        .collect_module(CollectModuleParams::free(false));

    let signed = lens.sign_create_post_typed_data(request).await?;
    println!("Typed data {} signed: {}", signed.result.id, signed.signature);

    let request = signed.broadcast_request();
    match lens.broadcast(request.id, request.signature).await? {
        RelayResult::Relayed { tx_hash, .. } => println!("Relayed: {tx_hash}"),
        RelayResult::Failed { reason } => println!("Relayer refused: {reason}"),
    }

    Ok(())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("lens-kit Quickstart Examples\n");

    // Reads work without credentials
    read_example().await?;

    let lens = Lens::from_env()?;
    if lens.address().is_none() {
        println!("\nSet LENS_PRIVATE_KEY to run the write examples.");
        return Ok(());
    }

    login_example(&lens).await?;

    let profile_id = std::env::var("LENS_PROFILE_ID").ok();
    let content_uri = std::env::var("LENS_CONTENT_URI").ok();
    match (profile_id, content_uri) {
        (Some(profile_id), Some(content_uri)) => {
            post_example(&lens, &profile_id, &content_uri).await?;
        }
        _ => println!("\nSet LENS_PROFILE_ID and LENS_CONTENT_URI to publish a post."),
    }

    Ok(())
}
