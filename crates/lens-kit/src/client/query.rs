//! Query builders for fluent read operations.
//!
//! All query builders implement `IntoFuture` so they can be `.await`ed directly.

use std::future::{Future, IntoFuture};
use std::pin::Pin;

use futures::future::try_join;
use serde::Deserialize;
use serde_json::json;

use super::graphql::GraphQlClient;
use super::lens::Lens;
use crate::PUBLICATIONS_PAGE_SIZE;
use crate::documents;
use crate::error::Error;
use crate::types::{Paginated, Profile, ProfileWithPublications, Publication, generate_random_color};

#[derive(Deserialize)]
struct ProfilesData {
    profiles: Paginated<Profile>,
}

#[derive(Deserialize)]
struct PublicationsData {
    publications: Paginated<Publication>,
}

/// Load a profile and its latest posts on one handle.
///
/// Both reads run concurrently and both must succeed.
pub(crate) async fn load_profile(
    client: &GraphQlClient,
    id: &str,
) -> Result<ProfileWithPublications, Error> {
    let profiles = client.execute::<_, ProfilesData>(documents::GET_PROFILES, json!({ "id": id }));
    let publications = client.execute::<_, PublicationsData>(
        documents::GET_PUBLICATIONS,
        json!({ "id": id, "limit": PUBLICATIONS_PAGE_SIZE }),
    );

    let (profiles, publications) = try_join(profiles, publications).await?;

    let mut profile = profiles
        .profiles
        .items
        .into_iter()
        .next()
        .ok_or_else(|| Error::ProfileNotFound(id.to_string()))?;
    profile.color = Some(generate_random_color());

    Ok(ProfileWithPublications {
        profile,
        publications: publications.publications.items,
    })
}

// ============================================================================
// ProfileQuery
// ============================================================================

/// Query builder for a profile and its latest publications.
///
/// Runs on the handle produced by [`Lens::create_client`], so it reads
/// authenticated when a stored session can be refreshed and anonymously
/// otherwise.
///
/// # Example
///
/// ```rust,no_run
/// # use lens_kit::*;
/// # async fn example() -> Result<(), Error> {
/// let lens = Lens::mainnet().build();
///
/// let found = lens.fetch_profile("0x01").await?;
/// println!("{} has {} posts", found.profile.handle, found.publications.len());
///
/// // Treat a missing profile as empty
/// if lens.fetch_profile("0xdead").optional().await?.is_none() {
///     println!("no such profile");
/// }
/// # Ok(())
/// # }
/// ```
pub struct ProfileQuery {
    lens: Lens,
    id: String,
}

impl ProfileQuery {
    pub(crate) fn new(lens: Lens, id: String) -> Self {
        Self { lens, id }
    }

    /// Resolve a missing profile to `None` instead of an error.
    pub fn optional(self) -> OptionalProfileQuery {
        OptionalProfileQuery { inner: self }
    }
}

impl IntoFuture for ProfileQuery {
    type Output = Result<ProfileWithPublications, Error>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move {
            let client = self.lens.create_client().await;
            let result = load_profile(&client, &self.id).await;
            match &result {
                Err(e @ Error::ProfileNotFound(_)) => {
                    tracing::debug!(profile_id = %self.id, error = %e, "Profile not found");
                }
                Err(e) => {
                    tracing::error!(profile_id = %self.id, error = %e, "Error fetching profile");
                }
                Ok(_) => {}
            }
            result
        })
    }
}

/// [`ProfileQuery`] that maps a missing profile to `Ok(None)`.
pub struct OptionalProfileQuery {
    inner: ProfileQuery,
}

impl IntoFuture for OptionalProfileQuery {
    type Output = Result<Option<ProfileWithPublications>, Error>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move {
            match self.inner.await {
                Ok(found) => Ok(Some(found)),
                Err(Error::ProfileNotFound(_)) => Ok(None),
                Err(e) => Err(e),
            }
        })
    }
}
