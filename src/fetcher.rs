use crate::api::{ImageApi, ListingQuery};
use crate::errors::FetchError;
use crate::models::ListingBody;
use crate::query::{LimitPolicy, QueryState};
use tracing::{debug, error};

/// Local images used when the gallery runs without the image service.
pub const STATIC_IMAGES: [&str; 10] = [
    "https://picsum.photos/id/1015/600/400",
    "https://picsum.photos/id/1016/600/400",
    "https://picsum.photos/id/1024/600/400",
    "https://picsum.photos/id/1025/600/400",
    "https://picsum.photos/id/1035/600/400",
    "https://picsum.photos/id/1041/600/400",
    "https://picsum.photos/id/1050/600/400",
    "https://picsum.photos/id/1069/600/400",
    "https://picsum.photos/id/1074/600/400",
    "https://picsum.photos/id/1084/600/400",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingSource {
    Api { require_username: bool },
    StaticAssets,
}

impl ListingSource {
    pub fn limit_policy(&self) -> LimitPolicy {
        match self {
            Self::Api { .. } => LimitPolicy::api(),
            Self::StaticAssets => LimitPolicy::static_assets(STATIC_IMAGES.len()),
        }
    }
}

/// Image URLs for one render pass, never longer than the active limit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageList(Vec<String>);

impl ImageList {
    pub fn truncated(mut urls: Vec<String>, limit: usize) -> Self {
        urls.truncate(limit);
        Self(urls)
    }

    pub fn urls(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Accepts a bare list or an object with an `images` list; anything else is
/// treated as an empty listing.
pub fn normalize_listing(body: &[u8]) -> Vec<String> {
    match serde_json::from_slice::<ListingBody>(body) {
        Ok(listing) => listing.into_urls(),
        Err(err) => {
            debug!("unrecognised image listing body: {err}");
            Vec::new()
        }
    }
}

pub async fn fetch_images<A: ImageApi>(
    api: &A,
    source: ListingSource,
    state: &QueryState,
) -> Result<ImageList, FetchError> {
    let urls: Vec<String> = match source {
        ListingSource::StaticAssets => STATIC_IMAGES.iter().map(|url| url.to_string()).collect(),
        ListingSource::Api { require_username } => {
            if require_username && state.username.is_none() {
                debug!("no username known, skipping image listing request");
                return Ok(ImageList::default());
            }

            let query = ListingQuery {
                username: state.username.clone(),
                category: state.category.clone(),
            };
            normalize_listing(&api.list_images(&query).await?)
        }
    };

    Ok(ImageList::truncated(urls, state.limit))
}

/// Page-load variant of [`fetch_images`]: failures are logged and rendered
/// as an empty list.
pub async fn load_images<A: ImageApi>(
    api: &A,
    source: ListingSource,
    state: &QueryState,
) -> ImageList {
    fetch_images(api, source, state).await.unwrap_or_else(|err| {
        error!("failed to load images: {err}");
        ImageList::default()
    })
}
