//! Destination photos from Unsplash, with a fixed fallback and a TTL cache.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{error_message, ProviderError};
use crate::cache::{prune, TimedEntry};

pub const UNSPLASH_SEARCH_URL: &str = "https://api.unsplash.com/search/photos";
pub const FALLBACK_IMAGE_URL: &str =
    "https://images.unsplash.com/photo-1506905925346-21bda4d32df4?w=800";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationImage {
    pub url: String,
    pub alt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl DestinationImage {
    pub fn fallback(location: &str) -> Self {
        Self {
            url: FALLBACK_IMAGE_URL.to_string(),
            alt: format!("{location} landscape (fallback)"),
            credit: None,
            source: None,
        }
    }
}

/// Photo search. `Ok(None)` when the service has nothing for the query.
#[async_trait]
pub trait ImageLookup: Send + Sync {
    async fn search(&self, location: &str) -> Result<Option<DestinationImage>, ProviderError>;
}

pub struct UnsplashClient {
    client: Client,
    access_key: String,
    timeout: Duration,
}

impl UnsplashClient {
    pub fn new(client: Client, access_key: impl Into<String>) -> Self {
        Self {
            client,
            access_key: access_key.into(),
            timeout: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    #[serde(default)]
    urls: PhotoUrls,
    alt_description: Option<String>,
    user: Option<PhotoUser>,
    links: Option<PhotoLinks>,
}

#[derive(Debug, Default, Deserialize)]
struct PhotoUrls {
    regular: Option<String>,
    small: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PhotoUser {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PhotoLinks {
    html: Option<String>,
}

fn to_image(photo: Photo, location: &str) -> Option<DestinationImage> {
    let url = photo.urls.regular.or(photo.urls.small)?;
    Some(DestinationImage {
        url,
        alt: photo
            .alt_description
            .filter(|alt| !alt.trim().is_empty())
            .unwrap_or_else(|| format!("{location} view")),
        credit: photo.user.and_then(|user| user.name),
        source: photo.links.and_then(|links| links.html),
    })
}

#[async_trait]
impl ImageLookup for UnsplashClient {
    async fn search(&self, location: &str) -> Result<Option<DestinationImage>, ProviderError> {
        if self.access_key.trim().is_empty() {
            return Err(ProviderError::NotConfigured("UNSPLASH_ACCESS_KEY"));
        }

        let response = self
            .client
            .get(UNSPLASH_SEARCH_URL)
            .query(&[("query", location), ("orientation", "landscape"), ("per_page", "1")])
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Client-ID {}", self.access_key),
            )
            .timeout(self.timeout)
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        let payload: SearchResponse = response.json().await.map_err(ProviderError::from_reqwest)?;
        Ok(payload
            .results
            .into_iter()
            .next()
            .and_then(|photo| to_image(photo, location)))
    }
}

struct CachedImage {
    stored_at: Instant,
    image: DestinationImage,
}

impl TimedEntry for CachedImage {
    fn stored_at(&self) -> Instant {
        self.stored_at
    }
}

/// Image lookup that never fails: misses and errors yield the fallback.
/// Only real search hits are cached.
pub struct ImageService {
    lookup: Arc<dyn ImageLookup>,
    cache: DashMap<String, CachedImage>,
    ttl: Duration,
    max_entries: usize,
}

impl ImageService {
    pub fn new(lookup: Arc<dyn ImageLookup>, ttl: Duration, max_entries: usize) -> Self {
        Self {
            lookup,
            cache: DashMap::new(),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    fn cache_key(location: &str) -> String {
        location.trim().to_lowercase()
    }

    pub async fn image_for(&self, location: &str) -> DestinationImage {
        let key = Self::cache_key(location);
        if let Some(entry) = self.cache.get(&key) {
            if entry.is_fresh(self.ttl) {
                return entry.image.clone();
            }
        }

        match self.lookup.search(location).await {
            Ok(Some(image)) => {
                self.cache.insert(
                    key,
                    CachedImage {
                        stored_at: Instant::now(),
                        image: image.clone(),
                    },
                );
                let evicted = prune(&self.cache, self.max_entries, self.ttl);
                if evicted > 0 {
                    tracing::debug!(evicted, "image cache pruned");
                }
                image
            }
            Ok(None) => {
                tracing::info!(%location, "no destination photo found, using fallback");
                DestinationImage::fallback(location)
            }
            Err(ProviderError::NotConfigured(var)) => {
                tracing::warn!("{} not set, using fallback image", var);
                DestinationImage::fallback(location)
            }
            Err(err) => {
                tracing::warn!(%location, error = %err, "image search failed, using fallback");
                DestinationImage::fallback(location)
            }
        }
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}
