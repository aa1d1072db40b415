//! Image loading: data URLs, remote URLs and local files.
//!
//! Templates refer to images by string. Editor uploads are inline `data:`
//! URLs; hand-written templates may point at `http(s)://` URLs or file paths.
//! [`ImageLoader`] handles all three and caches decoded remote and file
//! images so a multi-page export downloads each background once. The cache
//! holds at most [`MAX_CACHED_IMAGES`] entries, oldest evicted first, and a
//! file is decoded again once its modification time changes.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::DynamicImage;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::RwLock;

use crate::error::CertifyError;
use crate::model::is_data_reference;

/// Something that turns an image reference into pixels.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn load(&self, reference: &str) -> Result<DynamicImage, CertifyError>;
}

/// Default capacity of an [`ImageLoader`] cache.
pub const MAX_CACHED_IMAGES: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    reference: String,
    /// Set for local files.
    modified: Option<SystemTime>,
}

/// Decoded images in insertion order, bounded by `capacity`.
struct ImageCache {
    capacity: usize,
    entries: HashMap<CacheKey, DynamicImage>,
    order: VecDeque<CacheKey>,
}

impl ImageCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn get(&self, key: &CacheKey) -> Option<&DynamicImage> {
        self.entries.get(key)
    }

    fn insert(&mut self, key: CacheKey, image: DynamicImage) {
        if self.capacity == 0 {
            return;
        }
        // An older version of the same file is stale.
        self.entries.retain(|k, _| k.reference != key.reference);
        self.order.retain(|k| k.reference != key.reference);

        while self.entries.len() >= self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, image);
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Default [`ImageSource`] with an HTTP client and a shared decode cache.
#[derive(Clone)]
pub struct ImageLoader {
    http_client: reqwest::Client,
    cache: Arc<RwLock<ImageCache>>,
}

impl ImageLoader {
    pub fn new() -> Result<Self, CertifyError> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("procertify/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CertifyError::Image(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(http_client))
    }

    pub fn with_client(http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            cache: Arc::new(RwLock::new(ImageCache::new(MAX_CACHED_IMAGES))),
        }
    }

    /// Same loader with room for `capacity` decoded images (0 disables caching).
    pub fn with_capacity(self, capacity: usize) -> Self {
        Self {
            cache: Arc::new(RwLock::new(ImageCache::new(capacity))),
            ..self
        }
    }

    /// Number of cached decoded images.
    pub async fn cached(&self) -> usize {
        self.cache.read().await.len()
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, CertifyError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| CertifyError::Image(format!("Failed to download {}: {}", url, e)))?;
        if !response.status().is_success() {
            return Err(CertifyError::Image(format!(
                "Failed to download {}: HTTP {}",
                url,
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| CertifyError::Image(format!("Failed to read image data: {}", e)))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ImageSource for ImageLoader {
    async fn load(&self, reference: &str) -> Result<DynamicImage, CertifyError> {
        // Inline data is already in memory; decoding it again is cheaper than
        // keying a cache by the whole URL.
        if is_data_reference(reference) {
            return decode_image(&decode_data_url(reference)?);
        }

        let remote = is_remote(reference);
        let modified = if remote {
            None
        } else {
            let metadata = tokio::fs::metadata(reference).await.map_err(|e| {
                CertifyError::Image(format!("Failed to read image {}: {}", reference, e))
            })?;
            metadata.modified().ok()
        };
        let key = CacheKey {
            reference: reference.to_string(),
            modified,
        };

        if let Some(image) = self.cache.read().await.get(&key) {
            return Ok(image.clone());
        }

        let bytes = if remote {
            self.download(reference).await?
        } else {
            tokio::fs::read(reference).await.map_err(|e| {
                CertifyError::Image(format!("Failed to read image {}: {}", reference, e))
            })?
        };
        let image = decode_image(&bytes)?;

        self.cache.write().await.insert(key, image.clone());
        log::debug!("Cached image {}", reference);
        Ok(image)
    }
}

fn is_remote(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

fn decode_image(bytes: &[u8]) -> Result<DynamicImage, CertifyError> {
    image::load_from_memory(bytes)
        .map_err(|e| CertifyError::Image(format!("Failed to decode image: {}", e)))
}

/// Payload bytes of a `data:[<mime>][;base64],<data>` URL.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, CertifyError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| CertifyError::Image("not a data URL".into()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| CertifyError::Image("data URL has no payload".into()))?;

    if header.ends_with(";base64") {
        let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        STANDARD
            .decode(compact)
            .map_err(|e| CertifyError::Image(format!("Invalid base64 in data URL: {}", e)))
    } else {
        Ok(percent_decode(payload))
    }
}

fn percent_decode(s: &str) -> Vec<u8> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && let Some(hex) = s.get(i + 1..i + 3)
            && hex.bytes().all(|b| b.is_ascii_hexdigit())
            && let Ok(byte) = u8::from_str_radix(hex, 16)
        {
            out.push(byte);
            i += 3;
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

/// Base64 `data:` URL for `bytes`.
pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Read a file into a `data:` URL, guessing the MIME type from its extension.
pub fn data_url_from_file(path: &Path) -> Result<String, CertifyError> {
    let bytes = std::fs::read(path)?;
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    Ok(data_url(mime.essence_str(), &bytes))
}
