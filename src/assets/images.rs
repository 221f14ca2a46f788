use std::sync::{Arc, OnceLock};

use crate::assets::decode::{PreparedImage, decode_image};
use crate::foundation::error::{SlidecastError, SlidecastResult};
use crate::resources::{ResourceHandle, ResourceId, ResourceKind, ResourceRegistry};

/// Maximum number of retained slide images.
pub const MAX_IMAGES: usize = 20;

/// Encoded image bytes plus a lazily decoded raster, shared between the store and a session.
#[derive(Debug)]
pub struct ImageSource {
    id: ResourceId,
    name: String,
    bytes: Arc<[u8]>,
    decoded: OnceLock<Result<Arc<PreparedImage>, String>>,
}

impl ImageSource {
    /// Identifier of the owning resource handle.
    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Upload name (file name or caller label).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Encoded byte length.
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    /// Decode on first use; later calls return the cached outcome.
    pub fn decode(&self) -> SlidecastResult<Arc<PreparedImage>> {
        self.decoded
            .get_or_init(|| {
                decode_image(&self.bytes)
                    .map(Arc::new)
                    .map_err(|e| e.to_string())
            })
            .clone()
            .map_err(SlidecastError::decode)
    }

    /// Decoded pixel dimensions, available once [`ImageSource::decode`] succeeded.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match self.decoded.get() {
            Some(Ok(img)) => Some((img.width, img.height)),
            _ => None,
        }
    }
}

/// One uploaded slide image: the resource handle plus its shared source.
#[derive(Debug)]
pub struct ImageAsset {
    handle: ResourceHandle,
    source: Arc<ImageSource>,
}

impl ImageAsset {
    /// Resource identifier.
    pub fn id(&self) -> ResourceId {
        self.handle.id()
    }

    /// Shared source for rendering.
    pub fn source(&self) -> &Arc<ImageSource> {
        &self.source
    }
}

/// Upload-ordered image list, capped at [`MAX_IMAGES`].
#[derive(Debug, Default)]
pub struct ImageStore {
    images: Vec<ImageAsset>,
}

impl ImageStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an uploaded image.
    ///
    /// Returns `None` without registering anything once the store holds [`MAX_IMAGES`] images.
    pub fn push(
        &mut self,
        registry: &ResourceRegistry,
        name: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Option<ResourceId> {
        let name = name.into();
        if self.images.len() >= MAX_IMAGES {
            tracing::warn!(%name, cap = MAX_IMAGES, "image limit reached, upload ignored");
            return None;
        }

        let handle = registry.acquire(ResourceKind::Image);
        let id = handle.id();
        self.images.push(ImageAsset {
            handle,
            source: Arc::new(ImageSource {
                id,
                name,
                bytes: bytes.into(),
                decoded: OnceLock::new(),
            }),
        });
        Some(id)
    }

    /// Number of retained images.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Return `true` when no images are retained.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Resource ids in upload order.
    pub fn ids(&self) -> Vec<ResourceId> {
        self.images.iter().map(ImageAsset::id).collect()
    }

    /// Shared sources in upload order, for handing to a render session.
    pub fn sources(&self) -> Vec<Arc<ImageSource>> {
        self.images.iter().map(|a| a.source.clone()).collect()
    }

    /// Borrow the retained assets.
    pub fn assets(&self) -> &[ImageAsset] {
        &self.images
    }

    /// Drop every image, releasing each handle.
    pub fn clear(&mut self) {
        self.images.clear();
    }
}

/// Decode every source, degrading failed decodes to `None`.
///
/// The returned vector is parallel to `sources`.
pub fn decode_all(sources: &[Arc<ImageSource>]) -> Vec<Option<Arc<PreparedImage>>> {
    sources
        .iter()
        .map(|src| match src.decode() {
            Ok(img) => Some(img),
            Err(e) => {
                tracing::warn!(name = src.name(), error = %e, "image decode failed, slide renders without it");
                None
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/assets/images.rs"]
mod tests;
