use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::foundation::error::{SlidecastError, SlidecastResult};
use crate::foundation::fs::ensure_parent_dir;
use crate::resources::{ResourceHandle, ResourceId};
use crate::session::capture::RenderStats;

/// Download name used when the title has no usable characters.
pub const FALLBACK_DOWNLOAD_NAME: &str = "promo-video.mp4";

/// User-facing file name for a video titled `title`: `<slug>-promo.mp4`.
pub fn download_name(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        FALLBACK_DOWNLOAD_NAME.to_owned()
    } else {
        format!("{slug}-promo.mp4")
    }
}

/// Public description of a published artifact.
#[derive(Clone, Debug, PartialEq)]
pub struct ArtifactInfo {
    /// Resource handle identifier; revoked once the artifact is replaced or reset.
    pub id: ResourceId,
    /// Suggested download file name.
    pub download_name: String,
    /// Encoded file, when the capture stream wrote one.
    pub path: Option<PathBuf>,
    /// Encoded size in bytes (0 without a file).
    pub byte_len: u64,
    /// Counters of the render that produced it.
    pub stats: RenderStats,
}

/// The most recent encoded result, exclusively owned by the workspace.
///
/// Dropping it revokes its handle and deletes the encoded file.
#[derive(Debug)]
pub struct OutputArtifact {
    handle: ResourceHandle,
    file: Option<PathBuf>,
    download_name: String,
    byte_len: u64,
    stats: RenderStats,
}

impl OutputArtifact {
    pub(crate) fn new(
        handle: ResourceHandle,
        file: Option<PathBuf>,
        download_name: String,
        stats: RenderStats,
    ) -> SlidecastResult<Self> {
        let byte_len = match file.as_deref() {
            Some(p) => match std::fs::metadata(p) {
                Ok(m) => m.len(),
                Err(e) => {
                    let _ = std::fs::remove_file(p);
                    return Err(SlidecastError::encoding(format!(
                        "encoded artifact '{}' is unreadable: {e}",
                        p.display()
                    )));
                }
            },
            None => 0,
        };
        Ok(Self {
            handle,
            file,
            download_name,
            byte_len,
            stats,
        })
    }

    /// Handle identifier.
    pub fn id(&self) -> ResourceId {
        self.handle.id()
    }

    /// Encoded file path, if any.
    pub fn path(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Suggested download name.
    pub fn download_name(&self) -> &str {
        &self.download_name
    }

    /// Snapshot for callers outside the workspace.
    pub fn info(&self) -> ArtifactInfo {
        ArtifactInfo {
            id: self.id(),
            download_name: self.download_name.clone(),
            path: self.file.clone(),
            byte_len: self.byte_len,
            stats: self.stats,
        }
    }

    /// Copy the encoded bytes to `dest`.
    pub fn save_to(&self, dest: &Path) -> SlidecastResult<u64> {
        let src = self
            .file
            .as_deref()
            .ok_or_else(|| SlidecastError::validation("artifact has no encoded file"))?;
        ensure_parent_dir(dest)?;
        let n = std::fs::copy(src, dest).with_context(|| {
            format!("copy artifact '{}' to '{}'", src.display(), dest.display())
        })?;
        tracing::info!(dest = %dest.display(), bytes = n, "artifact saved");
        Ok(n)
    }
}

impl Drop for OutputArtifact {
    fn drop(&mut self) {
        if let Some(path) = self.file.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}
