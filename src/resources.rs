//! Ownership tracking for ephemeral binary resources (images, voice clips, encoded artifacts).
//!
//! Every resource is represented by exactly one [`ResourceHandle`]. The handle registers itself on
//! creation and revokes itself when released or dropped, so replacing or tearing down the owner is
//! the only release point.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use xxhash_rust::xxh3::xxh3_64_with_seed;

/// Opaque resource identifier. Carries no ordering semantics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ResourceId(pub u64);

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "res-{:016x}", self.0)
    }
}

/// What a resource holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// An uploaded slide image.
    Image,
    /// An uploaded or recorded voice clip.
    Voice,
    /// An encoded output artifact.
    Artifact,
}

#[derive(Debug, Default)]
struct RegistryState {
    live: HashMap<ResourceId, ResourceKind>,
    issued: u64,
    released: u64,
}

#[derive(Debug)]
struct RegistryInner {
    seed: u64,
    counter: AtomicU64,
    state: Mutex<RegistryState>,
}

impl RegistryInner {
    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Registry of live resource handles.
///
/// Cloning shares the same registry.
#[derive(Clone, Debug)]
pub struct ResourceRegistry {
    inner: Arc<RegistryInner>,
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceRegistry {
    /// Create an empty registry with a per-process seed for identifier generation.
    pub fn new() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Self::with_seed(nanos ^ u64::from(std::process::id()).rotate_left(32))
    }

    /// Create an empty registry with an explicit identifier seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                seed,
                counter: AtomicU64::new(0),
                state: Mutex::new(RegistryState::default()),
            }),
        }
    }

    /// Issue a new handle of the given kind.
    pub fn acquire(&self, kind: ResourceKind) -> ResourceHandle {
        let mut state = self.inner.lock();
        let id = loop {
            let n = self.inner.counter.fetch_add(1, Ordering::Relaxed);
            let id = ResourceId(xxh3_64_with_seed(&n.to_le_bytes(), self.inner.seed));
            if !state.live.contains_key(&id) {
                break id;
            }
        };
        state.live.insert(id, kind);
        state.issued += 1;
        drop(state);

        tracing::trace!(%id, ?kind, "resource acquired");
        ResourceHandle {
            id,
            kind,
            registry: Some(self.inner.clone()),
        }
    }

    /// Return `true` while the handle for `id` has not been released.
    pub fn is_live(&self, id: ResourceId) -> bool {
        self.inner.lock().live.contains_key(&id)
    }

    /// Number of currently live handles.
    pub fn live_count(&self) -> usize {
        self.inner.lock().live.len()
    }

    /// Number of live handles of `kind`.
    pub fn live_count_of(&self, kind: ResourceKind) -> usize {
        self.inner.lock().live.values().filter(|k| **k == kind).count()
    }

    /// Total handles issued and released over the registry lifetime.
    pub fn totals(&self) -> (u64, u64) {
        let state = self.inner.lock();
        (state.issued, state.released)
    }
}

/// Exclusive ownership token for one registered resource.
///
/// Released exactly once: either through [`ResourceHandle::release`] or on drop.
#[derive(Debug)]
pub struct ResourceHandle {
    id: ResourceId,
    kind: ResourceKind,
    registry: Option<Arc<RegistryInner>>,
}

impl ResourceHandle {
    /// Identifier of this resource.
    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Kind of this resource.
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Revoke the handle now.
    pub fn release(mut self) {
        self.revoke();
    }

    fn revoke(&mut self) {
        let Some(registry) = self.registry.take() else {
            return;
        };
        let mut state = registry.lock();
        if state.live.remove(&self.id).is_some() {
            state.released += 1;
        }
        drop(state);
        tracing::trace!(id = %self.id, kind = ?self.kind, "resource released");
    }
}

impl Drop for ResourceHandle {
    fn drop(&mut self) {
        self.revoke();
    }
}
