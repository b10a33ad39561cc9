//! Per-engine cache of resolved providers

use std::sync::Arc;

use tokio::sync::RwLock;

struct Cached<T: ?Sized> {
    revision: u64,
    provider: Arc<T>,
}

/// Holds a provider once it has been resolved.
///
/// An entry is only served while the registry is still at the revision it
/// was resolved at. Absence is never stored, so the next lookup asks again.
pub struct ProviderCache<T: ?Sized> {
    slot: RwLock<Option<Cached<T>>>,
}

impl<T: ?Sized> ProviderCache<T> {
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    /// Return the provider cached at `revision`, or resolve and cache it.
    /// A stale entry is dropped even when the new resolution comes back empty.
    pub async fn get_or_resolve<F>(&self, revision: u64, resolve: F) -> Option<Arc<T>>
    where
        F: FnOnce() -> Option<Arc<T>>,
    {
        if let Some(cached) = self.slot.read().await.as_ref() {
            if cached.revision == revision {
                return Some(cached.provider.clone());
            }
        }

        let mut slot = self.slot.write().await;
        if let Some(cached) = slot.as_ref() {
            if cached.revision == revision {
                return Some(cached.provider.clone());
            }
        }

        match resolve() {
            Some(provider) => {
                *slot = Some(Cached {
                    revision,
                    provider: provider.clone(),
                });
                Some(provider)
            }
            None => {
                *slot = None;
                None
            }
        }
    }

    /// Forget the cached provider, e.g. after it failed
    pub async fn invalidate(&self) {
        self.slot.write().await.take();
    }

    pub async fn is_cached(&self) -> bool {
        self.slot.read().await.is_some()
    }
}

impl<T: ?Sized> Default for ProviderCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> std::fmt::Debug for ProviderCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderCache").finish_non_exhaustive()
    }
}
