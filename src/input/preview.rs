// src/input/preview.rs
//! Local preview handles for selected files. Each `ObjectUrl` is registered
//! on creation and released exactly once: explicitly through `revoke`, or
//! when the handle is dropped.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Debug, Default)]
struct Registry {
    live: HashMap<String, PathBuf>,
    revoked: usize,
}

#[derive(Debug, Clone, Default)]
pub struct PreviewRegistry {
    inner: Arc<Mutex<Registry>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn create(&self, path: impl AsRef<Path>) -> ObjectUrl {
        let url = format!("blob:scene-speak/{}", Uuid::new_v4());
        self.registry()
            .live
            .insert(url.clone(), path.as_ref().to_path_buf());
        tracing::debug!(url = %url, "preview URL created");
        ObjectUrl {
            url,
            registry: self.clone(),
            released: false,
        }
    }

    /// The file behind a live URL, or `None` once it has been revoked.
    pub fn resolve(&self, url: &str) -> Option<PathBuf> {
        self.registry().live.get(url).cloned()
    }

    pub fn live_count(&self) -> usize {
        self.registry().live.len()
    }

    pub fn revoked_count(&self) -> usize {
        self.registry().revoked
    }

    fn release(&self, url: &str) {
        let mut registry = self.registry();
        if registry.live.remove(url).is_some() {
            registry.revoked += 1;
            tracing::debug!(url = %url, "preview URL revoked");
        }
    }
}

#[derive(Debug)]
pub struct ObjectUrl {
    url: String,
    registry: PreviewRegistry,
    released: bool,
}

impl ObjectUrl {
    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub fn revoke(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.registry.release(&self.url);
        }
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_resolve_until_revoked() {
        let registry = PreviewRegistry::new();
        let url = registry.create("clip.mov");
        assert!(url.as_str().starts_with("blob:"));
        assert_eq!(registry.resolve(url.as_str()), Some(PathBuf::from("clip.mov")));

        let key = url.as_str().to_string();
        url.revoke();
        assert_eq!(registry.resolve(&key), None);
        assert_eq!(registry.live_count(), 0);
        assert_eq!(registry.revoked_count(), 1);
    }

    #[test]
    fn drop_revokes_exactly_once() {
        let registry = PreviewRegistry::new();
        {
            let _a = registry.create("a.mp4");
            let _b = registry.create("b.mp4");
            assert_eq!(registry.live_count(), 2);
        }
        assert_eq!(registry.live_count(), 0);
        assert_eq!(registry.revoked_count(), 2);
    }

    #[test]
    fn explicit_revoke_is_not_repeated_on_drop() {
        let registry = PreviewRegistry::new();
        registry.create("a.mp4").revoke();
        assert_eq!(registry.revoked_count(), 1);
    }
}
