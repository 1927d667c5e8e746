//! The favorites store: the set of products the user has hearted.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::cart::BackendError;

/// Server-side favorites persistence for a signed-in user.
#[async_trait]
pub trait FavoritesBackend: Send + Sync {
    /// Fetches the favorited product ids.
    async fn fetch(&self) -> Result<BTreeSet<String>, BackendError>;

    /// Replaces the server-side favorites with the given ids.
    async fn save(&self, ids: &BTreeSet<String>) -> Result<(), BackendError>;
}

type UpdateFn = Box<dyn Fn(&BTreeSet<String>) + Send + Sync>;

/// The favorites store.
///
/// Reconciliation with the server is a plain union: a heart given
/// either signed out or on another device is never dropped.
#[derive(Default)]
pub struct FavoritesStore {
    ids: BTreeSet<String>,
    on_update: Vec<UpdateFn>,
}

impl FavoritesStore {
    /// Creates an empty store.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores favorites from a persisted local snapshot.
    #[inline]
    pub fn restore(ids: BTreeSet<String>) -> Self {
        Self {
            ids,
            on_update: vec![],
        }
    }

    /// Registers a callback invoked with the full id set after every
    /// mutation.
    #[inline]
    pub fn subscribe(
        &mut self,
        on_update: impl Fn(&BTreeSet<String>) + Send + Sync + 'static,
    ) {
        self.on_update.push(Box::new(on_update));
    }

    /// Returns the favorited ids. The set doubles as the local
    /// persistence snapshot.
    #[inline]
    pub fn ids(&self) -> &BTreeSet<String> {
        &self.ids
    }

    /// Returns whether a product is favorited.
    #[inline]
    pub fn contains(&self, product_id: &str) -> bool {
        self.ids.contains(product_id)
    }

    /// Toggles a product and returns whether it is now favorited.
    pub fn toggle(&mut self, product_id: &str) -> bool {
        let favorited = if self.ids.remove(product_id) {
            false
        } else {
            self.ids.insert(product_id.to_owned());
            true
        };
        self.notify();
        favorited
    }

    /// Merges the server-side ids into the local set.
    pub fn merge_remote(&mut self, remote: BTreeSet<String>) {
        self.ids.extend(remote);
        self.notify();
    }

    /// Runs the sign-in reconciliation: union with the server set and
    /// write the result back.
    pub async fn sync(
        &mut self,
        backend: &dyn FavoritesBackend,
    ) -> Result<(), BackendError> {
        let remote = backend.fetch().await?;
        self.merge_remote(remote);
        backend.save(&self.ids).await
    }

    fn notify(&self) {
        for on_update in &self.on_update {
            on_update(&self.ids);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn test_toggle() {
        let mut favorites = FavoritesStore::new();
        assert!(favorites.toggle("esp32"));
        assert!(favorites.contains("esp32"));
        assert!(!favorites.toggle("esp32"));
        assert!(!favorites.contains("esp32"));
    }

    #[test]
    fn test_merge_is_a_union() {
        let mut favorites = FavoritesStore::restore(
            ["esp32".to_owned()].into_iter().collect(),
        );
        favorites.merge_remote(
            ["esp32".to_owned(), "psu-650".to_owned()].into_iter().collect(),
        );
        assert_eq!(favorites.ids().len(), 2);
    }

    struct InMemoryBackend {
        rows: Mutex<BTreeSet<String>>,
    }

    #[async_trait]
    impl FavoritesBackend for InMemoryBackend {
        async fn fetch(&self) -> Result<BTreeSet<String>, BackendError> {
            Ok(self.rows.lock().unwrap().clone())
        }

        async fn save(
            &self,
            ids: &BTreeSet<String>,
        ) -> Result<(), BackendError> {
            *self.rows.lock().unwrap() = ids.clone();
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_sync_unions_both_sides() {
        let backend = InMemoryBackend {
            rows: Mutex::new(["psu-650".to_owned()].into_iter().collect()),
        };
        let mut favorites = FavoritesStore::restore(
            ["esp32".to_owned()].into_iter().collect(),
        );

        favorites.sync(&backend).await.unwrap();

        assert!(favorites.contains("esp32"));
        assert!(favorites.contains("psu-650"));
        assert_eq!(&*backend.rows.lock().unwrap(), favorites.ids());
    }
}
