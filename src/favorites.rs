use std::collections::BTreeSet;

use crate::item_id::ItemId;
use crate::store::SharedStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FavoriteKind {
    Channel,
    Movie,
}

impl FavoriteKind {
    pub fn store_key(&self) -> &'static str {
        match self {
            FavoriteKind::Channel => "fav_channels",
            FavoriteKind::Movie => "fav_movies",
        }
    }
}

/// Favorite sets persisted as JSON arrays in the key-value store.
///
/// The store is re-read on every call so that both screens observe each
/// other's toggles without sharing in-memory state.
#[derive(Clone)]
pub struct FavoritesStore {
    store: SharedStore,
}

impl FavoritesStore {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub fn list_favorites(&self, kind: FavoriteKind) -> BTreeSet<ItemId> {
        let Some(raw) = self.store.get(kind.store_key()) else {
            return BTreeSet::new();
        };
        match serde_json::from_str::<Vec<ItemId>>(&raw) {
            Ok(ids) => ids.into_iter().collect(),
            Err(e) => {
                tracing::warn!("{} is not a list of ids, ignoring: {}", kind.store_key(), e);
                BTreeSet::new()
            }
        }
    }

    pub fn is_favorite(&self, kind: FavoriteKind, id: &ItemId) -> bool {
        self.list_favorites(kind).contains(id)
    }

    /// Flip membership and return the new membership
    pub fn toggle(&self, kind: FavoriteKind, id: &ItemId) -> bool {
        let mut set = self.list_favorites(kind);
        let member = if set.remove(id) {
            false
        } else {
            set.insert(id.clone());
            true
        };

        let ids: Vec<&ItemId> = set.iter().collect();
        match serde_json::to_string(&ids) {
            Ok(json) => {
                if let Err(e) = self.store.set(kind.store_key(), json) {
                    tracing::warn!("favorite {} not persisted: {}", id, e);
                }
            }
            Err(e) => tracing::warn!("favorite {} not serialized: {}", id, e),
        }
        tracing::debug!(kind = ?kind, id = %id, member, "favorite toggled");
        member
    }
}
