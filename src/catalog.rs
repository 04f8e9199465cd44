//! Cached listings and the category views built from them.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::de::DeserializeOwned;

use crate::api::{Category, Channel, Movie};
use crate::errors::IptvError;
use crate::item_id::ItemId;
use crate::store::{KeyValueStore, SharedStore};

pub const LIVE_CATEGORIES_KEY: &str = "tv_categories";
pub const LIVE_STREAMS_KEY: &str = "tv_streams";
pub const VOD_CATEGORIES_KEY: &str = "vod_categories";
pub const VOD_STREAMS_KEY: &str = "vod_streams";

const ALL_ID: &str = "all";
const FAVORITES_ID: &str = "favorites";

/// Anything a panel can list
#[derive(Debug, Clone, PartialEq)]
pub enum ListItem {
    Category(Category),
    Channel(Channel),
    Movie(Movie),
}

impl ListItem {
    pub fn name(&self) -> &str {
        match self {
            ListItem::Category(c) => &c.category_name,
            ListItem::Channel(c) => &c.name,
            ListItem::Movie(m) => &m.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryFilter {
    All,
    Favorites,
    Only(ItemId),
}

impl CategoryFilter {
    pub fn for_category(category: &Category) -> Self {
        match &category.category_id {
            ItemId::Text(id) if id == ALL_ID => CategoryFilter::All,
            ItemId::Text(id) if id == FAVORITES_ID => CategoryFilter::Favorites,
            id => CategoryFilter::Only(id.clone()),
        }
    }

    fn admits(&self, id: &ItemId, category: Option<&ItemId>, favorites: &BTreeSet<ItemId>) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Favorites => favorites.contains(id),
            CategoryFilter::Only(wanted) => category == Some(wanted),
        }
    }
}

fn all_category(name: &str) -> Category {
    Category::new(ItemId::Text(ALL_ID.to_string()), name)
}

fn favorites_category() -> Category {
    Category::new(ItemId::Text(FAVORITES_ID.to_string()), "Favorites")
}

fn read_cached<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Vec<T>, IptvError> {
    let raw = store
        .get(key)
        .ok_or_else(|| IptvError::MissingListings(key.to_string()))?;
    serde_json::from_str(&raw).map_err(|e| IptvError::Parse(format!("{}: {}", key, e)))
}

/// Write a listing the way `read_cached` expects it
pub fn write_cached<T: serde::Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    items: &[T],
) -> Result<(), IptvError> {
    let json = serde_json::to_string(items).map_err(|e| IptvError::Parse(e.to_string()))?;
    store.set(key, json)
}

#[derive(Debug, Clone, Default)]
pub struct LiveCatalog {
    categories: Vec<Category>,
    channels: Vec<Channel>,
}

impl LiveCatalog {
    /// Category panel order: All channels, Favorites, then provider categories.
    /// Favorites is only offered next to at least one real category.
    pub fn new(provider_categories: Vec<Category>, channels: Vec<Channel>) -> Self {
        let mut categories = Vec::with_capacity(provider_categories.len() + 2);
        categories.push(all_category("All channels"));
        if !provider_categories.is_empty() {
            categories.push(favorites_category());
        }
        categories.extend(provider_categories);
        Self {
            categories,
            channels,
        }
    }

    pub fn load(store: &SharedStore) -> Result<Self, IptvError> {
        let categories = read_cached(store.as_ref(), LIVE_CATEGORIES_KEY)?;
        let channels = read_cached(store.as_ref(), LIVE_STREAMS_KEY)?;
        Ok(Self::new(categories, channels))
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn channels_for(&self, filter: &CategoryFilter, favorites: &BTreeSet<ItemId>) -> Vec<Channel> {
        self.channels
            .iter()
            .filter(|c| filter.admits(&c.stream_id, c.category_id.as_ref(), favorites))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct VodCatalog {
    categories: Vec<Category>,
    movies: Vec<Movie>,
}

impl VodCatalog {
    /// Prepends All, then Favorites when there is at least one real category.
    /// Movies are kept newest first (descending numeric id).
    pub fn new(provider_categories: Vec<Category>, mut movies: Vec<Movie>) -> Self {
        let mut categories = Vec::with_capacity(provider_categories.len() + 2);
        categories.push(all_category("All"));
        if !provider_categories.is_empty() {
            categories.push(favorites_category());
        }
        categories.extend(provider_categories);

        movies.sort_by(|a, b| newest_first(&a.stream_id, &b.stream_id));
        Self { categories, movies }
    }

    pub fn load(store: &SharedStore) -> Result<Self, IptvError> {
        let categories = read_cached(store.as_ref(), VOD_CATEGORIES_KEY)?;
        let movies = read_cached(store.as_ref(), VOD_STREAMS_KEY)?;
        Ok(Self::new(categories, movies))
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn movies_for(&self, filter: &CategoryFilter, favorites: &BTreeSet<ItemId>) -> Vec<Movie> {
        self.movies
            .iter()
            .filter(|m| filter.admits(&m.stream_id, m.category_id.as_ref(), favorites))
            .cloned()
            .collect()
    }

    /// Case-insensitive name match over every movie
    pub fn search(&self, term: &str) -> Vec<Movie> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return self.movies.clone();
        }
        self.movies
            .iter()
            .filter(|m| m.name.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    /// Favorites when any exist, else the first provider category, else All
    pub fn start_category(&self, favorites: &BTreeSet<ItemId>) -> usize {
        let favorites_index = self
            .categories
            .iter()
            .position(|c| CategoryFilter::for_category(c) == CategoryFilter::Favorites);
        match favorites_index {
            Some(i) if !favorites.is_empty() => i,
            _ if self.categories.len() > 2 => 2,
            _ => 0,
        }
    }
}

fn newest_first(a: &ItemId, b: &ItemId) -> Ordering {
    match (a.as_i64(), b.as_i64()) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}
