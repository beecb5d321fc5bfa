use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::StorageError;
use crate::media::{FacetSelection, ItemKey};

pub const SELECTED_GENRE_KEY: &str = "selectedGenre";
pub const SELECTED_COUNTRY_KEY: &str = "selectedCountry";

/// String-keyed local store persisted as one JSON object. Unreadable
/// contents read as empty.
#[derive(Debug, Clone)]
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    pub fn open_default() -> Result<Self, StorageError> {
        let home = std::env::var("HOME").map_err(|_| StorageError::NoHomeDir)?;
        let path = PathBuf::from(home)
            .join(".local")
            .join("share")
            .join("movieverse")
            .join("storage.json");
        Ok(Self::at(path))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> BTreeMap<String, String> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "storage unreadable");
                return BTreeMap::new();
            }
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "storage corrupt, reading as empty");
            BTreeMap::new()
        })
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.read_all().remove(key)
    }

    pub fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        let mut entries = self.read_all();
        entries.insert(key.to_string(), value);
        self.write_all(&entries)
    }

    pub fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.read_all();
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }

    pub fn read_list<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let Some(raw) = self.get(key) else {
            return Vec::new();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(key, error = %e, "stored list corrupt, reading as empty");
            Vec::new()
        })
    }

    /// Replaces the whole list.
    pub fn write_list<T: Serialize>(&self, key: &str, items: &[T]) -> Result<(), StorageError> {
        self.set(key, serde_json::to_string(items)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Comment {
    pub fn new(text: String) -> Self {
        Self {
            text,
            timestamp: Utc::now(),
        }
    }

    pub fn display_time(&self) -> String {
        self.timestamp.format("%Y-%m-%d %H:%M").to_string()
    }
}

/// Display label for the comment at `index`; there are no real accounts.
pub fn comment_author(index: usize) -> String {
    format!("user{}", index + 1)
}

pub struct CommentStore<'a> {
    storage: &'a Storage,
    key: String,
}

impl<'a> CommentStore<'a> {
    pub fn for_item(storage: &'a Storage, item: ItemKey) -> Self {
        Self {
            storage,
            key: format!("comments_{}_{}", item.id, item.media_type.path()),
        }
    }

    pub fn load(&self) -> Vec<Comment> {
        self.storage.read_list(&self.key)
    }

    pub fn add(&self, text: &str) -> Result<Vec<Comment>, StorageError> {
        let mut comments = self.load();
        comments.push(Comment::new(text.trim().to_string()));
        self.storage.write_list(&self.key, &comments)?;
        Ok(comments)
    }

    /// Replaces text and timestamp. Out-of-range indices leave the list as is.
    pub fn edit(&self, index: usize, text: &str) -> Result<Vec<Comment>, StorageError> {
        let mut comments = self.load();
        let Some(comment) = comments.get_mut(index) else {
            return Ok(comments);
        };
        *comment = Comment::new(text.trim().to_string());
        self.storage.write_list(&self.key, &comments)?;
        Ok(comments)
    }

    pub fn delete(&self, index: usize) -> Result<Vec<Comment>, StorageError> {
        let mut comments = self.load();
        if index >= comments.len() {
            return Ok(comments);
        }
        comments.remove(index);
        self.storage.write_list(&self.key, &comments)?;
        Ok(comments)
    }
}

/// Restores the last genre or country choice. A genre wins if both were
/// somehow stored.
pub fn load_facet_preferences(storage: &Storage) -> FacetSelection {
    let facets = FacetSelection::default()
        .with_country(storage.get(SELECTED_COUNTRY_KEY).filter(|c| c != "null"));
    match storage
        .get(SELECTED_GENRE_KEY)
        .and_then(|g| g.parse::<u64>().ok())
    {
        Some(genre) => facets.with_genre(Some(genre)),
        None => facets,
    }
}

pub fn save_facet_preferences(storage: &Storage, facets: &FacetSelection) -> Result<(), StorageError> {
    match facets.genre_id() {
        Some(genre) => storage.set(SELECTED_GENRE_KEY, genre.to_string())?,
        None => storage.remove(SELECTED_GENRE_KEY)?,
    }
    match facets.country_code() {
        Some(country) => storage.set(SELECTED_COUNTRY_KEY, country.to_string())?,
        None => storage.remove(SELECTED_COUNTRY_KEY)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaType;

    fn storage() -> (tempfile::TempDir, Storage) {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = Storage::at(dir.path().join("data").join("storage.json"));
        (dir, storage)
    }

    #[test]
    fn comments_round_trip_per_item() {
        let (_dir, storage) = storage();
        let movie = CommentStore::for_item(&storage, ItemKey::new(550, MediaType::Movie));
        let series = CommentStore::for_item(&storage, ItemKey::new(550, MediaType::Series));

        movie.add("  great film ").expect("added");
        movie.add("second").expect("added");

        let loaded = movie.load();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].text, "great film");
        assert!(series.load().is_empty());
        assert!(storage.get("comments_550_movie").is_some());
    }

    #[test]
    fn edit_replaces_text_and_timestamp() {
        let (_dir, storage) = storage();
        let store = CommentStore::for_item(&storage, ItemKey::new(1, MediaType::Series));
        let before = store.add("first").expect("added")[0].clone();

        let after = store.edit(0, "edited").expect("edited");
        assert_eq!(after[0].text, "edited");
        assert!(after[0].timestamp >= before.timestamp);
        assert_eq!(store.load(), after);

        assert_eq!(store.edit(5, "nope").expect("ignored"), after);
    }

    #[test]
    fn edit_leaves_other_comments_untouched() {
        let (_dir, storage) = storage();
        let store = CommentStore::for_item(&storage, ItemKey::new(4, MediaType::Movie));
        for text in ["a", "b", "c"] {
            store.add(text).expect("added");
        }
        let before = store.load();

        let after = store.edit(1, "B").expect("edited");
        let texts: Vec<_> = after.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "B", "c"]);
        assert_eq!(after[0], before[0]);
        assert_eq!(after[2], before[2]);
        assert_eq!(store.load(), after);
    }

    #[test]
    fn delete_removes_by_index() {
        let (_dir, storage) = storage();
        let store = CommentStore::for_item(&storage, ItemKey::new(2, MediaType::Movie));
        for text in ["a", "b", "c"] {
            store.add(text).expect("added");
        }
        let remaining = store.delete(1).expect("deleted");
        let texts: Vec<_> = remaining.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "c"]);
        assert_eq!(store.delete(9).expect("ignored").len(), 2);
    }

    #[test]
    fn corrupt_comment_list_reads_empty() {
        let (_dir, storage) = storage();
        storage
            .set("comments_3_movie", String::from("{not a list"))
            .expect("set");
        let store = CommentStore::for_item(&storage, ItemKey::new(3, MediaType::Movie));
        assert!(store.load().is_empty());
    }

    #[test]
    fn corrupt_storage_file_reads_empty_and_recovers() {
        let (_dir, storage) = storage();
        std::fs::create_dir_all(storage.path().parent().expect("parent")).expect("mkdir");
        std::fs::write(storage.path(), "garbage").expect("write");

        assert_eq!(storage.get(SELECTED_GENRE_KEY), None);
        storage.set(SELECTED_GENRE_KEY, String::from("28")).expect("set");
        assert_eq!(storage.get(SELECTED_GENRE_KEY).as_deref(), Some("28"));
    }

    #[test]
    fn facet_preferences_round_trip() {
        let (_dir, storage) = storage();
        assert_eq!(load_facet_preferences(&storage), FacetSelection::default());

        let genre = FacetSelection::default().with_genre(Some(35));
        save_facet_preferences(&storage, &genre).expect("saved");
        assert_eq!(load_facet_preferences(&storage), genre);

        let country = genre.with_country(Some(String::from("IT")));
        save_facet_preferences(&storage, &country).expect("saved");
        assert_eq!(storage.get(SELECTED_GENRE_KEY), None);
        assert_eq!(load_facet_preferences(&storage), country);
    }

    #[test]
    fn comment_authors_are_numbered_from_one() {
        assert_eq!(comment_author(0), "user1");
        assert_eq!(comment_author(4), "user5");
    }
}
