use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::media::{CatalogItem, Country, Genre, MediaType};
use crate::tmdb::{self, CatalogSource};

const MAX_GENRE_CHIPS: usize = 3;
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Default)]
pub struct GenreTable {
    movie: HashMap<u64, String>,
    tv: HashMap<u64, String>,
    picker: Vec<Genre>,
}

impl GenreTable {
    /// Picker entries merge both lists, deduplicated by id and sorted by name.
    pub fn from_lists(movie: Vec<Genre>, tv: Vec<Genre>) -> Self {
        let mut picker = movie.clone();
        for genre in &tv {
            if !picker.iter().any(|g| g.id == genre.id) {
                picker.push(genre.clone());
            }
        }
        picker.sort_by(|a, b| a.name.cmp(&b.name));

        Self {
            movie: movie.into_iter().map(|g| (g.id, g.name)).collect(),
            tv: tv.into_iter().map(|g| (g.id, g.name)).collect(),
            picker,
        }
    }

    pub fn name(&self, media_type: MediaType, id: u64) -> Option<&str> {
        let table = match media_type {
            MediaType::Movie => &self.movie,
            MediaType::Series => &self.tv,
        };
        table.get(&id).map(String::as_str)
    }

    pub fn genre_chips(&self, item: &CatalogItem) -> Vec<String> {
        let chips: Vec<String> = item
            .genre_ids()
            .iter()
            .filter_map(|id| self.name(item.media_type(), *id))
            .take(MAX_GENRE_CHIPS)
            .map(String::from)
            .collect();
        if chips.is_empty() {
            vec![String::from(NOT_AVAILABLE)]
        } else {
            chips
        }
    }

    pub fn picker(&self) -> &[Genre] {
        &self.picker
    }

    pub fn picker_name(&self, id: u64) -> Option<&str> {
        self.picker
            .iter()
            .find(|g| g.id == id)
            .map(|g| g.name.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct CountryTable {
    names: HashMap<String, String>,
    picker: Vec<Country>,
}

impl CountryTable {
    pub fn from_list(mut countries: Vec<Country>) -> Self {
        countries.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            names: countries
                .iter()
                .map(|c| (c.code.clone(), c.name.clone()))
                .collect(),
            picker: countries,
        }
    }

    pub fn name(&self, code: &str) -> &str {
        self.names
            .get(code)
            .map(String::as_str)
            .unwrap_or(NOT_AVAILABLE)
    }

    pub fn picker(&self) -> &[Country] {
        &self.picker
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub genres: GenreTable,
    pub countries: CountryTable,
}

/// Any list that fails to load is left empty; lookups then yield N/A.
pub async fn load_reference_data<S: CatalogSource + ?Sized>(source: &S) -> ReferenceData {
    let (movie, tv, countries) = tokio::join!(
        tmdb::fetch_genre_list(source, MediaType::Movie),
        tmdb::fetch_genre_list(source, MediaType::Series),
        tmdb::fetch_countries(source),
    );
    if movie.is_none() || tv.is_none() || countries.is_none() {
        warn!(
            movie_genres = movie.is_some(),
            tv_genres = tv.is_some(),
            countries = countries.is_some(),
            "reference data partially unavailable"
        );
    }

    let data = ReferenceData {
        genres: GenreTable::from_lists(movie.unwrap_or_default(), tv.unwrap_or_default()),
        countries: CountryTable::from_list(countries.unwrap_or_default()),
    };
    info!(
        genres = data.genres.picker().len(),
        countries = data.countries.picker().len(),
        "reference data loaded"
    );
    data
}

/// Session-scoped, load-once holder. Concurrent callers share one load.
#[derive(Debug, Clone, Default)]
pub struct ReferenceDataCache {
    cell: Arc<OnceCell<Arc<ReferenceData>>>,
}

impl ReferenceDataCache {
    pub async fn load<S: CatalogSource + ?Sized>(&self, source: &S) -> Arc<ReferenceData> {
        self.cell
            .get_or_init(|| async { Arc::new(load_reference_data(source).await) })
            .await
            .clone()
    }

    pub fn get(&self) -> Option<Arc<ReferenceData>> {
        self.cell.get().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::TmdbListItem;
    use crate::tmdb::testing::FakeCatalog;

    fn genre(id: u64, name: &str) -> Genre {
        Genre {
            id,
            name: name.to_string(),
        }
    }

    fn item(json: serde_json::Value) -> CatalogItem {
        serde_json::from_value::<TmdbListItem>(json)
            .expect("valid")
            .into_item(MediaType::Movie)
            .expect("kept")
    }

    fn catalog() -> FakeCatalog {
        FakeCatalog::default()
            .with(
                "/genre/movie/list",
                serde_json::json!({"genres": [{"id": 28, "name": "Action"}, {"id": 16, "name": "Animation"}, {"id": 18, "name": "Drama"}, {"id": 35, "name": "Comedy"}]}),
            )
            .with(
                "/genre/tv/list",
                serde_json::json!({"genres": [{"id": 10765, "name": "Sci-Fi & Fantasy"}, {"id": 18, "name": "Drama"}]}),
            )
            .with(
                "/configuration/countries",
                serde_json::json!([
                    {"iso_3166_1": "US", "english_name": "United States of America", "native_name": "United States"},
                    {"iso_3166_1": "FR", "english_name": "France", "native_name": "France"}
                ]),
            )
    }

    #[test]
    fn chips_drop_unknown_ids_and_keep_three() {
        let table = GenreTable::from_lists(
            vec![
                genre(28, "Action"),
                genre(16, "Animation"),
                genre(18, "Drama"),
                genre(35, "Comedy"),
            ],
            vec![],
        );
        let movie = item(serde_json::json!({"id": 1, "title": "x", "genre_ids": [28, 999, 16, 18, 35]}));
        assert_eq!(table.genre_chips(&movie), vec!["Action", "Animation", "Drama"]);
    }

    #[test]
    fn chips_use_table_for_items_media_type() {
        let table = GenreTable::from_lists(vec![genre(28, "Action")], vec![genre(10765, "Sci-Fi & Fantasy")]);
        let series = item(serde_json::json!({"id": 2, "name": "x", "media_type": "tv", "genre_ids": [28, 10765]}));
        assert_eq!(table.genre_chips(&series), vec!["Sci-Fi & Fantasy"]);
    }

    #[test]
    fn chips_fall_back_to_not_available() {
        let table = GenreTable::default();
        let movie = item(serde_json::json!({"id": 3, "title": "x", "genre_ids": [28]}));
        assert_eq!(table.genre_chips(&movie), vec![NOT_AVAILABLE]);
    }

    #[test]
    fn unknown_country_code_is_not_available() {
        let table = CountryTable::from_list(vec![Country {
            code: String::from("DE"),
            name: String::from("Germany"),
        }]);
        assert_eq!(table.name("DE"), "Germany");
        assert_eq!(table.name("ZZ"), NOT_AVAILABLE);
    }

    #[tokio::test]
    async fn picker_lists_are_merged_and_sorted() {
        let data = load_reference_data(&catalog()).await;
        let names: Vec<_> = data.genres.picker().iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Action", "Animation", "Comedy", "Drama", "Sci-Fi & Fantasy"]);
        assert_eq!(data.countries.picker()[0].code, "FR");
    }

    #[tokio::test]
    async fn cache_loads_once_per_session() {
        let catalog = catalog();
        let cache = ReferenceDataCache::default();
        assert!(cache.get().is_none());

        let first = cache.load(&catalog).await;
        let second = cache.clone().load(&catalog).await;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(catalog.request_count("/genre/movie/list"), 1);
        assert_eq!(catalog.request_count("/configuration/countries"), 1);
        assert!(cache.get().is_some());
    }

    #[tokio::test]
    async fn failed_lists_load_as_empty_tables() {
        let data = load_reference_data(&FakeCatalog::default()).await;
        assert!(data.genres.picker().is_empty());
        assert_eq!(data.countries.name("US"), NOT_AVAILABLE);
    }
}
