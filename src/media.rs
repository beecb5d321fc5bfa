use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use iced::widget::image::Handle;
use iced::Color;
use serde::Deserialize;

use crate::aggregation::Aggregate;
use crate::controller::{HomeSection, Modal};
use crate::navigation::Route;
use crate::reference::ReferenceData;

fn simple_hash(s: &str) -> String {
    let mut hash: u64 = 5381;
    for byte in s.bytes() {
        hash = hash.wrapping_mul(33).wrapping_add(byte as u64);
    }
    format!("{:016x}", hash)
}

fn get_cache_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(|home| {
        PathBuf::from(home)
            .join(".cache")
            .join("movieverse")
            .join("images")
    })
}

pub const BACKGROUND_BLACK: Color = Color::from_rgb(0.043, 0.051, 0.078);
pub const SURFACE_DARK_GRAY: Color = Color::from_rgb(0.098, 0.110, 0.149);
pub const ACCENT_BLUE: Color = Color::from_rgb(0.290, 0.565, 0.886);
pub const STAR_YELLOW: Color = Color::from_rgb(0.961, 0.773, 0.094);
pub const TEXT_WHITE: Color = Color::from_rgb(1.0, 1.0, 1.0);
pub const TEXT_GRAY: Color = Color::from_rgb(0.702, 0.702, 0.702);

pub type MediaId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Movie,
    Series,
}

impl MediaType {
    /// Path segment and wire name used by the catalog API.
    pub fn path(self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Series => "tv",
        }
    }

    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "movie" => Some(MediaType::Movie),
            "tv" => Some(MediaType::Series),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MediaType::Movie => "Movie",
            MediaType::Series => "Series",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemKey {
    pub id: MediaId,
    pub media_type: MediaType,
}

impl ItemKey {
    pub fn new(id: MediaId, media_type: MediaType) -> Self {
        Self { id, media_type }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemCommon {
    pub id: MediaId,
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub vote_average: Option<f32>,
    pub genre_ids: Vec<u64>,
}

/// A list entry normalised at ingestion. Movies carry `title`/`release_date`,
/// series carry `name`/`first_air_date`; accessors hide the difference.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogItem {
    Movie {
        common: ItemCommon,
        title: String,
        release_date: Option<String>,
    },
    Series {
        common: ItemCommon,
        name: String,
        first_air_date: Option<String>,
    },
}

impl CatalogItem {
    pub fn common(&self) -> &ItemCommon {
        match self {
            CatalogItem::Movie { common, .. } | CatalogItem::Series { common, .. } => common,
        }
    }

    pub fn media_type(&self) -> MediaType {
        match self {
            CatalogItem::Movie { .. } => MediaType::Movie,
            CatalogItem::Series { .. } => MediaType::Series,
        }
    }

    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.common().id, self.media_type())
    }

    pub fn title(&self) -> &str {
        match self {
            CatalogItem::Movie { title, .. } => title,
            CatalogItem::Series { name, .. } => name,
        }
    }

    pub fn release_date(&self) -> Option<&str> {
        match self {
            CatalogItem::Movie { release_date, .. } => release_date.as_deref(),
            CatalogItem::Series { first_air_date, .. } => first_air_date.as_deref(),
        }
    }

    pub fn overview(&self) -> &str {
        &self.common().overview
    }

    pub fn poster_path(&self) -> Option<&str> {
        self.common().poster_path.as_deref()
    }

    pub fn backdrop_path(&self) -> Option<&str> {
        self.common().backdrop_path.as_deref()
    }

    pub fn vote_average(&self) -> Option<f32> {
        self.common().vote_average
    }

    pub fn genre_ids(&self) -> &[u64] {
        &self.common().genre_ids
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbListItem {
    pub id: u64,
    pub title: Option<String>,
    pub name: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub media_type: Option<String>,
    pub vote_average: Option<f32>,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<u64>,
}

impl TmdbListItem {
    /// Normalises a raw entry. People and unknown media kinds yield `None`;
    /// entries without a `media_type` take `fallback`.
    pub fn into_item(self, fallback: MediaType) -> Option<CatalogItem> {
        let media_type = match self.media_type.as_deref() {
            None => fallback,
            Some(wire) => MediaType::from_wire(wire)?,
        };
        let common = ItemCommon {
            id: self.id,
            overview: self.overview.unwrap_or_default(),
            poster_path: self.poster_path.filter(|p| !p.is_empty()),
            backdrop_path: self.backdrop_path.filter(|p| !p.is_empty()),
            vote_average: self.vote_average.filter(|v| *v > 0.0),
            genre_ids: self.genre_ids,
        };
        let item = match media_type {
            MediaType::Movie => CatalogItem::Movie {
                common,
                title: self.title.or(self.name).unwrap_or_default(),
                release_date: self.release_date.filter(|d| !d.is_empty()),
            },
            MediaType::Series => CatalogItem::Series {
                common,
                name: self.name.or(self.title).unwrap_or_default(),
                first_air_date: self
                    .first_air_date
                    .or(self.release_date)
                    .filter(|d| !d.is_empty()),
            },
        };
        Some(item)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Genre {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Country {
    pub code: String,
    pub name: String,
}

/// Secondary per-item fetch. Runtime fields are `None` when the upstream
/// reports nothing or zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemDetail {
    pub title: String,
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub vote_average: Option<f32>,
    pub release_date: Option<String>,
    pub runtime_minutes: Option<u32>,
    pub number_of_seasons: Option<u32>,
    pub episode_runtimes: Vec<u32>,
    pub cast_summary: Vec<String>,
    pub genres: Vec<Genre>,
    pub production_country: Option<String>,
    pub production_companies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedItem {
    pub item: CatalogItem,
    pub details: Option<ItemDetail>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Episode {
    pub episode_number: u32,
    pub name: String,
    pub overview: String,
    pub air_date: Option<String>,
    pub still_path: Option<String>,
    pub runtime: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaTypeFilter {
    #[default]
    All,
    Movies,
    Series,
    Animation,
}

impl MediaTypeFilter {
    pub const ALL: [MediaTypeFilter; 4] = [
        MediaTypeFilter::All,
        MediaTypeFilter::Movies,
        MediaTypeFilter::Series,
        MediaTypeFilter::Animation,
    ];
}

impl std::fmt::Display for MediaTypeFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaTypeFilter::All => write!(f, "All"),
            MediaTypeFilter::Movies => write!(f, "Movies"),
            MediaTypeFilter::Series => write!(f, "Series"),
            MediaTypeFilter::Animation => write!(f, "Animation"),
        }
    }
}

/// User-selected narrowing. At most one of genre and country is set, and
/// changing the media-type filter clears both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacetSelection {
    media_type_filter: MediaTypeFilter,
    genre_id: Option<u64>,
    country_code: Option<String>,
}

impl FacetSelection {
    pub fn media_type_filter(&self) -> MediaTypeFilter {
        self.media_type_filter
    }

    pub fn genre_id(&self) -> Option<u64> {
        self.genre_id
    }

    pub fn country_code(&self) -> Option<&str> {
        self.country_code.as_deref()
    }

    pub fn with_media_type(self, filter: MediaTypeFilter) -> Self {
        Self {
            media_type_filter: filter,
            genre_id: None,
            country_code: None,
        }
    }

    pub fn with_genre(self, genre_id: Option<u64>) -> Self {
        match genre_id {
            Some(id) => Self {
                genre_id: Some(id),
                country_code: None,
                ..self
            },
            None => Self {
                genre_id: None,
                ..self
            },
        }
    }

    pub fn with_country(self, country_code: Option<String>) -> Self {
        match country_code.filter(|c| !c.trim().is_empty()) {
            Some(code) => Self {
                country_code: Some(code),
                genre_id: None,
                ..self
            },
            None => Self {
                country_code: None,
                ..self
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    Trending,
    NewMovies,
    NewSeries,
    Recommended,
    Popular,
    Search(String),
}

impl Category {
    pub fn slug(&self) -> &'static str {
        match self {
            Category::Trending => "trending",
            Category::NewMovies => "new-movies",
            Category::NewSeries => "new-series",
            Category::Recommended => "recommended",
            Category::Popular => "popular",
            Category::Search(_) => "search",
        }
    }

    /// Unknown slugs fall back to trending; `search` needs a query.
    pub fn from_slug(slug: &str, query: Option<&str>) -> Self {
        match slug {
            "new-movies" => Category::NewMovies,
            "new-series" => Category::NewSeries,
            "recommended" => Category::Recommended,
            "popular" => Category::Popular,
            "search" => match query.map(str::trim).filter(|q| !q.is_empty()) {
                Some(q) => Category::Search(q.to_string()),
                None => Category::Trending,
            },
            _ => Category::Trending,
        }
    }

    pub fn title(&self) -> String {
        match self {
            Category::Trending => String::from("Trending"),
            Category::NewMovies => String::from("New Release - Movies"),
            Category::NewSeries => String::from("New Release - Series"),
            Category::Recommended => String::from("Recommended"),
            Category::Popular => String::from("Popular"),
            Category::Search(query) => format!("Search Results for \"{}\"", query),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImageCache {
    cache: HashMap<String, Handle>,
    pending: HashSet<String>,
    cache_directory: Option<PathBuf>,
}

impl ImageCache {
    pub fn new() -> Self {
        let cache_directory = get_cache_dir();
        if let Some(ref dir) = cache_directory {
            if let Err(e) = std::fs::create_dir_all(dir) {
                tracing::warn!(dir = %dir.display(), error = %e, "image cache directory unavailable");
            }
        }
        Self {
            cache: HashMap::new(),
            pending: HashSet::new(),
            cache_directory,
        }
    }

    pub fn get(&self, url: &str) -> Option<&Handle> {
        self.cache.get(url)
    }

    pub fn insert(&mut self, url: String, handle: Handle) {
        self.pending.remove(&url);
        self.cache.insert(url, handle);
    }

    pub fn release(&mut self, url: &str) {
        self.pending.remove(url);
    }

    pub fn needs_load(&self, url: &str) -> bool {
        !self.cache.contains_key(url) && !self.pending.contains(url)
    }

    pub fn mark_pending(&mut self, url: String) {
        self.pending.insert(url);
    }

    pub fn get_cache_path(&self, url: &str) -> Option<PathBuf> {
        self.cache_directory
            .as_ref()
            .map(|dir| dir.join(simple_hash(url)))
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    Setup(crate::settings::SetupMessage),
    ReferenceLoaded(Arc<ReferenceData>),
    Navigate(Route),
    Back,
    RetryLoad,
    SearchQueryChanged(String),
    SearchDebounceElapsed(u64),
    SearchSubmit,
    SuggestionsLoaded(u64, Vec<CatalogItem>),
    SelectSuggestion(ItemKey),
    CloseSuggestions,
    OpenModal(Modal),
    CloseModal,
    SelectGenre(Option<u64>),
    SelectCountry(Option<String>),
    HomeSectionLoaded(u64, HomeSection, Box<Aggregate>),
    HeroLoaded(u64, Box<Aggregate>),
    RecentLoaded(u64, Vec<CatalogItem>),
    SetHomeType(MediaTypeFilter),
    SelectHero(usize),
    AdvanceHero,
    RecentPrev,
    RecentNext,
    ViewAllLoaded(u64, Box<Aggregate>),
    ViewAllHeroLoaded(u64, Box<Aggregate>),
    SetViewAllType(MediaTypeFilter),
    GoToPage(u32),
    DetailLoaded(u64, Option<Box<ItemDetail>>),
    TrailerLoaded(u64, Option<String>),
    OpenTrailer,
    SimilarLoaded(u64, Vec<EnrichedItem>),
    SelectSeason(u32),
    SeasonLoaded(u64, u32, Vec<Episode>),
    CommentInputChanged(String),
    SubmitComment,
    EditComment(usize),
    CancelCommentEdit,
    DeleteComment(usize),
    ImageLoaded(String, Result<Handle, String>),
}

pub fn truncate_description(description: &str, max_length: usize) -> String {
    if description.chars().count() <= max_length {
        return description.to_string();
    }
    let truncated: String = description.chars().take(max_length).collect();
    format!(
        "{}...",
        truncated
            .rfind(' ')
            .map_or(truncated.as_str(), |i| &truncated[..i])
    )
}
