use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::media::{
    CatalogItem, Country, Episode, FacetSelection, Genre, ItemDetail, ItemKey, MediaId, MediaType,
    TmdbListItem,
};
use crate::settings::AppSettings;

pub const API_BASE_URL: &str = "https://api.themoviedb.org/3";
const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";
const SIMILAR_LIMIT: usize = 8;
const CAST_LIMIT: usize = 5;

pub type QueryParams = Vec<(String, String)>;

/// Anything that can answer a catalog GET. Failures of any kind surface as
/// `None`; the caller decides how to degrade.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn get(&self, endpoint: &str, params: &[(String, String)]) -> Option<Value>;
}

#[async_trait]
impl<T: CatalogSource + ?Sized> CatalogSource for &T {
    async fn get(&self, endpoint: &str, params: &[(String, String)]) -> Option<Value> {
        (**self).get(endpoint, params).await
    }
}

#[async_trait]
impl<T: CatalogSource + ?Sized> CatalogSource for Arc<T> {
    async fn get(&self, endpoint: &str, params: &[(String, String)]) -> Option<Value> {
        (**self).get(endpoint, params).await
    }
}

#[derive(Clone, Copy, Debug)]
pub enum ImageSize {
    Poster,
    Backdrop,
    Still,
}

pub fn image_url(path: &str, size: ImageSize) -> String {
    let size_path = match size {
        ImageSize::Poster => "w500",
        ImageSize::Backdrop => "w1280",
        ImageSize::Still => "w300",
    };
    format!("{}/{}{}", IMAGE_BASE_URL, size_path, path)
}

pub fn youtube_url(video_key: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_key)
}

pub async fn fetch_image_bytes(url: String) -> Result<Vec<u8>, String> {
    reqwest::get(&url)
        .await
        .map_err(|e| e.to_string())?
        .error_for_status()
        .map_err(|e| e.to_string())?
        .bytes()
        .await
        .map(|b| b.to_vec())
        .map_err(|e| e.to_string())
}

/// A resolved list request: path, the media type implied by the path, and
/// any parameters the path itself requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub path: String,
    pub media_hint: Option<MediaType>,
    pub params: QueryParams,
}

impl Endpoint {
    pub fn new(path: impl Into<String>, media_hint: Option<MediaType>) -> Self {
        Self {
            path: path.into(),
            media_hint,
            params: Vec::new(),
        }
    }

    pub fn discover(media_type: MediaType) -> Self {
        Self::new(format!("/discover/{}", media_type.path()), Some(media_type))
    }

    pub fn search(query: &str) -> Self {
        Self::new("/search/multi", None).with_param("query", query)
    }

    pub fn with_param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.push((key.to_string(), value.into()));
        self
    }

    fn fallback_media_type(&self) -> MediaType {
        self.media_hint.unwrap_or(MediaType::Movie)
    }
}

/// Facet parameters keyed off the endpoint path: `region` for search and
/// discover, `with_genres` for discover only.
pub fn facet_params(endpoint: &str, facets: &FacetSelection) -> QueryParams {
    let mut params = Vec::new();
    let is_discover = endpoint.contains("discover");
    if let Some(country) = facets.country_code() {
        if is_discover || endpoint.contains("search") {
            params.push((String::from("region"), country.to_string()));
        }
    }
    if let Some(genre) = facets.genre_id() {
        if is_discover {
            params.push((String::from("with_genres"), genre.to_string()));
        }
    }
    params
}

/// Endpoint parameters win over facet parameters with the same key.
pub fn request_params(endpoint: &Endpoint, facets: &FacetSelection, page: u32) -> QueryParams {
    let mut params: QueryParams = facet_params(&endpoint.path, facets)
        .into_iter()
        .filter(|(key, _)| !endpoint.params.iter().any(|(k, _)| k == key))
        .collect();
    params.extend(endpoint.params.iter().cloned());
    params.push((String::from("page"), page.to_string()));
    params
}

#[derive(Clone)]
pub struct TmdbClient {
    api_key: String,
    base_url: String,
    language: String,
    http_client: Arc<reqwest::Client>,
}

impl std::fmt::Debug for TmdbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TmdbClient")
            .field("base_url", &self.base_url)
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}

impl TmdbClient {
    pub fn new(api_key: String, language: String) -> Self {
        Self {
            api_key,
            base_url: String::from(API_BASE_URL),
            language,
            http_client: Arc::new(reqwest::Client::new()),
        }
    }

    pub fn from_settings(settings: &AppSettings) -> Self {
        let language = if settings.language.is_empty() {
            String::from("en-US")
        } else {
            settings.language.clone()
        };
        Self::new(settings.api_key.clone(), language)
    }

    fn build_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn fetch_response(
        &self,
        endpoint: &str,
        params: &[(String, String)],
    ) -> Result<reqwest::Response, ApiError> {
        let response = self
            .http_client
            .get(self.build_url(endpoint))
            .query(&[("api_key", &self.api_key), ("language", &self.language)])
            .query(params)
            .send()
            .await?;

        match response.status().as_u16() {
            401 => Err(ApiError::Unauthorized),
            429 => Err(ApiError::RateLimit),
            s if s >= 400 => Err(ApiError::Status(s)),
            _ => Ok(response),
        }
    }

    /// Every call goes upstream; responses are never reused.
    pub async fn fetch_json(
        &self,
        endpoint: &str,
        params: &[(String, String)],
    ) -> Result<Value, ApiError> {
        let json: Value = self.fetch_response(endpoint, params).await?.json().await?;
        Ok(json)
    }
}

#[async_trait]
impl CatalogSource for TmdbClient {
    async fn get(&self, endpoint: &str, params: &[(String, String)]) -> Option<Value> {
        match self.fetch_json(endpoint, params).await {
            Ok(json) => Some(json),
            Err(e) => {
                warn!(endpoint, error = %e, "catalog request failed");
                None
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct GenreListResponse {
    #[serde(default)]
    genres: Vec<Genre>,
}

#[derive(Debug, Clone, Deserialize)]
struct TmdbCountry {
    iso_3166_1: String,
    english_name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct NamedEntity {
    name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct TmdbCredits {
    #[serde(default)]
    cast: Vec<NamedEntity>,
}

#[derive(Debug, Clone, Deserialize)]
struct TmdbDetailResponse {
    title: Option<String>,
    name: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    vote_average: Option<f32>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    runtime: Option<u32>,
    number_of_seasons: Option<u32>,
    #[serde(default)]
    episode_run_time: Vec<u32>,
    #[serde(default)]
    genres: Vec<Genre>,
    #[serde(default)]
    production_countries: Vec<NamedEntity>,
    #[serde(default)]
    production_companies: Vec<NamedEntity>,
    credits: Option<TmdbCredits>,
}

impl From<TmdbDetailResponse> for ItemDetail {
    fn from(raw: TmdbDetailResponse) -> Self {
        Self {
            title: raw.title.or(raw.name).unwrap_or_default(),
            overview: raw.overview.unwrap_or_default(),
            poster_path: raw.poster_path.filter(|p| !p.is_empty()),
            backdrop_path: raw.backdrop_path.filter(|p| !p.is_empty()),
            vote_average: raw.vote_average.filter(|v| *v > 0.0),
            release_date: raw
                .release_date
                .or(raw.first_air_date)
                .filter(|d| !d.is_empty()),
            runtime_minutes: raw.runtime.filter(|r| *r > 0),
            number_of_seasons: raw.number_of_seasons.filter(|n| *n > 0),
            episode_runtimes: raw.episode_run_time.into_iter().filter(|r| *r > 0).collect(),
            cast_summary: raw
                .credits
                .map(|c| c.cast.into_iter().take(CAST_LIMIT).map(|m| m.name).collect())
                .unwrap_or_default(),
            genres: raw.genres,
            production_country: raw.production_countries.into_iter().next().map(|c| c.name),
            production_companies: raw.production_companies.into_iter().map(|c| c.name).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct TmdbVideo {
    key: String,
    site: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Clone, Deserialize)]
struct TmdbEpisode {
    episode_number: u32,
    #[serde(default)]
    name: String,
    overview: Option<String>,
    air_date: Option<String>,
    still_path: Option<String>,
    runtime: Option<u32>,
}

/// One upstream page after ingestion. `raw_len` counts entries before
/// people and unknown kinds were dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage {
    pub items: Vec<CatalogItem>,
    pub raw_len: usize,
    pub total_pages: u32,
}

fn parse_list(json: &Value, fallback: MediaType) -> ListPage {
    let raw = json
        .get("results")
        .and_then(|v| v.as_array())
        .map(Vec::as_slice)
        .unwrap_or_default();
    let items = raw
        .iter()
        .filter_map(|entry| serde_json::from_value::<TmdbListItem>(entry.clone()).ok())
        .filter_map(|entry| entry.into_item(fallback))
        .collect();
    ListPage {
        items,
        raw_len: raw.len(),
        total_pages: json
            .get("total_pages")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u32,
    }
}

pub async fn fetch_list_page<S: CatalogSource + ?Sized>(
    source: &S,
    endpoint: &Endpoint,
    facets: &FacetSelection,
    page: u32,
) -> Option<ListPage> {
    let params = request_params(endpoint, facets, page);
    let json = source.get(&endpoint.path, &params).await?;
    Some(parse_list(&json, endpoint.fallback_media_type()))
}

pub async fn fetch_item_detail<S: CatalogSource + ?Sized>(
    source: &S,
    key: ItemKey,
) -> Option<ItemDetail> {
    let endpoint = format!("/{}/{}", key.media_type.path(), key.id);
    let params = vec![(String::from("append_to_response"), String::from("credits"))];
    let json = source.get(&endpoint, &params).await?;
    match serde_json::from_value::<TmdbDetailResponse>(json) {
        Ok(raw) => Some(ItemDetail::from(raw)),
        Err(e) => {
            debug!(endpoint, error = %e, "detail payload did not parse");
            None
        }
    }
}

/// The first YouTube trailer's video key.
pub async fn fetch_trailer<S: CatalogSource + ?Sized>(source: &S, key: ItemKey) -> Option<String> {
    let endpoint = format!("/{}/{}/videos", key.media_type.path(), key.id);
    let json = source.get(&endpoint, &[]).await?;
    json.get("results")?
        .as_array()?
        .iter()
        .filter_map(|v| serde_json::from_value::<TmdbVideo>(v.clone()).ok())
        .find(|v| v.kind == "Trailer" && v.site == "YouTube")
        .map(|v| v.key)
}

pub async fn fetch_season<S: CatalogSource + ?Sized>(
    source: &S,
    tv_id: MediaId,
    season_number: u32,
) -> Option<Vec<Episode>> {
    let endpoint = format!("/tv/{}/season/{}", tv_id, season_number);
    let json = source.get(&endpoint, &[]).await?;
    let episodes = json
        .get("episodes")?
        .as_array()?
        .iter()
        .filter_map(|e| serde_json::from_value::<TmdbEpisode>(e.clone()).ok())
        .map(|e| Episode {
            episode_number: e.episode_number,
            name: e.name,
            overview: e.overview.unwrap_or_default(),
            air_date: e.air_date.filter(|d| !d.is_empty()),
            still_path: e.still_path,
            runtime: e.runtime.filter(|r| *r > 0),
        })
        .collect();
    Some(episodes)
}

/// Similar titles always take the parent's media type.
pub async fn fetch_similar<S: CatalogSource + ?Sized>(source: &S, key: ItemKey) -> Vec<CatalogItem> {
    let endpoint = format!("/{}/{}/similar", key.media_type.path(), key.id);
    let Some(json) = source.get(&endpoint, &[]).await else {
        return Vec::new();
    };
    json.get("results")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|entry| serde_json::from_value::<TmdbListItem>(entry.clone()).ok())
                .filter_map(|mut entry| {
                    entry.media_type = Some(key.media_type.path().to_string());
                    entry.into_item(key.media_type)
                })
                .take(SIMILAR_LIMIT)
                .collect()
        })
        .unwrap_or_default()
}

pub async fn search_multi<S: CatalogSource + ?Sized>(
    source: &S,
    query: &str,
    facets: &FacetSelection,
) -> Vec<CatalogItem> {
    fetch_list_page(source, &Endpoint::search(query), facets, 1)
        .await
        .map(|page| page.items)
        .unwrap_or_default()
}

pub async fn fetch_genre_list<S: CatalogSource + ?Sized>(
    source: &S,
    media_type: MediaType,
) -> Option<Vec<Genre>> {
    let endpoint = format!("/genre/{}/list", media_type.path());
    let json = source.get(&endpoint, &[]).await?;
    serde_json::from_value::<GenreListResponse>(json)
        .ok()
        .map(|r| r.genres)
}

pub async fn fetch_countries<S: CatalogSource + ?Sized>(source: &S) -> Option<Vec<Country>> {
    let json = source.get("/configuration/countries", &[]).await?;
    let countries = serde_json::from_value::<Vec<TmdbCountry>>(json).ok()?;
    Some(
        countries
            .into_iter()
            .map(|c| Country {
                code: c.iso_3166_1,
                name: c.english_name,
            })
            .collect(),
    )
}
