//! Turns a category and a facet selection into a paginated page of enriched
//! items: resolve the endpoint, fetch a window of upstream pages, fetch
//! per-item details with bounded concurrency, filter locally, then slice.

use std::collections::HashSet;

use futures::stream::{self, StreamExt};
use tracing::{debug, info};

use crate::media::{
    CatalogItem, Category, EnrichedItem, FacetSelection, MediaType, MediaTypeFilter,
};
use crate::tmdb::{self, CatalogSource, Endpoint};

pub const DISPLAY_PAGE_SIZE: usize = 20;
pub const DEFAULT_WINDOW_PAGES: u32 = 5;
pub const DEFAULT_ENRICH_CONCURRENCY: usize = 8;
pub const ANIMATION_GENRE_ID: u64 = 16;
pub const ANIMATION_GENRE_IDS: [u64; 2] = [ANIMATION_GENRE_ID, 10762];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Resolving,
    FetchingPages,
    Enriching,
    Filtering,
    Paginating,
}

impl Category {
    pub fn default_endpoint(&self) -> Endpoint {
        match self {
            Category::Trending => Endpoint::new("/trending/all/week", None),
            Category::NewMovies => Endpoint::new("/movie/now_playing", Some(MediaType::Movie)),
            Category::NewSeries => Endpoint::new("/tv/airing_today", Some(MediaType::Series)),
            Category::Recommended => Endpoint::new("/trending/all/day", None),
            Category::Popular => Endpoint::new("/movie/popular", Some(MediaType::Movie)),
            Category::Search(query) => Endpoint::search(query),
        }
    }

    /// Discover variant used when a genre or country is selected.
    pub fn discover_kind(&self) -> MediaType {
        match self {
            Category::NewSeries => MediaType::Series,
            _ => MediaType::Movie,
        }
    }
}

/// Precedence: media type, then genre, then country, then the category
/// default. Search always stays on the search endpoint.
pub fn resolve_endpoint(category: &Category, facets: &FacetSelection) -> Endpoint {
    if let Category::Search(query) = category {
        return Endpoint::search(query);
    }
    match facets.media_type_filter() {
        MediaTypeFilter::Movies => Endpoint::discover(MediaType::Movie),
        MediaTypeFilter::Series => Endpoint::discover(MediaType::Series),
        MediaTypeFilter::Animation => Endpoint::discover(MediaType::Movie)
            .with_param("with_genres", ANIMATION_GENRE_ID.to_string()),
        MediaTypeFilter::All => {
            if facets.genre_id().is_some() || facets.country_code().is_some() {
                Endpoint::discover(category.discover_kind())
            } else {
                category.default_endpoint()
            }
        }
    }
}

pub fn matches_filter(filter: MediaTypeFilter, item: &CatalogItem) -> bool {
    match filter {
        MediaTypeFilter::All => true,
        MediaTypeFilter::Movies => item.media_type() == MediaType::Movie,
        MediaTypeFilter::Series => item.media_type() == MediaType::Series,
        MediaTypeFilter::Animation => item
            .genre_ids()
            .iter()
            .any(|id| ANIMATION_GENRE_IDS.contains(id)),
    }
}

pub fn filter_items(items: &[EnrichedItem], filter: MediaTypeFilter) -> Vec<EnrichedItem> {
    items
        .iter()
        .filter(|e| matches_filter(filter, &e.item))
        .cloned()
        .collect()
}

pub fn page_count(len: usize) -> u32 {
    len.div_ceil(DISPLAY_PAGE_SIZE).max(1) as u32
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultPage {
    pub items: Vec<EnrichedItem>,
    pub page_number: u32,
    pub total_pages: u32,
    pub total_upstream_pages: u32,
}

/// Slices one display page, clamping the requested page into range.
pub fn paginate(items: &[EnrichedItem], page: u32, total_upstream_pages: u32) -> ResultPage {
    let total_pages = page_count(items.len());
    let page_number = page.clamp(1, total_pages);
    let start = (page_number as usize - 1) * DISPLAY_PAGE_SIZE;
    ResultPage {
        items: items
            .iter()
            .skip(start)
            .take(DISPLAY_PAGE_SIZE)
            .cloned()
            .collect(),
        page_number,
        total_pages,
        total_upstream_pages,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregationRequest {
    pub category: Category,
    pub facets: FacetSelection,
    pub page: u32,
    pub window_pages: u32,
    /// Caps the merged list before enrichment.
    pub item_limit: Option<usize>,
}

impl AggregationRequest {
    pub fn new(category: Category, facets: FacetSelection) -> Self {
        Self {
            category,
            facets,
            page: 1,
            window_pages: DEFAULT_WINDOW_PAGES,
            item_limit: None,
        }
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Clamped to `1..=DEFAULT_WINDOW_PAGES` whatever the configuration says.
    pub fn window_pages(mut self, window_pages: u32) -> Self {
        self.window_pages = window_pages.clamp(1, DEFAULT_WINDOW_PAGES);
        self
    }

    pub fn item_limit(mut self, limit: usize) -> Self {
        self.item_limit = Some(limit);
        self
    }
}

/// The enriched, unfiltered result of one aggregation. Page changes
/// re-slice it; facet changes need a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub category: Category,
    pub facets: FacetSelection,
    pub endpoint: Endpoint,
    pub items: Vec<EnrichedItem>,
    pub total_upstream_pages: u32,
    /// The first upstream page failed, so nothing could be listed.
    pub unreachable: bool,
}

impl Aggregate {
    pub fn filtered(&self) -> Vec<EnrichedItem> {
        filter_items(&self.items, self.facets.media_type_filter())
    }

    pub fn page(&self, page: u32) -> ResultPage {
        debug!(phase = ?Phase::Filtering, items = self.items.len());
        let filtered = self.filtered();
        debug!(phase = ?Phase::Paginating, kept = filtered.len(), page);
        paginate(&filtered, page, self.total_upstream_pages)
    }

    pub fn page_count(&self) -> u32 {
        page_count(self.filtered().len())
    }
}

/// Merged upstream pages before enrichment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageWindow {
    pub items: Vec<CatalogItem>,
    pub total_upstream_pages: u32,
    pub unreachable: bool,
}

#[derive(Debug, Clone)]
pub struct Aggregator<S> {
    source: S,
    enrich_concurrency: usize,
}

impl<S: CatalogSource> Aggregator<S> {
    pub fn new(source: S, enrich_concurrency: usize) -> Self {
        Self {
            source,
            enrich_concurrency: enrich_concurrency.max(1),
        }
    }

    /// Sequential page fetch. Stops at the first failed or empty page, or
    /// past the last upstream page. Items repeated across pages are kept once.
    pub async fn fetch_window(
        &self,
        endpoint: &Endpoint,
        facets: &FacetSelection,
        pages: u32,
    ) -> PageWindow {
        let mut window = PageWindow::default();
        let mut seen = HashSet::new();

        for page in 1..=pages.clamp(1, DEFAULT_WINDOW_PAGES) {
            let Some(list) = tmdb::fetch_list_page(&self.source, endpoint, facets, page).await
            else {
                debug!(endpoint = %endpoint.path, page, "page failed, window truncated");
                window.unreachable = page == 1;
                break;
            };
            window.total_upstream_pages = list.total_pages;
            if list.raw_len == 0 {
                break;
            }
            window
                .items
                .extend(list.items.into_iter().filter(|i| seen.insert(i.key())));
            if page >= list.total_pages {
                break;
            }
        }
        window
    }

    /// Output order matches input order; a failed detail leaves `details` empty.
    pub async fn enrich(&self, items: Vec<CatalogItem>) -> Vec<EnrichedItem> {
        stream::iter(items)
            .map(|item| {
                let source = &self.source;
                async move {
                    let details = tmdb::fetch_item_detail(source, item.key()).await;
                    if details.is_none() {
                        debug!(id = item.common().id, "details unavailable");
                    }
                    EnrichedItem { item, details }
                }
            })
            .buffered(self.enrich_concurrency)
            .collect()
            .await
    }

    pub async fn collect(&self, request: &AggregationRequest) -> Aggregate {
        debug!(phase = ?Phase::Resolving, category = request.category.slug());
        let endpoint = resolve_endpoint(&request.category, &request.facets);

        debug!(phase = ?Phase::FetchingPages, endpoint = %endpoint.path, window = request.window_pages);
        let PageWindow {
            mut items,
            total_upstream_pages,
            unreachable,
        } = self
            .fetch_window(&endpoint, &request.facets, request.window_pages)
            .await;
        if let Some(limit) = request.item_limit {
            items.truncate(limit);
        }

        debug!(phase = ?Phase::Enriching, items = items.len(), concurrency = self.enrich_concurrency);
        let items = self.enrich(items).await;
        info!(
            category = request.category.slug(),
            endpoint = %endpoint.path,
            items = items.len(),
            "aggregation finished"
        );

        Aggregate {
            category: request.category.clone(),
            facets: request.facets.clone(),
            endpoint,
            items,
            total_upstream_pages,
            unreachable,
        }
    }

    /// Full pipeline through pagination.
    pub async fn run(&self, request: &AggregationRequest) -> (Aggregate, ResultPage) {
        let aggregate = self.collect(request).await;
        let page = aggregate.page(request.page);
        (aggregate, page)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::Value;

    use super::*;
    use crate::media::{ItemDetail, ItemKey};
    use crate::tmdb::testing::{list, movie, series, FakeCatalog};

    fn enriched(json: Value) -> EnrichedItem {
        let item = serde_json::from_value::<crate::media::TmdbListItem>(json)
            .expect("valid")
            .into_item(MediaType::Movie)
            .expect("kept");
        EnrichedItem {
            item,
            details: None,
        }
    }

    fn params(endpoint: &Endpoint) -> Vec<(&str, &str)> {
        endpoint
            .params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    #[derive(Debug, Clone, Copy)]
    enum Narrowing {
        Nothing,
        Genre,
        Country,
    }

    fn facets_for(filter: MediaTypeFilter, narrowing: Narrowing) -> FacetSelection {
        let facets = FacetSelection::default().with_media_type(filter);
        match narrowing {
            Narrowing::Nothing => facets,
            Narrowing::Genre => facets.with_genre(Some(28)),
            Narrowing::Country => facets.with_country(Some(String::from("KR"))),
        }
    }

    fn expected_endpoint(
        category: &Category,
        filter: MediaTypeFilter,
        narrowing: Narrowing,
    ) -> (&'static str, Vec<(&'static str, &'static str)>) {
        if let Category::Search(_) = category {
            return ("/search/multi", vec![("query", "dune")]);
        }
        match (filter, narrowing) {
            (MediaTypeFilter::Movies, _) => ("/discover/movie", vec![]),
            (MediaTypeFilter::Series, _) => ("/discover/tv", vec![]),
            (MediaTypeFilter::Animation, _) => ("/discover/movie", vec![("with_genres", "16")]),
            (MediaTypeFilter::All, Narrowing::Nothing) => {
                let path = match category {
                    Category::Trending => "/trending/all/week",
                    Category::NewMovies => "/movie/now_playing",
                    Category::NewSeries => "/tv/airing_today",
                    Category::Recommended => "/trending/all/day",
                    Category::Popular => "/movie/popular",
                    Category::Search(_) => "/search/multi",
                };
                (path, vec![])
            }
            (MediaTypeFilter::All, _) => match category {
                Category::NewSeries => ("/discover/tv", vec![]),
                _ => ("/discover/movie", vec![]),
            },
        }
    }

    #[test]
    fn resolve_endpoint_covers_every_facet_combination() {
        let categories = [
            Category::Trending,
            Category::NewMovies,
            Category::NewSeries,
            Category::Recommended,
            Category::Popular,
            Category::Search(String::from("dune")),
        ];
        let narrowings = [Narrowing::Nothing, Narrowing::Genre, Narrowing::Country];

        let mut checked = 0;
        for category in &categories {
            for filter in MediaTypeFilter::ALL {
                for narrowing in narrowings {
                    let facets = facets_for(filter, narrowing);
                    let endpoint = resolve_endpoint(category, &facets);
                    let (path, expected_params) = expected_endpoint(category, filter, narrowing);
                    assert_eq!(
                        (endpoint.path.as_str(), params(&endpoint)),
                        (path, expected_params),
                        "{:?} with {:?} / {:?}",
                        category,
                        filter,
                        narrowing
                    );
                    checked += 1;
                }
            }
        }
        assert_eq!(checked, categories.len() * MediaTypeFilter::ALL.len() * narrowings.len());
    }

    #[test]
    fn narrowed_discover_requests_carry_facet_params() {
        let genre = facets_for(MediaTypeFilter::All, Narrowing::Genre);
        let endpoint = resolve_endpoint(&Category::Popular, &genre);
        let sent = tmdb::request_params(&endpoint, &genre, 1);
        assert!(sent.contains(&(String::from("with_genres"), String::from("28"))));

        let country = facets_for(MediaTypeFilter::Series, Narrowing::Country);
        let endpoint = resolve_endpoint(&Category::Trending, &country);
        let sent = tmdb::request_params(&endpoint, &country, 1);
        assert_eq!(endpoint.path, "/discover/tv");
        assert!(sent.contains(&(String::from("region"), String::from("KR"))));
    }

    #[test]
    fn media_type_wins_over_genre() {
        let facets = FacetSelection::default()
            .with_media_type(MediaTypeFilter::Series)
            .with_genre(Some(28));
        assert_eq!(
            resolve_endpoint(&Category::NewMovies, &facets),
            Endpoint::discover(MediaType::Series)
        );
    }

    #[test]
    fn search_ignores_facets_when_resolving() {
        let facets = FacetSelection::default().with_media_type(MediaTypeFilter::Movies);
        let endpoint = resolve_endpoint(&Category::Search(String::from("dune")), &facets);
        assert_eq!(endpoint.path, "/search/multi");
        assert_eq!(params(&endpoint), vec![("query", "dune")]);
    }

    #[test]
    fn animation_filter_keeps_animation_and_kids_genres() {
        let items = vec![
            enriched(movie(1, &[16])),
            enriched(movie(2, &[12])),
            enriched(series(3, &[10762, 18])),
        ];
        let kept = filter_items(&items, MediaTypeFilter::Animation);
        let ids: Vec<_> = kept.iter().map(|e| e.item.common().id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn movies_and_series_filters_split_by_type() {
        let items = vec![enriched(movie(1, &[])), enriched(series(2, &[]))];
        assert_eq!(filter_items(&items, MediaTypeFilter::Movies).len(), 1);
        assert_eq!(filter_items(&items, MediaTypeFilter::Series)[0].item.common().id, 2);
        assert_eq!(filter_items(&items, MediaTypeFilter::All).len(), 2);
    }

    #[test]
    fn pagination_slices_twenty_per_page_and_clamps() {
        let items: Vec<_> = (1..=45).map(|id| enriched(movie(id, &[]))).collect();

        let sizes: Vec<_> = (1..=3).map(|p| paginate(&items, p, 5).items.len()).collect();
        assert_eq!(sizes, vec![20, 20, 5]);

        let clamped = paginate(&items, 4, 5);
        assert_eq!(clamped.page_number, 3);
        assert_eq!(clamped.total_pages, 3);
        assert_eq!(clamped.items[0].item.common().id, 41);

        assert_eq!(paginate(&items, 0, 5).page_number, 1);
    }

    #[test]
    fn empty_result_is_a_single_empty_page() {
        let page = paginate(&[], 3, 0);
        assert_eq!(page.page_number, 1);
        assert_eq!(page.total_pages, 1);
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn window_stops_at_failed_page() {
        let catalog = FakeCatalog::default()
            .with_page("/trending/all/week", 1, list(vec![movie(1, &[]), movie(2, &[])], 10))
            .with_page("/trending/all/week", 2, list(vec![movie(3, &[])], 10));
        let aggregator = Aggregator::new(&catalog, 4);
        let window = aggregator
            .fetch_window(&Category::Trending.default_endpoint(), &FacetSelection::default(), 5)
            .await;

        assert_eq!(window.items.len(), 3);
        assert_eq!(window.total_upstream_pages, 10);
        assert!(!window.unreachable);
        assert_eq!(catalog.request_count("/trending/all/week"), 3);
    }

    #[tokio::test]
    async fn window_stops_at_empty_page_and_drops_repeats() {
        let catalog = FakeCatalog::default()
            .with_page("/movie/popular", 1, list(vec![movie(1, &[]), movie(2, &[])], 9))
            .with_page("/movie/popular", 2, list(vec![movie(2, &[]), movie(3, &[])], 9))
            .with_page("/movie/popular", 3, list(vec![], 9));
        let aggregator = Aggregator::new(&catalog, 4);
        let window = aggregator
            .fetch_window(&Category::Popular.default_endpoint(), &FacetSelection::default(), 5)
            .await;

        let ids: Vec<_> = window.items.iter().map(|i| i.common().id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(catalog.request_count("/movie/popular"), 3);
    }

    #[tokio::test]
    async fn empty_first_page_is_an_empty_result_not_a_failure() {
        let catalog = FakeCatalog::default()
            .with("/search/multi", serde_json::json!({"results": [], "total_pages": 1}));
        let aggregator = Aggregator::new(&catalog, 4);
        let (aggregate, page) = aggregator
            .run(&AggregationRequest::new(
                Category::Search(String::from("zzzz")),
                FacetSelection::default(),
            ))
            .await;

        assert_eq!(catalog.request_count("/search/multi"), 1);
        assert!(!aggregate.unreachable);
        assert_eq!(aggregate.total_upstream_pages, 1);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
    }

    #[tokio::test]
    async fn failed_first_page_marks_the_list_unreachable() {
        let catalog = FakeCatalog::default();
        let aggregator = Aggregator::new(&catalog, 4);
        let aggregate = aggregator
            .collect(&AggregationRequest::new(Category::Trending, FacetSelection::default()))
            .await;

        assert!(aggregate.unreachable);
        assert!(aggregate.items.is_empty());
        assert_eq!(catalog.request_count("/trending/all/week"), 1);
    }

    #[test]
    fn window_size_is_clamped() {
        let request = AggregationRequest::new(Category::Trending, FacetSelection::default());
        assert_eq!(request.clone().window_pages(50).window_pages, DEFAULT_WINDOW_PAGES);
        assert_eq!(request.window_pages(0).window_pages, 1);
    }

    #[tokio::test]
    async fn oversized_window_never_fetches_past_five_pages() {
        let results: Vec<_> = (1..=3).map(|id| movie(id, &[])).collect();
        let mut catalog = FakeCatalog::default();
        for page in 1..=8u32 {
            let page_items = results
                .iter()
                .map(|m| {
                    let mut m = m.clone();
                    m["id"] = serde_json::json!(page as u64 * 100 + m["id"].as_u64().unwrap_or(0));
                    m
                })
                .collect();
            catalog = catalog.with_page("/movie/popular", page, list(page_items, 50));
        }
        let aggregator = Aggregator::new(&catalog, 4);
        let window = aggregator
            .fetch_window(&Category::Popular.default_endpoint(), &FacetSelection::default(), 8)
            .await;

        assert_eq!(catalog.request_count("/movie/popular"), 5);
        assert_eq!(window.items.len(), 15);
    }

    #[tokio::test]
    async fn failed_detail_keeps_item_without_details() {
        let catalog = FakeCatalog::default()
            .with("/movie/popular", list(vec![movie(1, &[]), movie(2, &[])], 1))
            .with("/movie/1", serde_json::json!({"title": "Movie 1", "runtime": 95}));
        let aggregator = Aggregator::new(&catalog, 2);
        let (aggregate, page) = aggregator
            .run(&AggregationRequest::new(Category::Popular, FacetSelection::default()))
            .await;

        assert_eq!(aggregate.items.len(), 2);
        assert_eq!(
            page.items[0].details.as_ref().and_then(|d| d.runtime_minutes),
            Some(95)
        );
        assert_eq!(page.items[1].item.common().id, 2);
        assert!(page.items[1].details.is_none());
    }

    #[tokio::test]
    async fn item_limit_caps_enrichment() {
        let results = (1..=10).map(|id| movie(id, &[])).collect();
        let catalog = FakeCatalog::default().with("/trending/all/week", list(results, 1));
        let aggregator = Aggregator::new(&catalog, 8);
        let aggregate = aggregator
            .collect(&AggregationRequest::new(Category::Trending, FacetSelection::default()).item_limit(3))
            .await;

        assert_eq!(aggregate.items.len(), 3);
        assert_eq!(catalog.request_count("/movie/4"), 0);
    }

    #[tokio::test]
    async fn facet_change_resolves_new_endpoint_and_filters_locally() {
        let catalog = FakeCatalog::default().with(
            "/discover/movie",
            list(vec![movie(1, &[16]), movie(2, &[28])], 1),
        );
        let facets = FacetSelection::default().with_media_type(MediaTypeFilter::Animation);
        let aggregator = Aggregator::new(&catalog, 8);
        let (aggregate, page) = aggregator
            .run(&AggregationRequest::new(Category::Trending, facets))
            .await;

        assert_eq!(aggregate.endpoint.path, "/discover/movie");
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].item.common().id, 1);
        let sent = catalog.params_for("/discover/movie").expect("requested");
        assert!(sent.contains(&(String::from("with_genres"), String::from("16"))));
    }

    #[tokio::test]
    async fn rerunning_the_same_request_is_stable() {
        let results = (1..=25).map(|id| movie(id, &[])).collect();
        let catalog = FakeCatalog::default().with("/trending/all/day", list(results, 1));
        let aggregator = Aggregator::new(&catalog, 8);
        let request = AggregationRequest::new(Category::Recommended, FacetSelection::default()).page(2);

        let (_, first) = aggregator.run(&request).await;
        let (_, second) = aggregator.run(&request).await;
        assert_eq!(first, second);
        assert_eq!(first.items.len(), 5);
    }

    struct SlowCatalog {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl CatalogSource for SlowCatalog {
        async fn get(&self, _endpoint: &str, _params: &[(String, String)]) -> Option<Value> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Some(serde_json::json!({"title": "x", "runtime": 90}))
        }
    }

    #[tokio::test]
    async fn enrichment_respects_concurrency_limit_and_order() {
        let catalog = Arc::new(SlowCatalog {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let items: Vec<_> = (1..=12).map(|id| enriched(movie(id, &[])).item).collect();
        let aggregator = Aggregator::new(catalog.clone(), 3);
        let out = aggregator.enrich(items).await;

        assert!(catalog.peak.load(Ordering::SeqCst) <= 3);
        assert!(catalog.peak.load(Ordering::SeqCst) >= 2);
        let ids: Vec<_> = out.iter().map(|e| e.item.key()).collect();
        let expected: Vec<_> = (1..=12).map(|id| ItemKey::new(id, MediaType::Movie)).collect();
        assert_eq!(ids, expected);
        assert!(out.iter().all(|e| e.details.as_ref().map(|d: &ItemDetail| d.runtime_minutes) == Some(Some(90))));
    }
}
