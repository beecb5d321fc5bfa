use std::collections::HashMap;
use std::time::Duration;

use crate::aggregation::{Aggregate, AggregationRequest, ResultPage};
use crate::media::{
    CatalogItem, Category, EnrichedItem, Episode, FacetSelection, ItemDetail, ItemKey,
    MediaTypeFilter,
};
use crate::storage::Comment;

pub const SEARCH_DEBOUNCE: Duration = Duration::from_secs(1);
pub const HERO_SLOTS: usize = 5;
pub const RECENT_WINDOW: usize = 5;

/// Monotonic request tokens. Only the latest issued token is current.
#[derive(Debug, Clone, Default)]
pub struct RequestSequence {
    latest: u64,
}

impl RequestSequence {
    pub fn issue(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    pub fn is_current(&self, token: u64) -> bool {
        token == self.latest
    }

    pub fn invalidate(&mut self) {
        self.latest += 1;
    }
}

#[derive(Debug, Clone)]
pub struct SearchDebouncer {
    generation: u64,
    pending: Option<String>,
    delay: Duration,
}

impl Default for SearchDebouncer {
    fn default() -> Self {
        Self::new(SEARCH_DEBOUNCE)
    }
}

impl SearchDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            generation: 0,
            pending: None,
            delay,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Records a keystroke. Returns the generation to wake up with, or
    /// `None` when the query is blank.
    pub fn input(&mut self, query: &str) -> Option<u64> {
        self.generation += 1;
        let query = query.trim();
        if query.is_empty() {
            self.pending = None;
            return None;
        }
        self.pending = Some(query.to_string());
        Some(self.generation)
    }

    /// The query to search for if no newer keystroke arrived since
    /// `generation` was issued.
    pub fn elapsed(&mut self, generation: u64) -> Option<String> {
        if generation != self.generation {
            return None;
        }
        self.pending.take()
    }

    pub fn cancel(&mut self) {
        self.generation += 1;
        self.pending = None;
    }
}

pub async fn debounce(generation: u64, delay: Duration) -> u64 {
    tokio::time::sleep(delay).await;
    generation
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modal {
    Genre,
    Country,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Ready,
}

/// Popular titles featured above a listing.
pub fn hero_request(facets: &FacetSelection) -> AggregationRequest {
    AggregationRequest::new(Category::Popular, facets.clone())
        .window_pages(1)
        .item_limit(HERO_SLOTS)
}

#[derive(Debug, Clone, Default)]
pub struct HeroCarousel {
    slides: Vec<EnrichedItem>,
    index: usize,
}

impl HeroCarousel {
    pub fn fill(&mut self, aggregate: &Aggregate) {
        self.slides = aggregate.filtered().into_iter().take(HERO_SLOTS).collect();
        self.index = 0;
    }

    pub fn slides(&self) -> &[EnrichedItem] {
        &self.slides
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> Option<&EnrichedItem> {
        self.slides.get(self.index)
    }

    pub fn advance(&mut self) {
        if !self.slides.is_empty() {
            self.index = (self.index + 1) % self.slides.len();
        }
    }

    /// Out-of-range indices are ignored.
    pub fn select(&mut self, index: usize) {
        if index < self.slides.len() {
            self.index = index;
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViewAllState {
    category: Category,
    facets: FacetSelection,
    page: u32,
    aggregate: Option<Aggregate>,
    load_state: LoadState,
    sequence: RequestSequence,
    hero: HeroCarousel,
    hero_sequence: RequestSequence,
}

impl ViewAllState {
    pub fn new(category: Category, facets: FacetSelection, page: u32) -> Self {
        Self {
            category,
            facets,
            page: page.max(1),
            aggregate: None,
            load_state: LoadState::Idle,
            sequence: RequestSequence::default(),
            hero: HeroCarousel::default(),
            hero_sequence: RequestSequence::default(),
        }
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn facets(&self) -> &FacetSelection {
        &self.facets
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    pub fn begin_load(&mut self, window_pages: u32) -> (u64, AggregationRequest) {
        self.load_state = LoadState::Loading;
        let token = self.sequence.issue();
        let request = AggregationRequest::new(self.category.clone(), self.facets.clone())
            .page(self.page)
            .window_pages(window_pages);
        (token, request)
    }

    /// Stores a finished aggregation unless a newer one was started since.
    pub fn finish_load(&mut self, token: u64, aggregate: Aggregate) -> bool {
        if !self.sequence.is_current(token) {
            return false;
        }
        self.page = self.page.clamp(1, aggregate.page_count());
        self.aggregate = Some(aggregate);
        self.load_state = LoadState::Ready;
        true
    }

    /// The hero ignores the listing's facets.
    pub fn begin_hero_load(&mut self) -> (u64, AggregationRequest) {
        (self.hero_sequence.issue(), hero_request(&FacetSelection::default()))
    }

    pub fn finish_hero_load(&mut self, token: u64, aggregate: &Aggregate) -> bool {
        if !self.hero_sequence.is_current(token) {
            return false;
        }
        self.hero.fill(aggregate);
        true
    }

    pub fn hero(&self) -> &HeroCarousel {
        &self.hero
    }

    pub fn hero_mut(&mut self) -> &mut HeroCarousel {
        &mut self.hero
    }

    /// Returns whether anything changed; a change restarts at page one.
    pub fn apply_facets(&mut self, facets: FacetSelection) -> bool {
        if facets == self.facets {
            return false;
        }
        self.facets = facets;
        self.page = 1;
        true
    }

    pub fn select_media_type(&mut self, filter: MediaTypeFilter) -> bool {
        self.apply_facets(self.facets.clone().with_media_type(filter))
    }

    pub fn search(&mut self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return false;
        }
        self.category = Category::Search(query.to_string());
        self.page = 1;
        true
    }

    pub fn page_count(&self) -> u32 {
        self.aggregate.as_ref().map_or(1, Aggregate::page_count)
    }

    /// Moves within the already-fetched window. Out-of-range pages are ignored.
    pub fn go_to_page(&mut self, page: u32) -> bool {
        if page < 1 || page > self.page_count() || page == self.page {
            return false;
        }
        self.page = page;
        true
    }

    pub fn current_page(&self) -> Option<ResultPage> {
        self.aggregate.as_ref().map(|a| a.page(self.page))
    }

    pub fn route(&self) -> crate::navigation::Route {
        crate::navigation::Route::ViewAll {
            category: self.category.clone(),
            page: self.page,
            genre: self.facets.genre_id(),
            country: self.facets.country_code().map(String::from),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HomeSection {
    Trending,
    NewMovies,
    NewSeries,
    Recommended,
}

impl HomeSection {
    pub const ALL: [HomeSection; 4] = [
        HomeSection::Trending,
        HomeSection::NewMovies,
        HomeSection::NewSeries,
        HomeSection::Recommended,
    ];

    pub fn category(self) -> Category {
        match self {
            HomeSection::Trending => Category::Trending,
            HomeSection::NewMovies => Category::NewMovies,
            HomeSection::NewSeries => Category::NewSeries,
            HomeSection::Recommended => Category::Recommended,
        }
    }

    /// Items enriched for the section. Recommended enriches the whole page
    /// so the type filter has something to work with.
    pub fn item_limit(self) -> Option<usize> {
        match self {
            HomeSection::Trending => Some(3),
            HomeSection::NewMovies | HomeSection::NewSeries => Some(4),
            HomeSection::Recommended => None,
        }
    }

    pub fn display_limit(self) -> usize {
        match self {
            HomeSection::Trending => 3,
            HomeSection::NewMovies | HomeSection::NewSeries => 4,
            HomeSection::Recommended => 8,
        }
    }

    pub fn request(self, facets: &FacetSelection) -> AggregationRequest {
        let request = AggregationRequest::new(self.category(), facets.clone()).window_pages(1);
        match self.item_limit() {
            Some(limit) => request.item_limit(limit),
            None => request,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HomeState {
    facets: FacetSelection,
    sections: HashMap<HomeSection, Aggregate>,
    hero: HeroCarousel,
    recent: Vec<CatalogItem>,
    recent_start: usize,
    sequence: RequestSequence,
    loaded: bool,
}

impl HomeState {
    pub fn new(facets: FacetSelection) -> Self {
        Self {
            facets,
            ..Default::default()
        }
    }

    pub fn facets(&self) -> &FacetSelection {
        &self.facets
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn begin_load(&mut self) -> u64 {
        self.loaded = true;
        self.sequence.issue()
    }

    fn accepts(&self, token: u64) -> bool {
        self.sequence.is_current(token)
    }

    pub fn set_section(&mut self, token: u64, section: HomeSection, aggregate: Aggregate) -> bool {
        if !self.accepts(token) {
            return false;
        }
        self.sections.insert(section, aggregate);
        true
    }

    pub fn section_items(&self, section: HomeSection) -> Option<Vec<EnrichedItem>> {
        self.sections.get(&section).map(|aggregate| {
            aggregate
                .filtered()
                .into_iter()
                .take(section.display_limit())
                .collect()
        })
    }

    pub fn set_hero(&mut self, token: u64, aggregate: &Aggregate) -> bool {
        if !self.accepts(token) {
            return false;
        }
        self.hero.fill(aggregate);
        true
    }

    pub fn hero(&self) -> &HeroCarousel {
        &self.hero
    }

    pub fn hero_mut(&mut self) -> &mut HeroCarousel {
        &mut self.hero
    }

    pub fn set_recent(&mut self, token: u64, items: Vec<CatalogItem>) -> bool {
        if !self.accepts(token) {
            return false;
        }
        self.recent = items;
        self.recent_start = 0;
        true
    }

    pub fn visible_recent(&self) -> &[CatalogItem] {
        let end = (self.recent_start + RECENT_WINDOW).min(self.recent.len());
        &self.recent[self.recent_start.min(end)..end]
    }

    pub fn can_scroll_recent_back(&self) -> bool {
        self.recent_start > 0
    }

    pub fn can_scroll_recent_forward(&self) -> bool {
        self.recent_start + RECENT_WINDOW < self.recent.len()
    }

    pub fn recent_next(&mut self) {
        if self.can_scroll_recent_forward() {
            self.recent_start += 1;
        }
    }

    pub fn recent_prev(&mut self) {
        self.recent_start = self.recent_start.saturating_sub(1);
    }

    /// A change marks the home page for reloading.
    pub fn apply_facets(&mut self, facets: FacetSelection) -> bool {
        if facets == self.facets {
            return false;
        }
        self.facets = facets;
        self.loaded = false;
        true
    }

    pub fn select_media_type(&mut self, filter: MediaTypeFilter) -> bool {
        self.apply_facets(self.facets.clone().with_media_type(filter))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentAction {
    Add(String),
    Edit(usize, String),
}

#[derive(Debug, Clone)]
pub struct DetailState {
    pub key: ItemKey,
    pub token: u64,
    pub detail: Option<ItemDetail>,
    pub load_state: LoadState,
    pub trailer: Option<String>,
    pub selected_season: Option<u32>,
    pub episodes: Vec<Episode>,
    pub similar: Vec<EnrichedItem>,
    pub comments: Vec<Comment>,
    pub comment_input: String,
    pub editing: Option<usize>,
}

impl DetailState {
    pub fn new(key: ItemKey, token: u64, comments: Vec<Comment>) -> Self {
        Self {
            key,
            token,
            detail: None,
            load_state: LoadState::Loading,
            trailer: None,
            selected_season: None,
            episodes: Vec::new(),
            similar: Vec::new(),
            comments,
            comment_input: String::new(),
            editing: None,
        }
    }

    pub fn season_numbers(&self) -> Vec<u32> {
        let seasons = self
            .detail
            .as_ref()
            .and_then(|d| d.number_of_seasons)
            .unwrap_or(0);
        (1..=seasons).collect()
    }

    pub fn start_edit(&mut self, index: usize) {
        if let Some(comment) = self.comments.get(index) {
            self.comment_input = comment.text.clone();
            self.editing = Some(index);
        }
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
        self.comment_input.clear();
    }

    /// Consumes the input box. Blank input submits nothing.
    pub fn take_comment_submission(&mut self) -> Option<CommentAction> {
        let text = self.comment_input.trim().to_string();
        if text.is_empty() {
            return None;
        }
        self.comment_input.clear();
        Some(match self.editing.take() {
            Some(index) => CommentAction::Edit(index, text),
            None => CommentAction::Add(text),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::Value;

    use super::*;
    use crate::media::{MediaType, TmdbListItem};
    use crate::tmdb::{self, CatalogSource, Endpoint};

    fn item(id: u64) -> CatalogItem {
        serde_json::from_value::<TmdbListItem>(serde_json::json!({"id": id, "title": "t", "media_type": "movie"}))
            .expect("valid")
            .into_item(MediaType::Movie)
            .expect("kept")
    }

    fn aggregate(count: u64) -> Aggregate {
        Aggregate {
            category: Category::Trending,
            facets: FacetSelection::default(),
            endpoint: Endpoint::new("/trending/all/week", None),
            items: (1..=count)
                .map(|id| EnrichedItem {
                    item: item(id),
                    details: None,
                })
                .collect(),
            total_upstream_pages: 5,
            unreachable: false,
        }
    }

    #[derive(Default)]
    struct RecordingCatalog {
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CatalogSource for RecordingCatalog {
        async fn get(&self, _endpoint: &str, params: &[(String, String)]) -> Option<Value> {
            if let Some((_, query)) = params.iter().find(|(k, _)| k == "query") {
                if let Ok(mut queries) = self.queries.lock() {
                    queries.push(query.clone());
                }
            }
            Some(serde_json::json!({"results": [], "total_pages": 0}))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn typing_quickly_issues_one_search_for_the_last_query() {
        let catalog = RecordingCatalog::default();
        let mut debouncer = SearchDebouncer::default();

        let first = debouncer.input("bat").expect("scheduled");
        let first_wake = tokio::spawn(debounce(first, debouncer.delay()));
        tokio::time::advance(Duration::from_millis(300)).await;
        let second = debouncer.input("batman").expect("scheduled");
        let second_wake = tokio::spawn(debounce(second, debouncer.delay()));

        for wake in [first_wake, second_wake] {
            let generation = wake.await.expect("joined");
            if let Some(query) = debouncer.elapsed(generation) {
                tmdb::search_multi(&catalog, &query, &FacetSelection::default()).await;
            }
        }

        let queries = catalog.queries.lock().expect("lock").clone();
        assert_eq!(queries, vec![String::from("batman")]);
    }

    #[test]
    fn blank_input_cancels_pending_search() {
        let mut debouncer = SearchDebouncer::default();
        let generation = debouncer.input("dune").expect("scheduled");
        assert_eq!(debouncer.input("   "), None);
        assert_eq!(debouncer.elapsed(generation), None);
    }

    #[test]
    fn cancel_discards_scheduled_wake_up() {
        let mut debouncer = SearchDebouncer::default();
        let generation = debouncer.input("alien").expect("scheduled");
        debouncer.cancel();
        assert_eq!(debouncer.elapsed(generation), None);
    }

    #[test]
    fn stale_tokens_are_rejected() {
        let mut sequence = RequestSequence::default();
        let first = sequence.issue();
        let second = sequence.issue();
        assert!(!sequence.is_current(first));
        assert!(sequence.is_current(second));
        sequence.invalidate();
        assert!(!sequence.is_current(second));
    }

    #[test]
    fn view_all_discards_stale_results() {
        let mut state = ViewAllState::new(Category::Trending, FacetSelection::default(), 1);
        let (stale, _) = state.begin_load(5);
        state.select_media_type(MediaTypeFilter::Series);
        let (fresh, request) = state.begin_load(5);

        assert_eq!(request.facets.media_type_filter(), MediaTypeFilter::Series);
        assert!(!state.finish_load(stale, aggregate(10)));
        assert_eq!(state.load_state(), LoadState::Loading);
        assert!(state.finish_load(fresh, aggregate(10)));
        assert_eq!(state.load_state(), LoadState::Ready);
    }

    #[test]
    fn page_moves_stay_within_the_window() {
        let mut state = ViewAllState::new(Category::Trending, FacetSelection::default(), 1);
        let (token, _) = state.begin_load(5);
        state.finish_load(token, aggregate(45));

        assert_eq!(state.page_count(), 3);
        assert!(state.go_to_page(3));
        assert_eq!(state.current_page().map(|p| p.items.len()), Some(5));
        assert!(!state.go_to_page(4));
        assert!(!state.go_to_page(0));
        assert_eq!(state.page(), 3);
    }

    #[test]
    fn requested_page_past_the_end_is_clamped_on_load() {
        let mut state = ViewAllState::new(Category::Trending, FacetSelection::default(), 9);
        let (token, request) = state.begin_load(5);
        assert_eq!(request.page, 9);
        state.finish_load(token, aggregate(30));
        assert_eq!(state.page(), 2);
    }

    #[test]
    fn facet_changes_reset_to_first_page() {
        let mut state = ViewAllState::new(Category::Recommended, FacetSelection::default(), 1);
        let (token, _) = state.begin_load(5);
        state.finish_load(token, aggregate(45));
        state.go_to_page(2);

        let horror = state.facets().clone().with_genre(Some(27));
        assert!(state.apply_facets(horror.clone()));
        assert_eq!(state.page(), 1);
        assert!(!state.apply_facets(horror));
        let spain = state.facets().clone().with_country(Some(String::from("ES")));
        assert!(state.apply_facets(spain));
        assert_eq!(state.facets().genre_id(), None);
    }

    #[test]
    fn search_replaces_the_category() {
        let mut state = ViewAllState::new(Category::Trending, FacetSelection::default(), 2);
        assert!(!state.search("  "));
        assert!(state.search(" matrix "));
        assert_eq!(state.category(), &Category::Search(String::from("matrix")));
        assert_eq!(state.page(), 1);
    }

    #[test]
    fn hero_carousel_wraps_around() {
        let mut home = HomeState::default();
        let token = home.begin_load();
        home.set_hero(token, &aggregate(7));

        let hero = home.hero_mut();
        assert_eq!(hero.slides().len(), HERO_SLOTS);
        for _ in 0..HERO_SLOTS {
            hero.advance();
        }
        assert_eq!(hero.index(), 0);
        hero.select(3);
        assert_eq!(hero.current().map(|h| h.item.common().id), Some(4));
        hero.select(10);
        assert_eq!(hero.index(), 3);
    }

    #[test]
    fn view_all_hero_loads_popular_titles_independently_of_the_listing() {
        let mut state = ViewAllState::new(
            Category::Recommended,
            FacetSelection::default().with_genre(Some(27)),
            1,
        );
        let (stale, _) = state.begin_hero_load();
        let (token, request) = state.begin_hero_load();

        assert_eq!(request.category, Category::Popular);
        assert_eq!(request.facets, FacetSelection::default());
        assert_eq!(request.window_pages, 1);
        assert_eq!(request.item_limit, Some(HERO_SLOTS));

        assert!(!state.finish_hero_load(stale, &aggregate(7)));
        assert!(state.hero().slides().is_empty());
        assert!(state.finish_hero_load(token, &aggregate(7)));
        assert_eq!(state.hero().slides().len(), HERO_SLOTS);

        let (listing, _) = state.begin_load(5);
        state.finish_load(listing, aggregate(2));
        state.hero_mut().select(2);
        assert!(state.select_media_type(MediaTypeFilter::Series));
        assert_eq!(state.hero().index(), 2);
    }

    #[test]
    fn recent_window_scrolls_by_one() {
        let mut home = HomeState::default();
        let token = home.begin_load();
        home.set_recent(token, (1..=7).map(item).collect());

        assert!(!home.can_scroll_recent_back());
        home.recent_next();
        home.recent_next();
        home.recent_next();
        let ids: Vec<_> = home.visible_recent().iter().map(|i| i.common().id).collect();
        assert_eq!(ids, vec![3, 4, 5, 6, 7]);
        assert!(!home.can_scroll_recent_forward());
        home.recent_prev();
        assert_eq!(home.visible_recent()[0].common().id, 2);
    }

    #[test]
    fn home_ignores_sections_from_an_older_load() {
        let mut home = HomeState::default();
        let old = home.begin_load();
        let new = home.begin_load();
        assert!(!home.set_section(old, HomeSection::Trending, aggregate(3)));
        assert!(home.section_items(HomeSection::Trending).is_none());
        assert!(home.set_section(new, HomeSection::Recommended, aggregate(20)));
        assert_eq!(home.section_items(HomeSection::Recommended).map(|i| i.len()), Some(8));
    }

    #[test]
    fn comment_submission_adds_or_edits() {
        let key = ItemKey::new(1, MediaType::Movie);
        let mut detail = DetailState::new(key, 1, vec![Comment::new(String::from("old"))]);

        detail.comment_input = String::from("  ");
        assert_eq!(detail.take_comment_submission(), None);

        detail.comment_input = String::from("new one");
        assert_eq!(
            detail.take_comment_submission(),
            Some(CommentAction::Add(String::from("new one")))
        );

        detail.start_edit(0);
        assert_eq!(detail.comment_input, "old");
        detail.comment_input = String::from("changed");
        assert_eq!(
            detail.take_comment_submission(),
            Some(CommentAction::Edit(0, String::from("changed")))
        );
        assert_eq!(detail.editing, None);
        assert!(detail.comment_input.is_empty());
    }
}
