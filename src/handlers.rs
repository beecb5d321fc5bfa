use iced::widget::image::Handle;
use iced::Task;
use tracing::{debug, info, warn};

use crate::aggregation::{self, Aggregate, Aggregator};
use crate::controller::{self, CommentAction, DetailState, HeroCarousel, HomeSection, ViewAllState};
use crate::media::{CatalogItem, Category, FacetSelection, ItemKey, Message};
use crate::navigation::Route;
use crate::reference::GenreTable;
use crate::render::{self, Layout};
use crate::storage::{self, CommentStore};
use crate::tmdb::{self, fetch_image_bytes, image_url, ImageSize, TmdbClient};
use crate::Movieverse;

pub fn handle_message(app: &mut Movieverse, message: Message) -> Task<Message> {
    match message {
        Message::Setup(_) => Task::none(),
        Message::ReferenceLoaded(data) => {
            app.reference = data;
            Task::none()
        }
        Message::Navigate(route) => handle_navigate(app, route),
        Message::Back => handle_back(app),
        Message::RetryLoad => {
            app.error_message = None;
            let route = app.route.clone();
            if route == Route::Home {
                return load_home(app);
            }
            enter_route(app, route)
        }
        Message::SearchQueryChanged(query) => handle_search_query_changed(app, query),
        Message::SearchDebounceElapsed(generation) => handle_search_debounce_elapsed(app, generation),
        Message::SearchSubmit => handle_search_submit(app),
        Message::SuggestionsLoaded(token, items) => handle_suggestions_loaded(app, token, items),
        Message::SelectSuggestion(key) => {
            close_suggestions(app);
            app.search_query.clear();
            handle_navigate(app, Route::Detail(key))
        }
        Message::CloseSuggestions => {
            close_suggestions(app);
            Task::none()
        }
        Message::OpenModal(modal) => {
            app.suggestions_open = false;
            app.modal = Some(modal);
            Task::none()
        }
        Message::CloseModal => {
            app.modal = None;
            Task::none()
        }
        Message::SelectGenre(genre) => handle_select_genre(app, genre),
        Message::SelectCountry(country) => handle_select_country(app, country),
        Message::HomeSectionLoaded(token, section, aggregate) => {
            handle_home_section_loaded(app, token, section, *aggregate)
        }
        Message::HeroLoaded(token, aggregate) => {
            if !app.home.set_hero(token, &aggregate) {
                return Task::none();
            }
            let urls = hero_urls(&app.reference.genres, app.home.hero());
            load_images(app, urls)
        }
        Message::ViewAllHeroLoaded(token, aggregate) => {
            let Some(state) = app.view_all.as_mut() else {
                return Task::none();
            };
            if !state.finish_hero_load(token, &aggregate) {
                debug!(token, "discarding stale view-all hero");
                return Task::none();
            }
            let urls = hero_urls(&app.reference.genres, state.hero());
            load_images(app, urls)
        }
        Message::RecentLoaded(token, items) => {
            if !app.home.set_recent(token, items) {
                return Task::none();
            }
            let urls = poster_urls(app.home.visible_recent());
            load_images(app, urls)
        }
        Message::SetHomeType(filter) => {
            if app.home.select_media_type(filter) {
                return load_home(app);
            }
            Task::none()
        }
        Message::SelectHero(index) => {
            active_hero(app).select(index);
            Task::none()
        }
        Message::AdvanceHero => {
            active_hero(app).advance();
            Task::none()
        }
        Message::RecentPrev => {
            app.home.recent_prev();
            Task::none()
        }
        Message::RecentNext => {
            app.home.recent_next();
            let urls = poster_urls(app.home.visible_recent());
            load_images(app, urls)
        }
        Message::ViewAllLoaded(token, aggregate) => handle_view_all_loaded(app, token, *aggregate),
        Message::SetViewAllType(filter) => {
            let changed = app
                .view_all
                .as_mut()
                .is_some_and(|state| state.select_media_type(filter));
            if changed {
                return load_view_all(app);
            }
            Task::none()
        }
        Message::GoToPage(page) => handle_go_to_page(app, page),
        Message::DetailLoaded(token, detail) => {
            let Some(state) = app.detail.as_mut().filter(|d| d.token == token) else {
                return Task::none();
            };
            state.detail = detail.map(|d| *d);
            state.load_state = controller::LoadState::Ready;
            if state.detail.is_none() {
                debug!(id = state.key.id, "detail unavailable, rendering placeholder");
            }
            let url = state
                .detail
                .as_ref()
                .and_then(|d| d.poster_path.as_deref())
                .map(|p| image_url(p, ImageSize::Poster));
            load_images(app, url.into_iter().collect())
        }
        Message::TrailerLoaded(token, trailer) => {
            if let Some(state) = app.detail.as_mut().filter(|d| d.token == token) {
                state.trailer = trailer;
            }
            Task::none()
        }
        Message::OpenTrailer => {
            if let Some(key) = app.detail.as_ref().and_then(|d| d.trailer.as_deref()) {
                let url = tmdb::youtube_url(key);
                if let Err(e) = webbrowser::open(&url) {
                    warn!(url, error = %e, "could not open trailer in browser");
                }
            }
            Task::none()
        }
        Message::SimilarLoaded(token, similar) => {
            let Some(state) = app.detail.as_mut().filter(|d| d.token == token) else {
                return Task::none();
            };
            state.similar = similar;
            let urls = state
                .similar
                .iter()
                .filter_map(|item| render::render_item(item, Layout::Similar, &app.reference.genres).image_url)
                .collect();
            load_images(app, urls)
        }
        Message::SelectSeason(season) => handle_select_season(app, season),
        Message::SeasonLoaded(token, season, episodes) => {
            let Some(state) = app
                .detail
                .as_mut()
                .filter(|d| d.token == token && d.selected_season == Some(season))
            else {
                return Task::none();
            };
            state.episodes = episodes;
            let urls = state
                .episodes
                .iter()
                .filter_map(|episode| render::render_episode(episode).still_url)
                .collect();
            load_images(app, urls)
        }
        Message::CommentInputChanged(value) => {
            if let Some(state) = app.detail.as_mut() {
                state.comment_input = value;
            }
            Task::none()
        }
        Message::SubmitComment => handle_submit_comment(app),
        Message::EditComment(index) => {
            if let Some(state) = app.detail.as_mut() {
                state.start_edit(index);
            }
            Task::none()
        }
        Message::CancelCommentEdit => {
            if let Some(state) = app.detail.as_mut() {
                state.cancel_edit();
            }
            Task::none()
        }
        Message::DeleteComment(index) => handle_delete_comment(app, index),
        Message::ImageLoaded(url, result) => {
            match result {
                Ok(handle) => app.image_cache.insert(url, handle),
                Err(e) => {
                    debug!(url, error = %e, "image failed to load");
                    app.image_cache.release(&url);
                }
            }
            Task::none()
        }
    }
}

fn aggregator(app: &Movieverse) -> Option<Aggregator<TmdbClient>> {
    let client = app.tmdb_client.clone()?;
    Some(Aggregator::new(client, app.settings.enrichment_concurrency))
}

fn handle_navigate(app: &mut Movieverse, route: Route) -> Task<Message> {
    if route == app.route {
        return Task::none();
    }
    let previous = app.route.clone();
    app.history.push(previous);
    enter_route(app, route)
}

fn handle_back(app: &mut Movieverse) -> Task<Message> {
    match app.history.pop() {
        Some(route) => enter_route(app, route),
        None => enter_route(app, Route::Home),
    }
}

/// Switches the visible view and starts whatever loads it needs.
pub fn enter_route(app: &mut Movieverse, route: Route) -> Task<Message> {
    info!(location = %route.to_location(), "navigating");
    app.route = route.clone();
    app.modal = None;
    app.error_message = None;
    close_suggestions(app);

    match &route {
        Route::Home => {
            if app.home.is_loaded() {
                return Task::none();
            }
            load_home(app)
        }
        Route::ViewAll { category, page, .. } => {
            app.view_all = Some(ViewAllState::new(
                category.clone(),
                route.initial_facets(),
                *page,
            ));
            Task::batch([load_view_all(app), load_view_all_hero(app)])
        }
        Route::Detail(key) => load_detail(app, *key),
    }
}

fn load_home(app: &mut Movieverse) -> Task<Message> {
    let Some(aggregator) = aggregator(app) else {
        return Task::none();
    };
    let token = app.home.begin_load();
    let facets = app.home.facets().clone();

    let mut tasks: Vec<Task<Message>> = HomeSection::ALL
        .into_iter()
        .map(|section| {
            let aggregator = aggregator.clone();
            let request = section.request(&facets);
            Task::perform(
                async move { aggregator.collect(&request).await },
                move |aggregate| Message::HomeSectionLoaded(token, section, Box::new(aggregate)),
            )
        })
        .collect();

    let hero_aggregator = aggregator.clone();
    let hero_request = controller::hero_request(&facets);
    tasks.push(Task::perform(
        async move { hero_aggregator.collect(&hero_request).await },
        move |aggregate| Message::HeroLoaded(token, Box::new(aggregate)),
    ));

    let endpoint = aggregation::resolve_endpoint(&Category::NewMovies, &facets);
    tasks.push(Task::perform(
        async move { aggregator.fetch_window(&endpoint, &facets, 1).await.items },
        move |items| Message::RecentLoaded(token, items),
    ));

    Task::batch(tasks)
}

fn handle_home_section_loaded(
    app: &mut Movieverse,
    token: u64,
    section: HomeSection,
    aggregate: Aggregate,
) -> Task<Message> {
    if !app.home.set_section(token, section, aggregate) {
        debug!(?section, "discarding stale home section");
        return Task::none();
    }
    let layout = home_layout(section);
    let urls = app
        .home
        .section_items(section)
        .unwrap_or_default()
        .iter()
        .filter_map(|item| render::render_item(item, layout, &app.reference.genres).image_url)
        .collect();
    load_images(app, urls)
}

pub fn home_layout(section: HomeSection) -> Layout {
    match section {
        HomeSection::Trending => Layout::TrendingTile,
        HomeSection::NewMovies => Layout::NewMovieTile,
        HomeSection::NewSeries => Layout::NewSeriesTile,
        HomeSection::Recommended => Layout::RecommendedBanner,
    }
}

fn load_view_all(app: &mut Movieverse) -> Task<Message> {
    let Some(aggregator) = aggregator(app) else {
        return Task::none();
    };
    let window = app.settings.page_window;
    let Some(state) = app.view_all.as_mut() else {
        return Task::none();
    };
    let (token, request) = state.begin_load(window);
    Task::perform(
        async move { aggregator.collect(&request).await },
        move |aggregate| Message::ViewAllLoaded(token, Box::new(aggregate)),
    )
}

fn load_view_all_hero(app: &mut Movieverse) -> Task<Message> {
    let Some(aggregator) = aggregator(app) else {
        return Task::none();
    };
    let Some(state) = app.view_all.as_mut() else {
        return Task::none();
    };
    let (token, request) = state.begin_hero_load();
    Task::perform(
        async move { aggregator.collect(&request).await },
        move |aggregate| Message::ViewAllHeroLoaded(token, Box::new(aggregate)),
    )
}

/// The carousel behind the current route.
fn active_hero(app: &mut Movieverse) -> &mut HeroCarousel {
    match (&app.route, app.view_all.as_mut()) {
        (Route::ViewAll { .. }, Some(state)) => state.hero_mut(),
        _ => app.home.hero_mut(),
    }
}

fn hero_urls(genres: &GenreTable, hero: &HeroCarousel) -> Vec<String> {
    hero.slides()
        .iter()
        .filter_map(|slide| render::render_item(slide, Layout::Hero, genres).image_url)
        .collect()
}

fn handle_view_all_loaded(app: &mut Movieverse, token: u64, aggregate: Aggregate) -> Task<Message> {
    let Some(state) = app.view_all.as_mut() else {
        return Task::none();
    };
    let unreachable = aggregate.unreachable;
    if !state.finish_load(token, aggregate) {
        debug!(token, "discarding stale view-all result");
        return Task::none();
    }
    app.route = state.route();
    app.error_message = unreachable.then(|| String::from("Could not load this list from TMDB."));
    view_all_images(app)
}

fn view_all_images(app: &mut Movieverse) -> Task<Message> {
    let Some(page) = app.view_all.as_ref().and_then(ViewAllState::current_page) else {
        return Task::none();
    };
    let urls = page
        .items
        .iter()
        .filter_map(|item| render::render_item(item, Layout::TrendingTile, &app.reference.genres).image_url)
        .collect();
    load_images(app, urls)
}

fn handle_go_to_page(app: &mut Movieverse, page: u32) -> Task<Message> {
    let Some(state) = app.view_all.as_mut() else {
        return Task::none();
    };
    if !state.go_to_page(page) {
        return Task::none();
    }
    app.route = state.route();
    view_all_images(app)
}

fn apply_facet_change(
    app: &mut Movieverse,
    change: impl Fn(&FacetSelection) -> FacetSelection,
) -> Task<Message> {
    app.modal = None;
    if matches!(app.route, Route::ViewAll { .. }) {
        if let Some(state) = app.view_all.as_mut() {
            let next = change(state.facets());
            let changed = state.apply_facets(next.clone());
            persist_facets(app, &next);
            return if changed { load_view_all(app) } else { Task::none() };
        }
    }

    let next = change(app.home.facets());
    persist_facets(app, &next);
    if !app.home.apply_facets(next.clone()) {
        return Task::none();
    }
    match app.route {
        Route::Home => load_home(app),
        _ => handle_navigate(app, Route::view_all_with(Category::Trending, &next)),
    }
}

fn handle_select_genre(app: &mut Movieverse, genre: Option<u64>) -> Task<Message> {
    apply_facet_change(app, |facets| facets.clone().with_genre(genre))
}

fn handle_select_country(app: &mut Movieverse, country: Option<String>) -> Task<Message> {
    apply_facet_change(app, move |facets| facets.clone().with_country(country.clone()))
}

fn persist_facets(app: &Movieverse, facets: &FacetSelection) {
    let Some(storage) = &app.storage else {
        return;
    };
    if let Err(e) = storage::save_facet_preferences(storage, facets) {
        warn!(error = %e, "could not save facet preferences");
    }
}

pub fn active_facets(app: &Movieverse) -> FacetSelection {
    match (&app.route, &app.view_all) {
        (Route::ViewAll { .. }, Some(state)) => state.facets().clone(),
        _ => app.home.facets().clone(),
    }
}

fn close_suggestions(app: &mut Movieverse) {
    app.suggestions_open = false;
    app.suggestions.clear();
    app.search_debouncer.cancel();
    app.suggestion_sequence.invalidate();
}

fn handle_search_query_changed(app: &mut Movieverse, query: String) -> Task<Message> {
    app.search_query = query;
    match app.search_debouncer.input(&app.search_query) {
        Some(generation) => Task::perform(
            controller::debounce(generation, app.search_debouncer.delay()),
            Message::SearchDebounceElapsed,
        ),
        None => {
            app.suggestions_open = false;
            app.suggestions.clear();
            app.suggestion_sequence.invalidate();
            Task::none()
        }
    }
}

fn handle_search_debounce_elapsed(app: &mut Movieverse, generation: u64) -> Task<Message> {
    let Some(query) = app.search_debouncer.elapsed(generation) else {
        return Task::none();
    };
    let Some(client) = app.tmdb_client.clone() else {
        return Task::none();
    };
    let token = app.suggestion_sequence.issue();
    let facets = active_facets(app);
    debug!(query, token, "searching suggestions");
    Task::perform(
        async move { tmdb::search_multi(&client, &query, &facets).await },
        move |items| Message::SuggestionsLoaded(token, items),
    )
}

fn handle_suggestions_loaded(app: &mut Movieverse, token: u64, items: Vec<CatalogItem>) -> Task<Message> {
    if !app.suggestion_sequence.is_current(token) {
        debug!(token, "discarding stale suggestions");
        return Task::none();
    }
    app.suggestions = items;
    app.suggestions_open = true;
    let urls = render::render_suggestions(&app.suggestions)
        .into_iter()
        .filter_map(|s| s.poster_url)
        .collect();
    load_images(app, urls)
}

fn handle_search_submit(app: &mut Movieverse) -> Task<Message> {
    let query = app.search_query.trim().to_string();
    close_suggestions(app);
    if query.is_empty() {
        return Task::none();
    }

    if matches!(app.route, Route::ViewAll { .. }) {
        if let Some(state) = app.view_all.as_mut() {
            if !state.search(&query) {
                return Task::none();
            }
            app.route = state.route();
            return load_view_all(app);
        }
    }
    handle_navigate(app, Route::view_all(Category::Search(query)))
}

fn load_detail(app: &mut Movieverse, key: ItemKey) -> Task<Message> {
    let token = app.detail_sequence.issue();
    let comments = app
        .storage
        .as_ref()
        .map(|storage| CommentStore::for_item(storage, key).load())
        .unwrap_or_default();
    app.detail = Some(DetailState::new(key, token, comments));

    let Some(aggregator) = aggregator(app) else {
        return Task::none();
    };
    let Some(client) = app.tmdb_client.clone() else {
        return Task::none();
    };
    let detail_client = client.clone();
    let trailer_client = client.clone();

    Task::batch([
        Task::perform(
            async move { tmdb::fetch_item_detail(&detail_client, key).await },
            move |detail| Message::DetailLoaded(token, detail.map(Box::new)),
        ),
        Task::perform(
            async move { tmdb::fetch_trailer(&trailer_client, key).await },
            move |trailer| Message::TrailerLoaded(token, trailer),
        ),
        Task::perform(
            async move {
                let similar = tmdb::fetch_similar(&client, key).await;
                aggregator.enrich(similar).await
            },
            move |similar| Message::SimilarLoaded(token, similar),
        ),
    ])
}

fn handle_select_season(app: &mut Movieverse, season: u32) -> Task<Message> {
    let Some(client) = app.tmdb_client.clone() else {
        return Task::none();
    };
    let Some(state) = app.detail.as_mut() else {
        return Task::none();
    };
    if state.selected_season == Some(season) {
        return Task::none();
    }
    state.selected_season = Some(season);
    state.episodes.clear();
    let token = state.token;
    let tv_id = state.key.id;
    Task::perform(
        async move { tmdb::fetch_season(&client, tv_id, season).await.unwrap_or_default() },
        move |episodes| Message::SeasonLoaded(token, season, episodes),
    )
}

fn handle_submit_comment(app: &mut Movieverse) -> Task<Message> {
    let (Some(storage), Some(state)) = (&app.storage, app.detail.as_mut()) else {
        return Task::none();
    };
    let Some(action) = state.take_comment_submission() else {
        return Task::none();
    };
    let store = CommentStore::for_item(storage, state.key);
    let result = match action {
        CommentAction::Add(text) => store.add(&text),
        CommentAction::Edit(index, text) => store.edit(index, &text),
    };
    match result {
        Ok(comments) => state.comments = comments,
        Err(e) => warn!(error = %e, "could not save comment"),
    }
    Task::none()
}

fn handle_delete_comment(app: &mut Movieverse, index: usize) -> Task<Message> {
    let (Some(storage), Some(state)) = (&app.storage, app.detail.as_mut()) else {
        return Task::none();
    };
    match CommentStore::for_item(storage, state.key).delete(index) {
        Ok(comments) => {
            state.comments = comments;
            if state.editing == Some(index) {
                state.cancel_edit();
            }
        }
        Err(e) => warn!(error = %e, "could not delete comment"),
    }
    Task::none()
}

fn poster_urls(items: &[CatalogItem]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| item.poster_path().map(|p| image_url(p, ImageSize::Poster)))
        .collect()
}

fn load_images(app: &mut Movieverse, urls: Vec<String>) -> Task<Message> {
    let tasks: Vec<Task<Message>> = urls
        .into_iter()
        .map(|url| handle_load_image(app, url))
        .collect();
    Task::batch(tasks)
}

fn handle_load_image(app: &mut Movieverse, url: String) -> Task<Message> {
    if !app.image_cache.needs_load(&url) {
        return Task::none();
    }
    app.image_cache.mark_pending(url.clone());
    let image_url = url.clone();
    let cache_path = app.image_cache.get_cache_path(&url);

    Task::perform(
        async move {
            if let Some(ref path) = cache_path {
                if let Ok(bytes) = tokio::fs::read(path).await {
                    return (image_url, Ok(bytes));
                }
            }
            let bytes = fetch_image_bytes(image_url.clone()).await;
            if let (Ok(bytes), Some(path)) = (&bytes, &cache_path) {
                if let Err(e) = tokio::fs::write(path, bytes).await {
                    debug!(path = %path.display(), error = %e, "image not cached to disk");
                }
            }
            (image_url, bytes)
        },
        |(url, result)| match result {
            Ok(bytes) => Message::ImageLoaded(url, Ok(Handle::from_bytes(bytes))),
            Err(error) => Message::ImageLoaded(url, Err(error)),
        },
    )
}
