use crate::media::{CatalogItem, EnrichedItem, Episode, ItemKey, MediaType};
use crate::reference::{GenreTable, NOT_AVAILABLE};
use crate::tmdb::{image_url, ImageSize};

const SUGGESTION_LIMIT: usize = 8;
const PAGINATION_WINDOW: u32 = 5;
const HD_BADGE: &str = "HD";
const UNKNOWN_YEAR: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    TrendingTile,
    NewMovieTile,
    NewSeriesTile,
    RecommendedBanner,
    Hero,
    Similar,
}

impl Layout {
    fn image_size(self) -> ImageSize {
        match self {
            Layout::RecommendedBanner | Layout::Hero => ImageSize::Backdrop,
            _ => ImageSize::Poster,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayFragment {
    pub key: ItemKey,
    pub layout: Layout,
    pub title: String,
    pub image_url: Option<String>,
    pub meta_line: String,
    pub rating: String,
    pub year: String,
    pub badges: Vec<&'static str>,
    pub genre_chips: Vec<String>,
    pub overview: String,
}

pub fn format_runtime(minutes: Option<u32>) -> String {
    match minutes {
        Some(m) if m > 0 => format!("{:02}:{:02}:00", m / 60, m % 60),
        _ => String::from(NOT_AVAILABLE),
    }
}

pub fn season_label(seasons: Option<u32>) -> String {
    match seasons {
        Some(n) if n > 0 => format!("Season {}", n),
        _ => format!("Season {}", NOT_AVAILABLE),
    }
}

pub fn rating_label(vote_average: Option<f32>) -> String {
    match vote_average {
        Some(v) if v > 0.0 => format!("★ {:.1}", v),
        _ => format!("★ {}", NOT_AVAILABLE),
    }
}

pub fn release_year(date: Option<&str>) -> Option<String> {
    date.and_then(|d| d.get(..4))
        .filter(|y| y.chars().all(|c| c.is_ascii_digit()))
        .map(String::from)
}

fn episode_runtime(item: &EnrichedItem) -> Option<u32> {
    item.details
        .as_ref()
        .and_then(|d| d.episode_runtimes.first().copied())
}

fn movie_runtime(item: &EnrichedItem) -> Option<u32> {
    item.details.as_ref().and_then(|d| d.runtime_minutes)
}

fn seasons(item: &EnrichedItem) -> Option<u32> {
    item.details.as_ref().and_then(|d| d.number_of_seasons)
}

/// Seasons for series when known, otherwise the first episode runtime;
/// runtime for movies.
pub fn duration_label(item: &EnrichedItem) -> String {
    match item.item.media_type() {
        MediaType::Series => match seasons(item) {
            Some(n) => season_label(Some(n)),
            None => format_runtime(episode_runtime(item)),
        },
        MediaType::Movie => format_runtime(movie_runtime(item)),
    }
}

fn meta_line(item: &EnrichedItem, layout: Layout) -> String {
    let media_type = item.item.media_type();
    match layout {
        Layout::TrendingTile => duration_label(item),
        Layout::NewMovieTile => format_runtime(movie_runtime(item)),
        Layout::NewSeriesTile => season_label(seasons(item)),
        Layout::RecommendedBanner | Layout::Similar => match media_type {
            MediaType::Series => season_label(seasons(item)),
            MediaType::Movie => format_runtime(movie_runtime(item)),
        },
        Layout::Hero => match media_type {
            MediaType::Series => format_runtime(episode_runtime(item)),
            MediaType::Movie => format_runtime(movie_runtime(item)),
        },
    }
}

fn item_image(item: &CatalogItem, size: ImageSize) -> Option<String> {
    let path = match size {
        ImageSize::Backdrop => item.backdrop_path().or(item.poster_path()),
        _ => item.poster_path().or(item.backdrop_path()),
    };
    path.map(|p| image_url(p, size))
}

pub fn render_item(item: &EnrichedItem, layout: Layout, genres: &GenreTable) -> DisplayFragment {
    let catalog = &item.item;
    let overview = if catalog.overview().is_empty() {
        item.details
            .as_ref()
            .map(|d| d.overview.clone())
            .unwrap_or_default()
    } else {
        catalog.overview().to_string()
    };
    DisplayFragment {
        key: catalog.key(),
        layout,
        title: catalog.title().to_string(),
        image_url: item_image(catalog, layout.image_size()),
        meta_line: meta_line(item, layout),
        rating: rating_label(catalog.vote_average()),
        year: release_year(catalog.release_date()).unwrap_or_else(|| String::from(UNKNOWN_YEAR)),
        badges: vec![HD_BADGE],
        genre_chips: genres.genre_chips(catalog),
        overview,
    }
}

pub fn render_items(items: &[EnrichedItem], layout: Layout, genres: &GenreTable) -> Vec<DisplayFragment> {
    items
        .iter()
        .map(|item| render_item(item, layout, genres))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionFragment {
    pub key: ItemKey,
    pub title: String,
    pub poster_url: Option<String>,
    pub meta: String,
}

pub fn render_suggestions(items: &[CatalogItem]) -> Vec<SuggestionFragment> {
    items
        .iter()
        .take(SUGGESTION_LIMIT)
        .map(|item| SuggestionFragment {
            key: item.key(),
            title: item.title().to_string(),
            poster_url: item.poster_path().map(|p| image_url(p, ImageSize::Poster)),
            meta: format!(
                "{} • {}",
                item.media_type().label(),
                release_year(item.release_date()).as_deref().unwrap_or(NOT_AVAILABLE)
            ),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeFragment {
    pub label: String,
    pub title: String,
    pub runtime: String,
    pub air_date: String,
    pub overview: String,
    pub still_url: Option<String>,
}

pub fn render_episode(episode: &Episode) -> EpisodeFragment {
    EpisodeFragment {
        label: format!("Episode {}", episode.episode_number),
        title: episode.name.clone(),
        runtime: format_runtime(episode.runtime),
        air_date: episode
            .air_date
            .clone()
            .unwrap_or_else(|| String::from(NOT_AVAILABLE)),
        overview: episode.overview.clone(),
        still_url: episode
            .still_path
            .as_deref()
            .map(|p| image_url(p, ImageSize::Still)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageButton {
    Previous { target: Option<u32> },
    Page { number: u32, active: bool },
    Next { target: Option<u32> },
}

/// Previous, up to five page numbers around the current page, then next.
pub fn pagination_strip(current: u32, total: u32) -> Vec<PageButton> {
    let total = total.max(1);
    let current = current.clamp(1, total);
    let end = (current.saturating_sub(PAGINATION_WINDOW / 2).max(1) + PAGINATION_WINDOW - 1).min(total);
    let start = end.saturating_sub(PAGINATION_WINDOW - 1).max(1);

    let mut strip = Vec::with_capacity(PAGINATION_WINDOW as usize + 2);
    strip.push(PageButton::Previous {
        target: (current > 1).then(|| current - 1),
    });
    strip.extend((start..=end).map(|number| PageButton::Page {
        number,
        active: number == current,
    }));
    strip.push(PageButton::Next {
        target: (current < total).then(|| current + 1),
    });
    strip
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{Genre, ItemDetail, TmdbListItem};

    fn item(json: serde_json::Value) -> CatalogItem {
        serde_json::from_value::<TmdbListItem>(json)
            .expect("valid")
            .into_item(MediaType::Movie)
            .expect("kept")
    }

    fn genres() -> GenreTable {
        GenreTable::from_lists(
            vec![Genre {
                id: 28,
                name: String::from("Action"),
            }],
            vec![Genre {
                id: 18,
                name: String::from("Drama"),
            }],
        )
    }

    fn pages(strip: &[PageButton]) -> Vec<u32> {
        strip
            .iter()
            .filter_map(|b| match b {
                PageButton::Page { number, .. } => Some(*number),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn runtime_is_formatted_as_clock() {
        assert_eq!(format_runtime(Some(139)), "02:19:00");
        assert_eq!(format_runtime(Some(45)), "00:45:00");
        assert_eq!(format_runtime(None), "N/A");
        assert_eq!(format_runtime(Some(0)), "N/A");
    }

    #[test]
    fn labels_fall_back_to_not_available() {
        assert_eq!(rating_label(Some(8.44)), "★ 8.4");
        assert_eq!(rating_label(None), "★ N/A");
        assert_eq!(season_label(Some(3)), "Season 3");
        assert_eq!(season_label(None), "Season N/A");
        assert_eq!(release_year(Some("1999-10-15")).as_deref(), Some("1999"));
        assert_eq!(release_year(Some("")), None);
        assert_eq!(release_year(None), None);
    }

    #[test]
    fn item_without_details_renders_placeholders() {
        let enriched = EnrichedItem {
            item: item(serde_json::json!({"id": 5, "title": "Bare", "genre_ids": [28]})),
            details: None,
        };
        let fragment = render_item(&enriched, Layout::NewMovieTile, &genres());

        assert_eq!(fragment.meta_line, "N/A");
        assert_eq!(fragment.rating, "★ N/A");
        assert_eq!(fragment.year, "Unknown");
        assert_eq!(fragment.image_url, None);
        assert_eq!(fragment.genre_chips, vec!["Action"]);
        assert_eq!(fragment.badges, vec!["HD"]);
    }

    #[test]
    fn series_meta_depends_on_layout() {
        let enriched = EnrichedItem {
            item: item(serde_json::json!({"id": 9, "name": "Show", "media_type": "tv", "genre_ids": [18], "poster_path": "/p.jpg", "backdrop_path": "/b.jpg"})),
            details: Some(ItemDetail {
                number_of_seasons: Some(4),
                episode_runtimes: vec![42],
                ..Default::default()
            }),
        };
        let genres = genres();

        assert_eq!(render_item(&enriched, Layout::TrendingTile, &genres).meta_line, "Season 4");
        assert_eq!(render_item(&enriched, Layout::NewSeriesTile, &genres).meta_line, "Season 4");
        assert_eq!(render_item(&enriched, Layout::Hero, &genres).meta_line, "00:42:00");

        let banner = render_item(&enriched, Layout::RecommendedBanner, &genres);
        assert_eq!(banner.image_url.as_deref(), Some("https://image.tmdb.org/t/p/w1280/b.jpg"));
        let tile = render_item(&enriched, Layout::Similar, &genres);
        assert_eq!(tile.image_url.as_deref(), Some("https://image.tmdb.org/t/p/w500/p.jpg"));
    }

    #[test]
    fn suggestions_show_type_and_year() {
        let items: Vec<_> = (1..=10)
            .map(|id| item(serde_json::json!({"id": id, "name": "Dark", "media_type": "tv", "first_air_date": "2017-12-01"})))
            .collect();
        let fragments = render_suggestions(&items);
        assert_eq!(fragments.len(), 8);
        assert_eq!(fragments[0].meta, "Series • 2017");
    }

    #[test]
    fn episode_fragment_uses_still_size() {
        let fragment = render_episode(&Episode {
            episode_number: 3,
            name: String::from("Pilot"),
            overview: String::new(),
            air_date: None,
            still_path: Some(String::from("/s.jpg")),
            runtime: Some(58),
        });
        assert_eq!(fragment.label, "Episode 3");
        assert_eq!(fragment.runtime, "00:58:00");
        assert_eq!(fragment.air_date, "N/A");
        assert_eq!(fragment.still_url.as_deref(), Some("https://image.tmdb.org/t/p/w300/s.jpg"));
    }

    #[test]
    fn pagination_strip_shows_five_pages_around_current() {
        assert_eq!(pages(&pagination_strip(1, 10)), vec![1, 2, 3, 4, 5]);
        assert_eq!(pages(&pagination_strip(6, 10)), vec![4, 5, 6, 7, 8]);
        assert_eq!(pages(&pagination_strip(10, 10)), vec![6, 7, 8, 9, 10]);
        assert_eq!(pages(&pagination_strip(2, 3)), vec![1, 2, 3]);

        let strip = pagination_strip(1, 3);
        assert_eq!(strip.first(), Some(&PageButton::Previous { target: None }));
        assert_eq!(strip.last(), Some(&PageButton::Next { target: Some(2) }));
        assert!(strip.contains(&PageButton::Page { number: 1, active: true }));
    }
}
