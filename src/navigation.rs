use url::form_urlencoded;

use crate::media::{Category, FacetSelection, ItemKey, MediaType};

/// One view of the single application window. Locations use the
/// `view?key=value` form so a route can be passed on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    ViewAll {
        category: Category,
        page: u32,
        genre: Option<u64>,
        country: Option<String>,
    },
    Detail(ItemKey),
}

impl Route {
    pub fn view_all(category: Category) -> Self {
        Route::ViewAll {
            category,
            page: 1,
            genre: None,
            country: None,
        }
    }

    pub fn view_all_with(category: Category, facets: &FacetSelection) -> Self {
        Route::ViewAll {
            category,
            page: 1,
            genre: facets.genre_id(),
            country: facets.country_code().map(String::from),
        }
    }

    pub fn to_location(&self) -> String {
        match self {
            Route::Home => String::from("index"),
            Route::ViewAll {
                category,
                page,
                genre,
                country,
            } => {
                let mut query = form_urlencoded::Serializer::new(String::new());
                query.append_pair("category", category.slug());
                if let Category::Search(q) = category {
                    query.append_pair("query", q);
                }
                query.append_pair("page", &page.to_string());
                if let Some(genre) = genre {
                    query.append_pair("genre", &genre.to_string());
                }
                if let Some(country) = country {
                    query.append_pair("country", country);
                }
                format!("view-all?{}", query.finish())
            }
            Route::Detail(key) => format!("detail?id={}&type={}", key.id, key.media_type.path()),
        }
    }

    pub fn parse(location: &str) -> Option<Route> {
        let location = location.trim().trim_start_matches('/');
        let (view, query) = location.split_once('?').unwrap_or((location, ""));
        let param = |name: &str| {
            form_urlencoded::parse(query.as_bytes())
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.into_owned())
        };

        match view.trim_end_matches(".html") {
            "" | "index" => Some(Route::Home),
            "view-all" => Some(Route::ViewAll {
                category: Category::from_slug(
                    param("category").as_deref().unwrap_or_default(),
                    param("query").as_deref(),
                ),
                page: param("page")
                    .and_then(|p| p.parse().ok())
                    .filter(|p| *p > 0)
                    .unwrap_or(1),
                genre: param("genre").and_then(|g| g.parse().ok()),
                country: param("country").filter(|c| !c.is_empty()),
            }),
            "detail" => {
                let id = param("id")?.parse().ok()?;
                let media_type = MediaType::from_wire(&param("type")?)?;
                Some(Route::Detail(ItemKey::new(id, media_type)))
            }
            _ => None,
        }
    }

    /// Facets a view-all route starts with. Genre wins if both are present.
    pub fn initial_facets(&self) -> FacetSelection {
        match self {
            Route::ViewAll { genre, country, .. } => FacetSelection::default()
                .with_country(country.clone())
                .with_genre(*genre),
            _ => FacetSelection::default(),
        }
    }
}
