mod aggregation;
mod cards;
mod components;
mod controller;
mod detail;
mod error;
mod handlers;
mod home;
mod media;
mod navigation;
mod reference;
mod render;
mod settings;
mod storage;
mod tmdb;
mod view_all;

use std::sync::Arc;

use iced::widget::{column, container, scrollable};
use iced::{Element, Font, Length, Size, Task, Theme};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use controller::{DetailState, HomeState, Modal, RequestSequence, SearchDebouncer, ViewAllState};
use media::{CatalogItem, ImageCache, Message, BACKGROUND_BLACK};
use navigation::Route;
use reference::{ReferenceData, ReferenceDataCache};
use settings::{AppSettings, SetupPage};
use storage::Storage;
use tmdb::TmdbClient;

pub struct Movieverse {
    pub setup_page: Option<SetupPage>,
    pub settings: AppSettings,
    pub tmdb_client: Option<TmdbClient>,
    pub reference_cache: ReferenceDataCache,
    pub reference: Arc<ReferenceData>,
    pub storage: Option<Storage>,
    pub route: Route,
    pub history: Vec<Route>,
    pub search_query: String,
    pub search_debouncer: SearchDebouncer,
    pub suggestion_sequence: RequestSequence,
    pub suggestions: Vec<CatalogItem>,
    pub suggestions_open: bool,
    pub modal: Option<Modal>,
    pub home: HomeState,
    pub view_all: Option<ViewAllState>,
    pub detail: Option<DetailState>,
    pub detail_sequence: RequestSequence,
    pub image_cache: ImageCache,
    pub error_message: Option<String>,
}

impl Default for Movieverse {
    fn default() -> Self {
        Self {
            setup_page: None,
            settings: AppSettings::default(),
            tmdb_client: None,
            reference_cache: ReferenceDataCache::default(),
            reference: Arc::new(ReferenceData::default()),
            storage: None,
            route: Route::Home,
            history: Vec::new(),
            search_query: String::new(),
            search_debouncer: SearchDebouncer::default(),
            suggestion_sequence: RequestSequence::default(),
            suggestions: Vec::new(),
            suggestions_open: false,
            modal: None,
            home: HomeState::default(),
            view_all: None,
            detail: None,
            detail_sequence: RequestSequence::default(),
            image_cache: ImageCache::new(),
            error_message: None,
        }
    }
}

impl Movieverse {
    fn new() -> (Self, Task<Message>) {
        let initial_route = std::env::args()
            .nth(1)
            .and_then(|location| {
                let route = Route::parse(&location);
                if route.is_none() {
                    warn!(location, "unrecognised start location, opening home");
                }
                route
            })
            .unwrap_or(Route::Home);

        let settings = AppSettings::load();
        if !settings.is_valid() {
            info!("no API key configured, showing setup");
            return (
                Self {
                    setup_page: Some(SetupPage::new(settings.clone())),
                    settings,
                    route: initial_route,
                    ..Default::default()
                },
                Task::none(),
            );
        }

        let mut app = Self {
            route: initial_route,
            ..Default::default()
        };
        let task = app.initialize_with_settings(settings);
        (app, task)
    }

    fn initialize_with_settings(&mut self, settings: AppSettings) -> Task<Message> {
        let client = TmdbClient::from_settings(&settings);
        self.tmdb_client = Some(client.clone());
        self.settings = settings;
        self.setup_page = None;

        self.storage = match Storage::open_default() {
            Ok(storage) => Some(storage),
            Err(e) => {
                warn!(error = %e, "local storage unavailable, comments and preferences will not persist");
                None
            }
        };
        if let Some(storage) = &self.storage {
            self.home = HomeState::new(storage::load_facet_preferences(storage));
        }

        if let Some(data) = self.reference_cache.get() {
            self.reference = data;
        }
        let cache = self.reference_cache.clone();
        let load_reference = Task::perform(
            async move { cache.load(&client).await },
            Message::ReferenceLoaded,
        );
        let route = self.route.clone();
        Task::batch([load_reference, handlers::enter_route(self, route)])
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        if let Message::Setup(setup_msg) = message {
            if let Some(ref mut setup) = self.setup_page {
                if let Some(settings) = setup.update(setup_msg) {
                    return self.initialize_with_settings(settings);
                }
            }
            return Task::none();
        }
        handlers::handle_message(self, message)
    }

    fn view(&self) -> Element<'_, Message> {
        if let Some(ref setup) = self.setup_page {
            return setup.view().map(Message::Setup);
        }

        let page: Element<'_, Message> = match &self.route {
            Route::Home => self.view_home(),
            Route::ViewAll { .. } => self.view_view_all(),
            Route::Detail(_) => self.view_detail(),
        };

        let body = scrollable(column![page, self.view_footer()].width(Length::Fill))
            .direction(scrollable::Direction::Vertical(
                scrollable::Scrollbar::new().width(0).scroller_width(0),
            ))
            .width(Length::Fill)
            .height(Length::Fill)
            .style(components::hidden_vertical_scrollbar_style);

        let main_content = container(column![self.view_header(), body])
            .width(Length::Fill)
            .height(Length::Fill)
            .style(|_theme| container::Style {
                background: Some(iced::Background::Color(BACKGROUND_BLACK)),
                ..Default::default()
            });

        if let Some(modal) = self.modal {
            return iced::widget::stack![main_content, self.view_modal(modal)]
                .width(Length::Fill)
                .height(Length::Fill)
                .into();
        }

        if self.suggestions_open {
            return iced::widget::stack![main_content, self.view_suggestions()]
                .width(Length::Fill)
                .height(Length::Fill)
                .into();
        }

        main_content.into()
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("movieverse=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> iced::Result {
    init_tracing();

    iced::application(Movieverse::new, Movieverse::update, Movieverse::view)
        .title("Movieverse")
        .theme(Movieverse::theme)
        .window_size(Size::new(1280.0, 720.0))
        .font(iced_fonts::BOOTSTRAP_FONT_BYTES)
        .default_font(Font::DEFAULT)
        .run()
}
