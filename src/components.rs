use iced::widget::{
    button, column, container, row, scrollable, text, text_input, Column, Row, Space,
};
use iced::{Border, Color, Element, Length, Padding, Shadow};

use crate::controller::Modal;
use crate::handlers;
use crate::media::{
    Category, MediaTypeFilter, Message, ACCENT_BLUE, BACKGROUND_BLACK, SURFACE_DARK_GRAY,
    TEXT_GRAY, TEXT_WHITE,
};
use crate::navigation::Route;
use crate::render::{self, PageButton};
use crate::Movieverse;

const ICON_SEARCH: char = '\u{F52A}';
const ICON_CHEVRON_LEFT: char = '\u{F284}';
const ICON_CHEVRON_RIGHT: char = '\u{F285}';
const ICON_FILM: char = '\u{F3A9}';
const ICON_X_LG: char = '\u{F659}';

const HEADER_HEIGHT: f32 = 80.0;
const SUGGESTION_WIDTH: f32 = 360.0;
const MODAL_WIDTH: f32 = 420.0;

pub fn icon(icon_char: char) -> iced::widget::Text<'static> {
    text(icon_char.to_string()).font(iced::Font {
        family: iced::font::Family::Name("bootstrap-icons"),
        ..Default::default()
    })
}

pub fn bold(
    content: impl ToString,
    size: impl Into<iced::Pixels>,
    color: Color,
) -> iced::widget::Text<'static> {
    text(content.to_string())
        .size(size)
        .color(color)
        .font(iced::Font {
            weight: iced::font::Weight::Bold,
            ..Default::default()
        })
}

pub fn hidden_vertical_scrollbar_style(
    _theme: &iced::Theme,
    _status: scrollable::Status,
) -> scrollable::Style {
    let hidden_rail = || scrollable::Rail {
        background: None,
        border: Border::default(),
        scroller: scrollable::Scroller {
            background: iced::Background::Color(Color::TRANSPARENT),
            border: Border::default(),
        },
    };
    scrollable::Style {
        container: container::Style::default(),
        vertical_rail: hidden_rail(),
        horizontal_rail: hidden_rail(),
        gap: None,
        auto_scroll: scrollable::AutoScroll {
            background: iced::Background::Color(Color::TRANSPARENT),
            border: Border::default(),
            shadow: Shadow::default(),
            icon: Color::TRANSPARENT,
        },
    }
}

pub fn skeleton_style(radius: f32) -> impl Fn(&iced::Theme) -> container::Style {
    move |_theme| container::Style {
        background: Some(iced::Background::Color(Color::from_rgba(
            0.2, 0.2, 0.2, 0.5,
        ))),
        border: Border {
            radius: radius.into(),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Rounded pill used for type filters, seasons and page numbers.
pub fn pill_style(active: bool) -> impl Fn(&iced::Theme, button::Status) -> button::Style {
    move |_theme, status| {
        let background = match (active, status) {
            (true, _) => ACCENT_BLUE,
            (false, button::Status::Hovered) => Color::from_rgba(1.0, 1.0, 1.0, 0.15),
            (false, button::Status::Disabled) => Color::from_rgba(1.0, 1.0, 1.0, 0.03),
            (false, _) => SURFACE_DARK_GRAY,
        };
        let text_color = match status {
            button::Status::Disabled => Color::from_rgba(1.0, 1.0, 1.0, 0.3),
            _ => TEXT_WHITE,
        };
        button::Style {
            background: Some(iced::Background::Color(background)),
            text_color,
            border: Border {
                color: Color::TRANSPARENT,
                width: 0.0,
                radius: 16.0.into(),
            },
            shadow: Shadow::default(),
            snap: false,
        }
    }
}

pub fn link_style(_theme: &iced::Theme, status: button::Status) -> button::Style {
    let text_color = match status {
        button::Status::Hovered => TEXT_WHITE,
        _ => TEXT_GRAY,
    };
    button::Style {
        background: Some(iced::Background::Color(Color::TRANSPARENT)),
        text_color,
        border: Border::default(),
        shadow: Shadow::default(),
        snap: false,
    }
}

pub fn section_title(title: impl ToString) -> Element<'static, Message> {
    bold(title, 24, TEXT_WHITE).into()
}

/// All / Movies / Series / Animation switch.
pub fn view_type_buttons(
    selected: MediaTypeFilter,
    on_select: fn(MediaTypeFilter) -> Message,
) -> Element<'static, Message> {
    let buttons: Vec<Element<Message>> = MediaTypeFilter::ALL
        .into_iter()
        .map(|filter| {
            button(text(filter.to_string()).size(14))
                .padding(Padding::new(6.0).left(16.0).right(16.0))
                .style(pill_style(filter == selected))
                .on_press(on_select(filter))
                .into()
        })
        .collect();

    Row::with_children(buttons)
        .spacing(8)
        .align_y(iced::Alignment::Center)
        .into()
}

pub fn view_pagination(current: u32, total: u32) -> Element<'static, Message> {
    let buttons: Vec<Element<Message>> = render::pagination_strip(current, total)
        .into_iter()
        .map(|page_button| match page_button {
            PageButton::Previous { target } => button(icon(ICON_CHEVRON_LEFT).size(14))
                .padding(Padding::new(8.0).left(12.0).right(12.0))
                .style(pill_style(false))
                .on_press_maybe(target.map(Message::GoToPage))
                .into(),
            PageButton::Page { number, active } => button(text(number.to_string()).size(14))
                .padding(Padding::new(8.0).left(14.0).right(14.0))
                .style(pill_style(active))
                .on_press_maybe((!active).then_some(Message::GoToPage(number)))
                .into(),
            PageButton::Next { target } => button(icon(ICON_CHEVRON_RIGHT).size(14))
                .padding(Padding::new(8.0).left(12.0).right(12.0))
                .style(pill_style(false))
                .on_press_maybe(target.map(Message::GoToPage))
                .into(),
        })
        .collect();

    container(
        Row::with_children(buttons)
            .spacing(8)
            .align_y(iced::Alignment::Center),
    )
    .width(Length::Fill)
    .center_x(Length::Fill)
    .into()
}

pub fn view_empty_state(message: &str) -> Element<'static, Message> {
    container(
        column![
            icon(ICON_FILM).size(48).color(TEXT_GRAY),
            text(message.to_string()).size(18).color(TEXT_GRAY)
        ]
        .spacing(16)
        .align_x(iced::Alignment::Center),
    )
    .width(Length::Fill)
    .height(Length::Fixed(300.0))
    .center_x(Length::Fill)
    .center_y(Length::Fill)
    .into()
}

pub fn view_error_state(message: &str) -> Element<'static, Message> {
    let retry_button = button(text("Retry").size(16).color(TEXT_WHITE))
        .padding(Padding::new(12.0).left(24.0).right(24.0))
        .style(pill_style(true))
        .on_press(Message::RetryLoad);

    container(
        column![
            text(message.to_string()).size(18).color(TEXT_GRAY),
            retry_button
        ]
        .spacing(16)
        .align_x(iced::Alignment::Center),
    )
    .width(Length::Fill)
    .height(Length::Fixed(300.0))
    .center_x(Length::Fill)
    .center_y(Length::Fill)
    .into()
}

/// Placeholder rows shown while a grid is loading.
pub fn view_skeleton_grid(rows: usize, columns: usize, w: f32, h: f32) -> Element<'static, Message> {
    let rows: Vec<Element<Message>> = (0..rows)
        .map(|_| {
            let cards: Vec<Element<Message>> = (0..columns)
                .map(|_| {
                    container(Space::new().width(w).height(h))
                        .style(skeleton_style(8.0))
                        .into()
                })
                .collect();
            Row::with_children(cards).spacing(16).into()
        })
        .collect();

    Column::with_children(rows).spacing(16).into()
}

impl Movieverse {
    pub fn view_header(&self) -> Element<'_, Message> {
        let left_section = row![self.view_logo(), self.view_navigation()]
            .spacing(32)
            .align_y(iced::Alignment::Center);

        let right_section = row![self.view_facet_buttons(), self.view_search_bar()]
            .spacing(16)
            .align_y(iced::Alignment::Center);

        let header_content = row![
            left_section,
            Space::new().width(Length::Fill),
            right_section
        ]
        .padding(Padding::new(16.0).left(48.0).right(48.0))
        .align_y(iced::Alignment::Center);

        container(header_content)
            .width(Length::Fill)
            .height(Length::Fixed(HEADER_HEIGHT))
            .style(|_theme| container::Style {
                background: Some(iced::Background::Color(Color::from_rgba(
                    0.0, 0.0, 0.0, 0.5,
                ))),
                ..Default::default()
            })
            .into()
    }

    fn view_logo(&self) -> Element<'_, Message> {
        let mut logo = row![].spacing(16).align_y(iced::Alignment::Center);
        if !self.history.is_empty() {
            logo = logo.push(
                button(icon(ICON_CHEVRON_LEFT).size(18))
                    .padding(Padding::new(6.0))
                    .style(link_style)
                    .on_press(Message::Back),
            );
        }
        logo.push(
            button(bold("MOVIEVERSE", 26, ACCENT_BLUE))
                .padding(0)
                .style(link_style)
                .on_press(Message::Navigate(Route::Home)),
        )
        .into()
    }

    fn view_navigation(&self) -> Element<'_, Message> {
        let nav_items = [
            ("Home", Route::Home),
            ("Trending", Route::view_all(Category::Trending)),
            ("New Movies", Route::view_all(Category::NewMovies)),
            ("New Series", Route::view_all(Category::NewSeries)),
            ("Recommended", Route::view_all(Category::Recommended)),
        ];

        let nav_buttons: Vec<Element<Message>> = nav_items
            .into_iter()
            .map(|(label, route)| self.view_nav_button(label, route))
            .collect();

        Row::with_children(nav_buttons)
            .spacing(8)
            .align_y(iced::Alignment::Center)
            .into()
    }

    fn is_active_nav(&self, target: &Route) -> bool {
        match (&self.route, target) {
            (Route::Home, Route::Home) => true,
            (
                Route::ViewAll { category, .. },
                Route::ViewAll {
                    category: other, ..
                },
            ) => category == other,
            _ => false,
        }
    }

    fn view_nav_button(&self, label: &'static str, route: Route) -> Element<'_, Message> {
        let is_active = self.is_active_nav(&route);

        let label_text = text(label).size(14).shaping(text::Shaping::Advanced);
        let button_content: Element<Message> = if is_active {
            let underline = container(Space::new().width(Length::Fill).height(2)).style(|_theme| {
                container::Style {
                    background: Some(iced::Background::Color(ACCENT_BLUE)),
                    ..Default::default()
                }
            });
            column![label_text, underline]
                .spacing(4)
                .align_x(iced::Alignment::Center)
                .into()
        } else {
            label_text.into()
        };

        button(button_content)
            .padding(Padding::new(8.0).left(12.0).right(12.0))
            .style(move |theme, status| {
                let mut style = link_style(theme, status);
                if is_active {
                    style.text_color = TEXT_WHITE;
                }
                style
            })
            .on_press(Message::Navigate(route))
            .into()
    }

    fn view_facet_buttons(&self) -> Element<'_, Message> {
        let facets = handlers::active_facets(self);
        let genre_label = facets
            .genre_id()
            .and_then(|id| self.reference.genres.picker_name(id))
            .unwrap_or("Genre")
            .to_string();
        let country_label = facets
            .country_code()
            .map(|code| self.reference.countries.name(code).to_string())
            .unwrap_or_else(|| String::from("Country"));

        row![
            button(text(genre_label).size(14))
                .padding(Padding::new(6.0).left(14.0).right(14.0))
                .style(pill_style(facets.genre_id().is_some()))
                .on_press(Message::OpenModal(Modal::Genre)),
            button(text(country_label).size(14))
                .padding(Padding::new(6.0).left(14.0).right(14.0))
                .style(pill_style(facets.country_code().is_some()))
                .on_press(Message::OpenModal(Modal::Country)),
        ]
        .spacing(8)
        .into()
    }

    fn view_search_bar(&self) -> Element<'_, Message> {
        let search_icon = icon(ICON_SEARCH).size(14).color(TEXT_GRAY);

        let search_input = text_input("Search movies and series...", &self.search_query)
            .on_input(Message::SearchQueryChanged)
            .on_submit(Message::SearchSubmit)
            .padding(8)
            .width(Length::Fixed(220.0))
            .style(|_theme, _status| text_input::Style {
                background: iced::Background::Color(Color::TRANSPARENT),
                border: Border::default(),
                icon: TEXT_GRAY,
                placeholder: TEXT_GRAY,
                value: TEXT_WHITE,
                selection: ACCENT_BLUE,
            });

        container(
            row![search_icon, search_input]
                .spacing(8)
                .align_y(iced::Alignment::Center),
        )
        .padding(Padding::new(4.0).left(12.0).right(8.0))
        .style(|_theme| container::Style {
            background: Some(iced::Background::Color(Color::from_rgba(
                0.0, 0.0, 0.0, 0.7,
            ))),
            border: Border {
                color: TEXT_GRAY,
                width: 1.0,
                radius: 24.0.into(),
            },
            ..Default::default()
        })
        .into()
    }

    pub fn view_suggestions(&self) -> Element<'_, Message> {
        let fragments = render::render_suggestions(&self.suggestions);

        let entries: Vec<Element<Message>> = if fragments.is_empty() {
            vec![container(text("No results").size(14).color(TEXT_GRAY))
                .padding(16)
                .into()]
        } else {
            fragments
                .into_iter()
                .map(|fragment| {
                    let thumbnail = self.view_cached_image(fragment.poster_url.as_deref(), 40.0, 60.0);
                    let labels = column![
                        text(fragment.title).size(14).color(TEXT_WHITE),
                        text(fragment.meta).size(12).color(TEXT_GRAY)
                    ]
                    .spacing(4);
                    button(
                        row![thumbnail, labels]
                            .spacing(12)
                            .align_y(iced::Alignment::Center),
                    )
                    .padding(Padding::new(8.0).left(12.0).right(12.0))
                    .width(Length::Fill)
                    .style(|_theme, status| {
                        let background_color = match status {
                            button::Status::Hovered => Color::from_rgba(1.0, 1.0, 1.0, 0.1),
                            _ => Color::TRANSPARENT,
                        };
                        button::Style {
                            background: Some(iced::Background::Color(background_color)),
                            text_color: TEXT_WHITE,
                            border: Border::default(),
                            shadow: Shadow::default(),
                            snap: false,
                        }
                    })
                    .on_press(Message::SelectSuggestion(fragment.key))
                    .into()
                })
                .collect()
        };

        let dropdown = container(
            scrollable(Column::with_children(entries))
                .height(Length::Shrink)
                .style(hidden_vertical_scrollbar_style),
        )
        .width(Length::Fixed(SUGGESTION_WIDTH))
        .max_height(480.0)
        .style(|_theme| container::Style {
            background: Some(iced::Background::Color(SURFACE_DARK_GRAY)),
            border: Border {
                color: Color::TRANSPARENT,
                width: 0.0,
                radius: 8.0.into(),
            },
            shadow: Shadow {
                color: Color::from_rgba(0.0, 0.0, 0.0, 0.5),
                offset: iced::Vector::new(0.0, 4.0),
                blur_radius: 8.0,
            },
            ..Default::default()
        });

        let dismiss_layer = iced::widget::mouse_area(
            container(Space::new().width(Length::Fill).height(Length::Fill))
                .width(Length::Fill)
                .height(Length::Fill),
        )
        .on_press(Message::CloseSuggestions);

        let positioned = container(iced::widget::mouse_area(dropdown))
            .width(Length::Fill)
            .align_x(iced::alignment::Horizontal::Right)
            .padding(Padding::new(0.0).top(HEADER_HEIGHT).right(48.0));

        iced::widget::stack![dismiss_layer, positioned]
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    pub fn view_modal(&self, modal: Modal) -> Element<'_, Message> {
        let facets = handlers::active_facets(self);

        let (title, clear, options): (&str, Message, Vec<(String, Message, bool)>) = match modal {
            Modal::Genre => (
                "Choose a genre",
                Message::SelectGenre(None),
                self.reference
                    .genres
                    .picker()
                    .iter()
                    .map(|genre| {
                        (
                            genre.name.clone(),
                            Message::SelectGenre(Some(genre.id)),
                            facets.genre_id() == Some(genre.id),
                        )
                    })
                    .collect(),
            ),
            Modal::Country => (
                "Choose a country",
                Message::SelectCountry(None),
                self.reference
                    .countries
                    .picker()
                    .iter()
                    .map(|country| {
                        (
                            country.name.clone(),
                            Message::SelectCountry(Some(country.code.clone())),
                            facets.country_code() == Some(country.code.as_str()),
                        )
                    })
                    .collect(),
            ),
        };

        let close_button = button(icon(ICON_X_LG).size(16))
            .padding(Padding::new(6.0))
            .style(link_style)
            .on_press(Message::CloseModal);

        let modal_header = row![
            bold(title, 20, TEXT_WHITE),
            Space::new().width(Length::Fill),
            close_button
        ]
        .align_y(iced::Alignment::Center);

        let option_list: Element<Message> = if options.is_empty() {
            text("Nothing to choose from yet").size(14).color(TEXT_GRAY).into()
        } else {
            let chips: Vec<Element<Message>> = std::iter::once::<Element<Message>>(
                button(text("None").size(14))
                    .padding(Padding::new(6.0).left(14.0).right(14.0))
                    .style(pill_style(false))
                    .on_press(clear)
                    .into(),
            )
            .chain(options.into_iter().map(|(label, message, active)| {
                button(text(label).size(14))
                    .padding(Padding::new(6.0).left(14.0).right(14.0))
                    .style(pill_style(active))
                    .on_press(message)
                    .into()
            }))
            .collect();

            scrollable(Row::with_children(chips).spacing(8).wrap())
                .height(Length::Fixed(360.0))
                .style(hidden_vertical_scrollbar_style)
                .into()
        };

        let panel = container(column![modal_header, option_list].spacing(20))
            .width(Length::Fixed(MODAL_WIDTH))
            .padding(24)
            .style(|_theme| container::Style {
                background: Some(iced::Background::Color(SURFACE_DARK_GRAY)),
                border: Border {
                    color: Color::TRANSPARENT,
                    width: 0.0,
                    radius: 12.0.into(),
                },
                ..Default::default()
            });

        let overlay_bg = iced::widget::mouse_area(
            container(Space::new().width(Length::Fill).height(Length::Fill))
                .width(Length::Fill)
                .height(Length::Fill)
                .style(|_theme| container::Style {
                    background: Some(iced::Background::Color(Color::from_rgba(
                        0.0, 0.0, 0.0, 0.75,
                    ))),
                    ..Default::default()
                }),
        )
        .on_press(Message::CloseModal);

        let centered_panel = container(iced::widget::mouse_area(panel))
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .center_y(Length::Fill);

        iced::widget::stack![overlay_bg, centered_panel]
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    pub fn view_footer(&self) -> Element<'_, Message> {
        let links = row![
            button(text("Home").size(13))
                .style(link_style)
                .on_press(Message::Navigate(Route::Home)),
            button(text("Trending").size(13))
                .style(link_style)
                .on_press(Message::Navigate(Route::view_all(Category::Trending))),
            button(text("Recommended").size(13))
                .style(link_style)
                .on_press(Message::Navigate(Route::view_all(Category::Recommended))),
        ]
        .spacing(8);

        container(
            column![
                bold("MOVIEVERSE", 18, ACCENT_BLUE),
                links,
                text("Movie and series data provided by TMDB.")
                    .size(12)
                    .color(TEXT_GRAY)
            ]
            .spacing(12),
        )
        .width(Length::Fill)
        .padding(Padding::new(32.0).left(48.0).right(48.0))
        .style(|_theme| container::Style {
            background: Some(iced::Background::Color(BACKGROUND_BLACK)),
            border: Border {
                color: SURFACE_DARK_GRAY,
                width: 1.0,
                radius: 0.0.into(),
            },
            ..Default::default()
        })
        .into()
    }
}
