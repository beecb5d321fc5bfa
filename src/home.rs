use iced::widget::{button, column, container, row, text, Column, Row, Space};
use iced::{Border, Color, Element, Length, Padding, Shadow};

use crate::components::{
    bold, icon, link_style, pill_style, section_title, view_skeleton_grid, view_type_buttons,
};
use crate::controller::{HeroCarousel, HomeSection};
use crate::handlers;
use crate::media::{
    truncate_description, Message, ACCENT_BLUE, STAR_YELLOW, SURFACE_DARK_GRAY, TEXT_GRAY,
    TEXT_WHITE,
};
use crate::navigation::Route;
use crate::render::{self, DisplayFragment, Layout};
use crate::Movieverse;

const HERO_HEIGHT: f32 = 560.0;
const RECENT_CARD_WIDTH: f32 = 150.0;
const RECENT_CARD_HEIGHT: f32 = 225.0;
const ICON_CHEVRON_LEFT: char = '\u{F284}';
const ICON_CHEVRON_RIGHT: char = '\u{F285}';
const ICON_PLAY_FILL: char = '\u{F4F4}';
const ICON_INFO_CIRCLE: char = '\u{F431}';

fn arrow_button(ic: char, message: Option<Message>) -> Element<'static, Message> {
    button(icon(ic).size(16))
        .width(Length::Fixed(36.0))
        .height(Length::Fixed(36.0))
        .padding(Padding::new(10.0))
        .style(pill_style(false))
        .on_press_maybe(message)
        .into()
}

fn view_hero_dots(hero: &HeroCarousel) -> Element<'static, Message> {
    let active = hero.index();
    let dots: Vec<Element<Message>> = (0..hero.slides().len())
        .map(|index| {
            let is_active = index == active;
            button(Space::new().width(if is_active { 24.0 } else { 10.0 }).height(10.0))
                .padding(0)
                .style(move |_theme, _status| button::Style {
                    background: Some(iced::Background::Color(if is_active {
                        TEXT_WHITE
                    } else {
                        Color::from_rgba(1.0, 1.0, 1.0, 0.4)
                    })),
                    text_color: TEXT_WHITE,
                    border: Border {
                        radius: 5.0.into(),
                        ..Default::default()
                    },
                    shadow: Shadow::default(),
                    snap: false,
                })
                .on_press(Message::SelectHero(index))
                .into()
        })
        .collect();

    Row::with_children(dots).spacing(8).into()
}

impl Movieverse {
    pub fn view_home(&self) -> Element<'_, Message> {
        let mut sections: Vec<Element<Message>> = HomeSection::ALL
            .into_iter()
            .map(|section| self.view_home_section(section))
            .collect();
        sections.insert(2, self.view_recent_row());

        column![
            self.view_hero(self.home.hero()),
            Column::with_children(sections)
                .spacing(48)
                .padding(Padding::new(32.0).left(48.0).right(48.0))
        ]
        .width(Length::Fill)
        .into()
    }

    pub fn view_hero<'a>(&'a self, hero: &'a HeroCarousel) -> Element<'a, Message> {
        let Some(slide) = hero.current() else {
            return container(text("Loading featured titles...").size(18).color(TEXT_GRAY))
                .width(Length::Fill)
                .center_x(Length::Fill)
                .center_y(Length::Fixed(HERO_HEIGHT))
                .height(Length::Fixed(HERO_HEIGHT))
                .style(|_theme| container::Style {
                    background: Some(iced::Background::Color(SURFACE_DARK_GRAY)),
                    ..Default::default()
                })
                .into();
        };
        let fragment = render::render_item(slide, Layout::Hero, &self.reference.genres);

        let backdrop: Element<Message> = match fragment
            .image_url
            .as_deref()
            .and_then(|url| self.image_cache.get(url))
        {
            Some(handle) => iced::widget::image(handle.clone())
                .width(Length::Fill)
                .height(Length::Fixed(HERO_HEIGHT))
                .content_fit(iced::ContentFit::Cover)
                .into(),
            None => container(Space::new().width(Length::Fill).height(Length::Fill))
                .width(Length::Fill)
                .height(Length::Fixed(HERO_HEIGHT))
                .style(|_theme| container::Style {
                    background: Some(iced::Background::Color(SURFACE_DARK_GRAY)),
                    ..Default::default()
                })
                .into(),
        };

        let hero_left_gradient = container(self.view_hero_text(fragment))
            .width(Length::Fill)
            .height(Length::Fill)
            .align_y(iced::alignment::Vertical::Center)
            .style(|_theme| container::Style {
                background: Some(iced::Background::Gradient(iced::Gradient::Linear(
                    iced::gradient::Linear::new(0.0)
                        .add_stop(0.0, Color::from_rgba(0.0, 0.0, 0.0, 0.95))
                        .add_stop(0.4, Color::from_rgba(0.0, 0.0, 0.0, 0.7))
                        .add_stop(0.7, Color::from_rgba(0.0, 0.0, 0.0, 0.2))
                        .add_stop(0.9, Color::TRANSPARENT),
                ))),
                ..Default::default()
            });

        let dots = container(view_hero_dots(hero))
            .width(Length::Fill)
            .height(Length::Fill)
            .align_x(iced::alignment::Horizontal::Center)
            .align_y(iced::alignment::Vertical::Bottom)
            .padding(Padding::new(24.0));

        let slide_area = iced::widget::mouse_area(
            iced::widget::stack![backdrop, hero_left_gradient]
                .width(Length::Fill)
                .height(Length::Fixed(HERO_HEIGHT)),
        )
        .on_press(Message::AdvanceHero);

        iced::widget::stack![slide_area, dots]
            .width(Length::Fill)
            .height(Length::Fixed(HERO_HEIGHT))
            .into()
    }

    fn view_hero_text(&self, fragment: DisplayFragment) -> Element<'_, Message> {
        let chips: Vec<Element<Message>> = fragment
            .genre_chips
            .iter()
            .map(|name| crate::cards::genre_chip(name))
            .collect();

        let metadata = row![
            Row::with_children(chips).spacing(6),
            text(fragment.year).size(14).color(TEXT_GRAY),
            text("•").size(14).color(TEXT_GRAY),
            text(fragment.meta_line).size(14).color(TEXT_GRAY),
            text(fragment.rating).size(14).color(STAR_YELLOW),
        ]
        .spacing(10)
        .align_y(iced::Alignment::Center);

        let overview = container(
            text(truncate_description(&fragment.overview, 200))
                .size(16)
                .color(TEXT_GRAY),
        )
        .max_width(520.0);

        let detail_route = Route::Detail(fragment.key);
        let buttons = row![
            button(
                row![icon(ICON_PLAY_FILL).size(16), text("Watch now").size(16)]
                    .spacing(8)
                    .align_y(iced::Alignment::Center)
            )
            .padding(Padding::new(12.0).left(24.0).right(24.0))
            .style(|_theme, status| {
                let background = match status {
                    button::Status::Hovered => Color::from_rgb(0.35, 0.62, 0.95),
                    _ => ACCENT_BLUE,
                };
                button::Style {
                    background: Some(iced::Background::Color(background)),
                    text_color: TEXT_WHITE,
                    border: Border {
                        radius: 4.0.into(),
                        ..Default::default()
                    },
                    shadow: Shadow::default(),
                    snap: false,
                }
            })
            .on_press(Message::Navigate(detail_route.clone())),
            button(
                row![icon(ICON_INFO_CIRCLE).size(16), text("More info").size(16)]
                    .spacing(8)
                    .align_y(iced::Alignment::Center)
            )
            .padding(Padding::new(12.0).left(24.0).right(24.0))
            .style(|_theme, _status| button::Style {
                background: Some(iced::Background::Color(Color::from_rgba(
                    0.43, 0.43, 0.43, 0.7,
                ))),
                text_color: TEXT_WHITE,
                border: Border {
                    radius: 4.0.into(),
                    ..Default::default()
                },
                shadow: Shadow::default(),
                snap: false,
            })
            .on_press(Message::Navigate(detail_route)),
        ]
        .spacing(12);

        column![bold(fragment.title, 48, TEXT_WHITE), metadata, overview, buttons]
            .spacing(20)
            .padding(Padding::new(64.0).left(64.0).right(64.0))
            .into()
    }

    fn view_section_header(&self, title: String, view_all: Route) -> Element<'_, Message> {
        row![
            section_title(title),
            Space::new().width(Length::Fill),
            button(text("View all").size(14))
                .style(link_style)
                .on_press(Message::Navigate(view_all)),
        ]
        .align_y(iced::Alignment::Center)
        .into()
    }

    fn view_home_section(&self, section: HomeSection) -> Element<'_, Message> {
        let facets = self.home.facets();
        let category = section.category();
        let mut header = self.view_section_header(
            category.title(),
            Route::view_all_with(category, facets),
        );
        if section == HomeSection::Recommended {
            header = column![
                header,
                view_type_buttons(facets.media_type_filter(), Message::SetHomeType)
            ]
            .spacing(16)
            .into();
        }

        let layout = handlers::home_layout(section);
        let cards_per_row = match layout {
            Layout::RecommendedBanner => 3,
            _ => section.display_limit(),
        };
        let body: Element<Message> = match self.home.section_items(section) {
            None => match layout {
                Layout::RecommendedBanner => view_skeleton_grid(1, 3, 380.0, 214.0),
                _ => view_skeleton_grid(1, cards_per_row, 180.0, 270.0),
            },
            Some(items) if items.is_empty() => text("No content found")
                .size(16)
                .color(TEXT_GRAY)
                .into(),
            Some(items) => self.view_card_grid(
                render::render_items(&items, layout, &self.reference.genres),
                cards_per_row,
            ),
        };

        column![header, body].spacing(20).into()
    }

    /// Now-playing strip paged five at a time.
    fn view_recent_row(&self) -> Element<'_, Message> {
        let cards: Vec<Element<Message>> = self
            .home
            .visible_recent()
            .iter()
            .map(|item| {
                let url = item
                    .poster_path()
                    .map(|p| crate::tmdb::image_url(p, crate::tmdb::ImageSize::Poster));
                let card = column![
                    self.view_cached_image(url.as_deref(), RECENT_CARD_WIDTH, RECENT_CARD_HEIGHT),
                    text(item.title().to_string())
                        .size(14)
                        .color(TEXT_WHITE)
                        .width(Length::Fixed(RECENT_CARD_WIDTH)),
                ]
                .spacing(8);
                iced::widget::mouse_area(card)
                    .on_press(Message::Navigate(Route::Detail(item.key())))
                    .interaction(iced::mouse::Interaction::Pointer)
                    .into()
            })
            .collect();

        let back = self
            .home
            .can_scroll_recent_back()
            .then_some(Message::RecentPrev);
        let forward = self
            .home
            .can_scroll_recent_forward()
            .then_some(Message::RecentNext);

        let header = row![
            section_title("Recently Updated"),
            Space::new().width(Length::Fill),
            arrow_button(ICON_CHEVRON_LEFT, back),
            arrow_button(ICON_CHEVRON_RIGHT, forward),
        ]
        .spacing(8)
        .align_y(iced::Alignment::Center);

        column![header, Row::with_children(cards).spacing(16)]
            .spacing(20)
            .into()
    }
}
