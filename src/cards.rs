use iced::widget::{column, container, row, text, Column, Row, Space};
use iced::{Border, Color, Element, Length, Padding, Shadow};

use crate::components::{bold, icon};
use crate::media::{Message, STAR_YELLOW, SURFACE_DARK_GRAY, TEXT_GRAY, TEXT_WHITE};
use crate::navigation::Route;
use crate::render::{DisplayFragment, Layout};
use crate::Movieverse;

const ICON_FILM: char = '\u{F3A9}';

const TILE_WIDTH: f32 = 180.0;
const TILE_HEIGHT: f32 = 270.0;
const BANNER_WIDTH: f32 = 380.0;
const BANNER_HEIGHT: f32 = 214.0;

fn card_style(_theme: &iced::Theme) -> container::Style {
    container::Style {
        background: Some(iced::Background::Color(SURFACE_DARK_GRAY)),
        border: Border {
            radius: 8.0.into(),
            ..Default::default()
        },
        shadow: Shadow {
            color: Color::from_rgba(0.0, 0.0, 0.0, 0.3),
            offset: iced::Vector::new(0.0, 4.0),
            blur_radius: 8.0,
        },
        ..Default::default()
    }
}

fn badge(label: &str) -> Element<'static, Message> {
    container(bold(label, 11, TEXT_WHITE))
        .padding(Padding::new(2.0).left(6.0).right(6.0))
        .style(|_theme| container::Style {
            background: Some(iced::Background::Color(Color::from_rgba(
                0.0, 0.0, 0.0, 0.7,
            ))),
            border: Border {
                color: TEXT_GRAY,
                width: 1.0,
                radius: 2.0.into(),
            },
            ..Default::default()
        })
        .into()
}

pub fn genre_chip(name: &str) -> Element<'static, Message> {
    container(text(name.to_string()).size(11).color(TEXT_WHITE))
        .padding(Padding::new(2.0).left(8.0).right(8.0))
        .style(|_theme| container::Style {
            background: Some(iced::Background::Color(Color::from_rgba(
                1.0, 1.0, 1.0, 0.12,
            ))),
            border: Border {
                radius: 10.0.into(),
                ..Default::default()
            },
            ..Default::default()
        })
        .into()
}

pub fn genre_chips(names: &[String]) -> Element<'static, Message> {
    let chips: Vec<Element<Message>> = names.iter().map(|name| genre_chip(name)).collect();
    Row::with_children(chips).spacing(6).wrap().into()
}

fn rating_text(rating: &str) -> iced::widget::Text<'static> {
    text(rating.to_string()).size(13).color(STAR_YELLOW)
}

fn bottom_gradient() -> Element<'static, Message> {
    container(Space::new().width(Length::Fill).height(Length::Fill))
        .width(Length::Fill)
        .height(Length::Fill)
        .style(|_theme| container::Style {
            background: Some(iced::Background::Gradient(iced::Gradient::Linear(
                iced::gradient::Linear::new(0.0)
                    .add_stop(0.0, Color::from_rgba(0.0, 0.0, 0.0, 0.9))
                    .add_stop(0.5, Color::from_rgba(0.0, 0.0, 0.0, 0.4))
                    .add_stop(1.0, Color::TRANSPARENT),
            ))),
            ..Default::default()
        })
        .into()
}

impl Movieverse {
    /// Loaded image, or a film-icon placeholder while pending or missing.
    pub fn view_cached_image(&self, url: Option<&str>, w: f32, h: f32) -> Element<'_, Message> {
        if let Some(handle) = url.and_then(|url| self.image_cache.get(url)) {
            return container(
                iced::widget::image(handle.clone())
                    .width(Length::Fixed(w))
                    .height(Length::Fixed(h))
                    .content_fit(iced::ContentFit::Cover),
            )
            .width(Length::Fixed(w))
            .height(Length::Fixed(h))
            .clip(true)
            .into();
        }

        container(icon(ICON_FILM).size(w.min(h) / 4.0).color(TEXT_GRAY))
            .width(Length::Fixed(w))
            .height(Length::Fixed(h))
            .center_x(Length::Fixed(w))
            .center_y(Length::Fixed(h))
            .style(|_theme| container::Style {
                background: Some(iced::Background::Color(Color::from_rgb(0.15, 0.15, 0.15))),
                ..Default::default()
            })
            .into()
    }

    pub fn view_fragment(&self, fragment: DisplayFragment) -> Element<'_, Message> {
        match fragment.layout {
            Layout::RecommendedBanner => self.view_banner(fragment),
            _ => self.view_tile(fragment),
        }
    }

    /// Poster tile with HD badge, title, year, meta line, rating and chips.
    pub fn view_tile(&self, fragment: DisplayFragment) -> Element<'_, Message> {
        let poster = self.view_cached_image(fragment.image_url.as_deref(), TILE_WIDTH, TILE_HEIGHT);

        let badges: Vec<Element<Message>> = fragment.badges.iter().map(|b| badge(b)).collect();
        let badge_layer = container(Row::with_children(badges).spacing(4))
            .width(Length::Fill)
            .padding(8);

        let artwork = container(iced::widget::stack![poster, badge_layer])
            .width(Length::Fixed(TILE_WIDTH))
            .height(Length::Fixed(TILE_HEIGHT))
            .clip(true)
            .style(card_style);

        let info = column![
            text(fragment.title).size(15).color(TEXT_WHITE),
            row![
                text(fragment.year).size(12).color(TEXT_GRAY),
                text("•").size(12).color(TEXT_GRAY),
                text(fragment.meta_line).size(12).color(TEXT_GRAY),
            ]
            .spacing(6),
            rating_text(&fragment.rating),
            genre_chips(&fragment.genre_chips),
        ]
        .spacing(6)
        .width(Length::Fixed(TILE_WIDTH));

        iced::widget::mouse_area(column![artwork, info].spacing(10))
            .on_press(Message::Navigate(Route::Detail(fragment.key)))
            .interaction(iced::mouse::Interaction::Pointer)
            .into()
    }

    /// Wide backdrop card used for the recommended row.
    pub fn view_banner(&self, fragment: DisplayFragment) -> Element<'_, Message> {
        let backdrop =
            self.view_cached_image(fragment.image_url.as_deref(), BANNER_WIDTH, BANNER_HEIGHT);

        let overlay = container(
            column![
                bold(fragment.title, 18, TEXT_WHITE),
                row![
                    rating_text(&fragment.rating),
                    text(fragment.year).size(12).color(TEXT_GRAY),
                    text(fragment.meta_line).size(12).color(TEXT_GRAY),
                ]
                .spacing(8)
                .align_y(iced::Alignment::Center),
                genre_chips(&fragment.genre_chips),
            ]
            .spacing(6),
        )
        .width(Length::Fill)
        .height(Length::Fill)
        .padding(16)
        .align_y(iced::alignment::Vertical::Bottom);

        let card = container(iced::widget::stack![backdrop, bottom_gradient(), overlay])
            .width(Length::Fixed(BANNER_WIDTH))
            .height(Length::Fixed(BANNER_HEIGHT))
            .clip(true)
            .style(card_style);

        iced::widget::mouse_area(card)
            .on_press(Message::Navigate(Route::Detail(fragment.key)))
            .interaction(iced::mouse::Interaction::Pointer)
            .into()
    }

    pub fn view_card_grid(
        &self,
        fragments: Vec<DisplayFragment>,
        cards_per_row: usize,
    ) -> Element<'_, Message> {
        let mut rows: Vec<Element<Message>> = Vec::new();
        let mut fragments = fragments.into_iter().peekable();

        while fragments.peek().is_some() {
            let row_cards: Vec<Element<Message>> = fragments
                .by_ref()
                .take(cards_per_row.max(1))
                .map(|fragment| self.view_fragment(fragment))
                .collect();
            rows.push(
                Row::with_children(row_cards)
                    .spacing(16)
                    .align_y(iced::Alignment::Start)
                    .into(),
            );
        }

        Column::with_children(rows)
            .spacing(24)
            .width(Length::Fill)
            .into()
    }
}
