use iced::widget::{button, column, container, row, text, text_input, Column, Row, Space};
use iced::{Border, Color, Element, Length, Padding, Shadow};

use crate::cards::genre_chip;
use crate::components::{
    bold, icon, link_style, pill_style, section_title, skeleton_style, view_empty_state,
};
use crate::controller::{DetailState, LoadState};
use crate::media::{
    ItemDetail, MediaType, Message, ACCENT_BLUE, STAR_YELLOW, SURFACE_DARK_GRAY, TEXT_GRAY,
    TEXT_WHITE,
};
use crate::render::{self, Layout};
use crate::storage::comment_author;
use crate::tmdb::{image_url, ImageSize};
use crate::Movieverse;

const POSTER_WIDTH: f32 = 300.0;
const POSTER_HEIGHT: f32 = 450.0;
const STILL_WIDTH: f32 = 200.0;
const STILL_HEIGHT: f32 = 112.0;
const SIMILAR_PER_ROW: usize = 4;
const UNKNOWN: &str = "Unknown";

const ICON_PLAY_FILL: char = '\u{F4F4}';
const ICON_PERSON_FILL: char = '\u{F4DA}';

fn info_line(label: &'static str, value: String) -> Element<'static, Message> {
    row![
        text(label).size(14).color(TEXT_GRAY).width(Length::Fixed(120.0)),
        text(value).size(14).color(TEXT_WHITE),
    ]
    .spacing(12)
    .into()
}

fn join_or_unknown(values: &[String]) -> String {
    if values.is_empty() {
        return String::from(UNKNOWN);
    }
    values.join(", ")
}

fn panel_style(_theme: &iced::Theme) -> container::Style {
    container::Style {
        background: Some(iced::Background::Color(SURFACE_DARK_GRAY)),
        border: Border {
            radius: 8.0.into(),
            ..Default::default()
        },
        ..Default::default()
    }
}

impl Movieverse {
    pub fn view_detail(&self) -> Element<'_, Message> {
        let Some(state) = &self.detail else {
            return view_empty_state("Nothing to show");
        };

        let summary: Element<Message> = match (&state.detail, state.load_state) {
            (Some(detail), _) => self.view_detail_summary(state, detail),
            (None, LoadState::Ready) => view_empty_state("Details are unavailable for this title"),
            (None, _) => self.view_detail_skeleton(),
        };

        let mut sections: Vec<Element<Message>> = vec![summary];
        if state.key.media_type == MediaType::Series && !state.season_numbers().is_empty() {
            sections.push(self.view_detail_seasons(state));
        }
        sections.push(self.view_detail_similar(state));
        sections.push(self.view_detail_comments(state));

        Column::with_children(sections)
            .spacing(48)
            .padding(Padding::new(32.0).left(48.0).right(48.0).bottom(48.0))
            .width(Length::Fill)
            .into()
    }

    fn view_detail_skeleton(&self) -> Element<'_, Message> {
        let lines: Vec<Element<Message>> = [320.0, 240.0, 480.0, 480.0, 360.0]
            .into_iter()
            .map(|w| {
                container(Space::new().width(w).height(18.0))
                    .style(skeleton_style(4.0))
                    .into()
            })
            .collect();

        row![
            container(Space::new().width(POSTER_WIDTH).height(POSTER_HEIGHT))
                .style(skeleton_style(8.0)),
            Column::with_children(lines).spacing(16),
        ]
        .spacing(32)
        .into()
    }

    fn view_detail_summary(&self, state: &DetailState, detail: &ItemDetail) -> Element<'_, Message> {
        let poster_url = detail
            .poster_path
            .as_deref()
            .map(|p| image_url(p, ImageSize::Poster));
        let poster = container(self.view_cached_image(
            poster_url.as_deref(),
            POSTER_WIDTH,
            POSTER_HEIGHT,
        ))
        .clip(true)
        .style(panel_style);

        let duration = match state.key.media_type {
            MediaType::Movie => render::format_runtime(detail.runtime_minutes),
            MediaType::Series => render::season_label(detail.number_of_seasons),
        };
        let year = render::release_year(detail.release_date.as_deref())
            .unwrap_or_else(|| String::from(UNKNOWN));

        let chips: Vec<Element<Message>> = detail
            .genres
            .iter()
            .map(|genre| genre_chip(&genre.name))
            .collect();

        let tags = row![
            Row::with_children(chips).spacing(6),
            text(year).size(14).color(TEXT_GRAY),
            text(duration).size(14).color(TEXT_GRAY),
            text(render::rating_label(detail.vote_average))
                .size(14)
                .color(STAR_YELLOW),
        ]
        .spacing(12)
        .align_y(iced::Alignment::Center);

        let facts = column![
            info_line(
                "Country",
                detail
                    .production_country
                    .clone()
                    .unwrap_or_else(|| String::from(UNKNOWN)),
            ),
            info_line(
                "Release date",
                detail
                    .release_date
                    .clone()
                    .unwrap_or_else(|| String::from(UNKNOWN)),
            ),
            info_line("Production", join_or_unknown(&detail.production_companies)),
            info_line("Cast", join_or_unknown(&detail.cast_summary)),
        ]
        .spacing(8);

        let trailer_button = button(
            row![
                icon(ICON_PLAY_FILL).size(16),
                text(if state.trailer.is_some() {
                    "Watch trailer"
                } else {
                    "No trailer available"
                })
                .size(16)
            ]
            .spacing(8)
            .align_y(iced::Alignment::Center),
        )
        .padding(Padding::new(12.0).left(24.0).right(24.0))
        .style(|_theme, status| {
            let background = match status {
                button::Status::Disabled => SURFACE_DARK_GRAY,
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
        .on_press_maybe(state.trailer.as_ref().map(|_| Message::OpenTrailer));

        let info = column![
            bold(detail.title.clone(), 36, TEXT_WHITE),
            tags,
            container(text(detail.overview.clone()).size(16).color(TEXT_GRAY)).max_width(720.0),
            facts,
            trailer_button,
        ]
        .spacing(20)
        .width(Length::Fill);

        row![poster, info].spacing(32).into()
    }

    fn view_detail_seasons(&self, state: &DetailState) -> Element<'_, Message> {
        let season_buttons: Vec<Element<Message>> = state
            .season_numbers()
            .into_iter()
            .map(|season| {
                button(text(format!("Season {}", season)).size(14))
                    .padding(Padding::new(6.0).left(16.0).right(16.0))
                    .style(pill_style(state.selected_season == Some(season)))
                    .on_press(Message::SelectSeason(season))
                    .into()
            })
            .collect();

        let episodes: Element<Message> = match state.selected_season {
            None => text("Choose a season to see its episodes")
                .size(14)
                .color(TEXT_GRAY)
                .into(),
            Some(_) if state.episodes.is_empty() => text("No episodes found")
                .size(14)
                .color(TEXT_GRAY)
                .into(),
            Some(_) => Column::with_children(
                state
                    .episodes
                    .iter()
                    .map(|episode| self.view_episode(render::render_episode(episode))),
            )
            .spacing(12)
            .into(),
        };

        column![
            section_title("Seasons"),
            Row::with_children(season_buttons).spacing(8).wrap(),
            episodes,
        ]
        .spacing(20)
        .into()
    }

    fn view_episode(&self, episode: render::EpisodeFragment) -> Element<'_, Message> {
        let still = container(self.view_cached_image(
            episode.still_url.as_deref(),
            STILL_WIDTH,
            STILL_HEIGHT,
        ))
        .clip(true);

        let labels = column![
            row![
                bold(episode.label, 15, TEXT_WHITE),
                text(episode.title).size(15).color(TEXT_WHITE),
            ]
            .spacing(8),
            row![
                text(episode.runtime).size(12).color(TEXT_GRAY),
                text("•").size(12).color(TEXT_GRAY),
                text(episode.air_date).size(12).color(TEXT_GRAY),
            ]
            .spacing(6),
            text(episode.overview).size(13).color(TEXT_GRAY),
        ]
        .spacing(6)
        .width(Length::Fill);

        container(row![still, labels].spacing(16))
            .padding(12)
            .width(Length::Fill)
            .style(panel_style)
            .into()
    }

    fn view_detail_similar(&self, state: &DetailState) -> Element<'_, Message> {
        let body: Element<Message> = if state.similar.is_empty() {
            text("No similar titles found").size(14).color(TEXT_GRAY).into()
        } else {
            self.view_card_grid(
                render::render_items(&state.similar, Layout::Similar, &self.reference.genres),
                SIMILAR_PER_ROW,
            )
        };

        column![section_title("You may also like"), body]
            .spacing(20)
            .into()
    }

    fn view_detail_comments(&self, state: &DetailState) -> Element<'_, Message> {
        let comments: Vec<Element<Message>> = state
            .comments
            .iter()
            .enumerate()
            .map(|(index, comment)| {
                let header = row![
                    icon(ICON_PERSON_FILL).size(14).color(TEXT_GRAY),
                    bold(comment_author(index), 14, TEXT_WHITE),
                    text(comment.display_time()).size(12).color(TEXT_GRAY),
                    Space::new().width(Length::Fill),
                    button(text("Edit").size(12))
                        .style(link_style)
                        .on_press(Message::EditComment(index)),
                    button(text("Delete").size(12))
                        .style(link_style)
                        .on_press(Message::DeleteComment(index)),
                ]
                .spacing(8)
                .align_y(iced::Alignment::Center);

                container(
                    column![header, text(comment.text.clone()).size(14).color(TEXT_WHITE)]
                        .spacing(8),
                )
                .padding(12)
                .width(Length::Fill)
                .style(panel_style)
                .into()
            })
            .collect();

        let is_editing = state.editing.is_some();
        let input = text_input(
            if is_editing { "Edit your comment..." } else { "Write a comment..." },
            &state.comment_input,
        )
        .on_input(Message::CommentInputChanged)
        .on_submit(Message::SubmitComment)
        .padding(12)
        .width(Length::Fill)
        .style(|_theme, _status| text_input::Style {
            background: iced::Background::Color(SURFACE_DARK_GRAY),
            border: Border {
                color: TEXT_GRAY,
                width: 1.0,
                radius: 8.0.into(),
            },
            icon: TEXT_GRAY,
            placeholder: TEXT_GRAY,
            value: TEXT_WHITE,
            selection: ACCENT_BLUE,
        });

        let mut composer = row![
            input,
            button(text(if is_editing { "Save" } else { "Post" }).size(14))
                .padding(Padding::new(10.0).left(20.0).right(20.0))
                .style(pill_style(true))
                .on_press(Message::SubmitComment),
        ]
        .spacing(12)
        .align_y(iced::Alignment::Center);
        if is_editing {
            composer = composer.push(
                button(text("Cancel").size(14))
                    .style(link_style)
                    .on_press(Message::CancelCommentEdit),
            );
        }

        let list: Element<Message> = if comments.is_empty() {
            text("No comments yet").size(14).color(TEXT_GRAY).into()
        } else {
            Column::with_children(comments).spacing(12).into()
        };

        column![
            section_title(format!("Comments ({})", state.comments.len())),
            composer,
            list
        ]
        .spacing(20)
        .into()
    }
}
