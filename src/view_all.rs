use iced::widget::{column, container, row, text, Space};
use iced::{Element, Length, Padding};

use crate::components::{
    bold, view_empty_state, view_error_state, view_pagination, view_skeleton_grid,
    view_type_buttons,
};
use crate::controller::{LoadState, ViewAllState};
use crate::media::{Message, TEXT_GRAY, TEXT_WHITE};
use crate::render::{self, Layout};
use crate::Movieverse;

const CARDS_PER_ROW: usize = 5;

impl Movieverse {
    pub fn view_view_all(&self) -> Element<'_, Message> {
        let Some(state) = &self.view_all else {
            return view_empty_state("No content found");
        };

        let listing = column![
            self.view_view_all_header(state),
            view_type_buttons(state.facets().media_type_filter(), Message::SetViewAllType),
            self.view_view_all_results(state),
        ]
        .spacing(24)
        .padding(Padding::new(32.0).left(48.0).right(48.0).bottom(48.0))
        .width(Length::Fill);

        column![self.view_hero(state.hero()), listing]
            .width(Length::Fill)
            .into()
    }

    fn view_view_all_header(&self, state: &ViewAllState) -> Element<'_, Message> {
        let mut active_facets = Vec::new();
        if let Some(name) = state
            .facets()
            .genre_id()
            .and_then(|id| self.reference.genres.picker_name(id))
        {
            active_facets.push(name.to_string());
        }
        if let Some(code) = state.facets().country_code() {
            active_facets.push(self.reference.countries.name(code).to_string());
        }

        let subtitle = match state.current_page() {
            Some(page) if state.load_state() == LoadState::Ready => {
                format!("Page {} of {}", page.page_number, page.total_pages)
            }
            _ => String::new(),
        };

        row![
            column![
                bold(state.category().title(), 28, TEXT_WHITE),
                text(active_facets.join(" • ")).size(14).color(TEXT_GRAY),
            ]
            .spacing(8),
            Space::new().width(Length::Fill),
            text(subtitle).size(14).color(TEXT_GRAY),
        ]
        .align_y(iced::Alignment::End)
        .into()
    }

    fn view_view_all_results(&self, state: &ViewAllState) -> Element<'_, Message> {
        if state.load_state() != LoadState::Ready {
            return view_skeleton_grid(2, CARDS_PER_ROW, 180.0, 270.0);
        }
        if let Some(error) = &self.error_message {
            return view_error_state(error);
        }
        let Some(page) = state.current_page().filter(|page| !page.items.is_empty()) else {
            return view_empty_state("No content found");
        };

        let fragments = render::render_items(&page.items, Layout::TrendingTile, &self.reference.genres);
        let grid = self.view_card_grid(fragments, CARDS_PER_ROW);

        if page.total_pages <= 1 {
            return grid;
        }
        column![
            grid,
            container(view_pagination(page.page_number, page.total_pages)).padding(Padding::new(16.0))
        ]
        .spacing(24)
        .into()
    }
}
