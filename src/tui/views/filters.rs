//! Filter bar: search field, type selector, sort toggle, page-size selector
//! and reset.
//!
//! Each control only produces a [`ParamUpdate`]; none of them knows about
//! the others or about pagination. The app applies the update to the param
//! store and the reconciler picks up the new query from there.

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::catalog::params::{ParamUpdate, QueryParams};
use crate::tui::theme::Palette;
use crate::tui::widgets::search_field::SearchField;

pub const ALL_TYPES: &str = "All types";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterControl {
    Type,
    Sort,
    PageSize,
    Reset,
}

impl FilterControl {
    const ALL: [FilterControl; 4] = [Self::Type, Self::Sort, Self::PageSize, Self::Reset];

    fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|&c| c == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|&c| c == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// What the filter bar wants done with a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterResult {
    Consumed,
    Update(ParamUpdate),
    /// Hand focus back to the list.
    Leave,
}

pub struct FilterBarState {
    pub search: SearchField,
    selected: FilterControl,
}

impl FilterBarState {
    pub fn new(search_debounce: Duration) -> Self {
        Self {
            search: SearchField::new(search_debounce),
            selected: FilterControl::Type,
        }
    }

    pub fn selected(&self) -> FilterControl {
        self.selected
    }

    /// Follow query changes made elsewhere.
    pub fn sync(&mut self, query: &QueryParams) {
        self.search.sync(&query.search);
    }

    /// Debounced search commit. Call from on_tick.
    pub fn poll(&mut self, now: Instant) -> Option<ParamUpdate> {
        self.search.poll(now).map(ParamUpdate::search)
    }

    // ── Input ────────────────────────────────────────────────────────────

    pub fn handle_search_input(
        &mut self,
        code: KeyCode,
        modifiers: KeyModifiers,
        now: Instant,
    ) -> FilterResult {
        match (modifiers, code) {
            (_, KeyCode::Esc | KeyCode::Enter | KeyCode::Down) => FilterResult::Leave,
            (KeyModifiers::CONTROL, KeyCode::Char('u')) => {
                self.search.clear(now);
                FilterResult::Consumed
            }
            (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(c)) => {
                self.search.insert_char(c, now);
                FilterResult::Consumed
            }
            (_, KeyCode::Backspace) => {
                self.search.backspace(now);
                FilterResult::Consumed
            }
            (_, KeyCode::Delete) => {
                self.search.delete(now);
                FilterResult::Consumed
            }
            (_, KeyCode::Left) => {
                self.search.move_left();
                FilterResult::Consumed
            }
            (_, KeyCode::Right) => {
                self.search.move_right();
                FilterResult::Consumed
            }
            (_, KeyCode::Home) => {
                self.search.move_home();
                FilterResult::Consumed
            }
            (_, KeyCode::End) => {
                self.search.move_end();
                FilterResult::Consumed
            }
            _ => FilterResult::Consumed,
        }
    }

    pub fn handle_control_input(
        &mut self,
        code: KeyCode,
        query: &QueryParams,
        categories: &[String],
    ) -> FilterResult {
        match code {
            KeyCode::Esc => FilterResult::Leave,
            KeyCode::Left | KeyCode::Char('h') => {
                self.selected = self.selected.prev();
                FilterResult::Consumed
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.selected = self.selected.next();
                FilterResult::Consumed
            }
            KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Down | KeyCode::Char('j') => {
                self.activate(query, categories, true)
            }
            KeyCode::Up | KeyCode::Char('k') => self.activate(query, categories, false),
            _ => FilterResult::Consumed,
        }
    }

    fn activate(&self, query: &QueryParams, categories: &[String], forward: bool) -> FilterResult {
        let update = match self.selected {
            FilterControl::Type => {
                ParamUpdate::category(cycle_category(query.category.as_deref(), categories, forward))
            }
            FilterControl::Sort => ParamUpdate::sort(query.sort.toggle()).with_page(1),
            FilterControl::PageSize => ParamUpdate::limit(query.limit.next()),
            FilterControl::Reset if query.has_active_filters() => ParamUpdate::clear_all(),
            FilterControl::Reset => return FilterResult::Consumed,
        };
        FilterResult::Update(update)
    }

    // ── Rendering ────────────────────────────────────────────────────────

    pub fn render(
        &self,
        frame: &mut Frame,
        area: Rect,
        query: &QueryParams,
        search_focused: bool,
        controls_focused: bool,
        palette: &Palette,
    ) {
        let block = if search_focused || controls_focused {
            palette.block_focused("Filters")
        } else {
            palette.block_default("Filters")
        };
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let cols = Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(inner);

        self.render_search(frame, cols[0], search_focused, palette);
        self.render_controls(frame, cols[1], query, controls_focused, palette);
    }

    fn render_search(&self, frame: &mut Frame, area: Rect, focused: bool, palette: &Palette) {
        let text = self.search.text();
        let display = if focused {
            format!("{text}_")
        } else if text.is_empty() {
            "Press / to search...".to_string()
        } else {
            text.to_string()
        };
        let style = if focused || !text.is_empty() {
            palette.text()
        } else {
            palette.dim()
        };
        let prefix = if focused { palette.heading() } else { palette.dim() };

        let line = Line::from(vec![
            Span::styled("[/] ", prefix),
            Span::styled(display, style),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_controls(
        &self,
        frame: &mut Frame,
        area: Rect,
        query: &QueryParams,
        focused: bool,
        palette: &Palette,
    ) {
        let control = |control: FilterControl, label: String| {
            let style = if focused && self.selected == control {
                palette.highlight()
            } else {
                palette.muted()
            };
            Span::styled(label, style)
        };

        let category = query.category.as_deref().unwrap_or(ALL_TYPES);
        let mut spans = vec![
            control(FilterControl::Type, format!("Type: {category} ▾")),
            Span::raw("  "),
            control(FilterControl::Sort, format!("Sort: {}", query.sort.label())),
            Span::raw("  "),
            control(FilterControl::PageSize, format!("Show: {}", query.limit.value())),
        ];
        if query.has_active_filters() || (focused && self.selected == FilterControl::Reset) {
            spans.push(Span::raw("  "));
            spans.push(control(FilterControl::Reset, "[Reset]".to_string()));
        }

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

/// Step through "All types" followed by each category.
fn cycle_category(current: Option<&str>, categories: &[String], forward: bool) -> Option<String> {
    let slots = categories.len() + 1;
    let position = current
        .and_then(|c| categories.iter().position(|cat| cat == c))
        .map(|i| i + 1)
        .unwrap_or(0);
    let next = if forward {
        (position + 1) % slots
    } else {
        (position + slots - 1) % slots
    };
    match next {
        0 => None,
        i => categories.get(i - 1).cloned(),
    }
}
