//! Catalog list view.
//!
//! One row per loaded item with its number, name, types, total and capture
//! state. `j/k` move the selection, `c` captures or releases, Enter opens the
//! detail modal. Reaching the last row is what the scroll trigger watches.

use std::cell::Cell;

use crossterm::event::{KeyCode, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::catalog::models::Item;
use crate::catalog::reconciler::Reconciler;
use crate::tui::theme::Palette;

/// What the list wants done with a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListResult {
    Consumed,
    OpenDetail(u64),
    ToggleCapture { id: u64, captured: bool },
    BackToFirstPage,
}

pub struct CatalogViewState {
    selected: usize,
    offset: usize,
    /// Rows available to the list in the last frame.
    viewport: Cell<usize>,
}

impl Default for CatalogViewState {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogViewState {
    pub fn new() -> Self {
        Self {
            selected: 0,
            offset: 0,
            viewport: Cell::new(0),
        }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_item<'a>(&self, items: &'a [Item]) -> Option<&'a Item> {
        items.get(self.selected)
    }

    /// Whether the end of the list is on screen. An empty list counts as
    /// showing its end.
    pub fn end_visible(&self, len: usize) -> bool {
        let viewport = self.viewport.get();
        viewport > 0 && self.offset + viewport >= len
    }

    pub fn set_viewport(&self, rows: usize) {
        self.viewport.set(rows);
    }

    /// Back to the top (new query).
    pub fn reset(&mut self) {
        self.selected = 0;
        self.offset = 0;
    }

    /// Keep selection and offset inside a list of `len` rows.
    pub fn clamp(&mut self, len: usize) {
        self.selected = self.selected.min(len.saturating_sub(1));
        self.offset = self.offset.min(len.saturating_sub(1));
        self.follow_selection();
    }

    pub fn select_next(&mut self, len: usize, step: usize) {
        if len == 0 {
            return;
        }
        self.selected = (self.selected + step).min(len - 1);
        self.follow_selection();
    }

    pub fn select_prev(&mut self, step: usize) {
        self.selected = self.selected.saturating_sub(step);
        self.follow_selection();
    }

    fn follow_selection(&mut self) {
        let viewport = self.viewport.get().max(1);
        if self.selected < self.offset {
            self.offset = self.selected;
        } else if self.selected >= self.offset + viewport {
            self.offset = self.selected + 1 - viewport;
        }
    }

    // ── Input ────────────────────────────────────────────────────────────

    pub fn handle_input(
        &mut self,
        code: KeyCode,
        modifiers: KeyModifiers,
        reconciler: &Reconciler,
    ) -> Option<ListResult> {
        let items = reconciler.items();
        let len = items.len();
        let page = self.viewport.get().max(1);

        match (modifiers, code) {
            (KeyModifiers::NONE, KeyCode::Char('j') | KeyCode::Down) => {
                self.select_next(len, 1);
                Some(ListResult::Consumed)
            }
            (KeyModifiers::NONE, KeyCode::Char('k') | KeyCode::Up) => {
                self.select_prev(1);
                Some(ListResult::Consumed)
            }
            (KeyModifiers::NONE, KeyCode::PageDown) => {
                self.select_next(len, page);
                Some(ListResult::Consumed)
            }
            (KeyModifiers::NONE, KeyCode::PageUp) => {
                self.select_prev(page);
                Some(ListResult::Consumed)
            }
            (KeyModifiers::NONE, KeyCode::Char('g') | KeyCode::Home) => {
                self.select_prev(len);
                Some(ListResult::Consumed)
            }
            (KeyModifiers::SHIFT, KeyCode::Char('G')) | (KeyModifiers::NONE, KeyCode::End) => {
                self.select_next(len, len);
                Some(ListResult::Consumed)
            }
            (KeyModifiers::NONE, KeyCode::Enter) => self
                .selected_item(items)
                .map(|item| ListResult::OpenDetail(item.id)),
            (KeyModifiers::NONE, KeyCode::Char('c')) => {
                let item = self.selected_item(items)?;
                if reconciler.is_updating(item.id) {
                    return Some(ListResult::Consumed);
                }
                Some(ListResult::ToggleCapture {
                    id: item.id,
                    captured: !item.captured,
                })
            }
            (KeyModifiers::NONE, KeyCode::Char('r')) if reconciler.error().is_some() => {
                Some(ListResult::BackToFirstPage)
            }
            _ => None,
        }
    }

    pub fn handle_mouse(&mut self, event: &MouseEvent, len: usize) -> bool {
        match event.kind {
            MouseEventKind::ScrollDown => {
                self.select_next(len, 3);
                true
            }
            MouseEventKind::ScrollUp => {
                self.select_prev(3);
                true
            }
            _ => false,
        }
    }

    // ── Rendering ────────────────────────────────────────────────────────

    pub fn render(
        &self,
        frame: &mut Frame,
        area: Rect,
        reconciler: &Reconciler,
        focused: bool,
        palette: &Palette,
    ) {
        let title = match reconciler.metadata() {
            Some(meta) if meta.total > 0 => format!(
                "Pokemon ({} of {}, page {}/{})",
                reconciler.items().len(),
                meta.total,
                meta.page,
                meta.total_pages
            ),
            _ => "Pokemon".to_string(),
        };
        let block = if focused {
            palette.block_focused(&title)
        } else {
            palette.block_default(&title)
        };
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if let Some(message) = reconciler.display_error() {
            self.set_viewport(inner.height as usize);
            render_error(frame, inner, &message, palette);
            return;
        }

        let items = reconciler.items();
        let fetching = reconciler.is_fetching();

        if items.is_empty() {
            self.set_viewport(inner.height as usize);
            let message = if fetching {
                Span::styled("LOADING...", palette.highlight())
            } else {
                Span::styled("No Pokemon found", palette.muted())
            };
            let lines = vec![Line::raw(""), Line::from(message)];
            frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
            return;
        }

        // Last row is kept for the loading-more indicator.
        let rows = inner.height.saturating_sub(1) as usize;
        self.set_viewport(rows);

        let mut lines: Vec<Line> = items
            .iter()
            .enumerate()
            .skip(self.offset)
            .take(rows)
            .map(|(idx, item)| {
                item_line(
                    item,
                    idx == self.selected,
                    reconciler.is_updating(item.id),
                    palette,
                )
            })
            .collect();

        if fetching {
            lines.push(Line::from(Span::styled(
                "  LOADING MORE...",
                palette.highlight(),
            )));
        }

        frame.render_widget(Paragraph::new(lines), inner);
    }
}

fn item_line<'a>(item: &'a Item, selected: bool, updating: bool, palette: &Palette) -> Line<'a> {
    let marker = if selected { "▸ " } else { "  " };
    let name_style = if selected {
        palette.highlight()
    } else {
        palette.text()
    };

    let action = if updating {
        Span::styled("...", palette.dim())
    } else if item.captured {
        Span::styled("★ CAUGHT", Style::default().fg(palette.captured))
    } else {
        Span::styled("·", palette.dim())
    };

    let mut spans = vec![
        Span::styled(marker, palette.highlight()),
        Span::styled(format!("{:04} ", item.number), palette.muted()),
        Span::styled(format!("{:<14}", item.name), name_style),
        Span::styled(format!("{:<16}", item.types().join("/")), palette.muted()),
        Span::styled(format!("{:>4} ", item.total), palette.dim()),
    ];
    if item.legendary {
        spans.push(Span::styled(
            "◆ ",
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        ));
    } else {
        spans.push(Span::raw("  "));
    }
    spans.push(action);
    Line::from(spans)
}

fn render_error(frame: &mut Frame, area: Rect, message: &str, palette: &Palette) {
    let lines = vec![
        Line::raw(""),
        Line::from(Span::styled(
            format!("PROF OAK says: \"{message}\""),
            Style::default().fg(palette.error),
        )),
        Line::raw(""),
        Line::from(vec![
            Span::styled("[r]", palette.heading()),
            Span::raw(" Back to page 1"),
        ]),
    ];
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(ratatui::widgets::Wrap { trim: true }),
        area,
    );
}
