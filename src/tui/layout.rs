//! Root layout computation for header + filter bar + list + status bar.

use ratatui::layout::{Constraint, Layout, Rect};

/// Header height (title row inside a border).
pub const HEADER_HEIGHT: u16 = 3;
/// Filter bar height (controls row inside a border).
pub const FILTER_BAR_HEIGHT: u16 = 3;
/// Below this terminal height the header collapses into the status bar.
pub const COMPACT_THRESHOLD: u16 = 14;

/// Computed layout regions for a single frame.
pub struct AppLayout {
    /// Header area (None in compact mode).
    pub header: Option<Rect>,
    pub filters: Rect,
    /// Item list area.
    pub main: Rect,
    /// Status bar (bottom row).
    pub status: Rect,
}

impl AppLayout {
    pub fn compute(area: Rect) -> Self {
        if area.height < COMPACT_THRESHOLD {
            let rows = Layout::vertical([
                Constraint::Length(FILTER_BAR_HEIGHT),
                Constraint::Min(1),
                Constraint::Length(1),
            ])
            .split(area);
            return AppLayout {
                header: None,
                filters: rows[0],
                main: rows[1],
                status: rows[2],
            };
        }

        let rows = Layout::vertical([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Length(FILTER_BAR_HEIGHT),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

        AppLayout {
            header: Some(rows[0]),
            filters: rows[1],
            main: rows[2],
            status: rows[3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_layout() {
        let area = Rect::new(0, 0, 100, 40);
        let layout = AppLayout::compute(area);
        assert_eq!(layout.header.unwrap().height, HEADER_HEIGHT);
        assert_eq!(layout.filters.height, FILTER_BAR_HEIGHT);
        assert_eq!(layout.status.height, 1);
        assert_eq!(
            HEADER_HEIGHT + FILTER_BAR_HEIGHT + layout.main.height + 1,
            area.height
        );
    }

    #[test]
    fn test_compact_drops_header() {
        let area = Rect::new(0, 0, 80, 10);
        let layout = AppLayout::compute(area);
        assert!(layout.header.is_none());
        assert_eq!(layout.main.y, FILTER_BAR_HEIGHT);
    }
}
