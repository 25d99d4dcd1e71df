//! Detail modal for a single item: types, generation, stat bars, image URL.

use ratatui::{
    layout::{Alignment, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::catalog::models::Item;
use crate::tui::theme::Palette;

/// Stat value drawn as a full bar.
const STAT_MAX: u32 = 255;
const BAR_WIDTH: usize = 24;

fn stat_bar(value: u32) -> String {
    let filled = (value.min(STAT_MAX) as usize * BAR_WIDTH).div_ceil(STAT_MAX as usize);
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

/// Render the detail modal for `item` centered in `area`.
pub fn render(frame: &mut Frame, area: Rect, item: &Item, updating: bool, palette: &Palette) {
    let modal = super::super::app::centered_rect(60, 70, area);

    let mut lines = vec![
        Line::raw(""),
        Line::from(vec![
            Span::styled(format!(" #{:04} ", item.number), palette.muted()),
            Span::styled(item.name.clone(), palette.title()),
            if item.legendary {
                Span::styled("  ◆ LEGENDARY", palette.highlight())
            } else {
                Span::raw("")
            },
        ]),
        Line::from(vec![
            Span::styled(" Types: ", palette.muted()),
            Span::styled(item.types().join(" / "), palette.text()),
            Span::styled("   Generation: ", palette.muted()),
            Span::styled(item.generation.to_string(), palette.text()),
        ]),
        Line::raw(""),
    ];

    for (label, value) in item.stats() {
        lines.push(Line::from(vec![
            Span::styled(format!(" {label:<8}"), palette.muted()),
            Span::styled(format!("{value:>4} "), palette.text()),
            Span::styled(stat_bar(value), Style::default().fg(palette.primary_light)),
        ]));
    }
    lines.push(Line::from(vec![
        Span::styled(format!(" {:<8}", "Total"), palette.heading()),
        Span::styled(format!("{:>4}", item.total), palette.heading()),
    ]));

    let status = if updating {
        Span::styled("updating...", palette.dim())
    } else if item.captured {
        Span::styled("★ Caught", Style::default().fg(palette.captured))
    } else {
        Span::styled("Not caught", palette.muted())
    };
    lines.push(Line::raw(""));
    lines.push(Line::from(vec![Span::raw(" "), status]));

    if !item.image_url.is_empty() {
        lines.push(Line::from(vec![
            Span::styled(" Image: ", palette.muted()),
            Span::styled(item.image_url.clone(), palette.dim()),
        ]));
    }

    lines.push(Line::raw(""));
    lines.push(Line::from(vec![
        Span::styled(" c", palette.heading()),
        Span::raw(" capture/release  "),
        Span::styled("Esc", palette.heading()),
        Span::raw(" close"),
    ]));

    let block = Block::default()
        .title(" Pokedex Entry ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(palette.border_focused());

    frame.render_widget(Clear, modal);
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false }),
        modal,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_bar_bounds() {
        assert_eq!(stat_bar(0).chars().filter(|c| *c == '█').count(), 0);
        assert_eq!(stat_bar(255).chars().filter(|c| *c == '█').count(), BAR_WIDTH);
        assert_eq!(stat_bar(999).chars().count(), BAR_WIDTH);
        assert!(stat_bar(1).starts_with('█'));
    }
}
