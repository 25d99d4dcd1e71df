//! Light and dark palettes for the Pokedex TUI, plus the persisted theme
//! preference.
//!
//! All colors are RGB truecolor. Views take a [`Palette`] instead of using
//! inline `Color::*` literals.

use std::io;
use std::path::Path;

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders};

/// Named colors used by every view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Pokedex red: title, focused borders.
    pub primary: Color,
    pub primary_light: Color,
    /// Screen yellow: selection, calls to action.
    pub accent: Color,
    pub bg_base: Color,
    pub bg_surface: Color,
    pub text: Color,
    pub text_muted: Color,
    pub text_dim: Color,
    pub error: Color,
    pub success: Color,
    pub warning: Color,
    pub info: Color,
    /// Marker for captured items.
    pub captured: Color,
}

pub const DARK: Palette = Palette {
    primary: Color::Rgb(0xE3, 0x35, 0x0D),
    primary_light: Color::Rgb(0xFF, 0x6B, 0x4A),
    accent: Color::Rgb(0xFF, 0xCB, 0x05),
    bg_base: Color::Rgb(0x12, 0x14, 0x18),
    bg_surface: Color::Rgb(0x1E, 0x22, 0x28),
    text: Color::Rgb(0xE0, 0xE0, 0xE0),
    text_muted: Color::Rgb(0x80, 0x80, 0x80),
    text_dim: Color::Rgb(0x50, 0x50, 0x50),
    error: Color::Rgb(0xEF, 0x53, 0x50),
    success: Color::Rgb(0x66, 0xBB, 0x6A),
    warning: Color::Rgb(0xFF, 0xA7, 0x26),
    info: Color::Rgb(0x42, 0xA5, 0xF5),
    captured: Color::Rgb(0xFF, 0xD7, 0x00),
};

pub const LIGHT: Palette = Palette {
    primary: Color::Rgb(0xC6, 0x28, 0x28),
    primary_light: Color::Rgb(0xE5, 0x39, 0x35),
    accent: Color::Rgb(0x1E, 0x5A, 0xA8),
    bg_base: Color::Rgb(0xF5, 0xF5, 0xF0),
    bg_surface: Color::Rgb(0xE8, 0xE8, 0xE0),
    text: Color::Rgb(0x21, 0x21, 0x21),
    text_muted: Color::Rgb(0x61, 0x61, 0x61),
    text_dim: Color::Rgb(0x9E, 0x9E, 0x9E),
    error: Color::Rgb(0xC6, 0x28, 0x28),
    success: Color::Rgb(0x2E, 0x7D, 0x32),
    warning: Color::Rgb(0xEF, 0x6C, 0x00),
    info: Color::Rgb(0x15, 0x65, 0xC0),
    captured: Color::Rgb(0xB2, 0x8B, 0x00),
};

// ── Style helpers ───────────────────────────────────────────────────────────

impl Palette {
    /// Accent bold text (titles, active items).
    pub fn title(&self) -> Style {
        Style::default().fg(self.primary).add_modifier(Modifier::BOLD)
    }

    pub fn heading(&self) -> Style {
        Style::default().fg(self.primary_light).add_modifier(Modifier::BOLD)
    }

    pub fn border_focused(&self) -> Style {
        Style::default().fg(self.primary)
    }

    pub fn border_default(&self) -> Style {
        Style::default().fg(self.text_dim)
    }

    /// Highlighted/selected item.
    pub fn highlight(&self) -> Style {
        Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
    }

    pub fn text(&self) -> Style {
        Style::default().fg(self.text)
    }

    pub fn muted(&self) -> Style {
        Style::default().fg(self.text_muted)
    }

    pub fn dim(&self) -> Style {
        Style::default().fg(self.text_dim)
    }

    /// Key hint style (e.g., "[q]:quit").
    pub fn key_hint(&self) -> Style {
        Style::default().fg(self.text_dim)
    }

    /// Status bar brand badge.
    pub fn brand_badge(&self) -> Style {
        Style::default()
            .fg(self.bg_base)
            .bg(self.primary)
            .add_modifier(Modifier::BOLD)
    }

    pub fn block_focused<'a>(&self, title: &'a str) -> Block<'a> {
        Block::default()
            .title(format!(" {title} "))
            .borders(Borders::ALL)
            .border_style(self.border_focused())
    }

    pub fn block_default<'a>(&self, title: &'a str) -> Block<'a> {
        Block::default()
            .title(format!(" {title} "))
            .borders(Borders::ALL)
            .border_style(self.border_default())
    }
}

// ── Preference ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeMode {
    Light,
    Dark,
}

impl ThemeMode {
    pub fn palette(self) -> &'static Palette {
        match self {
            Self::Light => &LIGHT,
            Self::Dark => &DARK,
        }
    }
}

/// User's theme choice. `System` follows the terminal background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemePreference {
    Light,
    Dark,
    #[default]
    System,
}

impl ThemePreference {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            "system" => Some(Self::System),
            _ => None,
        }
    }

    /// Light → Dark → System → Light.
    pub fn next(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::System,
            Self::System => Self::Light,
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Light => "☀",
            Self::Dark => "☾",
            Self::System => "◐",
        }
    }

    pub fn resolve(self) -> ThemeMode {
        match self {
            Self::Light => ThemeMode::Light,
            Self::Dark => ThemeMode::Dark,
            Self::System => {
                mode_from_colorfgbg(std::env::var("COLORFGBG").ok().as_deref())
            }
        }
    }

    /// Read the saved preference, falling back to `System`.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents).unwrap_or_else(|| {
                log::warn!("Ignoring unknown theme '{}'", contents.trim());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save(self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.as_str())
    }
}

/// `COLORFGBG` is `fg;bg` (sometimes `fg;default;bg`). Backgrounds 7 and
/// 9-15 are light colors; anything else, or no value, is treated as dark.
pub fn mode_from_colorfgbg(value: Option<&str>) -> ThemeMode {
    let background = value
        .and_then(|v| v.rsplit(';').next())
        .and_then(|bg| bg.trim().parse::<u8>().ok());
    match background {
        Some(7) | Some(9..=15) => ThemeMode::Light,
        _ => ThemeMode::Dark,
    }
}
