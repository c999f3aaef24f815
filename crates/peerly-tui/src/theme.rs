//! Palette and semantic styles.

use ratatui::style::{Color, Modifier, Style};

use peerly_core::AlertVariant;

// ── Palette ───────────────────────────────────────────────────────────

pub const ACCENT: Color = Color::Rgb(120, 150, 255); // #7896ff
pub const TEAL: Color = Color::Rgb(102, 217, 200); // #66d9c8
pub const AMBER: Color = Color::Rgb(245, 200, 90); // #f5c85a
pub const SUCCESS_GREEN: Color = Color::Rgb(110, 220, 130); // #6edc82
pub const DANGER_RED: Color = Color::Rgb(240, 95, 95); // #f05f5f
pub const INFO_BLUE: Color = Color::Rgb(125, 200, 245); // #7dc8f5

pub const TEXT: Color = Color::Rgb(205, 208, 218); // #cdd0da
pub const MUTED: Color = Color::Rgb(110, 118, 140); // #6e768c
pub const BG_HIGHLIGHT: Color = Color::Rgb(38, 42, 56); // #262a38
pub const BG_DARK: Color = Color::Rgb(26, 28, 38); // #1a1c26

// ── Semantic styles ───────────────────────────────────────────────────

pub fn title_style() -> Style {
    Style::default().fg(TEAL).add_modifier(Modifier::BOLD)
}

pub fn border_focused() -> Style {
    Style::default().fg(ACCENT)
}

pub fn border_default() -> Style {
    Style::default().fg(MUTED)
}

pub fn table_header() -> Style {
    Style::default()
        .fg(TEAL)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
}

/// Header of the column that `s` and `f` act on.
pub fn table_header_picked() -> Style {
    table_header().fg(AMBER)
}

pub fn table_row() -> Style {
    Style::default().fg(TEXT)
}

pub fn table_selected() -> Style {
    Style::default()
        .fg(ACCENT)
        .bg(BG_HIGHLIGHT)
        .add_modifier(Modifier::BOLD)
}

pub fn tab_active() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

pub fn tab_inactive() -> Style {
    Style::default().fg(TEXT)
}

pub fn key_hint() -> Style {
    Style::default().fg(MUTED)
}

pub fn key_hint_key() -> Style {
    Style::default().fg(TEAL).add_modifier(Modifier::BOLD)
}

pub fn field_error() -> Style {
    Style::default().fg(DANGER_RED)
}

/// Border color and icon for an alert banner.
pub fn alert_style(variant: AlertVariant) -> (Color, &'static str) {
    match variant {
        AlertVariant::Success => (SUCCESS_GREEN, "✓"),
        AlertVariant::Danger => (DANGER_RED, "✗"),
        AlertVariant::Warning => (AMBER, "!"),
        AlertVariant::Info => (INFO_BLUE, "·"),
    }
}
