//! Portfolio palette as ratatui Color::Rgb constants.

use ratatui::style::Color;

pub struct PortfolioColors;

impl PortfolioColors {
    // Primary palette
    pub const INK: Color = Color::Rgb(15, 23, 42); // #0F172A
    pub const INDIGO: Color = Color::Rgb(99, 102, 241); // #6366F1
    pub const AMBER: Color = Color::Rgb(245, 158, 11); // #F59E0B
    pub const EMERALD: Color = Color::Rgb(16, 185, 129); // #10B981
    pub const RED: Color = Color::Rgb(239, 68, 68); // #EF4444

    // Surfaces
    pub const SURFACE: Color = Color::Rgb(30, 41, 59); // #1E293B
    pub const BORDER: Color = Color::Rgb(71, 85, 105); // #475569

    // Text
    pub const TEXT_PRIMARY: Color = Color::Rgb(226, 232, 240); // #E2E8F0
    pub const TEXT_SECONDARY: Color = Color::Rgb(148, 163, 184); // #94A3B8
    pub const TEXT_ON_BAR: Color = Color::Rgb(255, 255, 255);
}

/// Parse `#rrggbb`. Anything else is `None`.
pub fn from_hex(hex: &str) -> Option<Color> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}
