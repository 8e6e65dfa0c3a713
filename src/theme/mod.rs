//! Colour theme for the dashboard.

pub mod colors;

use ratatui::style::{Color, Modifier, Style};

use portfolio_dashboard::model::Category;

use self::colors::{from_hex, PortfolioColors};

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub accent: Color,
    pub warning: Color,
    pub success: Color,
    pub error: Color,
    pub surface: Color,
    pub border: Color,
    pub bar_bg: Color,
    pub text_primary: Color,
    pub text_secondary: Color,
    pub text_on_bar: Color,
    /// Active scroll-spy anchor and current pager page.
    pub highlight: Color,
}

impl Theme {
    pub fn portfolio() -> Self {
        Self {
            accent: PortfolioColors::INDIGO,
            warning: PortfolioColors::AMBER,
            success: PortfolioColors::EMERALD,
            error: PortfolioColors::RED,
            surface: PortfolioColors::SURFACE,
            border: PortfolioColors::BORDER,
            bar_bg: PortfolioColors::INK,
            text_primary: PortfolioColors::TEXT_PRIMARY,
            text_secondary: PortfolioColors::TEXT_SECONDARY,
            text_on_bar: PortfolioColors::TEXT_ON_BAR,
            highlight: PortfolioColors::AMBER,
        }
    }

    /// Accent of a category chip or card border.
    pub fn category_color(&self, category: Category) -> Color {
        from_hex(category.accent_hex()).unwrap_or(self.text_secondary)
    }

    pub fn category_badge(&self, category: Category) -> Style {
        Style::default()
            .fg(self.category_color(category))
            .add_modifier(Modifier::BOLD)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::portfolio()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_category_has_a_parsable_accent() {
        let theme = Theme::portfolio();
        for category in Category::ALL.into_iter().chain([Category::Other]) {
            assert!(from_hex(category.accent_hex()).is_some(), "{category}");
            assert_ne!(theme.category_color(category), Color::Reset);
        }
    }

    #[test]
    fn test_from_hex_rejects_garbage() {
        assert_eq!(from_hex("#ef4444"), Some(Color::Rgb(239, 68, 68)));
        assert_eq!(from_hex("ef4444"), None);
        assert_eq!(from_hex("#ef44"), None);
        assert_eq!(from_hex("#zzzzzz"), None);
    }
}
