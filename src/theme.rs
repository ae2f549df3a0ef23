//! Color themes for the composer.
//!
//! Palettes come from `ratatui-themes`; [`ThemeColors`] maps a palette onto
//! the handful of roles the compose screen draws with.

use ratatui::style::{Color, Modifier, Style};
use ratatui_themes::{ThemeName, ThemePalette};
use serde::{Deserialize, Serialize};

/// Bluesky blue (#0085FF)
const BLUESKY_BLUE: Color = Color::Rgb(0, 133, 255);

/// A named theme, stored in the config by name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Theme(pub ThemeName);

impl Theme {
    /// Every theme the picker offers
    #[must_use]
    pub const fn all() -> &'static [ThemeName] {
        ThemeName::all()
    }

    /// Human readable name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.0.display_name()
    }

    /// Role colors for this theme
    #[must_use]
    pub fn colors(&self) -> ThemeColors {
        ThemeColors::from_palette(self.0.palette())
    }

    /// The underlying palette name
    #[must_use]
    pub const fn inner(&self) -> ThemeName {
        self.0
    }
}

impl From<ThemeName> for Theme {
    fn from(name: ThemeName) -> Self {
        Self(name)
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Colors by role on the compose screen
#[derive(Debug, Clone)]
pub struct ThemeColors {
    /// Screen background
    pub bg: Color,
    /// Status bar and popup background, slightly lifted from `bg`
    pub surface: Color,
    /// Body text
    pub fg: Color,
    /// Placeholders, hints and metadata
    pub muted: Color,
    /// Titles and focused borders
    pub accent: Color,
    /// Status messages and key hints
    pub secondary: Color,
    /// Counter nearing the limit
    pub warning: Color,
    /// Counter over the limit and the failure banner
    pub error: Color,
    /// Selected image card or list row
    pub selection: Color,
    /// Links, mentions and tags in the text
    pub facet: Color,
    /// Post button
    pub brand: Color,
}

impl ThemeColors {
    /// Map a palette onto composer roles
    #[must_use]
    pub fn from_palette(p: ThemePalette) -> Self {
        Self {
            bg: p.bg,
            surface: lift(p.bg, 10),
            fg: p.fg,
            muted: p.muted,
            accent: p.accent,
            secondary: p.secondary,
            warning: p.warning,
            error: p.error,
            selection: p.selection,
            facet: p.info,
            brand: BLUESKY_BLUE,
        }
    }

    /// Body text
    #[must_use]
    pub fn text(&self) -> Style {
        Style::default().fg(self.fg)
    }

    /// Secondary text: image sizes, draft timestamps
    #[must_use]
    pub fn text_dim(&self) -> Style {
        Style::default().fg(self.muted).add_modifier(Modifier::ITALIC)
    }

    /// Placeholder and hint text
    #[must_use]
    pub fn text_muted(&self) -> Style {
        Style::default().fg(self.muted)
    }

    /// Accent text
    #[must_use]
    pub fn text_primary(&self) -> Style {
        Style::default().fg(self.accent)
    }

    /// Status text
    #[must_use]
    pub fn text_secondary(&self) -> Style {
        Style::default().fg(self.secondary)
    }

    /// Counter near the limit
    #[must_use]
    pub fn text_warning(&self) -> Style {
        Style::default().fg(self.warning)
    }

    /// Counter over the limit
    #[must_use]
    pub fn text_error(&self) -> Style {
        Style::default().fg(self.error).add_modifier(Modifier::BOLD)
    }

    /// Link, mention or tag
    #[must_use]
    pub fn text_facet(&self) -> Style {
        Style::default().fg(self.facet)
    }

    /// Unfocused border
    #[must_use]
    pub fn block(&self) -> Style {
        Style::default().fg(self.muted)
    }

    /// Border of the text area while typing, and of popups
    #[must_use]
    pub fn block_focus(&self) -> Style {
        Style::default().fg(self.accent)
    }

    /// Selected row or card
    #[must_use]
    pub fn selected(&self) -> Style {
        Style::default()
            .bg(self.selection)
            .fg(self.fg)
            .add_modifier(Modifier::BOLD)
    }

    /// Shortcut keys in hints
    #[must_use]
    pub fn key_hint(&self) -> Style {
        Style::default()
            .fg(self.secondary)
            .add_modifier(Modifier::BOLD)
    }

    /// Post button; dimmed while there is nothing to post
    #[must_use]
    pub fn post_button(&self, enabled: bool) -> Style {
        let style = Style::default().fg(Color::White).bg(self.brand);
        if enabled {
            style.add_modifier(Modifier::BOLD)
        } else {
            style.add_modifier(Modifier::DIM)
        }
    }

    /// Failure banner
    #[must_use]
    pub fn banner_error(&self) -> Style {
        Style::default()
            .fg(Color::White)
            .bg(self.error)
            .add_modifier(Modifier::BOLD)
    }
}

/// Brighten an RGB color; named colors are left alone
fn lift(color: Color, amount: u8) -> Color {
    match color {
        Color::Rgb(r, g, b) => Color::Rgb(
            r.saturating_add(amount),
            g.saturating_add(amount),
            b.saturating_add(amount),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lift_saturates() {
        assert_eq!(lift(Color::Rgb(250, 0, 10), 10), Color::Rgb(255, 10, 20));
        assert_eq!(lift(Color::Black, 10), Color::Black);
    }

    #[test]
    fn test_post_button_dims_when_disabled() {
        let colors = Theme::default().colors();
        assert!(colors.post_button(false).add_modifier.contains(Modifier::DIM));
        assert!(colors.post_button(true).add_modifier.contains(Modifier::BOLD));
        assert_eq!(colors.post_button(true).bg, Some(BLUESKY_BLUE));
    }

    #[test]
    fn test_theme_serializes_by_name() {
        let theme = Theme::default();
        let json = serde_json::to_string(&theme).unwrap();
        let back: Theme = serde_json::from_str(&json).unwrap();
        assert_eq!(back, theme);
        assert_eq!(theme.to_string(), theme.name());
    }
}
