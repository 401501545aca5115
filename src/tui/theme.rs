//! Color palettes for the review surface.

use ratatui::style::Color;

/// Colors used by the review surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    /// Borders, header, group rows
    pub primary: Color,
    /// Cursor and key hints
    pub secondary: Color,
    /// Files marked for deletion
    pub danger: Color,
    /// Empty-state message
    pub success: Color,
    /// Idle status line
    pub dim: Color,
    /// Unmarked files
    pub normal: Color,
    /// Text on the cursor bar
    pub inverted_fg: Color,
}

impl Theme {
    /// High-contrast palette for dark terminals (default).
    #[must_use]
    pub fn dark() -> Self {
        Self {
            primary: Color::Cyan,
            secondary: Color::Yellow,
            danger: Color::Red,
            success: Color::Green,
            dim: Color::DarkGray,
            normal: Color::White,
            inverted_fg: Color::Black,
        }
    }

    /// Palette for light terminals.
    #[must_use]
    pub fn light() -> Self {
        Self {
            primary: Color::Blue,
            secondary: Color::Magenta,
            danger: Color::Red,
            success: Color::Green,
            dim: Color::Gray,
            normal: Color::Black,
            inverted_fg: Color::White,
        }
    }

    /// Pick a palette from the `COLORFGBG` hint, dark when unknown.
    #[must_use]
    pub fn detect() -> Self {
        match std::env::var("COLORFGBG") {
            Ok(value) if is_light_background(&value) => Self::light(),
            _ => Self::dark(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

/// `COLORFGBG` is "fg;bg"; background 7 and 9..=15 are light.
fn is_light_background(colorfgbg: &str) -> bool {
    colorfgbg
        .rsplit(';')
        .next()
        .and_then(|bg| bg.parse::<u8>().ok())
        .is_some_and(|bg| bg >= 7 && bg != 8)
}
