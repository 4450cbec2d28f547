//! Terminal styling and color detection.
//!
//! Stage status lines are colored by state: white while running, green once
//! completed and red on failure. Everything collapses to plain text when the
//! terminal cannot render ANSI escapes or the user opts out.

/// ANSI escape codes used by the progress renderer.
pub mod colors {
    /// Reset all styling.
    pub const RESET: &str = "\x1b[0m";
    /// Bright white for running stages.
    pub const WHITE: &str = "\x1b[97m";
    /// Green for completed stages.
    pub const GREEN: &str = "\x1b[32m";
    /// Red for failed stages.
    pub const RED: &str = "\x1b[31m";
    /// Gray for secondary text (paths, counts).
    pub const GRAY: &str = "\x1b[90m";
    /// Bold yellow for warnings.
    pub const YELLOW_BOLD: &str = "\x1b[1;33m";
}

/// Resolved color codes, either ANSI sequences or empty strings when color is
/// disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorPalette {
    pub reset: &'static str,
    pub white: &'static str,
    pub green: &'static str,
    pub red: &'static str,
    pub gray: &'static str,
    pub warning: &'static str,
}

impl ColorPalette {
    #[must_use]
    pub const fn colored() -> Self {
        Self {
            reset: colors::RESET,
            white: colors::WHITE,
            green: colors::GREEN,
            red: colors::RED,
            gray: colors::GRAY,
            warning: colors::YELLOW_BOLD,
        }
    }

    #[must_use]
    pub const fn plain() -> Self {
        Self {
            reset: "",
            white: "",
            green: "",
            red: "",
            gray: "",
            warning: "",
        }
    }

    /// `colored()` when the terminal supports ANSI colors, `plain()` otherwise.
    #[must_use]
    pub fn detect() -> Self {
        if supports_color() {
            Self::colored()
        } else {
            Self::plain()
        }
    }

    /// Palette honoring an explicit `--no-color` before falling back to
    /// detection.
    #[must_use]
    pub fn resolve(no_color: bool) -> Self {
        if no_color {
            Self::plain()
        } else {
            Self::detect()
        }
    }
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self::detect()
    }
}

/// Check if the terminal supports ANSI color codes.
///
/// Respects the `NO_COLOR` environment variable (https://no-color.org/) and
/// the `TERM=dumb` convention.
#[must_use]
pub fn supports_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if let Ok(term) = std::env::var("TERM") {
        if term.eq_ignore_ascii_case("dumb") {
            return false;
        }
    }
    true
}
