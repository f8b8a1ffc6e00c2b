//! Icons and colors shared by console output.

use crossterm::style::Color;

/// Visual constants for console output.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Status icons
    pub icons: Icons,
    /// Colors for message kinds
    pub colors: ColorScheme,
    /// Width of section rules
    pub rule_width: usize,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            icons: Icons::default(),
            colors: ColorScheme::default(),
            rule_width: 40,
        }
    }
}

/// Status icons
#[derive(Debug, Clone)]
pub struct Icons {
    /// File copied or transformed (↻)
    pub updated: &'static str,
    /// File already current (=)
    pub unchanged: &'static str,
    /// Success (✓)
    pub success: &'static str,
    /// Error (✗)
    pub error: &'static str,
    /// Warning (⚠)
    pub warning: &'static str,
    /// Info (ℹ)
    pub info: &'static str,
}

impl Default for Icons {
    fn default() -> Self {
        Self {
            updated: "↻",
            unchanged: "=",
            success: "✓",
            error: "✗",
            warning: "⚠",
            info: "ℹ",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub file_name: Color,
    pub secondary: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            file_name: Color::Cyan,
            secondary: Color::DarkGrey,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
        }
    }
}
