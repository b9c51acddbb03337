//! Colour handling for terminal output
//!
//! Honours `--no-color`, `--color` and the `NO_COLOR` environment variable.

use colored::{ColoredString, Colorize};

/// Manages colour output for the CLI application
#[derive(Debug, Clone)]
pub struct ColourManager {
    enabled: bool,
}

impl ColourManager {
    /// Colours on unless `NO_COLOR` is set
    pub fn new() -> Self {
        Self { enabled: std::env::var_os("NO_COLOR").is_none() }
    }

    pub fn with_colours(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Create a ColourManager from the CLI colour flags
    ///
    /// `--no-color` wins over `--color`, which wins over the environment.
    pub fn from_color_args(no_color: bool, color: bool) -> Self {
        if no_color {
            Self::with_colours(false)
        } else if color {
            colored::control::set_override(true);
            Self::with_colours(true)
        } else {
            Self::new()
        }
    }

    pub fn colours_enabled(&self) -> bool {
        self.enabled
    }

    /// Headings and table headers
    pub fn highlight(&self, text: &str) -> ColoredString {
        if self.enabled { text.cyan().bold() } else { text.normal() }
    }

    /// Separators and secondary text
    pub fn info(&self, text: &str) -> ColoredString {
        if self.enabled { text.blue() } else { text.normal() }
    }

    pub fn success(&self, text: &str) -> ColoredString {
        if self.enabled { text.green() } else { text.normal() }
    }

    pub fn warning(&self, text: &str) -> ColoredString {
        if self.enabled { text.yellow() } else { text.normal() }
    }
}

impl Default for ColourManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colour_manager_explicit_disable() {
        let manager = ColourManager::with_colours(false);
        assert!(!manager.colours_enabled());
        assert_eq!(manager.highlight("Year").to_string(), "Year");
    }

    #[test]
    fn test_no_color_flag_wins() {
        let manager = ColourManager::from_color_args(true, true);
        assert!(!manager.colours_enabled());
    }
}
