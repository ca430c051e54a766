//! Color and styling helpers for CLI output.
//!
//! Service kinds are printed in the same color the render layer would fill
//! their node with, so terminal listings and drawn graphs agree.

use crate::domain::ServiceKind;
use crate::render::StyleSheet;
use colored::{Color, Colorize};

use super::OutputConfig;

/// Colorize a service name (cyan, bold).
pub(crate) fn colorize_name(name: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return name.to_string();
    }
    name.cyan().bold().to_string()
}

/// Colorize a kind tag with its style sheet color.
pub(crate) fn colorize_kind(
    kind: &ServiceKind,
    styles: &StyleSheet,
    config: &OutputConfig,
) -> String {
    let text = kind.as_str();
    if !config.use_colors {
        return text.to_string();
    }
    let color = Color::from(styles.style_for(kind).color.as_str());
    text.color(color).to_string()
}

/// Apply dimmed style.
pub(crate) fn dimmed(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.dimmed().to_string()
}

/// Apply bold style.
pub(crate) fn bold(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.bold().to_string()
}
