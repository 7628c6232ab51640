//! Typography configuration and reader settings resolution.

extern crate alloc;

use alloc::string::String;
use alloc::sync::Arc;

/// Default font size in points.
pub const DEFAULT_FONT_SIZE: f32 = 18.0;
/// Default extra spacing between lines.
pub const DEFAULT_LINE_SPACING: f32 = 8.0;
/// Default spacing after a paragraph.
pub const DEFAULT_PARAGRAPH_SPACING: f32 = 12.0;
/// Default horizontal content padding per side.
pub const DEFAULT_HORIZONTAL_PADDING: f32 = 16.0;
/// Default vertical content padding per side.
pub const DEFAULT_VERTICAL_PADDING: f32 = 32.0;

/// Requested font family.
///
/// `System` is the sentinel for "platform default font"; measurement
/// backends resolve `Named` families and fall back to the platform default
/// at the requested size when the name is unknown.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FontFamily {
    /// Platform default font.
    #[default]
    System,
    /// Explicit family name.
    Named(Arc<str>),
}

impl FontFamily {
    /// Build from a stored family name; empty or `"System"` maps to the
    /// platform-default sentinel.
    pub fn from_name(name: &str) -> Self {
        let trimmed = name.trim();
        if trimmed.is_empty() || trimmed == "System" {
            Self::System
        } else {
            Self::Named(Arc::from(trimmed))
        }
    }

    /// Explicit family name, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::System => None,
            Self::Named(name) => Some(name),
        }
    }
}

impl From<&str> for FontFamily {
    fn from(name: &str) -> Self {
        Self::from_name(name)
    }
}

impl From<String> for FontFamily {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

/// Immutable typography configuration for one pagination pass.
#[derive(Clone, Debug, PartialEq)]
pub struct PaginationConfig {
    /// Requested font family.
    pub font_family: FontFamily,
    /// Base font size in points.
    pub font_size: f32,
    /// Extra spacing between lines.
    pub line_spacing: f32,
    /// Spacing after a paragraph.
    pub paragraph_spacing: f32,
    /// Horizontal content padding per side.
    pub horizontal_padding: f32,
    /// Vertical content padding per side.
    pub vertical_padding: f32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            font_family: FontFamily::System,
            font_size: DEFAULT_FONT_SIZE,
            line_spacing: DEFAULT_LINE_SPACING,
            paragraph_spacing: DEFAULT_PARAGRAPH_SPACING,
            horizontal_padding: DEFAULT_HORIZONTAL_PADDING,
            vertical_padding: DEFAULT_VERTICAL_PADDING,
        }
    }
}

impl PaginationConfig {
    /// Copy with out-of-range values clamped to usable bounds.
    pub fn clamped(&self) -> Self {
        Self {
            font_family: self.font_family.clone(),
            font_size: self.font_size.max(1.0),
            line_spacing: self.line_spacing.max(0.0),
            paragraph_spacing: self.paragraph_spacing.max(0.0),
            horizontal_padding: self.horizontal_padding.max(0.0),
            vertical_padding: self.vertical_padding.max(0.0),
        }
    }
}

/// Host-persisted reader style settings.
///
/// Every accessor defaults to "unset"; [`resolved_config`] fills unset
/// keys with the documented defaults.
pub trait SettingsStore {
    /// Stored font family, if set.
    fn font_family(&self) -> Option<FontFamily> {
        None
    }

    /// Stored font size, if set.
    fn font_size(&self) -> Option<f32> {
        None
    }

    /// Stored line spacing, if set.
    fn line_spacing(&self) -> Option<f32> {
        None
    }

    /// Stored paragraph spacing, if set.
    fn paragraph_spacing(&self) -> Option<f32> {
        None
    }

    /// Stored horizontal padding, if set.
    fn horizontal_padding(&self) -> Option<f32> {
        None
    }

    /// Stored vertical padding, if set.
    fn vertical_padding(&self) -> Option<f32> {
        None
    }
}

/// Compose a [`PaginationConfig`] from a settings store, applying defaults
/// for unset keys and clamping stored values to usable bounds.
pub fn resolved_config(store: &dyn SettingsStore) -> PaginationConfig {
    let defaults = PaginationConfig::default();
    PaginationConfig {
        font_family: store.font_family().unwrap_or(defaults.font_family),
        font_size: store.font_size().unwrap_or(defaults.font_size),
        line_spacing: store.line_spacing().unwrap_or(defaults.line_spacing),
        paragraph_spacing: store
            .paragraph_spacing()
            .unwrap_or(defaults.paragraph_spacing),
        horizontal_padding: store
            .horizontal_padding()
            .unwrap_or(defaults.horizontal_padding),
        vertical_padding: store
            .vertical_padding()
            .unwrap_or(defaults.vertical_padding),
    }
    .clamped()
}

/// In-memory settings store for hosts and tests.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemorySettings {
    pub font_family: Option<FontFamily>,
    pub font_size: Option<f32>,
    pub line_spacing: Option<f32>,
    pub paragraph_spacing: Option<f32>,
    pub horizontal_padding: Option<f32>,
    pub vertical_padding: Option<f32>,
}

impl SettingsStore for MemorySettings {
    fn font_family(&self) -> Option<FontFamily> {
        self.font_family.clone()
    }

    fn font_size(&self) -> Option<f32> {
        self.font_size
    }

    fn line_spacing(&self) -> Option<f32> {
        self.line_spacing
    }

    fn paragraph_spacing(&self) -> Option<f32> {
        self.paragraph_spacing
    }

    fn horizontal_padding(&self) -> Option<f32> {
        self.horizontal_padding
    }

    fn vertical_padding(&self) -> Option<f32> {
        self.vertical_padding
    }
}
