//! View configuration presets.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How the host may resize a view
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizableMode {
    /// Size is fixed by the gadget
    Fixed,
    /// User may resize freely
    #[default]
    Free,
    /// User may only zoom, keeping the aspect ratio
    Zoom,
}

/// Debug drawing of element bounds
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebugMode {
    #[default]
    Disabled,
    /// Outline container elements only
    Container,
    /// Outline every element
    All,
}

/// Configuration of a single view.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Initial width in pixels.
    pub width: u32,
    /// Initial height in pixels.
    pub height: u32,
    /// Tick period of animation timers (ms).
    pub animation_interval_ms: u64,
    /// Interval and animation firings closer than this to the end of the
    /// previous firing are dropped (ms).
    pub min_timer_interval_ms: u64,
    pub debug_mode: DebugMode,
    pub resizable: ResizableMode,
    pub caption: String,
    pub show_caption_always: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl ViewConfig {
    /// Standard configuration for general use.
    pub fn standard() -> Self {
        Self {
            width: 200,
            height: 200,
            animation_interval_ms: 20,
            min_timer_interval_ms: 5,
            debug_mode: DebugMode::Disabled,
            resizable: ResizableMode::Free,
            caption: String::new(),
            show_caption_always: false,
        }
    }

    /// Debug configuration outlining every element.
    pub fn debug() -> Self {
        Self {
            debug_mode: DebugMode::All,
            ..Self::standard()
        }
    }

    /// Testing configuration with a fixed, round-numbered surface.
    pub fn testing() -> Self {
        Self {
            width: 100,
            height: 100,
            ..Self::standard()
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Parse a TOML document; missing keys take their standard values
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }
}
