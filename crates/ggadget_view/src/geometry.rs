//! Element geometry values
//!
//! Each of x, y, width, height and the pin coordinates is stored as a
//! [`Dimension`]: an absolute pixel value, a fraction of a reference length,
//! or unspecified. Relative values are resolved when queried, never cached.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use ggadget_core::{GadgetError, Result};

/// A pixel, relative or unspecified length
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Dimension {
    /// Falls back to the element's default
    #[default]
    Unspecified,
    /// Absolute pixel value
    Pixel(f64),
    /// Fraction of the reference length; `0.5` means 50%
    Relative(f64),
}

impl Dimension {
    /// Parse `"12"`/`"12.5"` as pixels and `"50%"` as relative
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let invalid = || GadgetError::InvalidGeometry(text.to_string());
        let (number, relative) = match trimmed.strip_suffix('%') {
            Some(number) => (number.trim_end(), true),
            None => (trimmed, false),
        };
        let value: f64 = number.parse().map_err(|_| invalid())?;
        if !value.is_finite() {
            return Err(invalid());
        }
        Ok(if relative {
            Dimension::Relative(value / 100.0)
        } else {
            Dimension::Pixel(value)
        })
    }

    /// Parse, treating malformed input as unspecified
    pub fn parse_or_unspecified(text: &str) -> Self {
        Self::parse(text).unwrap_or_else(|err| {
            tracing::debug!("{}; treating as unspecified", err);
            Dimension::Unspecified
        })
    }

    pub fn is_specified(&self) -> bool {
        !matches!(self, Dimension::Unspecified)
    }

    pub fn is_relative(&self) -> bool {
        matches!(self, Dimension::Relative(_))
    }

    /// Whether the stored number is finite; unspecified counts as finite
    pub fn is_finite(&self) -> bool {
        match *self {
            Dimension::Unspecified => true,
            Dimension::Pixel(value) | Dimension::Relative(value) => value.is_finite(),
        }
    }

    /// Whether the stored number is negative
    pub fn is_negative(&self) -> bool {
        match *self {
            Dimension::Unspecified => false,
            Dimension::Pixel(value) | Dimension::Relative(value) => value < 0.0,
        }
    }

    /// Resolve against `reference`, or `fallback` when unspecified
    pub fn resolve(&self, reference: f64, fallback: f64) -> f64 {
        match *self {
            Dimension::Unspecified => fallback,
            Dimension::Pixel(value) => value,
            Dimension::Relative(fraction) => fraction * reference,
        }
    }
}

impl FromStr for Dimension {
    type Err = GadgetError;

    fn from_str(s: &str) -> Result<Self> {
        Dimension::parse(s)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Dimension::Unspecified => Ok(()),
            Dimension::Pixel(value) => write!(f, "{value}"),
            Dimension::Relative(fraction) => write!(f, "{}%", fraction * 100.0),
        }
    }
}

impl From<f64> for Dimension {
    fn from(value: f64) -> Self {
        Dimension::Pixel(value)
    }
}

/// Lenient conversion used by attribute-style setters
impl From<&str> for Dimension {
    fn from(text: &str) -> Self {
        Dimension::parse_or_unspecified(text)
    }
}

bitflags! {
    /// Mirroring applied when drawing an element
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct FlipMode: u8 {
        const NONE = 0;
        const HORIZONTAL = 1 << 0;
        const VERTICAL = 1 << 1;
        const BOTH = Self::HORIZONTAL.bits() | Self::VERTICAL.bits();
    }
}

/// What a hit on an element means to the host window
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HitTest {
    /// Events pass through to whatever is below
    Transparent,
    Nowhere,
    /// Normal client area
    #[default]
    Client,
    /// Dragging here moves the window
    Caption,
    SysMenu,
    Size,
    Menu,
    HScroll,
    VScroll,
    MinButton,
    MaxButton,
    Left,
    Right,
    Top,
    TopLeft,
    TopRight,
    Bottom,
    BottomLeft,
    BottomRight,
    Border,
    Object,
    Close,
    Help,
}

/// Stored placement of an element within its parent
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Geometry {
    pub x: Dimension,
    pub y: Dimension,
    pub width: Dimension,
    pub height: Dimension,
    pub pin_x: Dimension,
    pub pin_y: Dimension,
    /// Degrees, clockwise
    pub rotation: f64,
    pub flip: FlipMode,
}

impl Geometry {
    /// Whether any placement value depends on the parent's size
    pub fn depends_on_parent(&self) -> bool {
        self.x.is_relative()
            || self.y.is_relative()
            || self.width.is_relative()
            || self.height.is_relative()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pixel_and_relative() {
        assert_eq!(Dimension::parse("12").ok(), Some(Dimension::Pixel(12.0)));
        assert_eq!(Dimension::parse(" 12.5 ").ok(), Some(Dimension::Pixel(12.5)));
        assert_eq!(Dimension::parse("50%").ok(), Some(Dimension::Relative(0.5)));
        assert_eq!(Dimension::parse("-20%").ok(), Some(Dimension::Relative(-0.2)));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for text in ["", "%", "abc", "12px", "NaN", "inf", "5%%"] {
            assert!(Dimension::parse(text).is_err(), "{text:?} should fail");
            assert_eq!(Dimension::parse_or_unspecified(text), Dimension::Unspecified);
        }
    }

    #[test]
    fn test_display_round_trips_text_form() {
        assert_eq!(Dimension::Pixel(12.0).to_string(), "12");
        assert_eq!(Dimension::Relative(0.5).to_string(), "50%");
        assert_eq!(Dimension::Unspecified.to_string(), "");
    }

    #[test]
    fn test_conversions() {
        assert_eq!(Dimension::from(4.0), Dimension::Pixel(4.0));
        assert_eq!(Dimension::from("25%"), Dimension::Relative(0.25));
        assert_eq!(Dimension::from("wide"), Dimension::Unspecified);
        assert!(!Dimension::Pixel(f64::NAN).is_finite());
        assert!(Dimension::Relative(-0.1).is_negative());
    }

    #[test]
    fn test_resolve() {
        assert_eq!(Dimension::Relative(0.25).resolve(200.0, 7.0), 50.0);
        assert_eq!(Dimension::Pixel(3.0).resolve(200.0, 7.0), 3.0);
        assert_eq!(Dimension::Unspecified.resolve(200.0, 7.0), 7.0);
    }
}
