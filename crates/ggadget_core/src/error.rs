//! Error types for the gadget core

use thiserror::Error;

/// Errors raised at the view/element boundary
#[derive(Error, Debug)]
pub enum GadgetError {
    /// No element constructor is registered for the tag
    #[error("Unknown element tag: {0}")]
    UnknownTag(String),

    /// Geometry string could not be parsed as a pixel or percentage value
    #[error("Invalid geometry value: {0:?}")]
    InvalidGeometry(String),

    /// The element id does not refer to a live element
    #[error("Element not found")]
    ElementNotFound,

    /// The timer token is unknown or the timer already completed
    #[error("Timer not found: {0}")]
    TimerNotFound(u32),

    /// The parent element cannot hold children
    #[error("Element <{0}> does not allow children")]
    ChildrenNotAllowed(String),

    /// The view was torn down
    #[error("View has been destroyed")]
    ViewDestroyed,

    /// Operation requires an attached view host
    #[error("No view host attached")]
    NoHost,

    /// The graphics backend refused to create a canvas
    #[error("Failed to create {width}x{height} canvas")]
    CanvasCreation { width: u32, height: u32 },

    /// Configuration could not be parsed
    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

/// Result type for gadget operations
pub type Result<T> = std::result::Result<T, GadgetError>;
