//! Built-in element types

mod div;
mod img;

pub use div::DivElement;
pub use img::ImgElement;
