//! Element factory
//!
//! Maps tag names to behavior constructors. Tags are case-insensitive.

use std::fmt;
use std::rc::Rc;

use ggadget_core::{GadgetError, Result};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::behavior::ElementBehavior;
use crate::builtin::{DivElement, ImgElement};

type Constructor = Box<dyn Fn() -> Rc<dyn ElementBehavior>>;

/// Creates element behaviors by tag name
#[derive(Default)]
pub struct ElementFactory {
    constructors: FxHashMap<String, Constructor>,
}

impl ElementFactory {
    /// An empty factory
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory that knows `div` and `img`
    pub fn with_builtins() -> Self {
        let mut factory = Self::new();
        factory.register("div", || Rc::new(DivElement::new()));
        factory.register("img", || Rc::new(ImgElement::new()));
        factory
    }

    /// Register a constructor, replacing any previous one for the tag
    pub fn register(
        &mut self,
        tag: &str,
        constructor: impl Fn() -> Rc<dyn ElementBehavior> + 'static,
    ) {
        let key = tag.to_ascii_lowercase();
        if self.constructors.insert(key, Box::new(constructor)).is_some() {
            debug!("Replaced constructor for <{}>", tag);
        }
    }

    pub fn is_registered(&self, tag: &str) -> bool {
        self.constructors.contains_key(&tag.to_ascii_lowercase())
    }

    pub fn create(&self, tag: &str) -> Result<Rc<dyn ElementBehavior>> {
        self.constructors
            .get(&tag.to_ascii_lowercase())
            .map(|constructor| constructor())
            .ok_or_else(|| GadgetError::UnknownTag(tag.to_string()))
    }

    /// Registered tags in no particular order
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }
}

impl fmt::Debug for ElementFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<_> = self.tags().collect();
        tags.sort_unstable();
        f.debug_struct("ElementFactory").field("tags", &tags).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_case_insensitive() {
        let factory = ElementFactory::with_builtins();
        assert!(factory.is_registered("DIV"));
        assert_eq!(factory.create("Img").unwrap().tag_name(), "img");
        assert!(factory.create("div").unwrap().allows_children());
    }

    #[test]
    fn test_unknown_tag() {
        let factory = ElementFactory::new();
        assert!(matches!(
            factory.create("button"),
            Err(GadgetError::UnknownTag(tag)) if tag == "button"
        ));
    }

    #[test]
    fn test_register_replaces() {
        let mut factory = ElementFactory::with_builtins();
        factory.register("DIV", || Rc::new(ImgElement::new()));
        assert_eq!(factory.create("div").unwrap().tag_name(), "img");
        assert_eq!(factory.tags().count(), 2);
    }
}
