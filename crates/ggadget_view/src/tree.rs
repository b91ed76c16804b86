//! Element arena
//!
//! Elements live in a slotmap owned by the view. Parents refer to children
//! by [`ElementId`] and children keep their parent's id, so the tree has a
//! single owner and no reference cycles. Ids are generation tagged: once an
//! element is removed its id never resolves again, even if the slot is reused.

use std::rc::Rc;

use ggadget_core::{Canvas, CursorType, Image};
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

use crate::behavior::ElementBehavior;
use crate::elements::Elements;
use crate::geometry::{Geometry, HitTest};
use crate::signal::SignalTable;

new_key_type! {
    /// Handle to an element of a view
    pub struct ElementId;
}

/// Ancestor chains are short; keep them off the heap
pub type AncestorChain = SmallVec<[ElementId; 8]>;

/// Dirty state of an element
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChangeFlags {
    /// Set when x, y, pin or rotation change; cleared explicitly
    pub position_changed: bool,
    /// Set when the pixel size may have changed; cleared by each draw
    pub size_changed: bool,
    /// Set when the element must be redrawn; cleared by each draw
    pub visual_changed: bool,
}

/// Clipping mask of an element
#[derive(Clone, Default)]
pub struct Mask {
    pub name: String,
    pub image: Option<Rc<dyn Image>>,
}

/// A single node of the element tree
pub struct ElementNode {
    pub(crate) tag: String,
    pub(crate) name: String,
    pub(crate) behavior: Rc<dyn ElementBehavior>,
    pub(crate) parent: Option<ElementId>,
    /// Position within the parent's child list, maintained by the parent
    pub(crate) index: usize,
    /// Present only when the behavior allows children
    pub(crate) children: Option<Elements>,
    pub(crate) geometry: Geometry,
    pub(crate) visible: bool,
    pub(crate) enabled: bool,
    pub(crate) opacity: f64,
    pub(crate) hit_test: HitTest,
    pub(crate) cursor: CursorType,
    pub(crate) tooltip: String,
    pub(crate) drop_target: bool,
    /// Hit-testable but inert to input; inherited by descendants
    pub(crate) designer_mode: bool,
    pub(crate) mask: Mask,
    pub(crate) flags: ChangeFlags,
    pub(crate) cache_enabled: bool,
    pub(crate) cached_canvas: Option<Box<dyn Canvas>>,
    pub(crate) signals: SignalTable,
}

impl ElementNode {
    pub(crate) fn new(
        tag: &str,
        name: &str,
        behavior: Rc<dyn ElementBehavior>,
        parent: Option<ElementId>,
    ) -> Self {
        let children = behavior.allows_children().then(Elements::default);
        Self {
            tag: tag.to_string(),
            name: name.to_string(),
            behavior,
            parent,
            index: 0,
            children,
            geometry: Geometry::default(),
            visible: true,
            enabled: true,
            opacity: 1.0,
            hit_test: HitTest::default(),
            cursor: CursorType::default(),
            tooltip: String::new(),
            drop_target: false,
            designer_mode: false,
            mask: Mask::default(),
            flags: ChangeFlags {
                position_changed: true,
                size_changed: true,
                visual_changed: true,
            },
            cache_enabled: false,
            cached_canvas: None,
            signals: SignalTable::default(),
        }
    }
}

/// Storage for all elements of a view
#[derive(Default)]
pub struct ElementTree {
    nodes: SlotMap<ElementId, ElementNode>,
}

impl ElementTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.nodes.contains_key(id)
    }

    pub(crate) fn insert(&mut self, node: ElementNode) -> ElementId {
        self.nodes.insert(node)
    }

    pub(crate) fn remove(&mut self, id: ElementId) -> Option<ElementNode> {
        self.nodes.remove(id)
    }

    pub(crate) fn get(&self, id: ElementId) -> Option<&ElementNode> {
        self.nodes.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: ElementId) -> Option<&mut ElementNode> {
        self.nodes.get_mut(id)
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    /// Ancestors of `id` from the top-level element down to `id` itself
    pub fn path_from_root(&self, id: ElementId) -> AncestorChain {
        let mut chain = AncestorChain::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            if !self.nodes.contains_key(node_id) {
                break;
            }
            chain.push(node_id);
            current = self.parent(node_id);
        }
        chain.reverse();
        chain
    }

    /// Whether `ancestor` is `id` or one of its ancestors
    pub fn is_ancestor_or_self(&self, ancestor: ElementId, id: ElementId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            if node_id == ancestor {
                return true;
            }
            current = self.parent(node_id);
        }
        false
    }
}
