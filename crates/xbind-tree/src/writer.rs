//! Push-style writer producing a markup tree.

use crate::element::Element;
use crate::qname::QName;
use crate::store::{OwnerKey, SubtreeStore};
use tracing::trace;

/// Push-style writer contract fed by the mapping engine.
///
/// Calls arrive as a flat emission sequence: start tag, attributes, text,
/// children (each a nested start/end pair), replayed fragments, end tag.
pub trait TreeWriter {
    /// Open a new child element under the current position.
    fn start_element(&mut self, name: QName);

    /// Close the innermost open element.
    fn end_element(&mut self);

    /// Add an attribute to the innermost open element.
    fn add_attribute(&mut self, name: QName, value: String);

    /// Append text content to the innermost open element.
    fn add_text(&mut self, text: String);

    /// Emit all fragments captured under `owner`, in capture order, as
    /// children of the innermost open element.
    fn replay_subtrees(&mut self, store: &SubtreeStore, owner: OwnerKey);
}

/// Reference writer that materializes an in-memory [`Element`] tree.
#[derive(Debug, Default)]
pub struct ElementWriter {
    open: Vec<Element>,
    root: Option<Element>,
}

impl ElementWriter {
    /// Create a writer with no open elements.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the completed tree; `None` if nothing was written or an element
    /// is still open.
    pub fn finish(self) -> Option<Element> {
        if self.open.is_empty() { self.root } else { None }
    }
}

impl TreeWriter for ElementWriter {
    fn start_element(&mut self, name: QName) {
        self.open.push(Element::new(name));
    }

    fn end_element(&mut self) {
        debug_assert!(!self.open.is_empty(), "end_element without a start");
        let Some(done) = self.open.pop() else {
            return;
        };
        match self.open.last_mut() {
            Some(parent) => {
                parent.children.push(done);
            }
            None => self.root = Some(done),
        }
    }

    fn add_attribute(&mut self, name: QName, value: String) {
        debug_assert!(!self.open.is_empty(), "add_attribute without a start");
        if let Some(current) = self.open.last_mut() {
            current.attributes.push((name, value));
        }
    }

    fn add_text(&mut self, text: String) {
        debug_assert!(!self.open.is_empty(), "add_text without a start");
        if let Some(current) = self.open.last_mut() {
            current.text.push_str(&text);
        }
    }

    fn replay_subtrees(&mut self, store: &SubtreeStore, owner: OwnerKey) {
        let fragments = store.fragments(owner);
        if fragments.is_empty() {
            return;
        }
        trace!(?owner, count = fragments.len(), "replaying captured subtrees");
        if let Some(current) = self.open.last_mut() {
            current.children.extend_from_slice(fragments);
        }
    }
}
