//! Pull-style cursor over a markup tree.

use crate::element::Element;
use crate::qname::QName;
use crate::store::{OwnerKey, SubtreeStore};
use tracing::trace;

/// Pull-style cursor contract consumed by the mapping engine.
///
/// All position state lives in the implementation; the engine only mirrors
/// tree depth with its own recursion depth. `descend` visits each child once
/// in document order, and every successful `descend` is paired with exactly
/// one `ascend`.
pub trait TreeReader {
    /// Name at the current cursor position.
    fn current_name(&self) -> QName;

    /// Direct text content of the current element.
    fn current_text(&self) -> String;

    /// Attributes of the current element, finite, one pass.
    fn attributes(&self) -> Vec<(QName, String)>;

    /// Move to the next unvisited child; false when no children remain at
    /// this level.
    fn descend(&mut self) -> bool;

    /// Move back to the parent of the current position.
    fn ascend(&mut self);

    /// Serialize the fragment at the current position verbatim into `store`,
    /// keyed by `owner`.
    fn capture_subtree(&self, store: &mut SubtreeStore, owner: OwnerKey);
}

/// Reference cursor over an in-memory [`Element`] tree.
pub struct ElementCursor<'a> {
    // (node, index of the next unvisited child); the last entry is the
    // current position.
    stack: Vec<(&'a Element, usize)>,
}

impl<'a> ElementCursor<'a> {
    /// Position a cursor at the given element start.
    #[must_use]
    pub fn new(root: &'a Element) -> Self {
        Self {
            stack: vec![(root, 0)],
        }
    }

    fn current(&self) -> &'a Element {
        // The stack is never empty: new() seeds the root and ascend()
        // refuses to pop it.
        let (node, _) = self.stack[self.stack.len() - 1];
        node
    }
}

impl TreeReader for ElementCursor<'_> {
    fn current_name(&self) -> QName {
        self.current().name.clone()
    }

    fn current_text(&self) -> String {
        self.current().text.clone()
    }

    fn attributes(&self) -> Vec<(QName, String)> {
        self.current().attributes.clone()
    }

    fn descend(&mut self) -> bool {
        // Copy the node reference out so the child borrow comes from the
        // tree, not from the stack entry.
        let Some(&mut (node, ref mut next)) = self.stack.last_mut() else {
            return false;
        };
        if *next < node.children.len() {
            let child = &node.children[*next];
            *next += 1;
            self.stack.push((child, 0));
            true
        } else {
            false
        }
    }

    fn ascend(&mut self) {
        debug_assert!(self.stack.len() > 1, "ascend called at the root");
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    fn capture_subtree(&self, store: &mut SubtreeStore, owner: OwnerKey) {
        let fragment = self.current().clone();
        trace!(name = %fragment.name, ?owner, "captured unmapped subtree");
        store.push(owner, fragment);
    }
}
