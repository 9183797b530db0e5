//! Capture store for unmapped subtrees.
//!
//! The store lives for a single read/write round-trip. The read pass
//! allocates one [`OwnerKey`] per object it creates and files every unmapped
//! fragment under the key of the object that owns it; the write pass replays
//! those fragments when it reaches the same object again.

use crate::element::Element;
use std::collections::HashMap;

/// Opaque identity handle for one object created during a read pass.
///
/// Rust values have no stable language-level identity once they move into a
/// parent field, so the store acts as an arena: keys are handed out in
/// creation order and never reused within one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerKey(u64);

/// Per-conversion buffer of captured fragments, keyed by owning object.
///
/// Besides the fragments themselves, the store records how owner keys are
/// routed through the mapped object graph (`link_child`), so a later write
/// pass can recover the key of a nested object from its structural position.
/// A store must never be shared across unrelated conversions.
#[derive(Debug, Default)]
pub struct SubtreeStore {
    next: u64,
    fragments: HashMap<OwnerKey, Vec<Element>>,
    links: HashMap<(OwnerKey, usize), Vec<OwnerKey>>,
    root: Option<OwnerKey>,
}

impl SubtreeStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the identity key for a newly created object.
    ///
    /// The first key allocated by a store is remembered as the root key.
    pub fn allocate(&mut self) -> OwnerKey {
        let key = OwnerKey(self.next);
        self.next += 1;
        if self.root.is_none() {
            self.root = Some(key);
        }
        key
    }

    /// Key of the first object the read pass created, if any.
    #[must_use]
    pub fn root(&self) -> Option<OwnerKey> {
        self.root
    }

    /// File a captured fragment under its owning object, preserving capture
    /// order among siblings.
    pub fn push(&mut self, owner: OwnerKey, fragment: Element) {
        self.fragments.entry(owner).or_default().push(fragment);
    }

    /// Fragments captured under the given owner, in capture order.
    #[must_use]
    pub fn fragments(&self, owner: OwnerKey) -> &[Element] {
        self.fragments.get(&owner).map_or(&[], Vec::as_slice)
    }

    /// Record that `child` was produced for `parent` through binding slot
    /// `slot`, in encounter order.
    pub fn link_child(&mut self, parent: OwnerKey, slot: usize, child: OwnerKey) {
        self.links.entry((parent, slot)).or_default().push(child);
    }

    /// Keys recorded for `parent`'s binding slot `slot`, in encounter order.
    #[must_use]
    pub fn linked_children(&self, parent: OwnerKey, slot: usize) -> &[OwnerKey] {
        self.links.get(&(parent, slot)).map_or(&[], Vec::as_slice)
    }

    /// True when no fragment has been captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}
