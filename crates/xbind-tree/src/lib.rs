#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # xbind-tree
//!
//! Markup tree model and traversal collaborators for the xbind codec.
//!
//! This crate provides the tree-shaped data the mapping engine consumes and
//! produces: qualified names, an in-memory element tree, pull-style cursor
//! and push-style writer contracts (with reference implementations over the
//! in-memory tree), and the capture store used to preserve unmapped
//! fragments across a read/write round-trip.

/// Pull-style cursor contract and the in-memory reference cursor.
pub mod cursor;
/// In-memory element tree node.
pub mod element;
/// Namespace-qualified names.
pub mod qname;
/// Capture store for unmapped subtrees.
pub mod store;
/// Push-style writer contract and the in-memory reference writer.
pub mod writer;

pub use cursor::{ElementCursor, TreeReader};
pub use element::Element;
pub use qname::QName;
pub use store::{OwnerKey, SubtreeStore};
pub use writer::{ElementWriter, TreeWriter};
