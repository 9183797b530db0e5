//! # xbind-mapping
//!
//! Descriptor-driven object-graph conversion engine for markup trees.
//!
//! This crate converts between markup trees and strongly-typed object graphs
//! using precompiled, immutable mapping descriptors instead of ad-hoc
//! parsing code. The engine recursively walks a pull-style tree cursor,
//! routes attributes, text, and child elements to fields, accumulates
//! repeated elements into collections, and can capture unmapped fragments
//! for a lossless round-trip.

/// Scalar text ⇄ value conversion contract and built-in converters.
pub mod converter;
/// Immutable per-type binding tables and their builder.
pub mod descriptor;
/// The recursive read/write conversion engine.
pub mod engine;
/// Type-erased field access.
pub mod field;
/// Descriptor and converter resolution during recursion.
pub mod registry;
/// Ordered-container capability used for repeated elements.
pub mod sequence;

pub use converter::{ScalarConverter, TypeConverter, default_converters};
pub use descriptor::{
    Cardinality, ConverterRef, DescriptorBuilder, ElementBinding, ElementTarget,
    MappingDescriptor, ScalarBinding,
};
pub use engine::ObjectGraphConverter;
pub use field::FieldAccessor;
pub use registry::MappingRegistry;
pub use sequence::{Sequence, VecSequence};

use thiserror::Error;
use xbind_tree::QName;

/// Errors raised while building descriptors or converting a document.
///
/// Conversion failures are fatal to the conversion call that raised them; a
/// partially-populated object is never returned. Unmapped attributes, and
/// unmapped elements when no capture store is configured, are defined data
/// loss rather than errors.
#[derive(Error, Debug)]
pub enum Error {
    /// The target type could not be constructed.
    #[error("Could not instantiate type {type_name}")]
    Instantiation {
        type_name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Text ⇄ value conversion failed.
    #[error("Cannot convert text '{text}' for field '{field}': {message}")]
    Conversion {
        field: String,
        text: String,
        message: String,
    },

    /// A value did not satisfy the ordered-collection capability bound to
    /// the field.
    #[error("Field '{field}' does not hold the bound collection type (expected {expected})")]
    InvalidCollectionTarget { field: String, expected: String },

    /// No registered converter accepts the field's type.
    #[error("No registered converter accepts type {type_name}")]
    ConverterNotFound { type_name: String },

    /// Exact-type descriptor lookup failed.
    #[error("No mapping descriptor registered for type {type_name}")]
    MissingDescriptor { type_name: String },

    /// A value did not downcast to the type a field accessor expects.
    #[error("Type mismatch on field '{field}': expected {expected}")]
    TypeMismatch { field: String, expected: String },

    /// A second binding was registered under an already-bound name.
    #[error("Duplicate binding registered for name {name}")]
    DuplicateBinding { name: QName },
}

impl Error {
    /// Attach a field name to an error raised below the binding layer.
    ///
    /// Converters and sequences do not know which field they serve; the
    /// engine fills the field in as the error propagates. A field already
    /// present is kept.
    #[must_use]
    pub(crate) fn at_field(self, field_name: &str) -> Self {
        match self {
            Self::Conversion {
                field,
                text,
                message,
            } if field.is_empty() => Self::Conversion {
                field: field_name.to_string(),
                text,
                message,
            },
            Self::TypeMismatch { field, expected } if field.is_empty() => Self::TypeMismatch {
                field: field_name.to_string(),
                expected,
            },
            Self::InvalidCollectionTarget { field, expected } if field.is_empty() => {
                Self::InvalidCollectionTarget {
                    field: field_name.to_string(),
                    expected,
                }
            }
            other => other,
        }
    }
}

/// Crate-local result type for mapping operations.
pub type Result<T> = std::result::Result<T, Error>;
