//! Ordered-container capability for repeated elements.

use crate::{Error, Result};
use std::any::{Any, type_name};
use std::marker::PhantomData;

/// The contract satisfied by any ordered, appendable container.
///
/// The engine accumulates repeated child elements through this trait so the
/// element-binding logic never depends on a concrete container
/// representation.
pub trait Sequence: Send + Sync {
    /// Instantiate an empty default container.
    fn create(&self) -> Box<dyn Any>;

    /// Insert `item` at the end of `container`, preserving insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCollectionTarget`] when `container` is not
    /// the container type this capability handles, and
    /// [`Error::TypeMismatch`] when `item` is not an item of it.
    fn append(&self, container: &mut dyn Any, item: Box<dyn Any>) -> Result<()>;

    /// A finite, order-preserving traversal of `container` for write-side
    /// serialization.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCollectionTarget`] when `container` is not
    /// the container type this capability handles.
    fn iter<'a>(&self, container: &'a dyn Any)
    -> Result<Box<dyn Iterator<Item = &'a dyn Any> + 'a>>;

    /// Name of the concrete container type, for diagnostics.
    fn container_name(&self) -> &'static str;
}

/// [`Sequence`] over `Vec<T>`, the default growable ordered container.
pub struct VecSequence<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> VecSequence<T> {
    /// Create the capability handle.
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for VecSequence<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Sequence for VecSequence<T> {
    fn create(&self) -> Box<dyn Any> {
        Box::new(Vec::<T>::new())
    }

    fn append(&self, container: &mut dyn Any, item: Box<dyn Any>) -> Result<()> {
        let vec = container
            .downcast_mut::<Vec<T>>()
            .ok_or_else(|| invalid_target::<T>())?;
        let item = item.downcast::<T>().map_err(|_| Error::TypeMismatch {
            field: String::new(),
            expected: type_name::<T>().to_string(),
        })?;
        vec.push(*item);
        Ok(())
    }

    fn iter<'a>(
        &self,
        container: &'a dyn Any,
    ) -> Result<Box<dyn Iterator<Item = &'a dyn Any> + 'a>> {
        let vec = container
            .downcast_ref::<Vec<T>>()
            .ok_or_else(|| invalid_target::<T>())?;
        Ok(Box::new(vec.iter().map(|item| item as &dyn Any)))
    }

    fn container_name(&self) -> &'static str {
        type_name::<Vec<T>>()
    }
}

fn invalid_target<T: 'static>() -> Error {
    Error::InvalidCollectionTarget {
        field: String::new(),
        expected: type_name::<Vec<T>>().to_string(),
    }
}
