//! Descriptor and converter resolution.

use crate::converter::{TypeConverter, default_converters};
use crate::descriptor::MappingDescriptor;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

/// Resolves descriptors and converters during recursion.
///
/// Descriptor lookup is exact-type; no runtime discovery happens here, the
/// descriptor set is precompiled. The registry is built once, read-only
/// afterwards, and safe to share across concurrent conversions.
#[derive(Default)]
pub struct MappingRegistry {
    descriptors: HashMap<TypeId, Arc<MappingDescriptor>>,
    converters: Vec<Arc<dyn TypeConverter>>,
}

impl MappingRegistry {
    /// Create an empty registry with no converters installed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor under its target type.
    pub fn register(&mut self, descriptor: MappingDescriptor) {
        self.descriptors
            .insert(descriptor.type_id(), Arc::new(descriptor));
    }

    /// Append a converter to the resolution order.
    ///
    /// Converters are tried in registration order; register custom
    /// converters before installing the defaults to give them precedence.
    pub fn register_converter(&mut self, converter: impl TypeConverter + 'static) {
        self.converters.push(Arc::new(converter));
    }

    /// Append the built-in scalar converters.
    pub fn install_default_converters(&mut self) {
        self.converters.extend(default_converters());
    }

    /// Exact-type descriptor lookup.
    #[must_use]
    pub fn descriptor(&self, type_id: TypeId) -> Option<&Arc<MappingDescriptor>> {
        self.descriptors.get(&type_id)
    }

    /// Descriptor lookup by type parameter.
    #[must_use]
    pub fn descriptor_of<T: 'static>(&self) -> Option<&Arc<MappingDescriptor>> {
        self.descriptor(TypeId::of::<T>())
    }

    /// First registered converter accepting the given type.
    #[must_use]
    pub fn converter_for(&self, type_id: TypeId) -> Option<&Arc<dyn TypeConverter>> {
        self.converters.iter().find(|c| c.can_convert(type_id))
    }
}
