//! Immutable per-type binding tables.

use crate::converter::TypeConverter;
use crate::field::FieldAccessor;
use crate::registry::MappingRegistry;
use crate::sequence::Sequence;
use crate::{Error, Result};
use std::any::{Any, TypeId, type_name};
use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;
use std::sync::Arc;
use xbind_tree::QName;

type ConstructFn =
    Box<dyn Fn() -> std::result::Result<Box<dyn Any>, BoxedCause> + Send + Sync>;

type BoxedCause = Box<dyn std::error::Error + Send + Sync>;

/// How many times a bound child element may occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// At most one value; a repeated occurrence overwrites the previous one.
    Single,
    /// Any number of values, accumulated in document order.
    Collection,
}

/// Reference to the converter serving a scalar binding: either held inline
/// or resolved through the registry's ordered converter list at conversion
/// time.
pub enum ConverterRef {
    /// A converter bound directly to this binding.
    Inline(Arc<dyn TypeConverter>),
    /// Resolve by type, first registered converter that accepts it wins.
    ByType {
        type_id: TypeId,
        type_name: &'static str,
    },
}

impl ConverterRef {
    /// Bind a converter directly.
    pub fn inline(converter: impl TypeConverter + 'static) -> Self {
        Self::Inline(Arc::new(converter))
    }

    /// Defer to the registry's converter list for type `T`.
    #[must_use]
    pub fn of<T: 'static>() -> Self {
        Self::ByType {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }

    pub(crate) fn resolve<'a>(&'a self, registry: &'a MappingRegistry) -> Result<&'a dyn TypeConverter> {
        match self {
            Self::Inline(converter) => Ok(converter.as_ref()),
            Self::ByType { type_id, type_name } => registry
                .converter_for(*type_id)
                .map(Arc::as_ref)
                .ok_or_else(|| Error::ConverterNotFound {
                    type_name: (*type_name).to_string(),
                }),
        }
    }
}

/// Binding from element text or an attribute value to one scalar field.
pub struct ScalarBinding {
    field: FieldAccessor,
    converter: ConverterRef,
    format: Option<String>,
}

impl ScalarBinding {
    /// Bind a field through the given converter reference.
    #[must_use]
    pub fn new(field: FieldAccessor, converter: ConverterRef) -> Self {
        Self {
            field,
            converter,
            format: None,
        }
    }

    /// Attach a format string passed through to the converter.
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// The bound field.
    #[must_use]
    pub fn field(&self) -> &FieldAccessor {
        &self.field
    }

    pub(crate) fn converter(&self) -> &ConverterRef {
        &self.converter
    }

    pub(crate) fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }
}

/// What a bound child element converts to.
pub enum ElementTarget {
    /// A nested mapped object; the descriptor is resolved through the
    /// registry by type, which also allows recursive type graphs.
    Mapped {
        type_id: TypeId,
        type_name: &'static str,
    },
    /// A scalar built from the child element's text.
    Text {
        converter: ConverterRef,
        format: Option<String>,
    },
}

impl ElementTarget {
    /// Target a nested mapped type.
    #[must_use]
    pub fn mapped<T: 'static>() -> Self {
        Self::Mapped {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }

    /// Target the child's text through a converter.
    #[must_use]
    pub fn text(converter: ConverterRef) -> Self {
        Self::Text {
            converter,
            format: None,
        }
    }

    /// Target the child's text through a converter with a format string.
    #[must_use]
    pub fn text_with_format(converter: ConverterRef, format: impl Into<String>) -> Self {
        Self::Text {
            converter,
            format: Some(format.into()),
        }
    }
}

/// A child-element rule: target field, cardinality, and what the child
/// converts to.
pub struct ElementBinding {
    field: FieldAccessor,
    cardinality: Cardinality,
    sequence: Option<Arc<dyn Sequence>>,
    target: ElementTarget,
}

impl ElementBinding {
    /// A child that occurs at most once.
    #[must_use]
    pub fn single(field: FieldAccessor, target: ElementTarget) -> Self {
        Self {
            field,
            cardinality: Cardinality::Single,
            sequence: None,
            target,
        }
    }

    /// A child that may repeat, accumulated through the given sequence
    /// capability.
    #[must_use]
    pub fn collection(
        field: FieldAccessor,
        sequence: impl Sequence + 'static,
        target: ElementTarget,
    ) -> Self {
        Self {
            field,
            cardinality: Cardinality::Collection,
            sequence: Some(Arc::new(sequence)),
            target,
        }
    }

    /// The bound field.
    #[must_use]
    pub fn field(&self) -> &FieldAccessor {
        &self.field
    }

    /// Occurrence rule for this binding.
    #[must_use]
    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub(crate) fn sequence(&self) -> Option<&Arc<dyn Sequence>> {
        self.sequence.as_ref()
    }

    /// What the child converts to.
    #[must_use]
    pub fn target(&self) -> &ElementTarget {
        &self.target
    }
}

/// Immutable, precompiled binding table for one target type.
///
/// Built once through [`DescriptorBuilder`], read-only afterwards, and safe
/// to consult from any number of concurrent conversions.
pub struct MappingDescriptor {
    type_name: String,
    type_id: TypeId,
    constructor: ConstructFn,
    text: Option<ScalarBinding>,
    attributes: Vec<(QName, ScalarBinding)>,
    // Registration-ordered (name, binding slot) pairs; several names may
    // alias one slot.
    elements: Vec<(QName, usize)>,
    element_index: HashMap<QName, usize>,
    bindings: Vec<Arc<ElementBinding>>,
}

impl MappingDescriptor {
    /// Name of the target type, for diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// `TypeId` of the target type.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Instantiate a fresh target object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Instantiation`] wrapping the constructor's failure.
    pub fn construct(&self) -> Result<Box<dyn Any>> {
        (self.constructor)().map_err(|source| Error::Instantiation {
            type_name: self.type_name.clone(),
            source,
        })
    }

    /// The element-text binding, if one exists.
    #[must_use]
    pub fn text_binding(&self) -> Option<&ScalarBinding> {
        self.text.as_ref()
    }

    /// Attribute bindings in registration order.
    #[must_use]
    pub fn attribute_bindings(&self) -> &[(QName, ScalarBinding)] {
        &self.attributes
    }

    /// Look up the attribute binding for a name.
    #[must_use]
    pub fn attribute_binding(&self, name: &QName) -> Option<&ScalarBinding> {
        self.attributes
            .iter()
            .find(|(bound, _)| bound == name)
            .map(|(_, binding)| binding)
    }

    /// Look up the element binding for a name, with its slot.
    #[must_use]
    pub fn element_binding(&self, name: &QName) -> Option<(usize, &ElementBinding)> {
        self.element_index
            .get(name)
            .map(|&slot| (slot, self.bindings[slot].as_ref()))
    }

    /// Element names in registration order, each with its binding slot.
    pub fn element_order(&self) -> impl Iterator<Item = (&QName, usize)> {
        self.elements.iter().map(|(name, slot)| (name, *slot))
    }

    /// The binding occupying a slot.
    #[must_use]
    pub fn binding(&self, slot: usize) -> &ElementBinding {
        self.bindings[slot].as_ref()
    }

    /// Number of distinct element bindings (aliases share a slot).
    #[must_use]
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }
}

/// Builder assembling a [`MappingDescriptor`] for target type `T`.
///
/// Registration order is preserved and becomes the write-side emission
/// order. Duplicate names are rejected at [`build`](Self::build) time rather
/// than silently overwritten.
pub struct DescriptorBuilder<T> {
    type_name: String,
    constructor: ConstructFn,
    text: Option<ScalarBinding>,
    attributes: Vec<(QName, ScalarBinding)>,
    elements: Vec<(QName, Arc<ElementBinding>)>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static> DescriptorBuilder<T> {
    /// Builder for a type constructed through `Default`.
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self
    where
        T: Default,
    {
        Self::with_constructor(type_name, || Ok(T::default()))
    }

    /// Builder for a type with an explicit, possibly failing constructor.
    pub fn with_constructor<C>(type_name: impl Into<String>, constructor: C) -> Self
    where
        C: Fn() -> std::result::Result<T, BoxedCause> + Send + Sync + 'static,
    {
        Self {
            type_name: type_name.into(),
            constructor: Box::new(move || {
                constructor().map(|value| Box::new(value) as Box<dyn Any>)
            }),
            text: None,
            attributes: Vec::new(),
            elements: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Bind the element's direct text to a field.
    #[must_use]
    pub fn text(mut self, binding: ScalarBinding) -> Self {
        self.text = Some(binding);
        self
    }

    /// Bind an attribute to a field.
    #[must_use]
    pub fn attribute(mut self, name: QName, binding: ScalarBinding) -> Self {
        self.attributes.push((name, binding));
        self
    }

    /// Bind a child element to a field.
    #[must_use]
    pub fn element(mut self, name: QName, binding: ElementBinding) -> Self {
        self.elements.push((name, Arc::new(binding)));
        self
    }

    /// Bind one child-element rule under several names.
    ///
    /// All names feed the same binding; on write the binding is emitted once
    /// under the first name.
    #[must_use]
    pub fn element_aliases(
        mut self,
        names: impl IntoIterator<Item = QName>,
        binding: ElementBinding,
    ) -> Self {
        let shared = Arc::new(binding);
        for name in names {
            self.elements.push((name, Arc::clone(&shared)));
        }
        self
    }

    /// Finalize the descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateBinding`] when two attribute bindings or
    /// two element bindings were registered under the same name.
    pub fn build(self) -> Result<MappingDescriptor> {
        let mut seen = HashSet::new();
        for (name, _) in &self.attributes {
            if !seen.insert(name.clone()) {
                return Err(Error::DuplicateBinding { name: name.clone() });
            }
        }

        let mut elements = Vec::with_capacity(self.elements.len());
        let mut element_index = HashMap::new();
        let mut bindings: Vec<Arc<ElementBinding>> = Vec::new();
        for (name, binding) in self.elements {
            if element_index.contains_key(&name) {
                return Err(Error::DuplicateBinding { name });
            }
            let slot = match bindings.iter().position(|b| Arc::ptr_eq(b, &binding)) {
                Some(slot) => slot,
                None => {
                    bindings.push(binding);
                    bindings.len() - 1
                }
            };
            element_index.insert(name.clone(), slot);
            elements.push((name, slot));
        }

        Ok(MappingDescriptor {
            type_name: self.type_name,
            type_id: TypeId::of::<T>(),
            constructor: self.constructor,
            text: self.text,
            attributes: self.attributes,
            elements,
            element_index,
            bindings,
        })
    }
}
