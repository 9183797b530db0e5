//! The recursive object-graph conversion engine.
//!
//! One conversion call is a synchronous, single-threaded recursive descent:
//! the engine holds no cursor state of its own, its recursion depth mirrors
//! tree depth exactly, with all position state living in the external
//! reader/writer collaborator.

use crate::descriptor::{Cardinality, ElementBinding, ElementTarget, MappingDescriptor, ScalarBinding};
use crate::registry::MappingRegistry;
use crate::sequence::Sequence;
use crate::{Error, Result};
use std::any::{Any, TypeId, type_name};
use std::sync::Arc;
use tracing::{debug, trace};
use xbind_tree::{OwnerKey, QName, SubtreeStore, TreeReader, TreeWriter};

/// Recursive read (tree → object) and write (object → tree) orchestrator.
///
/// The converter itself is stateless; descriptors and converters come from
/// the shared registry, and per-conversion state (the object graph under
/// construction, the optional capture store) is exclusive to one call.
pub struct ObjectGraphConverter<'a> {
    registry: &'a MappingRegistry,
}

impl<'a> ObjectGraphConverter<'a> {
    /// Create a converter over the given registry.
    #[must_use]
    pub fn new(registry: &'a MappingRegistry) -> Self {
        Self { registry }
    }

    /// Read the element at the cursor position into a `T`, using the
    /// descriptor registered for `T`.
    ///
    /// When a store is supplied, unmapped child fragments are captured into
    /// it for later replay; without one they are dropped.
    ///
    /// # Errors
    ///
    /// Any instantiation or conversion failure aborts the whole call; no
    /// partially-populated object is returned.
    pub fn from_element<T, R>(
        &self,
        reader: &mut R,
        store: Option<&mut SubtreeStore>,
    ) -> Result<T>
    where
        T: 'static,
        R: TreeReader,
    {
        let descriptor = self
            .registry
            .descriptor(TypeId::of::<T>())
            .ok_or_else(|| Error::MissingDescriptor {
                type_name: type_name::<T>().to_string(),
            })?;
        let (object, _) = self.read_object(reader, descriptor.as_ref(), store)?;
        match object.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(_) => Err(Error::TypeMismatch {
                field: String::new(),
                expected: type_name::<T>().to_string(),
            }),
        }
    }

    /// Read the element at the cursor position using an explicit descriptor.
    ///
    /// # Errors
    ///
    /// Same failure semantics as [`from_element`](Self::from_element).
    pub fn from_element_with<R: TreeReader>(
        &self,
        reader: &mut R,
        descriptor: &MappingDescriptor,
        store: Option<&mut SubtreeStore>,
    ) -> Result<Box<dyn Any>> {
        self.read_object(reader, descriptor, store)
            .map(|(object, _)| object)
    }

    /// Write `object` as an element named `name`, using the descriptor
    /// registered for `T`.
    ///
    /// When the store from the originating read is supplied, captured
    /// fragments are replayed verbatim, in capture order, as additional
    /// children of the objects that owned them.
    ///
    /// # Errors
    ///
    /// Conversion failures abort the call; the writer may have received a
    /// partial emission sequence by then.
    pub fn to_element<T, W>(
        &self,
        object: &T,
        name: &QName,
        writer: &mut W,
        store: Option<&SubtreeStore>,
    ) -> Result<()>
    where
        T: 'static,
        W: TreeWriter,
    {
        let descriptor = self
            .registry
            .descriptor(TypeId::of::<T>())
            .ok_or_else(|| Error::MissingDescriptor {
                type_name: type_name::<T>().to_string(),
            })?;
        let root = store.and_then(SubtreeStore::root);
        self.write_object(object, name, descriptor.as_ref(), writer, store, root)
    }

    /// Write an object using an explicit descriptor.
    ///
    /// # Errors
    ///
    /// Same failure semantics as [`to_element`](Self::to_element).
    pub fn to_element_with<W: TreeWriter>(
        &self,
        object: &dyn Any,
        name: &QName,
        descriptor: &MappingDescriptor,
        writer: &mut W,
        store: Option<&SubtreeStore>,
    ) -> Result<()> {
        let root = store.and_then(SubtreeStore::root);
        self.write_object(object, name, descriptor, writer, store, root)
    }

    fn read_object<R: TreeReader>(
        &self,
        reader: &mut R,
        descriptor: &MappingDescriptor,
        mut store: Option<&mut SubtreeStore>,
    ) -> Result<(Box<dyn Any>, Option<OwnerKey>)> {
        debug!(target_type = descriptor.type_name(), "reading element");
        let mut object = descriptor.construct()?;
        let owner = store.as_deref_mut().map(SubtreeStore::allocate);

        if let Some(binding) = descriptor.text_binding() {
            let text = reader.current_text();
            if !text.is_empty() {
                self.assign_scalar(object.as_mut(), binding, &text)?;
            }
        }

        // Unmapped attributes have no storage mechanism; they are dropped.
        for (name, value) in reader.attributes() {
            match descriptor.attribute_binding(&name) {
                Some(binding) if !value.is_empty() => {
                    self.assign_scalar(object.as_mut(), binding, &value)?;
                }
                Some(_) => {}
                None => trace!(%name, "dropping unmapped attribute"),
            }
        }

        // Containers for repeated children are created lazily on the first
        // occurrence and flushed into their fields before returning.
        let mut pending: Vec<(usize, Box<dyn Any>)> = Vec::new();
        while reader.descend() {
            let name = reader.current_name();
            match descriptor.element_binding(&name) {
                Some((slot, binding)) => {
                    let (value, child) = self.read_child(reader, binding, store.as_deref_mut())?;
                    if let (Some(st), Some(parent), Some(child)) =
                        (store.as_deref_mut(), owner, child)
                    {
                        st.link_child(parent, slot, child);
                    }
                    match binding.cardinality() {
                        Cardinality::Single => {
                            // last-wins when a single-cardinality element repeats
                            binding.field().set(object.as_mut(), value)?;
                        }
                        Cardinality::Collection => {
                            let sequence = collection_sequence(binding)?;
                            let index = match pending.iter().position(|(s, _)| *s == slot) {
                                Some(index) => index,
                                None => {
                                    pending.push((slot, sequence.create()));
                                    pending.len() - 1
                                }
                            };
                            sequence
                                .append(pending[index].1.as_mut(), value)
                                .map_err(|e| e.at_field(binding.field().name()))?;
                        }
                    }
                }
                None => {
                    if let (Some(st), Some(parent)) = (store.as_deref_mut(), owner) {
                        reader.capture_subtree(st, parent);
                    } else {
                        trace!(%name, "dropping unmapped element");
                    }
                }
            }
            reader.ascend();
        }

        for (slot, container) in pending {
            descriptor.binding(slot).field().set(object.as_mut(), container)?;
        }

        Ok((object, owner))
    }

    fn read_child<R: TreeReader>(
        &self,
        reader: &mut R,
        binding: &ElementBinding,
        store: Option<&mut SubtreeStore>,
    ) -> Result<(Box<dyn Any>, Option<OwnerKey>)> {
        match binding.target() {
            ElementTarget::Mapped { type_id, type_name } => {
                let descriptor =
                    self.registry
                        .descriptor(*type_id)
                        .ok_or_else(|| Error::MissingDescriptor {
                            type_name: (*type_name).to_string(),
                        })?;
                self.read_object(reader, descriptor.as_ref(), store)
            }
            ElementTarget::Text { converter, format } => {
                let text = reader.current_text();
                let value = converter
                    .resolve(self.registry)?
                    .from_text(&text, format.as_deref())
                    .map_err(|e| e.at_field(binding.field().name()))?;
                Ok((value, None))
            }
        }
    }

    fn assign_scalar(
        &self,
        object: &mut dyn Any,
        binding: &ScalarBinding,
        text: &str,
    ) -> Result<()> {
        let value = binding
            .converter()
            .resolve(self.registry)?
            .from_text(text, binding.format())
            .map_err(|e| e.at_field(binding.field().name()))?;
        binding.field().set(object, value)
    }

    fn write_object<W: TreeWriter>(
        &self,
        object: &dyn Any,
        name: &QName,
        descriptor: &MappingDescriptor,
        writer: &mut W,
        store: Option<&SubtreeStore>,
        owner: Option<OwnerKey>,
    ) -> Result<()> {
        debug!(target_type = descriptor.type_name(), %name, "writing element");
        writer.start_element(name.clone());

        for (attr_name, binding) in descriptor.attribute_bindings() {
            if let Some(value) = binding.field().get(object) {
                let text = binding
                    .converter()
                    .resolve(self.registry)?
                    .to_text(value, binding.format())
                    .map_err(|e| e.at_field(binding.field().name()))?;
                writer.add_attribute(attr_name.clone(), text);
            }
        }

        if let Some(binding) = descriptor.text_binding() {
            if let Some(value) = binding.field().get(object) {
                let text = binding
                    .converter()
                    .resolve(self.registry)?
                    .to_text(value, binding.format())
                    .map_err(|e| e.at_field(binding.field().name()))?;
                writer.add_text(text);
            }
        }

        // Each distinct binding is emitted once, no matter how many names
        // alias it.
        let mut visited = vec![false; descriptor.binding_count()];
        for (child_name, slot) in descriptor.element_order() {
            if visited[slot] {
                continue;
            }
            visited[slot] = true;
            let binding = descriptor.binding(slot);
            match binding.cardinality() {
                Cardinality::Single => {
                    if let Some(value) = binding.field().get(object) {
                        // a repeated read linked several keys; the retained
                        // object came from the last occurrence
                        let child = linked(store, owner, slot).last().copied();
                        self.write_child(value, child_name, binding, writer, store, child)?;
                    }
                }
                Cardinality::Collection => {
                    if let Some(container) = binding.field().get(object) {
                        let sequence = collection_sequence(binding)?;
                        let keys = linked(store, owner, slot);
                        let items = sequence
                            .iter(container)
                            .map_err(|e| e.at_field(binding.field().name()))?;
                        for (index, item) in items.enumerate() {
                            self.write_child(
                                item,
                                child_name,
                                binding,
                                writer,
                                store,
                                keys.get(index).copied(),
                            )?;
                        }
                    }
                }
            }
        }

        if let (Some(store), Some(owner)) = (store, owner) {
            writer.replay_subtrees(store, owner);
        }

        writer.end_element();
        Ok(())
    }

    fn write_child<W: TreeWriter>(
        &self,
        value: &dyn Any,
        name: &QName,
        binding: &ElementBinding,
        writer: &mut W,
        store: Option<&SubtreeStore>,
        owner: Option<OwnerKey>,
    ) -> Result<()> {
        match binding.target() {
            ElementTarget::Mapped { type_id, type_name } => {
                let descriptor =
                    self.registry
                        .descriptor(*type_id)
                        .ok_or_else(|| Error::MissingDescriptor {
                            type_name: (*type_name).to_string(),
                        })?;
                self.write_object(value, name, descriptor.as_ref(), writer, store, owner)
            }
            ElementTarget::Text { converter, format } => {
                let text = converter
                    .resolve(self.registry)?
                    .to_text(value, format.as_deref())
                    .map_err(|e| e.at_field(binding.field().name()))?;
                writer.start_element(name.clone());
                if !text.is_empty() {
                    writer.add_text(text);
                }
                writer.end_element();
                Ok(())
            }
        }
    }
}

fn collection_sequence(binding: &ElementBinding) -> Result<&Arc<dyn Sequence>> {
    binding
        .sequence()
        .ok_or_else(|| Error::InvalidCollectionTarget {
            field: binding.field().name().to_string(),
            expected: "an ordered collection capability".to_string(),
        })
}

fn linked<'s>(
    store: Option<&'s SubtreeStore>,
    owner: Option<OwnerKey>,
    slot: usize,
) -> &'s [OwnerKey] {
    match (store, owner) {
        (Some(store), Some(owner)) => store.linked_children(owner, slot),
        _ => &[],
    }
}
