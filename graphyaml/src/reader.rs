//! Builds an object graph from parsing events.

use std::sync::Arc;

use graphyaml_core::{
    CollectionDef, DictionaryDef, EnumValue, Error, EventSource, Instance, Object, ParsingEvent, Scalar,
    TypeDescriptor, TypeKey, TypeKind, create_instance,
};
use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::hooks::ObjectHooks;
use crate::scalar::{dynamic_primitive, is_null_scalar, typed_primitive};
use crate::{ObjectContext, SerializerContext, SerializerSettings};

pub(crate) struct ObjectReader<'s, S: EventSource + ?Sized> {
    settings: &'s SerializerSettings,
    context: &'s mut SerializerContext,
    source: &'s mut S,
}

impl<'s, S: EventSource + ?Sized> ObjectReader<'s, S> {
    pub(crate) fn new(settings: &'s SerializerSettings, context: &'s mut SerializerContext, source: &'s mut S) -> Self {
        Self {
            settings,
            context,
            source,
        }
    }

    /// Reads one document. Document markers are optional; an empty stream
    /// reads as null.
    pub(crate) fn read_document(&mut self, expected: Option<TypeKey>) -> Result<Object, Error> {
        let framed = matches!(self.source.peek_event()?, Some(ParsingEvent::DocumentStart));
        if framed {
            self.source.next_event()?;
        } else if self.source.peek_event()?.is_none() {
            return Ok(Object::Null);
        }
        let value = self.read_value(expected)?;
        if framed {
            match self.source.expect_event("document end")? {
                ParsingEvent::DocumentEnd => {}
                other => return Err(Error::malformed("document end", other.describe())),
            }
        }
        Ok(value)
    }

    fn context_for<'a>(&self, descriptor: &'a TypeDescriptor, instance: &'a Object) -> ObjectContext<'a>
    where
        's: 'a,
    {
        ObjectContext {
            settings: self.settings,
            descriptor,
            instance,
            member: None,
            member_mask: self.context.member_mask,
            is_serializing: false,
            items: false,
        }
    }

    fn remapped(&mut self, what: &str, name: &str) {
        debug!(what, name, "legacy name");
        self.context.has_remap_occurred = true;
    }

    /// Descriptor an expected type is read as; `None` for dynamic slots.
    fn expected_descriptor(&self, expected: Option<TypeKey>) -> Result<Option<Arc<TypeDescriptor>>, Error> {
        let Some(key) = expected else {
            return Ok(None);
        };
        let descriptor = self.settings.registry.describe(key)?;
        match descriptor.kind() {
            TypeKind::Nullable(inner) => self.expected_descriptor(Some(*inner)),
            TypeKind::Dynamic => Ok(None),
            _ => Ok(Some(descriptor)),
        }
    }

    /// A type tag wins over the expected type; schema tags leave it alone.
    fn node_descriptor(
        &mut self,
        tag: Option<&str>,
        expected: Option<TypeKey>,
    ) -> Result<Option<Arc<TypeDescriptor>>, Error> {
        let settings = self.settings;
        match tag {
            Some(tag) if !settings.schema.is_schema_tag(tag) => {
                let (key, remapped) = settings.registry.resolve_tag(tag)?;
                if remapped {
                    self.remapped("tag", tag);
                }
                settings.registry.describe(key).map(Some)
            }
            _ => self.expected_descriptor(expected),
        }
    }

    fn accepts_null(&self, key: TypeKey) -> Result<bool, Error> {
        let descriptor = self.settings.registry.describe(key)?;
        Ok(matches!(descriptor.kind(), TypeKind::Nullable(_) | TypeKind::Dynamic))
    }

    fn read_value(&mut self, expected: Option<TypeKey>) -> Result<Object, Error> {
        match self.source.expect_event("a node")? {
            ParsingEvent::Alias { anchor } => {
                trace!(%anchor, "read alias");
                self.context.anchors.resolve(&anchor)
            }
            ParsingEvent::Scalar(scalar) => {
                let value = self.read_scalar(&scalar, expected)?;
                if let Some(anchor) = &scalar.anchor {
                    self.context.anchors.register(anchor, value.clone());
                }
                Ok(value)
            }
            ParsingEvent::MappingStart { anchor, tag, .. } => self.read_mapping(anchor, tag, expected),
            ParsingEvent::SequenceStart { anchor, tag, .. } => self.read_sequence(anchor, tag, expected),
            other => Err(Error::malformed("a node", other.describe())),
        }
    }

    fn read_scalar(&mut self, scalar: &Scalar, expected: Option<TypeKey>) -> Result<Object, Error> {
        let schema = self.settings.schema.clone();
        let Some(descriptor) = self.node_descriptor(scalar.tag.as_deref(), expected)? else {
            return dynamic_primitive(scalar, schema.as_ref());
        };
        match descriptor.kind() {
            TypeKind::Primitive(kind) => typed_primitive(scalar, *kind, schema.as_ref()),
            TypeKind::Enum(_) => {
                if is_null_scalar(scalar, schema.as_ref()) {
                    return Ok(Object::Null);
                }
                match descriptor.find_variant(&scalar.value) {
                    Some((name, remapped)) => {
                        if remapped {
                            self.remapped("variant", &scalar.value);
                        }
                        Ok(Object::Enum(EnumValue::new(descriptor.key(), name)))
                    }
                    None => Err(Error::InvalidScalar {
                        value: scalar.value.clone(),
                        expected: descriptor.type_name().to_owned(),
                    }),
                }
            }
            _ if is_null_scalar(scalar, schema.as_ref()) => Ok(Object::Null),
            _ => Err(Error::mismatch(descriptor.type_name(), "scalar")),
        }
    }

    /// Creates the instance for a node, routing it through custom hooks when
    /// a registered serializer handles the type.
    fn create(&mut self, descriptor: &TypeDescriptor) -> Result<(Object, Option<&'s dyn ObjectHooks>), Error> {
        let settings = self.settings;
        match settings.hooks_for(descriptor) {
            Some(hooks) => {
                let created = settings.object_factory.create(descriptor);
                Ok((hooks.before_populate(created, false)?, Some(hooks)))
            }
            None => create_instance(settings.object_factory.as_ref(), descriptor).map(|instance| (instance, None)),
        }
    }

    /// Descriptor of what was actually created, which a factory or hook may
    /// have chosen.
    fn content_descriptor(
        &self,
        descriptor: &Arc<TypeDescriptor>,
        instance: &Object,
    ) -> Result<Arc<TypeDescriptor>, Error> {
        match instance.as_instance() {
            Some(created) if created.type_key() != descriptor.key() => {
                self.settings.registry.describe(created.type_key())
            }
            _ => Ok(descriptor.clone()),
        }
    }

    fn finish(
        &mut self,
        hooks: Option<&dyn ObjectHooks>,
        instance: Object,
        anchor: Option<&str>,
    ) -> Result<Object, Error> {
        let Some(hooks) = hooks else {
            return Ok(instance);
        };
        let result = hooks.after_populate(instance)?;
        if let Some(anchor) = anchor {
            self.context.anchors.register(anchor, result.clone());
        }
        Ok(result)
    }

    fn read_mapping(
        &mut self,
        anchor: Option<String>,
        tag: Option<String>,
        expected: Option<TypeKey>,
    ) -> Result<Object, Error> {
        let descriptor = match self.node_descriptor(tag.as_deref(), expected)? {
            Some(descriptor) => descriptor,
            None => self
                .settings
                .registry
                .describe(TypeKey::of::<IndexMap<Object, Object>>())?,
        };
        trace!(ty = descriptor.type_name(), ?anchor, "read mapping");
        let (object, hooks) = self.create(&descriptor)?;
        if let Some(anchor) = &anchor {
            self.context.anchors.register(anchor, object.clone());
        }
        let content = self.content_descriptor(&descriptor, &object)?;
        let Some(instance) = object.as_instance() else {
            return Err(Error::mismatch(content.type_name(), "mapping"));
        };
        match content.kind() {
            TypeKind::Dictionary(def) if content.members().is_empty() => {
                self.read_entries(&content, &object, instance, def)?
            }
            TypeKind::Object | TypeKind::Collection(_) | TypeKind::Dictionary(_) => {
                self.read_members(&content, &object, instance)?
            }
            _ => return Err(Error::mismatch(content.type_name(), "mapping")),
        }
        self.finish(hooks, object, anchor.as_deref())
    }

    fn read_members(&mut self, content: &TypeDescriptor, object: &Object, instance: &Instance) -> Result<(), Error> {
        let settings = self.settings;
        loop {
            let key = match self.source.expect_event("a mapping key")? {
                ParsingEvent::MappingEnd => return Ok(()),
                ParsingEvent::Scalar(key) => key,
                other => return Err(Error::malformed("a scalar mapping key", other.describe())),
            };
            let cx = self.context_for(content, object);
            let Some(name) = settings.backend.read_member_name(&cx, &key.value) else {
                trace!(key = %key.value, "skipped key");
                self.source.skip_node()?;
                continue;
            };

            if name == settings.special_collection_member {
                self.read_items(content, object, instance)?;
                continue;
            }

            if let Some((member, remapped)) = content.find_member(&name) {
                if remapped {
                    self.remapped("member", &name);
                }
                if member.mask_bits() & cx.member_mask == 0 || !member.is_writable() {
                    trace!(member = member.name(), "not read");
                    self.source.skip_node()?;
                    continue;
                }
                let value = self.read_value(Some(member.ty()))?;
                if value.is_null() && !self.accepts_null(member.ty())? {
                    trace!(member = member.name(), "null keeps the default");
                    continue;
                }
                member.set(instance, value)?;
                continue;
            }

            if settings.serialize_dictionary_items_as_members
                && let Some(def) = content.dictionary()
            {
                let key = self.read_scalar(&key, Some(def.key()))?;
                let value = self.read_value(Some(def.value()))?;
                let (key, value) = settings.backend.read_dictionary_item(&cx, key, value);
                def.insert(instance, key, value)?;
                continue;
            }

            return Err(Error::UnknownMember {
                member: name,
                type_name: content.type_name().to_owned(),
            });
        }
    }

    /// Content stored under the items key.
    fn read_items(&mut self, content: &TypeDescriptor, object: &Object, instance: &Instance) -> Result<(), Error> {
        match content.kind() {
            TypeKind::Collection(def) => match self.source.expect_event("a sequence")? {
                ParsingEvent::SequenceStart { .. } => self.read_sequence_items(def, instance),
                other => Err(Error::malformed("a sequence", other.describe())),
            },
            TypeKind::Dictionary(def) => match self.source.expect_event("a mapping")? {
                ParsingEvent::MappingStart { .. } => self.read_entries(content, object, instance, def),
                other => Err(Error::malformed("a mapping", other.describe())),
            },
            _ => Err(Error::UnknownMember {
                member: self.settings.special_collection_member.clone(),
                type_name: content.type_name().to_owned(),
            }),
        }
    }

    fn read_entries(
        &mut self,
        content: &TypeDescriptor,
        object: &Object,
        instance: &Instance,
        def: &DictionaryDef,
    ) -> Result<(), Error> {
        let settings = self.settings;
        loop {
            if matches!(self.source.peek_event()?, Some(ParsingEvent::MappingEnd)) {
                self.source.next_event()?;
                return Ok(());
            }
            let key = self.read_value(Some(def.key()))?;
            let value = self.read_value(Some(def.value()))?;
            let cx = self.context_for(content, object);
            let (key, value) = settings.backend.read_dictionary_item(&cx, key, value);
            def.insert(instance, key, value)?;
        }
    }

    fn read_sequence_items(&mut self, def: &CollectionDef, instance: &Instance) -> Result<(), Error> {
        loop {
            if matches!(self.source.peek_event()?, Some(ParsingEvent::SequenceEnd)) {
                self.source.next_event()?;
                return Ok(());
            }
            let item = self.read_value(Some(def.item()))?;
            def.push(instance, item)?;
        }
    }

    fn read_sequence(
        &mut self,
        anchor: Option<String>,
        tag: Option<String>,
        expected: Option<TypeKey>,
    ) -> Result<Object, Error> {
        let descriptor = match self.node_descriptor(tag.as_deref(), expected)? {
            Some(descriptor) => descriptor,
            None => self.settings.registry.describe(TypeKey::of::<Vec<Object>>())?,
        };
        trace!(ty = descriptor.type_name(), ?anchor, "read sequence");
        let (object, hooks) = self.create(&descriptor)?;
        if let Some(anchor) = &anchor {
            self.context.anchors.register(anchor, object.clone());
        }
        let content = self.content_descriptor(&descriptor, &object)?;
        let (Some(def), Some(instance)) = (content.collection(), object.as_instance()) else {
            return Err(Error::mismatch(content.type_name(), "sequence"));
        };
        self.read_sequence_items(def, instance)?;
        self.finish(hooks, object, anchor.as_deref())
    }
}
