//! Walks an object graph and emits parsing events.

use std::collections::HashSet;
use std::sync::Arc;

use graphyaml_core::{
    DataStyle, DictionaryDef, Error, EventSink, Instance, MemberDescriptor, Object, ParsingEvent,
    Scalar, TypeDescriptor, TypeKey, TypeKind,
};
use tracing::trace;

use crate::scalar::{primitive_scalar, text_scalar};
use crate::{ObjectContext, SerializerContext, SerializerSettings};

pub(crate) struct ObjectWriter<'s, K: EventSink + ?Sized> {
    settings: &'s SerializerSettings,
    context: &'s mut SerializerContext,
    sink: &'s mut K,
    // shared instances being written, for cycle detection without aliases
    path: Vec<usize>,
}

impl<'s, K: EventSink + ?Sized> ObjectWriter<'s, K> {
    pub(crate) fn new(settings: &'s SerializerSettings, context: &'s mut SerializerContext, sink: &'s mut K) -> Self {
        Self {
            settings,
            context,
            sink,
            path: Vec::new(),
        }
    }

    pub(crate) fn write_document(&mut self, value: &Object, declared: Option<TypeKey>) -> Result<(), Error> {
        self.sink.emit(ParsingEvent::DocumentStart)?;
        self.write_value(value, declared, None)?;
        self.sink.emit(ParsingEvent::DocumentEnd)
    }

    /// Key of the descriptor a declared type is written as; `None` for
    /// dynamic slots.
    fn declared_key(&self, declared: Option<TypeKey>) -> Result<Option<TypeKey>, Error> {
        let Some(key) = declared else {
            return Ok(None);
        };
        let descriptor = self.settings.registry.describe(key)?;
        match descriptor.kind() {
            TypeKind::Nullable(inner) => self.declared_key(Some(*inner)),
            TypeKind::Dynamic => Ok(None),
            _ => Ok(Some(descriptor.key())),
        }
    }

    /// Tag written for a value of `descriptor` in a slot declared as
    /// `declared`.
    fn tag_for(&self, descriptor: &TypeDescriptor, declared: Option<TypeKey>) -> Option<String> {
        if !self.settings.emit_tags || declared == Some(descriptor.key()) {
            return None;
        }
        let registry = &self.settings.registry;
        let plain_container = descriptor.members().is_empty()
            && matches!(descriptor.kind(), TypeKind::Collection(_) | TypeKind::Dictionary(_));
        if plain_container && registry.explicit_tag(descriptor).is_none() {
            return None;
        }
        Some(registry.tag_for(descriptor, self.settings.emit_short_type_name))
    }

    fn context_for<'a>(
        &self,
        descriptor: &'a TypeDescriptor,
        instance: &'a Object,
        member: Option<&'a MemberDescriptor>,
        items: bool,
    ) -> ObjectContext<'a>
    where
        's: 'a,
    {
        ObjectContext {
            settings: self.settings,
            descriptor,
            instance,
            member,
            member_mask: self.context.member_mask,
            is_serializing: true,
            items,
        }
    }

    /// Member annotation, then type annotation, then the backend.
    fn style_for(
        &self,
        descriptor: &TypeDescriptor,
        instance: &Object,
        member: Option<&MemberDescriptor>,
        items: bool,
    ) -> DataStyle {
        if !items {
            if let Some(style) = member.and_then(MemberDescriptor::declared_style) {
                return style;
            }
            if let Some(style) = descriptor.style() {
                return style;
            }
        }
        let cx = self.context_for(descriptor, instance, member, items);
        self.settings.backend.style(&cx)
    }

    fn write_value(
        &mut self,
        value: &Object,
        declared: Option<TypeKey>,
        member: Option<&MemberDescriptor>,
    ) -> Result<(), Error> {
        let declared = self.declared_key(declared)?;
        match value {
            Object::Null => self.sink.emit(ParsingEvent::Scalar(Scalar::plain("null"))),
            Object::Primitive(primitive) => {
                let scalar = primitive_scalar(primitive, self.settings.schema.as_ref(), declared.is_none());
                trace!(value = %scalar.value, tag = ?scalar.tag, "write scalar");
                self.sink.emit(ParsingEvent::Scalar(scalar))
            }
            Object::Enum(value) => {
                let descriptor = self.settings.registry.describe(value.type_key())?;
                let scalar = text_scalar(value.name(), self.settings.schema.as_ref())
                    .with_tag(self.tag_for(&descriptor, declared));
                self.sink.emit(ParsingEvent::Scalar(scalar))
            }
            Object::Instance(instance) => self.write_instance(value, instance, declared, member),
        }
    }

    fn write_instance(
        &mut self,
        value: &Object,
        instance: &Instance,
        declared: Option<TypeKey>,
        member: Option<&MemberDescriptor>,
    ) -> Result<(), Error> {
        let settings = self.settings;
        let registry = &settings.registry;
        let descriptor = registry.describe(instance.type_key())?;

        let mut anchor = None;
        if instance.is_shared() {
            if settings.emit_alias {
                let (label, is_new) = self.context.anchors.get_or_create_label(instance);
                if !is_new {
                    trace!(%label, "write alias");
                    return self.sink.emit(ParsingEvent::Alias { anchor: label });
                }
                anchor = Some(label);
            } else if self.path.contains(&instance.id()) {
                return Err(Error::Custom(format!(
                    "`{}` refers to itself; enable `emit_alias` to write cyclic graphs",
                    descriptor.type_name()
                )));
            }
        }
        let tag = self.tag_for(&descriptor, declared);

        let (target, content) = match settings.hooks_for(&descriptor) {
            Some(hooks) => {
                let target = hooks.before_populate(Some(value.clone()), true)?;
                let content = match target.as_instance() {
                    Some(surrogate) => registry.describe(surrogate.type_key())?,
                    None => return Err(Error::mismatch("an object", target.describe())),
                };
                (target, content)
            }
            None => (value.clone(), descriptor.clone()),
        };
        let style = self.style_for(&content, &target, member, false);
        trace!(ty = content.type_name(), ?anchor, ?tag, ?style, "write object");

        if instance.is_shared() {
            self.path.push(instance.id());
        }
        let written = self.write_content(&content, &target, anchor, tag, style);
        if instance.is_shared() {
            self.path.pop();
        }
        written
    }

    fn write_content(
        &mut self,
        content: &Arc<TypeDescriptor>,
        target: &Object,
        anchor: Option<String>,
        tag: Option<String>,
        style: DataStyle,
    ) -> Result<(), Error> {
        let Some(instance) = target.as_instance() else {
            return Err(Error::mismatch(content.type_name(), target.describe()));
        };
        let has_members = !content.members().is_empty();
        match content.kind() {
            TypeKind::Collection(def) if !has_members => {
                self.sink.emit(ParsingEvent::SequenceStart { anchor, tag, style })?;
                for item in def.items(instance)? {
                    self.write_value(&item, Some(def.item()), None)?;
                }
                self.sink.emit(ParsingEvent::SequenceEnd)
            }
            TypeKind::Dictionary(def) if !has_members => {
                self.sink.emit(ParsingEvent::MappingStart { anchor, tag, style })?;
                self.write_entries(content, target, def, &mut HashSet::new())?;
                self.sink.emit(ParsingEvent::MappingEnd)
            }
            TypeKind::Object | TypeKind::Collection(_) | TypeKind::Dictionary(_) => {
                self.sink.emit(ParsingEvent::MappingStart { anchor, tag, style })?;
                let mut keys = HashSet::new();
                self.write_members(content, target, instance, &mut keys)?;
                self.write_items(content, target, instance, &mut keys)?;
                self.sink.emit(ParsingEvent::MappingEnd)
            }
            _ => Err(Error::mismatch("a composite type", content.type_name())),
        }
    }

    fn write_key(&mut self, name: &str, descriptor: &TypeDescriptor, keys: &mut HashSet<String>) -> Result<(), Error> {
        if !keys.insert(name.to_owned()) {
            return Err(Error::MemberCollision {
                key: name.to_owned(),
                type_name: descriptor.type_name().to_owned(),
            });
        }
        self.sink
            .emit(ParsingEvent::Scalar(text_scalar(name, self.settings.schema.as_ref())))
    }

    fn write_members(
        &mut self,
        content: &TypeDescriptor,
        target: &Object,
        instance: &Instance,
        keys: &mut HashSet<String>,
    ) -> Result<(), Error> {
        let settings = self.settings;
        let cx = self.context_for(content, target, None, false);
        let members = settings.backend.members(&cx);
        for member in members.iter() {
            if member.mask_bits() & cx.member_mask == 0 {
                trace!(member = member.name(), "masked out");
                continue;
            }
            let value = member.get(instance)?;
            if !settings.backend.should_serialize(&cx, member, &value) {
                trace!(member = member.name(), "skipped");
                continue;
            }
            let name = settings.backend.write_member_name(&cx, member, member.name());
            self.write_key(&name, content, keys)?;
            self.write_value(&value, Some(member.ty()), Some(member))?;
        }
        Ok(())
    }

    /// Intrinsic content of a collection or dictionary that also has members.
    fn write_items(
        &mut self,
        content: &TypeDescriptor,
        target: &Object,
        instance: &Instance,
        keys: &mut HashSet<String>,
    ) -> Result<(), Error> {
        let settings = self.settings;
        let special = settings.special_collection_member.as_str();
        match content.kind() {
            TypeKind::Collection(def) => {
                let style = self.style_for(content, target, None, true);
                self.write_key(special, content, keys)?;
                self.sink.emit(ParsingEvent::SequenceStart {
                    anchor: None,
                    tag: None,
                    style,
                })?;
                for item in def.items(instance)? {
                    self.write_value(&item, Some(def.item()), None)?;
                }
                self.sink.emit(ParsingEvent::SequenceEnd)
            }
            TypeKind::Dictionary(def) if settings.serialize_dictionary_items_as_members => {
                self.write_entries(content, target, def, keys)
            }
            TypeKind::Dictionary(def) => {
                let style = self.style_for(content, target, None, true);
                self.write_key(special, content, keys)?;
                self.sink.emit(ParsingEvent::MappingStart {
                    anchor: None,
                    tag: None,
                    style,
                })?;
                self.write_entries(content, target, def, &mut HashSet::new())?;
                self.sink.emit(ParsingEvent::MappingEnd)
            }
            _ => Ok(()),
        }
    }

    fn write_entries(
        &mut self,
        content: &TypeDescriptor,
        target: &Object,
        def: &DictionaryDef,
        keys: &mut HashSet<String>,
    ) -> Result<(), Error> {
        let Some(instance) = target.as_instance() else {
            return Err(Error::mismatch(content.type_name(), target.describe()));
        };
        let settings = self.settings;
        let mut entries = def.entries(instance)?;
        if let Some(compare) = settings.registry.key_comparer() {
            entries.sort_by(|(a, _), (b, _)| {
                compare(
                    a.scalar_text().as_deref().unwrap_or_default(),
                    b.scalar_text().as_deref().unwrap_or_default(),
                )
            });
        }
        let cx = self.context_for(content, target, None, false);
        for (key, value) in entries {
            let (key, value) = settings.backend.write_dictionary_item(&cx, key, value);
            if let Some(text) = key.scalar_text()
                && !keys.insert(text.clone())
            {
                return Err(Error::MemberCollision {
                    key: text,
                    type_name: content.type_name().to_owned(),
                });
            }
            self.write_value(&key, Some(def.key()), None)?;
            self.write_value(&value, Some(def.value()), None)?;
        }
        Ok(())
    }
}
