//! Serializer configuration.

use std::fmt;
use std::sync::Arc;

use graphyaml_core::{
    CoreSchema, DataStyle, DefaultObjectFactory, Error, KeyComparer, ObjectFactory, PrepareMembersFn,
    Reflect, Schema, TypeDescriptor, TypeKey, TypeRegistry,
};

use crate::backend::{DefaultBackend, ObjectSerializerBackend};
use crate::hooks::{ObjectHooks, SerializerFactory};

/// Key under which custom collections and dictionaries that also have
/// members store their items.
pub const SPECIAL_COLLECTION_MEMBER: &str = "~Items";

/// Options shared by every call made through one [`crate::Serializer`].
///
/// Settings are read-only during a call; per-call state lives in
/// [`crate::SerializerContext`].
pub struct SerializerSettings {
    /// Write aliases for shared objects seen more than once.
    pub emit_alias: bool,
    /// Start every call with an empty anchor table. When `false` the table
    /// survives between calls on the same serializer.
    pub reset_alias: bool,
    /// Write type tags where the runtime type differs from the declared one.
    pub emit_tags: bool,
    /// Write members whose value equals their declared default.
    pub emit_default_values: bool,
    /// Use `!ShortName` instead of the full Rust path for unregistered types.
    pub emit_short_type_name: bool,
    /// Skip members whose value is null.
    pub ignore_nulls: bool,
    /// Sequences of scalars with at most this many items are written in flow
    /// style. `0` disables the rule.
    pub limit_primitive_flow_sequence: usize,
    /// Style of mappings and sequences nothing else decides.
    pub default_style: DataStyle,
    /// Write dictionary entries of types with members inline, next to the
    /// members, instead of under the items key.
    pub serialize_dictionary_items_as_members: bool,
    /// Name of the items key.
    pub special_collection_member: String,
    /// Spaces per indentation level.
    pub indent: usize,
    /// Type shapes and tag mappings.
    pub registry: TypeRegistry,
    /// Implicit typing and core tags.
    pub schema: Arc<dyn Schema>,
    /// Creates instances on read.
    pub object_factory: Arc<dyn ObjectFactory>,
    /// Naming, filtering and styling hooks.
    pub backend: Arc<dyn ObjectSerializerBackend>,
    /// Custom serializers, tried in registration order.
    pub serializer_factories: Vec<Arc<dyn SerializerFactory>>,
}

impl Default for SerializerSettings {
    fn default() -> Self {
        Self {
            emit_alias: true,
            reset_alias: false,
            emit_tags: true,
            emit_default_values: false,
            emit_short_type_name: false,
            ignore_nulls: false,
            limit_primitive_flow_sequence: 0,
            default_style: DataStyle::Block,
            serialize_dictionary_items_as_members: false,
            special_collection_member: SPECIAL_COLLECTION_MEMBER.to_owned(),
            indent: 2,
            registry: TypeRegistry::new(),
            schema: Arc::new(CoreSchema),
            object_factory: Arc::new(DefaultObjectFactory),
            backend: Arc::new(DefaultBackend),
            serializer_factories: Vec::new(),
        }
    }
}

impl SerializerSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `tag` as `T` and writes `T` with `tag`.
    pub fn register_tag_mapping<T: Reflect>(&mut self, tag: &str) {
        self.registry.register_tag(tag, TypeKey::of::<T>());
    }

    /// Accepts `legacy` as an old tag of `T`.
    pub fn register_remap<T: Reflect>(&mut self, legacy: &str) {
        self.registry.register_remap(legacy, TypeKey::of::<T>());
    }

    /// Describes `T` up front, registering its declared tag and legacy tags.
    pub fn register<T: Reflect>(&mut self) -> Result<Arc<TypeDescriptor>, Error> {
        self.registry.register::<T>()
    }

    /// Adds a custom serializer, tried after those registered before it.
    pub fn register_serializer(&mut self, factory: Arc<dyn SerializerFactory>) {
        self.serializer_factories.push(factory);
    }

    /// `None` keeps declaration order for unordered members and dictionary
    /// entries.
    pub fn set_key_comparer(&mut self, comparer: Option<KeyComparer>) {
        self.registry.set_key_comparer(comparer);
    }

    pub fn set_prepare_members(&mut self, prepare: PrepareMembersFn) {
        self.registry.set_prepare_members(prepare);
    }

    /// Hooks of the first registered serializer that handles `descriptor`.
    pub(crate) fn hooks_for(&self, descriptor: &TypeDescriptor) -> Option<&dyn ObjectHooks> {
        self.serializer_factories
            .iter()
            .find_map(|factory| factory.try_create(descriptor))
    }
}

impl fmt::Debug for SerializerSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializerSettings")
            .field("emit_alias", &self.emit_alias)
            .field("reset_alias", &self.reset_alias)
            .field("emit_tags", &self.emit_tags)
            .field("emit_default_values", &self.emit_default_values)
            .field("emit_short_type_name", &self.emit_short_type_name)
            .field("ignore_nulls", &self.ignore_nulls)
            .field("limit_primitive_flow_sequence", &self.limit_primitive_flow_sequence)
            .field("default_style", &self.default_style)
            .field(
                "serialize_dictionary_items_as_members",
                &self.serialize_dictionary_items_as_members,
            )
            .field("special_collection_member", &self.special_collection_member)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
