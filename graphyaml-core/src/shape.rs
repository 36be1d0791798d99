//! Type descriptors: what the serializer knows about a Rust type.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::{DataStyle, Error, Instance, Object, PrimitiveKind, Reflect};

/// Default member mask, and the default active mask of a call.
pub const DEFAULT_MASK: u32 = 1;

pub type GetterFn = Arc<dyn Fn(&Instance) -> Result<Object, Error> + Send + Sync>;
pub type SetterFn = Arc<dyn Fn(&Instance, Object) -> Result<(), Error> + Send + Sync>;
pub type DefaultFn = Arc<dyn Fn() -> Object + Send + Sync>;
pub type FactoryFn = Arc<dyn Fn() -> Object + Send + Sync>;
pub type ItemsFn = Arc<dyn Fn(&Instance) -> Result<Vec<Object>, Error> + Send + Sync>;
pub type PushFn = Arc<dyn Fn(&Instance, Object) -> Result<(), Error> + Send + Sync>;
pub type EntriesFn = Arc<dyn Fn(&Instance) -> Result<Vec<(Object, Object)>, Error> + Send + Sync>;
pub type InsertFn = Arc<dyn Fn(&Instance, Object, Object) -> Result<(), Error> + Send + Sync>;

/// Identity of a reflected type, with a lazy route to its descriptor.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
    describe: fn() -> TypeDescriptor,
}

impl TypeKey {
    pub fn of<T: Reflect>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            describe: T::describe,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Full Rust path, e.g. `my_crate::config::Server`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Last path segment without generics, e.g. `Server`.
    pub fn short_name(&self) -> &'static str {
        let base = match self.name.find('<') {
            Some(at) => &self.name[..at],
            None => self.name,
        };
        base.rsplit("::").next().unwrap_or(base)
    }

    /// Builds a fresh, unprepared descriptor.
    pub fn describe(&self) -> TypeDescriptor {
        (self.describe)()
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A unit variant of an enum and the names it used to have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumVariant {
    name: &'static str,
    remap: Vec<String>,
}

impl EnumVariant {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            remap: Vec::new(),
        }
    }

    /// Adds a legacy name accepted on read.
    pub fn remap(mut self, legacy: impl Into<String>) -> Self {
        self.remap.push(legacy.into());
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn remap_names(&self) -> &[String] {
        &self.remap
    }
}

/// Access to the items of a sequence-like type.
#[derive(Clone)]
pub struct CollectionDef {
    item: TypeKey,
    items: ItemsFn,
    push: PushFn,
}

impl CollectionDef {
    pub fn new(item: TypeKey, items: ItemsFn, push: PushFn) -> Self {
        Self { item, items, push }
    }

    /// Declared item type.
    pub fn item(&self) -> TypeKey {
        self.item
    }

    pub fn items(&self, instance: &Instance) -> Result<Vec<Object>, Error> {
        (self.items)(instance)
    }

    pub fn push(&self, instance: &Instance, item: Object) -> Result<(), Error> {
        (self.push)(instance, item)
    }
}

impl fmt::Debug for CollectionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionDef").field("item", &self.item).finish()
    }
}

/// Access to the entries of a map-like type.
#[derive(Clone)]
pub struct DictionaryDef {
    key: TypeKey,
    value: TypeKey,
    entries: EntriesFn,
    insert: InsertFn,
}

impl DictionaryDef {
    pub fn new(key: TypeKey, value: TypeKey, entries: EntriesFn, insert: InsertFn) -> Self {
        Self {
            key,
            value,
            entries,
            insert,
        }
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn value(&self) -> TypeKey {
        self.value
    }

    pub fn entries(&self, instance: &Instance) -> Result<Vec<(Object, Object)>, Error> {
        (self.entries)(instance)
    }

    pub fn insert(&self, instance: &Instance, key: Object, value: Object) -> Result<(), Error> {
        (self.insert)(instance, key, value)
    }
}

impl fmt::Debug for DictionaryDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DictionaryDef")
            .field("key", &self.key)
            .field("value", &self.value)
            .finish()
    }
}

/// How a type is written.
#[derive(Debug, Clone)]
pub enum TypeKind {
    /// A single scalar.
    Primitive(PrimitiveKind),
    /// A scalar naming one of the variants.
    Enum(Vec<EnumVariant>),
    /// A mapping of members.
    Object,
    /// A sequence of items (a mapping when the type also has members).
    Collection(CollectionDef),
    /// A mapping of entries (a mapping with `~Items` when the type also has
    /// members).
    Dictionary(DictionaryDef),
    /// `Option<T>`: null or a `T`.
    Nullable(TypeKey),
    /// Anything; resolved from tags and implicit typing.
    Dynamic,
}

/// One serialized member of an object type.
#[derive(Clone)]
pub struct MemberDescriptor {
    name: String,
    ty: TypeKey,
    order: Option<i32>,
    mask: u32,
    style: Option<DataStyle>,
    remap: Vec<String>,
    default_value: Option<DefaultFn>,
    get: GetterFn,
    set: Option<SetterFn>,
}

impl MemberDescriptor {
    /// A read-only member of declared type `ty`.
    pub fn new(name: impl Into<String>, ty: TypeKey, get: GetterFn) -> Self {
        Self {
            name: name.into(),
            ty,
            order: None,
            mask: DEFAULT_MASK,
            style: None,
            remap: Vec::new(),
            default_value: None,
            get,
            set: None,
        }
    }

    pub fn with_setter(mut self, set: SetterFn) -> Self {
        self.set = Some(set);
        self
    }

    /// Explicit position; ordered members come before all others.
    pub fn order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    pub fn mask(mut self, mask: u32) -> Self {
        self.mask = mask;
        self
    }

    pub fn style(mut self, style: DataStyle) -> Self {
        self.style = Some(style);
        self
    }

    /// Adds a legacy name accepted on read.
    pub fn remap(mut self, legacy: impl Into<String>) -> Self {
        self.remap.push(legacy.into());
        self
    }

    /// Renames the member as written.
    pub fn rename(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Value the member is omitted at when default values are not emitted.
    pub fn default_value<F: Reflect>(mut self, value: F) -> Self
    where
        F: Send + Sync,
    {
        self.default_value = Some(Arc::new(move || value.to_object()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> TypeKey {
        self.ty
    }

    pub fn declared_order(&self) -> Option<i32> {
        self.order
    }

    pub fn mask_bits(&self) -> u32 {
        self.mask
    }

    pub fn declared_style(&self) -> Option<DataStyle> {
        self.style
    }

    pub fn remap_names(&self) -> &[String] {
        &self.remap
    }

    pub fn is_writable(&self) -> bool {
        self.set.is_some()
    }

    /// Whether `value` equals the declared default.
    pub fn is_default(&self, value: &Object) -> bool {
        self.default_value
            .as_ref()
            .is_some_and(|default| default() == *value)
    }

    pub fn get(&self, instance: &Instance) -> Result<Object, Error> {
        (self.get)(instance)
    }

    /// Assigns the member. Read-only members ignore the value.
    pub fn set(&self, instance: &Instance, value: Object) -> Result<(), Error> {
        match &self.set {
            Some(set) => set(instance, value),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberDescriptor")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("order", &self.order)
            .field("mask", &self.mask)
            .finish_non_exhaustive()
    }
}

/// Everything the serializer needs to know about one type.
#[derive(Clone)]
pub struct TypeDescriptor {
    key: TypeKey,
    kind: TypeKind,
    members: Vec<MemberDescriptor>,
    factory: Option<FactoryFn>,
    tag: Option<String>,
    remap: Vec<String>,
    style: Option<DataStyle>,
}

impl TypeDescriptor {
    pub fn new(key: TypeKey, kind: TypeKind) -> Self {
        Self {
            key,
            kind,
            members: Vec::new(),
            factory: None,
            tag: None,
            remap: Vec::new(),
            style: None,
        }
    }

    /// Starts describing a struct-like type.
    pub fn object<T: Reflect>() -> ObjectBuilder<T> {
        ObjectBuilder {
            descriptor: TypeDescriptor::new(TypeKey::of::<T>(), TypeKind::Object),
            _marker: PhantomData,
        }
    }

    /// Describes a unit-only enum.
    pub fn enumeration<T: Reflect>(variants: Vec<EnumVariant>) -> Self {
        Self::new(TypeKey::of::<T>(), TypeKind::Enum(variants))
    }

    pub fn with_factory(mut self, factory: FactoryFn) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn with_members(mut self, members: Vec<MemberDescriptor>) -> Self {
        self.members = members;
        self
    }

    /// Explicit tag, written instead of the type name.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Legacy tag accepted on read.
    pub fn with_remap(mut self, legacy: impl Into<String>) -> Self {
        self.remap.push(legacy.into());
        self
    }

    pub fn with_style(mut self, style: DataStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    pub fn type_name(&self) -> &'static str {
        self.key.name()
    }

    pub fn short_name(&self) -> &'static str {
        self.key.short_name()
    }

    pub fn members(&self) -> &[MemberDescriptor] {
        &self.members
    }

    pub(crate) fn members_mut(&mut self) -> &mut Vec<MemberDescriptor> {
        &mut self.members
    }

    pub fn factory(&self) -> Option<&FactoryFn> {
        self.factory.as_ref()
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn remap_tags(&self) -> &[String] {
        &self.remap
    }

    pub fn style(&self) -> Option<DataStyle> {
        self.style
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self.kind, TypeKind::Primitive(_))
    }

    pub fn collection(&self) -> Option<&CollectionDef> {
        match &self.kind {
            TypeKind::Collection(def) => Some(def),
            _ => None,
        }
    }

    pub fn dictionary(&self) -> Option<&DictionaryDef> {
        match &self.kind {
            TypeKind::Dictionary(def) => Some(def),
            _ => None,
        }
    }

    /// Looks a member up by current name, then by legacy name. The flag is
    /// `true` when a legacy name matched.
    pub fn find_member(&self, name: &str) -> Option<(&MemberDescriptor, bool)> {
        if let Some(member) = self.members.iter().find(|m| m.name == name) {
            return Some((member, false));
        }
        self.members
            .iter()
            .find(|m| m.remap.iter().any(|legacy| legacy == name))
            .map(|member| (member, true))
    }

    /// Looks an enum variant up by current name, then by legacy name.
    pub fn find_variant(&self, name: &str) -> Option<(&'static str, bool)> {
        let TypeKind::Enum(variants) = &self.kind else {
            return None;
        };
        if let Some(variant) = variants.iter().find(|v| v.name == name) {
            return Some((variant.name, false));
        }
        variants
            .iter()
            .find(|v| v.remap.iter().any(|legacy| legacy == name))
            .map(|variant| (variant.name, true))
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("key", &self.key)
            .field("kind", &self.kind)
            .field("members", &self.members)
            .field("tag", &self.tag)
            .finish_non_exhaustive()
    }
}

/// Builder for struct-like descriptors, using plain accessor functions.
///
/// ```ignore
/// TypeDescriptor::object::<Point>()
///     .member("X", |p| &p.x, |p| &mut p.x)
///     .member_with("Y", |p| &p.y, |p| &mut p.y, |m| m.order(0))
///     .constructible()
///     .build()
/// ```
pub struct ObjectBuilder<T> {
    descriptor: TypeDescriptor,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Reflect> ObjectBuilder<T> {
    pub fn member<F: Reflect>(
        self,
        name: &str,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> Self {
        self.member_with(name, get, get_mut, |m| m)
    }

    /// Adds a member and adjusts its descriptor (order, mask, style, ...).
    pub fn member_with<F: Reflect>(
        mut self,
        name: &str,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
        configure: impl FnOnce(MemberDescriptor) -> MemberDescriptor,
    ) -> Self {
        let member = configure(field_member(name, get).with_setter(field_setter(get_mut)));
        self.descriptor.members.push(member);
        self
    }

    /// Adds a member that is written but never assigned on read.
    pub fn read_only<F: Reflect>(
        mut self,
        name: &str,
        get: fn(&T) -> &F,
        configure: impl FnOnce(MemberDescriptor) -> MemberDescriptor,
    ) -> Self {
        self.descriptor.members.push(configure(field_member(name, get)));
        self
    }

    /// Adds a member backed by arbitrary accessors.
    pub fn dynamic_member(mut self, member: MemberDescriptor) -> Self {
        self.descriptor.members.push(member);
        self
    }

    /// Makes the type an item container; with members it is written as a
    /// mapping carrying its items under the sentinel key.
    pub fn items<I: Reflect>(
        mut self,
        get: fn(&T) -> &Vec<I>,
        get_mut: fn(&mut T) -> &mut Vec<I>,
    ) -> Self {
        let items: ItemsFn = Arc::new(move |instance: &Instance| {
            instance.with_ref(|t: &T| get(t).iter().map(Reflect::to_object).collect())
        });
        let push: PushFn = Arc::new(move |instance: &Instance, item: Object| {
            let item = I::from_object(item)?;
            instance.with_mut(|t: &mut T| get_mut(t).push(item))
        });
        self.descriptor.kind = TypeKind::Collection(CollectionDef::new(TypeKey::of::<I>(), items, push));
        self
    }

    /// Makes the type a dictionary over an `IndexMap` field.
    pub fn entries<K, V>(
        mut self,
        get: fn(&T) -> &IndexMap<K, V>,
        get_mut: fn(&mut T) -> &mut IndexMap<K, V>,
    ) -> Self
    where
        K: Reflect + Hash + Eq,
        V: Reflect,
    {
        let entries: EntriesFn = Arc::new(move |instance: &Instance| {
            instance.with_ref(|t: &T| {
                get(t)
                    .iter()
                    .map(|(k, v)| (k.to_object(), v.to_object()))
                    .collect()
            })
        });
        let insert: InsertFn = Arc::new(move |instance: &Instance, key: Object, value: Object| {
            let key = K::from_object(key)?;
            let value = V::from_object(value)?;
            instance.with_mut(|t: &mut T| {
                get_mut(t).insert(key, value);
            })
        });
        self.descriptor.kind = TypeKind::Dictionary(DictionaryDef::new(
            TypeKey::of::<K>(),
            TypeKey::of::<V>(),
            entries,
            insert,
        ));
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.descriptor.tag = Some(tag.into());
        self
    }

    pub fn remap(mut self, legacy: impl Into<String>) -> Self {
        self.descriptor.remap.push(legacy.into());
        self
    }

    pub fn style(mut self, style: DataStyle) -> Self {
        self.descriptor.style = Some(style);
        self
    }

    /// Uses `T::default()` to create instances on read.
    pub fn constructible(mut self) -> Self
    where
        T: Default,
    {
        self.descriptor.factory = Some(Arc::new(|| T::default().to_object()));
        self
    }

    pub fn build(self) -> TypeDescriptor {
        self.descriptor
    }
}

fn field_member<T: Reflect, F: Reflect>(name: &str, get: fn(&T) -> &F) -> MemberDescriptor {
    let getter: GetterFn =
        Arc::new(move |instance: &Instance| instance.with_ref(|t: &T| get(t).to_object()));
    MemberDescriptor::new(name, TypeKey::of::<F>(), getter)
}

fn field_setter<T: Reflect, F: Reflect>(get_mut: fn(&mut T) -> &mut F) -> SetterFn {
    Arc::new(move |instance: &Instance, value: Object| {
        let value = F::from_object(value)?;
        instance.with_mut(|t: &mut T| *get_mut(t) = value)
    })
}
