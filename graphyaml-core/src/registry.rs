//! The type shape provider: cached descriptors plus the tag table.

use std::any::TypeId;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::{Error, MemberDescriptor, Reflect, TypeDescriptor, TypeKey};

/// Orders member names (and dictionary keys) that carry no explicit order.
pub type KeyComparer = Arc<dyn Fn(&str, &str) -> Ordering + Send + Sync>;

/// Adjusts the member list of a type when it is first described, e.g. to
/// add members backed by external storage.
pub type PrepareMembersFn = Arc<dyn Fn(&TypeDescriptor, &mut Vec<MemberDescriptor>) + Send + Sync>;

/// Ordinal string comparison, the default key order.
pub fn ordinal_comparer() -> KeyComparer {
    Arc::new(|a: &str, b: &str| a.cmp(b))
}

/// Describes types on demand and resolves tags to types.
///
/// Descriptors are prepared once (dynamic members appended, members sorted)
/// and shared as `Arc<TypeDescriptor>`. The cache keeps the order in which
/// types were first described.
pub struct TypeRegistry {
    cache: RwLock<IndexMap<TypeId, Arc<TypeDescriptor>>>,
    tag_to_type: HashMap<String, TypeKey>,
    type_to_tag: HashMap<TypeId, String>,
    remap_tags: HashMap<String, TypeKey>,
    prepare_members: Option<PrepareMembersFn>,
    key_comparer: Option<KeyComparer>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self {
            cache: RwLock::default(),
            tag_to_type: HashMap::new(),
            type_to_tag: HashMap::new(),
            remap_tags: HashMap::new(),
            prepare_members: None,
            key_comparer: Some(ordinal_comparer()),
        }
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("tags", &self.tag_to_type)
            .field("remap_tags", &self.remap_tags)
            .finish_non_exhaustive()
    }
}

/// Tags are stored in `!name` form whatever the caller passed.
fn normalize_tag(tag: &str) -> String {
    if tag.starts_with('!') {
        tag.to_owned()
    } else {
        format!("!{tag}")
    }
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `tag` to `key` for reading, and for writing unless the type
    /// already has a tag.
    pub fn register_tag(&mut self, tag: &str, key: TypeKey) {
        let tag = normalize_tag(tag);
        debug!(%tag, ty = key.name(), "registering tag");
        self.type_to_tag.entry(key.id()).or_insert_with(|| tag.clone());
        self.tag_to_type.insert(tag, key);
    }

    /// Accepts `legacy` as an old name of `key` on read.
    pub fn register_remap(&mut self, legacy: &str, key: TypeKey) {
        self.remap_tags.insert(normalize_tag(legacy), key);
    }

    /// Describes `T` and registers its declared tag and legacy tags.
    pub fn register<T: Reflect>(&mut self) -> Result<Arc<TypeDescriptor>, Error> {
        let descriptor = self.describe(TypeKey::of::<T>())?;
        if let Some(tag) = descriptor.tag() {
            self.register_tag(tag, descriptor.key());
        }
        for legacy in descriptor.remap_tags() {
            self.register_remap(legacy, descriptor.key());
        }
        Ok(descriptor)
    }

    pub fn set_prepare_members(&mut self, prepare: PrepareMembersFn) {
        self.prepare_members = Some(prepare);
        self.clear_cache();
    }

    /// `None` keeps declaration order for unordered members.
    pub fn set_key_comparer(&mut self, comparer: Option<KeyComparer>) {
        self.key_comparer = comparer;
        self.clear_cache();
    }

    pub fn key_comparer(&self) -> Option<&KeyComparer> {
        self.key_comparer.as_ref()
    }

    fn clear_cache(&mut self) {
        self.cache
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// The prepared descriptor of `key`.
    pub fn describe(&self, key: TypeKey) -> Result<Arc<TypeDescriptor>, Error> {
        if let Some(found) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key.id())
        {
            return Ok(found.clone());
        }

        trace!(ty = key.name(), "describing type");
        let mut descriptor = key.describe();
        if let Some(prepare) = &self.prepare_members {
            let mut members = descriptor.members().to_vec();
            prepare(&descriptor, &mut members);
            *descriptor.members_mut() = members;
        }
        self.sort_members(descriptor.members_mut());

        let mut seen = HashSet::new();
        for member in descriptor.members() {
            if !seen.insert(member.name()) {
                return Err(Error::MemberCollision {
                    key: member.name().to_owned(),
                    type_name: descriptor.type_name().to_owned(),
                });
            }
        }

        let descriptor = Arc::new(descriptor);
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        // `Shared<T>` describes as `T`: cache under both identities
        cache.insert(key.id(), descriptor.clone());
        cache
            .entry(descriptor.key().id())
            .or_insert_with(|| descriptor.clone());
        Ok(descriptor)
    }

    fn sort_members(&self, members: &mut Vec<MemberDescriptor>) {
        let (mut ordered, mut rest): (Vec<_>, Vec<_>) = members
            .drain(..)
            .partition(|m| m.declared_order().is_some());
        ordered.sort_by_key(MemberDescriptor::declared_order);
        if let Some(compare) = &self.key_comparer {
            rest.sort_by(|a, b| compare(a.name(), b.name()));
        }
        ordered.append(&mut rest);
        *members = ordered;
    }

    /// Registered or declared tag of a type, if it has one.
    pub fn explicit_tag(&self, descriptor: &TypeDescriptor) -> Option<String> {
        self.type_to_tag
            .get(&descriptor.key().id())
            .cloned()
            .or_else(|| descriptor.tag().map(normalize_tag))
    }

    /// Tag written for a type: its explicit tag, else its Rust name.
    pub fn tag_for(&self, descriptor: &TypeDescriptor, short_name: bool) -> String {
        self.explicit_tag(descriptor).unwrap_or_else(|| {
            if short_name {
                format!("!{}", descriptor.short_name())
            } else {
                format!("!{}", descriptor.type_name())
            }
        })
    }

    /// Resolves a type tag. The flag is `true` when a legacy tag matched.
    ///
    /// Lookup order: registered tags, registered legacy tags, then the
    /// declared tags, full Rust names and legacy tags of every type
    /// described so far, in description order. A short Rust name is tried
    /// last and must match exactly one type.
    pub fn resolve_tag(&self, tag: &str) -> Result<(TypeKey, bool), Error> {
        let tag = normalize_tag(tag);
        if let Some(key) = self.tag_to_type.get(&tag) {
            return Ok((*key, false));
        }
        if let Some(key) = self.remap_tags.get(&tag) {
            debug!(%tag, ty = key.name(), "legacy tag");
            return Ok((*key, true));
        }

        let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        let name = &tag[1..];
        let mut by_short_name: Vec<&TypeDescriptor> = Vec::new();
        for descriptor in cache.values() {
            if descriptor.tag().map(normalize_tag).as_deref() == Some(tag.as_str())
                || descriptor.type_name() == name
            {
                return Ok((descriptor.key(), false));
            }
            if descriptor.remap_tags().iter().any(|legacy| normalize_tag(legacy) == tag) {
                debug!(%tag, ty = descriptor.type_name(), "legacy tag");
                return Ok((descriptor.key(), true));
            }
            // `Shared<T>` and `T` share one descriptor
            if descriptor.short_name() == name && by_short_name.iter().all(|d| d.key() != descriptor.key()) {
                by_short_name.push(descriptor);
            }
        }
        match by_short_name.as_slice() {
            [] => Err(Error::UnknownTag { tag }),
            [descriptor] => Ok((descriptor.key(), false)),
            candidates => Err(Error::AmbiguousTag {
                candidates: candidates.iter().map(|d| d.type_name().to_owned()).collect(),
                tag,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DataStyle, DEFAULT_MASK};

    #[derive(Clone, Default)]
    struct Ordered {
        name: String,
        name_after: String,
        before_name: String,
        first: String,
        second: String,
    }

    impl Reflect for Ordered {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::object::<Self>()
                .member_with("Second", |t| &t.second, |t| &mut t.second, |m| m.order(1))
                .member_with("First", |t| &t.first, |t| &mut t.first, |m| m.order(0))
                .member("NameAfter", |t| &t.name_after, |t| &mut t.name_after)
                .member("Name", |t| &t.name, |t| &mut t.name)
                .member_with("BeforeName", |t| &t.before_name, |t| &mut t.before_name, |m| {
                    m.order(2).style(DataStyle::Flow)
                })
                .tag("!ordered")
                .remap("!ordered-v0")
                .constructible()
                .build()
        }
    }

    fn names(descriptor: &TypeDescriptor) -> Vec<&str> {
        descriptor.members().iter().map(MemberDescriptor::name).collect()
    }

    #[test]
    fn explicit_order_then_alphabetical() {
        let registry = TypeRegistry::new();
        let descriptor = registry.describe(TypeKey::of::<Ordered>()).unwrap();
        assert_eq!(
            names(&descriptor),
            ["First", "Second", "BeforeName", "Name", "NameAfter"]
        );
        assert_eq!(descriptor.members()[0].mask_bits(), DEFAULT_MASK);
    }

    #[test]
    fn no_comparer_keeps_declaration_order() {
        let mut registry = TypeRegistry::new();
        registry.set_key_comparer(None);
        let descriptor = registry.describe(TypeKey::of::<Ordered>()).unwrap();
        assert_eq!(
            names(&descriptor),
            ["First", "Second", "BeforeName", "NameAfter", "Name"]
        );
    }

    #[test]
    fn tags_resolve_by_mapping_remap_and_name() {
        let mut registry = TypeRegistry::new();
        registry.register::<Ordered>().unwrap();
        assert_eq!(
            registry.resolve_tag("!ordered").unwrap(),
            (TypeKey::of::<Ordered>(), false)
        );
        assert_eq!(
            registry.resolve_tag("!ordered-v0").unwrap(),
            (TypeKey::of::<Ordered>(), true)
        );
        assert_eq!(
            registry.resolve_tag("!Ordered").unwrap(),
            (TypeKey::of::<Ordered>(), false)
        );
        assert!(matches!(
            registry.resolve_tag("!Missing"),
            Err(Error::UnknownTag { .. })
        ));
    }

    mod first {
        #[derive(Clone, Default)]
        pub struct Item;

        impl crate::Reflect for Item {
            fn describe() -> crate::TypeDescriptor {
                crate::TypeDescriptor::object::<Self>().constructible().build()
            }
        }
    }

    mod second {
        #[derive(Clone, Default)]
        pub struct Item;

        impl crate::Reflect for Item {
            fn describe() -> crate::TypeDescriptor {
                crate::TypeDescriptor::object::<Self>().constructible().build()
            }
        }
    }

    #[test]
    fn short_name_shared_by_two_types_is_ambiguous() {
        let registry = TypeRegistry::new();
        let first = registry.describe(TypeKey::of::<first::Item>()).unwrap();
        let second = registry.describe(TypeKey::of::<second::Item>()).unwrap();
        registry.describe(TypeKey::of::<crate::Shared<first::Item>>()).unwrap();

        for _ in 0..8 {
            match registry.resolve_tag("!Item") {
                Err(Error::AmbiguousTag { tag, candidates }) => {
                    assert_eq!(tag, "!Item");
                    assert_eq!(candidates, [first.type_name(), second.type_name()]);
                }
                other => panic!("expected an ambiguous tag, got {other:?}"),
            }
        }
        assert_eq!(
            registry.resolve_tag(&format!("!{}", first.type_name())).unwrap(),
            (TypeKey::of::<first::Item>(), false)
        );
        assert_eq!(
            registry.resolve_tag(second.type_name()).unwrap(),
            (TypeKey::of::<second::Item>(), false)
        );
    }

    #[test]
    fn short_name_resolves_once_it_is_unique() {
        let registry = TypeRegistry::new();
        registry.describe(TypeKey::of::<first::Item>()).unwrap();
        registry.describe(TypeKey::of::<crate::Shared<first::Item>>()).unwrap();
        assert_eq!(
            registry.resolve_tag("!Item").unwrap(),
            (TypeKey::of::<first::Item>(), false)
        );
    }

    #[test]
    fn prepare_members_appends_dynamic_members() {
        let mut registry = TypeRegistry::new();
        registry.set_prepare_members(Arc::new(
            |descriptor: &TypeDescriptor, members: &mut Vec<MemberDescriptor>| {
                if descriptor.key() != TypeKey::of::<Ordered>() {
                    return;
                }
                let getter: crate::GetterFn = Arc::new(|_: &crate::Instance| Ok(crate::Object::Null));
                members.push(
                    MemberDescriptor::new("~Id", TypeKey::of::<Option<i32>>(), getter).order(-1000),
                );
            },
        ));
        let descriptor = registry.describe(TypeKey::of::<Ordered>()).unwrap();
        assert_eq!(names(&descriptor)[0], "~Id");
    }
}
