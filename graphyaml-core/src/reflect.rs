//! The `Reflect` trait and its implementations for std and indexmap types.

use std::collections::BTreeMap;
use std::hash::Hash;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::{
    CollectionDef, DictionaryDef, Error, Instance, Object, Primitive, PrimitiveKind, Shared,
    TypeDescriptor, TypeKey, TypeKind,
};

/// A type the serializer can read and write.
///
/// Composite types implement [`Reflect::describe`] with
/// [`TypeDescriptor::object`] and keep the default conversions; primitives
/// and containers are covered here.
pub trait Reflect: Clone + 'static {
    /// Builds the type's descriptor. Called once per registry; the result is
    /// cached.
    fn describe() -> TypeDescriptor;

    /// Erases the value.
    fn to_object(&self) -> Object {
        Object::owned(self.clone())
    }

    /// Recovers a value from an erased one.
    fn from_object(object: Object) -> Result<Self, Error> {
        object.into_owned()
    }
}

fn mismatch<T>(object: &Object) -> Error {
    Error::TypeMismatch {
        expected: std::any::type_name::<T>().to_owned(),
        found: object.describe(),
    }
}

macro_rules! impl_integer {
    ($($ty:ty => $kind:ident),* $(,)?) => {$(
        impl Reflect for $ty {
            fn describe() -> TypeDescriptor {
                TypeDescriptor::new(TypeKey::of::<Self>(), TypeKind::Primitive(PrimitiveKind::$kind))
                    .with_factory(Arc::new(|| Object::Primitive(Primitive::$kind(0))))
            }

            fn to_object(&self) -> Object {
                Object::Primitive(Primitive::$kind(*self))
            }

            fn from_object(object: Object) -> Result<Self, Error> {
                object
                    .as_primitive()
                    .and_then(Primitive::as_i128)
                    .and_then(|v| <$ty>::try_from(v).ok())
                    .ok_or_else(|| mismatch::<$ty>(&object))
            }
        }
    )*};
}

impl_integer! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
}

impl Reflect for f32 {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new(TypeKey::of::<Self>(), TypeKind::Primitive(PrimitiveKind::F32))
            .with_factory(Arc::new(|| Object::Primitive(Primitive::F32(0.0))))
    }

    fn to_object(&self) -> Object {
        Object::Primitive(Primitive::F32(*self))
    }

    fn from_object(object: Object) -> Result<Self, Error> {
        match object {
            Object::Primitive(Primitive::F32(v)) => Ok(v),
            other => other
                .as_primitive()
                .and_then(Primitive::as_f64)
                .map(|v| v as f32)
                .ok_or_else(|| mismatch::<f32>(&other)),
        }
    }
}

impl Reflect for f64 {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new(TypeKey::of::<Self>(), TypeKind::Primitive(PrimitiveKind::F64))
            .with_factory(Arc::new(|| Object::Primitive(Primitive::F64(0.0))))
    }

    fn to_object(&self) -> Object {
        Object::Primitive(Primitive::F64(*self))
    }

    fn from_object(object: Object) -> Result<Self, Error> {
        object
            .as_primitive()
            .and_then(Primitive::as_f64)
            .ok_or_else(|| mismatch::<f64>(&object))
    }
}

impl Reflect for bool {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new(TypeKey::of::<Self>(), TypeKind::Primitive(PrimitiveKind::Bool))
            .with_factory(Arc::new(|| Object::Primitive(Primitive::Bool(false))))
    }

    fn to_object(&self) -> Object {
        Object::Primitive(Primitive::Bool(*self))
    }

    fn from_object(object: Object) -> Result<Self, Error> {
        match object {
            Object::Primitive(Primitive::Bool(v)) => Ok(v),
            other => Err(mismatch::<bool>(&other)),
        }
    }
}

impl Reflect for char {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new(TypeKey::of::<Self>(), TypeKind::Primitive(PrimitiveKind::Char))
            .with_factory(Arc::new(|| Object::Primitive(Primitive::Char('\0'))))
    }

    fn to_object(&self) -> Object {
        Object::Primitive(Primitive::Char(*self))
    }

    fn from_object(object: Object) -> Result<Self, Error> {
        let text = object.as_primitive().and_then(Primitive::as_text);
        let mut chars = text.as_deref().unwrap_or_default().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(mismatch::<char>(&object)),
        }
    }
}

impl Reflect for String {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new(TypeKey::of::<Self>(), TypeKind::Primitive(PrimitiveKind::String))
            .with_factory(Arc::new(|| Object::Primitive(Primitive::String(String::new()))))
    }

    fn to_object(&self) -> Object {
        Object::Primitive(Primitive::String(self.clone()))
    }

    fn from_object(object: Object) -> Result<Self, Error> {
        object
            .as_primitive()
            .and_then(Primitive::as_text)
            .ok_or_else(|| mismatch::<String>(&object))
    }
}

/// Any value; read from tags and implicit typing.
impl Reflect for Object {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new(TypeKey::of::<Self>(), TypeKind::Dynamic)
    }

    fn to_object(&self) -> Object {
        self.clone()
    }

    fn from_object(object: Object) -> Result<Self, Error> {
        Ok(object)
    }
}

impl<T: Reflect> Reflect for Option<T> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new(TypeKey::of::<Self>(), TypeKind::Nullable(TypeKey::of::<T>()))
            .with_factory(Arc::new(|| Object::Null))
    }

    fn to_object(&self) -> Object {
        match self {
            Some(value) => value.to_object(),
            None => Object::Null,
        }
    }

    fn from_object(object: Object) -> Result<Self, Error> {
        match object {
            Object::Null => Ok(None),
            other => T::from_object(other).map(Some),
        }
    }
}

/// Shares the descriptor of `T`; the cell itself is what gets anchored.
impl<T: Reflect> Reflect for Shared<T> {
    fn describe() -> TypeDescriptor {
        T::describe()
    }

    fn to_object(&self) -> Object {
        Object::Instance(Instance::shared(self))
    }

    fn from_object(object: Object) -> Result<Self, Error> {
        object.into_shared()
    }
}

fn vec_items<T: Reflect>(instance: &Instance) -> Result<Vec<Object>, Error> {
    instance.with_ref(|items: &Vec<T>| items.iter().map(Reflect::to_object).collect())
}

fn vec_push<T: Reflect>(instance: &Instance, item: Object) -> Result<(), Error> {
    let item = T::from_object(item)?;
    instance.with_mut(|items: &mut Vec<T>| items.push(item))
}

impl<T: Reflect> Reflect for Vec<T> {
    fn describe() -> TypeDescriptor {
        let def = CollectionDef::new(
            TypeKey::of::<T>(),
            Arc::new(vec_items::<T>),
            Arc::new(vec_push::<T>),
        );
        TypeDescriptor::new(TypeKey::of::<Self>(), TypeKind::Collection(def))
            .with_factory(Arc::new(|| Object::owned(Vec::<T>::new())))
    }
}

fn index_map_entries<K: Reflect, V: Reflect>(
    instance: &Instance,
) -> Result<Vec<(Object, Object)>, Error> {
    instance.with_ref(|map: &IndexMap<K, V>| {
        map.iter()
            .map(|(k, v)| (k.to_object(), v.to_object()))
            .collect()
    })
}

fn index_map_insert<K: Reflect + Hash + Eq, V: Reflect>(
    instance: &Instance,
    key: Object,
    value: Object,
) -> Result<(), Error> {
    let key = K::from_object(key)?;
    let value = V::from_object(value)?;
    instance.with_mut(|map: &mut IndexMap<K, V>| {
        map.insert(key, value);
    })
}

impl<K: Reflect + Hash + Eq, V: Reflect> Reflect for IndexMap<K, V> {
    fn describe() -> TypeDescriptor {
        let def = DictionaryDef::new(
            TypeKey::of::<K>(),
            TypeKey::of::<V>(),
            Arc::new(index_map_entries::<K, V>),
            Arc::new(index_map_insert::<K, V>),
        );
        TypeDescriptor::new(TypeKey::of::<Self>(), TypeKind::Dictionary(def))
            .with_factory(Arc::new(|| Object::owned(IndexMap::<K, V>::new())))
    }
}

fn btree_entries<K: Reflect, V: Reflect>(instance: &Instance) -> Result<Vec<(Object, Object)>, Error> {
    instance.with_ref(|map: &BTreeMap<K, V>| {
        map.iter()
            .map(|(k, v)| (k.to_object(), v.to_object()))
            .collect()
    })
}

fn btree_insert<K: Reflect + Ord, V: Reflect>(
    instance: &Instance,
    key: Object,
    value: Object,
) -> Result<(), Error> {
    let key = K::from_object(key)?;
    let value = V::from_object(value)?;
    instance.with_mut(|map: &mut BTreeMap<K, V>| {
        map.insert(key, value);
    })
}

impl<K: Reflect + Ord, V: Reflect> Reflect for BTreeMap<K, V> {
    fn describe() -> TypeDescriptor {
        let def = DictionaryDef::new(
            TypeKey::of::<K>(),
            TypeKey::of::<V>(),
            Arc::new(btree_entries::<K, V>),
            Arc::new(btree_insert::<K, V>),
        );
        TypeDescriptor::new(TypeKey::of::<Self>(), TypeKind::Dictionary(def))
            .with_factory(Arc::new(|| Object::owned(BTreeMap::<K, V>::new())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared;

    #[test]
    fn integers_convert_between_widths() {
        let object = 300i64.to_object();
        assert_eq!(i32::from_object(object.clone()).unwrap(), 300);
        assert!(u8::from_object(object).is_err());
    }

    #[test]
    fn options_map_to_null() {
        assert!(None::<String>.to_object().is_null());
        assert_eq!(Option::<String>::from_object(Object::Null).unwrap(), None);
        let some = Some("x".to_owned()).to_object();
        assert_eq!(Option::<String>::from_object(some).unwrap().as_deref(), Some("x"));
    }

    #[test]
    fn shared_values_keep_identity() {
        let cell = shared(vec![1, 2, 3]);
        let object = cell.to_object();
        let back = Shared::<Vec<i32>>::from_object(object).unwrap();
        assert!(std::rc::Rc::ptr_eq(&cell, &back));
    }

    #[test]
    fn vec_items_round_trip_through_the_collection_def() {
        let descriptor = Vec::<u16>::describe();
        let def = descriptor.collection().unwrap();
        let object = vec![1u16, 2].to_object();
        let instance = object.as_instance().unwrap();
        def.push(instance, Primitive::U16(3).into()).unwrap();
        let items = def.items(instance).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(Vec::<u16>::from_object(object).unwrap(), vec![1, 2, 3]);
    }
}
