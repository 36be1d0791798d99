//! Type-erased values flowing between the serializer and user types.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::{Error, Primitive, Reflect, TypeKey};

/// A value with reference identity. Only values held this way are anchored
/// when written, and aliases read back as clones of the same `Rc`.
pub type Shared<T> = Rc<RefCell<T>>;

/// Wraps a value in a fresh [`Shared`] cell.
pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}

/// A type-erased value.
#[derive(Clone)]
pub enum Object {
    Null,
    Primitive(Primitive),
    Enum(EnumValue),
    Instance(Instance),
}

impl Object {
    /// Wraps an owned composite value.
    pub fn owned<T: Reflect>(value: T) -> Self {
        Object::Instance(Instance::owned(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    /// Null, primitives and enum values are written as a single scalar.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Object::Instance(_))
    }

    pub fn as_primitive(&self) -> Option<&Primitive> {
        match self {
            Object::Primitive(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Object::Instance(i) => Some(i),
            _ => None,
        }
    }

    /// Text of a scalar object, used for key ordering and collision checks.
    pub fn scalar_text(&self) -> Option<String> {
        match self {
            Object::Null => Some("null".to_owned()),
            Object::Primitive(p) => Some(p.to_string()),
            Object::Enum(e) => Some(e.name().to_owned()),
            Object::Instance(_) => None,
        }
    }

    /// Short description, for error messages.
    pub fn describe(&self) -> String {
        match self {
            Object::Null => "null".to_owned(),
            Object::Primitive(p) => p.kind().name().to_owned(),
            Object::Enum(e) => e.type_key().name().to_owned(),
            Object::Instance(i) => i.type_key().name().to_owned(),
        }
    }

    /// Moves the composite value out, cloning it when the cell is still
    /// referenced elsewhere (for example by the anchor table).
    pub fn into_owned<T: Reflect>(self) -> Result<T, Error> {
        match self {
            Object::Instance(instance) => instance.into_owned(),
            other => Err(Error::mismatch(std::any::type_name::<T>(), other.describe())),
        }
    }

    /// Recovers the shared cell of a composite value.
    pub fn into_shared<T: Reflect>(self) -> Result<Shared<T>, Error> {
        match self {
            Object::Instance(instance) => instance.into_shared(),
            other => Err(Error::mismatch(std::any::type_name::<T>(), other.describe())),
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Null => f.write_str("Null"),
            Object::Primitive(p) => write!(f, "{p:?}"),
            Object::Enum(e) => write!(f, "{e:?}"),
            Object::Instance(i) => write!(f, "{i:?}"),
        }
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Object::Null, Object::Null) => true,
            (Object::Primitive(a), Object::Primitive(b)) => a == b,
            (Object::Enum(a), Object::Enum(b)) => a == b,
            (Object::Instance(a), Object::Instance(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl Eq for Object {}

impl Hash for Object {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Object::Null => {}
            Object::Primitive(p) => p.hash(state),
            Object::Enum(e) => e.hash(state),
            Object::Instance(i) => i.id().hash(state),
        }
    }
}

impl From<Primitive> for Object {
    fn from(value: Primitive) -> Self {
        Object::Primitive(value)
    }
}

/// A unit enum variant, identified by its type and written name.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    ty: TypeKey,
    name: String,
}

impl EnumValue {
    pub fn new(ty: TypeKey, name: impl Into<String>) -> Self {
        Self {
            ty,
            name: name.into(),
        }
    }

    /// Variant of `T` called `name`.
    pub fn of<T: Reflect>(name: impl Into<String>) -> Self {
        Self::new(TypeKey::of::<T>(), name)
    }

    pub fn type_key(&self) -> TypeKey {
        self.ty
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.ty.short_name(), self.name)
    }
}

/// A composite value behind an erased `Rc<RefCell<T>>`.
#[derive(Clone)]
pub struct Instance {
    cell: Rc<dyn Any>,
    ty: TypeKey,
    shared: bool,
}

impl Instance {
    /// A fresh cell with no identity outside the serializer.
    pub fn owned<T: Reflect>(value: T) -> Self {
        Self {
            cell: Rc::new(RefCell::new(value)),
            ty: TypeKey::of::<T>(),
            shared: false,
        }
    }

    /// The caller's own cell; writing it twice produces an alias.
    pub fn shared<T: Reflect>(cell: &Shared<T>) -> Self {
        let cell: Rc<dyn Any> = cell.clone();
        Self {
            cell,
            ty: TypeKey::of::<T>(),
            shared: true,
        }
    }

    /// Runtime type of the value.
    pub fn type_key(&self) -> TypeKey {
        self.ty
    }

    pub fn is_shared(&self) -> bool {
        self.shared
    }

    /// Address of the cell, stable while any clone is alive.
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.cell) as *const () as usize
    }

    pub fn ptr_eq(&self, other: &Instance) -> bool {
        self.id() == other.id()
    }

    fn cell<T: 'static>(&self) -> Result<&RefCell<T>, Error> {
        self.cell
            .downcast_ref::<RefCell<T>>()
            .ok_or_else(|| Error::mismatch(std::any::type_name::<T>(), self.ty.name()))
    }

    /// Runs `f` with a shared borrow of the value.
    pub fn with_ref<T: 'static, R>(&self, f: impl FnOnce(&T) -> R) -> Result<R, Error> {
        let value = self
            .cell::<T>()?
            .try_borrow()
            .map_err(|_| Error::Custom(format!("`{}` is being mutated", self.ty.name())))?;
        Ok(f(&value))
    }

    /// Runs `f` with an exclusive borrow of the value.
    pub fn with_mut<T: 'static, R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, Error> {
        let mut value = self
            .cell::<T>()?
            .try_borrow_mut()
            .map_err(|_| Error::Custom(format!("`{}` is borrowed", self.ty.name())))?;
        Ok(f(&mut value))
    }

    pub fn into_shared<T: Reflect>(self) -> Result<Shared<T>, Error> {
        let name = self.ty.name();
        self.cell
            .downcast::<RefCell<T>>()
            .map_err(|_| Error::mismatch(std::any::type_name::<T>(), name))
    }

    pub fn into_owned<T: Reflect>(self) -> Result<T, Error> {
        let cell = self.into_shared::<T>()?;
        match Rc::try_unwrap(cell) {
            Ok(cell) => Ok(cell.into_inner()),
            Err(cell) => cell
                .try_borrow()
                .map(|value| value.clone())
                .map_err(|_| Error::Custom(format!("`{}` is borrowed", std::any::type_name::<T>()))),
        }
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:#x}", self.ty.short_name(), self.id())
    }
}
