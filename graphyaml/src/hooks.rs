//! Custom per-type serializers that swap the populated instance.

use graphyaml_core::{Error, Object, TypeDescriptor};

/// Brackets population of one object.
///
/// Immutable types use this to populate a mutable builder: on write
/// `before_populate` turns the value into the builder whose members are
/// written, on read it creates an empty builder and `after_populate` turns
/// the filled builder back into the value.
pub trait ObjectHooks: Send + Sync {
    /// Instance whose members are read or written.
    ///
    /// On write `instance` is the value being written. On read it is what the
    /// object factory created, `None` when it could not create anything.
    fn before_populate(&self, instance: Option<Object>, is_serializing: bool) -> Result<Object, Error>;

    /// Final value after a read populated `instance`.
    fn after_populate(&self, instance: Object) -> Result<Object, Error> {
        Ok(instance)
    }
}

/// Offers hooks for the types it knows.
///
/// Registered factories are asked in registration order; the first one that
/// answers handles the type.
pub trait SerializerFactory: Send + Sync {
    fn try_create(&self, descriptor: &TypeDescriptor) -> Option<&dyn ObjectHooks>;
}
