//! Core model for graphyaml: parsing events, the document tree, the core
//! schema, type descriptors and the per-session anchor table.
//!
//! Types take part in serialization by implementing [`Reflect`]:
//!
//! ```
//! use graphyaml_core::{Reflect, TypeDescriptor, TypeRegistry, TypeKey};
//!
//! #[derive(Clone, Default)]
//! struct Server {
//!     host: String,
//!     port: u16,
//! }
//!
//! impl Reflect for Server {
//!     fn describe() -> TypeDescriptor {
//!         TypeDescriptor::object::<Self>()
//!             .member("Host", |s| &s.host, |s| &mut s.host)
//!             .member("Port", |s| &s.port, |s| &mut s.port)
//!             .constructible()
//!             .build()
//!     }
//! }
//!
//! let registry = TypeRegistry::new();
//! let descriptor = registry.describe(TypeKey::of::<Server>()).unwrap();
//! assert_eq!(descriptor.members().len(), 2);
//! ```

#![warn(missing_debug_implementations)]

mod anchors;
mod document;
mod error;
mod event;
mod factory;
mod object;
mod primitive;
mod reflect;
mod registry;
mod schema;
mod shape;

pub use anchors::AnchorTable;
pub use document::{Document, Element, YamlAlias, YamlMapping, YamlSequence, YamlValue};
pub use error::Error;
pub use event::{DataStyle, EventQueue, EventSink, EventSource, ParsingEvent, Scalar, ScalarStyle};
pub use factory::{DefaultObjectFactory, LambdaObjectFactory, ObjectFactory, create_instance};
pub use object::{EnumValue, Instance, Object, Shared, shared};
pub use primitive::{Primitive, PrimitiveKind, is_float_literal, parse_bool, parse_integer, special_float};
pub use reflect::Reflect;
pub use registry::{KeyComparer, PrepareMembersFn, TypeRegistry, ordinal_comparer};
pub use schema::{
    BINARY_TAG, BOOL_TAG, CoreSchema, FLOAT_TAG, INT_TAG, MAP_TAG, NULL_TAG, SEQ_TAG, STR_TAG,
    Schema, TIMESTAMP_TAG,
};
pub use shape::{
    CollectionDef, DEFAULT_MASK, DefaultFn, DictionaryDef, EntriesFn, EnumVariant, FactoryFn,
    GetterFn, InsertFn, ItemsFn, MemberDescriptor, ObjectBuilder, PushFn, SetterFn, TypeDescriptor,
    TypeKey, TypeKind,
};
