//! YAML object graph serialization.
//!
//! Values are written through their [`Reflect`] descriptors: members in a
//! stable order, shared objects as anchors and aliases, runtime types as
//! tags. Reading resolves tags (including legacy ones), aliases and renamed
//! members back into the same graph.
//!
//! # Example
//!
//! ```
//! use graphyaml::{Reflect, TypeDescriptor, from_str, to_string};
//!
//! #[derive(Clone, Default, Debug, PartialEq)]
//! struct Config {
//!     name: String,
//!     ports: Vec<u16>,
//! }
//!
//! impl Reflect for Config {
//!     fn describe() -> TypeDescriptor {
//!         TypeDescriptor::object::<Self>()
//!             .member("Name", |c| &c.name, |c| &mut c.name)
//!             .member("Ports", |c| &c.ports, |c| &mut c.ports)
//!             .constructible()
//!             .build()
//!     }
//! }
//!
//! let config = Config { name: "myapp".into(), ports: vec![80, 443] };
//! let yaml = to_string(&config).unwrap();
//! assert_eq!(yaml, "Name: myapp\nPorts:\n  - 80\n  - 443\n");
//! assert_eq!(from_str::<Config>(&yaml).unwrap(), config);
//! ```

#![warn(missing_debug_implementations)]

mod backend;
mod context;
mod emitter;
mod hooks;
mod parser;
mod reader;
mod scalar;
mod serializer;
mod settings;
mod writer;

pub use backend::{DefaultBackend, ObjectSerializerBackend, computed_style, default_should_serialize};
pub use context::{ContextSettings, ObjectContext, SerializerContext};
pub use emitter::{YamlEmitter, render};
pub use hooks::{ObjectHooks, SerializerFactory};
pub use parser::YamlParser;
pub use serializer::Serializer;
pub use settings::{SPECIAL_COLLECTION_MEMBER, SerializerSettings};

pub use graphyaml_core::{
    AnchorTable, CollectionDef, CoreSchema, DEFAULT_MASK, DataStyle, DefaultObjectFactory, DictionaryDef, Document,
    Element, EnumValue, EnumVariant, Error, EventQueue, EventSink, EventSource, GetterFn, Instance, KeyComparer,
    LambdaObjectFactory, MemberDescriptor, Object, ObjectFactory, ParsingEvent, PrepareMembersFn, Primitive,
    PrimitiveKind, Reflect, Scalar, ScalarStyle, Schema, SetterFn, Shared, TypeDescriptor, TypeKey, TypeKind,
    TypeRegistry, YamlAlias, YamlMapping, YamlSequence, YamlValue, ordinal_comparer, shared,
};

/// Writes `value` with default settings.
pub fn to_string<T: Reflect>(value: &T) -> Result<String, Error> {
    Serializer::new().to_string(value)
}

/// Reads a `T` with default settings.
pub fn from_str<T: Reflect>(text: &str) -> Result<T, Error> {
    Serializer::new().from_str(text)
}
