//! Implicit typing of plain scalars and the core tag set.

use crate::primitive::{is_float_literal, parse_bool, parse_integer, special_float};
use crate::{Error, Primitive, PrimitiveKind, TypeDescriptor, TypeKind};

pub const NULL_TAG: &str = "!!null";
pub const BOOL_TAG: &str = "!!bool";
pub const INT_TAG: &str = "!!int";
pub const FLOAT_TAG: &str = "!!float";
pub const STR_TAG: &str = "!!str";
pub const TIMESTAMP_TAG: &str = "!!timestamp";
pub const BINARY_TAG: &str = "!!binary";
pub const MAP_TAG: &str = "!!map";
pub const SEQ_TAG: &str = "!!seq";

/// Maps primitive types to tags and plain text to typed values.
pub trait Schema: Send + Sync {
    /// Tag used for values of `kind`.
    fn default_tag(&self, kind: PrimitiveKind) -> &'static str;

    /// Type a plain, untagged scalar resolves to. `None` means null.
    fn resolve_plain(&self, text: &str) -> Option<Primitive>;

    /// Value of a scalar carrying one of this schema's tags.
    ///
    /// Returns `None` when `tag` is not a schema tag, so the caller can try
    /// type tags instead.
    fn resolve_tagged(&self, tag: &str, text: &str) -> Option<Result<Option<Primitive>, Error>>;

    /// Tag for a described type, or `None` (unresolved) for anything that is
    /// not a primitive.
    fn tag_for(&self, descriptor: &TypeDescriptor) -> Option<&'static str> {
        match descriptor.kind() {
            TypeKind::Primitive(kind) => Some(self.default_tag(*kind)),
            _ => None,
        }
    }

    /// Whether plain `text` would be read back as something other than a
    /// string.
    fn is_ambiguous(&self, text: &str) -> bool {
        !matches!(self.resolve_plain(text), Some(Primitive::String(_)))
    }

    /// Whether `tag` belongs to this schema.
    fn is_schema_tag(&self, tag: &str) -> bool {
        tag.starts_with("!!")
    }
}

/// The YAML 1.2 core schema.
///
/// Plain integers resolve to the narrowest of `i32`, `i64` and `u64`; plain
/// floats to `f64`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreSchema;

impl CoreSchema {
    fn narrow_integer(value: i128) -> Option<Primitive> {
        if let Ok(v) = i32::try_from(value) {
            Some(Primitive::I32(v))
        } else if let Ok(v) = i64::try_from(value) {
            Some(Primitive::I64(v))
        } else {
            u64::try_from(value).ok().map(Primitive::U64)
        }
    }

    fn wide_integer(value: i128) -> Option<Primitive> {
        match i64::try_from(value) {
            Ok(v) => Some(Primitive::I64(v)),
            Err(_) => u64::try_from(value).ok().map(Primitive::U64),
        }
    }

    fn is_null(text: &str) -> bool {
        matches!(text, "" | "~" | "null" | "Null" | "NULL")
    }
}

impl Schema for CoreSchema {
    fn default_tag(&self, kind: PrimitiveKind) -> &'static str {
        match kind {
            PrimitiveKind::Bool => BOOL_TAG,
            PrimitiveKind::I8
            | PrimitiveKind::I16
            | PrimitiveKind::I32
            | PrimitiveKind::I64
            | PrimitiveKind::U8
            | PrimitiveKind::U16
            | PrimitiveKind::U32
            | PrimitiveKind::U64 => INT_TAG,
            PrimitiveKind::F32 | PrimitiveKind::F64 => FLOAT_TAG,
            PrimitiveKind::Char | PrimitiveKind::String => STR_TAG,
        }
    }

    fn resolve_plain(&self, text: &str) -> Option<Primitive> {
        if Self::is_null(text) {
            return None;
        }
        if let Some(b) = parse_bool(text) {
            return Some(Primitive::Bool(b));
        }
        if let Some(v) = parse_integer(text).and_then(Self::narrow_integer) {
            return Some(v);
        }
        if is_float_literal(text) {
            let value = special_float(text).or_else(|| text.parse::<f64>().ok());
            if let Some(v) = value {
                return Some(Primitive::F64(v));
            }
        }
        Some(Primitive::String(text.to_owned()))
    }

    fn resolve_tagged(&self, tag: &str, text: &str) -> Option<Result<Option<Primitive>, Error>> {
        let invalid = |expected: &str| Error::InvalidScalar {
            value: text.to_owned(),
            expected: expected.to_owned(),
        };
        let resolved = match tag {
            NULL_TAG => Ok(None),
            BOOL_TAG => parse_bool(text)
                .map(|b| Some(Primitive::Bool(b)))
                .ok_or_else(|| invalid("bool")),
            INT_TAG => parse_integer(text)
                .and_then(Self::wide_integer)
                .map(Some)
                .ok_or_else(|| invalid("integer")),
            FLOAT_TAG => Primitive::parse(PrimitiveKind::F64, text).map(Some),
            STR_TAG | TIMESTAMP_TAG | BINARY_TAG => Ok(Some(Primitive::String(text.to_owned()))),
            _ => return None,
        };
        Some(resolved)
    }
}
