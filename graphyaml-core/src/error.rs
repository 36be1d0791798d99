//! The error type shared by every graphyaml layer.

use std::fmt;

/// Everything that can go wrong while moving between events and objects.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The event sequence does not nest properly (missing end event, stray
    /// end event, stream ended mid-structure).
    MalformedStream {
        /// What the reader was waiting for.
        expected: &'static str,
        /// What it got instead.
        found: String,
    },
    /// A tag could not be resolved to a registered or known type.
    UnknownTag {
        /// The tag as written in the document.
        tag: String,
    },
    /// A short type name in a tag matches more than one described type.
    AmbiguousTag {
        /// The tag as written in the document.
        tag: String,
        /// Full Rust names of the matching types, in the order they were
        /// described.
        candidates: Vec<String>,
    },
    /// An alias refers to an anchor that was never registered.
    AnchorNotFound {
        /// The label that failed to resolve.
        anchor: String,
    },
    /// Two entries of one mapping would share a key.
    MemberCollision {
        /// The duplicated key.
        key: String,
        /// The type being written or described.
        type_name: String,
    },
    /// A type could not be constructed: no factory produced an instance.
    TypeShapeUnavailable {
        /// Rust name of the type.
        type_name: String,
    },
    /// A mapping key matched neither a member nor the items sentinel.
    UnknownMember {
        /// The key as read.
        member: String,
        /// The type being populated.
        type_name: String,
    },
    /// A scalar could not be converted to the declared type.
    InvalidScalar {
        /// Scalar text.
        value: String,
        /// Name of the expected type.
        expected: String,
    },
    /// A node or object does not have the shape the target needs.
    TypeMismatch {
        /// What the target needs.
        expected: String,
        /// What was found.
        found: String,
    },
    /// The lexer rejected the input text.
    Syntax {
        /// Lexer message.
        message: String,
        /// Character offset of the failure, when known.
        offset: Option<usize>,
    },
    /// Raised by user-supplied hooks and backends.
    Custom(String),
}

impl Error {
    /// A [`Error::MalformedStream`].
    pub fn malformed(expected: &'static str, found: impl Into<String>) -> Self {
        Error::MalformedStream {
            expected,
            found: found.into(),
        }
    }

    /// A [`Error::TypeMismatch`].
    pub fn mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Error::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Stable identifier of the error kind, also used as the diagnostic code.
    pub fn code(&self) -> &'static str {
        match self {
            Error::MalformedStream { .. } => "graphyaml::malformed_stream",
            Error::UnknownTag { .. } => "graphyaml::unknown_tag",
            Error::AmbiguousTag { .. } => "graphyaml::ambiguous_tag",
            Error::AnchorNotFound { .. } => "graphyaml::anchor_not_found",
            Error::MemberCollision { .. } => "graphyaml::member_collision",
            Error::TypeShapeUnavailable { .. } => "graphyaml::type_shape_unavailable",
            Error::UnknownMember { .. } => "graphyaml::unknown_member",
            Error::InvalidScalar { .. } => "graphyaml::invalid_scalar",
            Error::TypeMismatch { .. } => "graphyaml::type_mismatch",
            Error::Syntax { .. } => "graphyaml::syntax",
            Error::Custom(_) => "graphyaml::custom",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MalformedStream { expected, found } => {
                write!(f, "malformed event stream: expected {expected}, found {found}")
            }
            Error::UnknownTag { tag } => write!(f, "unknown tag `{tag}`"),
            Error::AmbiguousTag { tag, candidates } => {
                write!(f, "tag `{tag}` matches several types: {}", candidates.join(", "))
            }
            Error::AnchorNotFound { anchor } => write!(f, "alias refers to unknown anchor `{anchor}`"),
            Error::MemberCollision { key, type_name } => {
                write!(f, "key `{key}` appears twice in the mapping of `{type_name}`")
            }
            Error::TypeShapeUnavailable { type_name } => {
                write!(f, "cannot create an instance of `{type_name}`")
            }
            Error::UnknownMember { member, type_name } => {
                write!(f, "`{type_name}` has no member `{member}`")
            }
            Error::InvalidScalar { value, expected } => {
                write!(f, "cannot read `{value}` as {expected}")
            }
            Error::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected {expected}, found {found}")
            }
            Error::Syntax { message, offset } => match offset {
                Some(offset) => write!(f, "syntax error at offset {offset}: {message}"),
                None => write!(f, "syntax error: {message}"),
            },
            Error::Custom(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for Error {}

impl miette::Diagnostic for Error {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(Error::code(self)))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Error::AnchorNotFound { .. } => Some(Box::new(
                "a serializer with `reset_alias = false` keeps anchors between calls and may write aliases to objects from an earlier call",
            )),
            Error::UnknownTag { .. } => Some(Box::new(
                "register the type or the tag on the serializer settings before reading",
            )),
            Error::AmbiguousTag { .. } => Some(Box::new(
                "write the full type name in the tag, or register a tag for one of the types",
            )),
            Error::MemberCollision { .. } => Some(Box::new(
                "dictionary keys merged with `serialize_dictionary_items_as_members` must not match member names",
            )),
            Error::TypeShapeUnavailable { .. } => Some(Box::new(
                "give the type a default factory, or install an object factory that knows it",
            )),
            _ => None,
        }
    }
}
