//! Scalar text rules shared by the writer and the reader.

use graphyaml_core::{Error, NULL_TAG, Object, Primitive, PrimitiveKind, Scalar, ScalarStyle, Schema};

/// Scalar for `primitive`.
///
/// Text that implicit typing would misread is quoted. In a dynamic slot a
/// non-textual value also carries its schema tag when its text would be read
/// back as another kind (an `i64` that fits `i32`, say).
pub(crate) fn primitive_scalar(primitive: &Primitive, schema: &dyn Schema, dynamic: bool) -> Scalar {
    let text = primitive.to_string();
    if primitive.kind().is_textual() {
        let style = string_style(&text, schema);
        return Scalar::new(text, style);
    }
    let kind = primitive.kind();
    let tag = (dynamic && schema.resolve_plain(&text).map(|p| p.kind()) != Some(kind))
        .then(|| schema.default_tag(kind).to_owned());
    Scalar::plain(text).with_tag(tag)
}

/// Scalar for a mapping key or an enum name.
pub(crate) fn text_scalar(text: &str, schema: &dyn Schema) -> Scalar {
    Scalar::new(text, string_style(text, schema))
}

pub(crate) fn string_style(text: &str, schema: &dyn Schema) -> ScalarStyle {
    if schema.is_ambiguous(text) {
        ScalarStyle::DoubleQuoted
    } else if is_literal_candidate(text) {
        ScalarStyle::Literal
    } else if text.chars().any(char::is_control) {
        ScalarStyle::DoubleQuoted
    } else {
        ScalarStyle::Any
    }
}

/// Multi-line text that a literal block reproduces exactly.
pub(crate) fn is_literal_candidate(s: &str) -> bool {
    s.contains('\n')
        && !s.trim().is_empty()
        && !s.chars().any(|c| c.is_control() && c != '\n' && c != '\t')
        && !s.split('\n').any(|line| line.starts_with([' ', '\t']))
        && !s.starts_with('\n')
}

/// Plain `null`-like text, or an explicit `!!null`.
pub(crate) fn is_null_scalar(scalar: &Scalar, schema: &dyn Schema) -> bool {
    scalar.tag.as_deref() == Some(NULL_TAG) || (scalar.is_plain() && schema.resolve_plain(&scalar.value).is_none())
}

/// Value of `scalar` read into a slot of primitive `kind`.
pub(crate) fn typed_primitive(scalar: &Scalar, kind: PrimitiveKind, schema: &dyn Schema) -> Result<Object, Error> {
    if is_null_scalar(scalar, schema) {
        return Ok(Object::Null);
    }
    Primitive::parse(kind, &scalar.value).map(Object::Primitive)
}

/// Value of `scalar` read into a dynamic slot: by schema tag, quoting, or
/// implicit typing.
pub(crate) fn dynamic_primitive(scalar: &Scalar, schema: &dyn Schema) -> Result<Object, Error> {
    let to_object = |p: Option<Primitive>| p.map(Object::Primitive).unwrap_or(Object::Null);
    match scalar.tag.as_deref() {
        Some(tag) => match schema.resolve_tagged(tag, &scalar.value) {
            Some(resolved) => resolved.map(to_object),
            None => Err(Error::UnknownTag { tag: tag.to_owned() }),
        },
        None if !scalar.style.is_plain() => Ok(Object::Primitive(Primitive::String(scalar.value.clone()))),
        None => Ok(to_object(schema.resolve_plain(&scalar.value))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphyaml_core::{CoreSchema, FLOAT_TAG, INT_TAG};

    #[test]
    fn dynamic_slots_tag_only_what_would_change_kind() {
        let schema = CoreSchema;
        assert_eq!(primitive_scalar(&Primitive::I32(5), &schema, true).tag, None);
        assert_eq!(
            primitive_scalar(&Primitive::I64(5), &schema, true).tag.as_deref(),
            Some(INT_TAG)
        );
        assert_eq!(primitive_scalar(&Primitive::I64(5), &schema, false).tag, None);
        assert_eq!(
            primitive_scalar(&Primitive::F32(1.5), &schema, true).tag.as_deref(),
            Some(FLOAT_TAG)
        );
        assert_eq!(primitive_scalar(&Primitive::U64(u64::MAX), &schema, true).tag, None);
    }

    #[test]
    fn strings_pick_their_style() {
        let schema = CoreSchema;
        assert_eq!(string_style("hello", &schema), ScalarStyle::Any);
        assert_eq!(string_style("1.2", &schema), ScalarStyle::DoubleQuoted);
        assert_eq!(string_style("", &schema), ScalarStyle::DoubleQuoted);
        assert_eq!(string_style("a\nb\n", &schema), ScalarStyle::Literal);
        assert_eq!(string_style(" a\nb", &schema), ScalarStyle::DoubleQuoted);
        assert_eq!(string_style("\u{7f}", &schema), ScalarStyle::DoubleQuoted);
    }

    #[test]
    fn quoted_null_is_text() {
        let schema = CoreSchema;
        let quoted = Scalar::new("null", ScalarStyle::SingleQuoted);
        assert_eq!(
            typed_primitive(&quoted, PrimitiveKind::String, &schema).unwrap(),
            Object::Primitive(Primitive::String("null".into()))
        );
        assert!(typed_primitive(&Scalar::plain("null"), PrimitiveKind::String, &schema)
            .unwrap()
            .is_null());
        assert!(typed_primitive(&Scalar::plain(""), PrimitiveKind::String, &schema)
            .unwrap()
            .is_null());
    }

    #[test]
    fn dynamic_reads_follow_tags() {
        let schema = CoreSchema;
        let tagged = Scalar::plain("5").with_tag(Some(INT_TAG.into()));
        assert_eq!(
            dynamic_primitive(&tagged, &schema).unwrap(),
            Object::Primitive(Primitive::I64(5))
        );
        assert_eq!(
            dynamic_primitive(&Scalar::plain("5"), &schema).unwrap(),
            Object::Primitive(Primitive::I32(5))
        );
        let unknown = Scalar::plain("5").with_tag(Some("!!weird".into()));
        assert!(matches!(
            dynamic_primitive(&unknown, &schema),
            Err(Error::UnknownTag { .. })
        ));
    }
}
