//! The in-memory document tree, built from and projected back to events.

use crate::{DataStyle, Error, EventSink, EventSource, ParsingEvent, Primitive, Scalar, ScalarStyle, Schema};

/// One node of a document.
#[derive(Debug, Clone)]
pub enum Element {
    Value(YamlValue),
    Mapping(YamlMapping),
    Sequence(YamlSequence),
    Alias(YamlAlias),
}

impl Element {
    /// Consumes exactly the events of one node.
    pub fn load<S: EventSource + ?Sized>(source: &mut S) -> Result<Element, Error> {
        match source.expect_event("a node")? {
            ParsingEvent::Scalar(scalar) => Ok(Element::Value(YamlValue::from_scalar(scalar))),
            ParsingEvent::Alias { anchor } => Ok(Element::Alias(YamlAlias::new(anchor))),
            ParsingEvent::MappingStart { anchor, tag, style } => {
                let mut mapping = YamlMapping {
                    anchor,
                    tag,
                    style,
                    entries: Vec::new(),
                };
                loop {
                    if matches!(source.peek_event()?, Some(ParsingEvent::MappingEnd)) {
                        source.next_event()?;
                        return Ok(Element::Mapping(mapping));
                    }
                    let key = Element::load(source)?;
                    let value = Element::load(source)?;
                    mapping.entries.push((key, value));
                }
            }
            ParsingEvent::SequenceStart { anchor, tag, style } => {
                let mut sequence = YamlSequence {
                    anchor,
                    tag,
                    style,
                    items: Vec::new(),
                };
                loop {
                    if matches!(source.peek_event()?, Some(ParsingEvent::SequenceEnd)) {
                        source.next_event()?;
                        return Ok(Element::Sequence(sequence));
                    }
                    sequence.items.push(Element::load(source)?);
                }
            }
            other => Err(Error::malformed("a node", other.describe())),
        }
    }

    /// Emits the events of this node, the inverse of [`Element::load`].
    pub fn emit<K: EventSink + ?Sized>(&self, sink: &mut K) -> Result<(), Error> {
        match self {
            Element::Value(value) => sink.emit(ParsingEvent::Scalar(value.to_scalar())),
            Element::Alias(alias) => sink.emit(ParsingEvent::Alias {
                anchor: alias.anchor.clone(),
            }),
            Element::Mapping(mapping) => {
                sink.emit(ParsingEvent::MappingStart {
                    anchor: mapping.anchor.clone(),
                    tag: mapping.tag.clone(),
                    style: mapping.style,
                })?;
                for (key, value) in &mapping.entries {
                    key.emit(sink)?;
                    value.emit(sink)?;
                }
                sink.emit(ParsingEvent::MappingEnd)
            }
            Element::Sequence(sequence) => {
                sink.emit(ParsingEvent::SequenceStart {
                    anchor: sequence.anchor.clone(),
                    tag: sequence.tag.clone(),
                    style: sequence.style,
                })?;
                for item in &sequence.items {
                    item.emit(sink)?;
                }
                sink.emit(ParsingEvent::SequenceEnd)
            }
        }
    }

    /// Anchor defined on this node.
    pub fn anchor(&self) -> Option<&str> {
        match self {
            Element::Value(v) => v.anchor.as_deref(),
            Element::Mapping(m) => m.anchor.as_deref(),
            Element::Sequence(s) => s.anchor.as_deref(),
            Element::Alias(_) => None,
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            Element::Value(v) => v.tag.as_deref(),
            Element::Mapping(m) => m.tag.as_deref(),
            Element::Sequence(s) => s.tag.as_deref(),
            Element::Alias(_) => None,
        }
    }

    /// A copy sharing nothing with `self`.
    pub fn deep_clone(&self) -> Element {
        self.clone()
    }

    pub fn as_value(&self) -> Option<&YamlValue> {
        match self {
            Element::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&YamlMapping> {
        match self {
            Element::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&YamlSequence> {
        match self {
            Element::Sequence(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_alias(&self) -> Option<&YamlAlias> {
        match self {
            Element::Alias(a) => Some(a),
            _ => None,
        }
    }
}

/// Nodes compare by content: scalar text and ordered children.
impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Element::Value(a), Element::Value(b)) => a == b,
            (Element::Mapping(a), Element::Mapping(b)) => a == b,
            (Element::Sequence(a), Element::Sequence(b)) => a == b,
            (Element::Alias(a), Element::Alias(b)) => a == b,
            _ => false,
        }
    }
}

/// A scalar node. Setters return a new value; nothing is changed in place.
#[derive(Debug, Clone)]
pub struct YamlValue {
    anchor: Option<String>,
    tag: Option<String>,
    value: String,
    style: ScalarStyle,
}

impl YamlValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            anchor: None,
            tag: None,
            value: value.into(),
            style: ScalarStyle::Any,
        }
    }

    pub fn from_scalar(scalar: Scalar) -> Self {
        Self {
            anchor: scalar.anchor,
            tag: scalar.tag,
            value: scalar.value,
            style: scalar.style,
        }
    }

    /// Text of `primitive`, quoted when the schema would otherwise read it
    /// back as a different kind.
    pub fn from_primitive(primitive: &Primitive, schema: &dyn Schema) -> Self {
        let text = primitive.to_string();
        let style = if primitive.kind().is_textual() && schema.is_ambiguous(&text) {
            ScalarStyle::DoubleQuoted
        } else {
            ScalarStyle::Any
        };
        Self::new(text).with_style(style)
    }

    pub fn to_scalar(&self) -> Scalar {
        Scalar::new(self.value.clone(), self.style)
            .with_tag(self.tag.clone())
            .with_anchor(self.anchor.clone())
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn anchor(&self) -> Option<&str> {
        self.anchor.as_deref()
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn style(&self) -> ScalarStyle {
        self.style
    }

    pub fn with_value(self, value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..self
        }
    }

    pub fn with_anchor(self, anchor: Option<String>) -> Self {
        Self { anchor, ..self }
    }

    pub fn with_tag(self, tag: Option<String>) -> Self {
        Self { tag, ..self }
    }

    pub fn with_style(self, style: ScalarStyle) -> Self {
        Self { style, ..self }
    }
}

impl PartialEq for YamlValue {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

/// A mapping node. Keys may repeat when loaded; writers keep them unique.
#[derive(Debug, Clone, Default)]
pub struct YamlMapping {
    pub anchor: Option<String>,
    pub tag: Option<String>,
    pub style: DataStyle,
    pub entries: Vec<(Element, Element)>,
}

impl YamlMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// First value whose key is the scalar `key`.
    pub fn get(&self, key: &str) -> Option<&Element> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_value().is_some_and(|v| v.value() == key))
            .map(|(_, v)| v)
    }

    /// Sets `key`, replacing the value of an existing equal key.
    pub fn insert(&mut self, key: Element, value: Element) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PartialEq for YamlMapping {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

/// A sequence node.
#[derive(Debug, Clone, Default)]
pub struct YamlSequence {
    pub anchor: Option<String>,
    pub tag: Option<String>,
    pub style: DataStyle,
    pub items: Vec<Element>,
}

impl YamlSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl PartialEq for YamlSequence {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

/// A reference to an anchored node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YamlAlias {
    pub anchor: String,
}

impl YamlAlias {
    pub fn new(anchor: impl Into<String>) -> Self {
        Self {
            anchor: anchor.into(),
        }
    }
}

/// A single document: its root node between document markers.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub root: Element,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    /// Consumes `DocumentStart`, the root node and `DocumentEnd`.
    pub fn load<S: EventSource + ?Sized>(source: &mut S) -> Result<Document, Error> {
        match source.expect_event("document start")? {
            ParsingEvent::DocumentStart => {}
            other => return Err(Error::malformed("document start", other.describe())),
        }
        let root = Element::load(source)?;
        match source.expect_event("document end")? {
            ParsingEvent::DocumentEnd => Ok(Document { root }),
            other => Err(Error::malformed("document end", other.describe())),
        }
    }

    pub fn emit<K: EventSink + ?Sized>(&self, sink: &mut K) -> Result<(), Error> {
        sink.emit(ParsingEvent::DocumentStart)?;
        self.root.emit(sink)?;
        sink.emit(ParsingEvent::DocumentEnd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CoreSchema, EventQueue};

    fn mapping_events() -> Vec<ParsingEvent> {
        vec![
            ParsingEvent::MappingStart {
                anchor: Some("o0".into()),
                tag: Some("!point".into()),
                style: DataStyle::Flow,
            },
            ParsingEvent::Scalar(Scalar::plain("x")),
            ParsingEvent::Scalar(Scalar::plain("1")),
            ParsingEvent::Scalar(Scalar::plain("tags")),
            ParsingEvent::SequenceStart {
                anchor: None,
                tag: None,
                style: DataStyle::Block,
            },
            ParsingEvent::Scalar(Scalar::new("a", ScalarStyle::SingleQuoted)),
            ParsingEvent::Alias { anchor: "o0".into() },
            ParsingEvent::SequenceEnd,
            ParsingEvent::MappingEnd,
        ]
    }

    #[test]
    fn load_then_emit_reproduces_events() {
        let events = mapping_events();
        let mut source = EventQueue::from(events.clone());
        let element = Element::load(&mut source).unwrap();
        assert!(source.is_empty());
        assert_eq!(element.anchor(), Some("o0"));
        assert_eq!(element.tag(), Some("!point"));

        let mut out = Vec::new();
        element.emit(&mut out).unwrap();
        assert_eq!(out, events);
    }

    #[test]
    fn load_consumes_exactly_one_node() {
        let mut events = mapping_events();
        events.push(ParsingEvent::Scalar(Scalar::plain("next")));
        let mut source = EventQueue::from(events);
        Element::load(&mut source).unwrap();
        assert_eq!(source.len(), 1);
    }

    #[test]
    fn truncated_streams_are_malformed() {
        let mut events = mapping_events();
        events.pop();
        let mut source = EventQueue::from(events);
        assert!(matches!(
            Element::load(&mut source),
            Err(Error::MalformedStream { .. })
        ));

        let mut source = EventQueue::from(vec![ParsingEvent::MappingEnd]);
        assert!(matches!(
            Element::load(&mut source),
            Err(Error::MalformedStream { .. })
        ));
    }

    #[test]
    fn values_compare_by_text() {
        let a = YamlValue::new("1").with_style(ScalarStyle::DoubleQuoted);
        let b = YamlValue::new("1").with_tag(Some("!!int".into()));
        assert_eq!(a, b);
        assert_ne!(a, YamlValue::new("2"));
    }

    #[test]
    fn deep_clone_is_independent() {
        let mut source = EventQueue::from(mapping_events());
        let original = Element::load(&mut source).unwrap();
        let mut copy = original.deep_clone();
        if let Element::Mapping(m) = &mut copy {
            m.insert(Element::Value(YamlValue::new("x")), Element::Value(YamlValue::new("2")));
        }
        assert_ne!(copy, original);
        let x = original.as_mapping().unwrap().get("x").unwrap();
        assert_eq!(x.as_value().unwrap().value(), "1");
    }

    #[test]
    fn ambiguous_strings_are_quoted() {
        let schema = CoreSchema;
        let quoted = YamlValue::from_primitive(&Primitive::String("true".into()), &schema);
        assert_eq!(quoted.style(), ScalarStyle::DoubleQuoted);
        let plain = YamlValue::from_primitive(&Primitive::String("hello".into()), &schema);
        assert_eq!(plain.style(), ScalarStyle::Any);
        let number = YamlValue::from_primitive(&Primitive::I32(3), &schema);
        assert_eq!(number.style(), ScalarStyle::Any);
    }

    #[test]
    fn documents_need_markers() {
        let mut events = vec![ParsingEvent::DocumentStart];
        events.extend(mapping_events());
        events.push(ParsingEvent::DocumentEnd);
        let document = Document::load(&mut EventQueue::from(events.clone())).unwrap();
        let mut out = EventQueue::new();
        document.emit(&mut out).unwrap();
        assert_eq!(out.into_vec(), events);

        let mut bare = EventQueue::from(mapping_events());
        assert!(Document::load(&mut bare).is_err());
    }
}
