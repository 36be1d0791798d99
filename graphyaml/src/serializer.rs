//! Top-level entry points.

use graphyaml_core::{
    AnchorTable, Document, Element, Error, EventQueue, EventSink, EventSource, Object, ParsingEvent, Reflect,
    TypeKey,
};
use tracing::debug;

use crate::reader::ObjectReader;
use crate::writer::ObjectWriter;
use crate::{ContextSettings, SerializerContext, SerializerSettings, YamlEmitter, YamlParser};

/// Reads and writes object graphs with one set of [`SerializerSettings`].
///
/// Each call gets its own [`SerializerContext`]. Unless
/// [`SerializerSettings::reset_alias`] is set, the anchor table of one call is
/// carried into the next: a write can alias objects written by an earlier
/// write, and a read can resolve aliases to anchors of an earlier read. A
/// write forgets the anchors read before it, so text that only aliases
/// objects from an older session fails with [`Error::AnchorNotFound`].
#[derive(Debug, Default)]
pub struct Serializer {
    settings: SerializerSettings,
    anchors: AnchorTable,
}

impl Serializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: SerializerSettings) -> Self {
        Self {
            settings,
            anchors: AnchorTable::new(),
        }
    }

    pub fn settings(&self) -> &SerializerSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut SerializerSettings {
        &mut self.settings
    }

    fn begin(&self, settings: Option<ContextSettings>, is_serializing: bool) -> SerializerContext {
        let anchors = if self.settings.reset_alias {
            AnchorTable::new()
        } else {
            let mut anchors = self.anchors.clone();
            if is_serializing {
                anchors.clear_read();
            }
            anchors
        };
        SerializerContext::new(anchors, settings.unwrap_or_default(), is_serializing)
    }

    fn end(&mut self, context: &SerializerContext) {
        if !self.settings.reset_alias {
            self.anchors = context.anchors.clone();
        }
    }

    /// Writes `value` as one document of events.
    ///
    /// `declared` is the static type of the value; a root whose runtime type
    /// differs from it (or any root when it is `None`) is tagged.
    pub fn serialize_events<K: EventSink + ?Sized>(
        &mut self,
        sink: &mut K,
        value: &Object,
        declared: Option<TypeKey>,
        settings: Option<ContextSettings>,
    ) -> Result<SerializerContext, Error> {
        let mut context = self.begin(settings, true);
        debug!(value = ?value, "serializing");
        ObjectWriter::new(&self.settings, &mut context, sink).write_document(value, declared)?;
        self.end(&context);
        Ok(context)
    }

    /// Writes `value` as YAML text.
    pub fn serialize(
        &mut self,
        value: &Object,
        declared: Option<TypeKey>,
        settings: Option<ContextSettings>,
    ) -> Result<String, Error> {
        let mut emitter = YamlEmitter::new(self.settings.indent);
        self.serialize_events(&mut emitter, value, declared, settings)?;
        emitter.finish()
    }

    /// Writes `value` as YAML text; the root is not tagged.
    pub fn to_string<T: Reflect>(&mut self, value: &T) -> Result<String, Error> {
        self.serialize(&value.to_object(), Some(TypeKey::of::<T>()), None)
    }

    /// Writes `value` as a document tree instead of text.
    pub fn to_document(&mut self, value: &Object, declared: Option<TypeKey>) -> Result<Document, Error> {
        let mut queue = EventQueue::new();
        self.serialize_events(&mut queue, value, declared, None)?;
        Document::load(&mut queue)
    }

    /// Reads the first document of `source`.
    pub fn deserialize_events<S: EventSource + ?Sized>(
        &mut self,
        source: &mut S,
        expected: Option<TypeKey>,
        settings: Option<ContextSettings>,
    ) -> Result<(Object, SerializerContext), Error> {
        let mut context = self.begin(settings, false);
        let value = ObjectReader::new(&self.settings, &mut context, source).read_document(expected)?;
        if context.has_remap_occurred {
            debug!("document used legacy names");
        }
        self.end(&context);
        Ok((value, context))
    }

    /// Reads YAML text into a dynamic value, typed by its tags.
    pub fn deserialize(&mut self, text: &str) -> Result<Object, Error> {
        self.deserialize_with_context(text, None, None).map(|(value, _)| value)
    }

    /// Reads YAML text and returns the call's context along with the value.
    pub fn deserialize_with_context(
        &mut self,
        text: &str,
        expected: Option<TypeKey>,
        settings: Option<ContextSettings>,
    ) -> Result<(Object, SerializerContext), Error> {
        let mut parser = YamlParser::new(text);
        self.deserialize_events(&mut parser, expected, settings)
    }

    pub fn from_str<T: Reflect>(&mut self, text: &str) -> Result<T, Error> {
        self.from_str_with_context(text, None).map(|(value, _)| value)
    }

    pub fn from_str_with_context<T: Reflect>(
        &mut self,
        text: &str,
        settings: Option<ContextSettings>,
    ) -> Result<(T, SerializerContext), Error> {
        let (value, context) = self.deserialize_with_context(text, Some(TypeKey::of::<T>()), settings)?;
        Ok((T::from_object(value)?, context))
    }

    /// Reads a document tree node.
    pub fn from_element(&mut self, element: &Element, expected: Option<TypeKey>) -> Result<Object, Error> {
        let mut queue = EventQueue::new();
        queue.emit(ParsingEvent::DocumentStart)?;
        element.emit(&mut queue)?;
        queue.emit(ParsingEvent::DocumentEnd)?;
        self.deserialize_events(&mut queue, expected, None)
            .map(|(value, _)| value)
    }
}
