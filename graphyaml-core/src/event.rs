//! Parsing events: the flat representation every layer speaks.

use std::collections::VecDeque;

use crate::Error;

/// How a scalar is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScalarStyle {
    /// Let the emitter pick.
    #[default]
    Any,
    /// Unquoted.
    Plain,
    /// `'text'`
    SingleQuoted,
    /// `"text"`
    DoubleQuoted,
    /// `|` block.
    Literal,
    /// `>` block.
    Folded,
}

impl ScalarStyle {
    /// Plain (or undecided) scalars take part in implicit typing.
    pub fn is_plain(self) -> bool {
        matches!(self, ScalarStyle::Any | ScalarStyle::Plain)
    }
}

/// How a mapping or sequence is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataStyle {
    /// Let the emitter pick (block).
    #[default]
    Any,
    /// Indented, one entry per line.
    Block,
    /// Inline `{}` / `[]`.
    Flow,
}

/// A scalar node.
#[derive(Debug, Clone, PartialEq)]
pub struct Scalar {
    /// Anchor label defined on this node.
    pub anchor: Option<String>,
    /// Explicit tag, normalized to `!name` or `!!core` form.
    pub tag: Option<String>,
    /// Scalar text.
    pub value: String,
    /// Presentation.
    pub style: ScalarStyle,
    /// The tag may be omitted when the scalar is written plain.
    pub plain_implicit: bool,
    /// The tag may be omitted when the scalar is written quoted.
    pub quoted_implicit: bool,
}

impl Scalar {
    /// An untagged scalar in the given style.
    pub fn new(value: impl Into<String>, style: ScalarStyle) -> Self {
        Self {
            anchor: None,
            tag: None,
            value: value.into(),
            style,
            plain_implicit: style.is_plain(),
            quoted_implicit: !style.is_plain(),
        }
    }

    /// An untagged plain scalar.
    pub fn plain(value: impl Into<String>) -> Self {
        Self::new(value, ScalarStyle::Plain)
    }

    /// Returns the scalar with `tag` set; an explicit tag clears both
    /// implicit flags.
    pub fn with_tag(mut self, tag: Option<String>) -> Self {
        let implicit = tag.is_none();
        self.tag = tag;
        self.plain_implicit = implicit && self.style.is_plain();
        self.quoted_implicit = implicit && !self.style.is_plain();
        self
    }

    /// Returns the scalar with `anchor` set.
    pub fn with_anchor(mut self, anchor: Option<String>) -> Self {
        self.anchor = anchor;
        self
    }

    /// Returns the scalar with `style` set, keeping the implicit flags in step.
    pub fn with_style(mut self, style: ScalarStyle) -> Self {
        self.style = style;
        let implicit = self.tag.is_none();
        self.plain_implicit = implicit && style.is_plain();
        self.quoted_implicit = implicit && !style.is_plain();
        self
    }

    /// Whether implicit typing applies (plain and untagged).
    pub fn is_plain(&self) -> bool {
        self.style.is_plain() && self.tag.is_none()
    }
}

/// One step of a document.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsingEvent {
    /// Start of a document.
    DocumentStart,
    /// End of a document.
    DocumentEnd,
    /// A scalar node.
    Scalar(Scalar),
    /// Start of a mapping node.
    MappingStart {
        /// Anchor label defined on this node.
        anchor: Option<String>,
        /// Explicit tag.
        tag: Option<String>,
        /// Presentation.
        style: DataStyle,
    },
    /// End of the innermost mapping.
    MappingEnd,
    /// Start of a sequence node.
    SequenceStart {
        /// Anchor label defined on this node.
        anchor: Option<String>,
        /// Explicit tag.
        tag: Option<String>,
        /// Presentation.
        style: DataStyle,
    },
    /// End of the innermost sequence.
    SequenceEnd,
    /// Reference to an earlier anchor.
    Alias {
        /// The referenced label.
        anchor: String,
    },
}

impl ParsingEvent {
    /// Anchor defined by this event, if any.
    pub fn anchor(&self) -> Option<&str> {
        match self {
            ParsingEvent::Scalar(scalar) => scalar.anchor.as_deref(),
            ParsingEvent::MappingStart { anchor, .. } | ParsingEvent::SequenceStart { anchor, .. } => {
                anchor.as_deref()
            }
            _ => None,
        }
    }

    /// Drops the anchor defined by this event.
    pub fn clear_anchor(&mut self) {
        match self {
            ParsingEvent::Scalar(scalar) => scalar.anchor = None,
            ParsingEvent::MappingStart { anchor, .. } | ParsingEvent::SequenceStart { anchor, .. } => {
                *anchor = None
            }
            _ => {}
        }
    }

    /// Tag carried by this event, if any.
    pub fn tag(&self) -> Option<&str> {
        match self {
            ParsingEvent::Scalar(scalar) => scalar.tag.as_deref(),
            ParsingEvent::MappingStart { tag, .. } | ParsingEvent::SequenceStart { tag, .. } => {
                tag.as_deref()
            }
            _ => None,
        }
    }

    /// `+1` for start events, `-1` for end events, `0` otherwise.
    pub fn nesting(&self) -> i32 {
        match self {
            ParsingEvent::DocumentStart
            | ParsingEvent::MappingStart { .. }
            | ParsingEvent::SequenceStart { .. } => 1,
            ParsingEvent::DocumentEnd | ParsingEvent::MappingEnd | ParsingEvent::SequenceEnd => -1,
            ParsingEvent::Scalar(_) | ParsingEvent::Alias { .. } => 0,
        }
    }

    /// Short human name, for error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            ParsingEvent::DocumentStart => "document start",
            ParsingEvent::DocumentEnd => "document end",
            ParsingEvent::Scalar(_) => "scalar",
            ParsingEvent::MappingStart { .. } => "mapping start",
            ParsingEvent::MappingEnd => "mapping end",
            ParsingEvent::SequenceStart { .. } => "sequence start",
            ParsingEvent::SequenceEnd => "sequence end",
            ParsingEvent::Alias { .. } => "alias",
        }
    }
}

/// Produces events one at a time.
pub trait EventSource {
    /// Looks at the next event without consuming it.
    fn peek_event(&mut self) -> Result<Option<&ParsingEvent>, Error>;

    /// Consumes the next event; `None` once the stream is exhausted.
    fn next_event(&mut self) -> Result<Option<ParsingEvent>, Error>;

    /// Consumes the next event, treating end of stream as malformed.
    fn expect_event(&mut self, expected: &'static str) -> Result<ParsingEvent, Error> {
        self.next_event()?
            .ok_or_else(|| Error::malformed(expected, "end of stream"))
    }

    /// Consumes one complete node (a scalar, an alias, or a collection with
    /// everything inside it).
    fn skip_node(&mut self) -> Result<(), Error> {
        let mut depth = 0i32;
        loop {
            let event = self.expect_event("a node")?;
            depth += event.nesting();
            if depth < 0 {
                return Err(Error::malformed("a node", event.describe()));
            }
            if depth == 0 {
                return Ok(());
            }
        }
    }
}

/// Accepts events one at a time.
pub trait EventSink {
    /// Takes the next event.
    fn emit(&mut self, event: ParsingEvent) -> Result<(), Error>;
}

impl EventSink for Vec<ParsingEvent> {
    fn emit(&mut self, event: ParsingEvent) -> Result<(), Error> {
        self.push(event);
        Ok(())
    }
}

/// An in-memory event stream, usable as both source and sink.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventQueue {
    events: VecDeque<ParsingEvent>,
}

impl EventQueue {
    /// An empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining events, front first.
    pub fn into_vec(self) -> Vec<ParsingEvent> {
        self.events.into()
    }

    /// Number of queued events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the queue is drained.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl FromIterator<ParsingEvent> for EventQueue {
    fn from_iter<I: IntoIterator<Item = ParsingEvent>>(iter: I) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<ParsingEvent>> for EventQueue {
    fn from(events: Vec<ParsingEvent>) -> Self {
        Self {
            events: events.into(),
        }
    }
}

impl EventSource for EventQueue {
    fn peek_event(&mut self) -> Result<Option<&ParsingEvent>, Error> {
        Ok(self.events.front())
    }

    fn next_event(&mut self) -> Result<Option<ParsingEvent>, Error> {
        Ok(self.events.pop_front())
    }
}

impl EventSink for EventQueue {
    fn emit(&mut self, event: ParsingEvent) -> Result<(), Error> {
        self.events.push_back(event);
        Ok(())
    }
}
