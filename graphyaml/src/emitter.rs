//! Renders parsing events as YAML text.

use std::collections::HashSet;

use graphyaml_core::{
    DataStyle, Document, Element, Error, EventQueue, EventSink, EventSource, ParsingEvent, ScalarStyle,
    YamlMapping, YamlSequence, YamlValue,
};
use tracing::trace;

use crate::scalar::is_literal_candidate;

/// Collects events and renders them once the stream is complete.
///
/// Anchors no alias refers to are dropped from the output, so anchor labels
/// only appear where they are needed.
#[derive(Debug, Default)]
pub struct YamlEmitter {
    indent: usize,
    events: EventQueue,
}

impl YamlEmitter {
    /// An emitter indenting nested blocks by `indent` spaces.
    pub fn new(indent: usize) -> Self {
        Self {
            indent: indent.max(1),
            events: EventQueue::new(),
        }
    }

    /// Renders every collected document. Documents after the first are
    /// introduced by `---`.
    pub fn finish(mut self) -> Result<String, Error> {
        let mut out = String::new();
        let mut first = true;
        while self.events.peek_event()?.is_some() {
            let mut document = Document::load(&mut self.events)?;
            prune_anchors(&mut document.root);
            if !first {
                out.push_str("---\n");
            }
            first = false;
            out.push_str(&render(&document, self.indent));
        }
        Ok(out)
    }
}

impl EventSink for YamlEmitter {
    fn emit(&mut self, event: ParsingEvent) -> Result<(), Error> {
        self.events.emit(event)
    }
}

/// Text of one document, ending with a newline.
pub fn render(document: &Document, indent: usize) -> String {
    let mut renderer = Renderer {
        out: String::new(),
        unit: indent.max(1),
        line_pos: LinePos::Start,
    };
    renderer.root(&document.root);
    renderer.out.push('\n');
    renderer.out
}

fn collect_aliases(element: &Element, used: &mut HashSet<String>) {
    match element {
        Element::Alias(alias) => {
            used.insert(alias.anchor.clone());
        }
        Element::Mapping(mapping) => {
            for (key, value) in &mapping.entries {
                collect_aliases(key, used);
                collect_aliases(value, used);
            }
        }
        Element::Sequence(sequence) => sequence.items.iter().for_each(|item| collect_aliases(item, used)),
        Element::Value(_) => {}
    }
}

fn clear_unused(element: &mut Element, used: &HashSet<String>) {
    match element {
        Element::Value(value) => {
            if value.anchor().is_some_and(|anchor| !used.contains(anchor)) {
                *value = value.clone().with_anchor(None);
            }
        }
        Element::Mapping(mapping) => {
            if mapping.anchor.as_ref().is_some_and(|anchor| !used.contains(anchor)) {
                mapping.anchor = None;
            }
            for (key, value) in &mut mapping.entries {
                clear_unused(key, used);
                clear_unused(value, used);
            }
        }
        Element::Sequence(sequence) => {
            if sequence.anchor.as_ref().is_some_and(|anchor| !used.contains(anchor)) {
                sequence.anchor = None;
            }
            sequence.items.iter_mut().for_each(|item| clear_unused(item, used));
        }
        Element::Alias(_) => {}
    }
}

fn prune_anchors(root: &mut Element) {
    let mut used = HashSet::new();
    collect_aliases(root, &mut used);
    trace!(referenced = used.len(), "pruning anchors");
    clear_unused(root, &used);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinePos {
    /// Nothing written on the current line yet.
    Start,
    Inline,
}

struct Renderer {
    out: String,
    unit: usize,
    line_pos: LinePos,
}

/// Whether a collection is written as an indented block.
fn is_block(style: DataStyle, empty: bool) -> bool {
    style != DataStyle::Flow && !empty
}

fn is_empty_plain(element: &Element) -> bool {
    matches!(element, Element::Value(v) if v.value().is_empty() && v.style().is_plain() && v.anchor().is_none() && v.tag().is_none())
}

impl Renderer {
    fn write(&mut self, text: &str) {
        self.out.push_str(text);
        self.line_pos = LinePos::Inline;
    }

    fn start_line(&mut self, column: usize) {
        if self.line_pos != LinePos::Start {
            self.out.push('\n');
        }
        self.out.extend(std::iter::repeat_n(' ', column));
        self.line_pos = LinePos::Inline;
    }

    /// `&anchor !tag`, or nothing.
    fn props(anchor: Option<&str>, tag: Option<&str>) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(anchor) = anchor {
            parts.push(format!("&{anchor}"));
        }
        if let Some(tag) = tag {
            parts.push(escape_tag(tag));
        }
        (!parts.is_empty()).then(|| parts.join(" "))
    }

    fn root(&mut self, root: &Element) {
        match root {
            Element::Mapping(mapping) if is_block(mapping.style, mapping.is_empty()) => {
                if let Some(props) = Self::props(mapping.anchor.as_deref(), mapping.tag.as_deref()) {
                    self.write(&props);
                }
                self.block_mapping(mapping, 0, false);
            }
            Element::Sequence(sequence) if is_block(sequence.style, sequence.is_empty()) => {
                if let Some(props) = Self::props(sequence.anchor.as_deref(), sequence.tag.as_deref()) {
                    self.write(&props);
                }
                self.block_sequence(sequence, 0);
            }
            other if is_empty_plain(other) => self.write("null"),
            other => self.inline_node(other, 0),
        }
    }

    fn block_mapping(&mut self, mapping: &YamlMapping, column: usize, inline_first: bool) {
        for (index, (key, value)) in mapping.entries.iter().enumerate() {
            if index > 0 || !inline_first {
                self.start_line(column);
            }
            self.key(key);
            self.write(":");
            self.value_after_key(value, column);
        }
    }

    fn block_sequence(&mut self, sequence: &YamlSequence, column: usize) {
        for item in &sequence.items {
            self.start_line(column);
            self.write("-");
            self.item(item, column);
        }
    }

    fn value_after_key(&mut self, value: &Element, column: usize) {
        match value {
            Element::Mapping(mapping) if is_block(mapping.style, mapping.is_empty()) => {
                if let Some(props) = Self::props(mapping.anchor.as_deref(), mapping.tag.as_deref()) {
                    self.write(" ");
                    self.write(&props);
                }
                self.block_mapping(mapping, column + self.unit, false);
            }
            Element::Sequence(sequence) if is_block(sequence.style, sequence.is_empty()) => {
                if let Some(props) = Self::props(sequence.anchor.as_deref(), sequence.tag.as_deref()) {
                    self.write(" ");
                    self.write(&props);
                }
                self.block_sequence(sequence, column + self.unit);
            }
            other if is_empty_plain(other) => {}
            other => {
                self.write(" ");
                self.inline_node(other, column);
            }
        }
    }

    /// A sequence item, after its `-`.
    fn item(&mut self, item: &Element, column: usize) {
        let nested = column + 2;
        match item {
            Element::Mapping(mapping) if is_block(mapping.style, mapping.is_empty()) => {
                match Self::props(mapping.anchor.as_deref(), mapping.tag.as_deref()) {
                    Some(props) => {
                        self.write(" ");
                        self.write(&props);
                        self.block_mapping(mapping, nested, false);
                    }
                    None => {
                        self.write(" ");
                        self.block_mapping(mapping, nested, true);
                    }
                }
            }
            Element::Sequence(sequence) if is_block(sequence.style, sequence.is_empty()) => {
                if let Some(props) = Self::props(sequence.anchor.as_deref(), sequence.tag.as_deref()) {
                    self.write(" ");
                    self.write(&props);
                }
                self.block_sequence(sequence, nested);
            }
            other if is_empty_plain(other) => {}
            other => {
                self.write(" ");
                self.inline_node(other, column);
            }
        }
    }

    /// A node that fits on the current line (apart from literal bodies).
    fn inline_node(&mut self, node: &Element, column: usize) {
        match node {
            Element::Value(value) => {
                if let Some(props) = Self::props(value.anchor(), value.tag()) {
                    self.write(&props);
                    self.write(" ");
                }
                self.scalar(value, false, false, column);
            }
            other => self.flow(other),
        }
    }

    fn key(&mut self, key: &Element) {
        match key {
            Element::Value(value) => {
                if let Some(props) = Self::props(value.anchor(), value.tag()) {
                    self.write(&props);
                    self.write(" ");
                }
                self.scalar(value, false, true, 0);
            }
            Element::Alias(alias) => self.write(&format!("*{} ", alias.anchor)),
            other => self.flow(other),
        }
    }

    fn flow(&mut self, node: &Element) {
        match node {
            Element::Value(value) => {
                if let Some(props) = Self::props(value.anchor(), value.tag()) {
                    self.write(&props);
                    self.write(" ");
                }
                self.scalar(value, true, true, 0);
            }
            Element::Alias(alias) => self.write(&format!("*{}", alias.anchor)),
            Element::Mapping(mapping) => {
                if let Some(props) = Self::props(mapping.anchor.as_deref(), mapping.tag.as_deref()) {
                    self.write(&props);
                    self.write(" ");
                }
                self.write("{");
                for (index, (key, value)) in mapping.entries.iter().enumerate() {
                    if index > 0 {
                        self.write(", ");
                    }
                    if let Element::Alias(alias) = key {
                        self.write(&format!("*{} ", alias.anchor));
                    } else {
                        self.flow(key);
                    }
                    self.write(":");
                    if !is_empty_plain(value) {
                        self.write(" ");
                        self.flow(value);
                    }
                }
                self.write("}");
            }
            Element::Sequence(sequence) => {
                if let Some(props) = Self::props(sequence.anchor.as_deref(), sequence.tag.as_deref()) {
                    self.write(&props);
                    self.write(" ");
                }
                self.write("[");
                for (index, item) in sequence.items.iter().enumerate() {
                    if index > 0 {
                        self.write(", ");
                    }
                    self.flow(item);
                }
                self.write("]");
            }
        }
    }

    /// Scalar text in the requested style when the text allows it, else
    /// double-quoted. Keys and flow content stay on one line.
    fn scalar(&mut self, value: &YamlValue, flow: bool, single_line: bool, column: usize) {
        let text = value.value();
        match value.style() {
            ScalarStyle::Any | ScalarStyle::Plain if is_plain_safe(text, flow) => self.write(text),
            ScalarStyle::SingleQuoted if !text.chars().any(char::is_control) => {
                self.write(&format!("'{}'", text.replace('\'', "''")));
            }
            ScalarStyle::Any | ScalarStyle::Literal | ScalarStyle::Folded
                if !single_line && is_literal_candidate(text) =>
            {
                self.literal(text, column + self.unit);
            }
            _ => self.double_quoted(text),
        }
    }

    /// `|` block; the chomping indicator reproduces the trailing newlines.
    fn literal(&mut self, text: &str, column: usize) {
        let body = text.trim_end_matches('\n');
        let trailing = text.len() - body.len();
        self.write(match trailing {
            0 => "|-",
            1 => "|",
            _ => "|+",
        });
        for line in body.split('\n') {
            self.out.push('\n');
            if !line.is_empty() {
                self.out.extend(std::iter::repeat_n(' ', column));
                self.out.push_str(line);
            }
        }
        if trailing > 1 {
            self.out.extend(std::iter::repeat_n('\n', trailing));
            self.line_pos = LinePos::Start;
        }
    }

    fn double_quoted(&mut self, text: &str) {
        let mut quoted = String::with_capacity(text.len() + 2);
        quoted.push('"');
        for c in text.chars() {
            match c {
                '"' => quoted.push_str("\\\""),
                '\\' => quoted.push_str("\\\\"),
                '\n' => quoted.push_str("\\n"),
                '\r' => quoted.push_str("\\r"),
                '\t' => quoted.push_str("\\t"),
                '\0' => quoted.push_str("\\0"),
                c if c.is_control() => quoted.push_str(&format!("\\u{:04x}", c as u32)),
                c => quoted.push(c),
            }
        }
        quoted.push('"');
        self.write(&quoted);
    }
}

/// Whether `text` reads back unchanged when written unquoted.
fn is_plain_safe(text: &str, flow: bool) -> bool {
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if text.starts_with([' ', '\t']) || text.ends_with([' ', '\t']) || text.chars().any(char::is_control) {
        return false;
    }
    if text.starts_with("---") || text.starts_with("...") {
        return false;
    }
    let flow_indicator = |c: char| matches!(c, ',' | '[' | ']' | '{' | '}');
    if matches!(first, '-' | '?' | ':') {
        match chars.next() {
            Some(next) if !next.is_whitespace() && !(flow && flow_indicator(next)) => {}
            _ => return false,
        }
    } else if "-?:,[]{}#&*!|>'\"%@`".contains(first) {
        return false;
    }
    if text.contains(": ") || text.contains(" #") || text.ends_with(':') {
        return false;
    }
    !(flow && text.chars().any(flow_indicator))
}

/// Percent-encodes the characters a tag shorthand cannot carry.
fn escape_tag(tag: &str) -> String {
    let (handle, suffix) = if let Some(rest) = tag.strip_prefix("!!") {
        ("!!", rest)
    } else if let Some(rest) = tag.strip_prefix('!') {
        ("!", rest)
    } else {
        ("!", tag)
    };
    let mut out = String::from(handle);
    for c in suffix.chars() {
        if c.is_ascii_alphanumeric() || "-;/?:@&=+$_.~*'()#".contains(c) {
            out.push(c);
        } else {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                out.push_str(&format!("%{byte:02X}"));
            }
        }
    }
    out
}
