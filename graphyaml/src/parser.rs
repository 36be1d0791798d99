//! Event source over YAML text, backed by `saphyr-parser`.

use std::borrow::Cow;
use std::collections::{HashMap, VecDeque};

use graphyaml_core::{DataStyle, Error, EventSource, ParsingEvent, Scalar, ScalarStyle};
use saphyr_parser::{Event, Parser, ScalarStyle as SaphyrStyle, ScanError, Span, Tag};
use tracing::{debug, trace};

const CORE_TAG_PREFIX: &str = "tag:yaml.org,2002:";

/// Verbatim tag standing in for an alias whose anchor is not in the text.
const ALIAS_TAG: &str = "graphyaml:alias";

/// Streams the documents of a YAML text as [`ParsingEvent`]s.
///
/// Stream markers are dropped; document markers are kept. Anchors and
/// aliases carry the names written in the text. An alias to an anchor the
/// text never defines is still reported as [`ParsingEvent::Alias`]; whether
/// it resolves is up to the reader's anchor table.
pub struct YamlParser<'input> {
    input: &'input str,
    // a failed parse ends with its error
    events: VecDeque<Result<ParsingEvent, Error>>,
}

impl<'input> YamlParser<'input> {
    pub fn new(input: &'input str) -> Self {
        Self {
            input,
            events: load(input),
        }
    }

    /// The text being parsed.
    pub fn input(&self) -> &'input str {
        self.input
    }
}

impl std::fmt::Debug for YamlParser<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YamlParser")
            .field("pending", &self.events.len())
            .finish_non_exhaustive()
    }
}

impl EventSource for YamlParser<'_> {
    fn peek_event(&mut self) -> Result<Option<&ParsingEvent>, Error> {
        match self.events.front() {
            Some(Ok(event)) => Ok(Some(event)),
            Some(Err(error)) => Err(error.clone()),
            None => Ok(None),
        }
    }

    fn next_event(&mut self) -> Result<Option<ParsingEvent>, Error> {
        self.events.pop_front().transpose()
    }
}

/// Parses `input`, rewriting each alias saphyr cannot resolve into a
/// placeholder scalar and starting over.
fn load(input: &str) -> VecDeque<Result<ParsingEvent, Error>> {
    let mut text = Cow::Borrowed(input);
    loop {
        let (events, unknown_alias) = parse_text(&text);
        let Some(index) = unknown_alias else {
            return events;
        };
        match alias_placeholder(&text, index) {
            Some(rewritten) => {
                debug!(index, "alias to an anchor outside the text");
                text = Cow::Owned(rewritten);
            }
            None => return events,
        }
    }
}

/// Translates every saphyr event of `text`. The second value is the char
/// index of an alias saphyr rejected, if that is what stopped the parse.
fn parse_text(text: &str) -> (VecDeque<Result<ParsingEvent, Error>>, Option<usize>) {
    let mut labels = Labels::new(text);
    let mut events = VecDeque::new();
    let mut parser = Parser::new_from_str(text);
    while let Some(next) = parser.next_event() {
        let (event, span) = match next {
            Ok(next) => next,
            Err(error) => {
                let index = error.marker().index();
                let unknown = error.info().contains("unknown anchor");
                events.push_back(Err(scan_error(&labels.chars, &error)));
                return (events, unknown.then_some(index));
            }
        };
        let translated = match event {
            Event::StreamStart | Event::Nothing => continue,
            Event::StreamEnd => break,
            Event::DocumentStart(_) => ParsingEvent::DocumentStart,
            Event::DocumentEnd => ParsingEvent::DocumentEnd,
            Event::MappingStart(anchor, tag) => ParsingEvent::MappingStart {
                anchor: labels.define(anchor, &span),
                tag: tag.as_deref().and_then(normalize_tag),
                style: DataStyle::Any,
            },
            Event::MappingEnd => ParsingEvent::MappingEnd,
            Event::SequenceStart(anchor, tag) => ParsingEvent::SequenceStart {
                anchor: labels.define(anchor, &span),
                tag: tag.as_deref().and_then(normalize_tag),
                style: DataStyle::Any,
            },
            Event::SequenceEnd => ParsingEvent::SequenceEnd,
            Event::Scalar(value, _, 0, Some(tag)) if tag.handle.is_empty() && tag.suffix == ALIAS_TAG => {
                ParsingEvent::Alias {
                    anchor: value.into_owned(),
                }
            }
            Event::Scalar(value, style, anchor, tag) => {
                let anchor = labels.define(anchor, &span);
                ParsingEvent::Scalar(scalar(value, style, anchor, tag))
            }
            Event::Alias(id) => ParsingEvent::Alias {
                anchor: labels.alias(id),
            },
        };
        trace!(event = translated.describe(), "parsed");
        events.push_back(Ok(translated));
    }
    (events, None)
}

fn scan_error(chars: &[char], error: &ScanError) -> Error {
    let index = error.marker().index();
    if error.info().contains("unknown anchor") {
        return Error::AnchorNotFound {
            anchor: alias_at(chars, index).map(|(_, name)| name).unwrap_or_default(),
        };
    }
    Error::Syntax {
        message: format!("{error}"),
        offset: Some(index),
    }
}

/// Anchor names by saphyr id. Ids count anchor definitions from 1, and the
/// name of each is read back from the text just before the node it marks.
struct Labels {
    chars: Vec<char>,
    names: HashMap<usize, String>,
}

impl Labels {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            names: HashMap::new(),
        }
    }

    fn define(&mut self, id: usize, span: &Span) -> Option<String> {
        if id == 0 {
            return None;
        }
        let name = anchor_before(&self.chars, span.start.index()).unwrap_or_else(|| id.to_string());
        self.names.insert(id, name.clone());
        Some(name)
    }

    fn alias(&self, id: usize) -> String {
        self.names.get(&id).cloned().unwrap_or_else(|| id.to_string())
    }
}

fn is_name_end(c: char) -> bool {
    c.is_whitespace() || matches!(c, ',' | '[' | ']' | '{' | '}')
}

/// The `&name` property written before the node content at char `start`.
///
/// Node properties sit on the same line as the content, or on an earlier
/// line when the content is a block collection. Tags between the two are
/// skipped.
fn anchor_before(chars: &[char], start: usize) -> Option<String> {
    let mut end = start.min(chars.len());
    loop {
        let line_start = chars[..end].iter().rposition(|c| *c == '\n').map_or(0, |i| i + 1);
        let line = without_comment(&chars[line_start..end]);
        for word in line.split(|c| is_name_end(*c)).rev().filter(|word| !word.is_empty()) {
            match word[0] {
                '&' => return Some(word[1..].iter().collect()),
                '!' => continue,
                _ => return None,
            }
        }
        if line_start == 0 {
            return None;
        }
        end = line_start - 1;
    }
}

fn without_comment(line: &[char]) -> &[char] {
    let comment = line
        .iter()
        .enumerate()
        .position(|(i, c)| *c == '#' && (i == 0 || line[i - 1].is_whitespace()));
    &line[..comment.unwrap_or(line.len())]
}

/// Position of the `*` and the name of the alias written at or just before
/// char `index`.
fn alias_at(chars: &[char], index: usize) -> Option<(usize, String)> {
    let upto = index.min(chars.len().checked_sub(1)?);
    let star = chars[..=upto].iter().rposition(|c| *c == '*')?;
    let name = chars[star + 1..].iter().take_while(|c| !is_name_end(**c)).collect();
    Some((star, name))
}

/// `text` with the alias at char `index` replaced by a scalar tagged
/// [`ALIAS_TAG`] that holds the alias name.
fn alias_placeholder(text: &str, index: usize) -> Option<String> {
    let chars: Vec<char> = text.chars().collect();
    let (star, name) = alias_at(&chars, index)?;
    let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
    let mut rewritten: String = chars[..star].iter().collect();
    rewritten.push_str(&format!("!<{ALIAS_TAG}> \"{escaped}\""));
    rewritten.extend(&chars[star + 1 + name.chars().count()..]);
    Some(rewritten)
}

/// `!!name` for core tags, `handle + suffix` otherwise; the non-specific
/// `!` carries no type.
fn normalize_tag(tag: &Tag) -> Option<String> {
    if tag.handle == CORE_TAG_PREFIX || tag.handle == "!!" {
        return Some(format!("!!{}", tag.suffix));
    }
    if let Some(suffix) = tag.suffix.strip_prefix(CORE_TAG_PREFIX) {
        return Some(format!("!!{suffix}"));
    }
    let full = format!("{}{}", tag.handle, tag.suffix);
    (full != "!" && !full.is_empty()).then_some(full)
}

fn scalar(value: Cow<'_, str>, style: SaphyrStyle, anchor: Option<String>, tag: Option<Cow<'_, Tag>>) -> Scalar {
    let style = match style {
        SaphyrStyle::Plain => ScalarStyle::Plain,
        SaphyrStyle::SingleQuoted => ScalarStyle::SingleQuoted,
        SaphyrStyle::DoubleQuoted => ScalarStyle::DoubleQuoted,
        SaphyrStyle::Literal => ScalarStyle::Literal,
        SaphyrStyle::Folded => ScalarStyle::Folded,
        #[allow(unreachable_patterns)]
        _ => ScalarStyle::Any,
    };
    // A lone `!` forces string typing without naming a type.
    let non_specific = tag
        .as_deref()
        .is_some_and(|tag| format!("{}{}", tag.handle, tag.suffix) == "!");
    let style = if non_specific && style.is_plain() {
        ScalarStyle::SingleQuoted
    } else {
        style
    };
    Scalar::new(value.into_owned(), style)
        .with_tag(tag.as_deref().and_then(normalize_tag))
        .with_anchor(anchor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(input: &str) -> Vec<ParsingEvent> {
        let mut parser = YamlParser::new(input);
        let mut out = Vec::new();
        while let Some(event) = parser.next_event().unwrap() {
            out.push(event);
        }
        out
    }

    fn anchors(events: &[ParsingEvent]) -> Vec<&str> {
        events.iter().filter_map(ParsingEvent::anchor).collect()
    }

    fn aliases(events: &[ParsingEvent]) -> Vec<&str> {
        events
            .iter()
            .filter_map(|e| match e {
                ParsingEvent::Alias { anchor } => Some(anchor.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn mapping_events_keep_document_markers() {
        let events = events("a: 1\nb: [x, 'y']\n");
        assert_eq!(events.first(), Some(&ParsingEvent::DocumentStart));
        assert_eq!(events.last(), Some(&ParsingEvent::DocumentEnd));
        let scalars: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                ParsingEvent::Scalar(s) => Some((s.value.as_str(), s.style)),
                _ => None,
            })
            .collect();
        assert_eq!(
            scalars,
            [
                ("a", ScalarStyle::Plain),
                ("1", ScalarStyle::Plain),
                ("b", ScalarStyle::Plain),
                ("x", ScalarStyle::Plain),
                ("y", ScalarStyle::SingleQuoted),
            ]
        );
    }

    #[test]
    fn tags_are_normalized() {
        let events = events("- !!int 3\n- !Point {x: 1}\n- !<tag:yaml.org,2002:str> s\n");
        let tags: Vec<_> = events.iter().filter_map(ParsingEvent::tag).collect();
        assert_eq!(tags, ["!!int", "!Point", "!!str"]);
    }

    #[test]
    fn non_specific_tag_quotes_a_plain_scalar() {
        let events = events("- ! 12\n");
        let scalar = events.iter().find_map(|e| match e {
            ParsingEvent::Scalar(s) => Some(s),
            _ => None,
        });
        assert_eq!(scalar.map(|s| s.style), Some(ScalarStyle::SingleQuoted));
        assert_eq!(scalar.and_then(|s| s.tag.clone()), None);
    }

    #[test]
    fn anchors_keep_their_source_names() {
        let events = events("a: &x [1]\nb: *x\nc: !Tag &y {k: v}\nd: &z !Tag 3\ne: [*y, *z]\n");
        assert_eq!(anchors(&events), ["x", "y", "z"]);
        assert_eq!(aliases(&events), ["x", "y", "z"]);
    }

    #[test]
    fn anchors_on_block_collections_are_found_on_the_line_above() {
        let events = events("&root # the node\nName: a\nItems: &list\n  - 1\nNext: *root\n");
        assert_eq!(anchors(&events), ["root", "list"]);
        assert_eq!(aliases(&events), ["root"]);
    }

    #[test]
    fn aliases_to_anchors_outside_the_text_are_kept() {
        let events = events("a: *missing\nb: [*other, 1]\nc: &here 2\nd: *here\n");
        assert_eq!(aliases(&events), ["missing", "other", "here"]);
        assert_eq!(anchors(&events), ["here"]);
        assert!(events.contains(&ParsingEvent::Scalar(Scalar::plain("1"))));
        assert_eq!(events.last(), Some(&ParsingEvent::DocumentEnd));
    }

    #[test]
    fn syntax_errors_carry_an_offset() {
        let mut parser = YamlParser::new("a: [1, 2\n");
        let error = std::iter::from_fn(|| match parser.next_event() {
            Ok(Some(_)) => Some(None),
            Ok(None) => None,
            Err(e) => Some(Some(e)),
        })
        .flatten()
        .next()
        .unwrap();
        assert!(matches!(error, Error::Syntax { offset: Some(_), .. }));
    }

    #[test]
    fn events_before_a_syntax_error_are_still_delivered() {
        let mut parser = YamlParser::new("a: 1\nb: [1, 2\n");
        assert_eq!(parser.next_event().unwrap(), Some(ParsingEvent::DocumentStart));
        assert!(parser.peek_event().is_ok());
    }
}
