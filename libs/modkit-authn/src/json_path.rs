//! Path expressions over JSON documents.
//!
//! Syntax:
//! - `a.b.c` walks object keys; a numeric component indexes arrays
//! - `\.` escapes a literal dot inside a key
//! - `a[0]` and `a["k"]` are bracket accessors
//! - `#` yields an array's length; `a.#.b` collects `b` from every element
//! - `@name` or `@name:arg` applies a registered modifier
//! - `|` is accepted wherever `.` is
//!
//! Evaluation works on raw JSON text. Only the containers on the path are
//! opened, one level at a time; everything else is skipped syntactically, so
//! numbers out of `f64` range or deep nesting elsewhere in the document do not
//! affect the result. When an object repeats a key the first occurrence wins.
//!
//! Evaluation never fails: malformed paths, unknown modifiers, missing keys
//! and invalid documents all produce `None`.

use serde::de::{Deserializer as _, MapAccess, Visitor};
use serde_json::value::RawValue;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A modifier receives the raw JSON of the current value and the optional
/// `:arg` text, and returns raw JSON.
pub type Modifier = Arc<dyn Fn(&str, Option<&str>) -> Option<String> + Send + Sync>;

/// Path evaluator with a fixed modifier table.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Clone)]
pub struct JsonPath {
    modifiers: HashMap<String, Modifier>,
}

/// Collects modifiers for a [`JsonPath`].
#[derive(Default)]
pub struct JsonPathBuilder {
    modifiers: HashMap<String, Modifier>,
}

impl JsonPathBuilder {
    /// Register `modifier` under `name` (without the leading `@`).
    /// A later registration replaces an earlier one.
    #[must_use]
    pub fn modifier<F>(mut self, name: impl Into<String>, modifier: F) -> Self
    where
        F: Fn(&str, Option<&str>) -> Option<String> + Send + Sync + 'static,
    {
        self.modifiers.insert(name.into(), Arc::new(modifier));
        self
    }

    /// Register `@this`, `@keys` and `@values`.
    #[must_use]
    pub fn default_modifiers(self) -> Self {
        self.modifier("this", |json, _| Some(json.to_owned()))
            .modifier("keys", |json, _| {
                let keys: Vec<String> = object_entries(json)?.into_iter().map(|(k, _)| k).collect();
                serde_json::to_string(&keys).ok()
            })
            .modifier("values", |json, _| {
                let values: Vec<&str> = object_entries(json)?.into_iter().map(|(_, v)| v).collect();
                Some(format!("[{}]", values.join(",")))
            })
    }

    #[must_use]
    pub fn build(self) -> JsonPath {
        JsonPath {
            modifiers: self.modifiers,
        }
    }
}

impl JsonPath {
    #[must_use]
    pub fn builder() -> JsonPathBuilder {
        JsonPathBuilder::default()
    }

    /// Evaluator with `@this`, `@keys` and `@values` registered.
    #[must_use]
    pub fn with_default_modifiers() -> Self {
        Self::builder().default_modifiers().build()
    }

    /// Raw JSON text of the value at `path` inside the serialized `document`.
    ///
    /// The document is only checked for well-formed syntax; values off the
    /// path are never decoded.
    #[must_use]
    pub fn extract_raw(&self, document: &[u8], path: &str) -> Option<String> {
        let segments = parse(path)?;
        let text = std::str::from_utf8(document).ok()?;
        let root: &RawValue = serde_json::from_str(text).ok()?;
        self.eval(root.get(), &segments)
    }

    fn eval(&self, json: &str, segments: &[Segment]) -> Option<String> {
        let Some((first, rest)) = segments.split_first() else {
            return Some(json.to_owned());
        };

        match first {
            Segment::Key(key) => {
                let next = match json.as_bytes().first()? {
                    b'{' => object_field(json, key)?,
                    b'[' => {
                        let index: usize = key.parse().ok()?;
                        array_items(json)?.get(index).copied()?
                    }
                    _ => return None,
                };
                self.eval(next, rest)
            }
            Segment::Field(key) => self.eval(object_field(json, key)?, rest),
            Segment::Index(index) => self.eval(array_items(json)?.get(*index).copied()?, rest),
            Segment::Count => {
                let items = array_items(json)?;
                if rest.is_empty() {
                    Some(items.len().to_string())
                } else {
                    let mapped: Vec<String> = items
                        .iter()
                        .filter_map(|item| self.eval(item, rest))
                        .collect();
                    Some(format!("[{}]", mapped.join(",")))
                }
            }
            Segment::Modifier { name, arg } => {
                let modifier = self.modifiers.get(name)?;
                let out = modifier(json, arg.as_deref())?;
                self.eval(&out, rest)
            }
        }
    }
}

impl Default for JsonPath {
    fn default() -> Self {
        Self::with_default_modifiers()
    }
}

impl fmt::Debug for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.modifiers.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("JsonPath").field("modifiers", &names).finish()
    }
}

/// Members of one object, in document order, values left as raw text
struct ObjectEntries;

impl<'de> Visitor<'de> for ObjectEntries {
    type Value = Vec<(String, &'de RawValue)>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut entries: Vec<(String, &'de RawValue)> = Vec::new();
        while let Some(key) = map.next_key::<String>()? {
            let value: &'de RawValue = map.next_value()?;
            if !entries.iter().any(|(seen, _)| *seen == key) {
                entries.push((key, value));
            }
        }
        Ok(entries)
    }
}

/// Object members of `json`; a repeated key keeps its first value.
fn object_entries(json: &str) -> Option<Vec<(String, &str)>> {
    let mut de = serde_json::Deserializer::from_str(json);
    let entries = (&mut de).deserialize_map(ObjectEntries).ok()?;
    de.end().ok()?;
    Some(
        entries
            .into_iter()
            .map(|(key, value)| (key, value.get()))
            .collect(),
    )
}

fn object_field<'a>(json: &'a str, key: &str) -> Option<&'a str> {
    object_entries(json)?
        .into_iter()
        .find_map(|(k, v)| (k == key).then_some(v))
}

fn array_items(json: &str) -> Option<Vec<&str>> {
    let items: Vec<&RawValue> = serde_json::from_str(json).ok()?;
    Some(items.into_iter().map(RawValue::get).collect())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Object key, or array index when numeric
    Key(String),
    /// `["k"]`
    Field(String),
    /// `[n]`
    Index(usize),
    /// `#`
    Count,
    Modifier { name: String, arg: Option<String> },
}

fn is_separator(c: char) -> bool {
    c == '.' || c == '|'
}

/// Split `path` into segments; `None` for an empty or malformed path.
fn parse(path: &str) -> Option<Vec<Segment>> {
    if path.is_empty() {
        return None;
    }

    let chars: Vec<char> = path.chars().collect();
    let mut segments = Vec::new();
    let mut key = String::new();
    let mut escaped = false;
    let mut bracketed = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' => {
                i += 1;
                key.push(*chars.get(i).unwrap_or(&'\\'));
                escaped = true;
            }
            c if is_separator(c) => {
                flush(&mut segments, &mut key, escaped, bracketed);
                escaped = false;
                bracketed = false;
            }
            '[' => {
                if !key.is_empty() || escaped {
                    flush(&mut segments, &mut key, escaped, false);
                    escaped = false;
                }
                let (segment, next) = parse_bracket(&chars, i + 1)?;
                segments.push(segment);
                bracketed = true;
                i = next;
                continue;
            }
            '@' if key.is_empty() && !escaped && !bracketed => {
                let (segment, next) = parse_modifier(&chars, i + 1);
                segments.push(segment);
                // a modifier is a whole component; the next char is a separator or the end
                bracketed = true;
                i = next;
                continue;
            }
            _ => key.push(c),
        }
        i += 1;
    }
    flush(&mut segments, &mut key, escaped, bracketed);

    Some(segments)
}

fn flush(segments: &mut Vec<Segment>, key: &mut String, escaped: bool, bracketed: bool) {
    if key.is_empty() && bracketed {
        return;
    }
    let key = std::mem::take(key);
    if key == "#" && !escaped {
        segments.push(Segment::Count);
    } else {
        segments.push(Segment::Key(key));
    }
}

/// Parse `n]` or `"k"]` starting at `start`; returns the segment and the index after `]`.
fn parse_bracket(chars: &[char], start: usize) -> Option<(Segment, usize)> {
    let mut i = start;
    if chars.get(i) == Some(&'"') {
        i += 1;
        let mut field = String::new();
        loop {
            match chars.get(i)? {
                '\\' => {
                    i += 1;
                    field.push(*chars.get(i)?);
                }
                '"' => break,
                c => field.push(*c),
            }
            i += 1;
        }
        i += 1;
        (chars.get(i) == Some(&']')).then_some((Segment::Field(field), i + 1))
    } else {
        let digits: String = chars[i..].iter().take_while(|c| **c != ']').collect();
        i += digits.chars().count();
        if chars.get(i) != Some(&']') {
            return None;
        }
        let index = digits.trim().parse().ok()?;
        Some((Segment::Index(index), i + 1))
    }
}

/// Parse `name[:arg]` starting at `start`. The argument runs to the next
/// separator outside quotes, braces and brackets.
fn parse_modifier(chars: &[char], start: usize) -> (Segment, usize) {
    let mut i = start;
    let mut name = String::new();
    while let Some(&c) = chars.get(i) {
        if c == ':' || is_separator(c) {
            break;
        }
        name.push(c);
        i += 1;
    }

    if chars.get(i) != Some(&':') {
        return (Segment::Modifier { name, arg: None }, i);
    }
    i += 1;

    let mut arg = String::new();
    let mut depth = 0usize;
    let mut in_string = false;
    while let Some(&c) = chars.get(i) {
        if in_string {
            if c == '\\' {
                arg.push(c);
                i += 1;
                if let Some(&next) = chars.get(i) {
                    arg.push(next);
                }
                i += 1;
                continue;
            }
            if c == '"' {
                in_string = false;
            }
        } else {
            match c {
                '"' => in_string = true,
                '{' | '[' => depth += 1,
                '}' | ']' => depth = depth.saturating_sub(1),
                c if is_separator(c) && depth == 0 => break,
                _ => {}
            }
        }
        arg.push(c);
        i += 1;
    }

    (
        Segment::Modifier {
            name,
            arg: Some(arg),
        },
        i,
    )
}
