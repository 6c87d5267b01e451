//! Best-effort parsing of truncated JSON
//!
//! Function-call arguments arrive a few characters at a time, so almost every
//! intermediate state is invalid JSON. [`parse_partial_json`] recovers the
//! deepest value that is already certain:
//!
//! - a key whose name is still being typed is left out entirely
//! - a string value that is still being typed is returned as-is, since it can
//!   only grow
//! - numbers and `true`/`false`/`null` cut off by the end of input are left
//!   out, because their final value is not yet known
//!
//! Every recovered string is a prefix of its final value. Truncated escapes
//! are dropped until the rest of the escape arrives.

use serde_json::{Map, Value};

/// Nesting limit, matching serde_json's own recursion limit
const MAX_DEPTH: usize = 128;

/// Outcome of parsing a possibly truncated JSON document
#[derive(Debug, Clone, PartialEq)]
pub enum PartialJson {
    /// Nothing can be recovered yet (or the input can never become valid JSON)
    Pending,

    /// The top-level value is an object
    Object(Map<String, Value>),

    /// The top-level value is something other than an object
    NotObject(Value),
}

impl PartialJson {
    /// The recovered object, if the top level is one
    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Check if nothing could be recovered
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Parse a prefix of a JSON document, recovering what is already certain
///
/// Never panics, whatever the input.
pub fn parse_partial_json(input: &str) -> PartialJson {
    if input.trim().is_empty() {
        return PartialJson::Pending;
    }

    // Complete documents take the strict path
    if let Ok(value) = serde_json::from_str::<Value>(input) {
        return classify(value);
    }

    let mut parser = Parser::new(input);
    match parser.value() {
        Fragment::Complete(value) => {
            parser.skip_whitespace();
            if parser.at_end() {
                classify(value)
            } else {
                PartialJson::Pending
            }
        }
        Fragment::Truncated(Some(Value::Object(map))) if map.is_empty() => PartialJson::Pending,
        Fragment::Truncated(Some(value)) => classify(value),
        Fragment::Truncated(None) | Fragment::Invalid => PartialJson::Pending,
    }
}

fn classify(value: Value) -> PartialJson {
    match value {
        Value::Object(map) => PartialJson::Object(map),
        other => PartialJson::NotObject(other),
    }
}

/// A value read by the parser
enum Fragment {
    /// The value ended inside the input
    Complete(Value),
    /// Input ran out inside the value; carries what is already certain
    Truncated(Option<Value>),
    /// The input cannot be a prefix of valid JSON
    Invalid,
}

enum Str {
    Complete(String),
    Truncated(String),
    Invalid,
}

enum Escape {
    Char(char),
    Truncated,
    Invalid,
}

enum Hex {
    Code(u16),
    Truncated,
    Invalid,
}

struct Parser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn value(&mut self) -> Fragment {
        self.skip_whitespace();
        match self.peek() {
            None => Fragment::Truncated(None),
            Some(b'{' | b'[') if self.depth >= MAX_DEPTH => Fragment::Invalid,
            Some(b'{') => self.nested(Self::object),
            Some(b'[') => self.nested(Self::array),
            Some(b'"') => match self.string() {
                Str::Complete(s) => Fragment::Complete(Value::String(s)),
                Str::Truncated(s) => Fragment::Truncated(Some(Value::String(s))),
                Str::Invalid => Fragment::Invalid,
            },
            Some(b't') => self.literal("true", Value::Bool(true)),
            Some(b'f') => self.literal("false", Value::Bool(false)),
            Some(b'n') => self.literal("null", Value::Null),
            Some(b'-' | b'0'..=b'9') => self.number(),
            Some(_) => Fragment::Invalid,
        }
    }

    fn nested(&mut self, read: fn(&mut Self) -> Fragment) -> Fragment {
        self.depth += 1;
        let fragment = read(self);
        self.depth -= 1;
        fragment
    }

    fn object(&mut self) -> Fragment {
        self.pos += 1;
        let mut map = Map::new();

        self.skip_whitespace();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Fragment::Complete(Value::Object(map));
        }

        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Fragment::Truncated(Some(Value::Object(map))),
                Some(b'"') => {}
                Some(_) => return Fragment::Invalid,
            }

            let key = match self.string() {
                Str::Complete(key) => key,
                // half-typed key names never surface
                Str::Truncated(_) => return Fragment::Truncated(Some(Value::Object(map))),
                Str::Invalid => return Fragment::Invalid,
            };

            self.skip_whitespace();
            match self.peek() {
                None => return Fragment::Truncated(Some(Value::Object(map))),
                Some(b':') => self.pos += 1,
                Some(_) => return Fragment::Invalid,
            }

            match self.value() {
                Fragment::Complete(value) => {
                    map.insert(key, value);
                }
                Fragment::Truncated(Some(value)) => {
                    map.insert(key, value);
                    return Fragment::Truncated(Some(Value::Object(map)));
                }
                Fragment::Truncated(None) => return Fragment::Truncated(Some(Value::Object(map))),
                Fragment::Invalid => return Fragment::Invalid,
            }

            self.skip_whitespace();
            match self.peek() {
                None => return Fragment::Truncated(Some(Value::Object(map))),
                Some(b',') => self.pos += 1,
                Some(b'}') => {
                    self.pos += 1;
                    return Fragment::Complete(Value::Object(map));
                }
                Some(_) => return Fragment::Invalid,
            }
        }
    }

    fn array(&mut self) -> Fragment {
        self.pos += 1;
        let mut items = Vec::new();

        self.skip_whitespace();
        if self.peek() == Some(b']') {
            self.pos += 1;
            return Fragment::Complete(Value::Array(items));
        }

        loop {
            match self.value() {
                Fragment::Complete(value) => items.push(value),
                Fragment::Truncated(Some(value)) => {
                    items.push(value);
                    return Fragment::Truncated(Some(Value::Array(items)));
                }
                Fragment::Truncated(None) => return Fragment::Truncated(Some(Value::Array(items))),
                Fragment::Invalid => return Fragment::Invalid,
            }

            self.skip_whitespace();
            match self.peek() {
                None => return Fragment::Truncated(Some(Value::Array(items))),
                Some(b',') => self.pos += 1,
                Some(b']') => {
                    self.pos += 1;
                    return Fragment::Complete(Value::Array(items));
                }
                Some(_) => return Fragment::Invalid,
            }
        }
    }

    fn literal(&mut self, word: &str, value: Value) -> Fragment {
        let rest = &self.bytes[self.pos..];
        if rest.starts_with(word.as_bytes()) {
            self.pos += word.len();
            Fragment::Complete(value)
        } else if word.as_bytes().starts_with(rest) {
            self.pos = self.bytes.len();
            Fragment::Truncated(None)
        } else {
            Fragment::Invalid
        }
    }

    fn number(&mut self) -> Fragment {
        let start = self.pos;
        while matches!(
            self.peek(),
            Some(b'0'..=b'9' | b'-' | b'+' | b'.' | b'e' | b'E')
        ) {
            self.pos += 1;
        }

        // `12` at the end of input may still become `123`
        if self.at_end() {
            return Fragment::Truncated(None);
        }

        match serde_json::from_str::<Value>(&self.src[start..self.pos]) {
            Ok(value @ Value::Number(_)) => Fragment::Complete(value),
            _ => Fragment::Invalid,
        }
    }

    /// Read a string starting at its opening quote
    ///
    /// Raw control characters are accepted; models emit them often enough.
    fn string(&mut self) -> Str {
        self.pos += 1;
        let mut out = String::new();
        let mut run = self.pos;

        loop {
            let Some(byte) = self.peek() else {
                out.push_str(&self.src[run..self.pos]);
                return Str::Truncated(out);
            };

            match byte {
                b'"' => {
                    out.push_str(&self.src[run..self.pos]);
                    self.pos += 1;
                    return Str::Complete(out);
                }
                b'\\' => {
                    out.push_str(&self.src[run..self.pos]);
                    match self.escape() {
                        Escape::Char(c) => out.push(c),
                        Escape::Truncated => {
                            self.pos = self.bytes.len();
                            return Str::Truncated(out);
                        }
                        Escape::Invalid => return Str::Invalid,
                    }
                    run = self.pos;
                }
                _ => self.pos += 1,
            }
        }
    }

    fn escape(&mut self) -> Escape {
        self.pos += 1;
        let Some(byte) = self.peek() else {
            return Escape::Truncated;
        };
        self.pos += 1;

        let c = match byte {
            b'"' => '"',
            b'\\' => '\\',
            b'/' => '/',
            b'b' => '\u{8}',
            b'f' => '\u{c}',
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'u' => return self.unicode_escape(),
            _ => return Escape::Invalid,
        };
        Escape::Char(c)
    }

    fn unicode_escape(&mut self) -> Escape {
        let high = match self.hex4() {
            Hex::Code(code) => code,
            Hex::Truncated => return Escape::Truncated,
            Hex::Invalid => return Escape::Invalid,
        };

        if !(0xD800..0xDC00).contains(&high) {
            return Escape::Char(
                char::from_u32(u32::from(high)).unwrap_or(char::REPLACEMENT_CHARACTER),
            );
        }

        // High surrogate: only meaningful with a `\uDC00`-`\uDFFF` after it
        let rest = &self.bytes[self.pos..];
        if rest.len() < 2 {
            if b"\\u".starts_with(rest) {
                return Escape::Truncated;
            }
            return Escape::Char(char::REPLACEMENT_CHARACTER);
        }
        if &rest[..2] != b"\\u" {
            return Escape::Char(char::REPLACEMENT_CHARACTER);
        }

        let mark = self.pos;
        self.pos += 2;
        match self.hex4() {
            Hex::Truncated => Escape::Truncated,
            Hex::Invalid => Escape::Invalid,
            Hex::Code(low) if (0xDC00..0xE000).contains(&low) => {
                let code = 0x10000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(low) - 0xDC00);
                Escape::Char(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER))
            }
            Hex::Code(_) => {
                // the next escape is not a low half; leave it for the caller
                self.pos = mark;
                Escape::Char(char::REPLACEMENT_CHARACTER)
            }
        }
    }

    fn hex4(&mut self) -> Hex {
        let available = &self.bytes[self.pos..];
        let take = available.len().min(4);

        if !available[..take].iter().all(|b| b.is_ascii_hexdigit()) {
            return Hex::Invalid;
        }
        if take < 4 {
            return Hex::Truncated;
        }

        let digits = &self.src[self.pos..self.pos + 4];
        self.pos += 4;
        match u16::from_str_radix(digits, 16) {
            Ok(code) => Hex::Code(code),
            Err(_) => Hex::Invalid,
        }
    }
}
