//! Restricted evaluator for data literals embedded in inline page scripts.
//!
//! Pages often ship their initial state as a script such as
//!
//! ```text
//! try {
//!   const initialData = [];
//!   initialData.push({path: '\/browse', params: JSON.parse('\x7b\x7d'), data: '\x7b...\x7d'});
//!   ytcfg.set({...});
//! } catch (e) {}
//! ```
//!
//! Only the pieces that build one named array are read: its literal
//! initialiser and the arguments of its `push(...)` calls. Everything else in
//! the script is skipped over unread. The accepted grammar is limited to
//! object and array literals, quoted strings with JS escapes, numbers,
//! `true`/`false`/`null`/`undefined` and `JSON.parse('<string>')`. Any other
//! expression is rejected, nothing is ever executed.

use regex::Regex;
use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Nesting limit for object/array literals.
const MAX_DEPTH: usize = 128;

#[derive(Debug, Error, PartialEq)]
#[error("{message} at offset {offset}")]
pub struct LiteralError {
    pub message: String,
    pub offset: usize,
}

impl LiteralError {
    fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

/// Collects the elements of the array variable `name` as built by `script`.
///
/// The variable's own initialiser (`var|let|const name = [...]`) is read if
/// present; each later `name.push(a, b, ...)` call appends its arguments.
pub fn extract_array_variable(script: &str, name: &str) -> Result<Vec<Value>, LiteralError> {
    let var = regex::escape(name);
    let assign_re = Regex::new(&format!(r"\b{}\s*=", var)).map_err(|e| LiteralError::new(e.to_string(), 0))?;
    let push_re = Regex::new(&format!(r"\b{}\s*\.\s*push\s*\(", var)).map_err(|e| LiteralError::new(e.to_string(), 0))?;

    let mut items = Vec::new();
    let mut found = false;
    let mut cursor = 0;

    if let Some(m) = assign_re
        .find_iter(script)
        .find(|m| !script[m.end()..].starts_with('=') && !is_member_access(script, m.start()))
    {
        let mut parser = LiteralParser::at(script, m.end());
        match parser.parse_value()? {
            Value::Array(initial) => items.extend(initial),
            _ => return Err(LiteralError::new(format!("'{}' is not initialised with an array", name), m.end())),
        }
        found = true;
        cursor = parser.pos;
    }

    while let Some(m) = push_re.find_at(script, cursor) {
        let mut parser = LiteralParser::at(script, m.end());
        items.extend(parser.parse_arguments()?);
        found = true;
        cursor = parser.pos;
    }

    if !found {
        return Err(LiteralError::new(format!("No assignment to '{}' found", name), 0));
    }
    Ok(items)
}

/// Parses a single literal expression occupying all of `source`.
pub fn parse_literal(source: &str) -> Result<Value, LiteralError> {
    let mut parser = LiteralParser::at(source, 0);
    let value = parser.parse_value()?;
    parser.skip_trivia();
    if parser.pos != source.len() {
        return Err(LiteralError::new("Trailing input after literal", parser.pos));
    }
    Ok(value)
}

/// `obj.name =` is a property write, not the variable itself.
fn is_member_access(script: &str, start: usize) -> bool {
    script[..start].trim_end().ends_with('.')
}

struct LiteralParser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> LiteralParser<'a> {
    fn at(src: &'a str, pos: usize) -> Self {
        Self { src, pos, depth: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> LiteralError {
        LiteralError::new(message, self.pos)
    }

    /// Skips whitespace and comments.
    fn skip_trivia(&mut self) {
        loop {
            let rest = self.rest();
            let trimmed = rest.trim_start();
            self.pos += rest.len() - trimmed.len();

            if trimmed.starts_with("//") {
                self.pos += trimmed.find('\n').unwrap_or(trimmed.len());
            } else if let Some(body) = trimmed.strip_prefix("/*") {
                self.pos += body.find("*/").map(|i| i + 4).unwrap_or(trimmed.len());
            } else {
                return;
            }
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), LiteralError> {
        self.skip_trivia();
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(LiteralError::new(
                format!("Expected '{}', found '{}'", expected, c),
                self.pos - c.len_utf8(),
            )),
            None => Err(self.error(format!("Expected '{}', found end of input", expected))),
        }
    }

    fn parse_value(&mut self) -> Result<Value, LiteralError> {
        self.skip_trivia();
        match self.peek() {
            Some('{') => self.nested(Self::parse_object),
            Some('[') => self.nested(Self::parse_array),
            Some(q @ ('"' | '\'')) => self.parse_string(q).map(Value::String),
            Some(c) if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => self.parse_number(),
            Some(c) if is_ident_start(c) => self.parse_word(),
            Some(c) => Err(self.error(format!("Unsupported expression starting with '{}'", c))),
            None => Err(self.error("Unexpected end of input")),
        }
    }

    fn nested(&mut self, parse: fn(&mut Self) -> Result<Value, LiteralError>) -> Result<Value, LiteralError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("Literal nested too deeply"));
        }
        self.depth += 1;
        let value = parse(self);
        self.depth -= 1;
        value
    }

    /// Arguments of a call whose `(` was already consumed, up to and including `)`.
    fn parse_arguments(&mut self) -> Result<Vec<Value>, LiteralError> {
        let mut args = Vec::new();
        loop {
            self.skip_trivia();
            if self.peek() == Some(')') {
                self.bump();
                return Ok(args);
            }
            args.push(self.parse_value()?);
            self.skip_trivia();
            match self.bump() {
                Some(',') => continue,
                Some(')') => return Ok(args),
                _ => return Err(self.error("Expected ',' or ')' in argument list")),
            }
        }
    }

    fn parse_array(&mut self) -> Result<Value, LiteralError> {
        self.expect('[')?;
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            if self.peek() == Some(']') {
                self.bump();
                return Ok(Value::Array(items));
            }
            items.push(self.parse_value()?);
            self.skip_trivia();
            match self.bump() {
                Some(',') => continue,
                Some(']') => return Ok(Value::Array(items)),
                _ => return Err(self.error("Expected ',' or ']' in array literal")),
            }
        }
    }

    fn parse_object(&mut self) -> Result<Value, LiteralError> {
        self.expect('{')?;
        let mut map = Map::new();
        loop {
            self.skip_trivia();
            let key = match self.peek() {
                Some('}') => {
                    self.bump();
                    return Ok(Value::Object(map));
                }
                Some(q @ ('"' | '\'')) => self.parse_string(q)?,
                Some(c) if c.is_ascii_digit() => self.take_while(|c| c.is_ascii_alphanumeric() || c == '.').to_string(),
                Some(c) if is_ident_start(c) => self.take_while(is_ident_char).to_string(),
                _ => return Err(self.error("Expected property name")),
            };
            self.expect(':')?;
            let value = self.parse_value()?;
            map.insert(key, value);

            self.skip_trivia();
            match self.bump() {
                Some(',') => continue,
                Some('}') => return Ok(Value::Object(map)),
                _ => return Err(self.error("Expected ',' or '}' in object literal")),
            }
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let len = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn parse_word(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        let word = self.take_while(is_ident_char);
        match word {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            "null" | "undefined" => Ok(Value::Null),
            "JSON" => self.parse_json_call(),
            other => Err(LiteralError::new(format!("Unsupported identifier '{}'", other), start)),
        }
    }

    /// `JSON.parse('<string>')` with the `JSON` identifier already consumed.
    fn parse_json_call(&mut self) -> Result<Value, LiteralError> {
        self.expect('.')?;
        self.skip_trivia();
        let start = self.pos;
        if self.take_while(is_ident_char) != "parse" {
            return Err(LiteralError::new("Only JSON.parse is supported", start));
        }
        self.expect('(')?;
        self.skip_trivia();
        let text = match self.peek() {
            Some(q @ ('"' | '\'')) => self.parse_string(q)?,
            _ => return Err(self.error("JSON.parse expects a string literal")),
        };
        self.expect(')')?;
        serde_json::from_str(&text).map_err(|e| LiteralError::new(format!("Invalid JSON in JSON.parse: {}", e), start))
    }

    fn parse_number(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        let text = self.take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+'));

        let number = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            u64::from_str_radix(hex, 16).ok().map(Number::from)
        } else if let Ok(int) = text.parse::<i64>() {
            Some(Number::from(int))
        } else {
            text.parse::<f64>().ok().and_then(Number::from_f64)
        };

        number
            .map(Value::Number)
            .ok_or_else(|| LiteralError::new(format!("Invalid number '{}'", text), start))
    }

    fn parse_string(&mut self, quote: char) -> Result<String, LiteralError> {
        let start = self.pos;
        self.bump();
        let mut out = String::new();

        loop {
            match self.bump() {
                None | Some('\n') => return Err(LiteralError::new("Unterminated string literal", start)),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => self.parse_escape(&mut out)?,
                Some(c) => out.push(c),
            }
        }
    }

    fn parse_escape(&mut self, out: &mut String) -> Result<(), LiteralError> {
        let c = self.bump().ok_or_else(|| self.error("Unterminated escape sequence"))?;
        match c {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0C}'),
            'v' => out.push('\u{0B}'),
            '0' if !self.peek().is_some_and(|c| c.is_ascii_digit()) => out.push('\0'),
            'x' => {
                let code = self.hex_digits(2)?;
                out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            'u' => {
                let code = self.unicode_escape()?;
                out.push(self.combine_surrogates(code)?);
            }
            // Line continuation.
            '\n' => {}
            '\r' => {
                if self.peek() == Some('\n') {
                    self.bump();
                }
            }
            other => out.push(other),
        }
        Ok(())
    }

    fn hex_digits(&mut self, count: usize) -> Result<u32, LiteralError> {
        let digits = self.rest().get(..count).filter(|d| d.chars().all(|c| c.is_ascii_hexdigit()));
        match digits {
            Some(d) => {
                self.pos += count;
                u32::from_str_radix(d, 16).map_err(|e| self.error(e.to_string()))
            }
            None => Err(self.error("Invalid hex escape")),
        }
    }

    /// `XXXX` or `{X...}` after `\u`.
    fn unicode_escape(&mut self) -> Result<u32, LiteralError> {
        if self.peek() == Some('{') {
            self.bump();
            let digits = self.take_while(|c| c.is_ascii_hexdigit());
            let code = u32::from_str_radix(digits, 16).map_err(|_| self.error("Invalid unicode escape"))?;
            self.expect('}')?;
            return Ok(code);
        }
        self.hex_digits(4)
    }

    fn combine_surrogates(&mut self, high: u32) -> Result<char, LiteralError> {
        if !(0xD800..0xDC00).contains(&high) {
            return Ok(char::from_u32(high).unwrap_or(char::REPLACEMENT_CHARACTER));
        }
        if !self.rest().starts_with("\\u") {
            return Ok(char::REPLACEMENT_CHARACTER);
        }

        let checkpoint = self.pos;
        self.pos += 2;
        let low = self.unicode_escape()?;
        if (0xDC00..0xE000).contains(&low) {
            let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
            Ok(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER))
        } else {
            self.pos = checkpoint;
            Ok(char::REPLACEMENT_CHARACTER)
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}
