//! Line-oriented `key=value` properties codec.
//!
//! Keys are flat: `db.port=5432` is a single top-level entry named `db.port`.
//! Nested tables are flattened to dotted keys when written.

use crate::error::CodecError;
use crate::persistence::{Format, PersistenceAdapter};
use crate::tree::node::flatten;
use crate::tree::{ConfigNode, Table};

#[derive(Debug, Default, Clone, Copy)]
pub struct PropertiesAdapter;

impl PersistenceAdapter for PropertiesAdapter {
    fn format(&self) -> Format {
        Format::Properties
    }

    fn decode(&self, input: &str, _delimiter: char) -> Result<Table, CodecError> {
        let mut table = Table::new();
        for (line_no, line) in logical_lines(input) {
            let (key, value) = split_entry(&line);
            let key = unescape(key, line_no)?;
            let value = unescape(value, line_no)?;
            table.insert(key, ConfigNode::Leaf(value));
        }
        Ok(table)
    }

    fn encode(&self, table: &Table) -> Result<String, CodecError> {
        let mut out = String::new();
        for (key, value) in flatten(table) {
            out.push_str(&escape(&key, true));
            out.push('=');
            out.push_str(&escape(&value, false));
            out.push('\n');
        }
        Ok(out)
    }
}

/// Join continuation lines and drop comments and blanks. Yields the 1-based
/// number of the line each entry starts on.
fn logical_lines(input: &str) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (idx, raw) in input.lines().enumerate() {
        let line = raw.trim_start();
        let (start, mut current) = match pending.take() {
            Some((start, buf)) => (start, buf),
            None => {
                if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                    continue;
                }
                (idx + 1, String::new())
            }
        };

        if ends_with_continuation(line) {
            current.push_str(&line[..line.len() - 1]);
            pending = Some((start, current));
        } else {
            current.push_str(line);
            out.push((start, current));
        }
    }
    if let Some(entry) = pending {
        out.push(entry);
    }
    out
}

/// An odd number of trailing backslashes continues the line.
fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

/// Split on the first unescaped `=`, `:` or whitespace.
fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' | ' ' | '\t' | '\u{c}' => {
                key_end = i;
                break;
            }
            _ => {}
        }
    }

    let key = &line[..key_end];
    let rest = line[key_end..].trim_start_matches([' ', '\t', '\u{c}']);
    let rest = rest
        .strip_prefix(['=', ':'])
        .map(|r| r.trim_start_matches([' ', '\t', '\u{c}']))
        .unwrap_or(rest);
    (key, rest)
}

fn unescape(input: &str, line: usize) -> Result<String, CodecError> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => out.push(unicode_escape(&mut chars, line)?),
            Some(other) => out.push(other),
            None => {}
        }
    }
    Ok(out)
}

/// Decode the rest of a `\uXXXX` escape. A high surrogate must be followed
/// by a `\uXXXX` low surrogate; the pair encodes one non-BMP character.
fn unicode_escape(chars: &mut std::str::Chars<'_>, line: usize) -> Result<char, CodecError> {
    let high = hex_unit(chars, line)?;
    if !(0xD800..0xDC00).contains(&high) {
        return char::from_u32(high)
            .ok_or_else(|| malformed(line, format!("lone surrogate \\u{:04X}", high)));
    }

    let rest = chars.as_str();
    if !rest.starts_with("\\u") {
        return Err(malformed(line, format!("unpaired surrogate \\u{:04X}", high)));
    }
    // skip the `\u` introducing the low half
    chars.nth(1);
    let low = hex_unit(chars, line)?;
    if !(0xDC00..0xE000).contains(&low) {
        return Err(malformed(
            line,
            format!("\\u{:04X} is not a low surrogate after \\u{:04X}", low, high),
        ));
    }
    let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
    char::from_u32(code).ok_or_else(|| malformed(line, format!("invalid code point {:X}", code)))
}

/// Exactly four hex digits.
fn hex_unit(chars: &mut std::str::Chars<'_>, line: usize) -> Result<u32, CodecError> {
    let hex: String = chars.by_ref().take(4).collect();
    if hex.len() != 4 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(malformed(line, format!("malformed \\u escape '\\u{}'", hex)));
    }
    u32::from_str_radix(&hex, 16).map_err(|e| malformed(line, e.to_string()))
}

fn malformed(line: usize, message: String) -> CodecError {
    CodecError::Properties { line, message }
}

fn escape(input: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for (i, c) in input.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{c}' => out.push_str("\\f"),
            ' ' if is_key || i == 0 => out.push_str("\\ "),
            '=' | ':' | '#' | '!' if is_key => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}
