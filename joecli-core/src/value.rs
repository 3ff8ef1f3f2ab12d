// Copyright 2018 Lyndon Brown
//
// This file is part of the `joecli-core` command-line framework library.
//
// Licensed under the MIT license or the Apache license (version 2.0), at your option. You may not
// copy, modify, or distribute this file except in compliance with said license. You can find copies
// of these licenses either in the LICENSE-MIT and LICENSE-APACHE files, or alternatively at
// <http://opensource.org/licenses/MIT> and <http://www.apache.org/licenses/LICENSE-2.0>
// respectively.

//! Value destinations
//!
//! This module contains the *value adapter*: the uniform contract ([`Value`]) used to translate a
//! raw text token to a typed update and back, along with the set of built-in destination kinds
//! ([`Destination`]) the adapter recognises without requiring a caller-provided [`Value`] impl.
//!
//! See the separate [value adapter support discussion][value] for details on built-in kinds and on
//! how file-reference and list-splitting policies interact with a destination.
//!
//! [value]: ../docs/ch3_values/index.html

use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

/// A problem encountered while converting a token to or from a [`Value`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// The token could not be parsed as the destination's type
    InvalidFormat {
        /// The text that failed to convert
        text: String,
        /// A human-readable description of what was expected
        expected: &'static str,
    },
    /// The destination does not support the requested operation (e.g. `set_data` on a type with no
    /// sensible byte-level materialisation)
    Unsupported(&'static str),
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueError::InvalidFormat { text, expected } => {
                write!(f, "invalid value {:?}, expected {}", text, expected)
            },
            ValueError::Unsupported(what) => write!(f, "unsupported: {}", what),
        }
    }
}

impl std::error::Error for ValueError {}

/// Polymorphic value destination
///
/// An implementation exposes enough for the parser and dispatcher to treat any typed destination
/// uniformly: parse one token ([`set`](#tymethod.set)), render the current state
/// ([`as_text`](#tymethod.set)), and optionally participate in `IsBoolFlag`, `Reset`/`Copy` (for
/// [`EachOccurrence`](../pipeline/struct.Bits.html)) and byte-level (file-reference) materialisation.
///
/// This crate provides [`Value`] implementations for the built-in destination kinds listed in
/// [`Destination`], so most flags and args never need a custom impl; write one only when a bespoke
/// type (a `Url`, a `Regex`, a bignum, ...) is wanted as a destination — those concrete types are
/// deliberately not known to this crate (see the crate-level Non-goals).
pub trait Value: fmt::Debug {
    /// Parse one token, updating `self`
    fn set(&mut self, text: &str) -> Result<(), ValueError>;

    /// Render the current state back to text
    ///
    /// For round-trip invariants to hold, `Set(String(x))` should parse to a value equal to `x`
    /// for canonical forms of `x`.
    fn as_text(&self) -> String;

    /// A short placeholder name used in synopsis rendering (e.g. `"N"`, `"PATH"`)
    fn synopsis(&self) -> Option<&'static str> {
        None
    }

    /// Whether this destination is a boolean flag (takes no argument, `set` still called with
    /// `"true"`/`"false"` when explicitly written)
    fn is_bool_flag(&self) -> bool {
        false
    }

    /// Reset to the destination's zero value, used between occurrences under `EachOccurrence`
    fn reset(&mut self) {}

    /// Produce an independent copy of the current state, used under `EachOccurrence` to snapshot
    /// a per-occurrence value before `reset` runs for the next one. Returns `None` if the
    /// destination does not support being cloned (callers must then avoid `EachOccurrence`).
    fn clone_value(&self) -> Option<Box<dyn Value>> {
        None
    }

    /// Materialise from raw bytes (used by file-reference option handling). Defaults to a lossy
    /// UTF-8 conversion followed by [`set`](#tymethod.set).
    fn set_data(&mut self, data: &[u8]) -> Result<(), ValueError> {
        self.set(&String::from_utf8_lossy(data))
    }
}

/// How a [`Destination`] accepts tokens: one token replaces the prior state, or one token may be
/// split into several sub-tokens which each separately update the destination.
///
/// This is the *list-splitting* policy of spec §4.2: string slice, string map and name-value list
/// destinations are [`Multi`](Arity::Multi); everything else is [`Single`](Arity::Single).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// One token fully replaces the destination's state
    Single,
    /// A token may be split on unescaped commas (see [`split_list`]); each part is applied to the
    /// destination in turn
    Multi,
}

/// A typed value destination together with the [`Arity`] the adapter should use for it
///
/// Constructed via the `Destination::*` constructors for the built-in kinds, or
/// [`Destination::custom`] for a caller-supplied [`Value`] implementation.
#[derive(Debug)]
pub struct Destination {
    pub(crate) value: Box<dyn Value>,
    pub(crate) arity: Arity,
}

impl Destination {
    /// Wrap a caller-supplied [`Value`] implementation
    pub fn custom(value: Box<dyn Value>, arity: Arity) -> Self {
        Self { value, arity }
    }

    /// A boolean flag destination (`Arity::Single`)
    pub fn boolean(default: bool) -> Self {
        Self { value: Box::new(default), arity: Arity::Single }
    }

    /// A string destination (`Arity::Single`)
    pub fn string(default: impl Into<String>) -> Self {
        Self { value: Box::new(default.into()), arity: Arity::Single }
    }

    /// A signed 64-bit integer destination (`Arity::Single`)
    pub fn int(default: i64) -> Self {
        Self { value: Box::new(default), arity: Arity::Single }
    }

    /// An unsigned 64-bit integer destination (`Arity::Single`)
    pub fn uint(default: u64) -> Self {
        Self { value: Box::new(default), arity: Arity::Single }
    }

    /// A 64-bit floating point destination (`Arity::Single`)
    pub fn float(default: f64) -> Self {
        Self { value: Box::new(default), arity: Arity::Single }
    }

    /// A [`Duration`] destination (`Arity::Single`), parsed from `<number><unit>` (`ns`, `us`/`µs`,
    /// `ms`, `s`, `m`, `h`)
    pub fn duration(default: Duration) -> Self {
        Self { value: Box::new(default), arity: Arity::Single }
    }

    /// An [`IpAddr`] destination (`Arity::Single`)
    pub fn ip_addr(default: IpAddr) -> Self {
        Self { value: Box::new(default), arity: Arity::Single }
    }

    /// A string-slice destination (`Arity::Multi`)
    pub fn string_list(default: Vec<String>) -> Self {
        Self { value: Box::new(default), arity: Arity::Multi }
    }

    /// A byte-slice destination (`Arity::Single` — each occurrence replaces the buffer; used
    /// primarily as a `FileReference` target)
    pub fn byte_list(default: Vec<u8>) -> Self {
        Self { value: Box::new(default), arity: Arity::Single }
    }

    /// A string-to-string map destination (`Arity::Multi`); each element is split on the first
    /// unescaped `=`
    pub fn string_map(default: HashMap<String, String>) -> Self {
        Self { value: Box::new(default), arity: Arity::Multi }
    }

    /// Direct access to the underlying [`Value`]
    pub fn value(&self) -> &dyn Value {
        &*self.value
    }

    /// Direct mutable access to the underlying [`Value`]
    pub fn value_mut(&mut self) -> &mut dyn Value {
        &mut *self.value
    }

    pub(crate) fn arity(&self) -> Arity {
        self.arity
    }

    /// Apply one raw token to this destination, honouring `Arity::Multi` list-splitting unless
    /// `disable_splitting` is set.
    pub(crate) fn apply(&mut self, text: &str, disable_splitting: bool) -> Result<(), ValueError> {
        match self.arity {
            Arity::Single => self.value.set(text),
            Arity::Multi if disable_splitting => self.value.set(text),
            Arity::Multi => {
                for part in split_list(text) {
                    self.value.set(&part)?;
                }
                Ok(())
            },
        }
    }
}

/// Split `text` on unescaped commas, per spec §4.2: `\,` escapes a literal comma, `\\` escapes the
/// escape character itself. Used for `Arity::Multi` destinations.
pub fn split_list(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek() {
                Some(',') => { current.push(','); chars.next(); },
                Some('\\') => { current.push('\\'); chars.next(); },
                _ => current.push('\\'),
            },
            ',' => {
                parts.push(std::mem::take(&mut current));
            },
            _ => current.push(c),
        }
    }
    parts.push(current);
    parts
}

/// Split `text` on the first unescaped `=`, per spec §4.2 name-value element parsing
pub fn split_key_value(text: &str) -> (String, String) {
    let bytes = text.as_bytes();
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' => escaped = true,
            b'=' => {
                return (text[..i].replace("\\=", "="), text[i + 1..].to_string());
            },
            _ => {},
        }
    }
    (text.replace("\\=", "="), String::new())
}

macro_rules! impl_value_for_display_fromstr {
    ($($t:ty => $expected:expr),+ $(,)?) => {
        $(
            impl Value for $t {
                fn set(&mut self, text: &str) -> Result<(), ValueError> {
                    *self = text.parse::<$t>().map_err(|_| ValueError::InvalidFormat {
                        text: text.to_string(),
                        expected: $expected,
                    })?;
                    Ok(())
                }

                fn as_text(&self) -> String {
                    self.to_string()
                }

                fn clone_value(&self) -> Option<Box<dyn Value>> {
                    Some(Box::new(self.clone()))
                }
            }
        )+
    };
}

impl Value for bool {
    fn set(&mut self, text: &str) -> Result<(), ValueError> {
        *self = match text {
            "" | "true" | "1" | "yes" | "on" => true,
            "false" | "0" | "no" | "off" => false,
            _ => return Err(ValueError::InvalidFormat {
                text: text.to_string(),
                expected: "a boolean (true/false)",
            }),
        };
        Ok(())
    }

    fn as_text(&self) -> String {
        self.to_string()
    }

    fn is_bool_flag(&self) -> bool {
        true
    }

    fn reset(&mut self) {
        *self = false;
    }

    fn clone_value(&self) -> Option<Box<dyn Value>> {
        Some(Box::new(*self))
    }
}

impl Value for String {
    fn set(&mut self, text: &str) -> Result<(), ValueError> {
        *self = text.to_string();
        Ok(())
    }

    fn as_text(&self) -> String {
        self.clone()
    }

    fn reset(&mut self) {
        self.clear();
    }

    fn clone_value(&self) -> Option<Box<dyn Value>> {
        Some(Box::new(self.clone()))
    }
}

fn parse_int(text: &str) -> Option<i128> {
    let (neg, rest) = match text.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, text),
    };
    let value = if let Some(h) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        i128::from_str_radix(h, 16).ok()?
    } else if let Some(o) = rest.strip_prefix("0o").or_else(|| rest.strip_prefix("0O")) {
        i128::from_str_radix(o, 8).ok()?
    } else if let Some(b) = rest.strip_prefix("0b").or_else(|| rest.strip_prefix("0B")) {
        i128::from_str_radix(b, 2).ok()?
    } else {
        rest.parse::<i128>().ok()?
    };
    Some(if neg { -value } else { value })
}

macro_rules! impl_value_for_signed {
    ($($t:ty),+ $(,)?) => {
        $(
            impl Value for $t {
                fn set(&mut self, text: &str) -> Result<(), ValueError> {
                    let parsed = parse_int(text).ok_or_else(|| ValueError::InvalidFormat {
                        text: text.to_string(),
                        expected: "an integer (decimal, 0x, 0o or 0b)",
                    })?;
                    *self = <$t>::try_from(parsed).map_err(|_| ValueError::InvalidFormat {
                        text: text.to_string(),
                        expected: concat!("a value fitting in ", stringify!($t)),
                    })?;
                    Ok(())
                }

                fn as_text(&self) -> String {
                    self.to_string()
                }

                fn clone_value(&self) -> Option<Box<dyn Value>> {
                    Some(Box::new(*self))
                }
            }
        )+
    };
}

macro_rules! impl_value_for_unsigned {
    ($($t:ty),+ $(,)?) => {
        $(
            impl Value for $t {
                fn set(&mut self, text: &str) -> Result<(), ValueError> {
                    let parsed = parse_int(text).ok_or_else(|| ValueError::InvalidFormat {
                        text: text.to_string(),
                        expected: "an unsigned integer (decimal, 0x, 0o or 0b)",
                    })?;
                    if parsed < 0 {
                        return Err(ValueError::InvalidFormat {
                            text: text.to_string(),
                            expected: "a non-negative integer",
                        });
                    }
                    *self = <$t>::try_from(parsed).map_err(|_| ValueError::InvalidFormat {
                        text: text.to_string(),
                        expected: concat!("a value fitting in ", stringify!($t)),
                    })?;
                    Ok(())
                }

                fn as_text(&self) -> String {
                    self.to_string()
                }

                fn clone_value(&self) -> Option<Box<dyn Value>> {
                    Some(Box::new(*self))
                }
            }
        )+
    };
}

impl_value_for_signed!(i8, i16, i32, i64, i128, isize);
impl_value_for_unsigned!(u8, u16, u32, u64, u128, usize);
impl_value_for_display_fromstr!(f32 => "a floating point number", f64 => "a floating point number");

impl Value for Duration {
    fn set(&mut self, text: &str) -> Result<(), ValueError> {
        *self = parse_duration(text).ok_or_else(|| ValueError::InvalidFormat {
            text: text.to_string(),
            expected: "a duration like '500ms', '2s', '1h30m'",
        })?;
        Ok(())
    }

    fn as_text(&self) -> String {
        format!("{}ns", self.as_nanos())
    }

    fn clone_value(&self) -> Option<Box<dyn Value>> {
        Some(Box::new(*self))
    }
}

/// Parse a lexical duration: a (possibly repeated) `<number><unit>` sequence, units `ns`,
/// `us`/`µs`, `ms`, `s`, `m`, `h`.
fn parse_duration(text: &str) -> Option<Duration> {
    if text.is_empty() {
        return None;
    }
    let mut total = Duration::new(0, 0);
    let mut rest = text;
    while !rest.is_empty() {
        let digits_end = rest.find(|c: char| !c.is_ascii_digit() && c != '.').unwrap_or(rest.len());
        if digits_end == 0 {
            return None;
        }
        let (number, after_number) = rest.split_at(digits_end);
        let number: f64 = number.parse().ok()?;
        let unit_end = after_number.find(|c: char| c.is_ascii_digit()).unwrap_or(after_number.len());
        let (unit, remaining) = after_number.split_at(unit_end);
        let nanos_per_unit: f64 = match unit {
            "ns" => 1.0,
            "us" | "\u{b5}s" => 1_000.0,
            "ms" => 1_000_000.0,
            "s" => 1_000_000_000.0,
            "m" => 60_000_000_000.0,
            "h" => 3_600_000_000_000.0,
            _ => return None,
        };
        let nanos = number * nanos_per_unit;
        total += Duration::from_nanos(nanos as u64);
        rest = remaining;
    }
    Some(total)
}

impl Value for IpAddr {
    fn set(&mut self, text: &str) -> Result<(), ValueError> {
        *self = text.parse().map_err(|_| ValueError::InvalidFormat {
            text: text.to_string(),
            expected: "an IP address",
        })?;
        Ok(())
    }

    fn as_text(&self) -> String {
        self.to_string()
    }

    fn clone_value(&self) -> Option<Box<dyn Value>> {
        Some(Box::new(*self))
    }
}

impl Value for Vec<String> {
    fn set(&mut self, text: &str) -> Result<(), ValueError> {
        self.push(text.to_string());
        Ok(())
    }

    fn as_text(&self) -> String {
        self.join(",")
    }

    fn synopsis(&self) -> Option<&'static str> {
        Some("VALUE,...")
    }

    fn reset(&mut self) {
        self.clear();
    }

    fn clone_value(&self) -> Option<Box<dyn Value>> {
        Some(Box::new(self.clone()))
    }
}

impl Value for Vec<u8> {
    fn set(&mut self, text: &str) -> Result<(), ValueError> {
        self.clear();
        self.extend_from_slice(text.as_bytes());
        Ok(())
    }

    fn as_text(&self) -> String {
        String::from_utf8_lossy(self).into_owned()
    }

    fn reset(&mut self) {
        self.clear();
    }

    fn set_data(&mut self, data: &[u8]) -> Result<(), ValueError> {
        self.extend_from_slice(data);
        Ok(())
    }

    fn clone_value(&self) -> Option<Box<dyn Value>> {
        Some(Box::new(self.clone()))
    }
}

impl Value for HashMap<String, String> {
    fn set(&mut self, text: &str) -> Result<(), ValueError> {
        let (key, value) = split_key_value(text);
        self.insert(key, value);
        Ok(())
    }

    fn as_text(&self) -> String {
        let mut parts: Vec<String> = self.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        parts.sort();
        parts.join(",")
    }

    fn synopsis(&self) -> Option<&'static str> {
        Some("KEY=VALUE,...")
    }

    fn reset(&mut self) {
        self.clear();
    }

    fn clone_value(&self) -> Option<Box<dyn Value>> {
        Some(Box::new(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_accepts_bare_form() {
        let mut b = false;
        Value::set(&mut b, "").unwrap();
        assert!(b);
    }

    #[test]
    fn int_detects_base() {
        let mut n: i64 = 0;
        Value::set(&mut n, "0x1F").unwrap();
        assert_eq!(n, 31);
        Value::set(&mut n, "0o17").unwrap();
        assert_eq!(n, 15);
        Value::set(&mut n, "0b101").unwrap();
        assert_eq!(n, 5);
        Value::set(&mut n, "-9").unwrap();
        assert_eq!(n, -9);
    }

    #[test]
    fn duration_parses_compound_form() {
        let mut d = Duration::new(0, 0);
        Value::set(&mut d, "1h30m").unwrap();
        assert_eq!(d, Duration::from_secs(90 * 60));
    }

    #[test]
    fn split_list_honours_escapes() {
        let parts = split_list(r"a\,b,c\\d,e");
        assert_eq!(parts, vec!["a,b".to_string(), r"c\d".to_string(), "e".to_string()]);
    }

    #[test]
    fn split_key_value_takes_first_equals() {
        let (k, v) = split_key_value("host=example.com=8080");
        assert_eq!(k, "host");
        assert_eq!(v, "example.com=8080");
    }

    #[test]
    fn round_trip_string_list() {
        let mut dest = Destination::string_list(Vec::new());
        dest.apply("a,b,c", false).unwrap();
        assert_eq!(dest.value().as_text(), "a,b,c");
    }

    #[test]
    fn disable_splitting_keeps_token_whole() {
        let mut disabled = Destination::string_list(Vec::new());
        disabled.apply("a,b,c", true).unwrap();
        assert_eq!(format!("{:?}", disabled.value), r#"["a,b,c"]"#);

        let mut enabled = Destination::string_list(Vec::new());
        enabled.apply("a,b,c", false).unwrap();
        assert_eq!(format!("{:?}", enabled.value), r#"["a", "b", "c"]"#);
    }
}
