// Copyright 2018 Lyndon Brown
//
// This file is part of the `joecli-core` command-line framework library.
//
// Licensed under the MIT license or the Apache license (version 2.0), at your option. You may not
// copy, modify, or distribute this file except in compliance with said license. You can find copies
// of these licenses either in the LICENSE-MIT and LICENSE-APACHE files, or alternatively at
// <http://opensource.org/licenses/MIT> and <http://www.apache.org/licenses/LICENSE-2.0>
// respectively.

//! The polymorphic target trait and path
//!
//! Spec §9 design note: model [`Command`](../command/struct.Command.html),
//! [`Flag`](../flag/struct.Flag.html) and [`Arg`](../arg/struct.Arg.html) as a tagged variant plus a
//! small trait exposing the handful of properties the parser and dispatcher actually need, so that
//! they can walk the tree without caring which kind of node they are looking at.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use crate::bits::Bits;
use crate::pipeline::Pipelines;

/// Arbitrary per-target data map (spec §3 "Command" — "arbitrary data map")
#[derive(Default)]
pub struct DataMap {
    entries: HashMap<String, Box<dyn Any>>,
}

impl fmt::Debug for DataMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataMap").field("keys", &self.entries.keys().collect::<Vec<_>>()).finish()
    }
}

impl DataMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value under `key`, returning any previous value of the same type
    pub fn insert<T: 'static>(&mut self, key: impl Into<String>, value: T) {
        self.entries.insert(key.into(), Box::new(value));
    }

    /// Look up a value by key, downcasting to `T`
    pub fn get<T: 'static>(&self, key: &str) -> Option<&T> {
        self.entries.get(key).and_then(|v| v.downcast_ref::<T>())
    }

    /// Whether any value (of any type) is stored under `key`
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

/// The properties common to [`Command`](../command/struct.Command.html),
/// [`Flag`](../flag/struct.Flag.html) and [`Arg`](../arg/struct.Arg.html), exposed so the parser
/// and dispatcher can operate on any of them without matching on the concrete kind.
pub trait Target {
    /// Primary name
    fn name(&self) -> &str;
    /// Additional names (aliases); for flags, single-character entries are short names and
    /// multi-character entries are long names, in declaration order
    fn aliases(&self) -> &[String];
    /// The option bitset
    fn bits(&self) -> &Bits;
    /// Mutable access to the option bitset
    fn bits_mut(&mut self) -> &mut Bits;
    /// The four timed pipelines
    fn pipelines(&self) -> &Pipelines;
    /// Mutable access to the four timed pipelines
    fn pipelines_mut(&mut self) -> &mut Pipelines;
    /// The arbitrary data map
    fn data(&self) -> &DataMap;
    /// Mutable access to the arbitrary data map
    fn data_mut(&mut self) -> &mut DataMap;
}

/// Canonical long name: the first multi-character name from `{name} ∪ aliases`
pub fn canonical_long_name<'a>(primary: &'a str, aliases: &'a [String]) -> Option<&'a str> {
    std::iter::once(primary).chain(aliases.iter().map(String::as_str)).find(|n| n.chars().count() > 1)
}

/// Canonical short name: the first single-character name from `{name} ∪ aliases`
pub fn canonical_short_name<'a>(primary: &'a str, aliases: &'a [String]) -> Option<char> {
    std::iter::once(primary)
        .chain(aliases.iter().map(String::as_str))
        .find(|n| n.chars().count() == 1)
        .and_then(|n| n.chars().next())
}

/// A node's position in the command tree: root command, any descended subcommands, and a trailing
/// flag/arg name (decorated with `-`/`--`/`<>` per spec §3 "Path").
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    /// An empty path (the root, with nothing pushed yet)
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a command name
    pub fn push_command(&mut self, name: &str) {
        self.segments.push(name.to_string());
    }

    /// Push a flag name, decorated `--name` (or `-c` for a single character canonical name)
    pub fn push_flag(&mut self, long: Option<&str>, short: Option<char>) {
        let seg = match (long, short) {
            (Some(l), _) => format!("--{}", l),
            (None, Some(c)) => format!("-{}", c),
            (None, None) => "--?".to_string(),
        };
        self.segments.push(seg);
    }

    /// Push an arg name, decorated `<name>`
    pub fn push_arg(&mut self, name: &str) {
        self.segments.push(format!("<{}>", name));
    }

    /// Render as a diagnostic string, e.g. `app generate --output <kind>`
    pub fn render(&self) -> String {
        self.segments.join(" ")
    }

    /// The segments, in root-to-leaf order
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}
