// Copyright 2019 Lyndon Brown
//
// This file is part of the `joecli-core` command-line framework library.
//
// Licensed under the MIT license or the Apache license (version 2.0), at your option. You may not
// copy, modify, or distribute this file except in compliance with said license. You can find copies
// of these licenses either in the LICENSE-MIT and LICENSE-APACHE files, or alternatively at
// <http://opensource.org/licenses/MIT> and <http://www.apache.org/licenses/LICENSE-2.0>
// respectively.

//! The binding map
//!
//! Parsing produces a [`Bindings`] map (spec §3 "Binding map") before any destination is touched:
//! for every flag or arg that appeared, the raw tokens it was handed, in the order they were
//! handed over. This is then "applied" to value destinations as a separate step (see
//! `parser::apply_bindings`), which is what lets `Before`-stage actions inspect occurrence counts
//! and raw text before any `Value::set` has run.

use std::collections::HashMap;

use crate::command::NodeId;

/// Where a flag obtained one piece of data from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataLocation {
    /// Taken directly from the command line
    CommandLine,
    /// Read from a file because of `FileReference`/`AllowFileReference`
    File,
    /// Read from an environment variable (spec §4.4 "Sources")
    Environment,
}

/// One appearance of a flag or arg on the command line (or equivalent source), holding every raw
/// token handed to it and where the first of them came from.
#[derive(Debug, Clone)]
pub struct Occurrence {
    tokens: Vec<String>,
    location: DataLocation,
}

impl Occurrence {
    /// Construct an occurrence from its first token
    pub fn new(first_token: impl Into<String>, location: DataLocation) -> Self {
        Self { tokens: vec![first_token.into()], location }
    }

    /// Append an additional raw token (a multi-value arg/flag consuming more than one)
    pub fn push(&mut self, token: impl Into<String>) {
        self.tokens.push(token.into());
    }

    /// The raw tokens, in the order the parser collected them
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// The pseudo-name slot: by convention the first token recorded for a flag carries no
    /// standalone meaning beyond ordering, so callers wanting "the value" should prefer
    /// [`Occurrence::tokens`] and join/iterate as the destination's [`Arity`](crate::value::Arity)
    /// dictates.
    pub fn first(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }

    /// Where this occurrence's data originated
    pub fn location(&self) -> DataLocation {
        self.location
    }
}

/// Insertion-order-preserving map from a target's [`NodeId`] to every occurrence it received
/// during one parse.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    order: Vec<NodeId>,
    by_node: HashMap<NodeId, Vec<Occurrence>>,
}

impl Bindings {
    /// An empty binding map
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new occurrence for `node`
    pub fn record(&mut self, node: NodeId, occurrence: Occurrence) {
        let is_new = !self.by_node.contains_key(&node);
        let entry = self.by_node.entry(node).or_default();
        if is_new {
            self.order.push(node);
        }
        entry.push(occurrence);
    }

    /// Push a raw token for `node`: starts a fresh occurrence the first time `node` is seen,
    /// and appends to the most recent occurrence on every later call. This is what a parser uses
    /// to build up a multi-token arg or a flag repeated on the command line without tracking
    /// occurrence boundaries itself.
    pub fn push_token(&mut self, node: NodeId, token: impl Into<String>, location: DataLocation) {
        let is_new = !self.by_node.contains_key(&node);
        let entries = self.by_node.entry(node).or_default();
        if is_new {
            self.order.push(node);
        }
        match entries.last_mut() {
            Some(last) => last.push(token),
            None => entries.push(Occurrence::new(token, location)),
        }
    }

    /// Start a brand new occurrence for `node`, even if one already exists (used when a flag is
    /// repeated on the command line and each repetition should count separately, e.g. `-vvv`)
    pub fn push_new_occurrence(&mut self, node: NodeId, token: impl Into<String>, location: DataLocation) {
        let is_new = !self.by_node.contains_key(&node);
        let entries = self.by_node.entry(node).or_default();
        if is_new {
            self.order.push(node);
        }
        entries.push(Occurrence::new(token, location));
    }

    /// All occurrences recorded for `node`, in arrival order
    pub fn occurrences(&self, node: NodeId) -> &[Occurrence] {
        self.by_node.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether `node` appeared at all
    pub fn contains(&self, node: NodeId) -> bool {
        self.by_node.contains_key(&node)
    }

    /// Number of occurrences recorded for `node`
    pub fn count(&self, node: NodeId) -> usize {
        self.by_node.get(&node).map(Vec::len).unwrap_or(0)
    }

    /// Every node that received at least one occurrence, in first-arrival order
    pub fn bound_nodes(&self) -> &[NodeId] {
        &self.order
    }
}
