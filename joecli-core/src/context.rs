// Copyright 2019 Lyndon Brown
//
// This file is part of the `joecli-core` command-line framework library.
//
// Licensed under the MIT license or the Apache license (version 2.0), at your option. You may not
// copy, modify, or distribute this file except in compliance with said license. You can find copies
// of these licenses either in the LICENSE-MIT and LICENSE-APACHE files, or alternatively at
// <http://opensource.org/licenses/MIT> and <http://www.apache.org/licenses/LICENSE-2.0>
// respectively.

//! The dispatch-time context
//!
//! One [`Context`] is handed to every action that runs during dispatch (spec §4.5). It bundles
//! the pieces an action typically needs: lookup of any visible flag/arg's parsed value (searching
//! up the ancestry chain, so a persistent flag declared on a parent command is visible to a
//! descendant's actions — the nearest-declaring ancestor wins), the raw occurrence record, the
//! resolved path, buffered I/O handles, a cooperative cancellation flag, and — during `Initial`
//! only — the ability to grow the tree.

use std::cell::Cell;
use std::collections::HashMap;
use std::io::{self, BufWriter, Write};
use std::rc::Rc;

use crate::arg::Arg;
use crate::bindings::{Bindings, Occurrence};
use crate::command::{Command, NodeId, Tree};
use crate::error::{DispatchError, InternalError};
use crate::flag::Flag;
use crate::pipeline::{Patch, Timing};
use crate::target::{Path, Target};
use crate::value::Value;

/// A shared, cooperative cancellation flag. Actions should check
/// [`Context::cancelled`] periodically during long-running work and return
/// [`DispatchError::Cancelled`] promptly once it is set.
#[derive(Clone, Default)]
pub struct CancellationToken(Rc<Cell<bool>>);

impl CancellationToken {
    /// A token that starts out not-cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; idempotent
    pub fn cancel(&self) {
        self.0.set(true);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

/// Buffered process I/O handles, so actions don't each pay for their own line-buffering
pub struct Stdio {
    stdout: Box<dyn Write>,
    stderr: Box<dyn Write>,
}

impl Default for Stdio {
    fn default() -> Self {
        Self {
            stdout: Box::new(BufWriter::new(io::stdout())),
            stderr: Box::new(BufWriter::new(io::stderr())),
        }
    }
}

impl Stdio {
    /// Construct from caller-supplied writers (tests substitute in-memory buffers here)
    pub fn with_writers(stdout: Box<dyn Write>, stderr: Box<dyn Write>) -> Self {
        Self { stdout, stderr }
    }
}

/// The per-action dispatch context
pub struct Context<'a> {
    tree: &'a mut Tree,
    node: NodeId,
    timing: Timing,
    path: Path,
    bindings: &'a Bindings,
    cancel: CancellationToken,
    stdio: &'a mut Stdio,
    templates: &'a mut HashMap<String, String>,
}

impl<'a> Context<'a> {
    /// Construct a context for dispatching `node` at stage `timing`
    pub fn new(
        tree: &'a mut Tree,
        node: NodeId,
        timing: Timing,
        bindings: &'a Bindings,
        cancel: CancellationToken,
        stdio: &'a mut Stdio,
        templates: &'a mut HashMap<String, String>,
    ) -> Self {
        let path = tree.path_of(node);
        Self { tree, node, timing, path, bindings, cancel, stdio, templates }
    }

    /// The node currently being dispatched
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The dispatch stage this context was created for
    pub fn timing(&self) -> Timing {
        self.timing
    }

    /// The resolved path to the node currently being dispatched
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read-only access to the tree
    pub fn tree(&self) -> &Tree {
        self.tree
    }

    /// Whether cancellation has been requested; long-running actions should poll this
    pub fn cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Request cancellation of the remaining dispatch
    pub fn request_cancel(&self) {
        self.cancel.cancel();
    }

    /// Buffered standard output
    pub fn stdout(&mut self) -> &mut dyn Write {
        &mut *self.stdio.stdout
    }

    /// Buffered standard error
    pub fn stderr(&mut self) -> &mut dyn Write {
        &mut *self.stdio.stderr
    }

    /// Look up a named template string previously registered with [`Context::set_template`]
    pub fn template(&self, key: &str) -> Option<&str> {
        self.templates.get(key).map(String::as_str)
    }

    /// Register (or replace) a named template string, consulted by help rendering
    pub fn set_template(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.templates.insert(key.into(), value.into());
    }

    /// Resolve a flag visible from the current node by name or alias, searching the current node
    /// and then its ancestors outward (nearest-declaring ancestor wins for persistent flags)
    pub fn resolve_flag(&self, name: &str) -> Option<NodeId> {
        for ancestor in self.tree.ancestors(self.node) {
            let command = match self.tree.get(ancestor).as_command() {
                Some(c) => c,
                None => continue,
            };
            for &flag_id in command.flags() {
                if let Some(flag) = self.tree.get(flag_id).as_flag() {
                    if flag.name() == name || flag.aliases().iter().any(|a| a == name) {
                        return Some(flag_id);
                    }
                }
            }
        }
        None
    }

    /// The parsed value of a visible flag, if it has a destination and was bound
    pub fn value(&self, name: &str) -> Option<&dyn Value> {
        let id = self.resolve_flag(name)?;
        self.tree.get(id).as_flag()?.destination().map(|d| d.value())
    }

    /// The raw occurrences recorded for a visible flag
    pub fn occurrences(&self, name: &str) -> &[Occurrence] {
        match self.resolve_flag(name) {
            Some(id) => self.bindings.occurrences(id),
            None => &[],
        }
    }

    /// How many times a visible flag occurred
    pub fn count(&self, name: &str) -> usize {
        self.occurrences(name).len()
    }

    /// Add a subcommand under the node currently being dispatched. Only legal during `Initial`.
    pub fn add_command(&mut self, command: Command) -> Result<NodeId, DispatchError> {
        self.require_initial()?;
        self.tree.add_command(self.node, command).map_err(|_| {
            DispatchError::Internal(InternalError::WrongNodeKind)
        })
    }

    /// Add a flag under the node currently being dispatched. Only legal during `Initial`.
    pub fn add_flag(&mut self, flag: Flag) -> Result<NodeId, DispatchError> {
        self.require_initial()?;
        self.tree.add_flag(self.node, flag).map_err(|_| {
            DispatchError::Internal(InternalError::WrongNodeKind)
        })
    }

    /// Add a positional arg under the node currently being dispatched. Only legal during
    /// `Initial`.
    pub fn add_arg(&mut self, arg: Arg) -> Result<NodeId, DispatchError> {
        self.require_initial()?;
        self.tree.add_arg(self.node, arg).map_err(|_| {
            DispatchError::Internal(InternalError::WrongNodeKind)
        })
    }

    fn require_initial(&self) -> Result<(), DispatchError> {
        if self.timing != Timing::Initial {
            return Err(DispatchError::StructuralMutationOutsideInitial);
        }
        Ok(())
    }

    /// Apply a declarative [`Patch`] to the node currently being dispatched
    pub(crate) fn apply_patch(&mut self, patch: &Patch) -> Result<(), DispatchError> {
        let node = self.tree.get_mut(self.node);
        match patch {
            Patch::Hidden(v) => {
                node.as_target_mut().bits_mut().set_hidden(*v);
            }
            Patch::Required(v) => {
                node.as_target_mut().bits_mut().set_required(*v);
            }
            Patch::Help(text) => match node {
                crate::command::NodeKind::Command(c) => {
                    c.set_help(text.clone());
                }
                crate::command::NodeKind::Flag(f) => {
                    f.set_help(text.clone());
                }
                crate::command::NodeKind::Arg(a) => {
                    a.set_help(text.clone());
                }
            },
            Patch::Category(text) => match node {
                crate::command::NodeKind::Command(c) => {
                    c.set_category(text.clone());
                }
                crate::command::NodeKind::Flag(f) => {
                    f.set_category(text.clone());
                }
                crate::command::NodeKind::Arg(a) => {
                    a.set_category(text.clone());
                }
            },
            Patch::OptionalDefault(text) => match node {
                crate::command::NodeKind::Flag(f) => {
                    f.set_optional_default(text.clone());
                }
                _ => return Err(DispatchError::Internal(InternalError::WrongNodeKind)),
            },
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Destination;

    fn fresh() -> (Tree, Bindings, CancellationToken, Stdio, HashMap<String, String>) {
        (Tree::new("app"), Bindings::new(), CancellationToken::new(), Stdio::with_writers(Box::new(Vec::new()), Box::new(Vec::new())), HashMap::new())
    }

    #[test]
    fn resolves_flag_on_current_command() {
        let (mut tree, bindings, cancel, mut stdio, mut templates) = fresh();
        let root = tree.root();
        let mut flag = Flag::new("verbose");
        flag.set_destination(Destination::boolean(false));
        tree.add_flag(root, flag).unwrap();
        let ctx = Context::new(&mut tree, root, Timing::Action, &bindings, cancel, &mut stdio, &mut templates);
        assert!(ctx.resolve_flag("verbose").is_some());
        assert!(ctx.resolve_flag("missing").is_none());
    }

    #[test]
    fn structural_mutation_rejected_outside_initial() {
        let (mut tree, bindings, cancel, mut stdio, mut templates) = fresh();
        let root = tree.root();
        let mut ctx = Context::new(&mut tree, root, Timing::Action, &bindings, cancel, &mut stdio, &mut templates);
        let result = ctx.add_flag(Flag::new("late"));
        assert!(matches!(result, Err(DispatchError::StructuralMutationOutsideInitial)));
    }

    #[test]
    fn structural_mutation_allowed_during_initial() {
        let (mut tree, bindings, cancel, mut stdio, mut templates) = fresh();
        let root = tree.root();
        let mut ctx = Context::new(&mut tree, root, Timing::Initial, &bindings, cancel, &mut stdio, &mut templates);
        assert!(ctx.add_flag(Flag::new("early")).is_ok());
    }
}
