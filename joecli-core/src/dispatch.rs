// Copyright 2019 Lyndon Brown
//
// This file is part of the `joecli-core` command-line framework library.
//
// Licensed under the MIT license or the Apache license (version 2.0), at your option. You may not
// copy, modify, or distribute this file except in compliance with said license. You can find copies
// of these licenses either in the LICENSE-MIT and LICENSE-APACHE files, or alternatively at
// <http://opensource.org/licenses/MIT> and <http://www.apache.org/licenses/LICENSE-2.0>
// respectively.

//! The staged dispatcher
//!
//! Drives a [`Tree`] through its full lifecycle (spec §4.5): `Initial` grows the tree from the
//! application root down, breadth-first, letting each node's own `Initial` actions register
//! further children before the tree is frozen; parsing then resolves a command path and binding
//! map; `Before` and `Action` run root-to-leaf over that path (and the flags/args bound or
//! required along it), with `Action` additionally supporting per-occurrence replay and an early
//! `exits` short-circuit (`--help`, `--version`); `After` runs the same list in reverse.

use std::collections::{HashMap, HashSet};

use crate::bindings::Bindings;
use crate::command::{NodeId, Tree};
use crate::context::{CancellationToken, Context, Stdio};
use crate::error::{DispatchError, ParseError};
use crate::pipeline::Timing;

/// Drives one [`Tree`] through `Initial`, parsing, and the `Before`/`Action`/`After` stages.
pub struct Dispatcher {
    tree: Tree,
}

impl Dispatcher {
    /// Wrap a freshly built (not-yet-initialised) tree
    pub fn new(tree: Tree) -> Self {
        Self { tree }
    }

    /// Read-only access to the underlying tree, e.g. for rendering help text after dispatch
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Run `Initial` for the root and every descendant it (transitively) registers, then freeze
    /// the tree against further structural mutation.
    pub fn run_initial(&mut self) -> Result<(), DispatchError> {
        let empty_bindings = Bindings::new();
        let cancel = CancellationToken::new();
        let mut stdio = Stdio::default();
        let mut templates = HashMap::new();

        let mut queue = vec![self.tree.root()];
        let mut i = 0;
        while i < queue.len() {
            let node = queue[i];
            i += 1;

            let actions = self.tree.get(node).as_target().pipelines().stage(Timing::Initial).to_vec();
            for action in &actions {
                let mut ctx = Context::new(
                    &mut self.tree,
                    node,
                    Timing::Initial,
                    &empty_bindings,
                    cancel.clone(),
                    &mut stdio,
                    &mut templates,
                );
                action.run(&mut ctx)?;
            }

            if let Some(cmd) = self.tree.get(node).as_command() {
                for &child in cmd.subcommands().iter().chain(cmd.flags()).chain(cmd.args()) {
                    if !queue.contains(&child) {
                        queue.push(child);
                    }
                }
            }
        }

        self.tree.freeze();
        Ok(())
    }

    /// Parse `args` and run the full `Before`/`Action`/`After` sequence
    pub fn dispatch(&mut self, args: &[String]) -> Result<(), DispatchError> {
        if !self.tree.is_frozen() {
            self.run_initial()?;
        }

        let mut outcome = crate::parser::parse(&self.tree, args)?;
        crate::parser::apply_defaults(&self.tree, &outcome.command_path, &mut outcome.bindings);
        crate::parser::apply_bindings(&mut self.tree, &outcome.bindings)?;
        check_required(&self.tree, &outcome.command_path, &outcome.bindings)?;

        let order = build_dispatch_order(&self.tree, &outcome.command_path, &outcome.bindings);
        let cancel = CancellationToken::new();
        let mut stdio = Stdio::default();
        let mut templates = HashMap::new();

        // Error propagation (spec §4.5 "Error propagation"): a Before failure skips only that
        // node's Action and is remembered as the first error, but does not stop Before/Action from
        // running for the rest of the path; an Action failure short-circuits further repeats of
        // that same node (its `EachOccurrence` siblings) without touching other nodes; After always
        // runs, leaf-to-root, over the full order, collecting without short-circuiting; the first
        // error encountered anywhere is what dispatch ultimately returns. `Exits` remains a clean
        // early stop bypassing all of this, including After.
        let mut first_error: Option<DispatchError> = None;
        let mut skip_action: HashSet<NodeId> = HashSet::new();

        for &node in &order {
            if let Err(e) = self.run_stage(node, Timing::Before, &outcome.bindings, &cancel, &mut stdio, &mut templates) {
                first_error.get_or_insert(e);
                skip_action.insert(node);
            }
        }

        'action: for &node in &order {
            if skip_action.contains(&node) {
                continue;
            }
            let bits = *self.tree.get(node).as_target().bits();
            let occurrences = outcome.bindings.occurrences(node).to_vec();
            let repeats = if bits.each_occurrence { occurrences.len().max(1) } else { 1 };
            for i in 0..repeats {
                if bits.each_occurrence {
                    if let Some(occurrence) = occurrences.get(i) {
                        if let Err(e) = crate::parser::apply_occurrence(&mut self.tree, node, occurrence) {
                            first_error.get_or_insert(e.into());
                            break;
                        }
                    }
                }
                if let Err(e) = self.run_stage(node, Timing::Action, &outcome.bindings, &cancel, &mut stdio, &mut templates) {
                    first_error.get_or_insert(e);
                    break;
                }
                if cancel.is_cancelled() {
                    first_error.get_or_insert(DispatchError::Cancelled);
                    break 'action;
                }
                if bits.exits {
                    return Ok(());
                }
            }
        }

        for &node in order.iter().rev() {
            if let Err(e) = self.run_stage(node, Timing::After, &outcome.bindings, &cancel, &mut stdio, &mut templates) {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn run_stage(
        &mut self,
        node: NodeId,
        timing: Timing,
        bindings: &Bindings,
        cancel: &CancellationToken,
        stdio: &mut Stdio,
        templates: &mut HashMap<String, String>,
    ) -> Result<(), DispatchError> {
        let actions = self.tree.get(node).as_target().pipelines().stage(timing).to_vec();
        for action in &actions {
            let mut ctx = Context::new(&mut self.tree, node, timing, bindings, cancel.clone(), stdio, templates);
            action.run(&mut ctx)?;
        }
        Ok(())
    }
}

/// The flat, root-to-leaf sequence of nodes `Before`/`Action` run over: for every command on the
/// resolved path, its bound-or-required flags, then its bound-or-required args, then the command
/// itself.
fn build_dispatch_order(tree: &Tree, command_path: &[NodeId], bindings: &Bindings) -> Vec<NodeId> {
    let mut order = Vec::new();
    for &cmd_id in command_path {
        let cmd = match tree.get(cmd_id).as_command() {
            Some(c) => c,
            None => continue,
        };
        for &flag_id in cmd.flags() {
            if bindings.contains(flag_id) || tree.get(flag_id).as_target().bits().required {
                order.push(flag_id);
            }
        }
        for &arg_id in cmd.args() {
            if bindings.contains(arg_id) || tree.get(arg_id).as_target().bits().required {
                order.push(arg_id);
            }
        }
        order.push(cmd_id);
    }
    order
}

/// Validate that every `required` flag/arg along the path was bound, and that a leaf command
/// demanding `required_subcommand` actually had one selected (spec §4.5 "Before: validation")
fn check_required(tree: &Tree, command_path: &[NodeId], bindings: &Bindings) -> Result<(), ParseError> {
    for (depth, &cmd_id) in command_path.iter().enumerate() {
        let cmd = match tree.get(cmd_id).as_command() {
            Some(c) => c,
            None => continue,
        };
        for &flag_id in cmd.flags() {
            let flag = tree.get(flag_id).as_flag().expect("flag node");
            if flag.bits().required && !bindings.contains(flag_id) {
                return Err(ParseError::RequiredTargetMissing {
                    name: flag.name().to_string(),
                    path: tree.path_of(flag_id),
                });
            }
        }
        for &arg_id in cmd.args() {
            let arg = tree.get(arg_id).as_arg().expect("arg node");
            if arg.bits().required && !bindings.contains(arg_id) {
                return Err(ParseError::RequiredTargetMissing {
                    name: arg.name().to_string(),
                    path: tree.path_of(arg_id),
                });
            }
        }
        let is_leaf = depth == command_path.len() - 1;
        if is_leaf && cmd.bits().required_subcommand && !cmd.subcommands().is_empty() {
            return Err(ParseError::RequiredTargetMissing {
                name: "<subcommand>".to_string(),
                path: tree.path_of(cmd_id),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flag::Flag;
    use crate::target::Target;

    #[test]
    fn dispatch_order_includes_only_bound_or_required_targets() {
        let mut tree = Tree::new("app");
        let root = tree.root();
        let bound = tree.add_flag(root, Flag::new("output")).unwrap();
        let mut required_flag = Flag::new("mode");
        required_flag.bits_mut().set_required(true);
        let required = tree.add_flag(root, required_flag).unwrap();
        let unbound = tree.add_flag(root, Flag::new("quiet")).unwrap();
        tree.freeze();

        let mut bindings = Bindings::new();
        bindings.push_new_occurrence(bound, "x", crate::bindings::DataLocation::CommandLine);

        let order = build_dispatch_order(&tree, &[root], &bindings);
        assert!(order.contains(&bound));
        assert!(order.contains(&required));
        assert!(!order.contains(&unbound));
    }

    #[test]
    fn after_runs_even_when_action_fails() {
        use crate::pipeline::Action;
        use std::cell::Cell;
        use std::rc::Rc;

        let after_ran = Rc::new(Cell::new(false));
        let mut tree = Tree::new("app");
        let root = tree.root();
        tree.get_mut(root).as_target_mut().pipelines_mut().push(
            Timing::Action,
            Action::callback(|_ctx| Err(DispatchError::Action { path: crate::target::Path::new(), message: "boom".into() })),
        );
        let after_ran_clone = after_ran.clone();
        tree.get_mut(root).as_target_mut().pipelines_mut().push(
            Timing::After,
            Action::callback(move |_ctx| {
                after_ran_clone.set(true);
                Ok(())
            }),
        );
        tree.freeze();

        let mut dispatcher = Dispatcher::new(tree);
        let result = dispatcher.dispatch(&[String::from("app")]);
        assert!(result.is_err());
        assert!(after_ran.get());
    }

    #[test]
    fn before_failure_on_one_node_does_not_skip_sibling_action() {
        use crate::pipeline::Action;
        use std::cell::Cell;
        use std::rc::Rc;

        let mut tree = Tree::new("app");
        let root = tree.root();
        let mut mode_flag = Flag::new("mode");
        mode_flag.set_destination(crate::value::Destination::string(""));
        let flag_id = tree.add_flag(root, mode_flag).unwrap();
        tree.get_mut(flag_id).as_target_mut().pipelines_mut().push(
            Timing::Before,
            Action::callback(|_ctx| Err(DispatchError::Action { path: crate::target::Path::new(), message: "bad mode".into() })),
        );
        let root_action_ran = Rc::new(Cell::new(false));
        let clone = root_action_ran.clone();
        tree.get_mut(root).as_target_mut().pipelines_mut().push(
            Timing::Action,
            Action::callback(move |_ctx| {
                clone.set(true);
                Ok(())
            }),
        );
        tree.freeze();

        let mut dispatcher = Dispatcher::new(tree);
        let result = dispatcher.dispatch(&[String::from("app"), String::from("--mode=x")]);
        assert!(result.is_err());
        assert!(root_action_ran.get());
    }
}
