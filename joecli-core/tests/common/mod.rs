// Copyright 2019 Lyndon Brown
//
// This file is part of the `joecli-core` command-line framework library.
//
// Licensed under the MIT license or the Apache license (version 2.0), at your option. You may not
// copy, modify, or distribute this file except in compliance with said license. You can find copies
// of these licenses either in the LICENSE-MIT and LICENSE-APACHE files, or alternatively at
// <http://opensource.org/licenses/MIT> and <http://www.apache.org/licenses/LICENSE-2.0>
// respectively.

//! Shared fixtures for the black-box integration tests (mirrors `gong`'s own
//! `tests/common/mod.rs` + `tests/common/base.rs` split: a base tree most tests build on, plus a
//! couple of small conversion helpers).

#![allow(dead_code)]

use joecli_core::arg::Arg;
use joecli_core::command::{Command, NodeId, Tree};
use joecli_core::context::Context;
use joecli_core::error::DispatchError;
use joecli_core::flag::Flag;
use joecli_core::pipeline::{Action, Timing};
use joecli_core::value::Destination;

/// Turn a slice of `&str` into the owned `Vec<String>` (with leading program name) that
/// [`joecli_core::parser::parse`]/[`joecli_core::dispatch::Dispatcher::dispatch`] expect.
pub fn argv(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

/// Attach a plain callback to one node's pipeline at `timing`, for tests that need to observe
/// dispatch ordering or count invocations.
pub fn push_action(
    tree: &mut Tree,
    node: NodeId,
    timing: Timing,
    f: impl Fn(&mut Context) -> Result<(), DispatchError> + 'static,
) {
    tree.get_mut(node).as_target_mut().pipelines_mut().push(timing, Action::callback(f));
}

/// A base tree exercising one of each common declaration: a string flag (`--flag`/no short), an
/// optional `<kind>` positional, a `generate` subcommand with its own `<kind>` positional, and a
/// clustering boolean short flag `-v`. Several scenario tests build their own narrower trees
/// instead of this one where the positional shape needs to be exact (e.g. a `RemainingUntilFlag`
/// arg that must be the only positional on the command).
pub struct BaseTree {
    pub tree: Tree,
    pub root: NodeId,
    pub flag: NodeId,
    pub kind_arg: NodeId,
    pub generate: NodeId,
    pub generate_kind_arg: NodeId,
    pub verbose: NodeId,
}

pub fn base_tree() -> BaseTree {
    let mut tree = Tree::new("app");
    let root = tree.root();

    let mut flag = Flag::new("flag");
    flag.set_destination(Destination::string(""));
    let flag = tree.add_flag(root, flag).unwrap();

    let mut kind = Arg::new("kind");
    kind.set_destination(Destination::string(""));
    let kind_arg = tree.add_arg(root, kind).unwrap();

    let verbose = tree.add_flag(root, Flag::new("v")).unwrap();

    let generate = tree.add_command(root, Command::new("generate")).unwrap();
    let mut generate_kind = Arg::new("kind");
    generate_kind.set_destination(Destination::string(""));
    let generate_kind_arg = tree.add_arg(generate, generate_kind).unwrap();

    tree.freeze();

    BaseTree { tree, root, flag, kind_arg, generate, generate_kind_arg, verbose }
}

/// Fetch a flag's destination as text, panicking (test-only helper) if the node isn't a flag with
/// an attached destination.
pub fn flag_text(tree: &Tree, id: NodeId) -> String {
    tree.get(id).as_flag().expect("flag node").destination().expect("destination").value().as_text()
}

/// Fetch an arg's destination as text.
pub fn arg_text(tree: &Tree, id: NodeId) -> String {
    tree.get(id).as_arg().expect("arg node").destination().expect("destination").value().as_text()
}
