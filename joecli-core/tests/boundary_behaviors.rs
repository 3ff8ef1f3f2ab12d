// Copyright 2019 Lyndon Brown
//
// This file is part of the `joecli-core` command-line framework library.
//
// Licensed under the MIT license or the Apache license (version 2.0), at your option. You may not
// copy, modify, or distribute this file except in compliance with said license. You can find copies
// of these licenses either in the LICENSE-MIT and LICENSE-APACHE files, or alternatively at
// <http://opensource.org/licenses/MIT> and <http://www.apache.org/licenses/LICENSE-2.0>
// respectively.

//! Black-box coverage of boundary behaviours: the `--` positional-only terminator, the two
//! "take everything" positional policies, environment-variable defaults only being consulted when
//! a flag went unseen, and `EachOccurrence` replaying an `Action` once per occurrence.

mod common;

use std::cell::Cell;
use std::rc::Rc;

use joecli_core::arg::Arg;
use joecli_core::command::Tree;
use joecli_core::counter::NArg;
use joecli_core::dispatch::Dispatcher;
use joecli_core::flag::Flag;
use joecli_core::pipeline::{Action, Timing};
use joecli_core::target::Target;
use joecli_core::value::Destination;

use common::{argv, base_tree, flag_text, push_action};

#[test]
fn double_dash_stops_flag_scanning_and_remaining_tokens_are_literal() {
    let mut tree = Tree::new("app");
    let root = tree.root();

    let verbose = tree.add_flag(root, Flag::new("v")).unwrap();

    let mut extra = Arg::new("extra");
    extra.set_narg(NArg::RemainingAll).set_destination(Destination::string_list(Vec::new()));
    let extra_id = tree.add_arg(root, extra).unwrap();

    tree.freeze();

    let mut dispatcher = Dispatcher::new(tree);
    dispatcher.dispatch(&argv(&["app", "-v", "--", "-x", "--weird"])).unwrap();

    assert_eq!(
        dispatcher.tree().get(root).as_target().pipelines().has_stage(Timing::Before),
        false,
    );
    let bindings_count_source = dispatcher.tree().get(verbose).as_flag().unwrap();
    let _ = bindings_count_source;
    assert_eq!(
        dispatcher.tree().get(extra_id).as_arg().unwrap().destination().unwrap().value().as_text(),
        "-x,--weird",
    );
}

#[test]
fn remaining_until_flag_and_remaining_all_differ_on_flag_looking_tokens() {
    let mut until_flag_tree = Tree::new("app");
    let root = until_flag_tree.root();
    let mut files = Arg::new("files");
    files.set_narg(NArg::RemainingUntilFlag).set_destination(Destination::string_list(Vec::new()));
    let files_id = until_flag_tree.add_arg(root, files).unwrap();
    until_flag_tree.add_flag(root, Flag::new("verbose")).unwrap();
    until_flag_tree.freeze();

    let outcome =
        joecli_core::parser::parse(&until_flag_tree, &argv(&["app", "a.txt", "b.txt", "--verbose"])).unwrap();
    assert_eq!(outcome.bindings.occurrences(files_id)[0].tokens().len(), 2);

    let mut remaining_all_tree = Tree::new("app");
    let root = remaining_all_tree.root();
    let mut all = Arg::new("rest");
    all.set_narg(NArg::RemainingAll).set_destination(Destination::string_list(Vec::new()));
    let all_id = remaining_all_tree.add_arg(root, all).unwrap();
    remaining_all_tree.freeze();

    let outcome =
        joecli_core::parser::parse(&remaining_all_tree, &argv(&["app", "a.txt", "-x", "b.txt"])).unwrap();
    assert_eq!(outcome.bindings.occurrences(all_id)[0].tokens().len(), 3);
}

#[test]
fn env_var_default_is_ignored_once_the_flag_was_seen_on_the_command_line() {
    let mut tree = Tree::new("app");
    let root = tree.root();
    let mut flag = Flag::new("token");
    flag.add_env_var("JOECLI_CORE_BOUNDARY_TOKEN_VAR").set_destination(Destination::string(""));
    let flag_id = tree.add_flag(root, flag).unwrap();
    tree.freeze();

    std::env::set_var("JOECLI_CORE_BOUNDARY_TOKEN_VAR", "from-env");
    let mut dispatcher = Dispatcher::new(tree);
    dispatcher.dispatch(&argv(&["app", "--token=from-cli"])).unwrap();
    std::env::remove_var("JOECLI_CORE_BOUNDARY_TOKEN_VAR");

    assert_eq!(flag_text(dispatcher.tree(), flag_id), "from-cli");
}

#[test]
fn env_var_default_is_used_once_the_flag_went_unseen() {
    let mut tree = Tree::new("app");
    let root = tree.root();
    let mut flag = Flag::new("token");
    flag.add_env_var("JOECLI_CORE_BOUNDARY_TOKEN_VAR2").set_destination(Destination::string(""));
    let flag_id = tree.add_flag(root, flag).unwrap();
    tree.freeze();

    std::env::set_var("JOECLI_CORE_BOUNDARY_TOKEN_VAR2", "from-env");
    let mut dispatcher = Dispatcher::new(tree);
    dispatcher.dispatch(&argv(&["app"])).unwrap();
    std::env::remove_var("JOECLI_CORE_BOUNDARY_TOKEN_VAR2");

    assert_eq!(flag_text(dispatcher.tree(), flag_id), "from-env");
}

#[test]
fn each_occurrence_replays_the_action_callback_once_per_occurrence() {
    let calls = Rc::new(Cell::new(0usize));
    let mut base = base_tree();
    let root = base.root;
    base.tree.get_mut(base.verbose).as_target_mut().bits_mut().set_each_occurrence(true);
    let calls_clone = calls.clone();
    push_action(&mut base.tree, base.verbose, Timing::Action, move |_ctx| {
        calls_clone.set(calls_clone.get() + 1);
        Ok(())
    });
    let _ = root;

    let mut dispatcher = Dispatcher::new(base.tree);
    dispatcher.dispatch(&argv(&["app", "-vvv"])).unwrap();
    assert_eq!(calls.get(), 3);
}

#[test]
fn each_occurrence_runs_action_once_when_the_flag_was_not_given() {
    let calls = Rc::new(Cell::new(0usize));
    let mut base = base_tree();
    base.tree.get_mut(base.verbose).as_target_mut().bits_mut().set_each_occurrence(true);
    let calls_clone = calls.clone();
    push_action(&mut base.tree, base.verbose, Timing::Action, move |_ctx| {
        calls_clone.set(calls_clone.get() + 1);
        Ok(())
    });

    let mut dispatcher = Dispatcher::new(base.tree);
    dispatcher.dispatch(&argv(&["app"])).unwrap();
    assert_eq!(calls.get(), 0);
}

#[allow(dead_code)]
fn action_constructor_is_reachable() -> Action {
    Action::callback(|_ctx| Ok(()))
}
