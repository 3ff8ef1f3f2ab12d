// Copyright 2019 Lyndon Brown
//
// This file is part of the `joecli-core` command-line framework library.
//
// Licensed under the MIT license or the Apache license (version 2.0), at your option. You may not
// copy, modify, or distribute this file except in compliance with said license. You can find copies
// of these licenses either in the LICENSE-MIT and LICENSE-APACHE files, or alternatively at
// <http://opensource.org/licenses/MIT> and <http://www.apache.org/licenses/LICENSE-2.0>
// respectively.

//! Black-box coverage of the numbered end-to-end scenarios: a flag and a positional binding
//! together, a subcommand carrying its own positional with full stage ordering, short-flag
//! clustering, a "take everything up to the next flag" positional paired with a boolean flag, an
//! optional-value flag across its three invocation shapes, and an `@file`-reference flag.

mod common;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use joecli_core::arg::Arg;
use joecli_core::command::Tree;
use joecli_core::counter::NArg;
use joecli_core::dispatch::Dispatcher;
use joecli_core::flag::Flag;
use joecli_core::pipeline::Timing;
use joecli_core::target::Target;
use joecli_core::value::Destination;

use common::{argv, arg_text, base_tree, flag_text, push_action};

#[test]
fn flag_and_positional_bind_together() {
    let base = base_tree();
    let (flag, kind_arg) = (base.flag, base.kind_arg);
    let mut dispatcher = Dispatcher::new(base.tree);
    dispatcher.dispatch(&argv(&["app", "--flag=f_value", "arg_value"])).unwrap();
    assert_eq!(flag_text(dispatcher.tree(), flag), "f_value");
    assert_eq!(arg_text(dispatcher.tree(), kind_arg), "arg_value");
}

#[test]
fn subcommand_dispatch_runs_before_action_after_in_expected_order() {
    let log: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
    let mut base = base_tree();
    let (root, generate, generate_kind_arg) = (base.root, base.generate, base.generate_kind_arg);

    let l = log.clone();
    push_action(&mut base.tree, root, Timing::Before, move |_ctx| {
        l.borrow_mut().push("root:before".to_string());
        Ok(())
    });
    let l = log.clone();
    push_action(&mut base.tree, root, Timing::After, move |_ctx| {
        l.borrow_mut().push("root:after".to_string());
        Ok(())
    });
    let l = log.clone();
    push_action(&mut base.tree, generate, Timing::Before, move |_ctx| {
        l.borrow_mut().push("generate:before".to_string());
        Ok(())
    });
    let l = log.clone();
    push_action(&mut base.tree, generate, Timing::Action, move |ctx| {
        let kind = ctx.tree().get(generate_kind_arg).as_arg().map(|a| {
            a.destination().expect("destination").value().as_text()
        });
        l.borrow_mut().push(format!("generate:action(kind={:?})", kind));
        Ok(())
    });
    let l = log.clone();
    push_action(&mut base.tree, generate, Timing::After, move |_ctx| {
        l.borrow_mut().push("generate:after".to_string());
        Ok(())
    });
    let mut dispatcher = Dispatcher::new(base.tree);
    dispatcher.dispatch(&argv(&["app", "generate", "loki"])).unwrap();

    assert_eq!(
        log.borrow().clone(),
        vec![
            "root:before".to_string(),
            "generate:before".to_string(),
            "generate:action(kind=Some(\"loki\"))".to_string(),
            "generate:after".to_string(),
            "root:after".to_string(),
        ],
    );
}

#[test]
fn clustered_short_flag_records_three_occurrences() {
    let captured = Rc::new(Cell::new(0usize));
    let mut base = base_tree();
    let root = base.root;
    let captured_clone = captured.clone();
    push_action(&mut base.tree, root, Timing::Before, move |ctx| {
        captured_clone.set(ctx.count("v"));
        Ok(())
    });

    let mut dispatcher = Dispatcher::new(base.tree);
    dispatcher.dispatch(&argv(&["app", "-vvv"])).unwrap();
    assert_eq!(captured.get(), 3);
}

#[test]
fn remaining_until_flag_positional_stops_at_the_next_flag() {
    let mut tree = Tree::new("app");
    let root = tree.root();

    let mut files = Arg::new("files");
    files.set_narg(NArg::RemainingUntilFlag).set_destination(Destination::string_list(Vec::new()));
    let files_id = tree.add_arg(root, files).unwrap();

    let mut dry_run = Flag::new("dry-run");
    dry_run.set_destination(Destination::boolean(false));
    let dry_run_id = tree.add_flag(root, dry_run).unwrap();

    tree.freeze();

    let mut dispatcher = Dispatcher::new(tree);
    dispatcher.dispatch(&argv(&["app", "a", "b", "c", "--dry-run"])).unwrap();

    assert_eq!(flag_text(dispatcher.tree(), dry_run_id), "true");
    assert_eq!(
        dispatcher.tree().get(files_id).as_arg().unwrap().destination().unwrap().value().as_text(),
        "a,b,c",
    );
}

fn color_tree() -> (Tree, joecli_core::command::NodeId) {
    let mut tree = Tree::new("app");
    let root = tree.root();
    let mut color = Flag::new("color");
    color.set_destination(Destination::string("unset"));
    color.set_optional_default("auto");
    color.bits_mut().set_optional_value(true);
    let color_id = tree.add_flag(root, color).unwrap();
    tree.freeze();
    (tree, color_id)
}

#[test]
fn optional_value_flag_uses_its_default_when_bare() {
    let (tree, color_id) = color_tree();
    let mut dispatcher = Dispatcher::new(tree);
    dispatcher.dispatch(&argv(&["app", "--color"])).unwrap();
    assert_eq!(flag_text(dispatcher.tree(), color_id), "auto");
}

#[test]
fn optional_value_flag_takes_an_inline_value_when_given() {
    let (tree, color_id) = color_tree();
    let mut dispatcher = Dispatcher::new(tree);
    dispatcher.dispatch(&argv(&["app", "--color=never"])).unwrap();
    assert_eq!(flag_text(dispatcher.tree(), color_id), "never");
}

#[test]
fn optional_value_flag_is_left_at_its_construction_default_when_absent() {
    let (tree, color_id) = color_tree();
    let mut dispatcher = Dispatcher::new(tree);
    dispatcher.dispatch(&argv(&["app"])).unwrap();
    assert_eq!(flag_text(dispatcher.tree(), color_id), "unset");
}

#[test]
fn file_reference_flag_resolves_content_but_keeps_the_raw_at_token_in_bindings() {
    let dir = std::env::temp_dir().join(format!("joecli_core_file_ref_test_{}", std::process::id()));
    std::fs::create_dir_all(dir.join("d")).unwrap();
    let file_path = dir.join("d").join("b.bin");
    std::fs::write(&file_path, "facade").unwrap();

    let mut tree = Tree::new("app");
    let root = tree.root();
    let mut file_flag = Flag::new("file");
    file_flag.set_destination(Destination::string(""));
    file_flag.bits_mut().set_allow_file_reference(true);
    let file_id = tree.add_flag(root, file_flag).unwrap();
    tree.freeze();

    let at_token = format!("@{}", file_path.display());
    let cli_token = format!("--file={}", at_token);
    let outcome = joecli_core::parser::parse(&tree, &argv(&["app", &cli_token])).unwrap();
    assert_eq!(outcome.bindings.occurrences(file_id)[0].tokens(), &[at_token]);

    let mut tree = tree;
    joecli_core::parser::apply_bindings(&mut tree, &outcome.bindings).unwrap();
    assert_eq!(flag_text(&tree, file_id), "facade");

    std::fs::remove_dir_all(&dir).ok();
}
