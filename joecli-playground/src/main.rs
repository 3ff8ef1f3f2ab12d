// Copyright 2019 Lyndon Brown
//
// This file is part of the `joecli-core` command-line framework library.
//
// Licensed under the MIT license or the Apache license (version 2.0), at your option. You may not
// copy, modify, or distribute this file except in compliance with said license. You can find copies
// of these licenses either in the LICENSE-MIT and LICENSE-APACHE files, or alternatively at
// <http://opensource.org/licenses/MIT> and <http://www.apache.org/licenses/LICENSE-2.0>
// respectively.

//! Exerciser for the `joecli-core` crate
//!
//! Builds a small demo command tree (a couple of flags of different shapes, a positional, and one
//! subcommand), parses the process argument vector against it, and prints an analysis of the
//! resulting bindings or the parse error encountered — the same hand-driven role `gong`'s own
//! `gong-playground` binary plays for that crate's `process()` entry point, adapted from printing
//! raw `ItemClass` variants to printing `joecli_core::bindings::Bindings` occurrences.

extern crate joecli_core;
extern crate term_ctrl;

use term_ctrl::predefined::*;

use joecli_core::arg::Arg;
use joecli_core::bindings::DataLocation;
use joecli_core::command::{Command, Tree};
use joecli_core::counter::NArg;
use joecli_core::flag::Flag;
use joecli_core::target::Target;
use joecli_core::value::Destination;

const COL_HEADER: &str = color1_bold::MAGENTA;
const COL_OK: &str = color1::GREEN;
const COL_ERR: &str = color1::RED;
const COL_NAME: &str = color2::BLUE;

mod config {
    use std::sync::Once;
    use term_ctrl::use_fmt_stdout;

    static mut FORMATTED_STDOUT: bool = false;
    static INIT: Once = Once::new();

    pub fn init() {
        unsafe {
            INIT.call_once(|| {
                FORMATTED_STDOUT = use_fmt_stdout(cfg!(feature = "color"));
            });
        }
    }

    pub fn formatted_stdout() -> bool {
        unsafe { FORMATTED_STDOUT }
    }
}

macro_rules! c {
    ( $code:expr ) => { if config::formatted_stdout() { $code } else { "" } };
}

/// Build the demo tree: a root `--flag <value>` / `-v` (clustering, boolean) / `<kind>` / a
/// `--color` optional-value flag / an `@file`-reference-capable `--payload` flag, plus one
/// `generate <kind>` subcommand.
fn demo_tree() -> Tree {
    let mut tree = Tree::new("joecli-playground");
    let root = tree.root();

    let mut flag = Flag::new("flag");
    flag.add_alias("f").set_destination(Destination::string("")).set_help("an example string flag");
    tree.add_flag(root, flag).unwrap();

    let mut verbose = Flag::new("v");
    verbose.set_help("clustering boolean short flag; repeat for -vvv");
    tree.add_flag(root, verbose).unwrap();

    let mut color = Flag::new("color");
    color
        .set_destination(Destination::string("unset"))
        .set_optional_default("auto")
        .set_help("optional-value flag: bare `--color` uses its default");
    color.bits_mut().set_optional_value(true);
    tree.add_flag(root, color).unwrap();

    let mut payload = Flag::new("payload");
    payload
        .set_destination(Destination::string(""))
        .set_help("accepts `@path` to read its value from a file");
    payload.bits_mut().set_allow_file_reference(true);
    tree.add_flag(root, payload).unwrap();

    let mut kind = Arg::new("kind");
    kind.set_narg(NArg::Optional).set_destination(Destination::string(""));
    tree.add_arg(root, kind).unwrap();

    let generate = tree.add_command(root, Command::new("generate")).unwrap();
    let mut generate_kind = Arg::new("kind");
    generate_kind.set_destination(Destination::string(""));
    tree.add_arg(generate, generate_kind).unwrap();

    tree.freeze();
    tree
}

fn location_label(loc: DataLocation) -> &'static str {
    match loc {
        DataLocation::CommandLine => "command line",
        DataLocation::File => "default file",
        DataLocation::Environment => "environment",
    }
}

fn main() {
    config::init();

    let tree = demo_tree();

    println!("\n[ {}Available options{} ]\n", c!(COL_HEADER), c!(RESET));
    if let Some(root_cmd) = tree.get(tree.root()).as_command() {
        for &flag_id in root_cmd.flags() {
            let flag = tree.get(flag_id).as_flag().expect("flag node");
            let long = flag.canonical_long().map(|n| format!("--{}", n));
            let short = flag.canonical_short().map(|c| format!("-{}", c));
            let names = [long, short].into_iter().flatten().collect::<Vec<_>>().join(", ");
            println!("{}{}{}: {}", c!(COL_NAME), names, c!(RESET), flag.help().unwrap_or(""));
        }
        for &sub_id in root_cmd.subcommands() {
            let sub = tree.get(sub_id).as_command().expect("command node");
            println!("{}{}{} (subcommand)", c!(COL_NAME), sub.name(), c!(RESET));
        }
    }

    let args: Vec<String> = std::env::args().collect();

    println!("\n[ {}Your input arguments{} ]\n", c!(COL_HEADER), c!(RESET));
    if args.len() <= 1 {
        println!("None!");
    } else {
        for (i, arg) in args.iter().skip(1).enumerate() {
            println!("[{}]: {}", i, arg);
        }
    }

    println!("\n[ {}Analysis{} ]\n", c!(COL_HEADER), c!(RESET));

    let outcome = match joecli_core::parser::parse(&tree, &args) {
        Ok(outcome) => outcome,
        Err(e) => {
            println!("Result: {}error{}", c!(COL_ERR), c!(RESET));
            println!("  {}", e);
            let code = joecli_core::error::ExitCode::from_result(&Err(e.into()));
            std::process::exit(code.into());
        }
    };

    let mut bindings = outcome.bindings;
    joecli_core::parser::apply_defaults(&tree, &outcome.command_path, &mut bindings);

    println!("Result: {}ok{}", c!(COL_OK), c!(RESET));
    println!(
        "Resolved path: {}",
        outcome.command_path.iter().map(|&id| tree.get(id).as_target().name().to_string())
            .collect::<Vec<_>>().join(" "),
    );
    println!("Bound targets: {}\n", bindings.bound_nodes().len());

    for &node in bindings.bound_nodes() {
        let name = tree.get(node).as_target().name();
        for (occ_i, occurrence) in bindings.occurrences(node).iter().enumerate() {
            println!(
                "[{}] {}{}{} (occurrence {}, via {}): {}",
                occ_i,
                c!(COL_OK),
                name,
                c!(RESET),
                occ_i,
                location_label(occurrence.location()),
                occurrence.tokens().join(" "),
            );
        }
    }
    if bindings.bound_nodes().is_empty() {
        println!("Nothing bound.");
    }
    println!();
}
