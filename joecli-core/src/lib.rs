// Copyright 2019 Lyndon Brown
//
// This file is part of the `joecli-core` command-line framework library.
//
// Licensed under the MIT license or the Apache license (version 2.0), at your option. You may not
// copy, modify, or distribute this file except in compliance with said license. You can find copies
// of these licenses either in the LICENSE-MIT and LICENSE-APACHE files, or alternatively at
// <http://opensource.org/licenses/MIT> and <http://www.apache.org/licenses/LICENSE-2.0>
// respectively.

//! The command tree, token parser and staged action pipeline at the core of a declarative
//! command-line framework.
//!
//! A host builds a [`command::Tree`] (flags via [`flag::Flag`], positionals via [`arg::Arg`],
//! subcommands via nested [`command::Command`]s), wraps it in a [`dispatch::Dispatcher`], and
//! calls [`dispatch::Dispatcher::dispatch`] with the process argument vector. The dispatcher runs
//! the tree's `Initial` actions to let it finish growing itself, freezes it, hands the raw tokens
//! to [`parser::parse`], applies environment/file defaults and parsed bindings to each target's
//! [`value::Value`] destination, and finally runs `Before`/`Action`/`After` across the resolved
//! command path.
//!
//! # Layout
//!
//! - [`bits`] — the option bitset shared by every kind of target.
//! - [`target`] — the polymorphic `Target` trait and diagnostic `Path` type.
//! - [`value`] — the value adapter: the `Value` trait and built-in `Destination` kinds.
//! - [`counter`] — positional argument token-count policies (`NArg`).
//! - [`flag`], [`arg`], [`command`] — the declarative tree nodes and their owning arena.
//! - [`matching`] — abbreviation-aware long-name/subcommand-name resolution.
//! - [`bindings`] — the per-parse occurrence record.
//! - [`parser`] — the token-driven state machine.
//! - [`pipeline`] — timed actions (`Initial`/`Before`/`Action`/`After`).
//! - [`context`] — the per-action dispatch context.
//! - [`dispatch`] — the staged dispatcher tying everything together.
//! - [`error`] — the error taxonomy and exit-code mapping.

#![deny(bare_trait_objects)]

#[cfg(feature = "suggestions")]
extern crate strsim;

pub mod arg;
pub mod bindings;
pub mod bits;
pub mod command;
pub mod context;
pub mod counter;
pub mod dispatch;
pub mod error;
pub mod flag;
pub mod matching;
pub mod parser;
pub mod pipeline;
pub mod target;
pub mod value;
