// Copyright 2019 Lyndon Brown
//
// This file is part of the `joecli-core` command-line framework library.
//
// Licensed under the MIT license or the Apache license (version 2.0), at your option. You may not
// copy, modify, or distribute this file except in compliance with said license. You can find copies
// of these licenses either in the LICENSE-MIT and LICENSE-APACHE files, or alternatively at
// <http://opensource.org/licenses/MIT> and <http://www.apache.org/licenses/LICENSE-2.0>
// respectively.

//! Timed actions
//!
//! Every [`Command`](../command/struct.Command.html), [`Flag`](../flag/struct.Flag.html) and
//! [`Arg`](../arg/struct.Arg.html) owns four [`Pipelines`], one per [`Timing`] stage (spec §4.5).
//! An [`Action`] is the tagged-sum-type design note from spec §9: a plain callback, a declarative
//! [`Patch`] mutator, or a nested sub-pipeline.

use std::fmt;
use std::rc::Rc;

use crate::context::Context;
use crate::error::DispatchError;

/// The four dispatch stages, run in this order for every target on the resolved path
/// (spec §4.5 "Staged dispatch")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timing {
    /// Tree construction and mutation; the only stage in which adding flags/args/subcommands is
    /// legal
    Initial,
    /// Validation: required-ness, cross-target consistency; runs root-to-leaf
    Before,
    /// The target's own behaviour; runs root-to-leaf, or once per occurrence under
    /// [`Bits::each_occurrence`](../bits/struct.Bits.html#structfield.each_occurrence)
    Action,
    /// Cleanup and teardown; runs leaf-to-root (the reverse of the other three stages)
    After,
}

/// A closure run during dispatch, given mutable access to the [`Context`]
pub type Callback = Rc<dyn Fn(&mut Context) -> Result<(), DispatchError>>;

/// A declarative mutation applied to a target's own fields during `Initial`, without the
/// ceremony of writing out a full closure
#[derive(Debug, Clone)]
pub enum Patch {
    /// Replace the help summary
    Help(String),
    /// Replace the category used for help-output grouping
    Category(String),
    /// Replace the optional-value default
    OptionalDefault(String),
    /// Force hidden/visible
    Hidden(bool),
    /// Mark required
    Required(bool),
}

/// One action attached to a [`Timing`] stage
#[derive(Clone)]
pub enum Action {
    /// An arbitrary callback; the common case for `Before`/`Action`/`After`
    Callback(Callback),
    /// A callback conventionally reserved for `Initial`: registers subcommands/flags/args,
    /// wires up further pipelines, or otherwise grows the tree. Distinguished from `Callback`
    /// only by convention and by where the framework permits tree mutation (see
    /// [`Timing::Initial`]).
    Setup(Callback),
    /// A declarative field patch, applied directly without invoking user code
    Prototype(Patch),
    /// A named sequence of further actions, run in order as if spliced in place
    Pipeline(Vec<Action>),
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Callback(_) => f.write_str("Action::Callback(..)"),
            Action::Setup(_) => f.write_str("Action::Setup(..)"),
            Action::Prototype(p) => f.debug_tuple("Action::Prototype").field(p).finish(),
            Action::Pipeline(actions) => f.debug_tuple("Action::Pipeline").field(&actions.len()).finish(),
        }
    }
}

impl Action {
    /// Wrap a fallible closure as a plain [`Callback`]
    pub fn callback(f: impl Fn(&mut Context) -> Result<(), DispatchError> + 'static) -> Self {
        Action::Callback(Rc::new(f))
    }

    /// Wrap a fallible closure as a [`Timing::Initial`]-oriented [`Setup`](Action::Setup) action
    pub fn setup(f: impl Fn(&mut Context) -> Result<(), DispatchError> + 'static) -> Self {
        Action::Setup(Rc::new(f))
    }

    /// Run this action (and recursively, any nested pipeline) against `ctx`
    pub(crate) fn run(&self, ctx: &mut Context) -> Result<(), DispatchError> {
        match self {
            Action::Callback(f) | Action::Setup(f) => f(ctx),
            Action::Prototype(patch) => ctx.apply_patch(patch),
            Action::Pipeline(actions) => {
                for action in actions {
                    action.run(ctx)?;
                }
                Ok(())
            }
        }
    }
}

/// The four timed action lists owned by every target
#[derive(Debug, Clone, Default)]
pub struct Pipelines {
    initial: Vec<Action>,
    before: Vec<Action>,
    action: Vec<Action>,
    after: Vec<Action>,
}

impl Pipelines {
    /// An empty set of pipelines
    pub fn new() -> Self {
        Self::default()
    }

    /// The action list for a given stage
    pub fn stage(&self, timing: Timing) -> &[Action] {
        match timing {
            Timing::Initial => &self.initial,
            Timing::Before => &self.before,
            Timing::Action => &self.action,
            Timing::After => &self.after,
        }
    }

    /// Append an action to a stage's list
    pub fn push(&mut self, timing: Timing, action: Action) {
        match timing {
            Timing::Initial => self.initial.push(action),
            Timing::Before => self.before.push(action),
            Timing::Action => self.action.push(action),
            Timing::After => self.after.push(action),
        }
    }

    /// Whether any action is registered for a stage
    pub fn has_stage(&self, timing: Timing) -> bool {
        !self.stage(timing).is_empty()
    }
}
