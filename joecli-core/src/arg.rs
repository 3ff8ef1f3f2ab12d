// Copyright 2019 Lyndon Brown
//
// This file is part of the `joecli-core` command-line framework library.
//
// Licensed under the MIT license or the Apache license (version 2.0), at your option. You may not
// copy, modify, or distribute this file except in compliance with said license. You can find copies
// of these licenses either in the LICENSE-MIT and LICENSE-APACHE files, or alternatively at
// <http://opensource.org/licenses/MIT> and <http://www.apache.org/licenses/LICENSE-2.0>
// respectively.

//! Positional arguments
//!
//! An [`Arg`] is a positional slot, matched left to right against the tokens a
//! [`Command`](../command/struct.Command.html) doesn't otherwise consume as flags/subcommands
//! (spec §3 "Arg"). Its [`NArg`] policy governs how many tokens it is willing to take.

use std::fmt;

use crate::bits::Bits;
use crate::counter::NArg;
use crate::pipeline::Pipelines;
use crate::target::{DataMap, Target};
use crate::value::Destination;

/// A positional argument slot, owned by the [`Command`](../command/struct.Command.html) it was
/// declared under.
pub struct Arg {
    name: String,
    help: Option<String>,
    usage: Option<String>,
    category: Option<String>,
    narg: NArg,
    destination: Option<Destination>,
    data: DataMap,
    pipelines: Pipelines,
    bits: Bits,
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arg")
            .field("name", &self.name)
            .field("narg", &self.narg)
            .field("bits", &self.bits)
            .finish()
    }
}

impl Arg {
    /// Start building an arg named `name` (used only in diagnostics and help text; positionals
    /// are matched by position, never by name)
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            help: None,
            usage: None,
            category: None,
            narg: NArg::Exact(1),
            destination: None,
            data: DataMap::new(),
            pipelines: Pipelines::new(),
            bits: Bits::new(),
        }
    }

    /// Set the token-count policy (defaults to `NArg::Exact(1)`)
    pub fn set_narg(&mut self, narg: NArg) -> &mut Self {
        self.narg = narg;
        self
    }

    /// The token-count policy
    pub fn narg(&self) -> &NArg {
        &self.narg
    }

    /// Attach a value destination
    pub fn set_destination(&mut self, destination: Destination) -> &mut Self {
        self.destination = Some(destination);
        self
    }

    /// The value destination, if one is attached
    pub fn destination(&self) -> Option<&Destination> {
        self.destination.as_ref()
    }

    /// Mutable access to the value destination
    pub fn destination_mut(&mut self) -> Option<&mut Destination> {
        self.destination.as_mut()
    }

    /// The help summary, if set
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Set the help summary
    pub fn set_help(&mut self, help: impl Into<String>) -> &mut Self {
        self.help = Some(help.into());
        self
    }

    /// The usage synopsis override, if set
    pub fn usage(&self) -> Option<&str> {
        self.usage.as_deref()
    }

    /// Set the usage synopsis override
    pub fn set_usage(&mut self, usage: impl Into<String>) -> &mut Self {
        self.usage = Some(usage.into());
        self
    }

    /// The help-output grouping category, if set
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Set the help-output grouping category
    pub fn set_category(&mut self, category: impl Into<String>) -> &mut Self {
        self.category = Some(category.into());
        self
    }
}

impl Target for Arg {
    fn name(&self) -> &str {
        &self.name
    }
    fn aliases(&self) -> &[String] {
        // args have no secondary names; positional matching is strictly positional
        &[]
    }
    fn bits(&self) -> &Bits {
        &self.bits
    }
    fn bits_mut(&mut self) -> &mut Bits {
        &mut self.bits
    }
    fn pipelines(&self) -> &Pipelines {
        &self.pipelines
    }
    fn pipelines_mut(&mut self) -> &mut Pipelines {
        &mut self.pipelines
    }
    fn data(&self) -> &DataMap {
        &self.data
    }
    fn data_mut(&mut self) -> &mut DataMap {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_narg_is_exact_one() {
        let a = Arg::new("kind");
        assert!(matches!(a.narg(), NArg::Exact(1)));
    }

    #[test]
    fn narg_is_settable() {
        let mut a = Arg::new("files");
        a.set_narg(NArg::RemainingAll);
        assert!(matches!(a.narg(), NArg::RemainingAll));
    }
}
