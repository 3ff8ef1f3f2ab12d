// Copyright 2018 Lyndon Brown
//
// This file is part of the `joecli-core` command-line framework library.
//
// Licensed under the MIT license or the Apache license (version 2.0), at your option. You may not
// copy, modify, or distribute this file except in compliance with said license. You can find copies
// of these licenses either in the LICENSE-MIT and LICENSE-APACHE files, or alternatively at
// <http://opensource.org/licenses/MIT> and <http://www.apache.org/licenses/LICENSE-2.0>
// respectively.

//! Target option bits
//!
//! Every [`Command`](../command/struct.Command.html), [`Flag`](../flag/struct.Flag.html) and
//! [`Arg`](../arg/struct.Arg.html) carries one of these bitsets (spec §6 "Recognised option bits").
//! Modelled as a plain struct of `bool` fields with chained setters, the same shape as `gong`'s
//! `parser::Settings`, rather than as a packed bitflags integer — there is no hot-path reason to
//! pack these, and the struct form keeps each bit self-documenting at call sites.

/// Bits controlling a target's parsing and dispatch behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bits {
    /// Forced hidden from help output, regardless of name
    pub hidden: bool,
    /// Forced visible, even if the name begins with `_`
    pub visible: bool,
    /// Must be supplied (flags/args) or must be present (subcommand), checked in `Before`
    pub required: bool,
    /// The value may be omitted; if so, the target's declared optional-default is used
    pub optional_value: bool,
    /// A flag that is invoked like a command and then cleanly short-circuits remaining stages
    /// (`--help`, `--version`)
    pub exits: bool,
    /// The target's action fires once per occurrence rather than once in aggregate
    pub each_occurrence: bool,
    /// A token is always interpreted as a file path whose content replaces/feeds the destination
    pub file_reference: bool,
    /// An `@`-prefixed token is treated as a file reference without requiring `file_reference`
    pub allow_file_reference: bool,
    /// Suppresses `Arity::Multi` comma-splitting for this destination
    pub disable_splitting: bool,
    /// A `FileReference`/`AllowFileReference` path must exist at parse time
    pub must_exist: bool,
    /// A boolean "toggle" flag accepting a `no-` prefixed inverse form
    pub no_toggle: bool,
    /// A command with subcommands must have one named on the command line
    pub required_subcommand: bool,
    /// Suppresses implicit hiding of `_`-prefixed descendant names
    pub disable_auto_visibility: bool,
    /// Repeated occurrences merge into the destination rather than the last one winning
    pub merge_semantics: bool,
    /// The destination was implicitly created by the framework (affects reset/clone bookkeeping)
    pub destination_implicit: bool,
    /// The target takes no value at all (flag-only; set automatically for boolean/`IsBoolFlag`
    /// destinations, but may also be set explicitly)
    pub flag_only: bool,
}

impl Default for Bits {
    fn default() -> Self {
        Self {
            hidden: false,
            visible: false,
            required: false,
            optional_value: false,
            exits: false,
            each_occurrence: false,
            file_reference: false,
            allow_file_reference: false,
            disable_splitting: false,
            must_exist: false,
            no_toggle: false,
            required_subcommand: false,
            disable_auto_visibility: false,
            merge_semantics: false,
            destination_implicit: false,
            flag_only: false,
        }
    }
}

impl Bits {
    /// Start from an all-`false` bitset
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the target should be considered hidden, given its name and whether an ancestor has
    /// disabled implicit hiding (spec §4.1 "Implicit hiding": `Hidden` wins when both `Visible` and
    /// `Hidden` are present).
    pub fn is_effectively_hidden(&self, name: &str, ancestor_disables_auto_visibility: bool) -> bool {
        if self.hidden {
            return true;
        }
        if self.visible {
            return false;
        }
        name.starts_with('_') && !ancestor_disables_auto_visibility && !self.disable_auto_visibility
    }

    #[inline(always)]
    pub fn set_hidden(&mut self, v: bool) -> &mut Self { self.hidden = v; self }
    #[inline(always)]
    pub fn set_visible(&mut self, v: bool) -> &mut Self { self.visible = v; self }
    #[inline(always)]
    pub fn set_required(&mut self, v: bool) -> &mut Self { self.required = v; self }
    #[inline(always)]
    pub fn set_optional_value(&mut self, v: bool) -> &mut Self { self.optional_value = v; self }
    #[inline(always)]
    pub fn set_exits(&mut self, v: bool) -> &mut Self { self.exits = v; self }
    #[inline(always)]
    pub fn set_each_occurrence(&mut self, v: bool) -> &mut Self { self.each_occurrence = v; self }
    #[inline(always)]
    pub fn set_file_reference(&mut self, v: bool) -> &mut Self { self.file_reference = v; self }
    #[inline(always)]
    pub fn set_allow_file_reference(&mut self, v: bool) -> &mut Self { self.allow_file_reference = v; self }
    #[inline(always)]
    pub fn set_disable_splitting(&mut self, v: bool) -> &mut Self { self.disable_splitting = v; self }
    #[inline(always)]
    pub fn set_must_exist(&mut self, v: bool) -> &mut Self { self.must_exist = v; self }
    #[inline(always)]
    pub fn set_no_toggle(&mut self, v: bool) -> &mut Self { self.no_toggle = v; self }
    #[inline(always)]
    pub fn set_required_subcommand(&mut self, v: bool) -> &mut Self { self.required_subcommand = v; self }
    #[inline(always)]
    pub fn set_disable_auto_visibility(&mut self, v: bool) -> &mut Self { self.disable_auto_visibility = v; self }
    #[inline(always)]
    pub fn set_merge_semantics(&mut self, v: bool) -> &mut Self { self.merge_semantics = v; self }
    #[inline(always)]
    pub fn set_flag_only(&mut self, v: bool) -> &mut Self { self.flag_only = v; self }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_wins_over_visible() {
        let mut b = Bits::new();
        b.set_hidden(true).set_visible(true);
        assert!(b.is_effectively_hidden("foo", false));
    }

    #[test]
    fn underscore_name_implicitly_hidden() {
        let b = Bits::new();
        assert!(b.is_effectively_hidden("_internal", false));
        assert!(!b.is_effectively_hidden("_internal", true));
    }

    #[test]
    fn explicit_visible_overrides_underscore() {
        let mut b = Bits::new();
        b.set_visible(true);
        assert!(!b.is_effectively_hidden("_internal", false));
    }
}
