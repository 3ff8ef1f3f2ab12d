// Copyright 2019 Lyndon Brown
//
// This file is part of the `joecli-core` command-line framework library.
//
// Licensed under the MIT license or the Apache license (version 2.0), at your option. You may not
// copy, modify, or distribute this file except in compliance with said license. You can find copies
// of these licenses either in the LICENSE-MIT and LICENSE-APACHE files, or alternatively at
// <http://opensource.org/licenses/MIT> and <http://www.apache.org/licenses/LICENSE-2.0>
// respectively.

//! Flags
//!
//! A [`Flag`] is an option recognised by a leading `-`/`--` (spec §3 "Flag"). Canonical long/short
//! name selection follows spec §4.1: the canonical long name is the first multi-character entry
//! in `{name} ∪ aliases`, the canonical short name the first single-character entry; declaration
//! order within `aliases` is preserved so the first-declared wins ties, mirroring the precedence
//! `gong`'s `OptionSet` gives to primary vs. additional name/alt-name pairs.

use std::fmt;

use crate::bits::Bits;
use crate::pipeline::Pipelines;
use crate::target::{DataMap, Target};
use crate::value::Destination;

/// A recognised command-line flag, owned by the [`Command`](../command/struct.Command.html) it
/// was declared under.
pub struct Flag {
    name: String,
    aliases: Vec<String>,
    help: Option<String>,
    usage: Option<String>,
    category: Option<String>,
    env_vars: Vec<String>,
    file_paths: Vec<String>,
    destination: Option<Destination>,
    optional_default: Option<String>,
    data: DataMap,
    pipelines: Pipelines,
    bits: Bits,
}

impl fmt::Debug for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flag")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("bits", &self.bits)
            .finish()
    }
}

impl Flag {
    /// Start building a flag named `name` (conventionally its canonical long or short form)
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            help: None,
            usage: None,
            category: None,
            env_vars: Vec::new(),
            file_paths: Vec::new(),
            destination: None,
            optional_default: None,
            data: DataMap::new(),
            pipelines: Pipelines::new(),
            bits: Bits::new(),
        }
    }

    /// Add an alias (a single character registers a short name, anything longer a long name)
    pub fn add_alias(&mut self, alias: impl Into<String>) -> &mut Self {
        self.aliases.push(alias.into());
        self
    }

    /// Attach a value destination
    pub fn set_destination(&mut self, destination: Destination) -> &mut Self {
        self.destination = Some(destination);
        self
    }

    /// The value destination, if one is attached (flags without one are pure `flag_only` toggles)
    pub fn destination(&self) -> Option<&Destination> {
        self.destination.as_ref()
    }

    /// Mutable access to the value destination
    pub fn destination_mut(&mut self) -> Option<&mut Destination> {
        self.destination.as_mut()
    }

    /// Register an environment variable consulted when the flag is absent (spec §4.4 "Sources",
    /// lowest precedence after the command line and file references)
    pub fn add_env_var(&mut self, var: impl Into<String>) -> &mut Self {
        self.env_vars.push(var.into());
        self
    }

    /// The environment variables consulted for a default, in preference order
    pub fn env_vars(&self) -> &[String] {
        &self.env_vars
    }

    /// Register a default-value file path consulted when neither the command line nor any
    /// environment variable supplies the flag
    pub fn add_default_file(&mut self, path: impl Into<String>) -> &mut Self {
        self.file_paths.push(path.into());
        self
    }

    /// The default-value file paths, in preference order
    pub fn default_files(&self) -> &[String] {
        &self.file_paths
    }

    /// Set the textual default substituted when [`Bits::optional_value`] is set and no value
    /// token followed the flag
    pub fn set_optional_default(&mut self, value: impl Into<String>) -> &mut Self {
        self.optional_default = Some(value.into());
        self
    }

    /// The optional-value default, if set
    pub fn optional_default(&self) -> Option<&str> {
        self.optional_default.as_deref()
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

    /// The usage synopsis override, if set (falls back to the destination's
    /// [`Value::synopsis`](crate::value::Value::synopsis) otherwise)
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

    /// The canonical long name, if any name/alias has more than one character
    pub fn canonical_long(&self) -> Option<&str> {
        crate::target::canonical_long_name(&self.name, &self.aliases)
    }

    /// The canonical short name, if any name/alias is a single character
    pub fn canonical_short(&self) -> Option<char> {
        crate::target::canonical_short_name(&self.name, &self.aliases)
    }

    /// Whether the flag takes no value at all: either explicitly marked `flag_only`, or the
    /// destination's value reports itself as a bare boolean toggle
    pub fn is_flag_only(&self) -> bool {
        self.bits.flag_only
            || self.destination.as_ref().map(|d| d.value().is_bool_flag()).unwrap_or(true)
    }
}

impl Target for Flag {
    fn name(&self) -> &str {
        &self.name
    }
    fn aliases(&self) -> &[String] {
        &self.aliases
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
    fn canonical_names_pick_first_of_each_length_class() {
        let mut f = Flag::new("o");
        f.add_alias("out").add_alias("output");
        assert_eq!(f.canonical_short(), Some('o'));
        assert_eq!(f.canonical_long(), Some("out"));
    }

    #[test]
    fn flag_only_when_no_destination() {
        let f = Flag::new("verbose");
        assert!(f.is_flag_only());
    }

    #[test]
    fn flag_only_when_bool_destination() {
        let mut f = Flag::new("verbose");
        f.set_destination(Destination::boolean(false));
        assert!(f.is_flag_only());
    }

    #[test]
    fn not_flag_only_with_string_destination() {
        let mut f = Flag::new("output");
        f.set_destination(Destination::string(""));
        assert!(!f.is_flag_only());
    }
}
