// Copyright 2019 Lyndon Brown
//
// This file is part of the `joecli-core` command-line framework library.
//
// Licensed under the MIT license or the Apache license (version 2.0), at your option. You may not
// copy, modify, or distribute this file except in compliance with said license. You can find copies
// of these licenses either in the LICENSE-MIT and LICENSE-APACHE files, or alternatively at
// <http://opensource.org/licenses/MIT> and <http://www.apache.org/licenses/LICENSE-2.0>
// respectively.

//! The token parser
//!
//! Walks a frozen [`Tree`] and a raw token slice in a single left-to-right pass, the same
//! single-pass shape as `gong`'s `processor::process` (simpler and closer to this module's needs
//! than `gong`'s `OsStr`-based `engine.rs` state machine). Four informal states thread through the
//! loop (spec §4.4): `S0` consumes the program name, `S1` scans for flags/subcommands, `S2` feeds
//! unclaimed tokens to positional args in order, and `S3` begins once `--` is seen, after which
//! every remaining token is positional regardless of shape.
//!
//! Parsing only ever records raw tokens into a [`Bindings`] map; nothing touches a
//! [`Value`](crate::value::Value) destination until [`apply_bindings`] runs as a distinct second
//! pass, so that `Before`-stage actions can inspect occurrence counts and raw text before any
//! conversion has taken a chance to fail.

use crate::bindings::{Bindings, DataLocation};
use crate::command::{NodeId, Tree};
use crate::counter::{looks_like_flag, Take};
use crate::error::ParseError;
use crate::matching::{find_name_match, MatchOutcome};

/// The outcome of a successful parse: the binding map, and the full root-to-leaf command path
/// that was descended into.
#[derive(Debug)]
pub struct ParseOutcome {
    pub bindings: Bindings,
    pub command_path: Vec<NodeId>,
}

struct State<'t> {
    tree: &'t Tree,
    bindings: Bindings,
    command_path: Vec<NodeId>,
    positional_only: bool,
    arg_cursor: usize,
    counter: Option<Box<dyn crate::counter::Counter>>,
    subcommands_closed: bool,
}

impl<'t> State<'t> {
    fn current_command(&self) -> NodeId {
        *self.command_path.last().expect("command_path is never empty")
    }

    fn lookup_long(&self, name: &str) -> MatchOutcome<NodeId> {
        let mut candidates: Vec<(NodeId, &str, &[String])> = Vec::new();
        for &ancestor in self.command_path.iter().rev() {
            if let Some(cmd) = self.tree.get(ancestor).as_command() {
                for &fid in cmd.flags() {
                    if let Some(flag) = self.tree.get(fid).as_flag() {
                        candidates.push((fid, flag.name(), flag.aliases()));
                    }
                }
            }
        }
        find_name_match(name, candidates.into_iter())
    }

    fn lookup_short(&self, ch: char) -> Option<NodeId> {
        for &ancestor in self.command_path.iter().rev() {
            if let Some(cmd) = self.tree.get(ancestor).as_command() {
                for &fid in cmd.flags() {
                    if let Some(flag) = self.tree.get(fid).as_flag() {
                        let is_short = |s: &str| s.chars().count() == 1 && s.chars().next() == Some(ch);
                        if is_short(flag.name()) || flag.aliases().iter().any(|a| is_short(a)) {
                            return Some(fid);
                        }
                    }
                }
            }
        }
        None
    }

    fn path(&self) -> crate::target::Path {
        self.tree.path_of(self.current_command())
    }

    /// Check a possibly-`@`-prefixed value against `must_exist`, without resolving its contents:
    /// the raw token (e.g. `@d/b.bin`) is what gets recorded in the binding map, so that a
    /// `Before`-stage action can still see the literal reference; actual file-content
    /// substitution happens later, in [`apply_bindings`].
    fn validate_value(&self, flag_id: NodeId, raw: &str) -> Result<(), ParseError> {
        let flag = self.tree.get(flag_id).as_flag().expect("flag node");
        let bits = flag.bits();
        let is_reference = bits.file_reference || (bits.allow_file_reference && raw.starts_with('@'));
        if !is_reference || !bits.must_exist {
            return Ok(());
        }
        let path_str = raw.strip_prefix('@').unwrap_or(raw);
        std::fs::metadata(path_str).map(|_| ()).map_err(|e| ParseError::FileReferenceUnreadable {
            path_token: path_str.to_string(),
            io_error: e.to_string(),
        })
    }

    fn consume_flag_value(
        &mut self,
        flag_id: NodeId,
        token_for_errors: &str,
        inline_value: Option<String>,
        toggled_off: bool,
        remaining: &mut std::iter::Peekable<std::slice::Iter<String>>,
    ) -> Result<(), ParseError> {
        let flag = self.tree.get(flag_id).as_flag().expect("flag node");
        let name_for_errors = flag.canonical_long().map(str::to_string).unwrap_or_else(|| token_for_errors.to_string());

        if flag.is_flag_only() {
            let rendered = match inline_value.as_deref() {
                None | Some("") => if toggled_off { "false" } else { "true" },
                Some("true") => "true",
                Some("false") => "false",
                Some(v) => {
                    return Err(ParseError::UnexpectedArgument { flag: name_for_errors, value: v.to_string() });
                }
            };
            self.bindings.push_new_occurrence(flag_id, rendered, DataLocation::CommandLine);
            return Ok(());
        }

        let raw_value = match inline_value {
            Some(v) => Some(v),
            None => {
                let takes_separate = !flag.bits().optional_value
                    || remaining.peek().map(|t| !looks_like_flag(t)).unwrap_or(false);
                if takes_separate {
                    remaining.next().map(|s| s.clone())
                } else {
                    None
                }
            }
        };

        let value = match raw_value {
            Some(raw) => {
                self.validate_value(flag_id, &raw)?;
                raw
            }
            None => match flag.optional_default() {
                Some(default) if flag.bits().optional_value => default.to_string(),
                _ => return Err(ParseError::ExpectedArgument { flag: name_for_errors, path: self.path() }),
            },
        };

        self.bindings.push_new_occurrence(flag_id, value, DataLocation::CommandLine);
        Ok(())
    }

    fn parse_long(
        &mut self,
        token: &str,
        remaining: &mut std::iter::Peekable<std::slice::Iter<String>>,
    ) -> Result<(), ParseError> {
        let body = &token[2..];
        let (name_part, inline_value) = match body.find('=') {
            Some(pos) => (&body[..pos], Some(body[pos + 1..].to_string())),
            None => (body, None),
        };
        if name_part.is_empty() {
            return Err(ParseError::InvalidFlagFormat { token: token.to_string() });
        }

        if let Some(base_name) = name_part.strip_prefix("no-") {
            if let MatchOutcome::Match(id) = self.lookup_long(base_name) {
                if self.tree.get(id).as_flag().expect("flag node").bits().no_toggle {
                    return self.consume_flag_value(id, token, None, true, remaining);
                }
            }
        }

        match self.lookup_long(name_part) {
            MatchOutcome::Match(id) => self.consume_flag_value(id, token, inline_value, false, remaining),
            MatchOutcome::Ambiguous => {
                Err(ParseError::AmbiguousAbbreviation { token: name_part.to_string(), path: self.path() })
            }
            MatchOutcome::NoMatch => Err(ParseError::UnknownFlag { token: token.to_string(), path: self.path() }),
        }
    }

    fn parse_short_cluster(
        &mut self,
        token: &str,
        remaining: &mut std::iter::Peekable<std::slice::Iter<String>>,
    ) -> Result<(), ParseError> {
        let chars: Vec<char> = token.chars().skip(1).collect();
        let mut i = 0;
        while i < chars.len() {
            let ch = chars[i];
            let flag_id = self
                .lookup_short(ch)
                .ok_or_else(|| ParseError::UnknownFlag { token: format!("-{}", ch), path: self.path() })?;
            let is_flag_only = self.tree.get(flag_id).as_flag().expect("flag node").is_flag_only();
            if is_flag_only {
                self.bindings.push_new_occurrence(flag_id, "true", DataLocation::CommandLine);
                i += 1;
                continue;
            }
            let rest: String = chars[i + 1..].iter().collect();
            let rest = rest.strip_prefix('=').map(str::to_string).unwrap_or(rest);
            let inline_value = if rest.is_empty() { None } else { Some(rest) };
            self.consume_flag_value(flag_id, token, inline_value, false, remaining)?;
            break;
        }
        Ok(())
    }

    fn feed_positional(&mut self, token: &str) -> Result<(), ParseError> {
        loop {
            let args_list: Vec<NodeId> =
                self.tree.get(self.current_command()).as_command().expect("command node").args().to_vec();
            if self.arg_cursor >= args_list.len() {
                return Err(ParseError::TooManyPositionals { token: token.to_string(), path: self.path() });
            }
            let arg_id = args_list[self.arg_cursor];
            if self.counter.is_none() {
                let narg = self.tree.get(arg_id).as_arg().expect("arg node").narg().clone();
                self.counter = Some(narg.spawn());
            }
            let looks_flag = looks_like_flag(token);
            let take = self.counter.as_mut().expect("counter spawned above").take(token, looks_flag);
            match take {
                Take::Continue => {
                    self.bindings.push_token(arg_id, token, DataLocation::CommandLine);
                    return Ok(());
                }
                Take::EndOfArguments => {
                    self.bindings.push_token(arg_id, token, DataLocation::CommandLine);
                    self.counter = None;
                    self.arg_cursor += 1;
                    return Ok(());
                }
                Take::Reject => {
                    let counter = self.counter.take().expect("counter spawned above");
                    counter.done().map_err(|detail| ParseError::ArgCountUnsatisfied {
                        arg: self.tree.get(arg_id).as_arg().expect("arg node").name().to_string(),
                        path: self.path(),
                        detail,
                    })?;
                    self.arg_cursor += 1;
                    continue;
                }
            }
        }
    }
}

/// Parse `args` (including the leading program-name token, `S0`) against `tree`, producing a
/// [`ParseOutcome`] or the first [`ParseError`] encountered.
pub fn parse(tree: &Tree, args: &[String]) -> Result<ParseOutcome, ParseError> {
    let mut iter = args.iter();
    iter.next(); // S0: discard the program name

    let mut state = State {
        tree,
        bindings: Bindings::new(),
        command_path: vec![tree.root()],
        positional_only: false,
        arg_cursor: 0,
        counter: None,
        subcommands_closed: false,
    };

    let remaining_tokens: Vec<String> = iter.cloned().collect();
    let mut cursor = remaining_tokens.iter().peekable();

    while let Some(token) = cursor.next() {
        if state.positional_only {
            state.feed_positional(token)?;
            continue;
        }
        if token == "--" {
            state.positional_only = true;
            continue;
        }
        if token == "-" {
            state.feed_positional(token)?;
            continue;
        }
        if token.len() > 2 && token.starts_with("--") {
            state.parse_long(token, &mut cursor)?;
            continue;
        }
        if token.len() > 1 && token.starts_with('-') {
            state.parse_short_cluster(token, &mut cursor)?;
            continue;
        }

        // Plain token: try a subcommand match first, unless positionals have already started or
        // a prior token definitively closed off subcommand matching for this command.
        if state.arg_cursor == 0 && state.counter.is_none() && !state.subcommands_closed {
            match state.tree.find_subcommand(state.current_command(), token) {
                MatchOutcome::Match(id) => {
                    state.command_path.push(id);
                    state.arg_cursor = 0;
                    continue;
                }
                MatchOutcome::Ambiguous => {
                    return Err(ParseError::AmbiguousAbbreviation { token: token.clone(), path: state.path() });
                }
                MatchOutcome::NoMatch => {
                    state.subcommands_closed = true;
                }
            }
        }
        state.feed_positional(token)?;
    }

    if let Some(counter) = state.counter.take() {
        let args_list = state.tree.get(state.current_command()).as_command().expect("command node").args();
        let arg_id = args_list[state.arg_cursor];
        counter.done().map_err(|detail| ParseError::ArgCountUnsatisfied {
            arg: state.tree.get(arg_id).as_arg().expect("arg node").name().to_string(),
            path: state.path(),
            detail,
        })?;
    }

    Ok(ParseOutcome { bindings: state.bindings, command_path: state.command_path })
}

/// Consult environment-variable and default-file sources for every flag along `command_path` that
/// parsing left unbound (spec §4.4 "Environment/file defaults", §6 "Environment/file defaults").
/// Env vars are tried first, in declaration order; the first one set wins. Otherwise each
/// registered default-file path-list is split on the platform path separator
/// ([`std::env::split_paths`], matching the spec's POSIX `:` / Windows `;` rule) and the first
/// readable file's trimmed contents are used. A flag with neither source available, or whose
/// sources all fail to resolve, is simply left unbound; this is not an error.
pub fn apply_defaults(tree: &Tree, command_path: &[NodeId], bindings: &mut Bindings) {
    for &cmd_id in command_path {
        let cmd = match tree.get(cmd_id).as_command() {
            Some(c) => c,
            None => continue,
        };
        for &flag_id in cmd.flags() {
            if bindings.contains(flag_id) {
                continue;
            }
            let flag = tree.get(flag_id).as_flag().expect("flag node");

            let mut from_env = None;
            for var in flag.env_vars() {
                if let Ok(value) = std::env::var(var) {
                    from_env = Some(value);
                    break;
                }
            }
            if let Some(value) = from_env {
                bindings.push_new_occurrence(flag_id, value, DataLocation::Environment);
                continue;
            }

            for path_list in flag.default_files() {
                let mut found = None;
                for path in std::env::split_paths(path_list) {
                    if let Ok(contents) = std::fs::read_to_string(&path) {
                        found = Some(contents.trim_end_matches(['\n', '\r']).to_string());
                        break;
                    }
                }
                if let Some(contents) = found {
                    bindings.push_new_occurrence(flag_id, contents, DataLocation::File);
                    break;
                }
            }
        }
    }
}

/// Substitute an `@`-prefixed (or unconditionally `file_reference`) token's file content for the
/// raw token text, leaving anything else untouched. Errors with [`ParseError::FileReferenceUnreadable`]
/// only when `must_exist` demands the file be readable; otherwise an unreadable reference is passed
/// through as literal text, matching the leniency already offered at parse time.
fn resolve_file_reference(bits: &crate::bits::Bits, raw: &str) -> Result<String, ParseError> {
    let is_reference = bits.file_reference || (bits.allow_file_reference && raw.starts_with('@'));
    if !is_reference {
        return Ok(raw.to_string());
    }
    let path_str = raw.strip_prefix('@').unwrap_or(raw);
    match std::fs::read_to_string(path_str) {
        Ok(contents) => Ok(contents.trim_end_matches(['\n', '\r']).to_string()),
        Err(e) => {
            if bits.must_exist {
                Err(ParseError::FileReferenceUnreadable { path_token: path_str.to_string(), io_error: e.to_string() })
            } else {
                Ok(raw.to_string())
            }
        }
    }
}

/// Apply every recorded binding to its target's [`Value`](crate::value::Value) destination. Run
/// as a pass distinct from [`parse`] so that a `Before`-stage action can inspect raw occurrence
/// data (including an unresolved `@file` reference) for a target whose own conversion later fails.
///
/// A target with [`Bits::each_occurrence`](crate::bits::Bits::each_occurrence) set is left
/// untouched here: its destination is instead reset and re-applied once per occurrence by the
/// dispatcher's `Action` stage (see [`apply_occurrence`]), so that each replay of the per-option
/// action sees only that occurrence's own value rather than the accumulation of all of them.
pub fn apply_bindings(tree: &mut Tree, bindings: &Bindings) -> Result<(), ParseError> {
    for &node in bindings.bound_nodes() {
        let bits = *tree.get(node).as_target().bits();
        if bits.each_occurrence {
            continue;
        }
        let occurrences = bindings.occurrences(node).to_vec();
        match tree.get_mut(node) {
            crate::command::NodeKind::Flag(flag) => {
                if let Some(dest) = flag.destination_mut() {
                    for occurrence in &occurrences {
                        for token in occurrence.tokens() {
                            let resolved = resolve_file_reference(&bits, token)?;
                            dest.apply(&resolved, bits.disable_splitting).map_err(|e| ParseError::InvalidValue {
                                flag: flag.name().to_string(),
                                detail: e.to_string(),
                            })?;
                        }
                    }
                }
            }
            crate::command::NodeKind::Arg(arg) => {
                if let Some(dest) = arg.destination_mut() {
                    for occurrence in &occurrences {
                        for token in occurrence.tokens() {
                            let resolved = resolve_file_reference(&bits, token)?;
                            dest.apply(&resolved, bits.disable_splitting).map_err(|e| ParseError::InvalidValue {
                                flag: arg.name().to_string(),
                                detail: e.to_string(),
                            })?;
                        }
                    }
                }
            }
            crate::command::NodeKind::Command(_) => {}
        }
    }
    Ok(())
}

/// Reset `node`'s destination to its zero value, then apply a single occurrence's tokens to it.
///
/// Used by the dispatcher's `Action` stage for an `EachOccurrence` target: called once per
/// recorded occurrence, immediately before that occurrence's replay of the stage, so the
/// destination (and hence [`Context::value`](crate::dispatch::Context::value)) reflects only the
/// occurrence currently being dispatched rather than every occurrence seen so far.
pub fn apply_occurrence(
    tree: &mut Tree,
    node: NodeId,
    occurrence: &crate::bindings::Occurrence,
) -> Result<(), ParseError> {
    let bits = *tree.get(node).as_target().bits();
    match tree.get_mut(node) {
        crate::command::NodeKind::Flag(flag) => {
            if let Some(dest) = flag.destination_mut() {
                dest.value_mut().reset();
                for token in occurrence.tokens() {
                    let resolved = resolve_file_reference(&bits, token)?;
                    dest.apply(&resolved, bits.disable_splitting).map_err(|e| ParseError::InvalidValue {
                        flag: flag.name().to_string(),
                        detail: e.to_string(),
                    })?;
                }
            }
        }
        crate::command::NodeKind::Arg(arg) => {
            if let Some(dest) = arg.destination_mut() {
                dest.value_mut().reset();
                for token in occurrence.tokens() {
                    let resolved = resolve_file_reference(&bits, token)?;
                    dest.apply(&resolved, bits.disable_splitting).map_err(|e| ParseError::InvalidValue {
                        flag: arg.name().to_string(),
                        detail: e.to_string(),
                    })?;
                }
            }
        }
        crate::command::NodeKind::Command(_) => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arg::Arg;
    use crate::command::Command;
    use crate::counter::NArg;
    use crate::flag::Flag;
    use crate::value::Destination;

    fn tokens(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn binds_long_flag_with_attached_value() {
        let mut tree = Tree::new("app");
        let root = tree.root();
        let mut flag = Flag::new("output");
        flag.add_alias("o").set_destination(Destination::string(""));
        let flag_id = tree.add_flag(root, flag).unwrap();
        tree.freeze();

        let outcome = parse(&tree, &tokens(&["app", "--output=result.txt"])).unwrap();
        assert_eq!(outcome.bindings.count(flag_id), 1);
        assert_eq!(outcome.bindings.occurrences(flag_id)[0].tokens(), &["result.txt".to_string()]);
    }

    #[test]
    fn clustered_short_flags_each_record_an_occurrence() {
        let mut tree = Tree::new("app");
        let root = tree.root();
        let flag_id = tree.add_flag(root, Flag::new("v")).unwrap();
        tree.freeze();

        let outcome = parse(&tree, &tokens(&["app", "-vvv"])).unwrap();
        assert_eq!(outcome.bindings.count(flag_id), 3);
    }

    #[test]
    fn descends_into_abbreviated_subcommand() {
        let mut tree = Tree::new("app");
        let root = tree.root();
        let sub = tree.add_command(root, Command::new("generate")).unwrap();
        tree.freeze();

        let outcome = parse(&tree, &tokens(&["app", "gen"])).unwrap();
        assert_eq!(outcome.command_path, vec![root, sub]);
    }

    #[test]
    fn remaining_until_flag_stops_before_next_flag() {
        let mut tree = Tree::new("app");
        let root = tree.root();
        let mut arg = Arg::new("files");
        arg.set_narg(NArg::RemainingUntilFlag);
        let arg_id = tree.add_arg(root, arg).unwrap();
        let flag_id = tree.add_flag(root, Flag::new("verbose")).unwrap();
        tree.freeze();

        let outcome = parse(&tree, &tokens(&["app", "a.txt", "b.txt", "--verbose"])).unwrap();
        assert_eq!(outcome.bindings.occurrences(arg_id)[0].tokens(), &["a.txt".to_string(), "b.txt".to_string()]);
        assert_eq!(outcome.bindings.count(flag_id), 1);
    }

    #[test]
    fn unknown_long_flag_is_an_error() {
        let mut tree = Tree::new("app");
        tree.freeze();
        let err = parse(&tree, &tokens(&["app", "--nope"])).unwrap_err();
        assert!(matches!(err, ParseError::UnknownFlag { .. }));
    }

    #[test]
    fn apply_bindings_populates_destination() {
        let mut tree = Tree::new("app");
        let root = tree.root();
        let mut flag = Flag::new("count");
        flag.set_destination(Destination::uint(0));
        let flag_id = tree.add_flag(root, flag).unwrap();
        tree.freeze();

        let outcome = parse(&tree, &tokens(&["app", "--count=4"])).unwrap();
        apply_bindings(&mut tree, &outcome.bindings).unwrap();
        let value = tree.get(flag_id).as_flag().unwrap().destination().unwrap().value();
        assert_eq!(value.as_text(), "4");
    }

    #[test]
    fn unseen_flag_falls_back_to_env_var() {
        let mut tree = Tree::new("app");
        let root = tree.root();
        let mut flag = Flag::new("token");
        flag.add_env_var("JOECLI_TEST_TOKEN_VAR").set_destination(Destination::string(""));
        let flag_id = tree.add_flag(root, flag).unwrap();
        tree.freeze();

        std::env::set_var("JOECLI_TEST_TOKEN_VAR", "secret");
        let outcome = parse(&tree, &tokens(&["app"])).unwrap();
        let mut bindings = outcome.bindings;
        apply_defaults(&tree, &outcome.command_path, &mut bindings);
        std::env::remove_var("JOECLI_TEST_TOKEN_VAR");

        assert_eq!(bindings.occurrences(flag_id)[0].location(), crate::bindings::DataLocation::Environment);
        assert_eq!(bindings.occurrences(flag_id)[0].tokens(), &["secret".to_string()]);
    }

    #[test]
    fn seen_flag_ignores_env_var() {
        let mut tree = Tree::new("app");
        let root = tree.root();
        let mut flag = Flag::new("token");
        flag.add_env_var("JOECLI_TEST_TOKEN_VAR2").set_destination(Destination::string(""));
        let flag_id = tree.add_flag(root, flag).unwrap();
        tree.freeze();

        std::env::set_var("JOECLI_TEST_TOKEN_VAR2", "from-env");
        let outcome = parse(&tree, &tokens(&["app", "--token=from-cli"])).unwrap();
        let mut bindings = outcome.bindings;
        apply_defaults(&tree, &outcome.command_path, &mut bindings);
        std::env::remove_var("JOECLI_TEST_TOKEN_VAR2");

        assert_eq!(bindings.count(flag_id), 1);
        assert_eq!(bindings.occurrences(flag_id)[0].tokens(), &["from-cli".to_string()]);
    }
}
