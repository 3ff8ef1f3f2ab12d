// Copyright 2019 Lyndon Brown
//
// This file is part of the `joecli-core` command-line framework library.
//
// Licensed under the MIT license or the Apache license (version 2.0), at your option. You may not
// copy, modify, or distribute this file except in compliance with said license. You can find copies
// of these licenses either in the LICENSE-MIT and LICENSE-APACHE files, or alternatively at
// <http://opensource.org/licenses/MIT> and <http://www.apache.org/licenses/LICENSE-2.0>
// respectively.

//! Error and exit-code types
//!
//! Hand-rolled enums with manual `Display`/`Error` impls, in the same style `gong` uses for its
//! `OptionFlaw`/`ItemE` types, rather than pulling in `thiserror`/`anyhow` — no crate in this
//! corpus that parses command lines reaches for either.

use std::fmt;

use crate::target::Path;

/// A malformed token or structural problem discovered while parsing (spec §4.4 "Error codes")
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A `-`/`--` prefixed token did not resolve to any known flag
    UnknownFlag { token: String, path: Path },
    /// A token in the out-of-scope expression sub-grammar could not be parsed as one
    UnknownExpr { token: String },
    /// A flag requiring a value was not followed by one
    ExpectedArgument { flag: String, path: Path },
    /// A flag takes no value but one was attached (`--flag=value` on a `flag_only` flag)
    UnexpectedArgument { flag: String, value: String },
    /// A short/long option token did not match the recognised flag grammar
    InvalidFlagFormat { token: String },
    /// An arg's tokens were found interleaved after the out-of-scope expression grammar began
    ArgsMustPrecedeExprs { token: String },
    /// Fewer tokens were supplied to an arg than its `NArg` policy required
    ArgCountUnsatisfied { arg: String, path: Path, detail: String },
    /// A required flag, arg or subcommand was never supplied
    RequiredTargetMissing { name: String, path: Path },
    /// A `FileReference`/`AllowFileReference` path could not be read
    FileReferenceUnreadable { path_token: String, io_error: String },
    /// A flag's destination rejected the supplied text
    InvalidValue { flag: String, detail: String },
    /// A long name abbreviation matched more than one candidate
    AmbiguousAbbreviation { token: String, path: Path },
    /// More positional tokens were supplied than any arg slot was willing to take
    TooManyPositionals { token: String, path: Path },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnknownFlag { token, path } => {
                write!(f, "unknown flag `{}` (in `{}`)", token, path)
            }
            ParseError::UnknownExpr { token } => write!(f, "could not parse expression `{}`", token),
            ParseError::ExpectedArgument { flag, path } => {
                write!(f, "flag `{}` requires a value (in `{}`)", flag, path)
            }
            ParseError::UnexpectedArgument { flag, value } => {
                write!(f, "flag `{}` takes no value, but `{}` was given", flag, value)
            }
            ParseError::InvalidFlagFormat { token } => write!(f, "malformed option `{}`", token),
            ParseError::ArgsMustPrecedeExprs { token } => {
                write!(f, "positional argument `{}` cannot follow an expression", token)
            }
            ParseError::ArgCountUnsatisfied { arg, path, detail } => {
                write!(f, "argument `{}` (in `{}`): {}", arg, path, detail)
            }
            ParseError::RequiredTargetMissing { name, path } => {
                write!(f, "`{}` is required (in `{}`)", name, path)
            }
            ParseError::FileReferenceUnreadable { path_token, io_error } => {
                write!(f, "could not read file reference `{}`: {}", path_token, io_error)
            }
            ParseError::InvalidValue { flag, detail } => write!(f, "invalid value for `{}`: {}", flag, detail),
            ParseError::AmbiguousAbbreviation { token, path } => {
                write!(f, "`{}` is ambiguous (in `{}`)", token, path)
            }
            ParseError::TooManyPositionals { token, path } => {
                write!(f, "unexpected positional argument `{}` (in `{}`)", token, path)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// An error surfaced from within a `Before`/`Action`/`After` pipeline action (spec §4.5)
#[derive(Debug, Clone)]
pub enum DispatchError {
    /// Parsing failed before dispatch could begin
    Parse(ParseError),
    /// An action explicitly failed with a message
    Action { path: Path, message: String },
    /// An action tried to mutate the tree outside of `Initial`
    StructuralMutationOutsideInitial,
    /// The cancellable ambient context was cancelled mid-dispatch
    Cancelled,
    /// An internal invariant was violated (a bug, not a user-facing condition)
    Internal(InternalError),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Parse(e) => write!(f, "{}", e),
            DispatchError::Action { path, message } => write!(f, "{} (in `{}`)", message, path),
            DispatchError::StructuralMutationOutsideInitial => {
                write!(f, "tree mutation attempted outside of the Initial stage")
            }
            DispatchError::Cancelled => write!(f, "dispatch was cancelled"),
            DispatchError::Internal(e) => write!(f, "internal error: {}", e),
        }
    }
}

impl std::error::Error for DispatchError {}

impl From<ParseError> for DispatchError {
    fn from(e: ParseError) -> Self {
        DispatchError::Parse(e)
    }
}

/// A condition that indicates a bug in the framework or in how a host wired up a target, as
/// distinct from a user-facing parsing/dispatch failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalError {
    /// A node id did not refer to the expected kind of node
    WrongNodeKind,
    /// A node id did not exist in the tree it was looked up in
    DanglingNodeId,
}

impl fmt::Display for InternalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InternalError::WrongNodeKind => write!(f, "node id referred to an unexpected node kind"),
            InternalError::DanglingNodeId => write!(f, "node id did not resolve to any node"),
        }
    }
}

impl std::error::Error for InternalError {}

/// The conventional mapping from outcome to process exit code (spec §6 "Exit codes")
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    /// Everything ran to completion without error
    pub const SUCCESS: ExitCode = ExitCode(0);
    /// A generic, otherwise-unclassified failure
    pub const FAILURE: ExitCode = ExitCode(1);
    /// The command line itself could not be parsed
    pub const USAGE: ExitCode = ExitCode(2);

    /// Map a dispatch outcome to the process exit code a host should return
    pub fn from_result(result: &Result<(), DispatchError>) -> ExitCode {
        match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(DispatchError::Parse(_)) => ExitCode::USAGE,
            Err(_) => ExitCode::FAILURE,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code.0
    }
}
