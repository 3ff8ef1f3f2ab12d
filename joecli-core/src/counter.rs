// Copyright 2019 Lyndon Brown
//
// This file is part of the `joecli-core` command-line framework library.
//
// Licensed under the MIT license or the Apache license (version 2.0), at your option. You may not
// copy, modify, or distribute this file except in compliance with said license. You can find copies
// of these licenses either in the LICENSE-MIT and LICENSE-APACHE files, or alternatively at
// <http://opensource.org/licenses/MIT> and <http://www.apache.org/licenses/LICENSE-2.0>
// respectively.

//! Positional argument counters
//!
//! A [`Counter`] is a per-arg policy object deciding how many of the positional tokens on the
//! command line a given [`Arg`](../arg/struct.Arg.html) consumes. See spec §4.3.

use std::fmt;

/// Used for expressing a quantity of positional tokens
pub type Quantity = u16;

/// The maximum quantity of positionals a predicate counter will accept before giving up, guarding
/// against a pathological predicate that never returns `false`.
pub const MAX: Quantity = Quantity::MAX;

/// Outcome of offering one token to a [`Counter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Take {
    /// The token was accepted; more may follow
    Continue,
    /// The token was accepted and this is the last one this arg will take; the parser should
    /// advance to the next arg (or subcommand/positional-overflow handling) without consuming a
    /// further token
    EndOfArguments,
    /// The token was not accepted and the arg is already satisfied; the parser should advance to
    /// the next arg and retry this same token there
    Reject,
}

/// Per-arg tokeniser driver (spec §4.3)
///
/// A `Counter` decides, one token at a time, whether a positional [`Arg`](../arg/struct.Arg.html)
/// continues to accept input. `looks_like_flag` tells the counter whether the token would be
/// classified as option-like by the parser (see [`looks_like_flag`]), which several policies use to
/// decide when to stop.
pub trait Counter: fmt::Debug {
    /// Offer one token
    fn take(&mut self, token: &str, looks_like_flag: bool) -> Take;

    /// Post-completion validation, e.g. reporting that fewer tokens were supplied than required
    fn done(&self) -> Result<(), String>;

    /// Number of tokens accepted so far
    fn accepted(&self) -> Quantity;
}

/// A token "looks like a flag" if it begins with `-`, is not the bare `-` (the positional
/// sentinel), and is not the end-of-options marker `--`.
pub fn looks_like_flag(token: &str) -> bool {
    token.starts_with('-') && token != "-" && token != "--"
}

/// The declared shape of an [`Arg`](../arg/struct.Arg.html)'s token count; each variant spawns the
/// corresponding built-in [`Counter`] (spec §4.3's table), or wraps a custom counter/predicate.
#[derive(Debug, Clone)]
pub enum NArg {
    /// Take exactly `n` tokens (`n` >= 1); flag-looking tokens are accepted; ending early is an
    /// error
    Exact(Quantity),
    /// Take one token if available and it does not look like a flag, otherwise accept zero
    Optional,
    /// Take all remaining tokens, including flag-looking ones
    RemainingAll,
    /// Take tokens until a flag-looking token is encountered
    RemainingUntilFlag,
    /// Take tokens while the given predicate returns `true`, up to [`MAX`]
    Predicate(Predicate),
}

/// A boxed predicate used by [`NArg::Predicate`]
#[derive(Clone)]
pub struct Predicate(pub std::rc::Rc<dyn Fn(&str) -> bool>);

impl Predicate {
    /// Wrap a closure as a [`Predicate`]
    pub fn new(f: impl Fn(&str) -> bool + 'static) -> Self {
        Self(std::rc::Rc::new(f))
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<predicate>")
    }
}

impl NArg {
    /// Spawn a fresh [`Counter`] implementing this policy
    pub fn spawn(&self) -> Box<dyn Counter> {
        match self {
            NArg::Exact(n) => Box::new(ExactCounter { required: *n, accepted: 0 }),
            NArg::Optional => Box::new(OptionalCounter { accepted: 0, done: false }),
            NArg::RemainingAll => Box::new(RemainingAllCounter { accepted: 0 }),
            NArg::RemainingUntilFlag => Box::new(RemainingUntilFlagCounter { accepted: 0 }),
            NArg::Predicate(p) => Box::new(PredicateCounter { predicate: p.0.clone(), accepted: 0 }),
        }
    }

    /// Whether this policy can accept more than one token
    pub fn is_multi(&self) -> bool {
        !matches!(self, NArg::Exact(1))
    }
}

#[derive(Debug)]
struct ExactCounter {
    required: Quantity,
    accepted: Quantity,
}

impl Counter for ExactCounter {
    fn take(&mut self, _token: &str, _looks_like_flag: bool) -> Take {
        if self.accepted >= self.required {
            return Take::Reject;
        }
        self.accepted += 1;
        if self.accepted == self.required {
            Take::EndOfArguments
        } else {
            Take::Continue
        }
    }

    fn done(&self) -> Result<(), String> {
        if self.accepted < self.required {
            Err(format!("expected {} argument(s), got {}", self.required, self.accepted))
        } else {
            Ok(())
        }
    }

    fn accepted(&self) -> Quantity {
        self.accepted
    }
}

#[derive(Debug)]
struct OptionalCounter {
    accepted: Quantity,
    done: bool,
}

impl Counter for OptionalCounter {
    fn take(&mut self, _token: &str, looks_like_flag: bool) -> Take {
        if self.done || looks_like_flag {
            return Take::Reject;
        }
        self.accepted += 1;
        self.done = true;
        Take::EndOfArguments
    }

    fn done(&self) -> Result<(), String> {
        Ok(())
    }

    fn accepted(&self) -> Quantity {
        self.accepted
    }
}

#[derive(Debug)]
struct RemainingAllCounter {
    accepted: Quantity,
}

impl Counter for RemainingAllCounter {
    fn take(&mut self, _token: &str, _looks_like_flag: bool) -> Take {
        self.accepted = self.accepted.saturating_add(1);
        Take::Continue
    }

    fn done(&self) -> Result<(), String> {
        Ok(())
    }

    fn accepted(&self) -> Quantity {
        self.accepted
    }
}

#[derive(Debug)]
struct RemainingUntilFlagCounter {
    accepted: Quantity,
}

impl Counter for RemainingUntilFlagCounter {
    fn take(&mut self, _token: &str, looks_like_flag: bool) -> Take {
        if looks_like_flag {
            return Take::Reject;
        }
        self.accepted = self.accepted.saturating_add(1);
        Take::Continue
    }

    fn done(&self) -> Result<(), String> {
        Ok(())
    }

    fn accepted(&self) -> Quantity {
        self.accepted
    }
}

struct PredicateCounter {
    predicate: std::rc::Rc<dyn Fn(&str) -> bool>,
    accepted: Quantity,
}

impl fmt::Debug for PredicateCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateCounter").field("accepted", &self.accepted).finish()
    }
}

impl Counter for PredicateCounter {
    fn take(&mut self, token: &str, _looks_like_flag: bool) -> Take {
        if self.accepted >= MAX || !(self.predicate)(token) {
            return Take::Reject;
        }
        self.accepted += 1;
        Take::Continue
    }

    fn done(&self) -> Result<(), String> {
        Ok(())
    }

    fn accepted(&self) -> Quantity {
        self.accepted
    }
}
