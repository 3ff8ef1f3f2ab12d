// Copyright 2019 Lyndon Brown
//
// This file is part of the `joecli-core` command-line framework library.
//
// Licensed under the MIT license or the Apache license (version 2.0), at your option. You may not
// copy, modify, or distribute this file except in compliance with said license. You can find copies
// of these licenses either in the LICENSE-MIT and LICENSE-APACHE files, or alternatively at
// <http://opensource.org/licenses/MIT> and <http://www.apache.org/licenses/LICENSE-2.0>
// respectively.

//! Name matching
//!
//! Long option and subcommand names may be abbreviated to any unambiguous prefix (spec §4.4
//! "Abbreviated long-name matching"). `find_name_match` walks a candidate set once, tracking
//! whether more than one candidate shares a prefix, the same one-pass approach `gong`'s matcher
//! in `matching.rs` uses, adapted from `OsStr` byte-slicing to plain `&str` char-boundary slicing
//! since this crate does not attempt to support non-UTF-8 argument vectors.

/// The result of attempting to resolve a token against a named candidate set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome<T> {
    /// No candidate's name, alias, or unambiguous abbreviation matched
    NoMatch,
    /// Exactly one candidate matched (exactly, or as the sole abbreviation match)
    Match(T),
    /// The token abbreviated more than one candidate with no exact match to break the tie
    Ambiguous,
}

impl<T> MatchOutcome<T> {
    /// Whether this is a [`MatchOutcome::Match`]
    pub fn is_match(&self) -> bool {
        matches!(self, MatchOutcome::Match(_))
    }
}

/// Find a match for `needle` among `haystack`, an iterator of `(item, primary_name, aliases)`
/// triples. An exact match against any name/alias wins outright and overrides any ambiguity found
/// among abbreviation matches so far. Otherwise, if `needle` is a proper prefix of exactly one
/// candidate's primary name or alias, that candidate matches; a prefix of more than one is
/// ambiguous.
pub fn find_name_match<'a, T>(
    needle: &str,
    haystack: impl Iterator<Item = (T, &'a str, &'a [String])>,
) -> MatchOutcome<T> {
    let mut matched: Option<T> = None;
    let mut ambiguous = false;

    for (item, primary, aliases) in haystack {
        let names = std::iter::once(primary).chain(aliases.iter().map(String::as_str));
        let mut exact = false;
        let mut prefix = false;
        for name in names {
            if name == needle {
                exact = true;
                break;
            }
            if !ambiguous && needle.len() < name.len() && name.starts_with(needle) {
                prefix = true;
            }
        }
        if exact {
            return MatchOutcome::Match(item);
        }
        if prefix {
            match matched {
                Some(_) => ambiguous = true,
                None => matched = Some(item),
            }
        }
    }

    match matched {
        Some(item) if !ambiguous => MatchOutcome::Match(item),
        Some(_) => MatchOutcome::Ambiguous,
        None => MatchOutcome::NoMatch,
    }
}

/// "Did you mean...?" suggestion support (spec §4.4, optional `suggestions` feature), ranking
/// candidates by Jaro-Winkler similarity the way `gong`'s own `suggestions` feature does via the
/// same `strsim` crate.
#[cfg(feature = "suggestions")]
pub fn suggest<'a>(needle: &str, candidates: impl Iterator<Item = &'a str>, max: usize) -> Vec<&'a str> {
    let mut scored: Vec<(f64, &str)> =
        candidates.map(|c| (strsim::jaro_winkler(needle, c), c)).collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.retain(|(score, _)| *score > 0.7);
    scored.truncate(max);
    scored.into_iter().map(|(_, name)| name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand<'a>(items: &'a [(i32, &'a str, &'a [String])]) -> impl Iterator<Item = (i32, &'a str, &'a [String])> {
        items.iter().map(|(id, name, aliases)| (*id, *name, *aliases))
    }

    #[test]
    fn exact_match_wins_over_ambiguous_prefix() {
        let empty: [String; 0] = [];
        let items = [(1, "gen", empty.as_slice()), (2, "generate", empty.as_slice())];
        assert_eq!(find_name_match("gen", cand(&items)), MatchOutcome::Match(1));
    }

    #[test]
    fn unambiguous_prefix_matches() {
        let empty: [String; 0] = [];
        let items = [(1, "generate", empty.as_slice()), (2, "build", empty.as_slice())];
        assert_eq!(find_name_match("gen", cand(&items)), MatchOutcome::Match(1));
    }

    #[test]
    fn ambiguous_prefix_reported() {
        let empty: [String; 0] = [];
        let items = [(1, "generate", empty.as_slice()), (2, "general", empty.as_slice())];
        assert_eq!(find_name_match("gen", cand(&items)), MatchOutcome::Ambiguous);
    }

    #[test]
    fn no_match_for_unrelated_token() {
        let empty: [String; 0] = [];
        let items = [(1, "generate", empty.as_slice())];
        assert_eq!(find_name_match("zzz", cand(&items)), MatchOutcome::NoMatch);
    }
}
