//! Route-pattern compilation.
//!
//! All registered patterns are folded into one anchored alternation so a
//! single regex pass matches every route at once, instead of a linear
//! try-each-pattern scan. Each pattern is wrapped in its own capture group;
//! the [`CompiledPattern`] remembers which group index opens each route's
//! branch, so the branch that participated in a match resolves back to the
//! owning route — even when user patterns declare capture groups of their
//! own, which shift every index after them.

use regex::{Captures, Regex};

use crate::error::Error;

/// The combined matcher for a route table snapshot.
///
/// Rebuilt eagerly after every registration. Registration happens at
/// startup, not per request, so recompilation cost is irrelevant next to
/// keeping the artifact trivially consistent with the table.
pub(crate) struct CompiledPattern {
    regex: Regex,
    /// `slots[i]` is the capture-group index of route `i`'s wrapping group.
    slots: Vec<usize>,
}

impl CompiledPattern {
    /// Compiles `patterns` (in registration order) into one matcher.
    ///
    /// Fails if any pattern is rejected by the regex engine, or if the
    /// combined alternation is — which happens when two routes declare a
    /// capture group with the same name. Neither is recoverable: route
    /// registration is a startup-time activity and aborts on bad input.
    pub(crate) fn compile<'a>(
        patterns: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, Error> {
        let mut slots = Vec::new();
        let mut branches = Vec::new();
        let mut next_group = 1;
        for pattern in patterns {
            let re = Regex::new(pattern).map_err(Error::Pattern)?;
            slots.push(next_group);
            // captures_len() counts group 0, which here stands in for the
            // wrapping group this branch gains in the alternation; the
            // pattern's own groups account for the rest.
            next_group += re.captures_len();
            branches.push(format!("({pattern})"));
        }
        let combined = format!(r"\A(?:{})", branches.join("|"));
        let regex = Regex::new(&combined).map_err(Error::Pattern)?;
        Ok(Self { regex, slots })
    }

    /// Matches against the unconsumed path remainder, anchored at its start.
    pub(crate) fn matches<'p>(&self, path: &'p str) -> Option<Captures<'p>> {
        self.regex.captures(path)
    }

    /// Resolves which route's branch participated in `caps`.
    ///
    /// Exactly one alternation branch can match, so this is the first (and
    /// only) wrapping group that is present — preserving registration-order
    /// precedence, since alternation tries branches left to right.
    pub(crate) fn route_index(&self, caps: &Captures<'_>) -> Option<usize> {
        self.slots.iter().position(|&slot| caps.get(slot).is_some())
    }

    /// Named capture groups that participated in `caps`, as owned pairs.
    /// Groups that did not match are omitted — an absent capture must never
    /// overwrite a parameter an outer router already merged.
    pub(crate) fn named_captures(&self, caps: &Captures<'_>) -> Vec<(String, String)> {
        self.regex
            .capture_names()
            .flatten()
            .filter_map(|name| {
                caps.name(name).map(|m| (name.to_owned(), m.as_str().to_owned()))
            })
            .collect()
    }
}
