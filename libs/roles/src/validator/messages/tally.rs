//! Majority tally over the votes of a single (height, round, stage).
use super::FactHash;
use std::collections::BTreeMap;

/// Outcome of a tally.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tally {
    /// No fact has enough votes yet, but one still can get them.
    NotYet,
    /// No fact can get enough votes anymore.
    Draw,
    /// The fact got at least the required number of votes.
    Majority(FactHash),
}

/// Decides the outcome of a vote, given the `total` number of voters,
/// the `required` number of matching votes and the fact each voter chose.
///
/// The outcome depends only on the multiset of the votes.
/// `required` larger than `total` is clamped to `total`, so that a single
/// node can bootstrap a network on its own.
pub fn find_majority<'a>(
    total: u32,
    required: u32,
    votes: impl IntoIterator<Item = &'a FactHash>,
) -> Tally {
    let required = u64::from(required.min(total));
    let mut counts = BTreeMap::<&FactHash, u64>::new();
    for v in votes {
        *counts.entry(v).or_default() += 1;
    }
    let sum: u64 = counts.values().sum();
    // The fact with the most votes wins, ties are broken by the smallest hash.
    let Some((top_fact, top)) = counts
        .iter()
        .map(|(f, c)| (*f, *c))
        .min_by_key(|(f, c)| (std::cmp::Reverse(*c), *f))
    else {
        return Tally::NotYet;
    };
    if top >= required {
        return Tally::Majority(*top_fact);
    }
    // Even if every remaining voter picked the leading fact, it would not win.
    if u64::from(total).saturating_sub(sum) + top < required {
        return Tally::Draw;
    }
    Tally::NotYet
}
