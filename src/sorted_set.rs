//! Sorted set value type.
//!
//! Members are kept twice: a map from member to score for point lookups and
//! an ordered index of `(score, member)` pairs for rank and range queries.

use std::collections::{BTreeSet, HashMap};

use bytes::Bytes;
use rust_decimal::Decimal;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortedSet {
    scores: HashMap<Bytes, Decimal>,
    index: BTreeSet<(Decimal, Bytes)>,
}

impl SortedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Returns `true` when the member was not present before.
    pub fn insert(&mut self, member: Bytes, score: Decimal) -> bool {
        match self.scores.insert(member.clone(), score) {
            Some(previous) => {
                self.index.remove(&(previous, member.clone()));
                self.index.insert((score, member));
                false
            }
            None => {
                self.index.insert((score, member));
                true
            }
        }
    }

    pub fn remove(&mut self, member: &Bytes) -> bool {
        match self.scores.remove(member) {
            Some(score) => {
                self.index.remove(&(score, member.clone()));
                true
            }
            None => false,
        }
    }

    pub fn score(&self, member: &Bytes) -> Option<Decimal> {
        self.scores.get(member).copied()
    }

    /// 0-based position in ascending `(score, member)` order.
    pub fn rank(&self, member: &Bytes) -> Option<usize> {
        let score = self.scores.get(member)?;

        Some(self.index.range(..(*score, member.clone())).count())
    }

    /// Members between two inclusive rank positions. Negative positions count
    /// from the end.
    pub fn range(&self, start: i64, stop: i64) -> Vec<Bytes> {
        match crate::commands::command_utils::normalize_range(start, stop, self.len()) {
            Some((from, to)) => self
                .index
                .iter()
                .skip(from)
                .take(to - from + 1)
                .map(|(_, member)| member.clone())
                .collect(),
            None => Vec::new(),
        }
    }
}

/// Formats a score the way replies print it: no trailing zeros.
pub fn format_score(score: Decimal) -> String {
    score.normalize().to_string()
}
