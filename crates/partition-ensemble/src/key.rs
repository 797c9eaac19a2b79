//! Partition keys.
//!
//! A [`PartitionKey`] records, for every tracked column in order, whether the
//! rows of a partition carry a value seen during training. It renders as the
//! familiar `k`/`u` string (`"kkuk"`) but is stored as booleans so that
//! configuration maps can be checked for exhaustiveness.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Maximum number of tracked columns. Keeps the configuration space (2^k
/// cells) enumerable.
pub const MAX_TRACKED_COLUMNS: usize = 16;

/// Known/unknown pattern across the tracked columns.
///
/// Ordering is position by position with unknown before known, so the
/// all-unknown key sorts first and the all-known key last.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartitionKey {
    known: Vec<bool>,
}

impl PartitionKey {
    pub fn new(known: Vec<bool>) -> Self {
        Self { known }
    }

    /// Key with every position known.
    pub fn all_known(width: usize) -> Self {
        Self::new(vec![true; width])
    }

    /// Key with every position unknown.
    pub fn all_unknown(width: usize) -> Self {
        Self::new(vec![false; width])
    }

    /// Every possible key of the given width, in ascending order.
    pub fn enumerate(width: usize) -> impl Iterator<Item = PartitionKey> {
        let count = 1u64 << width;
        (0..count).map(move |bits| {
            PartitionKey::new((0..width).map(|i| (bits >> (width - 1 - i)) & 1 == 1).collect())
        })
    }

    /// Number of tracked columns this key covers.
    #[inline]
    pub fn width(&self) -> usize {
        self.known.len()
    }

    pub fn known(&self) -> &[bool] {
        &self.known
    }

    /// Positions marked unknown.
    pub fn unknown_positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.known.iter().enumerate().filter(|(_, k)| !**k).map(|(i, _)| i)
    }

    /// Bit pattern with the first position as the most significant bit.
    pub fn bits(&self) -> u64 {
        self.known.iter().fold(0u64, |acc, &k| (acc << 1) | u64::from(k))
    }

    /// Human-readable label: `k<column>` or `u<column>` per position.
    pub fn specifier<S: AsRef<str>>(&self, columns: &[S]) -> String {
        self.known
            .iter()
            .zip(columns)
            .map(|(&k, c)| format!("{}{}", if k { 'k' } else { 'u' }, c.as_ref()))
            .collect()
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &k in &self.known {
            f.write_str(if k { "k" } else { "u" })?;
        }
        Ok(())
    }
}

/// Error parsing a `k`/`u` key string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyParseError {
    #[error("partition key is empty")]
    Empty,
    #[error("invalid character {ch:?} at position {position}, expected 'k' or 'u'")]
    InvalidChar { ch: char, position: usize },
    #[error("partition key has {0} positions, at most {max} are supported", max = MAX_TRACKED_COLUMNS)]
    TooWide(usize),
}

impl FromStr for PartitionKey {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(KeyParseError::Empty);
        }
        let known = s
            .chars()
            .enumerate()
            .map(|(position, ch)| match ch {
                'k' => Ok(true),
                'u' => Ok(false),
                _ => Err(KeyParseError::InvalidChar { ch, position }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        if known.len() > MAX_TRACKED_COLUMNS {
            return Err(KeyParseError::TooWide(known.len()));
        }
        Ok(PartitionKey::new(known))
    }
}

impl Serialize for PartitionKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PartitionKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
