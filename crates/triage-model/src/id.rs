//! Hierarchical feedback item identifiers
//!
//! Provides [`ItemId`] for addressing feedback items and the children a split
//! produces from them.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Identifier of a feedback item within one submission
///
/// Top-level segments are numbered in source order starting at 1; every split
/// appends the 1-based ordinal of the child. Identifiers are therefore stable
/// for identical input and sort in source order.
///
/// # Examples
/// - `[2]` → `2` (second segment of the submission)
/// - `[2, 1]` → `2.1` (first child split out of segment 2)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(Vec<u32>);

impl ItemId {
    /// Identifier of a top-level segment
    ///
    /// # Errors
    /// Returns error if `ordinal` is zero
    #[inline]
    pub fn root(ordinal: u32) -> Result<Self, IdError> {
        if ordinal == 0 {
            return Err(IdError::ZeroOrdinal);
        }
        Ok(Self(vec![ordinal]))
    }

    /// Identifier from a 0-based position in source order
    #[inline]
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        Self(vec![ordinal_of(index)])
    }

    /// Ordinals from root to leaf
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[u32] {
        &self.0
    }

    /// Number of splits between the top-level segment and this item
    #[inline]
    #[must_use]
    pub fn depth(&self) -> u32 {
        u32::try_from(self.0.len().saturating_sub(1)).unwrap_or(u32::MAX)
    }

    /// Parent identifier (if this item came out of a split)
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.len() <= 1 {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Identifier of the child at 0-based `index`
    #[inline]
    #[must_use]
    pub fn child(&self, index: usize) -> Self {
        let mut next = self.clone();
        next.0.push(ordinal_of(index));
        next
    }

    /// Check if this item is a strict ancestor of another
    #[inline]
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        self.0.len() < other.0.len() && self.0 == other.0[..self.0.len()]
    }

    /// Top-level segment ordinal
    #[inline]
    #[must_use]
    pub fn segment_ordinal(&self) -> u32 {
        self.0.first().copied().unwrap_or(0)
    }
}

fn ordinal_of(index: usize) -> u32 {
    u32::try_from(index).map_or(u32::MAX, |i| i.saturating_add(1))
}

impl Display for ItemId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(u32::to_string).collect();
        write!(f, "{}", parts.join("."))
    }
}

impl FromStr for ItemId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(IdError::Empty);
        }

        let segments = s
            .split('.')
            .map(|seg| match seg.parse::<u32>() {
                Ok(0) => Err(IdError::ZeroOrdinal),
                Ok(n) => Ok(n),
                Err(_) => Err(IdError::InvalidSegment(seg.to_string())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self(segments))
    }
}

impl serde::Serialize for ItemId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for ItemId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors related to item identifiers
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IdError {
    /// Empty identifier string
    #[error("item id is empty")]
    Empty,

    /// Ordinals are 1-based
    #[error("item id ordinals start at 1")]
    ZeroOrdinal,

    /// Segment is not a number
    #[error("invalid item id segment: {0}")]
    InvalidSegment(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_and_children() {
        let root = ItemId::root(3).unwrap();
        let child = root.child(0);
        assert_eq!(child.to_string(), "3.1");
        assert_eq!(child.depth(), 1);
        assert_eq!(child.parent(), Some(root.clone()));
        assert!(root.is_ancestor_of(&child));
        assert!(!child.is_ancestor_of(&root));
    }

    #[test]
    fn zero_ordinal_rejected() {
        assert_eq!(ItemId::root(0), Err(IdError::ZeroOrdinal));
        assert_eq!("1.0".parse::<ItemId>(), Err(IdError::ZeroOrdinal));
    }

    #[test]
    fn parse_round_trip_and_errors() {
        let id: ItemId = "2.1.4".parse().unwrap();
        assert_eq!(id.segments(), &[2, 1, 4]);
        assert_eq!(id.segment_ordinal(), 2);
        assert!(matches!("".parse::<ItemId>(), Err(IdError::Empty)));
        assert!(matches!("a.b".parse::<ItemId>(), Err(IdError::InvalidSegment(_))));
    }

    #[test]
    fn ordering_follows_source_order() {
        let mut ids = vec![
            ItemId::from_index(1),
            ItemId::from_index(0).child(1),
            ItemId::from_index(0),
            ItemId::from_index(0).child(0),
        ];
        ids.sort();
        let rendered: Vec<String> = ids.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["1", "1.1", "1.2", "2"]);
    }

    #[test]
    fn serde_as_string() {
        let id = ItemId::from_index(0).child(2);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"1.3\"");
        let back: ItemId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
