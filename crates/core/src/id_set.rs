//! The resolved identifier set.

use serde::Serialize;

/// The output of identifier resolution: every identifier under which a
/// caller's clinical records might be filed.
///
/// Insertion order is preserved (useful when logging how a set was built);
/// membership is deduplicated. Candidates are trimmed on insert and blank
/// candidates are rejected, so a `ResolvedIds` never contains an empty or
/// whitespace-only string.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedIds(Vec<String>);

impl ResolvedIds {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Insert a candidate identifier, trimming surrounding whitespace.
    ///
    /// Blank candidates and duplicates are ignored. Returns `true` if the
    /// identifier was newly added.
    pub fn insert(&mut self, candidate: &str) -> bool {
        let trimmed = candidate.trim();
        if trimmed.is_empty() || self.0.iter().any(|id| id == trimmed) {
            return false;
        }
        self.0.push(trimmed.to_owned());
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        let trimmed = id.trim();
        self.0.iter().any(|x| x == trimmed)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Order-independent equality, for callers that treat the set as a set.
    pub fn same_ids(&self, other: &ResolvedIds) -> bool {
        self.0.len() == other.0.len() && self.0.iter().all(|id| other.contains(id))
    }
}

impl std::fmt::Display for ResolvedIds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join(", "))
    }
}

impl<'a> FromIterator<&'a str> for ResolvedIds {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        let mut ids = ResolvedIds::new();
        for candidate in iter {
            ids.insert(candidate);
        }
        ids
    }
}
