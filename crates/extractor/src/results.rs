use std::collections::HashSet;

/// Accepted locations, deduplicated by value.
///
/// Insertion order is not kept; iterate [`sorted`](Self::sorted) when a stable order
/// is needed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    locations: HashSet<String>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a location. Returns `false` if it was already present.
    pub fn insert(&mut self, location: impl Into<String>) -> bool {
        self.locations.insert(location.into())
    }

    pub fn contains(&self, location: &str) -> bool {
        self.locations.contains(location)
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.locations.iter().map(String::as_str)
    }

    pub fn sorted(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.iter().collect();
        out.sort_unstable();
        out
    }

    pub fn into_inner(self) -> HashSet<String> {
        self.locations
    }
}

impl FromIterator<String> for ResultSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            locations: iter.into_iter().collect(),
        }
    }
}
