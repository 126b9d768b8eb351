//! Capability tags: the set of kind names an object is compatible with.

use std::fmt;

use indexmap::IndexSet;

/// The kind of an object together with every kind it is compatible with.
///
/// A set always contains its own kind and the full set of each parent it was
/// built from, so compatibility is transitive: a `Dog` extending `Pet`, itself
/// extending `Animal`, is compatible with all three.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KindSet {
    kind: String,
    kinds: IndexSet<String>,
}

impl KindSet {
    /// A kind without parents.
    pub fn new(kind: impl Into<String>) -> Self {
        Self::with_parents(kind, std::iter::empty::<&KindSet>())
    }

    /// A kind inheriting the capability tags of every parent.
    pub fn with_parents<'a>(
        kind: impl Into<String>,
        parents: impl IntoIterator<Item = &'a KindSet>,
    ) -> Self {
        let kind = kind.into();
        let mut kinds = IndexSet::new();
        kinds.insert(kind.clone());
        for parent in parents {
            kinds.extend(parent.kinds.iter().cloned());
        }
        Self { kind, kinds }
    }

    /// The declared kind name.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.kinds.contains(kind)
    }

    /// Whether any of the given kind names is in this set.
    pub fn intersects<'a>(&self, kinds: impl IntoIterator<Item = &'a str>) -> bool {
        kinds.into_iter().any(|kind| self.contains(kind))
    }

    /// Own kind first, then inherited kinds in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.kinds.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl fmt::Display for KindSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.kind)
    }
}
