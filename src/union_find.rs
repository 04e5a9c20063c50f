//! Disjoint-set forest used by Kruskal's algorithm.

use std::collections::HashMap;
use std::hash::Hash;

/// Union-find over any hashable element, with path compression.
///
/// Elements never seen before are treated as singleton sets.
///
/// # Examples
///
/// ```
/// use city_graph::union_find::DisjointSet;
///
/// let mut sets = DisjointSet::new(["a", "b", "c"]);
/// assert_ne!(sets.find("a"), sets.find("b"));
///
/// sets.union("a", "b");
/// assert_eq!(sets.find("a"), sets.find("b"));
/// assert_ne!(sets.find("a"), sets.find("c"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct DisjointSet<T> {
    parent: HashMap<T, T>,
}

impl<T> DisjointSet<T>
where
    T: Copy + Eq + Hash,
{
    /// Creates a forest where every element is its own set.
    pub fn new(elements: impl IntoIterator<Item = T>) -> Self {
        let parent = elements.into_iter().map(|e| (e, e)).collect();
        Self { parent }
    }

    /// Returns the representative of `item`'s set.
    ///
    /// Every node on the walked path is re-parented directly to the root.
    pub fn find(&mut self, item: T) -> T {
        let mut root = *self.parent.entry(item).or_insert(item);
        loop {
            let next = self.parent[&root];
            if next == root {
                break;
            }
            root = next;
        }

        let mut current = item;
        while current != root {
            let next = self.parent[&current];
            self.parent.insert(current, root);
            current = next;
        }

        root
    }

    /// Merges the sets containing `a` and `b`.
    ///
    /// Returns false if they were already in the same set.
    pub fn union(&mut self, a: T, b: T) -> bool {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return false;
        }
        self.parent.insert(root_a, root_b);
        true
    }

    /// Number of elements tracked so far.
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    #[cfg(test)]
    fn parent_of(&self, item: T) -> Option<T> {
        self.parent.get(&item).copied()
    }
}
