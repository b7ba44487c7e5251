//! Sorted-key diff of partitions and columns.
//!
//! A [`Collection`] is a key-sorted snapshot of catalog entities. Two
//! collections are compared with a merge-join ([`diff_iterable`]) that
//! classifies every key as added, removed or changed:
//!
//! ```text
//! left  (current):  a       c
//! right (desired):      b   c
//!                   │   │   │
//! visits:       Removed Added Changed
//! ```
//!
//! Keys present on both sides are always reported as changed; no deep
//! comparison happens here. Callers that want to skip no-op writes compare
//! the values themselves.

use serde::{Deserialize, Serialize};

use super::types::{Column, Partition};

/// Classification of a key in a diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifferenceType {
    /// Only on the right (desired) side.
    Added,
    /// Only on the left (current) side.
    Removed,
    /// On both sides.
    Changed,
}

/// One classified key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Difference<T> {
    /// Classification.
    #[serde(rename = "type")]
    pub kind: DifferenceType,
    /// Diff key.
    pub key: String,
    /// Right-side value for added/changed keys, left-side for removed.
    pub value: T,
}

/// Differences in ascending key order.
pub type Differences<T> = Vec<Difference<T>>;

/// A key-sorted, read-only sequence of entities.
pub trait Collection {
    /// Entity type.
    type Item;

    /// Number of entities.
    fn len(&self) -> usize;

    /// Whether the collection is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Diff key of the `i`th entity. Keys ascend with `i`.
    fn key(&self, i: usize) -> &str;

    /// The `i`th entity.
    fn value(&self, i: usize) -> &Self::Item;
}

/// Entities paired with their keys, sorted by key.
#[derive(Debug, Clone)]
struct Keyed<T> {
    entries: Vec<(String, T)>,
}

impl<T> Keyed<T> {
    fn new(items: impl IntoIterator<Item = T>, key: impl Fn(&T) -> String) -> Self {
        let mut entries: Vec<(String, T)> = items.into_iter().map(|v| (key(&v), v)).collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Self { entries }
    }
}

/// Partitions keyed by their joined values.
#[derive(Debug, Clone)]
pub struct PartitionCollection(Keyed<Partition>);

impl PartitionCollection {
    /// Build a sorted collection.
    pub fn new(partitions: impl IntoIterator<Item = Partition>) -> Self {
        Self(Keyed::new(partitions, Partition::key))
    }
}

impl Collection for PartitionCollection {
    type Item = Partition;

    fn len(&self) -> usize {
        self.0.entries.len()
    }

    fn key(&self, i: usize) -> &str {
        &self.0.entries[i].0
    }

    fn value(&self, i: usize) -> &Partition {
        &self.0.entries[i].1
    }
}

/// Columns keyed by name.
#[derive(Debug, Clone)]
pub struct ColumnCollection(Keyed<Column>);

impl ColumnCollection {
    /// Build a sorted collection.
    pub fn new(columns: impl IntoIterator<Item = Column>) -> Self {
        Self(Keyed::new(columns, |c| c.name.clone()))
    }
}

impl Collection for ColumnCollection {
    type Item = Column;

    fn len(&self) -> usize {
        self.0.entries.len()
    }

    fn key(&self, i: usize) -> &str {
        &self.0.entries[i].0
    }

    fn value(&self, i: usize) -> &Column {
        &self.0.entries[i].1
    }
}

/// Merge-join two sorted collections, visiting every key once in ascending
/// order.
///
/// `left` is the current state and `right` the desired one. The first error
/// returned by `visit` stops the join and is returned.
pub fn diff_iterable<L, R, E, F>(left: &L, right: &R, mut visit: F) -> Result<(), E>
where
    L: Collection,
    R: Collection<Item = L::Item>,
    F: FnMut(DifferenceType, &L::Item, &str) -> Result<(), E>,
{
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        let (lk, rk) = (left.key(i), right.key(j));
        match lk.cmp(rk) {
            std::cmp::Ordering::Less => {
                visit(DifferenceType::Removed, left.value(i), lk)?;
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                visit(DifferenceType::Added, right.value(j), rk)?;
                j += 1;
            }
            std::cmp::Ordering::Equal => {
                visit(DifferenceType::Changed, right.value(j), rk)?;
                i += 1;
                j += 1;
            }
        }
    }
    for i in i..left.len() {
        visit(DifferenceType::Removed, left.value(i), left.key(i))?;
    }
    for j in j..right.len() {
        visit(DifferenceType::Added, right.value(j), right.key(j))?;
    }
    Ok(())
}

/// Collect the differences between two collections.
pub fn diff<L, R>(left: &L, right: &R) -> Differences<L::Item>
where
    L: Collection,
    R: Collection<Item = L::Item>,
    L::Item: Clone,
{
    let mut out = Vec::with_capacity(left.len().max(right.len()));
    let _ = diff_iterable(left, right, |kind, value, key| {
        out.push(Difference {
            kind,
            key: key.to_string(),
            value: value.clone(),
        });
        Ok::<(), std::convert::Infallible>(())
    });
    out
}

/// Column and partition differences between two tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaDiff {
    /// Column differences.
    pub columns_diff: Differences<Column>,
    /// Partition differences.
    pub partition_diff: Differences<Partition>,
}

impl MetaDiff {
    /// Whether both sides have the same columns and partition keys.
    ///
    /// Changed entries count as equal here since the diff does not compare
    /// values.
    pub fn is_key_equal(&self) -> bool {
        self.columns_diff
            .iter()
            .all(|d| d.kind == DifferenceType::Changed)
            && self
                .partition_diff
                .iter()
                .all(|d| d.kind == DifferenceType::Changed)
    }
}
