// Order-preserving deduplication.
//
// Keeps the first occurrence of each value and drops later repeats, so the
// output order is a subsequence of the input order. Backed by a hashbrown
// set of references, so values are never cloned.

use hashbrown::HashSet;
use std::hash::Hash;

/// Distinct values of `items`, first occurrence wins.
pub fn dedup_in_order<'a, T, I>(items: I) -> Vec<&'a T>
where
    T: Eq + Hash + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut seen: HashSet<&'a T> = HashSet::new();
    let mut out = Vec::new();
    for item in items {
        if seen.insert(item) {
            out.push(item);
        }
    }
    out
}

/// Number of distinct values in `items`.
pub fn count_distinct<'a, T, I>(items: I) -> usize
where
    T: Eq + Hash + 'a,
    I: IntoIterator<Item = &'a T>,
{
    items.into_iter().collect::<HashSet<&'a T>>().len()
}
