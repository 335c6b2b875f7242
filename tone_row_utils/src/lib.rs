// tone_row_utils: small collection helpers shared by the analysis crate.
//
// Module overview:
// - `union_find.rs`: Arena-indexed disjoint sets (path compression + union by
//   rank). Used to group row classes into rotation families.
// - `dedup.rs`:      Order-preserving deduplication of hashable values. Used
//   when a caller wants the distinct members of a row-form bag.
//
// Nothing here knows about pitch classes; the analysis crate owns all the
// music-specific types.

pub mod dedup;
pub mod union_find;

pub use dedup::{count_distinct, dedup_in_order};
pub use union_find::DisjointSets;
