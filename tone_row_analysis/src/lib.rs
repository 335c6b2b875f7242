// Tone row analysis
//
// Algebra and catalog tooling for twelve-tone (and general mod-m) rows. A
// row is identified up to transposition by its interval vector; its 48 forms
// are the 12 transpositions of the four families P, I, R and RI; the row
// class is the lexicographically smallest of the four family vectors.
//
// Architecture:
// - pitch.rs: PitchSequence / IntervalVector value types and the algebra
//   (transpose, invert, retrograde, rotate, intervals, row rebuild)
// - forms.rs: TransformationFamily and the 48-form generator with lookup and
//   validation of candidate forms
// - canonical.rs: row class selection, ambiguity reporting, family relabelling
// - rotation.rs: rotation equivalence between classes (pairwise scan or
//   necklace buckets), families via union-find, form-level rotations,
//   whole-row rotations
// - hexachord.rs: half splitting and independent half rotations
// - catalog.rs: batch pass over many rows with per-row failure isolation
// - config.rs: JSON-loadable analysis settings
// - error.rs: DomainError and the crate-level Error
//
// Everything is pure and deterministic. The only optional parallelism is the
// all-pairs rotation scan.

pub mod canonical;
pub mod catalog;
pub mod config;
pub mod error;
pub mod forms;
pub mod hexachord;
pub mod pitch;
pub mod rotation;

pub use canonical::{CanonicalForm, canonicalize, canonicalize_pattern, canonicalize_row};
pub use catalog::{CatalogEntry, CatalogReport, analyze_catalog};
pub use config::AnalysisConfig;
pub use error::{DomainError, Error, Result};
pub use forms::{RowForm, RowFormSet, TransformationFamily, generate_row_forms};
pub use pitch::{IntervalVector, Modulus, PitchSequence};
pub use rotation::{ClassRotation, RotationDetector, RotationRelation, RotationStrategy};
