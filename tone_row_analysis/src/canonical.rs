// Canonical row class selection.
//
// A row's four family vectors (P, I, R, RI) name the same family of row
// forms. The row class is the lexicographically smallest of them, compared
// as integer tuples. When several families produce that same smallest
// vector the result is ambiguous and the full label set is kept; it is
// never narrowed to a single label.
//
// Because every family is an involution, the winning label also maps the
// canonical vector back onto the original one. `identify_families` answers
// the general "which labels relate these two vectors" question.

use crate::error::DomainError;
use crate::forms::{TransformationFamily, family_vectors};
use crate::pitch::{IntervalVector, PitchSequence};
use serde::Serialize;
use std::collections::BTreeSet;

/// The chosen row class and every family label that produces it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct CanonicalForm {
    pub row_class: IntervalVector,
    pub families: BTreeSet<TransformationFamily>,
}

impl CanonicalForm {
    /// More than one family ties for the smallest vector.
    pub fn is_ambiguous(&self) -> bool {
        self.families.len() > 1
    }

    /// The single winning family, or `None` when ambiguous.
    pub fn family(&self) -> Option<TransformationFamily> {
        if self.is_ambiguous() {
            None
        } else {
            self.families.iter().next().copied()
        }
    }

    /// The row class realised as a row starting on pitch class 0.
    pub fn representative_row(&self) -> PitchSequence {
        self.row_class.to_row(0)
    }

    /// Recover the vector of the row this class was computed from, given the
    /// label it was reached through. Every label is an involution.
    pub fn original_vector(&self, via: TransformationFamily) -> IntervalVector {
        via.apply_to_vector(&self.row_class)
    }
}

/// Pick the smallest vector among labelled candidates.
///
/// Candidates must share length and modulus and carry distinct labels. The
/// result does not depend on the order of `candidates`.
pub fn canonicalize(
    candidates: &[(TransformationFamily, IntervalVector)],
) -> Result<CanonicalForm, DomainError> {
    let Some((_, first)) = candidates.first() else {
        return Err(DomainError::NoCandidates);
    };

    let mut labels = BTreeSet::new();
    for (family, vector) in candidates {
        if !labels.insert(*family) {
            return Err(DomainError::DuplicateFamily(*family));
        }
        if vector.modulus() != first.modulus() {
            return Err(DomainError::ModulusMismatch {
                left: first.modulus().get(),
                right: vector.modulus().get(),
            });
        }
        if vector.len() != first.len() {
            return Err(DomainError::LengthMismatch {
                left: first.len(),
                right: vector.len(),
            });
        }
    }

    let mut best = first;
    for (_, vector) in candidates {
        if vector < best {
            best = vector;
        }
    }
    let families = candidates
        .iter()
        .filter(|(_, vector)| vector == best)
        .map(|(family, _)| *family)
        .collect();

    Ok(CanonicalForm {
        row_class: best.clone(),
        families,
    })
}

/// Canonical class of an interval pattern, from its four family vectors.
pub fn canonicalize_pattern(vector: &IntervalVector) -> CanonicalForm {
    let candidates = family_vectors(vector);
    let best = candidates
        .iter()
        .map(|(_, v)| v)
        .min()
        .unwrap_or(vector)
        .clone();
    let families = candidates
        .iter()
        .filter(|(_, v)| *v == best)
        .map(|(family, _)| *family)
        .collect();
    CanonicalForm {
        row_class: best,
        families,
    }
}

/// Canonical class of a concrete row.
pub fn canonicalize_row(row: &PitchSequence) -> Result<CanonicalForm, DomainError> {
    Ok(canonicalize_pattern(&row.intervals()?))
}

/// Every family label `f` with `f(from) == to`.
///
/// Empty when the vectors belong to different row classes.
pub fn identify_families(
    from: &IntervalVector,
    to: &IntervalVector,
) -> BTreeSet<TransformationFamily> {
    if from.len() != to.len() || from.modulus() != to.modulus() {
        return BTreeSet::new();
    }
    TransformationFamily::ALL
        .into_iter()
        .filter(|family| &family.apply_to_vector(from) == to)
        .collect()
}
