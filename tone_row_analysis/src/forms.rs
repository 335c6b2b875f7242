// Row form generation: the 48 members of a row's family.
//
// A base row P0 is expanded into four transformation families (P, I, R, RI)
// times every transposition of the modulus. With modulus 12 and an 11-step
// interval vector that is 4 x 12 = 48 twelve-element rows.
//
// Conventions:
// - I0 is the zero-axis inversion of P0 (`PitchSequence::invert`).
// - R0 = retrograde(P0), RI0 = retrograde(I0).
// - Form `Xn` is `transpose(X0, n)`. For R and RI that equals the retrograde
//   of Pn / In, so Rn ends on the pitch Pn starts on.
//
// The output is a bag, not a set. Degenerate patterns (all zeros, all
// semitones, ...) make different labels collide on the same sequence, and
// the generator keeps every copy. `distinct()` reduces on request.
//
// Also provides the interval vectors of the four families, used by
// canonical.rs, and form location/validation against a candidate list.

use crate::error::DomainError;
use crate::pitch::{IntervalVector, PitchSequence};
use serde::{Deserialize, Serialize};
use std::fmt;
use tone_row_utils::{count_distinct, dedup_in_order};

/// The four classical transformation families.
///
/// Together with the identity they form a Klein four-group: every family is
/// its own inverse and composition is "toggle inversion" x "toggle retrograde".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TransformationFamily {
    #[serde(rename = "P")]
    Prime,
    #[serde(rename = "I")]
    Inversion,
    #[serde(rename = "R")]
    Retrograde,
    #[serde(rename = "RI")]
    RetrogradeInversion,
}

impl TransformationFamily {
    /// Generation order: P, I, R, RI.
    pub const ALL: [TransformationFamily; 4] = [
        TransformationFamily::Prime,
        TransformationFamily::Inversion,
        TransformationFamily::Retrograde,
        TransformationFamily::RetrogradeInversion,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TransformationFamily::Prime => "P",
            TransformationFamily::Inversion => "I",
            TransformationFamily::Retrograde => "R",
            TransformationFamily::RetrogradeInversion => "RI",
        }
    }

    fn inverts(self) -> bool {
        matches!(
            self,
            TransformationFamily::Inversion | TransformationFamily::RetrogradeInversion
        )
    }

    fn retrogrades(self) -> bool {
        matches!(
            self,
            TransformationFamily::Retrograde | TransformationFamily::RetrogradeInversion
        )
    }

    fn from_flags(inverts: bool, retrogrades: bool) -> Self {
        match (inverts, retrogrades) {
            (false, false) => TransformationFamily::Prime,
            (true, false) => TransformationFamily::Inversion,
            (false, true) => TransformationFamily::Retrograde,
            (true, true) => TransformationFamily::RetrogradeInversion,
        }
    }

    /// Group product: applying `self` then `other`.
    pub fn then(self, other: TransformationFamily) -> TransformationFamily {
        Self::from_flags(
            self.inverts() != other.inverts(),
            self.retrogrades() != other.retrogrades(),
        )
    }

    /// The untransposed family member of `base` (zero-axis inversion).
    pub fn apply_to_row(self, base: &PitchSequence) -> PitchSequence {
        let inverted = if self.inverts() { base.invert() } else { base.clone() };
        if self.retrogrades() {
            inverted.retrograde()
        } else {
            inverted
        }
    }

    /// The interval vector of the family member whose prime has vector `v`:
    /// P -> v, I -> -v, R -> reverse(-v), RI -> reverse(v).
    ///
    /// These follow from the generated rows. Some older row catalogs label
    /// reverse(v) as R and reverse(-v) as RI; their R/RI tags are swapped
    /// relative to these (the chromatic scale, for instance, ties P with RI
    /// here).
    pub fn apply_to_vector(self, v: &IntervalVector) -> IntervalVector {
        // Retrograde reverses the row, which both reverses and negates steps.
        match self {
            TransformationFamily::Prime => v.clone(),
            TransformationFamily::Inversion => v.negate(),
            TransformationFamily::Retrograde => v.negate().reverse(),
            TransformationFamily::RetrogradeInversion => v.reverse(),
        }
    }
}

impl fmt::Display for TransformationFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The interval vectors of all four families of `v`, in P, I, R, RI order.
pub fn family_vectors(v: &IntervalVector) -> [(TransformationFamily, IntervalVector); 4] {
    TransformationFamily::ALL.map(|family| (family, family.apply_to_vector(v)))
}

/// One labelled member of a row family, e.g. RI7.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RowForm {
    pub family: TransformationFamily,
    /// Transposition applied to the family's base form.
    pub transposition: u32,
    pub pitches: PitchSequence,
}

impl fmt::Display for RowForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.family, self.transposition)
    }
}

/// Result of checking a list of candidate rows against a generated family.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FormValidation {
    /// Candidates that no family member produces, in input order.
    pub foreign: Vec<PitchSequence>,
    /// Candidates that do belong to the family.
    pub matched: usize,
    /// Number of distinct sequences the family contains.
    pub derivable: usize,
}

impl FormValidation {
    pub fn is_consistent(&self) -> bool {
        self.foreign.is_empty()
    }
}

/// All row forms generated from one base row, in P, I, R, RI order and
/// ascending transposition within each family.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RowFormSet {
    base: PitchSequence,
    forms: Vec<RowForm>,
}

impl RowFormSet {
    /// Expand `base` as P0 without renormalizing its first pitch.
    pub fn from_base(base: PitchSequence) -> Result<Self, DomainError> {
        if base.len() < 2 {
            return Err(DomainError::SequenceTooShort(base.len()));
        }
        Ok(Self::expand(base))
    }

    /// Expand an interval pattern, with P0 starting on pitch class 0.
    pub fn from_intervals(vector: &IntervalVector) -> Self {
        Self::expand(vector.to_row(0))
    }

    fn expand(base: PitchSequence) -> Self {
        let steps = base.modulus().get();
        let mut forms = Vec::with_capacity(4 * steps as usize);
        for family in TransformationFamily::ALL {
            let family_base = family.apply_to_row(&base);
            for n in 0..steps {
                forms.push(RowForm {
                    family,
                    transposition: n,
                    pitches: family_base.transpose(i64::from(n)),
                });
            }
        }
        Self { base, forms }
    }

    /// Expand a concrete row by its interval pattern (P0 moved to pitch 0).
    pub fn from_row(row: &PitchSequence) -> Result<Self, DomainError> {
        Ok(Self::from_intervals(&row.intervals()?))
    }

    pub fn base(&self) -> &PitchSequence {
        &self.base
    }

    pub fn forms(&self) -> &[RowForm] {
        &self.forms
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RowForm> {
        self.forms.iter()
    }

    pub fn family(&self, family: TransformationFamily) -> impl Iterator<Item = &RowForm> + '_ {
        self.forms.iter().filter(move |f| f.family == family)
    }

    pub fn get(&self, family: TransformationFamily, transposition: u32) -> Option<&RowForm> {
        self.forms
            .iter()
            .find(|f| f.family == family && f.transposition == transposition)
    }

    /// Interval vectors of the four families of the base row.
    pub fn family_vectors(&self) -> Result<[(TransformationFamily, IntervalVector); 4], DomainError> {
        Ok(family_vectors(&self.base.intervals()?))
    }

    /// Distinct sequences in generation order.
    pub fn distinct(&self) -> Vec<&PitchSequence> {
        dedup_in_order(self.forms.iter().map(|f| &f.pitches))
    }

    /// True when two labels produce the same sequence.
    pub fn has_collisions(&self) -> bool {
        count_distinct(self.forms.iter().map(|f| &f.pitches)) < self.forms.len()
    }

    /// Every label whose form equals `candidate`.
    pub fn locate(&self, candidate: &PitchSequence) -> Vec<(TransformationFamily, u32)> {
        self.forms
            .iter()
            .filter(|f| &f.pitches == candidate)
            .map(|f| (f.family, f.transposition))
            .collect()
    }

    pub fn contains(&self, candidate: &PitchSequence) -> bool {
        self.forms.iter().any(|f| &f.pitches == candidate)
    }

    /// Check which `candidates` the family cannot produce.
    pub fn validate(&self, candidates: &[PitchSequence]) -> FormValidation {
        let distinct = self.distinct();
        let mut validation = FormValidation {
            derivable: distinct.len(),
            ..Default::default()
        };
        for candidate in candidates {
            if distinct.contains(&candidate) {
                validation.matched += 1;
            } else {
                validation.foreign.push(candidate.clone());
            }
        }
        validation
    }
}

impl<'a> IntoIterator for &'a RowFormSet {
    type Item = &'a RowForm;
    type IntoIter = std::slice::Iter<'a, RowForm>;

    fn into_iter(self) -> Self::IntoIter {
        self.forms.iter()
    }
}

/// Expand an interval pattern into its full bag of row forms.
pub fn generate_row_forms(vector: &IntervalVector) -> RowFormSet {
    RowFormSet::from_intervals(vector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch::Modulus;
    use super::TransformationFamily::*;

    fn iv(text: &str) -> IntervalVector {
        IntervalVector::parse(text, Modulus::TWELVE).unwrap()
    }

    fn seq(pitches: &[i64]) -> PitchSequence {
        PitchSequence::new(pitches.iter().copied(), Modulus::TWELVE)
    }

    #[test]
    fn test_always_48_forms() {
        for text in [
            "1_3_1_6_11_5_4_2_9_2_6",
            "1_1_1_1_1_1_1_1_1_1_1",
            "0_0_0_0_0_0_0_0_0_0_0",
            "2_2_1_3_2_8_1_2_2_2_2",
        ] {
            let set = generate_row_forms(&iv(text));
            assert_eq!(set.len(), 48, "{text}");
            for family in TransformationFamily::ALL {
                assert_eq!(set.family(family).count(), 12);
            }
        }
    }

    #[test]
    fn test_base_forms() {
        let set = generate_row_forms(&iv("1_3_1_6_11_5_4_2_9_2_6"));
        let p0 = set.get(Prime, 0).unwrap();
        assert_eq!(p0.pitches, seq(&[0, 1, 4, 5, 11, 10, 3, 7, 9, 6, 8, 2]));
        let i0 = set.get(Inversion, 0).unwrap();
        assert_eq!(i0.pitches, seq(&[0, 11, 8, 7, 1, 2, 9, 5, 3, 6, 4, 10]));
        let r0 = set.get(Retrograde, 0).unwrap();
        assert_eq!(r0.pitches, p0.pitches.retrograde());
        let ri0 = set.get(RetrogradeInversion, 0).unwrap();
        assert_eq!(ri0.pitches, i0.pitches.retrograde());
    }

    #[test]
    fn test_transposed_retrograde_is_retrograde_of_transposed_prime() {
        let set = generate_row_forms(&iv("2_8_11_7_2_1_8_8_6_3_5"));
        for n in 0..12 {
            let pn = &set.get(Prime, n).unwrap().pitches;
            let rn = &set.get(Retrograde, n).unwrap().pitches;
            assert_eq!(rn, &pn.retrograde());
            assert_eq!(pn.first(), Some(n));
        }
    }

    #[test]
    fn test_wedge_pattern_retrograde_coincides_with_prime() {
        // R reverses and negates the steps, which maps 1_2_..._11 onto
        // itself, so every Rn is some Pm and every RIn some Im.
        let v = iv("1_2_3_4_5_6_7_8_9_10_11");
        let set = generate_row_forms(&v);
        assert_eq!(set.len(), 48);
        assert!(set.has_collisions());
        assert_eq!(set.distinct().len(), 24);
        assert_eq!(
            set.locate(&set.get(Retrograde, 0).unwrap().pitches),
            vec![(Prime, 6), (Retrograde, 0)]
        );
        assert!(!set.base().is_aggregate());
    }

    #[test]
    fn test_non_degenerate_row_has_no_collisions() {
        let set = generate_row_forms(&iv("1_3_1_6_11_5_4_2_9_2_6"));
        assert!(!set.has_collisions());
        assert_eq!(set.distinct().len(), 48);
        assert!(set.base().is_aggregate());
    }

    #[test]
    fn test_degenerate_pattern_keeps_duplicates() {
        let set = generate_row_forms(&iv("0_0_0_0_0_0_0_0_0_0_0"));
        assert_eq!(set.len(), 48);
        assert!(set.has_collisions());
        // Every form is a constant row; only 12 distinct ones exist.
        assert_eq!(set.distinct().len(), 12);
        assert_eq!(set.locate(&seq(&[0; 12])).len(), 4);
    }

    #[test]
    fn test_chromatic_scale_collides() {
        let set = generate_row_forms(&iv("1_1_1_1_1_1_1_1_1_1_1"));
        assert!(set.has_collisions());
        // P0 read backwards is the descending scale from 11, i.e. I11.
        let labels = set.locate(&seq(&[11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0]));
        assert!(labels.contains(&(Inversion, 11)));
        assert!(labels.contains(&(Retrograde, 0)));
    }

    #[test]
    fn test_family_vectors_match_generated_rows() {
        let v = iv("2_8_11_7_2_1_8_8_6_3_5");
        let set = generate_row_forms(&v);
        for (family, vector) in family_vectors(&v) {
            for form in set.family(family) {
                assert_eq!(form.pitches.intervals().unwrap(), vector, "{form}");
            }
        }
        assert_eq!(set.family_vectors().unwrap(), family_vectors(&v));
    }

    #[test]
    fn test_retrograde_vector_reverses_and_negates() {
        let v = iv("1_3_1_6");
        let set = generate_row_forms(&v);
        let r0 = set.get(Retrograde, 0).unwrap().pitches.intervals().unwrap();
        let ri0 = set.get(RetrogradeInversion, 0).unwrap().pitches.intervals().unwrap();
        assert_eq!(r0, iv("6_11_9_11"));
        assert_eq!(ri0, iv("6_1_3_1"));
        assert_eq!(Retrograde.apply_to_vector(&v), r0);
        assert_eq!(RetrogradeInversion.apply_to_vector(&v), ri0);
        assert_eq!(RetrogradeInversion.apply_to_vector(&v), v.reverse());
    }

    #[test]
    fn test_family_group_structure() {
        for a in TransformationFamily::ALL {
            assert_eq!(a.then(a), Prime);
            assert_eq!(Prime.then(a), a);
            for b in TransformationFamily::ALL {
                assert_eq!(a.then(b), b.then(a));
            }
        }
        assert_eq!(Inversion.then(Retrograde), RetrogradeInversion);
        let v = iv("1_3_1_6");
        for a in TransformationFamily::ALL {
            for b in TransformationFamily::ALL {
                assert_eq!(
                    b.apply_to_vector(&a.apply_to_vector(&v)),
                    a.then(b).apply_to_vector(&v)
                );
            }
        }
    }

    #[test]
    fn test_from_row_normalizes_start() {
        let row = seq(&[5, 6, 9, 10]);
        let set = RowFormSet::from_row(&row).unwrap();
        assert_eq!(set.base(), &seq(&[0, 1, 4, 5]));
        assert_eq!(set.get(Prime, 5).unwrap().pitches, row);
        assert_eq!(
            RowFormSet::from_row(&seq(&[3])),
            Err(DomainError::SequenceTooShort(1))
        );
    }

    #[test]
    fn test_from_base_keeps_start() {
        let base = seq(&[5, 6, 9]);
        let set = RowFormSet::from_base(base.clone()).unwrap();
        assert_eq!(set.get(Prime, 0).unwrap().pitches, base);
        assert_eq!(set.get(Inversion, 0).unwrap().pitches, seq(&[7, 6, 3]));
        assert_eq!(set.get(Inversion, 2).unwrap().pitches, seq(&[9, 8, 5]));
        assert_eq!(
            RowFormSet::from_base(seq(&[1])),
            Err(DomainError::SequenceTooShort(1))
        );
    }

    #[test]
    fn test_other_modulus_form_count() {
        let m = Modulus::new(7).unwrap();
        let v = IntervalVector::from_raw(&[1, 2, 3, 4, 5, 6], m).unwrap();
        let set = generate_row_forms(&v);
        assert_eq!(set.len(), 28);
        assert!(set.iter().all(|f| f.pitches.modulus() == m));
    }

    #[test]
    fn test_validate_reports_foreign_forms() {
        let set = generate_row_forms(&iv("1_3_1_6_11_5_4_2_9_2_6"));
        let good = set.get(RetrogradeInversion, 4).unwrap().pitches.clone();
        let bad = seq(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]);
        let report = set.validate(&[good, bad.clone()]);
        assert_eq!(report.matched, 1);
        assert_eq!(report.foreign, vec![bad]);
        assert_eq!(report.derivable, 48);
        assert!(!report.is_consistent());
    }

    #[test]
    fn test_form_labels_display() {
        let set = generate_row_forms(&iv("1_3_1_6"));
        let form = set.get(RetrogradeInversion, 7).unwrap();
        assert_eq!(form.to_string(), "RI7");
        assert_eq!(serde_json::to_string(&Retrograde).unwrap(), "\"R\"");
    }
}
