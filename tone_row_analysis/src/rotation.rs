// Rotation equivalence between row classes.
//
// Two interval vectors of the same length are rotation-equivalent when one
// is a cyclic left shift of the other. Relations are oriented from the
// lexicographically smaller vector (source) to the larger (target), and the
// shift is the smallest k with `rotate_left(source, k) == target`. Periodic
// vectors match at several offsets; the smallest one is reported.
//
// Two strategies produce identical reports:
// - `PairwiseScan`: every same-length pair is tested by sliding a window
//   over the doubled source. O(n^2 * L) for n classes of length L, which is
//   the scaling limit of this design (fine for catalogs in the hundreds or
//   low thousands). Optionally parallel over rayon; pairs are independent.
// - `NecklaceBucket`: each vector is keyed by its least rotation (its
//   necklace) in O(L) and only vectors sharing a key are compared.
//
// Vectors shorter than `MIN_ROTATION_LENGTH` never take part: below three
// steps rotations mostly coincide with retrograde and say nothing new.
//
// Connected components of the relation graph (union-find, single-threaded,
// after the scan) are reported as rotation families.
//
// `detect` compares vectors as given. `detect_classes` works on row classes:
// a canonical class and the class of its rotation usually come from
// different families (e.g. `2_8_11_7_2_1_8_8_6_3_5` rotated by 3 has
// class `1_4_10_...` through R), so each class is compared against every
// member of the other class's P/I/R/RI family. For bucketing, a class is
// keyed by the least necklace over its family.
//
// Also here: form-level detection (row forms of different classes that are
// rotations of each other) and whole-row rotations of a prototype row.

use crate::canonical::{canonicalize_pattern, identify_families};
use crate::config::RotationConfig;
use crate::error::DomainError;
use crate::forms::{RowForm, RowFormSet, TransformationFamily, family_vectors};
use crate::pitch::{IntervalVector, PitchSequence};
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use tone_row_utils::DisjointSets;
use tracing::debug;

pub const MIN_ROTATION_LENGTH: usize = 3;

// ---------------------------------------------------------------------------
// Slice primitives
// ---------------------------------------------------------------------------

/// Index of the lexicographically least rotation of `values` (smallest such
/// index when several rotations tie). Linear time two-pointer scan.
pub fn least_rotation(values: &[u32]) -> usize {
    let n = values.len();
    let (mut i, mut j, mut k) = (0usize, 1usize, 0usize);
    while i < n && j < n && k < n {
        let a = values[(i + k) % n];
        let b = values[(j + k) % n];
        if a == b {
            k += 1;
            continue;
        }
        if a > b {
            i += k + 1;
        } else {
            j += k + 1;
        }
        if i == j {
            j += 1;
        }
        k = 0;
    }
    i.min(j).min(n.saturating_sub(1))
}

/// Smallest `k` with `a` rotated left by `k` equal to `b`.
pub(crate) fn cyclic_shift(a: &[u32], b: &[u32]) -> Option<usize> {
    let len = a.len();
    if len == 0 || len != b.len() {
        return None;
    }
    let doubled: Vec<u32> = a.iter().chain(a.iter()).copied().collect();
    (0..len).find(|&k| doubled[k..k + len] == *b)
}

/// Shift taking `a` onto `b` by left rotation, if any.
///
/// Errors when the vectors differ in length or modulus.
pub fn rotation_shift(a: &IntervalVector, b: &IntervalVector) -> Result<Option<usize>, DomainError> {
    if a.modulus() != b.modulus() {
        return Err(DomainError::ModulusMismatch {
            left: a.modulus().get(),
            right: b.modulus().get(),
        });
    }
    if a.len() != b.len() {
        return Err(DomainError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(cyclic_shift(a.steps(), b.steps()))
}

fn pitch_necklace(seq: &PitchSequence) -> PitchSequence {
    seq.rotate_left(least_rotation(seq.pitches()))
}

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationStrategy {
    #[default]
    PairwiseScan,
    NecklaceBucket,
}

impl FromStr for RotationStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pairwise" | "pairwise_scan" => Ok(RotationStrategy::PairwiseScan),
            "necklace" | "necklace_bucket" => Ok(RotationStrategy::NecklaceBucket),
            other => Err(format!("unknown rotation strategy '{other}'")),
        }
    }
}

/// `target == source.rotate_left(shift)`, with `source < target`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RotationRelation {
    pub source: IntervalVector,
    pub target: IntervalVector,
    pub shift: usize,
}

impl RotationRelation {
    /// Left shift taking `target` back onto `source`.
    pub fn reverse_shift(&self) -> usize {
        (self.source.len() - self.shift) % self.source.len()
    }
}

impl fmt::Display for RotationRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} (shift {})", self.source, self.target, self.shift)
    }
}

/// A connected group of more than one rotation-related class, ascending.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RotationFamily {
    pub members: Vec<IntervalVector>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RotationReport {
    /// Sorted by (source, target).
    pub relations: Vec<RotationRelation>,
    /// Sorted by smallest member.
    pub families: Vec<RotationFamily>,
}

impl RotationReport {
    pub fn relation(&self, a: &IntervalVector, b: &IntervalVector) -> Option<&RotationRelation> {
        self.relations.iter().find(|r| {
            (&r.source == a && &r.target == b) || (&r.source == b && &r.target == a)
        })
    }

    pub fn family_of(&self, v: &IntervalVector) -> Option<&RotationFamily> {
        self.families.iter().find(|f| f.members.contains(v))
    }
}

/// Two row classes related by rotation through their families.
///
/// `target == source.rotate_left(shift)`, where `source` is the smaller
/// class vector and `target` is a member of `target_class`'s family.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ClassRotation {
    pub source: IntervalVector,
    pub target_class: IntervalVector,
    pub target: IntervalVector,
    /// Labels `f` with `f(target_class) == target`.
    pub via: BTreeSet<TransformationFamily>,
    pub shift: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ClassRotationReport {
    /// Sorted by (source, target_class).
    pub relations: Vec<ClassRotation>,
    /// Groups of class vectors, sorted by smallest member.
    pub families: Vec<RotationFamily>,
}

impl ClassRotationReport {
    pub fn relation(&self, a: &IntervalVector, b: &IntervalVector) -> Option<&ClassRotation> {
        self.relations.iter().find(|r| {
            (&r.source == a && &r.target_class == b) || (&r.source == b && &r.target_class == a)
        })
    }
}

/// Two row forms from different classes that are rotations of each other.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct FormRotation {
    pub source_class: IntervalVector,
    pub source_form: RowForm,
    pub target_class: IntervalVector,
    pub target_form: RowForm,
    /// `target_form.pitches == source_form.pitches.rotate_left(shift)`.
    pub shift: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FormRotationReport {
    pub pairs: Vec<FormRotation>,
    /// Classes connected through at least one form rotation.
    pub families: Vec<RotationFamily>,
}

// ---------------------------------------------------------------------------
// Detector
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct RotationDetector {
    strategy: RotationStrategy,
    min_length: usize,
    parallel: bool,
}

impl Default for RotationDetector {
    fn default() -> Self {
        Self::new(&RotationConfig::default())
    }
}

impl RotationDetector {
    pub fn new(config: &RotationConfig) -> Self {
        Self {
            strategy: config.strategy,
            min_length: config.min_length.max(MIN_ROTATION_LENGTH),
            parallel: config.parallel,
        }
    }

    pub fn with_strategy(strategy: RotationStrategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn strategy(&self) -> RotationStrategy {
        self.strategy
    }

    /// Find every rotation relation among the distinct `vectors` and group
    /// them into families. Duplicates and short vectors are dropped first.
    ///
    /// Vectors are compared as given. Use [`detect_classes`] when the inputs
    /// are row classes whose other family members should also count.
    ///
    /// [`detect_classes`]: RotationDetector::detect_classes
    pub fn detect(&self, vectors: &[IntervalVector]) -> RotationReport {
        let distinct: Vec<IntervalVector> = vectors
            .iter()
            .filter(|v| v.len() >= self.min_length)
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        // `distinct` is sorted, so i < j already orients source < target.
        let edges = match self.strategy {
            RotationStrategy::PairwiseScan => self.scan_pairs(&distinct, vector_shift),
            RotationStrategy::NecklaceBucket => {
                let keys = distinct.iter().map(IntervalVector::necklace).collect();
                bucket_pairs(keys, &distinct, vector_shift)
            }
        };
        debug!(
            strategy = ?self.strategy,
            vectors = distinct.len(),
            relations = edges.len(),
            "rotation scan finished"
        );

        let families = families_from_edges(&distinct, edges.iter().map(|&(a, b, _)| (a, b)));
        let relations = edges
            .into_iter()
            .map(|(source, target, shift)| RotationRelation {
                source: distinct[source].clone(),
                target: distinct[target].clone(),
                shift,
            })
            .collect();
        RotationReport {
            relations,
            families,
        }
    }

    /// Rotation relations between row classes, counting every family member.
    ///
    /// Each input is canonicalized first. Two classes are related when some
    /// member of one family is a rotation of some member of the other. Family
    /// labels map rotations to rotations, so this holds exactly when the
    /// smaller class vector is a rotation of a member of the other family.
    /// The relation records that member (the smallest, when several match)
    /// and its labels.
    pub fn detect_classes(&self, vectors: &[IntervalVector]) -> ClassRotationReport {
        let classes: Vec<FamilyMembers> = vectors
            .iter()
            .filter(|v| v.len() >= self.min_length)
            .map(|v| canonicalize_pattern(v).row_class)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(FamilyMembers::new)
            .collect();

        let edges = match self.strategy {
            RotationStrategy::PairwiseScan => self.scan_pairs(&classes, FamilyMembers::rotation_into),
            RotationStrategy::NecklaceBucket => {
                let keys = classes.iter().map(FamilyMembers::necklace_key).collect();
                bucket_pairs(keys, &classes, FamilyMembers::rotation_into)
            }
        };
        debug!(
            strategy = ?self.strategy,
            classes = classes.len(),
            relations = edges.len(),
            "class rotation scan finished"
        );

        let class_vectors: Vec<IntervalVector> = classes.iter().map(|c| c.class.clone()).collect();
        let families = families_from_edges(&class_vectors, edges.iter().map(|(a, b, _)| (*a, *b)));
        let relations = edges
            .into_iter()
            .map(|(source, target, (member, shift))| {
                let target_class = class_vectors[target].clone();
                ClassRotation {
                    source: class_vectors[source].clone(),
                    via: identify_families(&target_class, &member),
                    target_class,
                    target: member,
                    shift,
                }
            })
            .collect();
        ClassRotationReport {
            relations,
            families,
        }
    }

    /// Test every pair `i < j` of `items`, on the rayon pool when parallel.
    /// Output is sorted by `(i, j)`.
    fn scan_pairs<T, M, F>(&self, items: &[T], matches: F) -> Vec<(usize, usize, M)>
    where
        T: Sync,
        M: Send + Ord,
        F: Fn(&T, &T) -> Option<M> + Sync,
    {
        let scan_row = |i: usize| -> Vec<(usize, usize, M)> {
            items[i + 1..]
                .iter()
                .enumerate()
                .filter_map(|(offset, b)| matches(&items[i], b).map(|m| (i, i + 1 + offset, m)))
                .collect()
        };
        let mut found: Vec<(usize, usize, M)> = if self.parallel {
            (0..items.len()).into_par_iter().flat_map_iter(scan_row).collect()
        } else {
            (0..items.len()).flat_map(scan_row).collect()
        };
        found.sort_unstable();
        found
    }

    /// Find row forms of different classes that are rotations of each other.
    ///
    /// Each distinct class is expanded to its distinct row forms, which are
    /// bucketed by necklace. Pairs are oriented from the smaller pitch
    /// sequence to the larger.
    pub fn detect_form_rotations(&self, classes: &[IntervalVector]) -> FormRotationReport {
        let distinct: Vec<IntervalVector> = classes
            .iter()
            .filter(|v| v.len() >= self.min_length)
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut records: Vec<(usize, RowForm)> = Vec::new();
        for (class_index, class) in distinct.iter().enumerate() {
            let mut seen: FxHashSet<PitchSequence> = FxHashSet::default();
            for form in RowFormSet::from_intervals(class).iter() {
                if seen.insert(form.pitches.clone()) {
                    records.push((class_index, form.clone()));
                }
            }
        }

        let mut buckets: FxHashMap<PitchSequence, Vec<usize>> = FxHashMap::default();
        for (record_index, (_, form)) in records.iter().enumerate() {
            buckets
                .entry(pitch_necklace(&form.pitches))
                .or_default()
                .push(record_index);
        }

        let mut pairs = Vec::new();
        let mut sets = DisjointSets::new(distinct.len());
        for members in buckets.values() {
            for (x, &i) in members.iter().enumerate() {
                for &j in &members[x + 1..] {
                    let (class_i, form_i) = &records[i];
                    let (class_j, form_j) = &records[j];
                    if class_i == class_j {
                        continue;
                    }
                    let ((sc, sf), (tc, tf)) = if form_i.pitches <= form_j.pitches {
                        ((*class_i, form_i), (*class_j, form_j))
                    } else {
                        ((*class_j, form_j), (*class_i, form_i))
                    };
                    let Some(shift) = cyclic_shift(sf.pitches.pitches(), tf.pitches.pitches())
                    else {
                        continue;
                    };
                    sets.union(sc, tc);
                    pairs.push(FormRotation {
                        source_class: distinct[sc].clone(),
                        source_form: sf.clone(),
                        target_class: distinct[tc].clone(),
                        target_form: tf.clone(),
                        shift,
                    });
                }
            }
        }
        pairs.sort();
        debug!(
            classes = distinct.len(),
            forms = records.len(),
            pairs = pairs.len(),
            "form rotation scan finished"
        );

        let families = families_from_sets(&distinct, &mut sets);
        FormRotationReport { pairs, families }
    }
}

/// Test only the pairs `i < j` whose keys are equal. Output is sorted by
/// `(i, j)`, the same shape the full pair scan produces.
fn bucket_pairs<K, T, M, F>(keys: Vec<K>, items: &[T], matches: F) -> Vec<(usize, usize, M)>
where
    K: Eq + Hash,
    M: Ord,
    F: Fn(&T, &T) -> Option<M>,
{
    let mut buckets: FxHashMap<K, Vec<usize>> = FxHashMap::default();
    for (i, key) in keys.into_iter().enumerate() {
        buckets.entry(key).or_default().push(i);
    }
    let mut found = Vec::new();
    for members in buckets.values() {
        // Members were pushed in ascending index order.
        for (x, &i) in members.iter().enumerate() {
            for &j in &members[x + 1..] {
                if let Some(m) = matches(&items[i], &items[j]) {
                    found.push((i, j, m));
                }
            }
        }
    }
    found.sort_unstable();
    found
}

fn vector_shift(a: &IntervalVector, b: &IntervalVector) -> Option<usize> {
    if a.len() != b.len() || a.modulus() != b.modulus() {
        return None;
    }
    cyclic_shift(a.steps(), b.steps())
}

/// A row class with its distinct family vectors, ascending.
struct FamilyMembers {
    class: IntervalVector,
    members: Vec<IntervalVector>,
}

impl FamilyMembers {
    fn new(class: IntervalVector) -> Self {
        let members = family_vectors(&class)
            .into_iter()
            .map(|(_, v)| v)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        Self { class, members }
    }

    /// Same key for two classes exactly when they are rotation-related.
    fn necklace_key(&self) -> IntervalVector {
        self.members
            .iter()
            .map(IntervalVector::necklace)
            .min()
            .unwrap_or_else(|| self.class.necklace())
    }

    /// The smallest member of `other` that `self.class` rotates onto.
    fn rotation_into(&self, other: &FamilyMembers) -> Option<(IntervalVector, usize)> {
        other.members.iter().find_map(|member| {
            vector_shift(&self.class, member).map(|shift| (member.clone(), shift))
        })
    }
}

fn families_from_edges(
    distinct: &[IntervalVector],
    edges: impl Iterator<Item = (usize, usize)>,
) -> Vec<RotationFamily> {
    let mut sets = DisjointSets::new(distinct.len());
    for (a, b) in edges {
        sets.union(a, b);
    }
    families_from_sets(distinct, &mut sets)
}

fn families_from_sets(distinct: &[IntervalVector], sets: &mut DisjointSets) -> Vec<RotationFamily> {
    sets.groups()
        .into_iter()
        .filter(|group| group.len() > 1)
        .map(|group| RotationFamily {
            members: group.into_iter().map(|i| distinct[i].clone()).collect(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Whole-row rotations
// ---------------------------------------------------------------------------

/// A prototype row rotated by `shift`, with its freshly computed vector.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RowRotation {
    pub shift: usize,
    pub row: PitchSequence,
    pub row_class: IntervalVector,
    /// False when the rotated row repeats a pitch class.
    pub is_aggregate: bool,
}

/// Rotate the row built from `vector` (starting on 0) by every shift
/// `0..row_len` and recompute the interval vector each time.
pub fn row_rotations(vector: &IntervalVector) -> Result<Vec<RowRotation>, DomainError> {
    let prototype = vector.to_row(0);
    (0..prototype.len())
        .map(|shift| {
            let row = prototype.rotate_left(shift);
            Ok(RowRotation {
                shift,
                row_class: row.intervals()?,
                is_aggregate: row.is_aggregate(),
                row,
            })
        })
        .collect()
}
