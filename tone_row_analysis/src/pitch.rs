// Pitch sequence algebra: the value types every other module works on.
//
// - `Modulus`:        validated modulus (>= 2), default 12.
// - `PitchSequence`:  an ordered row of pitch classes, always reduced.
// - `IntervalVector`: successive differences of a row; the identity of a
//   row up to transposition, and the carrier of row classes.
//
// All operations return fresh values; nothing here mutates in place. Two
// variants of inversion exist and are kept apart explicitly (see
// `InversionAxis`). The underscore-joined text form (`1_2_3`) is only a
// display/parse convenience. Identity is always structural equality of the
// integer vectors.
//
// Consumed by forms.rs (48-form expansion), canonical.rs, rotation.rs and
// hexachord.rs.

use crate::error::DomainError;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

pub const DEFAULT_MODULUS: u32 = 12;

// ---------------------------------------------------------------------------
// Modulus
// ---------------------------------------------------------------------------

/// The size of the pitch-class space. 12 for equal-tempered chromatic music.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Modulus(u32);

impl Modulus {
    pub const TWELVE: Modulus = Modulus(DEFAULT_MODULUS);

    pub fn new(value: u32) -> Result<Self, DomainError> {
        if value < 2 {
            return Err(DomainError::InvalidModulus(value));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Reduce any integer into `[0, modulus)`.
    pub fn reduce(self, value: i64) -> u32 {
        value.rem_euclid(i64::from(self.0)) as u32
    }
}

impl Default for Modulus {
    fn default() -> Self {
        Self::TWELVE
    }
}

impl TryFrom<u32> for Modulus {
    type Error = DomainError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Modulus> for u32 {
    fn from(modulus: Modulus) -> Self {
        modulus.0
    }
}

impl fmt::Display for Modulus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which axis an inversion reflects around.
///
/// `Zero` maps every pitch class `p` to `-p`. It is the variant used when
/// expanding an interval pattern into its row forms, and the default.
/// `FirstPitch` maps `p` to `2 * seq[0] - p`, keeping the first pitch fixed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InversionAxis {
    #[default]
    Zero,
    FirstPitch,
}

fn join_underscore(values: &[u32], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            f.write_str("_")?;
        }
        write!(f, "{v}")?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// PitchSequence
// ---------------------------------------------------------------------------

/// An ordered row of pitch classes in `[0, modulus)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PitchSequence {
    pitches: Vec<u32>,
    modulus: Modulus,
}

impl PitchSequence {
    /// Build a sequence, reducing every value modulo `modulus`.
    pub fn new<I: IntoIterator<Item = i64>>(pitches: I, modulus: Modulus) -> Self {
        Self {
            pitches: pitches.into_iter().map(|p| modulus.reduce(p)).collect(),
            modulus,
        }
    }

    /// Caller guarantees every value is already below `modulus`.
    pub(crate) fn from_reduced(pitches: Vec<u32>, modulus: Modulus) -> Self {
        debug_assert!(pitches.iter().all(|&p| p < modulus.get()));
        Self { pitches, modulus }
    }

    pub fn pitches(&self) -> &[u32] {
        &self.pitches
    }

    pub fn len(&self) -> usize {
        self.pitches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pitches.is_empty()
    }

    pub fn modulus(&self) -> Modulus {
        self.modulus
    }

    pub fn first(&self) -> Option<u32> {
        self.pitches.first().copied()
    }

    /// Shift every pitch class by `n` semitones (any sign).
    pub fn transpose(&self, n: i64) -> Self {
        let m = self.modulus;
        let pitches = self
            .pitches
            .iter()
            .map(|&p| m.reduce(i64::from(p) + n))
            .collect();
        Self::from_reduced(pitches, m)
    }

    /// Inversion about zero: `p -> -p`.
    pub fn invert(&self) -> Self {
        let m = self.modulus;
        let pitches = self.pitches.iter().map(|&p| m.reduce(-i64::from(p))).collect();
        Self::from_reduced(pitches, m)
    }

    /// Inversion about the first pitch: `p -> 2 * seq[0] - p`.
    pub fn invert_about_first(&self) -> Self {
        let Some(axis) = self.first() else {
            return self.clone();
        };
        let m = self.modulus;
        let doubled = 2 * i64::from(axis);
        let pitches = self
            .pitches
            .iter()
            .map(|&p| m.reduce(doubled - i64::from(p)))
            .collect();
        Self::from_reduced(pitches, m)
    }

    pub fn invert_with(&self, axis: InversionAxis) -> Self {
        match axis {
            InversionAxis::Zero => self.invert(),
            InversionAxis::FirstPitch => self.invert_about_first(),
        }
    }

    /// Reverse the order of the row. No arithmetic.
    pub fn retrograde(&self) -> Self {
        let mut pitches = self.pitches.clone();
        pitches.reverse();
        Self::from_reduced(pitches, self.modulus)
    }

    /// Cyclic left rotation by `k` positions (`k` taken modulo the length).
    pub fn rotate_left(&self, k: usize) -> Self {
        let mut pitches = self.pitches.clone();
        if !pitches.is_empty() {
            let len = pitches.len();
            pitches.rotate_left(k % len);
        }
        Self::from_reduced(pitches, self.modulus)
    }

    /// Successive differences `(seq[i+1] - seq[i]) mod m`.
    pub fn intervals(&self) -> Result<IntervalVector, DomainError> {
        if self.pitches.len() < 2 {
            return Err(DomainError::SequenceTooShort(self.pitches.len()));
        }
        let m = self.modulus;
        let steps = self
            .pitches
            .windows(2)
            .map(|w| m.reduce(i64::from(w[1]) - i64::from(w[0])))
            .collect();
        Ok(IntervalVector::from_reduced(steps, m))
    }

    /// `self` followed by `other`. Both must share a modulus.
    pub fn concat(&self, other: &PitchSequence) -> Result<Self, DomainError> {
        if self.modulus != other.modulus {
            return Err(DomainError::ModulusMismatch {
                left: self.modulus.get(),
                right: other.modulus.get(),
            });
        }
        let mut pitches = self.pitches.clone();
        pitches.extend_from_slice(&other.pitches);
        Ok(Self::from_reduced(pitches, self.modulus))
    }

    /// Split at `mid` into two owned sequences.
    pub(crate) fn split_at(&self, mid: usize) -> (Self, Self) {
        let (a, b) = self.pitches.split_at(mid);
        (
            Self::from_reduced(a.to_vec(), self.modulus),
            Self::from_reduced(b.to_vec(), self.modulus),
        )
    }

    /// True when every pitch class of the modulus occurs exactly once.
    pub fn is_aggregate(&self) -> bool {
        let m = self.modulus.get() as usize;
        if self.pitches.len() != m {
            return false;
        }
        let mut seen = vec![false; m];
        for &p in &self.pitches {
            if std::mem::replace(&mut seen[p as usize], true) {
                return false;
            }
        }
        true
    }
}

impl fmt::Display for PitchSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        join_underscore(&self.pitches, f)
    }
}

// Serialized as the bare pitch list; the modulus lives in the surrounding
// report or config.
impl Serialize for PitchSequence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.pitches)
    }
}

// ---------------------------------------------------------------------------
// IntervalVector
// ---------------------------------------------------------------------------

/// Successive pitch-class differences of a row. Never empty.
///
/// Ordering is lexicographic over the steps (field order matters for the
/// derived `Ord`), which is the order row classes are chosen by.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntervalVector {
    steps: Vec<u32>,
    modulus: Modulus,
}

impl IntervalVector {
    /// Validate already-unsigned steps: non-empty and each below `modulus`.
    pub fn new(steps: Vec<u32>, modulus: Modulus) -> Result<Self, DomainError> {
        if steps.is_empty() {
            return Err(DomainError::EmptyPattern);
        }
        if let Some((position, &value)) = steps
            .iter()
            .enumerate()
            .find(|&(_, &s)| s >= modulus.get())
        {
            return Err(DomainError::OutOfRange {
                position,
                value: value.to_string(),
                modulus: modulus.get(),
            });
        }
        Ok(Self { steps, modulus })
    }

    /// Validate signed input. Negative values are rejected, not reduced.
    pub fn from_raw(values: &[i64], modulus: Modulus) -> Result<Self, DomainError> {
        if values.is_empty() {
            return Err(DomainError::EmptyPattern);
        }
        let mut steps = Vec::with_capacity(values.len());
        for (position, &value) in values.iter().enumerate() {
            if value < 0 || value >= i64::from(modulus.get()) {
                return Err(DomainError::OutOfRange {
                    position,
                    value: value.to_string(),
                    modulus: modulus.get(),
                });
            }
            steps.push(value as u32);
        }
        Ok(Self { steps, modulus })
    }

    /// Parse an underscore-joined pattern such as `1_3_1_6_11`.
    pub fn parse(text: &str, modulus: Modulus) -> Result<Self, DomainError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DomainError::EmptyPattern);
        }
        let mut values = Vec::new();
        for (position, token) in text.split('_').enumerate() {
            let token = token.trim();
            let value = token.parse::<i64>().map_err(|_| DomainError::NotAnInteger {
                position,
                value: token.to_string(),
            })?;
            values.push(value);
        }
        Self::from_raw(&values, modulus)
    }

    pub(crate) fn from_reduced(steps: Vec<u32>, modulus: Modulus) -> Self {
        debug_assert!(!steps.is_empty());
        Self { steps, modulus }
    }

    pub fn steps(&self) -> &[u32] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn modulus(&self) -> Modulus {
        self.modulus
    }

    /// Every step negated. The interval vector of the inverted row.
    pub fn negate(&self) -> Self {
        let m = self.modulus;
        let steps = self.steps.iter().map(|&s| m.reduce(-i64::from(s))).collect();
        Self::from_reduced(steps, m)
    }

    /// Steps in reverse order.
    pub fn reverse(&self) -> Self {
        let mut steps = self.steps.clone();
        steps.reverse();
        Self::from_reduced(steps, self.modulus)
    }

    pub fn rotate_left(&self, k: usize) -> Self {
        let mut steps = self.steps.clone();
        let len = steps.len();
        steps.rotate_left(k % len);
        Self::from_reduced(steps, self.modulus)
    }

    pub fn rotate_right(&self, k: usize) -> Self {
        let mut steps = self.steps.clone();
        let len = steps.len();
        steps.rotate_right(k % len);
        Self::from_reduced(steps, self.modulus)
    }

    /// Rebuild a row by cumulative summation from `start_pitch`.
    pub fn to_row(&self, start_pitch: i64) -> PitchSequence {
        let m = self.modulus;
        let mut current = m.reduce(start_pitch);
        let mut pitches = Vec::with_capacity(self.steps.len() + 1);
        pitches.push(current);
        for &step in &self.steps {
            current = m.reduce(i64::from(current) + i64::from(step));
            pitches.push(current);
        }
        PitchSequence::from_reduced(pitches, m)
    }

    /// Lexicographically smallest rotation of this vector.
    pub fn necklace(&self) -> Self {
        self.rotate_left(crate::rotation::least_rotation(&self.steps))
    }
}

/// Free-function form of [`IntervalVector::to_row`].
pub fn row_from_intervals(vector: &IntervalVector, start_pitch: i64) -> PitchSequence {
    vector.to_row(start_pitch)
}

impl fmt::Display for IntervalVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        join_underscore(&self.steps, f)
    }
}

impl Serialize for IntervalVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.steps)
    }
}
