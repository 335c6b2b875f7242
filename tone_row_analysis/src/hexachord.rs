// Hexachord splitting and independent half rotations.
//
// A row of even length is cut into two ordered halves (positions 0..h and
// h..2h; hexachords for twelve-tone rows). For each offset k in [0, h) both
// halves are rotated left by k independently and concatenated again. The
// recombined row's interval vector is always recomputed from the pitches,
// including at k = 0, since the seam interval between the halves belongs to
// neither half.
//
// Each half can also be expanded into its own P/I/R/RI forms, using the
// half itself as P0 with zero-axis inversion. The recombined vector and the
// two half vectors are the extra row classes the catalog pass feeds back
// into canonicalization and rotation detection.

use crate::error::DomainError;
use crate::forms::RowFormSet;
use crate::pitch::{IntervalVector, PitchSequence};
use serde::{Deserialize, Serialize};

/// Where a hexachord-derived class came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HexachordPart {
    Recombined,
    FirstHalf,
    SecondHalf,
}

/// One recombination of a row's halves at a given offset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HexachordRotation {
    pub offset: usize,
    pub first_half: PitchSequence,
    pub second_half: PitchSequence,
    /// `first_half ++ second_half`.
    pub row: PitchSequence,
    pub row_class: IntervalVector,
    pub first_half_class: IntervalVector,
    pub second_half_class: IntervalVector,
}

impl HexachordRotation {
    /// P/I/R/RI forms of the first half, with the half itself as P0.
    pub fn first_half_forms(&self) -> Result<RowFormSet, DomainError> {
        RowFormSet::from_base(self.first_half.clone())
    }

    pub fn second_half_forms(&self) -> Result<RowFormSet, DomainError> {
        RowFormSet::from_base(self.second_half.clone())
    }

    /// Interval vectors this recombination contributes to a catalog. The
    /// half vectors are included when `include_halves` is set.
    pub fn derived_classes(&self, include_halves: bool) -> Vec<(HexachordPart, IntervalVector)> {
        let mut classes = vec![(HexachordPart::Recombined, self.row_class.clone())];
        if include_halves {
            classes.push((HexachordPart::FirstHalf, self.first_half_class.clone()));
            classes.push((HexachordPart::SecondHalf, self.second_half_class.clone()));
        }
        classes
    }
}

/// Split `row` into its two halves.
///
/// Rejects odd lengths and halves shorter than two pitches.
pub fn split_hexachords(row: &PitchSequence) -> Result<(PitchSequence, PitchSequence), DomainError> {
    let len = row.len();
    if len % 2 != 0 || len < 4 {
        return Err(DomainError::UnsplittableRow(len));
    }
    Ok(row.split_at(len / 2))
}

/// Rotate both halves of `row` left by `offset` and recombine.
pub fn rotate_hexachords(row: &PitchSequence, offset: usize) -> Result<HexachordRotation, DomainError> {
    let (first, second) = split_hexachords(row)?;
    let limit = first.len();
    if offset >= limit {
        return Err(DomainError::OffsetOutOfRange { offset, limit });
    }
    let first_half = first.rotate_left(offset);
    let second_half = second.rotate_left(offset);
    let row = first_half.concat(&second_half)?;
    Ok(HexachordRotation {
        offset,
        row_class: row.intervals()?,
        first_half_class: first_half.intervals()?,
        second_half_class: second_half.intervals()?,
        first_half,
        second_half,
        row,
    })
}

/// Every recombination of `row`, offsets `0..half_len` in order.
pub fn hexachord_rotations(row: &PitchSequence) -> Result<Vec<HexachordRotation>, DomainError> {
    let (first, _) = split_hexachords(row)?;
    (0..first.len())
        .map(|offset| rotate_hexachords(row, offset))
        .collect()
}
