// Error types for tone row analysis.
//
// `DomainError` covers malformed input detected at component boundaries:
// bad moduli, empty or out-of-range patterns, sequences too short for the
// algebra, mismatched vectors, and unsplittable rows. It is `Clone` +
// `PartialEq` so batch results can store it per row and tests can compare it.
//
// `Error` wraps `DomainError` together with the I/O and JSON failures that
// only the config loader and the CLI can hit.
//
// An ambiguous canonical form is not an error. See `canonical.rs`.

use crate::forms::TransformationFamily;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("modulus must be at least 2, got {0}")]
    InvalidModulus(u32),

    #[error("interval pattern is empty")]
    EmptyPattern,

    #[error("pitch sequence needs at least 2 pitches, got {0}")]
    SequenceTooShort(usize),

    #[error("value `{value}` at position {position} is not an integer")]
    NotAnInteger { position: usize, value: String },

    #[error("value {value} at position {position} is outside [0, {modulus})")]
    OutOfRange {
        position: usize,
        value: String,
        modulus: u32,
    },

    #[error("length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("modulus mismatch: {left} vs {right}")]
    ModulusMismatch { left: u32, right: u32 },

    #[error("row of length {0} cannot be split into two halves of at least 2 pitches")]
    UnsplittableRow(usize),

    #[error("hexachord rotation offset {offset} is outside [0, {limit})")]
    OffsetOutOfRange { offset: usize, limit: usize },

    #[error("no candidate vectors to canonicalize")]
    NoCandidates,

    #[error("family {0} listed more than once")]
    DuplicateFamily(TransformationFamily),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
