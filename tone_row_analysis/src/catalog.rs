// Catalog pass: many rows from many works in one run.
//
// Each entry carries a raw interval pattern and an opaque provenance value
// (work id, citation, anything JSON) that is passed through untouched. The
// pass resolves every pattern, expands its 48 forms and canonicalizes it.
// A row that fails is recorded with its error and the pass continues.
//
// Canonical classes are deduplicated across the whole catalog; each
// distinct class remembers which rows (and, when hexachord derivation is on,
// which recombinations) produced it. Rotation detection then runs once over
// the distinct classes, comparing each class against the whole family of
// every other class.

use crate::canonical::{CanonicalForm, canonicalize_pattern};
use crate::config::AnalysisConfig;
use crate::error::{DomainError, Result};
use crate::forms::RowFormSet;
use crate::hexachord::{HexachordPart, HexachordRotation, hexachord_rotations};
use crate::pitch::{IntervalVector, Modulus};
use crate::rotation::{ClassRotationReport, FormRotationReport, RotationDetector};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A pattern as it appears in catalog JSON: `"1_3_1_6"` or `[1, 3, 1, 6]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawPattern {
    Text(String),
    Values(Vec<serde_json::Value>),
}

impl RawPattern {
    pub fn resolve(&self, modulus: Modulus) -> std::result::Result<IntervalVector, DomainError> {
        match self {
            RawPattern::Text(text) => IntervalVector::parse(text, modulus),
            RawPattern::Values(values) => {
                let mut raw = Vec::with_capacity(values.len());
                for (position, value) in values.iter().enumerate() {
                    let n = value.as_i64().ok_or_else(|| DomainError::NotAnInteger {
                        position,
                        value: value.to_string(),
                    })?;
                    raw.push(n);
                }
                IntervalVector::from_raw(&raw, modulus)
            }
        }
    }
}

impl From<&str> for RawPattern {
    fn from(text: &str) -> Self {
        RawPattern::Text(text.to_string())
    }
}

impl From<&[i64]> for RawPattern {
    fn from(values: &[i64]) -> Self {
        RawPattern::Values(values.iter().map(|&v| serde_json::Value::from(v)).collect())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry<P = serde_json::Value> {
    pub pattern: RawPattern,
    #[serde(default)]
    pub provenance: P,
}

impl<P> CatalogEntry<P> {
    pub fn new(pattern: impl Into<RawPattern>, provenance: P) -> Self {
        Self {
            pattern: pattern.into(),
            provenance,
        }
    }
}

/// Read a JSON array of catalog entries.
pub fn load_catalog(path: &Path) -> Result<Vec<CatalogEntry>> {
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RowAnalysis<P> {
    pub index: usize,
    pub provenance: P,
    pub input: IntervalVector,
    pub forms: RowFormSet,
    pub canonical: CanonicalForm,
    /// Empty unless hexachord derivation is enabled.
    pub hexachords: Vec<HexachordRotation>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RowFailure<P> {
    pub index: usize,
    pub provenance: P,
    pub pattern: RawPattern,
    #[serde(serialize_with = "serialize_display")]
    pub error: DomainError,
}

fn serialize_display<S: Serializer>(
    error: &DomainError,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassOrigin {
    Catalog {
        row: usize,
    },
    Hexachord {
        row: usize,
        offset: usize,
        part: HexachordPart,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CatalogClass {
    pub row_class: IntervalVector,
    pub origins: Vec<ClassOrigin>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CatalogReport<P> {
    pub modulus: Modulus,
    pub rows: Vec<RowAnalysis<P>>,
    pub failures: Vec<RowFailure<P>>,
    /// Distinct canonical classes in ascending order.
    pub classes: Vec<CatalogClass>,
    /// Relations between classes, comparing whole P/I/R/RI families.
    pub rotations: ClassRotationReport,
    pub form_rotations: Option<FormRotationReport>,
}

impl<P> CatalogReport<P> {
    pub fn class(&self, row_class: &IntervalVector) -> Option<&CatalogClass> {
        self.classes
            .binary_search_by(|c| c.row_class.cmp(row_class))
            .ok()
            .map(|i| &self.classes[i])
    }

    pub fn class_vectors(&self) -> Vec<IntervalVector> {
        self.classes.iter().map(|c| c.row_class.clone()).collect()
    }
}

// ---------------------------------------------------------------------------
// Pass
// ---------------------------------------------------------------------------

/// Resolve, expand and canonicalize one entry.
pub fn analyze_entry<P: Clone>(
    index: usize,
    entry: &CatalogEntry<P>,
    config: &AnalysisConfig,
) -> std::result::Result<RowAnalysis<P>, DomainError> {
    let input = entry.pattern.resolve(config.modulus)?;
    let forms = RowFormSet::from_intervals(&input);
    let canonical = canonicalize_pattern(&input);

    let mut hexachords = Vec::new();
    if config.hexachords.enabled {
        match hexachord_rotations(forms.base()) {
            Ok(rotations) => hexachords = rotations,
            Err(e) => warn!(row = index, error = %e, "skipping hexachord derivation"),
        }
    }

    debug!(
        row = index,
        input = %input,
        row_class = %canonical.row_class,
        ambiguous = canonical.is_ambiguous(),
        "analyzed row"
    );
    Ok(RowAnalysis {
        index,
        provenance: entry.provenance.clone(),
        input,
        forms,
        canonical,
        hexachords,
    })
}

/// Analyze every entry, deduplicate classes and run rotation detection.
///
/// Only an invalid `config` fails the whole pass; bad rows land in
/// `failures`.
pub fn analyze_catalog<P: Clone>(
    entries: &[CatalogEntry<P>],
    config: &AnalysisConfig,
) -> Result<CatalogReport<P>> {
    config.validate()?;

    let mut rows = Vec::new();
    let mut failures = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        match analyze_entry(index, entry, config) {
            Ok(analysis) => rows.push(analysis),
            Err(error) => {
                warn!(row = index, error = %error, "row failed");
                failures.push(RowFailure {
                    index,
                    provenance: entry.provenance.clone(),
                    pattern: entry.pattern.clone(),
                    error,
                });
            }
        }
    }

    let mut classes: BTreeMap<IntervalVector, Vec<ClassOrigin>> = BTreeMap::new();
    for analysis in &rows {
        classes
            .entry(analysis.canonical.row_class.clone())
            .or_default()
            .push(ClassOrigin::Catalog {
                row: analysis.index,
            });
        for rotation in &analysis.hexachords {
            for (part, vector) in rotation.derived_classes(config.hexachords.include_halves) {
                let canonical = canonicalize_pattern(&vector);
                classes
                    .entry(canonical.row_class)
                    .or_default()
                    .push(ClassOrigin::Hexachord {
                        row: analysis.index,
                        offset: rotation.offset,
                        part,
                    });
            }
        }
    }
    let classes: Vec<CatalogClass> = classes
        .into_iter()
        .map(|(row_class, origins)| CatalogClass { row_class, origins })
        .collect();
    let vectors: Vec<IntervalVector> = classes.iter().map(|c| c.row_class.clone()).collect();

    let detector = RotationDetector::new(&config.rotation);
    let rotations = detector.detect_classes(&vectors);
    let form_rotations = config
        .form_rotations
        .then(|| detector.detect_form_rotations(&vectors));

    info!(
        rows = rows.len(),
        failures = failures.len(),
        classes = classes.len(),
        relations = rotations.relations.len(),
        families = rotations.families.len(),
        "catalog analyzed"
    );
    Ok(CatalogReport {
        modulus: config.modulus,
        rows,
        failures,
        classes,
        rotations,
        form_rotations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::TransformationFamily;
    use serde_json::json;
    use std::collections::BTreeSet;

    fn entries(patterns: &[&str]) -> Vec<CatalogEntry<usize>> {
        patterns
            .iter()
            .enumerate()
            .map(|(i, p)| CatalogEntry::new(*p, i * 10))
            .collect()
    }

    #[test]
    fn test_raw_pattern_forms() {
        let text: RawPattern = serde_json::from_value(json!("1_2_3")).unwrap();
        let list: RawPattern = serde_json::from_value(json!([1, 2, 3])).unwrap();
        assert_eq!(text.resolve(Modulus::TWELVE), list.resolve(Modulus::TWELVE));

        let bad: RawPattern = serde_json::from_value(json!([1, "x", 3])).unwrap();
        assert_eq!(
            bad.resolve(Modulus::TWELVE),
            Err(DomainError::NotAnInteger {
                position: 1,
                value: "\"x\"".to_string(),
            })
        );
        let fractional: RawPattern = serde_json::from_value(json!([1, 2.5])).unwrap();
        assert!(matches!(
            fractional.resolve(Modulus::TWELVE),
            Err(DomainError::NotAnInteger { position: 1, .. })
        ));
        assert_eq!(
            RawPattern::from(&[1i64, 12][..]).resolve(Modulus::TWELVE),
            Err(DomainError::OutOfRange {
                position: 1,
                value: "12".to_string(),
                modulus: 12,
            })
        );
    }

    #[test]
    fn test_failures_are_isolated() {
        let report = analyze_catalog(
            &entries(&["1_2_3_4_5_6_7_8_9_10_11", "", "1_x_2", "2_8_11_7_2_1_8_8_6_3_5"]),
            &AnalysisConfig::default(),
        )
        .unwrap();
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].index, 1);
        assert_eq!(report.failures[0].provenance, 10);
        assert_eq!(report.failures[0].error, DomainError::EmptyPattern);
        assert!(matches!(report.failures[1].error, DomainError::NotAnInteger { position: 1, .. }));
        assert_eq!(report.rows[1].index, 3);
        assert_eq!(report.rows[1].provenance, 30);
        assert_eq!(report.rows[0].forms.len(), 48);
    }

    #[test]
    fn test_classes_deduplicated_across_works() {
        // The same class reached from its inversion and from itself.
        let report = analyze_catalog(
            &entries(&["1_2_3_4_5_6_7_8_9_10_11", "11_10_9_8_7_6_5_4_3_2_1"]),
            &AnalysisConfig::default(),
        )
        .unwrap();
        assert_eq!(report.classes.len(), 1);
        let class = &report.classes[0];
        assert_eq!(class.row_class.to_string(), "1_2_3_4_5_6_7_8_9_10_11");
        assert_eq!(
            class.origins,
            vec![ClassOrigin::Catalog { row: 0 }, ClassOrigin::Catalog { row: 1 }]
        );
        assert_eq!(
            report.rows[1].canonical.families,
            BTreeSet::from([
                TransformationFamily::Inversion,
                TransformationFamily::RetrogradeInversion
            ])
        );
        assert!(report.class(&class.row_class).is_some());
    }

    #[test]
    fn test_rotations_detected_between_classes() {
        let a = IntervalVector::parse("1_3_1_6_11_5_4_2_9_2_6", Modulus::TWELVE).unwrap();
        let rotated = a.rotate_left(2).to_string();
        let catalog = entries(&["1_3_1_6_11_5_4_2_9_2_6", rotated.as_str()]);
        let report = analyze_catalog(&catalog, &AnalysisConfig::default()).unwrap();
        assert_eq!(report.classes.len(), 2);
        assert_eq!(report.rotations.relations.len(), 1);
        let relation = &report.rotations.relations[0];
        assert_eq!(relation.source, a);
        assert_eq!(relation.shift, 2);
        assert_eq!(report.rotations.families.len(), 1);
        assert!(report.form_rotations.is_none());

        let mut config = AnalysisConfig::default();
        config.rotation.strategy = crate::rotation::RotationStrategy::NecklaceBucket;
        config.form_rotations = true;
        let necklace = analyze_catalog(&catalog, &config).unwrap();
        assert_eq!(necklace.rotations, report.rotations);
        assert!(necklace.form_rotations.is_some());
    }

    #[test]
    fn test_rotation_across_families_shift_three() {
        // The rotated row's class is reached through R, so the relation runs
        // from that class to R of the first class.
        let report = analyze_catalog(
            &entries(&["2_8_11_7_2_1_8_8_6_3_5", "7_2_1_8_8_6_3_5_2_8_11"]),
            &AnalysisConfig::default(),
        )
        .unwrap();
        assert_eq!(report.classes.len(), 2);
        assert_eq!(report.rotations.relations.len(), 1);
        let relation = &report.rotations.relations[0];
        assert_eq!(relation.shift, 3);
        assert_eq!(relation.source.to_string(), "1_4_10_7_9_6_4_4_11_10_5");
        assert_eq!(relation.target_class.to_string(), "2_8_11_7_2_1_8_8_6_3_5");
        assert_eq!(relation.via, BTreeSet::from([TransformationFamily::Retrograde]));
        assert_eq!(report.rotations.families.len(), 1);
        assert_eq!(report.rotations.families[0].members.len(), 2);
    }

    #[test]
    fn test_hexachord_classes_tagged() {
        let mut config = AnalysisConfig::default();
        config.hexachords.enabled = true;
        let report = analyze_catalog(&entries(&["1_1_1_1_1_1_1_1_1_1_1"]), &config).unwrap();
        assert_eq!(report.rows[0].hexachords.len(), 6);
        let hexachord_origins = report
            .classes
            .iter()
            .flat_map(|c| c.origins.iter())
            .filter(|o| matches!(o, ClassOrigin::Hexachord { .. }))
            .count();
        assert_eq!(hexachord_origins, 6 * 3);

        config.hexachords.include_halves = false;
        let report = analyze_catalog(&entries(&["1_1_1_1_1_1_1_1_1_1_1"]), &config).unwrap();
        assert!(report.classes.iter().all(|c| c.row_class.len() == 11));
    }

    #[test]
    fn test_odd_rows_skip_hexachords() {
        let mut config = AnalysisConfig::default();
        config.hexachords.enabled = true;
        let report = analyze_catalog(&entries(&["1_2_3_4"]), &config).unwrap();
        assert!(report.failures.is_empty());
        assert!(report.rows[0].hexachords.is_empty());
    }

    #[test]
    fn test_invalid_config_fails_the_pass() {
        let mut config = AnalysisConfig::default();
        config.rotation.min_length = 0;
        assert!(analyze_catalog(&entries(&["1_2_3"]), &config).is_err());
    }

    #[test]
    fn test_report_serializes_errors_as_text() {
        let report = analyze_catalog(&entries(&["13_1"]), &AnalysisConfig::default()).unwrap();
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(
            value["failures"][0]["error"],
            json!("value 13 at position 0 is outside [0, 12)")
        );
        assert_eq!(value["modulus"], json!(12));
    }
}
