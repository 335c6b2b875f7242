// Tone row analysis CLI.
//
// Usage:
//   analyze --pattern 1_3_1_6_11_5_4_2_9_2_6 [--modulus N]
//   analyze catalog.json [--config cfg.json] [--modulus N]
//     [--strategy pairwise|necklace] [--parallel] [--hexachords]
//     [--form-rotations] [--output report.json]
//
// The catalog is a JSON array of `{"pattern": ..., "provenance": ...}`
// entries. The report goes to `--output`, or to stdout when omitted.
// Diagnostics go to stderr; set RUST_LOG (e.g. `RUST_LOG=debug`) for more.

use std::fmt;
use std::path::Path;
use std::process;
use std::str::FromStr;
use tone_row_analysis::catalog::load_catalog;
use tone_row_analysis::forms::family_vectors;
use tone_row_analysis::rotation::RotationStrategy;
use tone_row_analysis::{
    AnalysisConfig, IntervalVector, Modulus, RowFormSet, TransformationFamily, analyze_catalog,
    canonicalize_pattern,
};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    let modulus = match parse_flag::<u32>(&args, "--modulus").map(Modulus::new) {
        None => None,
        Some(Ok(m)) => Some(m),
        Some(Err(e)) => fail(&e.to_string()),
    };

    if let Some(pattern) = parse_flag::<String>(&args, "--pattern") {
        show_pattern(&pattern, modulus.unwrap_or_default());
        return;
    }

    let Some(catalog_path) = positional_arg(&args) else {
        fail("usage: analyze --pattern P | analyze <catalog.json> [options]");
    };
    run_catalog(Path::new(catalog_path), modulus, &args);
}

fn show_pattern(text: &str, modulus: Modulus) {
    let vector = match IntervalVector::parse(text, modulus) {
        Ok(v) => v,
        Err(e) => fail(&format!("bad pattern '{}': {}", text, e)),
    };
    let forms = RowFormSet::from_intervals(&vector);

    println!("=== Row forms of {} (mod {}) ===", vector, modulus);
    for family in TransformationFamily::ALL {
        println!("[{}]", family);
        for form in forms.family(family) {
            println!("  {:<5} {}", form.to_string(), form.pitches);
        }
    }
    if forms.has_collisions() {
        println!("  ({} distinct sequences of {})", forms.distinct().len(), forms.len());
    }

    println!();
    println!("Family vectors:");
    for (family, v) in family_vectors(&vector) {
        println!("  {:<3} {}", family.label(), v);
    }

    let canonical = canonicalize_pattern(&vector);
    println!();
    println!("Row class: {}", canonical.row_class);
    let labels: Vec<&str> = canonical.families.iter().map(|f| f.label()).collect();
    if canonical.is_ambiguous() {
        println!("  Ambiguous: reached by {}", labels.join(", "));
    } else {
        println!("  Reached by {}", labels.join(", "));
    }
}

fn run_catalog(path: &Path, modulus: Option<Modulus>, args: &[String]) {
    let mut config = match parse_flag::<String>(args, "--config") {
        Some(config_path) => match AnalysisConfig::load(Path::new(&config_path)) {
            Ok(c) => c,
            Err(e) => fail(&format!("failed to load config {}: {}", config_path, e)),
        },
        None => AnalysisConfig::default(),
    };
    if let Some(m) = modulus {
        config.modulus = m;
    }
    if let Some(name) = parse_flag::<String>(args, "--strategy") {
        config.rotation.strategy = match name.parse::<RotationStrategy>() {
            Ok(s) => s,
            Err(e) => fail(&e),
        };
    }
    if has_flag(args, "--parallel") {
        config.rotation.parallel = true;
    }
    if has_flag(args, "--hexachords") {
        config.hexachords.enabled = true;
    }
    if has_flag(args, "--form-rotations") {
        config.form_rotations = true;
    }
    let output: Option<String> = parse_flag(args, "--output");

    let entries = match load_catalog(path) {
        Ok(e) => e,
        Err(e) => fail(&format!("failed to load catalog {}: {}", path.display(), e)),
    };
    let report = match analyze_catalog(&entries, &config) {
        Ok(r) => r,
        Err(e) => fail(&e.to_string()),
    };
    let json = match serde_json::to_string_pretty(&report) {
        Ok(j) => j,
        Err(e) => fail(&e.to_string()),
    };

    match output {
        Some(out) => {
            if let Err(e) = std::fs::write(&out, json) {
                fail(&format!("failed to write {}: {}", out, e));
            }
            println!("=== Tone row catalog ===");
            println!("Entries: {}", entries.len());
            println!("  Analyzed: {}", report.rows.len());
            println!("  Failed: {}", report.failures.len());
            for failure in &report.failures {
                println!("    row {}: {}", failure.index, failure.error);
            }
            println!("Distinct row classes: {}", report.classes.len());
            println!(
                "Rotation relations: {} ({} families, {:?})",
                report.rotations.relations.len(),
                report.rotations.families.len(),
                config.rotation.strategy
            );
            if let Some(forms) = &report.form_rotations {
                println!("Form rotations: {} pairs", forms.pairs.len());
            }
            println!("Report written to {}", out);
        }
        None => println!("{}", json),
    }
}

fn fail(message: &str) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

/// Flags that consume the following argument as their value.
const VALUE_FLAGS: [&str; 5] = ["--pattern", "--config", "--modulus", "--strategy", "--output"];

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn parse_flag<T: FromStr>(args: &[String], flag: &str) -> Option<T>
where
    T::Err: fmt::Display,
{
    match flag_value(args, flag) {
        Ok(v) => v,
        Err(e) => fail(&e),
    }
}

/// The parsed value following `flag`, `Ok(None)` when the flag is absent.
/// A missing or unparsable value is an error rather than a silent default.
fn flag_value<T: FromStr>(args: &[String], flag: &str) -> Result<Option<T>, String>
where
    T::Err: fmt::Display,
{
    let Some(i) = args.iter().position(|a| a == flag) else {
        return Ok(None);
    };
    let raw = args
        .get(i + 1)
        .filter(|v| !v.starts_with("--"))
        .ok_or_else(|| format!("{} requires a value", flag))?;
    raw.parse()
        .map(Some)
        .map_err(|e| format!("invalid value '{}' for {}: {}", raw, flag, e))
}

/// The first argument after the program name that is neither a flag nor
/// the value of a value-taking flag.
fn positional_arg(args: &[String]) -> Option<&str> {
    let mut rest = args.iter().skip(1);
    while let Some(arg) = rest.next() {
        if VALUE_FLAGS.contains(&arg.as_str()) {
            rest.next();
        } else if !arg.starts_with("--") {
            return Some(arg);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_catalog_path_after_flags() {
        let a = args(&["analyze", "--modulus", "12", "--parallel", "rows.json", "--hexachords"]);
        assert_eq!(positional_arg(&a), Some("rows.json"));
        let a = args(&["analyze", "--config", "cfg.json", "rows.json"]);
        assert_eq!(positional_arg(&a), Some("rows.json"));
        let a = args(&["analyze", "rows.json", "--output", "out.json"]);
        assert_eq!(positional_arg(&a), Some("rows.json"));
    }

    #[test]
    fn test_no_catalog_path() {
        assert_eq!(positional_arg(&args(&["analyze"])), None);
        let a = args(&["analyze", "--strategy", "necklace", "--parallel"]);
        assert_eq!(positional_arg(&a), None);
    }

    #[test]
    fn test_flag_value_parses() {
        let a = args(&["analyze", "rows.json", "--modulus", "7"]);
        assert_eq!(flag_value::<u32>(&a, "--modulus"), Ok(Some(7)));
        assert_eq!(flag_value::<u32>(&a, "--output"), Ok(None));
    }

    #[test]
    fn test_flag_value_rejects_bad_input() {
        let a = args(&["analyze", "rows.json", "--modulus", "abc"]);
        let err = flag_value::<u32>(&a, "--modulus").unwrap_err();
        assert!(err.contains("abc"), "{err}");

        let a = args(&["analyze", "rows.json", "--modulus"]);
        assert!(flag_value::<u32>(&a, "--modulus").is_err());

        let a = args(&["analyze", "--output", "--parallel", "rows.json"]);
        assert!(flag_value::<String>(&a, "--output").is_err());
    }
}
