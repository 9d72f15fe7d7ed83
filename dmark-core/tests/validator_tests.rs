//! Project-wide validation tests: label collection, duplicate detection,
//! two-phase reference resolution, fuzzy suggestions, and reporting.

use dmark_core::{report, Diagnostic, Severity, Validator};
use std::path::Path;

fn image_present(_: &str) -> bool {
    true
}

fn errors(diagnostics: &[Diagnostic]) -> Vec<&Diagnostic> {
    diagnostics.iter().filter(|d| d.severity == Severity::Error).collect()
}

fn warnings(diagnostics: &[Diagnostic]) -> Vec<&Diagnostic> {
    diagnostics.iter().filter(|d| d.severity == Severity::Warning).collect()
}

// ============================================================================
// Label collection and duplicates
// ============================================================================

#[test]
fn duplicate_figure_label_across_files_cites_both_sites() {
    let mut validator = Validator::new();
    validator
        .collect_file(Path::new("one.md"), "@fig[dup](a.jpg) Cap A.", image_present)
        .unwrap();
    let second = validator
        .collect_file(Path::new("two.md"), "@fig[dup](b.jpg) Cap B.", image_present)
        .unwrap();

    let errs = errors(&second);
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].file, Path::new("two.md"));
    assert!(errs[0].message.contains("Duplicate figure label 'fig:dup'"));
    assert_eq!(
        errs[0].suggestion.as_deref(),
        Some("Previous definition at one.md:1")
    );

    // a third registration errors again, still pointing at the first site
    let third = validator
        .collect_file(Path::new("three.md"), "@fig[dup](c.jpg) Cap C.", image_present)
        .unwrap();
    let errs = errors(&third);
    assert_eq!(errs.len(), 1);
    assert!(errs[0].suggestion.as_deref().unwrap().contains("one.md:1"));

    assert!(!validator.passed());
}

#[test]
fn figure_and_table_may_share_a_label() {
    let content = "@fig[shared](img.jpg) A figure.\n\n@tbl[shared] A table\n| a |\n|---|\n\n";
    let mut validator = Validator::new();
    let diagnostics = validator
        .collect_file(Path::new("doc.md"), content, image_present)
        .unwrap();

    assert!(errors(&diagnostics).is_empty());
    validator.resolve_references().unwrap();
    assert!(validator.passed());
}

#[test]
fn standard_markdown_anchors_count_as_definitions() {
    let content = "![Cap](i.jpg){#fig:std width=50%}\n\n$$E = mc^2$$ {#eq:einstein}\n\nSee @fig[std] and @eq[einstein].\n";
    let mut validator = Validator::new();
    validator
        .collect_file(Path::new("doc.md"), content, image_present)
        .unwrap();
    let resolution = validator.resolve_references().unwrap();

    assert!(resolution.is_empty());
    assert!(validator.passed());
}

// ============================================================================
// Reference resolution and suggestions
// ============================================================================

#[test]
fn undefined_reference_is_an_error() {
    let mut validator = Validator::new();
    validator
        .collect_file(Path::new("doc.md"), "See @fig[missing].", image_present)
        .unwrap();
    let resolution = validator.resolve_references().unwrap();

    assert_eq!(resolution.len(), 1);
    assert!(resolution[0].message.contains("Undefined reference @fig:missing"));
    // nothing registered for figures, so no suggestion either
    assert_eq!(resolution[0].suggestion, None);
    assert!(!validator.passed());
}

#[test]
fn near_miss_reference_gets_a_suggestion() {
    let mut validator = Validator::new();
    validator
        .collect_file(
            Path::new("defs.md"),
            "@fig[data](plots/data.jpg) The data.",
            image_present,
        )
        .unwrap();
    validator
        .collect_file(Path::new("refs.md"), "As @fig[darta] shows.", image_present)
        .unwrap();
    let resolution = validator.resolve_references().unwrap();

    assert_eq!(resolution.len(), 1);
    assert!(resolution[0].message.contains("@fig:darta"));
    assert!(resolution[0]
        .suggestion
        .as_deref()
        .unwrap()
        .contains("@fig:data"));
}

#[test]
fn suggestions_are_scoped_to_the_reference_kind() {
    let mut validator = Validator::new();
    // "data" exists only as a table label; a figure reference to "darta"
    // must not borrow it.
    let content = "@tbl[data] Numbers\n| a |\n|---|\n\nSee @fig[darta].\n";
    validator
        .collect_file(Path::new("doc.md"), content, image_present)
        .unwrap();
    let resolution = validator.resolve_references().unwrap();

    let undefined: Vec<_> = resolution
        .iter()
        .filter(|d| d.message.contains("@fig:darta"))
        .collect();
    assert_eq!(undefined.len(), 1);
    assert_eq!(undefined[0].suggestion, None);
}

#[test]
fn references_resolve_across_files() {
    let mut validator = Validator::new();
    validator
        .collect_file(Path::new("a.md"), "See @fig[late] soon.", image_present)
        .unwrap();
    // the definition arrives in a later file; judgement waits for resolution
    validator
        .collect_file(Path::new("b.md"), "@fig[late](l.jpg) Arrives late.", image_present)
        .unwrap();
    let resolution = validator.resolve_references().unwrap();

    assert!(resolution.is_empty());
    assert!(validator.passed());
}

// ============================================================================
// Warnings
// ============================================================================

#[test]
fn missing_image_is_a_warning_not_an_error() {
    let mut validator = Validator::new();
    let diagnostics = validator
        .collect_file(
            Path::new("doc.md"),
            "@fig[plot](missing/plot.png) A plot.",
            |_| false,
        )
        .unwrap();

    let warns = warnings(&diagnostics);
    assert_eq!(warns.len(), 1);
    assert!(warns[0].message.contains("Image file not found: missing/plot.png"));

    validator.resolve_references().unwrap();
    assert!(validator.passed(), "warnings never fail validation");
}

#[test]
fn dangling_table_marker_is_a_warning() {
    let mut validator = Validator::new();
    let diagnostics = validator
        .collect_file(
            Path::new("doc.md"),
            "@tbl[orphan] Caption\nNo table follows.",
            image_present,
        )
        .unwrap();

    let warns = warnings(&diagnostics);
    assert_eq!(warns.len(), 1);
    assert!(warns[0].message.contains("@tbl[orphan]"));
}

#[test]
fn diagnostics_carry_source_columns() {
    let mut validator = Validator::new();
    validator
        .collect_file(Path::new("one.md"), "@fig[dup](a.jpg) Cap A.", image_present)
        .unwrap();
    let second = validator
        .collect_file(
            Path::new("two.md"),
            "Intro.\n    @fig[dup](b.jpg) Cap B.\nSee @fig[missing].",
            image_present,
        )
        .unwrap();

    let errs = errors(&second);
    assert_eq!(errs[0].line, 2);
    assert_eq!(errs[0].column, Some(5));

    let resolution = validator.resolve_references().unwrap();
    assert_eq!(resolution[0].line, 3);
    assert_eq!(resolution[0].column, Some(5));

    let text = report(validator.diagnostics(), false);
    assert!(text.contains("--> two.md:2:5"));
    assert!(text.contains("--> two.md:3:5"));
}

// ============================================================================
// Reporting and serialization
// ============================================================================

#[test]
fn end_to_end_report() {
    let mut validator = Validator::new();
    validator
        .collect_file(Path::new("a.md"), "@fig[x](a.jpg) One.", |_| false)
        .unwrap();
    validator
        .collect_file(Path::new("b.md"), "@fig[x](b.jpg) Two.\n\nSee @fig[y].", |_| false)
        .unwrap();
    validator.resolve_references().unwrap();

    let text = report(validator.diagnostics(), false);
    assert!(text.contains("2 error(s) found:"));
    assert!(text.contains("Duplicate figure label 'fig:x'"));
    assert!(text.contains("Undefined reference @fig:y"));
    assert!(text.contains("2 warning(s) (use --verbose to see them)"));

    let verbose = report(validator.diagnostics(), true);
    assert!(verbose.contains("Image file not found: a.jpg"));
    assert!(verbose.contains("Image file not found: b.jpg"));
}

#[test]
fn diagnostics_serialize_to_json_and_back() {
    let diagnostic = Diagnostic::error(Path::new("doc.md"), 12, "Undefined reference @eq:x")
        .with_suggestion("Did you mean: @eq:y?");

    let json = serde_json::to_string(&diagnostic).unwrap();
    assert!(json.contains("\"severity\":\"error\""));

    let back: Diagnostic = serde_json::from_str(&json).unwrap();
    assert_eq!(back, diagnostic);
}
