use crate::config::PreprocessorConfig;
use crate::parser::SyntaxParser;
use crate::similarity::{find_similar, EditDistance, SimilarityScorer};
use crate::transpiler::table_terminator;
use crate::types::*;
use indexmap::IndexMap;
use log::debug;
use std::path::{Path, PathBuf};
use thiserror::Error;

// Consistency Checker: two-phase project-wide validation.
//
// Collection runs once per file and registers labels, logs references, and
// checks image existence. Resolution runs once after every file has been
// collected — references can only be judged undefined once all labels are
// known. There is no transition back: collecting after resolution is a
// caller bug and is reported as such.

#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("cannot collect '{0}': reference resolution has already run")]
    CollectionClosed(PathBuf),
    #[error("reference resolution has already run")]
    AlreadyResolved,
}

/// First-definition site of a label. Write-once: duplicates are reported
/// against this site and never overwrite it.
#[derive(Debug, Clone, PartialEq)]
struct LabelSite {
    file: PathBuf,
    line: usize,
}

/// Defined labels, scoped per kind. A figure and a table may share a label.
#[derive(Debug, Default)]
struct LabelRegistry {
    figures: IndexMap<String, LabelSite>,
    tables: IndexMap<String, LabelSite>,
    equations: IndexMap<String, LabelSite>,
    sections: IndexMap<String, LabelSite>,
}

impl LabelRegistry {
    fn for_kind(&self, kind: RefKind) -> &IndexMap<String, LabelSite> {
        match kind {
            RefKind::Figure => &self.figures,
            RefKind::Table => &self.tables,
            RefKind::Equation => &self.equations,
            RefKind::Section => &self.sections,
        }
    }

    fn for_kind_mut(&mut self, kind: RefKind) -> &mut IndexMap<String, LabelSite> {
        match kind {
            RefKind::Figure => &mut self.figures,
            RefKind::Table => &mut self.tables,
            RefKind::Equation => &mut self.equations,
            RefKind::Section => &mut self.sections,
        }
    }
}

/// One logged cross-reference occurrence, judged only during resolution.
#[derive(Debug, Clone)]
struct LoggedReference {
    kind: RefKind,
    label: String,
    file: PathBuf,
    span: SourceSpan,
}

pub struct Validator {
    registry: LabelRegistry,
    references: Vec<LoggedReference>,
    diagnostics: Vec<Diagnostic>,
    scorer: Box<dyn SimilarityScorer>,
    suggestion_cutoff: f64,
    max_suggestions: usize,
    resolved: bool,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    pub fn new() -> Self {
        Self::with_config(&PreprocessorConfig::default())
    }

    pub fn with_config(config: &PreprocessorConfig) -> Self {
        Self {
            registry: LabelRegistry::default(),
            references: Vec::new(),
            diagnostics: Vec::new(),
            scorer: Box::new(EditDistance),
            suggestion_cutoff: config.suggestion_cutoff,
            max_suggestions: config.max_suggestions,
            resolved: false,
        }
    }

    /// Swap the suggestion scorer (the default is edit-distance ratio).
    pub fn with_scorer(mut self, scorer: Box<dyn SimilarityScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    /// Collection phase, once per file. `image_exists` is supplied by the
    /// caller (the file walker knows the project root; the core does not
    /// touch the filesystem). Returns the diagnostics for this file;
    /// they are also retained for `passed()` and final reporting.
    pub fn collect_file(
        &mut self,
        file: &Path,
        content: &str,
        image_exists: impl Fn(&str) -> bool,
    ) -> Result<Vec<Diagnostic>, ValidatorError> {
        if self.resolved {
            return Err(ValidatorError::CollectionClosed(file.to_path_buf()));
        }

        let parser = SyntaxParser::new(content);
        let before = self.diagnostics.len();

        let figures = parser.parse_figures();
        for fig in &figures {
            self.register_label(RefKind::Figure, &fig.label, file, fig.span);
        }

        let tables = parser.parse_tables();
        for tbl in &tables {
            self.register_label(RefKind::Table, &tbl.label, file, tbl.span);

            // A marker whose following table block is missing silently loses
            // its caption at transpile time; surface that here with file/line.
            let tail = &content[tbl.span.end..];
            let lines: Vec<&str> = tail.split('\n').collect();
            if table_terminator(&lines).is_none() {
                self.diagnostics.push(
                    Diagnostic::warning(
                        file,
                        tbl.span.line,
                        format!("No table block follows '@tbl[{}]'", tbl.label),
                    )
                    .with_column(tbl.span.column)
                    .with_suggestion(
                        "Put the table directly after the marker and end it with a blank line",
                    ),
                );
            }
        }

        // Labels already defined in standard markdown (mixed documents,
        // equation/section anchors) count as definitions too.
        for anchor in parser.parse_anchors() {
            self.register_label(anchor.kind, &anchor.label, file, anchor.span);
        }

        // References are logged verbatim, not yet judged.
        for r in parser.parse_cross_references() {
            self.references.push(LoggedReference {
                kind: r.kind,
                label: r.label,
                file: file.to_path_buf(),
                span: r.span,
            });
        }

        for fig in &figures {
            if !image_exists(&fig.image_path) {
                self.diagnostics.push(
                    Diagnostic::warning(
                        file,
                        fig.span.line,
                        format!("Image file not found: {}", fig.image_path),
                    )
                    .with_column(fig.span.column)
                    .with_suggestion("Check the path or create the image"),
                );
            }
        }

        Ok(self.diagnostics[before..].to_vec())
    }

    /// First registration wins; later registrations of the same `(kind,
    /// label)` produce an error naming both sites and leave the registry
    /// untouched.
    fn register_label(&mut self, kind: RefKind, label: &str, file: &Path, span: SourceSpan) {
        let labels = self.registry.for_kind_mut(kind);
        if let Some(site) = labels.get(label) {
            let suggestion = format!("Previous definition at {}:{}", site.file.display(), site.line);
            self.diagnostics.push(
                Diagnostic::error(
                    file,
                    span.line,
                    format!("Duplicate {} label '{}:{}'", kind.describe(), kind.token(), label),
                )
                .with_column(span.column)
                .with_suggestion(suggestion),
            );
        } else {
            labels.insert(
                label.to_string(),
                LabelSite {
                    file: file.to_path_buf(),
                    line: span.line,
                },
            );
        }
    }

    /// Resolution phase, run once after all files are collected. Every
    /// logged reference whose label is not registered for its kind becomes
    /// an error, with up to `max_suggestions` fuzzy-matched alternatives of
    /// the same kind attached.
    pub fn resolve_references(&mut self) -> Result<Vec<Diagnostic>, ValidatorError> {
        if self.resolved {
            return Err(ValidatorError::AlreadyResolved);
        }
        self.resolved = true;
        debug!(
            "resolving {} references against {} figure / {} table / {} equation / {} section labels",
            self.references.len(),
            self.registry.figures.len(),
            self.registry.tables.len(),
            self.registry.equations.len(),
            self.registry.sections.len(),
        );

        let before = self.diagnostics.len();
        for r in &self.references {
            let labels = self.registry.for_kind(r.kind);
            if labels.contains_key(&r.label) {
                continue;
            }

            let similar = find_similar(
                self.scorer.as_ref(),
                &r.label,
                labels.keys().map(String::as_str),
                self.max_suggestions,
                self.suggestion_cutoff,
            );
            let mut diagnostic = Diagnostic::error(
                &r.file,
                r.span.line,
                format!("Undefined reference @{}:{}", r.kind.token(), r.label),
            )
            .with_column(r.span.column);
            if !similar.is_empty() {
                let formatted: Vec<String> = similar
                    .iter()
                    .map(|label| format!("@{}:{}", r.kind.token(), label))
                    .collect();
                diagnostic = diagnostic
                    .with_suggestion(format!("Did you mean: {}?", formatted.join(", ")));
            }
            self.diagnostics.push(diagnostic);
        }

        Ok(self.diagnostics[before..].to_vec())
    }

    /// All diagnostics accumulated so far, in the order they were produced.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Validation passes iff no error was produced. Warnings never fail it.
    pub fn passed(&self) -> bool {
        !self
            .diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }
}

/// Format diagnostics for display. Pure projection: terse mode shows errors
/// plus a warning count, verbose mode shows everything in full.
pub fn report(diagnostics: &[Diagnostic], verbose: bool) -> String {
    let errors: Vec<&Diagnostic> = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .collect();
    let warnings: Vec<&Diagnostic> = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .collect();

    if errors.is_empty() && warnings.is_empty() {
        return "✓ Validation passed\n".to_string();
    }

    let mut out = String::new();
    if !errors.is_empty() {
        out.push_str(&format!("{} error(s) found:\n\n", errors.len()));
        for error in &errors {
            format_diagnostic(&mut out, error);
        }
    }

    if verbose && !warnings.is_empty() {
        out.push_str(&format!("{} warning(s):\n\n", warnings.len()));
        for warning in &warnings {
            format_diagnostic(&mut out, warning);
        }
    } else if !warnings.is_empty() {
        out.push_str(&format!(
            "{} warning(s) (use --verbose to see them)\n",
            warnings.len()
        ));
    }

    out
}

fn format_diagnostic(out: &mut String, diagnostic: &Diagnostic) {
    let (symbol, label) = match diagnostic.severity {
        Severity::Error => ("✗", "ERROR"),
        Severity::Warning => ("⚠", "WARNING"),
    };
    out.push_str(&format!("{} {}: {}\n", symbol, label, diagnostic.message));
    match diagnostic.column {
        Some(column) => out.push_str(&format!(
            "  --> {}:{}:{}\n",
            diagnostic.file.display(),
            diagnostic.line,
            column
        )),
        None => out.push_str(&format!(
            "  --> {}:{}\n",
            diagnostic.file.display(),
            diagnostic.line
        )),
    }
    if let Some(suggestion) = &diagnostic.suggestion {
        out.push_str(&format!("  = help: {suggestion}\n"));
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn any_image(_: &str) -> bool {
        true
    }

    #[test]
    fn collection_after_resolution_is_rejected() {
        let mut validator = Validator::new();
        validator
            .collect_file(Path::new("a.md"), "@fig[x](i.jpg) Cap.", any_image)
            .unwrap();
        validator.resolve_references().unwrap();

        let err = validator
            .collect_file(Path::new("b.md"), "text", any_image)
            .unwrap_err();
        assert!(matches!(err, ValidatorError::CollectionClosed(_)));

        let err = validator.resolve_references().unwrap_err();
        assert!(matches!(err, ValidatorError::AlreadyResolved));
    }

    #[test]
    fn report_terse_counts_warnings() {
        let diagnostics = vec![
            Diagnostic::error(Path::new("a.md"), 3, "Undefined reference @fig:x"),
            Diagnostic::warning(Path::new("a.md"), 7, "Image file not found: img.png"),
        ];

        let terse = report(&diagnostics, false);
        assert!(terse.contains("1 error(s) found:"));
        assert!(terse.contains("✗ ERROR: Undefined reference @fig:x"));
        assert!(terse.contains("--> a.md:3"));
        assert!(terse.contains("1 warning(s) (use --verbose to see them)"));
        assert!(!terse.contains("Image file not found"));

        let verbose = report(&diagnostics, true);
        assert!(verbose.contains("⚠ WARNING: Image file not found: img.png"));
    }

    #[test]
    fn report_clean_run() {
        assert_eq!(report(&[], false), "✓ Validation passed\n");
    }

    #[test]
    fn report_does_not_mutate_inputs() {
        let diagnostics =
            vec![Diagnostic::error(Path::new("a.md"), 1, "Duplicate figure label 'fig:x'")];
        let copy = diagnostics.clone();
        let _ = report(&diagnostics, true);
        assert_eq!(diagnostics, copy);
    }
}
