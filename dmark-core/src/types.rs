use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::path::PathBuf;

// ===== SOURCE POSITIONS =====

/// Half-open byte range of a matched construct, plus the 1-based line and
/// column of its first byte. Computed once at parse time, never adjusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl SourceSpan {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

// ===== REFERENCE KINDS =====

/// Category of a label or cross-reference. Labels are scoped per kind:
/// a figure and a table may share a label without conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefKind {
    Figure,
    Table,
    Equation,
    Section,
}

impl RefKind {
    /// The short token used in source syntax and emitted anchors.
    pub fn token(&self) -> &'static str {
        match self {
            RefKind::Figure => "fig",
            RefKind::Table => "tbl",
            RefKind::Equation => "eq",
            RefKind::Section => "sec",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "fig" => Some(RefKind::Figure),
            "tbl" => Some(RefKind::Table),
            "eq" => Some(RefKind::Equation),
            "sec" => Some(RefKind::Section),
            _ => None,
        }
    }

    /// Human-readable name for diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            RefKind::Figure => "figure",
            RefKind::Table => "table",
            RefKind::Equation => "equation",
            RefKind::Section => "section",
        }
    }
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

// ===== PARSED CONSTRUCTS =====
// Transient parse results. `original` is always the exact substring of the
// source text at `span` — the transpiler splices replacements by span, and
// the validator reads line numbers off it.

/// Figure inline syntax: `@fig[label](path){attrs} Caption text.`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FigureElement {
    pub label: String,
    /// Opaque path string; existence is the validator's concern, not the parser's.
    pub image_path: String,
    pub caption: String,
    /// Normalized attribute name → value, insertion order preserved.
    pub attributes: IndexMap<String, String>,
    pub span: SourceSpan,
    pub original: String,
}

/// Table marker syntax: `@tbl[label] Caption text`. The table rows that
/// follow are ordinary markdown and are not part of the match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableElement {
    pub label: String,
    pub caption: String,
    pub span: SourceSpan,
    pub original: String,
}

/// Cross-reference syntax: `@fig[label]` or `@fig[label](custom text)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossReference {
    pub kind: RefKind,
    pub label: String,
    pub custom_text: Option<String>,
    pub span: SourceSpan,
    pub original: String,
}

/// Callout syntax: `@note{body}`. The kind set is open — rendering style
/// is decided by the transpiler's style map, unknown kinds fall back to gray.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalloutElement {
    pub kind: String,
    pub body: String,
    pub span: SourceSpan,
    pub original: String,
}

/// Standard markdown attribute anchor `{#fig:label …}`. Harvested so that
/// labels defined in plain markdown (mixed documents, equation/section
/// anchors) resolve during validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnchorLabel {
    pub kind: RefKind,
    pub label: String,
    pub span: SourceSpan,
}

// ===== DIAGNOSTICS =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single validation finding. Errors fail the run; warnings never do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub file: PathBuf,
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Diagnostic {
    pub fn error(file: &std::path::Path, line: usize, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            file: file.to_path_buf(),
            line,
            column: None,
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn warning(file: &std::path::Path, line: usize, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            file: file.to_path_buf(),
            line,
            column: None,
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_column(mut self, column: usize) -> Self {
        self.column = Some(column);
        self
    }
}

// ===== TRANSPILER OUTPUT =====

/// Counts of constructs rewritten by one `transpile` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranspileStats {
    pub figures: usize,
    pub tables: usize,
    pub cross_refs: usize,
    pub callouts: usize,
}

impl TranspileStats {
    pub fn total(&self) -> usize {
        self.figures + self.tables + self.cross_refs + self.callouts
    }
}

/// Non-fatal condition noticed while rewriting (the transpiler itself is a
/// total function and never fails). Currently only the dropped table caption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranspileWarning {
    pub line: usize,
    pub message: String,
}

/// Result of one `transpile` call. Stats are per-call, never process-global.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranspileOutput {
    pub content: String,
    pub stats: TranspileStats,
    pub warnings: Vec<TranspileWarning>,
}
