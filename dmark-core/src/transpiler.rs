use crate::config::PreprocessorConfig;
use crate::parser::SyntaxParser;
use crate::types::*;
use indexmap::IndexMap;
use log::{debug, warn};
use std::ops::Range;

// Rewriter: converts enhanced syntax to standard markdown + LaTeX.
//
// Four passes in fixed order: figures → tables → callouts → cross-references.
// Table processing must precede cross-reference processing so a table's own
// marker is not mistaken for a table-style reference; callouts run before
// cross-references so a reference inside a callout body is still rewritten.
// Each pass re-parses the current text, because earlier passes shift offsets.
//
// Within a pass, replacements are keyed by match span and applied by
// splicing, never by substring search — two constructs with byte-identical
// original text can never target the wrong occurrence.

/// Built-in callout kind → fence style mapping. Unknown kinds render gray.
const CALLOUT_STYLES: &[(&str, &str)] = &[
    ("note", "bluebox"),
    ("info", "bluebox"),
    ("warning", "yellowbox"),
    ("caution", "yellowbox"),
    ("error", "redbox"),
    ("danger", "redbox"),
    ("success", "greenbox"),
    ("tip", "graybox"),
];

const DEFAULT_CALLOUT_STYLE: &str = "graybox";

pub struct Transpiler {
    callout_styles: IndexMap<String, String>,
}

impl Default for Transpiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Transpiler {
    pub fn new() -> Self {
        let callout_styles = CALLOUT_STYLES
            .iter()
            .map(|(kind, style)| (kind.to_string(), style.to_string()))
            .collect();
        Self { callout_styles }
    }

    /// Config-supplied styles are merged over the built-in map.
    pub fn with_config(config: &PreprocessorConfig) -> Self {
        let mut transpiler = Self::new();
        for (kind, style) in &config.callout_styles {
            transpiler
                .callout_styles
                .insert(kind.to_ascii_lowercase(), style.clone());
        }
        transpiler
    }

    /// Rewrite one document. Total over text: never fails, and text with no
    /// recognized construct is returned byte-identical.
    pub fn transpile(&self, content: &str) -> TranspileOutput {
        let mut stats = TranspileStats::default();
        let mut warnings = Vec::new();

        if !SyntaxParser::new(content).has_enhanced_syntax() {
            debug!("no enhanced syntax found, passing through unchanged");
            return TranspileOutput {
                content: content.to_string(),
                stats,
                warnings,
            };
        }

        let content = self.process_figures(content, &mut stats);
        let content = self.process_tables(&content, &mut stats, &mut warnings);
        let content = self.process_callouts(&content, &mut stats);
        let content = self.process_cross_references(&content, &mut stats);

        TranspileOutput {
            content,
            stats,
            warnings,
        }
    }

    /// `@fig[id](path.jpg){w=50% short="Short"} Caption.`
    /// → `![Caption.](path.jpg){#fig:id width=50% short-caption="Short"}`
    fn process_figures(&self, content: &str, stats: &mut TranspileStats) -> String {
        let figures = SyntaxParser::new(content).parse_figures();
        stats.figures += figures.len();

        let replacements: Vec<_> = figures
            .iter()
            .map(|fig| (fig.span.range(), figure_markup(fig)))
            .collect();
        splice(content, &replacements)
    }

    /// The marker line is deleted; the caption `: Caption {#tbl:id}` is
    /// appended after the table block that follows the removal point,
    /// separated by a blank line. A marker with no blank-line-terminated
    /// table block after it drops the caption and surfaces a warning.
    fn process_tables(
        &self,
        content: &str,
        stats: &mut TranspileStats,
        warnings: &mut Vec<TranspileWarning>,
    ) -> String {
        let tables = SyntaxParser::new(content).parse_tables();
        if tables.is_empty() {
            return content.to_string();
        }

        // Reverse document order: the caption insertion shifts everything
        // after the block, so earlier spans stay valid.
        let mut out = content.to_string();
        for tbl in tables.iter().rev() {
            out.replace_range(tbl.span.range(), "");

            let tail = out[tbl.span.start..].to_string();
            let lines: Vec<&str> = tail.split('\n').collect();
            match table_terminator(&lines) {
                Some(end_idx) => {
                    let before = lines[..end_idx].join("\n");
                    let after = lines[end_idx..].join("\n");
                    let caption = format!(": {} {{#tbl:{}}}", tbl.caption, tbl.label);
                    let rebuilt = format!("{before}\n\n{caption}{after}");
                    out.replace_range(tbl.span.start.., &rebuilt);
                }
                None => {
                    warn!(
                        "line {}: no table block follows '@tbl[{}]', caption dropped",
                        tbl.span.line, tbl.label
                    );
                    warnings.push(TranspileWarning {
                        line: tbl.span.line,
                        message: format!(
                            "no table block follows '@tbl[{}]'; caption was dropped",
                            tbl.label
                        ),
                    });
                }
            }
            stats.tables += 1;
        }
        out
    }

    /// `@note{body}` → three-line fenced div with a styled title.
    fn process_callouts(&self, content: &str, stats: &mut TranspileStats) -> String {
        let callouts = SyntaxParser::new(content).parse_callouts();
        stats.callouts += callouts.len();

        let replacements: Vec<_> = callouts
            .iter()
            .map(|callout| (callout.span.range(), self.callout_markup(callout)))
            .collect();
        splice(content, &replacements)
    }

    /// Equations become LaTeX `\eqref`; figures, tables, and sections become
    /// pandoc-native `@kind:label` tokens, or links when custom text is given.
    fn process_cross_references(&self, content: &str, stats: &mut TranspileStats) -> String {
        let refs = SyntaxParser::new(content).parse_cross_references();
        stats.cross_refs += refs.len();

        let replacements: Vec<_> = refs
            .iter()
            .map(|r| (r.span.range(), reference_markup(r)))
            .collect();
        splice(content, &replacements)
    }

    fn callout_markup(&self, callout: &CalloutElement) -> String {
        let kind = callout.kind.to_ascii_lowercase();
        let style = self
            .callout_styles
            .get(&kind)
            .map(String::as_str)
            .unwrap_or(DEFAULT_CALLOUT_STYLE);
        format!(
            "::: {{.{} title=\"{}\"}}\n{}\n:::",
            style,
            capitalize(&callout.kind),
            callout.body
        )
    }
}

fn figure_markup(fig: &FigureElement) -> String {
    let mut attrs = vec![format!("#fig:{}", fig.label)];
    for (key, value) in &fig.attributes {
        if key != "short-caption" {
            attrs.push(format!("{key}={value}"));
        }
    }
    // short-caption is always re-emitted quoted, last, however it was sourced
    if let Some(short) = fig.attributes.get("short-caption") {
        attrs.push(format!("short-caption=\"{short}\""));
    }
    format!("![{}]({}){{{}}}", fig.caption, fig.image_path, attrs.join(" "))
}

fn reference_markup(r: &CrossReference) -> String {
    match (&r.kind, &r.custom_text) {
        (RefKind::Equation, Some(text)) => format!("{} \\eqref{{eq:{}}}", text, r.label),
        (RefKind::Equation, None) => format!("\\eqref{{eq:{}}}", r.label),
        (kind, Some(text)) => format!("[{}](#{}:{})", text, kind.token(), r.label),
        (kind, None) => format!("@{}:{}", kind.token(), r.label),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Emit `content` with each span replaced. Spans must be non-overlapping and
/// in ascending order — exactly what the per-kind parsers yield.
fn splice(content: &str, replacements: &[(Range<usize>, String)]) -> String {
    let mut out = String::with_capacity(content.len());
    let mut cursor = 0;
    for (range, replacement) in replacements {
        out.push_str(&content[cursor..range.start]);
        out.push_str(replacement);
        cursor = range.end;
    }
    out.push_str(&content[cursor..]);
    out
}

/// Index of the first blank line that terminates a contiguous run of
/// table-delimiter-led lines, scanning from the top of `lines`. Lines before
/// the run (including the leftover empty fragment of a deleted marker line)
/// are skipped; `None` means no blank-line-terminated table block exists.
pub(crate) fn table_terminator(lines: &[&str]) -> Option<usize> {
    let mut in_table = false;
    for (i, line) in lines.iter().enumerate() {
        if line.trim_start().starts_with('|') {
            in_table = true;
        } else if in_table && line.trim().is_empty() {
            return Some(i);
        }
    }
    None
}
