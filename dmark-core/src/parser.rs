use crate::types::*;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

// Pattern Recognizer for the enhanced inline syntax.
//
// Each construct kind is matched independently; matches within a kind are
// non-overlapping and in left-to-right text order (regex scan order).
// Malformed `@...` sequences that match no pattern are simply not constructs
// and pass through as literal text — the parser never reports them.

/// Figure: `@fig[label](path){attrs}? Caption text.`
/// The path may not contain whitespace: `@fig[x](some spaced text)` is a
/// cross-reference with custom text, not a figure. The caption runs to the
/// first newline, construct marker, or end of text; both boundary characters
/// are excluded from the caption class, so the greedy match stops exactly
/// where a lookahead would.
static FIGURE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@fig\[([A-Za-z0-9_-]+)\]\(([^)\s]+)\)(?:\{([^}]*)\})?\s*([^\n@]+)")
        .expect("figure pattern is valid")
});

/// Table marker: `@tbl[label] Caption text`, anchored to line start and
/// confined to a single line. A mid-prose `@tbl[label]` is a cross-reference,
/// not a marker. The table body that follows is located positionally by the
/// transpiler.
static TABLE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^@tbl\[([A-Za-z0-9_-]+)\][ \t]+([^\n@]+)").expect("table pattern is valid")
});

/// Cross-reference: `@fig[label]`, optionally `@fig[label](custom text)`.
static CROSS_REF_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@(fig|tbl|eq|sec)\[([A-Za-z0-9_-]+)\](?:\(([^)]+)\))?")
        .expect("cross-reference pattern is valid")
});

/// Callout: `@note{body}`. The kind set is open; the body may contain
/// anything except the closing brace.
static CALLOUT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@([A-Za-z][A-Za-z0-9_-]*)\{([^}]+)\}").expect("callout pattern is valid")
});

/// Standard markdown attribute anchor: `{#fig:label …}`.
static ANCHOR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{#(fig|tbl|eq|sec):([A-Za-z0-9_-]+)").expect("anchor pattern is valid")
});

/// Quoted attribute pair: `key="value with anything but quotes"`.
static QUOTED_ATTR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(\w+)="([^"]*)""#).expect("quoted attribute pattern is valid"));

/// Unquoted attribute pair: `key=value` (value stops at whitespace or quote).
static UNQUOTED_ATTR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(\w+)=([^\s"]+)"#).expect("unquoted attribute pattern is valid"));

/// Scans one document's text for enhanced-syntax constructs.
pub struct SyntaxParser<'a> {
    content: &'a str,
}

impl<'a> SyntaxParser<'a> {
    pub fn new(content: &'a str) -> Self {
        Self { content }
    }

    /// 1-based line number of a byte offset.
    fn line_number(&self, offset: usize) -> usize {
        self.content[..offset].matches('\n').count() + 1
    }

    /// 1-based column (in characters) of a byte offset within its line.
    fn column_number(&self, offset: usize) -> usize {
        let line_start = self.content[..offset].rfind('\n').map_or(0, |i| i + 1);
        self.content[line_start..offset].chars().count() + 1
    }

    fn span_of(&self, m: &regex::Match<'_>) -> SourceSpan {
        SourceSpan {
            start: m.start(),
            end: m.end(),
            line: self.line_number(m.start()),
            column: self.column_number(m.start()),
        }
    }

    pub fn parse_figures(&self) -> Vec<FigureElement> {
        FIGURE_PATTERN
            .captures_iter(self.content)
            .map(|caps| {
                let whole = caps.get(0).expect("capture group 0 always present");
                FigureElement {
                    label: caps[1].to_string(),
                    image_path: caps[2].to_string(),
                    caption: caps[4].trim().to_string(),
                    attributes: parse_attributes(caps.get(3).map_or("", |m| m.as_str())),
                    span: self.span_of(&whole),
                    original: whole.as_str().to_string(),
                }
            })
            .collect()
    }

    pub fn parse_tables(&self) -> Vec<TableElement> {
        TABLE_PATTERN
            .captures_iter(self.content)
            .map(|caps| {
                let whole = caps.get(0).expect("capture group 0 always present");
                TableElement {
                    label: caps[1].to_string(),
                    caption: caps[2].trim().to_string(),
                    span: self.span_of(&whole),
                    original: whole.as_str().to_string(),
                }
            })
            .collect()
    }

    pub fn parse_cross_references(&self) -> Vec<CrossReference> {
        CROSS_REF_PATTERN
            .captures_iter(self.content)
            .map(|caps| {
                let whole = caps.get(0).expect("capture group 0 always present");
                CrossReference {
                    kind: RefKind::from_token(&caps[1]).expect("pattern only matches known kinds"),
                    label: caps[2].to_string(),
                    custom_text: caps.get(3).map(|m| m.as_str().to_string()),
                    span: self.span_of(&whole),
                    original: whole.as_str().to_string(),
                }
            })
            .collect()
    }

    pub fn parse_callouts(&self) -> Vec<CalloutElement> {
        CALLOUT_PATTERN
            .captures_iter(self.content)
            .map(|caps| {
                let whole = caps.get(0).expect("capture group 0 always present");
                CalloutElement {
                    kind: caps[1].to_string(),
                    body: caps[2].to_string(),
                    span: self.span_of(&whole),
                    original: whole.as_str().to_string(),
                }
            })
            .collect()
    }

    /// Labels already defined via standard markdown anchors. Only the
    /// validator consumes these; the transpiler leaves them untouched.
    pub fn parse_anchors(&self) -> Vec<AnchorLabel> {
        ANCHOR_PATTERN
            .captures_iter(self.content)
            .map(|caps| {
                let whole = caps.get(0).expect("capture group 0 always present");
                AnchorLabel {
                    kind: RefKind::from_token(&caps[1]).expect("pattern only matches known kinds"),
                    label: caps[2].to_string(),
                    span: self.span_of(&whole),
                }
            })
            .collect()
    }

    /// True iff any of the four construct patterns matches at least once.
    /// Gates the transpiler's byte-identical pass-through.
    pub fn has_enhanced_syntax(&self) -> bool {
        FIGURE_PATTERN.is_match(self.content)
            || TABLE_PATTERN.is_match(self.content)
            || CROSS_REF_PATTERN.is_match(self.content)
            || CALLOUT_PATTERN.is_match(self.content)
    }
}

/// Recognized attribute-name synonyms.
fn normalize_attr_key(key: &str) -> &str {
    match key {
        "w" => "width",
        "h" => "height",
        "short" => "short-caption",
        other => other,
    }
}

/// Parse an attribute block like `w=50% short="Short caption"`.
///
/// Quoted pairs are parsed first so a quoted value containing `=` or
/// whitespace stays intact; unquoted pairs are parsed second and skip any
/// key (after synonym normalization) the quoted pass already captured —
/// first occurrence wins. Unrecognized keys pass through verbatim.
pub fn parse_attributes(attr_str: &str) -> IndexMap<String, String> {
    let mut attributes = IndexMap::new();

    if attr_str.is_empty() {
        return attributes;
    }

    for caps in QUOTED_ATTR_PATTERN.captures_iter(attr_str) {
        let key = normalize_attr_key(&caps[1]).to_string();
        attributes.entry(key).or_insert_with(|| caps[2].to_string());
    }

    for caps in UNQUOTED_ATTR_PATTERN.captures_iter(attr_str) {
        let key = normalize_attr_key(&caps[1]).to_string();
        attributes.entry(key).or_insert_with(|| caps[2].to_string());
    }

    attributes
}
