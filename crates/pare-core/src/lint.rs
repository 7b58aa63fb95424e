//! Lint diagnostics for markup documents.
//!
//! Reports what `optimize` would remove, and references it cannot fix,
//! without modifying the document.

use crate::id::ElemId;
use crate::model::Document;
use crate::optimize::DRAWING_TAGS;
use crate::refs::{RefKind, collect_references, reference_tokens, subtree_ids};
use petgraph::graph::NodeIndex;
use serde::Serialize;

// ─── Diagnostic types ────────────────────────────────────────────────────

/// Severity of a lint finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LintSeverity {
    /// Likely a mistake.
    Warning,
    /// `optimize` will clean it up.
    Info,
}

/// A single lint diagnostic for an element.
#[derive(Debug, Clone, Serialize)]
pub struct LintDiagnostic {
    /// Identifier of the offending element, if it has one.
    pub node_id: Option<ElemId>,
    /// Tag of the offending element.
    pub tag: String,
    /// Human-readable message.
    pub message: String,
    /// Severity level.
    pub severity: LintSeverity,
    /// Short rule identifier (e.g. "dangling-reference", "empty-group").
    pub rule: &'static str,
}

impl LintDiagnostic {
    fn at(
        doc: &Document,
        idx: NodeIndex,
        severity: LintSeverity,
        rule: &'static str,
        message: String,
    ) -> Self {
        let el = doc.element(idx);
        Self {
            node_id: el.and_then(|el| el.id),
            tag: el.map(|el| el.tag.clone()).unwrap_or_default(),
            message,
            severity,
            rule,
        }
    }
}

// ─── Public API ───────────────────────────────────────────────────────────

/// Run all lint rules over the document and return diagnostics in
/// document order per rule.
#[must_use]
pub fn lint_document(doc: &Document) -> Vec<LintDiagnostic> {
    let mut diags = Vec::new();
    lint_dangling_references(doc, &mut diags);
    lint_unused_definitions(doc, &mut diags);
    lint_foreign_elements(doc, &mut diags);
    lint_empty_groups(doc, &mut diags);
    diags
}

// ─── Rules ────────────────────────────────────────────────────────────────

/// Warn on `url(#id)` or `href="#id"` naming no element.
fn lint_dangling_references(doc: &Document, diags: &mut Vec<LintDiagnostic>) {
    for idx in doc.descendants(doc.root) {
        let Some(el) = doc.element(idx) else {
            continue;
        };
        for attr in &el.attrs {
            let is_link = attr.name == "href" || attr.name == "xlink:href";
            for token in reference_tokens(&attr.value) {
                let checked = token.kind == RefKind::Url
                    || (is_link && attr.value.trim_start().starts_with('#'));
                if checked && !doc.is_id_taken(token.id) {
                    diags.push(LintDiagnostic::at(
                        doc,
                        idx,
                        LintSeverity::Warning,
                        "dangling-reference",
                        format!(
                            "`{}` on <{}> points at `#{}`, which does not exist.",
                            attr.name, el.tag, token.id
                        ),
                    ));
                }
            }
        }
    }
}

/// Info when a definition is referenced by nothing outside itself.
fn lint_unused_definitions(doc: &Document, diags: &mut Vec<LintDiagnostic>) {
    for defs in doc.descendants(doc.root) {
        if doc.element(defs).is_none_or(|el| el.tag != "defs") {
            continue;
        }
        for &child in doc.children(defs) {
            if doc.element(child).is_some_and(|el| el.tag == "style") {
                continue;
            }
            let ids = subtree_ids(doc, child);
            if ids.is_empty() {
                continue;
            }
            let referenced = collect_references(doc, |idx| idx == child);
            if ids.iter().any(|id| referenced.contains(id)) {
                continue;
            }
            diags.push(LintDiagnostic::at(
                doc,
                child,
                LintSeverity::Info,
                "unused-definition",
                format!("Definition `#{}` is never referenced.", ids[0]),
            ));
        }
    }
}

/// Info on elements outside the drawing vocabulary.
fn lint_foreign_elements(doc: &Document, diags: &mut Vec<LintDiagnostic>) {
    for idx in doc.descendants(doc.root) {
        if idx == doc.root {
            continue;
        }
        let Some(el) = doc.element(idx) else {
            continue;
        };
        if el.is_prefixed() || !DRAWING_TAGS.contains(&el.tag.as_str()) {
            diags.push(LintDiagnostic::at(
                doc,
                idx,
                LintSeverity::Info,
                "foreign-element",
                format!("<{}> is not drawing markup and will be stripped.", el.tag),
            ));
        }
    }
}

/// Info on groups with nothing to draw.
fn lint_empty_groups(doc: &Document, diags: &mut Vec<LintDiagnostic>) {
    for idx in doc.descendants(doc.root) {
        if idx == doc.root || doc.element(idx).is_none_or(|el| el.tag != "g") {
            continue;
        }
        let has_content = doc.children(idx).iter().any(|&c| {
            doc.node(c)
                .is_some_and(|n| n.is_element() || n.is_content_text())
        });
        if !has_content {
            diags.push(LintDiagnostic::at(
                doc,
                idx,
                LintSeverity::Info,
                "empty-group",
                "Group has no content and will be removed.".to_string(),
            ));
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;
    use pretty_assertions::assert_eq;

    fn rules(diags: &[LintDiagnostic]) -> Vec<&'static str> {
        diags.iter().map(|d| d.rule).collect()
    }

    #[test]
    fn lint_dangling_reference() {
        let doc = parse_document(
            r##"<svg><rect id="r" fill="url(#missing)" width="1"/><use href="#r"/><use href="#gone"/></svg>"##,
        )
        .unwrap();
        let diags = lint_document(&doc);
        assert_eq!(rules(&diags), vec!["dangling-reference", "dangling-reference"]);
        assert_eq!(diags[0].node_id, Some(ElemId::intern("r")));
        assert_eq!(diags[0].severity, LintSeverity::Warning);
        assert_eq!(diags[1].tag, "use");
        assert!(diags[1].message.contains("#gone"));
    }

    #[test]
    fn lint_hex_colors_are_not_references() {
        let doc = parse_document(r##"<svg><rect fill="#ff0000" width="1"/></svg>"##).unwrap();
        assert!(lint_document(&doc).is_empty());
    }

    #[test]
    fn lint_unused_definition() {
        let doc = parse_document(
            r##"<svg><defs><linearGradient id="a"/><linearGradient id="b" href="#b"/></defs>
<rect fill="url(#a)" width="1"/></svg>"##,
        )
        .unwrap();
        let diags = lint_document(&doc);
        assert_eq!(rules(&diags), vec!["unused-definition"]);
        assert_eq!(diags[0].node_id, Some(ElemId::intern("b")));
    }

    #[test]
    fn lint_style_sheet_is_never_unused() {
        let doc = parse_document(
            r##"<svg><defs><style id="sheet">.a { fill: red }</style></defs><rect class="a" width="1"/></svg>"##,
        )
        .unwrap();
        assert!(lint_document(&doc).is_empty());
    }

    #[test]
    fn lint_foreign_and_empty_group() {
        let doc = parse_document(
            "<svg><metadata><rdf:RDF/></metadata><g><!--only a comment--></g></svg>",
        )
        .unwrap();
        let diags = lint_document(&doc);
        assert_eq!(
            rules(&diags),
            vec!["foreign-element", "foreign-element", "empty-group"]
        );
        assert!(diags.iter().all(|d| d.severity == LintSeverity::Info));
    }

    #[test]
    fn lint_clean_document_no_diags() {
        let doc = parse_document(
            r##"<svg><defs><radialGradient id="glow"><stop offset="0"/></radialGradient></defs>
<g id="layer"><circle r="4" fill="url(#glow)"/></g></svg>"##,
        )
        .unwrap();
        assert!(lint_document(&doc).is_empty());
    }

    #[test]
    fn lint_diagnostics_serialize() {
        let doc = parse_document("<svg><g id=\"empty\"/></svg>").unwrap();
        let json = serde_json::to_string(&lint_document(&doc)).unwrap();
        assert_eq!(
            json,
            r#"[{"node_id":"empty","tag":"g","message":"Group has no content and will be removed.","severity":"info","rule":"empty-group"}]"#
        );
    }
}
