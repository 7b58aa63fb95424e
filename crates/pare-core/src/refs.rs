//! Reference scanning: which identifiers does a document point at?
//!
//! A reference token is `url(#id)` (the id optionally quoted) or a bare
//! `#id`. Tokens are collected from attribute values and from the text of
//! `<style>` sheets by walking the tree, never by searching serialized
//! output, so an id that merely appears in prose is not a reference.

use crate::id::ElemId;
use crate::model::*;
use petgraph::graph::NodeIndex;
use std::collections::HashSet;

/// How a reference token was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    /// `url(#id)` paint or clip reference.
    Url,
    /// A bare `#id` fragment, as in `href="#id"`.
    Fragment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefToken<'a> {
    pub id: &'a str,
    pub kind: RefKind,
}

fn ends_token(c: char) -> bool {
    c.is_whitespace() || matches!(c, ')' | '"' | '\'' | ',' | ';' | '{' | '}')
}

/// Every reference token in a single string, in order of appearance.
pub fn reference_tokens(value: &str) -> Vec<RefToken<'_>> {
    let mut tokens = Vec::new();
    let mut cursor = 0;
    while let Some(off) = value[cursor..].find('#') {
        let hash = cursor + off;
        let start = hash + 1;
        let end = value[start..]
            .find(ends_token)
            .map_or(value.len(), |e| start + e);
        if end > start {
            let before = value[..hash].trim_end_matches(['"', '\'', ' ']);
            let kind = if before.ends_with("url(") {
                RefKind::Url
            } else {
                RefKind::Fragment
            };
            tokens.push(RefToken {
                id: &value[start..end],
                kind,
            });
        }
        cursor = end;
    }
    tokens
}

/// Add the identifiers referenced by one string to `out`.
///
/// Tokens that were never interned cannot name an element and are skipped,
/// so hex colors such as `#ff0000` cost nothing.
pub fn scan_references(value: &str, out: &mut HashSet<ElemId>) {
    for token in reference_tokens(value) {
        if let Some(id) = ElemId::get(token.id) {
            out.insert(id);
        }
    }
}

/// References made anywhere in the document, except inside subtrees whose
/// top node `skip` accepts. Skipped subtrees are not descended into.
pub fn collect_references(
    doc: &Document,
    skip: impl Fn(NodeIndex) -> bool,
) -> HashSet<ElemId> {
    let mut refs = HashSet::new();
    let mut stack = vec![doc.root];
    while let Some(idx) = stack.pop() {
        if skip(idx) {
            continue;
        }
        collect_local(doc, idx, &mut refs);
        stack.extend(doc.children(idx).iter().copied());
    }
    refs
}

/// References made by a single node, children excluded: attribute values
/// of an element, or the content of a text leaf inside `<style>`.
pub fn collect_local(doc: &Document, idx: NodeIndex, out: &mut HashSet<ElemId>) {
    match doc.node(idx) {
        Some(Node::Element(el)) => {
            for attr in &el.attrs {
                scan_references(&attr.value, out);
            }
        }
        Some(Node::Text(text)) if in_style_sheet(doc, idx) => scan_references(text, out),
        _ => {}
    }
}

/// True for a text leaf whose parent is a `<style>` element.
pub fn in_style_sheet(doc: &Document, idx: NodeIndex) -> bool {
    doc.parent(idx)
        .and_then(|p| doc.element(p))
        .is_some_and(|el| el.local_name() == "style")
}

/// Identifiers declared anywhere inside the subtree at `idx`.
pub fn subtree_ids(doc: &Document, idx: NodeIndex) -> Vec<ElemId> {
    doc.descendants(idx)
        .into_iter()
        .filter_map(|n| doc.element(n).and_then(|el| el.id))
        .collect()
}
