//! Transform passes that mutate the `Document` in place.
//!
//! Each pass has a single responsibility, returns how many things it
//! removed or rewrote, and is a no-op on its own output.
//! Passes are applied by `optimize` in `optimize.rs` based on `OptimizeConfig`.

use crate::id::ElemId;
use crate::model::*;
use crate::path_data::canonicalize_path_data;
use crate::refs::{collect_local, collect_references, subtree_ids};
use petgraph::graph::NodeIndex;
use std::collections::{HashMap, HashSet};

fn matches_any<S: AsRef<str>>(name: &str, list: &[S]) -> bool {
    list.iter().any(|s| s.as_ref() == name)
}

fn is_tag(doc: &Document, idx: NodeIndex, tag: &str) -> bool {
    doc.element(idx).is_some_and(|el| el.tag == tag)
}

/// Remove every node in `doomed` still present, returning how many of the
/// listed nodes went (descendants are not counted).
fn remove_all(doc: &mut Document, doomed: &[NodeIndex]) -> usize {
    doomed
        .iter()
        .filter(|&&idx| doc.remove_subtree(idx) > 0)
        .count()
}

// ─── Strip comments ───────────────────────────────────────────────────────

/// Remove every comment leaf.
pub fn strip_comments(doc: &mut Document) -> usize {
    let comments: Vec<_> = doc
        .descendants(doc.root)
        .into_iter()
        .filter(|&idx| matches!(doc.node(idx), Some(Node::Comment(_))))
        .collect();
    let removed = remove_all(doc, &comments);
    log::debug!("strip_comments: removed {removed}");
    removed
}

// ─── Strip foreign content ────────────────────────────────────────────────

/// Remove elements whose tag is outside `vocabulary`, with everything
/// inside them. Namespaced tags (`sodipodi:namedview`) are always foreign.
/// The root is exempt.
pub fn strip_foreign_elements<S: AsRef<str>>(doc: &mut Document, vocabulary: &[S]) -> usize {
    let foreign: Vec<_> = doc
        .descendants(doc.root)
        .into_iter()
        .filter(|&idx| idx != doc.root)
        .filter(|&idx| {
            doc.element(idx)
                .is_some_and(|el| el.is_prefixed() || !matches_any(&el.tag, vocabulary))
        })
        .collect();
    for &idx in &foreign {
        if let Some(el) = doc.element(idx) {
            log::trace!("strip_foreign_elements: <{}>", el.tag);
        }
    }
    let removed = remove_all(doc, &foreign);
    log::debug!("strip_foreign_elements: removed {removed}");
    removed
}

// ─── Strip decorative attributes ──────────────────────────────────────────

/// Attribute names that carry authoring metadata only.
#[derive(Debug, Clone, Default)]
pub struct DenyList {
    /// Exact attribute names.
    pub names: Vec<String>,
    /// Name prefixes, including the colon for namespaced ones (`inkscape:`).
    pub prefixes: Vec<String>,
}

impl DenyList {
    /// True for a denied name, or for an `xmlns:p` binding of a denied `p:`.
    pub fn denies(&self, name: &str) -> bool {
        if let Some(bound) = name.strip_prefix("xmlns:") {
            return self.denies_prefix_of(&format!("{bound}:"));
        }
        matches_any(name, &self.names) || self.denies_prefix_of(name)
    }

    fn denies_prefix_of(&self, name: &str) -> bool {
        self.prefixes.iter().any(|p| name.starts_with(p.as_str()))
    }
}

/// Remove denied attributes and blank `style` attributes, and drop root
/// namespace bindings whose prefix is denied.
pub fn strip_decorative_attributes(doc: &mut Document, deny: &DenyList) -> usize {
    let mut removed = 0;
    for idx in doc.descendants(doc.root) {
        let Some(el) = doc.element_mut(idx) else {
            continue;
        };
        let before = el.attrs.len();
        el.attrs.retain(|attr| {
            let blank_style = attr.name == "style" && attr.value.trim().is_empty();
            !(blank_style || deny.denies(&attr.name))
        });
        removed += before - el.attrs.len();
    }

    let before = doc.namespaces.len();
    doc.namespaces.retain(|ns| match &ns.prefix {
        Some(prefix) => !deny.denies(&format!("xmlns:{prefix}")),
        None => true,
    });
    removed += before - doc.namespaces.len();

    log::debug!("strip_decorative_attributes: removed {removed}");
    removed
}

// ─── Prune dead containers ────────────────────────────────────────────────

fn has_content_child(doc: &Document, idx: NodeIndex) -> bool {
    doc.children(idx).iter().any(|&c| {
        doc.node(c)
            .is_some_and(|n| n.is_element() || n.is_content_text())
    })
}

/// Remove every group with no element child and no non-blank text.
///
/// Children are visited before parents, so a group emptied by this pass
/// is itself removed in the same sweep.
pub fn prune_empty_groups(doc: &mut Document) -> usize {
    let mut removed = 0;
    for idx in doc.post_order(doc.root) {
        if idx == doc.root || !is_tag(doc, idx, "g") {
            continue;
        }
        if !has_content_child(doc, idx) {
            log::trace!("prune_empty_groups: {:?}", doc.element(idx).and_then(|el| el.id));
            doc.remove_subtree(idx);
            removed += 1;
        }
    }
    log::debug!("prune_empty_groups: removed {removed}");
    removed
}

// ─── Prune dead leaves ────────────────────────────────────────────────────

/// Remove every non-root element that has no content child and none of the
/// `geometry` attributes.
///
/// Elements whose identifier is referenced are spared so no reference is
/// left dangling, as is anything inside an `exempt_within` container (filter
/// primitives carry no geometry but still render). Post-order, like
/// `prune_empty_groups`.
pub fn prune_dead_leaves<S: AsRef<str>>(
    doc: &mut Document,
    geometry: &[S],
    exempt_within: &[S],
) -> usize {
    let referenced = collect_references(doc, |_| false);

    let mut exempt = HashSet::new();
    for idx in doc.descendants(doc.root) {
        if doc
            .element(idx)
            .is_some_and(|el| matches_any(&el.tag, exempt_within))
        {
            exempt.extend(doc.descendants(idx).into_iter().skip(1));
        }
    }

    let mut removed = 0;
    for idx in doc.post_order(doc.root) {
        if idx == doc.root || exempt.contains(&idx) {
            continue;
        }
        let Some(el) = doc.element(idx) else {
            continue;
        };
        let significant = el.attrs.iter().any(|a| matches_any(&a.name, geometry));
        let is_referenced = el.id.is_some_and(|id| referenced.contains(&id));
        if significant || is_referenced || has_content_child(doc, idx) {
            continue;
        }
        log::trace!("prune_dead_leaves: <{}>", el.tag);
        doc.remove_subtree(idx);
        removed += 1;
    }
    log::debug!("prune_dead_leaves: removed {removed}");
    removed
}

// ─── Prune unused definitions ─────────────────────────────────────────────

/// Within every `defs`, remove children none of whose identifiers is
/// referenced, then remove any `defs` left empty.
///
/// Liveness starts from references made outside `defs` and spreads through
/// references made by live definitions, so a gradient that only another
/// live gradient points at survives. A `style` sheet applies by selector
/// rather than by reference and always stays, with or without an id.
pub fn prune_unused_defs(doc: &mut Document) -> usize {
    let all = doc.descendants(doc.root);
    let defs: Vec<NodeIndex> = all
        .iter()
        .copied()
        .filter(|&idx| is_tag(doc, idx, "defs"))
        .collect();
    if defs.is_empty() {
        return 0;
    }

    let mut live: HashSet<ElemId> = collect_references(doc, |idx| is_tag(doc, idx, "defs"));

    // Each candidate is a defs child with the identifiers declared inside it.
    let mut pending: Vec<(NodeIndex, Vec<ElemId>)> = Vec::new();
    for &d in &defs {
        for &child in doc.children(d) {
            if is_tag(doc, child, "style") {
                for n in doc.descendants(child) {
                    collect_local(doc, n, &mut live);
                }
                continue;
            }
            pending.push((child, subtree_ids(doc, child)));
        }
    }

    loop {
        let (now_live, rest): (Vec<_>, Vec<_>) = pending
            .into_iter()
            .partition(|(_, ids)| ids.iter().any(|id| live.contains(id)));
        pending = rest;
        if now_live.is_empty() {
            break;
        }
        for (child, _) in now_live {
            for n in doc.descendants(child) {
                collect_local(doc, n, &mut live);
            }
        }
    }

    let dead: Vec<NodeIndex> = pending.into_iter().map(|(idx, _)| idx).collect();
    let mut removed = remove_all(doc, &dead);

    // Innermost first, so a defs emptied by removing a nested defs goes too.
    for &d in defs.iter().rev() {
        if doc.node(d).is_some() && doc.children(d).is_empty() {
            doc.remove_subtree(d);
            removed += 1;
        }
    }
    log::debug!("prune_unused_defs: removed {removed}");
    removed
}

// ─── Canonicalize path data ───────────────────────────────────────────────

/// Rewrite `attributes` (normally `d` and `points`) into canonical form.
pub fn canonicalize_paths<S: AsRef<str>>(doc: &mut Document, attributes: &[S]) -> usize {
    let mut changed = 0;
    for idx in doc.descendants(doc.root) {
        let Some(el) = doc.element_mut(idx) else {
            continue;
        };
        for attr in el.attrs.iter_mut() {
            if !matches_any(&attr.name, attributes) {
                continue;
            }
            let canonical = canonicalize_path_data(&attr.value);
            if canonical != attr.value {
                log::trace!("canonicalize_paths: {:?} -> {canonical:?}", attr.value);
                attr.value = canonical;
                changed += 1;
            }
        }
    }
    log::debug!("canonicalize_paths: rewrote {changed}");
    changed
}

// ─── Assign missing identifiers ───────────────────────────────────────────

/// Give every non-root element without an identifier `<tag>_<n>`, in
/// document order, skipping identifiers already taken.
pub fn assign_missing_ids(doc: &mut Document) -> usize {
    let mut next: HashMap<String, usize> = HashMap::new();
    let mut assigned = 0;
    for idx in doc.descendants(doc.root) {
        if idx == doc.root {
            continue;
        }
        let Some(el) = doc.element(idx) else {
            continue;
        };
        if el.id.is_some() {
            continue;
        }
        let prefix = el.local_name().to_string();
        let counter = next.entry(prefix.clone()).or_insert(1);
        let id = loop {
            let candidate = format!("{prefix}_{counter}");
            *counter += 1;
            if !doc.is_id_taken(&candidate) {
                break ElemId::intern(&candidate);
            }
        };
        // The candidate was checked free, so this cannot collide.
        if doc.set_id(idx, Some(id)).is_ok() {
            assigned += 1;
        }
    }
    log::debug!("assign_missing_ids: assigned {assigned}");
    assigned
}
