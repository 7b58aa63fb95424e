//! Document optimization pipeline: validate → passes → (emit).
//!
//! Runs the transform passes in their required order. The three pruning
//! passes repeat as a stage until a round removes nothing, because pruning
//! definitions can leave a group empty and pruning a leaf can leave a
//! definition unreferenced. Every round removes at least one node, so the
//! stage terminates.

use crate::emitter::emit_document;
use crate::error::DocError;
use crate::model::Document;
use crate::parser::parse_document;
use crate::transform::*;

// ─── Config ───────────────────────────────────────────────────────────────

/// Tags of the drawing vocabulary. Everything else is foreign content.
pub const DRAWING_TAGS: &[&str] = &[
    "svg", "g", "defs", "symbol", "use", "switch", "a",
    "path", "rect", "circle", "ellipse", "line", "polyline", "polygon", "image",
    "text", "tspan", "textPath", "title", "desc", "style",
    "linearGradient", "radialGradient", "stop", "pattern", "clipPath", "mask", "marker",
    "filter", "feBlend", "feColorMatrix", "feComponentTransfer", "feComposite",
    "feConvolveMatrix", "feDiffuseLighting", "feDisplacementMap", "feDistantLight",
    "feDropShadow", "feFlood", "feFuncA", "feFuncB", "feFuncG", "feFuncR",
    "feGaussianBlur", "feImage", "feMerge", "feMergeNode", "feMorphology", "feOffset",
    "fePointLight", "feSpecularLighting", "feSpotLight", "feTile", "feTurbulence",
];

/// Attributes that make an otherwise empty element render or resolve.
pub const GEOMETRY_ATTRIBUTES: &[&str] = &[
    "x", "y", "width", "height", "r", "rx", "ry", "cx", "cy", "fx", "fy", "dx", "dy",
    "d", "x1", "y1", "x2", "y2", "points", "offset", "href", "xlink:href",
];

/// Authoring-tool namespaces whose attributes and bindings are dropped.
pub const DECORATIVE_PREFIXES: &[&str] = &["inkscape:", "sodipodi:", "sketch:", "serif:", "figma:"];

pub const DECORATIVE_NAMES: &[&str] = &["data-name"];

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_string()).collect()
}

/// Configuration for `optimize`.
///
/// Every pass is enabled by default. Disabling a pass skips it without
/// changing the order of the others.
#[derive(Debug, Clone)]
pub struct OptimizeConfig {
    pub strip_comments: bool,
    pub strip_foreign: bool,
    pub strip_decorative: bool,
    pub prune_empty_groups: bool,
    pub prune_dead_leaves: bool,
    pub prune_unused_defs: bool,
    pub canonicalize_paths: bool,
    pub assign_ids: bool,

    /// Tags that survive `strip_foreign`. Default: [`DRAWING_TAGS`].
    pub vocabulary: Vec<String>,
    /// Attributes removed by `strip_decorative`.
    pub deny: DenyList,
    /// Attributes that keep a childless element alive.
    pub geometry_attributes: Vec<String>,
    /// Containers whose descendants are never treated as dead leaves.
    /// Default: `filter`.
    pub leaf_exempt_within: Vec<String>,
    /// Attributes rewritten by `canonicalize_paths`. Default: `d`, `points`.
    pub path_attributes: Vec<String>,
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        Self {
            strip_comments: true,
            strip_foreign: true,
            strip_decorative: true,
            prune_empty_groups: true,
            prune_dead_leaves: true,
            prune_unused_defs: true,
            canonicalize_paths: true,
            assign_ids: true,
            vocabulary: owned(DRAWING_TAGS),
            deny: DenyList {
                names: owned(DECORATIVE_NAMES),
                prefixes: owned(DECORATIVE_PREFIXES),
            },
            geometry_attributes: owned(GEOMETRY_ATTRIBUTES),
            leaf_exempt_within: owned(&["filter"]),
            path_attributes: owned(&["d", "points"]),
        }
    }
}

// ─── Pipeline ─────────────────────────────────────────────────────────────

/// Reduce a document to its smallest equivalent form.
///
/// Idempotent: `optimize(optimize(d, c), c) == optimize(d, c)`.
///
/// # Errors
/// `MalformedDocument` if the input breaks identifier uniqueness or tree
/// shape. Validation runs before any pass, so no change is made on failure.
pub fn optimize(mut doc: Document, config: &OptimizeConfig) -> Result<Document, DocError> {
    doc.validate()?;
    let before = doc.node_count();

    if config.strip_comments {
        strip_comments(&mut doc);
    }
    if config.strip_foreign {
        strip_foreign_elements(&mut doc, &config.vocabulary);
    }
    if config.strip_decorative {
        strip_decorative_attributes(&mut doc, &config.deny);
    }

    let mut rounds = 0;
    loop {
        rounds += 1;
        let mut removed = 0;
        if config.prune_empty_groups {
            removed += prune_empty_groups(&mut doc);
        }
        if config.prune_dead_leaves {
            removed += prune_dead_leaves(
                &mut doc,
                &config.geometry_attributes,
                &config.leaf_exempt_within,
            );
        }
        if config.prune_unused_defs {
            removed += prune_unused_defs(&mut doc);
        }
        if removed == 0 {
            break;
        }
    }
    log::debug!("pruning settled after {rounds} round(s)");

    if config.canonicalize_paths {
        canonicalize_paths(&mut doc, &config.path_attributes);
    }
    if config.assign_ids {
        assign_missing_ids(&mut doc);
    }

    log::debug!("optimize: {before} -> {} nodes", doc.node_count());
    Ok(doc)
}

/// Parse markup text, optimize it and re-emit it.
///
/// # Errors
/// `MalformedDocument` if the text does not parse or the tree is malformed.
pub fn optimize_text(text: &str, config: &OptimizeConfig) -> Result<String, DocError> {
    let doc = parse_document(text)?;
    let doc = optimize(doc, config)?;
    Ok(emit_document(&doc))
}

// ─── Tests ────────────────────────────────────────────────────────────────
