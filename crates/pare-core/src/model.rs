//! Core element-tree data model for markup documents.
//!
//! The document is a tree stored in a `StableDiGraph`: nodes are elements,
//! text leaves, or comment leaves; edges go parent → child. The parent link
//! is the single incoming edge and is only used for traversal. Child order is
//! kept explicitly per parent in `child_order`, since `petgraph` adjacency
//! order is not document order.
//!
//! Identifiers live outside the attribute list (`Element::id`) and are indexed
//! in `id_index` so lookups are O(1). All edits go through `Document` methods
//! that keep the index, the edges and the child order in step.

use crate::error::DocError;
use crate::id::ElemId;
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// The SVG namespace URI bound on a freshly created root.
pub const SVG_NS: &str = "http://www.w3.org/2000/svg";

// ─── Numbers ─────────────────────────────────────────────────────────────

/// Format a coordinate with at most three fractional digits and no
/// trailing zeros (`10`, `10.5`, `0.125`).
pub fn format_num(n: f64) -> String {
    if n == n.trunc() && n.abs() < 1e15 {
        return format!("{}", n as i64);
    }
    let s = format!("{n:.3}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

// ─── Attributes ──────────────────────────────────────────────────────────

/// A single `name="value"` pair on an element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attr {
    pub name: String,
    pub value: String,
}

impl Attr {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

// ─── Elements & leaves ───────────────────────────────────────────────────

/// A tagged element. The `id` attribute is held in `id`, never in `attrs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    pub tag: String,
    pub id: Option<ElemId>,
    /// Attributes in insertion order. Names are unique.
    pub attrs: SmallVec<[Attr; 4]>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            id: None,
            attrs: SmallVec::new(),
        }
    }

    /// Builder form of `set_attr`.
    #[must_use]
    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder form for the identifier.
    #[must_use]
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(ElemId::intern(id));
        self
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|a| a.name == name)
    }

    /// Set an attribute, replacing an existing value in place so the
    /// attribute keeps its output position.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(attr) = self.attrs.iter_mut().find(|a| a.name == name) {
            attr.value = value;
        } else {
            self.attrs.push(Attr::new(name, value));
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attrs.iter().position(|a| a.name == name)?;
        Some(self.attrs.remove(pos).value)
    }

    /// Tag without its namespace prefix (`svg:rect` → `rect`).
    pub fn local_name(&self) -> &str {
        self.tag.rsplit(':').next().unwrap_or(&self.tag)
    }

    /// True when the tag carries a namespace prefix.
    pub fn is_prefixed(&self) -> bool {
        self.tag.contains(':')
    }
}

/// Attributes compare as a set; order is an output detail only.
impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag
            && self.id == other.id
            && self.attrs.len() == other.attrs.len()
            && self
                .attrs
                .iter()
                .all(|a| other.get_attr(&a.name) == Some(a.value.as_str()))
    }
}

/// One node of the tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self, Node::Element(_))
    }

    /// True for a text leaf with non-whitespace content.
    pub fn is_content_text(&self) -> bool {
        matches!(self, Node::Text(t) if !t.trim().is_empty())
    }
}

/// Collapse whitespace runs and trim, for whitespace-insensitive comparison.
fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Node::Element(a), Node::Element(b)) => a == b,
            (Node::Text(a), Node::Text(b)) => normalize_ws(a) == normalize_ws(b),
            (Node::Comment(a), Node::Comment(b)) => a.trim() == b.trim(),
            _ => false,
        }
    }
}

impl From<Element> for Node {
    fn from(e: Element) -> Self {
        Node::Element(e)
    }
}

// ─── Canvas & namespaces ─────────────────────────────────────────────────

/// The `viewBox` rectangle of the root.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewBox {
    /// Parse `min-x min-y width height`, separated by whitespace and/or commas.
    pub fn parse(s: &str) -> Option<Self> {
        let nums: Vec<f64> = s
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
            .map(|t| t.parse::<f64>())
            .collect::<Result<_, _>>()
            .ok()?;
        match nums.as_slice() {
            &[x, y, width, height] => Some(Self {
                x,
                y,
                width,
                height,
            }),
            _ => None,
        }
    }
}

impl fmt::Display for ViewBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Shortest round-trip form, so re-parsing is lossless.
        write!(f, "{} {} {} {}", self.x, self.y, self.width, self.height)
    }
}

/// Nominal canvas dimensions declared on the root.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    /// Raw `width` value (may carry a unit, e.g. `210mm`).
    pub width: Option<String>,
    /// Raw `height` value.
    pub height: Option<String>,
    pub view_box: Option<ViewBox>,
}

impl Canvas {
    /// Numeric size in user units: plain numbers (or `px`) from
    /// `width`/`height`, else the view box size.
    pub fn size(&self) -> Option<(f64, f64)> {
        let plain = |v: &Option<String>| {
            v.as_deref()
                .map(|s| s.trim().trim_end_matches("px"))
                .and_then(|s| s.parse::<f64>().ok())
        };
        match (plain(&self.width), plain(&self.height)) {
            (Some(w), Some(h)) => Some((w, h)),
            _ => self.view_box.map(|vb| (vb.width, vb.height)),
        }
    }
}

/// An `xmlns` / `xmlns:prefix` binding on the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Namespace {
    /// `None` for the default namespace.
    pub prefix: Option<String>,
    pub uri: String,
}

// ─── Fragments ───────────────────────────────────────────────────────────

/// A detached subtree: the unit of cloning, removal and insertion.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub node: Node,
    pub children: Vec<Fragment>,
}

// Dropping and comparing walk the fragment with explicit stacks, so a deep
// subtree cannot exhaust the call stack.
impl Drop for Fragment {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(mut frag) = stack.pop() {
            stack.append(&mut frag.children);
        }
    }
}

impl PartialEq for Fragment {
    fn eq(&self, other: &Self) -> bool {
        let mut stack = vec![(self, other)];
        while let Some((a, b)) = stack.pop() {
            if a.node != b.node || a.children.len() != b.children.len() {
                return false;
            }
            stack.extend(a.children.iter().zip(&b.children));
        }
        true
    }
}

impl Fragment {
    pub fn new(node: Node) -> Self {
        Self {
            node,
            children: Vec::new(),
        }
    }

    pub fn element(element: Element) -> Self {
        Self::new(Node::Element(element))
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(Node::Text(text.into()))
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Self::new(Node::Comment(text.into()))
    }

    #[must_use]
    pub fn with_child(mut self, child: Fragment) -> Self {
        self.children.push(child);
        self
    }

    /// Split into the top node and its children.
    pub fn into_parts(mut self) -> (Node, Vec<Fragment>) {
        let children = std::mem::take(&mut self.children);
        let node = std::mem::replace(&mut self.node, Node::Text(String::new()));
        (node, children)
    }

    /// All identifiers declared in this fragment, in pre-order.
    pub fn ids(&self) -> Vec<ElemId> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(frag) = stack.pop() {
            if let Some(id) = frag.node.as_element().and_then(|e| e.id) {
                out.push(id);
            }
            stack.extend(frag.children.iter().rev());
        }
        out
    }

    /// Drop every identifier in the fragment, e.g. before pasting a copy
    /// into the document it was cloned from.
    pub fn strip_ids(&mut self) {
        let mut stack = vec![self];
        while let Some(frag) = stack.pop() {
            if let Some(el) = frag.node.as_element_mut() {
                el.id = None;
            }
            stack.extend(frag.children.iter_mut());
        }
    }
}

// ─── Document ────────────────────────────────────────────────────────────

/// A complete markup document: a tree of `Node` values under a root element.
#[derive(Debug, Clone)]
pub struct Document {
    /// The underlying graph (edges parent → child).
    pub graph: StableDiGraph<Node, ()>,

    /// The root element's index.
    pub root: NodeIndex,

    /// Index from identifier → element.
    pub id_index: HashMap<ElemId, NodeIndex>,

    /// Document-order children of each parent.
    pub child_order: HashMap<NodeIndex, Vec<NodeIndex>>,

    /// Namespace bindings declared on the root.
    pub namespaces: Vec<Namespace>,

    /// Nominal canvas declared on the root.
    pub canvas: Canvas,
}

impl Document {
    /// Create a fresh drawing: an `svg` root bound to the SVG namespace with
    /// the given size and a matching view box.
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        let mut doc = Self::with_root(Element::new("svg"));
        doc.namespaces.push(Namespace {
            prefix: None,
            uri: SVG_NS.to_string(),
        });
        doc.canvas = Canvas {
            width: Some(format_num(width)),
            height: Some(format_num(height)),
            view_box: Some(ViewBox {
                x: 0.0,
                y: 0.0,
                width,
                height,
            }),
        };
        doc
    }

    /// Create a document holding only `root`, with no namespaces or canvas.
    #[must_use]
    pub fn with_root(root: Element) -> Self {
        let mut graph = StableDiGraph::new();
        let id = root.id;
        let root_idx = graph.add_node(Node::Element(root));
        let mut id_index = HashMap::new();
        if let Some(id) = id {
            id_index.insert(id, root_idx);
        }
        Self {
            graph,
            root: root_idx,
            id_index,
            child_order: HashMap::new(),
            namespaces: Vec::new(),
            canvas: Canvas::default(),
        }
    }

    // ─── Access ──────────────────────────────────────────────────────────

    pub fn node(&self, idx: NodeIndex) -> Option<&Node> {
        self.graph.node_weight(idx)
    }

    pub fn element(&self, idx: NodeIndex) -> Option<&Element> {
        self.node(idx).and_then(Node::as_element)
    }

    /// Mutable access to an element. Change identifiers through `set_id`,
    /// not through this reference, or the id index goes stale.
    pub fn element_mut(&mut self, idx: NodeIndex) -> Option<&mut Element> {
        self.graph.node_weight_mut(idx).and_then(Node::as_element_mut)
    }

    pub fn root_element(&self) -> Option<&Element> {
        self.element(self.root)
    }

    /// Parent of a node; `None` for the root.
    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph.neighbors_directed(idx, Direction::Incoming).next()
    }

    /// Children in document order.
    pub fn children(&self, idx: NodeIndex) -> &[NodeIndex] {
        self.child_order.get(&idx).map_or(&[], Vec::as_slice)
    }

    /// Number of nodes in the tree, leaves included.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// `idx` and all of its descendants, pre-order.
    pub fn descendants(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        let mut stack = vec![idx];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        out
    }

    /// `idx` and all of its descendants, children before parents.
    pub fn post_order(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut out = self.descendants(idx);
        // Reversed pre-order visits every child before its parent.
        out.reverse();
        out
    }

    // ─── Attributes ──────────────────────────────────────────────────────

    pub fn attr(&self, idx: NodeIndex, name: &str) -> Option<&str> {
        let el = self.element(idx)?;
        if name == "id" {
            return el.id.as_ref().map(ElemId::as_str);
        }
        el.get_attr(name)
    }

    /// Set an attribute. `id` is routed to `set_id`.
    pub fn set_attr(&mut self, idx: NodeIndex, name: &str, value: &str) -> Result<(), DocError> {
        if name == "id" {
            return self.set_id(idx, Some(ElemId::intern(value)));
        }
        self.element_mut(idx)
            .ok_or(DocError::NotAnElement)?
            .set_attr(name, value);
        Ok(())
    }

    /// Remove an attribute, returning its previous value.
    pub fn remove_attr(&mut self, idx: NodeIndex, name: &str) -> Result<Option<String>, DocError> {
        if name == "id" {
            let prev = self.element(idx).ok_or(DocError::NotAnElement)?.id;
            self.set_id(idx, None)?;
            return Ok(prev.map(|id| id.as_str().to_string()));
        }
        Ok(self
            .element_mut(idx)
            .ok_or(DocError::NotAnElement)?
            .remove_attr(name))
    }

    // ─── Identifiers ─────────────────────────────────────────────────────

    /// Give an element a new identifier (or none).
    pub fn set_id(&mut self, idx: NodeIndex, id: Option<ElemId>) -> Result<(), DocError> {
        let current = self.element(idx).ok_or(DocError::NotAnElement)?.id;
        if current == id {
            return Ok(());
        }
        if let Some(new_id) = id {
            if self.id_index.contains_key(&new_id) {
                return Err(DocError::DuplicateId(new_id.as_str().to_string()));
            }
        }
        if let Some(old) = current {
            self.id_index.remove(&old);
        }
        if let Some(new_id) = id {
            self.id_index.insert(new_id, idx);
        }
        if let Some(el) = self.element_mut(idx) {
            el.id = id;
        }
        Ok(())
    }

    /// Look up an element by identifier.
    pub fn find_by_id(&self, id: &str) -> Result<NodeIndex, DocError> {
        ElemId::get(id)
            .and_then(|id| self.id_index.get(&id).copied())
            .ok_or_else(|| DocError::NotFound(id.to_string()))
    }

    pub fn is_id_taken(&self, id: &str) -> bool {
        ElemId::get(id).is_some_and(|id| self.id_index.contains_key(&id))
    }

    /// First `{prefix}_{n}` (n ≥ 1) not used by any element.
    pub fn fresh_id(&self, prefix: &str) -> ElemId {
        let mut n = 1u64;
        loop {
            let candidate = format!("{prefix}_{n}");
            if !self.is_id_taken(&candidate) {
                return ElemId::intern(&candidate);
            }
            n += 1;
        }
    }

    // ─── Children ────────────────────────────────────────────────────────

    fn check_container(&self, parent: NodeIndex) -> Result<usize, DocError> {
        if self.element(parent).is_none() {
            return Err(DocError::NotAnElement);
        }
        Ok(self.children(parent).len())
    }

    /// Link a single new node at `pos` (no checks).
    fn link(&mut self, parent: NodeIndex, pos: usize, node: Node) -> NodeIndex {
        let id = node.as_element().and_then(|e| e.id);
        let idx = self.graph.add_node(node);
        self.graph.add_edge(parent, idx, ());
        self.child_order.entry(parent).or_default().insert(pos, idx);
        if let Some(id) = id {
            self.id_index.insert(id, idx);
        }
        idx
    }

    /// Append a node as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeIndex, node: impl Into<Node>) -> Result<NodeIndex, DocError> {
        let len = self.check_container(parent)?;
        self.insert_child(parent, len, node)
    }

    /// Insert a node at child position `pos` (`0..=len`).
    pub fn insert_child(
        &mut self,
        parent: NodeIndex,
        pos: usize,
        node: impl Into<Node>,
    ) -> Result<NodeIndex, DocError> {
        let len = self.check_container(parent)?;
        if pos > len {
            return Err(DocError::NoSuchChild { pos, len });
        }
        let node = node.into();
        if let Some(id) = node.as_element().and_then(|e| e.id) {
            if self.id_index.contains_key(&id) {
                return Err(DocError::DuplicateId(id.as_str().to_string()));
            }
        }
        Ok(self.link(parent, pos, node))
    }

    /// Remove the child at `pos` together with its subtree.
    pub fn remove_child(&mut self, parent: NodeIndex, pos: usize) -> Result<Fragment, DocError> {
        let len = self.check_container(parent)?;
        let child = *self
            .children(parent)
            .get(pos)
            .ok_or(DocError::NoSuchChild { pos, len })?;
        let fragment = self.clone_subtree(child).ok_or(DocError::NoSuchChild { pos, len })?;
        self.remove_subtree(child);
        Ok(fragment)
    }

    /// Replace the child at `pos`, returning the old subtree.
    /// On error the document is left untouched.
    pub fn replace_child(
        &mut self,
        parent: NodeIndex,
        pos: usize,
        node: impl Into<Node>,
    ) -> Result<(NodeIndex, Fragment), DocError> {
        let len = self.check_container(parent)?;
        let old = *self
            .children(parent)
            .get(pos)
            .ok_or(DocError::NoSuchChild { pos, len })?;
        let node = node.into();
        if let Some(id) = node.as_element().and_then(|e| e.id) {
            if let Some(&holder) = self.id_index.get(&id) {
                if !self.descendants(old).contains(&holder) {
                    return Err(DocError::DuplicateId(id.as_str().to_string()));
                }
            }
        }
        let fragment = self.clone_subtree(old).ok_or(DocError::NoSuchChild { pos, len })?;
        self.remove_subtree(old);
        let idx = self.link(parent, pos, node);
        Ok((idx, fragment))
    }

    /// Detach and drop `idx` with all of its descendants.
    /// Returns the number of nodes removed; the root is never removed.
    pub fn remove_subtree(&mut self, idx: NodeIndex) -> usize {
        if idx == self.root || self.node(idx).is_none() {
            return 0;
        }
        if let Some(parent) = self.parent(idx) {
            if let Some(order) = self.child_order.get_mut(&parent) {
                order.retain(|&c| c != idx);
            }
        }
        let doomed = self.descendants(idx);
        for &n in &doomed {
            self.child_order.remove(&n);
            if let Some(Node::Element(el)) = self.graph.remove_node(n) {
                if let Some(id) = el.id {
                    self.id_index.remove(&id);
                }
            }
        }
        doomed.len()
    }

    /// Deep copy of a subtree as a detached `Fragment`. Identifiers are
    /// copied verbatim; the caller decides whether to keep them.
    pub fn clone_subtree(&self, idx: NodeIndex) -> Option<Fragment> {
        self.node(idx)?;
        // Children are built before parents, then moved into them.
        let mut built: HashMap<NodeIndex, Fragment> = HashMap::new();
        for n in self.post_order(idx) {
            let Some(node) = self.node(n) else {
                continue;
            };
            let children = self
                .children(n)
                .iter()
                .filter_map(|c| built.remove(c))
                .collect();
            built.insert(
                n,
                Fragment {
                    node: node.clone(),
                    children,
                },
            );
        }
        built.remove(&idx)
    }

    /// Insert a fragment at child position `pos`. Fails without touching
    /// the document if any of its identifiers collide.
    pub fn insert_fragment(
        &mut self,
        parent: NodeIndex,
        pos: usize,
        fragment: Fragment,
    ) -> Result<NodeIndex, DocError> {
        let len = self.check_container(parent)?;
        if pos > len {
            return Err(DocError::NoSuchChild { pos, len });
        }
        let mut seen = HashSet::new();
        for id in fragment.ids() {
            if self.id_index.contains_key(&id) || !seen.insert(id) {
                return Err(DocError::DuplicateId(id.as_str().to_string()));
            }
        }

        let (node, children) = fragment.into_parts();
        let top = self.link(parent, pos, node);
        let mut stack = vec![(top, children)];
        while let Some((at, children)) = stack.pop() {
            for (i, child) in children.into_iter().enumerate() {
                let (node, children) = child.into_parts();
                let idx = self.link(at, i, node);
                stack.push((idx, children));
            }
        }
        Ok(top)
    }

    // ─── Invariants ──────────────────────────────────────────────────────

    /// Check identifier uniqueness and tree shape.
    pub fn validate(&self) -> Result<(), DocError> {
        let malformed = |msg: String| Err(DocError::MalformedDocument(msg));

        if self.root_element().is_none() {
            return malformed("root is not an element".into());
        }
        if self.parent(self.root).is_some() {
            return malformed("root has a parent".into());
        }

        // Walk from the root through the explicit child order.
        let mut visited = HashSet::new();
        let mut stack = vec![self.root];
        let mut ids: HashMap<ElemId, NodeIndex> = HashMap::new();
        while let Some(idx) = stack.pop() {
            if !visited.insert(idx) {
                return malformed(format!("node {} is reachable twice", idx.index()));
            }
            let Some(node) = self.node(idx) else {
                return malformed(format!("dangling child {}", idx.index()));
            };
            let children = self.children(idx);
            if !node.is_element() && !children.is_empty() {
                return malformed("a text or comment leaf has children".into());
            }
            let edge_count = self.graph.neighbors_directed(idx, Direction::Outgoing).count();
            if edge_count != children.len() {
                return malformed(format!("child links of node {} are inconsistent", idx.index()));
            }
            for &child in children {
                let mut parents = self.graph.neighbors_directed(child, Direction::Incoming);
                if parents.next() != Some(idx) || parents.next().is_some() {
                    return malformed(format!("node {} must have exactly one parent", child.index()));
                }
            }
            if let Some(id) = node.as_element().and_then(|e| e.id) {
                if ids.insert(id, idx).is_some() {
                    return malformed(format!("duplicate identifier `{id}`"));
                }
            }
            stack.extend(children.iter().copied());
        }

        if visited.len() != self.graph.node_count() {
            return malformed("some nodes are not reachable from the root".into());
        }
        if ids != self.id_index {
            return malformed("identifier index is out of sync".into());
        }
        Ok(())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

/// Structural equality: tag, attribute sets, ordered children,
/// identifiers, namespace bindings and canvas.
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        let mut ns_a = self.namespaces.clone();
        let mut ns_b = other.namespaces.clone();
        ns_a.sort();
        ns_b.sort();
        ns_a == ns_b
            && self.canvas == other.canvas
            && self.subtree_eq(self.root, other, other.root)
    }
}

impl Document {
    /// Compare the subtree at `a` with the subtree at `b` in `other`.
    fn subtree_eq(&self, a: NodeIndex, other: &Document, b: NodeIndex) -> bool {
        let mut stack = vec![(a, b)];
        while let Some((a, b)) = stack.pop() {
            let (ca, cb) = (self.children(a), other.children(b));
            if self.node(a) != other.node(b) || ca.len() != cb.len() {
                return false;
            }
            stack.extend(ca.iter().copied().zip(cb.iter().copied()));
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(id: &str) -> Element {
        Element::new("rect")
            .with_id(id)
            .with_attr("width", "10")
            .with_attr("height", "10")
    }

    fn nested_groups(depth: usize) -> Document {
        let mut doc = Document::new(10.0, 10.0);
        let mut parent = doc.root;
        for _ in 0..depth {
            parent = doc.append_child(parent, Element::new("g")).unwrap();
        }
        doc
    }

    #[test]
    fn deep_trees_compare_clone_and_detach() {
        let depth = 20_000;
        let doc = nested_groups(depth);
        assert!(doc == nested_groups(depth));
        assert!(doc != nested_groups(depth - 1));

        let copy = doc.clone_subtree(doc.root).unwrap();
        assert_eq!(copy.children.len(), 1);
        assert!(copy == doc.clone_subtree(doc.root).unwrap());

        let mut doc = doc;
        let root = doc.root;
        let detached = doc.remove_child(root, 0).unwrap();
        assert_eq!(doc.node_count(), 1);
        doc.insert_fragment(root, 0, detached).unwrap();
        assert!(doc == nested_groups(depth));
    }

    #[test]
    fn document_basics() {
        let mut doc = Document::new(100.0, 50.0);
        let idx = doc.append_child(doc.root, rect("box1")).unwrap();

        assert_eq!(doc.find_by_id("box1").unwrap(), idx);
        assert_eq!(doc.children(doc.root), &[idx]);
        assert_eq!(doc.parent(idx), Some(doc.root));
        assert_eq!(doc.canvas.size(), Some((100.0, 50.0)));
        doc.validate().unwrap();
    }

    #[test]
    fn find_by_id_missing_is_not_found() {
        let doc = Document::default();
        assert_eq!(
            doc.find_by_id("nope"),
            Err(DocError::NotFound("nope".into()))
        );
    }

    #[test]
    fn attributes_get_set_remove() {
        let mut doc = Document::default();
        let idx = doc.append_child(doc.root, Element::new("circle")).unwrap();

        doc.set_attr(idx, "r", "5").unwrap();
        doc.set_attr(idx, "cx", "1").unwrap();
        doc.set_attr(idx, "r", "6").unwrap();
        let el = doc.element(idx).unwrap();
        assert_eq!(el.attrs[0], Attr::new("r", "6"), "replace keeps position");
        assert_eq!(doc.remove_attr(idx, "cx").unwrap(), Some("1".into()));
        assert_eq!(doc.attr(idx, "cx"), None);
    }

    #[test]
    fn id_attribute_routes_through_index() {
        let mut doc = Document::default();
        let a = doc.append_child(doc.root, Element::new("g")).unwrap();
        let b = doc.append_child(doc.root, Element::new("g")).unwrap();

        doc.set_attr(a, "id", "layer").unwrap();
        assert_eq!(doc.attr(a, "id"), Some("layer"));
        assert_eq!(doc.find_by_id("layer").unwrap(), a);
        assert_eq!(
            doc.set_attr(b, "id", "layer"),
            Err(DocError::DuplicateId("layer".into()))
        );

        assert_eq!(doc.remove_attr(a, "id").unwrap(), Some("layer".into()));
        assert!(doc.find_by_id("layer").is_err());
        doc.validate().unwrap();
    }

    #[test]
    fn insert_replace_remove_children() {
        let mut doc = Document::default();
        let root = doc.root;
        let a = doc.append_child(root, rect("a")).unwrap();
        let c = doc.append_child(root, rect("c")).unwrap();
        let b = doc.insert_child(root, 1, rect("b")).unwrap();
        assert_eq!(doc.children(root), &[a, b, c]);

        let (d, old) = doc.replace_child(root, 1, rect("d")).unwrap();
        assert_eq!(doc.children(root), &[a, d, c]);
        assert_eq!(old.node.as_element().and_then(|e| e.id), Some(ElemId::intern("b")));
        assert!(doc.find_by_id("b").is_err());

        let removed = doc.remove_child(root, 0).unwrap();
        assert_eq!(removed.ids(), vec![ElemId::intern("a")]);
        assert_eq!(doc.children(root), &[d, c]);

        assert_eq!(
            doc.insert_child(root, 5, Element::new("g")),
            Err(DocError::NoSuchChild { pos: 5, len: 2 })
        );
        doc.validate().unwrap();
    }

    #[test]
    fn replace_may_reuse_the_replaced_id() {
        let mut doc = Document::default();
        doc.append_child(doc.root, rect("same")).unwrap();
        let (idx, _) = doc.replace_child(doc.root, 0, rect("same")).unwrap();
        assert_eq!(doc.find_by_id("same").unwrap(), idx);
    }

    #[test]
    fn text_leaves_cannot_hold_children() {
        let mut doc = Document::default();
        let t = doc.append_child(doc.root, Node::Text("hi".into())).unwrap();
        assert_eq!(
            doc.append_child(t, Element::new("g")),
            Err(DocError::NotAnElement)
        );
    }

    #[test]
    fn clone_subtree_keeps_ids_and_insert_rejects_collisions() {
        let mut doc = Document::default();
        let g = doc.append_child(doc.root, Element::new("g").with_id("grp")).unwrap();
        doc.append_child(g, rect("inner")).unwrap();

        let copy = doc.clone_subtree(g).unwrap();
        assert_eq!(copy.ids(), vec![ElemId::intern("grp"), ElemId::intern("inner")]);

        let before = doc.node_count();
        assert_eq!(
            doc.insert_fragment(doc.root, 1, copy.clone()),
            Err(DocError::DuplicateId("grp".into()))
        );
        assert_eq!(doc.node_count(), before, "failed insert must not mutate");

        let mut copy = copy;
        copy.strip_ids();
        let pasted = doc.insert_fragment(doc.root, 1, copy).unwrap();
        assert_eq!(doc.children(pasted).len(), 1);
        doc.validate().unwrap();
    }

    #[test]
    fn remove_subtree_unindexes_descendants() {
        let mut doc = Document::default();
        let g = doc.append_child(doc.root, Element::new("g")).unwrap();
        doc.append_child(g, rect("deep")).unwrap();
        assert_eq!(doc.remove_subtree(g), 2);
        assert!(doc.find_by_id("deep").is_err());
        assert_eq!(doc.remove_subtree(doc.root), 0);
        doc.validate().unwrap();
    }

    #[test]
    fn validate_catches_index_drift() {
        let mut doc = Document::default();
        let idx = doc.append_child(doc.root, Element::new("g")).unwrap();
        doc.element_mut(idx).unwrap().id = Some(ElemId::intern("sneaky"));
        assert!(matches!(doc.validate(), Err(DocError::MalformedDocument(_))));
    }

    #[test]
    fn validate_catches_second_parent() {
        let mut doc = Document::default();
        let a = doc.append_child(doc.root, Element::new("g")).unwrap();
        let b = doc.append_child(doc.root, Element::new("g")).unwrap();
        let leaf = doc.append_child(a, rect("leaf")).unwrap();
        doc.graph.add_edge(b, leaf, ());
        doc.child_order.entry(b).or_default().push(leaf);
        assert!(matches!(doc.validate(), Err(DocError::MalformedDocument(_))));
    }

    #[test]
    fn equality_ignores_attribute_order_and_text_whitespace() {
        let mut a = Document::new(10.0, 10.0);
        let mut b = Document::new(10.0, 10.0);
        let ta = a
            .append_child(a.root, Element::new("text").with_attr("x", "1").with_attr("y", "2"))
            .unwrap();
        let tb = b
            .append_child(b.root, Element::new("text").with_attr("y", "2").with_attr("x", "1"))
            .unwrap();
        a.append_child(ta, Node::Text("  hello   world ".into())).unwrap();
        b.append_child(tb, Node::Text("hello world".into())).unwrap();
        assert_eq!(a, b);

        b.set_attr(tb, "x", "3").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn fresh_id_skips_taken() {
        let mut doc = Document::default();
        doc.append_child(doc.root, rect("path_1")).unwrap();
        assert_eq!(doc.fresh_id("path").as_str(), "path_2");
    }

    #[test]
    fn view_box_parsing() {
        let vb = ViewBox::parse("0,0 100  50").unwrap();
        assert_eq!(vb.width, 100.0);
        assert_eq!(vb.to_string(), "0 0 100 50");
        assert!(ViewBox::parse("0 0 100").is_none());
        assert!(ViewBox::parse("a b c d").is_none());
    }

    #[test]
    fn format_num_trims() {
        assert_eq!(format_num(10.0), "10");
        assert_eq!(format_num(10.5), "10.5");
        assert_eq!(format_num(0.1234), "0.123");
        assert_eq!(format_num(-0.0001), "0");
    }
}
