//! Emitter: Document → markup text.
//!
//! Output round-trips through the parser to a structurally equal document.
//! Elements nest with two-space indentation; an element holding any text
//! leaf is written on one line so its text content is not padded. The tree
//! is walked with an explicit stack, so nesting depth is not bounded by the
//! call stack.

use crate::model::*;
use petgraph::graph::NodeIndex;
use std::fmt::Write;

/// Emit a `Document` as markup text. No XML declaration is written.
#[must_use]
pub fn emit_document(doc: &Document) -> String {
    let mut out = String::with_capacity(1024);
    let mut stack = vec![Step::Enter(doc.root, Layout::Block(0))];
    while let Some(step) = stack.pop() {
        match step {
            Step::Enter(idx, layout) => enter(&mut out, doc, idx, layout, &mut stack),
            Step::Close { tag, indent: depth, newline } => {
                if let Some(depth) = depth {
                    indent(&mut out, depth);
                }
                let _ = write!(out, "</{tag}>");
                if newline {
                    out.push('\n');
                }
            }
        }
    }
    out
}

/// Where a node sits: on its own indented line, or inside a text run.
#[derive(Clone, Copy)]
enum Layout {
    Block(usize),
    Inline,
}

/// Pending work; the tree is walked with an explicit stack.
enum Step<'a> {
    Enter(NodeIndex, Layout),
    Close {
        tag: &'a str,
        indent: Option<usize>,
        newline: bool,
    },
}

/// Deeper nesting is written at this indentation, so output stays linear in
/// the size of the tree.
const MAX_INDENT: usize = 32;

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth.min(MAX_INDENT) {
        out.push_str("  ");
    }
}

fn enter<'a>(
    out: &mut String,
    doc: &'a Document,
    idx: NodeIndex,
    layout: Layout,
    stack: &mut Vec<Step<'a>>,
) {
    let Some(node) = doc.node(idx) else {
        return;
    };
    let block = match layout {
        Layout::Block(depth) => {
            indent(out, depth);
            Some(depth)
        }
        Layout::Inline => None,
    };
    let end = if block.is_some() { "\n" } else { "" };
    match node {
        Node::Element(el) => {
            emit_open_tag(out, doc, idx, el);
            let children = doc.children(idx);
            if children.is_empty() {
                out.push_str("/>");
                out.push_str(end);
                return;
            }
            out.push('>');
            // An element holding text is written inline so the text is not padded.
            let mixed = children
                .iter()
                .any(|&c| matches!(doc.node(c), Some(Node::Text(_))));
            let child_layout = match block {
                Some(depth) if !mixed => {
                    out.push('\n');
                    Layout::Block(depth + 1)
                }
                _ => Layout::Inline,
            };
            stack.push(Step::Close {
                tag: &el.tag,
                indent: block.filter(|_| !mixed),
                newline: block.is_some(),
            });
            stack.extend(
                children
                    .iter()
                    .rev()
                    .map(|&child| Step::Enter(child, child_layout)),
            );
        }
        Node::Text(text) => {
            out.push_str(&escape_text(text));
            out.push_str(end);
        }
        Node::Comment(text) => {
            let _ = write!(out, "<!--{text}-->");
            out.push_str(end);
        }
    }
}

/// `<tag` plus attributes, without the closing `>` or `/>`.
fn emit_open_tag(out: &mut String, doc: &Document, idx: NodeIndex, el: &Element) {
    out.push('<');
    out.push_str(&el.tag);

    if idx == doc.root {
        for ns in &doc.namespaces {
            match &ns.prefix {
                None => emit_attr(out, "xmlns", &ns.uri),
                Some(prefix) => emit_attr(out, &format!("xmlns:{prefix}"), &ns.uri),
            }
        }
    }
    if let Some(id) = el.id {
        emit_attr(out, "id", id.as_str());
    }
    if idx == doc.root {
        if let Some(width) = &doc.canvas.width {
            emit_attr(out, "width", width);
        }
        if let Some(height) = &doc.canvas.height {
            emit_attr(out, "height", height);
        }
        if let Some(vb) = &doc.canvas.view_box {
            emit_attr(out, "viewBox", &vb.to_string());
        }
    }
    for attr in &el.attrs {
        emit_attr(out, &attr.name, &attr.value);
    }
}

fn emit_attr(out: &mut String, name: &str, value: &str) {
    let _ = write!(out, " {name}=\"{}\"", escape_attr(value));
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;
    use pretty_assertions::assert_eq;

    #[test]
    fn emit_fresh_document() {
        let doc = Document::new(200.0, 100.0);
        assert_eq!(
            emit_document(&doc),
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"200\" height=\"100\" viewBox=\"0 0 200 100\"/>\n"
        );
    }

    #[test]
    fn emit_nested_layout() {
        let input = r#"<svg><g id="a"><rect width="1"/><!--note--></g></svg>"#;
        let doc = parse_document(input).unwrap();
        let expected = "<svg>\n  <g id=\"a\">\n    <rect width=\"1\"/>\n    <!--note-->\n  </g>\n</svg>\n";
        assert_eq!(emit_document(&doc), expected);
    }

    #[test]
    fn emit_text_content_inline() {
        let input = "<svg><text x=\"1\">a <tspan>b</tspan> &lt; c</text></svg>";
        let doc = parse_document(input).unwrap();
        let output = emit_document(&doc);
        assert!(output.contains("<text x=\"1\">a <tspan>b</tspan> &lt; c</text>"));
    }

    #[test]
    fn emit_escapes_attribute_quotes() {
        let mut doc = Document::new(10.0, 10.0);
        let root = doc.root;
        doc.append_child(root, Element::new("desc").with_attr("title", "say \"hi\" & go"))
            .unwrap();
        let output = emit_document(&doc);
        assert!(output.contains("title=\"say &quot;hi&quot; &amp; go\""));
        assert_eq!(parse_document(&output).unwrap(), doc);
    }

    #[test]
    fn emit_deeply_nested_document() {
        let mut doc = Document::new(10.0, 10.0);
        let mut parent = doc.root;
        for _ in 0..20_000 {
            parent = doc.append_child(parent, Element::new("g")).unwrap();
        }
        let output = emit_document(&doc);
        assert_eq!(output.matches("</g>").count(), 19_999);
        assert!(output.contains(&format!("{}<g/>\n", "  ".repeat(MAX_INDENT))));
        assert!(output.ends_with("</g>\n</svg>\n"));
    }

    #[test]
    fn roundtrip_is_structurally_equal() {
        let input = r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" viewBox="0 0 10.5 20">
  <defs><linearGradient id="g"><stop offset="0"/></linearGradient></defs>
  <use xlink:href="#g" x="1"/>
  <text>one<tspan dy="2">two</tspan></text>
</svg>"##;
        let doc = parse_document(input).unwrap();
        let reparsed = parse_document(&emit_document(&doc)).unwrap();
        assert_eq!(doc, reparsed);
        assert_eq!(emit_document(&reparsed), emit_document(&doc));
    }
}
