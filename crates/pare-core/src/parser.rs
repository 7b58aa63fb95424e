//! Parser for SVG-like markup text → `Document`.
//!
//! Built on `winnow` 0.7. Handles: elements and self-closing tags, quoted
//! attributes, text, comments, CDATA sections (kept as text), and skips the
//! XML declaration, processing instructions and `DOCTYPE`. Entity references
//! are decoded. Whitespace-only text between tags is incidental and dropped.
//!
//! The root's `xmlns*` bindings and its `width` / `height` / `viewBox` are
//! lifted out of the attribute list into `Document::namespaces` and
//! `Document::canvas`.

use crate::error::DocError;
use crate::id::ElemId;
use crate::model::*;
use petgraph::graph::NodeIndex;
use winnow::ascii::multispace0;
use winnow::combinator::{alt, delimited};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::{take_till, take_until, take_while};

/// Parse a markup document string into a `Document`.
///
/// Unbalanced or unparsable markup, duplicate attributes and duplicate
/// identifiers are all reported as `MalformedDocument`.
#[must_use = "parsing result should be used"]
pub fn parse_document(input: &str) -> Result<Document, DocError> {
    let mut rest = input;

    skip_misc(&mut rest).map_err(|e| malformed(input, rest, e))?;
    if !rest.starts_with('<') {
        return Err(DocError::MalformedDocument(
            "expected a root element".into(),
        ));
    }
    let (root, self_closing) = parse_open_tag
        .parse_next(&mut rest)
        .map_err(|e| malformed(input, rest, e))?;
    let root_tag = root.tag.clone();
    let mut doc = into_document(root);
    if !self_closing {
        parse_content(input, &mut rest, &mut doc, root_tag)?;
    }
    skip_misc(&mut rest).map_err(|e| malformed(input, rest, e))?;
    if !rest.is_empty() {
        return Err(DocError::MalformedDocument(format!(
            "unexpected content after the root element at byte {}",
            offset(input, rest)
        )));
    }

    log::debug!("parsed document: {} nodes", doc.node_count());
    Ok(doc)
}

fn offset(input: &str, rest: &str) -> usize {
    input.len() - rest.len()
}

fn malformed(input: &str, rest: &str, e: ErrMode<ContextError>) -> DocError {
    DocError::MalformedDocument(format!(
        "markup parse error at byte {}: {e}",
        offset(input, rest)
    ))
}

/// Build the document around the parsed root element.
fn into_document(mut element: Element) -> Document {
    let mut namespaces = Vec::new();
    let mut canvas = Canvas::default();
    element.attrs.retain(|attr| {
        if attr.name == "xmlns" {
            namespaces.push(Namespace {
                prefix: None,
                uri: attr.value.clone(),
            });
            return false;
        }
        if let Some(prefix) = attr.name.strip_prefix("xmlns:") {
            namespaces.push(Namespace {
                prefix: Some(prefix.to_string()),
                uri: attr.value.clone(),
            });
            return false;
        }
        match attr.name.as_str() {
            "width" => {
                canvas.width = Some(attr.value.clone());
                false
            }
            "height" => {
                canvas.height = Some(attr.value.clone());
                false
            }
            // An unparsable viewBox stays a plain attribute.
            "viewBox" => match ViewBox::parse(&attr.value) {
                Some(vb) => {
                    canvas.view_box = Some(vb);
                    false
                }
                None => true,
            },
            _ => true,
        }
    });

    let mut doc = Document::with_root(element);
    doc.namespaces = namespaces;
    doc.canvas = canvas;
    doc
}

// ─── Low-level parsers ──────────────────────────────────────────────────

fn cut() -> ErrMode<ContextError> {
    ErrMode::Cut(ContextError::new())
}

/// Consume optional whitespace (concrete error type avoids inference issues).
fn skip_space(input: &mut &str) {
    let _: Result<&str, ErrMode<ContextError>> = multispace0.parse_next(input);
}

/// Skip whitespace, comments, processing instructions and `DOCTYPE`
/// outside the root element.
fn skip_misc(input: &mut &str) -> ModalResult<()> {
    loop {
        skip_space(input);
        if input.starts_with("<?") {
            parse_processing_instruction.parse_next(input)?;
        } else if input.starts_with("<!--") {
            let dropped = parse_comment.parse_next(input)?;
            log::trace!("dropping comment outside the root: {dropped:?}");
        } else if input.starts_with("<!DOCTYPE") {
            skip_doctype(input)?;
        } else {
            return Ok(());
        }
    }
}

/// `DOCTYPE` may carry an internal subset in brackets that contains `>`.
fn skip_doctype(input: &mut &str) -> ModalResult<()> {
    let mut depth = 0usize;
    for (i, c) in input.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            '>' if depth == 0 => {
                *input = &input[i + 1..];
                return Ok(());
            }
            _ => {}
        }
    }
    Err(cut())
}

fn parse_processing_instruction<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    delimited("<?", take_until(0.., "?>"), "?>").parse_next(input)
}

fn parse_comment<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    delimited("<!--", take_until(0.., "-->"), "-->").parse_next(input)
}

fn parse_cdata<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    delimited("<![CDATA[", take_until(0.., "]]>"), "]]>").parse_next(input)
}

fn parse_name<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| {
        c.is_alphanumeric() || matches!(c, ':' | '_' | '-' | '.')
    })
    .parse_next(input)
}

fn parse_quoted<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    alt((
        delimited('"', take_till(0.., '"'), '"'),
        delimited('\'', take_till(0.., '\''), '\''),
    ))
    .parse_next(input)
}

fn parse_attribute<'a>(input: &mut &'a str) -> ModalResult<(&'a str, String)> {
    let name = parse_name.parse_next(input)?;
    skip_space(input);
    let _ = '='.parse_next(input)?;
    skip_space(input);
    let value = parse_quoted.parse_next(input)?;
    Ok((name, decode_entities(value)))
}

// ─── Element parser ─────────────────────────────────────────────────────

/// `<name attr="value" ...>` or `<name ... />`. The flag is true for a
/// self-closing tag.
fn parse_open_tag(input: &mut &str) -> ModalResult<(Element, bool)> {
    let _ = '<'.parse_next(input)?;
    let tag = parse_name.parse_next(input)?;
    let mut element = Element::new(tag);

    loop {
        skip_space(input);
        if input.starts_with("/>") {
            let _ = "/>".parse_next(input)?;
            return Ok((element, true));
        }
        if input.starts_with('>') {
            let _ = '>'.parse_next(input)?;
            return Ok((element, false));
        }
        let (name, value) = parse_attribute.parse_next(input)?;
        let duplicate = if name == "id" {
            element.id.is_some()
        } else {
            element.has_attr(name)
        };
        if duplicate {
            log::debug!("duplicate attribute `{name}` on <{tag}>");
            return Err(cut());
        }
        if name == "id" {
            element.id = Some(ElemId::intern(&value));
        } else {
            element.attrs.push(Attr::new(name, value));
        }
    }
}

fn parse_close_tag<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    let _ = "</".parse_next(input)?;
    let name = parse_name.parse_next(input)?;
    skip_space(input);
    let _ = '>'.parse_next(input)?;
    Ok(name)
}

/// Parse the root's content up to and including its close tag.
///
/// Open elements are tracked on an explicit stack, so nesting depth is not
/// bounded by the call stack.
fn parse_content(
    input: &str,
    rest: &mut &str,
    doc: &mut Document,
    root_tag: String,
) -> Result<(), DocError> {
    let mut open: Vec<(NodeIndex, String)> = vec![(doc.root, root_tag)];
    while let Some((parent, tag)) = open.last() {
        let parent = *parent;
        if rest.starts_with("</") {
            let close = parse_close_tag
                .parse_next(rest)
                .map_err(|e| malformed(input, *rest, e))?;
            if close != tag.as_str() {
                return Err(DocError::MalformedDocument(format!(
                    "<{tag}> closed by </{close}> at byte {}",
                    offset(input, *rest)
                )));
            }
            open.pop();
        } else if rest.starts_with("<!--") {
            let comment = parse_comment
                .parse_next(rest)
                .map_err(|e| malformed(input, *rest, e))?;
            append(doc, parent, Node::Comment(comment.to_string()))?;
        } else if rest.starts_with("<![CDATA[") {
            let text = parse_cdata
                .parse_next(rest)
                .map_err(|e| malformed(input, *rest, e))?;
            append(doc, parent, Node::Text(text.to_string()))?;
        } else if rest.starts_with("<?") {
            parse_processing_instruction
                .parse_next(rest)
                .map_err(|e| malformed(input, *rest, e))?;
        } else if rest.starts_with('<') {
            let (element, self_closing) = parse_open_tag
                .parse_next(rest)
                .map_err(|e| malformed(input, *rest, e))?;
            let child_tag = element.tag.clone();
            let idx = append(doc, parent, Node::Element(element))?;
            if !self_closing {
                open.push((idx, child_tag));
            }
        } else if rest.is_empty() {
            return Err(DocError::MalformedDocument(format!(
                "unexpected end of input inside <{tag}>"
            )));
        } else {
            let raw: &str = take_till(1.., '<')
                .parse_next(rest)
                .map_err(|e| malformed(input, *rest, e))?;
            if !raw.trim().is_empty() {
                append(doc, parent, Node::Text(decode_entities(raw)))?;
            }
        }
    }
    Ok(())
}

fn append(doc: &mut Document, parent: NodeIndex, node: Node) -> Result<NodeIndex, DocError> {
    doc.append_child(parent, node).map_err(|e| match e {
        DocError::DuplicateId(id) => {
            DocError::MalformedDocument(format!("duplicate identifier `{id}`"))
        }
        other => other,
    })
}

// ─── Entities ───────────────────────────────────────────────────────────

/// Decode the predefined and numeric character references.
/// Unknown references are kept verbatim.
fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        let decoded = rest
            .find(';')
            .filter(|&end| end <= 12)
            .and_then(|end| decode_entity(&rest[1..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}
