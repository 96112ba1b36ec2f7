//! draw.io / diagrams.net graph-markup adapter.
//!
//! C4 shapes from the draw.io C4 library carry their element data as
//! `c4*` attributes on an `object` wrapper around the `mxCell`. Nesting is
//! expressed through `mxCell@parent`.

use std::collections::{BTreeMap, BTreeSet};

use fc_core::{BoundaryLevel, CatalogError, DiagramFormat, RawBoundary, RawEdge, RawNode};
use roxmltree::{Document, Node};

use crate::{DetectionMethod, ParseResult, raw_builder::RawBuilder};

const RELATIONSHIP_KIND: &str = "Relationship";
const MAX_NESTING_DEPTH: usize = 64;

#[must_use]
pub fn looks_like_drawio(input: &str) -> bool {
    let trimmed = input.trim_start();
    if !trimmed.starts_with('<') {
        return false;
    }
    trimmed.contains("<mxfile")
        || trimmed.contains("<mxGraphModel")
        || (trimmed.contains("<svg") && trimmed.contains("mxfile"))
}

pub fn parse_drawio(input: &str, source_name: &str) -> Result<ParseResult, CatalogError> {
    parse_drawio_with_detection(input, source_name, 1.0, DetectionMethod::MarkupRoot)
}

pub(crate) fn parse_drawio_with_detection(
    input: &str,
    source_name: &str,
    confidence: f32,
    method: DetectionMethod,
) -> Result<ParseResult, CatalogError> {
    let document = Document::parse(input)
        .map_err(|err| CatalogError::malformed(source_name, format!("invalid XML: {err}")))?;
    let root = document.root_element();
    let mut builder = RawBuilder::new(DiagramFormat::DrawIo);

    match root.tag_name().name() {
        "mxfile" => parse_mxfile(root, source_name, &mut builder)?,
        "mxGraphModel" => parse_graph_model(root, "page 1", None, source_name, &mut builder)?,
        "svg" => {
            let embedded = extract_embedded_mxfile(root, input).ok_or_else(|| {
                CatalogError::malformed(source_name, "SVG does not embed an mxfile document")
            })?;
            return parse_drawio_with_detection(&embedded, source_name, confidence, method);
        }
        other => {
            return Err(CatalogError::malformed(
                source_name,
                format!("expected <mxfile> or <mxGraphModel> root element, found <{other}>"),
            ));
        }
    }

    if builder.is_empty() {
        builder.add_warning("Diagram contained no C4 elements or relationships");
    }

    Ok(builder.finish(confidence, method))
}

fn parse_mxfile(
    root: Node<'_, '_>,
    source_name: &str,
    builder: &mut RawBuilder,
) -> Result<(), CatalogError> {
    let pages: Vec<Node<'_, '_>> = root
        .children()
        .filter(|node| node.has_tag_name("diagram"))
        .collect();
    // Cell ids are only unique within one page.
    let scoped_ids = pages.len() > 1;
    let mut parsed_pages = 0_usize;

    for (index, page) in pages.iter().copied().enumerate() {
        let id_scope = scoped_ids.then(|| format!("p{}/", index + 1));
        let page_label = page
            .attribute("name")
            .map_or_else(|| format!("page {}", index + 1), |name| format!("page '{name}'"));

        if let Some(model) = child_element(page, "mxGraphModel") {
            parse_graph_model(model, &page_label, id_scope.as_deref(), source_name, builder)?;
            parsed_pages += 1;
        } else if page.text().is_some_and(|text| !text.trim().is_empty()) {
            builder.add_warning(format!(
                "{page_label} stores a compressed payload; re-save the diagram uncompressed"
            ));
        } else {
            builder.add_warning(format!("{page_label} has no mxGraphModel; skipped"));
        }
    }

    if pages.is_empty() {
        return Err(CatalogError::malformed(
            source_name,
            "mxfile contains no <diagram> pages",
        ));
    }
    if parsed_pages == 0 {
        return Err(CatalogError::malformed(
            source_name,
            "no page contains an uncompressed <mxGraphModel>",
        ));
    }
    Ok(())
}

/// One `mxCell`, optionally wrapped by an `object`/`UserObject` carrying C4 data.
#[derive(Debug, Clone, Default)]
struct Cell {
    id: String,
    parent: Option<String>,
    c4_type: Option<String>,
    name: String,
    description: String,
    technology: String,
    label: String,
    edge: bool,
    source: Option<String>,
    target: Option<String>,
}

impl Cell {
    fn scope_ids(&mut self, scope: &str) {
        let scoped = |id: &mut String| id.insert_str(0, scope);
        scoped(&mut self.id);
        for id in [&mut self.parent, &mut self.source, &mut self.target]
            .into_iter()
            .flatten()
        {
            scoped(id);
        }
    }
}

fn parse_graph_model(
    model: Node<'_, '_>,
    page_label: &str,
    id_scope: Option<&str>,
    source_name: &str,
    builder: &mut RawBuilder,
) -> Result<(), CatalogError> {
    let Some(root) = child_element(model, "root") else {
        return Err(CatalogError::malformed(
            source_name,
            format!("{page_label}: mxGraphModel has no <root> element"),
        ));
    };

    let mut cells: Vec<Cell> = root.children().filter_map(read_cell).collect();
    if let Some(scope) = id_scope {
        for cell in &mut cells {
            cell.scope_ids(scope);
        }
    }
    let parents: BTreeMap<&str, &str> = cells
        .iter()
        .filter_map(|cell| Some((cell.id.as_str(), cell.parent.as_deref()?)))
        .collect();
    let boundary_levels: BTreeMap<&str, BoundaryLevel> = cells
        .iter()
        .filter_map(|cell| Some((cell.id.as_str(), boundary_level(cell.c4_type.as_deref()?)?)))
        .collect();

    let enclosing = |id: &str| -> Vec<String> {
        let mut chain = Vec::new();
        let mut visited = BTreeSet::new();
        let mut current = parents.get(id).copied();
        while let Some(parent) = current {
            if !visited.insert(parent) || visited.len() > MAX_NESTING_DEPTH {
                break;
            }
            if boundary_levels.contains_key(parent) {
                chain.push(parent.to_string());
            }
            current = parents.get(parent).copied();
        }
        chain
    };

    for cell in &cells {
        if cell.edge {
            push_edge(cell, page_label, builder);
            continue;
        }
        let Some(c4_type) = cell.c4_type.as_deref() else {
            continue;
        };
        if c4_type == RELATIONSHIP_KIND {
            builder.add_warning(format!(
                "{page_label}: relationship '{}' is not attached to an edge cell; skipped",
                cell.id
            ));
            continue;
        }

        if let Some(level) = boundary_levels.get(cell.id.as_str()).copied() {
            builder.push_boundary(RawBoundary {
                source_id: cell.id.clone(),
                level,
                label: cell.name.clone(),
                enclosing_boundary_ids: enclosing(&cell.id),
            });
        } else {
            builder.push_node(RawNode {
                source_id: cell.id.clone(),
                declared_kind: c4_type.to_string(),
                declared_name: cell.name.clone(),
                declared_description: cell.description.clone(),
                declared_technology: cell.technology.clone(),
                enclosing_boundary_ids: enclosing(&cell.id),
            });
        }
    }

    Ok(())
}

fn push_edge(cell: &Cell, page_label: &str, builder: &mut RawBuilder) {
    let (Some(source), Some(target)) = (cell.source.as_deref(), cell.target.as_deref()) else {
        builder.add_warning(format!(
            "{page_label}: edge '{}' is not connected at both ends; skipped",
            cell.id
        ));
        return;
    };
    let description = if cell.description.is_empty() {
        cell.label.clone()
    } else {
        cell.description.clone()
    };
    builder.push_edge(RawEdge {
        source_id: source.to_string(),
        target_id: target.to_string(),
        declared_description: description,
        declared_technology: cell.technology.clone(),
    });
}

fn read_cell(node: Node<'_, '_>) -> Option<Cell> {
    match node.tag_name().name() {
        "mxCell" => {
            let label = node.attribute("value").map(strip_html).unwrap_or_default();
            Some(Cell {
                id: node.attribute("id")?.to_string(),
                parent: node.attribute("parent").map(str::to_string),
                c4_type: node.attribute("c4Type").map(str::to_string),
                name: node
                    .attribute("c4Name")
                    .map_or_else(|| label.clone(), str::to_string),
                description: attr(node, "c4Description"),
                technology: attr(node, "c4Technology"),
                label,
                edge: node.attribute("edge") == Some("1"),
                source: node.attribute("source").map(str::to_string),
                target: node.attribute("target").map(str::to_string),
            })
        }
        "object" | "UserObject" => {
            let inner = child_element(node, "mxCell");
            let inner_attr = |name: &str| inner.and_then(|cell| cell.attribute(name));
            let label = node
                .attribute("label")
                .filter(|label| !label.contains("%c4"))
                .map(strip_html)
                .unwrap_or_default();
            Some(Cell {
                id: node.attribute("id")?.to_string(),
                parent: node
                    .attribute("parent")
                    .or_else(|| inner_attr("parent"))
                    .map(str::to_string),
                c4_type: node.attribute("c4Type").map(str::to_string),
                name: node
                    .attribute("c4Name")
                    .map_or_else(|| label.clone(), str::to_string),
                description: attr(node, "c4Description"),
                technology: attr(node, "c4Technology"),
                label,
                edge: inner_attr("edge") == Some("1"),
                source: inner_attr("source").map(str::to_string),
                target: inner_attr("target").map(str::to_string),
            })
        }
        _ => None,
    }
}

fn boundary_level(c4_type: &str) -> Option<BoundaryLevel> {
    match c4_type {
        "SystemScopeBoundary" => Some(BoundaryLevel::System),
        "ContainerScopeBoundary" => Some(BoundaryLevel::Container),
        other if other.ends_with("ScopeBoundary") => Some(BoundaryLevel::Generic),
        _ => None,
    }
}

fn attr(node: Node<'_, '_>, name: &str) -> String {
    node.attribute(name)
        .map(|value| value.trim().to_string())
        .unwrap_or_default()
}

fn child_element<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|child| child.has_tag_name(name))
}

/// Take the first line of an HTML label as plain text.
fn strip_html(label: &str) -> String {
    let first_line = label
        .split("<br")
        .next()
        .unwrap_or_default()
        .split('\n')
        .next()
        .unwrap_or_default();

    let mut out = String::with_capacity(first_line.len());
    let mut in_tag = false;
    for ch in first_line.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// draw.io SVG exports keep the source document in the root `content`
/// attribute; older exports inline it verbatim.
fn extract_embedded_mxfile(svg_root: Node<'_, '_>, raw: &str) -> Option<String> {
    if let Some(content) = svg_root.attribute("content")
        && content.trim_start().starts_with("<mxfile")
    {
        return Some(content.to_string());
    }

    let start = raw.find("<mxfile")?;
    let end_marker = "</mxfile>";
    let end = raw[start..].find(end_marker)? + start + end_marker.len();
    Some(raw[start..end].to_string())
}
