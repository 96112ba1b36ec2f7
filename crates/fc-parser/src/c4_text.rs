//! Mermaid C4 block-text adapter.
//!
//! One statement per line. Element and relationship macros become raw
//! records; `Boundary(...) {` / `}` pairs maintain a scope stack that
//! supplies each element's enclosing boundaries.

use chumsky::prelude::*;
use fc_core::{BoundaryLevel, CatalogError, DiagramFormat, RawBoundary, RawEdge, RawNode};

use crate::{DetectionMethod, ParseResult, raw_builder::RawBuilder};

pub(crate) const C4_HEADERS: [&str; 5] = [
    "C4Context",
    "C4Container",
    "C4Component",
    "C4Dynamic",
    "C4Deployment",
];

/// Macros that only affect rendering.
const STYLE_MACROS: [&str; 7] = [
    "UpdateElementStyle",
    "UpdateRelStyle",
    "UpdateBoundaryStyle",
    "UpdateLayoutConfig",
    "AddElementTag",
    "AddRelTag",
    "AddBoundaryTag",
];

/// Argument layout of an element macro.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ElementArgs {
    /// `(alias, label, ?descr)`
    LabelDescription,
    /// `(alias, label, ?techn, ?descr)`
    LabelTechnologyDescription,
}

/// Element macro name → (declared C4 kind, argument layout).
fn element_macro(name: &str) -> Option<(&'static str, ElementArgs)> {
    use ElementArgs::{LabelDescription, LabelTechnologyDescription};

    let kind = match name {
        "Person" | "Person_Ext" => ("Person", LabelDescription),
        "System" | "System_Ext" => ("Software System", LabelDescription),
        "SystemDb" | "SystemDb_Ext" => ("Software System Database", LabelDescription),
        "SystemQueue" | "SystemQueue_Ext" => ("Software System Queue", LabelDescription),
        "Container" | "Container_Ext" => ("Container", LabelTechnologyDescription),
        "ContainerDb" | "ContainerDb_Ext" => ("ContainerDb", LabelTechnologyDescription),
        "ContainerQueue" | "ContainerQueue_Ext" => ("ContainerQueue", LabelTechnologyDescription),
        "Component" | "Component_Ext" => ("Component", LabelTechnologyDescription),
        "ComponentDb" | "ComponentDb_Ext" => ("Component Database", LabelTechnologyDescription),
        "ComponentQueue" | "ComponentQueue_Ext" => {
            ("Component Queue", LabelTechnologyDescription)
        }
        _ => return None,
    };
    Some(kind)
}

fn boundary_macro(name: &str) -> Option<BoundaryLevel> {
    match name {
        "System_Boundary" => Some(BoundaryLevel::System),
        "Container_Boundary" | "Boundary" => Some(BoundaryLevel::Container),
        "Enterprise_Boundary" | "Deployment_Node" | "Node" | "Node_L" | "Node_R" => {
            Some(BoundaryLevel::Generic)
        }
        _ => None,
    }
}

/// Relationship macro name → whether the declared direction is reversed.
fn relationship_macro(name: &str) -> Option<bool> {
    match name {
        "Rel" | "BiRel" | "Rel_U" | "Rel_Up" | "Rel_D" | "Rel_Down" | "Rel_L" | "Rel_Left"
        | "Rel_R" | "Rel_Right" => Some(false),
        "Rel_Back" => Some(true),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum C4Statement {
    Macro {
        name: String,
        args: Vec<String>,
        opens_block: bool,
    },
    OpenBlock,
    CloseBlock,
}

/// Build a chumsky parser for a single C4 statement line.
fn c4_statement_parser<'a>() -> impl Parser<'a, &'a str, C4Statement, extra::Err<Rich<'a, char>>>
{
    let ws_char = any().filter(|c: &char| *c == ' ' || *c == '\t');
    let inline_ws = ws_char.repeated().to(());

    let ident = any()
        .filter(|c: &char| c.is_ascii_alphanumeric() || *c == '_')
        .repeated()
        .at_least(1)
        .to_slice();

    let quoted = just('"')
        .ignore_then(any().filter(|c: &char| *c != '"').repeated().to_slice())
        .then_ignore(just('"'))
        .map(|s: &str| s.to_string());

    // Bare arguments may embed quoted runs (`$tags="a,b"`), which keep commas.
    let bare_piece = choice((
        just('"')
            .then(any().filter(|c: &char| *c != '"').repeated())
            .then(just('"'))
            .to(()),
        any()
            .filter(|c: &char| !matches!(*c, ',' | ')' | '"'))
            .to(()),
    ));
    let bare = bare_piece
        .repeated()
        .to_slice()
        .map(|s: &str| s.trim().to_string());

    let argument = inline_ws
        .ignore_then(choice((quoted.then_ignore(inline_ws), bare)));

    let macro_call = ident
        .then_ignore(inline_ws)
        .then_ignore(just('('))
        .then(argument.separated_by(just(',')).collect::<Vec<String>>())
        .then_ignore(just(')'))
        .then_ignore(inline_ws)
        .then(just('{').or_not())
        .then_ignore(inline_ws)
        .then_ignore(end())
        .map(
            |((name, args), brace): ((&str, Vec<String>), Option<char>)| {
                let args = if args.len() == 1 && args[0].is_empty() {
                    Vec::new()
                } else {
                    args
                };
                C4Statement::Macro {
                    name: name.to_string(),
                    args,
                    opens_block: brace.is_some(),
                }
            },
        );

    let open_block = just('{')
        .then_ignore(inline_ws)
        .then_ignore(end())
        .to(C4Statement::OpenBlock);
    let close_block = just('}')
        .then_ignore(inline_ws)
        .then_ignore(end())
        .to(C4Statement::CloseBlock);

    choice((close_block, open_block, macro_call))
}

#[must_use]
pub fn looks_like_c4_text(input: &str) -> bool {
    let Some(first_line) = first_significant_line(input) else {
        return false;
    };
    if C4_HEADERS
        .iter()
        .any(|header| first_line.starts_with(header))
    {
        return true;
    }
    input.lines().map(str::trim).any(|line| {
        line.split_once('(').is_some_and(|(name, _)| {
            let name = name.trim();
            element_macro(name).is_some()
                || relationship_macro(name).is_some()
                || boundary_macro(name).is_some()
        })
    })
}

pub fn parse_c4_text(input: &str, source_name: &str) -> Result<ParseResult, CatalogError> {
    parse_c4_text_with_detection(input, source_name, 1.0, DetectionMethod::C4Header)
}

/// Positional argument, with `$key=value` keyword arguments removed.
fn positional(args: &[String], index: usize) -> String {
    args.iter()
        .filter(|arg| !arg.starts_with('$'))
        .nth(index)
        .cloned()
        .unwrap_or_default()
}

pub(crate) fn parse_c4_text_with_detection(
    input: &str,
    source_name: &str,
    confidence: f32,
    method: DetectionMethod,
) -> Result<ParseResult, CatalogError> {
    let mut builder = RawBuilder::new(DiagramFormat::MermaidC4);
    let parser = c4_statement_parser();
    let mut saw_header = false;
    // Open boundary ids, outermost first. `None` marks a brace with no boundary.
    let mut stack: Vec<Option<String>> = Vec::new();
    let mut pending_boundary: Option<String> = None;

    for (index, line) in input.lines().enumerate() {
        let line_number = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || is_comment(trimmed) {
            continue;
        }
        if C4_HEADERS.iter().any(|header| trimmed.starts_with(header)) {
            saw_header = true;
            continue;
        }
        if is_non_graph_statement(trimmed) {
            continue;
        }

        let (statement, errors) = parser.parse(trimmed).into_output_errors();
        let Some(statement) = statement.filter(|_| errors.is_empty()) else {
            builder.add_warning(format!(
                "Line {line_number}: unsupported C4 syntax: {trimmed}"
            ));
            continue;
        };

        let enclosing = || -> Vec<String> { stack.iter().rev().flatten().cloned().collect() };

        match statement {
            C4Statement::OpenBlock => {
                stack.push(pending_boundary.take());
            }
            C4Statement::CloseBlock => {
                if stack.pop().is_none() {
                    builder.add_warning(format!(
                        "Line {line_number}: encountered '}}' without an open boundary"
                    ));
                }
            }
            C4Statement::Macro {
                name,
                args,
                opens_block,
            } => {
                pending_boundary = None;
                if let Some((declared_kind, layout)) = element_macro(&name) {
                    let (technology, description) = match layout {
                        ElementArgs::LabelDescription => (String::new(), positional(&args, 2)),
                        ElementArgs::LabelTechnologyDescription => {
                            (positional(&args, 2), positional(&args, 3))
                        }
                    };
                    builder.push_node(RawNode {
                        source_id: positional(&args, 0),
                        declared_kind: declared_kind.to_string(),
                        declared_name: positional(&args, 1),
                        declared_description: description,
                        declared_technology: technology,
                        enclosing_boundary_ids: enclosing(),
                    });
                    if opens_block {
                        stack.push(None);
                    }
                } else if let Some(level) = boundary_macro(&name) {
                    let id = positional(&args, 0);
                    let pushed = builder.push_boundary(RawBoundary {
                        source_id: id.clone(),
                        level,
                        label: positional(&args, 1),
                        enclosing_boundary_ids: enclosing(),
                    });
                    let scope = pushed.then_some(id);
                    if opens_block {
                        stack.push(scope);
                    } else {
                        pending_boundary = scope;
                    }
                } else if let Some(reversed) = relationship_macro(&name) {
                    let (mut from, mut to) = (positional(&args, 0), positional(&args, 1));
                    if reversed {
                        std::mem::swap(&mut from, &mut to);
                    }
                    builder.push_edge(RawEdge {
                        source_id: from,
                        target_id: to,
                        declared_description: positional(&args, 2),
                        declared_technology: positional(&args, 3),
                    });
                } else if STYLE_MACROS.contains(&name.as_str()) {
                    continue;
                } else {
                    builder.add_warning(format!(
                        "Line {line_number}: unsupported C4 macro '{name}'"
                    ));
                    if opens_block {
                        stack.push(None);
                    }
                }
            }
        }
    }

    if !stack.is_empty() {
        builder.add_warning(format!(
            "C4 diagram ended with {} unclosed boundary block(s)",
            stack.len()
        ));
    }

    if builder.is_empty() {
        if !saw_header {
            return Err(CatalogError::malformed(
                source_name,
                "no C4 header and no recognizable C4 statements",
            ));
        }
        builder.add_warning("No C4 elements or relationships were found");
    }

    Ok(builder.finish(confidence, method))
}

fn is_comment(line: &str) -> bool {
    line.starts_with("%%") || line.starts_with("//")
}

fn is_non_graph_statement(line: &str) -> bool {
    ["title ", "title:", "accTitle", "accDescr", "direction "]
        .iter()
        .any(|prefix| line.starts_with(prefix))
        || line == "title"
}

pub(crate) fn first_significant_line(input: &str) -> Option<&str> {
    input
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !is_comment(line))
}
