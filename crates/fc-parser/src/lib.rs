#![forbid(unsafe_code)]

//! Diagram source adapters: turn draw.io markup or Mermaid C4 text into
//! format-neutral [`RawDiagram`] records.

mod c4_text;
mod drawio;
mod raw_builder;

use fc_core::{CatalogError, DiagramFormat, RawDiagram};
use serde::Serialize;
use serde_json::json;

pub use c4_text::{looks_like_c4_text, parse_c4_text};
pub use drawio::{looks_like_drawio, parse_drawio};

/// File extensions the adapters accept.
pub const SUPPORTED_EXTENSIONS: [&str; 5] = ["xml", "drawio", "svg", "mmd", "mermaid"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseResult {
    pub diagram: RawDiagram,
    pub warnings: Vec<String>,
    /// Detection confidence (0.0 to 1.0)
    pub confidence: f32,
    /// Method used for format detection
    pub detection_method: DetectionMethod,
}

/// Method used to detect a diagram's format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DetectionMethod {
    /// Root element of a markup document
    MarkupRoot,
    /// Leading `C4Context` / `C4Container` / ... header
    C4Header,
    /// Element or relationship macros without a header
    ContentHeuristic,
    /// File extension alone
    Extension,
    /// Nothing matched
    Fallback,
}

impl DetectionMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MarkupRoot => "markup root element",
            Self::C4Header => "C4 header keyword",
            Self::ContentHeuristic => "content heuristics",
            Self::Extension => "file extension",
            Self::Fallback => "no format detected",
        }
    }
}

/// Result of format detection with confidence information.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectedFormat {
    pub format: DiagramFormat,
    /// Confidence score (0.0 to 1.0)
    pub confidence: f32,
    pub method: DetectionMethod,
    pub warnings: Vec<String>,
}

/// Detect the diagram format with confidence information.
///
/// Content markers win over the extension; the extension only decides when
/// the content is ambiguous:
/// 1. Markup root (`<mxfile`, `<mxGraphModel`, SVG embedding an mxfile)
/// 2. C4 header keyword on the first significant line
/// 3. C4 macro statements anywhere in the text
/// 4. Extension hint (`.drawio`/`.xml`/`.svg` vs `.mmd`/`.mermaid`)
#[must_use]
pub fn detect_format_with_confidence(input: &str, path_hint: Option<&str>) -> DetectedFormat {
    let detected = |format, confidence, method| DetectedFormat {
        format,
        confidence,
        method,
        warnings: Vec::new(),
    };

    if input.trim().is_empty() {
        return DetectedFormat {
            format: DiagramFormat::Unknown,
            confidence: 0.0,
            method: DetectionMethod::Fallback,
            warnings: vec!["Empty input".to_string()],
        };
    }

    if drawio::looks_like_drawio(input) {
        return detected(DiagramFormat::DrawIo, 1.0, DetectionMethod::MarkupRoot);
    }

    if let Some(first_line) = c4_text::first_significant_line(input)
        && c4_text::C4_HEADERS
            .iter()
            .any(|header| first_line.starts_with(header))
    {
        return detected(DiagramFormat::MermaidC4, 1.0, DetectionMethod::C4Header);
    }

    if c4_text::looks_like_c4_text(input) {
        return detected(
            DiagramFormat::MermaidC4,
            0.8,
            DetectionMethod::ContentHeuristic,
        );
    }

    if let Some(format) = path_hint.and_then(format_from_extension) {
        return DetectedFormat {
            format,
            confidence: 0.4,
            method: DetectionMethod::Extension,
            warnings: vec![format!(
                "Content is ambiguous; assuming {} from the file extension",
                format.as_str()
            )],
        };
    }

    DetectedFormat {
        format: DiagramFormat::Unknown,
        confidence: 0.0,
        method: DetectionMethod::Fallback,
        warnings: vec!["Could not detect a draw.io or Mermaid C4 diagram".to_string()],
    }
}

#[must_use]
pub fn detect_format(input: &str) -> DiagramFormat {
    detect_format_with_confidence(input, None).format
}

/// Map a path's extension onto the format it conventionally holds.
#[must_use]
pub fn format_from_extension(path: &str) -> Option<DiagramFormat> {
    let (_, extension) = path.rsplit_once('.')?;
    match extension.to_ascii_lowercase().as_str() {
        "xml" | "drawio" | "svg" => Some(DiagramFormat::DrawIo),
        "mmd" | "mermaid" => Some(DiagramFormat::MermaidC4),
        _ => None,
    }
}

#[must_use]
pub fn is_supported_path(path: &str) -> bool {
    path.rsplit_once('.').is_some_and(|(_, extension)| {
        SUPPORTED_EXTENSIONS.contains(&extension.to_ascii_lowercase().as_str())
    })
}

/// Parse one diagram file, detecting its format from content and name.
pub fn parse(input: &str, source_name: &str) -> Result<ParseResult, CatalogError> {
    let detection = detect_format_with_confidence(input, Some(source_name));
    match detection.format {
        DiagramFormat::DrawIo => {
            let parsed = drawio::parse_drawio_with_detection(
                input,
                source_name,
                detection.confidence,
                detection.method,
            )?;
            Ok(with_detection_warnings(parsed, detection.warnings))
        }
        DiagramFormat::MermaidC4 => {
            let parsed = c4_text::parse_c4_text_with_detection(
                input,
                source_name,
                detection.confidence,
                detection.method,
            )?;
            Ok(with_detection_warnings(parsed, detection.warnings))
        }
        DiagramFormat::Unknown => Err(CatalogError::malformed(
            source_name,
            detection
                .warnings
                .first()
                .cloned()
                .unwrap_or_else(|| "unrecognized diagram format".to_string()),
        )),
    }
}

fn with_detection_warnings(mut parsed: ParseResult, mut warnings: Vec<String>) -> ParseResult {
    warnings.append(&mut parsed.warnings);
    parsed.warnings = warnings;
    parsed
}

#[must_use]
pub fn parse_evidence_json(parsed: &ParseResult) -> String {
    json!({
        "format": parsed.diagram.format.as_str(),
        "node_count": parsed.diagram.nodes.len(),
        "boundary_count": parsed.diagram.boundaries.len(),
        "edge_count": parsed.diagram.edges.len(),
        "confidence": parsed.confidence,
        "detection_method": parsed.detection_method.as_str(),
        "warning_count": parsed.warnings.len(),
        "warnings": parsed.warnings.clone(),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use fc_core::{CatalogErrorCode, DiagramFormat};
    use proptest::prelude::*;

    use super::{
        DetectionMethod, detect_format, detect_format_with_confidence, format_from_extension,
        is_supported_path, parse, parse_evidence_json,
    };

    const DRAWIO: &str = r#"<mxfile><diagram name="p"><mxGraphModel><root>
<mxCell id="0"/><mxCell id="1" parent="0"/>
<object id="web" c4Type="Container" c4Name="Storefront" c4Technology="React" c4Description="Shop UI">
  <mxCell vertex="1" parent="1"/>
</object>
</root></mxGraphModel></diagram></mxfile>"#;

    #[test]
    fn detects_drawio_markup() {
        let detected = detect_format_with_confidence(DRAWIO, Some("shop.xml"));
        assert_eq!(detected.format, DiagramFormat::DrawIo);
        assert_eq!(detected.method, DetectionMethod::MarkupRoot);
        assert_eq!(detected.confidence, 1.0);
    }

    #[test]
    fn detects_c4_header() {
        let detected = detect_format_with_confidence("%% shop\nC4Context\n", None);
        assert_eq!(detected.format, DiagramFormat::MermaidC4);
        assert_eq!(detected.method, DetectionMethod::C4Header);
    }

    #[test]
    fn detects_headerless_c4_macros() {
        let detected = detect_format_with_confidence("Person(u, \"User\")", None);
        assert_eq!(detected.format, DiagramFormat::MermaidC4);
        assert_eq!(detected.method, DetectionMethod::ContentHeuristic);
    }

    #[test]
    fn content_beats_extension() {
        let detected = detect_format_with_confidence("C4Context\n", Some("mislabelled.xml"));
        assert_eq!(detected.format, DiagramFormat::MermaidC4);
    }

    #[test]
    fn extension_decides_ambiguous_content() {
        let detected = detect_format_with_confidence("just some words", Some("notes.mmd"));
        assert_eq!(detected.format, DiagramFormat::MermaidC4);
        assert_eq!(detected.method, DetectionMethod::Extension);
        assert_eq!(detected.warnings.len(), 1);
    }

    #[test]
    fn empty_input_is_unknown() {
        assert_eq!(detect_format("   \n"), DiagramFormat::Unknown);
    }

    #[test]
    fn extension_helpers() {
        assert_eq!(format_from_extension("a/b.DRAWIO"), Some(DiagramFormat::DrawIo));
        assert_eq!(format_from_extension("a/b.mermaid"), Some(DiagramFormat::MermaidC4));
        assert_eq!(format_from_extension("README"), None);
        assert!(is_supported_path("diagrams/shop.svg"));
        assert!(!is_supported_path("diagrams/shop.png"));
    }

    #[test]
    fn parse_dispatches_on_format() {
        let parsed = parse(DRAWIO, "shop.drawio").expect("drawio parse");
        assert_eq!(parsed.diagram.format, DiagramFormat::DrawIo);
        assert_eq!(parsed.diagram.nodes.len(), 1);

        let parsed = parse("C4Context\nPerson(u, \"User\")", "ctx.mmd").expect("c4 parse");
        assert_eq!(parsed.diagram.format, DiagramFormat::MermaidC4);
        assert_eq!(parsed.detection_method, DetectionMethod::C4Header);
    }

    #[test]
    fn parse_rejects_unrecognized_content() {
        let err = parse("hello", "hello.txt").expect_err("must fail");
        assert_eq!(err.code(), CatalogErrorCode::MalformedInput);
    }

    #[test]
    fn evidence_json_reports_counts() {
        let parsed = parse(DRAWIO, "shop.drawio").expect("parse");
        let evidence = parse_evidence_json(&parsed);
        assert!(evidence.contains("\"format\":\"drawio\""));
        assert!(evidence.contains("\"node_count\":1"));
        assert!(evidence.contains("\"edge_count\":0"));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn parse_never_panics(input in "\\PC{0,200}") {
            let _ = parse(&input, "fuzz.mmd");
        }

        #[test]
        fn c4_lines_never_panic(
            lines in prop::collection::vec("[A-Za-z_(){},\" $=]{0,40}", 0..12)
        ) {
            let input = format!("C4Container\n{}", lines.join("\n"));
            let parsed = parse(&input, "fuzz.mmd");
            prop_assert!(parsed.is_ok());
        }
    }
}
