// src/document/mod.rs
// Owned XML tree with path selection, built with quick-xml.

pub mod diagnostics;
pub mod node;

use log::debug;
use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs;
use std::path::{Path, PathBuf};

pub use diagnostics::{Severity, XmlDiagnostic};
pub use node::XmlNode;

use crate::errors::{ConsolidationError, Result};

#[derive(Debug, Clone)]
pub struct XmlDocument {
    origin: Option<PathBuf>,
    root: XmlNode,
}

impl XmlDocument {
    /// Reads and parses `path`, decoding it with the encoding named in the XML
    /// declaration (UTF-8 when there is none). A missing file is reported
    /// before any read.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConsolidationError::InputNotFound(path.to_path_buf()));
        }
        let bytes = fs::read(path).map_err(|source| ConsolidationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let origin = Some(path.to_path_buf());
        let root = build_tree(Reader::from_reader(bytes.as_slice()), &bytes, origin.as_deref())
            .map_err(|diagnostics| ConsolidationError::MalformedDocument { diagnostics })?;
        debug!("Loaded {} with root element <{}>", path.display(), root.name);
        Ok(Self { origin, root })
    }

    /// Parses text that is already decoded. Any encoding declaration is ignored.
    pub fn parse(text: &str) -> Result<Self> {
        let root = build_tree(Reader::from_str(text), text.as_bytes(), None)
            .map_err(|diagnostics| ConsolidationError::MalformedDocument { diagnostics })?;
        debug!("Parsed document with root element <{}>", root.name);
        Ok(Self { origin: None, root })
    }

    pub fn root(&self) -> &XmlNode {
        &self.root
    }

    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    /// Selects nodes relative to the root element.
    pub fn select(&self, path: &str) -> Vec<&XmlNode> {
        self.root.select(path)
    }
}

/// Builds the element tree. Stops at the first syntax or decoding error.
fn build_tree(
    mut reader: Reader<&[u8]>,
    source: &[u8],
    origin: Option<&Path>,
) -> std::result::Result<XmlNode, Vec<XmlDiagnostic>> {
    let fail = |offset: usize, message: String| {
        vec![XmlDiagnostic::at_offset(
            source,
            offset,
            message,
            origin.map(Path::to_path_buf),
        )]
    };

    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => return Err(fail(reader.error_position() as usize, e.to_string())),
        };
        let position = reader.buffer_position() as usize;
        let decoder = reader.decoder();

        match event {
            Event::Start(start) => {
                if stack.is_empty() && root.is_some() {
                    return Err(fail(position, "Extra content at the end of the document".into()));
                }
                let node = open_element(&start, decoder).map_err(|m| fail(position, m))?;
                stack.push(node);
            }
            Event::Empty(start) => {
                let node = open_element(&start, decoder).map_err(|m| fail(position, m))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None if root.is_some() => {
                        return Err(fail(position, "Extra content at the end of the document".into()))
                    }
                    None => root = Some(node),
                }
            }
            Event::End(end) => {
                let node = match stack.pop() {
                    Some(node) => node,
                    None => {
                        let name = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                        return Err(fail(position, format!("Unexpected end tag : {}", name)));
                    }
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => root = Some(node),
                }
            }
            Event::Text(content) => {
                let content = content.unescape().map_err(|e| fail(position, e.to_string()))?;
                match stack.last_mut() {
                    Some(current) => current.text.push_str(&content),
                    None if content.trim().is_empty() => {}
                    None => {
                        return Err(fail(position, "Content outside the root element".into()))
                    }
                }
            }
            Event::CData(data) => {
                let content = decoder.decode(&data).map_err(|e| fail(position, e.to_string()))?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&content);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(fail(
            source.len(),
            format!("Premature end of data in tag {}", open.name),
        ));
    }

    root.ok_or_else(|| fail(0, "Document is empty".into()))
}

fn open_element(start: &BytesStart<'_>, decoder: Decoder) -> std::result::Result<XmlNode, String> {
    let qname = start.name();
    let name = decoder
        .decode(qname.as_ref())
        .map_err(|e| e.to_string())?;
    let mut node = XmlNode::new(name.into_owned());
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| e.to_string())?;
        let key = decoder
            .decode(attribute.key.as_ref())
            .map_err(|e| e.to_string())?
            .into_owned();
        let value = attribute
            .decode_and_unescape_value(decoder)
            .map_err(|e| e.to_string())?
            .into_owned();
        node.attributes.push((key, value));
    }
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_builds_tree_with_attributes() {
        let doc = XmlDocument::parse(
            r#"<?xml version="1.0"?>
<clinical_study>
  <brief_title>A &amp; B</brief_title>
  <group_list>
    <group group_id="P1"><title>Placebo</title></group>
    <group group_id="P2"><title><![CDATA[Drug <10mg>]]></title></group>
  </group_list>
  <empty flag="yes"/>
</clinical_study>"#,
        )
        .unwrap();

        assert_eq!(doc.root().name, "clinical_study");
        assert_eq!(doc.root().child_text("brief_title"), "A & B");
        let groups = doc.select("group_list/group");
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].attr("group_id"), Some("P1"));
        assert_eq!(groups[1].child_text("title"), "Drug <10mg>");
        assert_eq!(doc.select("empty")[0].attr("flag"), Some("yes"));
    }

    #[test]
    fn test_mismatched_tag_reports_diagnostic() {
        let err = XmlDocument::parse("<a>\n  <b>text</c>\n</a>").unwrap_err();
        match err {
            ConsolidationError::MalformedDocument { diagnostics } => {
                assert_eq!(diagnostics.len(), 1);
                assert_eq!(diagnostics[0].severity, Severity::Fatal);
                assert_eq!(diagnostics[0].line, 2);
                assert!(diagnostics[0].file.is_none());
            }
            other => panic!("expected MalformedDocument, got {:?}", other),
        }
    }

    #[test]
    fn test_unclosed_element_is_malformed() {
        let err = XmlDocument::parse("<a><b></b>").unwrap_err();
        match err {
            ConsolidationError::MalformedDocument { diagnostics } => {
                assert_eq!(diagnostics.len(), 1);
                assert!(!diagnostics[0].message.is_empty());
            }
            other => panic!("expected MalformedDocument, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_and_multi_root_documents() {
        assert!(matches!(
            XmlDocument::parse("   "),
            Err(ConsolidationError::MalformedDocument { .. })
        ));
        assert!(matches!(
            XmlDocument::parse("<a/><b/>"),
            Err(ConsolidationError::MalformedDocument { .. })
        ));
    }

    #[test]
    fn test_parsing_stops_at_first_syntax_error() {
        let err = XmlDocument::parse("<a>\n<b></c>\n<d></e>\n</a>").unwrap_err();
        match err {
            ConsolidationError::MalformedDocument { diagnostics } => {
                assert_eq!(diagnostics.len(), 1);
                assert_eq!(diagnostics[0].line, 2);
            }
            other => panic!("expected MalformedDocument, got {:?}", other),
        }
    }

    fn write_bytes(name: &str, bytes: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("{}-{}.xml", name, std::process::id()));
        fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_load_decodes_declared_latin1() {
        let path = write_bytes(
            "document-latin1",
            b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<clinical_study><brief_title>Caf\xe9</brief_title></clinical_study>",
        );
        let result = XmlDocument::load(&path);
        fs::remove_file(&path).ok();

        let doc = result.unwrap();
        assert_eq!(doc.root().child_text("brief_title"), "Caf\u{e9}");
        assert_eq!(doc.origin(), Some(path.as_path()));
    }

    #[test]
    fn test_load_reports_invalid_utf8_as_malformed() {
        let path = write_bytes(
            "document-bad-utf8",
            b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<clinical_study><brief_title>Caf\xe9</brief_title></clinical_study>",
        );
        let result = XmlDocument::load(&path);
        fs::remove_file(&path).ok();

        match result {
            Err(ConsolidationError::MalformedDocument { diagnostics }) => {
                assert_eq!(diagnostics.len(), 1);
                assert_eq!(diagnostics[0].line, 2);
                assert_eq!(diagnostics[0].file.as_deref(), Some(path.as_path()));
            }
            other => panic!("expected MalformedDocument, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_input_not_found() {
        let path = Path::new("/nonexistent/trial-results.xml");
        match XmlDocument::load(path) {
            Err(ConsolidationError::InputNotFound(p)) => assert_eq!(p, path),
            other => panic!("expected InputNotFound, got {:?}", other),
        }
    }
}
