use crate::error::SourceError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tagpress_idf::Node;
use tagpress_traits::DocumentSource;
use tagpress_types::{DocumentProperties, StyleDecl};

/// A document held in memory.
///
/// Serializes to the JSON document format read by [`MemorySource::open_json`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemorySource {
    pub name: String,
    pub properties: DocumentProperties,
    pub styles: Vec<StyleDecl>,
    pub nodes: Vec<Node>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_properties(mut self, properties: DocumentProperties) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_style(mut self, style: StyleDecl) -> Self {
        self.styles.push(style);
        self
    }

    pub fn with_node(mut self, node: impl Into<Node>) -> Self {
        self.nodes.push(node.into());
        self
    }

    pub fn from_json(text: &str) -> Result<Self, SourceError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads a JSON document; the file name stands in for a missing `name`.
    pub fn open_json(path: &Path) -> Result<Self, SourceError> {
        let text = fs::read_to_string(path).map_err(|e| SourceError::io(path, e))?;
        let mut source = Self::from_json(&text)?;
        if source.name.is_empty() {
            source.name = path.display().to_string();
        }
        Ok(source)
    }
}

impl DocumentSource for MemorySource {
    fn properties(&self) -> DocumentProperties {
        self.properties
    }

    fn style_definitions(&self) -> Vec<StyleDecl> {
        self.styles.clone()
    }

    fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagpress_idf::{Paragraph, Table};
    use tagpress_types::{Realm, StyleMention};

    #[test]
    fn test_mentions_come_from_nodes() {
        let source = MemorySource::new("doc")
            .with_style(StyleDecl::in_realm(Realm::Paragraph, "Body"))
            .with_node(Paragraph::styled("Body").with_text("one"))
            .with_node(Table::new(Some("Grid")))
            .with_node(Paragraph::styled("Body"));
        assert_eq!(
            source.style_mentions(),
            vec![
                StyleMention::new(Realm::Paragraph, "Body"),
                StyleMention::new(Realm::Table, "Grid"),
            ]
        );
    }

    #[test]
    fn test_json_document() {
        let json = r#"{
            "properties": {"has_rtl": false},
            "styles": [{"realm": "paragraph", "local_id": "Body", "name": "Body Text", "custom": true}],
            "nodes": [
                {"kind": "paragraph", "style": "Body", "chunks": [
                    {"kind": "span", "text": ["Hello"], "format": "BOLD"}
                ]}
            ]
        }"#;
        let source = MemorySource::from_json(json).unwrap();
        assert!(!source.properties().has_rtl);
        assert_eq!(source.style_definitions()[0].name.as_deref(), Some("Body Text"));
        let Node::Paragraph(para) = &source.nodes()[0] else {
            panic!("expected a paragraph");
        };
        assert_eq!(para.text(), "Hello");
    }

    #[test]
    fn test_json_errors_are_reported() {
        let err = MemorySource::from_json("{\"nodes\": 3}").unwrap_err();
        assert!(matches!(err, SourceError::Json(_)));
    }

    #[test]
    fn test_open_json_names_source_after_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        let source = MemorySource::new("").with_node(Paragraph::new().with_text("x"));
        fs::write(&path, serde_json::to_string(&source).unwrap()).unwrap();
        let read = MemorySource::open_json(&path).unwrap();
        assert!(read.name().ends_with("doc.json"));
        assert_eq!(read.nodes, source.nodes);
    }
}
