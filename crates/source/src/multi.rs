use std::collections::HashSet;
use tagpress_idf::Node;
use tagpress_traits::DocumentSource;
use tagpress_types::{DocumentProperties, StyleDecl};

/// Several documents read back to back, converted as one.
///
/// Style declarations are merged by realm and local id; the first source to
/// declare a style wins.
#[derive(Debug)]
pub struct MultiSource {
    name: String,
    properties: DocumentProperties,
    styles: Vec<StyleDecl>,
    nodes: Vec<Node>,
}

impl MultiSource {
    pub fn new(parts: Vec<Box<dyn DocumentSource>>) -> Self {
        let name = parts.iter().map(|part| part.name()).collect::<Vec<_>>().join(" + ");
        let properties = if parts.is_empty() {
            DocumentProperties::default()
        } else {
            DocumentProperties {
                has_rtl: parts.iter().any(|part| part.properties().has_rtl),
                pure_ascii: parts.iter().all(|part| part.properties().pure_ascii),
            }
        };

        let mut seen = HashSet::new();
        let styles = parts
            .iter()
            .flat_map(|part| part.style_definitions())
            .filter(|decl| seen.insert((decl.realm.clone(), decl.local_id.clone())))
            .collect();

        let nodes = parts.iter().flat_map(|part| part.nodes().iter().cloned()).collect();

        Self {
            name,
            properties,
            styles,
            nodes,
        }
    }
}

impl DocumentSource for MultiSource {
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
    use crate::MemorySource;
    use tagpress_idf::Paragraph;
    use tagpress_types::Realm;

    #[test]
    fn test_concatenates_in_order() {
        let first = MemorySource::new("a")
            .with_properties(DocumentProperties { has_rtl: true, pure_ascii: true })
            .with_style(StyleDecl::in_realm(Realm::Paragraph, "Body").with_name("First"))
            .with_node(Paragraph::styled("Body").with_text("one"));
        let second = MemorySource::new("b")
            .with_style(StyleDecl::in_realm(Realm::Paragraph, "Body").with_name("Second"))
            .with_style(StyleDecl::in_realm(Realm::Character, "Body"))
            .with_node(Paragraph::new().with_text("two"));

        let multi = MultiSource::new(vec![Box::new(first), Box::new(second)]);
        assert_eq!(multi.name(), "a + b");
        assert!(multi.properties().has_rtl);
        assert!(!multi.properties().pure_ascii);

        let texts: Vec<_> = multi
            .nodes()
            .iter()
            .map(|node| match node {
                Node::Paragraph(p) => p.text(),
                Node::Table(_) => String::new(),
            })
            .collect();
        assert_eq!(texts, ["one", "two"]);

        let styles = multi.style_definitions();
        assert_eq!(styles.len(), 2);
        assert_eq!(styles[0].name.as_deref(), Some("First"));
        assert_eq!(styles[1].realm, "character");
    }
}
