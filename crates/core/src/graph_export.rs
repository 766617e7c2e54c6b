use crate::identifier::edge_id;
use crate::models::strip_quotes;
use crate::{MigrateError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDomain {
    Node,
    Edge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphField {
    EntityType,
    Description,
    SourceId,
    Weight,
    Keywords,
}

impl GraphField {
    fn from_attr_name(name: &str) -> Option<Self> {
        match name {
            "entity_type" => Some(Self::EntityType),
            "description" => Some(Self::Description),
            "source_id" => Some(Self::SourceId),
            "weight" => Some(Self::Weight),
            "keywords" => Some(Self::Keywords),
            _ => None,
        }
    }
}

/// Key codes written by the graph exporter when no `<key>` declaration says otherwise.
const BUILTIN_KEYS: [(&str, KeyDomain, GraphField); 7] = [
    ("d0", KeyDomain::Node, GraphField::EntityType),
    ("d1", KeyDomain::Node, GraphField::Description),
    ("d2", KeyDomain::Node, GraphField::SourceId),
    ("d3", KeyDomain::Edge, GraphField::Weight),
    ("d4", KeyDomain::Edge, GraphField::Description),
    ("d5", KeyDomain::Edge, GraphField::Keywords),
    ("d6", KeyDomain::Edge, GraphField::SourceId),
];

/// Key code to semantic field, resolved once while reading the export.
#[derive(Debug, Clone)]
pub struct KeySchema {
    fields: HashMap<String, (KeyDomain, GraphField)>,
}

impl KeySchema {
    pub fn builtin() -> Self {
        let fields = BUILTIN_KEYS
            .iter()
            .map(|(code, domain, field)| ((*code).to_string(), (*domain, *field)))
            .collect();
        Self { fields }
    }

    /// Applies a `<key>` declaration. Unknown attribute names unmap the code.
    pub fn declare(&mut self, code: &str, domain: Option<KeyDomain>, attr_name: &str) {
        let field = GraphField::from_attr_name(attr_name);
        let domain = domain.or_else(|| self.fields.get(code).map(|(domain, _)| *domain));
        match (domain, field) {
            (Some(domain), Some(field)) => {
                self.fields.insert(code.to_string(), (domain, field));
            }
            _ => {
                self.fields.remove(code);
            }
        }
    }

    pub fn resolve(&self, code: &str, domain: KeyDomain) -> Option<GraphField> {
        self.fields
            .get(code)
            .filter(|(declared, _)| *declared == domain)
            .map(|(_, field)| *field)
    }
}

impl Default for KeySchema {
    fn default() -> Self {
        Self::builtin()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EntityMetadata {
    pub entity_type: String,
    pub description: String,
    pub source_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RelationshipMetadata {
    pub source: String,
    pub target: String,
    pub description: String,
    pub weight: Option<f64>,
    pub keywords: String,
    pub source_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct GraphExport {
    /// Keyed by quote-stripped node id.
    pub entities: HashMap<String, EntityMetadata>,
    /// Keyed by `edge_id(source, target)`.
    pub relationships: HashMap<u64, RelationshipMetadata>,
}

impl GraphExport {
    pub fn entity(&self, name: &str) -> Option<&EntityMetadata> {
        self.entities.get(name)
    }

    pub fn relationship(&self, source: &str, target: &str) -> Option<&RelationshipMetadata> {
        self.relationships.get(&edge_id(source, target))
    }
}

/// Loads the export, or returns empty maps when the file does not exist.
pub fn load_graph_export(path: &Path) -> Result<GraphExport> {
    if !path.exists() {
        warn!(path = %path.display(), "graph export not found, enrichment will be empty");
        return Ok(GraphExport::default());
    }

    let xml = fs::read_to_string(path)?;
    let export = parse_graph_export(&xml)?;
    info!(
        path = %path.display(),
        entities = export.entities.len(),
        relationships = export.relationships.len(),
        "loaded graph export"
    );
    Ok(export)
}

enum Element {
    Node {
        id: String,
        metadata: EntityMetadata,
    },
    Edge(RelationshipMetadata),
}

pub fn parse_graph_export(xml: &str) -> Result<GraphExport> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut schema = KeySchema::builtin();
    let mut export = GraphExport::default();
    let mut current: Option<Element> = None;
    let mut data_key: Option<String> = None;
    let mut data_text = String::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"key" => declare_key(&mut schema, &e)?,
                b"node" => current = Some(start_node(&e)?),
                b"edge" => current = Some(start_edge(&e)?),
                b"data" => {
                    data_key = attribute(&e, b"key")?;
                    data_text.clear();
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"key" => declare_key(&mut schema, &e)?,
                b"node" => finish(&mut export, start_node(&e)?),
                b"edge" => finish(&mut export, start_edge(&e)?),
                _ => {}
            },
            Ok(Event::Text(text)) if data_key.is_some() => {
                let value = text
                    .unescape()
                    .map_err(|error| MigrateError::GraphExport(error.to_string()))?;
                data_text.push_str(&value);
            }
            Ok(Event::CData(cdata)) if data_key.is_some() => {
                data_text.push_str(&String::from_utf8_lossy(&cdata.into_inner()));
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"data" => {
                    if let (Some(key), Some(element)) = (data_key.take(), current.as_mut()) {
                        assign(&schema, element, &key, std::mem::take(&mut data_text));
                    }
                }
                b"node" | b"edge" => {
                    if let Some(element) = current.take() {
                        finish(&mut export, element);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(error) => {
                return Err(MigrateError::GraphExport(format!(
                    "at byte {}: {error}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(export)
}

fn attribute(element: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(|error| MigrateError::GraphExport(error.to_string()))?;
        if attr.key.as_ref() == name {
            let value = attr
                .unescape_value()
                .map_err(|error| MigrateError::GraphExport(error.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn required_attribute(element: &BytesStart<'_>, name: &[u8]) -> Result<String> {
    attribute(element, name)?.ok_or_else(|| {
        MigrateError::GraphExport(format!(
            "<{}> without {} attribute",
            String::from_utf8_lossy(element.local_name().as_ref()),
            String::from_utf8_lossy(name)
        ))
    })
}

fn declare_key(schema: &mut KeySchema, element: &BytesStart<'_>) -> Result<()> {
    let Some(code) = attribute(element, b"id")? else {
        return Ok(());
    };
    let domain = match attribute(element, b"for")?.as_deref() {
        Some("node") => Some(KeyDomain::Node),
        Some("edge") => Some(KeyDomain::Edge),
        _ => None,
    };
    let attr_name = attribute(element, b"attr.name")?.unwrap_or_default();
    schema.declare(&code, domain, &attr_name);
    Ok(())
}

fn start_node(element: &BytesStart<'_>) -> Result<Element> {
    Ok(Element::Node {
        id: strip_quotes(&required_attribute(element, b"id")?),
        metadata: EntityMetadata::default(),
    })
}

fn start_edge(element: &BytesStart<'_>) -> Result<Element> {
    Ok(Element::Edge(RelationshipMetadata {
        source: strip_quotes(&required_attribute(element, b"source")?),
        target: strip_quotes(&required_attribute(element, b"target")?),
        ..RelationshipMetadata::default()
    }))
}

fn assign(schema: &KeySchema, element: &mut Element, key: &str, value: String) {
    match element {
        Element::Node { metadata, .. } => match schema.resolve(key, KeyDomain::Node) {
            Some(GraphField::EntityType) => metadata.entity_type = strip_quotes(&value),
            Some(GraphField::Description) => metadata.description = value,
            Some(GraphField::SourceId) => metadata.source_id = value,
            _ => debug!(key, "ignoring node data key"),
        },
        Element::Edge(metadata) => match schema.resolve(key, KeyDomain::Edge) {
            Some(GraphField::Weight) => match value.trim().parse::<f64>() {
                Ok(weight) => metadata.weight = Some(weight),
                Err(_) => debug!(key, value = %value, "edge weight is not a number"),
            },
            Some(GraphField::Description) => metadata.description = value,
            Some(GraphField::Keywords) => metadata.keywords = value,
            Some(GraphField::SourceId) => metadata.source_id = value,
            _ => debug!(key, "ignoring edge data key"),
        },
    }
}

fn finish(export: &mut GraphExport, element: Element) {
    match element {
        Element::Node { id, metadata } => {
            export.entities.insert(id, metadata);
        }
        Element::Edge(metadata) => {
            let id = edge_id(&metadata.source, &metadata.target);
            export.relationships.insert(id, metadata);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const EXPORT: &str = r#"<?xml version='1.0' encoding='utf-8'?>
<graphml xmlns="http://graphml.graphdrawing.org/xmlns">
  <key id="d0" for="node" attr.name="entity_type" attr.type="string" />
  <key id="d1" for="node" attr.name="description" attr.type="string" />
  <key id="d2" for="node" attr.name="source_id" attr.type="string" />
  <key id="d3" for="edge" attr.name="weight" attr.type="double" />
  <key id="d4" for="edge" attr.name="description" attr.type="string" />
  <key id="d5" for="edge" attr.name="keywords" attr.type="string" />
  <key id="d6" for="edge" attr.name="source_id" attr.type="string" />
  <graph edgedefault="undirected">
    <node id="&quot;ALICE&quot;">
      <data key="d0">&quot;PERSON&quot;</data>
      <data key="d1">An engineer &amp; author.</data>
      <data key="d2">c1&lt;SEP&gt;c2</data>
    </node>
    <node id="LONELY" />
    <edge source="&quot;ALICE&quot;" target="&quot;BOB&quot;">
      <data key="d3">2.5</data>
      <data key="d4">Alice mentors Bob.</data>
      <data key="d5">mentorship</data>
      <data key="d6">c1</data>
    </edge>
  </graph>
</graphml>"#;

    #[test]
    fn parses_nodes_and_edges() -> Result<(), Box<dyn std::error::Error>> {
        let export = parse_graph_export(EXPORT)?;

        let alice = export.entity("ALICE").ok_or("missing ALICE")?;
        assert_eq!(alice.entity_type, "PERSON");
        assert_eq!(alice.description, "An engineer & author.");
        assert_eq!(alice.source_id, "c1<SEP>c2");
        assert_eq!(export.entity("LONELY"), Some(&EntityMetadata::default()));

        let edge = export.relationship("ALICE", "BOB").ok_or("missing edge")?;
        assert_eq!(edge.weight, Some(2.5));
        assert_eq!(edge.keywords, "mentorship");
        assert_eq!(edge.source_id, "c1");
        assert!(export.relationship("BOB", "ALICE").is_none());
        Ok(())
    }

    #[test]
    fn undeclared_keys_use_builtin_codes() -> Result<(), Box<dyn std::error::Error>> {
        let xml = r#"<graphml><graph>
            <node id="X"><data key="d0">ORG</data><data key="d3">ignored</data></node>
            <edge source="X" target="Y"><data key="d4">links</data></edge>
        </graph></graphml>"#;
        let export = parse_graph_export(xml)?;
        assert_eq!(export.entity("X").map(|m| m.entity_type.as_str()), Some("ORG"));
        let edge = export.relationship("X", "Y").ok_or("missing edge")?;
        assert_eq!(edge.description, "links");
        assert_eq!(edge.weight, None);
        Ok(())
    }

    #[test]
    fn declarations_override_builtin_codes() {
        let mut schema = KeySchema::builtin();
        schema.declare("d0", Some(KeyDomain::Node), "description");
        schema.declare("d1", Some(KeyDomain::Node), "created_at");
        assert_eq!(
            schema.resolve("d0", KeyDomain::Node),
            Some(GraphField::Description)
        );
        assert_eq!(schema.resolve("d1", KeyDomain::Node), None);
        assert_eq!(schema.resolve("d3", KeyDomain::Node), None);
        assert_eq!(schema.resolve("d3", KeyDomain::Edge), Some(GraphField::Weight));
    }

    #[test]
    fn missing_file_yields_empty_maps() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let export = load_graph_export(&dir.path().join("absent.graphml"))?;
        assert!(export.entities.is_empty());
        assert!(export.relationships.is_empty());
        Ok(())
    }

    #[test]
    fn malformed_xml_is_an_error() {
        let result = parse_graph_export("<graphml><node id=\"a\"></edge></graphml>");
        assert!(matches!(result, Err(MigrateError::GraphExport(_))));
    }
}
