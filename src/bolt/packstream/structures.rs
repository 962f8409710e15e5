//! Graph structures carried inside PackStream.
//!
//! Nodes, relationships and paths arrive as tagged structures. Bolt 5
//! appended string element ids to nodes and relationships; both the
//! legacy and the Bolt 5 field counts are accepted on decode, selected
//! by the structure's declared field count.

use std::collections::HashMap;

use super::value::{Structure, Value};
use super::PackStreamError;

/// Node structure signature (`'N'`).
pub const NODE: u8 = 0x4E;
/// Relationship structure signature (`'R'`).
pub const RELATIONSHIP: u8 = 0x52;
/// Unbound relationship structure signature (`'r'`).
pub const UNBOUND_RELATIONSHIP: u8 = 0x72;
/// Path structure signature (`'P'`).
pub const PATH: u8 = 0x50;

/// A graph node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: i64,
    pub labels: Vec<String>,
    pub properties: HashMap<String, Value>,
    /// String identifier, present from Bolt 5.
    pub element_id: Option<String>,
}

impl Node {
    pub fn new(id: i64, labels: Vec<String>, properties: HashMap<String, Value>) -> Self {
        Self {
            id,
            labels,
            properties,
            element_id: None,
        }
    }

    pub fn with_element_id(mut self, element_id: impl Into<String>) -> Self {
        self.element_id = Some(element_id.into());
        self
    }

    /// Wire shape: 3 fields legacy, 4 with an element id.
    pub fn to_value(&self) -> Value {
        let mut fields = vec![
            Value::Integer(self.id),
            Value::List(self.labels.iter().map(|l| Value::from(l.as_str())).collect()),
            Value::Map(self.properties.clone()),
        ];
        if let Some(ref eid) = self.element_id {
            fields.push(Value::from(eid.as_str()));
        }
        Value::Structure(Structure::new(NODE, fields))
    }

    pub fn from_structure(s: &Structure) -> Result<Self, PackStreamError> {
        expect_signature(s, NODE, "Node")?;
        if s.fields.len() != 3 && s.fields.len() != 4 {
            return Err(PackStreamError::InvalidStructure(format!(
                "Node has {} fields, expected 3 or 4",
                s.fields.len()
            )));
        }
        let id = int_field(s, 0, "Node id")?;
        let labels = string_list_field(s, 1, "Node labels")?;
        let properties = map_field(s, 2, "Node properties")?;
        let element_id = if s.fields.len() == 4 {
            Some(string_field(s, 3, "Node element_id")?)
        } else {
            None
        };
        Ok(Self {
            id,
            labels,
            properties,
            element_id,
        })
    }
}

/// A relationship bound to its endpoint node ids.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub id: i64,
    pub start_node_id: i64,
    pub end_node_id: i64,
    pub rel_type: String,
    pub properties: HashMap<String, Value>,
    pub element_id: Option<String>,
    pub start_node_element_id: Option<String>,
    pub end_node_element_id: Option<String>,
}

impl Relationship {
    pub fn new(
        id: i64,
        start_node_id: i64,
        end_node_id: i64,
        rel_type: impl Into<String>,
        properties: HashMap<String, Value>,
    ) -> Self {
        Self {
            id,
            start_node_id,
            end_node_id,
            rel_type: rel_type.into(),
            properties,
            element_id: None,
            start_node_element_id: None,
            end_node_element_id: None,
        }
    }

    pub fn with_element_ids(
        mut self,
        element_id: impl Into<String>,
        start: impl Into<String>,
        end: impl Into<String>,
    ) -> Self {
        self.element_id = Some(element_id.into());
        self.start_node_element_id = Some(start.into());
        self.end_node_element_id = Some(end.into());
        self
    }

    /// Wire shape: 5 fields legacy, 8 with element ids.
    pub fn to_value(&self) -> Value {
        let mut fields = vec![
            Value::Integer(self.id),
            Value::Integer(self.start_node_id),
            Value::Integer(self.end_node_id),
            Value::from(self.rel_type.as_str()),
            Value::Map(self.properties.clone()),
        ];
        if self.element_id.is_some() {
            fields.push(option_string(&self.element_id));
            fields.push(option_string(&self.start_node_element_id));
            fields.push(option_string(&self.end_node_element_id));
        }
        Value::Structure(Structure::new(RELATIONSHIP, fields))
    }

    pub fn from_structure(s: &Structure) -> Result<Self, PackStreamError> {
        expect_signature(s, RELATIONSHIP, "Relationship")?;
        if s.fields.len() != 5 && s.fields.len() != 8 {
            return Err(PackStreamError::InvalidStructure(format!(
                "Relationship has {} fields, expected 5 or 8",
                s.fields.len()
            )));
        }
        let mut rel = Self::new(
            int_field(s, 0, "Relationship id")?,
            int_field(s, 1, "Relationship start node")?,
            int_field(s, 2, "Relationship end node")?,
            string_field(s, 3, "Relationship type")?,
            map_field(s, 4, "Relationship properties")?,
        );
        if s.fields.len() == 8 {
            rel.element_id = Some(string_field(s, 5, "Relationship element_id")?);
            rel.start_node_element_id = Some(string_field(s, 6, "Relationship start element_id")?);
            rel.end_node_element_id = Some(string_field(s, 7, "Relationship end element_id")?);
        }
        Ok(rel)
    }
}

/// A relationship inside a path, without endpoint ids.
#[derive(Debug, Clone, PartialEq)]
pub struct UnboundRelationship {
    pub id: i64,
    pub rel_type: String,
    pub properties: HashMap<String, Value>,
    pub element_id: Option<String>,
}

impl UnboundRelationship {
    pub fn new(id: i64, rel_type: impl Into<String>, properties: HashMap<String, Value>) -> Self {
        Self {
            id,
            rel_type: rel_type.into(),
            properties,
            element_id: None,
        }
    }

    pub fn with_element_id(mut self, element_id: impl Into<String>) -> Self {
        self.element_id = Some(element_id.into());
        self
    }

    /// Wire shape: 3 fields legacy, 4 with an element id.
    pub fn to_value(&self) -> Value {
        let mut fields = vec![
            Value::Integer(self.id),
            Value::from(self.rel_type.as_str()),
            Value::Map(self.properties.clone()),
        ];
        if let Some(ref eid) = self.element_id {
            fields.push(Value::from(eid.as_str()));
        }
        Value::Structure(Structure::new(UNBOUND_RELATIONSHIP, fields))
    }

    pub fn from_structure(s: &Structure) -> Result<Self, PackStreamError> {
        expect_signature(s, UNBOUND_RELATIONSHIP, "UnboundRelationship")?;
        if s.fields.len() != 3 && s.fields.len() != 4 {
            return Err(PackStreamError::InvalidStructure(format!(
                "UnboundRelationship has {} fields, expected 3 or 4",
                s.fields.len()
            )));
        }
        let mut rel = Self::new(
            int_field(s, 0, "UnboundRelationship id")?,
            string_field(s, 1, "UnboundRelationship type")?,
            map_field(s, 2, "UnboundRelationship properties")?,
        );
        if s.fields.len() == 4 {
            rel.element_id = Some(string_field(s, 3, "UnboundRelationship element_id")?);
        }
        Ok(rel)
    }
}

/// An alternating node/relationship walk.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub nodes: Vec<Node>,
    pub relationships: Vec<UnboundRelationship>,
    /// Signed indices describing the traversal order and direction.
    pub sequence: Vec<i64>,
}

impl Path {
    pub fn new(
        nodes: Vec<Node>,
        relationships: Vec<UnboundRelationship>,
        sequence: Vec<i64>,
    ) -> Self {
        Self {
            nodes,
            relationships,
            sequence,
        }
    }

    pub fn to_value(&self) -> Value {
        Value::Structure(Structure::new(
            PATH,
            vec![
                Value::List(self.nodes.iter().map(Node::to_value).collect()),
                Value::List(
                    self.relationships
                        .iter()
                        .map(UnboundRelationship::to_value)
                        .collect(),
                ),
                Value::List(self.sequence.iter().copied().map(Value::Integer).collect()),
            ],
        ))
    }

    pub fn from_structure(s: &Structure) -> Result<Self, PackStreamError> {
        expect_signature(s, PATH, "Path")?;
        if s.fields.len() != 3 {
            return Err(PackStreamError::InvalidStructure(format!(
                "Path has {} fields, expected 3",
                s.fields.len()
            )));
        }
        let nodes = s.fields[0]
            .as_list()
            .ok_or_else(|| PackStreamError::InvalidStructure("Path nodes must be a list".into()))?
            .iter()
            .map(|v| {
                v.as_structure()
                    .ok_or_else(|| {
                        PackStreamError::InvalidStructure("Path node must be a structure".into())
                    })
                    .and_then(Node::from_structure)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let relationships = s.fields[1]
            .as_list()
            .ok_or_else(|| {
                PackStreamError::InvalidStructure("Path relationships must be a list".into())
            })?
            .iter()
            .map(|v| {
                v.as_structure()
                    .ok_or_else(|| {
                        PackStreamError::InvalidStructure(
                            "Path relationship must be a structure".into(),
                        )
                    })
                    .and_then(UnboundRelationship::from_structure)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let sequence = s.fields[2]
            .as_list()
            .ok_or_else(|| {
                PackStreamError::InvalidStructure("Path sequence must be a list".into())
            })?
            .iter()
            .map(|v| {
                v.as_int().ok_or_else(|| {
                    PackStreamError::InvalidStructure("Path sequence entry must be an int".into())
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            nodes,
            relationships,
            sequence,
        })
    }
}

/// A decoded graph structure of any kind.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphStruct {
    Node(Node),
    Relationship(Relationship),
    UnboundRelationship(UnboundRelationship),
    Path(Path),
}

impl GraphStruct {
    /// Dispatch on the structure signature. Signatures outside the graph
    /// vocabulary fail with `UnknownStructSignature`.
    pub fn from_structure(s: &Structure) -> Result<Self, PackStreamError> {
        match s.signature {
            NODE => Node::from_structure(s).map(GraphStruct::Node),
            RELATIONSHIP => Relationship::from_structure(s).map(GraphStruct::Relationship),
            UNBOUND_RELATIONSHIP => {
                UnboundRelationship::from_structure(s).map(GraphStruct::UnboundRelationship)
            }
            PATH => Path::from_structure(s).map(GraphStruct::Path),
            other => Err(PackStreamError::UnknownStructSignature(other)),
        }
    }
}

fn expect_signature(s: &Structure, expected: u8, what: &str) -> Result<(), PackStreamError> {
    if s.signature != expected {
        return Err(PackStreamError::InvalidStructure(format!(
            "expected {what} signature 0x{expected:02X}, got 0x{:02X}",
            s.signature
        )));
    }
    Ok(())
}

fn int_field(s: &Structure, index: usize, what: &str) -> Result<i64, PackStreamError> {
    s.fields[index]
        .as_int()
        .ok_or_else(|| PackStreamError::InvalidStructure(format!("{what} must be an integer")))
}

fn string_field(s: &Structure, index: usize, what: &str) -> Result<String, PackStreamError> {
    s.fields[index]
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| PackStreamError::InvalidStructure(format!("{what} must be a string")))
}

fn string_list_field(
    s: &Structure,
    index: usize,
    what: &str,
) -> Result<Vec<String>, PackStreamError> {
    let list = s.fields[index]
        .as_list()
        .ok_or_else(|| PackStreamError::InvalidStructure(format!("{what} must be a list")))?;
    list.iter()
        .map(|v| {
            v.as_str().map(str::to_owned).ok_or_else(|| {
                PackStreamError::InvalidStructure(format!("{what} entries must be strings"))
            })
        })
        .collect()
}

fn map_field(
    s: &Structure,
    index: usize,
    what: &str,
) -> Result<HashMap<String, Value>, PackStreamError> {
    s.fields[index]
        .as_map()
        .cloned()
        .ok_or_else(|| PackStreamError::InvalidStructure(format!("{what} must be a map")))
}

fn option_string(value: &Option<String>) -> Value {
    match value {
        Some(s) => Value::from(s.as_str()),
        None => Value::from(""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bolt::packstream::{decode, encode};

    fn props() -> HashMap<String, Value> {
        let mut m = HashMap::new();
        m.insert("name".to_owned(), Value::from("Alice"));
        m
    }

    #[test]
    fn node_roundtrip_legacy() {
        let node = Node::new(7, vec!["Person".into()], props());
        let bytes = encode(&node.to_value()).unwrap();
        let decoded = decode(&bytes).unwrap();
        let parsed = Node::from_structure(decoded.as_structure().unwrap()).unwrap();
        assert_eq!(parsed, node);
        assert_eq!(parsed.element_id, None);
    }

    #[test]
    fn node_roundtrip_with_element_id() {
        let node = Node::new(7, vec!["Person".into()], props()).with_element_id("4:abc:7");
        let bytes = encode(&node.to_value()).unwrap();
        let parsed =
            Node::from_structure(decode(&bytes).unwrap().as_structure().unwrap()).unwrap();
        assert_eq!(parsed.element_id.as_deref(), Some("4:abc:7"));
        assert_eq!(parsed, node);
    }

    #[test]
    fn node_rejects_wrong_field_count() {
        let s = Structure::new(NODE, vec![Value::Integer(1), Value::List(vec![])]);
        assert!(matches!(
            Node::from_structure(&s),
            Err(PackStreamError::InvalidStructure(_))
        ));
    }

    #[test]
    fn relationship_roundtrip_both_shapes() {
        let legacy = Relationship::new(1, 2, 3, "KNOWS", props());
        let parsed = Relationship::from_structure(
            decode(&encode(&legacy.to_value()).unwrap())
                .unwrap()
                .as_structure()
                .unwrap(),
        )
        .unwrap();
        assert_eq!(parsed, legacy);

        let modern = Relationship::new(1, 2, 3, "KNOWS", props()).with_element_ids(
            "5:x:1", "5:x:2", "5:x:3",
        );
        let parsed = Relationship::from_structure(
            decode(&encode(&modern.to_value()).unwrap())
                .unwrap()
                .as_structure()
                .unwrap(),
        )
        .unwrap();
        assert_eq!(parsed.start_node_element_id.as_deref(), Some("5:x:2"));
        assert_eq!(parsed, modern);
    }

    #[test]
    fn unbound_relationship_roundtrip() {
        let rel = UnboundRelationship::new(9, "LIKES", HashMap::new());
        let parsed = UnboundRelationship::from_structure(
            decode(&encode(&rel.to_value()).unwrap())
                .unwrap()
                .as_structure()
                .unwrap(),
        )
        .unwrap();
        assert_eq!(parsed, rel);

        let rel5 = rel.with_element_id("5:x:9");
        let parsed = UnboundRelationship::from_structure(
            decode(&encode(&rel5.to_value()).unwrap())
                .unwrap()
                .as_structure()
                .unwrap(),
        )
        .unwrap();
        assert_eq!(parsed.element_id.as_deref(), Some("5:x:9"));
    }

    #[test]
    fn path_roundtrip() {
        let path = Path::new(
            vec![
                Node::new(1, vec!["A".into()], HashMap::new()),
                Node::new(2, vec!["B".into()], HashMap::new()),
            ],
            vec![UnboundRelationship::new(10, "TO", HashMap::new())],
            vec![1, 1],
        );
        let parsed = Path::from_structure(
            decode(&encode(&path.to_value()).unwrap())
                .unwrap()
                .as_structure()
                .unwrap(),
        )
        .unwrap();
        assert_eq!(parsed, path);
    }

    #[test]
    fn graph_dispatch_by_signature() {
        let node = Node::new(1, vec![], HashMap::new());
        let s = node.to_value().into_structure().unwrap();
        assert!(matches!(
            GraphStruct::from_structure(&s),
            Ok(GraphStruct::Node(_))
        ));

        let unknown = Structure::new(0x5A, vec![]);
        assert!(matches!(
            GraphStruct::from_structure(&unknown),
            Err(PackStreamError::UnknownStructSignature(0x5A))
        ));
    }
}
