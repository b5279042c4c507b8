use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::error::{ProcessingState, ProcessorError};

/// A scalar carried verbatim from the mapping document.
#[derive(Debug, Clone, PartialEq)]
pub struct Scalar {
    lexical: String,
    truthy: bool,
}

impl Scalar {
    pub fn new(lexical: impl Into<String>) -> Self {
        let lexical = lexical.into();
        let truthy = !lexical.is_empty();
        Self { lexical, truthy }
    }

    pub fn as_str(&self) -> &str {
        &self.lexical
    }

    /// Empty strings, numeric zero and `false` are falsy.
    pub fn is_truthy(&self) -> bool {
        self.truthy
    }

    fn from_value(value: &Value, path: &str) -> Result<Option<Self>, ProcessorError> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(Scalar::new(s.as_str()))),
            Value::Bool(b) => Ok(Some(Scalar {
                lexical: b.to_string(),
                truthy: *b,
            })),
            Value::Number(n) => Ok(Some(Scalar {
                lexical: n.to_string(),
                truthy: n.as_f64().is_some_and(|f| f != 0.0),
            })),
            _ => Err(ProcessorError::InvalidSchema(format!(
                "{}: expected a scalar value, found {}",
                path, value
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MappingNode {
    /// A bare scoped name linking to an existing identifier.
    Reference(String),
    Datatype(DatatypeNode),
    Resource(ResourceNode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatatypeNode {
    pub datatype: String,
    pub val_source: Option<String>,
    pub value: Option<Scalar>,
    /// Resource interpretation used when neither literal source is truthy.
    pub fallback: Option<Box<ResourceNode>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceNode {
    pub uri: String,
    pub varids: Vec<String>,
    pub appellation: Option<String>,
    /// `None` when the node declares no `type` at all.
    pub types: Option<Vec<String>>,
    pub is_ref: bool,
    pub connections: Vec<Connection>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub object: MappingNode,
    pub predicates: Vec<String>,
    pub inverse: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VocabularyBlock {
    pub type_: String,
    pub uri: String,
    pub instances: Vec<String>,
}

impl MappingNode {
    /// Normalise one raw mapping node. Non-fatal authoring problems are
    /// recorded in `diagnostics`.
    pub(crate) fn from_value(
        value: &Value,
        path: &str,
        diagnostics: &mut ProcessingState,
    ) -> Result<Self, ProcessorError> {
        match value {
            Value::String(name) => Ok(MappingNode::Reference(name.clone())),
            Value::Object(map) if map.contains_key("datatype") => Ok(MappingNode::Datatype(
                DatatypeNode::from_map(map, path, diagnostics)?,
            )),
            Value::Object(map) => Ok(MappingNode::Resource(ResourceNode::from_map(
                map,
                path,
                diagnostics,
            )?)),
            other => Err(ProcessorError::InvalidSchema(format!(
                "{}: mapping node must be a string or a mapping, found {}",
                path, other
            ))),
        }
    }

    /// Every `varids` field name referenced in this subtree.
    pub fn varid_fields(&self) -> BTreeSet<String> {
        let mut fields = BTreeSet::new();
        self.walk(&mut |node| {
            if let Some(resource) = node {
                fields.extend(resource.varids.iter().cloned());
            }
        });
        fields
    }

    /// Every `val_source` field name referenced in this subtree.
    pub fn val_source_fields(&self) -> BTreeSet<String> {
        let mut fields = BTreeSet::new();
        self.collect_val_sources(&mut fields);
        fields
    }

    fn collect_val_sources(&self, fields: &mut BTreeSet<String>) {
        match self {
            MappingNode::Reference(_) => {}
            MappingNode::Datatype(node) => {
                if let Some(val_source) = &node.val_source {
                    fields.insert(val_source.clone());
                }
                if let Some(fallback) = &node.fallback {
                    for connection in &fallback.connections {
                        connection.object.collect_val_sources(fields);
                    }
                }
            }
            MappingNode::Resource(node) => {
                for connection in &node.connections {
                    connection.object.collect_val_sources(fields);
                }
            }
        }
    }

    fn walk(&self, visit: &mut impl FnMut(Option<&ResourceNode>)) {
        let resource = match self {
            MappingNode::Reference(_) => None,
            MappingNode::Datatype(node) => node.fallback.as_deref(),
            MappingNode::Resource(node) => Some(node),
        };
        visit(resource);
        if let Some(resource) = resource {
            for connection in &resource.connections {
                connection.object.walk(&mut *visit);
            }
        }
    }
}

impl DatatypeNode {
    fn from_map(
        map: &Map<String, Value>,
        path: &str,
        diagnostics: &mut ProcessingState,
    ) -> Result<Self, ProcessorError> {
        let datatype = required_string(map, "datatype", path)?;
        let val_source = optional_string(map, "val_source", path)?;
        let value = match map.get("value") {
            Some(value) => Scalar::from_value(value, &format!("{}.value", path))?,
            None => None,
        };

        let fallback = if map.contains_key("uri") {
            Some(Box::new(ResourceNode::from_map(map, path, diagnostics)?))
        } else {
            None
        };

        if map.contains_key("connections") {
            let message = if fallback.is_some() {
                format!(
                    "{}: connections on a datatype node only apply when it falls back to a resource",
                    path
                )
            } else {
                format!("{}: connections on a datatype node are ignored", path)
            };
            tracing::warn!("{}", message);
            diagnostics.add_warning(message, Some("datatype_connections".to_string()));
        }

        Ok(Self {
            datatype,
            val_source,
            value,
            fallback,
        })
    }
}

impl ResourceNode {
    fn from_map(
        map: &Map<String, Value>,
        path: &str,
        diagnostics: &mut ProcessingState,
    ) -> Result<Self, ProcessorError> {
        let uri = map
            .get("uri")
            .ok_or_else(|| {
                ProcessorError::InvalidSchema(format!(
                    "{}: mapping node requires either 'uri' or 'datatype'",
                    path
                ))
            })
            .and_then(|v| expect_string(v, &format!("{}.uri", path)))?;

        let varids = match map.get("varids") {
            Some(v) => string_or_list(v, &format!("{}.varids", path))?,
            None => Vec::new(),
        };

        let appellation = match map.get("appellation") {
            Some(v) => Scalar::from_value(v, &format!("{}.appellation", path))?
                .map(|s| s.as_str().to_string()),
            None => None,
        };

        let types = match map.get("type") {
            Some(v) => Some(string_or_list(v, &format!("{}.type", path))?),
            None => None,
        };

        let is_ref = match map.get("ref") {
            Some(v) => Scalar::from_value(v, &format!("{}.ref", path))?
                .is_some_and(|s| s.is_truthy()),
            None => false,
        };

        let connections = match map.get("connections") {
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    Connection::from_value(
                        item,
                        &format!("{}.connections[{}]", path, i),
                        diagnostics,
                    )
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(Value::Null) | None => Vec::new(),
            Some(other) => {
                return Err(ProcessorError::InvalidSchema(format!(
                    "{}.connections: expected a list, found {}",
                    path, other
                )))
            }
        };

        Ok(Self {
            uri,
            varids,
            appellation,
            types,
            is_ref,
            connections,
        })
    }
}

impl Connection {
    fn from_value(
        value: &Value,
        path: &str,
        diagnostics: &mut ProcessingState,
    ) -> Result<Self, ProcessorError> {
        let map = value.as_object().ok_or_else(|| {
            ProcessorError::InvalidSchema(format!(
                "{}: connection must be a mapping with 'o' and 'p'",
                path
            ))
        })?;

        let object = map
            .get("o")
            .ok_or_else(|| ProcessorError::InvalidSchema(format!("{}: missing 'o'", path)))
            .and_then(|o| MappingNode::from_value(o, &format!("{}.o", path), diagnostics))?;

        let predicates = map
            .get("p")
            .ok_or_else(|| ProcessorError::InvalidSchema(format!("{}: missing 'p'", path)))
            .and_then(|p| string_or_list(p, &format!("{}.p", path)))?;

        let inverse = optional_string(map, "inv", path)?;

        Ok(Self {
            object,
            predicates,
            inverse,
        })
    }
}

/// Wire shape of a `cvs` entry before instances are normalised.
#[derive(Deserialize)]
struct RawVocabularyBlock {
    #[serde(rename = "type")]
    type_: String,
    uri: String,
    instances: Vec<Value>,
}

impl VocabularyBlock {
    pub(crate) fn from_value(value: &Value, path: &str) -> Result<Self, ProcessorError> {
        let raw: RawVocabularyBlock = serde_json::from_value(value.clone()).map_err(|e| {
            ProcessorError::InvalidSchema(format!(
                "{}: vocabulary block must be a mapping with 'type', 'uri' and 'instances' ({})",
                path, e
            ))
        })?;

        let instances = raw
            .instances
            .iter()
            .enumerate()
            .filter_map(|(i, item)| {
                Scalar::from_value(item, &format!("{}.instances[{}]", path, i))
                    .map(|s| s.map(|s| s.as_str().to_string()))
                    .transpose()
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            type_: raw.type_,
            uri: raw.uri,
            instances,
        })
    }

    /// Scoped name minted for one instance of the block.
    pub fn instance_name(&self, instance: &str) -> String {
        format!("{}.{}", self.uri, instance)
    }
}

fn expect_string(value: &Value, path: &str) -> Result<String, ProcessorError> {
    value.as_str().map(str::to_string).ok_or_else(|| {
        ProcessorError::InvalidSchema(format!("{}: expected a string, found {}", path, value))
    })
}

fn required_string(
    map: &Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<String, ProcessorError> {
    let value = map
        .get(key)
        .ok_or_else(|| ProcessorError::InvalidSchema(format!("{}: missing '{}'", path, key)))?;
    expect_string(value, &format!("{}.{}", path, key))
}

fn optional_string(
    map: &Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<Option<String>, ProcessorError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => expect_string(value, &format!("{}.{}", path, key)).map(Some),
    }
}

fn string_or_list(value: &Value, path: &str) -> Result<Vec<String>, ProcessorError> {
    match value {
        Value::String(s) => Ok(vec![s.clone()]),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::String(s) => Ok(s.clone()),
                Value::Number(n) => Ok(n.to_string()),
                other => Err(ProcessorError::InvalidSchema(format!(
                    "{}[{}]: expected a string, found {}",
                    path, i, other
                ))),
            })
            .collect(),
        other => Err(ProcessorError::InvalidSchema(format!(
            "{}: expected a string or a list of strings, found {}",
            path, other
        ))),
    }
}
