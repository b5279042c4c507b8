mod node;
mod template;

pub use node::{Connection, DatatypeNode, MappingNode, ResourceNode, Scalar, VocabularyBlock};
pub use template::{BASIC_MAPPING, FULL_MAPPING};

use std::io::Read;
use std::path::PathBuf;

use serde_json::Value;

use crate::error::{ProcessingState, ProcessorError};
use crate::namespace::NamespaceTable;

/// A parsed mapping: the `root` tree applied to every record plus the
/// controlled vocabulary blocks declared under `cvs`.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingSchema {
    pub root: MappingNode,
    pub cvs: Vec<VocabularyBlock>,
    diagnostics: ProcessingState,
}

impl MappingSchema {
    pub fn from_file<P: Into<PathBuf>>(path: P) -> Result<Self, ProcessorError> {
        let path = path.into();
        tracing::info!("Loading mapping from {:?}", path);
        let mut contents = String::new();
        std::fs::File::open(&path)?.read_to_string(&mut contents)?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);
        let schema = match extension.as_deref() {
            Some("json") | Some("jsonc") | Some("jsonld") => Self::from_json_str(&contents)?,
            _ => Self::from_yaml_str(&contents)?,
        };
        tracing::info!("Successfully loaded mapping: {}", path.display());
        Ok(schema)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ProcessorError> {
        let document: Value = serde_yaml::from_str(contents)?;
        Self::from_value(&document)
    }

    /// Parse a JSON mapping; `//` and `/* */` comments are allowed.
    pub fn from_json_str(contents: &str) -> Result<Self, ProcessorError> {
        let stripped = json_comments::StripComments::new(contents.as_bytes());
        let document: Value = serde_json::from_reader(stripped)?;
        Self::from_value(&document)
    }

    pub fn from_value(document: &Value) -> Result<Self, ProcessorError> {
        let map = match document {
            Value::Object(map) => map,
            Value::Null => {
                return Err(ProcessorError::InvalidSchema(
                    "Mapping not properly loaded: document is empty".into(),
                ))
            }
            other => {
                return Err(ProcessorError::InvalidSchema(format!(
                    "Mapping document must be a mapping, found {}",
                    other
                )))
            }
        };

        let mut diagnostics = ProcessingState::new();
        let root = match map.get("root") {
            Some(root) => MappingNode::from_value(root, "root", &mut diagnostics)?,
            None => {
                tracing::error!("Missing root in mapping file, which is required");
                return Err(ProcessorError::MissingRootMapping);
            }
        };

        let cvs = match map.get("cvs") {
            Some(Value::Array(blocks)) => blocks
                .iter()
                .enumerate()
                .map(|(i, block)| VocabularyBlock::from_value(block, &format!("cvs[{}]", i)))
                .collect::<Result<Vec<_>, _>>()?,
            Some(Value::Null) | None => {
                tracing::info!("No CVs detected.");
                Vec::new()
            }
            Some(other) => {
                return Err(ProcessorError::InvalidSchema(format!(
                    "cvs: expected a list of vocabulary blocks, found {}",
                    other
                )))
            }
        };

        Ok(Self {
            root,
            cvs,
            diagnostics,
        })
    }

    /// Warnings raised while the mapping was loaded.
    pub fn diagnostics(&self) -> &ProcessingState {
        &self.diagnostics
    }

    /// Resolve every scoped name the mapping mentions against `namespaces`,
    /// failing on the first one that cannot be resolved.
    pub fn validate(&self, namespaces: &NamespaceTable) -> Result<(), ProcessorError> {
        tracing::info!("Validating mapping...");
        validate_node(&self.root, namespaces)?;

        for cv in &self.cvs {
            namespaces.resolve(&cv.type_)?;
            for instance in &cv.instances {
                namespaces.resolve(&cv.instance_name(instance))?;
            }
        }

        tracing::info!("Mapping validation successful");
        Ok(())
    }
}

fn validate_node(node: &MappingNode, namespaces: &NamespaceTable) -> Result<(), ProcessorError> {
    match node {
        MappingNode::Reference(name) => {
            namespaces.resolve(name)?;
        }
        MappingNode::Datatype(node) => {
            namespaces.resolve(&node.datatype)?;
            if let Some(fallback) = &node.fallback {
                validate_resource(fallback, namespaces)?;
            }
        }
        MappingNode::Resource(node) => validate_resource(node, namespaces)?,
    }
    Ok(())
}

fn validate_resource(node: &ResourceNode, namespaces: &NamespaceTable) -> Result<(), ProcessorError> {
    namespaces.resolve(&node.uri)?;
    for type_ in node.types.iter().flatten() {
        namespaces.resolve(type_)?;
    }
    for connection in &node.connections {
        for predicate in &connection.predicates {
            namespaces.resolve(predicate)?;
        }
        if let Some(inverse) = &connection.inverse {
            namespaces.resolve(inverse)?;
        }
        validate_node(&connection.object, namespaces)?;
    }
    Ok(())
}
