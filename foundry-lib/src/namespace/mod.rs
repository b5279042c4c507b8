//! Namespace table and scoped-name resolution.
//!
//! The table is the single configuration object shared by every stage of the
//! pipeline. It is built once from the caller's base namespace and prefix and
//! is only read afterwards.

use std::collections::BTreeMap;

use crate::error::ProcessorError;

pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";

pub const DEFAULT_PREFIX: &str = "ex";

/// Prefixes every table carries regardless of the caller's namespace.
pub const WELL_KNOWN_PREFIXES: [(&str, &str); 16] = [
    ("geo", "http://www.opengis.net/ont/geosparql#"),
    ("geof", "http://www.opengis.net/def/function/geosparql/"),
    ("sf", "http://www.opengis.net/ont/sf#"),
    ("wd", "http://www.wikidata.org/entity/"),
    ("wdt", "http://www.wikidata.org/prop/direct/"),
    ("rdf", RDF),
    ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
    ("xsd", XSD),
    ("owl", "http://www.w3.org/2002/07/owl#"),
    ("time", "http://www.w3.org/2006/time#"),
    ("dbo", "http://dbpedia.org/ontology/"),
    ("ssn", "http://www.w3.org/ns/ssn/"),
    ("sosa", "http://www.w3.org/ns/sosa/"),
    ("cdt", "http://w3id.org/lindt/custom_datatypes#"),
    ("ex", "https://example.com/"),
    ("dcterms", "http://purl.org/dc/terms/"),
];

#[derive(Debug, Clone)]
pub struct NamespaceTable {
    prefixes: BTreeMap<String, String>,
    resource_prefix: String,
    ontology_prefix: String,
}

impl NamespaceTable {
    /// Build the table for `base_namespace`, registering `{prefix}-r` and
    /// `{prefix}-ont` alongside the well-known prefixes.
    pub fn new(base_namespace: &str, prefix: &str) -> Result<Self, ProcessorError> {
        let parsed = url::Url::parse(base_namespace).map_err(|e| {
            ProcessorError::InvalidConfiguration(format!(
                "Base namespace '{}' is not an absolute URI: {}",
                base_namespace, e
            ))
        })?;
        if parsed.cannot_be_a_base() {
            return Err(ProcessorError::InvalidConfiguration(format!(
                "Base namespace '{}' cannot be used as a base URI",
                base_namespace
            )));
        }
        if prefix.is_empty() || prefix.contains(':') {
            return Err(ProcessorError::InvalidConfiguration(format!(
                "Invalid namespace prefix '{}'",
                prefix
            )));
        }

        let mut prefixes: BTreeMap<String, String> = WELL_KNOWN_PREFIXES
            .iter()
            .map(|(p, ns)| (p.to_string(), ns.to_string()))
            .collect();

        let resource_prefix = format!("{}-r", prefix);
        let ontology_prefix = format!("{}-ont", prefix);
        prefixes.insert(
            resource_prefix.clone(),
            format!("{}lod/resource/", base_namespace),
        );
        prefixes.insert(
            ontology_prefix.clone(),
            format!("{}lod/ontology/", base_namespace),
        );

        tracing::debug!(
            "Namespace table built for {} ({} prefixes)",
            base_namespace,
            prefixes.len()
        );

        Ok(Self {
            prefixes,
            resource_prefix,
            ontology_prefix,
        })
    }

    pub fn resource_prefix(&self) -> &str {
        &self.resource_prefix
    }

    pub fn ontology_prefix(&self) -> &str {
        &self.ontology_prefix
    }

    pub fn namespace(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes
            .iter()
            .map(|(p, ns)| (p.as_str(), ns.as_str()))
    }

    /// Resolve `prefix:local` (or a bare `local` in the resource namespace)
    /// to a full identifier. The local part is concatenated as is.
    pub fn resolve(&self, scoped_name: &str) -> Result<String, ProcessorError> {
        let mut tokens = scoped_name.split(':');
        let (prefix, local) = match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(local), None, _) => (self.resource_prefix.as_str(), local),
            (Some(prefix), Some(local), None) => (prefix, local),
            _ => {
                tracing::error!("Malformed identifier found: {}", scoped_name);
                return Err(ProcessorError::MalformedIdentifier(scoped_name.to_string()));
            }
        };

        let namespace = self.prefixes.get(prefix).ok_or_else(|| {
            tracing::error!("Unknown prefix '{}' in '{}'", prefix, scoped_name);
            ProcessorError::UnknownPrefix {
                prefix: prefix.to_string(),
                name: scoped_name.to_string(),
            }
        })?;

        Ok(format!("{}{}", namespace, local))
    }

    /// Split an identifier against the longest matching namespace.
    pub fn compact<'a>(&'a self, iri: &'a str) -> Option<(&'a str, &'a str)> {
        self.prefixes
            .iter()
            .filter(|(_, ns)| iri.starts_with(ns.as_str()))
            .max_by_key(|(_, ns)| ns.len())
            .map(|(prefix, ns)| (prefix.as_str(), &iri[ns.len()..]))
    }
}
