//! Walks a mapping tree alongside one record and appends the resulting
//! assertions to a graph.

mod literal;

pub use literal::build_literal;

use crate::error::{ProcessingState, ProcessorError};
use crate::graph::{Graph, Term};
use crate::namespace::{NamespaceTable, RDF_TYPE};
use crate::record::Record;
use crate::schema::{MappingNode, ResourceNode};

pub struct Transducer<'a> {
    namespaces: &'a NamespaceTable,
    processing_state: ProcessingState,
}

impl<'a> Transducer<'a> {
    pub fn new(namespaces: &'a NamespaceTable) -> Self {
        Self {
            namespaces,
            processing_state: ProcessingState::new(),
        }
    }

    pub fn namespaces(&self) -> &NamespaceTable {
        self.namespaces
    }

    pub fn processing_state(&self) -> &ProcessingState {
        &self.processing_state
    }

    pub fn take_processing_state(&mut self) -> ProcessingState {
        std::mem::take(&mut self.processing_state)
    }

    /// Interpret `node` against `record`, returning the identifier or literal
    /// it denotes. Assertions for resource nodes and their connections are
    /// appended to `graph`; references and literals leave it untouched.
    pub fn apply(
        &mut self,
        record: &Record,
        node: &MappingNode,
        graph: &mut Graph,
    ) -> Result<Term, ProcessorError> {
        match node {
            MappingNode::Reference(name) => Ok(Term::iri(self.namespaces.resolve(name)?)),
            MappingNode::Datatype(datatype) => {
                if let Some(literal) = build_literal(datatype, record, self.namespaces)? {
                    return Ok(literal);
                }
                let fallback = datatype.fallback.as_deref().ok_or_else(|| {
                    ProcessorError::MissingLiteralSource {
                        datatype: datatype.datatype.clone(),
                    }
                })?;
                let message = format!(
                    "Datatype node ({}) has no value for this record, minting '{}' as a resource instead",
                    datatype.datatype, fallback.uri
                );
                tracing::warn!("{}", message);
                self.processing_state
                    .add_warning(message, Some("datatype_fallback".to_string()));
                self.apply_resource(record, fallback, graph)
            }
            MappingNode::Resource(resource) => self.apply_resource(record, resource, graph),
        }
    }

    fn apply_resource(
        &mut self,
        record: &Record,
        node: &ResourceNode,
        graph: &mut Graph,
    ) -> Result<Term, ProcessorError> {
        let subject = Term::iri(self.mint_identifier(record, node)?);

        match &node.types {
            Some(types) => {
                for type_ in types {
                    let type_iri = self.namespaces.resolve(type_)?;
                    graph.add_triple(subject.clone(), RDF_TYPE, Term::iri(type_iri));
                }
            }
            None if !node.is_ref => {
                let message = format!("Untyped instance created: {}", subject);
                tracing::warn!("{}", message);
                self.processing_state
                    .add_warning(message, Some("untyped_instance".to_string()));
            }
            None => {}
        }

        for connection in &node.connections {
            let target = self.apply(record, &connection.object, graph)?;
            for predicate in &connection.predicates {
                let predicate = self.namespaces.resolve(predicate)?;
                graph.add_triple(subject.clone(), predicate, target.clone());
            }
            if let Some(inverse) = &connection.inverse {
                let inverse = self.namespaces.resolve(inverse)?;
                graph.add_triple(target, inverse, subject.clone());
            }
        }

        Ok(subject)
    }

    /// Resolve the node's `uri` and extend it with each varid value
    /// (percent-encoded) and then the appellation, each after a `.`.
    pub fn mint_identifier(
        &self,
        record: &Record,
        node: &ResourceNode,
    ) -> Result<String, ProcessorError> {
        let mut identifier = self.namespaces.resolve(&node.uri)?;
        for varid in &node.varids {
            let value = record.get(varid).ok_or_else(|| ProcessorError::MissingVarid {
                varid: varid.clone(),
                uri: node.uri.clone(),
            })?;
            identifier.push('.');
            identifier.push_str(&urlencoding::encode(value));
        }
        if let Some(appellation) = &node.appellation {
            identifier.push('.');
            identifier.push_str(appellation);
        }
        Ok(identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Triple;
    use crate::namespace::XSD;
    use serde_json::{json, Value};

    const BASE: &str = "https://example.org/";

    fn table() -> NamespaceTable {
        NamespaceTable::new(BASE, "ex").unwrap()
    }

    fn node(value: Value) -> MappingNode {
        MappingNode::from_value(&value, "root", &mut ProcessingState::new()).unwrap()
    }

    fn record(fields: &[(&str, &str)]) -> Record {
        fields.iter().copied().collect()
    }

    fn resource(id: &str) -> Term {
        Term::iri(format!("{}lod/resource/{}", BASE, id))
    }

    fn ontology(name: &str) -> String {
        format!("{}lod/ontology/{}", BASE, name)
    }

    #[test]
    fn test_mint_event_with_single_type() {
        let ns = table();
        let mut transducer = Transducer::new(&ns);
        let mut graph = Graph::new();
        let term = transducer
            .apply(
                &record(&[("id", "42")]),
                &node(json!({"uri": "ex:Event", "varids": ["id"], "type": "ex:Earthquake"})),
                &mut graph,
            )
            .unwrap();

        let expected = Term::iri("https://example.com/Event.42");
        assert_eq!(term, expected);
        assert_eq!(graph.len(), 1);
        assert!(graph.contains(&Triple::new(
            expected,
            RDF_TYPE,
            Term::iri("https://example.com/Earthquake")
        )));
        assert!(!transducer.processing_state().has_warnings());
    }

    #[test]
    fn test_datatype_node_adds_no_assertions() {
        let ns = table();
        let mut transducer = Transducer::new(&ns);
        let mut graph = Graph::new();
        let term = transducer
            .apply(
                &record(&[("mag", "5.6")]),
                &node(json!({"datatype": "xsd:decimal", "val_source": "mag"})),
                &mut graph,
            )
            .unwrap();
        assert_eq!(term, Term::typed("5.6", format!("{}decimal", XSD)));
        assert!(graph.is_empty());
    }

    #[test]
    fn test_reference_resolves_without_mutation() {
        let ns = table();
        let mut transducer = Transducer::new(&ns);
        let mut graph = Graph::new();
        let term = transducer
            .apply(&Record::new(), &node(json!("ex-r:Category.A")), &mut graph)
            .unwrap();
        assert_eq!(term, resource("Category.A"));
        assert!(graph.is_empty());
    }

    #[test]
    fn test_varids_are_percent_encoded_then_appellation() {
        let ns = table();
        let transducer = Transducer::new(&ns);
        let MappingNode::Resource(place) = node(json!({
            "uri": "Place",
            "varids": ["place", "net"],
            "appellation": "geometry",
        })) else {
            panic!("expected resource node");
        };
        let id = transducer
            .mint_identifier(&record(&[("place", "San Diego/CA"), ("net", "us")]), &place)
            .unwrap();
        assert_eq!(
            id,
            format!("{}lod/resource/Place.San%20Diego%2FCA.us.geometry", BASE)
        );
    }

    #[test]
    fn test_appellation_without_varids() {
        let ns = table();
        let transducer = Transducer::new(&ns);
        let MappingNode::Resource(n) = node(json!({"uri": "Dataset", "appellation": "usgs"})) else {
            panic!("expected resource node");
        };
        assert_eq!(
            transducer.mint_identifier(&Record::new(), &n).unwrap(),
            format!("{}lod/resource/Dataset.usgs", BASE)
        );
    }

    #[test]
    fn test_missing_varid_is_fatal() {
        let ns = table();
        let mut transducer = Transducer::new(&ns);
        let mut graph = Graph::new();
        let err = transducer
            .apply(
                &record(&[("id", "1")]),
                &node(json!({"uri": "Event", "varids": ["id", "net"], "type": "ex:Event"})),
                &mut graph,
            )
            .unwrap_err();
        assert!(matches!(err, ProcessorError::MissingVarid { varid, .. } if varid == "net"));
    }

    #[test]
    fn test_type_string_equals_one_element_list() {
        let ns = table();
        let rec = record(&[("id", "7")]);
        let mut single = Graph::new();
        let mut listed = Graph::new();
        Transducer::new(&ns)
            .apply(&rec, &node(json!({"uri": "Event", "varids": ["id"], "type": "ex:Quake"})), &mut single)
            .unwrap();
        Transducer::new(&ns)
            .apply(&rec, &node(json!({"uri": "Event", "varids": ["id"], "type": ["ex:Quake"]})), &mut listed)
            .unwrap();
        assert_eq!(single.len(), 1);
        assert_eq!(single.triples(), listed.triples());
    }

    #[test]
    fn test_multiple_types() {
        let ns = table();
        let mut graph = Graph::new();
        Transducer::new(&ns)
            .apply(
                &record(&[("place", "p1")]),
                &node(json!({"uri": "Place", "varids": ["place"], "type": ["ex-ont:Place", "geo:Feature"]})),
                &mut graph,
            )
            .unwrap();
        assert_eq!(graph.len(), 2);
        assert!(graph.iter().all(|t| t.predicate == RDF_TYPE));
    }

    #[test]
    fn test_untyped_instance_warns_unless_ref() {
        let ns = table();
        let mut graph = Graph::new();

        let mut transducer = Transducer::new(&ns);
        transducer
            .apply(&record(&[("id", "1")]), &node(json!({"uri": "Thing", "varids": ["id"]})), &mut graph)
            .unwrap();
        let state = transducer.take_processing_state();
        assert_eq!(state.get_warnings().len(), 1);
        assert_eq!(state.get_warnings()[0].source.as_deref(), Some("untyped_instance"));
        assert!(!transducer.processing_state().has_warnings());

        let mut transducer = Transducer::new(&ns);
        transducer
            .apply(
                &record(&[("id", "1")]),
                &node(json!({"uri": "Thing", "varids": ["id"], "ref": true})),
                &mut graph,
            )
            .unwrap();
        assert!(!transducer.processing_state().has_warnings());
        assert!(graph.is_empty());
    }

    #[test]
    fn test_connections_with_inverse() {
        let ns = table();
        let mut graph = Graph::new();
        let mapping = node(json!({
            "uri": "Event",
            "varids": ["id"],
            "type": "ex-ont:Event",
            "connections": [
                {
                    "p": ["ex-ont:locatedIn", "geo:sfWithin"],
                    "inv": "ex-ont:locationOf",
                    "o": {"uri": "Place", "varids": ["place"], "type": "ex-ont:Place"}
                },
                {"p": "ex-ont:hasMagnitude", "o": {"datatype": "xsd:decimal", "val_source": "mag"}}
            ]
        }));
        let event = Transducer::new(&ns)
            .apply(&record(&[("id", "e1"), ("place", "Kern"), ("mag", "3.1")]), &mapping, &mut graph)
            .unwrap();
        let place = resource("Place.Kern");
        assert_eq!(event, resource("Event.e1"));

        for predicate in [ontology("locatedIn"), "http://www.opengis.net/ont/geosparql#sfWithin".to_string()] {
            assert!(graph.contains(&Triple::new(event.clone(), predicate, place.clone())));
        }
        assert!(graph.contains(&Triple::new(place.clone(), ontology("locationOf"), event.clone())));
        assert!(graph.contains(&Triple::new(
            event.clone(),
            ontology("hasMagnitude"),
            Term::typed("3.1", format!("{}decimal", XSD))
        )));
        // two types, two forward edges, one inverse, one literal edge
        assert_eq!(graph.len(), 6);
    }

    #[test]
    fn test_literals_never_become_subjects() {
        let ns = table();
        let mut graph = Graph::new();
        let mapping = node(json!({
            "uri": "Event",
            "varids": ["id"],
            "type": "ex-ont:Event",
            "connections": [
                {"p": "ex-ont:hasMagnitude", "o": {"datatype": "xsd:decimal", "val_source": "mag"}},
                {"p": "ex-ont:hasSource", "o": {"datatype": "xsd:string", "value": "USGS"}}
            ]
        }));
        Transducer::new(&ns)
            .apply(&record(&[("id", "1"), ("mag", "2.0")]), &mapping, &mut graph)
            .unwrap();
        assert!(graph.subjects().all(Term::is_iri));
    }

    #[test]
    fn test_falsy_literal_falls_back_to_resource() {
        // A datatype node whose value is empty is silently reinterpreted as
        // a resource node when it also carries a `uri`.
        let ns = table();
        let mut graph = Graph::new();
        let mut transducer = Transducer::new(&ns);
        let mapping = node(json!({
            "datatype": "xsd:decimal",
            "val_source": "depth",
            "value": 0,
            "uri": "Depth",
            "varids": ["id"],
            "type": "ex-ont:Depth"
        }));
        let term = transducer
            .apply(&record(&[("id", "9"), ("depth", "")]), &mapping, &mut graph)
            .unwrap();
        assert_eq!(term, resource("Depth.9"));
        assert_eq!(graph.len(), 1);
        assert_eq!(
            transducer.processing_state().get_warnings()[0].source.as_deref(),
            Some("datatype_fallback")
        );

        // Same node with a real value stays a literal.
        let term = transducer
            .apply(&record(&[("id", "9"), ("depth", "10")]), &mapping, &mut graph)
            .unwrap();
        assert!(term.is_literal());
    }

    #[test]
    fn test_falsy_literal_without_fallback_is_fatal() {
        let ns = table();
        let mut graph = Graph::new();
        let err = Transducer::new(&ns)
            .apply(
                &record(&[("mag", "")]),
                &node(json!({"datatype": "xsd:decimal", "val_source": "mag"})),
                &mut graph,
            )
            .unwrap_err();
        assert!(matches!(err, ProcessorError::MissingLiteralSource { .. }));
    }

    #[test]
    fn test_application_is_deterministic() {
        let ns = table();
        let mapping = node(json!({
            "uri": "Event",
            "varids": ["id"],
            "type": ["ex-ont:Event", "ex-ont:Hazard"],
            "connections": [
                {"p": "ex-ont:in", "inv": "ex-ont:has", "o": {"uri": "Place", "varids": ["place"], "ref": true}},
                {"p": "ex-ont:mag", "o": {"datatype": "xsd:decimal", "val_source": "mag"}}
            ]
        }));
        let rec = record(&[("id", "a b"), ("place", "x"), ("mag", "1")]);
        let mut first = Graph::new();
        let mut second = Graph::new();
        Transducer::new(&ns).apply(&rec, &mapping, &mut first).unwrap();
        Transducer::new(&ns).apply(&rec, &mapping, &mut second).unwrap();
        assert_eq!(first.triples(), second.triples());
    }

    #[test]
    fn test_unknown_prefix_aborts() {
        let ns = table();
        let mut graph = Graph::new();
        let err = Transducer::new(&ns)
            .apply(&Record::new(), &node(json!({"uri": "nope:Thing", "ref": true})), &mut graph)
            .unwrap_err();
        assert!(matches!(err, ProcessorError::UnknownPrefix { .. }));
    }
}
