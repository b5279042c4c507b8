use crate::error::ProcessorError;
use crate::graph::{Graph, Term};
use crate::namespace::{NamespaceTable, RDF_TYPE};
use crate::schema::VocabularyBlock;

/// Emits the closed sets of typed constants declared under `cvs`.
///
/// No record is consulted: every instance of a block becomes one
/// `(stem.instance, rdf:type, type)` assertion.
pub struct VocabularyEmitter<'a> {
    namespaces: &'a NamespaceTable,
}

impl<'a> VocabularyEmitter<'a> {
    pub fn new(namespaces: &'a NamespaceTable) -> Self {
        Self { namespaces }
    }

    pub fn emit(&self, block: &VocabularyBlock) -> Result<Graph, ProcessorError> {
        let type_iri = Term::iri(self.namespaces.resolve(&block.type_)?);
        let mut graph = Graph::new();
        for instance in &block.instances {
            let instance_iri = self.namespaces.resolve(&block.instance_name(instance))?;
            graph.add_triple(Term::iri(instance_iri), RDF_TYPE, type_iri.clone());
        }
        tracing::debug!(
            "Emitted {} instances of {} for vocabulary {}",
            graph.len(),
            block.type_,
            block.uri
        );
        Ok(graph)
    }

    /// One graph per block, in declaration order.
    pub fn emit_all(&self, blocks: &[VocabularyBlock]) -> Result<Vec<Graph>, ProcessorError> {
        blocks.iter().map(|block| self.emit(block)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Triple;

    fn table() -> NamespaceTable {
        NamespaceTable::new("https://example.org/", "ex").unwrap()
    }

    fn block(instances: &[&str]) -> VocabularyBlock {
        VocabularyBlock {
            type_: "ex:Category".to_string(),
            uri: "ex-r:Cat".to_string(),
            instances: instances.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_each_instance_is_typed() {
        let ns = table();
        let graph = VocabularyEmitter::new(&ns).emit(&block(&["A", "B"])).unwrap();
        assert_eq!(graph.len(), 2);
        for id in ["Cat.A", "Cat.B"] {
            assert!(graph.contains(&Triple::new(
                Term::iri(format!("https://example.org/lod/resource/{}", id)),
                RDF_TYPE,
                Term::iri("https://example.com/Category"),
            )));
        }
    }

    #[test]
    fn test_no_blocks_emit_nothing() {
        let ns = table();
        assert!(VocabularyEmitter::new(&ns).emit_all(&[]).unwrap().is_empty());
        assert!(VocabularyEmitter::new(&ns).emit(&block(&[])).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_type_prefix() {
        let ns = table();
        let mut bad = block(&["A"]);
        bad.type_ = "nope:Category".to_string();
        assert!(matches!(
            VocabularyEmitter::new(&ns).emit(&bad),
            Err(ProcessorError::UnknownPrefix { .. })
        ));
    }
}
