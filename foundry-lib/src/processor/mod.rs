use std::path::{Path, PathBuf};

use crate::error::{ProcessingOutcome, ProcessingState, ProcessorError};
use crate::graph::{Graph, TurtleSerializer};
use crate::namespace::NamespaceTable;
use crate::record::{load_records, Record};
use crate::schema::MappingSchema;
use crate::transducer::Transducer;
use crate::vocabulary::VocabularyEmitter;

/// Drives one mapping over one data file: vocabulary fragments first, then
/// one fragment per record.
pub struct Processor {
    schema: MappingSchema,
    namespaces: NamespaceTable,
    output_path: PathBuf,
    processing_state: ProcessingState,
}

impl Processor {
    pub fn new<P: Into<PathBuf>>(
        schema: MappingSchema,
        namespaces: NamespaceTable,
        output_path: P,
    ) -> Self {
        let output_path = output_path.into();
        tracing::info!("Creating processor with output path: {:?}", output_path);
        let processing_state = schema.diagnostics().clone();
        Self {
            schema,
            namespaces,
            output_path,
            processing_state,
        }
    }

    pub fn schema(&self) -> &MappingSchema {
        &self.schema
    }

    pub fn namespaces(&self) -> &NamespaceTable {
        &self.namespaces
    }

    pub fn processing_state(&self) -> &ProcessingState {
        &self.processing_state
    }

    pub fn emit_vocabularies(&self) -> Result<Vec<Graph>, ProcessorError> {
        VocabularyEmitter::new(&self.namespaces).emit_all(&self.schema.cvs)
    }

    /// Map every record into its own graph without touching the filesystem.
    pub fn map_records(&mut self, records: &[Record]) -> Result<Vec<Graph>, ProcessorError> {
        let mut transducer = Transducer::new(&self.namespaces);
        let mut graphs = Vec::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            let mut graph = Graph::new();
            transducer
                .apply(record, &self.schema.root, &mut graph)
                .map_err(|e| {
                    tracing::error!("Failed to map record {}: {}", i, e);
                    e
                })?;
            graphs.push(graph);
        }
        self.processing_state
            .merge(transducer.take_processing_state());
        Ok(graphs)
    }

    pub async fn process(&mut self, data_path: &Path) -> Result<ProcessingOutcome, ProcessorError> {
        tracing::info!("Starting processing of {}", data_path.display());
        let base = data_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("data")
            .to_string();

        let records = load_records(data_path, &self.schema.root)?;
        let serializer = TurtleSerializer::new(&self.namespaces);

        tracing::info!("Processing controlled vocabularies...");
        for (i, graph) in self.emit_vocabularies()?.iter().enumerate() {
            serializer
                .save_fragment(graph, &self.output_path, &format!("output-cv-{}-{}.ttl", base, i))
                .await?;
        }

        tracing::info!("Processing {} records...", records.len());
        let mut transducer = Transducer::new(&self.namespaces);
        for (i, record) in records.iter().enumerate() {
            let mut graph = Graph::new();
            transducer
                .apply(record, &self.schema.root, &mut graph)
                .map_err(|e| {
                    tracing::error!("Failed to map record {} of {}: {}", i, data_path.display(), e);
                    e
                })?;
            serializer
                .save_fragment(&graph, &self.output_path, &format!("output-{}-{}.ttl", base, i))
                .await?;
        }
        self.processing_state
            .merge(transducer.take_processing_state());

        tracing::info!("Processing completed successfully");
        let seed = self.schema.diagnostics().clone();
        Ok(ProcessingOutcome::from_state(std::mem::replace(
            &mut self.processing_state,
            seed,
        )))
    }
}
