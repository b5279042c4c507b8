//! Mapping-driven conversion of tabular and XML records to RDF.
//!
//! A declarative mapping schema describes how each input record becomes a
//! small graph of typed resources, literals and edges. Each record is mapped
//! into its own graph and written out as one Turtle fragment.

mod error;
mod graph;
mod namespace;
mod processor;
mod record;
mod schema;
mod transducer;
mod vocabulary;

pub use error::{ProcessingMessage, ProcessingOutcome, ProcessingState, ProcessorError};
pub use graph::{Graph, Term, Triple, TurtleSerializer};
pub use namespace::{NamespaceTable, DEFAULT_PREFIX, RDF, RDF_TYPE, WELL_KNOWN_PREFIXES, XSD};
pub use processor::Processor;
pub use record::{
    expand_records, load_records, DataFormat, ExcelReader, Record, RecordNormalizer, XmlElement,
};
pub use schema::{
    Connection, DatatypeNode, MappingNode, MappingSchema, ResourceNode, Scalar, VocabularyBlock,
    BASIC_MAPPING, FULL_MAPPING,
};
pub use transducer::{build_literal, Transducer};
pub use vocabulary::VocabularyEmitter;
