//! Flat records and the sources that produce them.
//!
//! The transducer only understands flat `field -> value` records. Tabular
//! sources map one row to one record; XML documents go through the
//! [`RecordNormalizer`], which may expand a single document into several
//! records.

mod excel;
mod normalizer;
mod tabular;
mod xml;

pub use self::excel::ExcelReader;
pub use self::normalizer::{expand_records, RecordNormalizer};
pub use self::xml::XmlElement;

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::ProcessorError;
use crate::schema::MappingNode;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Record {
    fields: BTreeMap<String, String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.fields.insert(field.into(), value.into())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Csv,
    Xml,
    Excel,
}

impl DataFormat {
    /// `.xml` and `.xlsx`/`.xlsm` are recognised; everything else is read as CSV.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("xml") => DataFormat::Xml,
            Some("xlsx") | Some("xlsm") => DataFormat::Excel,
            _ => DataFormat::Csv,
        }
    }
}

/// Read every record of `path`. `root` drives field discovery for XML input.
pub fn load_records(path: &Path, root: &MappingNode) -> Result<Vec<Record>, ProcessorError> {
    let format = DataFormat::from_path(path);
    tracing::info!("Opening: {} ({:?})", path.display(), format);
    let records = match format {
        DataFormat::Csv => tabular::read_csv_records(path)?,
        DataFormat::Xml => {
            let contents = std::fs::read_to_string(path)?;
            let document = XmlElement::parse(&contents)?;
            RecordNormalizer::new(root).normalize(&document)
        }
        DataFormat::Excel => ExcelReader::from_path(path)?.first_sheet_records()?,
    };
    tracing::info!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}
