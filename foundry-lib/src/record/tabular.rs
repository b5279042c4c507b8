use std::path::Path;

use super::Record;
use crate::error::ProcessorError;

/// One record per row, keyed by the header row.
///
/// Rows may be ragged: a short row leaves its trailing fields out of the
/// record and values past the last header are dropped.
pub(crate) fn read_csv_records(path: &Path) -> Result<Vec<Record>, ProcessorError> {
    let rdr = reader_builder().from_path(path)?;
    read_records(rdr)
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.flexible(true);
    builder
}

pub(crate) fn read_records<R: std::io::Read>(
    mut rdr: csv::Reader<R>,
) -> Result<Vec<Record>, ProcessorError> {
    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    tracing::debug!("CSV headers: {:?}", headers);

    let mut records = Vec::new();
    for result in rdr.records() {
        let row = result?;
        if row.len() != headers.len() {
            tracing::debug!(
                "Row {} has {} values for {} headers",
                records.len() + 1,
                row.len(),
                headers.len()
            );
        }
        records.push(
            headers
                .iter()
                .zip(row.iter())
                .map(|(h, v)| (h.clone(), v.to_string()))
                .collect(),
        );
    }
    Ok(records)
}
