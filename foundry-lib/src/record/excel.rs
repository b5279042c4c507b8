use calamine::{Data, Range, Reader, Xlsx};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use super::Record;
use crate::error::ProcessorError;

pub struct ExcelReader<R: Read + Seek> {
    workbook: Xlsx<R>,
}

impl ExcelReader<BufReader<File>> {
    pub fn from_path(path: &Path) -> Result<Self, ProcessorError> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> ExcelReader<R> {
    pub fn new(reader: R) -> Result<Self, ProcessorError> {
        let workbook = Xlsx::new(reader)?;
        Ok(Self { workbook })
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names().to_vec()
    }

    pub fn sheet_records(&mut self, sheet_name: &str) -> Result<Vec<Record>, ProcessorError> {
        if !self.sheet_names().iter().any(|s| s == sheet_name) {
            return Err(ProcessorError::Excel(format!(
                "Sheet '{sheet_name}' not found in workbook"
            )));
        }
        let range = self.workbook.worksheet_range(sheet_name)?;
        Ok(range_to_records(&range))
    }

    pub fn first_sheet_records(&mut self) -> Result<Vec<Record>, ProcessorError> {
        let first = self
            .sheet_names()
            .into_iter()
            .next()
            .ok_or_else(|| ProcessorError::Excel("Workbook has no worksheets".into()))?;
        tracing::debug!("Reading records from worksheet '{}'", first);
        self.sheet_records(&first)
    }
}

/// First row is the header; every following row is one record.
fn range_to_records(range: &Range<Data>) -> Vec<Record> {
    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row.iter().map(|cell| cell.to_string()).collect(),
        None => return Vec::new(),
    };

    rows.map(|row| {
        headers
            .iter()
            .zip(row.iter())
            .map(|(h, cell)| (h.clone(), cell.to_string()))
            .collect()
    })
    .collect()
}
