use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("XML error: {0}")]
    Xml(String),
    #[error("Excel error: {0}")]
    Excel(String),
    #[error("Malformed identifier '{0}': expected 'prefix:local' or a bare local name")]
    MalformedIdentifier(String),
    #[error("Unknown prefix '{prefix}' in '{name}'")]
    UnknownPrefix { prefix: String, name: String },
    #[error("Variable ID '{varid}' missing from data record (minting '{uri}')")]
    MissingVarid { varid: String, uri: String },
    #[error("Datatype node ({datatype}) has no usable 'val_source' or 'value' for this record")]
    MissingLiteralSource { datatype: String },
    #[error("Missing root in mapping file, which is required")]
    MissingRootMapping,
    #[error("Invalid mapping schema: {0}")]
    InvalidSchema(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl From<quick_xml::Error> for ProcessorError {
    fn from(e: quick_xml::Error) -> Self {
        ProcessorError::Xml(e.to_string())
    }
}

impl From<calamine::XlsxError> for ProcessorError {
    fn from(e: calamine::XlsxError) -> Self {
        ProcessorError::Excel(format!("Failed to read Excel workbook: {}", e))
    }
}

/// One non-fatal diagnostic, tagged with the stage that raised it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingMessage {
    pub message: String,
    pub source: Option<String>,
}

impl ProcessingMessage {
    pub fn new(message: impl Into<String>, source: Option<String>) -> Self {
        Self {
            message: message.into(),
            source,
        }
    }
}

/// Warnings collected while loading a mapping and mapping records. Anything
/// fatal is a [`ProcessorError`] instead.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessingState {
    warnings: Vec<ProcessingMessage>,
}

impl ProcessingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_warning(&mut self, message: impl Into<String>, source: Option<String>) {
        self.warnings.push(ProcessingMessage::new(message, source));
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn get_warnings(&self) -> &[ProcessingMessage] {
        &self.warnings
    }

    pub fn merge(&mut self, other: ProcessingState) {
        self.warnings.extend(other.warnings);
    }
}

#[derive(Debug)]
pub enum ProcessingOutcome {
    Success,
    SuccessWithWarnings(Vec<ProcessingMessage>),
}

impl ProcessingOutcome {
    pub fn from_state(state: ProcessingState) -> Self {
        if state.warnings.is_empty() {
            ProcessingOutcome::Success
        } else {
            ProcessingOutcome::SuccessWithWarnings(state.warnings)
        }
    }

    pub fn warnings(&self) -> &[ProcessingMessage] {
        match self {
            ProcessingOutcome::Success => &[],
            ProcessingOutcome::SuccessWithWarnings(warnings) => warnings,
        }
    }
}
