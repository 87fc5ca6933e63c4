use thiserror::Error;

/// Failure to turn an uploaded byte stream into report text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("the uploaded file could not be read as a PDF: {0}")]
    Unreadable(String),
    #[error("the document contains no extractable text; it may be a scanned image")]
    NoTextLayer,
}

/// Failure at the text-generation backend boundary.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("text generation request failed: {0}")]
    Backend(String),
    #[error("the generation backend returned an empty response")]
    EmptyResponse,
}

/// Missing or invalid startup configuration.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("OPENROUTER_API_KEY environment variable is not set")]
    MissingApiKey,
    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Any failure a pipeline operation can surface to its caller.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no report has been uploaded for this session")]
    DocumentMissing,
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error("session storage failure: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
