use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf read error: {0}")]
    Read(String),

    #[error("no readable text: primary reader: {primary}; fallback reader: {fallback}")]
    NoReadableText { primary: String, fallback: String },
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("provider returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("provider response had no completion choices")]
    EmptyResponse,
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("nothing to analyze: the chunk sequence is empty")]
    EmptyInput,

    #[error("invalid chunking config: {0}")]
    InvalidChunkConfig(String),
}

#[derive(Debug, Error)]
pub enum TableParseError {
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("no metrics header row found")]
    MissingHeader,

    #[error("no metric rows found after the header")]
    NoRows,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("no pdf files found in {0}")]
    NoDocuments(String),
}

pub type Result<T, E = ExtractError> = std::result::Result<T, E>;
