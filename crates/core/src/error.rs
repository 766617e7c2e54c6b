use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("graph export parse error: {0}")]
    GraphExport(String),

    #[error("required export file is missing: {0}")]
    MissingExport(String),

    #[error("unexpected export shape in {file}: {details}")]
    ExportShape { file: String, details: String },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("embedding matrix error: {0}")]
    Matrix(#[from] MatrixError),

    #[error("upload to {collection} failed at batch {batch}: {source}")]
    Upload {
        collection: String,
        batch: usize,
        #[source]
        source: StoreError,
    },

    #[error("vector store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store request failed: {0}")]
    Request(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatrixError {
    #[error("matrix field is absent")]
    Missing,

    #[error("base64 decode failed: {0}")]
    Base64(String),

    #[error("buffer of {0} bytes is not a whole number of f32 values")]
    TruncatedBuffer(usize),

    #[error("matrix is empty but {records} records were exported")]
    Empty { records: usize },

    #[error("matrix has {values} values, which cannot be split into {records} rows")]
    ShapeMismatch { values: usize, records: usize },

    #[error("matrix has {rows} rows but {records} records were exported")]
    RowCountMismatch { rows: usize, records: usize },

    #[error("matrix rows have {actual} dimensions, collection expects {expected}")]
    DimensionMismatch { actual: usize, expected: usize },
}

impl MatrixError {
    /// Corrupt or absent data degrades to zero vectors; shape disagreements abort.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Missing | Self::Base64(_) | Self::TruncatedBuffer(_) | Self::Empty { .. }
        )
    }
}

pub type Result<T, E = MigrateError> = std::result::Result<T, E>;
