use std::fmt;

#[derive(Debug)]
pub enum TriplexError {
    Cache(String),
    Io(std::io::Error),
    MissingField { duplex: String, field: &'static str },
    InvalidCoordinate { duplex: String, value: String },
    Namespace(String),
    Config(String),
    Serialization(Box<bincode::error::EncodeError>),
    Deserialization(Box<bincode::error::DecodeError>),
    Json(serde_json::Error),
    Other(String),
}

impl fmt::Display for TriplexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriplexError::Cache(e) => write!(f, "Cache error: {}", e),
            TriplexError::Io(e) => write!(f, "IO error: {}", e),
            TriplexError::MissingField { duplex, field } => {
                write!(f, "Duplex {} has no {} field", duplex, field)
            }
            TriplexError::InvalidCoordinate { duplex, value } => {
                write!(f, "Duplex {} has a non-numeric alignment start {:?}", duplex, value)
            }
            TriplexError::Namespace(e) => write!(f, "Namespace error: {}", e),
            TriplexError::Config(e) => write!(f, "Configuration error: {}", e),
            TriplexError::Serialization(e) => write!(f, "Serialization error: {}", e),
            TriplexError::Deserialization(e) => write!(f, "Deserialization error: {}", e),
            TriplexError::Json(e) => write!(f, "JSON error: {}", e),
            TriplexError::Other(e) => write!(f, "Error: {}", e),
        }
    }
}

impl std::error::Error for TriplexError {}

impl TriplexError {
    /// Connectivity and backend failures are fatal for whoever hits them.
    pub fn is_cache_failure(&self) -> bool {
        matches!(self, TriplexError::Cache(_))
    }
}

impl From<bincode::error::EncodeError> for TriplexError {
    fn from(err: bincode::error::EncodeError) -> Self {
        TriplexError::Serialization(Box::new(err))
    }
}

impl From<bincode::error::DecodeError> for TriplexError {
    fn from(err: bincode::error::DecodeError) -> Self {
        TriplexError::Deserialization(Box::new(err))
    }
}

impl From<serde_json::Error> for TriplexError {
    fn from(err: serde_json::Error) -> Self {
        TriplexError::Json(err)
    }
}

impl From<std::io::Error> for TriplexError {
    fn from(err: std::io::Error) -> Self {
        TriplexError::Io(err)
    }
}

#[cfg(feature = "distributed")]
impl From<postgres::Error> for TriplexError {
    fn from(err: postgres::Error) -> Self {
        TriplexError::Cache(err.to_string())
    }
}

impl From<String> for TriplexError {
    fn from(err: String) -> Self {
        TriplexError::Other(err)
    }
}

impl From<&str> for TriplexError {
    fn from(err: &str) -> Self {
        TriplexError::Other(err.to_string())
    }
}
