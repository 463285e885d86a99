//! Error types for morphocrate

use thiserror::Error;

/// Main error type for morphocrate operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Mesh '{identifier}' failed: {source}")]
    Mesh {
        identifier: String,
        #[source]
        source: Box<Error>,
    },
    
    #[error("Algorithm error: {0}")]
    Algorithm(String),
    
    #[error("Invalid configuration: {0}")]
    Config(String),
    
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl Error {
    /// Attach the identifier of the mesh that produced this error
    pub fn for_mesh(self, identifier: impl Into<String>) -> Self {
        Error::Mesh {
            identifier: identifier.into(),
            source: Box::new(self),
        }
    }

    /// True for errors caused by a point set without points
    pub fn is_empty_input(&self) -> bool {
        match self {
            Error::EmptyInput(_) => true,
            Error::Mesh { source, .. } => source.is_empty_input(),
            _ => false,
        }
    }
}

/// Result type alias for morphocrate operations
pub type Result<T> = std::result::Result<T, Error>;
