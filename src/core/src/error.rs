use thiserror::Error;

/// A3S Pack error types
#[derive(Error, Debug)]
pub enum PackError {
    /// Image could not be retrieved
    #[error("fetching image {reference}: {message}")]
    FetchError { reference: String, message: String },

    /// Manifest label absent on an image that must carry one
    #[error("label {label} not present on package {reference}")]
    LabelMissing { label: String, reference: String },

    /// Label present but structurally invalid
    #[error("reading label {label} from image {reference}: {message}")]
    DecodeError {
        label: String,
        reference: String,
        message: String,
    },

    /// Deferred failure raised when an artifact's layer is opened
    #[error("extracting artifact {artifact} layer (diffID {diff_id}) from package {image}: {source}")]
    LayerOpenError {
        artifact: String,
        diff_id: String,
        image: String,
        #[source]
        source: Box<PackError>,
    },

    /// Timeout error
    #[error("Timeout: {0}")]
    TimeoutError(String),

    /// OCI image error
    #[error("OCI image error: {0}")]
    OciImageError(String),

    /// Container registry error
    #[error("Registry error: {registry} - {message}")]
    RegistryError { registry: String, message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for PackError {
    fn from(err: serde_json::Error) -> Self {
        PackError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for PackError {
    fn from(err: serde_yaml::Error) -> Self {
        PackError::SerializationError(err.to_string())
    }
}

/// Result type alias for A3S Pack operations
pub type Result<T> = std::result::Result<T, PackError>;
