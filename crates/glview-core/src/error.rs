//! Error types for glview

use thiserror::Error;

/// The main error type for glview operations
#[derive(Debug, Error)]
pub enum ViewerError {
    /// The file name does not carry the `.glb` extension.
    #[error("Invalid file type: {name} is not a .glb file")]
    WrongFileType { name: String },

    /// The file exceeds [`crate::MAX_UPLOAD_BYTES`].
    #[error("File too large: {name} is {size} bytes (limit {limit})")]
    FileTooLarge { name: String, size: u64, limit: u64 },

    /// Catch-all for failures while reading the file or handing it to the shell.
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    /// A second upload was submitted while the first was still in progress.
    #[error("Upload already in progress")]
    UploadBusy,

    /// The bytes were accepted but could not be decoded as a glTF binary.
    #[error("Decode failed: {0}")]
    DecodeFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Export error: {0}")]
    ExportError(String),
}

impl ViewerError {
    /// Whether this error came from upload validation (the file never became active).
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            ViewerError::WrongFileType { .. }
                | ViewerError::FileTooLarge { .. }
                | ViewerError::UploadBusy
        )
    }
}

/// Result type alias for glview operations
pub type Result<T> = std::result::Result<T, ViewerError>;

impl From<toml::de::Error> for ViewerError {
    fn from(err: toml::de::Error) -> Self {
        ViewerError::ConfigError(err.to_string())
    }
}
