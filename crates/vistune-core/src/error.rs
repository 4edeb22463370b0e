use thiserror::Error;

#[derive(Error, Debug)]
pub enum VistuneError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Key encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML decode error: {0}")]
    TomlDecode(#[from] toml::de::Error),

    #[error("TOML encode error: {0}")]
    TomlEncode(#[from] toml::ser::Error),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Precondition violated: {0}")]
    Precondition(String),

    #[error("No {table} record for key {key}")]
    MissingRecord { table: &'static str, key: String },

    #[error("Duplicate {table} record for key {key}")]
    DuplicateKey { table: &'static str, key: String },

    #[error("Unsupported compute master: {0}")]
    UnsupportedMaster(String),

    #[error("Compute context error: {0}")]
    Context(String),

    #[error("Invalid stack file: {0}")]
    InvalidStack(String),

    #[error("No raw frames found in {0}")]
    NoFrames(String),

    #[error("Invalid behavior record: {0}")]
    Behavior(String),

    #[error("Empty frame sequence")]
    EmptySequence,
}

pub type Result<T> = std::result::Result<T, VistuneError>;
