use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecutError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Source unreadable: {0}")]
    SourceUnreadable(String),

    #[error("Scene detection error: {0}")]
    Detection(String),

    #[error("Segmentation error: {0}")]
    Segmentation(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Processing failed during {stage}: {source}")]
    Processing {
        stage: &'static str,
        #[source]
        source: Box<RecutError>,
    },
}

impl RecutError {
    /// Wrap a stage failure for the pipeline caller
    pub fn processing(stage: &'static str, source: RecutError) -> Self {
        RecutError::Processing {
            stage,
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, RecutError>;
