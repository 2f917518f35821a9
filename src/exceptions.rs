use thiserror::Error;

#[derive(Error, Debug)]
pub enum PatchError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("LLM Provider error: {0}")]
    Provider(String),

    #[error("Rejected LLM response: {0}")]
    RejectedResponse(String),

    #[error("Version control error: {0}")]
    Vcs(String),
}
