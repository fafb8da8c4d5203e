use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    /// Prompt could not be converted to model input. Raised before any
    /// background work starts; the request aborts with no partial output.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Execution device or backing service unavailable. Same immediate-abort
    /// treatment as encoding failures, kept distinct for diagnosis.
    #[error("resource acquisition error: {0}")]
    ResourceAcquisition(String),

    /// Failure inside the background generation task after streaming may
    /// already have started. Never crosses the task boundary as a panic;
    /// the consumer receives it as an annotated terminal snapshot.
    #[error("generation error: {0}")]
    Generation(String),

    /// Fragment could not be relayed to the consumer (receiver dropped).
    #[error("delivery error: {0}")]
    Delivery(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ChatError>;
