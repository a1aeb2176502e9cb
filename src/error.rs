use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("could not extract text from {}: {message}", .path.display())]
    Extraction { path: PathBuf, message: String },

    #[error("index persistence failed: {0}")]
    IndexPersistence(String),

    #[error("{}", generation_message(.status, .message))]
    Generation { status: Option<u16>, message: String },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn generation_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("LLM API error {}: {}", code, message),
        None => format!("LLM request failed: {}", message),
    }
}

impl Error {
    pub(crate) fn persistence(err: anyhow::Error) -> Self {
        Error::IndexPersistence(format!("{:#}", err))
    }
}
