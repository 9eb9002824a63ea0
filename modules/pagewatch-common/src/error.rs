use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    #[error("State file error: {0}")]
    State(#[from] serde_json::Error),

    #[error("Table file error: {0}")]
    Table(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
