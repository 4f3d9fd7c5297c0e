use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("engine is stopped")]
    Stopped,
    #[error("state store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
