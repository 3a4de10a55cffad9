use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid value for {name}: {value:?}")]
    InvalidSetting { name: &'static str, value: String },
}
