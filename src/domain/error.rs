use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("invalid block key `{value}`")]
    InvalidBlockKey { value: String },
}
