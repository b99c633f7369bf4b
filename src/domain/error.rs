use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("document does not start with a `---` delimited front-matter block")]
    MissingFrontMatter,
    #[error("invalid front-matter: {message}")]
    FrontMatter { message: String },
    #[error("date `{value}` matches none of the accepted formats")]
    InvalidDate { value: String },
    #[error("domain validation failed: {message}")]
    Validation { message: String },
}

impl DomainError {
    pub fn front_matter(message: impl Into<String>) -> Self {
        Self::FrontMatter {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}
