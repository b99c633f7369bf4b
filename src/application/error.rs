use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    application::{
        blog::BlogError, content::ContentError, live::LiveError, repos::RepoError,
        syndication::SyndicationError,
    },
    config::LoadError,
    infra::error::InfraError,
};

/// Diagnostic chain carried in response extensions for the logging middleware.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

/// An HTTP failure: a status, a client-safe message, and the internal report.
#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    public_message: &'static str,
    report: ErrorReport,
}

impl HttpError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            status,
            public_message,
            report: ErrorReport::from_message(source, status, detail),
        }
    }

    pub fn from_error(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        error: &dyn StdError,
    ) -> Self {
        Self {
            status,
            public_message,
            report: ErrorReport::from_error(source, status, error),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.public_message).into_response();
        self.report.attach(&mut response);
        response
    }
}

impl From<ContentError> for HttpError {
    fn from(error: ContentError) -> Self {
        // A broken content file takes the whole listing down with it.
        HttpError::from_error(
            "application::content",
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error",
            &error,
        )
    }
}

impl From<RepoError> for HttpError {
    fn from(error: RepoError) -> Self {
        let (status, public_message) = match &error {
            RepoError::NotFound => (StatusCode::NOT_FOUND, "Not found"),
            RepoError::Timeout => (StatusCode::SERVICE_UNAVAILABLE, "Service unavailable"),
            RepoError::InvalidInput { .. } => (StatusCode::BAD_REQUEST, "Invalid input"),
            RepoError::Duplicate { .. } => (StatusCode::CONFLICT, "Conflict"),
            RepoError::Integrity { .. } | RepoError::Persistence(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };
        HttpError::from_error("application::repos", status, public_message, &error)
    }
}

impl From<BlogError> for HttpError {
    fn from(error: BlogError) -> Self {
        match error {
            BlogError::Content(err) => err.into(),
            BlogError::Repo(err) => err.into(),
        }
    }
}

impl From<LiveError> for HttpError {
    fn from(error: LiveError) -> Self {
        match error {
            LiveError::Domain(err) => HttpError::from_error(
                "application::live",
                StatusCode::BAD_REQUEST,
                "Invalid live entry",
                &err,
            ),
            LiveError::Repo(err) => err.into(),
            LiveError::NotFound(_) => HttpError::from_error(
                "application::live",
                StatusCode::NOT_FOUND,
                "Not found",
                &error,
            ),
        }
    }
}

impl From<SyndicationError> for HttpError {
    fn from(error: SyndicationError) -> Self {
        HttpError::from_error(
            "application::syndication",
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to generate RSS feed",
            &error,
        )
    }
}

/// Top-level error of the binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("failed to load configuration: {0}")]
    Config(#[from] LoadError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::DomainError;

    #[test]
    fn report_collects_source_chain() {
        let err = AppError::from(InfraError::from(std::io::Error::other("disk full")));
        let report = ErrorReport::from_error("test", StatusCode::INTERNAL_SERVER_ERROR, &err);
        assert_eq!(report.messages.last().map(String::as_str), Some("disk full"));
    }

    #[test]
    fn repo_errors_map_to_statuses() {
        assert_eq!(
            HttpError::from(RepoError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            HttpError::from(RepoError::Timeout).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            HttpError::from(RepoError::from_persistence("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn live_errors_map_to_statuses() {
        assert_eq!(
            HttpError::from(LiveError::NotFound(3)).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            HttpError::from(LiveError::from(DomainError::validation("empty"))).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn http_error_attaches_report() {
        let response = HttpError::new(
            "test::source",
            StatusCode::FORBIDDEN,
            "Forbidden",
            "token mismatch",
        )
        .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let report = response
            .extensions()
            .get::<ErrorReport>()
            .expect("report attached");
        assert_eq!(report.source, "test::source");
        assert_eq!(report.messages, vec!["token mismatch"]);
    }
}
