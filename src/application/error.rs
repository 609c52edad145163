use std::error::Error as StdError;

use axum::{http::StatusCode, response::Response};
use thiserror::Error;

use crate::{
    application::repos::RepoError,
    domain::ResourceKind,
    infra::error::InfraError,
};

#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
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

/// Transport-neutral classification of a request's result.
///
/// Both adapters derive their status codes from this value, and metrics label
/// requests with [`Outcome::as_str`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Ok,
    InvalidArgument,
    NotFound,
    AlreadyExists,
    Internal,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Ok => "ok",
            Outcome::InvalidArgument => "invalid_argument",
            Outcome::NotFound => "not_found",
            Outcome::AlreadyExists => "already_exists",
            Outcome::Internal => "internal",
        }
    }
}

/// Failure outcomes produced by the controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("{resource} `{identity}` not found")]
    NotFound {
        resource: ResourceKind,
        identity: String,
    },
    #[error("{resource} `{identity}` already exists")]
    AlreadyExists {
        resource: ResourceKind,
        identity: String,
    },
    #[error("internal failure during `{op}`")]
    Internal {
        op: &'static str,
        #[source]
        cause: InternalCause,
    },
}

#[derive(Debug, Error)]
pub enum InternalCause {
    #[error(transparent)]
    Store(#[from] RepoError),
    #[error("operation deadline exceeded")]
    DeadlineExceeded,
    #[error("slug derivation failed: {0}")]
    Slug(String),
}

impl ControllerError {
    pub fn not_found(resource: ResourceKind, identity: impl ToString) -> Self {
        Self::NotFound {
            resource,
            identity: identity.to_string(),
        }
    }

    pub fn already_exists(resource: ResourceKind, identity: impl ToString) -> Self {
        Self::AlreadyExists {
            resource,
            identity: identity.to_string(),
        }
    }

    pub fn store(op: &'static str, err: RepoError) -> Self {
        Self::Internal {
            op,
            cause: InternalCause::Store(err),
        }
    }

    pub fn deadline(op: &'static str) -> Self {
        Self::Internal {
            op,
            cause: InternalCause::DeadlineExceeded,
        }
    }

    pub fn outcome(&self) -> Outcome {
        match self {
            ControllerError::NotFound { .. } => Outcome::NotFound,
            ControllerError::AlreadyExists { .. } => Outcome::AlreadyExists,
            ControllerError::Internal { .. } => Outcome::Internal,
        }
    }

    /// Identity string safe to echo back to callers; `None` for internal failures.
    pub fn public_identity(&self) -> Option<String> {
        match self {
            ControllerError::NotFound { resource, identity }
            | ControllerError::AlreadyExists { resource, identity } => {
                Some(format!("{resource} {identity}"))
            }
            ControllerError::Internal { .. } => None,
        }
    }
}

/// Process-level failures surfaced by `main`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
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

    #[test]
    fn report_walks_source_chain() {
        let err = ControllerError::store("seo.get", RepoError::Timeout);
        let report = ErrorReport::from_error("test", StatusCode::INTERNAL_SERVER_ERROR, &err);
        assert_eq!(
            report.messages,
            vec![
                "internal failure during `seo.get`".to_string(),
                "database timeout".to_string(),
            ]
        );
    }

    #[test]
    fn public_identity_hides_internal_detail() {
        let missing = ControllerError::not_found(ResourceKind::Page, "no-such-page");
        assert_eq!(
            missing.public_identity().as_deref(),
            Some("page no-such-page")
        );
        assert_eq!(missing.outcome(), Outcome::NotFound);

        let internal = ControllerError::deadline("page.get");
        assert_eq!(internal.public_identity(), None);
        assert_eq!(internal.outcome(), Outcome::Internal);
    }
}
