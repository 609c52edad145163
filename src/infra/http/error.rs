use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use seo_svc_api_types::{ApiErrorBody, ApiErrorMessage, codes};

use crate::application::error::{ControllerError, ErrorReport, Outcome};
use crate::domain::error::DomainError;

const SOURCE: &str = "infra::http";

/// HTTP status for a transport-neutral outcome.
pub fn status_for(outcome: Outcome) -> StatusCode {
    match outcome {
        Outcome::Ok => StatusCode::OK,
        Outcome::InvalidArgument => StatusCode::BAD_REQUEST,
        Outcome::NotFound => StatusCode::NOT_FOUND,
        Outcome::AlreadyExists => StatusCode::CONFLICT,
        Outcome::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    hint: Option<String>,
    report: Option<ErrorReport>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: impl Into<String>,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            hint,
            report: None,
        }
    }

    pub fn bad_request(message: impl Into<String>, hint: Option<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message, hint)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, None)
    }

    pub fn method_not_allowed() -> Self {
        Self::new(
            StatusCode::METHOD_NOT_ALLOWED,
            codes::METHOD_NOT_ALLOWED,
            "method not allowed",
            None,
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn outcome(&self) -> Outcome {
        match self.status {
            StatusCode::NOT_FOUND => Outcome::NotFound,
            StatusCode::CONFLICT => Outcome::AlreadyExists,
            status if status.is_server_error() => Outcome::Internal,
            _ => Outcome::InvalidArgument,
        }
    }
}

impl From<ControllerError> for ApiError {
    fn from(err: ControllerError) -> Self {
        let outcome = err.outcome();
        let status = status_for(outcome);
        let report = ErrorReport::from_error(SOURCE, status, &err);

        let mut api = match &err {
            ControllerError::NotFound { resource, .. } => Self::new(
                status,
                codes::NOT_FOUND,
                format!("{resource} not found"),
                err.public_identity(),
            ),
            ControllerError::AlreadyExists { resource, .. } => Self::new(
                status,
                codes::ALREADY_EXISTS,
                format!("{resource} already exists"),
                err.public_identity(),
            ),
            ControllerError::Internal { .. } => {
                Self::new(status, codes::INTERNAL, "internal error", None)
            }
        };
        api.report = Some(report);
        api
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self::bad_request("invalid request", Some(err.to_string()))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request("malformed request body", Some(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request("malformed request path", Some(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let report = self.report.unwrap_or_else(|| {
            ErrorReport::from_message(
                SOURCE,
                self.status,
                format!(
                    "{}: {}",
                    self.code,
                    self.hint.as_deref().unwrap_or(&self.message)
                ),
            )
        });
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message,
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        // Read back by the response logging middleware.
        report.attach(&mut response);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::repos::RepoError;
    use crate::domain::ResourceKind;

    #[test]
    fn controller_outcomes_map_to_statuses() {
        let missing: ApiError = ControllerError::not_found(ResourceKind::Page, "gone").into();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(missing.hint.as_deref(), Some("page gone"));

        let dup: ApiError = ControllerError::already_exists(ResourceKind::Seo, "product/42").into();
        assert_eq!(dup.status(), StatusCode::CONFLICT);
        assert_eq!(dup.outcome(), Outcome::AlreadyExists);

        let internal: ApiError = ControllerError::store("seo.get", RepoError::Timeout).into();
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(internal.message, "internal error");
        assert!(internal.hint.is_none());
    }

    #[test]
    fn internal_detail_stays_in_report() {
        let err = ControllerError::store("seo.get", RepoError::from_persistence("pool closed"));
        let response = ApiError::from(err).into_response();

        let report = response
            .extensions()
            .get::<ErrorReport>()
            .expect("report attached");
        assert!(report.messages.iter().any(|m| m.contains("pool closed")));
    }

    #[test]
    fn domain_errors_are_bad_requests() {
        let api: ApiError = DomainError::blank("name").into();
        assert_eq!(api.status(), StatusCode::BAD_REQUEST);
        assert_eq!(api.outcome(), Outcome::InvalidArgument);
    }
}
