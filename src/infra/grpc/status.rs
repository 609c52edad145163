use std::time::Duration;

use tonic::metadata::MetadataMap;
use tonic::{Code, Status};
use tracing::error;

use crate::application::error::{ControllerError, Outcome};
use crate::domain::error::DomainError;

const GRPC_TIMEOUT_HEADER: &str = "grpc-timeout";

/// gRPC status code for a transport-neutral outcome.
pub fn code_for(outcome: Outcome) -> Code {
    match outcome {
        Outcome::Ok => Code::Ok,
        Outcome::InvalidArgument => Code::InvalidArgument,
        Outcome::NotFound => Code::NotFound,
        Outcome::AlreadyExists => Code::AlreadyExists,
        Outcome::Internal => Code::Internal,
    }
}

pub fn outcome_for(code: Code) -> Outcome {
    match code {
        Code::Ok => Outcome::Ok,
        Code::InvalidArgument => Outcome::InvalidArgument,
        Code::NotFound => Outcome::NotFound,
        Code::AlreadyExists => Outcome::AlreadyExists,
        _ => Outcome::Internal,
    }
}

impl From<ControllerError> for Status {
    fn from(err: ControllerError) -> Self {
        let code = code_for(err.outcome());
        match err.public_identity() {
            Some(identity) => Status::new(code, identity),
            None => {
                let mut chain = Vec::new();
                let mut current: Option<&dyn std::error::Error> = Some(&err);
                while let Some(inner) = current {
                    chain.push(inner.to_string());
                    current = inner.source();
                }
                error!(
                    target = "seo_svc::grpc::response",
                    code = ?code,
                    chain = ?chain,
                    "request failed"
                );
                Status::new(code, "internal error")
            }
        }
    }
}

impl From<DomainError> for Status {
    fn from(err: DomainError) -> Self {
        Status::invalid_argument(err.to_string())
    }
}

/// Parse the `grpc-timeout` request header (`<digits><unit>`, at most eight digits).
pub fn grpc_timeout(metadata: &MetadataMap) -> Option<Duration> {
    let raw = metadata.get(GRPC_TIMEOUT_HEADER)?.to_str().ok()?;
    parse_grpc_timeout(raw)
}

fn parse_grpc_timeout(raw: &str) -> Option<Duration> {
    if raw.len() < 2 || raw.len() > 9 {
        return None;
    }
    let (digits, unit) = raw.split_at(raw.len() - 1);
    let value: u64 = digits.parse().ok()?;

    let duration = match unit {
        "H" => Duration::from_secs(value.checked_mul(3_600)?),
        "M" => Duration::from_secs(value.checked_mul(60)?),
        "S" => Duration::from_secs(value),
        "m" => Duration::from_millis(value),
        "u" => Duration::from_micros(value),
        "n" => Duration::from_nanos(value),
        _ => return None,
    };
    Some(duration)
}
