//! gRPC adapter mirroring the HTTP routes over the same controller.

mod pages;
mod seo;
mod status;

pub mod proto {
    tonic::include_proto!("seo.v1");
}

use std::future::Future;
use std::time::{Duration, Instant};

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tonic::{Request, Response, Status};
use tracing::{Instrument, info_span};

use crate::application::controller::{Controller, OpContext};
use crate::application::error::Outcome;
use crate::infra::telemetry::{Transport, record_request};

pub use pages::PageGrpcService;
pub use seo::SeoGrpcService;
pub use status::{code_for, grpc_timeout, outcome_for};

use proto::page_service_server::PageServiceServer;
use proto::seo_service_server::SeoServiceServer;

#[derive(Clone)]
pub struct GrpcState {
    pub controller: Controller,
    pub request_timeout: Duration,
}

impl GrpcState {
    /// Operation context for `request`; a `grpc-timeout` header can only shorten the deadline.
    fn op_context<T>(&self, request: &Request<T>) -> OpContext {
        let ctx = OpContext::with_timeout(self.request_timeout);
        match grpc_timeout(request.metadata()) {
            Some(timeout) => ctx.shorten(timeout),
            None => ctx,
        }
    }
}

pub type GrpcServices = (
    SeoServiceServer<SeoGrpcService>,
    PageServiceServer<PageGrpcService>,
);

pub fn create_services(state: GrpcState) -> GrpcServices {
    (
        SeoServiceServer::new(SeoGrpcService::new(state.clone())),
        PageServiceServer::new(PageGrpcService::new(state)),
    )
}

async fn observed<T, F>(op: &'static str, body: F) -> Result<Response<T>, Status>
where
    F: Future<Output = Result<T, Status>>,
{
    let start = Instant::now();
    let result = body.instrument(info_span!("grpc.request", op)).await;
    let outcome = match &result {
        Ok(_) => Outcome::Ok,
        Err(status) => outcome_for(status.code()),
    };
    record_request(Transport::Grpc, op, outcome, start.elapsed());
    result.map(Response::new)
}

fn rfc3339(ts: OffsetDateTime) -> Result<String, Status> {
    ts.format(&Rfc3339)
        .map_err(|err| Status::internal(format!("timestamp formatting failed: {err}")))
}
