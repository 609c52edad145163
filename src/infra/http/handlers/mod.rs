pub(super) mod pages;
pub(super) mod seo;

use std::future::Future;
use std::time::Instant;

use seo_svc_api_types::{PageFieldsPayload, SeoFieldsPayload};

use crate::application::error::Outcome;
use crate::domain::pages::PageFields;
use crate::domain::seo::SeoFields;
use crate::infra::http::error::ApiError;
use crate::infra::telemetry::{Transport, record_request};

/// Run a handler body and record its outcome and latency.
async fn observed<T, F>(op: &'static str, body: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, ApiError>>,
{
    let start = Instant::now();
    let result = body.await;
    let outcome = match &result {
        Ok(_) => Outcome::Ok,
        Err(err) => err.outcome(),
    };
    record_request(Transport::Http, op, outcome, start.elapsed());
    result
}

fn seo_fields(payload: SeoFieldsPayload) -> SeoFields {
    SeoFields {
        title: payload.title,
        description: payload.description,
        keywords: payload.keywords,
        og_title: payload.og_title,
        og_description: payload.og_description,
        og_image: payload.og_image,
    }
}

fn page_fields(payload: PageFieldsPayload) -> PageFields {
    PageFields {
        title: payload.title,
        href: payload.href,
        content: payload.content,
    }
}
