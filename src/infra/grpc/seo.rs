use tonic::{Request, Response, Status};

use super::proto::seo_service_server::SeoService;
use super::proto::{Empty, Seo, SeoFields as ProtoSeoFields, SeoKey, SeoWriteRequest};
use super::{GrpcState, observed, rfc3339};
use crate::domain::seo::{SeoFields, SeoIdentity, SeoRecord};

pub struct SeoGrpcService {
    state: GrpcState,
}

impl SeoGrpcService {
    pub fn new(state: GrpcState) -> Self {
        Self { state }
    }
}

fn fields_from_proto(fields: Option<ProtoSeoFields>) -> SeoFields {
    let fields = fields.unwrap_or_default();
    SeoFields {
        title: fields.title,
        description: fields.description,
        keywords: fields.keywords,
        og_title: fields.og_title,
        og_description: fields.og_description,
        og_image: fields.og_image,
    }
}

fn seo_to_proto(record: SeoRecord) -> Result<Seo, Status> {
    Ok(Seo {
        created_at: rfc3339(record.created_at)?,
        updated_at: rfc3339(record.updated_at)?,
        fields: Some(ProtoSeoFields {
            title: record.title,
            description: record.description,
            keywords: record.keywords,
            og_title: record.og_title,
            og_description: record.og_description,
            og_image: record.og_image,
        }),
        name: record.name,
        pk: record.pk,
    })
}

#[tonic::async_trait]
impl SeoService for SeoGrpcService {
    async fn get_seo(&self, request: Request<SeoKey>) -> Result<Response<Seo>, Status> {
        let ctx = self.state.op_context(&request);
        let key = request.into_inner();

        observed("seo.get", async {
            let identity = SeoIdentity::parse(key.name, key.pk)?;
            let record = self.state.controller.get_seo(&ctx, &identity).await?;
            seo_to_proto(record)
        })
        .await
    }

    async fn create_seo(
        &self,
        request: Request<SeoWriteRequest>,
    ) -> Result<Response<Seo>, Status> {
        let ctx = self.state.op_context(&request);
        let req = request.into_inner();

        observed("seo.create", async {
            let identity = SeoIdentity::parse(req.name, req.pk)?;
            let record = self
                .state
                .controller
                .create_seo(&ctx, identity, fields_from_proto(req.fields))
                .await?;
            seo_to_proto(record)
        })
        .await
    }

    async fn update_seo(
        &self,
        request: Request<SeoWriteRequest>,
    ) -> Result<Response<Seo>, Status> {
        let ctx = self.state.op_context(&request);
        let req = request.into_inner();

        observed("seo.update", async {
            let identity = SeoIdentity::parse(req.name, req.pk)?;
            let record = self
                .state
                .controller
                .update_seo(&ctx, identity, fields_from_proto(req.fields))
                .await?;
            seo_to_proto(record)
        })
        .await
    }

    async fn delete_seo(&self, request: Request<SeoKey>) -> Result<Response<Empty>, Status> {
        let ctx = self.state.op_context(&request);
        let key = request.into_inner();

        observed("seo.delete", async {
            let identity = SeoIdentity::parse(key.name, key.pk)?;
            self.state.controller.delete_seo(&ctx, &identity).await?;
            Ok::<_, Status>(Empty {})
        })
        .await
    }
}
