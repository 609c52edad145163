use tonic::{Request, Response, Status};

use super::proto::page_service_server::PageService;
use super::proto::{Empty, Page, PageKey, PageList, PageWriteRequest};
use super::{GrpcState, observed, rfc3339};
use crate::domain::pages::{PageFields, PageRecord, PageSlug};

pub struct PageGrpcService {
    state: GrpcState,
}

impl PageGrpcService {
    pub fn new(state: GrpcState) -> Self {
        Self { state }
    }
}

fn page_to_proto(record: PageRecord) -> Result<Page, Status> {
    Ok(Page {
        created_at: rfc3339(record.created_at)?,
        updated_at: rfc3339(record.updated_at)?,
        slug: record.slug,
        title: record.title,
        href: record.href,
        content: record.content,
    })
}

fn fields_from_request(req: &mut PageWriteRequest) -> PageFields {
    PageFields {
        title: std::mem::take(&mut req.title),
        href: std::mem::take(&mut req.href),
        content: std::mem::take(&mut req.content),
    }
}

#[tonic::async_trait]
impl PageService for PageGrpcService {
    async fn list_pages(&self, request: Request<Empty>) -> Result<Response<PageList>, Status> {
        let ctx = self.state.op_context(&request);

        observed("page.list", async {
            let pages = self
                .state
                .controller
                .list_pages(&ctx)
                .await?
                .into_iter()
                .map(page_to_proto)
                .collect::<Result<Vec<_>, _>>()?;
            Ok::<_, Status>(PageList { pages })
        })
        .await
    }

    async fn get_page(&self, request: Request<PageKey>) -> Result<Response<Page>, Status> {
        let ctx = self.state.op_context(&request);
        let key = request.into_inner();

        observed("page.get", async {
            let slug = PageSlug::new(key.slug)?;
            let page = self.state.controller.get_page(&ctx, &slug).await?;
            page_to_proto(page)
        })
        .await
    }

    async fn create_page(
        &self,
        request: Request<PageWriteRequest>,
    ) -> Result<Response<Page>, Status> {
        let ctx = self.state.op_context(&request);
        let mut req = request.into_inner();

        observed("page.create", async {
            let slug = PageSlug::optional(Some(req.slug.as_str()))?;
            let fields = fields_from_request(&mut req);
            let page = self
                .state
                .controller
                .create_page(&ctx, slug, fields)
                .await?;
            page_to_proto(page)
        })
        .await
    }

    async fn update_page(
        &self,
        request: Request<PageWriteRequest>,
    ) -> Result<Response<Page>, Status> {
        let ctx = self.state.op_context(&request);
        let mut req = request.into_inner();

        observed("page.update", async {
            let slug = PageSlug::new(req.slug.clone())?;
            let fields = fields_from_request(&mut req);
            let page = self
                .state
                .controller
                .update_page(&ctx, slug, fields)
                .await?;
            page_to_proto(page)
        })
        .await
    }

    async fn delete_page(&self, request: Request<PageKey>) -> Result<Response<Empty>, Status> {
        let ctx = self.state.op_context(&request);
        let key = request.into_inner();

        observed("page.delete", async {
            let slug = PageSlug::new(key.slug)?;
            self.state.controller.delete_page(&ctx, &slug).await?;
            Ok::<_, Status>(Empty {})
        })
        .await
    }
}
