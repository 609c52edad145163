use tracing::info;

use super::{Controller, OpContext};
use crate::application::error::ControllerError;
use crate::application::repos::{CreateSeoParams, RepoError, UpdateSeoParams};
use crate::cache::ItemRef;
use crate::domain::ResourceKind;
use crate::domain::seo::{SeoFields, SeoIdentity, SeoRecord};

impl Controller {
    pub async fn get_seo(
        &self,
        ctx: &OpContext,
        identity: &SeoIdentity,
    ) -> Result<SeoRecord, ControllerError> {
        const OP: &str = "seo.get";
        let key = self.keys.seo_item(identity);

        self.read_through(
            ctx,
            OP,
            ResourceKind::Seo,
            &key,
            self.stores.seo.find_seo(identity),
        )
        .await?
        .ok_or_else(|| ControllerError::not_found(ResourceKind::Seo, identity))
    }

    pub async fn create_seo(
        &self,
        ctx: &OpContext,
        identity: SeoIdentity,
        fields: SeoFields,
    ) -> Result<SeoRecord, ControllerError> {
        const OP: &str = "seo.create";
        let params = CreateSeoParams {
            identity: identity.clone(),
            fields,
        };

        let created = match ctx.guard(OP, self.stores.seo_write.create_seo(params)).await? {
            Ok(record) => record,
            Err(RepoError::Duplicate { .. }) => {
                return Err(ControllerError::already_exists(
                    ResourceKind::Seo,
                    &identity,
                ));
            }
            Err(err) => return Err(ControllerError::store(OP, err)),
        };

        self.invalidate_after_write(ctx, OP, ItemRef::Seo(&identity))
            .await?;
        info!(
            target = "seo_svc::controller",
            op = OP,
            name = identity.name(),
            pk = identity.pk(),
            "seo record created"
        );
        Ok(created)
    }

    pub async fn update_seo(
        &self,
        ctx: &OpContext,
        identity: SeoIdentity,
        fields: SeoFields,
    ) -> Result<SeoRecord, ControllerError> {
        const OP: &str = "seo.update";
        let params = UpdateSeoParams {
            identity: identity.clone(),
            fields,
        };

        let updated = match ctx.guard(OP, self.stores.seo_write.update_seo(params)).await? {
            Ok(record) => record,
            Err(RepoError::NotFound) => {
                return Err(ControllerError::not_found(ResourceKind::Seo, &identity));
            }
            Err(err) => return Err(ControllerError::store(OP, err)),
        };

        self.invalidate_after_write(ctx, OP, ItemRef::Seo(&identity))
            .await?;
        info!(
            target = "seo_svc::controller",
            op = OP,
            name = identity.name(),
            pk = identity.pk(),
            "seo record updated"
        );
        Ok(updated)
    }

    pub async fn delete_seo(
        &self,
        ctx: &OpContext,
        identity: &SeoIdentity,
    ) -> Result<(), ControllerError> {
        const OP: &str = "seo.delete";

        match ctx.guard(OP, self.stores.seo_write.delete_seo(identity)).await? {
            Ok(()) => {}
            Err(RepoError::NotFound) => {
                return Err(ControllerError::not_found(ResourceKind::Seo, identity));
            }
            Err(err) => return Err(ControllerError::store(OP, err)),
        }

        self.invalidate_after_write(ctx, OP, ItemRef::Seo(identity))
            .await?;
        info!(
            target = "seo_svc::controller",
            op = OP,
            name = identity.name(),
            pk = identity.pk(),
            "seo record deleted"
        );
        Ok(())
    }
}
