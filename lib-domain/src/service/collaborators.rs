use lib_core::{
    extensions::RequestCtx,
    keycloak::{KeycloakPolicy, PolicyManager, PolicyUpdate, ProtectionToken, SpaceAuthorizer},
    paging::{compute_paging_limits, page_window, PagingLinks},
    AppResult, ErrType, ErrorContext,
};
use uuid::Uuid;

use crate::{
    datastore::{identity::IdentityDs, space::SpaceDs, space_resource::SpaceResourceDs},
    dto::{
        collaborator::{
            req::{PageQuery, UpdateUserId, UpdateUserIdList},
            res::{CollaboratorListMeta, CollaboratorListResponse},
        },
        identity::res::_IdentityResponseVec,
    },
};

use super::{parse_id, Service};


impl<D, K> Service<D, K>
where
    D: IdentityDs + SpaceDs + SpaceResourceDs + Sync,
    K: PolicyManager + SpaceAuthorizer + Sync,
{
    /// List the identities in the space policy, one page at a time
    ///
    /// `path` is the request URL the paging links are built on.
    pub async fn list_collaborators(
        &self,
        ctx: &RequestCtx,
        space_id: &str,
        page: PageQuery,
        path: &str,
    ) -> AppResult<CollaboratorListResponse> {
        let space_id = parse_id(space_id, "space")?;
        let (policy, _) = self.get_policy(ctx, &space_id).await.context("s:list_collaborators")?;

        let member_ids = policy.member_ids().inspect_err(|err| {
            tracing::error!(
                req_id = &*ctx.req_id.0,
                space_id = space_id.to_string(),
                users = policy.config.user_ids.as_str(),
                err = err.to_string(),
                "unable to decode the space policy members"
            )
        })?;
        let total_count = member_ids.len();

        let (offset, limit) = compute_paging_limits(page.page_offset.as_deref(), page.page_limit);
        let (offset, limit, end) = page_window(total_count, offset, limit);

        let mut identities = Vec::with_capacity(end - offset);
        for identity_id in &member_ids[offset..end] {
            let identity = self
                .ds
                .get_identity_with_user(identity_id)
                .await
                .map_err(|err| err.into_type(ErrType::ServerError))?
                .ok_or_else(|| {
                    tracing::error!(
                        req_id = &*ctx.req_id.0,
                        identity_id = identity_id.to_string(),
                        "unable to find the identity listed in the space policy"
                    );
                    ErrType::ServerError.msg("Identity listed in the space policy not found")
                })?;
            identities.push(identity);
        }

        let links = PagingLinks::new(path, identities.len(), offset, limit, total_count);

        Ok(CollaboratorListResponse {
            data: _IdentityResponseVec(identities),
            meta: CollaboratorListMeta {
                total_count,
            },
            links,
        })
    }

    pub async fn add_collaborator(&self, ctx: &RequestCtx, space_id: &str, identity_id: &str) -> AppResult<()> {
        self.update_policy(ctx, space_id, &[Some(identity_id.into())], PolicyUpdate::AddMember)
            .await
            .context("s:add_collaborator")
    }

    pub async fn add_collaborators(&self, ctx: &RequestCtx, space_id: &str, dto: UpdateUserIdList) -> AppResult<()> {
        let Some(identity_ids) = dto.data else {
            return Ok(());
        };

        self.update_policy(ctx, space_id, &identity_ids, PolicyUpdate::AddMember).await.context("s:add_collaborators")
    }

    pub async fn remove_collaborator(&self, ctx: &RequestCtx, space_id: &str, identity_id: &str) -> AppResult<()> {
        let identity_ids = [Some(identity_id.into())];

        let space = parse_id(space_id, "space")?;
        self.check_space_owner(&space, &identity_ids).await.context("s:remove_collaborator")?;

        self.update_policy(ctx, space_id, &identity_ids, PolicyUpdate::RemoveMember)
            .await
            .context("s:remove_collaborator")
    }

    pub async fn remove_collaborators(
        &self,
        ctx: &RequestCtx,
        space_id: &str,
        dto: UpdateUserIdList,
    ) -> AppResult<()> {
        let Some(identity_ids) = dto.data else {
            return Ok(());
        };

        let space = parse_id(space_id, "space")?;
        self.check_space_owner(&space, &identity_ids).await.context("s:remove_collaborators")?;

        self.update_policy(ctx, space_id, &identity_ids, PolicyUpdate::RemoveMember)
            .await
            .context("s:remove_collaborators")
    }

    /// Reject the whole batch if any entry names the space owner
    async fn check_space_owner(&self, space_id: &Uuid, identity_ids: &[Option<UpdateUserId>]) -> AppResult<()> {
        let owner_id = self
            .ds
            .get_space_by_id(space_id)
            .await
            .map_err(|err| err.into_type(ErrType::NotFound))?
            .map(|space| space.owner_id)
            .ok_or(ErrType::NotFound.msg("Space not found"))?;

        let owner_listed = identity_ids
            .iter()
            .flatten()
            .any(|UpdateUserId { id }| Uuid::parse_str(id).is_ok_and(|id| id == owner_id));
        if owner_listed {
            return Err(ErrType::BadRequest.msg("Space owner can't be removed from the list of the space collaborators"));
        }

        Ok(())
    }

    /// Authorize the caller, then apply `update` for each identity to a freshly
    /// fetched policy and write it back if anything changed.
    ///
    /// The batch is all-or-nothing: every identity is validated and applied in
    /// memory before the single remote write.
    async fn update_policy(
        &self,
        ctx: &RequestCtx,
        space_id: &str,
        identity_ids: &[Option<UpdateUserId>],
        update: PolicyUpdate,
    ) -> AppResult<()> {
        let space_id = parse_id(space_id, "space")?;

        match self.keycloak.authorize(ctx, &space_id).await {
            Ok(true) => (),
            Ok(false) => return Err(ErrType::Unauthorized.msg("User not among space collaborators")),
            Err(err) => return Err(err.into_type(ErrType::Unauthorized)),
        };

        let (mut policy, pat) = self.get_policy(ctx, &space_id).await?;

        let mut updated = false;
        for UpdateUserId { id } in identity_ids.iter().flatten() {
            let identity_id = parse_id(id, "identity").inspect_err(|_| {
                tracing::error!(req_id = &*ctx.req_id.0, identity_id = id, "unable to convert the identity ID to uuid")
            })?;

            self.ds
                .get_identity_with_user(&identity_id)
                .await
                .map_err(|err| err.into_type(ErrType::NotFound))?
                .ok_or(ErrType::NotFound.msg("Identity not found"))?;

            updated |= update.apply(&mut policy, &identity_id)?;
        }

        if !updated {
            tracing::debug!(req_id = &*ctx.req_id.0, space_id = space_id.to_string(), "Policy unchanged");
            return Ok(());
        }

        self.keycloak
            .update_policy(ctx, &policy, &pat)
            .await
            .map_err(|err| err.into_type(ErrType::ServerError))?;

        tracing::info!(
            req_id = &*ctx.req_id.0,
            space_id = space_id.to_string(),
            caller = ctx.caller.as_ref().map(|caller| caller.identity_id.to_string()).unwrap_or_default(),
            update = ?update,
            "Updated space collaborators"
        );
        Ok(())
    }

    async fn get_policy(&self, ctx: &RequestCtx, space_id: &Uuid) -> AppResult<(KeycloakPolicy, ProtectionToken)> {
        let resource = self
            .ds
            .get_resource_by_space(space_id)
            .await
            .map_err(|err| err.into_type(ErrType::NotFound))?
            .ok_or(ErrType::NotFound.msg("Space resource not found"))?;

        self.keycloak.get_policy(ctx, &resource.policy_id).await.map_err(|err| err.into_type(ErrType::ServerError))
    }
}
