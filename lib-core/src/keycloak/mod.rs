//! Keycloak client for space policies and entitlements.
//!
//! Space membership is held by a Keycloak `user` policy. Reading or writing
//! that policy needs a protection API token (PAT) obtained with the client
//! credentials grant; the token fetched together with a policy is the one
//! used to write it back.

use jsonwebtoken::{decode, DecodingKey, Validation};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{config::KeycloakConfig, extensions::RequestCtx, AppResult, ErrType};

pub mod policy;
pub mod users;

#[cfg(test)]
mod tests;

pub use policy::{KeycloakPolicy, PolicyConfig, PolicyUpdate, ProtectionToken};

/// Remote store of space policies
pub trait PolicyManager {
    /// Fetch a policy together with the token required to update it
    fn get_policy(
        &self,
        ctx: &RequestCtx,
        policy_id: &str,
    ) -> impl Future<Output = AppResult<(KeycloakPolicy, ProtectionToken)>> + Send;

    /// Write back a policy using the token it was fetched with
    fn update_policy(
        &self,
        ctx: &RequestCtx,
        policy: &KeycloakPolicy,
        pat: &ProtectionToken,
    ) -> impl Future<Output = AppResult<()>> + Send;
}

/// Decides whether the caller of a request may act on a space
pub trait SpaceAuthorizer {
    fn authorize(&self, ctx: &RequestCtx, space_id: &Uuid) -> impl Future<Output = AppResult<bool>> + Send;
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Serialize)]
struct EntitlementPermission<'a> {
    resource_set_name: &'a str,
}

#[derive(Serialize)]
struct EntitlementRequest<'a> {
    permissions: Vec<EntitlementPermission<'a>>,
}

#[derive(Deserialize)]
struct EntitlementResponse {
    rpt: String,
}

#[derive(Deserialize)]
struct RptClaims {
    #[serde(default)]
    authorization: Option<RptAuthorization>,
}

#[derive(Deserialize)]
struct RptAuthorization {
    #[serde(default)]
    permissions: Vec<RptPermission>,
}

#[derive(Deserialize)]
struct RptPermission {
    #[serde(default)]
    resource_set_name: Option<String>,
    #[serde(default)]
    resource_set_id: Option<String>,
}

/// Run a remote call unless the request gets cancelled first
async fn guarded<T>(ctx: &RequestCtx, fut: impl Future<Output = AppResult<T>>) -> AppResult<T> {
    tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => Err(ErrType::ServerError.msg("Request cancelled")),
        res = fut => res,
    }
}

pub struct KeycloakClient {
    config: KeycloakConfig,
    client: reqwest::Client,
}

impl KeycloakClient {
    pub fn new(config: KeycloakConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    async fn protection_token(&self) -> AppResult<ProtectionToken> {
        let res = self
            .client
            .post(self.config.token_endpoint())
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|err| ErrType::ServerError.err(err, "Failed to request protection token"))?;

        match res.status() {
            StatusCode::OK => res
                .json::<TokenResponse>()
                .await
                .map(|token| ProtectionToken::new(token.access_token))
                .map_err(|err| ErrType::ServerError.err(err, "Failed to parse protection token response")),
            status => Err(ErrType::ServerError.msg(format!(
                "Failed to obtain protection token ({status}): {}",
                res.text().await.unwrap_or_default()
            ))),
        }
    }

    async fn fetch_policy(&self, policy_id: &str) -> AppResult<(KeycloakPolicy, ProtectionToken)> {
        let pat = self.protection_token().await?;

        let res = self
            .client
            .get(self.config.policy_endpoint(policy_id))
            .bearer_auth(pat.as_str())
            .send()
            .await
            .map_err(|err| ErrType::ServerError.err(err, "Failed to request policy"))?;

        match res.status() {
            StatusCode::OK => {
                let policy = res
                    .json::<KeycloakPolicy>()
                    .await
                    .map_err(|err| ErrType::ServerError.err(err, "Failed to parse policy"))?;
                tracing::debug!(policy_id, users = policy.config.user_ids.as_str(), "Fetched policy");
                Ok((policy, pat))
            }
            status => Err(ErrType::ServerError.msg(format!(
                "Failed to get policy {policy_id} ({status}): {}",
                res.text().await.unwrap_or_default()
            ))),
        }
    }

    async fn put_policy(&self, ctx: &RequestCtx, policy: &KeycloakPolicy, pat: &ProtectionToken) -> AppResult<()> {
        let policy_id = policy.id.as_deref().ok_or(ErrType::ServerError.msg("Policy has no id"))?;

        // last point at which a cancelled request can still back out
        if ctx.is_cancelled() {
            return Err(ErrType::ServerError.msg("Request cancelled"));
        }

        let res = self
            .client
            .put(self.config.policy_endpoint(policy_id))
            .bearer_auth(pat.as_str())
            .json(policy)
            .send()
            .await
            .map_err(|err| ErrType::ServerError.err(err, "Failed to send policy update"))?;

        let status = res.status();
        if status.is_success() {
            tracing::debug!(req_id = &*ctx.req_id.0, policy_id, "Updated policy");
            return Ok(());
        }

        Err(ErrType::ServerError.msg(format!(
            "Failed to update policy {policy_id} ({status}): {}",
            res.text().await.unwrap_or_default()
        )))
    }

    async fn entitlement(&self, ctx: &RequestCtx, space_id: &Uuid) -> AppResult<bool> {
        let caller = ctx.caller.as_ref().ok_or(ErrType::Unauthorized.msg("Missing caller"))?;
        let space_id = space_id.to_string();

        let res = self
            .client
            .post(self.config.entitlement_endpoint())
            .bearer_auth(&*caller.token)
            .json(&EntitlementRequest {
                permissions: vec![EntitlementPermission {
                    resource_set_name: &space_id,
                }],
            })
            .send()
            .await
            .map_err(|err| ErrType::ServerError.err(err, "Failed to request entitlement"))?;

        match res.status() {
            StatusCode::OK => {
                let entitlement = res
                    .json::<EntitlementResponse>()
                    .await
                    .map_err(|err| ErrType::ServerError.err(err, "Failed to parse entitlement response"))?;
                rpt_grants(&entitlement.rpt, &space_id)
            }
            StatusCode::FORBIDDEN => Ok(false),
            status => Err(ErrType::ServerError.msg(format!(
                "Failed to obtain entitlement ({status}): {}",
                res.text().await.unwrap_or_default()
            ))),
        }
    }
}

/// Check whether an RPT grants the given resource set.
///
/// The RPT was handed to us directly by Keycloak, so only its claims are read.
fn rpt_grants(rpt: &str, resource: &str) -> AppResult<bool> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let claims = decode::<RptClaims>(rpt, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|err| ErrType::ServerError.err(err, "Failed to decode RPT"))?
        .claims;

    Ok(claims.authorization.map(|authz| authz.permissions).unwrap_or_default().iter().any(|permission| {
        permission.resource_set_name.as_deref() == Some(resource) || permission.resource_set_id.as_deref() == Some(resource)
    }))
}

impl PolicyManager for KeycloakClient {
    async fn get_policy(&self, ctx: &RequestCtx, policy_id: &str) -> AppResult<(KeycloakPolicy, ProtectionToken)> {
        guarded(ctx, self.fetch_policy(policy_id)).await
    }

    async fn update_policy(&self, ctx: &RequestCtx, policy: &KeycloakPolicy, pat: &ProtectionToken) -> AppResult<()> {
        guarded(ctx, self.put_policy(ctx, policy, pat)).await
    }
}

impl SpaceAuthorizer for KeycloakClient {
    async fn authorize(&self, ctx: &RequestCtx, space_id: &Uuid) -> AppResult<bool> {
        guarded(ctx, self.entitlement(ctx, space_id)).await
    }
}
