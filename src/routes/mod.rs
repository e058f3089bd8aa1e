use axum::routing::Router;
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

use crate::app::AppState;

mod collaborators;
mod health;
mod middleware;

/// Function to bind routes from:
/// - [`health`]
/// - [`collaborators`]
pub fn bind_routes(app: AppState, router: Router<AppState>) -> Router<AppState> {
    // root level routes
    let health = health::bind_routes();

    // api level routes
    let r = collaborators::bind_routes(app, Router::new());

    router.merge(health).nest("/v1", r)
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&ApiSecurity),
    info(
        title = "Space Collaborators API Documentation",
        description = r#"Manage the collaborators of a space through its Keycloak policy"#,
    ),
    paths(
        health::health,

        collaborators::list_collaborators,
        collaborators::add_collaborator,
        collaborators::add_many_collaborators,
        collaborators::remove_collaborator,
        collaborators::remove_many_collaborators,
    ),
    components(schemas(
        lib_core::EmptyResponse,
        lib_core::paging::PagingLinks,

        lib_domain::dto::Datetime,
        lib_domain::dto::identity::res::IdentityResponse,

        lib_domain::dto::collaborator::req::UpdateUserId,
        lib_domain::dto::collaborator::req::UpdateUserIdList,
        lib_domain::dto::collaborator::res::CollaboratorListMeta,
        lib_domain::dto::collaborator::res::CollaboratorListResponse,
    )),
    servers()
)]
pub struct ApiDoc;

struct ApiSecurity;

impl Modify for ApiSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(middleware::AUTHORIZATION_HEADER))),
            )
        }
    }
}
