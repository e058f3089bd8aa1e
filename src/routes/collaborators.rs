use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::StatusCode,
    routing::{get, post, Router},
    Extension,
};
use lib_core::{
    extensions::{Caller, ReqCancel, RequestCtx},
    ApiError, ApiResult, EmptyResponse, Json, ReqId,
};
use lib_domain::dto::collaborator::{
    req::{PageQuery, UpdateUserIdList},
    res::CollaboratorListResponse,
};

use crate::app::AppState;

use super::middleware;

pub fn bind_routes(app: AppState, router: Router<AppState>) -> Router<AppState> {
    let public = Router::new().route("/{space_id}", get(list_collaborators));

    let secured = Router::new()
        .route("/{space_id}", post(add_many_collaborators).delete(remove_many_collaborators))
        .route("/{space_id}/{identity_id}", post(add_collaborator).delete(remove_collaborator))
        .layer(axum::middleware::from_fn_with_state(app, middleware::auth::authenticate));

    router.nest("/collaborators", public.merge(secured))
}

fn updated() -> Json<EmptyResponse> {
    Json(EmptyResponse::new(StatusCode::OK, "Space collaborators updated"))
}

#[utoipa::path(
    get,
    path = "/v1/collaborators/{space_id}",
    params(("space_id" = String, Path, description = "Space id"), PageQuery),
    responses((status=200, body=CollaboratorListResponse)),
    tag = "Collaborators"
)]
pub async fn list_collaborators(
    State(app): State<AppState>,
    Extension(req_id): Extension<ReqId>,
    Extension(ReqCancel(cancel)): Extension<ReqCancel>,
    OriginalUri(uri): OriginalUri,
    Path(space_id): Path<String>,
    Query(page): Query<PageQuery>,
) -> ApiResult<CollaboratorListResponse> {
    let ctx = RequestCtx::new(req_id.clone(), None, cancel);
    app.service()
        .list_collaborators(&ctx, &space_id, page, uri.path())
        .await
        .map(Json)
        .map_err(|err| ApiError(err, req_id))
}

#[utoipa::path(
    post,
    path = "/v1/collaborators/{space_id}/{identity_id}",
    params(
        ("space_id" = String, Path, description = "Space id"),
        ("identity_id" = String, Path, description = "Identity to add"),
    ),
    responses((status=200, body=EmptyResponse)),
    tag = "Collaborators",
    security(("api_key" = []))
)]
pub async fn add_collaborator(
    State(app): State<AppState>,
    Extension(req_id): Extension<ReqId>,
    Extension(ReqCancel(cancel)): Extension<ReqCancel>,
    Extension(caller): Extension<Caller>,
    Path((space_id, identity_id)): Path<(String, String)>,
) -> ApiResult<EmptyResponse> {
    let ctx = RequestCtx::new(req_id.clone(), Some(caller), cancel);
    app.service()
        .add_collaborator(&ctx, &space_id, &identity_id)
        .await
        .map(|_| updated())
        .map_err(|err| ApiError(err, req_id))
}

#[utoipa::path(
    post,
    path = "/v1/collaborators/{space_id}",
    params(("space_id" = String, Path, description = "Space id")),
    request_body = UpdateUserIdList,
    responses((status=200, body=EmptyResponse)),
    tag = "Collaborators",
    security(("api_key" = []))
)]
pub async fn add_many_collaborators(
    State(app): State<AppState>,
    Extension(req_id): Extension<ReqId>,
    Extension(ReqCancel(cancel)): Extension<ReqCancel>,
    Extension(caller): Extension<Caller>,
    Path(space_id): Path<String>,
    dto: Option<Json<UpdateUserIdList>>,
) -> ApiResult<EmptyResponse> {
    let dto = dto.map(|Json(dto)| dto).unwrap_or_default();
    let ctx = RequestCtx::new(req_id.clone(), Some(caller), cancel);
    app.service()
        .add_collaborators(&ctx, &space_id, dto)
        .await
        .map(|_| updated())
        .map_err(|err| ApiError(err, req_id))
}

#[utoipa::path(
    delete,
    path = "/v1/collaborators/{space_id}/{identity_id}",
    params(
        ("space_id" = String, Path, description = "Space id"),
        ("identity_id" = String, Path, description = "Identity to remove"),
    ),
    responses((status=200, body=EmptyResponse)),
    tag = "Collaborators",
    security(("api_key" = []))
)]
pub async fn remove_collaborator(
    State(app): State<AppState>,
    Extension(req_id): Extension<ReqId>,
    Extension(ReqCancel(cancel)): Extension<ReqCancel>,
    Extension(caller): Extension<Caller>,
    Path((space_id, identity_id)): Path<(String, String)>,
) -> ApiResult<EmptyResponse> {
    let ctx = RequestCtx::new(req_id.clone(), Some(caller), cancel);
    app.service()
        .remove_collaborator(&ctx, &space_id, &identity_id)
        .await
        .map(|_| updated())
        .map_err(|err| ApiError(err, req_id))
}

#[utoipa::path(
    delete,
    path = "/v1/collaborators/{space_id}",
    params(("space_id" = String, Path, description = "Space id")),
    request_body = UpdateUserIdList,
    responses((status=200, body=EmptyResponse)),
    tag = "Collaborators",
    security(("api_key" = []))
)]
pub async fn remove_many_collaborators(
    State(app): State<AppState>,
    Extension(req_id): Extension<ReqId>,
    Extension(ReqCancel(cancel)): Extension<ReqCancel>,
    Extension(caller): Extension<Caller>,
    Path(space_id): Path<String>,
    dto: Option<Json<UpdateUserIdList>>,
) -> ApiResult<EmptyResponse> {
    let dto = dto.map(|Json(dto)| dto).unwrap_or_default();
    let ctx = RequestCtx::new(req_id.clone(), Some(caller), cancel);
    app.service()
        .remove_collaborators(&ctx, &space_id, dto)
        .await
        .map(|_| updated())
        .map_err(|err| ApiError(err, req_id))
}
