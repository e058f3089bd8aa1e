use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::*;
use crate::extensions::{Caller, ReqId};

const PAT: &str = "pat-1";
const USER_TOKEN: &str = "user-token";

struct FakeKeycloak {
    policy: Mutex<Value>,
    puts: Mutex<usize>,
    granted_space: String,
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()).map(|v| v.trim_start_matches("Bearer ").to_owned())
}

async fn token_handler(Form(form): Form<Vec<(String, String)>>) -> Response {
    let grant = form.iter().find(|(k, _)| k == "grant_type").map(|(_, v)| v.as_str());
    let secret = form.iter().find(|(k, _)| k == "client_secret").map(|(_, v)| v.as_str());
    match (grant, secret) {
        (Some("client_credentials"), Some("s3cret")) => Json(json!({ "access_token": PAT })).into_response(),
        _ => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn get_policy_handler(
    State(state): State<Arc<FakeKeycloak>>,
    headers: HeaderMap,
    Path((_realm, _client, id)): Path<(String, String, String)>,
) -> Response {
    if bearer(&headers).as_deref() != Some(PAT) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let policy = state.policy.lock().unwrap().clone();
    if policy["id"] != id {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(policy).into_response()
}

async fn put_policy_handler(
    State(state): State<Arc<FakeKeycloak>>,
    headers: HeaderMap,
    Path((_realm, _client, _id)): Path<(String, String, String)>,
    Json(body): Json<Value>,
) -> StatusCode {
    if bearer(&headers).as_deref() != Some(PAT) {
        return StatusCode::UNAUTHORIZED;
    }
    *state.policy.lock().unwrap() = body;
    *state.puts.lock().unwrap() += 1;
    StatusCode::CREATED
}

async fn entitlement_handler(
    State(state): State<Arc<FakeKeycloak>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    match bearer(&headers).as_deref() {
        Some(USER_TOKEN) => (),
        Some(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        None => return StatusCode::UNAUTHORIZED.into_response(),
    }
    let requested = body["permissions"][0]["resource_set_name"].as_str().unwrap_or_default().to_owned();
    if requested != state.granted_space {
        return StatusCode::FORBIDDEN.into_response();
    }
    let claims = json!({
        "sub": "someone",
        "authorization": { "permissions": [{ "resource_set_name": requested, "resource_set_id": "rs-1" }] }
    });
    let rpt = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"realm")).unwrap();
    Json(json!({ "rpt": rpt })).into_response()
}

async fn spawn_keycloak(state: Arc<FakeKeycloak>) -> (KeycloakConfig, oneshot::Sender<()>) {
    let app = Router::new()
        .route("/auth/realms/{realm}/protocol/openid-connect/token", post(token_handler))
        .route("/auth/realms/{realm}/authz/entitlement/{client}", post(entitlement_handler))
        .route(
            "/auth/admin/realms/{realm}/clients/{client}/authz/resource-server/policy/{id}",
            get(get_policy_handler).put(put_policy_handler),
        )
        .with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await;
    });

    let config = KeycloakConfig {
        url: format!("http://{addr}"),
        realm: "fabric8".into(),
        client_id: "platform".into(),
        client_uuid: "c-uuid".into(),
        client_secret: "s3cret".into(),
        ..Default::default()
    };
    (config, shutdown_tx)
}

fn fake(users: &str, granted_space: &Uuid) -> Arc<FakeKeycloak> {
    Arc::new(FakeKeycloak {
        policy: Mutex::new(json!({
            "id": "policy-1",
            "name": "space-members",
            "type": "user",
            "logic": "POSITIVE",
            "decisionStrategy": "UNANIMOUS",
            "config": { "users": users }
        })),
        puts: Mutex::new(0),
        granted_space: granted_space.to_string(),
    })
}

fn ctx(token: Option<&str>) -> RequestCtx {
    RequestCtx::new(
        ReqId("test".into()),
        token.map(|token| Caller {
            identity_id: Uuid::new_v4(),
            token: token.into(),
        }),
        CancellationToken::new(),
    )
}

#[tokio::test]
async fn fetches_policy_and_writes_it_back_with_same_token() {
    let member = Uuid::new_v4();
    let state = fake(&format!("[\"{member}\"]"), &Uuid::new_v4());
    let (config, _shutdown) = spawn_keycloak(state.clone()).await;
    let client = KeycloakClient::new(config);
    let ctx = ctx(None);

    let (mut policy, pat) = client.get_policy(&ctx, "policy-1").await.unwrap();
    assert_eq!(pat.as_str(), PAT);
    assert_eq!(policy.member_ids().unwrap(), vec![member]);

    let added = Uuid::new_v4();
    assert!(policy.add_member(&added).unwrap());
    client.update_policy(&ctx, &policy, &pat).await.unwrap();

    assert_eq!(*state.puts.lock().unwrap(), 1);
    let stored = state.policy.lock().unwrap()["config"]["users"].as_str().unwrap().to_owned();
    assert_eq!(stored, format!("[\"{member}\",\"{added}\"]"));
}

#[tokio::test]
async fn stale_token_update_fails() {
    let state = fake("[]", &Uuid::new_v4());
    let (config, _shutdown) = spawn_keycloak(state.clone()).await;
    let client = KeycloakClient::new(config);
    let ctx = ctx(None);

    let (policy, _) = client.get_policy(&ctx, "policy-1").await.unwrap();
    let err = client.update_policy(&ctx, &policy, &ProtectionToken::new("expired")).await.unwrap_err();

    assert_eq!(err.err_type(), ErrType::ServerError);
    assert_eq!(*state.puts.lock().unwrap(), 0);
}

#[tokio::test]
async fn unknown_policy_is_an_error() {
    let state = fake("[]", &Uuid::new_v4());
    let (config, _shutdown) = spawn_keycloak(state).await;
    let client = KeycloakClient::new(config);

    let err = client.get_policy(&ctx(None), "missing").await.unwrap_err();
    assert_eq!(err.err_type(), ErrType::ServerError);
}

#[tokio::test]
async fn bad_client_secret_fails_before_policy_fetch() {
    let state = fake("[]", &Uuid::new_v4());
    let (mut config, _shutdown) = spawn_keycloak(state).await;
    config.client_secret = "wrong".into();
    let client = KeycloakClient::new(config);

    assert!(client.get_policy(&ctx(None), "policy-1").await.is_err());
}

#[tokio::test]
async fn entitlement_grants_only_listed_space() {
    let space = Uuid::new_v4();
    let state = fake("[]", &space);
    let (config, _shutdown) = spawn_keycloak(state).await;
    let client = KeycloakClient::new(config);
    let ctx = ctx(Some(USER_TOKEN));

    assert!(client.authorize(&ctx, &space).await.unwrap());
    assert!(!client.authorize(&ctx, &Uuid::new_v4()).await.unwrap());
}

#[tokio::test]
async fn entitlement_failure_is_an_error() {
    let space = Uuid::new_v4();
    let state = fake("[]", &space);
    let (config, _shutdown) = spawn_keycloak(state).await;
    let client = KeycloakClient::new(config);

    assert!(client.authorize(&ctx(Some("broken")), &space).await.is_err());

    let err = client.authorize(&ctx(None), &space).await.unwrap_err();
    assert_eq!(err.err_type(), ErrType::Unauthorized);
}

#[tokio::test]
async fn cancelled_request_sends_no_update() {
    let state = fake("[]", &Uuid::new_v4());
    let (config, _shutdown) = spawn_keycloak(state.clone()).await;
    let client = KeycloakClient::new(config);
    let ctx = ctx(None);

    let (mut policy, pat) = client.get_policy(&ctx, "policy-1").await.unwrap();
    policy.add_member(&Uuid::new_v4()).unwrap();
    ctx.cancel.cancel();

    let err = client.update_policy(&ctx, &policy, &pat).await.unwrap_err();
    assert_eq!(err.message(), "Request cancelled");
    assert_eq!(*state.puts.lock().unwrap(), 0);
}

#[test]
fn rpt_without_authorization_grants_nothing() {
    let rpt = encode(&Header::default(), &json!({ "sub": "x" }), &EncodingKey::from_secret(b"k")).unwrap();
    assert!(!rpt_grants(&rpt, "space").unwrap());
}

#[test]
fn rpt_matches_resource_set_id() {
    let claims = json!({ "authorization": { "permissions": [{ "resource_set_id": "space" }] } });
    let rpt = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"k")).unwrap();
    assert!(rpt_grants(&rpt, "space").unwrap());
}
