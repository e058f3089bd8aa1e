use std::{error::Error, fmt::Display};

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, FromRequest, OptionalFromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

pub mod config;
pub mod extensions;
pub mod interceptor;
pub mod keycloak;
pub mod paging;
pub mod token;

pub use extensions::ReqId;

#[derive(Serialize, ToSchema)]
pub struct EmptyResponse {
    status: u16,
    message: String,
}
impl EmptyResponse {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        EmptyResponse {
            status: status.as_u16(),
            message: message.into(),
        }
    }
}

/// Custom Json wrapper handling json payload
/// parsing errors.
///
/// See more: [`axum::Json`] [`validator`]
pub struct Json<T>(pub T);

impl<T> IntoResponse for Json<T>
where
    axum::Json<T>: IntoResponse,
{
    fn into_response(self) -> Response {
        (StatusCode::OK, axum::Json(self.0)).into_response()
    }
}

/// Custom Json wrapper handling json payload
///
/// Struct being extract must have [`serde::Deserialize`] and [`validator::Validate`] to validate the payload
impl<S, T> FromRequest<S> for Json<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    T: Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, ApiError> {
        let req_id = req.extensions().get::<ReqId>().cloned().unwrap_or_else(|| ReqId("".into()));

        let axum::Json(payload) = axum::Json::<T>::from_request(req, state).await.map_err(|e| {
            let err_msg = e.body_text();
            ApiError(ErrType::InvalidBody.err(e, err_msg), req_id.clone())
        })?;

        payload.validate().map_err(|e| {
            let err_msg = format!("Bad Payload: {e}");
            ApiError(ErrType::BadRequest.err(e, err_msg), req_id.clone())
        })?;

        Ok(Json(payload))
    }
}

/// Upper bound on a buffered optional payload
const OPTIONAL_PAYLOAD_LIMIT: usize = 2 * 1024 * 1024;

/// Optional payload: a missing or blank body extracts as `None`,
/// anything else must be valid json for `T`.
impl<S, T> OptionalFromRequest<S> for Json<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    T: Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Option<Self>, ApiError> {
        let req_id = req.extensions().get::<ReqId>().cloned().unwrap_or_else(|| ReqId("".into()));

        let (parts, body) = req.into_parts();
        let bytes = axum::body::to_bytes(body, OPTIONAL_PAYLOAD_LIMIT)
            .await
            .map_err(|err| ApiError(ErrType::InvalidBody.err(err, "Failed to read payload"), req_id))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        let req = Request::from_parts(parts, Body::from(bytes));
        <Self as FromRequest<S>>::from_request(req, state).await.map(Some)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrType {
    Unauthorized,
    BadRequest,
    NotFound,
    ServerError,
    InvalidBody,

    DbError,
}
impl ErrType {
    #[track_caller]
    pub fn msg(self, message: impl Into<String>) -> AppError {
        AppError::init(self, None, message)
    }

    #[track_caller]
    pub fn err(self, err: impl Into<Box<dyn Error>>, message: impl Into<String>) -> AppError {
        AppError::init(self, Some(err.into()), message)
    }
}
impl Display for ErrType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ErrType::Unauthorized => "Unauthorized",
                ErrType::BadRequest => "BadRequest",
                ErrType::NotFound => "NotFound",
                ErrType::ServerError => "ServerError",
                ErrType::InvalidBody => "InvalidBody",

                ErrType::DbError => "DbError",
            }
        )
    }
}

#[derive(Debug)]
pub struct AppError {
    _type: ErrType,
    message: String,
    at: String,
    err_msg: String,
}

impl AppError {
    #[track_caller]
    fn init(_type: ErrType, err: Option<Box<dyn Error>>, message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        let at = format!("{}:{}:{}", location.file(), location.line(), location.column());
        AppError {
            _type,
            message: message.into(),
            at,
            err_msg: err.map(|e| e.to_string()).unwrap_or_default(),
        }
    }

    pub fn err_type(&self) -> ErrType {
        self._type
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Re-classify the error at a boundary, keeping message and origin
    pub fn into_type(mut self, _type: ErrType) -> Self {
        self._type = _type;
        self
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

/// Tag an error with the call site it travelled through
pub trait ErrorContext {
    fn context(self, ctx: &str) -> Self;
}

impl<T> ErrorContext for AppResult<T> {
    fn context(self, ctx: &str) -> Self {
        self.map_err(|mut err| {
            err.at = format!("{ctx} <- {}", err.at);
            err
        })
    }
}

pub struct ApiError(pub AppError, pub ReqId);
pub type ApiResult<T> = axum::response::Result<Json<T>, ApiError>;

impl IntoResponse for ApiError {
    /// Function to map errors into appropriate responses
    fn into_response(self) -> Response {
        let err = self.0;
        let req_id = self.1;

        let id: &str = &req_id.0;
        let _type = err._type;
        let err_msg = err.err_msg;
        let message = format!("[{}]: {}", _type, err.message);
        let at = err.at;

        let status = match _type {
            ErrType::InvalidBody => StatusCode::BAD_REQUEST,
            ErrType::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrType::BadRequest => StatusCode::BAD_REQUEST,
            ErrType::NotFound => StatusCode::NOT_FOUND,
            ErrType::ServerError => StatusCode::INTERNAL_SERVER_ERROR,

            ErrType::DbError => StatusCode::INTERNAL_SERVER_ERROR,
        };

        match status {
            StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!(req_id = id, message = message, at = at, err = err_msg)
            }
            _ => tracing::warn!(req_id = id, message = message, at = at, err = err_msg),
        };

        (
            status,
            Json(EmptyResponse {
                status: status.as_u16(),
                message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::{routing::post, Router};
    use serde::Deserialize;
    use tokio::sync::oneshot;

    use super::*;

    #[derive(Deserialize, Validate)]
    struct Batch {
        #[serde(default)]
        data: Option<Vec<String>>,
    }

    async fn batch_size(payload: Option<Json<Batch>>) -> String {
        match payload {
            None => "none".to_owned(),
            Some(Json(batch)) => batch.data.unwrap_or_default().len().to_string(),
        }
    }

    async fn spawn_batch_server() -> (String, oneshot::Sender<()>) {
        let app = Router::new().route("/batch", post(batch_size).delete(batch_size));
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
        (format!("http://{addr}/batch"), shutdown_tx)
    }

    #[tokio::test]
    async fn missing_payload_extracts_as_none() {
        let (url, _shutdown) = spawn_batch_server().await;
        let client = reqwest::Client::new();

        let res = client.delete(&url).send().await.unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::OK);
        assert_eq!(res.text().await.unwrap(), "none");

        let res = client.post(&url).header("content-type", "application/json").body("  ").send().await.unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::OK);
        assert_eq!(res.text().await.unwrap(), "none");
    }

    #[tokio::test]
    async fn present_payload_is_still_parsed() {
        let (url, _shutdown) = spawn_batch_server().await;
        let client = reqwest::Client::new();

        let res = client.post(&url).json(&serde_json::json!({ "data": ["a", "b"] })).send().await.unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::OK);
        assert_eq!(res.text().await.unwrap(), "2");

        let res = client.delete(&url).header("content-type", "application/json").body("{").send().await.unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn context_keeps_type_and_message() {
        let res: AppResult<()> = Err(ErrType::NotFound.msg("Space not found"));
        let err = res.context("s:list_collaborators").unwrap_err();

        assert_eq!(err.err_type(), ErrType::NotFound);
        assert_eq!(err.message(), "Space not found");
        assert!(err.at.starts_with("s:list_collaborators <- "));
    }

    #[test]
    fn into_type_reclassifies() {
        let err = ErrType::ServerError.msg("entitlement failed").into_type(ErrType::Unauthorized);
        assert_eq!(err.err_type(), ErrType::Unauthorized);
        assert_eq!(err.to_string(), "entitlement failed");
    }
}
