use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
    Extension,
};
use lib_core::{extensions::Caller, ApiError, AppResult, ErrType, ReqId};

use crate::app::AppState;

fn extract_bearer(headers: &HeaderMap) -> AppResult<&str> {
    let bearer_value = headers
        .get(super::AUTHORIZATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .ok_or(ErrType::Unauthorized.msg("Missing authorization token"))?;

    bearer_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(ErrType::Unauthorized.msg("Missing bearer"))
}

/// Validate the bearer token and attach the [`Caller`] to the request
pub async fn authenticate(
    headers: HeaderMap,
    State(app): State<AppState>,
    Extension(req_id): Extension<ReqId>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(&headers).map_err(|err| ApiError(err, req_id.clone()))?;

    let claims = app.auth().validate_token_for_claims(token).map_err(|err| ApiError(err, req_id.clone()))?;
    let identity_id = claims.identity_id().map_err(|err| ApiError(err, req_id))?;

    req.extensions_mut().insert(Caller {
        identity_id,
        token: token.into(),
    });

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use axum::http::{header::AUTHORIZATION, HeaderValue};

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_is_extracted() {
        assert_eq!(extract_bearer(&headers("Bearer abc.def")).unwrap(), "abc.def");
        assert_eq!(extract_bearer(&headers("  Bearer   abc  ")).unwrap(), "abc");
    }

    #[test]
    fn missing_or_malformed_bearer_is_unauthorized() {
        let err = extract_bearer(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.err_type(), ErrType::Unauthorized);

        assert!(extract_bearer(&headers("Basic abc")).is_err());
        assert!(extract_bearer(&headers("Bearer ")).is_err());
    }
}
