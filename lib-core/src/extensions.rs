use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[repr(transparent)]
pub struct ReqId(pub Arc<str>);
impl Clone for ReqId {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

/// Cancelled when the request future is dropped
#[repr(transparent)]
#[derive(Clone, Default)]
pub struct ReqCancel(pub CancellationToken);

/// Authenticated caller of a request
///
/// Carries the raw bearer token so it can be forwarded to Keycloak
/// for entitlement checks.
pub struct Caller {
    pub identity_id: Uuid,
    pub token: Arc<str>,
}
impl Clone for Caller {
    fn clone(&self) -> Self {
        Self {
            identity_id: self.identity_id,
            token: Arc::clone(&self.token),
        }
    }
}

/// Per-request context handed to remote collaborators
#[derive(Clone)]
pub struct RequestCtx {
    pub req_id: ReqId,
    pub caller: Option<Caller>,
    pub cancel: CancellationToken,
}

impl RequestCtx {
    pub fn new(req_id: ReqId, caller: Option<Caller>, cancel: CancellationToken) -> Self {
        Self {
            req_id,
            caller,
            cancel,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
