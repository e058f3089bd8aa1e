use lib_core::{
    config::KeycloakConfig,
    keycloak::KeycloakClient,
    AppResult, ErrType,
};
use uuid::Uuid;

use crate::datastore::Datastore;

mod collaborators;

/// Domain service over a datastore `D` and a Keycloak backend `K`
pub struct Service<D = Datastore, K = KeycloakClient> {
    ds: D,
    keycloak: K,
}

impl Service {
    pub async fn new() -> AppResult<Self> {
        Ok(Self {
            ds: Datastore::connect().await?,
            keycloak: KeycloakClient::new(KeycloakConfig::new()),
        })
    }
}

impl<D, K> Service<D, K> {
    pub fn with(ds: D, keycloak: K) -> Self {
        Self {
            ds,
            keycloak,
        }
    }
}

#[track_caller]
fn parse_id(raw: &str, what: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|err| ErrType::BadRequest.err(err, format!("Invalid {what} id: {raw}")))
}
