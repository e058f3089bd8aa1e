use chrono::{DateTime, Utc};
use lib_core::{AppResult, ErrType};
use uuid::Uuid;

use super::Datastore;

/// Keycloak resource registered for a [`super::space::Space`]
pub struct SpaceResource {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    pub space_id: Uuid,
    pub resource_id: String,
    pub policy_id: String,
    pub permission_id: String,
}
impl From<tokio_postgres::Row> for SpaceResource {
    fn from(value: tokio_postgres::Row) -> Self {
        Self {
            id: value.get(0),
            created_at: value.get(1),
            updated_at: value.get(2),
            space_id: value.get(3),
            resource_id: value.get(4),
            policy_id: value.get(5),
            permission_id: value.get(6),
        }
    }
}

pub trait SpaceResourceDs {
    fn get_resource_by_space(&self, space_id: &Uuid) -> impl Future<Output = AppResult<Option<SpaceResource>>> + Send;
}

impl SpaceResourceDs for Datastore {
    async fn get_resource_by_space(&self, space_id: &Uuid) -> AppResult<Option<SpaceResource>> {
        let rows = self
            .db
            .query(&self.space_resource_stmts.get_by_space, &[&space_id])
            .await
            .map_err(|err| ErrType::DbError.err(err, "Failed to get space resource"))?;

        Ok(rows.into_iter().next().map(SpaceResource::from))
    }
}
