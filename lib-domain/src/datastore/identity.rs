use chrono::{DateTime, Utc};
use lib_core::{AppResult, ErrType};
use uuid::Uuid;

use super::Datastore;

/// Identity with its linked user profile
///
/// Profile columns are empty strings when no user is linked.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    pub username: String,
    pub provider_type: String,

    pub user_id: Option<Uuid>,
    pub full_name: String,
    pub email: String,
    pub company: String,
    pub image_url: String,
    pub bio: String,
    pub url: String,
}
impl From<tokio_postgres::Row> for Identity {
    fn from(value: tokio_postgres::Row) -> Self {
        Self {
            id: value.get(0),
            created_at: value.get(1),
            updated_at: value.get(2),
            username: value.get(3),
            provider_type: value.get(4),
            user_id: value.get(5),
            full_name: value.get(6),
            email: value.get(7),
            company: value.get(8),
            image_url: value.get(9),
            bio: value.get(10),
            url: value.get(11),
        }
    }
}

pub trait IdentityDs {
    fn get_identity_with_user(&self, id: &Uuid) -> impl Future<Output = AppResult<Option<Identity>>> + Send;
}

impl IdentityDs for Datastore {
    async fn get_identity_with_user(&self, id: &Uuid) -> AppResult<Option<Identity>> {
        let rows = self
            .db
            .query(&self.identity_stmts.get_with_user, &[&id])
            .await
            .map_err(|err| ErrType::DbError.err(err, "Failed to get identity by id"))?;

        Ok(rows.into_iter().next().map(Identity::from))
    }
}
