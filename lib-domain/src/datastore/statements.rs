use lib_core::{AppResult, ErrType};
use tokio_postgres::{types::Type, Client, Statement};

async fn prepare(client: &Client, query: &str, types: &[Type]) -> AppResult<Statement> {
    client
        .prepare_typed(query, types)
        .await
        .map_err(|err| ErrType::DbError.err(err, format!("Failed to prepare statement: {query}")))
}

pub(super) struct IdentityStatements {
    /// Identity joined with its user profile, see [`super::identity::Identity`]
    pub(super) get_with_user: Statement,
}

impl IdentityStatements {
    pub(super) async fn new(client: &Client) -> AppResult<Self> {
        Ok(Self {
            get_with_user: prepare(
                client,
                "SELECT i.id, i.created_at, i.updated_at, i.username, i.provider_type, u.id, \
                 COALESCE(u.full_name, ''), COALESCE(u.email, ''), COALESCE(u.company, ''), \
                 COALESCE(u.image_url, ''), COALESCE(u.bio, ''), COALESCE(u.url, '') \
                 FROM identities i LEFT JOIN users u ON u.id = i.user_id WHERE i.id = $1",
                &[Type::UUID],
            )
            .await?,
        })
    }
}

pub(super) struct SpaceStatements {
    /// `SELECT id, created_at, updated_at, name, description, owner_id FROM spaces WHERE id = $1`
    pub(super) get_by_id: Statement,
}

impl SpaceStatements {
    pub(super) async fn new(client: &Client) -> AppResult<Self> {
        Ok(Self {
            get_by_id: prepare(
                client,
                "SELECT id, created_at, updated_at, name, description, owner_id FROM spaces WHERE id = $1",
                &[Type::UUID],
            )
            .await?,
        })
    }
}

pub(super) struct SpaceResourceStatements {
    /// `SELECT id, created_at, updated_at, space_id, resource_id, policy_id, permission_id FROM space_resources WHERE space_id = $1`
    pub(super) get_by_space: Statement,
}

impl SpaceResourceStatements {
    pub(super) async fn new(client: &Client) -> AppResult<Self> {
        Ok(Self {
            get_by_space: prepare(
                client,
                "SELECT id, created_at, updated_at, space_id, resource_id, policy_id, permission_id \
                 FROM space_resources WHERE space_id = $1",
                &[Type::UUID],
            )
            .await?,
        })
    }
}
