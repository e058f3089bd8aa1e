use lib_core::{config, AppResult, ErrType};
use tokio_postgres::NoTls;

use statements::{IdentityStatements, SpaceResourceStatements, SpaceStatements};

pub mod identity;
pub mod space;
pub mod space_resource;
mod statements;

/// Postgres backed store for identities, spaces and their Keycloak resources
///
/// Every lookup is a single statement, so each read runs in its own
/// implicit transaction and none is held across a remote call.
pub struct Datastore {
    db: tokio_postgres::Client,
    identity_stmts: IdentityStatements,
    space_stmts: SpaceStatements,
    space_resource_stmts: SpaceResourceStatements,
}

impl Datastore {
    pub(crate) async fn connect() -> AppResult<Self> {
        let db_config = config::DbConfig::new();

        lib_migrations::migrate_schema(&db_config.url)
            .await
            .map_err(|err| ErrType::DbError.err(err, "Failed to run migrations"))?;

        let mut pg_config = db_config
            .url
            .parse::<tokio_postgres::Config>()
            .map_err(|err| ErrType::DbError.err(err, "Invalid database url"))?;
        if !db_config.username.is_empty() {
            pg_config.user(&db_config.username);
        }
        if !db_config.password.is_empty() {
            pg_config.password(&db_config.password);
        }

        let (db, connection) =
            pg_config.connect(NoTls).await.map_err(|err| ErrType::DbError.err(err, "Failed to connect to db"))?;

        tokio::spawn(async move {
            if let Err(err) = connection.await {
                tracing::error!(message = "Database connection closed", err = err.to_string());
            }
        });

        Ok(Self {
            identity_stmts: IdentityStatements::new(&db).await?,
            space_stmts: SpaceStatements::new(&db).await?,
            space_resource_stmts: SpaceResourceStatements::new(&db).await?,
            db,
        })
    }
}
