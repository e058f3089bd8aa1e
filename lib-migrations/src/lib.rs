pub async fn migrate_schema(url: &str) -> Result<(), sqlx::Error> {
    let db = sqlx::postgres::PgPoolOptions::new().max_connections(1).connect(url).await?;

    sqlx::migrate!("./migrations").run(&db).await?;
    db.close().await;
    Ok(())
}
