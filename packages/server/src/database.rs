use std::time::Duration;

use sea_orm::sea_query::{
    Index, PostgresQueryBuilder, SchemaStatementBuilder, SqliteQueryBuilder,
};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr, Schema,
};
use tracing::info;

use crate::entity::slide;

pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    // An in-memory SQLite database lives and dies with its single connection.
    if db_url.contains(":memory:") || db_url.contains("mode=memory") {
        opt.max_connections(1).min_connections(1);
    } else {
        opt.max_connections(100)
            .min_connections(5)
            .connect_timeout(Duration::from_secs(8))
            .acquire_timeout(Duration::from_secs(8))
            .idle_timeout(Duration::from_secs(8))
            .max_lifetime(Duration::from_secs(8));
    }
    opt.sqlx_logging(true);

    let db = Database::connect(opt).await?;
    sync_schema(&db).await?;

    Ok(db)
}

/// Create the catalog table and its indexes if they do not exist yet.
pub async fn sync_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();

    let mut table = Schema::new(backend).create_table_from_entity(slide::Entity);
    table.if_not_exists();
    db.execute_unprepared(&render(backend, &table)?).await?;

    // Public listing filters on moderation state.
    let index = Index::create()
        .if_not_exists()
        .name("idx_slide_approved")
        .table(slide::Entity)
        .col(slide::Column::Approved)
        .to_owned();
    db.execute_unprepared(&render(backend, &index)?).await?;

    info!("Catalog schema ready");
    Ok(())
}

fn render<S: SchemaStatementBuilder>(backend: DbBackend, stmt: &S) -> Result<String, DbErr> {
    match backend {
        DbBackend::Postgres => Ok(stmt.to_string(PostgresQueryBuilder)),
        DbBackend::Sqlite => Ok(stmt.to_string(SqliteQueryBuilder)),
        other => Err(DbErr::Custom(format!(
            "unsupported database backend: {other:?}"
        ))),
    }
}
