use migration::MigratorTrait;
use sea_orm::{prelude::*, ConnectOptions, Database, DbBackend, Statement};
use tracing::info;

pub struct DatabaseConfig {
    url: String,
}

impl DatabaseConfig {
    pub fn new(url: String) -> DatabaseConfig {
        DatabaseConfig { url }
    }
}

/// Connects, enables foreign keys on SQLite and runs pending migrations.
pub async fn set_up_db(config: DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options.sqlx_logging(false);
    // Every connection to an in-memory SQLite database sees its own database.
    if config.url.contains(":memory:") {
        options.max_connections(1);
    }
    let db = Database::connect(options).await?;

    if db.get_database_backend() == DbBackend::Sqlite {
        db.execute(Statement::from_string(
            db.get_database_backend(),
            "PRAGMA foreign_keys = ON;",
        )).await?;
    }
    migration::Migrator::up(&db, None).await?;
    info!("Database ready at {}", config.url);

    Ok(db)
}
