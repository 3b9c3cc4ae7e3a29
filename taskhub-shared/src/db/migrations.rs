/// Schema migrations
///
/// SQL files live in `taskhub-shared/migrations/` as reversible
/// `{version}_{name}.up.sql` / `.down.sql` pairs and are embedded into the
/// binary at compile time.

use sqlx::{migrate::Migrator, postgres::PgPool};
use tracing::{info, warn};

/// Embedded migration set
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Applies every pending migration.
///
/// Already applied versions are skipped, so this is safe to call on every
/// startup.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Running database migrations");

    match MIGRATOR.run(pool).await {
        Ok(()) => {
            info!("Database schema is up to date");
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "Migration failed");
            Err(e)
        }
    }
}

/// Latest successfully applied migration version, if any.
pub async fn current_version(pool: &PgPool) -> Result<Option<i64>, sqlx::Error> {
    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT FROM information_schema.tables
            WHERE table_schema = 'public' AND table_name = '_sqlx_migrations'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(None);
    }

    sqlx::query_scalar("SELECT MAX(version) FROM _sqlx_migrations WHERE success = true")
        .fetch_one(pool)
        .await
}
