use sqlx::{Pool, Row, Sqlite};
use tracing::{info, instrument};

use crate::error::StoreError;

/// Reconcile an older database file with the current schema. Runs on every
/// startup and must stay idempotent.
#[instrument(skip(pool))]
pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<(), StoreError> {
    ensure_is_admin_column(pool).await?;
    bootstrap_first_admin(pool).await?;
    Ok(())
}

// Databases created before the admin feature are missing the is_admin
// column; probing the column is how such files are recognized.
#[instrument(skip(pool))]
async fn ensure_is_admin_column(pool: &Pool<Sqlite>) -> Result<(), StoreError> {
    let probe = sqlx::query("SELECT is_admin FROM users LIMIT 1")
        .fetch_optional(pool)
        .await;

    if probe.is_err() {
        info!("Migration: adding is_admin column to users table");
        sqlx::query("ALTER TABLE users ADD COLUMN is_admin BOOLEAN NOT NULL DEFAULT FALSE")
            .execute(pool)
            .await?;
    }

    Ok(())
}

// A store that already has users but no admin gets its lowest-id user
// promoted, so there is always someone who can reach the admin screens.
#[instrument(skip(pool))]
async fn bootstrap_first_admin(pool: &Pool<Sqlite>) -> Result<(), StoreError> {
    let admin_count = sqlx::query("SELECT COUNT(*) FROM users WHERE is_admin = TRUE")
        .fetch_one(pool)
        .await?
        .get::<i64, _>(0);

    if admin_count > 0 {
        return Ok(());
    }

    let first_user = sqlx::query("SELECT id FROM users ORDER BY id LIMIT 1")
        .fetch_optional(pool)
        .await?;

    if let Some(row) = first_user {
        let user_id = row.get::<i64, _>(0);
        info!(user_id, "Migration: promoting first user to admin because no admins exist");
        sqlx::query("UPDATE users SET is_admin = TRUE WHERE id = ?")
            .bind(user_id)
            .execute(pool)
            .await?;
    }

    Ok(())
}
