use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use sqlx::{Pool, Row, Sqlite};
use tracing::{info, instrument, warn};

use crate::db::{add_user, update_user_progress};
use crate::error::StoreError;

/// What the startup import decided to do.
#[derive(Debug, PartialEq)]
pub enum ImportOutcome {
    Imported { users: usize },
    Skipped,
}

#[derive(Deserialize)]
struct LegacyUser {
    password: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct LegacyProgress {
    points: i64,
    completed_tutorials: Vec<String>,
    completed_challenges: Vec<String>,
    emoji_collection: Vec<String>,
}

/// Startup step for the composition root: pull the pre-database JSON files
/// into the store, but only when the store has no users yet so a second
/// launch cannot double-import.
#[instrument(skip(pool))]
pub async fn import_legacy_data_if_empty(
    pool: &Pool<Sqlite>,
    dir: &Path,
) -> Result<ImportOutcome, StoreError> {
    let user_count = sqlx::query("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?
        .get::<i64, _>(0);

    if user_count > 0 {
        info!(user_count, "Users already present, skipping legacy import");
        return Ok(ImportOutcome::Skipped);
    }

    if !dir.join("users.json").exists() {
        info!("No legacy users.json found, skipping import");
        return Ok(ImportOutcome::Skipped);
    }

    let users = import_legacy_data(pool, dir).await?;
    Ok(ImportOutcome::Imported { users })
}

/// Import the legacy flat-file layout: one users.json mapping username to
/// its password hash, plus an optional progress_<username>.json per user.
#[instrument(skip(pool))]
pub async fn import_legacy_data(pool: &Pool<Sqlite>, dir: &Path) -> Result<usize, StoreError> {
    info!("Importing legacy JSON data");

    let raw = fs::read_to_string(dir.join("users.json"))?;
    let users: BTreeMap<String, LegacyUser> = serde_json::from_str(&raw)?;

    let mut imported = 0;
    for (username, legacy) in &users {
        let user_id = match add_user(pool, username, &legacy.password, None, false).await {
            Ok(id) => id,
            Err(StoreError::Conflict(_)) => {
                warn!(username = %username, "Legacy user already exists, skipping");
                continue;
            }
            Err(e) => return Err(e),
        };

        let progress_path = dir.join(format!("progress_{}.json", username));
        if progress_path.exists() {
            let raw = fs::read_to_string(&progress_path)?;
            let progress: LegacyProgress = serde_json::from_str(&raw)?;

            update_user_progress(
                pool,
                user_id,
                progress.points,
                &progress.completed_tutorials,
                &progress.completed_challenges,
                &progress.emoji_collection,
            )
            .await?;
        }

        imported += 1;
    }

    info!(imported, "Legacy import finished");
    Ok(imported)
}
